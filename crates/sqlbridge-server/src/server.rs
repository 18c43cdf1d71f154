use crate::config::Config;
use rusqlite::Connection;
use sqlbridge_protocol::session::{LoopStats, Session};
use sqlbridge_sql::connection;
use sqlbridge_sql::dispatch;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tracing::{error, info};

pub async fn run(config: Config) -> anyhow::Result<()> {
    info!("starting sqlbridge");
    let options = config.database_options()?;
    let conn = connection::open(&options)?;

    let result = serve(&conn, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await;
    if let Err(err) = &result {
        error!("message loop stopped: {err:#}");
    }
    connection::close(conn)?;
    result.map(|_| ())
}

/// Reads the handshake, then answers events against `conn` until the input
/// closes. The loop is strictly sequential, which is what lets every
/// dispatch share the one connection without locking.
pub async fn serve<R, W>(conn: &Connection, reader: R, writer: W) -> anyhow::Result<LoopStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = Session::open(reader, writer).await?;
    session
        .run_loop(|event, data| dispatch(conn, event, data))
        .await
}
