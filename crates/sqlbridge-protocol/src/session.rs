use crate::backend::write_message;
use crate::frontend::{read_conn_info, read_message};
use crate::messages::{BackendMessage, ConnInfo, FrontendMessage};
use anyhow::Result;
use sqlbridge_core::value::{DynamicValue, ResultMap};
use std::fmt::Display;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub received: u64,
    pub replied: u64,
    pub failed: u64,
}

/// One host connection: the handshake has been read and the reader is
/// positioned at the first event line.
pub struct Session<R, W> {
    conn_info: ConnInfo,
    reader: R,
    writer: W,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub async fn open(mut reader: R, writer: W) -> Result<Self> {
        let conn_info = read_conn_info(&mut reader).await?;
        info!(
            port = conn_info.port,
            extension_id = %conn_info.extension_id,
            "connection info received"
        );
        Ok(Self {
            conn_info,
            reader,
            writer,
        })
    }

    pub fn conn_info(&self) -> &ConnInfo {
        &self.conn_info
    }

    /// Serves events until the input ends. Each event is handled and
    /// answered before the next line is read, so replies follow arrival
    /// order. Handler errors become error replies and never end the loop;
    /// only stdin/stdout I/O failures do.
    pub async fn run_loop<F, E>(&mut self, mut handler: F) -> Result<LoopStats>
    where
        F: FnMut(&str, DynamicValue) -> std::result::Result<Option<ResultMap>, E>,
        E: Display,
    {
        let mut stats = LoopStats::default();
        loop {
            let reply = match read_message(&mut self.reader).await? {
                FrontendMessage::Terminate => break,
                FrontendMessage::Malformed { reason } => {
                    stats.received += 1;
                    stats.failed += 1;
                    warn!("{reason}");
                    BackendMessage::Error {
                        event: None,
                        message: reason,
                    }
                }
                FrontendMessage::Event { event, data } => {
                    stats.received += 1;
                    match handler(&event, data) {
                        Ok(Some(result)) => BackendMessage::Result { event, result },
                        Ok(None) => {
                            debug!(event = %event, "no reply for event");
                            continue;
                        }
                        Err(err) => {
                            stats.failed += 1;
                            warn!(event = %event, error = %err, "message failed");
                            BackendMessage::Error {
                                event: Some(event),
                                message: err.to_string(),
                            }
                        }
                    }
                }
            };
            write_message(&mut self.writer, &self.conn_info.token, &reply).await?;
            stats.replied += 1;
        }
        info!(
            received = stats.received,
            replied = stats.replied,
            failed = stats.failed,
            "input closed"
        );
        Ok(stats)
    }
}
