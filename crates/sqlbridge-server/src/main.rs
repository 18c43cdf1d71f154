mod config;
mod server;

use clap::Parser;
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::FmtSubscriber;

/// Serves SQL over stdin/stdout for a host application.
#[derive(Debug, Parser)]
#[command(name = "sqlbridge", version)]
pub struct Args {
    /// SQLite database file, overrides `database.path` from the config file.
    pub database: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;

    // stdout carries replies, so logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_max_level(config.log_level()?)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    server::run(config).await?;
    Ok(())
}
