use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub path: PathBuf,
    pub busy_timeout: Option<Duration>,
    pub foreign_keys: bool,
    pub create_if_missing: bool,
}

impl DatabaseOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: None,
            foreign_keys: false,
            create_if_missing: true,
        }
    }
}

/// Opens the database file the bridge serves for the whole process lifetime.
pub fn open(options: &DatabaseOptions) -> Result<Connection> {
    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if options.create_if_missing {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }
    let conn = Connection::open_with_flags(&options.path, flags)
        .with_context(|| format!("cannot open db file {}", options.path.display()))?;
    if let Some(timeout) = options.busy_timeout {
        conn.busy_timeout(timeout)?;
    }
    if options.foreign_keys {
        conn.pragma_update(None, "foreign_keys", true)?;
    }
    info!(
        path = %options.path.display(),
        foreign_keys = options.foreign_keys,
        "database opened"
    );
    Ok(conn)
}

pub fn close(conn: Connection) -> Result<()> {
    conn.close()
        .map_err(|(_, err)| anyhow!("cannot close database: {err}"))?;
    info!("database closed");
    Ok(())
}
