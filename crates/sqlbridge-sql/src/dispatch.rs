use crate::bridge::{run_exec, run_query};
use crate::extract::extract;
use rusqlite::Connection;
use sqlbridge_core::error::BridgeError;
use sqlbridge_core::value::{DynamicValue, ResultMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Query,
    Exec,
    Other(String),
}

impl Event {
    pub fn parse(name: &str) -> Self {
        match name {
            "query" => Event::Query,
            "exec" => Event::Exec,
            other => Event::Other(other.to_string()),
        }
    }
}

/// Routes one inbound message to the matching bridge operation.
///
/// Unknown events succeed with `Ok(None)`: nothing to reply, nothing failed.
///
/// Callers must not overlap invocations on the same connection. Every call
/// prepares and runs a fresh statement under SQLite autocommit and keeps no
/// state between calls.
pub fn dispatch(
    conn: &Connection,
    event: &str,
    data: DynamicValue,
) -> Result<Option<ResultMap>, BridgeError> {
    match Event::parse(event) {
        Event::Query => {
            let request = extract(data)?;
            debug!(event, params = request.params.len(), "dispatching query");
            run_query(conn, &request.sql, &request.params).map(Some)
        }
        Event::Exec => {
            let request = extract(data)?;
            debug!(event, params = request.params.len(), "dispatching exec");
            run_exec(conn, &request.sql, &request.params).map(Some)
        }
        Event::Other(_) => Ok(None),
    }
}
