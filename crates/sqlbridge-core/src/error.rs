use std::fmt;
use thiserror::Error;

pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`BridgeError`], for callers that branch on
/// the failing stage without matching on variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Shape,
    Type,
    Execution,
    Column,
    Scan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Exec,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Query => f.write_str("query"),
            Operation::Exec => f.write_str("exec"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("data not an object")]
    Shape,
    #[error("field `{field}` is not a {expected}: {found}")]
    Type {
        field: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("cannot {operation}: {source}")]
    Execution {
        operation: Operation,
        #[source]
        source: Cause,
    },
    #[error("cannot get columns: {source}")]
    Column {
        #[source]
        source: Cause,
    },
    #[error("error scanning row {row}: {source}")]
    Scan {
        row: usize,
        #[source]
        source: Cause,
    },
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Shape => ErrorKind::Shape,
            BridgeError::Type { .. } => ErrorKind::Type,
            BridgeError::Execution { .. } => ErrorKind::Execution,
            BridgeError::Column { .. } => ErrorKind::Column,
            BridgeError::Scan { .. } => ErrorKind::Scan,
        }
    }

    pub fn execution(operation: Operation, source: impl Into<Cause>) -> Self {
        BridgeError::Execution {
            operation,
            source: source.into(),
        }
    }

    pub fn column(source: impl Into<Cause>) -> Self {
        BridgeError::Column {
            source: source.into(),
        }
    }

    pub fn scan(row: usize, source: impl Into<Cause>) -> Self {
        BridgeError::Scan {
            row,
            source: source.into(),
        }
    }

    /// Name of the payload field that failed type validation, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            BridgeError::Type { field, .. } => Some(*field),
            _ => None,
        }
    }
}
