use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Batch, Connection, Statement};
use sqlbridge_core::error::{BridgeError, Operation};
use sqlbridge_core::value::{DynamicValue, Number, ResultMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
enum StatementError {
    #[error("empty SQL statement")]
    Empty,
    #[error("only one SQL statement is allowed per message")]
    MultipleStatements,
    #[error("parameter {position} targets placeholder {index}, which is already bound")]
    PlaceholderConflict { position: usize, index: usize },
    #[error("parameter {position} has unsupported type {kind}")]
    UnsupportedParam {
        position: usize,
        kind: &'static str,
    },
    #[error("text in column `{column}` is not valid UTF-8")]
    InvalidText { column: String },
}

/// Runs a read statement and materializes every row before returning.
///
/// Rows keep engine order and columns keep statement order. Any failure
/// while reading rows discards what was read so far.
pub fn run_query(
    conn: &Connection,
    sql: &str,
    params: &[DynamicValue],
) -> Result<ResultMap, BridgeError> {
    let op = Operation::Query;
    let mut stmt = prepare(conn, sql, op)?;
    bind_params(&mut stmt, params, op)?;

    let columns = column_names(&stmt)?;
    let mut result_rows = Vec::new();
    let mut rows = stmt.raw_query();
    loop {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            // nothing has been produced yet, so the statement itself failed
            Err(err) if result_rows.is_empty() => return Err(BridgeError::execution(op, err)),
            Err(err) => return Err(BridgeError::scan(result_rows.len(), err)),
        };
        let mut values = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let raw = row
                .get_ref(idx)
                .map_err(|e| BridgeError::scan(result_rows.len(), e))?;
            let value =
                value_from_ref(raw, column).map_err(|e| BridgeError::scan(result_rows.len(), e))?;
            values.push(value);
        }
        result_rows.push(DynamicValue::List(values));
    }
    debug!(columns = columns.len(), rows = result_rows.len(), "query materialized");

    let mut result = ResultMap::new();
    result.insert("rows".into(), DynamicValue::List(result_rows));
    Ok(result)
}

/// Runs a side-effecting statement to completion. Rows it yields are dropped
/// and the reply never carries an affected-row count.
pub fn run_exec(
    conn: &Connection,
    sql: &str,
    params: &[DynamicValue],
) -> Result<ResultMap, BridgeError> {
    let op = Operation::Exec;
    let mut stmt = prepare(conn, sql, op)?;
    bind_params(&mut stmt, params, op)?;

    let mut rows = stmt.raw_query();
    while rows
        .next()
        .map_err(|e| BridgeError::execution(op, e))?
        .is_some()
    {}
    debug!(changes = conn.changes(), "exec finished");

    let mut result = ResultMap::new();
    result.insert("done".into(), DynamicValue::Bool(true));
    Ok(result)
}

/// Compiles exactly one statement. SQL with nothing to run (blank or
/// comments only) and SQL with a second statement after the first are both
/// rejected before anything executes.
fn prepare<'c>(
    conn: &'c Connection,
    sql: &str,
    op: Operation,
) -> Result<Statement<'c>, BridgeError> {
    let mut batch = Batch::new(conn, sql);
    let stmt = batch
        .next()
        .map_err(|e| BridgeError::execution(op, e))?
        .ok_or_else(|| BridgeError::execution(op, StatementError::Empty))?;
    match batch.next() {
        Ok(None) => Ok(stmt),
        // a tail that fails to compile is still a second statement
        Ok(Some(_)) | Err(_) => Err(BridgeError::execution(
            op,
            StatementError::MultipleStatements,
        )),
    }
}

/// `params[i]` goes to placeholder `$<i+1>` when the statement names one,
/// otherwise to ordinal `i+1` (plain `?` placeholders). Every slot is bound
/// exactly once.
fn bind_params(
    stmt: &mut Statement<'_>,
    params: &[DynamicValue],
    op: Operation,
) -> Result<(), BridgeError> {
    let expected = stmt.parameter_count();
    if params.len() != expected {
        return Err(BridgeError::execution(
            op,
            rusqlite::Error::InvalidParameterCount(params.len(), expected),
        ));
    }
    let mut bound = vec![false; expected];
    for (i, param) in params.iter().enumerate() {
        let position = i + 1;
        let index = stmt
            .parameter_index(&format!("${position}"))
            .map_err(|e| BridgeError::execution(op, e))?
            .unwrap_or(position);
        // equal counts mean a slot bound twice leaves another one empty
        if std::mem::replace(&mut bound[index - 1], true) {
            return Err(BridgeError::execution(
                op,
                StatementError::PlaceholderConflict { position, index },
            ));
        }
        let value = to_sql_value(position, param).map_err(|e| BridgeError::execution(op, e))?;
        stmt.raw_bind_parameter(index, value)
            .map_err(|e| BridgeError::execution(op, e))?;
    }
    Ok(())
}

fn to_sql_value(position: usize, value: &DynamicValue) -> Result<Value, StatementError> {
    Ok(match value {
        DynamicValue::Null => Value::Null,
        DynamicValue::Bool(b) => Value::Integer(i64::from(*b)),
        DynamicValue::Number(Number::Int(i)) => Value::Integer(*i),
        DynamicValue::Number(Number::Float(f)) => Value::Real(*f),
        DynamicValue::String(s) => Value::Text(s.clone()),
        DynamicValue::List(_) | DynamicValue::Map(_) => {
            return Err(StatementError::UnsupportedParam {
                position,
                kind: value.type_name(),
            })
        }
    })
}

fn column_names(stmt: &Statement<'_>) -> Result<Vec<String>, BridgeError> {
    (0..stmt.column_count())
        .map(|idx| {
            stmt.column_name(idx)
                .map(str::to_string)
                .map_err(BridgeError::column)
        })
        .collect()
}

fn value_from_ref(value: ValueRef<'_>, column: &str) -> Result<DynamicValue, StatementError> {
    Ok(match value {
        ValueRef::Null => DynamicValue::Null,
        ValueRef::Integer(v) => DynamicValue::Number(Number::Int(v)),
        ValueRef::Real(v) => DynamicValue::Number(Number::Float(v)),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => DynamicValue::String(text.to_string()),
            Err(_) => {
                return Err(StatementError::InvalidText {
                    column: column.to_string(),
                })
            }
        },
        ValueRef::Blob(bytes) => DynamicValue::String(STANDARD.encode(bytes)),
    })
}
