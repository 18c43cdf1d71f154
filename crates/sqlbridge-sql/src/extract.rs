use sqlbridge_core::error::BridgeError;
use sqlbridge_core::value::DynamicValue;
use std::collections::BTreeMap;

/// Statement text plus positional parameters pulled out of a message payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRequest {
    pub sql: String,
    pub params: Vec<DynamicValue>,
}

/// Validates a `query`/`exec` payload and pulls out its `sql` and `params`.
///
/// A missing `sql` key yields an empty statement and a missing `params` key
/// yields no parameters; neither is an error here. Parameter elements are
/// not inspected, the engine decides at bind time whether it accepts them.
pub fn extract(data: DynamicValue) -> Result<SqlRequest, BridgeError> {
    let mut fields = match data {
        DynamicValue::Map(fields) => fields,
        _ => return Err(BridgeError::Shape),
    };
    let sql = take_string(&mut fields, "sql")?;
    let params = take_list(&mut fields, "params")?;
    Ok(SqlRequest { sql, params })
}

fn take_string(
    fields: &mut BTreeMap<String, DynamicValue>,
    key: &'static str,
) -> Result<String, BridgeError> {
    match fields.remove(key) {
        None => Ok(String::new()),
        Some(DynamicValue::String(s)) => Ok(s),
        Some(other) => Err(BridgeError::Type {
            field: key,
            expected: "string",
            found: other.to_string(),
        }),
    }
}

fn take_list(
    fields: &mut BTreeMap<String, DynamicValue>,
    key: &'static str,
) -> Result<Vec<DynamicValue>, BridgeError> {
    match fields.remove(key) {
        None => Ok(Vec::new()),
        Some(DynamicValue::List(items)) => Ok(items),
        Some(other) => Err(BridgeError::Type {
            field: key,
            expected: "list",
            found: other.to_string(),
        }),
    }
}
