pub mod assist;
pub mod auth;
pub mod board;
pub mod config;
pub mod export;
pub mod import;
pub mod journal;
pub mod plan;
pub mod schedule;
pub mod status;
pub mod supplies;
pub mod sync;
pub mod watch;

use anyhow::Result;
use serde_json::{Map, Value};

/// Parse `field=value` arguments into a JSON field map. Values that parse
/// as JSON scalars (numbers, booleans) are kept typed; everything else is
/// a string.
pub fn parse_fields(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected field=value, got '{pair}'"))?;
        let value = match serde_json::from_str::<Value>(value) {
            Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
            _ => Value::String(value.to_string()),
        };
        fields.insert(name.to_string(), value);
    }
    Ok(fields)
}

/// Today's date in the local timezone, `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}
