pub mod list;
pub mod monitor;
pub mod receive;
pub mod send;
pub mod spawn;
pub mod subscribe;

use serde_json::Value;

/// Read a command-line body as JSON when it parses, as a plain string otherwise
pub fn parse_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
