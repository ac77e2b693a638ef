use crate::Error;
use crate::convert::{Options, value_to_estree};
use crate::estree::Expression;
use crate::value::Value;

/// Parse JSON text into a runtime value
pub fn parse_json(input: &str) -> Result<Value, Error> {
    let json_value: serde_json::Value =
        serde_json::from_str(input).map_err(|e| Error::InvalidJson(e.to_string()))?;

    Ok(from_json(json_value))
}

/// Convert a serde_json::Value to a runtime value.
///
/// Objects become plain objects with their keys in document order, arrays
/// become dense arrays and every number becomes a double.
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        // Every JSON number is representable as f64 (possibly rounded)
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::array(arr.into_iter().map(from_json)),
        serde_json::Value::Object(obj) => {
            Value::object(obj.into_iter().map(|(key, val)| (key, from_json(val))))
        }
    }
}

/// Serialize an ESTree expression to a serde_json::Value
pub fn estree_to_json(expression: &Expression) -> Result<serde_json::Value, Error> {
    serde_json::to_value(expression)
        .map_err(|e| Error::InvalidJson(format!("Failed to serialize ESTree: {e}")))
}

/// Serialize an ESTree expression to JSON text, pretty-printed unless `minify`
pub fn estree_to_string(expression: &Expression, minify: bool) -> Result<String, Error> {
    let serialized = if minify {
        serde_json::to_string(expression)
    } else {
        serde_json::to_string_pretty(expression)
    };
    serialized.map_err(|e| Error::InvalidJson(format!("Failed to serialize ESTree: {e}")))
}

/// Parse JSON text, convert it, and return the ESTree as minified JSON text
pub fn json_to_estree(input: &str, options: &Options) -> Result<String, Error> {
    let value = parse_json(input)?;
    let expression = value_to_estree(&value, options)?;
    estree_to_string(&expression, true)
}
