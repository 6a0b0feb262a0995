//! Query-parameter sanitization.
//!
//! Raw request payloads routinely carry optional fields the UI left unset.
//! Sending those as query parameters produces `?field=null`-style noise, so
//! the effect task runs every parameter object through [`sanitize`] first.
//!
//! Rules: on a JSON object, members whose value is `null`, an empty string,
//! an empty array, or an empty object are dropped; nested objects are
//! sanitized recursively (and dropped if they come out empty). Non-object
//! values pass through unchanged.

use serde_json::Value;

/// Strip null/empty members from a query-parameter object.
#[must_use]
pub fn sanitize(raw: &Value) -> Value {
    match raw {
        Value::Object(map) => {
            let cleaned: serde_json::Map<String, Value> = map
                .iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::Object(_) => sanitize(value),
                        other => other.clone(),
                    };
                    if is_empty(&value) {
                        None
                    } else {
                        Some((key.clone(), value))
                    }
                })
                .collect();
            Value::Object(cleaned)
        }
        other => other.clone(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
