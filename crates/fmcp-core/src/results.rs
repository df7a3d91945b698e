//! Typed result shapes, validated when the plugin's answer arrives.
//!
//! A payload that does not fit the operation's output type becomes
//! [`BridgeError::MalformedResult`]; nothing is coerced.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::BridgeError;
use crate::methods::BridgeMethod;

/// Any JSON object. Read operations return one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PluginObject(Map<String, Value>);

impl PluginObject {
    /// Field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Convert back into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl<'de> Deserialize<'de> for PluginObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object, got {}",
                match other {
                    Value::Null => "null",
                    Value::Bool(_) => "a boolean",
                    Value::Number(_) => "a number",
                    Value::String(_) => "a string",
                    Value::Array(_) => "an array",
                    Value::Object(_) => "an object",
                }
            ))),
        }
    }
}

/// Output of `getLocalStyles`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStyles {
    /// Paint styles.
    pub paint_styles: Vec<Value>,
    /// Text styles.
    pub text_styles: Vec<Value>,
    /// Effect styles.
    pub effect_styles: Vec<Value>,
}

/// One buffered plugin console entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    /// `log`, `warn` or `error`.
    pub level: String,
    /// Unix millis at which the entry was captured.
    pub time: f64,
    /// Logged arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Output of `getConsoleLogs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLogs {
    /// Entries, oldest first.
    pub logs: Vec<ConsoleEntry>,
}

/// Decode a raw result into the operation's output type.
pub fn decode<T: DeserializeOwned>(method: BridgeMethod, value: Value) -> Result<T, BridgeError> {
    serde_json::from_value(value).map_err(|e| BridgeError::MalformedResult {
        method: method.as_str().to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn plugin_object_accepts_objects() {
        let obj: PluginObject =
            decode(BridgeMethod::GetVariables, json!({"variables": []})).unwrap();
        assert_eq!(obj.get("variables"), Some(&json!([])));
        assert_eq!(obj.into_value(), json!({"variables": []}));
    }

    #[test]
    fn plugin_object_rejects_non_objects() {
        let err = decode::<PluginObject>(BridgeMethod::GetVariables, json!([1])).unwrap_err();
        assert_matches!(err, BridgeError::MalformedResult { method, reason } => {
            assert_eq!(method, "getVariables");
            assert!(reason.contains("an array"));
        });
        assert!(decode::<PluginObject>(BridgeMethod::GetVariables, Value::Null).is_err());
    }

    #[test]
    fn local_styles_shape() {
        let styles: LocalStyles = decode(
            BridgeMethod::GetLocalStyles,
            json!({"paintStyles": [{"id": "S:1"}], "textStyles": [], "effectStyles": []}),
        )
        .unwrap();
        assert_eq!(styles.paint_styles.len(), 1);
    }

    #[test]
    fn local_styles_missing_field_is_malformed() {
        let err = decode::<LocalStyles>(BridgeMethod::GetLocalStyles, json!({"paintStyles": []}))
            .unwrap_err();
        assert_eq!(err.code(), crate::errors::MALFORMED_RESULT);
    }

    #[test]
    fn console_logs_shape() {
        let logs: ConsoleLogs = decode(
            BridgeMethod::GetConsoleLogs,
            json!({"logs": [{"level": "warn", "time": 1_700_000_000_000_u64, "args": ["x"]}]}),
        )
        .unwrap();
        assert_eq!(logs.logs[0].level, "warn");
        assert_eq!(logs.logs[0].args, vec![json!("x")]);
    }
}
