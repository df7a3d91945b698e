//! JSON frames exchanged with the plugin.
//!
//! Outbound: [`BridgeRequest`] `{id, method, params?}` and the [`WelcomeFrame`]
//! handshake reply. Inbound: [`parse_frame`] classifies each text frame as a
//! control frame (`{"type": ...}`) or a response (`{"id", "result"?}` /
//! `{"id", "error"}`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::CorrelationId;

/// A request sent to the plugin. Immutable once serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Correlation id echoed by the response.
    pub id: CorrelationId,
    /// Plugin operation name.
    pub method: String,
    /// Operation arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl BridgeRequest {
    /// Build a request with a freshly generated correlation id.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: CorrelationId::generate(),
            method: method.into(),
            params,
        }
    }

    /// Serialize to the wire text.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// How the plugin settled a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// `result` payload (`null` when absent).
    Result(Value),
    /// `error` string, surfaced verbatim.
    Error(String),
    /// The frame carried an id but its payload was not understood.
    Malformed(String),
}

/// A response frame with its correlation id.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    /// Id of the request being answered.
    pub id: CorrelationId,
    /// Settlement.
    pub outcome: ResponseOutcome,
}

/// Control frames never touch the pending table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// Plugin finished loading and is ready for requests.
    Ready,
    /// Any other `type` value.
    Other(String),
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// `{"type": ...}`
    Control(ControlFrame),
    /// `{"id": ..., "result"|"error": ...}`
    Response(BridgeResponse),
}

/// Why an inbound frame could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    /// Valid JSON, but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,
    /// Neither a `type` nor a string `id`.
    #[error("frame has neither a type nor a string id")]
    MissingId,
}

/// Handshake reply to `{"type":"ready"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeFrame {
    /// Always `"welcome"`.
    #[serde(rename = "type")]
    pub frame_type: String,
    /// Bridge crate version.
    pub bridge_version: String,
    /// Port the bridge is bound to.
    pub port: u16,
}

impl WelcomeFrame {
    /// Welcome frame for a bridge bound to `port`.
    pub fn new(port: u16) -> Self {
        Self {
            frame_type: "welcome".to_owned(),
            bridge_version: crate::constants::VERSION.to_owned(),
            port,
        }
    }
}

/// Classify one inbound text frame.
pub fn parse_frame(text: &str) -> Result<InboundFrame, FrameError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| FrameError::InvalidJson(e.to_string()))?;
    let Value::Object(mut obj) = value else {
        return Err(FrameError::NotAnObject);
    };

    if let Some(Value::String(kind)) = obj.get("type") {
        let control = match kind.as_str() {
            "ready" => ControlFrame::Ready,
            other => ControlFrame::Other(other.to_owned()),
        };
        return Ok(InboundFrame::Control(control));
    }

    let id = match obj.remove("id") {
        Some(Value::String(id)) => CorrelationId::from_string(id),
        _ => return Err(FrameError::MissingId),
    };

    Ok(InboundFrame::Response(BridgeResponse {
        id,
        outcome: outcome_of(&mut obj),
    }))
}

fn outcome_of(obj: &mut Map<String, Value>) -> ResponseOutcome {
    match obj.remove("error") {
        None | Some(Value::Null) => {
            ResponseOutcome::Result(obj.remove("result").unwrap_or(Value::Null))
        }
        Some(Value::String(message)) => ResponseOutcome::Error(message),
        Some(other) => ResponseOutcome::Malformed(format!(
            "error field must be a string, got {}",
            json_kind(&other)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn request_serializes_without_absent_params() {
        let req = BridgeRequest {
            id: CorrelationId::from("req_1_aaaaaaa"),
            method: "refreshVariables".into(),
            params: None,
        };
        let v: Value = serde_json::from_str(&req.to_text().unwrap()).unwrap();
        assert_eq!(v, json!({"id": "req_1_aaaaaaa", "method": "refreshVariables"}));
    }

    #[test]
    fn request_serializes_params() {
        let req = BridgeRequest::new("getVariables", Some(json!({"fileKey": "abc"})));
        let v: Value = serde_json::from_str(&req.to_text().unwrap()).unwrap();
        assert_eq!(v["method"], "getVariables");
        assert_eq!(v["params"]["fileKey"], "abc");
        assert!(v["id"].as_str().unwrap().starts_with("req_"));
    }

    #[test]
    fn ready_is_control() {
        assert_eq!(
            parse_frame(r#"{"type":"ready"}"#).unwrap(),
            InboundFrame::Control(ControlFrame::Ready)
        );
    }

    #[test]
    fn unknown_type_is_control() {
        assert_eq!(
            parse_frame(r#"{"type":"log","id":"req_1_x"}"#).unwrap(),
            InboundFrame::Control(ControlFrame::Other("log".into()))
        );
    }

    #[test]
    fn result_response() {
        let frame = parse_frame(r#"{"id":"req_1_abc","result":{"variables":[]}}"#).unwrap();
        assert_matches!(frame, InboundFrame::Response(BridgeResponse { id, outcome }) => {
            assert_eq!(id.as_str(), "req_1_abc");
            assert_eq!(outcome, ResponseOutcome::Result(json!({"variables": []})));
        });
    }

    #[test]
    fn missing_result_is_null() {
        let frame = parse_frame(r#"{"id":"req_1_abc"}"#).unwrap();
        assert_matches!(
            frame,
            InboundFrame::Response(BridgeResponse { outcome: ResponseOutcome::Result(Value::Null), .. })
        );
    }

    #[test]
    fn error_response() {
        let frame = parse_frame(r#"{"id":"req_1_abc","error":"Node not found"}"#).unwrap();
        assert_matches!(frame, InboundFrame::Response(BridgeResponse { outcome, .. }) => {
            assert_eq!(outcome, ResponseOutcome::Error("Node not found".into()));
        });
    }

    #[test]
    fn null_error_falls_back_to_result() {
        let frame = parse_frame(r#"{"id":"req_1_abc","error":null,"result":7}"#).unwrap();
        assert_matches!(frame, InboundFrame::Response(BridgeResponse { outcome, .. }) => {
            assert_eq!(outcome, ResponseOutcome::Result(json!(7)));
        });
    }

    #[test]
    fn non_string_error_is_malformed() {
        let frame = parse_frame(r#"{"id":"req_1_abc","error":{"code":1}}"#).unwrap();
        assert_matches!(frame, InboundFrame::Response(BridgeResponse {
            outcome: ResponseOutcome::Malformed(reason), ..
        }) => {
            assert!(reason.contains("object"));
        });
    }

    #[test]
    fn invalid_frames() {
        assert_matches!(parse_frame("not json"), Err(FrameError::InvalidJson(_)));
        assert_eq!(parse_frame("[1,2]"), Err(FrameError::NotAnObject));
        assert_eq!(parse_frame(r#"{"result":1}"#), Err(FrameError::MissingId));
        assert_eq!(parse_frame(r#"{"id":42,"result":1}"#), Err(FrameError::MissingId));
    }

    #[test]
    fn welcome_frame_shape() {
        let v = serde_json::to_value(WelcomeFrame::new(5455)).unwrap();
        assert_eq!(v["type"], "welcome");
        assert_eq!(v["port"], 5455);
        assert_eq!(v["bridgeVersion"], crate::constants::VERSION);
    }
}
