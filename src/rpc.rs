//! JSON-RPC 2.0 message shapes.
//!
//! Kept deliberately loose (raw `serde_json::Value` for `params`/`result`)
//! rather than a fully-typed enum per method, mirroring the teacher's own
//! `serde_json::json!` message construction in `lsp_client.rs::request`/
//! `notify` — the method surface here is small and fixed, so a typed
//! request/response envelope plus per-handler param structs is enough.

use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;
pub const REQUEST_CANCELLED: i64 = -32800;

/// A decoded incoming message: either a request (has `id`) or a notification.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub id: Option<Value>,
    pub method: String,
    pub params: Value,
}

impl Incoming {
    /// Parse a raw JSON body into an `Incoming` message.
    ///
    /// Returns `None` if the body does not parse as a JSON object or lacks
    /// a `method` string — the caller logs and skips such bodies rather
    /// than erroring (there is no `id` to reply to).
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        let obj = value.as_object()?;
        let method = obj.get("method")?.as_str()?.to_string();
        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        let params = if params.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            params
        };
        let id = obj.get("id").cloned();
        Some(Self { id, method, params })
    }

    #[must_use]
    pub fn is_request(&self) -> bool {
        self.id.is_some()
    }

    /// The stable textual key used for in-flight/cancellation lookups.
    #[must_use]
    pub fn id_key(&self) -> Option<String> {
        self.id.as_ref().map(id_to_key)
    }
}

/// The stable textual form of a JSON-RPC id, used as the in-flight map key.
#[must_use]
pub fn id_to_key(id: &Value) -> String {
    id.to_string()
}

#[derive(Serialize)]
pub struct ResponseOk {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Value,
}

#[derive(Serialize)]
pub struct ResponseErr {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub error: ErrorObject,
}

#[derive(Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Serialize)]
pub struct OutgoingNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
}

#[must_use]
pub fn encode_result(id: Value, result: Value) -> String {
    serde_json::to_string(&ResponseOk {
        jsonrpc: JSONRPC_VERSION,
        id,
        result,
    })
    .unwrap_or_default()
}

#[must_use]
pub fn encode_error(id: Value, code: i64, message: impl Into<String>) -> String {
    serde_json::to_string(&ResponseErr {
        jsonrpc: JSONRPC_VERSION,
        id,
        error: ErrorObject {
            code,
            message: message.into(),
        },
    })
    .unwrap_or_default()
}

#[must_use]
pub fn encode_notification(method: impl Into<String>, params: Value) -> String {
    serde_json::to_string(&OutgoingNotification {
        jsonrpc: JSONRPC_VERSION,
        method: method.into(),
        params,
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_request_with_id() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"x":1}}"#;
        let msg = Incoming::parse(body).unwrap();
        assert_eq!(msg.method, "initialize");
        assert!(msg.is_request());
        assert_eq!(msg.id, Some(json!(1)));
    }

    #[test]
    fn parses_notification_without_id() {
        let body = r#"{"jsonrpc":"2.0","method":"exit"}"#;
        let msg = Incoming::parse(body).unwrap();
        assert!(!msg.is_request());
        assert_eq!(msg.params, json!({}));
    }

    #[test]
    fn missing_method_yields_none() {
        assert!(Incoming::parse(r#"{"jsonrpc":"2.0","id":1}"#).is_none());
    }

    #[test]
    fn non_object_body_yields_none() {
        assert!(Incoming::parse("[1,2,3]").is_none());
        assert!(Incoming::parse("not json").is_none());
    }

    #[test]
    fn string_and_numeric_ids_have_distinct_stable_keys() {
        let a = Incoming::parse(r#"{"method":"m","id":"abc"}"#).unwrap();
        let b = Incoming::parse(r#"{"method":"m","id":1}"#).unwrap();
        assert_ne!(a.id_key(), b.id_key());
    }
}
