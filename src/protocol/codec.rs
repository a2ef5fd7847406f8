//! Single decode entry point (C1 supplement): turns a raw JSON value into
//! one of the five message shapes the protocol loop understands.
//!
//! The crate's `JsonRpcMessage` enum is `#[serde(untagged)]` and resolves
//! variants by trying each in turn; that's fine for already-trusted
//! values but too permissive for input straight off the wire (a
//! `{"id": null, "method": "x"}` notification would wrongly deserialize
//! as a `Request` since `JsonRpcRequest::id` merely needs to be present,
//! not non-null). This module inspects the raw shape first and picks the
//! right target type before deserializing into it, matching the
//! request-vs-notification rule literally.

use serde_json::Value;

use crate::core::error::{McpError, McpResult};
use crate::protocol::batch::BatchRequest;
use crate::protocol::types::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// A single decoded unit of input. `Batch` carries the still-mixed list of
/// requests/notifications; the protocol loop splits it.
#[derive(Debug, Clone)]
pub enum DecodedMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    Response(JsonRpcResponse),
    Error(JsonRpcError),
    Batch(BatchRequest),
}

/// Decode one raw JSON value. Any structural problem (missing `method`,
/// wrong shape for the implied variant) is returned as `McpError::Protocol`,
/// which the caller maps onto `INVALID_REQUEST` — true parse failures
/// (invalid JSON bytes) are the transport's concern, upstream of this call.
pub fn decode(value: Value) -> McpResult<DecodedMessage> {
    if value.is_array() {
        let batch: BatchRequest = serde_json::from_value(value)
            .map_err(|e| McpError::Protocol(format!("malformed batch: {e}")))?;
        return Ok(DecodedMessage::Batch(batch));
    }

    let Value::Object(ref map) = value else {
        return Err(McpError::Protocol(
            "message must be a JSON object or array".to_string(),
        ));
    };

    if map.contains_key("error") {
        let err: JsonRpcError = serde_json::from_value(value)
            .map_err(|e| McpError::Protocol(format!("malformed error response: {e}")))?;
        return Ok(DecodedMessage::Error(err));
    }
    if map.contains_key("result") {
        let resp: JsonRpcResponse = serde_json::from_value(value)
            .map_err(|e| McpError::Protocol(format!("malformed response: {e}")))?;
        return Ok(DecodedMessage::Response(resp));
    }
    if !map.contains_key("method") {
        return Err(McpError::Protocol(
            "message has neither method, result, nor error".to_string(),
        ));
    }

    let has_live_id = matches!(map.get("id"), Some(id) if !id.is_null());
    if has_live_id {
        let req: JsonRpcRequest = serde_json::from_value(value)
            .map_err(|e| McpError::Protocol(format!("malformed request: {e}")))?;
        Ok(DecodedMessage::Request(req))
    } else {
        let notif: JsonRpcNotification = serde_json::from_value(value)
            .map_err(|e| McpError::Protocol(format!("malformed notification: {e}")))?;
        Ok(DecodedMessage::Notification(notif))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_with_id_decodes_as_request() {
        let msg = decode(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).unwrap();
        assert!(matches!(msg, DecodedMessage::Request(_)));
    }

    #[test]
    fn missing_id_decodes_as_notification() {
        let msg = decode(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).unwrap();
        assert!(matches!(msg, DecodedMessage::Notification(_)));
    }

    #[test]
    fn null_id_decodes_as_notification() {
        let msg = decode(json!({"jsonrpc": "2.0", "id": null, "method": "notifications/initialized"})).unwrap();
        assert!(matches!(msg, DecodedMessage::Notification(_)));
    }

    #[test]
    fn result_decodes_as_response() {
        let msg = decode(json!({"jsonrpc": "2.0", "id": 1, "result": {}})).unwrap();
        assert!(matches!(msg, DecodedMessage::Response(_)));
    }

    #[test]
    fn array_decodes_as_batch() {
        let msg = decode(json!([
            {"jsonrpc": "2.0", "id": 1, "method": "ping"},
            {"jsonrpc": "2.0", "method": "notifications/initialized"}
        ]))
        .unwrap();
        match msg {
            DecodedMessage::Batch(batch) => assert_eq!(batch.len(), 2),
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[test]
    fn missing_method_is_protocol_error() {
        let err = decode(json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }

    #[test]
    fn non_object_non_array_is_protocol_error() {
        let err = decode(json!("just a string")).unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }
}
