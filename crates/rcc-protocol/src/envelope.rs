//! Response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::SUCCESS_CODE;

/// Response envelope shared by all JSON endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Service-level status code (200 on success).
    pub code: i64,
    /// Result wrapper.
    pub result: ApiResult<T>,
}

/// The `result` member of the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResult<T> {
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    /// Wrap `data` in a successful envelope.
    pub fn ok(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            result: ApiResult { data },
        }
    }
}

/// Decode a response body into the `data` payload.
///
/// The code is checked before the payload so that an error response with
/// an unexpected `result` shape still reports the code.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProtocolError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ProtocolError::Malformed(format!("invalid JSON: {}", e)))?;

    let code = value
        .get("code")
        .and_then(|c| c.as_i64())
        .ok_or_else(|| ProtocolError::Malformed("missing `code`".to_string()))?;

    if code != SUCCESS_CODE {
        return Err(ProtocolError::UnexpectedCode { code });
    }

    let data = value
        .get("result")
        .and_then(|r| r.get("data"))
        .cloned()
        .ok_or_else(|| ProtocolError::Malformed("missing `result.data`".to_string()))?;

    serde_json::from_value(data).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::StartData;
    use serde_json::json;

    #[test]
    fn test_decode_success() {
        let body = json!({"code": 200, "result": {"data": {"task_id": "t-1"}}});
        let data: StartData = decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(data.task_id, "t-1");
    }

    #[test]
    fn test_decode_unexpected_code() {
        let body = json!({"code": 500, "errors": ["boom"]});
        let err = decode::<StartData>(body.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.code(), Some(500));
    }

    #[test]
    fn test_decode_not_json() {
        let err = decode::<StartData>(b"<html>502</html>").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_decode_missing_data() {
        let body = json!({"code": 200, "result": {}});
        let err = decode::<StartData>(body.to_string().as_bytes()).unwrap_err();
        assert!(err.to_string().contains("result.data"));
    }

    #[test]
    fn test_envelope_ok_serializes() {
        let env = ApiEnvelope::ok(StartData { task_id: "abc".to_string() });
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["code"], 200);
        assert_eq!(value["result"]["data"]["task_id"], "abc");
    }
}
