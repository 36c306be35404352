//! Error types for decoding API payloads.

/// Errors produced while decoding or encoding API payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The body is not JSON, or lacks the `{code, result: {data}}` shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The envelope carried a code other than 200.
    #[error("response code is not 200 (got {code})")]
    UnexpectedCode { code: i64 },

    /// A request field could not be encoded.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ProtocolError {
    /// The envelope code, when the body was well-formed enough to carry one.
    pub fn code(&self) -> Option<i64> {
        match self {
            ProtocolError::UnexpectedCode { code } => Some(*code),
            _ => None,
        }
    }
}
