use serde_json::Value;
use thiserror::Error;

/// Server code reported when the request timestamp falls outside the accepted window.
pub const TIMESTAMP_OUTSIDE_RECV_WINDOW: i32 = -1021;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Authentication required for this operation")]
    AuthenticationRequired,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Malformed stream frame: {0}")]
    MalformedFrame(String),

    #[error("Unrecognized event type '{event_type}'")]
    UnrecognizedEvent { event_type: String, payload: Value },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Other error: {0}")]
    Other(String),
}

impl ExchangeError {
    /// True when the server rejected the request because of clock skew.
    pub fn is_timestamp_skew(&self) -> bool {
        matches!(
            self,
            Self::ApiError { code, .. } if *code == TIMESTAMP_OUTSIDE_RECV_WINDOW
        )
    }

    /// Server-reported error code, if any.
    pub fn api_code(&self) -> Option<i32> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// `{code, msg}` error object returned by both REST and stream endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: i64,
    pub msg: String,
}

impl ErrorEnvelope {
    /// Extract the envelope from a decoded JSON document.
    ///
    /// Only top-level objects carrying an integer `code` qualify; array payloads and
    /// objects without a code are ordinary responses.
    pub fn from_value(value: &Value) -> Option<Self> {
        let code = value.as_object()?.get("code")?.as_i64()?;
        let msg = value
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self { code, msg })
    }

    /// Negative codes are failures; some successful writes answer `{"code":200}`.
    pub fn is_error(&self) -> bool {
        self.code < 0
    }
}

impl From<ErrorEnvelope> for ExchangeError {
    fn from(envelope: ErrorEnvelope) -> Self {
        Self::ApiError {
            code: envelope.code as i32,
            message: envelope.msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_requires_integer_code() {
        assert!(ErrorEnvelope::from_value(&json!({"msg": "x"})).is_none());
        assert!(ErrorEnvelope::from_value(&json!([{"code": -1}])).is_none());
        assert!(ErrorEnvelope::from_value(&json!({"code": "bad"})).is_none());

        let env = ErrorEnvelope::from_value(&json!({"code": -1121, "msg": "Invalid symbol."}))
            .unwrap();
        assert_eq!(env.code, -1121);
        assert_eq!(env.msg, "Invalid symbol.");
        assert!(env.is_error());
    }

    #[test]
    fn success_code_is_not_an_error() {
        let env = ErrorEnvelope::from_value(&json!({"code": 200, "msg": "success"})).unwrap();
        assert!(!env.is_error());
    }

    #[test]
    fn timestamp_skew_is_distinguishable() {
        let err: ExchangeError = ErrorEnvelope {
            code: -1021,
            msg: "Timestamp for this request is outside of the recvWindow.".to_string(),
        }
        .into();
        assert!(err.is_timestamp_skew());
        assert_eq!(err.api_code(), Some(-1021));

        let other = ExchangeError::ApiError {
            code: -2019,
            message: "Margin is insufficient.".to_string(),
        };
        assert!(!other.is_timestamp_skew());
    }
}
