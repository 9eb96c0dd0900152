use thiserror::Error;

/// Top-level error type for the `zhactl-api` crate.
///
/// Covers every failure mode of a hub session: reaching the socket,
/// the auth handshake, correlated requests, and payload decoding.
/// `zhactl-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The WebSocket endpoint could not be reached or upgraded.
    #[error("Cannot connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The peer closed the stream (or it ended) while we were waiting.
    #[error("Connection closed by hub")]
    ConnectionClosed,

    /// A frame could not be sent or received.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Authentication ──────────────────────────────────────────────
    /// The handshake did not end in `auth_ok`.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Requests ────────────────────────────────────────────────────
    /// The hub answered a request with `success: false`.
    ///
    /// `detail` is the full result frame as sent by the hub.
    #[error("{operation} failed: {}", describe_failure(.detail))]
    Operation {
        operation: String,
        detail: serde_json::Value,
    },

    /// Request parameters did not serialize to a JSON object.
    #[error("Invalid parameters for {operation}: {reason}")]
    InvalidParams { operation: String, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization of a result payload failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the handshake was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the socket is gone and nothing further can be sent.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// The server-side error code of an operation failure, if the hub sent one
    /// (e.g. `"not_found"`, `"invalid_format"`).
    pub fn operation_code(&self) -> Option<&str> {
        match self {
            Self::Operation { detail, .. } => detail
                .get("error")
                .and_then(|e| e.get("code"))
                .and_then(serde_json::Value::as_str),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::ConnectionClosed,
            other => Self::WebSocket(other.to_string()),
        }
    }
}

/// Human-readable summary of a failed result frame.
///
/// Home Assistant sends `{"error": {"code": ..., "message": ...}}`; fall back
/// to the compact frame when that shape is missing.
fn describe_failure(detail: &serde_json::Value) -> String {
    let error = detail.get("error");
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(serde_json::Value::as_str);
    let code = error
        .and_then(|e| e.get("code"))
        .and_then(serde_json::Value::as_str);
    match (code, message) {
        (Some(code), Some(message)) => format!("{message} ({code})"),
        (None, Some(message)) => message.to_owned(),
        (Some(code), None) => code.to_owned(),
        (None, None) => detail.to_string(),
    }
}
