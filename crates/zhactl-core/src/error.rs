// ── Core error types ──
//
// User-facing errors from zhactl-core. Consumers never see raw frames or
// tungstenite errors; the `From<zhactl_api::Error>` impl translates
// transport-layer failures into domain-appropriate variants.

use thiserror::Error;

use crate::plan::AppliedChange;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to hub at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Hub closed the connection")]
    HubDisconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Device {ieee} is not in the device registry")]
    GhostDevice { ieee: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Hub rejected request: {message}")]
    OperationFailed {
        operation: String,
        message: String,
        /// Hub error code (e.g. `"not_found"`), if sent.
        code: Option<String>,
    },

    /// A plan was partially applied. `applied` lists the changes that went
    /// through before change `index` failed; nothing after it was attempted.
    #[error("Change #{} failed after {} applied: {source}", .index + 1, .applied.len())]
    ApplyFailed {
        index: usize,
        applied: Vec<AppliedChange>,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<zhactl_api::Error> for CoreError {
    fn from(err: zhactl_api::Error) -> Self {
        let code = err.operation_code().map(str::to_owned);
        match err {
            zhactl_api::Error::Connect { url, reason } => CoreError::ConnectionFailed { url, reason },
            zhactl_api::Error::ConnectionClosed => CoreError::HubDisconnected,
            zhactl_api::Error::WebSocket(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket error: {reason}"),
            },
            zhactl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            zhactl_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            ref op @ zhactl_api::Error::Operation { ref operation, .. } => {
                CoreError::OperationFailed {
                    operation: operation.clone(),
                    message: op.to_string(),
                    code,
                }
            }
            zhactl_api::Error::InvalidParams { operation, reason } => CoreError::ValidationFailed {
                message: format!("{operation}: {reason}"),
            },
            zhactl_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl CoreError {
    /// The hub's error code, for operation failures (including the one
    /// that stopped an apply).
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::OperationFailed { code, .. } => code.as_deref(),
            Self::ApplyFailed { source, .. } => source.code(),
            _ => None,
        }
    }
}
