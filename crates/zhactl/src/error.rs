//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use zhactl_config::ConfigError;
use zhactl_core::CoreError;

/// Process exit codes. Success is 0.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to hub at {url}: {reason}")]
    #[diagnostic(
        code(zhactl::connection_failed),
        help(
            "Check that Home Assistant is running and reachable.\n\
             Use the base URL, e.g. http://homeassistant.local:8123"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Hub closed the connection")]
    #[diagnostic(code(zhactl::disconnected))]
    Disconnected,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(zhactl::auth_failed),
        help(
            "Create a long-lived access token under your Home Assistant user profile.\n\
             Store it with: zhactl config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No access token configured for profile '{profile}'")]
    #[diagnostic(
        code(zhactl::no_token),
        help(
            "Pass --token, set HASS_TOKEN, or run: zhactl config set-token\n\
             Or configure one with: zhactl config init"
        )
    )]
    NoToken { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(zhactl::not_found),
        help("Run: zhactl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Device {ieee} is known to the coordinator but missing from the device registry")]
    #[diagnostic(
        code(zhactl::ghost_device),
        help("Re-pair the device or reload the ZHA integration, then retry.")
    )]
    GhostDevice { ieee: String },

    // ── Hub ──────────────────────────────────────────────────────────
    #[error("Hub error ({code}): {message}")]
    #[diagnostic(code(zhactl::hub_error))]
    HubError { code: String, message: String },

    #[error("Rename #{failed} of {total} failed after {applied} succeeded: {message}")]
    #[diagnostic(
        code(zhactl::partial_apply),
        help(
            "Renames before the failing one were applied and are not rolled back.\n\
             Fix the cause and re-run: already-applied names are skipped as unchanged."
        )
    )]
    PartialApply {
        failed: usize,
        total: usize,
        applied: usize,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(zhactl::validation))]
    Validation { field: String, reason: String },

    #[error("{}: line {line}: {reason}", .path.display())]
    #[diagnostic(
        code(zhactl::csv),
        help("CSV files are semicolon-separated with a header row.")
    )]
    Csv {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(zhactl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: zhactl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No hub configured")]
    #[diagnostic(
        code(zhactl::no_config),
        help(
            "Pass --url and --token, set HASS_URL and HASS_TOKEN,\n\
             or create a profile with: zhactl config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(zhactl::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(zhactl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(zhactl::internal))]
    Internal { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoToken { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::GhostDevice { .. } => exit_code::NOT_FOUND,
            Self::PartialApply { .. } => exit_code::PARTIAL,
            Self::Validation { .. } | Self::Csv { .. } | Self::NonInteractiveRequiresYes { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Fill in the profile name on authentication failures.
    pub fn with_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile.to_owned(),
                message,
            },
            other => other,
        }
    }

    /// Translate an apply failure, which needs the plan size for context.
    pub fn from_apply(err: CoreError, total: usize) -> Self {
        match err {
            CoreError::ApplyFailed {
                index,
                applied,
                source,
            } => Self::PartialApply {
                failed: index + 1,
                total,
                applied: applied.len(),
                message: source.to_string(),
            },
            other => other.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::HubDisconnected => CliError::Disconnected,

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::GhostDevice { ieee } => CliError::GhostDevice { ieee },

            CoreError::OperationFailed {
                operation: _,
                message,
                code,
            } => CliError::HubError {
                code: code.unwrap_or_else(|| "unknown".into()),
                message,
            },

            ref apply @ CoreError::ApplyFailed { ref applied, .. } => {
                let applied_count = applied.len();
                CliError::PartialApply {
                    failed: applied_count + 1,
                    total: applied_count + 1,
                    applied: applied_count,
                    message: apply.to_string(),
                }
            }

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoToken { profile } => CliError::NoToken { profile },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let not_found: CliError = CoreError::DeviceNotFound {
            identifier: "aa:bb".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let auth: CliError = CoreError::AuthenticationFailed {
            message: "Invalid access token".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let conn: CliError = CoreError::HubDisconnected.into();
        assert_eq!(conn.exit_code(), exit_code::CONNECTION);

        let usage: CliError = ConfigError::Validation {
            field: "url".into(),
            reason: "bad".into(),
        }
        .into();
        assert_eq!(usage.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn apply_failure_reports_position() {
        let err = CoreError::ApplyFailed {
            index: 2,
            applied: Vec::new(),
            source: Box::new(CoreError::OperationFailed {
                operation: "config/device_registry/update".into(),
                message: "Device is locked".into(),
                code: Some("home_assistant_error".into()),
            }),
        };
        let cli = CliError::from_apply(err, 5);
        assert_eq!(cli.exit_code(), exit_code::PARTIAL);
        assert_eq!(
            cli.to_string(),
            "Rename #3 of 5 failed after 0 succeeded: Hub rejected request: Device is locked"
        );
    }

    #[test]
    fn auth_failure_names_profile() {
        let err: CliError = CoreError::AuthenticationFailed {
            message: "Invalid access token".into(),
        }
        .into();
        match err.with_profile("home") {
            CliError::AuthFailed { profile, .. } => assert_eq!(profile, "home"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
