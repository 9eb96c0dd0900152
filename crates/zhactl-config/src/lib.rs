//! Configuration for zhactl.
//!
//! TOML profiles, access-token resolution (env + keyring + plaintext),
//! and translation to `zhactl_core::HubConfig`. The CLI layers its own
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use zhactl_core::config::{DEFAULT_BATTERY_THRESHOLD, DEFAULT_IDENTIFIER_DOMAIN};
use zhactl_core::{CoordinatorRule, HubConfig, IeeeAddress};

/// Keyring service name; entries are keyed `<profile>/token`.
pub const KEYRING_SERVICE: &str = "zhactl";

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `ZHACTL_DEFAULTS__OUTPUT=json`.
pub const ENV_PREFIX: &str = "ZHACTL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no access token configured for profile '{profile}'")]
    NoToken { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_battery_threshold")]
    pub battery_threshold: f64,

    #[serde(default = "default_identifier_domain")]
    pub identifier_domain: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            battery_threshold: default_battery_threshold(),
            identifier_domain: default_identifier_domain(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_battery_threshold() -> f64 {
    DEFAULT_BATTERY_THRESHOLD
}
fn default_identifier_domain() -> String {
    DEFAULT_IDENTIFIER_DOMAIN.into()
}

/// A named hub profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Hub base URL (e.g., "http://homeassistant.local:8123").
    pub url: String,

    /// Long-lived access token (plaintext, prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Override the battery threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_threshold: Option<f64>,

    /// Fixed coordinator address. Without it, the device at network
    /// address 0x0000 is the coordinator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinator_ieee: Option<String>,

    /// Override the registry identifier tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_domain: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "zhactl", "zhactl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("zhactl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine), layered as defaults, then
/// the file, then `ZHACTL_` environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution (without CLI flags) ────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
}

/// Resolve the access token from the credential chain (no CLI flag step).
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_token_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        || {
            keyring_entry(profile_name)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(val) = profile.token_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring() {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken {
        profile: profile_name.into(),
    })
}

/// Store `token` in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and check a hub base URL.
pub fn parse_hub_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.trim().parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{other}', expected http(s) or ws(s)"),
        }),
    }
}

/// Check a battery threshold percentage.
pub fn validate_threshold(value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Validation {
            field: "battery_threshold".into(),
            reason: format!("expected a percentage between 0 and 100, got {value}"),
        })
    }
}

/// Build a `HubConfig` from a profile and an already-resolved token.
pub fn hub_config(
    profile: &Profile,
    defaults: &Defaults,
    token: SecretString,
) -> Result<HubConfig, ConfigError> {
    let url = parse_hub_url(&profile.url)?;
    let mut config = HubConfig::new(url, token);

    config.battery_threshold =
        validate_threshold(profile.battery_threshold.unwrap_or(defaults.battery_threshold))?;

    config.coordinator = match profile.coordinator_ieee.as_deref().map(IeeeAddress::new) {
        Some(ieee) if !ieee.is_empty() => CoordinatorRule::Address(ieee),
        _ => CoordinatorRule::NwkZero,
    };

    let domain = profile
        .identifier_domain
        .as_deref()
        .unwrap_or(&defaults.identifier_domain)
        .trim();
    if domain.is_empty() {
        return Err(ConfigError::Validation {
            field: "identifier_domain".into(),
            reason: "must not be empty".into(),
        });
    }
    domain.clone_into(&mut config.identifier_domain);

    Ok(config)
}

/// Build a `HubConfig` from a profile, resolving its token. No CLI flag
/// overrides.
pub fn profile_to_hub_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<HubConfig, ConfigError> {
    let token = resolve_token(profile, profile_name)?;
    hub_config(profile, defaults, token)
}
