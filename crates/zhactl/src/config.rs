//! CLI configuration -- thin wrapper around `zhactl_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (`--url`,
//! `--token`, `--profile`).

use secrecy::SecretString;

use zhactl_core::HubConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use zhactl_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let names = config.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build a `HubConfig` from the config file, active profile, and flags.
///
/// Flags take priority over profile values. Without a matching profile,
/// `--url` and `--token` (or `HASS_URL` / `HASS_TOKEN`) must both be set.
pub fn build_hub_config(global: &GlobalOpts) -> Result<(String, HubConfig), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let hub = resolve(&cfg, &profile_name, global)?;
    Ok((profile_name, hub))
}

fn resolve(cfg: &Config, profile_name: &str, global: &GlobalOpts) -> Result<HubConfig, CliError> {
    let flag_token = global.token.clone().map(SecretString::from);

    if let Some(stored) = cfg.profiles.get(profile_name) {
        let mut profile = stored.clone();
        if let Some(url) = &global.url {
            profile.url.clone_from(url);
        }
        let token = match flag_token {
            Some(token) => token,
            None => zhactl_config::resolve_token(&profile, profile_name)?,
        };
        return Ok(zhactl_config::hub_config(&profile, &cfg.defaults, token)?);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name.into(),
            available: available_profiles(cfg),
        });
    }

    // No profile -- build from flags / env alone.
    let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let token = flag_token.ok_or_else(|| CliError::NoToken {
        profile: profile_name.into(),
    })?;
    let profile = Profile {
        url,
        ..Profile::default()
    };
    Ok(zhactl_config::hub_config(&profile, &cfg.defaults, token)?)
}
