//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<SecretString, CliError> {
    let token = rpassword::prompt_password("Long-lived access token: ").map_err(prompt_err)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(SecretString::from(token.to_owned()))
}

/// Copy of `cfg` with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(REDACTED.into());
        }
    }
    cfg
}

fn config_detail(cfg: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Config file:     {}", config::config_path().display());
    let _ = writeln!(
        out,
        "Default profile: {}",
        cfg.default_profile.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "Output:          {}", cfg.defaults.output);
    let _ = writeln!(out, "Color:           {}", cfg.defaults.color);
    let _ = writeln!(out, "Battery below:   {}%", cfg.defaults.battery_threshold);
    let _ = write!(out, "Identifier tag:  {}", cfg.defaults.identifier_domain);

    for name in cfg.profile_names() {
        let Some(p) = cfg.profiles.get(name) else {
            continue;
        };
        let _ = write!(out, "\n\n[{name}]\n  url:   {}", p.url);
        let token = match (&p.token_env, &p.token) {
            (Some(var), _) => format!("${var}"),
            (None, Some(t)) => t.clone(),
            (None, None) => "(keyring)".into(),
        };
        let _ = write!(out, "\n  token: {token}");
        if let Some(t) = p.battery_threshold {
            let _ = write!(out, "\n  battery_threshold: {t}");
        }
        if let Some(ieee) = &p.coordinator_ieee {
            let _ = write!(out, "\n  coordinator_ieee: {ieee}");
        }
        if let Some(domain) = &p.identifier_domain {
            let _ = write!(out, "\n  identifier_domain: {domain}");
        }
    }
    out
}

/// `name` lines, `*` marking the default.
fn profile_lines(cfg: &Config) -> Vec<String> {
    let default = cfg.default_profile.as_deref();
    cfg.profile_names()
        .into_iter()
        .map(|name| {
            if Some(name) == default {
                format!("{name} *")
            } else {
                name.to_owned()
            }
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, config_detail, |c| {
                c.profile_names().join("\n")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: zhactl config init");
            } else {
                output::print_output(&profile_lines(&cfg).join("\n"), global.quiet);
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetToken => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let token = prompt_token()?;
            zhactl_config::store_token(&profile_name, &token)?;
            if !global.quiet {
                eprintln!("✓ Token for '{profile_name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

/// Interactive wizard: adds or replaces one profile and makes it the default.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("zhactl configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("Home Assistant URL")
        .default("http://homeassistant.local:8123".into())
        .validate_with(|input: &String| {
            zhactl_config::parse_hub_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let token = prompt_token()?;

    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the token?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let plaintext = if store_selection == 0 {
        zhactl_config::store_token(&profile_name, &token)?;
        eprintln!("   ✓ Token stored in system keyring");
        None
    } else {
        Some(token.expose_secret().to_owned())
    };

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            url: url.trim().to_owned(),
            token: plaintext,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    let written = config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!("\n✓ Configuration written to {}", written.display());
        eprintln!("  Active profile: {profile_name}");
        eprintln!("\n  Test it: zhactl devices list");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Config {
        let mut cfg = Config::default();
        cfg.default_profile = Some("home".into());
        cfg.profiles.insert(
            "home".into(),
            Profile {
                url: "http://homeassistant.local:8123".into(),
                token: Some("secret-token".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert(
            "cabin".into(),
            Profile {
                url: "http://10.0.0.9:8123".into(),
                token_env: Some("CABIN_TOKEN".into()),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn show_never_prints_plaintext_tokens() {
        let text = config_detail(&redacted(&sample()));
        assert!(!text.contains("secret-token"));
        assert!(text.contains(REDACTED));
        assert!(text.contains("token: $CABIN_TOKEN"));
    }

    #[test]
    fn profiles_marks_default() {
        assert_eq!(profile_lines(&sample()), vec!["cabin", "home *"]);
    }
}
