#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use zhactl_config::{Config, Profile, load_config_from, save_config_to};

const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
output = "json"

[profiles.home]
url = "http://homeassistant.local:8123"
token_env = "HOME_HASS_TOKEN"
battery_threshold = 30.0

[profiles.lab]
url = "ws://10.0.0.5:8123"
coordinator_ieee = "00:12:4b:00:00:00:00:01"
"#;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    assert_eq!(cfg.defaults.output, "table");
    assert_eq!(cfg.defaults.identifier_domain, "zha");
    assert!(cfg.profiles.is_empty());
}

#[test]
fn file_layers_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.default_profile.as_deref(), Some("home"));
    assert_eq!(cfg.defaults.output, "json");
    // Unset keys inside a present table keep their serde defaults.
    assert_eq!(cfg.defaults.color, "auto");
    assert_eq!(cfg.profile_names(), vec!["home", "lab"]);

    let home = &cfg.profiles["home"];
    assert_eq!(home.token_env.as_deref(), Some("HOME_HASS_TOKEN"));
    assert_eq!(home.battery_threshold, Some(30.0));
    assert_eq!(home.token, None);

    let lab = &cfg.profiles["lab"];
    assert_eq!(lab.coordinator_ieee.as_deref(), Some("00:12:4b:00:00:00:00:01"));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[profiles.home]\nurl = 42\n").unwrap();
    assert!(load_config_from(&path).is_err());
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.default_profile = Some("home".into());
    cfg.profiles.insert(
        "home".into(),
        Profile {
            url: "https://hub.example".into(),
            token: Some("secret".into()),
            ..Profile::default()
        },
    );
    save_config_to(&cfg, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[profiles.home]"));
    assert!(!written.contains("token_env"));

    assert_eq!(load_config_from(&path).unwrap(), cfg);
}
