use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_with(None, env_from(&[]));
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
    assert_eq!(settings.ledger_url, None);
    assert_eq!(settings.max_body_bytes, 64 * 1024);
}

#[test]
fn file_values_are_overridden_by_env() {
    let file = r#"
bind_addr = "0.0.0.0:9000"
ledger_url = "https://ledger.example/file"
max_body_bytes = "2048"
"#;
    let settings = load_settings_with(
        Some(file),
        env_from(&[("LEDGER_URL", "https://ledger.example/env")]),
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(
        settings.ledger_url.as_deref(),
        Some("https://ledger.example/env")
    );
    assert_eq!(settings.max_body_bytes, 2048);
}

#[test]
fn prefixed_env_wins_over_bare_env() {
    let settings = load_settings_with(
        None,
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
            ("LEDGER_URL", "https://a.example"),
            ("APP__LEDGER_URL", "https://b.example"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.ledger_url.as_deref(), Some("https://b.example"));
}

#[test]
fn invalid_body_limit_keeps_default() {
    let settings = load_settings_with(None, env_from(&[("APP__MAX_BODY_BYTES", "lots")]));
    assert_eq!(settings.max_body_bytes, 64 * 1024);
}

#[test]
fn missing_ledger_url_is_a_config_error() {
    let settings = Settings::default();
    assert!(matches!(
        LedgerConfig::from_settings(&settings),
        Err(ConfigError::MissingLedgerUrl)
    ));

    let blank = Settings {
        ledger_url: Some("   ".into()),
        ..Settings::default()
    };
    assert!(matches!(
        LedgerConfig::from_settings(&blank),
        Err(ConfigError::MissingLedgerUrl)
    ));
}

#[test]
fn malformed_or_non_http_ledger_url_is_rejected() {
    let malformed = Settings {
        ledger_url: Some("not a url".into()),
        ..Settings::default()
    };
    assert!(matches!(
        LedgerConfig::from_settings(&malformed),
        Err(ConfigError::InvalidLedgerUrl { .. })
    ));

    let ftp = Settings {
        ledger_url: Some("ftp://ledger.example/exec".into()),
        ..Settings::default()
    };
    assert!(matches!(
        LedgerConfig::from_settings(&ftp),
        Err(ConfigError::UnsupportedScheme { .. })
    ));
}

#[test]
fn valid_ledger_url_is_trimmed_and_parsed() {
    let settings = Settings {
        ledger_url: Some("  https://script.example/macros/s/abc/exec  ".into()),
        ..Settings::default()
    };
    let ledger = LedgerConfig::from_settings(&settings).expect("ledger config");
    assert_eq!(ledger.url.as_str(), "https://script.example/macros/s/abc/exec");
}
