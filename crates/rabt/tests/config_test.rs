//! Tests for TOML configuration and API key resolution.

use std::collections::HashMap;
use std::path::PathBuf;

use rabt::{LlmProvider, RabtConfig};
use rabt_core::Timings;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_empty_file_gives_defaults() {
    let config = RabtConfig::from_toml("").expect("parse");
    assert_eq!(config, RabtConfig::default());
    assert_eq!(*config.llm_provider(), LlmProvider::Gemini);
    assert_eq!(config.model(), "gemini-2.5-flash");
    assert_eq!(*config.timings(), Timings::default());
    assert_eq!(config.levels_dir(), &None);
}

#[test]
fn test_full_file() {
    let config = RabtConfig::from_toml(
        r#"
        llm_provider = "anthropic"
        llm_model = "claude-3-5-sonnet-20241022"
        llm_max_tokens = 4096
        storage_path = "/tmp/rabt.json"
        levels_dir = "levels"

        [timings]
        tick_ms = 500
        auto_advance_ms = 2000
        "#,
    )
    .expect("parse");

    assert_eq!(*config.llm_provider(), LlmProvider::Anthropic);
    assert_eq!(config.model(), "claude-3-5-sonnet-20241022");
    assert_eq!(*config.llm_max_tokens(), 4096);
    assert_eq!(config.storage_path(), &PathBuf::from("/tmp/rabt.json"));
    assert_eq!(config.levels_dir(), &Some(PathBuf::from("levels")));
    assert_eq!(config.timings().tick_ms, 500);
    assert_eq!(config.timings().auto_advance_ms, 2000);
    assert_eq!(config.timings().match_delay_ms, 300);
}

#[test]
fn test_unknown_provider_is_an_error() {
    let err = RabtConfig::from_toml("llm_provider = \"mistral\"").expect_err("invalid");
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_zero_tick_period_is_rejected() {
    let err = RabtConfig::from_toml("[timings]\ntick_ms = 0\n").expect_err("zero tick");
    assert!(err.message.contains("tick_ms"));

    let config = RabtConfig::from_toml("[timings]\nmatch_delay_ms = 0\n").expect("parse");
    assert_eq!(config.timings().match_delay_ms, 0);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let config = RabtConfig::load_or_default(dir.path().join("absent.toml")).expect("defaults");
    assert_eq!(config, RabtConfig::default());
    assert!(RabtConfig::from_file(dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_config_file_on_disk() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("rabt.toml");
    std::fs::write(&path, "llm_provider = \"openai\"\n").expect("write");
    let config = RabtConfig::load_or_default(&path).expect("load");
    assert_eq!(*config.llm_provider(), LlmProvider::OpenAI);
    assert_eq!(config.model(), "gpt-4o-mini");
}

#[test]
fn test_provider_key_preferred_over_fallback() {
    let config = RabtConfig::default();
    let llm = config
        .llm_config_from(env(&[("GEMINI_API_KEY", "gem"), ("API_KEY", "generic")]))
        .expect("key");
    assert_eq!(llm.api_key(), "gem");
    assert_eq!(llm.provider(), LlmProvider::Gemini);
    assert_eq!(llm.max_tokens(), 8192);

    let llm = config
        .llm_config_from(env(&[("API_KEY", "generic")]))
        .expect("fallback key");
    assert_eq!(llm.api_key(), "generic");
}

#[test]
fn test_missing_key_is_an_error() {
    let config = RabtConfig::from_toml("llm_provider = \"openai\"").expect("parse");
    let err = config
        .llm_config_from(env(&[("GEMINI_API_KEY", "wrong provider"), ("API_KEY", " ")]))
        .expect_err("no key");
    assert!(err.message.contains("OPENAI_API_KEY"));
}

#[test]
fn test_base_url_override_reaches_llm_config() {
    let config = RabtConfig::from_toml("llm_base_url = \"http://localhost:9000/v1beta/\"")
        .expect("parse");
    let llm = config
        .llm_config_from(env(&[("GEMINI_API_KEY", "k")]))
        .expect("key");
    assert_eq!(llm.base_url(), "http://localhost:9000/v1beta");
}
