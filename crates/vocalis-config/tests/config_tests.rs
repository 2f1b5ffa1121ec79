// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading, env overrides and diagnostics.

use vocalis_config::diagnostic::{figment_to_config_errors, ConfigError};
use vocalis_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "grandpa"
log_level = "debug"

[speech]
max_concurrency = 2
sentence_timeout_secs = 10
reorder_capacity = 4

[memory]
similarity_threshold = 0.8
top_k = 3

[storage]
database_path = "/tmp/vocalis-test.db"

[elevenlabs]
voice_id = "voice-abc"
stability = 0.4
"#;
    let config = load_config_from_str(toml).expect("valid config");
    assert_eq!(config.agent.name, "grandpa");
    assert_eq!(config.speech.max_concurrency, 2);
    assert_eq!(config.speech.reorder_capacity, 4);
    assert_eq!(config.memory.top_k, 3);
    assert!((config.memory.similarity_threshold - 0.8).abs() < f32::EPSILON);
    let voice = config.elevenlabs.voice().expect("voice configured");
    assert_eq!(voice.voice_id, "voice-abc");
    assert!((voice.settings.stability - 0.4).abs() < f32::EPSILON);
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert_eq!(config.agent.name, "vocalis");
    assert_eq!(config.speech.max_concurrency, 3);
    assert_eq!(config.speech.sentence_timeout_secs, 15);
    assert_eq!(config.speech.reorder_capacity, 6);
    assert_eq!(config.memory.top_k, 5);
    assert_eq!(config.memory.cache_ttl_secs, 60);
    assert!(config.elevenlabs.voice().is_none());
    assert!(config.storage.wal_mode);
}

#[test]
fn unknown_key_in_speech_is_rejected() {
    let toml = "[speech]\nmax_concurency = 4\n";
    let errors = load_and_validate_str(toml).expect_err("typo must be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            section,
            suggestion,
            ..
        } => {
            assert_eq!(key, "max_concurency");
            assert_eq!(section, "[speech]");
            assert_eq!(suggestion.as_deref(), Some("max_concurrency"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n").unwrap_err();
    let errors = figment_to_config_errors(err);
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn invalid_type_is_reported() {
    let err = load_config_from_str("[memory]\ntop_k = \"five\"\n").unwrap_err();
    let errors = figment_to_config_errors(err);
    match &errors[0] {
        ConfigError::InvalidType { key, .. } => assert_eq!(key, "memory.top_k"),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

#[test]
fn validation_runs_after_parse() {
    let errors = load_and_validate_str("[speech]\nmax_concurrency = 0\n").unwrap_err();
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "vocalis.toml",
            "[speech]\nmax_concurrency = 2\n[elevenlabs]\nvoice_id = \"from-file\"\n",
        )?;
        jail.set_env("VOCALIS_SPEECH_MAX_CONCURRENCY", "5");
        jail.set_env("VOCALIS_ELEVENLABS_VOICE_ID", "from-env");

        let path = jail.directory().join("vocalis.toml");
        let config = load_config_from_path(&path).expect("config loads");
        assert_eq!(config.speech.max_concurrency, 5);
        assert_eq!(config.elevenlabs.voice_id.as_deref(), Some("from-env"));
        Ok(())
    });
}

#[test]
fn missing_file_is_silently_skipped() {
    figment::Jail::expect_with(|jail| {
        let path = jail.directory().join("does-not-exist.toml");
        let config = load_config_from_path(&path).expect("defaults apply");
        assert_eq!(config.agent.name, "vocalis");
        Ok(())
    });
}

#[test]
fn unknown_key_renders_with_suggestion() {
    let toml = "[memory]\ntop_kk = 2\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    let rendered = format!("{:?}", miette::Report::new(errors.into_iter().next().unwrap()));
    assert!(rendered.contains("top_kk"));
    assert!(rendered.contains("did you mean"));
}
