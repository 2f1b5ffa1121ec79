// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vocalis.toml` > `~/.config/vocalis/vocalis.toml` > `/etc/vocalis/vocalis.toml`
//! with environment variable overrides via `VOCALIS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VocalisConfig;

/// Config sections that may be addressed through `VOCALIS_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["agent", "speech", "memory", "storage", "openai", "elevenlabs"];

/// Paths searched for TOML config, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/vocalis/vocalis.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("vocalis/vocalis.toml"));
    }
    paths.push(PathBuf::from("vocalis.toml"));
    paths
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vocalis/vocalis.toml`
/// 3. `~/.config/vocalis/vocalis.toml`
/// 4. `./vocalis.toml`
/// 5. `VOCALIS_*` environment variables
pub fn load_config() -> Result<VocalisConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<VocalisConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VocalisConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VocalisConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VocalisConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    config_paths().into_iter().fold(
        Figment::new().merge(Serialized::defaults(VocalisConfig::default())),
        |figment, path| figment.merge(Toml::file(path)),
    )
    .merge(env_provider())
}

/// Environment provider mapping `VOCALIS_SECTION_KEY` to `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `VOCALIS_ELEVENLABS_VOICE_ID` maps to `elevenlabs.voice_id`.
fn env_provider() -> Env {
    Env::prefixed("VOCALIS_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
