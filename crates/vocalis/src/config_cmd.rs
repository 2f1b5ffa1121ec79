// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vocalis config`: prints the effective configuration.

use vocalis_config::VocalisConfig;
use vocalis_core::VocalisError;

const REDACTED: &str = "********";

pub fn run_config(config: &VocalisConfig) -> Result<(), VocalisError> {
    println!("{}", render_config(config)?);
    Ok(())
}

/// The effective configuration as TOML, with credentials masked.
pub fn render_config(config: &VocalisConfig) -> Result<String, VocalisError> {
    let mut shown = config.clone();
    redact(&mut shown.openai.api_key);
    redact(&mut shown.elevenlabs.api_key);
    toml::to_string_pretty(&shown)
        .map_err(|e| VocalisError::Internal(format!("failed to render config: {e}")))
}

fn redact(secret: &mut Option<String>) {
    if secret.as_deref().is_some_and(|s| !s.is_empty()) {
        *secret = Some(REDACTED.to_string());
    }
}
