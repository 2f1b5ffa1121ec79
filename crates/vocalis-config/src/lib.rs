// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Vocalis.
//!
//! TOML configuration with `deny_unknown_fields`, XDG file hierarchy lookup,
//! `VOCALIS_*` environment overrides, and miette diagnostics with typo
//! suggestions.
//!
//! ```no_run
//! use vocalis_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("speech concurrency: {}", config.speech.max_concurrency);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::VocalisConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<VocalisConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<VocalisConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

