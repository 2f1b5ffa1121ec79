// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config errors as miette diagnostics.
//!
//! Every config struct defaults all of its fields, so figment only ever
//! reports unknown keys, wrongly typed values, or parse failures. Semantic
//! checks from [`crate::validation`] arrive as [`ConfigError::Validation`].

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::Diagnostic;
use thiserror::Error;

/// Jaro-Winkler score a known key must beat to be suggested for a typo.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(vocalis::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys, origin.as_deref()))
    )]
    UnknownKey {
        key: String,
        /// `[speech]`-style table name, or "the top level".
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        /// File the key was read from, when figment knows it.
        origin: Option<String>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(vocalis::config::invalid_type))]
    InvalidType { key: String, detail: String },

    #[error("{message}")]
    #[diagnostic(code(vocalis::config::validation))]
    Validation { message: String },

    #[error("could not load configuration: {0}")]
    #[diagnostic(code(vocalis::config::load))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str, origin: Option<&str>) -> String {
    let mut help = match suggestion {
        Some(s) => format!("did you mean `{s}`? Known keys: {valid_keys}"),
        None => format!("known keys: {valid_keys}"),
    };
    if let Some(origin) = origin {
        help.push_str(&format!(" (set in {origin})"));
    }
    help
}

/// Splits a figment error (possibly several) into one diagnostic each.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path = error.path.join(".");
            match &error.kind {
                Kind::UnknownField(field, expected) => ConfigError::UnknownKey {
                    key: field.clone(),
                    section: if path.is_empty() {
                        "the top level".to_string()
                    } else {
                        format!("[{path}]")
                    },
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    origin: origin_of(&error),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: path,
                    detail: format!("found {actual}, expected {expected}"),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn origin_of(error: &figment::Error) -> Option<String> {
    match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => Some(path.display().to_string()),
        _ => None,
    }
}

/// Closest known key to a misspelled one.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (*key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Prints each error as a miette report on stderr.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("{:?}", miette::Report::new(error.clone()));
    }
}
