// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks ranges and cross-field constraints that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::VocalisConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &VocalisConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let mut check_unit = |name: &str, value: f32| {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be within [0, 1], got {value}"),
            });
        }
    };
    check_unit("memory.similarity_threshold", config.memory.similarity_threshold);
    check_unit("memory.extraction_threshold", config.memory.extraction_threshold);
    check_unit("memory.dedup_threshold", config.memory.dedup_threshold);
    check_unit("elevenlabs.stability", config.elevenlabs.stability);
    check_unit("elevenlabs.similarity_boost", config.elevenlabs.similarity_boost);
    check_unit("elevenlabs.style", config.elevenlabs.style);

    let speech = &config.speech;
    if speech.max_concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "speech.max_concurrency must be at least 1".to_string(),
        });
    }
    if speech.reorder_capacity < speech.max_concurrency {
        errors.push(ConfigError::Validation {
            message: format!(
                "speech.reorder_capacity ({}) must be >= speech.max_concurrency ({})",
                speech.reorder_capacity, speech.max_concurrency
            ),
        });
    }
    if speech.sentence_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "speech.sentence_timeout_secs must be greater than 0".to_string(),
        });
    }

    let memory = &config.memory;
    if memory.top_k == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.top_k must be at least 1".to_string(),
        });
    }
    if memory.cache_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.cache_ttl_secs must be greater than 0".to_string(),
        });
    }
    if memory.dedup_threshold < memory.similarity_threshold {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.dedup_threshold ({}) must be >= memory.similarity_threshold ({})",
                memory.dedup_threshold, memory.similarity_threshold
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
