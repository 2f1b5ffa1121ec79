// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Vocalis.
//!
//! Owns the connection lifecycle, schema migrations, and the conversation
//! turn store. Fragment persistence lives in `vocalis-memory`, which shares
//! the same [`Database`] handle.

pub mod database;
pub mod migrations;
pub mod turns;

pub use database::{format_timestamp, map_tr_err, parse_timestamp, Database};
pub use turns::SqliteTurnStore;

use vocalis_config::model::StorageConfig;
use vocalis_core::VocalisError;

/// Open the database described by `config`.
pub async fn open_from_config(config: &StorageConfig) -> Result<Database, VocalisError> {
    Database::open(&config.database_path, config.wal_mode).await
}
