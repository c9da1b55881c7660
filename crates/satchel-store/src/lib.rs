// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite record store for the Satchel pipeline.
//!
//! Persists processed-commitment records (with the fingerprint uniqueness
//! constraint the dedup engine relies on) and the dead-letter log. Writes
//! go through tokio-rusqlite's single background thread; the schema is
//! managed by embedded refinery migrations.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteRecordStore;
pub use database::Database;
