// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Dialdesk.
//!
//! WAL-mode SQLite with embedded migrations, a single-writer concurrency
//! model via `tokio-rusqlite`, and typed queries for contacts, dialogs,
//! groups, prompt templates and scheduled calls. Scheduled call writes are
//! compare-and-set on the record's revision.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
