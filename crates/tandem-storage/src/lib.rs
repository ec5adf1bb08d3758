// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Tandem matchmaking service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and the
//! [`SqliteDirectory`] implementation of the identity-store trait, with the
//! waiting-pool compatibility predicate pushed into SQL.

pub mod database;
pub mod directory;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use directory::SqliteDirectory;
