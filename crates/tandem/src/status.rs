// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tandem status` command implementation.
//!
//! Opens the database read-only-ish (same single-writer connection) and
//! prints the service-wide tally.

use serde::Serialize;
use tandem_config::model::TandemConfig;
use tandem_core::{Directory, TandemError};
use tandem_storage::SqliteDirectory;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
struct StatusResponse {
    database_path: String,
    accessible_participants: i64,
    total_sessions: i64,
    total_messages: i64,
}

/// Run the `tandem status` command.
pub async fn run_status(config: &TandemConfig, json: bool) -> Result<(), TandemError> {
    let directory = SqliteDirectory::open(&config.storage).await?;
    let tally = directory.tally().await?;
    directory.close().await?;

    if json {
        let response = StatusResponse {
            database_path: config.storage.database_path.clone(),
            accessible_participants: tally.accessible,
            total_sessions: tally.sessions,
            total_messages: tally.messages,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&response)
                .map_err(|e| TandemError::Internal(e.to_string()))?
        );
        return Ok(());
    }

    println!("tandem @ {}", config.storage.database_path);
    println!("  participants reachable: {}", tally.accessible);
    println!("  conversations ever:     {}", tally.sessions);
    println!("  messages ever:          {}", tally.messages);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_config::model::StorageConfig;

    #[tokio::test]
    async fn status_runs_against_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TandemConfig::default();
        config.storage = StorageConfig {
            database_path: dir.path().join("t.db").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        run_status(&config, true).await.unwrap();
    }
}
