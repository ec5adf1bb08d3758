// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directed block relations.

use chrono::{DateTime, Utc};
use rusqlite::params;
use tandem_core::{ParticipantId, TandemError};

use crate::database::{map_tr_err, Database};

/// Record a permanent directed block. Re-blocking the same pair is a no-op.
pub async fn create_block(
    db: &Database,
    blocker: ParticipantId,
    blocked: ParticipantId,
    now: DateTime<Utc>,
) -> Result<(), TandemError> {
    let now_ms = now.timestamp_millis();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO blocks (blocker_id, blocked_id, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (blocker_id, blocked_id) DO NOTHING",
                params![blocker.0, blocked.0, now_ms],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// True iff `blocker` has blocked `blocked`.
pub async fn is_blocked(
    db: &Database,
    blocker: ParticipantId,
    blocked: ParticipantId,
) -> Result<bool, TandemError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (
                     SELECT 1 FROM blocks WHERE blocker_id = ?1 AND blocked_id = ?2)",
                params![blocker.0, blocked.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::participants::upsert;
    use tempfile::tempdir;

    #[tokio::test]
    async fn block_is_directed_and_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let now = Utc::now();

        let a = upsert(&db, "a", "a", now).await.unwrap();
        let b = upsert(&db, "b", "b", now).await.unwrap();

        create_block(&db, a.id, b.id, now).await.unwrap();
        create_block(&db, a.id, b.id, now).await.unwrap();

        assert!(is_blocked(&db, a.id, b.id).await.unwrap());
        assert!(!is_blocked(&db, b.id, a.id).await.unwrap());
        db.close().await.unwrap();
    }
}
