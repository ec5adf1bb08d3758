// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`Directory`] trait.
//!
//! Idempotent single-record writes are retried with bounded attempts and
//! linear backoff; multi-record commits run as single transactions on the
//! writer connection and are never partially applied.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tandem_config::model::StorageConfig;
use tandem_core::{
    Directory, Participant, ParticipantId, PrefMask, Tally, TandemError,
};
use tracing::warn;

use crate::database::Database;
use crate::queries;

/// SQLite-backed identity store.
pub struct SqliteDirectory {
    db: Database,
    retries: u32,
    backoff: Duration,
}

impl SqliteDirectory {
    /// Open the database at the configured path and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, TandemError> {
        let db = Database::open(&config.database_path).await?;
        Ok(Self {
            db,
            retries: config.write_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoint and release the connection.
    pub async fn close(&self) -> Result<(), TandemError> {
        self.db.close().await
    }

    /// Retry an idempotent write with linear backoff.
    async fn retrying<T, F, Fut>(&self, mut op: F) -> Result<T, TandemError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TandemError>>,
    {
        let attempts = self.retries.max(1);
        let mut last = None;
        for attempt in 0..attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt, error = %e, "transient storage failure");
                    last = Some(e);
                }
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(self.backoff * (attempt + 1)).await;
            }
        }
        Err(last.expect("at least one attempt"))
    }
}

#[async_trait]
impl Directory for SqliteDirectory {
    async fn upsert(&self, platform_id: &str, handle: &str) -> Result<Participant, TandemError> {
        queries::participants::upsert(&self.db, platform_id, handle, Utc::now()).await
    }

    async fn get(&self, id: ParticipantId) -> Result<Participant, TandemError> {
        queries::participants::get(&self.db, id).await
    }

    async fn set_mask(&self, id: ParticipantId, mask: PrefMask) -> Result<(), TandemError> {
        self.retrying(|| queries::participants::set_mask(&self.db, id, mask))
            .await
    }

    async fn begin_seeking(
        &self,
        id: ParticipantId,
        since: DateTime<Utc>,
        greeting: &str,
    ) -> Result<(), TandemError> {
        self.retrying(|| queries::participants::begin_seeking(&self.db, id, since, greeting))
            .await
    }

    async fn stop_seeking(&self, id: ParticipantId) -> Result<(), TandemError> {
        self.retrying(|| queries::participants::stop_seeking(&self.db, id))
            .await
    }

    async fn commit_join(&self, a: ParticipantId, b: ParticipantId) -> Result<(), TandemError> {
        // Counter increments make this non-idempotent: one transactional
        // attempt only.
        queries::participants::commit_join(&self.db, a, b).await
    }

    async fn clear_pair(&self, a: ParticipantId, b: ParticipantId) -> Result<(), TandemError> {
        self.retrying(|| queries::participants::clear_pair(&self.db, a, b))
            .await
    }

    async fn mark_inaccessible(
        &self,
        id: ParticipantId,
        banned: bool,
    ) -> Result<(), TandemError> {
        self.retrying(|| queries::participants::mark_inaccessible(&self.db, id, banned))
            .await
    }

    async fn bump_messages(&self, id: ParticipantId) -> Result<(), TandemError> {
        queries::participants::bump_messages(&self.db, id).await
    }

    async fn find_candidate(
        &self,
        seeker: &Participant,
        effective_mask: PrefMask,
    ) -> Result<Option<Participant>, TandemError> {
        queries::participants::find_candidate(&self.db, seeker, effective_mask).await
    }

    async fn count_seeking_narrow(&self, desire_bits: u8) -> Result<u32, TandemError> {
        queries::participants::count_seeking_narrow(&self.db, desire_bits).await
    }

    async fn create_block(
        &self,
        blocker: ParticipantId,
        blocked: ParticipantId,
    ) -> Result<(), TandemError> {
        self.retrying(|| queries::blocks::create_block(&self.db, blocker, blocked, Utc::now()))
            .await
    }

    async fn tally(&self) -> Result<Tally, TandemError> {
        queries::participants::tally(&self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_dir() -> (SqliteDirectory, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            write_retries: 2,
            retry_backoff_ms: 1,
        };
        let directory = SqliteDirectory::open(&config).await.unwrap();
        (directory, dir)
    }

    #[tokio::test]
    async fn trait_round_trip() {
        let (directory, _dir) = open_dir().await;

        let a = directory.upsert("pa", "alice").await.unwrap();
        let b = directory.upsert("pb", "bob").await.unwrap();

        directory
            .begin_seeking(b.id, Utc::now(), "hi there")
            .await
            .unwrap();
        let found = directory.find_candidate(&a, a.mask).await.unwrap().unwrap();
        assert_eq!(found.id, b.id);
        assert_eq!(found.greeting.as_deref(), Some("hi there"));

        directory.commit_join(a.id, b.id).await.unwrap();
        let a = directory.get(a.id).await.unwrap();
        assert_eq!(a.convo_with, Some(b.id));

        directory.clear_pair(a.id, b.id).await.unwrap();
        let a = directory.get(a.id).await.unwrap();
        assert!(a.convo_with.is_none());

        directory.close().await.unwrap();
    }
}
