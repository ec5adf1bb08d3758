// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Participant CRUD and the waiting-pool candidate query.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tandem_core::{Participant, ParticipantId, PrefMask, Tally, TandemError};

use crate::database::{map_tr_err, Database};
use crate::models::{row_to_participant, PARTICIPANT_COLUMNS};

/// Find-or-create a participant by platform token, refreshing the handle,
/// last-seen timestamp, and accessibility.
pub async fn upsert(
    db: &Database,
    platform_id: &str,
    handle: &str,
    now: DateTime<Utc>,
) -> Result<Participant, TandemError> {
    let platform_id = platform_id.to_string();
    let handle = handle.to_string();
    let now_ms = now.timestamp_millis();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO participants (platform_id, handle, created_at, last_seen_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT (platform_id)
                 DO UPDATE SET handle = ?2, last_seen_at = ?3, accessible = 1",
                params![platform_id, handle, now_ms],
            )?;
            conn.query_row(
                &format!(
                    "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE platform_id = ?1"
                ),
                params![platform_id],
                row_to_participant,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a participant by id.
pub async fn get(db: &Database, id: ParticipantId) -> Result<Participant, TandemError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = ?1"),
                params![id.0],
                row_to_participant,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Replace a participant's preference mask.
pub async fn set_mask(
    db: &Database,
    id: ParticipantId,
    mask: PrefMask,
) -> Result<(), TandemError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE participants SET mask = ?2 WHERE id = ?1",
                params![id.0, mask.bits() as i64],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Enroll into the waiting pool, clearing any stale partner reference.
pub async fn begin_seeking(
    db: &Database,
    id: ParticipantId,
    since: DateTime<Utc>,
    greeting: &str,
) -> Result<(), TandemError> {
    let greeting = greeting.to_string();
    let since_ms = since.timestamp_millis();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE participants
                 SET convo_with = NULL, seeking_since = ?2, greeting = ?3
                 WHERE id = ?1",
                params![id.0, since_ms, greeting],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Leave the waiting pool.
pub async fn stop_seeking(db: &Database, id: ParticipantId) -> Result<(), TandemError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE participants SET seeking_since = NULL, greeting = NULL WHERE id = ?1",
                params![id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically commit a joined session for both sides.
pub async fn commit_join(
    db: &Database,
    a: ParticipantId,
    b: ParticipantId,
) -> Result<(), TandemError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for (me, them) in [(a, b), (b, a)] {
                tx.execute(
                    "UPDATE participants
                     SET convo_with = ?2, prev_with = ?2,
                         seeking_since = NULL, greeting = NULL,
                         num_sessions = num_sessions + 1,
                         num_messages = num_messages + 1
                     WHERE id = ?1",
                    params![me.0, them.0],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically clear the partner reference and seeking state on both sides.
pub async fn clear_pair(
    db: &Database,
    a: ParticipantId,
    b: ParticipantId,
) -> Result<(), TandemError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for id in [a, b] {
                tx.execute(
                    "UPDATE participants
                     SET convo_with = NULL, seeking_since = NULL
                     WHERE id = ?1",
                    params![id.0],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a participant unreachable, clearing all session and seeking state.
pub async fn mark_inaccessible(
    db: &Database,
    id: ParticipantId,
    banned: bool,
) -> Result<(), TandemError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE participants
                 SET accessible = 0, convo_with = NULL, seeking_since = NULL,
                     greeting = NULL, banned = banned OR ?2
                 WHERE id = ?1",
                params![id.0, banned],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Increment a participant's lifetime message counter.
pub async fn bump_messages(db: &Database, id: ParticipantId) -> Result<(), TandemError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE participants SET num_messages = num_messages + 1 WHERE id = ?1",
                params![id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The longest-waiting compatible pool member for `seeker` under
/// `effective_mask`, or `None`.
///
/// The compatibility predicate is pushed into SQL as bitwise arithmetic:
/// a candidate identity half of 7 ("rather not say") matches any desire
/// set, otherwise it must be a subset of the seeker's desires; symmetric
/// for the candidate's desires against the seeker's identity.
pub async fn find_candidate(
    db: &Database,
    seeker: &Participant,
    effective_mask: PrefMask,
) -> Result<Option<Participant>, TandemError> {
    let seeker_id = seeker.id.0;
    let platform_id = seeker.platform_id.clone();
    let prev_with = seeker.prev_with.map(|p| p.0);
    let desire = effective_mask.desire_bits() as i64;
    let identity = effective_mask.identity_bits() as i64;
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {PARTICIPANT_COLUMNS} FROM participants
                     WHERE accessible = 1
                       AND banned = 0
                       AND convo_with IS NULL
                       AND seeking_since IS NOT NULL
                       AND id != ?1
                       AND platform_id != ?2
                       AND (?3 IS NULL OR id != ?3)
                       AND NOT EXISTS (
                           SELECT 1 FROM blocks
                           WHERE blocker_id = ?1 AND blocked_id = participants.id)
                       AND NOT EXISTS (
                           SELECT 1 FROM blocks
                           WHERE blocker_id = participants.id AND blocked_id = ?1)
                       AND (((mask >> 3) & 7) = 7
                            OR (((mask >> 3) & 7) & ?4) = ((mask >> 3) & 7))
                       AND (?5 = 7 OR ((mask & 7) & ?5) = ?5)
                     ORDER BY seeking_since ASC
                     LIMIT 1"
                ),
                params![seeker_id, platform_id, prev_with, desire, identity],
                row_to_participant,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Count currently-seeking participants whose desire half equals
/// `desire_bits` exactly and is not already "anyone".
pub async fn count_seeking_narrow(db: &Database, desire_bits: u8) -> Result<u32, TandemError> {
    let desire = desire_bits as i64;
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM participants
                 WHERE accessible = 1
                   AND convo_with IS NULL
                   AND seeking_since IS NOT NULL
                   AND (mask & 7) = ?1
                   AND (mask & 7) != 7",
                params![desire],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Service-wide totals.
pub async fn tally(db: &Database) -> Result<Tally, TandemError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FILTER (WHERE accessible = 1),
                        COALESCE(SUM(num_sessions), 0),
                        COALESCE(SUM(num_messages), 0)
                 FROM participants",
                [],
                |row| {
                    Ok(Tally {
                        accessible: row.get(0)?,
                        sessions: row.get(1)?,
                        messages: row.get(2)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}
