// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the core participant model.
//!
//! The canonical [`Participant`] type lives in `tandem-core` for use across
//! trait boundaries; this module owns its column layout and the epoch-millis
//! timestamp convention.

use chrono::{DateTime, Utc};
use tandem_core::{Participant, ParticipantId, PrefMask};

/// Column list matching [`row_to_participant`], for SELECT statements.
pub const PARTICIPANT_COLUMNS: &str = "id, platform_id, handle, mask, accessible, convo_with, \
     prev_with, seeking_since, greeting, num_messages, num_sessions, banned, \
     created_at, last_seen_at";

/// Convert stored epoch milliseconds to a UTC timestamp.
pub fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Map a row selected with [`PARTICIPANT_COLUMNS`] to a [`Participant`].
pub fn row_to_participant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: ParticipantId(row.get(0)?),
        platform_id: row.get(1)?,
        handle: row.get(2)?,
        mask: PrefMask::from_bits(row.get::<_, i64>(3)? as u8),
        accessible: row.get(4)?,
        convo_with: row.get::<_, Option<i64>>(5)?.map(ParticipantId),
        prev_with: row.get::<_, Option<i64>>(6)?.map(ParticipantId),
        seeking_since: row.get::<_, Option<i64>>(7)?.map(millis_to_datetime),
        greeting: row.get(8)?,
        num_messages: row.get(9)?,
        num_sessions: row.get(10)?,
        banned: row.get(11)?,
        created_at: millis_to_datetime(row.get(12)?),
        last_seen_at: millis_to_datetime(row.get(13)?),
    })
}
