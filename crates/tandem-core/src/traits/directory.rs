// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity store trait: durable participant records and the waiting pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::TandemError;
use crate::preference::PrefMask;
use crate::types::{Participant, ParticipantId, Tally};

/// Durable store of participant identities and the waiting pool they form.
///
/// Single-record updates are safe for concurrent access; the multi-step
/// search-then-commit matching sequence is not, and runs under the engine's
/// matching gate. Multi-record updates ([`Directory::commit_join`],
/// [`Directory::clear_pair`]) must be atomic.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Find-or-create by platform token, refreshing the handle, last-seen
    /// timestamp, and accessibility on every contact.
    async fn upsert(&self, platform_id: &str, handle: &str) -> Result<Participant, TandemError>;

    /// Fetch by id; an unknown id is a storage error.
    async fn get(&self, id: ParticipantId) -> Result<Participant, TandemError>;

    /// Replace a participant's preference mask.
    async fn set_mask(&self, id: ParticipantId, mask: PrefMask) -> Result<(), TandemError>;

    /// Enroll into the waiting pool: set the seeking timestamp and store the
    /// pending greeting. Clears any stale partner reference.
    async fn begin_seeking(
        &self,
        id: ParticipantId,
        since: DateTime<Utc>,
        greeting: &str,
    ) -> Result<(), TandemError>;

    /// Leave the waiting pool: clear the seeking timestamp and greeting.
    async fn stop_seeking(&self, id: ParticipantId) -> Result<(), TandemError>;

    /// Atomically commit a joined session for both sides: set the partner
    /// references to each other, record previous partners, clear seeking
    /// state and greetings, and increment both sides' session and message
    /// counters.
    async fn commit_join(&self, a: ParticipantId, b: ParticipantId) -> Result<(), TandemError>;

    /// Atomically clear the partner reference and seeking state on both
    /// sides of an ended session.
    async fn clear_pair(&self, a: ParticipantId, b: ParticipantId) -> Result<(), TandemError>;

    /// Give up on an identity: mark unreachable, clear session/seeking/
    /// greeting state, optionally set the ban flag.
    async fn mark_inaccessible(&self, id: ParticipantId, banned: bool)
        -> Result<(), TandemError>;

    /// Increment a participant's lifetime message counter.
    async fn bump_messages(&self, id: ParticipantId) -> Result<(), TandemError>;

    /// The longest-waiting pool member compatible with `seeker` under
    /// `effective_mask`: accessible, seeking, not in a session, a different
    /// identity token, not the seeker's previous partner, not blocked in
    /// either direction -- ordered by seeking timestamp ascending, limit one.
    async fn find_candidate(
        &self,
        seeker: &Participant,
        effective_mask: PrefMask,
    ) -> Result<Option<Participant>, TandemError>;

    /// Count of currently-seeking participants whose desire half equals
    /// `desire_bits` exactly and is not already "anyone". Feeds the
    /// congestion-broadening decision.
    async fn count_seeking_narrow(&self, desire_bits: u8) -> Result<u32, TandemError>;

    /// Record a permanent directed block.
    async fn create_block(
        &self,
        blocker: ParticipantId,
        blocked: ParticipantId,
    ) -> Result<(), TandemError>;

    /// Service-wide totals for notice footers and the status command.
    async fn tally(&self) -> Result<Tally, TandemError>;
}
