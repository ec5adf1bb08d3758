// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The matching sequence: search the waiting pool or enroll in it.
//!
//! The whole search-then-commit sequence runs under the engine's single
//! matching gate, so at most one participant is matching at any instant.
//! That gate is what makes "a candidate found is a candidate still free"
//! true without row locks.

use std::time::Duration;

use chrono::Utc;
use tandem_core::{ParticipantId, TandemError};
use tracing::{debug, info, warn};

use crate::session::JoinOutcome;
use crate::Engine;

/// Result of one pass through the matching sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Paired with `partner`; both sides have been notified.
    Matched {
        partner: ParticipantId,
        broadened: bool,
        waited: Duration,
    },
    /// No compatible candidate; enrolled in the waiting pool.
    Enqueued {
        estimate: Option<Duration>,
        broadened: bool,
    },
    /// Every candidate attempt failed on delivery.
    Exhausted,
    /// The participant was already in a session when the gate was acquired.
    AlreadyInSession,
    /// The seeker's own channel failed mid-join; the session was rolled
    /// back, the candidate requeued, and nothing was recorded.
    SeekerGone,
}

impl Engine {
    /// Find a partner for `id`, or enroll them in the waiting pool.
    ///
    /// `greeting` is the message text that triggered the search; it is
    /// forwarded to the eventual partner.
    pub async fn find_or_enqueue(
        &self,
        id: ParticipantId,
        greeting: &str,
    ) -> Result<MatchOutcome, TandemError> {
        let _gate = self.match_gate.lock().await;

        // Re-fetch under the gate: the participant may have been matched by
        // someone else's search while this one waited for the lock.
        let seeker = self.directory.get(id).await?;
        if seeker.in_session() {
            return Ok(MatchOutcome::AlreadyInSession);
        }

        let now = Utc::now();
        let mut effective = seeker.mask;
        let mut broadened = false;
        if !effective.desires_anyone() {
            let pool = self
                .directory
                .count_seeking_narrow(effective.desire_bits())
                .await?;
            // The count is "other participants stuck waiting": an already
            // enrolled seeker shares the queried desire half and would be
            // counting themself.
            let narrow = pool.saturating_sub(u32::from(seeker.is_seeking()));
            if narrow > self.config.matching.congestion_threshold {
                effective = effective.broadened();
                broadened = true;
                info!(
                    participant = %seeker.id,
                    narrow_seekers = narrow,
                    "congestion: broadening search to anyone"
                );
            }
        }

        // Resolved before the candidate loop so a seeker-side channel
        // failure is never blamed on a candidate.
        let seeker_channel = self.hub.channel_for(seeker.id).await?;

        for attempt in 0..self.config.matching.max_attempts {
            let Some(candidate) = self.directory.find_candidate(&seeker, effective).await? else {
                // Pool is empty for this mask: enroll. A repeat search keeps
                // its original enrollment time so the queue stays fair.
                let since = seeker.seeking_since.unwrap_or(now);
                self.directory.begin_seeking(seeker.id, since, greeting).await?;
                let estimate = self.match_log.lock().await.estimate(effective, now);
                debug!(participant = %seeker.id, broadened, "enqueued");
                return Ok(MatchOutcome::Enqueued { estimate, broadened });
            };

            match self
                .join_session(&seeker, &seeker_channel, &candidate, greeting, now)
                .await
            {
                Ok(JoinOutcome::Joined(waited)) => {
                    self.match_log
                        .lock()
                        .await
                        .record(seeker.id, now, waited, effective);
                    return Ok(MatchOutcome::Matched {
                        partner: candidate.id,
                        broadened,
                        waited,
                    });
                }
                Ok(JoinOutcome::SeekerLost) => {
                    debug!(participant = %seeker.id, "seeker lost during join");
                    return Ok(MatchOutcome::SeekerGone);
                }
                Err(err) if err.is_unreachable() => {
                    warn!(
                        candidate = %candidate.id,
                        attempt,
                        error = %err,
                        "candidate unreachable, trying next"
                    );
                    self.directory.mark_inaccessible(candidate.id, false).await?;
                }
                Err(err) => return Err(err),
            }
        }

        warn!(participant = %seeker.id, "candidate attempts exhausted");
        Ok(MatchOutcome::Exhausted)
    }
}
