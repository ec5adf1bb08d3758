// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle: joining a matched pair and ending a session.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tandem_core::{Channel, Outgoing, Participant, ParticipantId, TandemError};
use tracing::{info, warn};

use crate::notices;
use crate::Engine;

/// Why a session (or a seeking enrollment) is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    ExplicitStop,
    Block,
    ModeratorBan,
    PartnerInaccessible,
}

/// What actually changed when ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// An active session was cleared; carries the former partner.
    Disconnected(ParticipantId),
    /// A seeking enrollment was cancelled.
    StoppedSeeking,
    /// Nothing to end.
    Idle,
}

/// Result of a join attempt whose candidate-side delivery succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinOutcome {
    /// Both sides delivered and the session committed; carries the
    /// candidate's observed wait.
    Joined(Duration),
    /// The seeker's channel failed after the commit: the session was rolled
    /// back and the candidate returned to the pool.
    SeekerLost,
}

impl Engine {
    /// Deliver a notice, degrading a failed send to marking the recipient
    /// inaccessible. Notices are never retried.
    pub(crate) async fn notify(&self, id: ParticipantId, msg: Outgoing) -> Result<(), TandemError> {
        let sent = match self.hub.channel_for(id).await {
            Ok(channel) => channel.send(msg).await.map(|_| ()),
            Err(err) => Err(err),
        };
        match sent {
            Ok(()) => Ok(()),
            Err(err) if err.is_unreachable() => {
                warn!(participant = %id, error = %err, "notice undeliverable, marking inaccessible");
                self.directory.mark_inaccessible(id, false).await
            }
            Err(err) => Err(err),
        }
    }

    /// End whatever the participant is currently doing.
    ///
    /// With an active partner the pair is cleared atomically and the partner
    /// is either notified or, when `mark_partner` is set, marked inaccessible
    /// (banned for [`EndReason::ModeratorBan`]). Seeking-only participants
    /// leave the pool. Idle is a no-op.
    pub async fn end_session(
        &self,
        actor: &Participant,
        reason: EndReason,
        mark_partner: bool,
    ) -> Result<EndOutcome, TandemError> {
        if let Some(partner_id) = actor.convo_with {
            self.directory.clear_pair(actor.id, partner_id).await?;
            info!(
                participant = %actor.id,
                partner = %partner_id,
                reason = ?reason,
                "session ended"
            );
            if mark_partner {
                self.directory
                    .mark_inaccessible(partner_id, reason == EndReason::ModeratorBan)
                    .await?;
            } else {
                self.notify(partner_id, Outgoing::text(notices::PARTNER_LEFT))
                    .await?;
            }
            return Ok(EndOutcome::Disconnected(partner_id));
        }
        if actor.is_seeking() {
            self.directory.stop_seeking(actor.id).await?;
            info!(participant = %actor.id, reason = ?reason, "left the waiting pool");
            return Ok(EndOutcome::StoppedSeeking);
        }
        Ok(EndOutcome::Idle)
    }

    /// Join a matched pair: notify the candidate, exchange greetings, commit
    /// the session, then notify the seeker.
    ///
    /// Candidate-side delivery failures propagate so the caller can discard
    /// the candidate and try another; the commit only happens once the
    /// candidate has proven reachable. Seeker-side failures after the commit
    /// tear the fresh session back down and requeue the candidate at their
    /// original position.
    pub(crate) async fn join_session(
        &self,
        seeker: &Participant,
        seeker_channel: &Arc<dyn Channel>,
        candidate: &Participant,
        greeting: &str,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, TandemError> {
        let candidate_channel = self.hub.channel_for(candidate.id).await?;

        let waited = candidate
            .seeking_since
            .and_then(|since| (now - since).to_std().ok())
            .unwrap_or_default();

        candidate_channel
            .send(Outgoing::text(notices::matched(candidate, seeker, waited, now)))
            .await?;
        let seeker_greeting = if greeting.trim().is_empty() {
            notices::NO_GREETING
        } else {
            greeting
        };
        candidate_channel
            .send(Outgoing::text(seeker_greeting))
            .await?;

        self.directory.commit_join(seeker.id, candidate.id).await?;
        info!(
            seeker = %seeker.id,
            candidate = %candidate.id,
            waited_secs = waited.as_secs(),
            "session joined"
        );

        let candidate_greeting = candidate
            .greeting
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or(notices::NO_GREETING);
        let seeker_side = async {
            seeker_channel
                .send(Outgoing::text(notices::matched(seeker, candidate, waited, now)))
                .await?;
            seeker_channel
                .send(Outgoing::text(candidate_greeting))
                .await?;
            Ok::<_, TandemError>(())
        }
        .await;

        if let Err(err) = seeker_side {
            warn!(
                seeker = %seeker.id,
                error = %err,
                "seeker unreachable after commit, rolling session back"
            );
            self.directory.clear_pair(seeker.id, candidate.id).await?;
            self.directory.mark_inaccessible(seeker.id, false).await?;
            // The candidate did nothing wrong: restore their enrollment so
            // they keep their place in the queue. A failed notice below
            // marks them inaccessible, which clears it again.
            let since = candidate.seeking_since.unwrap_or(now);
            let stored_greeting = candidate.greeting.as_deref().unwrap_or("");
            self.directory
                .begin_seeking(candidate.id, since, stored_greeting)
                .await?;
            self.notify(
                candidate.id,
                Outgoing::text(notices::PARTNER_DISAPPEARED),
            )
            .await?;
            return Ok(JoinOutcome::SeekerLost);
        }

        Ok(JoinOutcome::Joined(waited))
    }
}
