// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Tandem engine: matchmaking, session lifecycle, and message relay.
//!
//! [`Engine`] is the event context the front end drives: every inbound
//! event (message, typing, edit, reaction) lands on one of its `handle_*`
//! entry points. The engine owns the matching gate, the wait-time log, the
//! abuse guards, the message mirror, and the typing throttle; durable state
//! lives behind [`Directory`] and delivery behind [`ChannelHub`].

pub mod guards;
pub mod mirror;
pub mod notices;
pub mod stats;
pub mod throttle;

mod commands;
mod matchmaker;
mod relay;
mod session;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tandem_config::model::TandemConfig;
use tandem_core::{
    ChannelHub, Directory, InboundMessage, MessageId, Outgoing, Participant, ParticipantId,
    ReactionChange, Tally, TandemError,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::guards::Guards;
use crate::mirror::MessageMirror;
use crate::stats::MatchLog;
use crate::throttle::TtlCache;

pub use matchmaker::MatchOutcome;
pub use relay::RelayOutcome;
pub use session::{EndOutcome, EndReason};

/// The matchmaking and relay engine.
pub struct Engine {
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) hub: Arc<dyn ChannelHub>,
    pub(crate) config: TandemConfig,
    /// System-wide mutual exclusion for the search-then-commit matching
    /// sequence. Held across the whole sequence, never across user waits.
    pub(crate) match_gate: Mutex<()>,
    pub(crate) match_log: Mutex<MatchLog>,
    pub(crate) guards: Mutex<Guards>,
    pub(crate) mirror: Mutex<MessageMirror>,
    pub(crate) typing: Mutex<TtlCache<ParticipantId>>,
}

impl Engine {
    pub fn new(
        config: TandemConfig,
        directory: Arc<dyn Directory>,
        hub: Arc<dyn ChannelHub>,
    ) -> Self {
        let match_log = MatchLog::new(
            Duration::from_secs(config.matching.stats_retention_hours * 3600),
            config.matching.stats_cap,
        );
        let guards = Guards::new(config.guards.clone());
        let mirror = MessageMirror::new(config.relay.mirror_capacity);
        Self {
            directory,
            hub,
            config,
            match_gate: Mutex::new(()),
            match_log: Mutex::new(match_log),
            guards: Mutex::new(guards),
            mirror: Mutex::new(mirror),
            typing: Mutex::new(TtlCache::new()),
        }
    }

    /// Handle one inbound participant message end to end.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<(), TandemError> {
        let participant = self.directory.upsert(&msg.platform_id, &msg.handle).await?;

        // First contact: the upsert just created the row.
        if participant.num_sessions == 0
            && participant.num_messages == 0
            && participant.created_at == participant.last_seen_at
        {
            self.notify(
                participant.id,
                Outgoing::text(notices::welcome(&self.config.service.name)),
            )
            .await?;
        }

        if participant.banned {
            return self
                .notify(participant.id, Outgoing::text(notices::BANNED))
                .await;
        }

        let is_moderator = self
            .config
            .service
            .moderators
            .iter()
            .any(|m| m == &participant.handle);
        if self.config.service.maintenance_mode && !is_moderator {
            return self
                .notify(participant.id, Outgoing::text(notices::MAINTENANCE))
                .await;
        }

        if let Some((name, arg)) = commands::parse_command(&msg.content) {
            return self.handle_command(&participant, name, arg).await;
        }

        let now = Utc::now();
        {
            let mut guards = self.guards.lock().await;
            guards.record_send(participant.id, now);
            if guards.exceeds_burst_limit(participant.id, now) {
                drop(guards);
                return self
                    .notify(participant.id, Outgoing::text(notices::SLOW_DOWN))
                    .await;
            }
        }

        let link_ok = self.guards.lock().await.link_eligible(
            &participant,
            &msg.content,
            !msg.attachments.is_empty(),
        );
        if !link_ok {
            return self
                .notify(participant.id, Outgoing::text(notices::LINK_REFUSED))
                .await;
        }

        match self.relay(&participant, msg).await? {
            RelayOutcome::Forwarded | RelayOutcome::Empty => Ok(()),
            RelayOutcome::PartnerLeft => {
                if let Some(partner) = participant.convo_with {
                    self.directory.clear_pair(participant.id, partner).await?;
                    self.directory.mark_inaccessible(partner, false).await?;
                }
                self.notify(
                    participant.id,
                    Outgoing::text(notices::PARTNER_DISAPPEARED),
                )
                .await
            }
            RelayOutcome::NoSession => self.start_matching(&participant, msg).await,
        }
    }

    /// No active session: apply the rematch cooldown, then search or enqueue.
    async fn start_matching(
        &self,
        participant: &Participant,
        msg: &InboundMessage,
    ) -> Result<(), TandemError> {
        let now = Utc::now();
        if !participant.is_seeking() {
            let last = self.match_log.lock().await.last_match_for(participant.id, now);
            if let Some(at) = last {
                let cooldown =
                    chrono::Duration::seconds(self.config.matching.rematch_cooldown_secs as i64);
                if now - at < cooldown {
                    return self
                        .notify(participant.id, Outgoing::text(notices::REMATCH_COOLDOWN))
                        .await;
                }
            }
        }

        match self.find_or_enqueue(participant.id, &msg.content).await? {
            MatchOutcome::Matched { broadened, .. } => {
                if broadened {
                    self.notify(participant.id, Outgoing::text(notices::BROADENED))
                        .await?;
                }
                Ok(())
            }
            MatchOutcome::Enqueued { estimate, broadened } => {
                if broadened {
                    self.notify(participant.id, Outgoing::text(notices::BROADENED))
                        .await?;
                }
                let tally = self.directory.tally().await.ok();
                self.notify(
                    participant.id,
                    Outgoing::text(notices::waiting(estimate, tally.as_ref())),
                )
                .await
            }
            MatchOutcome::Exhausted => {
                self.notify(participant.id, Outgoing::text(notices::SEARCH_FAILED))
                    .await
            }
            // The seeker's own channel is gone; no notice can reach them.
            MatchOutcome::SeekerGone => Ok(()),
            MatchOutcome::AlreadyInSession => {
                // Someone matched this participant while the message was in
                // flight: deliver it to the fresh partner instead.
                let refreshed = self.directory.get(participant.id).await?;
                self.relay(&refreshed, msg).await?;
                Ok(())
            }
        }
    }

    /// Pass a typing indicator through to the partner, throttled per sender.
    pub async fn handle_typing(&self, platform_id: &str, handle: &str) -> Result<(), TandemError> {
        let participant = self.directory.upsert(platform_id, handle).await?;
        let Some(partner) = participant.convo_with else {
            return Ok(());
        };

        let now = Utc::now();
        {
            let mut typing = self.typing.lock().await;
            if typing.contains(&participant.id, now) {
                return Ok(());
            }
            typing.insert(
                participant.id,
                now,
                Duration::from_secs(self.config.relay.typing_ttl_secs),
            );
        }

        // Best-effort: a lost typing indicator is not worth a teardown.
        if let Ok(channel) = self.hub.channel_for(partner).await {
            if let Err(err) = channel.send_typing().await {
                debug!(partner = %partner, error = %err, "typing passthrough failed");
            }
        }
        Ok(())
    }

    /// Mirror an edit (`None` content means deletion) onto the counterpart.
    pub async fn handle_edit(&self, message: &MessageId, new_content: Option<&str>) {
        self.propagate_edit(message, new_content).await;
    }

    /// Mirror a reaction change onto the counterpart.
    pub async fn handle_reaction(
        &self,
        message: &MessageId,
        emoji: &str,
        change: ReactionChange,
    ) {
        self.propagate_reaction(message, emoji, change).await;
    }

    /// Service-wide totals.
    pub async fn tally(&self) -> Result<Tally, TandemError> {
        self.directory.tally().await
    }
}
