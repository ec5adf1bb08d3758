// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message relay and edit/reaction propagation between paired channels.

use tandem_core::{
    InboundMessage, MessageId, Outgoing, Participant, ReactionChange, TandemError,
};
use tracing::{debug, warn};

use crate::mirror::MirrorSide;
use crate::notices;
use crate::Engine;

/// Result of a relay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Forwarded,
    /// Nothing to forward (no text, no attachments).
    Empty,
    /// The sender has no active session.
    NoSession,
    /// The partner could not be reached; the session needs tearing down.
    PartnerLeft,
}

impl Engine {
    /// Forward an inbound message to the sender's partner, threading replies
    /// through the mirror and recording the delivered pair.
    pub async fn relay(
        &self,
        sender: &Participant,
        msg: &InboundMessage,
    ) -> Result<RelayOutcome, TandemError> {
        if msg.content.trim().is_empty() && msg.attachments.is_empty() {
            return Ok(RelayOutcome::Empty);
        }
        let Some(partner_id) = sender.convo_with else {
            return Ok(RelayOutcome::NoSession);
        };

        let channel = match self.hub.channel_for(partner_id).await {
            Ok(channel) => channel,
            Err(err) if err.is_unreachable() => return Ok(RelayOutcome::PartnerLeft),
            Err(err) => return Err(err),
        };

        // A reply threads only if the replied-to message has a mirrored copy
        // on the partner's side.
        let reply_to = match &msg.reply_to {
            Some(original) => self
                .mirror
                .lock()
                .await
                .counterpart(original)
                .filter(|side| side.owner == partner_id)
                .map(|side| side.message.clone()),
            None => None,
        };

        let outgoing = Outgoing {
            content: msg.content.clone(),
            attachments: msg.attachments.clone(),
            reply_to,
        };
        let delivered = match channel.send(outgoing).await {
            Ok(id) => id,
            Err(err) if err.is_unreachable() => return Ok(RelayOutcome::PartnerLeft),
            Err(err) => return Err(err),
        };

        self.directory.bump_messages(sender.id).await?;
        self.mirror.lock().await.push(
            MirrorSide {
                owner: sender.id,
                message: msg.message_id.clone(),
            },
            MirrorSide {
                owner: partner_id,
                message: delivered,
            },
        );
        Ok(RelayOutcome::Forwarded)
    }

    /// Mirror an edit (or, with `None`, a deletion) onto the counterpart
    /// copy. Best-effort: failures are logged, never surfaced.
    pub async fn propagate_edit(&self, message: &MessageId, new_content: Option<&str>) {
        let Some(side) = self.mirror.lock().await.counterpart(message).cloned() else {
            debug!(message = %message, "edit for unmirrored message, ignoring");
            return;
        };
        let content = new_content.unwrap_or(notices::DELETED_PLACEHOLDER);
        let result = match self.hub.channel_for(side.owner).await {
            Ok(channel) => channel.edit(&side.message, content).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(message = %side.message, error = %err, "edit propagation failed");
        }
    }

    /// Mirror a reaction add/remove onto the counterpart copy. Best-effort.
    pub async fn propagate_reaction(
        &self,
        message: &MessageId,
        emoji: &str,
        change: ReactionChange,
    ) {
        let Some(side) = self.mirror.lock().await.counterpart(message).cloned() else {
            debug!(message = %message, "reaction for unmirrored message, ignoring");
            return;
        };
        let result = match self.hub.channel_for(side.owner).await {
            Ok(channel) => match change {
                ReactionChange::Add => channel.react(&side.message, emoji).await,
                ReactionChange::Remove => channel.unreact(&side.message, emoji).await,
            },
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(
                message = %side.message,
                change = %change,
                error = %err,
                "reaction propagation failed"
            );
        }
    }
}
