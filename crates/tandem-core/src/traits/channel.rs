// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery channel traits: the outward path to a participant.
//!
//! Every send can hang or fail independently per recipient. Callers never
//! retry a failed send; they degrade to marking the recipient inaccessible.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TandemError;
use crate::types::{MessageId, Outgoing, ParticipantId};

/// A single participant's delivery channel.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Deliver a message, returning the channel-assigned id of the copy that
    /// landed on the recipient's side.
    async fn send(&self, msg: Outgoing) -> Result<MessageId, TandemError>;

    /// Show a typing indicator to the recipient.
    async fn send_typing(&self) -> Result<(), TandemError>;

    /// Replace the content of a previously delivered message.
    async fn edit(&self, id: &MessageId, content: &str) -> Result<(), TandemError>;

    /// Add a reaction to a previously delivered message.
    async fn react(&self, id: &MessageId, emoji: &str) -> Result<(), TandemError>;

    /// Remove a previously mirrored reaction.
    async fn unreact(&self, id: &MessageId, emoji: &str) -> Result<(), TandemError>;
}

/// Resolves a participant to their delivery channel.
#[async_trait]
pub trait ChannelHub: Send + Sync {
    /// Resolve the channel for a participant. Failure means the participant
    /// is unreachable (disconnected, blocked the service, ...).
    async fn channel_for(&self, id: ParticipantId) -> Result<Arc<dyn Channel>, TandemError>;
}
