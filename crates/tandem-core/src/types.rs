// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Tandem workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::preference::PrefMask;

/// Unique identifier for a participant (the storage rowid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub i64);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a delivered message, assigned by the channel side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A durable participant identity record.
///
/// State invariant: `convo_with` and `seeking_since` are never both set.
/// A participant is always in exactly one of three states:
/// - **Idle** -- neither field set
/// - **Seeking** -- `seeking_since` set, enrolled in the waiting pool
/// - **InSession** -- `convo_with` set, paired with a counterpart
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    /// External-platform identity token (unique per participant).
    pub platform_id: String,
    /// Display handle, refreshed on every contact.
    pub handle: String,
    /// 6-bit identity/desire preference mask.
    pub mask: PrefMask,
    /// False once an outbound delivery to this identity has failed.
    pub accessible: bool,
    /// Current session partner, exclusive.
    pub convo_with: Option<ParticipantId>,
    /// Previous partner, kept to avoid immediate rematching and to support
    /// blocking after the session already ended.
    pub prev_with: Option<ParticipantId>,
    /// Set iff enrolled in the waiting pool.
    pub seeking_since: Option<DateTime<Utc>>,
    /// Pending greeting text, present only while seeking.
    pub greeting: Option<String>,
    pub num_messages: i64,
    pub num_sessions: i64,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Participant {
    /// True iff enrolled in the waiting pool and not in a session.
    pub fn is_seeking(&self) -> bool {
        self.seeking_since.is_some() && self.convo_with.is_none()
    }

    /// True iff paired with a counterpart.
    pub fn in_session(&self) -> bool {
        self.convo_with.is_some()
    }
}

/// Service-wide totals used in notice footers and the `status` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Participants still reachable.
    pub accessible: i64,
    /// Sum of all lifetime session counters.
    pub sessions: i64,
    /// Sum of all lifetime message counters.
    pub messages: i64,
}

/// An outbound message handed to a delivery channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outgoing {
    pub content: String,
    /// Attachment URLs forwarded verbatim.
    pub attachments: Vec<String>,
    /// Thread reference: the message on the recipient's side being replied to.
    pub reply_to: Option<MessageId>,
}

impl Outgoing {
    /// A plain text message with no attachments or threading.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// An inbound participant message from the event source.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// External-platform identity token of the sender.
    pub platform_id: String,
    /// Sender's current display handle.
    pub handle: String,
    /// Channel-assigned id of this message on the sender's side.
    pub message_id: MessageId,
    pub content: String,
    pub attachments: Vec<String>,
    /// Set when the message is a threaded reply to an earlier message
    /// on the sender's side.
    pub reply_to: Option<MessageId>,
}

/// Direction of a reaction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ReactionChange {
    Add,
    Remove,
}
