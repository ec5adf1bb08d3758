// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable [`Channel`]/[`ChannelHub`] mocks: capture everything sent,
//! fail on demand.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tandem_core::{Channel, ChannelHub, MessageId, Outgoing, ParticipantId, TandemError};

#[derive(Default)]
struct ChannelLog {
    sent: Vec<Outgoing>,
    edits: Vec<(MessageId, String)>,
    reactions: Vec<(MessageId, String, bool)>,
    typing: usize,
}

/// A capturing channel for one participant.
pub struct MockChannel {
    id: ParticipantId,
    log: Mutex<ChannelLog>,
    fail_sends: Mutex<bool>,
    counter: AtomicU64,
}

impl MockChannel {
    fn new(id: ParticipantId) -> Self {
        Self {
            id,
            log: Mutex::new(ChannelLog::default()),
            fail_sends: Mutex::new(false),
            counter: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every subsequent send fail as unreachable.
    pub fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<Outgoing> {
        self.lock().sent.clone()
    }

    /// Concatenated text of everything sent, for containment assertions.
    pub fn sent_text(&self) -> String {
        self.lock()
            .sent
            .iter()
            .map(|o| o.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn edits(&self) -> Vec<(MessageId, String)> {
        self.lock().edits.clone()
    }

    /// Recorded reactions as `(message, emoji, added)`.
    pub fn reactions(&self) -> Vec<(MessageId, String, bool)> {
        self.lock().reactions.clone()
    }

    pub fn typing_count(&self) -> usize {
        self.lock().typing
    }

    fn unreachable(&self) -> TandemError {
        TandemError::Unreachable {
            participant: self.id,
        }
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn send(&self, msg: Outgoing) -> Result<MessageId, TandemError> {
        if *self.fail_sends.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(self.unreachable());
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.lock().sent.push(msg);
        Ok(MessageId(format!("{}-{n}", self.id)))
    }

    async fn send_typing(&self) -> Result<(), TandemError> {
        self.lock().typing += 1;
        Ok(())
    }

    async fn edit(&self, id: &MessageId, content: &str) -> Result<(), TandemError> {
        self.lock().edits.push((id.clone(), content.to_string()));
        Ok(())
    }

    async fn react(&self, id: &MessageId, emoji: &str) -> Result<(), TandemError> {
        self.lock()
            .reactions
            .push((id.clone(), emoji.to_string(), true));
        Ok(())
    }

    async fn unreact(&self, id: &MessageId, emoji: &str) -> Result<(), TandemError> {
        self.lock()
            .reactions
            .push((id.clone(), emoji.to_string(), false));
        Ok(())
    }
}

/// Hub resolving participants to [`MockChannel`]s, created on first use.
#[derive(Default)]
pub struct MockHub {
    channels: Mutex<HashMap<ParticipantId, Arc<MockChannel>>>,
    unresolvable: Mutex<HashSet<ParticipantId>>,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel for `id`, creating it if needed. Use this in assertions
    /// so the channel exists before the engine resolves it.
    pub fn channel(&self, id: ParticipantId) -> Arc<MockChannel> {
        self.channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(id)
            .or_insert_with(|| Arc::new(MockChannel::new(id)))
            .clone()
    }

    /// Make `channel_for` fail for `id` from now on.
    pub fn set_unresolvable(&self, id: ParticipantId) {
        self.unresolvable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id);
    }
}

#[async_trait]
impl ChannelHub for MockHub {
    async fn channel_for(&self, id: ParticipantId) -> Result<Arc<dyn Channel>, TandemError> {
        if self
            .unresolvable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id)
        {
            return Err(TandemError::Unreachable { participant: id });
        }
        Ok(self.channel(id))
    }
}
