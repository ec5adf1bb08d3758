// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-channel message mirror.
//!
//! Every relayed message exists twice: once on the sender's side, once as
//! the forwarded copy. The mirror pairs the two identities so edits,
//! deletions, reactions, and reply threading can be propagated from either
//! side. Eviction is bounded-size circular (oldest-first), independent of
//! age.

use std::collections::VecDeque;

use tandem_core::{MessageId, ParticipantId};

/// One side of a mirrored message: who owns the channel it lives in, and
/// its id there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSide {
    pub owner: ParticipantId,
    pub message: MessageId,
}

#[derive(Debug, Clone)]
struct MirrorPair {
    a: MirrorSide,
    b: MirrorSide,
}

/// Bounded, insertion-ordered associative store of message pairs.
pub struct MessageMirror {
    entries: VecDeque<MirrorPair>,
    capacity: usize,
}

impl MessageMirror {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Record a relayed pair, evicting the oldest entry beyond capacity.
    pub fn push(&mut self, a: MirrorSide, b: MirrorSide) {
        self.entries.push_back(MirrorPair { a, b });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// The counterpart of a message, looked up symmetrically by either
    /// side's id.
    pub fn counterpart(&self, message: &MessageId) -> Option<&MirrorSide> {
        self.entries.iter().find_map(|pair| {
            if pair.a.message == *message {
                Some(&pair.b)
            } else if pair.b.message == *message {
                Some(&pair.a)
            } else {
                None
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
