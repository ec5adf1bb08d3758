// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`Directory`] with the same observable semantics as the SQLite
//! implementation: FIFO candidate ordering, bidirectional block exclusion,
//! previous-partner exclusion, and the wildcard-identity compatibility rule.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tandem_core::{
    compatible, Directory, Participant, ParticipantId, PrefMask, Tally, TandemError,
};

#[derive(Default)]
struct Inner {
    participants: HashMap<ParticipantId, Participant>,
    by_platform: HashMap<String, ParticipantId>,
    blocks: HashSet<(ParticipantId, ParticipantId)>,
    next_id: i64,
}

/// A `HashMap`-backed identity store for tests.
#[derive(Default)]
pub struct MemoryDirectory {
    inner: Mutex<Inner>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Direct snapshot access for assertions.
    pub fn snapshot(&self, id: ParticipantId) -> Option<Participant> {
        self.lock().participants.get(&id).cloned()
    }

    /// True iff a directed block exists.
    pub fn has_block(&self, blocker: ParticipantId, blocked: ParticipantId) -> bool {
        self.lock().blocks.contains(&(blocker, blocked))
    }
}

fn unknown(id: ParticipantId) -> TandemError {
    TandemError::Internal(format!("unknown participant {id}"))
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn upsert(&self, platform_id: &str, handle: &str) -> Result<Participant, TandemError> {
        let mut inner = self.lock();
        let now = Utc::now();
        if let Some(&id) = inner.by_platform.get(platform_id) {
            let p = inner.participants.get_mut(&id).ok_or_else(|| unknown(id))?;
            p.handle = handle.to_string();
            p.last_seen_at = now;
            p.accessible = true;
            return Ok(p.clone());
        }
        inner.next_id += 1;
        let id = ParticipantId(inner.next_id);
        let p = Participant {
            id,
            platform_id: platform_id.to_string(),
            handle: handle.to_string(),
            mask: PrefMask::default(),
            accessible: true,
            convo_with: None,
            prev_with: None,
            seeking_since: None,
            greeting: None,
            num_messages: 0,
            num_sessions: 0,
            banned: false,
            created_at: now,
            last_seen_at: now,
        };
        inner.by_platform.insert(platform_id.to_string(), id);
        inner.participants.insert(id, p.clone());
        Ok(p)
    }

    async fn get(&self, id: ParticipantId) -> Result<Participant, TandemError> {
        self.lock()
            .participants
            .get(&id)
            .cloned()
            .ok_or_else(|| unknown(id))
    }

    async fn set_mask(&self, id: ParticipantId, mask: PrefMask) -> Result<(), TandemError> {
        let mut inner = self.lock();
        let p = inner.participants.get_mut(&id).ok_or_else(|| unknown(id))?;
        p.mask = mask;
        Ok(())
    }

    async fn begin_seeking(
        &self,
        id: ParticipantId,
        since: DateTime<Utc>,
        greeting: &str,
    ) -> Result<(), TandemError> {
        let mut inner = self.lock();
        let p = inner.participants.get_mut(&id).ok_or_else(|| unknown(id))?;
        p.seeking_since = Some(since);
        p.greeting = Some(greeting.to_string());
        p.convo_with = None;
        Ok(())
    }

    async fn stop_seeking(&self, id: ParticipantId) -> Result<(), TandemError> {
        let mut inner = self.lock();
        let p = inner.participants.get_mut(&id).ok_or_else(|| unknown(id))?;
        p.seeking_since = None;
        p.greeting = None;
        Ok(())
    }

    async fn commit_join(&self, a: ParticipantId, b: ParticipantId) -> Result<(), TandemError> {
        let mut inner = self.lock();
        for (me, them) in [(a, b), (b, a)] {
            let p = inner.participants.get_mut(&me).ok_or_else(|| unknown(me))?;
            p.convo_with = Some(them);
            p.prev_with = Some(them);
            p.seeking_since = None;
            p.greeting = None;
            p.num_sessions += 1;
            p.num_messages += 1;
        }
        Ok(())
    }

    async fn clear_pair(&self, a: ParticipantId, b: ParticipantId) -> Result<(), TandemError> {
        let mut inner = self.lock();
        for id in [a, b] {
            let p = inner.participants.get_mut(&id).ok_or_else(|| unknown(id))?;
            p.convo_with = None;
            p.seeking_since = None;
            p.greeting = None;
        }
        Ok(())
    }

    async fn mark_inaccessible(
        &self,
        id: ParticipantId,
        banned: bool,
    ) -> Result<(), TandemError> {
        let mut inner = self.lock();
        let p = inner.participants.get_mut(&id).ok_or_else(|| unknown(id))?;
        p.accessible = false;
        p.convo_with = None;
        p.seeking_since = None;
        p.greeting = None;
        p.banned = p.banned || banned;
        Ok(())
    }

    async fn bump_messages(&self, id: ParticipantId) -> Result<(), TandemError> {
        let mut inner = self.lock();
        let p = inner.participants.get_mut(&id).ok_or_else(|| unknown(id))?;
        p.num_messages += 1;
        Ok(())
    }

    async fn find_candidate(
        &self,
        seeker: &Participant,
        effective_mask: PrefMask,
    ) -> Result<Option<Participant>, TandemError> {
        let inner = self.lock();
        let candidate = inner
            .participants
            .values()
            .filter(|p| {
                p.accessible
                    && !p.banned
                    && p.convo_with.is_none()
                    && p.seeking_since.is_some()
                    && p.id != seeker.id
                    && p.platform_id != seeker.platform_id
                    && Some(p.id) != seeker.prev_with
                    && !inner.blocks.contains(&(seeker.id, p.id))
                    && !inner.blocks.contains(&(p.id, seeker.id))
                    && compatible(effective_mask, p.mask)
            })
            .min_by_key(|p| p.seeking_since)
            .cloned();
        Ok(candidate)
    }

    async fn count_seeking_narrow(&self, desire_bits: u8) -> Result<u32, TandemError> {
        if desire_bits == 0b111 {
            return Ok(0);
        }
        let inner = self.lock();
        let count = inner
            .participants
            .values()
            .filter(|p| p.is_seeking() && p.mask.desire_bits() == desire_bits)
            .count();
        Ok(count as u32)
    }

    async fn create_block(
        &self,
        blocker: ParticipantId,
        blocked: ParticipantId,
    ) -> Result<(), TandemError> {
        self.lock().blocks.insert((blocker, blocked));
        Ok(())
    }

    async fn tally(&self) -> Result<Tally, TandemError> {
        let inner = self.lock();
        let mut tally = Tally::default();
        for p in inner.participants.values() {
            if p.accessible {
                tally.accessible += 1;
            }
            tally.sessions += p.num_sessions;
            tally.messages += p.num_messages;
        }
        Ok(tally)
    }
}
