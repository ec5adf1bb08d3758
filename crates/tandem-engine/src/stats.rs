// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wait-time statistics: a bounded, time-windowed log of completed matches.
//!
//! Each successful join appends one entry per participant in the pair; the
//! initiator's entry carries its id, the paired entry is anonymous. Entries
//! are pruned lazily on every read and write -- never by a background timer.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tandem_core::{ParticipantId, PrefMask};

/// One half of a recorded match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEntry {
    pub at: DateTime<Utc>,
    /// Absent marks the second half of a pair-entry.
    pub initiator: Option<ParticipantId>,
    /// The effective mask the match was made under (post-broadening).
    pub mask: PrefMask,
    pub wait: Duration,
}

/// Time-ordered log of completed matches, bounded by age and entry count.
pub struct MatchLog {
    entries: VecDeque<MatchEntry>,
    retention: chrono::Duration,
    cap: usize,
}

impl MatchLog {
    pub fn new(retention: Duration, cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            retention: chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::hours(24)),
            cap,
        }
    }

    /// Append the pair-entry for a completed match and prune.
    pub fn record(
        &mut self,
        initiator: ParticipantId,
        now: DateTime<Utc>,
        wait: Duration,
        mask: PrefMask,
    ) {
        self.entries.push_back(MatchEntry {
            at: now,
            initiator: Some(initiator),
            mask,
            wait,
        });
        self.entries.push_back(MatchEntry {
            at: now,
            initiator: None,
            mask,
            wait,
        });
        self.prune(now);
    }

    /// Mean wait over retained entries whose mask equals `mask` exactly.
    ///
    /// Exact-mask matching is intentional: broadened matches are recorded
    /// under the broadened mask actually used, so a narrow query reflects
    /// only genuinely narrow matches.
    pub fn estimate(&mut self, mask: PrefMask, now: DateTime<Utc>) -> Option<Duration> {
        self.prune(now);
        let waits: Vec<Duration> = self
            .entries
            .iter()
            .filter(|e| e.mask == mask)
            .map(|e| e.wait)
            .collect();
        if waits.is_empty() {
            return None;
        }
        let total: Duration = waits.iter().sum();
        Some(total / waits.len() as u32)
    }

    /// Timestamp of the most recent match involving `id` as initiator.
    pub fn last_match_for(&mut self, id: ParticipantId, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.prune(now);
        self.entries
            .iter()
            .rev()
            .find(|e| e.initiator == Some(id))
            .map(|e| e.at)
    }

    /// Retained entry count (after pruning).
    pub fn len(&mut self, now: DateTime<Utc>) -> usize {
        self.prune(now);
        self.entries.len()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        while self
            .entries
            .front()
            .is_some_and(|e| e.at < cutoff)
        {
            self.entries.pop_front();
        }
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn log() -> MatchLog {
        MatchLog::new(Duration::from_secs(24 * 3600), 8)
    }

    #[test]
    fn records_pair_entries() {
        let mut log = log();
        let now = Utc::now();
        log.record(ParticipantId(1), now, Duration::from_secs(60), PrefMask::default());
        assert_eq!(log.len(now), 2);
    }

    #[test]
    fn estimate_is_exact_mask_mean() {
        let mut log = log();
        let now = Utc::now();
        let narrow = PrefMask::from_bits(0b100_010);
        log.record(ParticipantId(1), now, Duration::from_secs(60), narrow);
        log.record(ParticipantId(2), now, Duration::from_secs(180), narrow);
        log.record(ParticipantId(3), now, Duration::from_secs(600), PrefMask::default());

        assert_eq!(log.estimate(narrow, now), Some(Duration::from_secs(120)));
        assert_eq!(
            log.estimate(PrefMask::default(), now),
            Some(Duration::from_secs(600))
        );
        assert_eq!(log.estimate(PrefMask::from_bits(0b010_010), now), None);
    }

    #[test]
    fn entries_age_out() {
        let mut log = log();
        let start = Utc::now();
        log.record(ParticipantId(1), start, Duration::from_secs(60), PrefMask::default());

        let later = start + chrono::Duration::hours(25);
        assert_eq!(log.estimate(PrefMask::default(), later), None);
        assert_eq!(log.len(later), 0);
    }

    #[test]
    fn cap_evicts_exactly_the_oldest() {
        let mut log = MatchLog::new(Duration::from_secs(24 * 3600), 4);
        let now = Utc::now();
        for i in 0..3 {
            log.record(
                ParticipantId(i),
                now + chrono::Duration::seconds(i),
                HOUR,
                PrefMask::default(),
            );
        }
        // 6 entries recorded into a capacity-4 log: the two oldest pairs
        // were trimmed down to the cap.
        assert_eq!(log.len(now + chrono::Duration::seconds(3)), 4);
        assert_eq!(log.last_match_for(ParticipantId(0), now + chrono::Duration::seconds(3)), None);
        assert!(log
            .last_match_for(ParticipantId(2), now + chrono::Duration::seconds(3))
            .is_some());
    }

    #[test]
    fn last_match_tracks_initiator_only() {
        let mut log = log();
        let now = Utc::now();
        log.record(ParticipantId(7), now, HOUR, PrefMask::default());
        assert_eq!(log.last_match_for(ParticipantId(7), now), Some(now));
        // The anonymous pair half never matches an id.
        assert_eq!(log.last_match_for(ParticipantId(8), now), None);
    }
}
