// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Abuse/spam guards: advisory gates consulted before matching or relaying.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use tandem_config::model::GuardsConfig;
use tandem_core::{Participant, ParticipantId};

/// Bounded ring of recent message sends plus the link-eligibility rule.
pub struct Guards {
    config: GuardsConfig,
    sends: VecDeque<(ParticipantId, DateTime<Utc>)>,
    link_re: Regex,
}

impl Guards {
    pub fn new(config: GuardsConfig) -> Self {
        // Deliberately loose: any scheme-ish or www-prefixed token counts.
        let link_re = Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("static regex");
        Self {
            config,
            sends: VecDeque::new(),
            link_re,
        }
    }

    /// Record a message send for burst accounting.
    pub fn record_send(&mut self, id: ParticipantId, now: DateTime<Utc>) {
        self.sends.push_back((id, now));
        while self.sends.len() > self.config.burst_ring_capacity {
            self.sends.pop_front();
        }
    }

    /// True iff more than `burst_limit` sends for `id` fall within the
    /// trailing burst window.
    pub fn exceeds_burst_limit(&self, id: ParticipantId, now: DateTime<Utc>) -> bool {
        let window = chrono::Duration::from_std(Duration::from_secs(
            self.config.burst_window_secs,
        ))
        .unwrap_or_else(|_| chrono::Duration::seconds(30));
        let cutoff = now - window;
        let recent = self
            .sends
            .iter()
            .filter(|(sender, at)| *sender == id && *at >= cutoff)
            .count();
        recent > self.config.burst_limit as usize
    }

    /// False iff the participant is too new to relay link-bearing text.
    ///
    /// Messages flagged as carrying a non-text attachment are exempt: the
    /// link pattern routinely fires on attachment URLs.
    pub fn link_eligible(
        &self,
        participant: &Participant,
        text: &str,
        has_attachment: bool,
    ) -> bool {
        if has_attachment {
            return true;
        }
        if participant.num_sessions >= self.config.link_min_sessions {
            return true;
        }
        !self.link_re.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::PrefMask;

    fn participant(num_sessions: i64) -> Participant {
        Participant {
            id: ParticipantId(1),
            platform_id: "p".into(),
            handle: "p".into(),
            mask: PrefMask::default(),
            accessible: true,
            convo_with: None,
            prev_with: None,
            seeking_since: None,
            greeting: None,
            num_messages: 0,
            num_sessions,
            banned: false,
            created_at: Utc::now(),
            last_seen_at: Utc::now(),
        }
    }

    #[test]
    fn burst_limit_counts_trailing_window_only() {
        let mut guards = Guards::new(GuardsConfig::default());
        let now = Utc::now();
        let id = ParticipantId(1);

        // Six old sends outside the window.
        for i in 0..6 {
            guards.record_send(id, now - chrono::Duration::seconds(60 + i));
        }
        assert!(!guards.exceeds_burst_limit(id, now));

        // Seven within the window trips the limit of six.
        for i in 0..7 {
            guards.record_send(id, now - chrono::Duration::seconds(i));
        }
        assert!(guards.exceeds_burst_limit(id, now));

        // A different participant is unaffected.
        assert!(!guards.exceeds_burst_limit(ParticipantId(2), now));
    }

    #[test]
    fn ring_is_bounded() {
        let config = GuardsConfig {
            burst_ring_capacity: 4,
            ..GuardsConfig::default()
        };
        let mut guards = Guards::new(config);
        let now = Utc::now();
        for i in 0..10 {
            guards.record_send(ParticipantId(i), now);
        }
        assert_eq!(guards.sends.len(), 4);
        assert_eq!(guards.sends.front().map(|(id, _)| *id), Some(ParticipantId(6)));
    }

    #[test]
    fn link_guard_gates_new_participants() {
        let guards = Guards::new(GuardsConfig::default());
        let newbie = participant(0);
        let veteran = participant(10);

        assert!(!guards.link_eligible(&newbie, "check https://example.com", false));
        assert!(!guards.link_eligible(&newbie, "go to www.example.com now", false));
        assert!(guards.link_eligible(&newbie, "no links here", false));
        // Attachment exemption.
        assert!(guards.link_eligible(&newbie, "https://cdn.example.com/cat.png", true));
        // Veterans pass regardless.
        assert!(guards.link_eligible(&veteran, "https://example.com", false));
    }
}
