// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-visible notice text.
//!
//! All end-user wording lives here as plain strings; presentation (embeds,
//! buttons) is an outer surface the core does not own. Failures are short,
//! actionable one-liners.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tandem_core::{Participant, Tally};

/// Placeholder content pushed to the mirrored copy of a deleted message.
pub const DELETED_PLACEHOLDER: &str = "[deleted]";

/// Substituted when a matched seeker enrolled without greeting text.
pub const NO_GREETING: &str = "[Your partner sent no greeting text]";

pub const SEND_TO_START: &str = "Send a message to start a new conversation.";

pub const MAINTENANCE: &str = "The service is currently in maintenance mode.\n\
    Your conversation will continue as normal once work is complete.\n\
    Please try again in five minutes.";

pub const BANNED: &str = "You are banned from using this service.";

pub const SLOW_DOWN: &str = "You are sending messages too quickly. \
    Wait a moment and try again.";

pub const LINK_REFUSED: &str = "Links are disabled until you have a few \
    conversations behind you. Your message was not delivered.";

pub const REMATCH_COOLDOWN: &str = "You just left a conversation. \
    Wait a minute before starting a new one.";

pub const SEARCH_FAILED: &str = "Couldn't find you a partner right now. \
    Send another message to try again.";

pub const BROADENED: &str = "Many people are waiting with the same preference, \
    so your search was widened to anyone for this match.";

pub const PARTNER_LEFT: &str = "Your partner left the conversation.";

pub const PARTNER_DISAPPEARED: &str = "Sorry, but your partner left the conversation.";

/// Service-wide footer line, e.g. `"12 strangers; 340 convos, 8,912 messages ever."`
pub fn footer(tally: &Tally) -> String {
    format!(
        "{} strangers; {} convos, {} messages ever.",
        tally.accessible, tally.sessions, tally.messages
    )
}

/// Human wait phrasing: sub-minute waits read as "less than a minute".
pub fn minutes(wait: Duration) -> String {
    let min = wait.as_secs().div_ceil(60);
    if min <= 1 {
        "less than a minute".to_string()
    } else {
        format!("{min} minutes")
    }
}

/// One participant's profile/stat line for the matched notice.
pub fn profile_line(label: &str, p: &Participant, now: DateTime<Utc>) -> String {
    let days = (now - p.created_at).num_days();
    let joined = match days {
        d if d < 1 => "today".to_string(),
        d if d < 2 => "yesterday".to_string(),
        d => format!("{d} days ago"),
    };
    format!(
        "{label} -- {}: joined {joined}; {} convos, {} messages.",
        p.mask.summary(),
        p.num_sessions,
        p.num_messages
    )
}

/// The matched notice, from `you`'s perspective.
pub fn matched(you: &Participant, them: &Participant, wait: Duration, now: DateTime<Utc>) -> String {
    format!(
        "You have been matched with a partner!\n\
         {}\n\
         {}\n\
         It took {} for this match to be found.\n\
         To disconnect use /stop.\n\
         To disconnect and block them, use /block.\n\
         To match particular identities, use /pref.",
        profile_line("You", you, now),
        profile_line("Them", them, now),
        minutes(wait)
    )
}

/// The enrolled-and-waiting notice.
pub fn waiting(estimate: Option<Duration>, tally: Option<&Tally>) -> String {
    let mut text = String::from("Waiting for a partner match...\n");
    if let Some(est) = estimate {
        text.push_str(&format!("Estimated wait time: {}.\n", minutes(est)));
    }
    text.push_str("Your message will be sent to them.\nTo cancel, use /stop.");
    if let Some(tally) = tally {
        text.push('\n');
        text.push_str(&footer(tally));
    }
    text
}

/// First-contact welcome.
pub fn welcome(service_name: &str) -> String {
    format!(
        "Welcome! {service_name} connects you to random people in direct \
         messages. Send a message to start a conversation."
    )
}

/// The preference menu summary shown by `/pref` with no argument.
pub fn pref_summary(p: &Participant) -> String {
    format!(
        "Your preferences: {}.\n\
         To change: /pref male | female | nonbinary | nosay\n\
         To toggle who you seek: /pref seeking male | female | nonbinary",
        p.mask.summary()
    )
}

pub fn disconnected(tally: Option<&Tally>) -> String {
    with_footer("You have disconnected.", tally)
}

pub fn stopped_seeking(tally: Option<&Tally>) -> String {
    with_footer("You are no longer seeking.", tally)
}

pub fn not_in_conversation(tally: Option<&Tally>) -> String {
    with_footer("You aren't in a conversation.", tally)
}

pub const BLOCKED: &str = "Disconnected and blocked.\n\
    You will never match with them again.\n\
    Send a message to start a new conversation.";

pub const BLOCKED_PREVIOUS: &str = "Blocked your previous partner.\n\
    You will never match with them again.";

fn with_footer(line: &str, tally: Option<&Tally>) -> String {
    match tally {
        Some(tally) => format!("{line}\n{}\n{}", SEND_TO_START, footer(tally)),
        None => format!("{line}\n{SEND_TO_START}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{ParticipantId, PrefMask};

    #[test]
    fn minutes_phrasing() {
        assert_eq!(minutes(Duration::from_secs(30)), "less than a minute");
        assert_eq!(minutes(Duration::from_secs(60)), "less than a minute");
        assert_eq!(minutes(Duration::from_secs(150)), "3 minutes");
    }

    #[test]
    fn matched_notice_includes_both_profiles() {
        let now = Utc::now();
        let mut you = Participant {
            id: ParticipantId(1),
            platform_id: "a".into(),
            handle: "a".into(),
            mask: PrefMask::from_bits(0b100_111),
            accessible: true,
            convo_with: None,
            prev_with: None,
            seeking_since: None,
            greeting: None,
            num_messages: 14,
            num_sessions: 3,
            banned: false,
            created_at: now - chrono::Duration::days(3),
            last_seen_at: now,
        };
        let mut them = you.clone();
        them.id = ParticipantId(2);
        them.created_at = now;
        you.num_sessions = 3;

        let text = matched(&you, &them, Duration::from_secs(90), now);
        assert!(text.contains("You -- male, seeking anyone: joined 3 days ago; 3 convos"));
        assert!(text.contains("Them -- male, seeking anyone: joined today"));
        assert!(text.contains("It took 2 minutes"));
    }

    #[test]
    fn waiting_notice_with_and_without_estimate() {
        let text = waiting(None, None);
        assert!(!text.contains("Estimated"));
        let text = waiting(Some(Duration::from_secs(240)), None);
        assert!(text.contains("Estimated wait time: 4 minutes."));
    }

    #[test]
    fn footer_format() {
        let tally = Tally {
            accessible: 12,
            sessions: 340,
            messages: 8912,
        };
        assert_eq!(footer(&tally), "12 strangers; 340 convos, 8912 messages ever.");
    }
}
