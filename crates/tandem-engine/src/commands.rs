// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-user and moderator command handling.

use std::sync::LazyLock;

use regex::Regex;
use tandem_core::{Identity, Outgoing, Participant, PrefChange, TandemError};
use tracing::{info, warn};

use crate::notices;
use crate::session::{EndOutcome, EndReason};
use crate::Engine;

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[/!](\w+)(?:\s+([\s\S]+))?$").expect("static regex"));

/// Split `/name arg...` (or `!name arg...`) into name and trailing argument.
pub(crate) fn parse_command(text: &str) -> Option<(&str, Option<&str>)> {
    let caps = COMMAND_RE.captures(text.trim())?;
    let name = caps.get(1)?.as_str();
    let arg = caps.get(2).map(|m| m.as_str().trim());
    Some((name, arg))
}

fn parse_identity(word: &str) -> Option<Identity> {
    match word {
        "male" | "m" => Some(Identity::Male),
        "female" | "f" => Some(Identity::Female),
        "nonbinary" | "non-binary" | "nb" => Some(Identity::NonBinary),
        _ => None,
    }
}

impl Engine {
    pub(crate) async fn handle_command(
        &self,
        participant: &Participant,
        name: &str,
        arg: Option<&str>,
    ) -> Result<(), TandemError> {
        match name {
            "stop" => self.command_stop(participant).await,
            "block" => self.command_block(participant).await,
            "pref" | "gender" => self.command_pref(participant, arg).await,
            "ban" => self.command_ban(participant).await,
            other => {
                info!(participant = %participant.id, command = other, "unknown command");
                self.notify(
                    participant.id,
                    Outgoing::text("Unknown command. Try /stop, /block, or /pref."),
                )
                .await
            }
        }
    }

    async fn command_stop(&self, participant: &Participant) -> Result<(), TandemError> {
        let outcome = self
            .end_session(participant, EndReason::ExplicitStop, false)
            .await?;
        let tally = self.directory.tally().await.ok();
        let text = match outcome {
            EndOutcome::Disconnected(_) => notices::disconnected(tally.as_ref()),
            EndOutcome::StoppedSeeking => notices::stopped_seeking(tally.as_ref()),
            EndOutcome::Idle => notices::not_in_conversation(tally.as_ref()),
        };
        self.notify(participant.id, Outgoing::text(text)).await
    }

    async fn command_block(&self, participant: &Participant) -> Result<(), TandemError> {
        if let Some(partner) = participant.convo_with {
            self.end_session(participant, EndReason::Block, false).await?;
            self.directory.create_block(participant.id, partner).await?;
            info!(blocker = %participant.id, blocked = %partner, "partner blocked");
            return self
                .notify(participant.id, Outgoing::text(notices::BLOCKED))
                .await;
        }
        // Idle or seeking: the block lands on the previous partner.
        if let Some(prev) = participant.prev_with {
            self.directory.create_block(participant.id, prev).await?;
            info!(blocker = %participant.id, blocked = %prev, "previous partner blocked");
            return self
                .notify(participant.id, Outgoing::text(notices::BLOCKED_PREVIOUS))
                .await;
        }
        let tally = self.directory.tally().await.ok();
        self.notify(
            participant.id,
            Outgoing::text(notices::not_in_conversation(tally.as_ref())),
        )
        .await
    }

    async fn command_pref(
        &self,
        participant: &Participant,
        arg: Option<&str>,
    ) -> Result<(), TandemError> {
        let Some(arg) = arg else {
            return self
                .notify(
                    participant.id,
                    Outgoing::text(notices::pref_summary(participant)),
                )
                .await;
        };

        let lower = arg.to_lowercase();
        let change = if lower == "nosay" {
            Some(PrefChange::RatherNotSay)
        } else if let Some(rest) = lower.strip_prefix("seeking") {
            parse_identity(rest.trim()).map(PrefChange::ToggleDesire)
        } else {
            parse_identity(&lower).map(PrefChange::SetIdentity)
        };

        let Some(change) = change else {
            // Unparseable argument: show the menu again.
            return self
                .notify(
                    participant.id,
                    Outgoing::text(notices::pref_summary(participant)),
                )
                .await;
        };

        let mask = participant.mask.apply(change);
        self.directory.set_mask(participant.id, mask).await?;
        info!(participant = %participant.id, mask = mask.bits(), "preferences updated");
        self.notify(
            participant.id,
            Outgoing::text(format!("Preferences updated: {}.", mask.summary())),
        )
        .await
    }

    /// Moderator-only: end the current (or block the previous) partner's
    /// participation permanently. Silent no-op for everyone else.
    async fn command_ban(&self, participant: &Participant) -> Result<(), TandemError> {
        let is_moderator = self
            .config
            .service
            .moderators
            .iter()
            .any(|m| m == &participant.handle);
        if !is_moderator {
            warn!(participant = %participant.id, "unauthorized ban attempt");
            return Ok(());
        }

        if participant.convo_with.is_some() {
            self.end_session(participant, EndReason::ModeratorBan, true)
                .await?;
            return self
                .notify(participant.id, Outgoing::text("Partner banned."))
                .await;
        }
        if let Some(prev) = participant.prev_with {
            self.directory.mark_inaccessible(prev, true).await?;
            return self
                .notify(participant.id, Outgoing::text("Previous partner banned."))
                .await;
        }
        self.notify(participant.id, Outgoing::text("No partner to ban."))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_and_bang_prefixes() {
        assert_eq!(parse_command("/stop"), Some(("stop", None)));
        assert_eq!(parse_command("!stop"), Some(("stop", None)));
        assert_eq!(
            parse_command("/pref seeking female"),
            Some(("pref", Some("seeking female")))
        );
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn identity_words() {
        assert_eq!(parse_identity("male"), Some(Identity::Male));
        assert_eq!(parse_identity("non-binary"), Some(Identity::NonBinary));
        assert_eq!(parse_identity("nb"), Some(Identity::NonBinary));
        assert_eq!(parse_identity("robot"), None);
    }
}
