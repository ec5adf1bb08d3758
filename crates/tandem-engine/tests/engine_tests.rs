// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end engine tests against the in-memory directory and mock channels.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tandem_config::model::TandemConfig;
use tandem_core::{
    Directory, InboundMessage, MessageId, ParticipantId, PrefMask, ReactionChange,
};
use tandem_engine::{Engine, MatchOutcome};
use tandem_test_utils::{MemoryDirectory, MockHub};

fn engine_with(config: TandemConfig) -> (Arc<MemoryDirectory>, Arc<MockHub>, Engine) {
    let dir = Arc::new(MemoryDirectory::new());
    let hub = Arc::new(MockHub::new());
    let engine = Engine::new(config, dir.clone(), hub.clone());
    (dir, hub, engine)
}

fn engine() -> (Arc<MemoryDirectory>, Arc<MockHub>, Engine) {
    engine_with(TandemConfig::default())
}

fn msg(platform: &str, message_id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        platform_id: platform.to_string(),
        handle: platform.to_string(),
        message_id: MessageId(message_id.to_string()),
        content: text.to_string(),
        attachments: Vec::new(),
        reply_to: None,
    }
}

async fn waiting_user(
    dir: &MemoryDirectory,
    platform: &str,
    bits: u8,
    since: DateTime<Utc>,
) -> ParticipantId {
    let p = dir.upsert(platform, platform).await.unwrap();
    dir.set_mask(p.id, PrefMask::from_bits(bits)).await.unwrap();
    dir.begin_seeking(p.id, since, "hey there").await.unwrap();
    p.id
}

async fn paired_users(dir: &MemoryDirectory) -> (ParticipantId, ParticipantId) {
    let a = dir.upsert("a", "a").await.unwrap();
    let b = dir.upsert("b", "b").await.unwrap();
    dir.commit_join(a.id, b.id).await.unwrap();
    (a.id, b.id)
}

#[tokio::test]
async fn first_message_welcomes_and_enqueues() {
    let (dir, hub, engine) = engine();
    engine.handle_message(&msg("a", "m1", "hello")).await.unwrap();

    let text = hub.channel(ParticipantId(1)).sent_text();
    assert!(text.contains("Welcome!"));
    assert!(text.contains("Waiting for a partner"));
    assert!(dir.snapshot(ParticipantId(1)).unwrap().is_seeking());
}

#[tokio::test]
async fn open_seeker_matches_waiting_narrow_seeker() {
    let (dir, hub, engine) = engine();
    // Declared male seeking only males, already in the pool.
    let narrow = waiting_user(&dir, "narrow", 0b100_100, Utc::now() - Duration::minutes(5)).await;

    engine.handle_message(&msg("open", "m1", "hi!")).await.unwrap();

    let open = dir.snapshot(ParticipantId(2)).unwrap();
    assert_eq!(open.convo_with, Some(narrow));
    assert_eq!(dir.snapshot(narrow).unwrap().convo_with, Some(open.id));

    // The candidate got the matched notice plus the greeting.
    let narrow_text = hub.channel(narrow).sent_text();
    assert!(narrow_text.contains("You have been matched"));
    assert!(narrow_text.contains("hi!"));
    // The seeker got the candidate's stored greeting.
    let open_text = hub.channel(open.id).sent_text();
    assert!(open_text.contains("You have been matched"));
    assert!(open_text.contains("hey there"));
}

#[tokio::test]
async fn oldest_compatible_candidate_wins() {
    let (dir, _hub, engine) = engine();
    let t0 = Utc::now();
    let oldest = waiting_user(&dir, "w1", 0b111_111, t0 - Duration::minutes(30)).await;
    let _newer = waiting_user(&dir, "w2", 0b111_111, t0 - Duration::minutes(10)).await;

    engine.handle_message(&msg("c", "m1", "hello")).await.unwrap();
    let c = dir.snapshot(ParticipantId(3)).unwrap();
    assert_eq!(c.convo_with, Some(oldest));
}

#[tokio::test]
async fn matched_pair_is_exclusive() {
    let (dir, _hub, engine) = engine();
    let a = waiting_user(&dir, "a", 0b111_111, Utc::now() - Duration::minutes(5)).await;

    engine.handle_message(&msg("b", "m1", "hi")).await.unwrap();
    engine.handle_message(&msg("c", "m1", "hi")).await.unwrap();

    // c cannot be paired with either member of the (a, b) session.
    let c = dir.snapshot(ParticipantId(3)).unwrap();
    assert!(c.is_seeking());
    assert_eq!(dir.snapshot(a).unwrap().convo_with, Some(ParticipantId(2)));
}

#[tokio::test]
async fn unreachable_candidate_is_discarded_for_the_next() {
    let (dir, hub, engine) = engine();
    let t0 = Utc::now();
    let dead = waiting_user(&dir, "dead", 0b111_111, t0 - Duration::minutes(20)).await;
    let alive = waiting_user(&dir, "alive", 0b111_111, t0 - Duration::minutes(10)).await;
    hub.channel(dead).fail_sends(true);

    engine.handle_message(&msg("s", "m1", "hi")).await.unwrap();

    assert!(!dir.snapshot(dead).unwrap().accessible);
    let seeker = dir.snapshot(ParticipantId(3)).unwrap();
    assert_eq!(seeker.convo_with, Some(alive));
}

#[tokio::test]
async fn all_candidates_failing_reports_search_failure() {
    let (dir, hub, engine) = engine();
    let t0 = Utc::now();
    for i in 0..5 {
        let id = waiting_user(
            &dir,
            &format!("w{i}"),
            0b111_111,
            t0 - Duration::minutes(30 - i),
        )
        .await;
        hub.channel(id).fail_sends(true);
    }

    engine.handle_message(&msg("s", "m1", "hi")).await.unwrap();
    let text = hub.channel(ParticipantId(6)).sent_text();
    assert!(text.contains("Couldn't find you a partner"));
}

#[tokio::test]
async fn unreachable_seeker_rolls_the_join_back() {
    let (dir, hub, engine) = engine();
    let t0 = Utc::now() - Duration::minutes(5);
    let cand = waiting_user(&dir, "cand", 0b111_111, t0).await;
    let seeker = dir.upsert("s", "s").await.unwrap();
    hub.channel(seeker.id).fail_sends(true);

    let outcome = engine.find_or_enqueue(seeker.id, "hi").await.unwrap();
    assert_eq!(outcome, MatchOutcome::SeekerGone);

    // No session survives and the seeker is written off.
    let s = dir.snapshot(seeker.id).unwrap();
    assert!(!s.accessible);
    assert_eq!(s.convo_with, None);

    // The candidate is back in the pool at their original position and was
    // told what happened.
    let c = dir.snapshot(cand).unwrap();
    assert_eq!(c.convo_with, None);
    assert_eq!(c.seeking_since, Some(t0));
    assert!(hub.channel(cand).sent_text().contains("your partner left"));

    // Their queue position still wins against the next arrival.
    engine.handle_message(&msg("next", "m1", "hello")).await.unwrap();
    assert!(dir.snapshot(cand).unwrap().convo_with.is_some());
}

#[tokio::test]
async fn congestion_broadens_a_narrow_search() {
    let (dir, hub, engine) = engine();
    let t0 = Utc::now();
    // Five males seeking female: pairwise incompatible, all stuck waiting,
    // all sharing the desire half the new seeker has.
    let oldest = waiting_user(&dir, "m0", 0b100_010, t0 - Duration::minutes(50)).await;
    for i in 1..5 {
        waiting_user(&dir, &format!("m{i}"), 0b100_010, t0 - Duration::minutes(40 - i)).await;
    }

    // Female seeking female: narrow search finds nobody, but with five
    // same-desire seekers already queued it is broadened to anyone.
    let f = dir.upsert("f", "f").await.unwrap();
    dir.set_mask(f.id, PrefMask::from_bits(0b010_010)).await.unwrap();
    engine.handle_message(&msg("f", "m1", "hello")).await.unwrap();

    assert_eq!(dir.snapshot(f.id).unwrap().convo_with, Some(oldest));
    assert!(hub.channel(f.id).sent_text().contains("widened to anyone"));
}

#[tokio::test]
async fn narrow_search_below_threshold_stays_narrow() {
    let (dir, hub, engine) = engine();
    let t0 = Utc::now();
    for i in 0..3 {
        waiting_user(&dir, &format!("m{i}"), 0b100_010, t0 - Duration::minutes(30 - i)).await;
    }

    let f = dir.upsert("f", "f").await.unwrap();
    dir.set_mask(f.id, PrefMask::from_bits(0b010_010)).await.unwrap();
    engine.handle_message(&msg("f", "m1", "hello")).await.unwrap();

    assert!(dir.snapshot(f.id).unwrap().is_seeking());
    assert!(!hub.channel(f.id).sent_text().contains("widened"));
}

#[tokio::test]
async fn enrolled_seeker_does_not_count_toward_congestion() {
    let (dir, _hub, engine) = engine();
    let t0 = Utc::now();
    // Four males seeking female: exactly at the threshold.
    for i in 0..4 {
        waiting_user(&dir, &format!("m{i}"), 0b100_010, t0 - Duration::minutes(30 - i)).await;
    }
    // Female seeking female, already enrolled. Her repeat search shares the
    // same desire half; counting her own enrollment would tip the pool over
    // the threshold.
    let f = waiting_user(&dir, "f", 0b010_010, t0 - Duration::minutes(1)).await;

    let outcome = engine.find_or_enqueue(f, "hello").await.unwrap();
    assert!(matches!(
        outcome,
        MatchOutcome::Enqueued {
            broadened: false,
            ..
        }
    ));
    assert!(dir.snapshot(f).unwrap().is_seeking());
}

#[tokio::test]
async fn relay_forwards_to_partner_and_counts() {
    let (dir, hub, engine) = engine();
    let (a, b) = paired_users(&dir).await;

    engine.handle_message(&msg("a", "a-m1", "how are you?")).await.unwrap();

    let delivered = hub.channel(b).sent();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].content, "how are you?");
    assert_eq!(dir.snapshot(a).unwrap().num_messages, 2);
}

#[tokio::test]
async fn replies_thread_through_the_mirror() {
    let (dir, hub, engine) = engine();
    let (_a, b) = paired_users(&dir).await;

    engine.handle_message(&msg("a", "a-m1", "first")).await.unwrap();
    let delivered_id = MessageId(format!("{b}-0"));

    let mut reply = msg("b", "b-m1", "replying");
    reply.reply_to = Some(delivered_id);
    engine.handle_message(&reply).await.unwrap();

    let back = hub.channel(ParticipantId(1)).sent();
    assert_eq!(back.last().unwrap().reply_to, Some(MessageId("a-m1".into())));
}

#[tokio::test]
async fn edits_deletions_and_reactions_propagate() {
    let (dir, hub, engine) = engine();
    let (_a, b) = paired_users(&dir).await;

    engine.handle_message(&msg("a", "a-m1", "tpyo")).await.unwrap();
    let delivered_id = MessageId(format!("{b}-0"));

    engine.handle_edit(&MessageId("a-m1".into()), Some("typo")).await;
    engine.handle_edit(&MessageId("a-m1".into()), None).await;
    engine
        .handle_reaction(&MessageId("a-m1".into()), "👍", ReactionChange::Add)
        .await;
    engine
        .handle_reaction(&MessageId("a-m1".into()), "👍", ReactionChange::Remove)
        .await;

    let edits = hub.channel(b).edits();
    assert_eq!(edits[0], (delivered_id.clone(), "typo".to_string()));
    assert_eq!(edits[1], (delivered_id.clone(), "[deleted]".to_string()));
    let reactions = hub.channel(b).reactions();
    assert_eq!(reactions[0], (delivered_id.clone(), "👍".to_string(), true));
    assert_eq!(reactions[1], (delivered_id, "👍".to_string(), false));
}

#[tokio::test]
async fn unmirrored_edit_is_ignored() {
    let (_dir, _hub, engine) = engine();
    // Must not panic or send anything.
    engine.handle_edit(&MessageId("nope".into()), Some("x")).await;
}

#[tokio::test]
async fn vanished_partner_tears_the_session_down() {
    let (dir, hub, engine) = engine();
    let (a, b) = paired_users(&dir).await;
    hub.set_unresolvable(b);

    engine.handle_message(&msg("a", "a-m1", "hello?")).await.unwrap();

    assert_eq!(dir.snapshot(a).unwrap().convo_with, None);
    assert!(!dir.snapshot(b).unwrap().accessible);
    assert!(hub
        .channel(a)
        .sent_text()
        .contains("your partner left the conversation"));
}

#[tokio::test]
async fn stop_disconnects_and_notifies_the_partner() {
    let (dir, hub, engine) = engine();
    let (a, b) = paired_users(&dir).await;

    engine.handle_message(&msg("a", "a-m1", "/stop")).await.unwrap();

    assert_eq!(dir.snapshot(a).unwrap().convo_with, None);
    assert_eq!(dir.snapshot(b).unwrap().convo_with, None);
    assert!(hub.channel(a).sent_text().contains("You have disconnected"));
    assert!(hub.channel(b).sent_text().contains("Your partner left"));
}

#[tokio::test]
async fn stop_while_seeking_leaves_the_pool() {
    let (dir, hub, engine) = engine();
    engine.handle_message(&msg("a", "m1", "hi")).await.unwrap();
    engine.handle_message(&msg("a", "m2", "!stop")).await.unwrap();

    assert!(!dir.snapshot(ParticipantId(1)).unwrap().is_seeking());
    assert!(hub
        .channel(ParticipantId(1))
        .sent_text()
        .contains("no longer seeking"));
}

#[tokio::test]
async fn blocked_pairs_never_rematch() {
    let (dir, hub, engine) = engine();
    let (a, b) = paired_users(&dir).await;

    engine.handle_message(&msg("a", "a-m1", "/block")).await.unwrap();
    assert!(dir.has_block(a, b));
    assert!(hub.channel(a).sent_text().contains("blocked"));

    // Both re-enter the pool; neither may be paired with the other.
    engine.handle_message(&msg("a", "a-m2", "again")).await.unwrap();
    engine.handle_message(&msg("b", "b-m1", "again")).await.unwrap();
    assert!(dir.snapshot(a).unwrap().is_seeking());
    assert!(dir.snapshot(b).unwrap().is_seeking());
}

#[tokio::test]
async fn block_when_idle_blocks_the_previous_partner() {
    let (dir, hub, engine) = engine();
    let (a, b) = paired_users(&dir).await;
    dir.clear_pair(a, b).await.unwrap();

    engine.handle_message(&msg("a", "a-m1", "/block")).await.unwrap();
    assert!(dir.has_block(a, b));
    assert!(hub.channel(a).sent_text().contains("previous partner"));
}

#[tokio::test]
async fn rematch_cooldown_applies_to_the_initiator() {
    let (dir, hub, engine) = engine();
    waiting_user(&dir, "w", 0b111_111, Utc::now() - Duration::minutes(5)).await;

    engine.handle_message(&msg("s", "m1", "hi")).await.unwrap();
    let s = ParticipantId(2);
    assert!(dir.snapshot(s).unwrap().in_session());

    engine.handle_message(&msg("s", "m2", "/stop")).await.unwrap();
    engine.handle_message(&msg("s", "m3", "another!")).await.unwrap();

    assert!(!dir.snapshot(s).unwrap().is_seeking());
    assert!(hub.channel(s).sent_text().contains("Wait a minute"));
}

#[tokio::test]
async fn preference_commands_update_the_mask() {
    let (dir, hub, engine) = engine();
    let p = dir.upsert("a", "a").await.unwrap();
    dir.bump_messages(p.id).await.unwrap(); // not first contact

    engine.handle_message(&msg("a", "m1", "/pref female")).await.unwrap();
    assert_eq!(
        dir.snapshot(p.id).unwrap().mask,
        PrefMask::from_bits(0b010_111)
    );

    engine
        .handle_message(&msg("a", "m2", "/pref seeking male"))
        .await
        .unwrap();
    assert_eq!(
        dir.snapshot(p.id).unwrap().mask,
        PrefMask::from_bits(0b010_011)
    );

    engine.handle_message(&msg("a", "m3", "/pref")).await.unwrap();
    assert!(hub.channel(p.id).sent_text().contains("Your preferences"));
}

#[tokio::test]
async fn banned_participants_only_get_the_ban_notice() {
    let (dir, hub, engine) = engine();
    let p = dir.upsert("a", "a").await.unwrap();
    dir.mark_inaccessible(p.id, true).await.unwrap();

    engine.handle_message(&msg("a", "m1", "hello")).await.unwrap();
    assert!(hub.channel(p.id).sent_text().contains("banned"));
    assert!(!dir.snapshot(p.id).unwrap().is_seeking());
}

#[tokio::test]
async fn moderators_can_ban_their_partner() {
    let mut config = TandemConfig::default();
    config.service.moderators = vec!["mod".to_string()];
    let (dir, _hub, engine) = engine_with(config);

    let m = dir.upsert("mod", "mod").await.unwrap();
    let troll = dir.upsert("troll", "troll").await.unwrap();
    dir.commit_join(m.id, troll.id).await.unwrap();

    engine.handle_message(&msg("mod", "m1", "/ban")).await.unwrap();
    let troll = dir.snapshot(troll.id).unwrap();
    assert!(troll.banned);
    assert!(!troll.accessible);
}

#[tokio::test]
async fn ban_is_a_silent_noop_for_regular_users() {
    let (dir, hub, engine) = engine();
    let (a, b) = paired_users(&dir).await;

    engine.handle_message(&msg("a", "m1", "/ban")).await.unwrap();
    assert!(!dir.snapshot(b).unwrap().banned);
    assert!(dir.snapshot(a).unwrap().in_session());
    assert!(!hub.channel(a).sent_text().contains("banned"));
}

#[tokio::test]
async fn maintenance_mode_exempts_moderators() {
    let mut config = TandemConfig::default();
    config.service.maintenance_mode = true;
    config.service.moderators = vec!["mod".to_string()];
    let (dir, hub, engine) = engine_with(config);

    engine.handle_message(&msg("user", "m1", "hi")).await.unwrap();
    assert!(hub
        .channel(ParticipantId(1))
        .sent_text()
        .contains("maintenance"));
    assert!(!dir.snapshot(ParticipantId(1)).unwrap().is_seeking());

    engine.handle_message(&msg("mod", "m1", "hi")).await.unwrap();
    assert!(dir.snapshot(ParticipantId(2)).unwrap().is_seeking());
}

#[tokio::test]
async fn bursts_are_throttled() {
    let (_dir, hub, engine) = engine();
    for i in 0..7 {
        engine
            .handle_message(&msg("a", &format!("m{i}"), "spam"))
            .await
            .unwrap();
    }
    assert!(hub
        .channel(ParticipantId(1))
        .sent_text()
        .contains("too quickly"));
}

#[tokio::test]
async fn new_participants_cannot_relay_links() {
    let (dir, hub, engine) = engine();
    let (_a, b) = paired_users(&dir).await;

    engine
        .handle_message(&msg("a", "m1", "visit https://spam.example"))
        .await
        .unwrap();
    assert!(hub.channel(b).sent().is_empty());
    assert!(hub
        .channel(ParticipantId(1))
        .sent_text()
        .contains("Links are disabled"));
}

#[tokio::test]
async fn typing_passthrough_is_throttled() {
    let (dir, hub, engine) = engine();
    let (_a, b) = paired_users(&dir).await;

    engine.handle_typing("a", "a").await.unwrap();
    engine.handle_typing("a", "a").await.unwrap();
    assert_eq!(hub.channel(b).typing_count(), 1);
}

#[tokio::test]
async fn typing_without_a_session_is_dropped() {
    let (dir, hub, engine) = engine();
    let p = dir.upsert("a", "a").await.unwrap();
    engine.handle_typing("a", "a").await.unwrap();
    assert_eq!(hub.channel(p.id).typing_count(), 0);
}
