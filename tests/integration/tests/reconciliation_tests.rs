//! Reconciliation Integration Tests
//!
//! Drive both entry points against the in-memory store and check the
//! arrival-order guarantees end to end.
//!
//! Run with: cargo test -p integration-tests --test reconciliation_tests

use std::sync::Arc;
use std::time::Duration;

use integration_tests::{fixtures::*, Harness};
use reaction_core::{Message, ReactionChange};
use reaction_service::{ApplyOutcome, DropReason, ReactionOutcome};

// ============================================================================
// Arrival Order Tests
// ============================================================================

#[tokio::test]
async fn test_reaction_to_stored_message_applied_once() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let sent_at = unique_timestamp();
    let target = h.store_incoming(&alice, alice.id, sent_at);

    let outcome = h.react(ReactionBuilder::new("❤️", &alice.identity, sent_at, &bob).build()).await;

    assert_eq!(
        outcome,
        ReactionOutcome::Handled {
            conversation_id: alice.id,
            apply: ApplyOutcome::Attached(ReactionChange::Added),
        }
    );
    assert!(h.buffer.is_empty());
    let stored = h.stored(target.id);
    assert_eq!(stored.reactions.len(), 1);
    assert_eq!(stored.reaction_from(bob.id).unwrap().emoji, "❤️");
}

#[tokio::test]
async fn test_reaction_before_message_claimed_on_arrival() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let sent_at = unique_timestamp();

    let outcome = h.react(ReactionBuilder::new("❤️", &alice.identity, sent_at, &bob).build()).await;
    assert_eq!(outcome, ReactionOutcome::Pending);
    assert_eq!(h.buffer.len(), 1);

    let message = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at);
    let (message, claimed) = h.deliver(message).await;

    assert_eq!(claimed, 1);
    assert!(h.buffer.is_empty());
    assert_eq!(message.reaction_from(bob.id).unwrap().emoji, "❤️");
    assert_eq!(h.stored(message.id).reaction_from(bob.id).unwrap().emoji, "❤️");
}

#[tokio::test]
async fn test_pending_reactions_last_write_wins() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let sam = h.contact("+15550000003");
    let sent_at = unique_timestamp();

    h.react(ReactionBuilder::new("👍", &alice.identity, sent_at, &sam).at(sent_at + 10).build())
        .await;
    h.react(ReactionBuilder::new("😂", &alice.identity, sent_at, &sam).at(sent_at + 20).build())
        .await;

    let message = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at);
    let (message, claimed) = h.deliver(message).await;

    assert_eq!(claimed, 2);
    let stored = h.stored(message.id);
    assert_eq!(stored.reactions.len(), 1);
    assert_eq!(stored.reaction_from(sam.id).unwrap().emoji, "😂");
}

#[tokio::test]
async fn test_reaction_and_removal_before_message() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let sent_at = unique_timestamp();

    h.react(ReactionBuilder::new("👍", &alice.identity, sent_at, &bob).at(sent_at + 10).build())
        .await;
    h.react(
        ReactionBuilder::new("👍", &alice.identity, sent_at, &bob)
            .at(sent_at + 20)
            .removal()
            .build(),
    )
    .await;

    let message = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at);
    let (message, _) = h.deliver(message).await;

    assert!(message.reactions.is_empty());
    assert!(h.buffer.is_empty());
}

#[tokio::test]
async fn test_aliased_author_applied_regardless_of_arrival_order() {
    let mut attached = Vec::new();

    for reaction_first in [true, false] {
        let h = Harness::start().expect("Failed to start harness");
        let alice = h.contact("alice-aci");
        let bob = h.contact("+15550000002");
        let phone = identity("+15550000001");
        h.directory.alias(phone.clone(), alice.id);
        let sent_at = unique_timestamp();
        let record = ReactionBuilder::new("❤️", &phone, sent_at, &bob).build();
        let message = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at);

        if reaction_first {
            assert_eq!(h.react(record).await, ReactionOutcome::Pending);
            h.deliver(message.clone()).await;
        } else {
            h.deliver(message.clone()).await;
            h.react(record).await;
        }

        assert!(h.buffer.is_empty());
        attached.push(h.stored(message.id).reaction_from(bob.id).map(|r| r.emoji.clone()));
    }

    assert_eq!(attached, vec![Some("❤️".to_string()), Some("❤️".to_string())]);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_unresolvable_author_never_buffered() {
    let h = Harness::start().expect("Failed to start harness");
    let bob = h.contact("+15550000002");
    let ghost = identity("ghost");
    h.directory.forbid(ghost.clone());

    let outcome = h
        .react(ReactionBuilder::new("👍", &ghost, unique_timestamp(), &bob).build())
        .await;

    assert_eq!(outcome, ReactionOutcome::Dropped(DropReason::UnknownAuthor));
    assert!(h.buffer.is_empty());
    assert!(h.messages.is_empty());
}

#[tokio::test]
async fn test_write_failure_does_not_stop_queue() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let sent_at = unique_timestamp();
    let target = h.store_incoming(&alice, alice.id, sent_at);

    h.messages.set_write_failure(true);
    let outcome = h.react(ReactionBuilder::new("👍", &alice.identity, sent_at, &bob).build()).await;
    assert!(matches!(
        outcome,
        ReactionOutcome::Handled {
            apply: ApplyOutcome::Failed,
            ..
        }
    ));
    assert!(h.buffer.is_empty());

    h.messages.set_write_failure(false);
    let outcome = h
        .react(ReactionBuilder::new("😂", &alice.identity, sent_at, &bob).at(sent_at + 900).build())
        .await;
    assert!(matches!(
        outcome,
        ReactionOutcome::Handled {
            apply: ApplyOutcome::Attached(ReactionChange::Added),
            ..
        }
    ));
    assert_eq!(h.stored(target.id).reaction_from(bob.id).unwrap().emoji, "😂");
}

#[tokio::test]
async fn test_apply_rereads_target_at_application_time() {
    let h = Arc::new(Harness::start().expect("Failed to start harness"));
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let sent_at = unique_timestamp();
    let target = h.store_incoming(&alice, alice.id, sent_at);

    // Resolution succeeds, but the apply step waits behind the blocker
    let release = h.block_queue(alice.id).await;
    let record = ReactionBuilder::new("👍", &alice.identity, sent_at, &bob).build();
    let pending = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.react(record).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    h.messages.remove(target.id);
    release.send(()).unwrap();

    let outcome = pending.await.unwrap();
    assert_eq!(
        outcome,
        ReactionOutcome::Handled {
            conversation_id: alice.id,
            apply: ApplyOutcome::Failed,
        }
    );
    assert!(h.buffer.is_empty());
    assert!(h.messages.find_by_id(target.id).is_none());
}

// ============================================================================
// Story Tests
// ============================================================================

#[tokio::test]
async fn test_story_reaction_from_direct_conversation() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let sent_at = unique_timestamp();

    let story = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at)
        .into_story();
    h.messages.insert(story.clone());

    let outcome = h.react(ReactionBuilder::new("🔥", &alice.identity, sent_at, &bob).build()).await;

    let ReactionOutcome::Handled {
        conversation_id,
        apply: ApplyOutcome::StoryReply(reply_id),
    } = outcome
    else {
        panic!("expected story reply, got {outcome:?}");
    };
    assert_eq!(conversation_id, bob.id);

    let reply = h.stored(reply_id);
    assert_eq!(reply.conversation_id, bob.id);
    assert_eq!(reply.story_id, Some(story.id));
    let meta = reply.story_reaction.unwrap();
    assert_eq!(meta.emoji, "🔥");
    assert_eq!(meta.target_author, alice.identity);
    assert_eq!(meta.target_timestamp, sent_at);

    assert!(h.directory.conversation(bob.id).unwrap().message_ids.contains(&reply_id));
    assert_eq!(h.stored(story.id), story);
}

#[tokio::test]
async fn test_story_reaction_from_group_goes_to_story_conversation() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let group = h.directory.create_group();
    let sent_at = unique_timestamp();

    let story = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at)
        .into_story();
    h.messages.insert(story);

    let outcome = h
        .react(ReactionBuilder::new("🔥", &alice.identity, sent_at, &bob).via(group).build())
        .await;

    assert!(matches!(
        outcome,
        ReactionOutcome::Handled {
            conversation_id,
            apply: ApplyOutcome::StoryReply(_),
        } if conversation_id == alice.id
    ));
    assert!(h.directory.conversation(group).unwrap().message_ids.is_empty());
}

#[tokio::test]
async fn test_early_story_reaction_on_arrival() {
    let h = Harness::start().expect("Failed to start harness");
    let alice = h.contact("+15550000001");
    let bob = h.contact("+15550000002");
    let sent_at = unique_timestamp();

    let outcome = h.react(ReactionBuilder::new("🔥", &alice.identity, sent_at, &bob).build()).await;
    assert_eq!(outcome, ReactionOutcome::Pending);

    let story = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at)
        .into_story();
    let (story, claimed) = h.deliver(story).await;

    assert_eq!(claimed, 1);
    assert!(story.reactions.is_empty());
    let replies = h.directory.conversation(bob.id).unwrap().message_ids;
    assert_eq!(replies.len(), 1);
    assert_eq!(h.stored(replies[0]).story_id, Some(story.id));
}

// ============================================================================
// Outgoing Tests
// ============================================================================

#[tokio::test]
async fn test_outgoing_match_without_identity_resolution() {
    let h = Harness::start().expect("Failed to start harness");
    let bob = h.contact("+15550000002");
    let group = h.directory.create_group();
    let sent_at = unique_timestamp();
    let sent = h.store_outgoing(group, sent_at);

    // The directory refuses this author; the outgoing path must not care
    let elsewhere = identity("my-other-device");
    h.directory.forbid(elsewhere.clone());

    let record = ReactionBuilder::new("👏", &elsewhere, sent_at, &bob).build();
    let outcome = h.react(record.clone()).await;

    assert_eq!(
        outcome,
        ReactionOutcome::Outgoing {
            conversation_id: group,
            claimed: vec![record],
        }
    );
    assert!(h.buffer.is_empty());
    assert_eq!(h.stored(sent.id).reaction_from(bob.id).unwrap().emoji, "👏");
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_arrivals_apply_each_reaction_once() {
    const SENDERS: usize = 32;

    let h = Arc::new(Harness::start().expect("Failed to start harness"));
    let alice = h.contact("+15550000001");
    let senders: Vec<_> = (0..SENDERS).map(|i| h.contact(&format!("+1555100{i:04}"))).collect();
    let sent_at = unique_timestamp();

    let mut tasks = Vec::new();
    for (i, sender) in senders.iter().enumerate() {
        let h = Arc::clone(&h);
        let record = ReactionBuilder::new("👍", &alice.identity, sent_at, sender).build();
        tasks.push(tokio::spawn(async move {
            if i % 4 == 0 {
                tokio::task::yield_now().await;
            }
            h.react(record).await
        }));
    }

    let message = Message::new_incoming(h.next_id(), alice.id, alice.id, alice.identity.clone(), sent_at);
    let (message, early) = h.deliver(message).await;

    let mut handled = 0;
    for task in tasks {
        match task.await.unwrap() {
            ReactionOutcome::Handled {
                apply: ApplyOutcome::Attached(ReactionChange::Added),
                ..
            } => handled += 1,
            ReactionOutcome::Handled {
                apply: ApplyOutcome::AlreadyClaimed,
                ..
            }
            | ReactionOutcome::Pending => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(handled + early, SENDERS);
    assert!(h.buffer.is_empty());

    let stored = h.stored(message.id);
    assert_eq!(stored.reactions.len(), SENDERS);
    for sender in &senders {
        assert!(stored.reaction_from(sender.id).is_some());
    }
}
