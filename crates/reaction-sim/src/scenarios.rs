//! Arrival-order scenarios
//!
//! Each scenario gets a fresh world, drives both entry points, and checks
//! the final state.

use anyhow::{ensure, Context, Result};
use reaction_common::AppConfig;
use reaction_core::{IdentityRef, Message, ReactionRecord};
use reaction_service::{ApplyOutcome, DropReason, ReactionOutcome};
use tracing::info;

use crate::world::World;

pub async fn run_all(config: &AppConfig) -> Result<()> {
    let worker_id = config.snowflake.worker_id;

    early_reaction(World::new(worker_id)?).await.context("early reaction")?;
    last_write_wins(World::new(worker_id)?).await.context("last write wins")?;
    unresolvable_author(World::new(worker_id)?).await.context("unresolvable author")?;
    story_reaction(World::new(worker_id)?).await.context("story reaction")?;
    outgoing_match(World::new(worker_id)?).await.context("outgoing match")?;

    info!("All scenarios passed");
    Ok(())
}

/// ❤️ arrives before the message it targets
async fn early_reaction(world: World) -> Result<()> {
    let alice = world.contact("+15550000001")?;
    let bob = world.contact("+15550000002")?;

    let outcome = world
        .react(ReactionRecord::new("❤️", alice.0.clone(), 1000, 1500, bob.1, bob.1))
        .await;
    ensure!(outcome == ReactionOutcome::Pending, "expected pending, got {outcome:?}");
    ensure!(world.pending() == 1, "reaction not buffered");

    let message = world.deliver(&alice, alice.1, 1000).await;
    ensure!(world.pending() == 0, "reaction still buffered");
    ensure!(
        message.reaction_from(bob.1).is_some_and(|r| r.emoji == "❤️"),
        "reaction missing on delivered message"
    );

    info!(message_id = %message.id, "Early reaction applied on arrival");
    Ok(())
}

/// 👍 then 😂 from the same sender before the target shows up
async fn last_write_wins(world: World) -> Result<()> {
    let alice = world.contact("+15550000001")?;
    let sam = world.contact("+15550000003")?;

    world
        .react(ReactionRecord::new("👍", alice.0.clone(), 1000, 1500, sam.1, sam.1))
        .await;
    world
        .react(ReactionRecord::new("😂", alice.0.clone(), 1000, 1600, sam.1, sam.1))
        .await;

    let message = world.deliver(&alice, alice.1, 1000).await;
    let stored = world
        .messages
        .find_by_id(message.id)
        .context("delivered message not stored")?;
    ensure!(stored.reactions.len() == 1, "sender holds more than one reaction");
    ensure!(
        stored.reaction_from(sam.1).is_some_and(|r| r.emoji == "😂"),
        "latest reaction did not win"
    );

    info!(message_id = %message.id, "Latest reaction kept");
    Ok(())
}

/// Target author has no derivable identity
async fn unresolvable_author(world: World) -> Result<()> {
    let bob = world.contact("+15550000002")?;
    let unknown = IdentityRef::parse("unknown-service-id")?;
    world.directory.forbid(unknown.clone());

    let outcome = world
        .react(ReactionRecord::new("👍", unknown, 1000, 1500, bob.1, bob.1))
        .await;
    ensure!(
        outcome == ReactionOutcome::Dropped(DropReason::UnknownAuthor),
        "expected drop, got {outcome:?}"
    );
    ensure!(world.pending() == 0, "dropped reaction still buffered");
    ensure!(world.messages.is_empty(), "store was modified");

    info!("Unresolvable reaction dropped");
    Ok(())
}

/// Reaction to someone's story, received in our direct conversation
async fn story_reaction(world: World) -> Result<()> {
    let alice = world.contact("+15550000001")?;
    let bob = world.contact("+15550000002")?;

    let story = Message::new_incoming(
        world.engine.context().generate_id(),
        alice.1,
        alice.1,
        alice.0.clone(),
        1000,
    )
    .into_story();
    world.messages.insert(story.clone());

    let outcome = world
        .react(ReactionRecord::new("🔥", alice.0.clone(), 1000, 1500, bob.1, bob.1))
        .await;
    let ReactionOutcome::Handled {
        apply: ApplyOutcome::StoryReply(reply_id),
        ..
    } = outcome
    else {
        anyhow::bail!("expected story reply, got {outcome:?}");
    };

    let linked = world
        .directory
        .conversation(bob.1)
        .is_some_and(|c| c.message_ids.contains(&reply_id));
    ensure!(linked, "story reply not linked into sender conversation");
    ensure!(
        world.messages.find_by_id(story.id).as_ref() == Some(&story),
        "story was edited"
    );

    info!(reply_id = %reply_id, "Story reaction stored as reply");
    Ok(())
}

/// Reaction to one of our own sent messages
async fn outgoing_match(world: World) -> Result<()> {
    let bob = world.contact("+15550000002")?;
    let me = world.directory.self_id();
    let group = world.directory.create_group();

    let sent = Message::new_outgoing(world.engine.context().generate_id(), group, me, 3000);
    world.messages.insert(sent.clone());

    // Target author as seen from another of our devices
    let author = IdentityRef::parse("linked-device")?;
    world.directory.forbid(author.clone());

    let outcome = world
        .react(ReactionRecord::new("👏", author, 3000, 3500, bob.1, bob.1))
        .await;
    ensure!(
        matches!(outcome, ReactionOutcome::Outgoing { conversation_id, ref claimed } if conversation_id == group && claimed.len() == 1),
        "expected outgoing match, got {outcome:?}"
    );
    ensure!(
        world
            .messages
            .find_by_id(sent.id)
            .is_some_and(|m| m.reaction_from(bob.1).is_some()),
        "reaction missing on sent message"
    );

    info!(message_id = %sent.id, "Outgoing reaction applied without identity lookup");
    Ok(())
}
