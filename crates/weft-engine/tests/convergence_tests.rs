//! Cross-replica convergence tests for the in-memory engine.
//!
//! Replicas never share state; they exchange Change records only. Every
//! scenario checks that heads and materialized values end up identical no
//! matter the delivery order.

use serde_json::json;
use weft_engine::{DocumentEngine, MemoryEngine};
use weft_protocol::{ActorId, ChangeRequest, Clock};

fn edit(engine: &mut MemoryEngine, actor: &str, key: &str, value: serde_json::Value) {
    engine
        .apply_local_change(ChangeRequest::new(actor).set(key, value))
        .expect("local change");
}

#[test]
fn test_replicas_converge_regardless_of_exchange_order() {
    let mut alice = MemoryEngine::new();
    let mut bob = MemoryEngine::new();

    edit(&mut alice, "alice", "title", json!("draft"));
    edit(&mut alice, "alice", "title", json!("final"));
    edit(&mut alice, "alice", "author", json!("alice"));
    edit(&mut bob, "bob", "title", json!("bob's title"));
    edit(&mut bob, "bob", "reviewed", json!(true));

    let from_alice = alice.get_changes(&Clock::new());
    let from_bob = bob.get_changes(&Clock::new());

    // Alice receives bob's log oldest-first, bob receives alice's
    // newest-first.
    alice.apply_changes(from_bob).expect("alice merges");
    let mut reversed = from_alice;
    reversed.reverse();
    bob.apply_changes(reversed).expect("bob merges");

    assert_eq!(alice.get_heads(), bob.get_heads());
    assert_eq!(alice.get_patch(), bob.get_patch());
    assert_eq!(alice.value(), bob.value());
}

#[test]
fn test_incremental_sync_sends_exactly_the_gap() {
    let mut alice = MemoryEngine::new();
    let mut bob = MemoryEngine::new();

    edit(&mut alice, "alice", "a", json!(1));
    bob.apply_changes(alice.get_changes(&bob.get_clock()))
        .expect("first round");
    assert_eq!(alice.get_heads(), bob.get_heads());

    edit(&mut alice, "alice", "b", json!(2));
    edit(&mut alice, "alice", "c", json!(3));

    // Only the two new changes cross the wire.
    let delta = alice.get_changes(&bob.get_clock());
    assert_eq!(delta.len(), 2);
    bob.apply_changes(delta).expect("second round");

    assert_eq!(alice.get_heads(), bob.get_heads());
    assert_eq!(alice.value(), bob.value());
}

#[test]
fn test_three_replicas_gossip_through_a_relay() {
    let mut alice = MemoryEngine::new();
    let mut bob = MemoryEngine::new();
    let mut carol = MemoryEngine::new();

    edit(&mut alice, "alice", "x", json!("from alice"));
    edit(&mut carol, "carol", "y", json!("from carol"));

    // Bob relays between the two without editing anything himself.
    bob.apply_changes(alice.get_changes(&Clock::new()))
        .expect("bob <- alice");
    bob.apply_changes(carol.get_changes(&Clock::new()))
        .expect("bob <- carol");
    alice
        .apply_changes(bob.get_changes(&alice.get_clock()))
        .expect("alice <- bob");
    carol
        .apply_changes(bob.get_changes(&carol.get_clock()))
        .expect("carol <- bob");

    assert_eq!(alice.get_heads(), bob.get_heads());
    assert_eq!(bob.get_heads(), carol.get_heads());
    assert_eq!(alice.value(), carol.value());
}

#[test]
fn test_partial_delivery_reports_missing_then_converges() {
    let mut alice = MemoryEngine::new();
    edit(&mut alice, "alice", "a", json!(1));
    edit(&mut alice, "alice", "b", json!(2));
    edit(&mut alice, "alice", "c", json!(3));
    let log = alice.get_changes(&Clock::new());

    // Deliver only the newest change first.
    let mut bob = MemoryEngine::new();
    bob.apply_changes(vec![log[2].clone()]).expect("newest only");
    assert!(bob.get_heads().is_empty());
    assert_eq!(bob.get_missing_deps(), vec![log[1].hash]);

    // Then the rest, out of order.
    bob.apply_changes(vec![log[0].clone(), log[1].clone()])
        .expect("the rest");
    assert!(bob.get_missing_deps().is_empty());
    assert_eq!(bob.get_heads(), alice.get_heads());
    assert_eq!(bob.value(), alice.value());
}

#[test]
fn test_snapshot_migrates_a_replica() {
    let mut alice = MemoryEngine::new();
    edit(&mut alice, "alice", "title", json!("hello"));
    edit(&mut alice, "alice", "count", json!(10));

    // A new device starts from the snapshot and keeps editing.
    let bytes = alice.save().expect("save");
    let mut device = MemoryEngine::load(&bytes).expect("load");
    assert_eq!(device.get_heads(), alice.get_heads());
    edit(&mut device, "device", "count", json!(11));

    alice
        .apply_changes(device.get_changes(&alice.get_clock()))
        .expect("sync back");
    assert_eq!(alice.value().get("count"), Some(&json!(11)));
    assert_eq!(alice.value(), device.value());
}

#[test]
fn test_actor_history_survives_relay() {
    let mut alice = MemoryEngine::new();
    let mut bob = MemoryEngine::new();
    edit(&mut alice, "alice", "a", json!(1));
    edit(&mut alice, "alice", "a", json!(2));

    bob.apply_changes(alice.get_changes(&Clock::new()))
        .expect("relay");
    let history = bob.get_changes_for_actor(&ActorId::new("alice"));
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].seq, 1);
    assert_eq!(history[1].seq, 2);
    assert_eq!(
        history,
        alice.get_changes_for_actor(&ActorId::new("alice"))
    );
}
