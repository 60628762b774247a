//! Integration tests for invitations, acceptance, and read-through sharing.

mod common;

use coffer_client::prelude::*;

#[test]
fn test_share_and_append_read_through() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");

    alice.store_file("a", b"hello").unwrap();
    let token = alice.create_invitation("a", "bob").unwrap();
    bob.accept_invitation("alice", token, "b").unwrap();

    bob.append_to_file("b", b" world").unwrap();

    assert_eq!(alice.load_file("a").unwrap(), b"hello world");
    assert_eq!(bob.load_file("b").unwrap(), b"hello world");
}

#[test]
fn test_accepted_file_matches_owner_view() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");

    alice.store_file("report", b"quarterly numbers").unwrap();
    let token = alice.create_invitation("report", "bob").unwrap();
    bob.accept_invitation("alice", token, "from-alice").unwrap();

    assert_eq!(
        bob.load_file("from-alice").unwrap(),
        alice.load_file("report").unwrap()
    );
}

#[test]
fn test_transitive_sharing_read_through() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");
    let charles = common::register(&client, "charles");

    alice.store_file("f", b"base").unwrap();

    let to_bob = alice.create_invitation("f", "bob").unwrap();
    bob.accept_invitation("alice", to_bob, "g").unwrap();

    let to_charles = bob.create_invitation("g", "charles").unwrap();
    charles.accept_invitation("bob", to_charles, "h").unwrap();

    // Any participant's append is visible to all three.
    alice.append_to_file("f", b"+a").unwrap();
    bob.append_to_file("g", b"+b").unwrap();
    charles.append_to_file("h", b"+c").unwrap();

    let expected = b"base+a+b+c".to_vec();
    assert_eq!(alice.load_file("f").unwrap(), expected);
    assert_eq!(bob.load_file("g").unwrap(), expected);
    assert_eq!(charles.load_file("h").unwrap(), expected);
}

#[test]
fn test_sharee_overwrite_preserves_sharing() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");

    alice.store_file("a", b"original").unwrap();
    let token = alice.create_invitation("a", "bob").unwrap();
    bob.accept_invitation("alice", token, "b").unwrap();

    // An overwrite through the sharee's indirection must not detach the
    // owner (or any other sharee) from the file.
    bob.store_file("b", b"rewritten by bob").unwrap();

    assert_eq!(alice.load_file("a").unwrap(), b"rewritten by bob");

    alice.append_to_file("a", b", seen by all").unwrap();
    assert_eq!(bob.load_file("b").unwrap(), b"rewritten by bob, seen by all");
}

#[test]
fn test_sharee_names_file_independently() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");

    // Bob already has his own "a"; accepting under a different name works
    // and the two files stay distinct.
    alice.store_file("a", b"alice's file").unwrap();
    bob.store_file("a", b"bob's own file").unwrap();

    let token = alice.create_invitation("a", "bob").unwrap();
    bob.accept_invitation("alice", token, "shared-a").unwrap();

    assert_eq!(bob.load_file("a").unwrap(), b"bob's own file");
    assert_eq!(bob.load_file("shared-a").unwrap(), b"alice's file");
}

#[test]
fn test_accept_over_existing_filename_is_conflict() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");

    alice.store_file("a", b"data").unwrap();
    bob.store_file("b", b"bob's data").unwrap();

    let token = alice.create_invitation("a", "bob").unwrap();
    let result = bob.accept_invitation("alice", token, "b");

    assert!(matches!(result, Err(ClientError::Conflict(_))));
    assert_eq!(bob.load_file("b").unwrap(), b"bob's data");
}

#[test]
fn test_accept_missing_token_is_not_found() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");

    alice.store_file("a", b"data").unwrap();

    let result = bob.accept_invitation("alice", uuid::Uuid::new_v4(), "b");
    assert!(matches!(result, Err(ClientError::NotFound(_))));
}

#[test]
fn test_accept_with_wrong_sender_fails() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");
    let _mallory = common::register(&client, "mallory");

    alice.store_file("a", b"data").unwrap();
    let token = alice.create_invitation("a", "bob").unwrap();

    // The signature was made by alice, so naming mallory as the sender
    // must not verify.
    let result = bob.accept_invitation("mallory", token, "b");
    assert!(matches!(result, Err(ClientError::Integrity(_))));
}

#[test]
fn test_token_is_bound_to_its_recipient() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let _bob = common::register(&client, "bob");
    let charles = common::register(&client, "charles");

    alice.store_file("a", b"data").unwrap();
    let token_for_bob = alice.create_invitation("a", "bob").unwrap();

    // Charles intercepts bob's token; his key cannot unwrap it.
    let result = charles.accept_invitation("alice", token_for_bob, "stolen");
    assert!(matches!(result, Err(ClientError::Integrity(_))));
}

#[test]
fn test_owner_can_share_with_several_users() {
    let (client, _, _) = common::setup();
    let alice = common::register(&client, "alice");
    let bob = common::register(&client, "bob");
    let dora = common::register(&client, "dora");

    alice.store_file("f", b"v1").unwrap();

    let to_bob = alice.create_invitation("f", "bob").unwrap();
    let to_dora = alice.create_invitation("f", "dora").unwrap();
    bob.accept_invitation("alice", to_bob, "f-bob").unwrap();
    dora.accept_invitation("alice", to_dora, "f-dora").unwrap();

    dora.append_to_file("f-dora", b"+dora").unwrap();

    assert_eq!(bob.load_file("f-bob").unwrap(), b"v1+dora");
    assert_eq!(alice.load_file("f").unwrap(), b"v1+dora");
}
