//! Cross-module invariant tests for the file tree.
//!
//! After every completed mutation, folder sizes must equal their descendant
//! file byte sums and each user's quota counter must equal the byte sum of
//! their files.

mod common;

use common::TestEnv;
use loft::{LoftError, TreeService};

#[tokio::test]
async fn invariants_hold_across_mutation_sequence() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let service = TreeService::new(&env.db, &env.storage);

    // Build: root > docs > {report.pdf(300), archive > old.zip(500)}
    let docs = service.create_folder(&alice, "docs", None).await.unwrap();
    env.assert_invariants().await;

    let report = service
        .upload(&alice, "report.pdf", &[1u8; 300], Some(docs.id))
        .await
        .unwrap();
    env.assert_invariants().await;

    let archive = service
        .create_folder(&alice, "archive", Some(docs.id))
        .await
        .unwrap();
    let old = service
        .upload(&alice, "old.zip", &[2u8; 500], Some(archive.id))
        .await
        .unwrap();
    env.assert_invariants().await;

    // Move the report into the archive
    service
        .move_node(report.id, &alice, Some(archive.id))
        .await
        .unwrap();
    env.assert_invariants().await;

    // Copy the archive (deep) next to itself
    let copied = service.copy(archive.id, &alice).await.unwrap();
    assert_eq!(copied.size, 800);
    env.assert_invariants().await;

    // Move the original archive to root
    service.move_node(archive.id, &alice, None).await.unwrap();
    env.assert_invariants().await;

    // Delete pieces in stages
    service.delete(old.id, &alice).await.unwrap();
    env.assert_invariants().await;

    service.delete(copied.id, &alice).await.unwrap();
    env.assert_invariants().await;

    service.delete(docs.id, &alice).await.unwrap();
    service.delete(archive.id, &alice).await.unwrap();
    env.assert_invariants().await;
}

#[tokio::test]
async fn cascade_delete_counts_and_propagates_once() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let service = TreeService::new(&env.db, &env.storage);

    let parent = service.create_folder(&alice, "parent", None).await.unwrap();
    let victim = service
        .create_folder(&alice, "victim", Some(parent.id))
        .await
        .unwrap();
    service
        .upload(&alice, "file100.bin", &[0u8; 100], Some(victim.id))
        .await
        .unwrap();
    let sub = service
        .create_folder(&alice, "sub", Some(victim.id))
        .await
        .unwrap();
    service
        .upload(&alice, "file50.bin", &[0u8; 50], Some(sub.id))
        .await
        .unwrap();

    let result = service.delete(victim.id, &alice).await.unwrap();

    // victim + file100 + sub + file50
    assert_eq!(result.nodes_removed, 4);
    assert_eq!(result.bytes_removed, 150);
    env.assert_invariants().await;
}

#[tokio::test]
async fn move_rejects_cycles_and_strangers() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let service = TreeService::new(&env.db, &env.storage);

    let a = service.create_folder(&alice, "a", None).await.unwrap();
    let b = service.create_folder(&alice, "b", Some(a.id)).await.unwrap();

    // Into itself
    assert!(matches!(
        service.move_node(a.id, &alice, Some(a.id)).await,
        Err(LoftError::Validation(_))
    ));
    // Into its own subtree
    assert!(matches!(
        service.move_node(a.id, &alice, Some(b.id)).await,
        Err(LoftError::Validation(_))
    ));
    // By a non-owner
    assert!(matches!(
        service.move_node(a.id, &bob, None).await,
        Err(LoftError::Permission(_))
    ));

    env.assert_invariants().await;
}

#[tokio::test]
async fn ownership_is_enforced_on_every_mutation() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let service = TreeService::new(&env.db, &env.storage);

    let file = service
        .upload(&alice, "mine.txt", b"private", None)
        .await
        .unwrap();
    let folder = service.create_folder(&alice, "dir", None).await.unwrap();

    for result in [
        service.delete(file.id, &bob).await.err(),
        service.rename(file.id, &bob, "stolen.txt").await.err(),
        service.move_node(file.id, &bob, None).await.err(),
        service.copy(file.id, &bob).await.err(),
        service.delete(folder.id, &bob).await.err(),
        service.copy(folder.id, &bob).await.err(),
    ] {
        assert!(matches!(result, Some(LoftError::Permission(_))));
    }

    env.assert_invariants().await;
}

#[tokio::test]
async fn quota_tracks_two_users_independently() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let service = TreeService::new(&env.db, &env.storage);

    service
        .upload(&alice, "a.bin", &[0u8; 100], None)
        .await
        .unwrap();
    let bobs = service
        .upload(&bob, "b.bin", &[0u8; 40], None)
        .await
        .unwrap();
    env.assert_invariants().await;

    service.copy(bobs.id, &bob).await.unwrap();
    env.assert_invariants().await;

    service.delete(bobs.id, &bob).await.unwrap();
    env.assert_invariants().await;
}

#[tokio::test]
async fn failed_mutations_leave_no_trace() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let service = TreeService::new(&env.db, &env.storage).with_quota_limit(100);

    service
        .upload(&alice, "ok.bin", &[0u8; 90], None)
        .await
        .unwrap();

    // Over quota: rejected, nothing recorded
    assert!(service
        .upload(&alice, "big.bin", &[0u8; 50], None)
        .await
        .is_err());
    env.assert_invariants().await;

    let items = service.list(&alice, None).await.unwrap();
    assert_eq!(items.len(), 1);
}
