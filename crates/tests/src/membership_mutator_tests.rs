//! Integration tests for member removal and addition against a mock coordinator.

use crate::mock_infrastructure::{fast_client, member, EtcdMockBuilder};
use bootstrap_core::membership::{MembershipMutator, MutationOutcome};
use tracing_test::traced_test;

const SELF_PEER_URL: &str = "http://10.0.0.3:2380";

#[tokio::test]
#[traced_test]
async fn test_evict_removes_member_by_id() {
    let mut etcd = EtcdMockBuilder::new().await;
    let delete = etcd.mock_remove("a1", 204).await;

    let mutator = MembershipMutator::new(fast_client());
    let outcome = mutator.evict(&etcd.url(), &member("a1", "i-1", "http://10.0.0.1:2380")).await;

    assert_eq!(outcome, MutationOutcome::Applied);
    delete.assert_async().await;
    assert!(logs_contain("evicted stale member"));
}

#[tokio::test]
#[traced_test]
async fn test_evict_of_already_removed_member_is_success() {
    let mut etcd = EtcdMockBuilder::new().await;
    let delete = etcd.mock_remove("a1", 410).await;

    let mutator = MembershipMutator::new(fast_client());
    let outcome = mutator.evict(&etcd.url(), &member("a1", "i-1", "http://10.0.0.1:2380")).await;

    assert_eq!(outcome, MutationOutcome::AlreadyApplied);
    assert!(outcome.is_success());
    delete.assert_async().await;
    assert!(!logs_contain("failed to evict"));
}

#[tokio::test]
#[traced_test]
async fn test_evict_failure_is_reported_not_fatal() {
    let mut etcd = EtcdMockBuilder::new().await;
    let delete = etcd.mock_remove("a1", 500).await;

    let mutator = MembershipMutator::new(fast_client());
    let outcome = mutator.evict(&etcd.url(), &member("a1", "i-1", "http://10.0.0.1:2380")).await;

    assert!(matches!(outcome, MutationOutcome::Failed(ref reason) if reason.contains("500")));
    delete.assert_async().await;
    assert!(logs_contain("failed to evict stale member"));
}

#[tokio::test]
async fn test_evict_against_unreachable_coordinator_fails() {
    let mutator = MembershipMutator::new(fast_client());
    let outcome = mutator
        .evict("http://127.0.0.1:1", &member("a1", "i-1", "http://10.0.0.1:2380"))
        .await;

    assert!(!outcome.is_success());
}

#[tokio::test]
#[traced_test]
async fn test_add_self_posts_name_and_peer_url() {
    let mut etcd = EtcdMockBuilder::new().await;
    let post = etcd.mock_add("i-3", SELF_PEER_URL, 201).await;

    let mutator = MembershipMutator::new(fast_client());
    let outcome = mutator.add_self(&etcd.url(), "i-3", SELF_PEER_URL).await;

    assert_eq!(outcome, MutationOutcome::Applied);
    post.assert_async().await;
    assert!(logs_contain("added self to cluster"));
}

#[tokio::test]
#[traced_test]
async fn test_add_self_conflict_is_success() {
    let mut etcd = EtcdMockBuilder::new().await;
    let post = etcd.mock_add("i-3", SELF_PEER_URL, 409).await;

    let mutator = MembershipMutator::new(fast_client());
    let outcome = mutator.add_self(&etcd.url(), "i-3", SELF_PEER_URL).await;

    assert_eq!(outcome, MutationOutcome::AlreadyApplied);
    post.assert_async().await;
    assert!(!logs_contain("failed to add self"));
}

#[tokio::test]
#[traced_test]
async fn test_add_self_server_error_is_warned() {
    let mut etcd = EtcdMockBuilder::new().await;
    let post = etcd.mock_add("i-3", SELF_PEER_URL, 500).await;

    let mutator = MembershipMutator::new(fast_client());
    let outcome = mutator.add_self(&etcd.url(), "i-3", SELF_PEER_URL).await;

    assert!(!outcome.is_success());
    post.assert_async().await;
    assert!(logs_contain("failed to add self to cluster"));
}
