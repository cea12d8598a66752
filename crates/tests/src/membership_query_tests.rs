//! Integration tests for probing candidates for a live cluster.

use crate::mock_infrastructure::{fast_client, member, EtcdMockBuilder};
use bootstrap_core::membership::{MembershipError, MembershipQuery};
use tracing_test::traced_test;

#[tokio::test]
async fn test_first_reachable_candidate_becomes_coordinator() {
    let mut first = EtcdMockBuilder::new().await;
    let mut second = EtcdMockBuilder::new().await;
    first.mock_members(&[member("a1", "i-1", "http://10.0.0.1:2380")]).await;
    second.mock_members(&[member("b1", "other", "http://10.9.9.9:2380")]).await;

    let query = MembershipQuery::new(fast_client());
    let view = query
        .find_cluster(&[first.url(), second.url()])
        .await
        .expect("cluster should be found");

    assert_eq!(view.coordinator, first.url());
    assert_eq!(view.members.len(), 1);
    assert_eq!(view.members[0].name, "i-1");
}

#[tokio::test]
#[traced_test]
async fn test_unreachable_and_failing_candidates_are_skipped() {
    let mut failing = EtcdMockBuilder::new().await;
    failing.mock_members_status(503).await;

    let mut healthy = EtcdMockBuilder::new().await;
    healthy
        .mock_members(&[
            member("a1", "i-1", "http://10.0.0.1:2380"),
            member("a2", "i-2", "http://10.0.0.2:2380"),
        ])
        .await;

    let query = MembershipQuery::new(fast_client());
    let view = query
        .find_cluster(&["http://127.0.0.1:1".to_string(), failing.url(), healthy.url()])
        .await
        .expect("cluster should be found");

    assert_eq!(view.coordinator, healthy.url());
    assert_eq!(view.members.len(), 2);
    assert!(logs_contain("candidate not reachable"));
    assert!(logs_contain("candidate answered but could not list members"));
    assert!(logs_contain("status=Some(503)"));
}

#[tokio::test]
async fn test_no_live_cluster_returns_none() {
    let mut failing = EtcdMockBuilder::new().await;
    failing.mock_members_status(500).await;

    let query = MembershipQuery::new(fast_client());

    assert!(query.find_cluster(&[]).await.is_none());
    assert!(query
        .find_cluster(&["http://127.0.0.1:1".to_string(), failing.url()])
        .await
        .is_none());
}

#[tokio::test]
async fn test_empty_member_list_is_still_a_live_cluster() {
    let mut etcd = EtcdMockBuilder::new().await;
    etcd.mock_members(&[]).await;

    let query = MembershipQuery::new(fast_client());
    let view = query.find_cluster(&[etcd.url()]).await.expect("cluster should be found");

    assert!(view.members.is_empty());
}

#[tokio::test]
async fn test_refresh_surfaces_http_errors() {
    let mut etcd = EtcdMockBuilder::new().await;
    etcd.mock_members_status(500).await;

    let query = MembershipQuery::new(fast_client());
    let err = query.refresh(&etcd.url()).await.unwrap_err();

    assert!(matches!(err, MembershipError::HttpError(500, _)));
    assert_eq!(err.status(), Some(500));
    assert!(!err.is_unreachable());
}
