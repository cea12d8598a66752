//! Integration tests for the Compute Engine provider against a mock metadata server and
//! inventory API.

use crate::mock_infrastructure::{gce_instance, GceMockBuilder};
use bootstrap_core::{
    discovery::{
        gce::MAX_INVENTORY_PAGES, DiscoveryError, GceDiscovery, GceSettings, InstanceIdentity,
        PeerDiscovery,
    },
    types::Candidate,
};
use std::time::Duration;
use tracing_test::traced_test;

fn settings(url: &str) -> GceSettings {
    GceSettings {
        metadata_url: url.to_string(),
        compute_url: url.to_string(),
        label_key: "etcd-cluster".to_string(),
        label_value: "main".to_string(),
        running_only: true,
        request_timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn test_identity_comes_from_metadata_server() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("1234567890", "10.132.0.3").await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();

    assert_eq!(discovery.instance_id().await.unwrap(), "1234567890");
    assert_eq!(discovery.instance_ip().await.unwrap(), "10.132.0.3");
}

#[tokio::test]
async fn test_metadata_error_is_discovery_failure() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_metadata_status("instance/id", 404).await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();
    let err = discovery.instance_id().await.unwrap_err();

    assert!(matches!(err, DiscoveryError::MetadataUnavailable(ref m) if m.contains("404")));
}

#[tokio::test]
async fn test_inventory_follows_pages_in_order() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("101", "10.132.0.1").await;

    let first = gce
        .mock_instances_page(
            None,
            vec![
                gce_instance("101", "etcd-a", "RUNNING", Some("10.132.0.1")),
                gce_instance("102", "etcd-b", "RUNNING", Some("10.132.0.2")),
            ],
            Some("page-2"),
        )
        .await;
    let second = gce
        .mock_instances_page(
            Some("page-2"),
            vec![gce_instance("103", "etcd-c", "RUNNING", Some("10.132.0.3"))],
            None,
        )
        .await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();
    let candidates = discovery.peer_names_and_ips().await.unwrap();

    assert_eq!(
        candidates,
        vec![
            Candidate::new("101", "10.132.0.1"),
            Candidate::new("102", "10.132.0.2"),
            Candidate::new("103", "10.132.0.3"),
        ]
    );
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
#[traced_test]
async fn test_endless_inventory_stops_at_page_limit_with_warning() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("101", "10.132.0.1").await;
    let pages = gce
        .mock_instances_endless(
            vec![gce_instance("101", "etcd-a", "RUNNING", Some("10.132.0.1"))],
            MAX_INVENTORY_PAGES,
        )
        .await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();
    let candidates = discovery.peer_names_and_ips().await.unwrap();

    assert_eq!(candidates.len(), MAX_INVENTORY_PAGES);
    pages.assert_async().await;
    assert!(logs_contain("candidate list is truncated"));
}

#[tokio::test]
#[traced_test]
async fn test_complete_inventory_does_not_warn() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("101", "10.132.0.1").await;
    let _page = gce
        .mock_instances_page(
            None,
            vec![gce_instance("101", "etcd-a", "RUNNING", Some("10.132.0.1"))],
            None,
        )
        .await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();
    discovery.peer_names_and_ips().await.unwrap();

    assert!(!logs_contain("candidate list is truncated"));
}

#[tokio::test]
async fn test_stopped_and_addressless_instances_are_skipped() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("101", "10.132.0.1").await;
    let _page = gce.mock_instances_page(
        None,
        vec![
            gce_instance("101", "etcd-a", "RUNNING", Some("10.132.0.1")),
            gce_instance("102", "etcd-b", "TERMINATED", Some("10.132.0.2")),
            gce_instance("103", "etcd-c", "RUNNING", None),
        ],
        None,
    )
    .await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();
    let candidates = discovery.peer_names_and_ips().await.unwrap();

    assert_eq!(candidates, vec![Candidate::new("101", "10.132.0.1")]);
}

#[tokio::test]
async fn test_running_only_disabled_keeps_stopped_instances() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("101", "10.132.0.1").await;
    let _page = gce.mock_instances_page(
        None,
        vec![
            gce_instance("101", "etcd-a", "RUNNING", Some("10.132.0.1")),
            gce_instance("102", "etcd-b", "STAGING", Some("10.132.0.2")),
        ],
        None,
    )
    .await;

    let discovery =
        GceDiscovery::new(GceSettings { running_only: false, ..settings(&gce.url()) }).unwrap();
    let candidates = discovery.peer_names_and_ips().await.unwrap();

    assert_eq!(candidates.len(), 2);
}

#[tokio::test]
async fn test_empty_inventory_is_an_error() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("101", "10.132.0.1").await;
    let _page = gce.mock_instances_page(None, Vec::new(), None).await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();
    let err = discovery.peer_names_and_ips().await.unwrap_err();

    assert!(matches!(err, DiscoveryError::NoMatchingInstances(ref m) if m.contains("etcd-cluster=main")));
}

#[tokio::test]
async fn test_inventory_permission_error_is_reported() {
    let mut gce = GceMockBuilder::new().await;
    gce.mock_instance("101", "10.132.0.1").await;
    gce.mock_instances_status(403).await;

    let discovery = GceDiscovery::new(settings(&gce.url())).unwrap();
    let err = discovery.peer_names_and_ips().await.unwrap_err();

    assert!(matches!(err, DiscoveryError::InventoryUnavailable(ref m) if m.contains("403")));
}

#[test]
fn test_missing_label_value_is_rejected() {
    let err = GceDiscovery::new(GceSettings {
        label_value: String::new(),
        ..settings("http://127.0.0.1:1")
    })
    .unwrap_err();

    assert!(matches!(err, DiscoveryError::InvalidSettings(_)));
}
