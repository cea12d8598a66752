//! Core type definitions shared by discovery, membership and reconciliation.
//!
//! # Type Categories
//!
//! ## Infrastructure view
//! - [`Candidate`]: one `(identity, address)` pair reported by a discovery provider
//! - [`LocalInstance`]: the instance this process runs on
//!
//! ## Cluster view
//! - [`ObservedMember`], [`MemberList`]: wire types of the etcd v2 members API
//!
//! ## Decision
//! - [`ReconciliationDecision`], [`PeerEntry`], [`ClusterState`], [`ProxyMode`]
//!
//! ## URL templates
//! - [`Endpoint`], [`UrlScheme`]: turn a bare address into a client or peer URL

use serde::{Deserialize, Serialize};
use std::fmt;

/// An instance reported by a discovery provider as belonging to the cluster.
///
/// `name` is the provider's immutable instance identifier and doubles as the etcd member
/// name. `address` is a bare host (no scheme, no port).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub address: String,
}

impl Candidate {
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self { name: name.into(), address: address.into() }
    }
}

/// The instance this bootstrap run executes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInstance {
    pub identity: String,
    pub address: String,
}

impl LocalInstance {
    #[must_use]
    pub fn new(identity: impl Into<String>, address: impl Into<String>) -> Self {
        Self { identity: identity.into(), address: address.into() }
    }
}

/// A member as reported by `GET /v2/members`.
///
/// Members that were added but never started report an empty `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedMember {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "peerURLs")]
    pub peer_urls: Vec<String>,
    #[serde(default, rename = "clientURLs")]
    pub client_urls: Vec<String>,
}

impl ObservedMember {
    /// First advertised peer URL, used when the member is carried into the peer list.
    #[must_use]
    pub fn primary_peer_url(&self) -> Option<&str> {
        self.peer_urls.first().map(String::as_str)
    }
}

/// Body of `GET /v2/members`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberList {
    #[serde(default)]
    pub members: Vec<ObservedMember>,
}

/// Value of `ETCD_INITIAL_CLUSTER_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    New,
    Existing,
}

impl ClusterState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Existing => "existing",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether this instance relays client traffic instead of becoming a voting member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    On,
    #[default]
    Off,
}

impl ProxyMode {
    #[must_use]
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `name=peerURL` element of `ETCD_INITIAL_CLUSTER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub name: String,
    pub peer_url: String,
}

impl PeerEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, peer_url: impl Into<String>) -> Self {
        Self { name: name.into(), peer_url: peer_url.into() }
    }
}

impl fmt::Display for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.peer_url)
    }
}

/// Outcome of one reconciliation pass.
///
/// Built once per run by [`Reconciler`](crate::reconcile::Reconciler); the join path
/// may rebuild `final_peer_list` once from the post-eviction member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationDecision {
    pub cluster_state: ClusterState,
    pub proxy: ProxyMode,
    pub final_peer_list: Vec<PeerEntry>,
    pub members_to_evict: Vec<ObservedMember>,
}

impl ReconciliationDecision {
    /// Renders `final_peer_list` as the comma-joined `ETCD_INITIAL_CLUSTER` value.
    #[must_use]
    pub fn initial_cluster(&self) -> String {
        self.final_peer_list.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    }

    #[must_use]
    pub fn is_join(&self) -> bool {
        self.cluster_state == ClusterState::Existing
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlScheme {
    #[default]
    Http,
    Https,
}

impl UrlScheme {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for UrlScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheme and port applied to bare addresses to form client or peer URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub scheme: UrlScheme,
    pub port: u16,
}

impl Endpoint {
    #[must_use]
    pub fn new(scheme: UrlScheme, port: u16) -> Self {
        Self { scheme, port }
    }

    /// Builds `{scheme}://{address}:{port}`, bracketing IPv6 literals.
    #[must_use]
    pub fn url_for(&self, address: &str) -> String {
        if address.contains(':') && !address.starts_with('[') {
            format!("{}://[{}]:{}", self.scheme, address, self.port)
        } else {
            format!("{}://{}:{}", self.scheme, address, self.port)
        }
    }
}
