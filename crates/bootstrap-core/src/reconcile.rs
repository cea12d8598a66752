//! Join-versus-bootstrap decision.
//!
//! # Branch selection
//!
//! The only branch selector is "is this instance already a registered member":
//!
//! ```text
//! observed members non-empty ─┬─ self absent ──► join path (EXISTING)
//!                             └─ self present ─► bootstrap path (NEW)
//! observed members empty ─────────────────────► bootstrap path (NEW)
//! ```
//!
//! On the join path every observed member whose name is not a discovered candidate is
//! scheduled for eviction, and the peer list is built from the surviving members plus
//! this instance (unless proxying). On the bootstrap path the candidate set is used
//! verbatim, even when it does not name this instance.
//!
//! Unnamed members (added but never started) and members without a peer URL cannot be
//! written as `ETCD_INITIAL_CLUSTER` entries and are left out of join peer lists.
//!
//! Ordering is insertion order from discovery and from the members API; nothing is
//! sorted here.

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{
    Candidate, ClusterState, Endpoint, LocalInstance, ObservedMember, PeerEntry, ProxyMode,
    ReconciliationDecision,
};

/// The reconciler could not produce a usable peer list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The computed peer list is empty.
    #[error("computed peer list is empty (cluster state: {state})")]
    EmptyPeerList { state: ClusterState },
}

/// Pure decision function over discovery and cluster state.
#[derive(Debug, Clone)]
pub struct Reconciler {
    peer_endpoint: Endpoint,
    proxy: ProxyMode,
}

impl Reconciler {
    #[must_use]
    pub fn new(peer_endpoint: Endpoint, proxy: ProxyMode) -> Self {
        Self { peer_endpoint, proxy }
    }

    #[must_use]
    pub fn proxy(&self) -> ProxyMode {
        self.proxy
    }

    /// Peer URL advertised for this instance.
    #[must_use]
    pub fn local_peer_url(&self, local: &LocalInstance) -> String {
        self.peer_endpoint.url_for(&local.address)
    }

    /// Computes the decision for one bootstrap run.
    ///
    /// On the join path the peer list assumes every eviction succeeds; callers that
    /// mutate the cluster rebuild it from the live list with [`Self::rebase`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyPeerList`] if the resulting peer list is empty.
    pub fn reconcile(
        &self,
        local: &LocalInstance,
        candidates: &[Candidate],
        observed: &[ObservedMember],
    ) -> Result<ReconciliationDecision, ConfigurationError> {
        let self_registered = observed.iter().any(|m| m.name == local.identity);

        if !observed.is_empty() && !self_registered {
            let candidate_names: HashSet<&str> =
                candidates.iter().map(|c| c.name.as_str()).collect();

            let members_to_evict: Vec<ObservedMember> = observed
                .iter()
                .filter(|m| !candidate_names.contains(m.name.as_str()))
                .cloned()
                .collect();

            let evicted_ids: HashSet<&str> =
                members_to_evict.iter().map(|m| m.id.as_str()).collect();
            let surviving: Vec<ObservedMember> = observed
                .iter()
                .filter(|m| !evicted_ids.contains(m.id.as_str()))
                .cloned()
                .collect();

            let final_peer_list = self.join_peer_list(local, &surviving);
            Self::ensure_non_empty(&final_peer_list, ClusterState::Existing)?;

            return Ok(ReconciliationDecision {
                cluster_state: ClusterState::Existing,
                proxy: self.proxy,
                final_peer_list,
                members_to_evict,
            });
        }

        let final_peer_list: Vec<PeerEntry> = candidates
            .iter()
            .map(|c| PeerEntry::new(c.name.clone(), self.peer_endpoint.url_for(&c.address)))
            .collect();
        Self::ensure_non_empty(&final_peer_list, ClusterState::New)?;

        if !self.proxy.is_on() && !final_peer_list.iter().any(|p| p.name == local.identity) {
            warn!(
                instance = %local.identity,
                peers_count = final_peer_list.len(),
                "instance is not among the discovered candidates, writing candidate list as-is"
            );
        }

        Ok(ReconciliationDecision {
            cluster_state: ClusterState::New,
            proxy: self.proxy,
            final_peer_list,
            members_to_evict: Vec::new(),
        })
    }

    /// Rebuilds a join decision's peer list from the member list re-read after eviction.
    ///
    /// Bootstrap decisions are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyPeerList`] if the live list yields no peers.
    pub fn rebase(
        &self,
        decision: ReconciliationDecision,
        local: &LocalInstance,
        live: &[ObservedMember],
    ) -> Result<ReconciliationDecision, ConfigurationError> {
        if !decision.is_join() {
            return Ok(decision);
        }

        let final_peer_list = self.join_peer_list(local, live);
        Self::ensure_non_empty(&final_peer_list, ClusterState::Existing)?;

        Ok(ReconciliationDecision { final_peer_list, ..decision })
    }

    fn join_peer_list(&self, local: &LocalInstance, members: &[ObservedMember]) -> Vec<PeerEntry> {
        let mut peers: Vec<PeerEntry> = members
            .iter()
            .filter(|m| m.name != local.identity)
            .filter_map(|m| {
                if m.name.is_empty() {
                    debug!(member_id = %m.id, "member has not started yet, skipped");
                    return None;
                }
                match m.primary_peer_url() {
                    Some(url) => Some(PeerEntry::new(m.name.clone(), url)),
                    None => {
                        debug!(member_id = %m.id, member = %m.name, "member has no peer url, skipped");
                        None
                    }
                }
            })
            .collect();

        if !self.proxy.is_on() {
            peers.push(PeerEntry::new(local.identity.clone(), self.local_peer_url(local)));
        }

        peers
    }

    fn ensure_non_empty(peers: &[PeerEntry], state: ClusterState) -> Result<(), ConfigurationError> {
        if peers.is_empty() {
            return Err(ConfigurationError::EmptyPeerList { state });
        }
        Ok(())
    }
}
