use tracing::{debug, info};

use super::MembersClient;
use crate::types::ObservedMember;

/// A live cluster found by probing candidate client URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterView {
    /// Member list as reported by the coordinator
    pub members: Vec<ObservedMember>,
    /// Client URL that answered the probe; used for all subsequent mutations
    pub coordinator: String,
}

/// Read-only search for an existing cluster.
///
/// Candidates are probed one at a time in the order given and the search stops at the
/// first successful listing. Probe failures are never surfaced.
#[derive(Debug, Clone)]
pub struct MembershipQuery {
    client: MembersClient,
}

impl MembershipQuery {
    #[must_use]
    pub fn new(client: MembersClient) -> Self {
        Self { client }
    }

    /// Probes `client_urls` in order and returns the first reachable cluster.
    ///
    /// `None` means no live cluster was found, which is the precondition for forming a
    /// new one.
    pub async fn find_cluster(&self, client_urls: &[String]) -> Option<ClusterView> {
        for url in client_urls {
            match self.client.list_members(url).await {
                Ok(members) => {
                    info!(
                        coordinator = %url,
                        members_count = members.len(),
                        "found live cluster"
                    );
                    return Some(ClusterView { members, coordinator: url.clone() });
                }
                Err(e) if e.is_unreachable() => {
                    debug!(candidate = %url, error = %e, "candidate not reachable");
                }
                Err(e) => {
                    debug!(
                        candidate = %url,
                        status = ?e.status(),
                        error = %e,
                        "candidate answered but could not list members"
                    );
                }
            }
        }

        info!(candidates_count = client_urls.len(), "no live cluster reachable");
        None
    }

    /// Re-reads the member list from a known coordinator.
    ///
    /// # Errors
    ///
    /// Propagates the client error; the caller decides whether to fall back.
    pub async fn refresh(&self, coordinator: &str) -> Result<Vec<ObservedMember>, super::MembershipError> {
        self.client.list_members(coordinator).await
    }
}
