use tracing::{info, warn};

use super::{
    MembersClient, STATUS_MEMBER_ADDED, STATUS_MEMBER_ALREADY_PRESENT, STATUS_MEMBER_GONE,
    STATUS_MEMBER_REMOVED,
};
use crate::types::ObservedMember;

/// Result of a single add or remove request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The cluster applied the change.
    Applied,
    /// The cluster was already in the requested state (409 on add, 410 on remove).
    AlreadyApplied,
    /// Unexpected status or transport failure. Logged, never fatal.
    Failed(String),
}

impl MutationOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    fn from_status(status: u16, applied: u16, already: u16) -> Self {
        if status == applied || (200..300).contains(&status) {
            Self::Applied
        } else if status == already {
            Self::AlreadyApplied
        } else {
            Self::Failed(format!("unexpected status {status}"))
        }
    }
}

/// Issues membership changes against a coordinator with best-effort semantics.
///
/// Removal is idempotent (410 is success) and so is adding (409 is success). Any other
/// outcome is logged as a warning and returned; nothing here aborts a run.
#[derive(Debug, Clone)]
pub struct MembershipMutator {
    client: MembersClient,
}

impl MembershipMutator {
    #[must_use]
    pub fn new(client: MembersClient) -> Self {
        Self { client }
    }

    /// Removes a stale member from the cluster.
    pub async fn evict(&self, coordinator: &str, member: &ObservedMember) -> MutationOutcome {
        let outcome = match self.client.remove_member(coordinator, &member.id).await {
            Ok(status) => {
                MutationOutcome::from_status(status, STATUS_MEMBER_REMOVED, STATUS_MEMBER_GONE)
            }
            Err(e) => MutationOutcome::Failed(e.to_string()),
        };

        match &outcome {
            MutationOutcome::Applied => {
                info!(member_id = %member.id, member = %member.name, "evicted stale member");
            }
            MutationOutcome::AlreadyApplied => {
                info!(member_id = %member.id, member = %member.name, "stale member already removed");
            }
            MutationOutcome::Failed(reason) => {
                warn!(
                    member_id = %member.id,
                    member = %member.name,
                    coordinator = %coordinator,
                    reason = %reason,
                    "failed to evict stale member"
                );
            }
        }

        outcome
    }

    /// Registers this instance as a new voting member.
    pub async fn add_self(&self, coordinator: &str, identity: &str, peer_url: &str) -> MutationOutcome {
        let peer_urls = [peer_url.to_string()];
        let outcome = match self.client.add_member(coordinator, identity, &peer_urls).await {
            Ok(status) => MutationOutcome::from_status(
                status,
                STATUS_MEMBER_ADDED,
                STATUS_MEMBER_ALREADY_PRESENT,
            ),
            Err(e) => MutationOutcome::Failed(e.to_string()),
        };

        match &outcome {
            MutationOutcome::Applied => {
                info!(member = %identity, peer_url = %peer_url, "added self to cluster");
            }
            MutationOutcome::AlreadyApplied => {
                info!(member = %identity, peer_url = %peer_url, "self already registered");
            }
            MutationOutcome::Failed(reason) => {
                warn!(
                    member = %identity,
                    peer_url = %peer_url,
                    coordinator = %coordinator,
                    reason = %reason,
                    "failed to add self to cluster"
                );
            }
        }

        outcome
    }
}
