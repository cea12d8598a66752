use async_trait::async_trait;

use super::{DiscoveryError, InstanceIdentity, PeerDiscovery};
use crate::types::{Candidate, LocalInstance};

/// Discovery from fixed configuration, for hosts whose inventory is managed elsewhere.
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    local: LocalInstance,
    peers: Vec<Candidate>,
}

impl StaticDiscovery {
    #[must_use]
    pub fn new(local: LocalInstance, peers: Vec<Candidate>) -> Self {
        Self { local, peers }
    }

    /// Builds the provider from raw settings, parsing `peers` as `name=ip[,name=ip...]`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidSettings`] if the identity is blank or a peer
    /// entry is malformed.
    pub fn from_settings(
        instance_id: &str,
        instance_ip: &str,
        peers: &str,
    ) -> Result<Self, DiscoveryError> {
        if instance_id.trim().is_empty() || instance_ip.trim().is_empty() {
            return Err(DiscoveryError::InvalidSettings(
                "static provider requires instance_id and instance_ip".to_string(),
            ));
        }

        Ok(Self::new(
            LocalInstance::new(instance_id.trim(), instance_ip.trim()),
            parse_peers(peers)?,
        ))
    }
}

/// Parses `name=ip` pairs separated by commas, keeping their order.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidSettings`] for entries without `=` or with an empty
/// side.
pub fn parse_peers(raw: &str) -> Result<Vec<Candidate>, DiscoveryError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, ip)) if !name.trim().is_empty() && !ip.trim().is_empty() => {
                Ok(Candidate::new(name.trim(), ip.trim()))
            }
            _ => Err(DiscoveryError::InvalidSettings(format!(
                "malformed peer entry '{entry}', expected name=ip"
            ))),
        })
        .collect()
}

#[async_trait]
impl InstanceIdentity for StaticDiscovery {
    async fn instance_id(&self) -> Result<String, DiscoveryError> {
        Ok(self.local.identity.clone())
    }

    async fn instance_ip(&self) -> Result<String, DiscoveryError> {
        Ok(self.local.address.clone())
    }
}

#[async_trait]
impl PeerDiscovery for StaticDiscovery {
    async fn peer_names_and_ips(&self) -> Result<Vec<Candidate>, DiscoveryError> {
        if self.peers.is_empty() {
            return Err(DiscoveryError::NoMatchingInstances("no peers configured".to_string()));
        }
        Ok(self.peers.clone())
    }
}
