//! Infrastructure-side discovery of this instance and of the intended cluster members.
//!
//! Two capabilities, implemented once per provider and selected by configuration:
//!
//! - [`InstanceIdentity`]: who and where this instance is
//! - [`PeerDiscovery`]: which instances should form the cluster right now
//!
//! Providers are expected to return candidates in a stable order; the reconciler does
//! not sort.

pub mod gce;
pub mod static_list;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    config::{AppConfig, ProviderKind},
    types::Candidate,
};

pub use gce::{GceDiscovery, GceSettings};
pub use static_list::StaticDiscovery;

/// Identity or inventory could not be determined from the infrastructure.
///
/// Always fatal to the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The instance metadata source could not be reached or returned an error.
    #[error("instance metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// The provider inventory API could not be queried.
    #[error("inventory unavailable: {0}")]
    InventoryUnavailable(String),

    /// The inventory query succeeded but matched nothing.
    #[error("no matching instances: {0}")]
    NoMatchingInstances(String),

    /// Provider settings are missing or malformed.
    #[error("invalid provider settings: {0}")]
    InvalidSettings(String),

    /// A provider response could not be decoded.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Resolves this instance's immutable identifier and private address.
#[async_trait]
pub trait InstanceIdentity: Send + Sync {
    async fn instance_id(&self) -> Result<String, DiscoveryError>;

    async fn instance_ip(&self) -> Result<String, DiscoveryError>;
}

/// Lists the `(identity, address)` pairs that should belong to the cluster.
#[async_trait]
pub trait PeerDiscovery: Send + Sync {
    async fn peer_names_and_ips(&self) -> Result<Vec<Candidate>, DiscoveryError>;
}

/// A provider offering both capabilities.
pub trait DiscoveryProvider: InstanceIdentity + PeerDiscovery {}

impl<T: InstanceIdentity + PeerDiscovery> DiscoveryProvider for T {}

/// Builds the provider selected by `config.provider`.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidSettings`] if the selected provider's settings are
/// incomplete, or if its HTTP client cannot be built.
pub fn provider_from_config(config: &AppConfig) -> Result<Arc<dyn DiscoveryProvider>, DiscoveryError> {
    match config.provider {
        ProviderKind::Static => {
            let settings = &config.static_provider;
            let provider = StaticDiscovery::from_settings(
                &settings.instance_id,
                &settings.instance_ip,
                &settings.peers,
            )?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Gce => {
            let provider = GceDiscovery::new(GceSettings::from(&config.gce))?;
            Ok(Arc::new(provider))
        }
    }
}
