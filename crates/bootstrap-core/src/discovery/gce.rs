//! Google Compute Engine provider.
//!
//! Identity comes from the instance metadata server; candidates come from the Compute
//! `instances.list` API in this instance's zone, filtered by a label. The metadata server
//! also supplies the OAuth token used for the inventory call.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{DiscoveryError, InstanceIdentity, PeerDiscovery};
use crate::{config::GceConfig, types::Candidate};

const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR: &str = "Google";

/// Guards against an inventory API that keeps handing out page tokens.
pub const MAX_INVENTORY_PAGES: usize = 64;

const STATUS_RUNNING: &str = "RUNNING";

/// Resolved settings for [`GceDiscovery`].
#[derive(Debug, Clone)]
pub struct GceSettings {
    pub metadata_url: String,
    pub compute_url: String,
    pub label_key: String,
    pub label_value: String,
    pub running_only: bool,
    pub request_timeout: Duration,
}

impl From<&GceConfig> for GceSettings {
    fn from(config: &GceConfig) -> Self {
        Self {
            metadata_url: config.metadata_url.trim_end_matches('/').to_string(),
            compute_url: config.compute_url.trim_end_matches('/').to_string(),
            label_key: config.label_key.clone(),
            label_value: config.label_value.clone(),
            running_only: config.running_only,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceList {
    #[serde(default)]
    items: Vec<Instance>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    network_interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkInterface {
    #[serde(rename = "networkIP")]
    network_ip: Option<String>,
}

/// Compute Engine implementation of both discovery capabilities.
#[derive(Debug, Clone)]
pub struct GceDiscovery {
    client: Client,
    settings: GceSettings,
}

impl GceDiscovery {
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidSettings`] if no label value is configured or the
    /// HTTP client cannot be built.
    pub fn new(settings: GceSettings) -> Result<Self, DiscoveryError> {
        if settings.label_key.is_empty() || settings.label_value.is_empty() {
            return Err(DiscoveryError::InvalidSettings(
                "gce provider requires label_key and label_value".to_string(),
            ));
        }

        let client = ClientBuilder::new()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.request_timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| DiscoveryError::InvalidSettings(format!("HTTP client build failed: {e}")))?;

        Ok(Self { client, settings })
    }

    async fn metadata(&self, path: &str) -> Result<String, DiscoveryError> {
        let url = format!("{}/computeMetadata/v1/{path}", self.settings.metadata_url);

        let response = self
            .client
            .get(&url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
            .send()
            .await
            .map_err(|e| DiscoveryError::MetadataUnavailable(format!("{path}: {e}")))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::MetadataUnavailable(format!(
                "{path}: HTTP {}",
                response.status().as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DiscoveryError::MetadataUnavailable(format!("{path}: {e}")))?;
        Ok(body.trim().to_string())
    }

    async fn access_token(&self) -> Result<String, DiscoveryError> {
        let raw = self.metadata("instance/service-accounts/default/token").await?;
        let token: AccessToken = serde_json::from_str(&raw)
            .map_err(|e| DiscoveryError::InvalidResponse(format!("access token: {e}")))?;
        Ok(token.access_token)
    }

    async fn list_page(
        &self,
        project: &str,
        zone: &str,
        token: &str,
        page_token: Option<&str>,
    ) -> Result<InstanceList, DiscoveryError> {
        let url = format!(
            "{}/compute/v1/projects/{project}/zones/{zone}/instances",
            self.settings.compute_url
        );
        let filter = format!("labels.{}={}", self.settings.label_key, self.settings.label_value);

        let mut request = self.client.get(&url).bearer_auth(token).query(&[("filter", filter)]);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DiscoveryError::InventoryUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::InventoryUnavailable(format!(
                "instances.list returned HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .json::<InstanceList>()
            .await
            .map_err(|e| DiscoveryError::InvalidResponse(format!("instances.list: {e}")))
    }

    fn candidate_from(&self, instance: Instance) -> Option<Candidate> {
        if self.settings.running_only && instance.status != STATUS_RUNNING {
            debug!(instance = %instance.name, status = %instance.status, "skipping instance");
            return None;
        }

        let address = instance.network_interfaces.into_iter().find_map(|nic| nic.network_ip);
        match address {
            Some(address) => Some(Candidate::new(instance.id, address)),
            None => {
                debug!(instance = %instance.name, "instance has no private address, skipping");
                None
            }
        }
    }
}

#[async_trait]
impl InstanceIdentity for GceDiscovery {
    async fn instance_id(&self) -> Result<String, DiscoveryError> {
        self.metadata("instance/id").await
    }

    async fn instance_ip(&self) -> Result<String, DiscoveryError> {
        self.metadata("instance/network-interfaces/0/ip").await
    }
}

#[async_trait]
impl PeerDiscovery for GceDiscovery {
    async fn peer_names_and_ips(&self) -> Result<Vec<Candidate>, DiscoveryError> {
        let project = self.metadata("project/project-id").await?;
        let zone_path = self.metadata("instance/zone").await?;
        let zone = zone_path.rsplit('/').next().unwrap_or(&zone_path).to_string();
        let token = self.access_token().await?;

        let mut candidates = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_INVENTORY_PAGES {
            let page = self.list_page(&project, &zone, &token, page_token.as_deref()).await?;
            candidates.extend(page.items.into_iter().filter_map(|i| self.candidate_from(i)));

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        if page_token.is_some() {
            warn!(
                project = %project,
                zone = %zone,
                pages = MAX_INVENTORY_PAGES,
                candidates_count = candidates.len(),
                "inventory still paging after page limit, candidate list is truncated"
            );
        }

        if candidates.is_empty() {
            return Err(DiscoveryError::NoMatchingInstances(format!(
                "no instances labelled {}={} in {project}/{zone}",
                self.settings.label_key, self.settings.label_value
            )));
        }

        info!(
            project = %project,
            zone = %zone,
            candidates_count = candidates.len(),
            "discovered gce instances"
        );
        Ok(candidates)
    }
}
