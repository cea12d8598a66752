//! End-to-end bootstrap run.
//!
//! ```text
//! InstanceIdentity ─► PeerDiscovery ─► MembershipQuery ─► Reconciler
//!                                                             │
//!                           ConfigEmitter ◄─ MembershipMutator┘
//! ```
//!
//! Every step is awaited in sequence. Discovery, probing and reconciliation may be
//! retried a bounded number of times; mutations and the file write never are.

use std::{path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    discovery::{self, DiscoveryError, DiscoveryProvider},
    emitter::{ConfigEmitter, WriteError},
    membership::{
        ClusterView, MembersClient, MembershipError, MembershipMutator, MembershipQuery,
        MutationOutcome,
    },
    reconcile::{ConfigurationError, Reconciler},
    types::{Candidate, Endpoint, LocalInstance, ObservedMember, ReconciliationDecision},
};

/// Exit codes for fatal bootstrap failures, one range per stage.
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const GENERIC_ERROR: u8 = 1;
    pub const SETTINGS_ERROR: u8 = 10;
    pub const DISCOVERY_ERROR: u8 = 20;
    pub const RECONCILE_ERROR: u8 = 30;
    pub const WRITE_ERROR: u8 = 40;
}

/// A fatal failure, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl BootstrapError {
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Settings(_) => "settings",
            Self::Discovery(_) => "discovery",
            Self::Configuration(_) => "reconcile",
            Self::Write(_) => "write",
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Settings(_) => exit_codes::SETTINGS_ERROR,
            Self::Discovery(_) => exit_codes::DISCOVERY_ERROR,
            Self::Configuration(_) => exit_codes::RECONCILE_ERROR,
            Self::Write(_) => exit_codes::WRITE_ERROR,
        }
    }

    /// Discovery and reconciliation failures may clear up once the infrastructure settles.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Discovery(_) | Self::Configuration(_))
    }
}

impl From<MembershipError> for BootstrapError {
    fn from(error: MembershipError) -> Self {
        Self::Settings(error.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Mutate the cluster and write the peers file.
    #[default]
    Normal,
    /// Compute the decision only.
    DryRun,
}

/// Bounded retry of the read-only part of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 1, wait: Duration::from_secs(10) }
    }
}

/// What a run decided and did.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub local: LocalInstance,
    pub decision: ReconciliationDecision,
    pub evictions: Vec<(ObservedMember, MutationOutcome)>,
    pub self_added: Option<MutationOutcome>,
    /// Rendered peers file content
    pub rendered: String,
    /// `None` in dry-run mode
    pub written_to: Option<PathBuf>,
}

/// Result of the retryable read-only phase.
struct Plan {
    local: LocalInstance,
    cluster: Option<ClusterView>,
    decision: ReconciliationDecision,
}

/// Drives one bootstrap run.
pub struct Bootstrapper {
    provider: Arc<dyn DiscoveryProvider>,
    query: MembershipQuery,
    mutator: MembershipMutator,
    reconciler: Reconciler,
    emitter: ConfigEmitter,
    client_endpoint: Endpoint,
    retry: RetryPolicy,
    run_mode: RunMode,
}

impl Bootstrapper {
    #[must_use]
    pub fn new(
        provider: Arc<dyn DiscoveryProvider>,
        client: MembersClient,
        reconciler: Reconciler,
        emitter: ConfigEmitter,
        client_endpoint: Endpoint,
    ) -> Self {
        Self {
            provider,
            query: MembershipQuery::new(client.clone()),
            mutator: MembershipMutator::new(client),
            reconciler,
            emitter,
            client_endpoint,
            retry: RetryPolicy::default(),
            run_mode: RunMode::Normal,
        }
    }

    /// Wires every component from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Settings`] if the configuration is invalid or the HTTP
    /// client cannot be built, and [`BootstrapError::Discovery`] if the provider cannot
    /// be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, BootstrapError> {
        config.validate().map_err(BootstrapError::Settings)?;

        let provider = discovery::provider_from_config(config)?;
        let client = MembersClient::with_config(config.members_client_config())?;

        Ok(Self::new(
            provider,
            client,
            Reconciler::new(config.peer, config.proxy),
            ConfigEmitter::new(&config.peers_file),
            config.client,
        )
        .with_retry(RetryPolicy { max_attempts: config.retry.max_attempts, wait: config.retry_wait() }))
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    /// Runs discovery, reconciliation, mutation and emission.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`BootstrapError`]; mutation failures are not fatal.
    pub async fn run(&self) -> Result<BootstrapReport, BootstrapError> {
        let Plan { local, cluster, decision } = self.plan_with_retry().await?;

        let mut evictions = Vec::new();
        let mut self_added = None;
        let mut decision = decision;

        if self.run_mode == RunMode::Normal && decision.is_join() {
            if let Some(cluster) = &cluster {
                for member in &decision.members_to_evict {
                    let outcome = self.mutator.evict(&cluster.coordinator, member).await;
                    evictions.push((member.clone(), outcome));
                }

                decision = self.rebase_on_live(decision, &local, cluster).await?;

                if !self.reconciler.proxy().is_on() {
                    let peer_url = self.reconciler.local_peer_url(&local);
                    self_added = Some(
                        self.mutator.add_self(&cluster.coordinator, &local.identity, &peer_url).await,
                    );
                }
            }
        }

        let rendered = ConfigEmitter::render(&decision, &local.identity);
        let written_to = match self.run_mode {
            RunMode::Normal => {
                self.emitter.write(&decision, &local.identity)?;
                Some(self.emitter.path().to_path_buf())
            }
            RunMode::DryRun => None,
        };

        Ok(BootstrapReport { local, decision, evictions, self_added, rendered, written_to })
    }

    async fn plan_with_retry(&self) -> Result<Plan, BootstrapError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.plan().await {
                Ok(plan) => return Ok(plan),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        stage = e.stage(),
                        error = %e,
                        attempt,
                        max_attempts,
                        wait_secs = self.retry.wait.as_secs(),
                        "bootstrap attempt failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry.wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn plan(&self) -> Result<Plan, BootstrapError> {
        let identity = self.provider.instance_id().await?;
        let address = self.provider.instance_ip().await?;
        let local = LocalInstance::new(identity, address);
        info!(instance = %local.identity, address = %local.address, "resolved instance identity");

        let candidates: Vec<Candidate> = self.provider.peer_names_and_ips().await?;
        info!(candidates_count = candidates.len(), "discovered candidates");

        let client_urls: Vec<String> =
            candidates.iter().map(|c| self.client_endpoint.url_for(&c.address)).collect();
        let cluster = self.query.find_cluster(&client_urls).await;
        let observed = cluster.as_ref().map(|c| c.members.as_slice()).unwrap_or_default();

        let decision = self.reconciler.reconcile(&local, &candidates, observed)?;
        info!(
            cluster_state = %decision.cluster_state,
            proxy = %decision.proxy,
            peers_count = decision.final_peer_list.len(),
            evictions_count = decision.members_to_evict.len(),
            "reconciliation complete"
        );

        Ok(Plan { local, cluster, decision })
    }

    /// Re-reads the member list after evictions and rebuilds the peer list from it.
    ///
    /// Falls back to the predicted list if the coordinator cannot be read.
    async fn rebase_on_live(
        &self,
        decision: ReconciliationDecision,
        local: &LocalInstance,
        cluster: &ClusterView,
    ) -> Result<ReconciliationDecision, BootstrapError> {
        match self.query.refresh(&cluster.coordinator).await {
            Ok(live) => Ok(self.reconciler.rebase(decision, local, &live)?),
            Err(e) => {
                warn!(
                    coordinator = %cluster.coordinator,
                    error = %e,
                    "could not re-read member list, using predicted peer list"
                );
                Ok(decision)
            }
        }
    }
}
