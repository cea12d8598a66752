//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: optional TOML file, path from `ETCD_BOOTSTRAP_CONFIG`
//! 3. **Environment variables**: `ETCD_BOOTSTRAP__*` env vars override specific fields
//!
//! Command-line flags are applied on top by the binary.
//!
//! # Example
//!
//! ```toml
//! peers_file = "/etc/sysconfig/etcd-peers"
//! proxy = "off"
//! provider = "gce"
//!
//! [peer]
//! scheme = "https"
//! port = 2380
//!
//! [gce]
//! label_key = "etcd-cluster"
//! label_value = "main"
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

use crate::{
    membership::MembersClientConfig,
    types::{Endpoint, ProxyMode, UrlScheme},
};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ETCD_BOOTSTRAP_CONFIG";

/// Config file used when `ETCD_BOOTSTRAP_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/etcd-bootstrap/config.toml";

/// Prefix for environment overrides (`ETCD_BOOTSTRAP__PEER__PORT=2390`).
pub const ENV_PREFIX: &str = "ETCD_BOOTSTRAP";

const DEFAULT_PEERS_FILE: &str = "/etc/sysconfig/etcd-peers";
const DEFAULT_CLIENT_PORT: u16 = 2379;
const DEFAULT_PEER_PORT: u16 = 2380;
const DEFAULT_GCE_METADATA_URL: &str = "http://metadata.google.internal";
const DEFAULT_GCE_COMPUTE_URL: &str = "https://compute.googleapis.com";

/// Which infrastructure provider answers identity and inventory questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Identity and peers come from this configuration
    #[default]
    Static,
    /// Google Compute Engine metadata server and instances API
    Gce,
}

/// Settings for the `static` provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticProviderConfig {
    /// This instance's identity (also its etcd member name).
    #[serde(default)]
    pub instance_id: String,

    /// This instance's private address.
    #[serde(default)]
    pub instance_ip: String,

    /// Candidate set as `name=ip` pairs separated by commas, in the order they should be
    /// advertised.
    #[serde(default)]
    pub peers: String,
}

/// Settings for the `gce` provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GceConfig {
    /// Label key instances of this cluster carry. Defaults to `etcd-cluster`.
    #[serde(default = "default_gce_label_key")]
    pub label_key: String,

    /// Label value identifying this cluster. Required when `provider = "gce"`.
    #[serde(default)]
    pub label_value: String,

    /// Only `RUNNING` instances become candidates. Defaults to `true`.
    #[serde(default = "default_true")]
    pub running_only: bool,

    /// Metadata server base URL.
    #[serde(default = "default_gce_metadata_url")]
    pub metadata_url: String,

    /// Compute API base URL.
    #[serde(default = "default_gce_compute_url")]
    pub compute_url: String,

    /// Timeout for each metadata or inventory request in milliseconds. Defaults to `5000`.
    #[serde(default = "default_gce_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_gce_label_key() -> String {
    "etcd-cluster".to_string()
}

fn default_true() -> bool {
    true
}

fn default_gce_metadata_url() -> String {
    DEFAULT_GCE_METADATA_URL.to_string()
}

fn default_gce_compute_url() -> String {
    DEFAULT_GCE_COMPUTE_URL.to_string()
}

fn default_gce_request_timeout_ms() -> u64 {
    5000
}

/// Timeouts for the members API. All must be non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// TCP connect timeout in milliseconds. Defaults to `1000`.
    pub connect_timeout_ms: u64,

    /// Per-candidate probe timeout in milliseconds. Defaults to `2000`.
    pub probe_timeout_ms: u64,

    /// Add/remove request timeout in milliseconds. Defaults to `5000`.
    pub mutation_timeout_ms: u64,
}

/// Bounded retry around discovery and reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first. `1` disables retry. Defaults to `1`.
    pub max_attempts: u32,

    /// Seconds to wait between attempts. Defaults to `10`.
    pub wait_seconds: u64,
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

/// Root configuration for one bootstrap run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the emitted peers file.
    #[serde(default = "default_peers_file")]
    pub peers_file: PathBuf,

    /// Client URL template used to probe candidates.
    #[serde(default = "default_client_endpoint")]
    pub client: Endpoint,

    /// Peer URL template advertised in `ETCD_INITIAL_CLUSTER`.
    #[serde(default = "default_peer_endpoint")]
    pub peer: Endpoint,

    /// Proxy mode (`on`/`off`).
    #[serde(default)]
    pub proxy: ProxyMode,

    /// Discovery provider selector.
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub static_provider: StaticProviderConfig,

    #[serde(default)]
    pub gce: GceConfig,

    #[serde(default)]
    pub membership: MembershipConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_peers_file() -> PathBuf {
    PathBuf::from(DEFAULT_PEERS_FILE)
}

fn default_client_endpoint() -> Endpoint {
    Endpoint::new(UrlScheme::Http, DEFAULT_CLIENT_PORT)
}

fn default_peer_endpoint() -> Endpoint {
    Endpoint::new(UrlScheme::Http, DEFAULT_PEER_PORT)
}

impl Default for GceConfig {
    fn default() -> Self {
        Self {
            label_key: default_gce_label_key(),
            label_value: String::new(),
            running_only: true,
            metadata_url: default_gce_metadata_url(),
            compute_url: default_gce_compute_url(),
            request_timeout_ms: default_gce_request_timeout_ms(),
        }
    }
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self { connect_timeout_ms: 1000, probe_timeout_ms: 2000, mutation_timeout_ms: 5000 }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 1, wait_seconds: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            peers_file: default_peers_file(),
            client: default_client_endpoint(),
            peer: default_peer_endpoint(),
            proxy: ProxyMode::Off,
            provider: ProviderKind::Static,
            static_provider: StaticProviderConfig::default(),
            gce: GceConfig::default(),
            membership: MembershipConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// A missing file is not an error. Environment variables with the `ETCD_BOOTSTRAP__`
    /// prefix override any value, using `__` between nested fields
    /// (e.g. `ETCD_BOOTSTRAP__CLIENT__PORT=4001`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("peers_file", DEFAULT_PEERS_FILE)?
            .set_default("client.scheme", "http")?
            .set_default("client.port", i64::from(DEFAULT_CLIENT_PORT))?
            .set_default("peer.scheme", "http")?
            .set_default("peer.port", i64::from(DEFAULT_PEER_PORT))?
            .set_default("proxy", "off")?
            .set_default("provider", "static")?
            .set_default("membership.connect_timeout_ms", 1000)?
            .set_default("membership.probe_timeout_ms", 2000)?
            .set_default("membership.mutation_timeout_ms", 5000)?
            .set_default("retry.max_attempts", 1)?
            .set_default("retry.wait_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from the path in `ETCD_BOOTSTRAP_CONFIG`, falling back to
    /// [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.peers_file.as_os_str().is_empty() {
            return Err("peers_file must not be empty".to_string());
        }

        if self.client.port == 0 {
            return Err("Client port must be greater than 0".to_string());
        }

        if self.peer.port == 0 {
            return Err("Peer port must be greater than 0".to_string());
        }

        if self.membership.connect_timeout_ms == 0 ||
            self.membership.probe_timeout_ms == 0 ||
            self.membership.mutation_timeout_ms == 0
        {
            return Err("Membership timeouts must be greater than 0".to_string());
        }

        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        match self.provider {
            ProviderKind::Static => {
                if self.static_provider.instance_id.trim().is_empty() ||
                    self.static_provider.instance_ip.trim().is_empty()
                {
                    return Err(
                        "static provider requires static_provider.instance_id and instance_ip"
                            .to_string(),
                    );
                }
            }
            ProviderKind::Gce => {
                if self.gce.label_value.is_empty() {
                    return Err("gce provider requires gce.label_value".to_string());
                }
                if self.gce.request_timeout_ms == 0 {
                    return Err("gce.request_timeout_ms must be greater than 0".to_string());
                }
            }
        }

        Ok(())
    }

    /// Returns the members API client timeouts.
    #[must_use]
    pub fn members_client_config(&self) -> MembersClientConfig {
        MembersClientConfig {
            connect_timeout: Duration::from_millis(self.membership.connect_timeout_ms),
            probe_timeout: Duration::from_millis(self.membership.probe_timeout_ms),
            mutation_timeout: Duration::from_millis(self.membership.mutation_timeout_ms),
        }
    }

    /// Returns the wait between retry attempts as a [`Duration`].
    #[must_use]
    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry.wait_seconds)
    }
}
