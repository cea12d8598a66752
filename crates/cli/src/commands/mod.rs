pub mod config;
pub mod run;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
pub use run::{handle_run, RunOptions};

use bootstrap_core::{
    config::{AppConfig, ProviderKind},
    types::{ProxyMode, UrlScheme},
};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use utils::{CliError, CliResult};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemeArg {
    Http,
    Https,
}

impl From<SchemeArg> for UrlScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Http => Self::Http,
            SchemeArg::Https => Self::Https,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProxyArg {
    On,
    Off,
}

impl From<ProxyArg> for ProxyMode {
    fn from(arg: ProxyArg) -> Self {
        match arg {
            ProxyArg::On => Self::On,
            ProxyArg::Off => Self::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProviderArg {
    Static,
    Gce,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Static => Self::Static,
            ProviderArg::Gce => Self::Gce,
        }
    }
}

/// Flags that override file and environment settings.
#[derive(Debug, Default, Args)]
pub struct ConfigOverrides {
    /// Output path for the peers file
    #[arg(long, global = true)]
    pub peers_file: Option<PathBuf>,

    /// Client port used to probe candidates
    #[arg(long, global = true)]
    pub client_port: Option<u16>,

    /// Peer port advertised in ETCD_INITIAL_CLUSTER
    #[arg(long, global = true)]
    pub peer_port: Option<u16>,

    /// Client URL scheme
    #[arg(long, value_enum, global = true)]
    pub client_scheme: Option<SchemeArg>,

    /// Peer URL scheme
    #[arg(long, value_enum, global = true)]
    pub peer_scheme: Option<SchemeArg>,

    /// Run as an etcd proxy instead of a voting member
    #[arg(long, value_enum, global = true)]
    pub proxy: Option<ProxyArg>,

    /// Discovery provider
    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderArg>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(ref path) = self.peers_file {
            config.peers_file.clone_from(path);
        }
        if let Some(port) = self.client_port {
            config.client.port = port;
        }
        if let Some(port) = self.peer_port {
            config.peer.port = port;
        }
        if let Some(scheme) = self.client_scheme {
            config.client.scheme = scheme.into();
        }
        if let Some(scheme) = self.peer_scheme {
            config.peer.scheme = scheme.into();
        }
        if let Some(proxy) = self.proxy {
            config.proxy = proxy.into();
        }
        if let Some(provider) = self.provider {
            config.provider = provider.into();
        }
    }
}

/// Loads layered configuration and applies command-line overrides.
///
/// # Errors
///
/// Returns [`CliError::Config`] if the file or environment cannot be parsed.
pub fn load_config(config_path: Option<&str>, overrides: &ConfigOverrides) -> CliResult<AppConfig> {
    let mut config = match config_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;

    overrides.apply(&mut config);
    Ok(config)
}
