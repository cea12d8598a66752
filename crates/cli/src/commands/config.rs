use bootstrap_core::config::{AppConfig, ProviderKind};
use clap::Subcommand;

use super::utils::{print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the effective configuration
    Validate,

    /// Print the effective configuration as TOML
    Show,
}

pub fn handle_config_command(command: &ConfigCommands, config: &AppConfig) -> CliResult<()> {
    match command {
        ConfigCommands::Validate => validate_config(config),
        ConfigCommands::Show => show_config(config),
    }
}

fn validate_config(config: &AppConfig) -> CliResult<()> {
    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    eprintln!("Configuration Summary:");
    eprintln!("  Peers file: {}", config.peers_file.display());
    eprintln!("  Client: {}://<address>:{}", config.client.scheme, config.client.port);
    eprintln!("  Peer: {}://<address>:{}", config.peer.scheme, config.peer.port);
    eprintln!("  Proxy: {}", config.proxy);
    eprintln!(
        "  Provider: {}",
        match config.provider {
            ProviderKind::Static => "static",
            ProviderKind::Gce => "gce",
        }
    );
    eprintln!("  Attempts: {}", config.retry.max_attempts);

    Ok(())
}

fn show_config(config: &AppConfig) -> CliResult<()> {
    let rendered =
        toml::to_string_pretty(config).map_err(|e| CliError::Config(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}
