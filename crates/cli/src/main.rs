use bootstrap_core::{bootstrap::exit_codes, config::AppConfig, RunMode};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{
    handle_config_command, handle_run, load_config, utils::print_error, ConfigCommands,
    ConfigOverrides, RunOptions,
};

#[derive(Parser)]
#[command(name = "etcd-bootstrap")]
#[command(about = "Discover etcd peers at boot and write the cluster membership file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (defaults to $ETCD_BOOTSTRAP_CONFIG, then /etc/etcd-bootstrap/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile cluster membership and write the peers file
    Run {
        /// Compute and print the peers file without touching the cluster or disk
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Initializes logging to stderr based on the configuration.
///
/// `RUST_LOG=debug` and `RUST_LOG=trace` widen the crate filters; any other value is used
/// as a filter directive verbatim.
fn init_logging(config: &AppConfig) {
    let default_directive =
        format!("warn,bootstrap_core={0},etcd_bootstrap={0}", config.logging.level);

    let filter = match std::env::var("RUST_LOG") {
        Ok(level) if level == "debug" || level == "trace" => {
            EnvFilter::new(format!("warn,bootstrap_core={level},etcd_bootstrap={level}"))
        }
        Ok(_) => EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| EnvFilter::new(&default_directive)),
        Err(_) => EnvFilter::new(&default_directive),
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

async fn run(cli: Cli) -> Result<(), commands::utils::CliError> {
    let config = load_config(cli.config.as_deref(), &cli.overrides)?;
    init_logging(&config);
    debug!(
        provider = ?config.provider,
        proxy = %config.proxy,
        peers_file = %config.peers_file.display(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Run { dry_run } => {
            let run_mode = if dry_run { RunMode::DryRun } else { RunMode::Normal };
            handle_run(&config, RunOptions { run_mode }).await
        }
        Commands::Config(config_command) => handle_config_command(&config_command, &config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let e = anyhow::Error::new(e).context("failed to start async runtime");
            print_error(&format!("{e:#}"));
            return ExitCode::from(exit_codes::GENERIC_ERROR);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(e) => {
            error!(error = %e, "bootstrap failed");
            print_error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}
