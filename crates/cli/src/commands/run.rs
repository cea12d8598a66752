use bootstrap_core::{
    config::AppConfig, membership::MutationOutcome, BootstrapReport, Bootstrapper, RunMode,
};
use tracing::info;

use super::utils::{print_info, print_success, CliResult};

#[derive(Debug)]
pub struct RunOptions {
    pub run_mode: RunMode,
}

pub async fn handle_run(config: &AppConfig, options: RunOptions) -> CliResult<()> {
    let bootstrapper = Bootstrapper::from_config(config)?.with_run_mode(options.run_mode);

    let report = bootstrapper.run().await?;
    log_summary(&report);

    match options.run_mode {
        RunMode::DryRun => {
            print_info("Dry run: no membership changes made, peers file not written");
            print!("{}", report.rendered);
        }
        RunMode::Normal => {
            if let Some(path) = &report.written_to {
                print_success(&format!("Peers file written to {}", path.display()));
            }
        }
    }

    Ok(())
}

fn log_summary(report: &BootstrapReport) {
    let evicted = report.evictions.iter().filter(|(_, o)| o.is_success()).count();
    let eviction_failures = report.evictions.len() - evicted;

    info!(
        instance = %report.local.identity,
        cluster_state = %report.decision.cluster_state,
        proxy = %report.decision.proxy,
        initial_cluster = %report.decision.initial_cluster(),
        evicted,
        eviction_failures,
        self_added = report.self_added.as_ref().map_or("skipped", describe_outcome),
        "bootstrap complete"
    );
}

fn describe_outcome(outcome: &MutationOutcome) -> &'static str {
    match outcome {
        MutationOutcome::Applied => "added",
        MutationOutcome::AlreadyApplied => "already-member",
        MutationOutcome::Failed(_) => "failed",
    }
}
