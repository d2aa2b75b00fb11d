// src/main.rs - callhint entry point

use clap::Parser;
use std::time::Duration;

use callhint::cli::simulate::SimulateOptions;
use callhint::cli::{migrate, record, simulate, status, Cli, Commands};
use callhint::infra::config::Config;
use callhint::infra::errors::HintError;
use callhint::infra::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        let user_error = e
            .downcast_ref::<HintError>()
            .is_some_and(HintError::is_user_error);
        std::process::exit(if user_error { 2 } else { 1 });
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    if let Some(profile) = cli.profile {
        config.storage.profile = profile;
    }

    logger::init_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    match cli.command {
        Commands::Status { json } => status::show_status(&config, json),
        Commands::Catalog => status::show_catalog(&config),
        Commands::Evaluate { trigger, show } => record::run_evaluate(&config, trigger, show),
        Commands::Shown { category } => record::run_shown(&config, category),
        Commands::Outcome { outcome } => record::run_outcome(&config, outcome),
        Commands::Reset => record::run_reset(&config),
        Commands::SetLevel { level } => record::run_set_level(&config, level),
        Commands::Simulate {
            steps,
            seed,
            accept_rate,
            interval_secs,
        } => {
            let opts = SimulateOptions {
                steps,
                seed,
                accept_rate,
                interval: Duration::from_secs(interval_secs),
            };
            simulate::run_simulate(&config, opts).await
        }
        Commands::Migrate { rollback } => migrate::run_migrate(&config, rollback),
    }
}
