// src/cli/mod.rs - CLI definition (clap derive)

pub mod migrate;
pub mod record;
pub mod simulate;
pub mod status;

use clap::{Parser, Subcommand};

use crate::engine::DecisionEngine;
use crate::hints::{HintCategory, ProficiencyLevel, TriggerKind};
use crate::infra::config::Config;
use crate::learner::HintOutcome;
use crate::memory::{self, InMemoryStore, LearningStore};

#[derive(Parser)]
#[command(
    name = "callhint",
    about = "Adaptive in-call hint scheduling",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Learning profile to operate on (overrides storage.profile)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Log level (overrides logging.level; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show proficiency, counters and show history
    Status {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List hint categories with priority and on-screen duration
    Catalog,
    /// Ask the engine whether a trigger warrants a hint right now
    Evaluate {
        /// Trigger, e.g. first_time_user, critical_moment, extended_usage:300
        trigger: TriggerKind,
        /// Record the admitted hint as shown
        #[arg(long)]
        show: bool,
    },
    /// Record that a hint was displayed
    Shown { category: HintCategory },
    /// Record the user's response to a displayed hint
    Outcome { outcome: HintOutcome },
    /// Forget all learned history and counters
    Reset,
    /// Override the proficiency level
    SetLevel { level: ProficiencyLevel },
    /// Run a synthetic session through the engine task
    Simulate {
        /// Number of triggers to send
        #[arg(long, default_value = "40")]
        steps: u32,
        /// Seed for both the engine and the synthetic user
        #[arg(long, default_value = "7")]
        seed: u64,
        /// Probability that the synthetic user accepts a hint
        #[arg(long, default_value = "0.8")]
        accept_rate: f64,
        /// Simulated seconds between triggers
        #[arg(long, default_value = "900")]
        interval_secs: u64,
    },
    /// Show migration status or roll back the last migration
    Migrate {
        #[arg(long)]
        rollback: bool,
    },
}

/// Open the configured store, falling back to a throwaway in-memory one
/// when the backend cannot be opened.
pub fn open_store_or_memory(config: &Config) -> Box<dyn LearningStore> {
    match memory::open_store(&config.storage) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Could not open learning store: {e}; state will not persist");
            Box::new(InMemoryStore::new())
        }
    }
}

pub fn build_engine(config: &Config) -> DecisionEngine {
    DecisionEngine::new(config.engine.clone(), open_store_or_memory(config))
}
