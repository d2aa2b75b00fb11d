// src/cli/simulate.rs - Synthetic session against the engine task
//
// Drives the engine task with a seeded mix of triggers on a manual clock and
// answers every admitted hint with a synthetic user. Nothing is persisted.

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::server::{spawn_hint_server, ManualClock};
use crate::engine::DecisionEngine;
use crate::hints::{HintCategory, TriggerKind};
use crate::infra::config::Config;
use crate::learner::HintOutcome;
use crate::memory::InMemoryStore;

pub struct SimulateOptions {
    pub steps: u32,
    pub seed: u64,
    pub accept_rate: f64,
    pub interval: Duration,
}

#[derive(Debug, Default, PartialEq)]
pub struct SimulationReport {
    pub requested: u32,
    pub admitted: u32,
    pub accepted: u32,
    pub deferred: u32,
    /// Admitted hints per category.
    pub shown: BTreeMap<HintCategory, u32>,
}

pub async fn run_simulate(config: &Config, opts: SimulateOptions) -> anyhow::Result<()> {
    let report = simulate(config, &opts, true).await?;
    println!();
    println!(
        "{} triggers, {} hints shown ({} accepted, {} deferred)",
        report.requested, report.admitted, report.accepted, report.deferred
    );
    Ok(())
}

/// Run the session and return what happened. `verbose` prints each hint.
pub async fn simulate(
    config: &Config,
    opts: &SimulateOptions,
    verbose: bool,
) -> anyhow::Result<SimulationReport> {
    let mut engine_config = config.engine.clone();
    engine_config.seed = Some(opts.seed);
    let engine = DecisionEngine::new(engine_config, Box::new(InMemoryStore::new()));

    let start = Utc::now();
    let clock = ManualClock::new(start);
    let (handle, mut decisions, join) = spawn_hint_server(engine, Arc::new(clock.clone()));

    let mut user = ChaCha8Rng::seed_from_u64(opts.seed.wrapping_add(1));
    let mut report = SimulationReport::default();

    for step in 0..opts.steps {
        let trigger = synthetic_trigger(&mut user, step);
        handle.request(trigger).await?;
        report.requested += 1;

        // Snapshot round-trips through the task, so the request has been handled
        handle.snapshot().await?;
        let admitted = if decisions.has_changed().unwrap_or(false) {
            decisions.borrow_and_update().clone()
        } else {
            None
        };
        if let Some(decision) = admitted {
            report.admitted += 1;
            *report.shown.entry(decision.category).or_default() += 1;
            handle.shown(decision.category).await?;

            let outcome = if user.gen_bool(opts.accept_rate.clamp(0.0, 1.0)) {
                report.accepted += 1;
                HintOutcome::Accepted
            } else {
                report.deferred += 1;
                HintOutcome::Deferred
            };
            handle.outcome(decision.category, outcome).await?;

            if verbose {
                let level = handle.snapshot().await?.state.proficiency();
                let elapsed = decision.admitted_at - start;
                println!(
                    "  +{:>6}m  {:<24} {:<28} {:<9} -> {}",
                    elapsed.num_minutes(),
                    trigger.to_string(),
                    decision.category.to_string(),
                    outcome.to_string(),
                    level
                );
            }
        }

        clock.advance(opts.interval);
    }

    let final_state = handle.snapshot().await?.state;
    drop(handle);
    join.await?;

    if verbose {
        println!();
        println!(
            "Final proficiency: {} ({} accepted, {} deferred)",
            final_state.proficiency(),
            final_state.counters().transitions_accepted,
            final_state.counters().transitions_deferred
        );
    }
    Ok(report)
}

fn synthetic_trigger(rng: &mut ChaCha8Rng, step: u32) -> TriggerKind {
    if step == 0 {
        return TriggerKind::FirstTimeUser;
    }
    match rng.gen_range(0..10) {
        0 => TriggerKind::UserStruggling,
        1 => TriggerKind::ManualRequest,
        2 | 3 => TriggerKind::ExtendedUsage(Duration::from_secs(u64::from(step) * 60)),
        4 if rng.gen_bool(0.2) => TriggerKind::CriticalMoment,
        _ => TriggerKind::TimerElapsed(Duration::from_secs(30)),
    }
}
