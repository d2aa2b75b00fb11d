// src/cli/record.rs - Single-shot engine operations on the persisted profile

use chrono::Utc;

use super::build_engine;
use crate::hints::{HintCategory, ProficiencyLevel, TriggerKind};
use crate::infra::config::Config;
use crate::learner::HintOutcome;

pub fn run_evaluate(config: &Config, trigger: TriggerKind, show: bool) -> anyhow::Result<()> {
    let mut engine = build_engine(config);
    let now = Utc::now();

    match engine.evaluate(&trigger, now) {
        Some(category) => {
            println!(
                "{trigger}: show {category} for {}s",
                category.default_duration().as_secs()
            );
            if show {
                engine.record_shown(category, now);
                println!("  recorded as shown");
            }
        }
        None => println!("{trigger}: no hint"),
    }
    Ok(())
}

pub fn run_shown(config: &Config, category: HintCategory) -> anyhow::Result<()> {
    let mut engine = build_engine(config);
    engine.record_shown(category, Utc::now());
    println!(
        "Recorded {category} ({} in history)",
        engine.state().history_len(category)
    );
    warn_if_unsaved(engine.has_pending_save());
    Ok(())
}

pub fn run_outcome(config: &Config, outcome: HintOutcome) -> anyhow::Result<()> {
    let mut engine = build_engine(config);
    let before = engine.proficiency();
    let after = engine.record_outcome(outcome, Utc::now());
    let counters = engine.state().counters();

    println!(
        "Recorded {outcome} ({} accepted, {} deferred)",
        counters.transitions_accepted, counters.transitions_deferred
    );
    if after != before {
        println!("Proficiency: {before} -> {after}");
    }
    warn_if_unsaved(engine.has_pending_save());
    Ok(())
}

pub fn run_reset(config: &Config) -> anyhow::Result<()> {
    let mut engine = build_engine(config);
    engine.reset();
    println!("Learning state reset for profile '{}'", config.storage.profile);
    warn_if_unsaved(engine.has_pending_save());
    Ok(())
}

pub fn run_set_level(config: &Config, level: ProficiencyLevel) -> anyhow::Result<()> {
    let mut engine = build_engine(config);
    engine.set_proficiency(level);
    println!(
        "Proficiency set to {level} (hints: {})",
        level.frequency_class()
    );
    warn_if_unsaved(engine.has_pending_save());
    Ok(())
}

fn warn_if_unsaved(pending: bool) {
    if pending {
        eprintln!("warning: learning state could not be saved");
    }
}
