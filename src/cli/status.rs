// src/cli/status.rs - Learning status and catalog display

use super::build_engine;
use crate::hints::policy::{self, FrequencyPolicy};
use crate::hints::{HintCategory, ProficiencyLevel};
use crate::infra::config::Config;
use crate::infra::paths;

/// Display learning status for the configured profile.
pub fn show_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let engine = build_engine(config);
    let stats = engine.state().stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("callhint v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config_path = paths::config_file_path();
    if config_path.exists() {
        println!("  Config:       {} (loaded)", config_path.display());
    } else {
        println!("  Config:       (using defaults)");
    }
    println!(
        "  Storage:      {:?} at {} (profile '{}')",
        config.storage.backend,
        config.storage.resolved_path().display(),
        config.storage.profile
    );
    println!();

    let policy = engine.current_policy();
    println!(
        "  Proficiency:  {} ({}, {})",
        stats.proficiency,
        stats.proficiency.frequency_class(),
        describe_policy(&policy)
    );
    println!(
        "  Responses:    {} accepted, {} deferred ({:.0}% success)",
        stats.transitions_accepted,
        stats.transitions_deferred,
        stats.success_rate * 100.0
    );
    match stats.last_shown_at {
        Some(at) => println!("  Last hint:    {}", at.to_rfc3339()),
        None => println!("  Last hint:    (never)"),
    }

    if engine.state().is_empty() {
        println!();
        println!("  No hints recorded for this profile yet.");
        return Ok(());
    }
    if stats.per_category.is_empty() {
        return Ok(());
    }
    println!();
    println!("  Recent hints ({} retained):", stats.total_shown);
    for (category, count) in &stats.per_category {
        let last = engine
            .state()
            .last_shown(*category)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        println!("    {:<28} {:>2}  last {}", category.to_string(), count, last);
    }

    Ok(())
}

/// List every hint category with its priority and on-screen duration,
/// followed by the frequency table.
pub fn show_catalog(config: &Config) -> anyhow::Result<()> {
    let enabled = config.engine.effective_categories();

    println!("  {:<28} {:>8} {:>9}  enabled", "category", "priority", "duration");
    for category in HintCategory::ALL {
        println!(
            "  {:<28} {:>8} {:>8}s  {}",
            category.to_string(),
            category.priority(),
            category.default_duration().as_secs(),
            if enabled.contains(&category) { "yes" } else { "no" }
        );
    }

    println!();
    println!("  {:<14} {:<12} policy", "proficiency", "frequency");
    for level in ProficiencyLevel::ALL {
        let class = level.frequency_class();
        println!(
            "  {:<14} {:<12} {}",
            level.to_string(),
            class.to_string(),
            describe_policy(&policy::policy(class))
        );
    }
    Ok(())
}

fn describe_policy(policy: &FrequencyPolicy) -> String {
    match policy.cooldown {
        Some(cooldown) => format!(
            "p={:.2}, cooldown {}",
            policy.show_probability,
            format_secs(cooldown.as_secs())
        ),
        None => format!("p={:.2}, never", policy.show_probability),
    }
}

fn format_secs(secs: u64) -> String {
    match secs {
        s if s >= 86_400 && s % 86_400 == 0 => format!("{}d", s / 86_400),
        s if s >= 3_600 && s % 3_600 == 0 => format!("{}h", s / 3_600),
        s if s >= 60 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(300), "5m");
        assert_eq!(format_secs(3_600), "1h");
        assert_eq!(format_secs(604_800), "7d");
        assert_eq!(format_secs(90), "90s");
    }

    #[test]
    fn test_describe_never() {
        let p = policy::policy(ProficiencyLevel::Disabled.frequency_class());
        assert_eq!(describe_policy(&p), "p=0.00, never");
    }
}
