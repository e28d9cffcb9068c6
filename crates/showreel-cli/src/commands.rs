//! CLI command implementations

use crate::output::{flag, to_json, OutputFormat};
use crate::script::{Report, Scenario};
use anyhow::Context;
use serde::Serialize;
use showreel_core::manifest::{parse_master_playlist, select_highest};
use showreel_core::{PlayerConfig, PlayerSnapshot};
use std::path::Path;

/// Replay a scenario
pub fn replay(script: &Path, config: Option<&Path>, format: &str) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => PlayerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlayerConfig::interactive(),
    };
    let scenario = Scenario::load(script)?;
    let report = scenario.run(&config)?;

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&report)?),
        OutputFormat::Text => print_report(script, &report),
    }

    if report.steps.iter().any(|s| !s.ok) {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(script: &Path, report: &Report) {
    println!("Replaying: {}", script.display());
    println!("\nSteps:");
    for outcome in &report.steps {
        match &outcome.error {
            None => println!("  {:>3}. {:<28} ok", outcome.index, outcome.step),
            Some(e) => println!("  {:>3}. {:<28} FAILED ({})", outcome.index, outcome.step, e),
        }
        if let Some(snapshot) = &outcome.snapshot {
            println!("       {}", summarize(snapshot));
        }
    }

    println!("\nPlayers:");
    for (id, snapshot) in &report.players {
        println!("  {:<10} {}", id, summarize(snapshot));
    }

    println!("\nActive video: {}", report.active.as_deref().unwrap_or("none"));
    println!("Simulated time: {}ms", report.elapsed_ms);
}

fn summarize(snapshot: &PlayerSnapshot) -> String {
    format!(
        "{:<9} {} / {}  fullscreen: {:<3}  dragging: {:<3}  source: {}",
        snapshot.state.to_string(),
        snapshot.current_label,
        snapshot.duration_label,
        flag(snapshot.is_fullscreen),
        flag(snapshot.is_dragging),
        snapshot.source,
    )
}

#[derive(Serialize)]
struct LevelRow {
    index: usize,
    quality: String,
    bandwidth: u64,
    uri: String,
    selected: bool,
}

/// List master playlist renditions and the one that would be forced
pub fn levels(manifest: &Path, format: &str) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(manifest)
        .with_context(|| format!("reading {}", manifest.display()))?;
    let renditions = parse_master_playlist(&content)?;
    let highest = select_highest(&renditions);

    let rows: Vec<LevelRow> = renditions
        .iter()
        .enumerate()
        .map(|(index, r)| LevelRow {
            index,
            quality: r.label(),
            bandwidth: r.bandwidth,
            uri: r.uri.clone(),
            selected: highest == Some(index),
        })
        .collect();

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&rows)?),
        OutputFormat::Text => {
            println!("Renditions: {}", rows.len());
            for row in &rows {
                println!(
                    "  {}{:>2}. {:<8} {:>10}bps  {}",
                    if row.selected { "*" } else { " " },
                    row.index,
                    row.quality,
                    row.bandwidth,
                    row.uri
                );
            }
            println!("\n* forced when force_highest_quality is enabled");
        }
    }
    Ok(())
}

/// Format a position
pub fn format_time(seconds: f64, format: &str) -> anyhow::Result<()> {
    let label = showreel_core::format_time(seconds);
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&serde_json::json!({ "seconds": seconds, "label": label }))?),
        OutputFormat::Text => println!("{label}"),
    }
    Ok(())
}

/// Print both configuration presets
pub fn config(format: &str) -> anyhow::Result<()> {
    let presets = serde_json::json!({
        "interactive": PlayerConfig::interactive(),
        "background": PlayerConfig::background(),
    });
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&presets)?),
        OutputFormat::Text => {
            for (name, config) in [
                ("interactive", PlayerConfig::interactive()),
                ("background", PlayerConfig::background()),
            ] {
                println!("{name}:");
                println!("  autoplay:              {}", config.autoplay);
                println!("  muted:                 {}", config.muted);
                println!("  force_highest_quality: {}", config.force_highest_quality);
                println!("  resume_settle_delay:   {}ms", config.resume_settle_delay_ms);
            }
        }
    }
    Ok(())
}
