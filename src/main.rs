use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nhl_shot_features::batch;
use nhl_shot_features::config::EngineConfig;
use nhl_shot_features::feature_export;
use nhl_shot_features::feature_store;
use nhl_shot_features::game_source;
use nhl_shot_features::geometry::AttackingGoalPolicy;
use nhl_shot_features::timeline::ScanBound;

const DEFAULT_INPUT_DIR: &str = "data/raw";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init();

    let config = resolve_config();
    let input = parse_path_arg("--input").unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
    info!(
        input = %input.display(),
        bound = config.scan_bound.label(),
        attacking_goal = config.attacking_goal.label(),
        threads = config.parallelism,
        "building shot features"
    );

    let scan = game_source::load_cached_games(&input)?;
    let mut output = batch::run_batch(&scan.games, &config);
    output.skipped.extend(scan.unreadable);

    println!("Shot feature build complete");
    println!("Input: {}", input.display());
    println!("Games: {} processed, {} skipped", output.games_processed, output.skipped.len());
    println!("Rows: {}", output.rows.len());
    println!("Dropped plays: {}", output.events_dropped);
    println!("Digest: {}", output.digest);
    for skipped in &output.skipped {
        println!("  skipped {} ({}): {}", skipped.game, skipped.kind, skipped.reason);
    }

    if !has_flag("--no-db") {
        let db_path = parse_path_arg("--db")
            .or_else(feature_store::default_db_path)
            .context("unable to resolve sqlite path")?;
        let mut conn = feature_store::open_db(&db_path)?;
        let stored = feature_store::record_batch(&mut conn, &output)?;
        println!("DB: {} (run {}, {} rows)", db_path.display(), stored.run_id, stored.rows_upserted);
    }

    if let Some(xlsx_path) = parse_path_arg("--xlsx") {
        let report = feature_export::export_workbook(&xlsx_path, &output)?;
        println!(
            "Workbook: {} ({} shots, {} skipped)",
            xlsx_path.display(),
            report.shots,
            report.skipped
        );
    }

    Ok(())
}

fn resolve_config() -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(bound) = parse_str_arg("--bound").and_then(|v| ScanBound::parse(&v)) {
        config.scan_bound = bound;
    }
    if let Some(policy) = parse_str_arg("--policy").and_then(|v| AttackingGoalPolicy::parse(&v)) {
        config.attacking_goal = policy;
    }
    if let Some(threads) = parse_str_arg("--threads").and_then(|v| v.trim().parse::<usize>().ok()) {
        config = config.with_parallelism(threads);
    }
    if has_flag("--include-missed") {
        config.include_missed_shots = true;
    }
    config
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_str_arg(name).map(PathBuf::from)
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&format!("{name}="))
            && !v.trim().is_empty()
        {
            return Some(v.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
