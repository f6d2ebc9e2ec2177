//! `cjoin match` / `cjoin validate`: config-driven county reconciliation.

use std::path::{Path, PathBuf};

use countyjoin_recon::load::load_source;
use countyjoin_recon::{ReconConfig, ReconciliationResult, Reconciler};
use countyjoin_series::store::write_json_atomic;

use crate::exit_codes::{EXIT_ERROR, EXIT_SOURCE_UNAVAILABLE, EXIT_UNMATCHED};
use crate::CliError;

pub const MAP_FILE: &str = "map.json";
pub const LEFT_ONLY_FILE: &str = "left_only.json";
pub const RIGHT_ONLY_FILE: &str = "right_only.json";
pub const SUMMARY_FILE: &str = "summary.json";

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_SOURCE_UNAVAILABLE, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    ReconConfig::from_toml(&config_str).map_err(CliError::recon)
}

fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

pub fn cmd_match(
    config_path: PathBuf,
    out_dir: Option<PathBuf>,
    json_output: bool,
    strict: bool,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let base_dir = base_dir(&config_path);

    // Everything is loaded before any reconciliation work starts
    let tables = config.load_tables(base_dir).map_err(CliError::recon)?;
    let left = load_source(&config.resolve(base_dir, &config.left.file), config.left.format)
        .map_err(CliError::recon)?;
    let right = load_source(&config.resolve(base_dir, &config.right.file), config.right.format)
        .map_err(CliError::recon)?;

    let result = Reconciler::new(&tables)
        .with_policy(config.policy.empty_jurisdiction)
        .named(config.name.clone())
        .reconcile(&left, &right);

    let out_dir = out_dir.or_else(|| config.output.dir.as_ref().map(|d| config.resolve(base_dir, d)));
    if let Some(dir) = &out_dir {
        write_outputs(dir, &config, &result)?;
        eprintln!("wrote {}", dir.display());
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    let scoped_left_only = result.left_only_in(config.output.left_only_scope).len();
    eprintln!(
        "recon '{}': {} left, {} right - {} pairs, {} left-only ({} in scope {}), {} right-only, {} backfilled",
        result.meta.config_name,
        s.left_records,
        s.right_records,
        s.matched_pairs,
        s.left_only,
        scoped_left_only,
        config.output.left_only_scope,
        s.right_only,
        s.backfilled,
    );
    for (kind, count) in &s.issue_counts {
        eprintln!("  {kind}: {count}");
    }

    if strict && (scoped_left_only > 0 || s.right_only > 0) {
        return Err(CliError::new(
            EXIT_UNMATCHED,
            format!("{scoped_left_only} left-only and {} right-only records remain", s.right_only),
        )
        .with_hint("extend the correction table or rerun without --strict"));
    }

    Ok(())
}

/// Write the map, both unmatched reports and the summary into `dir`.
fn write_outputs(dir: &Path, config: &ReconConfig, result: &ReconciliationResult) -> Result<(), CliError> {
    tracing::debug!(dir = %dir.display(), "writing reconciliation outputs");
    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::persistence(format!("cannot create {}: {e}", dir.display())))?;

    let summary = serde_json::json!({
        "meta": result.meta,
        "summary": result.summary,
        "left_only_scope": config.output.left_only_scope,
        "issues": result.issues,
    });

    write_json_atomic(&dir.join(MAP_FILE), &result.left_join_rows()).map_err(CliError::series)?;
    write_json_atomic(&dir.join(LEFT_ONLY_FILE), &result.left_only_in(config.output.left_only_scope))
        .map_err(CliError::series)?;
    write_json_atomic(&dir.join(RIGHT_ONLY_FILE), &result.right_only).map_err(CliError::series)?;
    write_json_atomic(&dir.join(SUMMARY_FILE), &summary).map_err(CliError::series)?;
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let tables = config.load_tables(base_dir(&config_path)).map_err(CliError::recon)?;

    eprintln!(
        "valid: recon '{}' ({} -> {}), {} correction(s), {} backfill(s), empty jurisdiction: {}",
        config.name,
        config.left.format,
        config.right.format,
        tables.corrections.len(),
        tables.jurisdiction_backfill.len(),
        config.policy.empty_jurisdiction,
    );
    Ok(())
}
