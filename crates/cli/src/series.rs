//! `cjoin canon` / `cjoin group` / `cjoin consolidate`: series titles and archives.

use std::io::{self, BufRead};
use std::path::PathBuf;

use countyjoin_core::JurisdictionScope;
use countyjoin_series::aggregate::RejectedSeries;
use countyjoin_series::archive::FinalizeOptions;
use countyjoin_series::load::RejectedCounty;
use countyjoin_series::{canonicalize, finalize, load_listings, shard, FsArchiveStore};
use serde::Serialize;

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

pub fn cmd_canon(titles: Vec<String>) -> Result<(), CliError> {
    if !titles.is_empty() {
        for title in &titles {
            println!("{}", canonicalize(title));
        }
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| CliError::args(format!("cannot read stdin: {e}")))?;
        println!("{}", canonicalize(&line));
    }
    Ok(())
}

#[derive(Serialize)]
struct GroupReport {
    shards: Vec<ShardReport>,
    rejected_counties: Vec<RejectedCounty>,
}

#[derive(Serialize)]
struct ShardReport {
    key: String,
    path: String,
    titles: usize,
    records: usize,
    rejected: Vec<RejectedSeries>,
}

pub fn cmd_group(listings_path: PathBuf, out_dir: PathBuf, json_output: bool) -> Result<(), CliError> {
    let listings = load_listings(&listings_path).map_err(CliError::series)?;

    std::fs::create_dir_all(&out_dir)
        .map_err(|e| CliError::persistence(format!("cannot create {}: {e}", out_dir.display())))?;

    let store = FsArchiveStore::new(&out_dir);
    let mut report = GroupReport {
        shards: Vec::new(),
        rejected_counties: listings.rejected_counties,
    };

    for (key, aggregation) in shard(listings.records) {
        let path = store.write_shard(&key, &aggregation.group).map_err(CliError::series)?;
        report.shards.push(ShardReport {
            key: key.to_string(),
            path: path.display().to_string(),
            titles: aggregation.group.len(),
            records: aggregation.group.record_count(),
            rejected: aggregation.rejected,
        });
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    let records: usize = report.shards.iter().map(|s| s.records).sum();
    let rejected: usize = report.shards.iter().map(|s| s.rejected.len()).sum();
    eprintln!(
        "grouped {} series into {} shard(s) in {} ({} without title, {} counties without state)",
        records,
        report.shards.len(),
        out_dir.display(),
        rejected,
        report.rejected_counties.len(),
    );
    Ok(())
}

pub fn cmd_consolidate(
    dir: PathBuf,
    archive_name: String,
    scope: JurisdictionScope,
    keep_shards: bool,
    json_output: bool,
) -> Result<(), CliError> {
    let mut store = FsArchiveStore::new(&dir)
        .with_archive_name(archive_name)
        .map_err(CliError::series)?;
    let options = FinalizeOptions { scope, keep_shards };

    let report = finalize(&mut store, &options).map_err(CliError::series)?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    for skipped in &report.skipped {
        eprintln!("  skipped {}", skipped.location);
    }
    for failure in &report.retire_failures {
        eprintln!("  not removed {}: {}", failure.location, failure.message);
    }

    if report.written {
        eprintln!(
            "wrote {} ({} new shard(s), {} kept, {} series), removed {} shard file(s)",
            store.archive_path().display(),
            report.included.len(),
            report.carried_over.len(),
            report.records,
            report.retired.len(),
        );
    } else {
        eprintln!("no shards to consolidate in {}", dir.display());
    }
    Ok(())
}
