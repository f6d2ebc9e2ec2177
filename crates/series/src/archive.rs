//! Consolidation of shard outputs into one archive.
//!
//! [`finalize`] is all-or-nothing with respect to shard inputs: shards are
//! retired only after the archive has been written, and any write failure
//! leaves every shard where it was. An existing archive is extended, never
//! truncated: its shards are carried over unless a fresh shard replaces them.

use std::collections::BTreeSet;

use countyjoin_core::{Jurisdiction, JurisdictionScope};
use serde::Serialize;

use crate::error::SeriesError;
use crate::model::{Archive, SeriesGroup};

/// One shard input as seen by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardSource {
    /// Shard key as written in the source name (not yet validated).
    pub key: String,
    /// Where the store keeps it (a file path for [`crate::FsArchiveStore`]).
    pub location: String,
}

/// Storage for shard inputs and the consolidated archive.
pub trait ArchiveStore {
    /// Shard inputs currently present, in a stable order.
    fn list_shards(&self) -> Result<Vec<ShardSource>, SeriesError>;

    /// The archive written by an earlier run, or `None` if there is none yet.
    fn read_archive(&self) -> Result<Option<Archive>, SeriesError>;

    fn read_shard(&self, source: &ShardSource) -> Result<SeriesGroup, SeriesError>;

    /// Write the archive durably. Must not leave a partial archive behind
    /// on failure.
    fn write_archive(&mut self, archive: &Archive) -> Result<(), SeriesError>;

    fn retire_shard(&mut self, source: &ShardSource) -> Result<(), SeriesError>;
}

// ---------------------------------------------------------------------------
// Options + Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FinalizeOptions {
    /// Shard keys admitted into the archive.
    pub scope: JurisdictionScope,
    /// Leave shard inputs in place after a successful write.
    pub keep_shards: bool,
}

impl Default for FinalizeOptions {
    fn default() -> Self {
        Self {
            scope: JurisdictionScope::StatesAndDc,
            keep_shards: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalizeReport {
    /// Shard keys loaded by this run, sorted.
    pub included: Vec<String>,
    /// Shard keys kept from the existing archive, sorted.
    pub carried_over: Vec<String>,
    pub skipped: Vec<SkippedShard>,
    /// False when no shard loaded and nothing was written.
    pub written: bool,
    /// Records in the written archive.
    pub records: usize,
    pub retired: Vec<String>,
    pub retire_failures: Vec<RetireFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedShard {
    pub location: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    OutOfScope,
    Unreadable(String),
    Duplicate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetireFailure {
    pub location: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Consolidate + Finalize
// ---------------------------------------------------------------------------

/// Merge shard outputs into an archive without touching any store.
pub fn consolidate<I>(shards: I) -> Result<Archive, SeriesError>
where
    I: IntoIterator<Item = (Jurisdiction, SeriesGroup)>,
{
    Archive::from_shards(shards)
}

/// Load every in-scope shard into the existing archive, write it, then retire
/// what was loaded.
///
/// A fresh shard replaces the archived group under the same key; every other
/// archived shard is kept. Errors from listing shards, reading the existing
/// archive or writing the new one are returned as-is and no shard is retired.
/// A shard that cannot be retired after a successful write is reported in
/// [`FinalizeReport::retire_failures`].
pub fn finalize<S: ArchiveStore>(
    store: &mut S,
    options: &FinalizeOptions,
) -> Result<FinalizeReport, SeriesError> {
    let mut report = FinalizeReport::default();
    let mut archive = store.read_archive()?.unwrap_or_default();
    let mut fresh: BTreeSet<Jurisdiction> = BTreeSet::new();
    let mut loaded: Vec<ShardSource> = Vec::new();

    for source in store.list_shards()? {
        let key = match Jurisdiction::parse(&source.key) {
            Some(key) if options.scope.contains(&key) => key,
            _ => {
                tracing::warn!(location = %source.location, scope = %options.scope, "shard out of scope; skipped");
                report.skipped.push(SkippedShard {
                    location: source.location,
                    reason: SkipReason::OutOfScope,
                });
                continue;
            }
        };

        let group = match store.read_shard(&source) {
            Ok(group) => group,
            Err(e) => {
                tracing::warn!(location = %source.location, error = %e, "shard unreadable; skipped");
                report.skipped.push(SkippedShard {
                    location: source.location,
                    reason: SkipReason::Unreadable(e.to_string()),
                });
                continue;
            }
        };

        if fresh.contains(&key) {
            tracing::warn!(location = %source.location, key = %source.key, "duplicate shard key; skipped");
            report.skipped.push(SkippedShard {
                location: source.location,
                reason: SkipReason::Duplicate,
            });
            continue;
        }
        if archive.replace_shard(key.clone(), group).is_some() {
            tracing::debug!(key = %key, "archived shard replaced");
        }
        fresh.insert(key);
        loaded.push(source);
    }

    if fresh.is_empty() {
        tracing::info!(skipped = report.skipped.len(), "no shards to consolidate");
        return Ok(report);
    }

    store.write_archive(&archive)?;
    report.written = true;
    report.included = fresh.iter().map(|k| k.to_string()).collect();
    report.carried_over = archive
        .shard_keys()
        .filter(|k| !fresh.contains(*k))
        .map(|k| k.to_string())
        .collect();
    report.records = archive.record_count();
    tracing::info!(
        shards = archive.len(),
        carried_over = report.carried_over.len(),
        records = report.records,
        "archive written"
    );

    if options.keep_shards {
        return Ok(report);
    }

    for source in loaded {
        match store.retire_shard(&source) {
            Ok(()) => report.retired.push(source.location),
            Err(e) => {
                tracing::warn!(location = %source.location, error = %e, "shard not retired");
                report.retire_failures.push(RetireFailure {
                    location: source.location,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
