//! Filesystem layout: one `<ST>_series.json` file per shard next to the
//! consolidated archive file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use countyjoin_core::Jurisdiction;
use serde::Serialize;

use crate::archive::{ArchiveStore, ShardSource};
use crate::error::SeriesError;
use crate::model::{Archive, SeriesGroup};

pub const SHARD_SUFFIX: &str = "_series.json";
pub const DEFAULT_ARCHIVE_NAME: &str = "series_archive.json";

#[derive(Debug, Clone)]
pub struct FsArchiveStore {
    dir: PathBuf,
    archive_name: String,
}

impl FsArchiveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }

    /// Use `name` instead of [`DEFAULT_ARCHIVE_NAME`]. The name must be a
    /// plain file name that [`ArchiveStore::list_shards`] would not pick up as
    /// a shard.
    pub fn with_archive_name(mut self, name: impl Into<String>) -> Result<Self, SeriesError> {
        let name = name.into();
        let reason = if name.is_empty() || name == "." || name == ".." {
            Some("not a file name")
        } else if name.contains(['/', '\\']) {
            Some("must not contain a path separator")
        } else if name.ends_with(SHARD_SUFFIX) {
            Some("ends with the shard suffix")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(SeriesError::InvalidArchiveName { name, reason });
        }
        self.archive_name = name;
        Ok(self)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn archive_path(&self) -> PathBuf {
        self.dir.join(&self.archive_name)
    }

    pub fn shard_path(&self, key: &Jurisdiction) -> PathBuf {
        self.dir.join(format!("{key}{SHARD_SUFFIX}"))
    }

    /// Write one shard file atomically, replacing any previous one.
    pub fn write_shard(&self, key: &Jurisdiction, group: &SeriesGroup) -> Result<PathBuf, SeriesError> {
        let path = self.shard_path(key);
        write_json_atomic(&path, group)?;
        Ok(path)
    }

}

impl ArchiveStore for FsArchiveStore {
    fn list_shards(&self) -> Result<Vec<ShardSource>, SeriesError> {
        let unavailable = |e: std::io::Error| SeriesError::SourceUnavailable {
            path: self.dir.display().to_string(),
            message: e.to_string(),
        };

        let mut shards = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if file_name == self.archive_name || !entry.path().is_file() {
                continue;
            }
            if let Some(key) = file_name.strip_suffix(SHARD_SUFFIX) {
                shards.push(ShardSource {
                    key: key.to_string(),
                    location: entry.path().display().to_string(),
                });
            }
        }

        // read_dir order is platform-dependent
        shards.sort_by(|a, b| a.location.cmp(&b.location));
        tracing::debug!(dir = %self.dir.display(), shards = shards.len(), "listed shards");
        Ok(shards)
    }

    fn read_archive(&self) -> Result<Option<Archive>, SeriesError> {
        let path = self.archive_path();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SeriesError::SourceUnavailable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        serde_json::from_str(&data).map(Some).map_err(|e| SeriesError::Parse {
            location: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn read_shard(&self, source: &ShardSource) -> Result<SeriesGroup, SeriesError> {
        let data = fs::read_to_string(&source.location).map_err(|e| SeriesError::Parse {
            location: source.location.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&data).map_err(|e| SeriesError::Parse {
            location: source.location.clone(),
            message: e.to_string(),
        })
    }

    fn write_archive(&mut self, archive: &Archive) -> Result<(), SeriesError> {
        write_json_atomic(&self.archive_path(), archive)
    }

    fn retire_shard(&mut self, source: &ShardSource) -> Result<(), SeriesError> {
        fs::remove_file(&source.location).map_err(|e| SeriesError::Retire {
            location: source.location.clone(),
            message: e.to_string(),
        })
    }
}

/// Serialize `value` as pretty JSON to `path` via a sibling `.tmp` file that
/// is synced and then renamed over the target. On failure the target is
/// untouched and the temp file is removed.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SeriesError> {
    let persistence = |e: &dyn std::fmt::Display| SeriesError::Persistence {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let json = serde_json::to_vec_pretty(value).map_err(|e| persistence(&e))?;

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(persistence(&e));
    }
    Ok(())
}
