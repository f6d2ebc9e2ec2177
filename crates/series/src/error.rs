use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    /// An input collection or shard directory could not be read.
    #[error("source unavailable: {path}: {message}")]
    SourceUnavailable { path: String, message: String },
    /// A shard or listing file was read but is not valid series JSON.
    #[error("'{location}' could not be parsed: {message}")]
    Parse { location: String, message: String },
    /// Two shards claimed the same key.
    #[error("duplicate shard key '{0}'")]
    DuplicateShard(String),
    /// The consolidated archive was not durably written.
    #[error("could not write {path}: {message}")]
    Persistence { path: String, message: String },
    /// The archive file name would collide with a shard file or leave the
    /// shard directory.
    #[error("invalid archive name '{name}': {reason}")]
    InvalidArchiveName { name: String, reason: &'static str },
    /// A shard source could not be removed after a successful write.
    #[error("could not retire shard {location}: {message}")]
    Retire { location: String, message: String },
}
