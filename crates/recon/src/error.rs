use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error in a recon config.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (wrong registry on a side, empty name, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Correction / backfill table could not be parsed.
    #[error("table parse error: {0}")]
    TableParse(String),
    /// An input collection could not be read at all.
    #[error("source unavailable: {path}: {message}")]
    SourceUnavailable { path: String, message: String },
    /// An input collection was read but is not in the declared format.
    #[error("source '{source_name}' could not be parsed: {message}")]
    SourceParse { source_name: String, message: String },
}
