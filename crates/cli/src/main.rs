// cjoin - county entity reconciliation and series archiving

mod exit_codes;
mod logging;
mod recon;
mod series;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use countyjoin_core::JurisdictionScope;
use countyjoin_recon::ReconError;
use countyjoin_series::SeriesError;

use exit_codes::{
    EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_PERSISTENCE, EXIT_SOURCE_UNAVAILABLE, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "cjoin")]
#[command(about = "Reconcile county registries and archive per-county series")]
#[command(version)]
struct Cli {
    /// Debug-level logs on stderr
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors on stderr
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile two county collections from a .recon.toml config
    #[command(after_help = "\
Examples:
  cjoin match fips-fred.recon.toml
  cjoin match fips-fred.recon.toml --out-dir out/
  cjoin match fips-fred.recon.toml --json > result.json
  cjoin match fips-fred.recon.toml --strict")]
    Match {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Directory for map.json, left_only.json, right_only.json and summary.json
        /// (overrides [output] dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print the full result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Exit 3 when left-only (in scope) or right-only records remain
        #[arg(long)]
        strict: bool,
    },

    /// Validate a recon config and its tables without running
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Print the canonical measure of series titles
    #[command(after_help = "\
Examples:
  cjoin canon 'Unemployment Rate in Autauga County, AL'
  cut -f3 series.tsv | cjoin canon")]
    Canon {
        /// Titles to canonicalize (omit to read one per line from stdin)
        titles: Vec<String>,
    },

    /// Group series listings into one <ST>_series.json shard per state
    #[command(after_help = "\
Examples:
  cjoin group fred_county_series.json --out-dir shards/
  cjoin group fred_county_series.json --out-dir shards/ --json")]
    Group {
        /// Listings file: [{FIPS, County_Name, State, series: [{id, title, units}]}]
        listings: PathBuf,

        /// Directory for the shard files
        #[arg(long)]
        out_dir: PathBuf,

        /// Print the grouping report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Merge shard files into one archive, then remove the merged shards
    #[command(after_help = "\
Examples:
  cjoin consolidate shards/
  cjoin consolidate shards/ --archive all_counties.json --scope all
  cjoin consolidate shards/ --keep-shards --json")]
    Consolidate {
        /// Directory holding <ST>_series.json shards
        dir: PathBuf,

        /// Archive file name inside the directory
        #[arg(long, default_value = countyjoin_series::store::DEFAULT_ARCHIVE_NAME)]
        archive: String,

        /// Shard keys admitted into the archive
        #[arg(long, value_enum, default_value_t = ScopeArg::StatesAndDc)]
        scope: ScopeArg,

        /// Leave shard files in place after writing the archive
        #[arg(long)]
        keep_shards: bool,

        /// Print the finalize report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    All,
    States,
    StatesAndDc,
}

impl From<ScopeArg> for JurisdictionScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::All => JurisdictionScope::All,
            ScopeArg::States => JurisdictionScope::States,
            ScopeArg::StatesAndDc => JurisdictionScope::StatesAndDc,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Match { config, out_dir, json, strict } => {
            recon::cmd_match(config, out_dir, json, strict)
        }
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Canon { titles } => series::cmd_canon(titles),
        Commands::Group { listings, out_dir, json } => series::cmd_group(listings, out_dir, json),
        Commands::Consolidate { dir, archive, scope, keep_shards, json } => {
            series::cmd_consolidate(dir, archive, scope.into(), keep_shards, json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PERSISTENCE, msg)
    }

    /// Map a reconciliation error to its exit code.
    pub fn recon(err: ReconError) -> Self {
        let (code, hint) = match &err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                (EXIT_INVALID_CONFIG, Some("run `cjoin validate <config>` for details"))
            }
            ReconError::TableParse(_) => (
                EXIT_INVALID_CONFIG,
                Some("tables need [corrections] and [jurisdiction_backfill] string tables"),
            ),
            ReconError::SourceUnavailable { .. } => {
                (EXIT_SOURCE_UNAVAILABLE, Some("source paths resolve relative to the config file"))
            }
            ReconError::SourceParse { .. } => (EXIT_SOURCE_UNAVAILABLE, None),
        };
        Self { code, message: err.to_string(), hint: hint.map(str::to_string) }
    }

    /// Map a series error to its exit code.
    pub fn series(err: SeriesError) -> Self {
        let (code, hint) = match &err {
            SeriesError::SourceUnavailable { .. } | SeriesError::Parse { .. } => {
                (EXIT_SOURCE_UNAVAILABLE, None)
            }
            SeriesError::Persistence { .. } => {
                (EXIT_PERSISTENCE, Some("no shard was removed; fix the target and rerun"))
            }
            SeriesError::Retire { .. } => (EXIT_PERSISTENCE, None),
            SeriesError::DuplicateShard(_) => (EXIT_ERROR, None),
            SeriesError::InvalidArchiveName { .. } => {
                (EXIT_USAGE, Some("--archive takes a plain file name not ending in _series.json"))
            }
        };
        Self { code, message: err.to_string(), hint: hint.map(str::to_string) }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
