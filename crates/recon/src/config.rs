use std::path::{Path, PathBuf};

use countyjoin_core::JurisdictionScope;
use serde::Deserialize;

use crate::engine::EmptyJurisdictionPolicy;
use crate::error::ReconError;
use crate::model::Origin;
use crate::tables::Tables;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    /// Registry A collection.
    pub left: SourceConfig,
    /// Registry B collection.
    pub right: SourceConfig,
    /// Exception tables file. The shipped tables are used when omitted.
    #[serde(default)]
    pub tables: Option<String>,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub file: String,
    pub format: SourceFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// JSON records `{FIPS, CountyName, State}`.
    FipsJson,
    /// Census `national_county.txt`: `StateAbbr,StateFP,CountyFP,CountyName,ClassCode`.
    CensusCsv,
    /// JSON records `{Parent_State, County_Name: "Name, ST", County_Category_ID, ...}`.
    FredJson,
}

impl SourceFormat {
    /// The registry this format belongs to.
    pub fn registry(&self) -> Origin {
        match self {
            Self::FipsJson | Self::CensusCsv => Origin::A,
            Self::FredJson => Origin::B,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FipsJson => write!(f, "fips_json"),
            Self::CensusCsv => write!(f, "census_csv"),
            Self::FredJson => write!(f, "fred_json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub empty_jurisdiction: EmptyJurisdictionPolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for map / left_only / right_only files.
    #[serde(default)]
    pub dir: Option<String>,
    /// Jurisdictions kept in the left-only report.
    #[serde(default)]
    pub left_only_scope: JurisdictionScope,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        // Left must be registry A, right must be registry B
        if self.left.format.registry() != Origin::A {
            return Err(ReconError::ConfigValidation(format!(
                "left source must be a registry A format (fips_json, census_csv), got {}",
                self.left.format
            )));
        }
        if self.right.format.registry() != Origin::B {
            return Err(ReconError::ConfigValidation(format!(
                "right source must be a registry B format (fred_json), got {}",
                self.right.format
            )));
        }

        for (side, source) in [("left", &self.left), ("right", &self.right)] {
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{side}.file must not be empty")));
            }
        }

        Ok(())
    }

    /// Resolve a config-relative path against the config file's directory.
    pub fn resolve(&self, base_dir: &Path, file: &str) -> PathBuf {
        base_dir.join(file)
    }

    /// Load the configured exception tables, or the shipped ones.
    pub fn load_tables(&self, base_dir: &Path) -> Result<Tables, ReconError> {
        match &self.tables {
            Some(file) => Tables::load(&self.resolve(base_dir, file)),
            None => Tables::builtin(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "FIPS to FRED"

[left]
file = "county_fips.json"
format = "fips_json"

[right]
file = "fred_county_ids.json"
format = "fred_json"
"#;

    #[test]
    fn parse_valid_defaults() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "FIPS to FRED");
        assert_eq!(config.left.format, SourceFormat::FipsJson);
        assert_eq!(config.right.format, SourceFormat::FredJson);
        assert!(config.tables.is_none());
        assert_eq!(config.policy.empty_jurisdiction, EmptyJurisdictionPolicy::Match);
        assert_eq!(config.output.left_only_scope, JurisdictionScope::All);
        assert!(config.output.dir.is_none());
    }

    #[test]
    fn parse_full() {
        let input = format!(
            r#"{VALID}
tables = "tables.toml"

[policy]
empty_jurisdiction = "isolate"

[output]
dir = "out"
left_only_scope = "states"
"#
        );
        // `tables` after a table header belongs to [right]; put it first instead.
        assert!(ReconConfig::from_toml(&input).is_err());

        let input = format!(
            r#"tables = "tables.toml"
{VALID}
[policy]
empty_jurisdiction = "isolate"

[output]
dir = "out"
left_only_scope = "states"
"#
        );
        let config = ReconConfig::from_toml(&input).unwrap();
        assert_eq!(config.tables.as_deref(), Some("tables.toml"));
        assert_eq!(config.policy.empty_jurisdiction, EmptyJurisdictionPolicy::Isolate);
        assert_eq!(config.output.dir.as_deref(), Some("out"));
        assert_eq!(config.output.left_only_scope, JurisdictionScope::States);
    }

    #[test]
    fn census_csv_is_registry_a() {
        let input = VALID.replace("fips_json", "census_csv");
        let config = ReconConfig::from_toml(&input).unwrap();
        assert_eq!(config.left.format, SourceFormat::CensusCsv);
    }

    #[test]
    fn reject_swapped_sides() {
        let input = r#"
name = "Swapped"

[left]
file = "fred.json"
format = "fred_json"

[right]
file = "fips.json"
format = "fips_json"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("left source must be a registry A format"));
    }

    #[test]
    fn reject_empty_name() {
        let input = VALID.replace("FIPS to FRED", " ");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn reject_unknown_policy() {
        let input = format!("{VALID}\n[policy]\nempty_jurisdiction = \"merge\"\n");
        assert!(matches!(
            ReconConfig::from_toml(&input),
            Err(ReconError::ConfigParse(_))
        ));
    }

    #[test]
    fn reject_unknown_format() {
        let input = VALID.replace("fred_json", "fred_html");
        assert!(ReconConfig::from_toml(&input).is_err());
    }

    #[test]
    fn builtin_tables_when_unset() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        let tables = config.load_tables(Path::new(".")).unwrap();
        assert_eq!(tables.corrections.correct("Sitka City and Borough"), "Sitka");
    }
}
