use std::collections::BTreeMap;
use std::path::Path;

use countyjoin_core::Jurisdiction;
use serde::Deserialize;

use crate::error::ReconError;

/// Shipped correction + backfill tables. Versioned alongside the code but kept
/// out of it, so new aliases need no engine change.
pub const DEFAULT_TABLES_TOML: &str = include_str!("../tables/default.toml");

// ---------------------------------------------------------------------------
// Correction table
// ---------------------------------------------------------------------------

/// Alias spelling → canonical county name. Exact, case-sensitive lookup on the
/// raw (pre-normalization) name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CorrectionTable {
    entries: BTreeMap<String, String>,
}

impl CorrectionTable {
    /// Canonical name for `raw`, or `raw` itself on a miss.
    pub fn correct<'a>(&'a self, raw: &'a str) -> &'a str {
        self.entries.get(raw).map(String::as_str).unwrap_or(raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for CorrectionTable {
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(a, c)| (a.into(), c.into())).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Jurisdiction backfill
// ---------------------------------------------------------------------------

/// Corrected county name → jurisdiction, for records whose source text omits
/// the jurisdiction. Codes are validated when the table is loaded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct JurisdictionBackfill {
    entries: BTreeMap<String, Jurisdiction>,
}

impl JurisdictionBackfill {
    pub fn lookup(&self, corrected_name: &str) -> Option<&Jurisdiction> {
        self.entries.get(corrected_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Jurisdiction)> for JurisdictionBackfill {
    fn from_iter<I: IntoIterator<Item = (N, Jurisdiction)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, j)| (n.into(), j)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Both static exception tables, constructed once and passed to the engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tables {
    #[serde(default)]
    pub corrections: CorrectionTable,
    #[serde(default)]
    pub jurisdiction_backfill: JurisdictionBackfill,
}

impl Tables {
    pub fn new(corrections: CorrectionTable, jurisdiction_backfill: JurisdictionBackfill) -> Self {
        Self {
            corrections,
            jurisdiction_backfill,
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        toml::from_str(input).map_err(|e| ReconError::TableParse(e.to_string()))
    }

    /// The tables shipped in `tables/default.toml`.
    pub fn builtin() -> Result<Self, ReconError> {
        Self::from_toml(DEFAULT_TABLES_TOML)
    }

    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path).map_err(|e| ReconError::SourceUnavailable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let tables = Self::from_toml(&input)?;
        tracing::debug!(
            path = %path.display(),
            corrections = tables.corrections.len(),
            backfills = tables.jurisdiction_backfill.len(),
            "loaded exception tables"
        );
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_parse() {
        let tables = Tables::builtin().unwrap();
        assert_eq!(tables.corrections.correct("Juneau City and Borough"), "Juneau");
        assert_eq!(tables.corrections.correct("Anchorage Municipality"), "Anchorage");
        assert_eq!(tables.corrections.correct("Wrangell Borough/City"), "Wrangell");
        assert_eq!(tables.jurisdiction_backfill.lookup("Yakutat").unwrap().as_str(), "AK");
    }

    #[test]
    fn miss_returns_input() {
        let tables = Tables::builtin().unwrap();
        assert_eq!(tables.corrections.correct("Autauga County"), "Autauga County");
        assert!(tables.jurisdiction_backfill.lookup("Autauga County").is_none());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let tables = Tables::builtin().unwrap();
        assert_eq!(
            tables.corrections.correct("juneau city and borough"),
            "juneau city and borough"
        );
    }

    #[test]
    fn custom_tables() {
        let tables = Tables::from_toml(
            r#"
[corrections]
"Lagrange County" = "LaGrange County"

[jurisdiction_backfill]
"LaGrange County" = "IN"
"#,
        )
        .unwrap();
        assert_eq!(tables.corrections.len(), 1);
        assert_eq!(tables.corrections.correct("Lagrange County"), "LaGrange County");
        assert_eq!(
            tables.jurisdiction_backfill.lookup("LaGrange County").map(|j| j.as_str()),
            Some("IN")
        );
    }

    #[test]
    fn empty_document_is_empty_tables() {
        let tables = Tables::from_toml("").unwrap();
        assert!(tables.corrections.is_empty());
        assert!(tables.jurisdiction_backfill.is_empty());
    }

    #[test]
    fn reject_invalid_backfill_code() {
        let err = Tables::from_toml(
            r#"
[jurisdiction_backfill]
"Yakutat" = "Alaska"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid jurisdiction code"));
    }

    #[test]
    fn reject_unknown_section() {
        assert!(Tables::from_toml("[aliases]\n\"a\" = \"b\"\n").is_err());
    }

    #[test]
    fn load_missing_file_is_source_unavailable() {
        let err = Tables::load(Path::new("/nonexistent/tables.toml")).unwrap_err();
        assert!(matches!(err, ReconError::SourceUnavailable { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.toml");
        std::fs::write(
            &path,
            "[corrections]\n\"Dona Ana County\" = \"Do\u{f1}a Ana County\"\n",
        )
        .unwrap();

        let tables = Tables::load(&path).unwrap();
        assert_eq!(tables.corrections.correct("Dona Ana County"), "Do\u{f1}a Ana County");
        assert!(tables.jurisdiction_backfill.is_empty());
    }
}
