use countyjoin_core::Jurisdiction;
use serde::Serialize;

use crate::model::JoinKey;
use crate::normalize::normalize_opt;
use crate::tables::JurisdictionBackfill;

/// Where the jurisdiction component of a key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionSource {
    /// The record carried a well-formed code.
    Record,
    /// Supplied by the backfill table.
    Backfill,
    /// Not determinable; the key has an empty jurisdiction.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltKey {
    pub key: JoinKey,
    pub source: JurisdictionSource,
    /// The record's jurisdiction text when it was present but malformed.
    pub rejected_jurisdiction: Option<String>,
}

/// Builds composite join keys from already-corrected names.
#[derive(Debug, Clone, Copy)]
pub struct KeyBuilder<'t> {
    backfill: &'t JurisdictionBackfill,
}

impl<'t> KeyBuilder<'t> {
    pub fn new(backfill: &'t JurisdictionBackfill) -> Self {
        Self { backfill }
    }

    /// Key for `(corrected_name, jurisdiction)`.
    ///
    /// A jurisdiction is used only if it is two uppercase letters. Otherwise the
    /// backfill table is consulted by corrected name; failing that the key gets
    /// an empty jurisdiction so the record still takes part in the join.
    pub fn build(&self, corrected_name: Option<&str>, jurisdiction: Option<&str>) -> BuiltKey {
        let parsed = jurisdiction.and_then(Jurisdiction::parse);
        let rejected_jurisdiction = match (jurisdiction, &parsed) {
            (Some(raw), None) if !raw.trim().is_empty() => Some(raw.to_string()),
            _ => None,
        };

        let (code, source) = match parsed {
            Some(code) => (code.as_str().to_string(), JurisdictionSource::Record),
            None => match corrected_name.and_then(|n| self.backfill.lookup(n)) {
                Some(code) => (code.as_str().to_string(), JurisdictionSource::Backfill),
                None => (String::new(), JurisdictionSource::Unknown),
            },
        };

        BuiltKey {
            key: JoinKey {
                name: normalize_opt(corrected_name),
                jurisdiction: code,
            },
            source,
            rejected_jurisdiction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backfill() -> JurisdictionBackfill {
        [("Yakutat", Jurisdiction::parse("AK").unwrap())].into_iter().collect()
    }

    #[test]
    fn record_jurisdiction_used() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(Some("Autauga County"), Some("AL"));
        assert_eq!(built.key.name.as_deref(), Some("AUTAUGACOUNTY"));
        assert_eq!(built.key.jurisdiction, "AL");
        assert_eq!(built.source, JurisdictionSource::Record);
        assert!(built.rejected_jurisdiction.is_none());
    }

    #[test]
    fn record_jurisdiction_wins_over_backfill() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(Some("Yakutat"), Some("WA"));
        assert_eq!(built.key.jurisdiction, "WA");
        assert_eq!(built.source, JurisdictionSource::Record);
    }

    #[test]
    fn missing_jurisdiction_backfilled() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(Some("Yakutat"), None);
        assert_eq!(built.key.jurisdiction, "AK");
        assert_eq!(built.source, JurisdictionSource::Backfill);
    }

    #[test]
    fn malformed_jurisdiction_backfilled_and_reported() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(Some("Yakutat"), Some("ak"));
        assert_eq!(built.key.jurisdiction, "AK");
        assert_eq!(built.source, JurisdictionSource::Backfill);
        assert_eq!(built.rejected_jurisdiction.as_deref(), Some("ak"));
    }

    #[test]
    fn unknown_jurisdiction_keeps_empty_component() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(Some("Nowhere County"), None);
        assert_eq!(built.key.name.as_deref(), Some("NOWHERECOUNTY"));
        assert_eq!(built.key.jurisdiction, "");
        assert_eq!(built.source, JurisdictionSource::Unknown);
    }

    #[test]
    fn blank_jurisdiction_is_absent_not_rejected() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(Some("Kent County"), Some("  "));
        assert_eq!(built.source, JurisdictionSource::Unknown);
        assert!(built.rejected_jurisdiction.is_none());
    }

    #[test]
    fn backfill_is_keyed_by_corrected_name_exactly() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(Some("YAKUTAT"), None);
        assert_eq!(built.source, JurisdictionSource::Unknown);
    }

    #[test]
    fn absent_name_gives_sentinel_key() {
        let bf = backfill();
        let built = KeyBuilder::new(&bf).build(None, Some("TX"));
        assert_eq!(built.key.name, None);
        assert_eq!(built.key.jurisdiction, "TX");
    }
}
