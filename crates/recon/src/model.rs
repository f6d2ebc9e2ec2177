use std::collections::BTreeMap;

use countyjoin_core::JurisdictionScope;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which registry a record was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Registry A: the federal geographic code list (left side of the join).
    A,
    /// Registry B: the time-series provider's category tree (right side).
    B,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "a"),
            Self::B => write!(f, "b"),
        }
    }
}

/// One county-level entity as delivered by a registry.
///
/// `name` and `jurisdiction` are raw source values. An absent name never
/// matches anything; an absent or malformed jurisdiction is resolved by the
/// key builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: Option<String>,
    pub jurisdiction: Option<String>,
    pub origin: Origin,
    /// Remaining source columns, carried through to the outputs untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl EntityRecord {
    pub fn new(
        origin: Origin,
        id: impl Into<String>,
        name: Option<&str>,
        jurisdiction: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
            jurisdiction: jurisdiction.map(str::to_string),
            origin,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Join key
// ---------------------------------------------------------------------------

/// Composite key = (normalized name, jurisdiction).
///
/// `jurisdiction` is empty when it could not be determined. `name` is `None`
/// when the source had no name; such keys never compare equal during the join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JoinKey {
    pub name: Option<String>,
    pub jurisdiction: String,
}

impl std::fmt::Display for JoinKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.name.as_deref().unwrap_or("<none>"), self.jurisdiction)
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// A field-level defect found while keying a record. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyIssue {
    pub origin: Origin,
    /// Position of the record in its input collection.
    pub index: usize,
    pub id: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum IssueKind {
    /// No name in the source; the record cannot match.
    MissingName,
    /// No usable jurisdiction and no backfill entry; keyed with an empty code.
    UnknownJurisdiction,
    /// A jurisdiction was present but not two uppercase letters.
    InvalidJurisdiction { value: String },
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "missing_name"),
            Self::UnknownJurisdiction => write!(f, "unknown_jurisdiction"),
            Self::InvalidJurisdiction { .. } => write!(f, "invalid_jurisdiction"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair {
    pub key: JoinKey,
    #[serde(skip)]
    pub left_index: usize,
    #[serde(skip)]
    pub right_index: usize,
    pub left: EntityRecord,
    pub right: EntityRecord,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub left_records: usize,
    pub right_records: usize,
    pub matched_pairs: usize,
    /// Distinct left records that appear in at least one pair.
    pub matched_left: usize,
    /// Distinct right records that appear in at least one pair.
    pub matched_right: usize,
    pub left_only: usize,
    pub right_only: usize,
    pub backfilled: usize,
    pub issue_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub empty_jurisdiction: crate::engine::EmptyJurisdictionPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub matched: Vec<MatchedPair>,
    pub left_only: Vec<EntityRecord>,
    /// Input position of each `left_only` record.
    #[serde(skip)]
    pub left_only_index: Vec<usize>,
    pub right_only: Vec<EntityRecord>,
    pub issues: Vec<KeyIssue>,
}

/// One row of the left outer join: every left record, with its partner if any.
#[derive(Debug, Clone, Serialize)]
pub struct MapRow<'a> {
    pub left: &'a EntityRecord,
    pub right: Option<&'a EntityRecord>,
}

impl ReconciliationResult {
    /// Left outer join view in left input order. A left record with several
    /// partners yields one row per partner; an unmatched one yields a single
    /// row without a partner.
    pub fn left_join_rows(&self) -> Vec<MapRow<'_>> {
        let mut rows = Vec::with_capacity(self.matched.len() + self.left_only.len());
        let mut pairs = self.matched.iter().peekable();
        let mut unmatched = self.left_only_index.iter().zip(&self.left_only).peekable();

        loop {
            let next_pair = pairs.peek().map(|p| p.left_index);
            let next_unmatched = unmatched.peek().map(|(i, _)| **i);
            let take_unmatched = match (next_pair, next_unmatched) {
                (None, None) => break,
                (Some(p), Some(u)) => u < p,
                (None, Some(_)) => true,
                (Some(_), None) => false,
            };

            if take_unmatched {
                if let Some((_, left)) = unmatched.next() {
                    rows.push(MapRow { left, right: None });
                }
            } else if let Some(pair) = pairs.next() {
                rows.push(MapRow { left: &pair.left, right: Some(&pair.right) });
            }
        }
        rows
    }

    /// Unmatched left records whose source jurisdiction falls inside `scope`.
    pub fn left_only_in(&self, scope: JurisdictionScope) -> Vec<&EntityRecord> {
        self.left_only
            .iter()
            .filter(|r| match scope {
                JurisdictionScope::All => true,
                _ => r.jurisdiction.as_deref().is_some_and(|j| scope.admits(j)),
            })
            .collect()
    }
}
