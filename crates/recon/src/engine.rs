use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::compute_summary;
use crate::key::{BuiltKey, JurisdictionSource, KeyBuilder};
use crate::model::{
    EntityRecord, IssueKind, JoinKey, KeyIssue, MatchedPair, Origin, ReconMeta,
    ReconciliationResult,
};
use crate::tables::Tables;

/// How keys with an empty jurisdiction component take part in the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyJurisdictionPolicy {
    /// Compare them like any other key: same name + both empty ⇒ match.
    #[default]
    Match,
    /// Never match them; they always land in `left_only` / `right_only`.
    Isolate,
}

impl std::fmt::Display for EmptyJurisdictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::Isolate => write!(f, "isolate"),
        }
    }
}

/// Reconciliation engine bound to a set of exception tables.
pub struct Reconciler<'t> {
    tables: &'t Tables,
    policy: EmptyJurisdictionPolicy,
    name: String,
}

impl<'t> Reconciler<'t> {
    pub fn new(tables: &'t Tables) -> Self {
        Self {
            tables,
            policy: EmptyJurisdictionPolicy::default(),
            name: "adhoc".into(),
        }
    }

    pub fn with_policy(mut self, policy: EmptyJurisdictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Name recorded in the result metadata.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Correct the raw name, then build the composite key.
    pub fn key_for(&self, record: &EntityRecord) -> BuiltKey {
        let corrected = record
            .name
            .as_deref()
            .map(|raw| self.tables.corrections.correct(raw));
        KeyBuilder::new(&self.tables.jurisdiction_backfill)
            .build(corrected, record.jurisdiction.as_deref())
    }

    /// Full outer equi-join of `left` and `right` on their join keys.
    ///
    /// Multiplicity is preserved: every left record is paired with every right
    /// record sharing its key. Pairs follow left input order, then right input
    /// order; the unmatched partitions keep input order.
    pub fn reconcile(&self, left: &[EntityRecord], right: &[EntityRecord]) -> ReconciliationResult {
        let mut issues = Vec::new();
        let mut backfilled = 0;
        let left_keys = self.keys_for(left, Origin::A, &mut issues, &mut backfilled);
        let right_keys = self.keys_for(right, Origin::B, &mut issues, &mut backfilled);

        let mut right_index: BTreeMap<&JoinKey, Vec<usize>> = BTreeMap::new();
        for (ri, key) in right_keys.iter().enumerate() {
            if self.joinable(key) {
                right_index.entry(key).or_default().push(ri);
            }
        }

        let mut right_matched = vec![false; right.len()];
        let mut matched = Vec::new();
        let mut left_only = Vec::new();
        let mut left_only_index = Vec::new();

        for (li, (record, key)) in left.iter().zip(&left_keys).enumerate() {
            let partners = if self.joinable(key) {
                right_index.get(key)
            } else {
                None
            };

            match partners {
                Some(indices) => {
                    for &ri in indices {
                        right_matched[ri] = true;
                        matched.push(MatchedPair {
                            key: key.clone(),
                            left_index: li,
                            right_index: ri,
                            left: record.clone(),
                            right: right[ri].clone(),
                        });
                    }
                }
                None => {
                    left_only.push(record.clone());
                    left_only_index.push(li);
                }
            }
        }

        let right_only: Vec<EntityRecord> = right
            .iter()
            .zip(&right_matched)
            .filter(|(_, m)| !**m)
            .map(|(r, _)| r.clone())
            .collect();

        let summary = compute_summary(
            left.len(),
            right.len(),
            &matched,
            left_only.len(),
            right_only.len(),
            backfilled,
            &issues,
        );

        tracing::info!(
            config = %self.name,
            matched_pairs = summary.matched_pairs,
            left_only = summary.left_only,
            right_only = summary.right_only,
            issues = issues.len(),
            "reconciliation complete"
        );

        ReconciliationResult {
            meta: ReconMeta {
                config_name: self.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                empty_jurisdiction: self.policy,
            },
            summary,
            matched,
            left_only,
            left_only_index,
            right_only,
            issues,
        }
    }

    fn joinable(&self, key: &JoinKey) -> bool {
        key.name.is_some()
            && (self.policy == EmptyJurisdictionPolicy::Match || !key.jurisdiction.is_empty())
    }

    fn keys_for(
        &self,
        records: &[EntityRecord],
        origin: Origin,
        issues: &mut Vec<KeyIssue>,
        backfilled: &mut usize,
    ) -> Vec<JoinKey> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                if record.origin != origin {
                    tracing::warn!(
                        id = %record.id,
                        expected = %origin,
                        found = %record.origin,
                        "record origin does not match its collection"
                    );
                }

                let built = self.key_for(record);
                let mut report = |kind: IssueKind| {
                    tracing::warn!(origin = %origin, index, id = %record.id, issue = %kind, "record defect");
                    issues.push(KeyIssue {
                        origin,
                        index,
                        id: record.id.clone(),
                        kind,
                    });
                };

                if built.key.name.is_none() {
                    report(IssueKind::MissingName);
                }
                if let Some(value) = built.rejected_jurisdiction.clone() {
                    report(IssueKind::InvalidJurisdiction { value });
                }
                match built.source {
                    JurisdictionSource::Record => {}
                    JurisdictionSource::Backfill => {
                        *backfilled += 1;
                        tracing::debug!(id = %record.id, key = %built.key, "jurisdiction backfilled");
                    }
                    JurisdictionSource::Unknown => report(IssueKind::UnknownJurisdiction),
                }

                built.key
            })
            .collect()
    }
}

/// Reconcile with the default policy.
pub fn reconcile(
    tables: &Tables,
    left: &[EntityRecord],
    right: &[EntityRecord],
) -> ReconciliationResult {
    Reconciler::new(tables).reconcile(left, right)
}
