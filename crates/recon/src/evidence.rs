use std::collections::{BTreeMap, BTreeSet};

use crate::model::{KeyIssue, MatchedPair, ReconSummary};

/// Compute summary statistics from the partitions of a run.
pub fn compute_summary(
    left_records: usize,
    right_records: usize,
    matched: &[MatchedPair],
    left_only: usize,
    right_only: usize,
    backfilled: usize,
    issues: &[KeyIssue],
) -> ReconSummary {
    let matched_left: BTreeSet<usize> = matched.iter().map(|p| p.left_index).collect();
    let matched_right: BTreeSet<usize> = matched.iter().map(|p| p.right_index).collect();

    let mut issue_counts: BTreeMap<String, usize> = BTreeMap::new();
    for issue in issues {
        *issue_counts.entry(issue.kind.to_string()).or_insert(0) += 1;
    }

    ReconSummary {
        left_records,
        right_records,
        matched_pairs: matched.len(),
        matched_left: matched_left.len(),
        matched_right: matched_right.len(),
        left_only,
        right_only,
        backfilled,
        issue_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityRecord, IssueKind, JoinKey, Origin};

    fn pair(li: usize, ri: usize) -> MatchedPair {
        MatchedPair {
            key: JoinKey {
                name: Some("K".into()),
                jurisdiction: "DE".into(),
            },
            left_index: li,
            right_index: ri,
            left: EntityRecord::new(Origin::A, format!("l{li}"), Some("k"), Some("DE")),
            right: EntityRecord::new(Origin::B, format!("r{ri}"), Some("k"), Some("DE")),
        }
    }

    fn issue(kind: IssueKind) -> KeyIssue {
        KeyIssue {
            origin: Origin::B,
            index: 0,
            id: "x".into(),
            kind,
        }
    }

    #[test]
    fn summary_counts() {
        let matched = vec![pair(0, 0), pair(0, 1), pair(1, 0)];
        let issues = vec![
            issue(IssueKind::UnknownJurisdiction),
            issue(IssueKind::UnknownJurisdiction),
            issue(IssueKind::MissingName),
        ];
        let summary = compute_summary(3, 4, &matched, 1, 2, 1, &issues);
        assert_eq!(summary.left_records, 3);
        assert_eq!(summary.right_records, 4);
        assert_eq!(summary.matched_pairs, 3);
        assert_eq!(summary.matched_left, 2);
        assert_eq!(summary.matched_right, 2);
        assert_eq!(summary.left_only, 1);
        assert_eq!(summary.right_only, 2);
        assert_eq!(summary.backfilled, 1);
        assert_eq!(summary.issue_counts["unknown_jurisdiction"], 2);
        assert_eq!(summary.issue_counts["missing_name"], 1);
    }
}
