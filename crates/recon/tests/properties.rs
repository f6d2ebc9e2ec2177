// Property-based tests for normalization and the join partitions.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeMap;

use countyjoin_recon::model::{EntityRecord, Origin};
use countyjoin_recon::{normalize, EmptyJurisdictionPolicy, Reconciler, Tables};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small name pool with spelling variants so keys collide often.
fn arb_name() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        8 => prop::sample::select(vec![
            "Kent County",
            "KENT COUNTY",
            "Kent-County",
            "St. Mary's County",
            "ST MARYS COUNTY",
            "Juneau City and Borough",
            "Juneau",
            "Yakutat City and Borough",
            "Orphan County",
        ])
        .prop_map(|s| Some(s.to_string())),
        1 => Just(None),
    ]
}

fn arb_jurisdiction() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        6 => prop::sample::select(vec!["AK", "DE", "MD"]).prop_map(|s| Some(s.to_string())),
        1 => Just(None),
        1 => Just(Some("md".to_string())),
    ]
}

fn arb_records(origin: Origin, prefix: &'static str) -> impl Strategy<Value = Vec<EntityRecord>> {
    prop::collection::vec((arb_name(), arb_jurisdiction()), 0..24).prop_map(move |rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, st))| {
                EntityRecord::new(origin, format!("{prefix}{i}"), name.as_deref(), st.as_deref())
            })
            .collect()
    })
}

fn arb_policy() -> impl Strategy<Value = EmptyJurisdictionPolicy> {
    prop_oneof![
        Just(EmptyJurisdictionPolicy::Match),
        Just(EmptyJurisdictionPolicy::Isolate),
    ]
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn normalize_is_idempotent(s in any::<String>()) {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_ignores_ascii_case_and_punctuation(s in "[A-Za-z0-9 .,'/-]{0,40}") {
        prop_assert_eq!(normalize(&s.to_ascii_uppercase()), normalize(&s.to_ascii_lowercase()));
        let stripped: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        prop_assert_eq!(normalize(&s), stripped.to_ascii_uppercase());
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn every_record_lands_in_exactly_one_partition(
        left in arb_records(Origin::A, "l"),
        right in arb_records(Origin::B, "r"),
        policy in arb_policy(),
    ) {
        let tables = Tables::builtin().unwrap();
        let result = Reconciler::new(&tables).with_policy(policy).reconcile(&left, &right);

        let mut left_seen: BTreeMap<&str, (bool, usize)> = BTreeMap::new();
        for p in &result.matched {
            left_seen.entry(p.left.id.as_str()).or_default().0 = true;
        }
        for r in &result.left_only {
            left_seen.entry(r.id.as_str()).or_default().1 += 1;
        }
        prop_assert_eq!(left_seen.len(), left.len());
        for (id, (in_pair, only)) in &left_seen {
            prop_assert!(
                (*in_pair && *only == 0) || (!*in_pair && *only == 1),
                "left {} in_pair={} left_only={}", id, in_pair, only
            );
        }

        let mut right_seen: BTreeMap<&str, (bool, usize)> = BTreeMap::new();
        for p in &result.matched {
            right_seen.entry(p.right.id.as_str()).or_default().0 = true;
        }
        for r in &result.right_only {
            right_seen.entry(r.id.as_str()).or_default().1 += 1;
        }
        prop_assert_eq!(right_seen.len(), right.len());
        for (id, (in_pair, only)) in &right_seen {
            prop_assert!(
                (*in_pair && *only == 0) || (!*in_pair && *only == 1),
                "right {} in_pair={} right_only={}", id, in_pair, only
            );
        }

        prop_assert_eq!(result.summary.matched_left + result.left_only.len(), left.len());
        prop_assert_eq!(result.summary.matched_right + result.right_only.len(), right.len());
    }

    #[test]
    fn pairs_are_the_full_cross_product_per_key(
        left in arb_records(Origin::A, "l"),
        right in arb_records(Origin::B, "r"),
    ) {
        let tables = Tables::builtin().unwrap();
        let reconciler = Reconciler::new(&tables);
        let result = reconciler.reconcile(&left, &right);

        let mut expected = 0;
        for l in &left {
            let lk = reconciler.key_for(l).key;
            if lk.name.is_none() {
                continue;
            }
            expected += right.iter().filter(|r| reconciler.key_for(r).key == lk).count();
        }
        prop_assert_eq!(result.matched.len(), expected);
        for p in &result.matched {
            prop_assert_eq!(&reconciler.key_for(&p.left).key, &p.key);
            prop_assert_eq!(&reconciler.key_for(&p.right).key, &p.key);
        }
    }

    #[test]
    fn repeated_runs_are_identical(
        left in arb_records(Origin::A, "l"),
        right in arb_records(Origin::B, "r"),
    ) {
        let tables = Tables::builtin().unwrap();
        let first = Reconciler::new(&tables).reconcile(&left, &right);
        let second = Reconciler::new(&tables).reconcile(&left, &right);

        let pairs = |r: &countyjoin_recon::ReconciliationResult| -> Vec<(String, String)> {
            r.matched.iter().map(|p| (p.left.id.clone(), p.right.id.clone())).collect()
        };
        prop_assert_eq!(pairs(&first), pairs(&second));
        prop_assert_eq!(&first.left_only, &second.left_only);
        prop_assert_eq!(&first.right_only, &second.right_only);
        prop_assert_eq!(first.issues, second.issues);
    }
}
