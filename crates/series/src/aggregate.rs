use std::collections::BTreeMap;

use countyjoin_core::Jurisdiction;
use serde::Serialize;

use crate::model::{RawSeriesRecord, SeriesGroup, SeriesRecord};

/// A record excluded from grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedSeries {
    /// Position in the input the record was aggregated from.
    pub index: usize,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingTitle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub group: SeriesGroup,
    pub rejected: Vec<RejectedSeries>,
}

/// Group records by canonical title. Records without a usable title are
/// rejected one by one; the rest are unaffected.
pub fn aggregate(records: &[RawSeriesRecord]) -> Aggregation {
    let mut out = Aggregation::default();

    for (index, raw) in records.iter().enumerate() {
        match SeriesRecord::from_raw(raw) {
            Some(record) => out.group.push(record),
            None => {
                tracing::warn!(
                    index,
                    entity_id = %raw.entity_id,
                    measurement_id = raw.measurement_id.as_deref().unwrap_or(""),
                    "series record has no title; skipped"
                );
                out.rejected.push(RejectedSeries {
                    index,
                    entity_id: raw.entity_id.clone(),
                    measurement_id: raw.measurement_id.clone(),
                    reason: RejectReason::MissingTitle,
                });
            }
        }
    }

    tracing::debug!(
        titles = out.group.len(),
        records = out.group.record_count(),
        rejected = out.rejected.len(),
        "aggregated series"
    );
    out
}

/// Partition keyed records per shard and aggregate each shard on its own.
///
/// Input order is kept within a shard; rejected indexes are positions within
/// that shard's records.
pub fn shard<I>(records: I) -> BTreeMap<Jurisdiction, Aggregation>
where
    I: IntoIterator<Item = (Jurisdiction, RawSeriesRecord)>,
{
    let mut partitions: BTreeMap<Jurisdiction, Vec<RawSeriesRecord>> = BTreeMap::new();
    for (key, record) in records {
        partitions.entry(key).or_default().push(record);
    }

    partitions
        .into_iter()
        .map(|(key, records)| {
            let aggregation = aggregate(&records);
            (key, aggregation)
        })
        .collect()
}
