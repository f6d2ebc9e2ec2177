//! Series listings: `[{FIPS, County_Name, State, series: [{id, title, units}]}]`.

use std::path::Path;

use countyjoin_core::Jurisdiction;
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;
use crate::model::RawSeriesRecord;

#[derive(Debug, Deserialize)]
struct CountyListing {
    #[serde(rename = "FIPS", default)]
    fips: Option<String>,
    #[serde(rename = "County_Name", default)]
    county_name: Option<String>,
    #[serde(rename = "State", default)]
    state: Option<String>,
    #[serde(default)]
    series: Vec<SeriesListing>,
}

#[derive(Debug, Deserialize)]
struct SeriesListing {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    units: Option<String>,
}

/// Listings flattened to shard-keyed records.
#[derive(Debug, Default)]
pub struct Listings {
    pub records: Vec<(Jurisdiction, RawSeriesRecord)>,
    /// Counties whose `State` is missing or malformed; their series are not loaded.
    pub rejected_counties: Vec<RejectedCounty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedCounty {
    pub index: usize,
    pub entity_id: String,
    pub state: Option<String>,
    pub series: usize,
}

pub fn load_listings(path: &Path) -> Result<Listings, SeriesError> {
    let data = std::fs::read_to_string(path).map_err(|e| SeriesError::SourceUnavailable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let listings = parse_listings(&path.display().to_string(), &data)?;
    tracing::info!(
        path = %path.display(),
        records = listings.records.len(),
        rejected_counties = listings.rejected_counties.len(),
        "loaded series listings"
    );
    Ok(listings)
}

pub fn parse_listings(location: &str, data: &str) -> Result<Listings, SeriesError> {
    let counties: Vec<CountyListing> = serde_json::from_str(data).map_err(|e| SeriesError::Parse {
        location: location.to_string(),
        message: e.to_string(),
    })?;

    let mut out = Listings::default();
    for (index, county) in counties.into_iter().enumerate() {
        let entity_id = county.fips.unwrap_or_default();
        let Some(key) = county.state.as_deref().and_then(Jurisdiction::parse) else {
            tracing::warn!(index, entity_id = %entity_id, state = ?county.state, "county has no usable state; skipped");
            out.rejected_counties.push(RejectedCounty {
                index,
                entity_id,
                state: county.state,
                series: county.series.len(),
            });
            continue;
        };

        for series in county.series {
            out.records.push((
                key.clone(),
                RawSeriesRecord {
                    entity_id: entity_id.clone(),
                    entity_name: county.county_name.clone(),
                    measurement_id: series.id,
                    units: series.units,
                    raw_title: series.title,
                },
            ));
        }
    }

    Ok(out)
}
