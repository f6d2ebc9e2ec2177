//! Loaders for the registry file formats named in [`SourceFormat`].

use std::path::Path;

use serde::Deserialize;

use crate::config::SourceFormat;
use crate::error::ReconError;
use crate::model::{EntityRecord, Origin};

/// A code column that some exports write as a string and others as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CodeValue {
    Text(String),
    Number(u64),
}

impl CodeValue {
    fn into_string(self, pad: usize) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => format!("{n:0pad$}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FipsRow {
    #[serde(rename = "FIPS", default)]
    fips: Option<CodeValue>,
    #[serde(rename = "CountyName", default)]
    county_name: Option<String>,
    #[serde(rename = "State", default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FredRow {
    #[serde(rename = "Parent_State", default)]
    parent_state: Option<String>,
    #[serde(rename = "County_Name", default)]
    county_name: Option<String>,
    #[serde(rename = "County_Category_ID", default)]
    category_id: Option<CodeValue>,
    #[serde(rename = "Series_Count", default)]
    series_count: Option<CodeValue>,
    #[serde(rename = "FRED_URL", default)]
    url: Option<String>,
}

/// Read and parse one source file. A missing or unreadable file is
/// [`ReconError::SourceUnavailable`].
pub fn load_source(path: &Path, format: SourceFormat) -> Result<Vec<EntityRecord>, ReconError> {
    let data = std::fs::read_to_string(path).map_err(|e| ReconError::SourceUnavailable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let records = load_entities(&path.display().to_string(), &data, format)?;
    tracing::info!(path = %path.display(), %format, records = records.len(), "loaded source");
    Ok(records)
}

/// Parse `data` in the given format.
pub fn load_entities(
    source_name: &str,
    data: &str,
    format: SourceFormat,
) -> Result<Vec<EntityRecord>, ReconError> {
    match format {
        SourceFormat::FipsJson => load_fips_json(source_name, data),
        SourceFormat::CensusCsv => load_census_csv(source_name, data),
        SourceFormat::FredJson => load_fred_json(source_name, data),
    }
}

fn parse_error(source_name: &str, e: impl std::fmt::Display) -> ReconError {
    ReconError::SourceParse {
        source_name: source_name.into(),
        message: e.to_string(),
    }
}

fn load_fips_json(source_name: &str, data: &str) -> Result<Vec<EntityRecord>, ReconError> {
    let rows: Vec<FipsRow> = serde_json::from_str(data).map_err(|e| parse_error(source_name, e))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.fips.map(|c| c.into_string(5)).unwrap_or_default();
            EntityRecord::new(
                Origin::A,
                id,
                row.county_name.as_deref().map(str::trim),
                row.state.as_deref().map(str::trim),
            )
        })
        .collect())
}

fn load_census_csv(source_name: &str, data: &str) -> Result<Vec<EntityRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| parse_error(source_name, e))?;
        let field = |i: usize| row.get(i).map(str::trim).filter(|s| !s.is_empty());

        let id = format!("{}{}", field(1).unwrap_or(""), field(2).unwrap_or(""));
        let mut record = EntityRecord::new(Origin::A, id, field(3), field(0));
        if let Some(class_code) = field(4) {
            record = record.with_attribute("class_code", class_code);
        }
        records.push(record);
    }

    Ok(records)
}

fn load_fred_json(source_name: &str, data: &str) -> Result<Vec<EntityRecord>, ReconError> {
    let rows: Vec<FredRow> = serde_json::from_str(data).map_err(|e| parse_error(source_name, e))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.category_id.map(|c| c.into_string(0)).unwrap_or_default();
            let (name, jurisdiction) = match row.county_name.as_deref() {
                Some(display) => split_display_name(display),
                None => (None, None),
            };

            let mut record = EntityRecord::new(Origin::B, id, name, jurisdiction);
            if let Some(display) = row.county_name {
                record = record.with_attribute("display_name", display);
            }
            if let Some(parent) = row.parent_state {
                record = record.with_attribute("parent_state", parent);
            }
            if let Some(count) = row.series_count {
                record = record.with_attribute("series_count", count.into_string(0));
            }
            if let Some(url) = row.url {
                record = record.with_attribute("url", url);
            }
            record
        })
        .collect())
}

/// Split a category title such as `"Autauga County, AL"` into its name (text
/// before the first comma) and trailing two-letter code (after the last comma).
/// A title without that suffix yields no jurisdiction.
pub fn split_display_name(display: &str) -> (Option<&str>, Option<&str>) {
    let name = display.split(',').next().map(str::trim);

    let jurisdiction = display
        .rsplit_once(',')
        .map(|(_, suffix)| suffix.trim_start())
        .filter(|code| code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()));

    (name, jurisdiction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_standard_title() {
        assert_eq!(
            split_display_name("Autauga County, AL"),
            (Some("Autauga County"), Some("AL"))
        );
        assert_eq!(
            split_display_name("Anchorage Borough/municipality,AK"),
            (Some("Anchorage Borough/municipality"), Some("AK"))
        );
    }

    #[test]
    fn split_without_separator() {
        assert_eq!(
            split_display_name("Yakutat City and Borough"),
            (Some("Yakutat City and Borough"), None)
        );
    }

    #[test]
    fn split_rejects_non_code_suffix() {
        assert_eq!(split_display_name("Kent County, Del."), (Some("Kent County"), None));
        assert_eq!(split_display_name("Kent County, DE "), (Some("Kent County"), None));
        assert_eq!(split_display_name("Kent County, de"), (Some("Kent County"), None));
    }

    #[test]
    fn fips_json_rows() {
        let data = r#"[
            {"FIPS": "01001", "CountyName": "Autauga County", "State": "AL"},
            {"FIPS": 2110, "CountyName": " Juneau City and Borough ", "State": "AK"},
            {"FIPS": "72001", "CountyName": null, "State": "PR"}
        ]"#;
        let records = load_entities("fips", data, SourceFormat::FipsJson).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "01001");
        assert_eq!(records[1].id, "02110");
        assert_eq!(records[1].name.as_deref(), Some("Juneau City and Borough"));
        assert_eq!(records[2].name, None);
        assert!(records.iter().all(|r| r.origin == Origin::A));
    }

    #[test]
    fn census_csv_rows() {
        let data = "\
AL,01,001,Autauga County,H1
AK,02,110,Juneau City and Borough,H6
DC,11,001,District of Columbia
";
        let records = load_entities("census", data, SourceFormat::CensusCsv).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "01001");
        assert_eq!(records[0].jurisdiction.as_deref(), Some("AL"));
        assert_eq!(records[0].attributes["class_code"], "H1");
        assert_eq!(records[1].name.as_deref(), Some("Juneau City and Borough"));
        assert!(records[2].attributes.is_empty());
    }

    #[test]
    fn fred_json_rows() {
        let data = r#"[
            {"Parent_State": "Alabama", "County_Name": "Autauga County, AL",
             "County_Category_ID": "27335", "Series_Count": "412",
             "FRED_URL": "https://fred.stlouisfed.org/categories/27335"},
            {"Parent_State": "Alaska", "County_Name": "Yakutat City and Borough",
             "County_Category_ID": 27411, "Series_Count": null, "FRED_URL": null}
        ]"#;
        let records = load_entities("fred", data, SourceFormat::FredJson).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "27335");
        assert_eq!(records[0].name.as_deref(), Some("Autauga County"));
        assert_eq!(records[0].jurisdiction.as_deref(), Some("AL"));
        assert_eq!(records[0].attributes["series_count"], "412");
        assert_eq!(records[0].attributes["display_name"], "Autauga County, AL");
        assert_eq!(records[1].id, "27411");
        assert_eq!(records[1].jurisdiction, None);
        assert!(!records[1].attributes.contains_key("url"));
        assert!(records.iter().all(|r| r.origin == Origin::B));
    }

    #[test]
    fn malformed_json_is_source_parse() {
        let err = load_entities("fred", "{not json", SourceFormat::FredJson).unwrap_err();
        assert!(matches!(err, ReconError::SourceParse { .. }));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = load_source(Path::new("/nonexistent/fips.json"), SourceFormat::FipsJson).unwrap_err();
        assert!(matches!(err, ReconError::SourceUnavailable { .. }));
    }
}
