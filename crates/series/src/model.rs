use std::collections::{BTreeMap, HashMap};
use std::fmt;

use countyjoin_core::Jurisdiction;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SeriesError;
use crate::title::canonicalize;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A series as listed by the source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSeriesRecord {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_title: Option<String>,
}

/// A series with a usable title.
///
/// `canonical_title` is the key of the group the record lives in and is not
/// written out; reading a [`SeriesGroup`] re-derives it from `raw_title` and
/// rejects a record filed under any other key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(skip)]
    pub canonical_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    pub raw_title: String,
}

impl SeriesRecord {
    /// Validate a raw record. Returns `None` when the title is missing or blank.
    pub fn from_raw(raw: &RawSeriesRecord) -> Option<Self> {
        let raw_title = raw.raw_title.as_deref().filter(|t| !t.trim().is_empty())?;
        Some(Self {
            entity_id: raw.entity_id.clone(),
            entity_name: raw.entity_name.clone(),
            canonical_title: canonicalize(raw_title),
            measurement_id: raw.measurement_id.clone(),
            units: raw.units.clone(),
            raw_title: raw_title.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// SeriesGroup
// ---------------------------------------------------------------------------

/// Records grouped by canonical title, in first-seen title order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesGroup {
    titles: Vec<(String, Vec<SeriesRecord>)>,
    index: HashMap<String, usize>,
}

impl SeriesGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under its `canonical_title`.
    pub fn push(&mut self, record: SeriesRecord) {
        match self.index.get(&record.canonical_title) {
            Some(&i) => self.titles[i].1.push(record),
            None => {
                self.index.insert(record.canonical_title.clone(), self.titles.len());
                self.titles.push((record.canonical_title.clone(), vec![record]));
            }
        }
    }

    pub fn get(&self, title: &str) -> Option<&[SeriesRecord]> {
        self.index.get(title).map(|&i| self.titles[i].1.as_slice())
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(|(t, _)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SeriesRecord])> {
        self.titles.iter().map(|(t, r)| (t.as_str(), r.as_slice()))
    }

    /// Number of distinct titles.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.titles.iter().map(|(_, r)| r.len()).sum()
    }
}

impl Serialize for SeriesGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.titles.len()))?;
        for (title, records) in &self.titles {
            map.serialize_entry(title, records)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeriesGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupVisitor;

        impl<'de> Visitor<'de> for GroupVisitor {
            type Value = SeriesGroup;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of canonical title to series records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SeriesGroup, A::Error> {
                let mut group = SeriesGroup::new();
                while let Some((title, records)) =
                    access.next_entry::<String, Vec<SeriesRecord>>()?
                {
                    for mut record in records {
                        let derived = canonicalize(&record.raw_title);
                        if derived != title {
                            return Err(de::Error::custom(format_args!(
                                "series '{}' is filed under '{title}' but its title canonicalizes to '{derived}'",
                                record.entity_id
                            )));
                        }
                        record.canonical_title = derived;
                        group.push(record);
                    }
                }
                Ok(group)
            }
        }

        deserializer.deserialize_map(GroupVisitor)
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Per-shard groups keyed by jurisdiction. Keys serialize sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Archive {
    shards: BTreeMap<Jurisdiction, SeriesGroup>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an archive from shard outputs. Titles are never merged across
    /// shards; a repeated key is [`SeriesError::DuplicateShard`].
    pub fn from_shards<I>(shards: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (Jurisdiction, SeriesGroup)>,
    {
        let mut archive = Self::new();
        for (key, group) in shards {
            archive.insert_shard(key, group)?;
        }
        Ok(archive)
    }

    pub fn insert_shard(&mut self, key: Jurisdiction, group: SeriesGroup) -> Result<(), SeriesError> {
        if self.shards.contains_key(&key) {
            return Err(SeriesError::DuplicateShard(key.to_string()));
        }
        self.shards.insert(key, group);
        Ok(())
    }

    /// Insert or replace the group for `key`, returning the previous one.
    pub fn replace_shard(&mut self, key: Jurisdiction, group: SeriesGroup) -> Option<SeriesGroup> {
        self.shards.insert(key, group)
    }

    pub fn shard(&self, key: &str) -> Option<&SeriesGroup> {
        let key = Jurisdiction::parse(key)?;
        self.shards.get(&key)
    }

    pub fn shard_keys(&self) -> impl Iterator<Item = &Jurisdiction> {
        self.shards.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Jurisdiction, &SeriesGroup)> {
        self.shards.iter()
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.shards.values().map(SeriesGroup::record_count).sum()
    }
}
