use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// USPS abbreviations of the 50 states.
pub const US_STATES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA",
    "HI", "ID", "IL", "IN", "IA", "KS", "KY", "LA", "ME", "MD",
    "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC",
    "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV", "WI", "WY",
];

pub const DISTRICT_OF_COLUMBIA: &str = "DC";

/// A state-level jurisdiction code: exactly two ASCII uppercase letters.
///
/// Construction goes through [`Jurisdiction::parse`], so a value of this type
/// is always well-formed. Whether the code names a real state is a separate
/// question answered by [`JurisdictionScope`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Jurisdiction(String);

impl Jurisdiction {
    /// Parse a code, trimming surrounding whitespace. Lowercase is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim();
        let mut chars = code.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) if a.is_ascii_uppercase() && b.is_ascii_uppercase() => {
                Some(Self(code.to_string()))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_state(&self) -> bool {
        US_STATES.contains(&self.0.as_str())
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Jurisdiction {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Jurisdiction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid jurisdiction code '{raw}' (expected two uppercase letters)"
            ))
        })
    }
}

/// Which jurisdictions a report or consolidation step admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionScope {
    /// Any well-formed code, territories included.
    #[default]
    All,
    /// The 50 states only.
    States,
    /// The 50 states plus the District of Columbia.
    StatesAndDc,
}

impl JurisdictionScope {
    pub fn contains(&self, jurisdiction: &Jurisdiction) -> bool {
        match self {
            Self::All => true,
            Self::States => jurisdiction.is_state(),
            Self::StatesAndDc => {
                jurisdiction.is_state() || jurisdiction.as_str() == DISTRICT_OF_COLUMBIA
            }
        }
    }

    /// Same as [`contains`](Self::contains) for a raw code; malformed codes are
    /// never in scope.
    pub fn admits(&self, raw: &str) -> bool {
        Jurisdiction::parse(raw).is_some_and(|j| self.contains(&j))
    }
}

impl fmt::Display for JurisdictionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::States => write!(f, "states"),
            Self::StatesAndDc => write!(f, "states_and_dc"),
        }
    }
}
