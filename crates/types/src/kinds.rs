use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source type tag assigned once at the normalization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Consolidated operational control map: one row per scheduled trip.
    ScheduledTrip,
    /// Real-time feed: one row per vehicle position event.
    VehiclePosition,
    /// Extract whose signature columns matched no known type.
    Unknown,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::ScheduledTrip => "scheduled_trip",
            SourceKind::VehiclePosition => "vehicle_position",
            SourceKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "scheduled_trip" => Ok(SourceKind::ScheduledTrip),
            "vehicle_position" => Ok(SourceKind::VehiclePosition),
            "unknown" => Ok(SourceKind::Unknown),
            other => Err(format!("unknown source kind '{}'", other)),
        }
    }
}

/// How a natural key is reduced to its canonical text before deduplication and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalRule {
    /// Integer-like values collapse to their plain decimal form (`"038"` and `38` both
    /// become `"38"`); anything else is trimmed and lowercased.
    #[default]
    Numeric,
    /// Trim and lowercase only.
    Text,
}

impl fmt::Display for CanonicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalRule::Numeric => write!(f, "numeric"),
            CanonicalRule::Text => write!(f, "text"),
        }
    }
}
