//! Telemetry data structures.
//!
//! A [`Reading`] is the unit record of the whole pipeline: it is journaled
//! locally, enveloped for delivery, and reconstructed from the archival
//! store. Its serialized field names are part of the wire format and must
//! not change.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Coarse occupancy category reported by the vision model.
///
/// The five known categories are ordinal, from emptiest to fullest. Tags the
/// model may grow later arrive as [`Occupancy::Other`] and round-trip through
/// serialization verbatim, so an old reader never drops a new category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Occupancy {
    /// No vehicles detected
    CompletelyEmpty,
    /// A few vehicles
    MostlyEmpty,
    /// Around half of the spaces taken
    HalfFull,
    /// Most spaces taken
    MostlyFull,
    /// No free spaces detected
    FullyOccupied,
    /// A tag this build does not know; preserved as-is
    Other(String),
}

impl Occupancy {
    /// The known categories, in display order from emptiest to fullest.
    pub const FIXED: [Occupancy; 5] = [
        Occupancy::CompletelyEmpty,
        Occupancy::MostlyEmpty,
        Occupancy::HalfFull,
        Occupancy::MostlyFull,
        Occupancy::FullyOccupied,
    ];

    /// The wire tag for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Occupancy::CompletelyEmpty => "completely_empty",
            Occupancy::MostlyEmpty => "mostly_empty",
            Occupancy::HalfFull => "half_full",
            Occupancy::MostlyFull => "mostly_full",
            Occupancy::FullyOccupied => "fully_occupied",
            Occupancy::Other(tag) => tag,
        }
    }

    /// Parse a wire tag. Unknown tags are preserved in [`Occupancy::Other`],
    /// so this never fails.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "completely_empty" => Occupancy::CompletelyEmpty,
            "mostly_empty" => Occupancy::MostlyEmpty,
            "half_full" => Occupancy::HalfFull,
            "mostly_full" => Occupancy::MostlyFull,
            "fully_occupied" => Occupancy::FullyOccupied,
            other => Occupancy::Other(other.to_string()),
        }
    }

    /// Human-friendly label, e.g. `half_full` becomes `Half Full`.
    pub fn label(&self) -> String {
        let mut label = String::with_capacity(self.as_str().len());
        for word in self.as_str().split('_') {
            if !label.is_empty() {
                label.push(' ');
            }
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                label.extend(first.to_uppercase());
                label.push_str(chars.as_str());
            }
        }
        label
    }
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Occupancy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Occupancy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TagVisitor;

        impl Visitor<'_> for TagVisitor {
            type Value = Occupancy;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an occupancy tag string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Occupancy, E> {
                Ok(Occupancy::parse(value))
            }
        }

        deserializer.deserialize_str(TagVisitor)
    }
}

/// One classified observation of the parking area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// When the observation was captured (UTC)
    pub timestamp: DateTime<Utc>,
    /// Ambient temperature in degrees Celsius
    pub temperature: f64,
    /// Occupancy category assigned by the vision model
    pub occupancy: Occupancy,
}

impl Reading {
    /// Create a reading stamped with the current time.
    pub fn new(temperature: f64, occupancy: Occupancy) -> Self {
        Self::at(Utc::now(), temperature, occupancy)
    }

    /// Create a reading with an explicit timestamp.
    pub fn at(timestamp: DateTime<Utc>, temperature: f64, occupancy: Occupancy) -> Self {
        Self {
            timestamp,
            temperature,
            occupancy,
        }
    }
}

/// Result of running one camera frame through the vision model.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The winning category
    pub occupancy: Occupancy,
    /// Model confidence for the winning category, `0.0..=1.0`
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_occupancy_tags_round_trip() {
        for category in Occupancy::FIXED {
            assert_eq!(Occupancy::parse(category.as_str()), category);
        }
    }

    #[test]
    fn test_occupancy_unknown_tag_preserved() {
        let parsed = Occupancy::parse("overflowing");
        assert_eq!(parsed, Occupancy::Other("overflowing".to_string()));
        assert_eq!(parsed.as_str(), "overflowing");

        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, "\"overflowing\"");
        let back: Occupancy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parsed);
    }

    #[test]
    fn test_occupancy_display_matches_wire_tag() {
        assert_eq!(Occupancy::HalfFull.to_string(), "half_full");
        assert_eq!(Occupancy::FullyOccupied.to_string(), "fully_occupied");
    }

    #[test]
    fn test_occupancy_label() {
        assert_eq!(Occupancy::HalfFull.label(), "Half Full");
        assert_eq!(Occupancy::CompletelyEmpty.label(), "Completely Empty");
        assert_eq!(Occupancy::Other("overflowing".into()).label(), "Overflowing");
    }

    #[test]
    fn test_reading_wire_field_names() {
        let reading = Reading::at(
            Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap(),
            21.5,
            Occupancy::MostlyEmpty,
        );
        let value = serde_json::to_value(&reading).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("timestamp"));
        assert!(object.contains_key("temperature"));
        assert!(object.contains_key("occupancy"));
        assert_eq!(object["occupancy"], "mostly_empty");
        assert_eq!(object["temperature"], 21.5);
    }

    #[test]
    fn test_reading_round_trip() {
        let reading = Reading::new(18.3, Occupancy::Other("snowed_in".to_string()));
        let json = serde_json::to_string(&reading).unwrap();
        let back: Reading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reading);
    }
}
