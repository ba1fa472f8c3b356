//! Defines the weather station metadata carried through a prediction run and
//! copied into every output row.

use serde::{Deserialize, Serialize};

/// Station id prefix used by rainfall-only gauges, which report neither
/// temperature nor humidity.
pub const RAINFALL_ONLY_PREFIX: &str = "C1";

/// A single weather station from the station listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The station identifier (e.g. "466940"), also used in source file paths.
    pub id: String,
    /// The human readable station name.
    pub name: String,
    /// Latitude in decimal degrees, if listed.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, if listed.
    pub longitude: Option<f64>,
    /// The decommission date as listed; `None` while the station is in service.
    pub decommissioned: Option<String>,
}

impl Station {
    /// Creates an in-service station with no coordinates.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude: None,
            longitude: None,
            decommissioned: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn is_active(&self) -> bool {
        self.decommissioned
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
    }

    pub fn is_rainfall_only(&self) -> bool {
        self.id.starts_with(RAINFALL_ONLY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_rainfall_flags() {
        let mut station = Station::new("C1A730", "Rain gauge");
        assert!(station.is_active());
        assert!(station.is_rainfall_only());

        station.decommissioned = Some("2019-03-01".to_string());
        assert!(!station.is_active());

        station.decommissioned = Some("  ".to_string());
        assert!(station.is_active());

        assert!(!Station::new("C0A560", "Automatic").is_rainfall_only());
    }
}
