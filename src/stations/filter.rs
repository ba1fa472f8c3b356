use crate::types::station::Station;
use log::warn;
use std::collections::BTreeSet;

/// Selects the stations a prediction run covers.
///
/// By default rainfall-only gauges (ids starting with `C1`) and
/// decommissioned stations are excluded, since neither reports the
/// temperature and humidity the rules need.
#[derive(Debug, Clone)]
pub struct StationFilter {
    include_rainfall_only: bool,
    include_decommissioned: bool,
    only: Option<BTreeSet<String>>,
}

impl Default for StationFilter {
    fn default() -> Self {
        Self {
            include_rainfall_only: false,
            include_decommissioned: false,
            only: None,
        }
    }
}

impl StationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the run to the given station ids. An empty list means no restriction.
    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        self.only = if ids.is_empty() { None } else { Some(ids) };
        self
    }

    pub fn include_rainfall_only(mut self, include: bool) -> Self {
        self.include_rainfall_only = include;
        self
    }

    pub fn include_decommissioned(mut self, include: bool) -> Self {
        self.include_decommissioned = include;
        self
    }

    pub fn accepts(&self, station: &Station) -> bool {
        if !self.include_rainfall_only && station.is_rainfall_only() {
            return false;
        }
        if !self.include_decommissioned && !station.is_active() {
            return false;
        }
        self.only
            .as_ref()
            .map_or(true, |ids| ids.contains(&station.id))
    }

    /// Applies the filter, keeping listing order. Requested ids that are not
    /// in the listing are logged.
    pub fn apply(&self, stations: &[Station]) -> Vec<Station> {
        if let Some(ids) = &self.only {
            for id in ids {
                if !stations.iter().any(|s| &s.id == id) {
                    warn!("Station {} is not in the station listing", id);
                }
            }
        }
        stations
            .iter()
            .filter(|s| self.accepts(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<Station> {
        let mut closed = Station::new("467990", "馬祖");
        closed.decommissioned = Some("2001/01/01".to_string());
        vec![
            Station::new("466940", "基隆"),
            Station::new("C1A730", "公館"),
            closed,
            Station::new("C0A560", "福山"),
        ]
    }

    fn ids(stations: &[Station]) -> Vec<&str> {
        stations.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_default_excludes_rainfall_and_decommissioned() {
        let kept = StationFilter::new().apply(&listing());
        assert_eq!(ids(&kept), vec!["466940", "C0A560"]);
    }

    #[test]
    fn test_allow_list() {
        let kept = StationFilter::new()
            .with_ids(["C0A560", "C1A730", "999999"])
            .apply(&listing());
        // The allow-list does not override the exclusions.
        assert_eq!(ids(&kept), vec!["C0A560"]);

        let kept = StationFilter::new()
            .with_ids(Vec::<String>::new())
            .include_decommissioned(true)
            .apply(&listing());
        assert_eq!(ids(&kept), vec!["466940", "467990", "C0A560"]);
    }
}
