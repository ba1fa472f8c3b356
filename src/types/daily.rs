//! Row types for daily station observations, before and after normalization.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Daily maximum temperature (°C).
pub const VAR_TX_MAX_ABS: &str = "TxMaxAbs";
/// Daily mean temperature (°C).
pub const VAR_TX: &str = "Tx";
/// Daily mean relative humidity (%).
pub const VAR_RH: &str = "RH";

/// A daily row exactly as read from a source file. The date has not been
/// parsed yet, so a corrupt date column can still be detected as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDailyRecord {
    pub date: String,
    pub values: BTreeMap<String, Option<f64>>,
}

impl RawDailyRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            values: BTreeMap::new(),
        }
    }

    /// Adds a reading, consuming and returning the record.
    pub fn with(mut self, variable: &str, value: Option<f64>) -> Self {
        self.values.insert(variable.to_string(), value);
        self
    }
}

/// One calendar day of observations for one station.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub values: BTreeMap<String, Option<f64>>, // None = missing
}

impl DailyRecord {
    /// The reading for `variable`, `None` when missing or not recorded at all.
    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).copied().flatten()
    }
}

/// A contiguous daily series for a single station.
///
/// Built by [`crate::normalize`], which guarantees that dates are strictly
/// increasing and that every calendar day between the first and last record
/// is present exactly once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySeries {
    variables: Vec<String>,
    records: Vec<DailyRecord>,
}

impl DailySeries {
    pub(crate) fn from_parts(variables: Vec<String>, records: Vec<DailyRecord>) -> Self {
        Self { variables, records }
    }

    /// Variable names in the order they first appeared in the source.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn has_variable(&self, variable: &str) -> bool {
        self.variables.iter().any(|v| v == variable)
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.records.iter().map(|r| r.date)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// All readings of one variable, aligned with [`DailySeries::records`].
    pub fn column(&self, variable: &str) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.value(variable)).collect()
    }

    /// Drops every record dated before `date`.
    pub(crate) fn drop_before(&mut self, date: NaiveDate) -> usize {
        let cut = self.records.partition_point(|r| r.date < date);
        self.records.drain(..cut);
        cut
    }

    /// Turns the series back into raw rows (ISO dates), e.g. to feed it through
    /// normalization again.
    pub fn to_raw_records(&self) -> Vec<RawDailyRecord> {
        self.records
            .iter()
            .map(|r| RawDailyRecord {
                date: r.date.format("%Y-%m-%d").to_string(),
                values: r.values.clone(),
            })
            .collect()
    }
}
