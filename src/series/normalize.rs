//! Rebuilds a gap-free daily series from raw per-year source rows.

use crate::series::error::NormalizeError;
use crate::series::interpolate::{interpolate_inside, scrub_sentinels};
use crate::types::daily::{DailyRecord, DailySeries, RawDailyRecord};
use crate::utils::parse_source_date;
use chrono::NaiveDate;
use log::debug;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Counters collected while normalizing, logged at debug level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeStats {
    pub duplicates_dropped: usize,
    pub days_inserted: usize,
    pub sentinels_scrubbed: usize,
    pub values_interpolated: usize,
}

/// Normalizes raw rows into a contiguous daily series restricted to
/// `[window_start, window_end]`.
///
/// Rows may come from several source files concatenated in any order and may
/// repeat dates. The steps are:
///
/// 1. every date is parsed; one bad date fails the whole call,
/// 2. duplicate dates keep their first occurrence,
/// 3. the calendar between the earliest and latest date is completed with
///    all-missing days,
/// 4. sentinel readings (`-9.8`, `-99.7`, anything below `-99`) become missing,
/// 5. interior gaps of each variable are linearly interpolated, edges are not,
/// 6. the result is cut to the requested window (possibly empty).
///
/// # Errors
///
/// Returns [`NormalizeError::CorruptDateColumn`] when any record's date cannot
/// be parsed.
///
/// # Examples
///
/// ```
/// use blastdt::{normalize, RawDailyRecord};
/// use chrono::NaiveDate;
///
/// let raw = vec![
///     RawDailyRecord::new("2023-07-01").with("Tx", Some(20.0)),
///     RawDailyRecord::new("2023-07-02").with("Tx", Some(-9.8)),
///     RawDailyRecord::new("2023-07-03").with("Tx", Some(22.0)),
/// ];
/// let start = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2023, 7, 31).unwrap();
///
/// let series = normalize(raw, start, end).unwrap();
/// assert_eq!(series.column("Tx"), vec![Some(20.0), Some(21.0), Some(22.0)]);
/// ```
pub fn normalize(
    raw_records: Vec<RawDailyRecord>,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<DailySeries, NormalizeError> {
    normalize_with_stats(raw_records, window_start, window_end).map(|(series, _)| series)
}

/// Same as [`normalize`], also returning what was changed.
pub fn normalize_with_stats(
    raw_records: Vec<RawDailyRecord>,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<(DailySeries, NormalizeStats), NormalizeError> {
    let mut stats = NormalizeStats::default();
    let mut variables: Vec<String> = Vec::new();
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>> = BTreeMap::new();

    for (index, record) in raw_records.into_iter().enumerate() {
        let date = parse_source_date(&record.date).ok_or_else(|| {
            NormalizeError::CorruptDateColumn {
                index,
                value: record.date.clone(),
            }
        })?;
        for name in record.values.keys() {
            if !variables.contains(name) {
                variables.push(name.clone());
            }
        }
        match by_date.entry(date) {
            Entry::Vacant(slot) => {
                slot.insert(record.values);
            }
            Entry::Occupied(_) => stats.duplicates_dropped += 1,
        }
    }

    let (Some(&first), Some(&last)) = (by_date.keys().next(), by_date.keys().next_back()) else {
        return Ok((DailySeries::from_parts(variables, Vec::new()), stats));
    };

    let calendar: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
    stats.days_inserted = calendar.len() - by_date.len();

    let mut columns: Vec<Vec<Option<f64>>> = variables
        .iter()
        .map(|name| {
            calendar
                .iter()
                .map(|date| {
                    by_date
                        .get(date)
                        .and_then(|values| values.get(name))
                        .copied()
                        .flatten()
                })
                .collect()
        })
        .collect();

    for column in columns.iter_mut() {
        stats.sentinels_scrubbed += scrub_sentinels(column);
        stats.values_interpolated += interpolate_inside(column);
    }

    let records: Vec<DailyRecord> = calendar
        .iter()
        .enumerate()
        .filter(|(_, date)| window_start <= **date && **date <= window_end)
        .map(|(row, date)| DailyRecord {
            date: *date,
            values: variables
                .iter()
                .zip(&columns)
                .map(|(name, column)| (name.clone(), column[row]))
                .collect(),
        })
        .collect();

    debug!(
        "Normalized {} calendar days ({} kept in window {}..={}): {:?}",
        calendar.len(),
        records.len(),
        window_start,
        window_end,
        stats
    );

    Ok((DailySeries::from_parts(variables, records), stats))
}
