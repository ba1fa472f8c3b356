//! Re-keys per-station prediction files by date: one file per day per rule
//! set, listing every station's flag for that day.

use crate::consolidate::error::ConsolidateError;
use crate::output::writer::{write_csv_atomically, COL_DATE, COL_LAT, COL_LON, COL_STATION_ID, COL_STATION_NAME};
use crate::rules::variant::RuleVariant;
use crate::utils::parse_source_date;
use chrono::NaiveDate;
use log::{info, warn};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::task;

/// Date column name in consolidated files.
pub const COL_DATE_CONSOLIDATED: &str = "日期";
pub const DEFAULT_CONSOLIDATED_DIR: &str = "prediction_daily";

#[derive(Debug, Clone, PartialEq)]
struct StationDay {
    id: String,
    name: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    flag: Option<String>,
}

/// Counts for one consolidation pass over a prediction folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidateSummary {
    pub files_read: usize,
    pub files_skipped: usize,
    pub files_written: usize,
}

impl ConsolidateSummary {
    fn absorb(&mut self, other: ConsolidateSummary) {
        self.files_read += other.files_read;
        self.files_skipped += other.files_skipped;
        self.files_written += other.files_written;
    }
}

/// Merges the outputs of the preset rule sets found under one root.
#[derive(Debug, Clone)]
pub struct Consolidator {
    input_root: PathBuf,
    output_dir: PathBuf,
}

impl Consolidator {
    pub fn new(input_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Consolidates every preset whose prediction folder exists under the
    /// input root. Missing folders are skipped.
    pub async fn run(&self) -> Result<ConsolidateSummary, ConsolidateError> {
        let mut summary = ConsolidateSummary::default();
        for variant in RuleVariant::ALL {
            let folder = self.input_root.join(variant.output_dir_name());
            if !folder.is_dir() {
                info!("Folder {} does not exist, skipping", folder.display());
                continue;
            }
            let flag = variant.flag_name().to_string();
            let output_dir = self.output_dir.clone();
            let variant_summary =
                task::spawn_blocking(move || consolidate_folder(&folder, &flag, &output_dir))
                    .await??;
            summary.absorb(variant_summary);
        }
        Ok(summary)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ConsolidateError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| ConsolidateError::ReadDir(dir.to_path_buf(), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

/// Reads `<folder>/<station>/*.csv` and writes `<output_dir>/<YYYYMMDD>_<flag>.csv`.
pub fn consolidate_folder(
    folder: &Path,
    flag: &str,
    output_dir: &Path,
) -> Result<ConsolidateSummary, ConsolidateError> {
    let mut summary = ConsolidateSummary::default();
    let mut by_date: BTreeMap<NaiveDate, Vec<StationDay>> = BTreeMap::new();

    for station_dir in sorted_entries(folder)?.into_iter().filter(|p| p.is_dir()) {
        let csv_files = sorted_entries(&station_dir)?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"));
        for csv_file in csv_files {
            match read_station_days(&csv_file, flag) {
                Some(rows) => {
                    summary.files_read += 1;
                    for (date, row) in rows {
                        by_date.entry(date).or_default().push(row);
                    }
                }
                None => summary.files_skipped += 1,
            }
        }
    }

    for (date, mut rows) in by_date {
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        let path = output_dir.join(format!("{}_{}.csv", date.format("%Y%m%d"), flag));
        let mut df = daily_frame(date, &rows, flag)?;
        write_csv_atomically(&mut df, &path)?;
        info!("Wrote consolidated file {}", path.display());
        summary.files_written += 1;
    }
    Ok(summary)
}

fn daily_frame(date: NaiveDate, rows: &[StationDay], flag: &str) -> Result<DataFrame, ConsolidateError> {
    let date_text = date.format("%Y-%m-%d").to_string();
    let columns = vec![
        Column::new(
            COL_STATION_ID.into(),
            rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_STATION_NAME.into(),
            rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
        ),
        Column::new(COL_DATE_CONSOLIDATED.into(), vec![date_text; rows.len()]),
        Column::new(
            COL_LAT.into(),
            rows.iter().map(|r| r.lat.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_LON.into(),
            rows.iter().map(|r| r.lon.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            flag.into(),
            rows.iter().map(|r| r.flag.clone()).collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

fn text_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a StringChunked> {
    df.column(name).ok().and_then(|c| c.str().ok())
}

/// Reads one station-year output as text. Returns `None` (after logging)
/// when the file cannot be read or lacks a required column.
fn read_station_days(path: &Path, flag: &str) -> Option<Vec<(NaiveDate, StationDay)>> {
    let df = match CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => df,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    let date_name = [COL_DATE, COL_DATE_CONSOLIDATED]
        .into_iter()
        .find(|name| df.column(name).is_ok());
    let Some(date_name) = date_name else {
        warn!("No date column in {}, skipping", path.display());
        return None;
    };

    let required = [COL_STATION_ID, COL_STATION_NAME, COL_LAT, COL_LON, flag];
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        warn!("{} lacks columns {:?}, skipping", path.display(), missing);
        return None;
    }

    let (Some(dates), Some(ids), Some(names), Some(lats), Some(lons), Some(flags)) = (
        text_column(&df, date_name),
        text_column(&df, COL_STATION_ID),
        text_column(&df, COL_STATION_NAME),
        text_column(&df, COL_LAT),
        text_column(&df, COL_LON),
        text_column(&df, flag),
    ) else {
        warn!("Unexpected column types in {}, skipping", path.display());
        return None;
    };

    let owned = |value: Option<&str>| value.map(str::to_string);
    let rows = (0..df.height())
        .filter_map(|row| {
            let date = dates.get(row).and_then(parse_source_date)?;
            Some((
                date,
                StationDay {
                    id: ids.get(row).unwrap_or_default().to_string(),
                    name: owned(names.get(row)),
                    lat: owned(lats.get(row)),
                    lon: owned(lons.get(row)),
                    flag: owned(flags.get(row)),
                },
            ))
        })
        .collect();
    Some(rows)
}
