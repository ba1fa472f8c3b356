//! Writes classified station-years as CSV files.

use crate::classify::classifier::ClassifiedSeries;
use crate::output::error::OutputError;
use crate::types::condition::Condition;
use crate::types::period::Year;
use crate::types::station::Station;
use log::info;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

pub const COL_DATE: &str = "Date";
pub const COL_STATION_ID: &str = "站號";
pub const COL_STATION_NAME: &str = "站名";
pub const COL_LAT: &str = "lat";
pub const COL_LON: &str = "lon";

fn condition_column(name: &str, values: &[Condition]) -> Column {
    let values: Vec<Option<bool>> = values.iter().map(|c| c.as_option()).collect();
    Column::new(name.into(), values)
}

/// Lays out one classified series as the output table:
/// `Date`, the flag, then per rule its reading (once per variable), its daily
/// condition and its rolling condition, then the station columns.
pub fn to_dataframe(classified: &ClassifiedSeries, station: &Station) -> Result<DataFrame, OutputError> {
    let height = classified.len();
    let dates: Vec<String> = classified
        .series
        .dates()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    let mut columns = vec![
        Column::new(COL_DATE.into(), dates),
        condition_column(&classified.flag_name, &classified.flag),
    ];

    let mut written_variables = HashSet::new();
    for condition in &classified.conditions {
        let variable = condition.rule.variable.as_str();
        if written_variables.insert(variable) {
            columns.push(Column::new(
                variable.into(),
                classified.series.column(variable),
            ));
        }
        columns.push(condition_column(
            &condition.condition_column_name(),
            &condition.daily,
        ));
        if let Some(rolling) = &condition.rolling {
            columns.push(condition_column(&condition.rolling_column_name(), rolling));
        }
    }

    columns.push(Column::new(
        COL_STATION_ID.into(),
        vec![station.id.as_str(); height],
    ));
    columns.push(Column::new(
        COL_STATION_NAME.into(),
        vec![station.name.as_str(); height],
    ));
    columns.push(Column::new(COL_LAT.into(), vec![station.latitude; height]));
    columns.push(Column::new(COL_LON.into(), vec![station.longitude; height]));

    Ok(DataFrame::new(columns)?)
}

/// Writes `df` to `path` through a temporary file in the same directory, so
/// a failed write never leaves a partial file behind.
pub(crate) fn write_csv_atomically(df: &mut DataFrame, path: &Path) -> Result<(), OutputError> {
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).map_err(|e| OutputError::DirCreation(dir.clone(), e))?;

    let mut temp_file =
        NamedTempFile::new_in(&dir).map_err(|e| OutputError::TempFile(dir.clone(), e))?;
    CsvWriter::new(temp_file.as_file_mut())
        .include_header(true)
        .finish(df)
        .map_err(|e| OutputError::CsvWrite(path.to_path_buf(), e))?;
    temp_file
        .persist(path)
        .map_err(|e| OutputError::Persist(path.to_path_buf(), e.error))?;
    Ok(())
}

/// Writes one CSV per station-year under `<root>/<station>/<year>.csv`.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, station: &str, year: Year) -> PathBuf {
        self.root
            .join(station)
            .join(format!("{}.csv", year.get()))
    }

    pub async fn write(
        &self,
        classified: ClassifiedSeries,
        station: &Station,
        year: Year,
    ) -> Result<PathBuf, OutputError> {
        let path = self.path_for(&station.id, year);
        let station = station.clone();
        let target = path.clone();
        task::spawn_blocking(move || {
            let mut df = to_dataframe(&classified, &station)?;
            write_csv_atomically(&mut df, &target)
        })
        .await??;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}
