//! Converts a daily-file `DataFrame` into raw rows.
//!
//! The first column is the date (its header is usually empty, as written by
//! the archive); every other column that holds numbers is a variable.

use crate::source::error::SourceError;
use crate::types::daily::RawDailyRecord;
use polars::prelude::*;

/// Extracts an optional float value from a specific row of a Float64 column.
fn get_opt_float(series: &Float64Chunked, idx: usize) -> Option<f64> {
    series.get(idx)
}

/// A column counts as a variable when at least one cell parses as a number,
/// or when it is entirely empty (a variable with no readings that year).
fn numeric_view(column: &Column) -> Result<Option<Float64Chunked>, SourceError> {
    let as_float = column.cast(&DataType::Float64)?;
    let parsed = as_float.len() - as_float.null_count();
    let all_empty = column.null_count() == column.len();
    if parsed == 0 && !all_empty {
        return Ok(None);
    }
    Ok(Some(as_float.f64()?.clone()))
}

pub fn extract_raw_records(
    df: &DataFrame,
    station: &str,
) -> Result<Vec<RawDailyRecord>, SourceError> {
    let (date_column, value_columns) =
        df.get_columns()
            .split_first()
            .ok_or_else(|| SourceError::NoDateColumn {
                station: station.to_string(),
            })?;

    let dates = date_column.cast(&DataType::String)?;
    let dates = dates.str()?;

    let mut variables: Vec<(String, Float64Chunked)> = Vec::with_capacity(value_columns.len());
    for column in value_columns {
        if let Some(values) = numeric_view(column)? {
            variables.push((column.name().to_string(), values));
        }
    }

    let records = (0..df.height())
        .map(|row| {
            let mut record = RawDailyRecord::new(dates.get(row).unwrap_or_default());
            for (name, values) in &variables {
                record.values.insert(name.clone(), get_opt_float(values, row));
            }
            record
        })
        .collect();
    Ok(records)
}

/// Reads a daily CSV file with every column as text; numbers are parsed by
/// [`extract_raw_records`] so that stray markers only void their own cell.
pub fn read_daily_csv(path: &std::path::Path, station: &str) -> Result<DataFrame, SourceError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| SourceError::CsvReadPolars {
            station: station.to_string(),
            source: e,
        })?
        .finish()
        .map_err(|e| SourceError::CsvReadPolars {
            station: station.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_extract_records_from_csv() -> Result<(), Box<dyn std::error::Error>> {
        let file = write_csv(
            "date,Tx,TxMaxAbs,RH,Remark\n\
             2023-01-01,15.2,20.1,80,ok\n\
             2023-01-02,-9.8,,75,ok\n\
             2023-01-03,X,21.5,77.5,late\n",
        );
        let df = read_daily_csv(file.path(), "466940")?;
        let records = extract_raw_records(&df, "466940")?;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, "2023-01-01");
        assert_eq!(records[0].values.get("Tx"), Some(&Some(15.2)));
        assert_eq!(records[0].values.get("RH"), Some(&Some(80.0)));
        // Sentinels are kept as numbers here; scrubbing happens during normalization.
        assert_eq!(records[1].values.get("Tx"), Some(&Some(-9.8)));
        assert_eq!(records[1].values.get("TxMaxAbs"), Some(&None));
        // A stray marker only voids its own cell.
        assert_eq!(records[2].values.get("Tx"), Some(&None));
        // Text-only columns are not variables.
        assert!(!records[0].values.contains_key("Remark"));
        Ok(())
    }

    #[test]
    fn test_empty_column_is_still_a_variable() -> Result<(), Box<dyn std::error::Error>> {
        let file = write_csv("date,RH\n2023-01-01,\n2023-01-02,\n");
        let df = read_daily_csv(file.path(), "466940")?;
        let records = extract_raw_records(&df, "466940")?;
        assert_eq!(records[1].values.get("RH"), Some(&None));
        Ok(())
    }
}
