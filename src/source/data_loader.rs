use crate::source::data_source::DataSource;
use crate::source::error::SourceError;
use crate::source::extractor::{extract_raw_records, read_daily_csv};
use crate::types::daily::RawDailyRecord;
use crate::types::period::DateWindow;
use chrono::{Datelike, Local};
use log::{debug, info, warn};
use polars::frame::DataFrame;
use polars::prelude::*;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Loads raw daily rows for one station-year at a time.
///
/// Remote files are cached as parquet under the cache directory once their
/// year has ended; local files are always read in place.
pub struct DailyDataLoader {
    source: DataSource,
    cache_dir: PathBuf,
    download_client: Client,
}

impl DailyDataLoader {
    pub fn new(source: DataSource, cache_dir: &Path) -> DailyDataLoader {
        DailyDataLoader {
            source,
            cache_dir: cache_dir.to_path_buf(),
            download_client: Client::new(),
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Loads one station-year file. Any failure is reported as
    /// [`SourceError::SourceUnavailable`] carrying the underlying cause.
    pub async fn load_year(
        &self,
        station: &str,
        year: i32,
    ) -> Result<Vec<RawDailyRecord>, SourceError> {
        let frame = self
            .get_frame(station, year)
            .await
            .map_err(|e| SourceError::SourceUnavailable {
                station: station.to_string(),
                year,
                location: self.source.location(station, year),
                source: Box::new(e),
            })?;

        let station_owned = station.to_string();
        task::spawn_blocking(move || extract_raw_records(&frame, &station_owned)).await?
    }

    /// Loads every source year the window touches and concatenates the rows.
    /// Years that cannot be loaded are logged and skipped.
    pub async fn load_span(&self, station: &str, window: &DateWindow) -> Vec<RawDailyRecord> {
        let mut records = Vec::new();
        for year in window.source_years() {
            match self.load_year(station, year).await {
                Ok(mut rows) => {
                    debug!("Loaded {} rows for station {} year {}", rows.len(), station, year);
                    records.append(&mut rows);
                }
                Err(e) => warn!("Skipping year {} for station {}: {}", year, station, e),
            }
        }
        records
    }

    async fn get_frame(&self, station: &str, year: i32) -> Result<DataFrame, SourceError> {
        match &self.source {
            DataSource::Local(_) => {
                let path = PathBuf::from(self.source.location(station, year));
                if fs::metadata(&path).await.is_err() {
                    return Err(SourceError::FileRead(
                        path,
                        std::io::Error::from(std::io::ErrorKind::NotFound),
                    ));
                }
                let station_owned = station.to_string();
                task::spawn_blocking(move || read_daily_csv(&path, &station_owned)).await?
            }
            DataSource::Remote(_) => self.get_remote_frame(station, year).await,
        }
    }

    async fn get_remote_frame(&self, station: &str, year: i32) -> Result<DataFrame, SourceError> {
        let parquet_path = self
            .cache_dir
            .join(DataSource::cache_file_name(station, year));

        if fs::metadata(&parquet_path).await.is_ok() {
            debug!(
                "Cache hit for station {} year {} at {:?}",
                station, year, parquet_path
            );
            match Self::read_cached_frame(parquet_path.clone()).await {
                Ok(df) => return Ok(df),
                Err(e) => {
                    // Unreadable cache files are discarded and fetched again.
                    warn!("Discarding cache file {:?}: {}", parquet_path, e);
                    if let Err(e) = fs::remove_file(&parquet_path).await {
                        debug!("Could not remove {:?}: {}", parquet_path, e);
                    }
                }
            }
        }

        let url = self.source.location(station, year);
        let raw_bytes = self.download(&url).await?;
        let df = Self::csv_to_dataframe(raw_bytes, station).await?;

        // The running year is still being appended to upstream.
        if year < Local::now().year() {
            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| SourceError::CacheDirCreation(self.cache_dir.clone(), e))?;
            Self::cache_dataframe(df.clone(), &parquet_path).await?;
            info!(
                "Cached station {} year {} to {:?}",
                station, year, parquet_path
            );
        }
        Ok(df)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    SourceError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    SourceError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.to_string(), e))?;
        Ok(bytes.to_vec())
    }

    /// Parses downloaded CSV bytes through a temporary file on a blocking thread.
    async fn csv_to_dataframe(bytes: Vec<u8>, station: &str) -> Result<DataFrame, SourceError> {
        let station_owned = station.to_string();

        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new().map_err(|e| SourceError::CsvReadIo {
                station: station_owned.clone(),
                source: e,
            })?;
            temp_file
                .write_all(&bytes)
                .and_then(|_| temp_file.flush())
                .map_err(|e| SourceError::CsvReadIo {
                    station: station_owned.clone(),
                    source: e,
                })?;

            read_daily_csv(temp_file.path(), &station_owned)
        })
        .await?
    }

    async fn read_cached_frame(parquet_path: PathBuf) -> Result<DataFrame, SourceError> {
        task::spawn_blocking(move || {
            LazyFrame::scan_parquet(&parquet_path, Default::default())
                .and_then(|lf| lf.collect())
                .map_err(|e| SourceError::ParquetScan(parquet_path, e))
        })
        .await?
    }

    /// Writes the parquet cache through a temporary file in the cache
    /// directory, so readers never see a partially written file.
    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), SourceError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let dir = path_buf
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let mut temp_file = NamedTempFile::new_in(&dir)
                .map_err(|e| SourceError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(temp_file.as_file_mut())
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| SourceError::ParquetWritePolars(path_buf.clone(), e))?;
            temp_file
                .persist(&path_buf)
                .map_err(|e| SourceError::ParquetWriteIo(path_buf.clone(), e.error))?;
            Ok::<(), SourceError>(())
        })
        .await??;
        Ok(())
    }
}
