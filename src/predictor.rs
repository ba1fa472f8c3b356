//! The prediction pipeline: for every station and year, load the source
//! files, normalize them, classify them and write the result.

use crate::classify::classifier::classify;
use crate::error::BlastError;
use crate::output::writer::OutputWriter;
use crate::rules::config::RuleConfig;
use crate::series::normalize::normalize_with_stats;
use crate::source::data_loader::DailyDataLoader;
use crate::source::data_source::DataSource;
use crate::types::period::{DateWindow, Year};
use crate::types::station::Station;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(60);

/// What happened to one (station, year) unit that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The classified year was written to `path`.
    Written {
        path: PathBuf,
        days: usize,
        risk_days: usize,
    },
    /// No source rows fell inside the year, so nothing was written.
    NoData,
}

/// A unit that failed, with the error that stopped it.
#[derive(Debug)]
pub struct UnitFailure {
    pub station: String,
    pub year: i32,
    pub error: BlastError,
}

/// Totals of a [`BlastPredictor::run`].
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: usize,
    pub skipped: usize,
    pub failures: Vec<UnitFailure>,
}

impl RunSummary {
    pub fn units(&self) -> usize {
        self.written + self.skipped + self.failures.len()
    }
}

/// Runs a rule set over many station-years.
///
/// Units are independent: each one loads its own source span and writes its
/// own `<output>/<station>/<year>.csv`, so a failing unit never affects the
/// others.
///
/// # Examples
///
/// ```rust,no_run
/// # use blastdt::{BlastPredictor, BlastError, DataSource, RuleVariant, Station};
/// # async fn run() -> Result<(), BlastError> {
/// let predictor = BlastPredictor::new(DataSource::default(), "prediction_BlastDT2").await?;
/// let config = RuleVariant::BlastDt2.config()?;
/// let stations = vec![Station::new("466940", "基隆")];
///
/// let summary = predictor
///     .run()
///     .stations(&stations)
///     .config(&config)
///     .start_year(2023)
///     .end_year(2024)
///     .call()
///     .await?;
/// println!("{} files written", summary.written);
/// # Ok(())
/// # }
/// ```
pub struct BlastPredictor {
    loader: DailyDataLoader,
    writer: OutputWriter,
}

#[bon]
impl BlastPredictor {
    /// Creates a predictor that caches downloaded source files in `cache_folder`.
    ///
    /// # Errors
    ///
    /// Returns [`BlastError::CacheDirCreation`] if the folder cannot be created.
    pub async fn with_cache_folder(
        source: DataSource,
        output_dir: impl Into<PathBuf>,
        cache_folder: PathBuf,
    ) -> Result<Self, BlastError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| BlastError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self {
            loader: DailyDataLoader::new(source, &cache_folder),
            writer: OutputWriter::new(output_dir),
        })
    }

    /// Creates a predictor using the default cache directory
    /// (e.g. `~/.cache/blastdt_cache` on Linux).
    pub async fn new(source: DataSource, output_dir: impl Into<PathBuf>) -> Result<Self, BlastError> {
        let cache_folder = get_cache_dir().map_err(BlastError::CacheDirResolution)?;
        Self::with_cache_folder(source, output_dir, cache_folder).await
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.root()
    }

    /// Classifies every station for every year in `start_year..=end_year`.
    ///
    /// * `.stations(&[Station])`: **Required.** Stations to process.
    /// * `.config(&RuleConfig)`: **Required.** The rule set.
    /// * `.start_year(i32)` / `.end_year(i32)`: **Required.** Inclusive year span.
    /// * `.concurrency(usize)`: Optional. Units in flight at once. Defaults to `8`.
    /// * `.source_timeout(Duration)`: Optional. Limit on loading one unit's
    ///   source files. Defaults to 60 seconds.
    ///
    /// Per-unit failures are collected in [`RunSummary::failures`]; the run
    /// itself only fails on an inverted year span.
    #[builder]
    pub async fn run(
        &self,
        stations: &[Station],
        config: &RuleConfig,
        start_year: i32,
        end_year: i32,
        concurrency: Option<usize>,
        source_timeout: Option<Duration>,
    ) -> Result<RunSummary, BlastError> {
        if start_year > end_year {
            return Err(BlastError::InvalidYearRange {
                start: start_year,
                end: end_year,
            });
        }
        let concurrency = concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1);
        let source_timeout = source_timeout.unwrap_or(DEFAULT_SOURCE_TIMEOUT);

        info!(
            "Running {} over {} station(s), {}..={}",
            config,
            stations.len(),
            start_year,
            end_year
        );

        let units = stations
            .iter()
            .flat_map(|station| (start_year..=end_year).map(move |year| (station, Year(year))));

        let results: Vec<(String, Year, Result<UnitOutcome, BlastError>)> = stream::iter(units)
            .map(|(station, year)| async move {
                let result = self.predict_unit(station, year, config, source_timeout).await;
                (station.id.clone(), year, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut summary = RunSummary::default();
        for (station, year, result) in results {
            match result {
                Ok(UnitOutcome::Written { .. }) => summary.written += 1,
                Ok(UnitOutcome::NoData) => summary.skipped += 1,
                Err(error) => {
                    warn!("Station {} year {} failed: {}", station, year, error);
                    summary.failures.push(UnitFailure {
                        station,
                        year: year.get(),
                        error,
                    });
                }
            }
        }
        summary
            .failures
            .sort_by(|a, b| (&a.station, a.year).cmp(&(&b.station, b.year)));
        info!(
            "{}: {} written, {} without data, {} failed",
            config.flag_name(),
            summary.written,
            summary.skipped,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Processes one (station, year) unit.
    ///
    /// The classified window starts `lead_days` before January 1 so the first
    /// day of the year has a full persistence window; those lead days are
    /// dropped before writing.
    pub async fn predict_unit(
        &self,
        station: &Station,
        year: Year,
        config: &RuleConfig,
        source_timeout: Duration,
    ) -> Result<UnitOutcome, BlastError> {
        let (window, year_start) = DateWindow::for_year(year, config.lead_days())
            .zip(year.first_day())
            .ok_or_else(|| BlastError::InvalidYearRange {
                start: year.get(),
                end: year.get(),
            })?;
        info!("Processing station {} for year {}", station.id, year);

        let raw = tokio::time::timeout(source_timeout, self.loader.load_span(&station.id, &window))
            .await
            .map_err(|_| BlastError::Timeout {
                station: station.id.clone(),
                year: year.get(),
                seconds: source_timeout.as_secs(),
            })?;
        if raw.is_empty() {
            warn!("No source data for station {} around {}", station.id, year);
            return Ok(UnitOutcome::NoData);
        }

        let config_owned = config.clone();
        let station_id = station.id.clone();
        let classified = tokio::task::spawn_blocking(move || -> Result<_, BlastError> {
            let (series, stats) = normalize_with_stats(raw, window.start, window.end)?;
            debug!("Normalized station {} for {}: {:?}", station_id, year, stats);
            let mut classified = classify(series, &config_owned)?;
            classified.drop_before(year_start);
            Ok(classified)
        })
        .await??;

        if classified.is_empty() {
            warn!("Station {} has no observations in {}", station.id, year);
            return Ok(UnitOutcome::NoData);
        }

        let days = classified.len();
        let risk_days = classified.risk_days();
        let path = self.writer.write(classified, station, year).await?;
        info!(
            "Station {} {}: {} of {} day(s) at risk",
            station.id, year, risk_days, days
        );
        Ok(UnitOutcome::Written {
            path,
            days,
            risk_days,
        })
    }
}
