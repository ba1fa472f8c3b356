use crate::classify::error::ClassifyError;
use crate::consolidate::error::ConsolidateError;
use crate::output::error::OutputError;
use crate::rules::error::ConfigError;
use crate::series::error::NormalizeError;
use crate::source::error::SourceError;
use crate::stations::error::StationListError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlastError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    StationList(#[from] StationListError),

    #[error(transparent)]
    Consolidate(#[from] ConsolidateError),

    #[error("Loading data for station {station}, year {year} timed out after {seconds}s")]
    Timeout {
        station: String,
        year: i32,
        seconds: u64,
    },

    #[error("Invalid year range {start}..={end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
