use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to create a temporary file in '{0}'")]
    TempFile(PathBuf, #[source] std::io::Error),

    #[error("Failed to write CSV '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to move finished output into place at '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Failed to assemble output frame: {0}")]
    Frame(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
