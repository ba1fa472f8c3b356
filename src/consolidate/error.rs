use crate::output::error::OutputError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("Failed to list directory '{0}'")]
    ReadDir(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Failed to assemble consolidated frame: {0}")]
    Frame(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
