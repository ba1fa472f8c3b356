use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A single unparseable date voids the whole batch: without reliable
    /// dating neither the calendar nor the interpolation can be trusted.
    #[error("Corrupted date column: record {index} has unparseable date '{value}'")]
    CorruptDateColumn { index: usize, value: String },
}
