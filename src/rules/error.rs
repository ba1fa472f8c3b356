use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Rule set '{flag}' has no condition rules")]
    NoRules { flag: String },

    #[error("Persistence window for '{flag}' must be between 1 and {max} days, got {window}")]
    InvalidWindow {
        flag: String,
        window: usize,
        max: usize,
    },

    #[error("Rule set '{flag}' defines condition '{label}' more than once")]
    DuplicateRule { flag: String, label: String },

    #[error("Rule set '{flag}' would write column '{column}' twice")]
    ColumnClash { flag: String, column: String },

    #[error("Threshold for '{label}' is not a finite number")]
    InvalidThreshold { label: String },

    #[error("Unknown comparison operator '{0}' (expected one of >, >=, <, <=)")]
    UnknownOperator(String),

    #[error("Failed to read rule file '{0}'")]
    RuleFileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse rule file '{0}'")]
    RuleFileParse(PathBuf, #[source] toml::de::Error),
}
