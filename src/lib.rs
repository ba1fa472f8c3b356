mod classify;
mod consolidate;
mod error;
mod output;
mod predictor;
mod rules;
mod series;
mod source;
mod stations;
mod types;
mod utils;

pub use error::BlastError;
pub use predictor::*;

pub use classify::classifier::{classify, ClassifiedSeries, ConditionColumn};
pub use classify::error::ClassifyError;
pub use classify::rolling::rolling_all;

pub use consolidate::consolidator::{
    consolidate_folder, ConsolidateSummary, Consolidator, DEFAULT_CONSOLIDATED_DIR,
};
pub use consolidate::error::ConsolidateError;

pub use output::error::OutputError;
pub use output::writer::{to_dataframe, OutputWriter};

pub use rules::config::{Comparison, ConditionRule, RuleConfig, MAX_WINDOW};
pub use rules::error::ConfigError;
pub use rules::variant::{RuleVariant, Thresholds};

pub use series::error::NormalizeError;
pub use series::normalize::{normalize, normalize_with_stats, NormalizeStats};

pub use source::data_loader::DailyDataLoader;
pub use source::data_source::{DataSource, DEFAULT_REMOTE_ROOT};
pub use source::error::SourceError;

pub use stations::error::StationListError;
pub use stations::filter::StationFilter;
pub use stations::station_list::{StationList, DEFAULT_STATION_LIST_URL};

pub use types::condition::Condition;
pub use types::daily::{DailyRecord, DailySeries, RawDailyRecord, VAR_RH, VAR_TX, VAR_TX_MAX_ABS};
pub use types::period::{DateWindow, Year};
pub use types::station::Station;

pub use utils::get_cache_dir;
