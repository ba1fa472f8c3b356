use blastdt::{RuleVariant, DEFAULT_CONSOLIDATED_DIR, DEFAULT_REMOTE_ROOT, DEFAULT_STATION_LIST_URL};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Rice blast risk classification from daily station observations.
#[derive(Parser)]
#[command(name = "blastdt", version, about = "Rice blast risk classifier")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify every station-year and write one CSV per station and year.
    Predict(PredictArgs),
    /// Re-key prediction folders into one file per day.
    Consolidate(ConsolidateArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum VariantArg {
    /// Daily maximum above 23.5 °C and humidity above 80 % for three days.
    BlastDt,
    /// Maximum at least 20.7 °C, mean at most 30.7 °C, humidity at least 77 %.
    BlastDt2,
    /// Like blast-dt2 with a 74 % humidity bound and no persistence window.
    BlastDt3,
}

impl From<VariantArg> for RuleVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::BlastDt => RuleVariant::BlastDt,
            VariantArg::BlastDt2 => RuleVariant::BlastDt2,
            VariantArg::BlastDt3 => RuleVariant::BlastDt3,
        }
    }
}

#[derive(clap::Args)]
pub struct PredictArgs {
    /// Preset rule set.
    #[arg(long, value_enum, default_value = "blast-dt")]
    pub variant: VariantArg,

    /// Relative humidity bound (%).
    #[arg(long)]
    pub rh_threshold: Option<f64>,

    /// Upper mean temperature bound (°C).
    #[arg(long)]
    pub t_threshold_upper: Option<f64>,

    /// Lower daily maximum temperature bound (°C).
    #[arg(long)]
    pub t_threshold_lower: Option<f64>,

    /// Persistence window in days.
    #[arg(long)]
    pub window: Option<usize>,

    /// TOML rule file used instead of the preset.
    #[arg(
        long,
        conflicts_with_all = ["rh_threshold", "t_threshold_upper", "t_threshold_lower", "window"]
    )]
    pub rules: Option<PathBuf>,

    #[arg(long, default_value_t = 2020)]
    pub start_year: i32,

    /// Defaults to the current year.
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Defaults to the preset's folder (`prediction`, `prediction_BlastDT2`, ...).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Local directory or base URL of the daily archive.
    #[arg(long, default_value = DEFAULT_REMOTE_ROOT)]
    pub data_root: String,

    /// Station listing CSV, local path or URL.
    #[arg(long, default_value = DEFAULT_STATION_LIST_URL)]
    pub stations: String,

    /// Only process these station ids (repeatable).
    #[arg(long = "station")]
    pub station_ids: Vec<String>,

    /// Station-years processed at once.
    #[arg(long, default_value_t = blastdt::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Seconds allowed for loading one station-year's source files.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Cache directory for downloaded files.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ConsolidateArgs {
    /// Directory holding the prediction folders.
    #[arg(long, default_value = ".")]
    pub input_root: PathBuf,

    #[arg(short, long, default_value = DEFAULT_CONSOLIDATED_DIR)]
    pub output_dir: PathBuf,
}
