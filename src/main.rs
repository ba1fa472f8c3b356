mod cli;

use anyhow::Context;
use blastdt::{
    get_cache_dir, BlastPredictor, Consolidator, DataSource, RuleConfig, RuleVariant,
    StationFilter, StationList, Thresholds,
};
use chrono::{Datelike, Local};
use clap::Parser;
use cli::{Cli, Command, ConsolidateArgs, PredictArgs};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Predict(args) => predict(args).await,
        Command::Consolidate(args) => consolidate(args).await,
    }
}

fn rule_config(args: &PredictArgs) -> anyhow::Result<(RuleConfig, PathBuf)> {
    if let Some(path) = &args.rules {
        let config = RuleConfig::from_toml_file(path)?;
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("prediction_{}", config.flag_name())));
        return Ok((config, output_dir));
    }

    let variant = RuleVariant::from(args.variant);
    if variant == RuleVariant::BlastDt3 && args.window.is_some() {
        warn!("{} has no persistence window; --window is ignored", variant);
    }
    let config = variant.config_with(Thresholds {
        rh: args.rh_threshold,
        t_upper: args.t_threshold_upper,
        t_lower: args.t_threshold_lower,
        window: args.window,
    })?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(variant.output_dir_name()));
    Ok((config, output_dir))
}

async fn predict(args: PredictArgs) -> anyhow::Result<()> {
    let (config, output_dir) = rule_config(&args)?;
    let cache_dir = match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => get_cache_dir().context("Failed to determine cache directory")?,
    };

    let listing = StationList::load(&args.stations, &cache_dir)
        .await
        .with_context(|| format!("Failed to load station listing from {}", args.stations))?;
    let stations = StationFilter::new()
        .with_ids(args.station_ids.iter().cloned())
        .apply(listing.stations());
    info!(
        "{} of {} listed stations selected",
        stations.len(),
        listing.len()
    );

    let predictor = BlastPredictor::with_cache_folder(
        DataSource::parse(&args.data_root),
        output_dir,
        cache_dir,
    )
    .await?;
    let end_year = args.end_year.unwrap_or_else(|| Local::now().year());
    let summary = predictor
        .run()
        .stations(&stations)
        .config(&config)
        .start_year(args.start_year)
        .end_year(end_year)
        .concurrency(args.concurrency)
        .source_timeout(Duration::from_secs(args.timeout_secs))
        .call()
        .await?;

    for failure in &summary.failures {
        warn!(
            "Cannot classify station {} for {}: {}",
            failure.station,
            failure.year,
            error_chain(&failure.error)
        );
    }
    info!(
        "Done: {} file(s) written to {}, {} unit(s) without data, {} failed",
        summary.written,
        predictor.output_dir().display(),
        summary.skipped,
        summary.failures.len()
    );
    Ok(())
}

/// Joins an error with its sources, outermost first.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

async fn consolidate(args: ConsolidateArgs) -> anyhow::Result<()> {
    let summary = Consolidator::new(&args.input_root, &args.output_dir)
        .run()
        .await
        .with_context(|| format!("Failed to consolidate {}", args.input_root.display()))?;
    info!(
        "Consolidated {} file(s) into {} daily file(s) in {} ({} skipped)",
        summary.files_read,
        summary.files_written,
        args.output_dir.display(),
        summary.files_skipped
    );
    Ok(())
}
