//! CLI entry point for the regatta rater.
//!
//! Provides subcommands for processing segment exports, collecting weather,
//! inspecting name unification, and exporting model features.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use regatta_rater::{
    config::PipelineConfig,
    features::build_features,
    identity::unify_names,
    infra::{
        names::{NameDataset, UnavailableNames},
        openweather::OpenWeatherClient,
    },
    output::{print_json, read_rows, write_csv, write_json, write_observations, write_rows},
    parser::{read_segments_path, read_weather_path},
    pipeline::Pipeline,
    services::{NameLookup, Place},
    weather::{CollectionPlan, DEFAULT_HOURS, collect_observations, merge_observations},
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "regatta_rater")]
#[command(about = "Clean, enrich and rate sailing race segment data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run identity resolution, weather join, metrics and outlier filtering
    Process {
        /// Segment CSV export (optionally .gz)
        #[arg(short, long)]
        segments: String,

        /// Weather observations CSV
        #[arg(short, long)]
        weather: Option<String>,

        /// First-name knowledge base CSV (name,country,rank,male,female)
        #[arg(short, long)]
        names: Option<String>,

        /// Pipeline configuration JSON
        #[arg(short, long)]
        config: Option<String>,

        /// Processed rows output; a .gz suffix compresses it
        #[arg(short, long, default_value = "processed.csv")]
        output: String,

        /// Optional path for the JSON run report
        #[arg(long)]
        report: Option<String>,
    },
    /// Fetch hourly historical weather for a place and merge it into a CSV
    FetchWeather {
        /// Place name, also used as the observation location
        #[arg(short, long)]
        place: String,

        /// Latitude; skips geocoding when given with --lon
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Weather CSV to create or merge into
        #[arg(short, long, default_value = "weather.csv")]
        output: String,

        /// Pause between requests in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,

        /// Pipeline configuration JSON, for the location precision
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Show how athlete names would be unified
    UnifyNames {
        /// Segment CSV export
        #[arg(short, long)]
        segments: String,

        /// Similarity threshold (0-100); defaults to the config value
        #[arg(short, long)]
        threshold: Option<u8>,

        /// Pipeline configuration JSON
        #[arg(short, long)]
        config: Option<String>,

        /// Optional CSV of raw_name,canonical_name pairs
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Build the model feature table from processed rows
    Features {
        /// Processed rows written by `process`
        #[arg(short, long)]
        input: String,

        /// Feature CSV output
        #[arg(short, long, default_value = "features.csv")]
        output: String,

        /// Pipeline configuration JSON
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[derive(Serialize)]
struct NameMapping<'a> {
    raw_name: &'a str,
    canonical_name: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/regatta_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("regatta_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            segments,
            weather,
            names,
            config,
            output,
            report,
        } => {
            let config = load_config(config.as_deref())?;
            let table = read_segments_path(&segments)
                .with_context(|| format!("reading segments from {segments}"))?;

            let observations = match weather {
                Some(path) => {
                    read_weather_path(&path)
                        .with_context(|| format!("reading weather from {path}"))?
                        .observations
                }
                None => {
                    warn!("No weather file given, wind metrics will be empty");
                    Vec::new()
                }
            };

            let lookup: Option<Box<dyn NameLookup>> = names.map(|path| -> Box<dyn NameLookup> {
                match NameDataset::load(&path) {
                    Ok(dataset) => {
                        info!(path = %path, names = dataset.len(), "Name knowledge base loaded");
                        Box::new(dataset)
                    }
                    Err(e) => {
                        warn!(path = %path, error = %e, "Name knowledge base could not be loaded");
                        Box::new(UnavailableNames::new(e.to_string()))
                    }
                }
            });

            let pipeline = Pipeline::new(config);
            let result = pipeline.run(table, observations, lookup.as_deref());

            write_rows(&output, &result.rows)?;
            print_json(&result.report)?;
            if let Some(path) = report {
                write_json(&path, &result.report)?;
            }
        }
        Commands::FetchWeather {
            place,
            lat,
            lon,
            from,
            to,
            output,
            delay_ms,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let api_key = std::env::var("OPENWEATHER_API_KEY")
                .context("OPENWEATHER_API_KEY must be set")?;
            let client = OpenWeatherClient::new(api_key);

            let plan = CollectionPlan {
                place: Place {
                    name: place,
                    coordinates: lat.zip(lon),
                },
                from,
                to,
                hours: DEFAULT_HOURS,
                delay: Duration::from_millis(delay_ms),
            };
            let fresh = collect_observations(&client, &plan).await?;

            let existing = if Path::new(&output).exists() {
                let table = read_weather_path(&output)
                    .with_context(|| format!("reading existing weather from {output}"))?;
                info!(path = %output, existing = table.observations.len(), "Merging with existing file");
                table.observations
            } else {
                Vec::new()
            };

            let merged = merge_observations(existing, fresh, config.join.coordinate_precision);
            write_observations(&output, &merged)?;
        }
        Commands::UnifyNames {
            segments,
            threshold,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let threshold = threshold.unwrap_or(config.identity.name_similarity_threshold);
            let table = read_segments_path(&segments)
                .with_context(|| format!("reading segments from {segments}"))?;

            let mapping = unify_names(
                table.records.iter().map(|r| r.athlete_name.as_str()),
                threshold,
            );

            for (raw, canonical) in mapping.iter().filter(|(raw, canonical)| raw != canonical) {
                info!(raw_name = %raw, canonical_name = %canonical, "Name merged");
            }
            let canonical_count = mapping
                .values()
                .collect::<std::collections::BTreeSet<_>>()
                .len();
            info!(
                distinct_names = mapping.len(),
                canonical_names = canonical_count,
                threshold,
                "Name unification summary"
            );

            if let Some(path) = output {
                let pairs: Vec<NameMapping> = mapping
                    .iter()
                    .map(|(raw, canonical)| NameMapping {
                        raw_name: raw,
                        canonical_name: canonical,
                    })
                    .collect();
                write_csv(&path, &pairs)?;
            }
        }
        Commands::Features {
            input,
            output,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let rows =
                read_rows(&input).with_context(|| format!("reading processed rows from {input}"))?;
            let (features, report) = build_features(&rows, &config.features);
            write_csv(&output, &features)?;
            print_json(&report)?;
        }
    }

    Ok(())
}

/// Loads the pipeline config, or the defaults when no path is given.
fn load_config(path: Option<&str>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::load(path)?;
            info!(path, "Configuration loaded");
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}
