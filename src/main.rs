use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use time::macros::format_description;

use movielens_subset::{run_pipeline, CapOverrides, DatasetLayout, FilterConfig};

#[derive(Parser, Clone)]
#[command(name = "MovieLens Subset Builder")]
#[command(about = "Filters MovieLens ratings, links, tags and movies down to a bounded, ASCII-safe subset for SQL import.")]
#[command(version = "1.0.0")]
struct Cli {
    #[arg(short, long, default_value = ".", help = "Directory containing ratings.csv, links.csv, tags.csv and movies.csv")]
    data_dir: PathBuf,
    #[arg(short, long, help = "Output directory for filtered CSV files (defaults to the data directory)")]
    output: Option<PathBuf>,
    #[arg(short, long, help = "Path to a YAML file with filter caps")]
    config: Option<PathBuf>,
    #[command(flatten)]
    caps: CapOverrides,
    #[arg(short, long, help = "Hide progress spinners")]
    quiet: bool,
    #[arg(short, long, default_value = "INFO", help = "Logging level (DEBUG, INFO, WARN, ERROR)")]
    log_level: String,
}

impl Cli {
    fn filter_config(&self) -> Result<FilterConfig> {
        let config = match &self.config {
            Some(path) => {
                info!("Loading filter configuration from: {}", path.display());
                FilterConfig::load(path)?
            }
            None => FilterConfig::default(),
        };

        Ok(config.apply_overrides(&self.caps))
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, elapsed.subsec_millis())
    }
}

fn describe_cap(cap: Option<usize>) -> String {
    cap.map_or_else(|| "unlimited".to_string(), |c| c.to_string())
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_uppercase().as_str() {
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "ERROR" => LevelFilter::Error,
        _ => { eprintln!("Invalid log level '{}', defaulting to INFO.", cli.log_level); LevelFilter::Info }
    };
    SimpleLogger::new()
        .with_level(log_level)
        .with_timestamp_format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .init()?;

    info!("Starting MovieLens Subset Builder");
    info!("Run Timestamp: {}", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let config = cli.filter_config().context("Failed to resolve filter configuration")?;
    let data_dir = cli.data_dir.canonicalize()
        .with_context(|| format!("Data directory not found: {}", cli.data_dir.display()))?;
    let layout = DatasetLayout::new(data_dir, cli.output.clone());
    info!("Working directory detected as: {}", layout.input_dir.display());
    info!("Output directory: {}", layout.output_dir.display());
    info!(
        "Caps: users <= {}, movies {}, tags/movie {}, ratings/user {}, ascii_only={}",
        config.max_users,
        describe_cap(config.max_movies),
        describe_cap(config.max_tags_per_movie),
        describe_cap(config.max_ratings_per_user),
        config.ascii_only
    );

    let report = match run_pipeline(&layout, &config, !cli.quiet) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("-------------------- FINAL SUMMARY --------------------");
    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    info!("Users retained: {}", report.users);
    info!("Movies retained: {}", report.allowed_movies.len());
    for stage in &report.stages {
        info!("  - {} ({}): {} rows, sha256 {}", stage.path.display(), stage.name, stage.rows_written, stage.sha256);
    }
    info!("Done.");
    info!("-------------------------------------------------------");

    Ok(())
}
