//! vitalis CLI: train the health-metric classifiers and query them.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vitalis::{Domain, HealthMonitor, PipelineConfig, VitalisError};

#[derive(Parser)]
#[command(name = "vitalis")]
#[command(about = "Heart-rate risk, BMI and blood-sugar classifiers")]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug events (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train one domain, or all of them
    Train {
        /// Domain to train (heart_rate, bmi, blood_sugar)
        #[arg(short, long)]
        domain: Option<Domain>,
    },

    /// Classify a raw record with a trained model
    Predict {
        /// Domain of the record
        #[arg(short, long)]
        domain: Domain,

        /// Field value as NAME=VALUE, repeated for each feature
        #[arg(short, long = "field", value_name = "NAME=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Describe the dataset of a domain
    Stats {
        /// Domain whose dataset to summarize
        #[arg(short, long)]
        domain: Domain,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        let monitor = HealthMonitor::new(config);
        match cli.command {
            Commands::Train { domain } => cmd_train(&monitor, domain),
            Commands::Predict { domain, fields } => cmd_predict(&monitor, domain, &fields),
            Commands::Stats { domain, json } => cmd_stats(&monitor, domain, json),
        }
    });

    if let Err(e) = result {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(PipelineConfig::load(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_train(
    monitor: &HealthMonitor,
    domain: Option<Domain>,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let reports = match domain {
        Some(domain) => vec![monitor.pipeline(domain).train()?],
        None => monitor.train_all()?,
    };

    section("Training Results");
    for report in &reports {
        println!("{report}");
        println!();
    }
    println!("Trained {} model(s) in {:.2}s", reports.len(), start.elapsed().as_secs_f64());
    Ok(())
}

fn cmd_predict(
    monitor: &HealthMonitor,
    domain: Domain,
    fields: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = parse_fields(fields)?;
    let prediction = monitor.predict_with_confidence(domain, &raw)?;

    section("Prediction");
    key_value("Domain", domain);
    key_value("Label", &prediction.label);
    key_value("Confidence", format!("{:.2}", prediction.confidence));
    Ok(())
}

fn cmd_stats(
    monitor: &HealthMonitor,
    domain: Domain,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = monitor.load_dataset(domain)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn section(title: &str) {
    println!("{}", format!("=== {title} ===").cyan().bold());
}

fn key_value(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {value}", key.white().bold());
}

/// Parses `NAME=VALUE` pairs. Names may contain spaces and parentheses,
/// so only the last `=` separates name from value.
fn parse_fields(fields: &[String]) -> Result<BTreeMap<String, f64>, VitalisError> {
    let mut raw = BTreeMap::new();
    for field in fields {
        let (name, value) = field
            .rsplit_once('=')
            .ok_or_else(|| VitalisError::validation(field.as_str(), "expected NAME=VALUE"))?;
        let name = name.trim();
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| VitalisError::validation(name, format!("'{value}' is not a number")))?;
        if raw.insert(name.to_string(), value).is_some() {
            return Err(VitalisError::validation(name, "given more than once"));
        }
    }
    Ok(raw)
}
