use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use spotcast::config::LoggingConfig;
use spotcast::{ActivityQuery, EngineConfig, ForecastSample, RiskEngine};

#[derive(Parser)]
#[command(name = "spotcast", version)]
#[command(about = "Point forecast interpolation and activity risk assessment")]
struct Args {
    /// JSON file holding the query and the forecast samples
    request: PathBuf,

    /// Configuration file (defaults to ./spotcast.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Request file: the query plus the forecast rows to interpolate from
#[derive(Debug, Deserialize)]
struct AssessmentRequest {
    query: ActivityQuery,
    samples: Vec<ForecastSample>,
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spotcast={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the JSON answer
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let request_path = args.request;

    let config = EngineConfig::load_from_path(args.config)?;
    init_logging(&config.logging);
    info!("spotcast {} starting", spotcast::VERSION);

    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("Failed to read request {}", request_path.display()))?;
    let request: AssessmentRequest =
        serde_json::from_str(&raw).with_context(|| "Failed to parse request JSON")?;

    let engine = RiskEngine::new(config);
    let assessment = match engine.assess(&request.query, &request.samples) {
        Ok(assessment) => assessment,
        Err(err) => {
            error!("{err}");
            bail!("{}", err.user_message());
        }
    };

    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}
