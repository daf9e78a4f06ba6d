//! `vedit` binary: one pipeline run configured from the environment.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vedit_models::Stage;
use vedit_pipeline::{Pipeline, PipelineConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,chromiumoxide=warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting vedit");

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    info!("Pipeline config: {:?}", config);

    let pipeline = Pipeline::from_config(config).context("Failed to set up pipeline")?;
    let report = pipeline.run().await?;

    for stage in [Stage::Encode, Stage::Concat, Stage::Overlay] {
        if let Some(path) = report.output(stage) {
            info!(stage = %stage, path = %path.display(), "Output written");
        }
    }
    info!(
        run_id = %report.run_id,
        frames = report.frames.len(),
        capture_failures = report.capture_failures.len(),
        elapsed_ms = report.elapsed_ms,
        "Run complete"
    );
    Ok(())
}
