use clap::Parser;
use ink2pixel::{process_batch, Args, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::try_from(args)?;

    tracing::info!("Starting ink2pixel v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        contrast = config.conditioner.contrast.as_str(),
        denoise = config.conditioner.denoise.as_str(),
        threshold = config.conditioner.threshold.as_str(),
        output_dir = %config.output_dir.display(),
        "Configured pipeline"
    );

    let inputs = config.inputs.clone();
    let outcomes = process_batch(inputs, Arc::new(config)).await;

    println!("{}", serde_json::to_string_pretty(&summary(&outcomes))?);

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} pages failed", outcomes.len());
    }
    Ok(())
}

/// Per-page one-line summary printed on stdout
fn summary(outcomes: &[ink2pixel::PageOutcome]) -> Vec<serde_json::Value> {
    outcomes
        .iter()
        .map(|o| match (&o.report, &o.error) {
            (Some(report), _) => serde_json::json!({
                "source": o.source,
                "lines": report.lines.len(),
                "characters": report.characters.len(),
                "regions": report.regions.len(),
                "outputs": report.outputs,
            }),
            (None, error) => serde_json::json!({
                "source": o.source,
                "error": error,
            }),
        })
        .collect()
}
