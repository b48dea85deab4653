use anyhow::Result;
use clap::Parser;
use irisflow_tracking::select_tracker;
use irisflow_trainer::cli::Cli;
use irisflow_trainer::{train, TrainerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting irisflow trainer v{}", env!("CARGO_PKG_VERSION"));

    let config = TrainerConfig::load(&cli)?;
    info!(
        model_path = %config.model_path.display(),
        threshold = config.accuracy_threshold,
        "Configuration loaded"
    );

    let tracker = select_tracker(&config.tracking()).await;
    let report = train(&config, tracker.as_ref()).await?;

    info!(
        run_id = %report.run_id,
        accuracy = report.accuracy(),
        n_train = report.n_train,
        n_test = report.n_test,
        metrics_path = %report.metrics_path.display(),
        "Training complete"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("irisflow=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("irisflow=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
