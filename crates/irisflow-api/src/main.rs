//! irisflow API server
//!
//! Serves predictions from the trained Iris classifier artifact.

use anyhow::Result;
use clap::Parser;
use irisflow_api::cli::Cli;
use irisflow_api::{create_router, ApiConfig, AppState};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting irisflow API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::load(&cli)?;
    let addr = config.socket_addr()?;
    info!("Model artifact: {}", config.model_path.display());

    let metrics_handle = init_metrics()?;
    let state = AppState::new(config).with_metrics(metrics_handle);

    // A missing artifact is not fatal; /health reports 503 until it appears
    match state.models.get().await {
        Ok(predictor) => info!(
            run_id = %predictor.artifact().run_id,
            accuracy = predictor.artifact().accuracy().unwrap_or_default(),
            "Model ready"
        ),
        Err(e) => warn!("Model not loaded at startup: {}", e),
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("irisflow=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("irisflow=info,tower_http=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "irisflow_requests_total",
        "Total number of prediction requests by endpoint"
    );
    metrics::describe_counter!(
        "irisflow_predictions_total",
        "Total number of feature vectors classified"
    );
    metrics::describe_histogram!(
        "irisflow_inference_latency_us",
        metrics::Unit::Microseconds,
        "Model inference latency in microseconds by endpoint"
    );
    metrics::describe_counter!("irisflow_errors_total", "Total number of errors by type");

    info!("Metrics exporter initialized");
    Ok(handle)
}
