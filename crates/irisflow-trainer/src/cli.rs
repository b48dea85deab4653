use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "irisflow-train")]
#[command(
    author,
    version,
    about = "Train the Iris classifier and write the model artifact"
)]
pub struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long, env = "IRISFLOW_CONFIG")]
    pub config: Option<String>,

    /// Artifact output path
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Metrics summary output path (defaults to metrics.json next to the artifact)
    #[arg(long)]
    pub metrics_path: Option<PathBuf>,

    /// Minimum held-out accuracy required to save the model
    #[arg(long)]
    pub threshold: Option<f64>,

    /// MLflow server URL or local tracking directory
    #[arg(long)]
    pub tracking_uri: Option<String>,

    /// Experiment name used by the tracking backend
    #[arg(long)]
    pub experiment: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
