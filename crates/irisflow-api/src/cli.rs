use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "irisflow-api")]
#[command(about = "Serve Iris classifier predictions over HTTP", long_about = None)]
pub struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long, env = "IRISFLOW_CONFIG")]
    pub config: Option<String>,

    /// Model artifact to serve
    #[arg(short, long)]
    pub model_path: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
