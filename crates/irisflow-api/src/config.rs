//! Server configuration
//!
//! Defaults, then an optional YAML file, then `MODEL_PATH`, `LISTEN_ADDR`
//! and `PORT` from the environment, then command-line flags.

use crate::cli::Cli;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default artifact location, shared with the trainer
pub const DEFAULT_MODEL_PATH: &str = "models/trained_model.pkl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Model artifact to serve
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            listen_addr: default_listen_addr(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ApiConfig {
    /// Load from the process environment, optional file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = Self::from_sources(
            cli.config.as_deref(),
            Environment::default().try_parsing(true),
        )?;
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn from_sources(file: Option<&str>, env: Environment) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder.add_source(env).build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.model_path {
            self.model_path = path.clone();
        }
        if let Some(listen) = &cli.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.listen_addr, self.port).parse()?)
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}
