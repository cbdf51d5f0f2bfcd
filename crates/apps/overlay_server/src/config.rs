use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use forecast::{parse_horizon_list, ConfigError, ForecastConfig};
use thiserror::Error;
use tracing::warn;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Disaster forecast overlay server")]
pub struct Args {
    /// JSON file with the forecast configuration (camelCase keys)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Listen address (default: 127.0.0.1:9200)
    #[arg(long)]
    pub addr: Option<SocketAddr>,

    /// Base URL of the inference service
    #[arg(long)]
    pub api_base: Option<String>,

    /// Comma-separated forecast horizons in hours, e.g. 6,12,24
    #[arg(long)]
    pub horizons: Option<String>,

    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    /// Start with polling disabled
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid {key}: {value:?}")]
    Env { key: &'static str, value: String },
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub forecast: ForecastConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            forecast: ForecastConfig::default(),
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9200))
}

impl ServerConfig {
    /// Config file, then environment, then command-line flags; later layers win.
    pub fn load(args: &Args) -> Result<Self, LoadError> {
        Self::load_with(args, |key| std::env::var(key).ok())
    }

    pub fn load_with(
        args: &Args,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LoadError> {
        let mut cfg = ServerConfig {
            addr: default_addr(),
            forecast: match &args.config {
                Some(path) => read_config_file(path)?,
                None => ForecastConfig::default(),
            },
        };
        cfg.apply_env(&env)?;
        cfg.apply_args(args)?;
        cfg.forecast.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), LoadError> {
        if let Some(v) = env("FORECAST_ENABLED") {
            self.forecast.enabled = parse_bool(&v).ok_or(LoadError::Env {
                key: "FORECAST_ENABLED",
                value: v,
            })?;
        }
        if let Some(v) = env("FORECAST_HORIZONS") {
            self.forecast.horizons = parse_horizon_list(&v)?;
        }
        if let Some(ms) = env_var_u64(env, "FORECAST_POLL_INTERVAL_MS") {
            self.forecast.poll_interval_ms = ms;
        }
        if let Some(ms) = env_var_u64(env, "FORECAST_REQUEST_TIMEOUT_MS") {
            self.forecast.request_timeout_ms = Some(ms);
        }
        if let Some(v) = env("FORECAST_API_BASE") {
            self.forecast.api_base = v;
        }
        if let Some(v) = env("OVERLAY_ADDR") {
            self.addr = v.parse().map_err(|_| LoadError::Env {
                key: "OVERLAY_ADDR",
                value: v,
            })?;
        }
        Ok(())
    }

    fn apply_args(&mut self, args: &Args) -> Result<(), LoadError> {
        if let Some(addr) = args.addr {
            self.addr = addr;
        }
        if let Some(api_base) = &args.api_base {
            self.forecast.api_base = api_base.clone();
        }
        if let Some(horizons) = &args.horizons {
            self.forecast.horizons = parse_horizon_list(horizons)?;
        }
        if let Some(ms) = args.poll_interval_ms {
            self.forecast.poll_interval_ms = ms;
        }
        if let Some(ms) = args.request_timeout_ms {
            self.forecast.request_timeout_ms = Some(ms);
        }
        if args.disabled {
            self.forecast.enabled = false;
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ForecastConfig, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_var_u64(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not an unsigned integer");
            None
        }
    }
}
