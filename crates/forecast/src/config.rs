use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::disaster::Horizon;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one forecast horizon is required")]
    NoHorizons,
    #[error("forecast horizons must be positive hours")]
    ZeroHorizon,
    #[error("invalid horizon list {0:?} (expected e.g. \"6,12,24\")")]
    InvalidHorizonList(String),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    #[error("api base url is required")]
    EmptyApiBase,
    #[error("inference options must be a JSON object")]
    OptionsNotObject,
}

/// Configuration of the forecast overlay core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastConfig {
    pub enabled: bool,
    pub horizons: Vec<u32>,
    pub poll_interval_ms: u64,
    pub api_base: String,
    /// Per-request timeout; defaults to the poll interval.
    pub request_timeout_ms: Option<u64>,
    /// Forwarded verbatim as `options` in every inference request.
    pub options: Value,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            horizons: vec![6, 12, 24],
            poll_interval_ms: 60_000,
            api_base: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: None,
            options: Value::Object(Map::new()),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.horizons()?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::EmptyApiBase);
        }
        if !self.options.is_object() {
            return Err(ConfigError::OptionsNotObject);
        }
        Ok(())
    }

    /// Configured horizons in configuration order, duplicates removed.
    pub fn horizons(&self) -> Result<Vec<Horizon>, ConfigError> {
        if self.horizons.is_empty() {
            return Err(ConfigError::NoHorizons);
        }
        let mut out: Vec<Horizon> = Vec::with_capacity(self.horizons.len());
        for &hours in &self.horizons {
            let horizon = Horizon::new(hours).ok_or(ConfigError::ZeroHorizon)?;
            if !out.contains(&horizon) {
                out.push(horizon);
            }
        }
        Ok(out)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(self.poll_interval_ms))
    }
}

/// Parse a comma-separated horizon list such as `"6,12,24"`.
pub fn parse_horizon_list(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let hours: Result<Vec<u32>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<u32>)
        .collect();
    match hours {
        Ok(hours) if !hours.is_empty() => Ok(hours),
        _ => Err(ConfigError::InvalidHorizonList(raw.to_string())),
    }
}
