//! Orchestrator configuration, loadable from YAML.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeouts for the two orchestrated phases. A zero duration means unbounded.
///
/// Durations are written in humantime form:
///
/// ```yaml
/// start_timeout: 10s
/// stop_timeout: 1m 30s
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
  #[serde(default = "default_start_timeout", deserialize_with = "humantime_duration")]
  pub start_timeout: Duration,
  #[serde(default = "default_stop_timeout", deserialize_with = "humantime_duration")]
  pub stop_timeout: Duration,
}

fn default_start_timeout() -> Duration {
  DEFAULT_START_TIMEOUT
}

fn default_stop_timeout() -> Duration {
  DEFAULT_STOP_TIMEOUT
}

fn humantime_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Parses a humantime duration; a bare `0` is accepted as "unbounded".
pub fn parse_duration(raw: &str) -> Result<Duration> {
  let raw = raw.trim();
  if raw == "0" {
    return Ok(Duration::ZERO);
  }
  humantime::parse_duration(raw).map_err(|e| Error::Config(format!("invalid duration '{}': {}", raw, e)))
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      start_timeout: DEFAULT_START_TIMEOUT,
      stop_timeout: DEFAULT_STOP_TIMEOUT,
    }
  }
}

impl AppConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
  }

  pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
      .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    Self::from_yaml_str(&contents)
  }
}
