//! XML configuration support.
//! Loads run settings from config.xml (quick_xml + serde):
//! <config>
//!   <steps>30</steps>
//!   <max_step_delay_ms>1000</max_step_delay_ms>
//!   <step_delay_ms>250</step_delay_ms>      (fixed delay; wins over max_step_delay_ms)
//!   <mode>attached</mode>
//!   <log_level>normal</log_level>
//!   <log_file>/path/to/graceful_worker.log</log_file>
//! </config>
//!
//! Notes:
//! - Unknown fields are rejected so typos surface instead of silently using defaults.

use anyhow::{anyhow, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::paths::{default_config_path, CONFIG_ENV};
use super::types::{Config, LogLevel};
use crate::supervisor::AttachmentMode;
use crate::worker::StepDelay;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    steps: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    step_delay_ms: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    max_step_delay_ms: Option<u64>,
    mode: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
}

// Custom deserializer that trims surrounding whitespace for optional u64
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid number '{s}': {e}"))),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(n) = parsed.steps {
        cfg.steps = u32::try_from(n).map_err(|_| anyhow!("steps out of range: {n}"))?;
    }

    if let Some(ms) = parsed.step_delay_ms {
        cfg.delay = StepDelay::Fixed(Duration::from_millis(ms));
    } else if let Some(ms) = parsed.max_step_delay_ms {
        cfg.delay = StepDelay::Random {
            max: Duration::from_millis(ms),
        };
    }

    // Empty elements mean "unset"; anything else must name a known value.
    if let Some(s) = non_empty(parsed.mode.as_deref()) {
        cfg.mode = s.parse::<AttachmentMode>().map_err(|e| anyhow!(e))?;
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }

    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid config xml '{}'", path.display()))
}

/// Resolve and load the config for this run.
///
/// Precedence: `explicit` path > $GRACEFUL_WORKER_CONFIG > OS default.
/// An explicit or env path must exist; a missing default file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(p) = explicit {
        debug!(path = %p.display(), "Loading config from --config");
        return load_config_from_xml_path(p);
    }

    let env_set = env::var_os(CONFIG_ENV).is_some();
    let path = default_config_path()?;
    if !path.exists() {
        if env_set {
            return Err(anyhow!(
                "{CONFIG_ENV} points to a missing file: {}",
                path.display()
            ));
        }
        debug!(path = %path.display(), "No config file; using defaults");
        return Ok(Config::default());
    }
    debug!(path = %path.display(), "Loading config");
    load_config_from_xml_path(&path)
}
