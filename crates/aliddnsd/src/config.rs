//! Startup configuration
//!
//! The daemon is the only place that reads the process environment. It
//! builds one [`AliddnsConfig`] (optionally seeded from the JSON file named
//! by `ALIDNS_CONFIG`), overlays the `ALIDNS_*` variables, validates the
//! result and hands it to the library crates.

use aliddns_core::{AliddnsConfig, DesiredState};
use anyhow::{Context, Result};
use std::str::FromStr;
use tracing::Level;

/// Fully resolved daemon configuration
#[derive(Debug)]
pub struct DaemonConfig {
    /// Library configuration
    pub settings: AliddnsConfig,

    /// Maximum log level
    pub log_level: Level,
}

impl DaemonConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut settings = match var("ALIDNS_CONFIG") {
            Some(path) => AliddnsConfig::from_json_file(&path)
                .with_context(|| format!("ALIDNS_CONFIG: cannot load '{}'", path))?,
            None => AliddnsConfig::new(),
        };

        // Credentials
        if let Some(app_id) = var("ALIDNS_APP_ID") {
            settings.credentials.app_id = Some(app_id);
        }
        if let Some(app_secret) = var("ALIDNS_APP_SECRET") {
            settings.credentials.app_secret = Some(app_secret);
        }
        if let Some(region_id) = var("ALIDNS_REGION_ID") {
            settings.credentials.region_id = Some(region_id);
        }
        if let Some(endpoint) = var("ALIDNS_ENDPOINT") {
            settings.credentials.endpoint = Some(endpoint);
        }
        if let Some(mode) = var("ALIDNS_MODE") {
            settings.credentials.dry_run = match mode.trim().to_lowercase().as_str() {
                "dry-run" => true,
                "live" => false,
                _ => anyhow::bail!(
                    "ALIDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                    mode
                ),
            };
        }

        // Records
        if let Some(records) = var("ALIDNS_RECORDS") {
            settings.records = DesiredState::parse(&records)
                .with_context(|| format!("ALIDNS_RECORDS '{}' is not valid", records))?;
        }

        // IP discovery
        if let Some(url) = var("ALIDNS_IP_URL") {
            settings.ip_source.url = url;
        }
        if let Some(pattern) = var("ALIDNS_IP_PATTERN") {
            settings.ip_source.pattern = Some(pattern);
        }
        if let Some(secs) = parse_var(&var, "ALIDNS_IP_TIMEOUT_SECS")? {
            settings.ip_source.timeout_secs = secs;
        }

        // Engine
        if let Some(secs) = parse_var(&var, "ALIDNS_RUN_TIMEOUT_SECS")? {
            settings.engine.run_timeout_secs = secs;
        }
        if let Some(secs) = parse_var(&var, "ALIDNS_INTERVAL_SECS")? {
            settings.engine.interval_secs = secs;
        }

        let log_level = match var("ALIDNS_LOG_LEVEL") {
            Some(level) => parse_log_level(&level)?,
            None => Level::INFO,
        };

        settings
            .validate()
            .context("Configuration validation error")?;

        Ok(Self {
            settings,
            log_level,
        })
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} '{}' is not valid: {}", key, raw, e))
        })
        .transpose()
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "ALIDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}
