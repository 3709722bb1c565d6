//! Configuration types for the synchronizer
//!
//! The configuration is built once at startup (by the daemon, from the
//! environment and an optional JSON file) and handed to the components that
//! need it. Nothing in this crate reads process environment itself.

use crate::records::DesiredState;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default "what is my IP" page, which wraps the caller's address in `<h2>`
pub const DEFAULT_IP_URL: &str = "http://www.net.cn/static/customercare/yourip.asp";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliddnsConfig {
    /// Provider credentials and endpoint
    #[serde(default, rename = "alidns")]
    pub credentials: CredentialsConfig,

    /// IP discovery settings
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Domains and the labels that should point at the host IP
    #[serde(default)]
    pub records: DesiredState,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AliddnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::config(format!("Invalid configuration document: {}", e)))
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Validate the configuration
    ///
    /// Records are not required here: a delete invocation needs credentials
    /// but no desired state.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credentials.resolve()?;
        self.ip_source.validate()?;
        self.engine.validate()?;
        self.records.validate()?;
        Ok(())
    }
}

/// Provider credentials
///
/// All three of `app_id`, `app_secret` and `region_id` are required; they are
/// optional here so a partially filled file can be completed from the
/// environment before validation.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// AccessKey ID
    #[serde(default)]
    pub app_id: Option<String>,

    /// AccessKey secret
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Region identifier (e.g. "cn-hangzhou")
    #[serde(default)]
    pub region_id: Option<String>,

    /// Endpoint override; derived from the region when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Perform reads only and log intended mutations
    #[serde(default)]
    pub dry_run: bool,
}

// Custom Debug implementation that hides the secret
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<REDACTED>"))
            .field("region_id", &self.region_id)
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Credentials with every required value present
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
    pub region_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<REDACTED>")
            .field("region_id", &self.region_id)
            .finish()
    }
}

impl CredentialsConfig {
    /// Create credentials from the three required values
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        region_id: impl Into<String>,
    ) -> Self {
        Self {
            app_id: Some(app_id.into()),
            app_secret: Some(app_secret.into()),
            region_id: Some(region_id.into()),
            endpoint: None,
            dry_run: false,
        }
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check that every required value is present and non-empty
    pub fn resolve(&self) -> Result<Credentials, crate::Error> {
        let mut missing = Vec::new();
        let app_id = required(&self.app_id, "app_id", &mut missing);
        let app_secret = required(&self.app_secret, "app_secret", &mut missing);
        let region_id = required(&self.region_id, "region_id", &mut missing);

        match (app_id, app_secret, region_id) {
            (Some(app_id), Some(app_secret), Some(region_id)) => Ok(Credentials {
                app_id,
                app_secret,
                region_id,
            }),
            _ => Err(crate::Error::config(format!(
                "Missing Alidns credentials: {}",
                missing.join(", ")
            ))),
        }
    }
}

fn required(value: &Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            missing.push(name);
            None
        }
    }
}

/// IP discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL of the page echoing the caller's address
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Custom extraction pattern; capture group 1 must hold the address
    #[serde(default)]
    pub pattern: Option<String>,

    /// Request timeout (in seconds)
    #[serde(default = "default_ip_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP discovery URL cannot be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "IP discovery URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP discovery timeout must be > 0"));
        }
        if let Some(pattern) = &self.pattern
            && pattern.is_empty()
        {
            return Err(crate::Error::config("IP discovery pattern cannot be empty"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            pattern: None,
            timeout_secs: default_ip_timeout_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deadline for one whole reconciliation run (in seconds)
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Pause between runs when the daemon loops (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.run_timeout_secs == 0 {
            return Err(crate::Error::config("Run timeout must be > 0"));
        }
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Sync interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_timeout_secs: default_run_timeout_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

fn default_ip_timeout_secs() -> u64 {
    10
}

fn default_run_timeout_secs() -> u64 {
    300
}

fn default_interval_secs() -> u64 {
    600
}
