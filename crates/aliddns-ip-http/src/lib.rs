// # HTTP IP Source
//
// This crate discovers the host's public IPv4 address by fetching a page
// that echoes the caller's address and extracting it with a regular
// expression.
//
// ## Behavior
//
// - One GET per call to `current()`; nothing is cached between calls
// - Non-2xx status, transport failure, timeout, or a body without a
//   valid dotted quad all fail with `Error::Discovery`
// - The first match wins
//
// ## Default Source
//
// `http://www.net.cn/static/customercare/yourip.asp`, which wraps the
// address in `<h2>...</h2>`. Any other page can be used by supplying a URL
// and a pattern whose first capture group holds the address.

use aliddns_core::config::IpSourceConfig;
use aliddns_core::traits::IpSource;
use aliddns_core::{Error, Result};

use regex::Regex;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Pattern matching the address on the default page
pub const DEFAULT_PATTERN: &str = r"<h2>((\d{1,3})(\.\d{1,3}){3})</h2>";

/// IP source that scrapes the address out of an HTML page
pub struct HttpIpSource {
    /// URL to fetch
    url: String,

    /// Extraction pattern; capture group 1 holds the address
    pattern: Regex,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `config`: URL, optional custom pattern and request timeout
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: The config is invalid, the pattern does not
    ///   compile, or it has no capture group
    pub fn new(config: &IpSourceConfig) -> Result<Self> {
        config.validate()?;

        let pattern = compile_pattern(config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            pattern,
            client,
        })
    }

    /// The URL this source fetches
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_body(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::discovery(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::discovery(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::discovery(format!("Failed to read response: {}", e)))
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let body = self.fetch_body().await?;

        let ip = extract_ipv4(&body, &self.pattern).ok_or_else(|| {
            Error::discovery(format!("No IPv4 address found in response from {}", self.url))
        })?;

        tracing::debug!("Discovered {} via {}", ip, self.url);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Compile an extraction pattern, requiring at least one capture group
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern)
        .map_err(|e| Error::config(format!("Invalid IP pattern '{}': {}", pattern, e)))?;

    if regex.captures_len() < 2 {
        return Err(Error::config(format!(
            "IP pattern '{}' needs a capture group for the address",
            pattern
        )));
    }

    Ok(regex)
}

/// Extract the first address captured by `pattern` from `body`
///
/// Only the first match is considered. Returns `None` when nothing matches
/// or when the captured text is not a valid IPv4 address (e.g. `999.1.1.1`).
pub fn extract_ipv4(body: &str, pattern: &Regex) -> Option<Ipv4Addr> {
    let captures = pattern.captures(body)?;
    captures.get(1)?.as_str().trim().parse().ok()
}
