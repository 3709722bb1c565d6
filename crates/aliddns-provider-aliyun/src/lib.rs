// # Alibaba Cloud DNS Provider
//
// This crate provides the Alidns (Alibaba Cloud DNS, API version 2015-01-09)
// implementation of `aliddns_core::DnsProvider`.
//
// ## Behavior
//
// - One signed HTTP request per trait call (describe walks pages, one
//   request per page)
// - Errors are mapped onto `aliddns_core::Error` and returned; there is no
//   retry, backoff or caching here
// - HTTP timeout configured (30 seconds)
// - Dry-run mode: reads go through, create/update/delete are only logged
//
// ## Security Requirements
//
// - The AccessKey secret NEVER appears in logs or Debug output
// - Missing credentials fail at construction, before any network call
//
// ## API Reference
//
// - Endpoint: `https://alidns.<region>.aliyuncs.com/` (RPC style, POST)
// - Signature: ACS3-HMAC-SHA256 over an empty body
// - Actions: DescribeDomainRecords, AddDomainRecord, UpdateDomainRecord,
//   DeleteDomainRecord

mod error;
mod sign;
mod types;

pub use sign::{query_string, url_encode};

use aliddns_core::traits::RECORD_TYPE_A;
use aliddns_core::{Credentials, CredentialsConfig, DnsProvider, DomainRecord, Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::Ipv4Addr;
use std::time::Duration;

use types::{
    AddDomainRecordRequest, AddDomainRecordResponse, ApiErrorBody, DeleteDomainRecordRequest,
    DescribeDomainRecordsRequest, DescribeDomainRecordsResponse, MutationResponse,
    UpdateDomainRecordRequest,
};

/// Name used in errors and logs
pub const PROVIDER_NAME: &str = "aliyun";

/// Alidns API version
pub(crate) const API_VERSION: &str = "2015-01-09";

/// SHA256 of the empty request body
pub(crate) const EMPTY_BODY_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Largest page DescribeDomainRecords accepts
pub const PAGE_SIZE: u32 = 500;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Record identifier returned for creates in dry-run mode
pub const DRY_RUN_RECORD_ID: &str = "dry-run";

/// Regional Alidns endpoint
pub fn regional_endpoint(region_id: &str) -> String {
    format!("https://alidns.{}.aliyuncs.com/", region_id)
}

/// Alibaba Cloud DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform DescribeDomainRecords normally
/// - Log the parameters of every mutating call
/// - **NOT** send AddDomainRecord, UpdateDomainRecord or DeleteDomainRecord
pub struct AliyunProvider {
    /// AccessKey pair and region
    /// ⚠️ NEVER log the secret
    credentials: Credentials,

    /// `scheme://host[:port]` requests are sent to
    base_url: String,

    /// Value of the signed `host` header
    host: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, skip mutating calls
    dry_run: bool,
}

// Custom Debug implementation that hides the AccessKey secret
impl std::fmt::Debug for AliyunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunProvider")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl AliyunProvider {
    /// Create a new Alidns provider
    ///
    /// # Parameters
    ///
    /// - `config`: AccessKey pair, region, optional endpoint override and
    ///   dry-run flag
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: A credential is missing, or the endpoint is
    ///   not an http(s) URL
    pub fn new(config: &CredentialsConfig) -> Result<Self> {
        let credentials = config.resolve()?;

        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| regional_endpoint(&credentials.region_id));

        let (base_url, host) = parse_endpoint(&endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.dry_run {
            tracing::warn!("Alidns provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            credentials,
            base_url,
            host,
            client,
            dry_run: config.dry_run,
        })
    }

    /// Whether mutating calls are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    /// Execute one signed RPC call
    ///
    /// # Parameters
    ///
    /// - `action`: API action name
    /// - `params`: Flat request parameters
    /// - `context`: Domain or record the call is about (for error messages)
    async fn call<T: DeserializeOwned, P: Serialize>(
        &self,
        action: &str,
        params: &P,
        context: &str,
    ) -> Result<T> {
        let query_string = query_string(params)?;
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();
        let authorization = self.sign(action, &query_string, &timestamp, &nonce)?;

        let url = if query_string.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/?{}", self.base_url, query_string)
        };

        tracing::debug!("POST {} (Action: {})", self.base_url, action);

        let response = self
            .client
            .post(&url)
            .header("Host", &self.host)
            .header("x-acs-action", action)
            .header("x-acs-version", API_VERSION)
            .header("x-acs-date", &timestamp)
            .header("x-acs-signature-nonce", &nonce)
            .header("x-acs-content-sha256", EMPTY_BODY_SHA256)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", action, e)))?;

        if let Ok(ApiErrorBody {
            code: Some(code),
            message,
        }) = serde_json::from_str::<ApiErrorBody>(&body)
        {
            let message = message.unwrap_or_default();
            tracing::debug!("{} failed: {} - {}", action, code, message);
            return Err(error::map_api_error(&code, &message, context));
        }

        if !status.is_success() {
            return Err(error::map_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("Failed to parse {} response: {}", action, e),
            )
        })
    }
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    /// List every record of `domain`, walking all pages
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /?DomainName=example.com&PageNumber=1&PageSize=500
    /// x-acs-action: DescribeDomainRecords
    /// ```
    async fn describe_records(&self, domain: &str) -> Result<Vec<DomainRecord>> {
        let mut records = Vec::new();
        let mut page_number = 1;

        loop {
            let response: DescribeDomainRecordsResponse = self
                .call(
                    "DescribeDomainRecords",
                    &DescribeDomainRecordsRequest {
                        domain_name: domain,
                        page_number,
                        page_size: PAGE_SIZE,
                    },
                    domain,
                )
                .await?;

            let total = response.total_count.unwrap_or(0);
            let page = response
                .domain_records
                .and_then(|r| r.record)
                .unwrap_or_default();
            let fetched = page.len();

            records.extend(page.into_iter().map(|r| r.into_domain_record(domain)));

            if fetched == 0 || records.len() as u64 >= total {
                break;
            }
            page_number += 1;
        }

        tracing::debug!(
            "DescribeDomainRecords {}: {} record(s) in {} page(s)",
            domain,
            records.len(),
            page_number
        );
        Ok(records)
    }

    async fn add_record(&self, domain: &str, rr: &str, ip: Ipv4Addr) -> Result<String> {
        let request = AddDomainRecordRequest {
            domain_name: domain,
            rr,
            record_type: RECORD_TYPE_A,
            value: ip.to_string(),
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would call AddDomainRecord with: {}",
                query_string(&request)?
            );
            return Ok(DRY_RUN_RECORD_ID.to_string());
        }

        let response: AddDomainRecordResponse =
            self.call("AddDomainRecord", &request, domain).await?;
        Ok(response.record_id)
    }

    async fn update_record(&self, record_id: &str, rr: &str, ip: Ipv4Addr) -> Result<()> {
        let request = UpdateDomainRecordRequest {
            record_id,
            rr,
            record_type: RECORD_TYPE_A,
            value: ip.to_string(),
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would call UpdateDomainRecord with: {}",
                query_string(&request)?
            );
            return Ok(());
        }

        let response: MutationResponse =
            self.call("UpdateDomainRecord", &request, record_id).await?;
        tracing::debug!("UpdateDomainRecord {} ok ({:?})", record_id, response.request_id);
        Ok(())
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        let request = DeleteDomainRecordRequest { record_id };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would call DeleteDomainRecord with: {}",
                query_string(&request)?
            );
            return Ok(());
        }

        let response: MutationResponse =
            self.call("DeleteDomainRecord", &request, record_id).await?;
        tracing::debug!("DeleteDomainRecord {} ok ({:?})", record_id, response.request_id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Split an endpoint URL into `scheme://host[:port]` and the host header value
fn parse_endpoint(endpoint: &str) -> Result<(String, String)> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::config(format!("Invalid Alidns endpoint '{}': {}", endpoint, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::config(format!(
            "Alidns endpoint must use HTTP or HTTPS scheme. Got: {}",
            endpoint
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| Error::config(format!("Alidns endpoint has no host: {}", endpoint)))?;
    let host = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok((format!("{}://{}", url.scheme(), host), host))
}
