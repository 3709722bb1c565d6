// # DNS Provider Trait
//
// Defines the narrow interface the reconciler needs from a DNS hosting
// service: list a domain's records, add one, change one, delete one.
//
// ## Implementations
//
// - Alibaba Cloud DNS: `aliddns-provider-aliyun` crate
// - Test doubles: `tests/common` in this crate
//
// ## Usage
//
// ```rust,ignore
// use aliddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     for record in provider.describe_records("example.com").await? {
//         println!("{}.{} -> {}", record.rr, record.domain_name, record.value);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Record type this system manages
pub const RECORD_TYPE_A: &str = "A";

/// One DNS record as known to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    /// Provider-assigned identifier, stable across updates
    pub record_id: String,
    /// Owning domain (e.g. "example.com")
    pub domain_name: String,
    /// Host label (e.g. "www", "@")
    pub rr: String,
    /// Current record value
    pub value: String,
    /// Record type as reported by the provider
    pub record_type: String,
    /// Time-to-live, when reported
    pub ttl: Option<u32>,
}

impl DomainRecord {
    /// Create an "A" record description
    pub fn a(
        record_id: impl Into<String>,
        domain_name: impl Into<String>,
        rr: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            domain_name: domain_name.into(),
            rr: rr.into(),
            value: value.into(),
            record_type: RECORD_TYPE_A.to_string(),
            ttl: None,
        }
    }

    /// Fully-qualified hostname of this record
    pub fn hostname(&self) -> String {
        crate::records::hostname(&self.rr, &self.domain_name)
    }

    /// Whether the record already holds `ip`
    pub fn points_to(&self, ip: Ipv4Addr) -> bool {
        self.value == ip.to_string()
    }
}

/// Trait for DNS provider implementations
///
/// Each method performs exactly one logical provider operation. Providers
/// do not decide whether a change is needed, do not retry and do not cache
/// anything between calls; all of that is owned by the reconciler.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch every record of `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DomainRecord>)`: The full, authoritative record set
    /// - `Err(Error)`: Authentication failure, unknown domain or malformed response
    async fn describe_records(&self, domain: &str) -> Result<Vec<DomainRecord>, crate::Error>;

    /// Create an "A" record `rr.domain` pointing at `ip`
    ///
    /// # Returns
    ///
    /// The identifier assigned to the new record
    async fn add_record(
        &self,
        domain: &str,
        rr: &str,
        ip: Ipv4Addr,
    ) -> Result<String, crate::Error>;

    /// Point an existing record at `ip`, turning it into an "A" record
    ///
    /// # Parameters
    ///
    /// - `record_id`: Identifier from [`DomainRecord::record_id`]
    /// - `rr`: The record's label (required by the provider on update)
    /// - `ip`: The new value
    async fn update_record(
        &self,
        record_id: &str,
        rr: &str,
        ip: Ipv4Addr,
    ) -> Result<(), crate::Error>;

    /// Delete a record by identifier
    async fn delete_record(&self, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
