//! Record directory
//!
//! A [`RecordDirectory`] is a read-only snapshot of one domain's records,
//! indexed by fully-qualified hostname. It is fetched once per domain per
//! reconciliation run and shared by every label of that domain; it is never
//! kept across runs.

use crate::error::Result;
use crate::records::hostname;
use crate::traits::{DnsProvider, DomainRecord};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Snapshot of a domain's records keyed by hostname
#[derive(Debug, Clone, Default)]
pub struct RecordDirectory {
    domain: String,
    records: HashMap<String, DomainRecord>,
}

impl RecordDirectory {
    /// Fetch the current records of `domain` from the provider
    ///
    /// Errors from the provider are returned unchanged.
    pub async fn fetch(provider: &dyn DnsProvider, domain: &str) -> Result<Self> {
        let records = provider.describe_records(domain).await?;
        debug!(
            "Fetched {} record(s) for {} from {}",
            records.len(),
            domain,
            provider.provider_name()
        );
        Ok(Self::from_records(domain, records))
    }

    /// Build a directory from already-fetched records
    ///
    /// Records with an empty domain name are filed under `domain`. When two
    /// records share a hostname the later one wins.
    pub fn from_records(domain: impl Into<String>, records: Vec<DomainRecord>) -> Self {
        let domain = domain.into();
        let mut map = HashMap::with_capacity(records.len());

        for mut record in records {
            if record.domain_name.is_empty() {
                record.domain_name = domain.clone();
            }
            let key = record.hostname();
            if let Some(previous) = map.insert(key.clone(), record) {
                warn!(
                    "Duplicate record for {} (dropping {}, keeping the later one)",
                    key, previous.record_id
                );
            }
        }

        Self {
            domain,
            records: map,
        }
    }

    /// The domain this snapshot belongs to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Look up the record for `label` in this domain
    pub fn lookup(&self, label: &str) -> Option<&DomainRecord> {
        self.records.get(&hostname(label, &self.domain))
    }

    /// Look up a record by fully-qualified hostname
    pub fn get(&self, hostname: &str) -> Option<&DomainRecord> {
        self.records.get(hostname)
    }

    /// Number of distinct hostnames
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the domain has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the snapshot, yielding the hostname -> record mapping
    pub fn into_map(self) -> HashMap<String, DomainRecord> {
        self.records
    }
}

/// Fetch the hostname -> record mapping for `domain`
pub async fn list_records(
    provider: &dyn DnsProvider,
    domain: &str,
) -> Result<HashMap<String, DomainRecord>> {
    Ok(RecordDirectory::fetch(provider, domain).await?.into_map())
}
