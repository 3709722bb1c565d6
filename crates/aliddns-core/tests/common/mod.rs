//! Test doubles and common utilities for reconciliation contract tests
//!
//! The mock provider keeps an in-memory record table so that consecutive
//! runs observe each other's writes, and logs every call it receives.

#![allow(dead_code)]

use aliddns_core::config::EngineConfig;
use aliddns_core::error::{Error, Result};
use aliddns_core::traits::{DnsProvider, DomainRecord, IpSource};
use aliddns_core::Reconciler;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// The address most scenarios discover
pub const HOST_IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 5);

/// An address that differs from [`HOST_IP`]
pub const OLD_IP: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 1);

/// One call received by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Describe {
        domain: String,
    },
    Add {
        domain: String,
        rr: String,
        value: Ipv4Addr,
    },
    Update {
        record_id: String,
        rr: String,
        value: Ipv4Addr,
    },
    Delete {
        record_id: String,
    },
}

impl ProviderCall {
    /// Whether this call changes provider state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ProviderCall::Describe { .. })
    }
}

/// A stateful mock DnsProvider that records every call
#[derive(Default)]
pub struct MockDnsProvider {
    /// Records per domain
    records: Arc<Mutex<HashMap<String, Vec<DomainRecord>>>>,
    /// Calls in the order they were received
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    /// Labels whose add/update calls fail
    failing_labels: Arc<Mutex<HashSet<String>>>,
    /// Domains whose describe calls fail
    failing_domains: Arc<Mutex<HashSet<String>>>,
    /// Whether delete calls fail
    failing_deletes: Arc<Mutex<bool>>,
    /// Counter for generated record ids
    next_id: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            calls: Arc::clone(&other.calls),
            failing_labels: Arc::clone(&other.failing_labels),
            failing_domains: Arc::clone(&other.failing_domains),
            failing_deletes: Arc::clone(&other.failing_deletes),
            next_id: Arc::clone(&other.next_id),
        }
    }

    /// Seed an "A" record
    pub fn with_record(self, record_id: &str, domain: &str, rr: &str, value: Ipv4Addr) -> Self {
        self.records
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_default()
            .push(DomainRecord::a(record_id, domain, rr, value.to_string()));
        self
    }

    /// Make add/update calls for `rr` fail
    pub fn failing_label(self, rr: &str) -> Self {
        self.failing_labels.lock().unwrap().insert(rr.to_string());
        self
    }

    /// Make describe calls for `domain` fail
    pub fn failing_domain(self, domain: &str) -> Self {
        self.failing_domains
            .lock()
            .unwrap()
            .insert(domain.to_string());
        self
    }

    /// Make delete calls fail
    pub fn failing_deletes(self) -> Self {
        *self.failing_deletes.lock().unwrap() = true;
        self
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change provider state
    pub fn mutations(&self) -> Vec<ProviderCall> {
        self.calls().into_iter().filter(ProviderCall::is_mutation).collect()
    }

    /// Number of describe calls for `domain`
    pub fn describe_count(&self, domain: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ProviderCall::Describe { domain: d } if d == domain))
            .count()
    }

    /// Forget recorded calls (records are kept)
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Current value of `rr.domain`, if any
    pub fn value_of(&self, domain: &str, rr: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(domain)
            .and_then(|records| records.iter().find(|r| r.rr == rr))
            .map(|r| r.value.clone())
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn label_fails(&self, rr: &str) -> bool {
        self.failing_labels.lock().unwrap().contains(rr)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn describe_records(&self, domain: &str) -> Result<Vec<DomainRecord>> {
        self.record(ProviderCall::Describe {
            domain: domain.to_string(),
        });

        if self.failing_domains.lock().unwrap().contains(domain) {
            return Err(Error::not_found(format!("Domain not found: {}", domain)));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(domain)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_record(&self, domain: &str, rr: &str, ip: Ipv4Addr) -> Result<String> {
        self.record(ProviderCall::Add {
            domain: domain.to_string(),
            rr: rr.to_string(),
            value: ip,
        });

        if self.label_fails(rr) {
            return Err(Error::provider("mock", format!("add {} rejected", rr)));
        }

        let record_id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_default()
            .push(DomainRecord::a(&record_id, domain, rr, ip.to_string()));
        Ok(record_id)
    }

    async fn update_record(&self, record_id: &str, rr: &str, ip: Ipv4Addr) -> Result<()> {
        self.record(ProviderCall::Update {
            record_id: record_id.to_string(),
            rr: rr.to_string(),
            value: ip,
        });

        if self.label_fails(rr) {
            return Err(Error::provider("mock", format!("update {} rejected", rr)));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .values_mut()
            .flatten()
            .find(|r| r.record_id == record_id)
            .ok_or_else(|| Error::not_found(format!("Record not found: {}", record_id)))?;
        record.value = ip.to_string();
        Ok(())
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        self.record(ProviderCall::Delete {
            record_id: record_id.to_string(),
        });

        if *self.failing_deletes.lock().unwrap() {
            return Err(Error::provider("mock", "delete rejected"));
        }

        for records in self.records.lock().unwrap().values_mut() {
            records.retain(|r| r.record_id != record_id);
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source that counts lookups and can be told to fail
pub struct CountingIpSource {
    ip: Option<Ipv4Addr>,
    calls: Arc<AtomicUsize>,
}

impl CountingIpSource {
    /// A source that answers `ip`
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip: Some(ip),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose lookups always fail
    pub fn failing() -> Self {
        Self {
            ip: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle on the lookup counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl IpSource for CountingIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip
            .ok_or_else(|| Error::discovery("no IPv4 address found in response"))
    }
}

/// Build a reconciler over a mock provider that shares state with `provider`
pub fn reconciler(ip_source: impl IpSource + 'static, provider: &MockDnsProvider) -> Reconciler {
    Reconciler::new(
        Box::new(ip_source),
        Box::new(MockDnsProvider::sharing_state_with(provider)),
        &EngineConfig::default(),
    )
    .expect("reconciler construction succeeds")
}
