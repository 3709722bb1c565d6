//! Reconciliation engine
//!
//! The [`Reconciler`] is responsible for:
//! - Discovering the host IP once per run via [`IpSource`]
//! - Fetching one [`RecordDirectory`] snapshot per domain
//! - Creating or updating each label's record via [`DnsProvider`]
//! - Deleting single records on request
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── Ipv4Addr (once) ───┐
//! └─────────────┘                       │
//!                                       ▼
//!                              ┌──────────────┐
//!                              │  Reconciler  │
//!                              └──────────────┘
//!                                       │ per domain
//!                                       ▼
//!                            ┌──────────────────┐
//!                            │ RecordDirectory  │ (describe, once)
//!                            └──────────────────┘
//!                                       │ per label
//!                                       ▼
//!                            ┌──────────────────┐
//!                            │  reconcile_one   │ (add / update / nothing)
//!                            └──────────────────┘
//! ```
//!
//! ## Failure Policy
//!
//! 1. IP discovery fails → the run aborts before any provider call
//! 2. A directory fetch fails → the run aborts
//! 3. A single add/update fails → recorded as [`Action::Failed`], run continues
//! 4. A delete fails → returned to the caller
//!
//! Every call is awaited in sequence; there is no internal parallelism.

use crate::config::EngineConfig;
use crate::directory::RecordDirectory;
use crate::error::{Error, Result};
use crate::records::{DesiredState, hostname, validate_host};
use crate::traits::{DnsProvider, IpSource};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What happened to one label during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// No record existed; one was added
    Created,
    /// A record existed with another value; it was changed
    Updated,
    /// The record already held the host IP; no call was made
    Unchanged,
    /// The add/update call failed
    Failed,
}

impl Action {
    /// Lowercase name for logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Unchanged => "unchanged",
            Action::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of reconciling one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Domain the label belongs to
    pub domain: String,
    /// The label (RR)
    pub label: String,
    /// `label.domain`
    pub hostname: String,
    /// Action taken
    pub action: Action,
    /// Record identifier (new one for `Created`, existing one otherwise)
    pub record_id: Option<String>,
    /// Value before an update
    pub previous_value: Option<String>,
    /// Error detail for `Failed`
    pub error: Option<String>,
}

impl RecordOutcome {
    fn new(domain: &str, label: &str, action: Action) -> Self {
        Self {
            domain: domain.to_string(),
            label: label.to_string(),
            hostname: hostname(label, domain),
            action,
            record_id: None,
            previous_value: None,
            error: None,
        }
    }
}

/// Result of a whole [`Reconciler::sync`] run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The host IP every record was reconciled against
    pub ip: Ipv4Addr,
    /// One entry per label, in processing order
    pub outcomes: Vec<RecordOutcome>,
}

impl SyncReport {
    fn count(&self, action: Action) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    /// Number of records created
    pub fn created(&self) -> usize {
        self.count(Action::Created)
    }

    /// Number of records updated
    pub fn updated(&self) -> usize {
        self.count(Action::Updated)
    }

    /// Number of records left untouched
    pub fn unchanged(&self) -> usize {
        self.count(Action::Unchanged)
    }

    /// Number of labels whose add/update failed
    pub fn failed(&self) -> usize {
        self.count(Action::Failed)
    }

    /// Whether any label failed
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.action == Action::Failed)
    }
}

/// Result of [`Reconciler::delete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record existed and was deleted
    Deleted {
        /// Identifier of the deleted record
        record_id: String,
    },
    /// No record matched; nothing was called
    NotFound,
}

/// Reconcile one label against a directory snapshot
///
/// Issues at most one provider call. Provider errors are captured in the
/// returned outcome rather than propagated.
pub async fn reconcile_one(
    provider: &dyn DnsProvider,
    directory: &RecordDirectory,
    label: &str,
    ip: Ipv4Addr,
) -> RecordOutcome {
    let domain = directory.domain();
    let host = hostname(label, domain);

    match directory.lookup(label) {
        None => match provider.add_record(domain, label, ip).await {
            Ok(record_id) => {
                info!("add {} to {}", host, ip);
                let mut outcome = RecordOutcome::new(domain, label, Action::Created);
                outcome.record_id = Some(record_id);
                outcome
            }
            Err(e) => failed(domain, label, None, e),
        },
        Some(record) if !record.points_to(ip) => {
            match provider.update_record(&record.record_id, label, ip).await {
                Ok(()) => {
                    info!("change {} to {} (was {})", host, ip, record.value);
                    let mut outcome = RecordOutcome::new(domain, label, Action::Updated);
                    outcome.record_id = Some(record.record_id.clone());
                    outcome.previous_value = Some(record.value.clone());
                    outcome
                }
                Err(e) => failed(domain, label, Some(record.record_id.clone()), e),
            }
        }
        Some(record) => {
            debug!("{} already points to {}", host, ip);
            let mut outcome = RecordOutcome::new(domain, label, Action::Unchanged);
            outcome.record_id = Some(record.record_id.clone());
            outcome
        }
    }
}

fn failed(domain: &str, label: &str, record_id: Option<String>, error: Error) -> RecordOutcome {
    warn!("Failed to reconcile {}: {}", hostname(label, domain), error);
    let mut outcome = RecordOutcome::new(domain, label, Action::Failed);
    outcome.record_id = record_id;
    outcome.error = Some(error.to_string());
    outcome
}

/// Reconciliation entry point
///
/// Owns an IP source and a provider. Both entry points, [`sync`](Self::sync)
/// and [`delete`](Self::delete), are plain async calls with no background
/// work, so a scheduler can invoke them directly at any cadence.
pub struct Reconciler {
    /// IP source for discovering the host address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reading and changing records
    provider: Box<dyn DnsProvider>,

    /// Deadline for one whole invocation
    run_timeout: Duration,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: Engine settings
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            run_timeout: Duration::from_secs(config.run_timeout_secs),
        })
    }

    /// Override the per-invocation deadline
    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// Point every desired label at the host's current IP
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: One outcome per label; individual failures are inside
    /// - `Err(Error)`: The desired state has an invalid name, discovery failed,
    ///   a directory fetch failed, or the deadline passed
    pub async fn sync(&self, desired: &DesiredState) -> Result<SyncReport> {
        tokio::time::timeout(self.run_timeout, self.sync_internal(desired))
            .await
            .map_err(|_| {
                Error::timeout(format!("sync did not finish within {:?}", self.run_timeout))
            })?
    }

    async fn sync_internal(&self, desired: &DesiredState) -> Result<SyncReport> {
        desired.validate()?;
        let ip = self.discover().await?;

        let mut outcomes = Vec::with_capacity(desired.label_count());
        for (domain, labels) in desired.iter() {
            let directory = RecordDirectory::fetch(self.provider.as_ref(), domain).await?;

            for label in labels {
                outcomes.push(reconcile_one(self.provider.as_ref(), &directory, label, ip).await);
            }
        }

        let report = SyncReport { ip, outcomes };
        info!(
            "Sync finished: {} created, {} updated, {} unchanged, {} failed",
            report.created(),
            report.updated(),
            report.unchanged(),
            report.failed()
        );
        Ok(report)
    }

    /// Delete the record for `label.domain` if it exists
    ///
    /// # Returns
    ///
    /// - `Ok(DeleteOutcome::NotFound)`: Nothing matched, no delete call was made
    /// - `Ok(DeleteOutcome::Deleted { .. })`: The record was removed
    /// - `Err(Error)`: The name is invalid, or the directory fetch or the delete call failed
    pub async fn delete(&self, domain: &str, label: &str) -> Result<DeleteOutcome> {
        tokio::time::timeout(self.run_timeout, self.delete_internal(domain, label))
            .await
            .map_err(|_| {
                Error::timeout(format!("delete did not finish within {:?}", self.run_timeout))
            })?
    }

    async fn delete_internal(&self, domain: &str, label: &str) -> Result<DeleteOutcome> {
        validate_host(domain, label)?;
        let domain = domain.to_ascii_lowercase();
        let domain = domain.as_str();
        let directory = RecordDirectory::fetch(self.provider.as_ref(), domain).await?;
        let host = hostname(label, domain);

        let Some(record) = directory.lookup(label) else {
            debug!("No record for {}, nothing to delete", host);
            return Ok(DeleteOutcome::NotFound);
        };

        self.provider.delete_record(&record.record_id).await?;
        info!("delete {} ({})", host, record.record_id);

        Ok(DeleteOutcome::Deleted {
            record_id: record.record_id.clone(),
        })
    }

    /// Discover the host IP, normalizing any failure to a discovery error
    async fn discover(&self) -> Result<Ipv4Addr> {
        let ip = self.ip_source.current().await.map_err(|e| match e {
            Error::Discovery(_) => e,
            other => Error::discovery(other.to_string()),
        })?;
        info!("Host IP ({}): {}", self.ip_source.source_name(), ip);
        Ok(ip)
    }
}
