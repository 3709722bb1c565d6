// # aliddns-core
//
// Core library for the Alidns dynamic DNS synchronizer.
//
// ## Architecture Overview
//
// This library provides the reconciliation logic that keeps a set of DNS
// "A" records pointed at the host's public IPv4 address:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for listing, adding, updating and deleting records
// - **RecordDirectory**: Per-domain snapshot of existing records by hostname
// - **Reconciler**: Orchestrates discovery → directory → per-label mutation
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and IP source implementations
// 2. **Stateless Runs**: Every run re-discovers the IP and re-fetches records
// 3. **Per-Label Isolation**: One failing record never aborts its siblings
// 4. **Library-First**: Scheduling lives outside the core; entry points are plain calls
// 5. **Explicit Configuration**: Nothing here reads process environment

pub mod traits;
pub mod engine;
pub mod directory;
pub mod records;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DomainRecord, StaticIpSource};
pub use engine::{Action, DeleteOutcome, RecordOutcome, Reconciler, SyncReport, reconcile_one};
pub use directory::{RecordDirectory, list_records};
pub use records::{DesiredState, hostname, validate_host};
pub use config::{AliddnsConfig, Credentials, CredentialsConfig, EngineConfig, IpSourceConfig};
pub use error::{Error, ErrorKind, Result};
