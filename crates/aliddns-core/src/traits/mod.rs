//! Core traits for the synchronizer
//!
//! This module defines the abstract interfaces the reconciler depends on.
//!
//! - [`IpSource`]: Discover the host's public IPv4 address
//! - [`DnsProvider`]: List, add, update and delete DNS records

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{IpSource, StaticIpSource};
pub use dns_provider::{DnsProvider, DomainRecord, RECORD_TYPE_A};
