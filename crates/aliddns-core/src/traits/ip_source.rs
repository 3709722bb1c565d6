// # IP Source Trait
//
// Defines the interface for discovering the host's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP page scraping: `aliddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use aliddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let ip = source.current().await?;
//     println!("Host IP: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// A source answers one question, "what is the host's public address right
/// now", with a fresh lookup on every call. It never caches, never retries and
/// never decides what to do with the answer.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Discover the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The discovered address
    /// - `Err(Error::Discovery)`: Transport failure, bad status or no address in the response
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name of the source (for logging/debugging)
    fn source_name(&self) -> &'static str {
        "unknown"
    }
}

/// An IP source that always returns the same address
///
/// Useful when the address is known out of band (static hosts, tests).
#[derive(Debug, Clone, Copy)]
pub struct StaticIpSource {
    ip: Ipv4Addr,
}

impl StaticIpSource {
    /// Create a source that always answers `ip`
    pub fn new(ip: Ipv4Addr) -> Self {
        Self { ip }
    }
}

#[async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<Ipv4Addr, crate::Error> {
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}
