//! Host name lookup.

use async_trait::async_trait;
use std::io;
use std::net::IpAddr;

/// Resolves a host name to the IPs behind it.
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup_host(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Lookup through the platform resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup_host(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(dedup_in_order(addrs.map(|a| a.ip())))
    }
}

/// Drop repeated IPs, keeping the first occurrence of each.
pub(crate) fn dedup_in_order(ips: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut out: Vec<IpAddr> = Vec::new();
    for ip in ips {
        if !out.contains(&ip) {
            out.push(ip);
        }
    }
    out
}
