//! Client identity: hostname and reportable addresses

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Source of the host-level identity fields of a report
///
/// Addresses are re-read on every report since interfaces come and go.
pub trait HostIdentity: Send + Sync {
    fn hostname(&self) -> String;
    fn ip_list(&self) -> Vec<String>;
}

/// Identity of a reporting client as of one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub package_name: String,
    pub hostname: String,
    pub ip_list: Vec<String>,
}

impl ClientIdentity {
    /// Snapshot the identity of `package_name` on this host
    pub fn capture(package_name: &str, host: &dyn HostIdentity) -> Self {
        Self {
            package_name: package_name.to_string(),
            hostname: host.hostname(),
            ip_list: host.ip_list(),
        }
    }
}

/// Whether an address should be reported to the authority
///
/// Excludes loopback, IPv4 link-local (`169.254.0.0/16`) and IPv6
/// link-local (`fe80::/10`) addresses.
#[must_use]
pub fn is_reportable(ip: &IpAddr) -> bool {
    if ip.is_loopback() {
        return false;
    }
    match ip {
        IpAddr::V4(v4) => !v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) != 0xfe80,
    }
}

/// Reportable addresses, in interface order
pub fn reportable_addresses(addrs: impl IntoIterator<Item = IpAddr>) -> Vec<String> {
    addrs
        .into_iter()
        .filter(is_reportable)
        .map(|ip| ip.to_string())
        .collect()
}

/// Hostname and interface addresses of the local machine
#[derive(Debug, Clone, Default)]
pub struct SystemIdentity;

impl HostIdentity for SystemIdentity {
    fn hostname(&self) -> String {
        gethostname::gethostname().to_string_lossy().into_owned()
    }

    fn ip_list(&self) -> Vec<String> {
        match if_addrs::get_if_addrs() {
            Ok(interfaces) => reportable_addresses(interfaces.iter().map(if_addrs::Interface::ip)),
            Err(e) => {
                warn!(error = %e, "failed to list network interfaces");
                Vec::new()
            }
        }
    }
}

/// Fixed identity, for embedding and tests
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    hostname: String,
    ip_list: Vec<String>,
}

impl StaticIdentity {
    pub fn new(hostname: impl Into<String>, ip_list: Vec<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip_list,
        }
    }
}

impl HostIdentity for StaticIdentity {
    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn ip_list(&self) -> Vec<String> {
        self.ip_list.clone()
    }
}
