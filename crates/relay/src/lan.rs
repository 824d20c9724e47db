use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};

/// Non-loopback IPv4 addresses of this machine, sorted and deduplicated.
///
/// Remotes on the same network reach the relay through one of these.
pub fn lan_ipv4_addrs() -> Vec<Ipv4Addr> {
    let networks = sysinfo::Networks::new_with_refreshed_list();

    networks
        .list()
        .values()
        .flat_map(|data| data.ip_networks().iter().map(|net| net.addr))
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
