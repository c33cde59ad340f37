use std::net::{Ipv4Addr, Ipv6Addr};

use regex::Regex;
use sysinfo::{Networks, System};

use crate::collection::Collection;
use crate::resolver::Resolver;
use crate::value::Value;

use super::names;

const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Resolves host naming and interface addresses.
///
/// Besides the fixed names, claims the per-interface family
/// (`ipaddress_<if>`, `ipaddress6_<if>`, `macaddress_<if>`, `netmask_<if>`).
#[derive(Debug)]
pub struct NetworkingResolver {
    names: Vec<String>,
    pattern: Option<Regex>,
}

impl NetworkingResolver {
    #[must_use]
    pub fn new() -> Self {
        let pattern = Regex::new(names::INTERFACE_PATTERN)
            .map_err(|e| tracing::error!(error = %e, "invalid interface fact pattern"))
            .ok();
        Self {
            names: super::owned(&[
                names::HOSTNAME,
                names::DOMAIN,
                names::FQDN,
                names::INTERFACES,
                names::IP_ADDRESS,
                names::IP_ADDRESS6,
                names::MAC_ADDRESS,
                names::NETMASK,
            ]),
            pattern,
        }
    }
}

impl Default for NetworkingResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for NetworkingResolver {
    fn name(&self) -> &str {
        "networking"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    fn resolve(&self, facts: &mut Collection) {
        if let Some(host) = System::host_name() {
            let resolv_conf = super::read_trimmed(RESOLV_CONF);
            let naming = host_naming(&host, resolv_conf.as_deref());
            if let Some(domain) = &naming.domain {
                facts.add(names::DOMAIN, domain.as_str());
            }
            facts.add(names::FQDN, naming.fqdn());
            facts.add(names::HOSTNAME, naming.hostname);
        }

        let networks = Networks::new_with_refreshed_list();
        let interfaces: Vec<Interface> = networks
            .list()
            .iter()
            .map(|(name, data)| {
                let mac = data.mac_address();
                let mut interface = Interface {
                    name: name.clone(),
                    mac: (!mac.is_unspecified()).then(|| mac.to_string()),
                    ..Interface::default()
                };
                for network in data.ip_networks() {
                    match network.addr {
                        std::net::IpAddr::V4(addr) => interface.v4.push((addr, network.prefix)),
                        std::net::IpAddr::V6(addr) => interface.v6.push((addr, network.prefix)),
                    }
                }
                interface
            })
            .collect();

        for (name, value) in interface_facts(interfaces) {
            facts.add(name, value);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct HostNaming {
    hostname: String,
    domain: Option<String>,
}

impl HostNaming {
    fn fqdn(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}.{domain}", self.hostname),
            None => self.hostname.clone(),
        }
    }
}

/// Splits a host name into its short name and domain. A bare host name takes
/// its domain from resolv.conf (`domain`, then the first `search` entry).
fn host_naming(host: &str, resolv_conf: Option<&str>) -> HostNaming {
    let host = host.trim().trim_end_matches('.');
    if let Some((short, domain)) = host.split_once('.') {
        return HostNaming {
            hostname: short.to_string(),
            domain: Some(domain.to_string()).filter(|d| !d.is_empty()),
        };
    }
    HostNaming {
        hostname: host.to_string(),
        domain: resolv_conf.and_then(resolv_conf_domain),
    }
}

fn resolv_conf_domain(text: &str) -> Option<String> {
    let mut search = None;
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some("domain"), Some(domain)) => return Some(domain.trim_end_matches('.').to_string()),
            (Some("search"), Some(first)) if search.is_none() => {
                search = Some(first.trim_end_matches('.').to_string());
            }
            _ => {}
        }
    }
    search
}

#[derive(Debug, Default, Clone)]
struct Interface {
    name: String,
    mac: Option<String>,
    v4: Vec<(Ipv4Addr, u8)>,
    v6: Vec<(Ipv6Addr, u8)>,
}

/// The interface list, per-interface facts and the primary address facts.
///
/// The primary interface is the first (by name) non-loopback interface with an
/// IPv4 address; `ipaddress6` is the first global IPv6 address of any
/// interface.
fn interface_facts(mut interfaces: Vec<Interface>) -> Vec<(String, Value)> {
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    let mut facts = Vec::new();
    if interfaces.is_empty() {
        return facts;
    }

    let list: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
    facts.push((names::INTERFACES.to_string(), Value::from(list.join(","))));

    for interface in &interfaces {
        let suffix = &interface.name;
        if let Some(mac) = &interface.mac {
            facts.push((format!("{}_{suffix}", names::MAC_ADDRESS), Value::from(mac.as_str())));
        }
        if let Some((addr, prefix)) = interface.v4.first() {
            facts.push((format!("{}_{suffix}", names::IP_ADDRESS), Value::from(addr.to_string())));
            facts.push((
                format!("{}_{suffix}", names::NETMASK),
                Value::from(netmask_v4(*prefix).to_string()),
            ));
        }
        if let Some((addr, _)) = interface.v6.first() {
            facts.push((format!("{}_{suffix}", names::IP_ADDRESS6), Value::from(addr.to_string())));
        }
    }

    let primary = interfaces
        .iter()
        .find(|i| i.v4.iter().any(|(addr, _)| !addr.is_loopback()));
    if let Some(primary) = primary {
        if let Some((addr, prefix)) = primary.v4.iter().find(|(addr, _)| !addr.is_loopback()) {
            facts.push((names::IP_ADDRESS.to_string(), Value::from(addr.to_string())));
            facts.push((names::NETMASK.to_string(), Value::from(netmask_v4(*prefix).to_string())));
        }
        if let Some(mac) = &primary.mac {
            facts.push((names::MAC_ADDRESS.to_string(), Value::from(mac.as_str())));
        }
    }

    let global_v6 = interfaces
        .iter()
        .flat_map(|i| i.v6.iter())
        .map(|(addr, _)| addr)
        .find(|addr| is_global_v6(addr));
    if let Some(addr) = global_v6 {
        facts.push((names::IP_ADDRESS6.to_string(), Value::from(addr.to_string())));
    }

    facts
}

/// The dotted netmask for an IPv4 prefix length; lengths above 32 saturate.
fn netmask_v4(prefix: u8) -> Ipv4Addr {
    let bits = u32::from(prefix.min(32));
    let mask = u32::MAX.checked_shl(32 - bits).unwrap_or(0);
    Ipv4Addr::from(mask)
}

fn is_global_v6(addr: &Ipv6Addr) -> bool {
    // fe80::/10 is link-local.
    !addr.is_loopback() && !addr.is_unspecified() && (addr.segments()[0] & 0xffc0) != 0xfe80
}
