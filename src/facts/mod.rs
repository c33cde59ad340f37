//! Built-in platform resolvers.
//!
//! [`default_resolvers`] returns them in registration order. Probing goes
//! through `sysinfo` and plain file reads; everything derived from the probed
//! data lives in small pure functions next to each resolver.

mod architecture;
mod kernel;
mod memory;
mod networking;
mod os;
mod processor;
mod uptime;
mod version;
mod virtualization;

use std::sync::Arc;

use crate::resolver::Resolver;

pub use architecture::ArchitectureResolver;
pub use kernel::KernelResolver;
pub use memory::MemoryResolver;
pub use networking::NetworkingResolver;
pub use os::OperatingSystemResolver;
pub use processor::ProcessorResolver;
pub use uptime::UptimeResolver;
pub use version::FacterResolver;
pub use virtualization::VirtualizationResolver;

/// Names of the facts produced by the built-in resolvers.
#[allow(missing_docs)]
pub mod names {
    pub const KERNEL: &str = "kernel";
    pub const KERNEL_VERSION: &str = "kernelversion";
    pub const KERNEL_RELEASE: &str = "kernelrelease";
    pub const KERNEL_MAJOR_VERSION: &str = "kernelmajversion";

    pub const OPERATING_SYSTEM: &str = "operatingsystem";
    pub const OS_FAMILY: &str = "osfamily";
    pub const OPERATING_SYSTEM_RELEASE: &str = "operatingsystemrelease";
    pub const OPERATING_SYSTEM_MAJOR_RELEASE: &str = "operatingsystemmajrelease";
    pub const OS: &str = "os";

    pub const HARDWARE_MODEL: &str = "hardwaremodel";
    pub const ARCHITECTURE: &str = "architecture";

    pub const PROCESSOR_COUNT: &str = "processorcount";
    pub const PROCESSORS: &str = "processors";

    pub const MEMORY_SIZE: &str = "memorysize";
    pub const MEMORY_FREE: &str = "memoryfree";
    pub const MEMORY_SIZE_MB: &str = "memorysize_mb";
    pub const MEMORY_FREE_MB: &str = "memoryfree_mb";
    pub const SWAP_SIZE: &str = "swapsize";
    pub const SWAP_FREE: &str = "swapfree";
    pub const SWAP_SIZE_MB: &str = "swapsize_mb";
    pub const SWAP_FREE_MB: &str = "swapfree_mb";

    pub const HOSTNAME: &str = "hostname";
    pub const DOMAIN: &str = "domain";
    pub const FQDN: &str = "fqdn";
    pub const INTERFACES: &str = "interfaces";
    pub const IP_ADDRESS: &str = "ipaddress";
    pub const IP_ADDRESS6: &str = "ipaddress6";
    pub const MAC_ADDRESS: &str = "macaddress";
    pub const NETMASK: &str = "netmask";
    /// Per-interface facts, e.g. `ipaddress_eth0`.
    pub const INTERFACE_PATTERN: &str = r"^(ipaddress6?|macaddress|netmask)_.+$";

    pub const UPTIME_SECONDS: &str = "uptime_seconds";
    pub const UPTIME_HOURS: &str = "uptime_hours";
    pub const UPTIME_DAYS: &str = "uptime_days";
    pub const UPTIME: &str = "uptime";
    pub const SYSTEM_UPTIME: &str = "system_uptime";

    pub const VIRTUAL: &str = "virtual";
    pub const IS_VIRTUAL: &str = "is_virtual";

    pub const FACTER_VERSION: &str = "facterversion";
}

/// The built-in resolvers, in registration order.
#[must_use]
pub fn default_resolvers() -> Vec<Arc<dyn Resolver>> {
    vec![
        Arc::new(KernelResolver::new()),
        Arc::new(OperatingSystemResolver::new()),
        Arc::new(ArchitectureResolver::new()),
        Arc::new(ProcessorResolver::new()),
        Arc::new(MemoryResolver::new()),
        Arc::new(NetworkingResolver::new()),
        Arc::new(UptimeResolver::new()),
        Arc::new(VirtualizationResolver::new()),
        Arc::new(FacterResolver::new()),
    ]
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// Reads a small text file, trimmed. Missing or unreadable files are `None`.
fn read_trimmed(path: &str) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
