use std::path::Path;

use crate::collection::Collection;
use crate::resolver::Resolver;

use super::names;

const PHYSICAL: &str = "physical";

/// Resolves whether the system runs under a hypervisor or in a container.
///
/// Depends on the `kernel` fact; only Linux is probed.
#[derive(Debug)]
pub struct VirtualizationResolver {
    names: Vec<String>,
}

impl VirtualizationResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[names::VIRTUAL, names::IS_VIRTUAL]),
        }
    }
}

impl Default for VirtualizationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for VirtualizationResolver {
    fn name(&self) -> &str {
        "virtualization"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        let linux = facts.get::<&str>(names::KERNEL) == Some("Linux");
        if !linux {
            tracing::debug!("virtualization is only probed on Linux");
            return;
        }

        let hypervisor = probe_linux();
        facts.add(names::IS_VIRTUAL, is_virtual(hypervisor));
        facts.add(names::VIRTUAL, hypervisor);
    }
}

fn probe_linux() -> &'static str {
    let cgroup = super::read_trimmed("/proc/1/cgroup");
    if let Some(container) = container(
        Path::new("/.dockerenv").exists(),
        Path::new("/run/.containerenv").exists(),
        cgroup.as_deref(),
    ) {
        return container;
    }

    if Path::new("/proc/xen").exists() {
        let capabilities = super::read_trimmed("/proc/xen/capabilities").unwrap_or_default();
        return if capabilities.contains("control_d") {
            "xen0"
        } else {
            "xenu"
        };
    }

    let product = super::read_trimmed("/sys/class/dmi/id/product_name").unwrap_or_default();
    let vendor = super::read_trimmed("/sys/class/dmi/id/sys_vendor").unwrap_or_default();
    hypervisor(&product, &vendor).unwrap_or(PHYSICAL)
}

/// Container markers: docker's and podman's marker files, then PID 1's cgroup.
fn container(dockerenv: bool, containerenv: bool, cgroup: Option<&str>) -> Option<&'static str> {
    if dockerenv {
        return Some("docker");
    }
    if containerenv {
        return Some("podman");
    }
    let cgroup = cgroup?;
    if cgroup.contains("/docker/") || cgroup.contains("docker-") {
        Some("docker")
    } else if cgroup.contains("/lxc/") {
        Some("lxc")
    } else if cgroup.contains("machine.slice/machine-") {
        Some("systemd_nspawn")
    } else {
        None
    }
}

/// Maps DMI product name and system vendor strings to a hypervisor.
fn hypervisor(product: &str, vendor: &str) -> Option<&'static str> {
    let product = product.to_ascii_lowercase();
    let vendor = vendor.to_ascii_lowercase();
    let found = if product.contains("vmware") {
        "vmware"
    } else if product.contains("virtualbox") {
        "virtualbox"
    } else if product.contains("parallels") || vendor.contains("parallels") {
        "parallels"
    } else if product.contains("hvm domu") || vendor.contains("xen") {
        "xenhvm"
    } else if product.contains("virtual machine") && vendor.contains("microsoft") {
        "hyperv"
    } else if vendor.contains("google") {
        "gce"
    } else if product.contains("openstack") {
        "openstack"
    } else if product.contains("kvm")
        || product.contains("bochs")
        || vendor.contains("qemu")
        || vendor.contains("amazon ec2")
    {
        "kvm"
    } else {
        return None;
    };
    Some(found)
}

/// Hosts (dom0, hypervisor hosts) and bare metal are not virtual.
fn is_virtual(hypervisor: &str) -> bool {
    !matches!(
        hypervisor,
        PHYSICAL | "xen0" | "vmware_server" | "vmware_workstation" | "openvzhn" | "vserver_host"
    )
}
