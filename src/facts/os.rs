use std::collections::BTreeMap;

use crate::collection::Collection;
use crate::resolver::Resolver;
use crate::value::Value;

use super::names;

/// Resolves the operating system name, family and release.
///
/// Depends on the `kernel` fact.
#[derive(Debug)]
pub struct OperatingSystemResolver {
    names: Vec<String>,
}

impl OperatingSystemResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[
                names::OPERATING_SYSTEM,
                names::OS_FAMILY,
                names::OPERATING_SYSTEM_RELEASE,
                names::OPERATING_SYSTEM_MAJOR_RELEASE,
                names::OS,
            ]),
        }
    }
}

impl Default for OperatingSystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for OperatingSystemResolver {
    fn name(&self) -> &str {
        "operating system"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        let Some(kernel) = facts.get::<&str>(names::KERNEL).map(str::to_string) else {
            tracing::debug!("operating system facts need the kernel fact");
            return;
        };

        let distribution = (kernel == "Linux").then(sysinfo::System::distribution_id);
        let name = operating_system_name(&kernel, distribution.as_deref());
        let family = os_family(&name, &kernel).to_string();
        let release = sysinfo::System::os_version().filter(|r| !r.trim().is_empty());

        let mut os = BTreeMap::new();
        os.insert("name".to_string(), Value::from(name.as_str()));
        os.insert("family".to_string(), Value::from(family.as_str()));

        if let Some(full) = release {
            let full = full.trim().to_string();
            let major = major_release(&name, &full);
            os.insert(
                "release".to_string(),
                [("full", full.as_str()), ("major", major.as_str())]
                    .into_iter()
                    .collect(),
            );
            facts.add(names::OPERATING_SYSTEM_RELEASE, full);
            facts.add(names::OPERATING_SYSTEM_MAJOR_RELEASE, major);
        }

        facts.add(names::OPERATING_SYSTEM, name);
        facts.add(names::OS_FAMILY, family);
        facts.add(names::OS, os);
    }
}

/// Maps a kernel and (on Linux) an os-release `ID` to an operating system name.
fn operating_system_name(kernel: &str, distribution: Option<&str>) -> String {
    match kernel {
        "Linux" => distribution
            .and_then(distribution_name)
            .unwrap_or(kernel)
            .to_string(),
        "SunOS" => "Solaris".to_string(),
        "GNU/kFreeBSD" => "GNU/kFreeBSD".to_string(),
        other => other.to_string(),
    }
}

fn distribution_name(id: &str) -> Option<&'static str> {
    let name = match id.trim().to_ascii_lowercase().as_str() {
        "debian" => "Debian",
        "ubuntu" => "Ubuntu",
        "linuxmint" => "LinuxMint",
        "raspbian" => "Raspbian",
        "elementary" => "elementary",
        "rhel" => "RedHat",
        "centos" => "CentOS",
        "fedora" => "Fedora",
        "rocky" => "Rocky",
        "almalinux" => "AlmaLinux",
        "ol" => "OracleLinux",
        "amzn" => "Amazon",
        "scientific" => "Scientific",
        "sles" => "SLES",
        "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" => "OpenSuSE",
        "gentoo" => "Gentoo",
        "arch" => "Archlinux",
        "manjaro" => "ManjaroLinux",
        "alpine" => "Alpine",
        "mageia" => "Mageia",
        "mandriva" => "Mandriva",
        _ => return None,
    };
    Some(name)
}

/// The family an operating system belongs to. Unknown systems form their own
/// family named after the kernel.
fn os_family<'a>(name: &'a str, kernel: &'a str) -> &'a str {
    match name {
        "Debian" | "Ubuntu" | "LinuxMint" | "Raspbian" | "elementary" => "Debian",
        "RedHat" | "CentOS" | "Fedora" | "Rocky" | "AlmaLinux" | "OracleLinux" | "Amazon"
        | "Scientific" => "RedHat",
        "SLES" | "OpenSuSE" => "Suse",
        "Gentoo" => "Gentoo",
        "Archlinux" | "ManjaroLinux" => "Archlinux",
        "Mageia" | "Mandriva" => "Mandrake",
        "Solaris" => "Solaris",
        _ => kernel,
    }
}

/// Major release: the first component, except Ubuntu's `YY.MM` scheme which
/// keeps two.
fn major_release(name: &str, release: &str) -> String {
    let take = if name == "Ubuntu" { 2 } else { 1 };
    release
        .split(|c: char| c == '.' || c.is_whitespace())
        .take(take)
        .collect::<Vec<_>>()
        .join(".")
}
