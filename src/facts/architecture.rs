use crate::collection::Collection;
use crate::resolver::Resolver;

use super::names;

/// Resolves the hardware model and the distribution's name for it.
///
/// Depends on the `osfamily` fact.
#[derive(Debug)]
pub struct ArchitectureResolver {
    names: Vec<String>,
}

impl ArchitectureResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[names::HARDWARE_MODEL, names::ARCHITECTURE]),
        }
    }
}

impl Default for ArchitectureResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for ArchitectureResolver {
    fn name(&self) -> &str {
        "architecture"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        let Some(model) = hardware_model() else {
            return;
        };
        let family = facts.get::<&str>(names::OS_FAMILY).map(str::to_string);
        let arch = architecture(&model, family.as_deref());

        facts.add(names::ARCHITECTURE, arch);
        facts.add(names::HARDWARE_MODEL, model);
    }
}

#[cfg(unix)]
fn hardware_model() -> Option<String> {
    super::kernel::uname()
        .map(|uts| uts.machine)
        .filter(|m| !m.is_empty())
}

#[cfg(not(unix))]
fn hardware_model() -> Option<String> {
    Some(std::env::consts::ARCH.to_string())
}

/// Debian and Gentoo name architectures after their package ports; Windows
/// uses its own names. Everything else reports the hardware model.
fn architecture(model: &str, family: Option<&str>) -> String {
    let mapped = match (family, model) {
        (Some("Debian" | "Gentoo"), "x86_64") => "amd64",
        (Some("Debian"), "aarch64") => "arm64",
        (Some("Debian"), "armv7l") => "armhf",
        (Some("Debian" | "Gentoo"), "i486" | "i586" | "i686") => "i386",
        (Some("windows"), "x86_64") => "x64",
        (Some("windows"), "x86") => "x86",
        _ => model,
    };
    mapped.to_string()
}
