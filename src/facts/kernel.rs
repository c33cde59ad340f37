use crate::collection::Collection;
use crate::resolver::Resolver;

use super::names;

/// Resolves the kernel name, release and version.
#[derive(Debug)]
pub struct KernelResolver {
    names: Vec<String>,
}

impl KernelResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[
                names::KERNEL,
                names::KERNEL_VERSION,
                names::KERNEL_RELEASE,
                names::KERNEL_MAJOR_VERSION,
            ]),
        }
    }
}

impl Default for KernelResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for KernelResolver {
    fn name(&self) -> &str {
        "kernel"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        let Some(kernel) = probe() else {
            tracing::debug!("kernel information is unavailable");
            return;
        };

        facts.add(names::KERNEL, kernel.name.as_str());
        if let Some(release) = kernel.release {
            let version = kernel_version(&release).to_string();
            facts.add(names::KERNEL_MAJOR_VERSION, kernel_major_version(&version));
            facts.add(names::KERNEL_VERSION, version);
            facts.add(names::KERNEL_RELEASE, release);
        }
    }
}

struct Kernel {
    name: String,
    release: Option<String>,
}

#[cfg(unix)]
fn probe() -> Option<Kernel> {
    let uts = uname()?;
    Some(Kernel {
        name: uts.sysname,
        release: Some(uts.release).filter(|r| !r.is_empty()),
    })
}

#[cfg(not(unix))]
fn probe() -> Option<Kernel> {
    let name = sysinfo::System::name()?;
    Some(Kernel {
        name: kernel_name(&name).to_string(),
        release: sysinfo::System::kernel_version(),
    })
}

#[cfg(not(unix))]
fn kernel_name(system: &str) -> &str {
    if system.eq_ignore_ascii_case("windows") {
        "windows"
    } else {
        system
    }
}

/// The fields of `uname(2)` the built-in resolvers use.
#[cfg(unix)]
pub(super) struct Uname {
    pub sysname: String,
    pub release: String,
    pub machine: String,
}

#[cfg(unix)]
pub(super) fn uname() -> Option<Uname> {
    use std::ffi::CStr;

    let mut uts = std::mem::MaybeUninit::<libc::utsname>::zeroed();
    // SAFETY: `uts` is a valid, writable utsname; uname only writes into it.
    let rc = unsafe { libc::uname(uts.as_mut_ptr()) };
    if rc != 0 {
        tracing::warn!(error = %std::io::Error::last_os_error(), "uname failed");
        return None;
    }
    // SAFETY: uname succeeded, so every field is a NUL-terminated string.
    let uts = unsafe { uts.assume_init() };
    let field = |raw: &[libc::c_char]| {
        // SAFETY: see above.
        unsafe { CStr::from_ptr(raw.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    };
    Some(Uname {
        sysname: field(&uts.sysname[..]),
        release: field(&uts.release[..]),
        machine: field(&uts.machine[..]),
    })
}

/// The version part of a kernel release: `5.15.0-91-generic` is `5.15.0`.
fn kernel_version(release: &str) -> &str {
    release
        .split(|c: char| c == '-' || c == '+' || c == '_')
        .next()
        .unwrap_or(release)
}

/// The first two components of a kernel version.
fn kernel_major_version(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_version() {
        assert_eq!(kernel_version("5.15.0-91-generic"), "5.15.0");
        assert_eq!(kernel_version("23.1.0"), "23.1.0");
        assert_eq!(kernel_version("6.6.7+rpt-rpi-v8"), "6.6.7");
    }

    #[test]
    fn test_kernel_major_version() {
        assert_eq!(kernel_major_version("5.15.0"), "5.15");
        assert_eq!(kernel_major_version("10"), "10");
        assert_eq!(kernel_major_version("10.0.19045"), "10.0");
    }

    #[test]
    fn test_resolver_produces_kernel() {
        let mut facts = Collection::new();
        facts.add_resolver(std::sync::Arc::new(KernelResolver::new()));
        let kernel = facts.get::<&str>(names::KERNEL).map(str::to_string);
        if let Some(kernel) = kernel {
            assert!(!kernel.is_empty());
            if let Some(version) = facts.get::<&str>(names::KERNEL_VERSION).map(str::to_string) {
                let major = facts.get::<&str>(names::KERNEL_MAJOR_VERSION).unwrap();
                assert!(version.starts_with(major));
            }
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_uname_on_linux() {
        let uts = uname().unwrap();
        assert_eq!(uts.sysname, "Linux");
        assert!(!uts.machine.is_empty());
    }
}
