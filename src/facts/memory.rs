use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::collection::Collection;
use crate::resolver::Resolver;

use super::names;

const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Resolves physical memory and swap totals and free amounts.
#[derive(Debug)]
pub struct MemoryResolver {
    names: Vec<String>,
}

impl MemoryResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[
                names::MEMORY_SIZE,
                names::MEMORY_FREE,
                names::MEMORY_SIZE_MB,
                names::MEMORY_FREE_MB,
                names::SWAP_SIZE,
                names::SWAP_FREE,
                names::SWAP_SIZE_MB,
                names::SWAP_FREE_MB,
            ]),
        }
    }
}

impl Default for MemoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for MemoryResolver {
    fn name(&self) -> &str {
        "memory"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        );

        let total = system.total_memory();
        if total == 0 {
            tracing::debug!("memory information is unavailable");
            return;
        }
        let free = system.available_memory();
        facts.add(names::MEMORY_SIZE, human_size(total));
        facts.add(names::MEMORY_FREE, human_size(free));
        facts.add(names::MEMORY_SIZE_MB, megabytes(total));
        facts.add(names::MEMORY_FREE_MB, megabytes(free));

        let swap_total = system.total_swap();
        if swap_total > 0 {
            let swap_free = system.free_swap();
            facts.add(names::SWAP_SIZE, human_size(swap_total));
            facts.add(names::SWAP_FREE, human_size(swap_free));
            facts.add(names::SWAP_SIZE_MB, megabytes(swap_total));
            facts.add(names::SWAP_FREE_MB, megabytes(swap_free));
        }
    }
}

/// Formats a byte count with two decimals in the largest binary unit that
/// keeps the value at or above one, e.g. `15.50 GiB`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    // Rounding can carry into the next unit (1023.999 MiB prints as 1.00 GiB).
    if format!("{value:.2}") == "1024.00" && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Mebibytes rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
