use crate::collection::Collection;
use crate::resolver::Resolver;

use super::names;

/// Resolves the version of this library.
#[derive(Debug)]
pub struct FacterResolver {
    names: Vec<String>,
}

impl FacterResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[names::FACTER_VERSION]),
        }
    }
}

impl Default for FacterResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for FacterResolver {
    fn name(&self) -> &str {
        "facter"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        facts.add(names::FACTER_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
