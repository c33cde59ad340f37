//! Resolver registry.
//!
//! Resolvers live in an arena keyed by a stable [`ResolverId`]. Three views
//! hold handles into the arena:
//! - `order`: insertion order, each resolver exactly once
//! - `by_name`: fact name to the resolvers claiming it, oldest first
//! - `patterns`: pattern resolvers in insertion order
//!
//! Lookups walk the views newest-first, so the last registered resolver wins.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::resolver::Resolver;

/// Stable handle to a registered resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolverId(u64);

impl fmt::Display for ResolverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolver#{}", self.0)
    }
}

/// Ordered set of resolvers with exact-name and pattern dispatch.
#[derive(Default)]
pub struct ResolverRegistry {
    arena: HashMap<ResolverId, Arc<dyn Resolver>>,
    order: Vec<ResolverId>,
    by_name: HashMap<String, Vec<ResolverId>>,
    patterns: Vec<ResolverId>,
    next_id: u64,
}

impl ResolverRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolver and returns its handle.
    ///
    /// The resolver is indexed under every name it claims (duplicates in its
    /// claim list are indexed once) and, if it has a pattern, appended to the
    /// pattern list.
    pub fn register(&mut self, resolver: Arc<dyn Resolver>) -> ResolverId {
        let id = ResolverId(self.next_id);
        self.next_id += 1;

        let mut seen = HashSet::new();
        for name in resolver.names() {
            if seen.insert(name.as_str()) {
                self.by_name.entry(name.clone()).or_default().push(id);
            }
        }
        if resolver.pattern().is_some() {
            self.patterns.push(id);
        }
        if resolver.names().is_empty() && resolver.pattern().is_none() {
            tracing::warn!(resolver = resolver.name(), "resolver claims no facts and has no pattern");
        }

        self.order.push(id);
        self.arena.insert(id, resolver);
        id
    }

    /// Removes a resolver from every view.
    ///
    /// Unknown handles are ignored.
    pub fn unregister(&mut self, id: ResolverId) -> Option<Arc<dyn Resolver>> {
        let resolver = self.arena.remove(&id)?;

        self.order.retain(|r| *r != id);
        self.patterns.retain(|r| *r != id);
        for name in resolver.names() {
            if let Some(ids) = self.by_name.get_mut(name) {
                ids.retain(|r| *r != id);
                if ids.is_empty() {
                    self.by_name.remove(name);
                }
            }
        }
        Some(resolver)
    }

    /// Get a resolver by handle.
    #[must_use]
    pub fn get(&self, id: ResolverId) -> Option<&Arc<dyn Resolver>> {
        self.arena.get(&id)
    }

    /// Returns true if the handle refers to a registered resolver.
    #[must_use]
    pub fn contains(&self, id: ResolverId) -> bool {
        self.arena.contains_key(&id)
    }

    /// The most recently registered resolver claiming `name` exactly.
    #[must_use]
    pub fn lookup_exact(&self, name: &str) -> Option<ResolverId> {
        self.by_name.get(name).and_then(|ids| ids.last().copied())
    }

    /// The most recently registered pattern resolver matching `name`.
    #[must_use]
    pub fn lookup_pattern(&self, name: &str) -> Option<ResolverId> {
        self.patterns
            .iter()
            .rev()
            .copied()
            .find(|id| self.arena.get(id).is_some_and(|r| r.is_match(name)))
    }

    /// Every resolver able to produce `name`, highest precedence first:
    /// exact claims newest-first, then matching patterns newest-first.
    pub fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = ResolverId> + 'a {
        let exact = self
            .by_name
            .get(name)
            .into_iter()
            .flat_map(|ids| ids.iter().rev().copied());
        let patterns = self
            .patterns
            .iter()
            .rev()
            .copied()
            .filter(move |id| self.arena.get(id).is_some_and(|r| r.is_match(name)));
        exact.chain(patterns)
    }

    /// All exactly claimed fact names, in resolver registration order, each
    /// name once.
    #[must_use]
    pub fn exact_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for id in &self.order {
            let Some(resolver) = self.arena.get(id) else {
                continue;
            };
            for name in resolver.names() {
                if seen.insert(name.clone()) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Iterates registered resolvers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ResolverId, &Arc<dyn Resolver>)> {
        self.order
            .iter()
            .filter_map(|id| self.arena.get(id).map(|r| (*id, r)))
    }

    /// Number of registered resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no resolvers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Removes every resolver.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
        self.by_name.clear();
        self.patterns.clear();
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(id, r)| format!("{id}: {}", r.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FnResolver;

    fn named(name: &str, names: &[&str]) -> Arc<dyn Resolver> {
        FnResolver::new(name, names.iter().copied(), |_| {}).into_arc()
    }

    fn patterned(name: &str, pattern: &str) -> Arc<dyn Resolver> {
        FnResolver::new(name, Vec::<String>::new(), |_| {})
            .with_pattern(pattern)
            .unwrap()
            .into_arc()
    }

    #[test]
    fn test_register_indexes_every_name() {
        let mut registry = ResolverRegistry::new();
        let id = registry.register(named("kernel", &["kernel", "kernelversion"]));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup_exact("kernel"), Some(id));
        assert_eq!(registry.lookup_exact("kernelversion"), Some(id));
        assert_eq!(registry.lookup_exact("os"), None);
    }

    #[test]
    fn test_last_registered_wins() {
        let mut registry = ResolverRegistry::new();
        let first = registry.register(named("r1", &["os"]));
        let second = registry.register(named("r2", &["os"]));
        assert_eq!(registry.lookup_exact("os"), Some(second));

        registry.unregister(second);
        assert_eq!(registry.lookup_exact("os"), Some(first));

        registry.unregister(first);
        assert_eq!(registry.lookup_exact("os"), None);
    }

    #[test]
    fn test_unregister_removes_from_all_views() {
        let mut registry = ResolverRegistry::new();
        let r = FnResolver::new("net", ["interfaces"], |_| {})
            .with_pattern("^ipaddress_")
            .unwrap()
            .into_arc();
        let id = registry.register(r);
        assert_eq!(registry.lookup_pattern("ipaddress_eth0"), Some(id));

        assert!(registry.unregister(id).is_some());
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
        assert_eq!(registry.lookup_exact("interfaces"), None);
        assert_eq!(registry.lookup_pattern("ipaddress_eth0"), None);
        assert!(registry.exact_names().is_empty());
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut registry = ResolverRegistry::new();
        let id = registry.register(named("a", &["a"]));
        registry.unregister(id);
        assert!(registry.unregister(id).is_none());
        assert!(registry.unregister(ResolverId(999)).is_none());
    }

    #[test]
    fn test_pattern_lookup_prefers_newest() {
        let mut registry = ResolverRegistry::new();
        let broad = registry.register(patterned("broad", "^network_"));
        let narrow = registry.register(patterned("narrow", "^network_eth"));
        assert_eq!(registry.lookup_pattern("network_eth0"), Some(narrow));
        assert_eq!(registry.lookup_pattern("network_lo"), Some(broad));
        assert_eq!(registry.lookup_pattern("hostname"), None);
    }

    #[test]
    fn test_candidates_order() {
        let mut registry = ResolverRegistry::new();
        let p1 = registry.register(patterned("p1", "^x"));
        let e1 = registry.register(named("e1", &["x1"]));
        let p2 = registry.register(patterned("p2", "^x"));
        let e2 = registry.register(named("e2", &["x1"]));
        let got: Vec<_> = registry.candidates("x1").collect();
        assert_eq!(got, vec![e2, e1, p2, p1]);
    }

    #[test]
    fn test_duplicate_claims_indexed_once() {
        let mut registry = ResolverRegistry::new();
        let id = registry.register(named("dup", &["a", "a", "b"]));
        assert_eq!(registry.candidates("a").collect::<Vec<_>>(), vec![id]);
        assert_eq!(registry.exact_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_exact_names_in_registration_order() {
        let mut registry = ResolverRegistry::new();
        registry.register(named("first", &["b", "a"]));
        registry.register(named("second", &["c", "a"]));
        assert_eq!(registry.exact_names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut registry = ResolverRegistry::new();
        registry.register(named("a", &["a"]));
        registry.register(patterned("p", "^p"));
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.lookup_exact("a"), None);
        assert_eq!(registry.lookup_pattern("px"), None);
        assert_eq!(registry.iter().count(), 0);
    }
}
