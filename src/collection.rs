//! The fact collection.
//!
//! The collection owns the resolved fact store and the resolver registry and
//! drives lazy, memoized resolution:
//!
//! 1. A fact already in the store is returned as is.
//! 2. Otherwise the most recently registered resolver claiming the exact name
//!    is invoked (at most once per collection).
//! 3. If that did not produce the fact, the most recently registered pattern
//!    resolver matching the name is invoked.
//! 4. If nothing produced it, the name is remembered as absent until the
//!    resolver set changes.
//!
//! Resolvers may query the collection for other facts while they run, which
//! resolves those facts recursively on the calling thread.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CollectionConfig;
use crate::custom::CustomFactSource;
use crate::error::{FactError, FactResult, ResolutionError};
use crate::external::{self, ExternalResolver};
use crate::facts;
use crate::output::{self, Format};
use crate::registry::{ResolverId, ResolverRegistry};
use crate::resolver::Resolver;
use crate::value::{FromValue, Value};

/// Resolves and stores facts.
///
/// # Examples
///
/// ```
/// use facter::{Collection, FnResolver};
///
/// let mut facts = Collection::new();
/// facts.add_resolver(FnResolver::new("r1", ["os"], |f| f.add("os", "linux")).into_arc());
/// facts.add_resolver(FnResolver::new("r2", ["os"], |f| f.add("os", "debian")).into_arc());
///
/// // The resolver registered last wins.
/// assert_eq!(facts.get::<&str>("os"), Some("debian"));
/// ```
pub struct Collection {
    facts: BTreeMap<String, Value>,
    registry: ResolverRegistry,
    config: CollectionConfig,
    /// Names that no resolver produced since the resolver set last changed.
    unresolvable: HashSet<String>,
    /// Names currently being resolved, outermost first.
    resolving: Vec<String>,
    /// Resolvers currently running, outermost first.
    active: Vec<ResolverId>,
    ran: HashSet<ResolverId>,
    /// Inserts dropped because a higher-precedence resolver had not run yet,
    /// kept per name and producer as a fallback.
    deferred: HashMap<String, Vec<(ResolverId, Value)>>,
    cycle: Option<ResolutionError>,
    external: Vec<Box<dyn ExternalResolver>>,
    custom: Option<Box<dyn CustomFactSource>>,
}

impl Collection {
    /// Creates an empty collection with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    /// Creates an empty collection with the given configuration.
    #[must_use]
    pub fn with_config(config: CollectionConfig) -> Self {
        Self {
            facts: BTreeMap::new(),
            registry: ResolverRegistry::new(),
            config,
            unresolvable: HashSet::new(),
            resolving: Vec::new(),
            active: Vec::new(),
            ran: HashSet::new(),
            deferred: HashMap::new(),
            cycle: None,
            external: external::default_resolvers(),
            custom: None,
        }
    }

    /// The configuration this collection was built with.
    #[must_use]
    pub const fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// The registered resolvers.
    #[must_use]
    pub const fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    /// Registers the built-in platform resolvers, skipping any whose name is on
    /// the configured blocklist.
    pub fn add_default_facts(&mut self) {
        for resolver in facts::default_resolvers() {
            if self.config.is_blocked(resolver.name()) {
                tracing::debug!(resolver = resolver.name(), "resolver is blocked");
                continue;
            }
            self.add_resolver(resolver);
        }
    }

    /// Registers several resolvers in order.
    pub fn add_resolvers<I>(&mut self, resolvers: I) -> Vec<ResolverId>
    where
        I: IntoIterator<Item = Arc<dyn Resolver>>,
    {
        resolvers.into_iter().map(|r| self.add_resolver(r)).collect()
    }

    /// Registers a resolver. The last resolver added for a name or pattern wins
    /// resolution; facts that are already resolved are not recomputed.
    pub fn add_resolver(&mut self, resolver: Arc<dyn Resolver>) -> ResolverId {
        let name = resolver.name().to_string();
        let id = self.registry.register(resolver);
        self.unresolvable.clear();
        tracing::debug!(resolver = %name, id = %id, "registered resolver");
        id
    }

    /// Unregisters a resolver. Facts it already produced stay in the store.
    pub fn remove_resolver(&mut self, id: ResolverId) -> Option<Arc<dyn Resolver>> {
        let resolver = self.registry.unregister(id)?;
        self.unresolvable.clear();
        self.ran.remove(&id);
        tracing::debug!(resolver = resolver.name(), id = %id, "unregistered resolver");
        Some(resolver)
    }

    /// Adds a fact value.
    ///
    /// Outside of resolution this always inserts or replaces the value. While a
    /// resolver is running, its inserts never replace an already resolved fact.
    /// An insert for a name whose higher-precedence resolver has not run yet is
    /// deferred, and used only if that resolver leaves the name absent.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if let Some(&active) = self.active.last() {
            if self.facts.contains_key(&name) {
                tracing::debug!(fact = %name, resolver = %active, "fact already resolved, keeping first value");
                return;
            }
            if self.outranked(&name, active) {
                tracing::debug!(fact = %name, resolver = %active, "fact shadowed by a later resolver, deferring");
                self.deferred
                    .entry(name)
                    .or_default()
                    .push((active, value.into()));
                return;
            }
        }
        self.store(name, value.into());
    }

    /// Removes a fact by name. No resolver is unregistered.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.facts.remove(name)
    }

    /// Removes every fact and every resolver.
    pub fn clear(&mut self) {
        self.facts.clear();
        self.registry.clear();
        self.unresolvable.clear();
        self.resolving.clear();
        self.active.clear();
        self.ran.clear();
        self.deferred.clear();
        self.cycle = None;
    }

    /// Gets a fact value of the expected type, resolving it first.
    ///
    /// Returns `None` if the fact cannot be produced or is stored with a
    /// different type.
    pub fn get<'a, T: FromValue<'a>>(&'a mut self, name: &str) -> Option<T> {
        self.resolve_logged(name);
        self.facts.get(name).and_then(|v| v.as_type::<T>())
    }

    /// Gets a fact value of the expected type without triggering resolution.
    #[must_use]
    pub fn peek<'a, T: FromValue<'a>>(&'a self, name: &str) -> Option<T> {
        self.facts.get(name).and_then(|v| v.as_type::<T>())
    }

    /// Gets a fact value of any type, resolving it first.
    pub fn value(&mut self, name: &str) -> Option<&Value> {
        self.resolve_logged(name);
        self.facts.get(name)
    }

    /// Like [`Collection::value`] but reports a resolution cycle instead of
    /// logging it.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::Cycle` if a resolver re-entered a fact that was
    /// still being resolved.
    pub fn try_get(&mut self, name: &str) -> FactResult<Option<&Value>> {
        self.resolve_fact(name)?;
        Ok(self.facts.get(name))
    }

    /// Resolves a single fact.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::Cycle` if a resolution cycle was detected.
    pub fn resolve_fact(&mut self, name: &str) -> FactResult<()> {
        self.resolve_one(name);
        self.take_cycle()
    }

    /// Resolves every exactly claimed fact. Pattern resolvers only fire on
    /// demand since their name families cannot be enumerated.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::Cycle` if a resolution cycle was detected.
    pub fn resolve_facts(&mut self) -> FactResult<()> {
        for name in self.registry.exact_names() {
            self.resolve_one(&name);
        }
        self.take_cycle()
    }

    /// Resolves everything, then keeps only the named facts. With `add`, every
    /// requested name that is still missing is added as an empty string.
    pub fn filter<I, S>(&mut self, names: I, add: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        self.resolve_all_logged();
        for name in &names {
            self.resolve_logged(name);
        }

        self.facts.retain(|name, _| names.contains(name));
        if add {
            for name in names {
                self.facts
                    .entry(name)
                    .or_insert_with(|| Value::String(String::new()));
            }
        }
    }

    /// Returns true if no facts resolve.
    pub fn is_empty(&mut self) -> bool {
        self.resolve_all_logged();
        self.facts.is_empty()
    }

    /// Number of facts after full resolution.
    pub fn size(&mut self) -> usize {
        self.resolve_all_logged();
        self.facts.len()
    }

    /// Resolves everything, then calls `f` for each fact in name order until it
    /// returns false.
    pub fn each<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &Value) -> bool,
    {
        self.resolve_all_logged();
        for (name, value) in &self.facts {
            if !f(name.as_str(), value) {
                break;
            }
        }
    }

    /// Iterates the facts resolved so far, in name order, without resolving.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replaces the external fact parsers.
    pub fn set_external_resolvers(&mut self, resolvers: Vec<Box<dyn ExternalResolver>>) {
        self.external = resolvers;
    }

    /// Installs the source used by [`Collection::add_custom_facts`].
    pub fn set_custom_source(&mut self, source: Box<dyn CustomFactSource>) {
        self.custom = Some(source);
    }

    /// Adds external facts found in `directories`.
    ///
    /// Every registered resolver runs first, so external values override
    /// anything computed internally. An empty list falls back to the configured
    /// directories, then to the platform defaults.
    ///
    /// # Errors
    ///
    /// Returns `FactError::ExternalFacts` listing every source that failed;
    /// facts from the sources that loaded are still added.
    pub fn add_external_facts(&mut self, directories: &[PathBuf]) -> FactResult<()> {
        self.resolve_facts()?;

        let directories = if !directories.is_empty() {
            directories.to_vec()
        } else if !self.config.external_dirs.is_empty() {
            self.config.external_dirs.clone()
        } else {
            external::default_directories()
        };

        let loaded = external::load_directories(
            &self.external,
            &directories,
            self.config.lowercase_external_names,
        );
        for (name, value) in loaded.facts {
            self.add(name, value);
        }

        if loaded.failures.is_empty() {
            Ok(())
        } else {
            Err(FactError::ExternalFacts {
                failures: loaded.failures,
            })
        }
    }

    /// Adds custom facts produced by the installed custom fact source.
    ///
    /// Every registered resolver runs first. An empty list falls back to the
    /// configured custom directories.
    ///
    /// # Errors
    ///
    /// Propagates resolution cycles and custom source failures.
    pub fn add_custom_facts(&mut self, directories: &[PathBuf]) -> FactResult<()> {
        self.resolve_facts()?;

        let directories = if directories.is_empty() {
            self.config.custom_dirs.clone()
        } else {
            directories.to_vec()
        };

        let Some(source) = self.custom.as_ref() else {
            if !directories.is_empty() {
                tracing::warn!(
                    directories = directories.len(),
                    "custom fact directories given but no custom fact source is installed"
                );
            }
            return Ok(());
        };

        let produced = source.load(&directories, self)?;
        for (name, value) in produced {
            self.add(name, value);
        }
        Ok(())
    }

    /// Adds facts from environment variables carrying the configured prefix.
    ///
    /// # Errors
    ///
    /// Propagates resolution cycles.
    pub fn add_environment_facts(&mut self) -> FactResult<()> {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        self.add_environment_facts_from(vars)
    }

    /// Adds facts from the given variables. A variable `FACTER_ROLE=web` (with
    /// the default prefix) becomes the fact `role` with value `"web"`.
    ///
    /// # Errors
    ///
    /// Propagates resolution cycles.
    pub fn add_environment_facts_from<I>(&mut self, vars: I) -> FactResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.resolve_facts()?;

        let prefix = self.config.environment_prefix.to_ascii_lowercase();
        let found: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let key = key.to_ascii_lowercase();
                let name = key.strip_prefix(&prefix)?;
                (!name.is_empty()).then(|| (name.to_string(), value))
            })
            .collect();

        for (name, value) in found {
            tracing::debug!(fact = %name, "adding environment fact");
            self.add(name, value);
        }
        Ok(())
    }

    /// Resolves everything and writes the facts to `writer`.
    ///
    /// # Errors
    ///
    /// Propagates resolution cycles and serialization or I/O failures.
    pub fn write<W: io::Write>(&mut self, writer: W, format: Format) -> FactResult<()> {
        self.resolve_facts()?;
        output::write(&self.facts, writer, format)?;
        Ok(())
    }

    fn resolve_one(&mut self, name: &str) {
        if self.facts.contains_key(name) || self.unresolvable.contains(name) {
            return;
        }

        if let Some(start) = self.resolving.iter().position(|n| n == name) {
            if self.cycle.is_none() {
                let mut chain = self.resolving[start..].to_vec();
                chain.push(name.to_string());
                self.cycle = Some(ResolutionError::Cycle {
                    name: name.to_string(),
                    chain,
                });
            }
            return;
        }

        self.resolving.push(name.to_string());

        if let Some(id) = self.registry.lookup_exact(name) {
            self.invoke(id, name);
        }
        if !self.facts.contains_key(name) {
            if let Some(id) = self.registry.lookup_pattern(name) {
                self.invoke(id, name);
            }
        }

        self.resolving.pop();

        if !self.facts.contains_key(name) {
            self.apply_deferred(name);
        }
        if !self.facts.contains_key(name) {
            tracing::debug!(fact = name, "fact could not be resolved");
            self.unresolvable.insert(name.to_string());
        }
    }

    fn invoke(&mut self, id: ResolverId, fact: &str) {
        if !self.ran.insert(id) {
            return;
        }
        let Some(resolver) = self.registry.get(id).cloned() else {
            return;
        };

        tracing::debug!(fact, resolver = resolver.name(), "invoking resolver");
        self.active.push(id);
        resolver.resolve(self);
        self.active.pop();
    }

    fn store(&mut self, name: String, value: Value) {
        self.unresolvable.remove(&name);
        self.deferred.remove(&name);
        self.facts.insert(name, value);
    }

    /// Falls back to a deferred insert when the winning resolvers left `name`
    /// absent. The highest-precedence producer that ran wins.
    fn apply_deferred(&mut self, name: &str) {
        let Some(pending) = self.deferred.get(name) else {
            return;
        };
        let chosen = self
            .registry
            .candidates(name)
            .filter(|id| self.ran.contains(id))
            .find_map(|id| pending.iter().find(|(producer, _)| *producer == id))
            .map(|(producer, value)| (*producer, value.clone()));

        if let Some((producer, value)) = chosen {
            tracing::debug!(fact = name, resolver = %producer, "using deferred fact value");
            self.store(name.to_string(), value);
        }
    }

    /// True if a resolver with higher precedence than `active` could still
    /// produce `name`.
    fn outranked(&self, name: &str, active: ResolverId) -> bool {
        for id in self.registry.candidates(name) {
            if id == active {
                return false;
            }
            if !self.ran.contains(&id) {
                return true;
            }
        }
        false
    }

    /// Only the outermost entry point reports a cycle; nested lookups made by
    /// resolvers just see the fact as absent.
    fn take_cycle(&mut self) -> FactResult<()> {
        if self.resolving.is_empty() {
            if let Some(err) = self.cycle.take() {
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn resolve_logged(&mut self, name: &str) {
        if let Err(e) = self.resolve_fact(name) {
            tracing::error!(fact = name, error = %e, "fact resolution failed");
        }
    }

    fn resolve_all_logged(&mut self) {
        if let Err(e) = self.resolve_facts() {
            tracing::error!(error = %e, "fact resolution failed");
        }
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("facts", &self.facts)
            .field("resolvers", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::resolver::FnResolver;

    fn counting(
        name: &str,
        names: &[&str],
        produce: &[(&'static str, &'static str)],
    ) -> (Arc<dyn Resolver>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let produce = produce.to_vec();
        let resolver = FnResolver::new(name, names.iter().copied(), move |facts| {
            counter.fetch_add(1, Ordering::SeqCst);
            for (k, v) in &produce {
                facts.add(*k, *v);
            }
        });
        (resolver.into_arc(), calls)
    }

    #[test]
    fn test_resolution_is_memoized() {
        let (r, calls) = counting("os", &["os"], &[("os", "linux")]);
        let mut facts = Collection::new();
        facts.add_resolver(r);

        assert_eq!(facts.get::<&str>("os"), Some("linux"));
        assert_eq!(facts.get::<&str>("os"), Some("linux"));
        facts.resolve_facts().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_multi_fact_resolver_runs_once() {
        let (r, calls) = counting(
            "kernel",
            &["kernel", "kernelversion", "kernelrelease"],
            &[("kernel", "Linux"), ("kernelversion", "6.1")],
        );
        let mut facts = Collection::new();
        facts.add_resolver(r);

        assert_eq!(facts.get::<&str>("kernelversion"), Some("6.1"));
        assert_eq!(facts.get::<&str>("kernel"), Some("Linux"));
        // Not produced, and its resolver already ran.
        assert_eq!(facts.get::<&str>("kernelrelease"), None);
        assert_eq!(facts.get::<&str>("kernelrelease"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_registered_resolver_wins() {
        let (r1, calls1) = counting("r1", &["os"], &[("os", "linux")]);
        let (r2, calls2) = counting("r2", &["os"], &[("os", "debian")]);
        let mut facts = Collection::new();
        facts.add_resolver(r1);
        facts.add_resolver(r2);

        assert_eq!(facts.get::<&str>("os"), Some("debian"));
        assert_eq!(calls1.load(Ordering::SeqCst), 0);
        assert_eq!(calls2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_falls_back_in_fresh_collection() {
        let (r1, _) = counting("r1", &["os"], &[("os", "linux")]);
        let (r2, _) = counting("r2", &["os"], &[("os", "debian")]);

        let mut facts = Collection::new();
        facts.add_resolver(Arc::clone(&r1));
        let id2 = facts.add_resolver(Arc::clone(&r2));
        assert!(facts.remove_resolver(id2).is_some());
        assert_eq!(facts.get::<&str>("os"), Some("linux"));
    }

    #[test]
    fn test_side_effect_insert_does_not_shadow_later_resolver() {
        // r1 produces both facts; r2 (registered later) owns "b".
        let (r1, _) = counting("r1", &["a", "b"], &[("a", "1"), ("b", "from r1")]);
        let (r2, _) = counting("r2", &["b"], &[("b", "from r2")]);
        let mut facts = Collection::new();
        facts.add_resolver(r1);
        facts.add_resolver(r2);

        assert_eq!(facts.get::<&str>("a"), Some("1"));
        assert_eq!(facts.get::<&str>("b"), Some("from r2"));
    }

    #[test]
    fn test_deferred_insert_used_when_later_resolver_produces_nothing() {
        let build = || {
            let (r1, _) = counting("r1", &["a", "b"], &[("a", "1"), ("b", "from r1")]);
            let (r2, r2_calls) = counting("r2", &["b"], &[]);
            let mut facts = Collection::new();
            facts.add_resolver(r1);
            facts.add_resolver(r2);
            (facts, r2_calls)
        };

        let (mut a_first, r2_calls) = build();
        assert_eq!(a_first.get::<&str>("a"), Some("1"));
        assert_eq!(a_first.get::<&str>("b"), Some("from r1"));
        assert_eq!(r2_calls.load(Ordering::SeqCst), 1);

        let (mut b_first, _) = build();
        assert_eq!(b_first.get::<&str>("b"), Some("from r1"));
        assert_eq!(b_first.get::<&str>("a"), Some("1"));

        let (mut all, _) = build();
        assert_eq!(all.size(), 2);
        assert_eq!(all.peek::<&str>("b"), Some("from r1"));
    }

    #[test]
    fn test_deferred_insert_not_used_when_later_resolver_produces() {
        let (r1, _) = counting("r1", &["a", "b"], &[("a", "1"), ("b", "from r1")]);
        let (r2, _) = counting("r2", &["b"], &[("b", "from r2")]);
        let mut facts = Collection::new();
        facts.add_resolver(r1);
        facts.add_resolver(r2);

        assert_eq!(facts.get::<&str>("a"), Some("1"));
        assert_eq!(facts.get::<&str>("b"), Some("from r2"));
        // A removed fact is not revived from the discarded value.
        facts.remove("b");
        assert_eq!(facts.get::<&str>("b"), None);
    }

    #[test]
    fn test_earlier_resolver_cannot_overwrite_resolved_fact() {
        let (r1, _) = counting("r1", &["a", "b"], &[("a", "1"), ("b", "from r1")]);
        let (r2, _) = counting("r2", &["b"], &[("b", "from r2")]);
        let mut facts = Collection::new();
        facts.add_resolver(r1);
        facts.add_resolver(r2);

        assert_eq!(facts.get::<&str>("b"), Some("from r2"));
        assert_eq!(facts.get::<&str>("a"), Some("1"));
        assert_eq!(facts.peek::<&str>("b"), Some("from r2"));
    }

    #[test]
    fn test_pattern_resolver_fires_on_demand() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let r = FnResolver::new("net", Vec::<String>::new(), move |facts| {
            counter.fetch_add(1, Ordering::SeqCst);
            facts.add("network_eth0", "10.0.0.0");
            facts.add("network_lo", "127.0.0.0");
        })
        .with_pattern("^network_")
        .unwrap();

        let mut facts = Collection::new();
        facts.add_resolver(r.into_arc());
        // Patterns are not enumerable, so full resolution does not fire them.
        assert_eq!(facts.size(), 0);

        assert_eq!(facts.get::<&str>("network_lo"), Some("127.0.0.0"));
        assert_eq!(facts.get::<&str>("network_eth0"), Some("10.0.0.0"));
        assert_eq!(facts.get::<&str>("network_wlan0"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exact_resolver_beats_pattern() {
        let (exact, _) = counting("exact", &["network_eth0"], &[("network_eth0", "exact")]);
        let pattern = FnResolver::new("pattern", Vec::<String>::new(), |facts| {
            facts.add("network_eth0", "pattern");
        })
        .with_pattern("^network_")
        .unwrap();

        let mut facts = Collection::new();
        facts.add_resolver(exact);
        facts.add_resolver(pattern.into_arc());
        assert_eq!(facts.get::<&str>("network_eth0"), Some("exact"));
    }

    #[test]
    fn test_pattern_used_when_exact_produces_nothing() {
        let (exact, _) = counting("exact", &["network_eth0"], &[]);
        let pattern = FnResolver::new("pattern", Vec::<String>::new(), |facts| {
            facts.add("network_eth0", "pattern");
        })
        .with_pattern("^network_")
        .unwrap();

        let mut facts = Collection::new();
        facts.add_resolver(exact);
        facts.add_resolver(pattern.into_arc());
        assert_eq!(facts.get::<&str>("network_eth0"), Some("pattern"));
    }

    #[test]
    fn test_recursive_resolution() {
        let os = FnResolver::new("os", ["osfamily"], |facts| {
            let family = match facts.get::<&str>("operatingsystem") {
                Some("Debian" | "Ubuntu") => "Debian",
                Some(_) => "Other",
                None => return,
            };
            facts.add("osfamily", family);
        });
        let (name, _) = counting("name", &["operatingsystem"], &[("operatingsystem", "Ubuntu")]);

        let mut facts = Collection::new();
        facts.add_resolver(os.into_arc());
        facts.add_resolver(name);
        assert_eq!(facts.get::<&str>("osfamily"), Some("Debian"));
        assert_eq!(facts.peek::<&str>("operatingsystem"), Some("Ubuntu"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let a = FnResolver::new("a", ["a"], |facts| {
            if facts.get::<&str>("b").is_none() {
                facts.add("a", "no b");
            }
        });
        let b = FnResolver::new("b", ["b"], |facts| {
            if let Some(a) = facts.get::<&str>("a") {
                let a = a.to_string();
                facts.add("b", a);
            }
        });

        let mut facts = Collection::new();
        facts.add_resolver(a.into_arc());
        facts.add_resolver(b.into_arc());

        let err = facts.try_get("a").unwrap_err();
        match err {
            FactError::Resolution(ResolutionError::Cycle { name, chain }) => {
                assert_eq!(name, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
        // The cycle is reported once; the value computed meanwhile is kept.
        assert_eq!(facts.get::<&str>("a"), Some("no b"));
        assert!(facts.resolve_facts().is_ok());
    }

    #[test]
    fn test_self_cycle_get_logs_and_returns_none() {
        let r = FnResolver::new("selfish", ["me"], |facts| {
            if facts.get::<&str>("me").is_some() {
                facts.add("me", "impossible");
            }
        });
        let mut facts = Collection::new();
        facts.add_resolver(r.into_arc());
        assert_eq!(facts.get::<&str>("me"), None);
    }

    #[test]
    fn test_type_mismatch_is_absent() {
        let mut facts = Collection::new();
        facts.add("x", "42");
        assert_eq!(facts.get::<i64>("x"), None);
        assert_eq!(facts.get::<&str>("x"), Some("42"));
        assert_eq!(facts.value("x"), Some(&Value::from("42")));
        assert_eq!(facts.value("missing"), None);
    }

    #[test]
    fn test_direct_add_overwrites_and_bypasses_resolvers() {
        let (r, calls) = counting("os", &["os"], &[("os", "linux")]);
        let mut facts = Collection::new();
        facts.add_resolver(r);
        facts.add("os", "custom");
        facts.add("os", "again");
        assert_eq!(facts.get::<&str>("os"), Some("again"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_added_resolver_does_not_recompute() {
        let (r1, _) = counting("r1", &["os"], &[("os", "linux")]);
        let (r2, calls2) = counting("r2", &["os"], &[("os", "debian")]);
        let mut facts = Collection::new();
        facts.add_resolver(r1);
        assert_eq!(facts.get::<&str>("os"), Some("linux"));

        facts.add_resolver(r2);
        assert_eq!(facts.get::<&str>("os"), Some("linux"));
        assert_eq!(calls2.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_known_absent_is_retried_after_registration() {
        let mut facts = Collection::new();
        assert_eq!(facts.get::<&str>("late"), None);

        let (r, _) = counting("late", &["late"], &[("late", "here")]);
        facts.add_resolver(r);
        assert_eq!(facts.get::<&str>("late"), Some("here"));
    }

    #[test]
    fn test_remove_fact_keeps_resolver() {
        let (r, calls) = counting("os", &["os"], &[("os", "linux")]);
        let mut facts = Collection::new();
        facts.add_resolver(r);
        assert_eq!(facts.get::<&str>("os"), Some("linux"));
        assert_eq!(facts.remove("os"), Some(Value::from("linux")));
        assert_eq!(facts.remove("os"), None);
        assert_eq!(facts.registry().len(), 1);
        assert_eq!(facts.get::<&str>("os"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter_adds_placeholders() {
        let (r, _) = counting("a", &["a", "c"], &[("a", "1"), ("c", "3")]);
        let mut facts = Collection::new();
        facts.add_resolver(r);
        facts.filter(["a", "b"], true);

        let mut seen = Vec::new();
        facts.each(|name, value| {
            seen.push((name.to_string(), value.clone()));
            true
        });
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), Value::from("1")),
                ("b".to_string(), Value::from("")),
            ]
        );
    }

    #[test]
    fn test_filter_without_add() {
        let (r, _) = counting("abc", &["a", "b", "c"], &[("a", "1"), ("b", "2"), ("c", "3")]);
        let mut facts = Collection::new();
        facts.add_resolver(r);
        facts.filter(["a", "zzz"], false);
        assert_eq!(facts.size(), 1);
        assert_eq!(facts.get::<&str>("a"), Some("1"));
        assert_eq!(facts.get::<&str>("zzz"), None);
    }

    #[test]
    fn test_filter_resolves_pattern_names() {
        let r = FnResolver::new("net", Vec::<String>::new(), |facts| facts.add("network_eth0", "x"))
            .with_pattern("^network_")
            .unwrap();
        let mut facts = Collection::new();
        facts.add_resolver(r.into_arc());
        facts.filter(["network_eth0"], false);
        assert_eq!(facts.peek::<&str>("network_eth0"), Some("x"));
    }

    #[test]
    fn test_each_stops_early() {
        let mut facts = Collection::new();
        facts.add("a", 1);
        facts.add("b", 2);
        facts.add("c", 3);
        let mut count = 0;
        facts.each(|_, _| {
            count += 1;
            count < 2
        });
        assert_eq!(count, 2);
    }

    #[test]
    fn test_clear() {
        let (r, _) = counting("os", &["os"], &[("os", "linux")]);
        let mut facts = Collection::new();
        facts.add_resolver(r);
        facts.add("x", true);
        facts.clear();
        assert!(facts.is_empty());
        assert_eq!(facts.size(), 0);
        assert!(facts.registry().is_empty());
    }

    #[test]
    fn test_environment_facts_override() {
        let (r, _) = counting("role", &["role"], &[("role", "db")]);
        let mut facts = Collection::new();
        facts.add_resolver(r);
        facts
            .add_environment_facts_from(vec![
                ("FACTER_ROLE".to_string(), "web".to_string()),
                ("facter_Zone".to_string(), "eu".to_string()),
                ("FACTER_".to_string(), "ignored".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ])
            .unwrap();
        assert_eq!(facts.get::<&str>("role"), Some("web"));
        assert_eq!(facts.get::<&str>("zone"), Some("eu"));
        assert_eq!(facts.size(), 2);
    }

    #[test]
    fn test_blocklisted_default_resolvers_are_skipped() {
        let config = CollectionConfig::default().with_blocklist(["Kernel", "memory"]);
        let mut facts = Collection::with_config(config);
        facts.add_default_facts();
        let names: Vec<_> = facts.registry().iter().map(|(_, r)| r.name().to_string()).collect();
        assert!(!names.iter().any(|n| n == "kernel" || n == "memory"));
        assert!(names.iter().any(|n| n == "facter"));
    }
}
