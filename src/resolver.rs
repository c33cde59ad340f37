//! The resolver abstraction.
//!
//! A resolver is a unit of logic that knows how to produce one or more facts.
//! It claims a fixed set of fact names, a name pattern, or both; when invoked
//! it inserts whatever it can determine into the collection (and may query
//! the collection for other facts, which resolves them on demand).

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::collection::Collection;
use crate::error::ResolutionError;

/// A producer of facts.
///
/// # Examples
///
/// ```
/// use facter::{Collection, Resolver};
///
/// struct Greeting {
///     names: Vec<String>,
/// }
///
/// impl Resolver for Greeting {
///     fn name(&self) -> &str {
///         "greeting"
///     }
///
///     fn names(&self) -> &[String] {
///         &self.names
///     }
///
///     fn resolve(&self, facts: &mut Collection) {
///         facts.add("greeting", "hello");
///     }
/// }
///
/// let mut facts = Collection::new();
/// facts.add_resolver(std::sync::Arc::new(Greeting { names: vec!["greeting".into()] }));
/// assert_eq!(facts.get::<&str>("greeting"), Some("hello"));
/// ```
pub trait Resolver: Send + Sync {
    /// Human-readable name, used for diagnostics and the blocklist.
    fn name(&self) -> &str;

    /// The exact fact names this resolver claims.
    fn names(&self) -> &[String];

    /// The pattern describing a family of fact names this resolver can produce.
    fn pattern(&self) -> Option<&Regex> {
        None
    }

    /// Returns true if `fact` belongs to this resolver's pattern family.
    fn is_match(&self, fact: &str) -> bool {
        self.pattern().is_some_and(|re| re.is_match(fact))
    }

    /// Inserts the facts this resolver can determine.
    ///
    /// A resolver that cannot determine a value simply does not insert it.
    fn resolve(&self, facts: &mut Collection);
}

type ResolveFn = dyn Fn(&mut Collection) + Send + Sync;

/// A resolver backed by a closure.
///
/// # Examples
///
/// ```
/// use facter::{Collection, FnResolver};
///
/// let mut facts = Collection::new();
/// facts.add_resolver(FnResolver::new("os", ["os"], |facts| facts.add("os", "linux")).into_arc());
/// assert_eq!(facts.get::<&str>("os"), Some("linux"));
/// ```
#[derive(Clone)]
pub struct FnResolver {
    name: String,
    names: Vec<String>,
    pattern: Option<Regex>,
    resolve: Arc<ResolveFn>,
}

impl FnResolver {
    /// Creates a resolver claiming the given fact names.
    pub fn new<I, S, F>(name: impl Into<String>, names: I, resolve: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut Collection) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            names: names.into_iter().map(Into::into).collect(),
            pattern: None,
            resolve: Arc::new(resolve),
        }
    }

    /// Adds a name pattern (a regular expression) to this resolver.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::InvalidPattern` if `pattern` does not compile.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, ResolutionError> {
        let re = Regex::new(pattern).map_err(|e| ResolutionError::InvalidPattern {
            resolver: self.name.clone(),
            reason: e.to_string(),
        })?;
        self.pattern = Some(re);
        Ok(self)
    }

    /// Wraps this resolver for registration.
    #[must_use]
    pub fn into_arc(self) -> Arc<dyn Resolver> {
        Arc::new(self)
    }
}

impl fmt::Debug for FnResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver")
            .field("name", &self.name)
            .field("names", &self.names)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .finish_non_exhaustive()
    }
}

impl Resolver for FnResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    fn resolve(&self, facts: &mut Collection) {
        (self.resolve)(facts);
    }
}
