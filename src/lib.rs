//! # facter - System fact collection
//!
//! A fact is a named, typed value describing the host: its kernel, operating
//! system, memory, network interfaces and so on. Facts are produced by
//! resolvers, which are registered with a [`Collection`] and run lazily the
//! first time one of their facts is requested.
//!
//! ## Core Concepts
//!
//! - **Value**: A dynamically typed fact value (boolean, integer, double,
//!   string, array or map)
//! - **Resolver**: A producer of one or more facts, claimed by exact name or by
//!   a name pattern
//! - **Collection**: The fact store; drives on-demand, memoized resolution and
//!   merges external, custom and environment facts
//!
//! ## Usage
//!
//! ```rust
//! use facter::{Collection, Format, FnResolver};
//!
//! let mut facts = Collection::new();
//! facts.add_resolver(
//!     FnResolver::new("role", ["role"], |facts| facts.add("role", "web")).into_arc(),
//! );
//! facts.add("datacenter", "eu-west");
//!
//! assert_eq!(facts.get::<&str>("role"), Some("web"));
//!
//! let mut out = Vec::new();
//! facts.write(&mut out, Format::Hash)?;
//! assert_eq!(String::from_utf8(out).unwrap(), "datacenter => eu-west\nrole => web\n");
//! # Ok::<(), facter::FactError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod value;

// Resolution
pub mod collection;
pub mod registry;
pub mod resolver;

// Fact sources
pub mod custom;
pub mod external;
pub mod facts;

// Configuration and output
pub mod config;
pub mod output;

// Re-export primary types at crate root for convenience
pub use collection::Collection;
pub use config::CollectionConfig;
pub use custom::CustomFactSource;
pub use error::{
    ConfigError, CustomFactError, ExternalFactError, FactError, FactResult, OutputError,
    ResolutionError,
};
pub use external::ExternalResolver;
pub use output::Format;
pub use registry::{ResolverId, ResolverRegistry};
pub use resolver::{FnResolver, Resolver};
pub use value::{FromValue, Value, ValueKind};
