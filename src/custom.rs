//! Custom fact sources.
//!
//! Custom facts come from user-supplied scripts. The loading mechanism (an
//! embedded interpreter, a plugin host) lives outside this crate; it plugs in
//! through [`CustomFactSource`] and is consulted only after every registered
//! resolver has run.

use std::path::PathBuf;

use crate::collection::Collection;
use crate::error::CustomFactError;
use crate::value::Value;

/// Produces custom facts from script directories.
pub trait CustomFactSource: Send + Sync {
    /// Loads the facts defined under `directories`.
    ///
    /// `facts` is fully resolved, so scripts can read any built-in fact with
    /// [`Collection::peek`] or [`Collection::iter`].
    ///
    /// # Errors
    ///
    /// Returns `CustomFactError` if a directory cannot be loaded.
    fn load(
        &self,
        directories: &[PathBuf],
        facts: &Collection,
    ) -> Result<Vec<(String, Value)>, CustomFactError>;
}
