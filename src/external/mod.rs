//! External facts.
//!
//! External facts are name/value pairs read from files in well-known
//! directories: plain `key=value` text, JSON, YAML, or executables printing
//! `key=value` lines. Each file is handled by the first [`ExternalResolver`]
//! that accepts it and is parsed completely before any of its facts are used,
//! so a malformed file contributes nothing.

mod execution;
mod json;
mod text;
mod yaml;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ExternalFactError;
use crate::value::Value;

pub use execution::ExecutionResolver;
pub use json::JsonResolver;
pub use text::TextResolver;
pub use yaml::YamlResolver;

/// Parses one kind of external fact source.
pub trait ExternalResolver: Send + Sync {
    /// Short name of the source kind, for diagnostics.
    fn name(&self) -> &'static str;

    /// Returns true if this resolver handles the file at `path`.
    fn can_resolve(&self, path: &Path) -> bool;

    /// Reads every fact defined by the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ExternalFactError` if the file cannot be read, parsed or run.
    fn resolve(&self, path: &Path) -> Result<Vec<(String, Value)>, ExternalFactError>;
}

/// The built-in external resolvers, in the order they are tried.
#[must_use]
pub fn default_resolvers() -> Vec<Box<dyn ExternalResolver>> {
    vec![
        Box::new(TextResolver),
        Box::new(JsonResolver),
        Box::new(YamlResolver),
        Box::new(ExecutionResolver),
    ]
}

/// Platform default external fact directories.
#[cfg(unix)]
#[must_use]
pub fn default_directories() -> Vec<PathBuf> {
    // SAFETY: geteuid has no preconditions and always succeeds.
    let euid = unsafe { libc::geteuid() };
    if euid == 0 {
        return vec![
            PathBuf::from("/etc/facter/facts.d"),
            PathBuf::from("/etc/puppetlabs/facter/facts.d"),
        ];
    }
    std::env::var_os("HOME")
        .map(|home| vec![PathBuf::from(home).join(".facter").join("facts.d")])
        .unwrap_or_default()
}

/// Platform default external fact directories.
#[cfg(windows)]
#[must_use]
pub fn default_directories() -> Vec<PathBuf> {
    std::env::var_os("ProgramData")
        .map(|data| {
            vec![PathBuf::from(data)
                .join("PuppetLabs")
                .join("facter")
                .join("facts.d")]
        })
        .unwrap_or_default()
}

/// Platform default external fact directories.
#[cfg(not(any(unix, windows)))]
#[must_use]
pub fn default_directories() -> Vec<PathBuf> {
    Vec::new()
}

/// Facts gathered from a directory scan along with the sources that failed.
#[derive(Debug, Default)]
pub(crate) struct Loaded {
    pub facts: Vec<(String, Value)>,
    pub failures: Vec<ExternalFactError>,
}

/// Scans `directories` in order, files within a directory by name.
pub(crate) fn load_directories(
    resolvers: &[Box<dyn ExternalResolver>],
    directories: &[PathBuf],
    lowercase: bool,
) -> Loaded {
    let mut loaded = Loaded::default();

    for dir in directories {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %dir.display(), "external fact directory does not exist");
                continue;
            }
            Err(source) => {
                tracing::warn!(path = %dir.display(), error = %source, "cannot read external fact directory");
                loaded.failures.push(ExternalFactError::Io {
                    path: dir.clone(),
                    source,
                });
                continue;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let Some(resolver) = resolvers.iter().find(|r| r.can_resolve(&path)) else {
                tracing::debug!(path = %path.display(), "no external resolver for file");
                continue;
            };

            tracing::debug!(path = %path.display(), kind = resolver.name(), "loading external facts");
            match resolver.resolve(&path).and_then(|facts| normalize(&path, facts, lowercase)) {
                Ok(facts) => loaded.facts.extend(facts),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load external facts");
                    loaded.failures.push(e);
                }
            }
        }
    }

    loaded
}

fn normalize(
    path: &Path,
    facts: Vec<(String, Value)>,
    lowercase: bool,
) -> Result<Vec<(String, Value)>, ExternalFactError> {
    facts
        .into_iter()
        .map(|(name, value)| {
            let name = name.trim();
            if name.is_empty() {
                return Err(ExternalFactError::InvalidName {
                    path: path.to_path_buf(),
                    name: name.to_string(),
                });
            }
            let name = if lowercase {
                name.to_lowercase()
            } else {
                name.to_string()
            };
            Ok((name, value))
        })
        .collect()
}

/// Parses `key=value` lines. Blank lines and lines without `=` are ignored.
pub(crate) fn parse_key_value_lines(text: &str) -> Vec<(String, Value)> {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), Value::from(value.trim())))
        })
        .collect()
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, ExternalFactError> {
    std::fs::read_to_string(path).map_err(|source| ExternalFactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_parse_key_value_lines() {
        let facts = parse_key_value_lines("role = web\n\n# comment\nzone=eu=west\n  \n");
        assert_eq!(
            facts,
            vec![
                ("role".to_string(), Value::from("web")),
                ("zone".to_string(), Value::from("eu=west")),
            ]
        );
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("/a/b.JSON"), &["json"]));
        assert!(!has_extension(Path::new("/a/b"), &["json"]));
        assert!(!has_extension(Path::new("/a/b.txt"), &["yaml", "yml"]));
    }

    #[test]
    fn test_load_skips_missing_directory() {
        let loaded = load_directories(
            &default_resolvers(),
            &[PathBuf::from("/definitely/not/a/facts/dir")],
            true,
        );
        assert!(loaded.facts.is_empty());
        assert!(loaded.failures.is_empty());
    }

    #[test]
    fn test_load_orders_files_and_lowercases() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "Zone=eu\n").unwrap();
        fs::write(dir.path().join("a.txt"), "Role=web\n").unwrap();
        fs::write(dir.path().join("ignored.dat"), "x=y\n").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let loaded = load_directories(&default_resolvers(), &[dir.path().to_path_buf()], true);
        assert!(loaded.failures.is_empty());
        assert_eq!(
            loaded.facts,
            vec![
                ("role".to_string(), Value::from("web")),
                ("zone".to_string(), Value::from("eu")),
            ]
        );
    }

    #[test]
    fn test_load_keeps_case_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Role=web\n").unwrap();
        let loaded = load_directories(&default_resolvers(), &[dir.path().to_path_buf()], false);
        assert_eq!(loaded.facts[0].0, "Role");
    }

    #[test]
    fn test_malformed_file_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{\"a\": 1,").unwrap();
        fs::write(dir.path().join("empty_name.txt"), "ok=1\n =2\n").unwrap();
        fs::write(dir.path().join("good.txt"), "good=yes\n").unwrap();

        let loaded = load_directories(&default_resolvers(), &[dir.path().to_path_buf()], true);
        assert_eq!(loaded.facts, vec![("good".to_string(), Value::from("yes"))]);
        assert_eq!(loaded.failures.len(), 2);
        assert!(matches!(loaded.failures[0], ExternalFactError::Parse { .. }));
        assert!(matches!(loaded.failures[1], ExternalFactError::InvalidName { .. }));
    }
}
