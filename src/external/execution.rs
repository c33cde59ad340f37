use std::path::Path;
use std::process::{Command, Stdio};

use super::{parse_key_value_lines, ExternalResolver};
use crate::error::ExternalFactError;
use crate::value::Value;

/// Executables that print `key=value` lines on stdout.
///
/// The program runs with no arguments and no stdin; it is always waited on.
/// A non-zero exit status fails the whole source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionResolver;

impl ExternalResolver for ExecutionResolver {
    fn name(&self) -> &'static str {
        "execution"
    }

    #[cfg(unix)]
    fn can_resolve(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
    }

    #[cfg(not(unix))]
    fn can_resolve(&self, path: &Path) -> bool {
        super::has_extension(path, &["bat", "cmd", "com", "exe"])
    }

    fn resolve(&self, path: &Path) -> Result<Vec<(String, Value)>, ExternalFactError> {
        let output = Command::new(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExternalFactError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !output.status.success() {
            return Err(ExternalFactError::Execution {
                path: path.to_path_buf(),
                status: output.status.to_string(),
                stderr: stderr.to_string(),
            });
        }
        if !stderr.is_empty() {
            tracing::warn!(path = %path.display(), stderr, "external fact executable wrote to stderr");
        }

        Ok(parse_key_value_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}
