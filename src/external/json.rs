use std::path::Path;

use super::{has_extension, read_to_string, ExternalResolver};
use crate::error::ExternalFactError;
use crate::value::Value;

/// `*.json` files holding a top-level object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResolver;

impl ExternalResolver for JsonResolver {
    fn name(&self) -> &'static str {
        "json"
    }

    fn can_resolve(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn resolve(&self, path: &Path) -> Result<Vec<(String, Value)>, ExternalFactError> {
        let text = read_to_string(path)?;
        let parse_err = |reason: String| ExternalFactError::Parse {
            path: path.to_path_buf(),
            format: "JSON",
            reason,
        };

        let document: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| parse_err(e.to_string()))?;
        let serde_json::Value::Object(entries) = document else {
            return Err(parse_err("expected a top-level object".to_string()));
        };

        Ok(entries
            .into_iter()
            .filter_map(|(name, value)| Value::from_json(value).map(|v| (name, v)))
            .collect())
    }
}
