use std::path::Path;

use super::{has_extension, read_to_string, ExternalResolver};
use crate::error::ExternalFactError;
use crate::value::Value;

/// `*.yaml`/`*.yml` files holding a top-level mapping with string keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlResolver;

impl ExternalResolver for YamlResolver {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn can_resolve(&self, path: &Path) -> bool {
        has_extension(path, &["yaml", "yml"])
    }

    fn resolve(&self, path: &Path) -> Result<Vec<(String, Value)>, ExternalFactError> {
        let text = read_to_string(path)?;
        let parse_err = |reason: String| ExternalFactError::Parse {
            path: path.to_path_buf(),
            format: "YAML",
            reason,
        };

        // An empty document defines no facts.
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Decoded into the JSON data model; non-string keys are rejected.
        let document: serde_json::Value =
            serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string()))?;
        let serde_json::Value::Object(entries) = document else {
            return Err(parse_err("expected a top-level mapping".to_string()));
        };

        Ok(entries
            .into_iter()
            .filter_map(|(name, value)| Value::from_json(value).map(|v| (name, v)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.yml");
        std::fs::write(&path, "tier: gold\nports:\n  - 80\n  - 443\nmaintenance: false\n").unwrap();

        let resolver = YamlResolver;
        assert!(resolver.can_resolve(&path));
        let facts = resolver.resolve(&path).unwrap();
        assert!(facts.contains(&("tier".to_string(), Value::from("gold"))));
        assert!(facts.contains(&("ports".to_string(), Value::from(vec![80, 443]))));
        assert!(facts.contains(&("maintenance".to_string(), Value::Boolean(false))));
    }

    #[test]
    fn test_yaml_resolver_empty_and_scalar_documents() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "\n").unwrap();
        assert!(YamlResolver.resolve(&empty).unwrap().is_empty());

        let scalar = dir.path().join("scalar.yaml");
        std::fs::write(&scalar, "just a string\n").unwrap();
        let err = YamlResolver.resolve(&scalar).unwrap_err();
        assert!(matches!(err, ExternalFactError::Parse { format: "YAML", .. }));
    }
}
