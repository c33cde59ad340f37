use std::path::Path;

use super::{has_extension, parse_key_value_lines, read_to_string, ExternalResolver};
use crate::error::ExternalFactError;
use crate::value::Value;

/// `*.txt` files holding `key=value` lines. Every value is a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResolver;

impl ExternalResolver for TextResolver {
    fn name(&self) -> &'static str {
        "text"
    }

    fn can_resolve(&self, path: &Path) -> bool {
        has_extension(path, &["txt"])
    }

    fn resolve(&self, path: &Path) -> Result<Vec<(String, Value)>, ExternalFactError> {
        let text = read_to_string(path)?;
        Ok(parse_key_value_lines(&text))
    }
}
