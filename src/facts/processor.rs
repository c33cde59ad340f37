use std::collections::BTreeMap;

use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::collection::Collection;
use crate::resolver::Resolver;
use crate::value::Value;

use super::names;

/// Resolves the logical processor count and models.
#[derive(Debug)]
pub struct ProcessorResolver {
    names: Vec<String>,
}

impl ProcessorResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[names::PROCESSOR_COUNT, names::PROCESSORS]),
        }
    }
}

impl Default for ProcessorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for ProcessorResolver {
    fn name(&self) -> &str {
        "processor"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
        );
        let models: Vec<String> = system
            .cpus()
            .iter()
            .map(|cpu| cpu.brand().trim().to_string())
            .collect();
        if models.is_empty() {
            tracing::debug!("no processors reported");
            return;
        }

        facts.add(names::PROCESSOR_COUNT, models.len());
        facts.add(names::PROCESSORS, processors(models));
    }
}

/// `processors` map: the count plus one model string per logical processor.
fn processors(models: Vec<String>) -> Value {
    let mut map = BTreeMap::new();
    map.insert("count".to_string(), Value::from(models.len()));
    map.insert(
        "models".to_string(),
        Value::Array(
            models
                .into_iter()
                .filter(|model| !model.is_empty())
                .map(Value::String)
                .collect(),
        ),
    );
    Value::Map(map)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_processors_map() {
        let value = processors(vec!["Intel Xeon".to_string(), String::new()]);
        assert_eq!(value.get("count").and_then(Value::as_integer), Some(2));
        assert_eq!(
            value.get("models").and_then(Value::as_array).map(<[Value]>::len),
            Some(1)
        );
    }

    #[test]
    fn test_resolver_counts_processors() {
        let mut facts = Collection::new();
        facts.add_resolver(Arc::new(ProcessorResolver::new()));
        if let Some(count) = facts.get::<i64>(names::PROCESSOR_COUNT) {
            assert!(count >= 1);
            let map = facts.value(names::PROCESSORS).cloned().unwrap();
            assert_eq!(map.get("count").and_then(Value::as_integer), Some(count));
        }
    }
}
