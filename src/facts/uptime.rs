use std::collections::BTreeMap;

use sysinfo::System;

use crate::collection::Collection;
use crate::resolver::Resolver;
use crate::value::Value;

use super::names;

/// Resolves how long the system has been running.
#[derive(Debug)]
pub struct UptimeResolver {
    names: Vec<String>,
}

impl UptimeResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: super::owned(&[
                names::UPTIME_SECONDS,
                names::UPTIME_HOURS,
                names::UPTIME_DAYS,
                names::UPTIME,
                names::SYSTEM_UPTIME,
            ]),
        }
    }
}

impl Default for UptimeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for UptimeResolver {
    fn name(&self) -> &str {
        "uptime"
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn resolve(&self, facts: &mut Collection) {
        let seconds = System::uptime();
        if seconds == 0 {
            tracing::debug!("uptime is unavailable");
            return;
        }
        let hours = seconds / 3600;
        let days = seconds / 86_400;
        let text = uptime_text(seconds);

        let mut map = BTreeMap::new();
        map.insert("seconds".to_string(), Value::from(seconds));
        map.insert("hours".to_string(), Value::from(hours));
        map.insert("days".to_string(), Value::from(days));
        map.insert("uptime".to_string(), Value::from(text.as_str()));

        facts.add(names::UPTIME_SECONDS, seconds);
        facts.add(names::UPTIME_HOURS, hours);
        facts.add(names::UPTIME_DAYS, days);
        facts.add(names::UPTIME, text);
        facts.add(names::SYSTEM_UPTIME, map);
    }
}

/// `3 days`, `1 day`, `4:05 hours` or `12 minutes`.
fn uptime_text(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds / 3600;
    let minutes = (seconds / 60) % 60;
    match (days, hours) {
        (0, 0) => format!("{minutes} minutes"),
        (0, h) => format!("{h}:{minutes:02} hours"),
        (1, _) => "1 day".to_string(),
        (d, _) => format!("{d} days"),
    }
}
