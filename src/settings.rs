use crate::env::{env_or, CHROME_LOGGER_BACKTRACE_LEVEL_ENV};
use crate::DIAGNOSTICS_TARGET;
use serde_json::Value;
use std::collections::BTreeMap;

/// Key holding the stack depth used for source attribution.
pub const BACKTRACE_LEVEL: &str = "backtrace_level";

/// Depth that attributes a row to the direct caller of the verb.
pub const DEFAULT_BACKTRACE_LEVEL: usize = 1;

/// Free-form logger settings.
///
/// Only [`BACKTRACE_LEVEL`] is interpreted by this crate; other keys are
/// kept for callers layering their own behavior on top.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert(BACKTRACE_LEVEL.to_string(), Value::from(DEFAULT_BACKTRACE_LEVEL));
        Self { values }
    }
}

impl Settings {
    /// Defaults, with the backtrace level overridden by
    /// `CHROME_LOGGER_BACKTRACE_LEVEL` when it holds a number.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        let raw = env_or(CHROME_LOGGER_BACKTRACE_LEVEL_ENV, "");
        match raw.trim().parse::<u64>() {
            Ok(level) => settings.add_setting(BACKTRACE_LEVEL, level),
            Err(_) if raw.is_empty() => {}
            Err(_) => tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                value = %raw,
                "ignoring non-numeric {}", CHROME_LOGGER_BACKTRACE_LEVEL_ENV
            ),
        }
        settings
    }

    pub fn add_setting(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn add_settings<I, K, V>(&mut self, settings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in settings {
            self.add_setting(key, value);
        }
    }

    pub fn get_setting(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Configured stack depth; falls back to the default when the stored
    /// value is not a non-negative integer.
    pub fn backtrace_level(&self) -> usize {
        self.get_setting(BACKTRACE_LEVEL)
            .and_then(Value::as_u64)
            .and_then(|level| usize::try_from(level).ok())
            .unwrap_or(DEFAULT_BACKTRACE_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_depth_one() {
        let settings = Settings::default();
        assert_eq!(settings.backtrace_level(), 1);
        assert_eq!(settings.get_setting(BACKTRACE_LEVEL), Some(&json!(1)));
        assert_eq!(settings.get_setting("missing"), None);
    }

    #[test]
    fn setters_overwrite_and_extend() {
        let mut settings = Settings::default();
        settings.add_setting(BACKTRACE_LEVEL, 2);
        settings.add_settings([("theme", json!("dark")), ("verbose", json!(true))]);

        assert_eq!(settings.backtrace_level(), 2);
        assert_eq!(settings.get_setting("theme"), Some(&json!("dark")));
        assert_eq!(settings.get_setting("verbose"), Some(&json!(true)));
    }

    #[test]
    fn invalid_depth_falls_back() {
        let mut settings = Settings::default();
        settings.add_setting(BACKTRACE_LEVEL, "deep");
        assert_eq!(settings.backtrace_level(), DEFAULT_BACKTRACE_LEVEL);
        settings.add_setting(BACKTRACE_LEVEL, -3);
        assert_eq!(settings.backtrace_level(), DEFAULT_BACKTRACE_LEVEL);
    }
}
