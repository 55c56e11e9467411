//! The `backup.properties` sidecar.

use std::fmt;

use chrono::{DateTime, Utc};
use xylodb_core::time;

/// File name of the sidecar at the archive root.
pub const PROPERTIES_FILE: &str = "backup.properties";

/// Archive creation date, RFC 3339.
pub const PROP_DATE: &str = "date";
/// `yes` when the archive is an incremental backup.
pub const PROP_INCREMENTAL: &str = "incremental";
/// Name of the predecessor archive, empty for a full backup.
pub const PROP_PREVIOUS: &str = "previous";
/// Position of this archive within its incremental chain.
pub const PROP_NR_IN_SEQUENCE: &str = "nr-in-sequence";

/// Ordered key=value properties describing one archive.
#[derive(Debug, Default, Clone)]
pub struct BackupProperties {
    entries: Vec<(String, String)>,
}

impl BackupProperties {
    /// Create an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// The archive date, when present and well-formed.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.get(PROP_DATE).and_then(|v| time::parse_datetime(v).ok())
    }

    /// Parse sidecar text. Blank lines and `#` comments are ignored; lines
    /// without `=` are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                props.set(key.trim(), value.trim());
            }
        }
        props
    }
}

impl fmt::Display for BackupProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut props = BackupProperties::new();
        props.set(PROP_DATE, "2026-01-01T12:00:00.000Z");
        props.set(PROP_INCREMENTAL, "yes");
        props.set(PROP_PREVIOUS, "backup-20251231-1200");
        props.set(PROP_NR_IN_SEQUENCE, "3");

        let text = props.to_string();
        let parsed = BackupProperties::parse(&text);
        assert_eq!(parsed.get(PROP_INCREMENTAL), Some("yes"));
        assert_eq!(parsed.get(PROP_NR_IN_SEQUENCE), Some("3"));
        assert_eq!(parsed.date().unwrap().timestamp_millis(), 1_767_268_800_000);
    }

    #[test]
    fn set_replaces() {
        let mut props = BackupProperties::new();
        props.set("a", "1");
        props.set("a", "2");
        assert_eq!(props.get("a"), Some("2"));
        assert_eq!(props.to_string(), "a=2\n");
    }

    #[test]
    fn parse_ignores_noise() {
        let props = BackupProperties::parse("# header\n\nkey = value\nbroken line\n");
        assert_eq!(props.get("key"), Some("value"));
        assert!(props.get("broken line").is_none());
    }
}
