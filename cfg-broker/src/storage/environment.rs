use std::collections::BTreeMap;

use super::{Storage, apply_prefix, strip_prefix};

/// Backend over the process environment.
///
/// The environment is snapshotted at construction; reads are served from
/// the snapshot so later external mutation does not change observed
/// presets mid-run. Writes update both the snapshot and the live
/// environment.
#[derive(Debug)]
pub struct EnvStorage {
    entries: BTreeMap<String, String>,
    prefix: String,
}

impl EnvStorage {
    /// Snapshot every variable whose name starts with `prefix.`, keyed by
    /// the remainder of the name. An empty prefix snapshots everything.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let entries = std::env::vars()
            .filter_map(|(name, value)| {
                strip_prefix(&prefix, &name).map(|logical| (logical.to_string(), value))
            })
            .collect();
        Self { entries, prefix }
    }
}

impl Storage for EnvStorage {
    fn set_value(&mut self, key: &str, value: &str) {
        // Callers hold the single-threaded contract, which is what makes
        // mutating the environment sound here.
        unsafe {
            std::env::set_var(apply_prefix(&self.prefix, key), value);
        }
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn get_values(&self, prefix: &str) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn delete_value(&mut self, key: &str) {
        unsafe {
            std::env::remove_var(apply_prefix(&self.prefix, key));
        }
        self.entries.remove(key);
    }

    fn reset(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_environment() {
        let mut store = EnvStorage::new("CFG_TEST_RT");
        store.set_value("top.rate", "42");
        assert_eq!(store.get_value("top.rate"), Some("42".to_string()));
        assert_eq!(
            std::env::var("CFG_TEST_RT.top.rate").as_deref(),
            Ok("42")
        );

        // A fresh snapshot picks the variable up.
        let reread = EnvStorage::new("CFG_TEST_RT");
        assert_eq!(reread.get_value("top.rate"), Some("42".to_string()));

        store.delete_value("top.rate");
        assert!(std::env::var("CFG_TEST_RT.top.rate").is_err());
    }

    #[test]
    fn test_reset_unsupported() {
        let mut store = EnvStorage::new("CFG_TEST_RESET");
        assert!(!store.reset());
    }
}
