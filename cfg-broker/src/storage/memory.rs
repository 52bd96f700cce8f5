use std::collections::BTreeMap;

use super::{Storage, apply_prefix, strip_prefix};

/// The default backend: an in-process ordered map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    prefix: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose physical keys are `prefix.key`. Useful when several
    /// stores share one underlying namespace.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            prefix: prefix.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn set_value(&mut self, key: &str, value: &str) {
        self.entries
            .insert(apply_prefix(&self.prefix, key), value.to_string());
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.entries.get(&apply_prefix(&self.prefix, key)).cloned()
    }

    fn get_values(&self, prefix: &str) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(full, value)| {
                let logical = strip_prefix(&self.prefix, full)?;
                logical
                    .starts_with(prefix)
                    .then(|| (logical.to_string(), value.clone()))
            })
            .collect()
    }

    fn delete_value(&mut self, key: &str) {
        self.entries.remove(&apply_prefix(&self.prefix, key));
    }

    fn reset(&mut self) -> bool {
        self.entries.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let mut store = MemoryStorage::new();
        store.set_value("top.rate", "42");
        assert_eq!(store.get_value("top.rate"), Some("42".to_string()));
        assert!(store.has_value("top.rate"));
        store.delete_value("top.rate");
        assert!(!store.has_value("top.rate"));
    }

    #[test]
    fn test_prefix_is_invisible_to_callers() {
        let mut store = MemoryStorage::with_prefix("app");
        store.set_value("top.rate", "1");
        assert_eq!(store.get_value("top.rate"), Some("1".to_string()));
        let all = store.get_values("");
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("top.rate"));
    }

    #[test]
    fn test_get_values_filters_by_prefix() {
        let mut store = MemoryStorage::new();
        store.set_value("top.a", "1");
        store.set_value("top.b", "2");
        store.set_value("other.c", "3");
        let values = store.get_values("top.");
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("top.a"), Some(&"1".to_string()));
    }

    #[test]
    fn test_reset() {
        let mut store = MemoryStorage::new();
        store.set_value("x", "1");
        assert!(store.reset());
        assert!(store.is_empty());
    }
}
