//! String-keyed storage backends for preset values.
//!
//! The preset store talks to storage through [`Storage`] only; any backend
//! that can hold `key -> string` pairs can feed presets. Values travel as
//! the JSON rendering of a [`Value`](crate::value::Value), with plain
//! strings accepted on the way back in.

use std::collections::BTreeMap;

mod environment;
mod memory;
mod yaml;

pub use environment::EnvStorage;
pub use memory::MemoryStorage;
pub use yaml::YamlStorage;

/// A flat `key -> string` store.
///
/// Backends may carry a key prefix; all keys passed through this trait are
/// logical names, the prefix is a backend-internal concern.
pub trait Storage {
    fn set_value(&mut self, key: &str, value: &str);

    fn get_value(&self, key: &str) -> Option<String>;

    /// All entries whose logical key starts with `prefix`, in key order.
    /// An empty prefix returns everything.
    fn get_values(&self, prefix: &str) -> BTreeMap<String, String>;

    fn has_value(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    fn delete_value(&mut self, key: &str);

    /// Restore the backend's initial content. Returns false if the backend
    /// does not support resetting.
    fn reset(&mut self) -> bool;
}

fn apply_prefix(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn strip_prefix<'a>(prefix: &str, full: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        Some(full)
    } else {
        full.strip_prefix(prefix)?.strip_prefix('.')
    }
}
