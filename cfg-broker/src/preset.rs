//! Preset values: configuration supplied before parameters exist.
//!
//! Values live in a pluggable [`Storage`] backend as JSON strings. The
//! per-entry flags (originator, locked, consumed) are registry state and
//! live here, never in the backend; a read-mostly backend can still serve
//! presets while locking and consumption tracking keep working.

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::common::Originator;
use crate::error::{CfgError, Result};
use crate::storage::{MemoryStorage, Storage};
use crate::value::Value;

#[derive(Debug, Default, Clone)]
struct PresetMeta {
    originator: Originator,
    locked: bool,
    consumed: bool,
}

pub struct PresetStore {
    storage: RefCell<Box<dyn Storage>>,
    meta: RefCell<BTreeMap<String, PresetMeta>>,
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::with_storage(Box::new(MemoryStorage::new()))
    }
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage(storage: Box<dyn Storage>) -> Self {
        Self {
            storage: RefCell::new(storage),
            meta: RefCell::new(BTreeMap::new()),
        }
    }

    /// Store a preset. Fails on a locked entry with nothing mutated.
    /// A successful set re-arms the entry: its consumed flag clears.
    pub fn set(&self, name: &str, value: &Value, originator: Originator) -> Result<()> {
        if self.is_locked(name) {
            warn!("[PRESET] Refusing write to locked preset '{}'", name);
            return Err(CfgError::AlreadyLocked(name.to_string()));
        }
        self.storage.borrow_mut().set_value(name, &value.to_json());
        let mut meta = self.meta.borrow_mut();
        let entry = meta.entry(name.to_string()).or_default();
        entry.originator = originator;
        entry.consumed = false;
        Ok(())
    }

    /// Fetch a preset. Raw strings that are not valid JSON are served as
    /// plain string values, so hand-written backends can store `hello`
    /// instead of `"hello"`.
    pub fn get(&self, name: &str) -> Option<Value> {
        let raw = self.storage.borrow().get_value(name)?;
        Some(Value::from_json(&raw).unwrap_or(Value::Str(raw)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.storage.borrow().has_value(name)
    }

    /// Lock an entry for the rest of the registry's lifetime. There is no
    /// unlock.
    pub fn lock(&self, name: &str) {
        debug!("[PRESET] Locking preset '{}'", name);
        self.meta
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .locked = true;
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.meta.borrow().get(name).is_some_and(|m| m.locked)
    }

    pub fn mark_consumed(&self, name: &str) {
        self.meta
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .consumed = true;
    }

    pub fn clear_consumed(&self, name: &str) {
        if let Some(entry) = self.meta.borrow_mut().get_mut(name) {
            entry.consumed = false;
        }
    }

    pub fn is_consumed(&self, name: &str) -> bool {
        self.meta.borrow().get(name).is_some_and(|m| m.consumed)
    }

    /// The originator of the last committed set, if the entry exists.
    /// Entries preloaded by the backend report the unknown originator.
    pub fn origin(&self, name: &str) -> Option<Originator> {
        if !self.has(name) {
            return None;
        }
        Some(
            self.meta
                .borrow()
                .get(name)
                .map(|m| m.originator.clone())
                .unwrap_or_default(),
        )
    }

    /// Snapshot of every entry in key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.storage
            .borrow()
            .get_values("")
            .into_iter()
            .map(|(name, raw)| {
                let value = Value::from_json(&raw).unwrap_or(Value::Str(raw));
                (name, value)
            })
            .collect()
    }

    /// Entries never consumed by a parameter, in key order.
    pub fn unconsumed(&self) -> Vec<(String, Value)> {
        self.entries()
            .into_iter()
            .filter(|(name, _)| !self.is_consumed(name))
            .collect()
    }
}
