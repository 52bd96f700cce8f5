//! The configuration registry.
//!
//! A [`Broker`] owns the name index, the preset store and the lifecycle
//! callback lists. It holds parameters weakly; ownership stays with the
//! [`Param`](crate::param::Param) handles, and a dropped parameter
//! disappears from the index on its own.
//!
//! Brokers are explicit values passed to whoever needs one. For code that
//! cannot thread a broker through, a per-thread default slot exists; it is
//! a convenience, not a hidden dependency of the core.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::callback::{CallbackId, CallbackList};
use crate::codec::ValueCodec;
use crate::common::Originator;
use crate::error::{CfgError, Result};
use crate::name;
use crate::param::{AnyParam, ParamBuilder};
use crate::preset::PresetStore;
use crate::storage::Storage;
use crate::value::Value;
use crate::Builder;

/// Payload for parameter create and destroy callbacks.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub name: String,
    pub originator: Originator,
}

type IgnorePredicate = Box<dyn Fn(&str, &Value) -> bool>;

pub struct BrokerCore {
    name: String,
    params: RefCell<BTreeMap<String, Weak<dyn AnyParam>>>,
    presets: PresetStore,
    create_cbs: CallbackList<LifecycleEvent, ()>,
    destroy_cbs: CallbackList<LifecycleEvent, ()>,
    ignore_predicates: RefCell<Vec<IgnorePredicate>>,
}

impl BrokerCore {
    /// Remove a name from the index and fire destroy callbacks if it was
    /// live. Idempotent; called from `Param::drop`.
    pub(crate) fn unregister_param(&self, name: &str, originator: Originator) {
        let removed = self.params.borrow_mut().remove(name).is_some();
        if !removed {
            return;
        }
        debug!("[BROKER] Unregistered parameter '{}'", name);
        // The preset that seeded this parameter becomes claimable again.
        self.presets.clear_consumed(name);
        self.destroy_cbs.dispatch(&LifecycleEvent {
            name: name.to_string(),
            originator,
        });
    }

    fn prune_dead(&self) {
        self.params
            .borrow_mut()
            .retain(|_, weak| weak.upgrade().is_some_and(|p| !p.is_destroyed()));
    }
}

/// Cloneable handle to a registry. All clones share state.
#[derive(Clone)]
pub struct Broker {
    core: Rc<BrokerCore>,
}

thread_local! {
    static DEFAULT_BROKER: RefCell<Option<Broker>> = const { RefCell::new(None) };
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        Self::builder().build_unchecked()
    }

    pub fn builder() -> BrokerBuilder {
        BrokerBuilder::default()
    }

    /// Make this broker the thread's default registration target for
    /// parameters built without an explicit broker.
    pub fn install_default(broker: &Broker) {
        DEFAULT_BROKER.with(|slot| *slot.borrow_mut() = Some(broker.clone()));
    }

    pub fn default_broker() -> Option<Broker> {
        DEFAULT_BROKER.with(|slot| slot.borrow().clone())
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub(crate) fn core_weak(&self) -> Weak<BrokerCore> {
        Rc::downgrade(&self.core)
    }

    /// Start building a parameter registered against this broker.
    pub fn create_param<T>(&self, name: impl Into<String>, default: T) -> ParamBuilder<T> {
        ParamBuilder::with_target(self.clone(), name.into(), default)
    }

    /// Reserve a registration name. A collision resolves to a uniquified
    /// variant with a warning, never a failure.
    pub(crate) fn resolve_name(&self, requested: &str) -> String {
        self.core.prune_dead();
        let params = self.core.params.borrow();
        name::uniquify(requested, |candidate| params.contains_key(candidate))
    }

    pub(crate) fn register_param(&self, param: &Rc<dyn AnyParam>, originator: Originator) {
        let name = param.name().to_string();
        {
            let mut params = self.core.params.borrow_mut();
            if params
                .get(&name)
                .and_then(Weak::upgrade)
                .is_some_and(|p| !p.is_destroyed())
            {
                warn!(
                    "[BROKER] Parameter '{}' is already registered, keeping the existing entry",
                    name
                );
                return;
            }
            params.insert(name.clone(), Rc::downgrade(param));
        }
        debug!("[BROKER] Registered parameter '{}' by '{}'", name, originator);
        self.core
            .create_cbs
            .dispatch(&LifecycleEvent { name, originator });
    }

    pub(crate) fn consume_preset(&self, name: &str) {
        self.core.presets.mark_consumed(name);
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.get_param(name).is_some()
    }

    /// Look up a live parameter. Dead index entries are pruned on the way.
    pub fn get_param(&self, name: &str) -> Option<Rc<dyn AnyParam>> {
        let found = self
            .core
            .params
            .borrow()
            .get(name)
            .and_then(Weak::upgrade)
            .filter(|p| !p.is_destroyed());
        if found.is_none() {
            self.core.params.borrow_mut().remove(name);
        }
        found
    }

    /// Snapshot of every live parameter, in name order.
    pub fn params(&self) -> Vec<Rc<dyn AnyParam>> {
        self.core.prune_dead();
        self.core
            .params
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Read a parameter's value as `T` through the full pipeline.
    pub fn get_value<T: ValueCodec>(&self, name: &str) -> Result<T> {
        let param = self.get_param(name).ok_or_else(|| {
            warn!("[BROKER] No parameter named '{}'", name);
            CfgError::NotFound(name.to_string())
        })?;
        T::unpack(&param.get_raw_value())
    }

    /// Write a parameter's value through the full pipeline.
    pub fn set_value<T: ValueCodec>(
        &self,
        name: &str,
        value: T,
        originator: Originator,
    ) -> Result<()> {
        let param = self.get_param(name).ok_or_else(|| {
            warn!("[BROKER] No parameter named '{}'", name);
            CfgError::NotFound(name.to_string())
        })?;
        param.set_raw_value(&value.pack(), originator, None)
    }

    pub fn set_preset_value(
        &self,
        name: &str,
        value: Value,
        originator: Originator,
    ) -> Result<()> {
        self.core.presets.set(name, &value, originator)
    }

    pub fn get_preset_value(&self, name: &str) -> Option<Value> {
        self.core.presets.get(name)
    }

    pub fn has_preset_value(&self, name: &str) -> bool {
        self.core.presets.has(name)
    }

    pub fn preset_value_origin(&self, name: &str) -> Option<Originator> {
        self.core.presets.origin(name)
    }

    /// Freeze a preset for the rest of the broker's lifetime.
    pub fn lock_preset_value(&self, name: &str) {
        self.core.presets.lock(name);
    }

    /// Presets no parameter has consumed, minus entries an ignore
    /// predicate claims. The report of leftover configuration.
    pub fn unconsumed_preset_values(&self) -> Vec<(String, Value)> {
        let predicates = self.core.ignore_predicates.borrow();
        self.core
            .presets
            .unconsumed()
            .into_iter()
            .filter(|(name, value)| !predicates.iter().any(|pred| pred(name, value)))
            .collect()
    }

    /// Exclude matching presets from the unconsumed report. Entries stay
    /// unconsumed; only the report is filtered.
    pub fn ignore_unconsumed_presets(&self, pred: impl Fn(&str, &Value) -> bool + 'static) {
        self.core.ignore_predicates.borrow_mut().push(Box::new(pred));
    }

    pub fn on_param_create(&self, cb: impl Fn(&LifecycleEvent) + 'static) -> CallbackId {
        self.core.create_cbs.register(cb)
    }

    pub fn on_param_destroy(&self, cb: impl Fn(&LifecycleEvent) + 'static) -> CallbackId {
        self.core.destroy_cbs.register(cb)
    }

    pub fn unregister_create_callback(&self, id: CallbackId) -> bool {
        self.core.create_cbs.unregister(id)
    }

    pub fn unregister_destroy_callback(&self, id: CallbackId) -> bool {
        self.core.destroy_cbs.unregister(id)
    }

    pub fn unregister_all_callbacks(&self) -> bool {
        let mut any = false;
        any |= self.core.create_cbs.unregister_all();
        any |= self.core.destroy_cbs.unregister_all();
        any
    }

    pub fn has_callbacks(&self) -> bool {
        !self.core.create_cbs.is_empty() || !self.core.destroy_cbs.is_empty()
    }
}

/// Configures a broker: its name and the storage backend feeding presets.
#[derive(Default)]
pub struct BrokerBuilder {
    name: Option<String>,
    storage: Option<Box<dyn Storage>>,
}

impl BrokerBuilder {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    fn build_unchecked(self) -> Broker {
        let presets = match self.storage {
            Some(storage) => PresetStore::with_storage(storage),
            None => PresetStore::new(),
        };
        Broker {
            core: Rc::new(BrokerCore {
                name: self.name.unwrap_or_else(|| "broker".to_string()),
                params: RefCell::new(BTreeMap::new()),
                presets,
                create_cbs: CallbackList::new(),
                destroy_cbs: CallbackList::new(),
                ignore_predicates: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl Builder for BrokerBuilder {
    type Output = Broker;

    fn build(self) -> Result<Broker> {
        Ok(self.build_unchecked())
    }
}
