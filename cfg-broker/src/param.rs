//! Typed configuration parameters.
//!
//! A [`Param<T>`] is the owning handle to one registered parameter. It is
//! deliberately not `Clone`: dropping it is the destruction event, which
//! unregisters the name, fires destroy callbacks and invalidates every
//! type-erased handle still pointing at the parameter.
//!
//! All access, typed or type-erased, funnels through one pipeline in
//! [`ParamCore`]. The erased [`AnyParam`] surface wraps raw callbacks into
//! the same typed lists, so a veto registered through an inspection handle
//! gates native writes too.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::broker::{Broker, BrokerCore};
use crate::callback::{CallbackId, CallbackList, ReadEvent, WriteEvent};
use crate::codec::ValueCodec;
use crate::common::{LockKey, Originator};
use crate::error::{CfgError, Result};
use crate::value::Value;
use crate::{Builder, name};

/// Shared state behind one parameter. Holds the value, the four callback
/// lists and the lock.
pub struct ParamCore<T> {
    name: String,
    description: RefCell<String>,
    value: RefCell<T>,
    default: T,
    origin: RefCell<Originator>,
    lock: RefCell<Option<LockKey>>,
    identity_key: LockKey,
    metadata: RefCell<IndexMap<String, Value>>,
    destroyed: Cell<bool>,
    broker: Weak<BrokerCore>,

    pre_read: CallbackList<ReadEvent<T>, ()>,
    post_read: CallbackList<ReadEvent<T>, ()>,
    pre_write: CallbackList<WriteEvent<T>, bool>,
    post_write: CallbackList<WriteEvent<T>, ()>,
}

impl<T: ValueCodec + Clone + PartialEq + 'static> ParamCore<T> {
    fn read(&self) -> T {
        let before = self.value.borrow().clone();
        self.pre_read.dispatch(&ReadEvent {
            value: before,
            name: self.name.clone(),
        });
        // Pre-read observers may have written; the returned snapshot and
        // the post-read event both see the settled value.
        let snapshot = self.value.borrow().clone();
        self.post_read.dispatch(&ReadEvent {
            value: snapshot.clone(),
            name: self.name.clone(),
        });
        snapshot
    }

    fn write(&self, new: T, originator: Originator, key: Option<&LockKey>) -> Result<()> {
        if let Some(lock) = self.lock.borrow().as_ref() {
            if key != Some(lock) {
                warn!("[PARAM] Rejecting write to locked parameter '{}'", self.name);
                return Err(CfgError::AlreadyLocked(self.name.clone()));
            }
        }
        let event = WriteEvent {
            old_value: self.value.borrow().clone(),
            new_value: new,
            name: self.name.clone(),
            originator,
        };
        if !self.pre_write.dispatch_vetoable(&event) {
            debug!(
                "[PARAM] Write to '{}' by '{}' vetoed by pre-write callback",
                self.name, event.originator
            );
            return Err(CfgError::RejectedWrite(self.name.clone()));
        }
        *self.value.borrow_mut() = event.new_value.clone();
        *self.origin.borrow_mut() = event.originator.clone();
        // Post-write observers only ever see committed changes.
        self.post_write.dispatch(&event);
        Ok(())
    }

    fn key_or_identity<'a>(&'a self, key: Option<&'a LockKey>) -> &'a LockKey {
        key.unwrap_or(&self.identity_key)
    }
}

/// Object-safe view of a parameter, independent of its native type.
///
/// Values cross this boundary as structured [`Value`]s; callbacks
/// registered here join the parameter's own lists, in the shared id space
/// and dispatch order.
pub trait AnyParam {
    fn name(&self) -> &str;
    fn description(&self) -> String;
    fn set_description(&self, description: &str);

    /// Read through the full pipeline (pre-read, snapshot, post-read).
    fn get_raw_value(&self) -> Value;
    /// Write through the full pipeline. Fails with `AlreadyLocked`,
    /// `RejectedWrite` or a conversion error; state is untouched on
    /// failure.
    fn set_raw_value(&self, value: &Value, originator: Originator, key: Option<&LockKey>)
    -> Result<()>;
    fn raw_default_value(&self) -> Value;
    fn is_default_value(&self) -> bool;
    /// Assign the default directly. No callbacks run, the lock is
    /// bypassed, the value origin resets.
    fn reset(&self);
    fn value_origin(&self) -> Originator;

    fn lock(&self, key: Option<&LockKey>) -> bool;
    fn unlock(&self, key: Option<&LockKey>) -> bool;
    fn is_locked(&self) -> bool;

    fn metadata(&self) -> Value;
    fn add_metadata(&self, name: &str, value: Value, description: &str);

    /// True once the owning [`Param`] has been dropped. Outstanding
    /// strong references must treat the parameter as gone.
    fn is_destroyed(&self) -> bool;

    fn on_raw_pre_read(&self, cb: Rc<dyn Fn(&ReadEvent<Value>)>) -> CallbackId;
    fn on_raw_post_read(&self, cb: Rc<dyn Fn(&ReadEvent<Value>)>) -> CallbackId;
    fn on_raw_pre_write(&self, cb: Rc<dyn Fn(&WriteEvent<Value>) -> bool>) -> CallbackId;
    fn on_raw_post_write(&self, cb: Rc<dyn Fn(&WriteEvent<Value>)>) -> CallbackId;
    fn unregister_pre_read(&self, id: CallbackId) -> bool;
    fn unregister_post_read(&self, id: CallbackId) -> bool;
    fn unregister_pre_write(&self, id: CallbackId) -> bool;
    fn unregister_post_write(&self, id: CallbackId) -> bool;
    fn unregister_all_callbacks(&self) -> bool;
    fn has_callbacks(&self) -> bool;
}

impl<T: ValueCodec + Clone + PartialEq + 'static> AnyParam for ParamCore<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        self.description.borrow().clone()
    }

    fn set_description(&self, description: &str) {
        *self.description.borrow_mut() = description.to_string();
    }

    fn get_raw_value(&self) -> Value {
        self.read().pack()
    }

    fn set_raw_value(
        &self,
        value: &Value,
        originator: Originator,
        key: Option<&LockKey>,
    ) -> Result<()> {
        let typed = T::unpack(value)?;
        self.write(typed, originator, key)
    }

    fn raw_default_value(&self) -> Value {
        self.default.pack()
    }

    fn is_default_value(&self) -> bool {
        *self.value.borrow() == self.default
    }

    fn reset(&self) {
        *self.value.borrow_mut() = self.default.clone();
        *self.origin.borrow_mut() = Originator::unknown();
    }

    fn value_origin(&self) -> Originator {
        self.origin.borrow().clone()
    }

    fn lock(&self, key: Option<&LockKey>) -> bool {
        let mut lock = self.lock.borrow_mut();
        let key = self.key_or_identity(key);
        match lock.as_ref() {
            Some(held) if held != key => false,
            _ => {
                *lock = Some(key.clone());
                true
            }
        }
    }

    fn unlock(&self, key: Option<&LockKey>) -> bool {
        let mut lock = self.lock.borrow_mut();
        if lock.as_ref() == Some(self.key_or_identity(key)) {
            *lock = None;
            true
        } else {
            false
        }
    }

    fn is_locked(&self) -> bool {
        self.lock.borrow().is_some()
    }

    fn metadata(&self) -> Value {
        Value::Map(self.metadata.borrow().clone())
    }

    fn add_metadata(&self, name: &str, value: Value, description: &str) {
        let mut entry = IndexMap::new();
        entry.insert("value".to_string(), value);
        entry.insert("description".to_string(), Value::Str(description.to_string()));
        self.metadata
            .borrow_mut()
            .insert(name.to_string(), Value::Map(entry));
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn on_raw_pre_read(&self, cb: Rc<dyn Fn(&ReadEvent<Value>)>) -> CallbackId {
        self.pre_read.register(move |e: &ReadEvent<T>| {
            cb(&ReadEvent {
                value: e.value.pack(),
                name: e.name.clone(),
            })
        })
    }

    fn on_raw_post_read(&self, cb: Rc<dyn Fn(&ReadEvent<Value>)>) -> CallbackId {
        self.post_read.register(move |e: &ReadEvent<T>| {
            cb(&ReadEvent {
                value: e.value.pack(),
                name: e.name.clone(),
            })
        })
    }

    fn on_raw_pre_write(&self, cb: Rc<dyn Fn(&WriteEvent<Value>) -> bool>) -> CallbackId {
        self.pre_write.register(move |e: &WriteEvent<T>| {
            cb(&WriteEvent {
                old_value: e.old_value.pack(),
                new_value: e.new_value.pack(),
                name: e.name.clone(),
                originator: e.originator.clone(),
            })
        })
    }

    fn on_raw_post_write(&self, cb: Rc<dyn Fn(&WriteEvent<Value>)>) -> CallbackId {
        self.post_write.register(move |e: &WriteEvent<T>| {
            cb(&WriteEvent {
                old_value: e.old_value.pack(),
                new_value: e.new_value.pack(),
                name: e.name.clone(),
                originator: e.originator.clone(),
            })
        })
    }

    fn unregister_pre_read(&self, id: CallbackId) -> bool {
        self.pre_read.unregister(id)
    }

    fn unregister_post_read(&self, id: CallbackId) -> bool {
        self.post_read.unregister(id)
    }

    fn unregister_pre_write(&self, id: CallbackId) -> bool {
        self.pre_write.unregister(id)
    }

    fn unregister_post_write(&self, id: CallbackId) -> bool {
        self.post_write.unregister(id)
    }

    fn unregister_all_callbacks(&self) -> bool {
        let mut any = false;
        any |= self.pre_read.unregister_all();
        any |= self.post_read.unregister_all();
        any |= self.pre_write.unregister_all();
        any |= self.post_write.unregister_all();
        any
    }

    fn has_callbacks(&self) -> bool {
        !self.pre_read.is_empty()
            || !self.post_read.is_empty()
            || !self.pre_write.is_empty()
            || !self.post_write.is_empty()
    }
}

/// Owning handle to a registered parameter.
pub struct Param<T: ValueCodec + Clone + PartialEq + 'static> {
    core: Rc<ParamCore<T>>,
}

impl<T: ValueCodec + Clone + PartialEq + 'static> Param<T> {
    /// Start a builder that registers against the thread's default broker.
    pub fn builder(name: impl Into<String>, default: T) -> ParamBuilder<T> {
        ParamBuilder {
            broker: None,
            name: name.into(),
            default,
            description: String::new(),
            originator: None,
        }
    }

    /// The registered name. May differ from the requested one when a
    /// collision forced a uniquified variant.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn description(&self) -> String {
        AnyParam::description(&*self.core)
    }

    pub fn set_description(&self, description: &str) {
        AnyParam::set_description(&*self.core, description);
    }

    /// Read the value through the full callback pipeline.
    pub fn get_value(&self) -> T {
        self.core.read()
    }

    /// Write with an anonymous originator. Returns whether the write
    /// committed; a veto or lock leaves the value untouched.
    pub fn set_value(&self, value: T) -> bool {
        self.set_value_by(value, Originator::unknown())
    }

    pub fn set_value_by(&self, value: T, originator: Originator) -> bool {
        self.core.write(value, originator, None).is_ok()
    }

    /// Write to a parameter locked with `key`.
    pub fn set_value_with_key(&self, value: T, originator: Originator, key: &LockKey) -> bool {
        self.core.write(value, originator, Some(key)).is_ok()
    }

    pub fn default_value(&self) -> T {
        self.core.default.clone()
    }

    pub fn is_default_value(&self) -> bool {
        AnyParam::is_default_value(&*self.core)
    }

    /// Assign the default directly: no callbacks, lock bypassed.
    pub fn reset(&self) {
        AnyParam::reset(&*self.core);
    }

    pub fn value_origin(&self) -> Originator {
        AnyParam::value_origin(&*self.core)
    }

    /// Lock against writes. `None` locks with the parameter's own
    /// identity key, so only `unlock(None)` on this parameter releases
    /// it. Returns false if already locked with a different key.
    pub fn lock(&self, key: Option<&LockKey>) -> bool {
        AnyParam::lock(&*self.core, key)
    }

    pub fn unlock(&self, key: Option<&LockKey>) -> bool {
        AnyParam::unlock(&*self.core, key)
    }

    pub fn is_locked(&self) -> bool {
        AnyParam::is_locked(&*self.core)
    }

    pub fn metadata(&self) -> Value {
        AnyParam::metadata(&*self.core)
    }

    pub fn add_metadata(&self, name: &str, value: Value, description: &str) {
        AnyParam::add_metadata(&*self.core, name, value, description);
    }

    pub fn on_pre_read(&self, cb: impl Fn(&ReadEvent<T>) + 'static) -> CallbackId {
        self.core.pre_read.register(cb)
    }

    pub fn on_post_read(&self, cb: impl Fn(&ReadEvent<T>) + 'static) -> CallbackId {
        self.core.post_read.register(cb)
    }

    /// Register a veto gate. Returning false rejects the write.
    pub fn on_pre_write(&self, cb: impl Fn(&WriteEvent<T>) -> bool + 'static) -> CallbackId {
        self.core.pre_write.register(cb)
    }

    pub fn on_post_write(&self, cb: impl Fn(&WriteEvent<T>) + 'static) -> CallbackId {
        self.core.post_write.register(cb)
    }

    pub fn unregister_pre_read(&self, id: CallbackId) -> bool {
        self.core.pre_read.unregister(id)
    }

    pub fn unregister_post_read(&self, id: CallbackId) -> bool {
        self.core.post_read.unregister(id)
    }

    pub fn unregister_pre_write(&self, id: CallbackId) -> bool {
        self.core.pre_write.unregister(id)
    }

    pub fn unregister_post_write(&self, id: CallbackId) -> bool {
        self.core.post_write.unregister(id)
    }

    pub fn unregister_all_callbacks(&self) -> bool {
        AnyParam::unregister_all_callbacks(&*self.core)
    }

    pub fn has_callbacks(&self) -> bool {
        AnyParam::has_callbacks(&*self.core)
    }
}

impl<T: ValueCodec + Clone + PartialEq + 'static> Drop for Param<T> {
    fn drop(&mut self) {
        self.core.destroyed.set(true);
        if let Some(broker) = self.core.broker.upgrade() {
            broker.unregister_param(&self.core.name, self.core.value_origin());
        }
    }
}

/// Configures and registers a parameter.
pub struct ParamBuilder<T> {
    broker: Option<Broker>,
    name: String,
    default: T,
    description: String,
    originator: Option<Originator>,
}

impl<T> ParamBuilder<T> {
    pub(crate) fn with_target(broker: Broker, name: String, default: T) -> Self {
        Self {
            broker: Some(broker),
            name,
            default,
            description: String::new(),
            originator: None,
        }
    }

    pub fn with_broker(mut self, broker: &Broker) -> Self {
        self.broker = Some(broker.clone());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_originator(mut self, originator: impl Into<Originator>) -> Self {
        self.originator = Some(originator.into());
        self
    }
}

impl<T: ValueCodec + Clone + PartialEq + 'static> Builder for ParamBuilder<T> {
    type Output = Param<T>;

    fn build(self) -> Result<Param<T>> {
        name::validate(&self.name);
        let broker = match self.broker.or_else(Broker::default_broker) {
            Some(broker) => broker,
            None => return Err(CfgError::NoBroker),
        };
        let originator = self.originator.unwrap_or_default();
        let resolved = broker.resolve_name(&self.name);

        // Preset seeding. A present but unconvertible preset logs and is
        // left unconsumed; the default applies as if no preset existed.
        let mut value = self.default.clone();
        let mut origin = originator.clone();
        if let Some(preset) = broker.get_preset_value(&resolved) {
            match T::unpack(&preset) {
                Ok(seeded) => {
                    value = seeded;
                    origin = broker
                        .preset_value_origin(&resolved)
                        .unwrap_or_else(Originator::unknown);
                    broker.consume_preset(&resolved);
                    debug!(
                        "[PARAM] Seeded '{}' from preset set by '{}'",
                        resolved, origin
                    );
                }
                Err(e) => {
                    warn!(
                        "[PARAM] Preset for '{}' does not fit the parameter type ({}), using default",
                        resolved, e
                    );
                }
            }
        }

        let core = Rc::new(ParamCore {
            name: resolved,
            description: RefCell::new(self.description),
            value: RefCell::new(value),
            default: self.default,
            origin: RefCell::new(origin),
            lock: RefCell::new(None),
            identity_key: LockKey::new(),
            metadata: RefCell::new(IndexMap::new()),
            destroyed: Cell::new(false),
            broker: broker.core_weak(),
            pre_read: CallbackList::new(),
            post_read: CallbackList::new(),
            pre_write: CallbackList::new(),
            post_write: CallbackList::new(),
        });

        let erased: Rc<dyn AnyParam> = core.clone();
        broker.register_param(&erased, originator);

        Ok(Param { core })
    }
}
