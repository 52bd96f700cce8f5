//! Type-erased parameter handles.

use std::rc::{Rc, Weak};

use cfg_broker::{
    AnyParam, Broker, CallbackId, CfgError, LockKey, Originator, ReadEvent, Result, Value,
    WriteEvent,
};
use tracing::debug;

/// A non-owning, type-erased view of one parameter.
///
/// The handle never keeps the parameter alive. Once the owning
/// [`Param`](cfg_broker::Param) is dropped the handle turns invalid:
/// `is_valid` reports false and every accessor fails with `NotFound`.
/// Writes made through the handle record the originator it was created
/// with.
#[derive(Clone)]
pub struct ParamHandle {
    name: String,
    param: Weak<dyn AnyParam>,
    broker: Broker,
    originator: Originator,
}

impl ParamHandle {
    pub(crate) fn new(
        name: String,
        param: Weak<dyn AnyParam>,
        broker: Broker,
        originator: Originator,
    ) -> Self {
        Self {
            name,
            param,
            broker,
            originator,
        }
    }

    /// A handle that never resolves, for lookups of unknown names.
    pub(crate) fn dangling(name: String, broker: Broker, originator: Originator) -> Self {
        // Weak::new() cannot produce a Weak<dyn AnyParam> directly; go
        // through a dropped Rc instead.
        let gone: Weak<dyn AnyParam> = {
            let rc: Rc<dyn AnyParam> = Rc::new(NeverParam);
            let weak = Rc::downgrade(&rc);
            drop(rc);
            weak
        };
        Self {
            name,
            param: gone,
            broker,
            originator,
        }
    }

    fn resolve(&self) -> Result<Rc<dyn AnyParam>> {
        match self.param.upgrade() {
            Some(param) if !param.is_destroyed() => Ok(param),
            _ => {
                debug!("[INSPECT] Handle for '{}' is no longer valid", self.name);
                Err(CfgError::NotFound(self.name.clone()))
            }
        }
    }

    /// Whether the parameter behind the handle still exists.
    pub fn is_valid(&self) -> bool {
        self.param.upgrade().is_some_and(|p| !p.is_destroyed())
    }

    /// The registered name. Remains readable after invalidation.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Result<String> {
        Ok(self.resolve()?.description())
    }

    pub fn set_description(&self, description: &str) -> Result<()> {
        self.resolve()?.set_description(description);
        Ok(())
    }

    /// Read through the parameter's full callback pipeline.
    pub fn get_value(&self) -> Result<Value> {
        Ok(self.resolve()?.get_raw_value())
    }

    /// Write through the parameter's full callback pipeline, recording
    /// this handle's originator.
    pub fn set_value(&self, value: Value) -> Result<()> {
        self.resolve()?
            .set_raw_value(&value, self.originator.clone(), None)
    }

    pub fn default_value(&self) -> Result<Value> {
        Ok(self.resolve()?.raw_default_value())
    }

    pub fn is_default_value(&self) -> Result<bool> {
        Ok(self.resolve()?.is_default_value())
    }

    pub fn reset(&self) -> Result<()> {
        self.resolve()?.reset();
        Ok(())
    }

    pub fn value_origin(&self) -> Result<Originator> {
        Ok(self.resolve()?.value_origin())
    }

    /// Whether the current value equals the preset stored under this
    /// parameter's name. False when no preset exists.
    pub fn is_preset_value(&self) -> Result<bool> {
        let param = self.resolve()?;
        match self.broker.get_preset_value(&self.name) {
            Some(preset) => Ok(param.get_raw_value() == preset),
            None => Ok(false),
        }
    }

    pub fn lock(&self, key: Option<&LockKey>) -> Result<bool> {
        Ok(self.resolve()?.lock(key))
    }

    pub fn unlock(&self, key: Option<&LockKey>) -> Result<bool> {
        Ok(self.resolve()?.unlock(key))
    }

    pub fn is_locked(&self) -> Result<bool> {
        Ok(self.resolve()?.is_locked())
    }

    pub fn metadata(&self) -> Result<Value> {
        Ok(self.resolve()?.metadata())
    }

    pub fn add_metadata(&self, name: &str, value: Value, description: &str) -> Result<()> {
        self.resolve()?.add_metadata(name, value, description);
        Ok(())
    }

    pub fn on_pre_read(&self, cb: impl Fn(&ReadEvent<Value>) + 'static) -> Result<CallbackId> {
        Ok(self.resolve()?.on_raw_pre_read(Rc::new(cb)))
    }

    pub fn on_post_read(&self, cb: impl Fn(&ReadEvent<Value>) + 'static) -> Result<CallbackId> {
        Ok(self.resolve()?.on_raw_post_read(Rc::new(cb)))
    }

    /// Register a veto gate in the parameter's own pre-write list.
    pub fn on_pre_write(
        &self,
        cb: impl Fn(&WriteEvent<Value>) -> bool + 'static,
    ) -> Result<CallbackId> {
        Ok(self.resolve()?.on_raw_pre_write(Rc::new(cb)))
    }

    pub fn on_post_write(&self, cb: impl Fn(&WriteEvent<Value>) + 'static) -> Result<CallbackId> {
        Ok(self.resolve()?.on_raw_post_write(Rc::new(cb)))
    }

    pub fn unregister_pre_read(&self, id: CallbackId) -> Result<bool> {
        Ok(self.resolve()?.unregister_pre_read(id))
    }

    pub fn unregister_post_read(&self, id: CallbackId) -> Result<bool> {
        Ok(self.resolve()?.unregister_post_read(id))
    }

    pub fn unregister_pre_write(&self, id: CallbackId) -> Result<bool> {
        Ok(self.resolve()?.unregister_pre_write(id))
    }

    pub fn unregister_post_write(&self, id: CallbackId) -> Result<bool> {
        Ok(self.resolve()?.unregister_post_write(id))
    }

    pub fn unregister_all_callbacks(&self) -> Result<bool> {
        Ok(self.resolve()?.unregister_all_callbacks())
    }
}

/// Placeholder target for handles that never resolved to a parameter.
struct NeverParam;

impl AnyParam for NeverParam {
    fn name(&self) -> &str {
        ""
    }
    fn description(&self) -> String {
        String::new()
    }
    fn set_description(&self, _: &str) {}
    fn get_raw_value(&self) -> Value {
        Value::Null
    }
    fn set_raw_value(&self, _: &Value, _: Originator, _: Option<&LockKey>) -> Result<()> {
        Err(CfgError::NotFound(String::new()))
    }
    fn raw_default_value(&self) -> Value {
        Value::Null
    }
    fn is_default_value(&self) -> bool {
        false
    }
    fn reset(&self) {}
    fn value_origin(&self) -> Originator {
        Originator::unknown()
    }
    fn lock(&self, _: Option<&LockKey>) -> bool {
        false
    }
    fn unlock(&self, _: Option<&LockKey>) -> bool {
        false
    }
    fn is_locked(&self) -> bool {
        false
    }
    fn metadata(&self) -> Value {
        Value::Null
    }
    fn add_metadata(&self, _: &str, _: Value, _: &str) {}
    fn is_destroyed(&self) -> bool {
        true
    }
    fn on_raw_pre_read(&self, _: Rc<dyn Fn(&ReadEvent<Value>)>) -> CallbackId {
        0
    }
    fn on_raw_post_read(&self, _: Rc<dyn Fn(&ReadEvent<Value>)>) -> CallbackId {
        0
    }
    fn on_raw_pre_write(&self, _: Rc<dyn Fn(&WriteEvent<Value>) -> bool>) -> CallbackId {
        0
    }
    fn on_raw_post_write(&self, _: Rc<dyn Fn(&WriteEvent<Value>)>) -> CallbackId {
        0
    }
    fn unregister_pre_read(&self, _: CallbackId) -> bool {
        false
    }
    fn unregister_post_read(&self, _: CallbackId) -> bool {
        false
    }
    fn unregister_pre_write(&self, _: CallbackId) -> bool {
        false
    }
    fn unregister_post_write(&self, _: CallbackId) -> bool {
        false
    }
    fn unregister_all_callbacks(&self) -> bool {
        false
    }
    fn has_callbacks(&self) -> bool {
        false
    }
}
