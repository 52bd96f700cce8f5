//! The inspection view over a native broker.

use std::rc::Rc;

use cfg_broker::{
    Broker, CallbackId, LifecycleEvent, Originator, Result, Value,
};

use crate::handle::ParamHandle;

/// A named view of one [`Broker`] for a single originator.
///
/// The view keeps no state of its own beyond the originator it stamps on
/// writes; every query goes straight to the broker's index and preset
/// store, so the view can never disagree with the registry.
#[derive(Clone)]
pub struct InspectBroker {
    broker: Broker,
    originator: Originator,
}

impl InspectBroker {
    pub fn new(broker: &Broker, originator: impl Into<Originator>) -> Self {
        Self {
            broker: broker.clone(),
            originator: originator.into(),
        }
    }

    pub fn name(&self) -> &str {
        self.broker.name()
    }

    pub fn originator(&self) -> &Originator {
        &self.originator
    }

    /// A handle for `name`. Unknown names yield an invalid handle rather
    /// than an error, so callers can probe and hold handles uniformly.
    pub fn param_handle(&self, name: &str) -> ParamHandle {
        match self.broker.get_param(name) {
            Some(param) => ParamHandle::new(
                name.to_string(),
                Rc::downgrade(&param),
                self.broker.clone(),
                self.originator.clone(),
            ),
            None => {
                ParamHandle::dangling(name.to_string(), self.broker.clone(), self.originator.clone())
            }
        }
    }

    /// Handles for every live parameter, in name order.
    pub fn param_handles(&self) -> Vec<ParamHandle> {
        self.broker
            .params()
            .into_iter()
            .map(|param| {
                ParamHandle::new(
                    param.name().to_string(),
                    Rc::downgrade(&param),
                    self.broker.clone(),
                    self.originator.clone(),
                )
            })
            .collect()
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.broker.has_param(name)
    }

    pub fn get_value(&self, name: &str) -> Result<Value> {
        self.broker.get_value(name)
    }

    /// Write a parameter, recording this view's originator.
    pub fn set_value(&self, name: &str, value: Value) -> Result<()> {
        self.broker.set_value(name, value, self.originator.clone())
    }

    pub fn value_origin(&self, name: &str) -> Result<Originator> {
        self.param_handle(name).value_origin()
    }

    pub fn set_preset_value(&self, name: &str, value: Value) -> Result<()> {
        self.broker
            .set_preset_value(name, value, self.originator.clone())
    }

    pub fn get_preset_value(&self, name: &str) -> Option<Value> {
        self.broker.get_preset_value(name)
    }

    pub fn has_preset_value(&self, name: &str) -> bool {
        self.broker.has_preset_value(name)
    }

    pub fn preset_value_origin(&self, name: &str) -> Option<Originator> {
        self.broker.preset_value_origin(name)
    }

    pub fn lock_preset_value(&self, name: &str) {
        self.broker.lock_preset_value(name);
    }

    pub fn unconsumed_preset_values(&self) -> Vec<(String, Value)> {
        self.broker.unconsumed_preset_values()
    }

    pub fn ignore_unconsumed_presets(&self, pred: impl Fn(&str, &Value) -> bool + 'static) {
        self.broker.ignore_unconsumed_presets(pred);
    }

    pub fn on_param_create(&self, cb: impl Fn(&LifecycleEvent) + 'static) -> CallbackId {
        self.broker.on_param_create(cb)
    }

    pub fn on_param_destroy(&self, cb: impl Fn(&LifecycleEvent) + 'static) -> CallbackId {
        self.broker.on_param_destroy(cb)
    }

    pub fn unregister_create_callback(&self, id: CallbackId) -> bool {
        self.broker.unregister_create_callback(id)
    }

    pub fn unregister_destroy_callback(&self, id: CallbackId) -> bool {
        self.broker.unregister_destroy_callback(id)
    }
}
