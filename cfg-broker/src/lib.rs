//! A parameter configuration registry.
//!
//! Components declare typed parameters with defaults; deployments override
//! them through presets supplied before the parameters exist (in memory,
//! from YAML files or from environment variables); callbacks observe and
//! gate every read and write. The [`Broker`] indexes parameters by
//! hierarchical name without owning them.
//!
//! ```rust
//! use cfg_broker::prelude::*;
//!
//! let broker = Broker::new();
//! broker.set_preset_value("top.rate", Value::Int(10), "cmdline".into())?;
//!
//! let rate = broker
//!     .create_param("top.rate", 0i64)
//!     .with_description("packets per cycle")
//!     .build()?;
//!
//! // The preset overrode the default.
//! assert_eq!(rate.get_value(), 10);
//!
//! rate.on_pre_write(|e| e.new_value >= 0);
//! assert!(!rate.set_value(-1));
//! assert_eq!(rate.get_value(), 10);
//! # Ok::<(), CfgError>(())
//! ```
//!
//! The whole crate is single-threaded by construction (`Rc`, `RefCell`);
//! see the [`callback`] module for the reentrancy rules.

pub mod broker;
pub mod callback;
pub mod codec;
pub mod common;
pub mod error;
pub mod name;
pub mod param;
pub mod preset;
pub mod storage;
pub mod value;

pub use broker::{Broker, BrokerBuilder, LifecycleEvent};
pub use callback::{CallbackId, ReadEvent, WriteEvent};
pub use codec::ValueCodec;
pub use common::{LockKey, Originator};
pub use error::{CfgError, Result};
pub use param::{AnyParam, Param, ParamBuilder};
pub use value::{Value, ValueKind};

/// Two-step construction: configure, then `build`.
pub trait Builder {
    type Output;

    fn build(self) -> Result<Self::Output>;
}

pub mod prelude {
    pub use crate::broker::{Broker, BrokerBuilder, LifecycleEvent};
    pub use crate::callback::{CallbackId, ReadEvent, WriteEvent};
    pub use crate::codec::ValueCodec;
    pub use crate::common::{LockKey, Originator};
    pub use crate::error::{CfgError, Result};
    pub use crate::param::{AnyParam, Param, ParamBuilder};
    pub use crate::storage::{EnvStorage, MemoryStorage, Storage, YamlStorage};
    pub use crate::value::{Value, ValueKind};
    pub use crate::Builder;
}
