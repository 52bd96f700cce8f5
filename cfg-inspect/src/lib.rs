//! Standard configuration surface over a [`cfg_broker::Broker`].
//!
//! Tooling and foreign components talk to the registry through
//! [`InspectBroker`] and type-erased [`ParamHandle`]s: values cross as
//! structured [`cfg_broker::Value`]s, writes carry the view's originator,
//! and callbacks registered through a handle land in the parameter's own
//! pipeline. Handles hold parameters weakly and turn invalid the moment
//! the owning side drops them.
//!
//! ```rust
//! use cfg_broker::prelude::*;
//! use cfg_inspect::InspectBroker;
//!
//! let broker = Broker::new();
//! let rate = broker.create_param("top.rate", 5i64).build()?;
//!
//! let view = InspectBroker::new(&broker, "tool");
//! let handle = view.param_handle("top.rate");
//! handle.set_value(Value::Int(9))?;
//!
//! assert_eq!(rate.get_value(), 9);
//! assert_eq!(rate.value_origin().name(), "tool");
//! # Ok::<(), CfgError>(())
//! ```

mod broker;
mod handle;

pub use broker::InspectBroker;
pub use handle::ParamHandle;
