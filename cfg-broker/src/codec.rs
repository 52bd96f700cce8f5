//! Per-type conversion between native values and [`Value`].
//!
//! Every parameter type implements [`ValueCodec`]: `pack` renders the
//! native value as a structured `Value`, `unpack` rebuilds it. Custom
//! types implement the trait by hand, typically packing into a map:
//!
//! ```rust
//! use cfg_broker::{CfgError, Result, Value, ValueCodec, ValueKind};
//! use indexmap::IndexMap;
//!
//! #[derive(Clone, PartialEq)]
//! struct Endpoint {
//!     host: String,
//!     port: i64,
//! }
//!
//! impl ValueCodec for Endpoint {
//!     fn pack(&self) -> Value {
//!         let mut map = IndexMap::new();
//!         map.insert("host".to_string(), self.host.pack());
//!         map.insert("port".to_string(), self.port.pack());
//!         Value::Map(map)
//!     }
//!
//!     fn unpack(value: &Value) -> Result<Self> {
//!         let map = value.as_map().ok_or(CfgError::TypeMismatch {
//!             expected: ValueKind::Map,
//!             found: value.kind(),
//!         })?;
//!         Ok(Endpoint {
//!             host: map.get("host").map(String::unpack).transpose()?.unwrap_or_default(),
//!             port: map.get("port").map(i64::unpack).transpose()?.unwrap_or_default(),
//!         })
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::error::{CfgError, Result};
use crate::value::{Value, ValueKind};

/// Bidirectional conversion between a native type and [`Value`].
pub trait ValueCodec: Sized {
    fn pack(&self) -> Value;
    fn unpack(value: &Value) -> Result<Self>;
}

fn mismatch(expected: ValueKind, value: &Value) -> CfgError {
    CfgError::TypeMismatch {
        expected,
        found: value.kind(),
    }
}

fn narrow<T: TryFrom<i64>>(raw: i64, type_name: &str) -> Result<T> {
    T::try_from(raw).map_err(|_| CfgError::Parse {
        name: type_name.to_string(),
        reason: format!("{} out of range", raw),
    })
}

impl ValueCodec for bool {
    fn pack(&self) -> Value {
        Value::Bool(*self)
    }

    fn unpack(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch(ValueKind::Bool, value))
    }
}

impl ValueCodec for i64 {
    fn pack(&self) -> Value {
        Value::Int(*self)
    }

    fn unpack(value: &Value) -> Result<Self> {
        value.as_int().ok_or_else(|| mismatch(ValueKind::Int, value))
    }
}

macro_rules! impl_codec_for_narrow_int {
    ($($ty:ty),*) => {$(
        impl ValueCodec for $ty {
            fn pack(&self) -> Value {
                Value::Int(*self as i64)
            }

            fn unpack(value: &Value) -> Result<Self> {
                let raw = value.as_int().ok_or_else(|| mismatch(ValueKind::Int, value))?;
                narrow(raw, stringify!($ty))
            }
        }
    )*};
}

impl_codec_for_narrow_int!(i8, i16, i32, u8, u16, u32);

impl ValueCodec for f64 {
    fn pack(&self) -> Value {
        Value::Real(*self)
    }

    fn unpack(value: &Value) -> Result<Self> {
        value.as_real().ok_or_else(|| mismatch(ValueKind::Real, value))
    }
}

impl ValueCodec for f32 {
    fn pack(&self) -> Value {
        Value::Real(*self as f64)
    }

    fn unpack(value: &Value) -> Result<Self> {
        value
            .as_real()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch(ValueKind::Real, value))
    }
}

impl ValueCodec for String {
    fn pack(&self) -> Value {
        Value::Str(self.clone())
    }

    fn unpack(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(ValueKind::Str, value))
    }
}

impl<T: ValueCodec> ValueCodec for Vec<T> {
    fn pack(&self) -> Value {
        Value::List(self.iter().map(T::pack).collect())
    }

    fn unpack(value: &Value) -> Result<Self> {
        value
            .as_list()
            .ok_or_else(|| mismatch(ValueKind::List, value))?
            .iter()
            .map(T::unpack)
            .collect()
    }
}

impl<T: ValueCodec> ValueCodec for Option<T> {
    fn pack(&self) -> Value {
        match self {
            Some(v) => v.pack(),
            None => Value::Null,
        }
    }

    fn unpack(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::unpack(value).map(Some)
        }
    }
}

impl<T: ValueCodec> ValueCodec for IndexMap<String, T> {
    fn pack(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.pack())).collect())
    }

    fn unpack(value: &Value) -> Result<Self> {
        value
            .as_map()
            .ok_or_else(|| mismatch(ValueKind::Map, value))?
            .iter()
            .map(|(k, v)| Ok((k.clone(), T::unpack(v)?)))
            .collect()
    }
}

impl<T: ValueCodec> ValueCodec for BTreeMap<String, T> {
    fn pack(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.pack())).collect())
    }

    fn unpack(value: &Value) -> Result<Self> {
        value
            .as_map()
            .ok_or_else(|| mismatch(ValueKind::Map, value))?
            .iter()
            .map(|(k, v)| Ok((k.clone(), T::unpack(v)?)))
            .collect()
    }
}

impl ValueCodec for () {
    fn pack(&self) -> Value {
        Value::Null
    }

    fn unpack(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(())
        } else {
            Err(mismatch(ValueKind::Null, value))
        }
    }
}

impl ValueCodec for Value {
    fn pack(&self) -> Value {
        self.clone()
    }

    fn unpack(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}
