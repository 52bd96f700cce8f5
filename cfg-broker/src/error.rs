//! Error types for broker and parameter operations.

use std::fmt;

use crate::value::ValueKind;

/// Errors reported by the configuration core.
///
/// Everything here is recoverable: operations fail locally, log a
/// diagnostic, and leave state untouched. The single fatal condition,
/// an empty parameter name, panics instead of producing an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CfgError {
    /// Unknown parameter or preset name
    NotFound(String),

    /// Write attempted against a locked parameter or preset
    AlreadyLocked(String),

    /// Pre-write callback vetoed the change
    RejectedWrite(String),

    /// Stored or preset value could not be converted to the target type
    Parse { name: String, reason: String },

    /// Structured value had the wrong shape for the requested type
    TypeMismatch { expected: ValueKind, found: ValueKind },

    /// No broker was available to register against
    NoBroker,
}

impl fmt::Display for CfgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgError::NotFound(name) => {
                write!(f, "Unable to find a parameter or preset named '{}'", name)
            }
            CfgError::AlreadyLocked(name) => {
                write!(f, "'{}' is locked and cannot be written", name)
            }
            CfgError::RejectedWrite(name) => {
                write!(f, "Write to '{}' was rejected by a pre-write callback", name)
            }
            CfgError::Parse { name, reason } => {
                write!(f, "Unable to parse value for '{}': {}", name, reason)
            }
            CfgError::TypeMismatch { expected, found } => {
                write!(f, "Expected a {} value, got {}", expected, found)
            }
            CfgError::NoBroker => {
                write!(f, "No broker available to register against")
            }
        }
    }
}

impl std::error::Error for CfgError {}

pub type Result<T> = std::result::Result<T, CfgError>;
