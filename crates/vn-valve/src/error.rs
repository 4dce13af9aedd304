//! Error types for valve configuration.
//!
//! Only initialization can fail. Stepping a valve always produces a defined
//! numeric result, whatever the malfunction inputs.

use thiserror::Error;
use vn_core::VnError;

/// Errors that can occur while configuring a valve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValveError {
    #[error("{valve}: invalid {field} = {value} (must be {bound})")]
    InvalidConfig {
        valve: String,
        field: &'static str,
        value: f64,
        bound: &'static str,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type ValveResult<T> = Result<T, ValveError>;

impl ValveError {
    /// Field name of a configuration error, if this is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValveError::InvalidConfig { field, .. } => Some(field),
            ValveError::InvalidArg { .. } => None,
        }
    }
}

impl From<ValveError> for VnError {
    fn from(e: ValveError) -> Self {
        match e {
            ValveError::InvalidConfig { .. } => VnError::Config {
                what: e.to_string(),
            },
            ValveError::InvalidArg { what } => VnError::InvalidArg { what },
        }
    }
}
