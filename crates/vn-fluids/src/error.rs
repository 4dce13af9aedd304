//! Fluid state errors.

use thiserror::Error;
use vn_core::VnError;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors raised while building fluid states.
///
/// Flow relations themselves never fail; only state construction validates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },
}

impl From<FluidError> for VnError {
    fn from(err: FluidError) -> Self {
        match err {
            FluidError::NonPhysical { what, value } => VnError::Config {
                what: format!("non-physical fluid {what}: {value}"),
            },
        }
    }
}
