//! Common constants and validation helpers.

use crate::error::{ValveError, ValveResult};
use vn_core::numeric::ensure_finite;

/// Default floor on |Δp| used to linearize flow (kPa).
pub const DEFAULT_MIN_LINEARIZATION_POTENTIAL: f64 = 1.0;

/// Default slew rate for [`ValveConfig::new`](crate::ValveConfig::new) (1/s):
/// a full stroke in 10 ms.
pub const DEFAULT_RATE_LIMIT: f64 = 100.0;

/// Default upper clamp on system conductance.
pub const DEFAULT_CONDUCTANCE_LIMIT: f64 = 1.0e15;

/// Reject non-finite configuration values, naming the field.
pub fn check_finite(valve: &str, field: &'static str, value: f64) -> ValveResult<()> {
    ensure_finite(value, field).map_err(|_| ValveError::InvalidConfig {
        valve: valve.to_string(),
        field,
        value,
        bound: "finite",
    })?;
    Ok(())
}

/// Build a configuration error unless `ok` holds.
pub fn require(
    ok: bool,
    valve: &str,
    field: &'static str,
    value: f64,
    bound: &'static str,
) -> ValveResult<()> {
    if ok {
        Ok(())
    } else {
        Err(ValveError::InvalidConfig {
            valve: valve.to_string(),
            field,
            value,
            bound,
        })
    }
}
