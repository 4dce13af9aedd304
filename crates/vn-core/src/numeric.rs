use crate::VnError;

/// Floating point type used throughout system
pub type Real = f64;

/// Smallest pressure (kPa) treated as distinguishable from zero by valve setpoints.
pub const PRESSURE_EPSILON: Real = f64::EPSILON;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, VnError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(VnError::NonFinite { what, value: v })
    }
}

/// Limit `v` to `[lo, hi]` without panicking when the bounds are inverted.
///
/// Inverted bounds resolve to `hi`, and NaN input resolves to `lo`.
pub fn limit_range(lo: Real, v: Real, hi: Real) -> Real {
    v.max(lo).min(hi)
}
