//! Position slew limiting.
//!
//! A valve cannot jump between positions: each step the commanded position is
//! clamped to within `rate_limit * dt` of the previous position and then to
//! [0, 1]. A rate limit of 0 holds the valve where it is. Because the state
//! machine may already have declared the valve Closed or Open while the
//! limited position is still short of the boundary, [`reconcile`] moves the
//! state back onto the travelling state it is still in.

use crate::error::{ValveError, ValveResult};
use crate::state::ValveState;
use vn_core::numeric::limit_range;

/// Rate limiter on fractional valve position.
///
/// # Example
///
/// ```
/// use vn_valve::SlewLimiter;
///
/// let limiter = SlewLimiter::new(0.5).unwrap();
/// // Asked to open fully in 0.25 s, the valve moves 0.125.
/// assert_eq!(limiter.limit(0.25, 1.0, 0.25), 0.375);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlewLimiter {
    /// Maximum position change per second (1/s); 0 holds position
    rate_limit: f64,
}

impl SlewLimiter {
    /// # Errors
    ///
    /// Returns error if `rate_limit` is negative or not finite.
    pub fn new(rate_limit: f64) -> ValveResult<Self> {
        if !rate_limit.is_finite() || rate_limit < 0.0 {
            return Err(ValveError::InvalidArg {
                what: "rate_limit must be non-negative and finite",
            });
        }
        Ok(Self { rate_limit })
    }

    pub fn rate_limit(&self) -> f64 {
        self.rate_limit
    }

    /// Largest position change allowed over `dt` seconds.
    ///
    /// Negative `dt` is treated as zero elapsed time.
    pub fn max_step(&self, dt: f64) -> f64 {
        self.rate_limit * dt.max(0.0)
    }

    /// Limit `command` relative to `previous` over `dt`, then clamp to [0, 1].
    pub fn limit(&self, previous: f64, command: f64, dt: f64) -> f64 {
        let step = self.max_step(dt);
        let limited = limit_range(previous - step, command, previous + step);
        limit_range(0.0, limited, 1.0)
    }
}

/// Keep the state consistent with a rate-limited position.
///
/// Closed commands 0, so a Closed valve still above 0 is travelling shut and
/// goes back to Closing; an Open valve short of 1 is travelling open and goes
/// back to Opening. The mapping is the same for both polarities.
pub fn reconcile(state: ValveState, position: f64) -> ValveState {
    match state {
        ValveState::Closed if position > 0.0 => ValveState::Closing,
        ValveState::Open if position < 1.0 => ValveState::Opening,
        other => other,
    }
}
