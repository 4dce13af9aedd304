//! Piecewise-linear time schedules for boundary potentials.

use serde::{Deserialize, Serialize};

/// `(time_s, value)` breakpoints with linear interpolation between them.
///
/// Holds the first value before the first breakpoint and the last value
/// after the last one. Repeated times give a step.
///
/// # Example
///
/// ```
/// use vn_sim::Schedule;
///
/// let ramp = Schedule::new(vec![(0.0, 100.0), (10.0, 200.0)]);
/// assert_eq!(ramp.value_at(-1.0), 100.0);
/// assert_eq!(ramp.value_at(5.0), 150.0);
/// assert_eq!(ramp.value_at(20.0), 200.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    points: Vec<(f64, f64)>,
}

impl Schedule {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            points: vec![(0.0, value)],
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Interpolated value at `t`; 0 for an empty schedule.
    pub fn value_at(&self, t: f64) -> f64 {
        let (Some(&(t_first, v_first)), Some(&(t_last, v_last))) =
            (self.points.first(), self.points.last())
        else {
            return 0.0;
        };
        if t < t_first {
            return v_first;
        }
        if t >= t_last {
            return v_last;
        }
        // t_first <= t < t_last, so 1 <= i < len
        let i = self.points.partition_point(|&(ti, _)| ti <= t);
        let (ta, va) = self.points[i - 1];
        let (tb, vb) = self.points[i];
        va + (vb - va) * (t - ta) / (tb - ta)
    }

    /// Reason this schedule cannot be used, if any.
    pub fn check(&self) -> Option<&'static str> {
        if self.points.is_empty() {
            return Some("schedule has no points");
        }
        if self
            .points
            .iter()
            .any(|&(t, v)| !t.is_finite() || !v.is_finite())
        {
            return Some("schedule points must be finite");
        }
        if self.points.windows(2).any(|w| w[1].0 < w[0].0) {
            return Some("schedule times must be non-decreasing");
        }
        None
    }

    /// Smallest scheduled value.
    pub fn min_value(&self) -> Option<f64> {
        self.points.iter().map(|&(_, v)| v).reduce(f64::min)
    }
}
