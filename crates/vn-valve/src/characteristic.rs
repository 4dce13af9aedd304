//! Pop-and-nominal valve characteristic.
//!
//! Each travel direction is two straight lines in (control pressure,
//! position):
//!
//! - a steep *pop* line through position 0 at the direction's zero-position
//!   threshold (crack when opening, reseat when closing), with slope
//!   `pop_slope_scale / (full_open - threshold)`;
//! - a *nominal* line from the point where the pop line reaches
//!   `pop_position` to position 1 at `full_open`.
//!
//! The same construction serves both polarities because it only refers to
//! thresholds, never to which way pressure moves. Validated setpoints keep
//! every divisor away from zero.

use crate::config::{Direction, Setpoints};
use crate::error::ValveResult;
use crate::traits::ValveCharacteristic;

/// A straight line in point-slope form.
///
/// Evaluating at the anchor returns the anchor position exactly, which keeps
/// the boundary positions (0 at crack/reseat, 1 at full open) free of
/// rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    anchor_pressure: f64,
    anchor_position: f64,
    slope: f64,
}

impl Segment {
    pub fn new(anchor_pressure: f64, anchor_position: f64, slope: f64) -> Self {
        Self {
            anchor_pressure,
            anchor_position,
            slope,
        }
    }

    /// Position change per kPa.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Position at zero control pressure.
    pub fn intercept(&self) -> f64 {
        self.anchor_position - self.slope * self.anchor_pressure
    }

    pub fn position(&self, pressure: f64) -> f64 {
        self.anchor_position + self.slope * (pressure - self.anchor_pressure)
    }

    pub fn pressure(&self, position: f64) -> f64 {
        self.anchor_pressure + (position - self.anchor_position) / self.slope
    }
}

/// Pop and nominal lines for one travel direction.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Branch {
    pop: Segment,
    nominal: Segment,
    transition_pressure: f64,
}

impl Branch {
    fn derive(zero_at: f64, full_open: f64, pop_position: f64, pop_slope_scale: f64) -> Self {
        let pop_slope = pop_slope_scale / (full_open - zero_at);
        let pop = Segment::new(zero_at, 0.0, pop_slope);
        let transition_pressure = zero_at + pop_position / pop_slope;
        let nominal_slope = (1.0 - pop_position) / (full_open - transition_pressure);
        let nominal = Segment::new(full_open, 1.0, nominal_slope);
        Self {
            pop,
            nominal,
            transition_pressure,
        }
    }

    fn position(&self, pressure: f64, pop_position: f64) -> f64 {
        let on_pop = self.pop.position(pressure);
        if on_pop <= pop_position {
            on_pop
        } else {
            self.nominal.position(pressure)
        }
    }

    fn pressure(&self, position: f64, pop_position: f64) -> f64 {
        if position <= pop_position {
            self.pop.pressure(position)
        } else {
            self.nominal.pressure(position)
        }
    }
}

/// Four-segment characteristic derived once from the setpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PopCurve {
    setpoints: Setpoints,
    opening: Branch,
    closing: Branch,
}

impl PopCurve {
    /// Validate `setpoints` and derive the segment coefficients.
    pub fn derive(valve: &str, setpoints: Setpoints) -> ValveResult<Self> {
        setpoints.validate(valve)?;
        let Setpoints {
            reseat,
            crack,
            full_open,
            pop_position,
            pop_slope_scale,
            ..
        } = setpoints;
        Ok(Self {
            setpoints,
            opening: Branch::derive(crack, full_open, pop_position, pop_slope_scale),
            closing: Branch::derive(reseat, full_open, pop_position, pop_slope_scale),
        })
    }

    fn branch(&self, direction: Direction) -> &Branch {
        match direction {
            Direction::Opening => &self.opening,
            Direction::Closing => &self.closing,
        }
    }

    pub fn pop_segment(&self, direction: Direction) -> Segment {
        self.branch(direction).pop
    }

    pub fn nominal_segment(&self, direction: Direction) -> Segment {
        self.branch(direction).nominal
    }

    /// Control pressure where the pop line meets the nominal line.
    pub fn transition_pressure(&self, direction: Direction) -> f64 {
        self.branch(direction).transition_pressure
    }
}

impl ValveCharacteristic for PopCurve {
    fn setpoints(&self) -> &Setpoints {
        &self.setpoints
    }

    fn position(&self, direction: Direction, pressure: f64) -> f64 {
        self.branch(direction)
            .position(pressure, self.setpoints.pop_position)
    }

    fn pressure_at(&self, direction: Direction, position: f64) -> f64 {
        self.branch(direction)
            .pressure(position, self.setpoints.pop_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Polarity, PressureTrend};
    use vn_core::{Tolerances, nearly_equal};

    fn worked_example() -> PopCurve {
        PopCurve::derive(
            "reg",
            Setpoints {
                polarity: Polarity::Regulator,
                reseat: 3.0,
                crack: 2.0,
                full_open: 1.0,
                pop_position: 0.1,
                pop_slope_scale: 4.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn worked_example_coefficients() {
        let curve = worked_example();
        let opening = Polarity::Regulator.direction(PressureTrend::Decreasing);
        assert_eq!(curve.pop_segment(opening).slope(), -4.0);
        assert_eq!(curve.pop_segment(opening).intercept(), 8.0);
        assert_eq!(curve.position(opening, 2.0), 0.0);
        assert_eq!(curve.position(opening, 1.0), 1.0);
        // pop reaches 0.1 at 2.0 - 0.1/4
        assert!((curve.transition_pressure(opening) - 1.975).abs() < 1e-12);
    }

    #[test]
    fn closing_branch_anchored_at_reseat() {
        let curve = worked_example();
        assert_eq!(curve.pop_segment(Direction::Closing).slope(), -2.0);
        assert_eq!(curve.position(Direction::Closing, 3.0), 0.0);
        assert_eq!(curve.position(Direction::Closing, 1.0), 1.0);
    }

    #[test]
    fn pop_then_nominal_selection() {
        let curve = worked_example();
        // On the pop line just past crack
        let p = curve.position(Direction::Opening, 1.99);
        assert!((p - 0.04).abs() < 1e-12);
        // Past the transition pressure the nominal line governs
        let nominal = curve.nominal_segment(Direction::Opening);
        assert_eq!(curve.position(Direction::Opening, 1.5), nominal.position(1.5));
        assert!(curve.position(Direction::Opening, 1.5) < 1.0);
    }

    #[test]
    fn outside_range_is_unclamped() {
        let curve = worked_example();
        assert!(curve.position(Direction::Opening, 2.5) < 0.0);
        assert!(curve.position(Direction::Opening, 0.5) > 1.0);
    }

    #[test]
    fn pressure_at_inverts_position() {
        let curve = worked_example();
        for dir in [Direction::Opening, Direction::Closing] {
            for pos in [0.0, 0.05, 0.1, 0.4, 0.9, 1.0] {
                let p = curve.pressure_at(dir, pos);
                let back = curve.position(dir, p);
                assert!((back - pos).abs() < 1e-12, "{dir:?} {pos} -> {p} -> {back}");
            }
        }
        assert_eq!(curve.pressure_at(Direction::Opening, 0.0), 2.0);
        assert_eq!(curve.pressure_at(Direction::Closing, 0.0), 3.0);
    }

    #[test]
    fn relief_mirrors_regulator() {
        let curve = PopCurve::derive(
            "relief",
            Setpoints {
                polarity: Polarity::Relief,
                reseat: 1.0,
                crack: 2.0,
                full_open: 3.0,
                pop_position: 0.1,
                pop_slope_scale: 4.0,
            },
        )
        .unwrap();
        let opening = Polarity::Relief.direction(PressureTrend::Increasing);
        assert_eq!(opening, Direction::Opening);
        assert_eq!(curve.pop_segment(opening).slope(), 4.0);
        assert_eq!(curve.position(opening, 2.0), 0.0);
        assert_eq!(curve.position(opening, 3.0), 1.0);
        assert_eq!(curve.position(Direction::Closing, 1.0), 0.0);
        assert_eq!(curve.position(Direction::Closing, 3.0), 1.0);
        assert!(curve.position(opening, 2.01) > 0.0);
    }

    #[test]
    fn derive_rejects_bad_ordering() {
        let err = PopCurve::derive(
            "bad",
            Setpoints {
                polarity: Polarity::Regulator,
                reseat: 3.0,
                crack: 0.5,
                full_open: 1.0,
                pop_position: 0.1,
                pop_slope_scale: 4.0,
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("crack_pressure"));
    }

    #[test]
    fn unit_scale_is_single_line() {
        let curve = PopCurve::derive(
            "lin",
            Setpoints {
                polarity: Polarity::Regulator,
                reseat: 3.0,
                crack: 2.0,
                full_open: 1.0,
                pop_position: 0.5,
                pop_slope_scale: 1.0,
            },
        )
        .unwrap();
        let tol = Tolerances::default();
        assert!(nearly_equal(
            curve.pop_segment(Direction::Opening).slope(),
            curve.nominal_segment(Direction::Opening).slope(),
            tol
        ));
    }
}
