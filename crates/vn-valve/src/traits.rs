//! Seams between the valve core and its collaborators.

use crate::config::{Direction, Setpoints};
use std::fmt;
use vn_fluids::FluidState;

/// References to the fluid states at the link's two flow ports.
#[derive(Clone, Copy)]
pub struct PortStates<'a> {
    pub inlet: &'a FluidState,
    pub outlet: &'a FluidState,
}

/// Potentials (kPa) read at the two sense points for this step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensedPotentials {
    pub a: f64,
    pub b: f64,
}

impl SensedPotentials {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Raw differential `a - b`.
    pub fn delta(&self) -> f64 {
        self.a - self.b
    }
}

/// Maps control pressure to commanded position along either travel direction.
///
/// The strategy is picked when the valve is built; the state machine only
/// talks to it through this trait.
pub trait ValveCharacteristic: Send + Sync + fmt::Debug {
    /// Setpoints the curve was derived from.
    fn setpoints(&self) -> &Setpoints;

    /// Commanded position at `pressure` while travelling in `direction`.
    ///
    /// Not clamped; values outside [0, 1] are left to the slew limiter.
    fn position(&self, direction: Direction, pressure: f64) -> f64;

    /// Control pressure at which the `direction` curve reaches `position`.
    fn pressure_at(&self, direction: Direction, position: f64) -> f64;
}
