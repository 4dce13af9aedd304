//! Five-state valve automaton with hysteresis.
//!
//! Transitions are written in terms of "opens past" and "closes past" so the
//! same table serves the regulator (opens as pressure falls) and the relief
//! valve (opens as pressure rises):
//!
//! | from          | condition                                        | to            |
//! |---------------|--------------------------------------------------|---------------|
//! | Closed        | p opens past crack                               | Opening       |
//! | Open          | p closes past full open                          | Closing       |
//! | Opening       | p opens past full open                           | Open          |
//! | Opening       | p closes past previous p                         | Transitioning |
//! | Closing       | p closes past reseat                             | Closed        |
//! | Closing       | p opens past previous p                          | Transitioning |
//! | Transitioning | p closes past closing-curve pressure at position | Closing       |
//! | Transitioning | p opens past opening-curve pressure at position  | Opening       |
//!
//! At most one transition fires per step. A reversal freezes position in
//! Transitioning until the pressure crosses the opposite curve at the held
//! position, so small oscillations cannot make the valve chatter.

use crate::config::Direction;
use crate::traits::ValveCharacteristic;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValveState {
    Closed,
    Open,
    Opening,
    Closing,
    Transitioning,
    /// A state code with no meaning. Kept as-is and treated as "hold position".
    Invalid(i32),
}

impl ValveState {
    /// Decode an externally stored state code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ValveState::Closed,
            1 => ValveState::Open,
            2 => ValveState::Opening,
            3 => ValveState::Closing,
            4 => ValveState::Transitioning,
            other => ValveState::Invalid(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ValveState::Closed => 0,
            ValveState::Open => 1,
            ValveState::Opening => 2,
            ValveState::Closing => 3,
            ValveState::Transitioning => 4,
            ValveState::Invalid(code) => code,
        }
    }

    /// Starting state for an initial position.
    pub fn from_position(position: f64) -> Self {
        if position <= 0.0 {
            ValveState::Closed
        } else if position >= 1.0 {
            ValveState::Open
        } else {
            ValveState::Opening
        }
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, ValveState::Invalid(_))
    }

    /// State after observing `pressure`, given the previous step's pressure and
    /// the current position.
    pub fn transition(
        self,
        pressure: f64,
        previous_pressure: f64,
        position: f64,
        curve: &dyn ValveCharacteristic,
    ) -> ValveState {
        let sp = curve.setpoints();
        let polarity = sp.polarity;
        match self {
            ValveState::Closed if polarity.opens_past(pressure, sp.crack) => ValveState::Opening,
            ValveState::Open if polarity.closes_past(pressure, sp.full_open) => {
                ValveState::Closing
            }
            ValveState::Opening => {
                if polarity.opens_past(pressure, sp.full_open) {
                    ValveState::Open
                } else if polarity.closes_past(pressure, previous_pressure) {
                    ValveState::Transitioning
                } else {
                    self
                }
            }
            ValveState::Closing => {
                if polarity.closes_past(pressure, sp.reseat) {
                    ValveState::Closed
                } else if polarity.opens_past(pressure, previous_pressure) {
                    ValveState::Transitioning
                } else {
                    self
                }
            }
            ValveState::Transitioning => {
                let closing_at = curve.pressure_at(Direction::Closing, position);
                let opening_at = curve.pressure_at(Direction::Opening, position);
                if polarity.closes_past(pressure, closing_at) {
                    ValveState::Closing
                } else if polarity.opens_past(pressure, opening_at) {
                    ValveState::Opening
                } else {
                    self
                }
            }
            _ => self,
        }
    }

    /// Raw position command for this state; `held` is returned where the
    /// state freezes position.
    pub fn command(self, pressure: f64, held: f64, curve: &dyn ValveCharacteristic) -> f64 {
        match self {
            ValveState::Closed => 0.0,
            ValveState::Open => 1.0,
            ValveState::Opening => curve.position(Direction::Opening, pressure),
            ValveState::Closing => curve.position(Direction::Closing, pressure),
            ValveState::Transitioning | ValveState::Invalid(_) => held,
        }
    }
}

impl fmt::Display for ValveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValveState::Closed => write!(f, "closed"),
            ValveState::Open => write!(f, "open"),
            ValveState::Opening => write!(f, "opening"),
            ValveState::Closing => write!(f, "closing"),
            ValveState::Transitioning => write!(f, "transitioning"),
            ValveState::Invalid(code) => write!(f, "invalid({code})"),
        }
    }
}
