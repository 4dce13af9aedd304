//! Fault injection overlay.
//!
//! Every field is externally settable at any time and never range-checked,
//! so nonsensical values can be injected on purpose.

use serde::{Deserialize, Serialize};
use vn_core::numeric::limit_range;

/// A malfunction flag with its value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Toggle {
    pub active: bool,
    #[serde(default)]
    pub value: f64,
}

impl Toggle {
    pub fn new(active: bool, value: f64) -> Self {
        Self { active, value }
    }

    /// The value when active.
    pub fn active_value(&self) -> Option<f64> {
        self.active.then_some(self.value)
    }
}

/// Active faults on one valve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Malfunctions {
    /// Target leak mass flow through the closed valve (kg/s)
    pub leak_through: Toggle,
    /// Added to the sensed control pressure (kPa)
    pub pressure_bias: Toggle,
    /// Freezes position
    pub stuck: bool,
    /// Forces position to `value`, clamped to [0, 1]
    pub fail_to: Toggle,
    /// Fraction of effective conductivity removed
    pub blockage: Toggle,
}

/// How the malfunctions constrain this step's position update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionOverride {
    /// Stuck: no position update at all.
    Frozen,
    /// Fail-to: position set outright, bypassing the slew limiter.
    Forced(f64),
    /// Normal characteristic + slew limiting.
    Free,
}

impl Malfunctions {
    /// Stuck wins over fail-to; fail-to wins over the computed command.
    pub fn position_override(&self) -> PositionOverride {
        if self.stuck {
            PositionOverride::Frozen
        } else if let Some(target) = self.fail_to.active_value() {
            PositionOverride::Forced(limit_range(0.0, target, 1.0))
        } else {
            PositionOverride::Free
        }
    }

    /// Bias added to the control pressure (kPa), 0 when inactive.
    pub fn pressure_bias(&self) -> f64 {
        self.pressure_bias.active_value().unwrap_or(0.0)
    }

    /// Multiplier applied to effective conductivity.
    pub fn blockage_factor(&self) -> f64 {
        self.blockage.active_value().map_or(1.0, |b| 1.0 - b)
    }

    /// True when nothing is active.
    pub fn is_nominal(&self) -> bool {
        !(self.leak_through.active
            || self.pressure_bias.active
            || self.stuck
            || self.fail_to.active
            || self.blockage.active)
    }
}
