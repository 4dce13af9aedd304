//! Valve configuration and initial input data.
//!
//! Configuration is set once and validated at initialization. Input data
//! seeds the runtime-mutable surface (position, setpoint bias, malfunctions).

use crate::common::{
    DEFAULT_CONDUCTANCE_LIMIT, DEFAULT_MIN_LINEARIZATION_POTENTIAL, DEFAULT_RATE_LIMIT,
    check_finite, require,
};
use crate::error::ValveResult;
use crate::malfunction::Malfunctions;
use serde::{Deserialize, Serialize};
use vn_core::PRESSURE_EPSILON;

/// Which way control pressure must move to open the valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// Opens as control pressure falls: `0 < full_open < crack < reseat`.
    #[default]
    Regulator,
    /// Opens as control pressure rises: `reseat < crack < full_open`.
    Relief,
}

/// Direction of valve travel along a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Opening,
    Closing,
}

/// Direction of control pressure change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressureTrend {
    Increasing,
    Decreasing,
}

impl Polarity {
    /// True when `pressure` lies past `threshold` on the opening side.
    pub fn opens_past(self, pressure: f64, threshold: f64) -> bool {
        match self {
            Polarity::Regulator => pressure < threshold,
            Polarity::Relief => pressure > threshold,
        }
    }

    /// True when `pressure` lies past `threshold` on the closing side.
    pub fn closes_past(self, pressure: f64, threshold: f64) -> bool {
        match self {
            Polarity::Regulator => pressure > threshold,
            Polarity::Relief => pressure < threshold,
        }
    }

    /// Travel direction driven by a pressure trend.
    pub fn direction(self, trend: PressureTrend) -> Direction {
        match (self, trend) {
            (Polarity::Regulator, PressureTrend::Decreasing)
            | (Polarity::Relief, PressureTrend::Increasing) => Direction::Opening,
            _ => Direction::Closing,
        }
    }
}

/// The setpoints a pop characteristic is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoints {
    pub polarity: Polarity,
    /// Control pressure at which a closing valve reaches position 0 (kPa)
    pub reseat: f64,
    /// Control pressure at which a closed valve starts to open (kPa)
    pub crack: f64,
    /// Control pressure at which position saturates at 1 (kPa)
    pub full_open: f64,
    /// Position where the pop segment hands over to the nominal segment
    pub pop_position: f64,
    /// Pop segment slope relative to a straight crack→full-open line
    pub pop_slope_scale: f64,
}

impl Setpoints {
    /// Check the ordering invariants that keep the derivation non-degenerate.
    pub fn validate(&self, valve: &str) -> ValveResult<()> {
        check_finite(valve, "reseat_pressure", self.reseat)?;
        check_finite(valve, "crack_pressure", self.crack)?;
        check_finite(valve, "full_open_pressure", self.full_open)?;
        check_finite(valve, "pop_position", self.pop_position)?;
        check_finite(valve, "pop_slope_scale", self.pop_slope_scale)?;

        require(
            self.full_open > PRESSURE_EPSILON,
            valve,
            "full_open_pressure",
            self.full_open,
            "> 0",
        )?;
        match self.polarity {
            Polarity::Regulator => {
                require(
                    self.crack > self.full_open,
                    valve,
                    "crack_pressure",
                    self.crack,
                    "> full_open_pressure",
                )?;
                require(
                    self.reseat > self.crack,
                    valve,
                    "reseat_pressure",
                    self.reseat,
                    "> crack_pressure",
                )?;
            }
            Polarity::Relief => {
                require(
                    self.crack < self.full_open,
                    valve,
                    "crack_pressure",
                    self.crack,
                    "< full_open_pressure",
                )?;
                require(
                    self.reseat < self.crack,
                    valve,
                    "reseat_pressure",
                    self.reseat,
                    "< crack_pressure",
                )?;
            }
        }
        require(
            self.pop_position > 0.0 && self.pop_position < 1.0,
            valve,
            "pop_position",
            self.pop_position,
            "in (0, 1)",
        )?;
        require(
            self.pop_slope_scale >= 1.0,
            valve,
            "pop_slope_scale",
            self.pop_slope_scale,
            ">= 1",
        )?;
        Ok(())
    }
}

/// Static valve configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveConfig {
    /// Instance name, used in logs and errors
    pub name: String,
    #[serde(default)]
    pub polarity: Polarity,
    /// Conductivity at full open (m²)
    pub max_conductivity: f64,
    /// Maximum position change per second (1/s); 0 holds the valve in place
    pub rate_limit: f64,
    /// kPa
    pub reseat_pressure: f64,
    /// kPa
    pub crack_pressure: f64,
    /// kPa
    pub full_open_pressure: f64,
    pub pop_position: f64,
    pub pop_slope_scale: f64,
    /// Floor on |Δp| for flow linearization (kPa)
    #[serde(default = "default_min_linearization_potential")]
    pub min_linearization_potential: f64,
    /// Upper clamp on system conductance
    #[serde(default = "default_conductance_limit")]
    pub conductance_limit: f64,
}

fn default_min_linearization_potential() -> f64 {
    DEFAULT_MIN_LINEARIZATION_POTENTIAL
}

fn default_conductance_limit() -> f64 {
    DEFAULT_CONDUCTANCE_LIMIT
}

impl ValveConfig {
    /// Create a configuration with a pop at 10% position and 4× slope,
    /// [`DEFAULT_RATE_LIMIT`] slewing and unit max conductivity.
    pub fn new(
        name: impl Into<String>,
        polarity: Polarity,
        full_open_pressure: f64,
        crack_pressure: f64,
        reseat_pressure: f64,
    ) -> Self {
        Self {
            name: name.into(),
            polarity,
            max_conductivity: 1.0,
            rate_limit: DEFAULT_RATE_LIMIT,
            reseat_pressure,
            crack_pressure,
            full_open_pressure,
            pop_position: 0.1,
            pop_slope_scale: 4.0,
            min_linearization_potential: DEFAULT_MIN_LINEARIZATION_POTENTIAL,
            conductance_limit: DEFAULT_CONDUCTANCE_LIMIT,
        }
    }

    pub fn with_pop(mut self, pop_position: f64, pop_slope_scale: f64) -> Self {
        self.pop_position = pop_position;
        self.pop_slope_scale = pop_slope_scale;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: f64) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_max_conductivity(mut self, max_conductivity: f64) -> Self {
        self.max_conductivity = max_conductivity;
        self
    }

    pub fn setpoints(&self) -> Setpoints {
        Setpoints {
            polarity: self.polarity,
            reseat: self.reseat_pressure,
            crack: self.crack_pressure,
            full_open: self.full_open_pressure,
            pop_position: self.pop_position,
            pop_slope_scale: self.pop_slope_scale,
        }
    }

    /// Validate every configuration field.
    pub fn validate(&self) -> ValveResult<()> {
        let name = self.name.as_str();
        self.setpoints().validate(name)?;

        check_finite(name, "max_conductivity", self.max_conductivity)?;
        require(
            self.max_conductivity >= 0.0,
            name,
            "max_conductivity",
            self.max_conductivity,
            ">= 0",
        )?;
        check_finite(name, "rate_limit", self.rate_limit)?;
        require(
            self.rate_limit >= 0.0,
            name,
            "rate_limit",
            self.rate_limit,
            ">= 0",
        )?;
        check_finite(
            name,
            "min_linearization_potential",
            self.min_linearization_potential,
        )?;
        require(
            self.min_linearization_potential > 0.0,
            name,
            "min_linearization_potential",
            self.min_linearization_potential,
            "> 0",
        )?;
        require(
            self.conductance_limit > 0.0 && !self.conductance_limit.is_nan(),
            name,
            "conductance_limit",
            self.conductance_limit,
            "> 0",
        )?;
        Ok(())
    }
}

/// Initial runtime data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValveInput {
    /// Initial position, 0 (closed) to 1 (open)
    pub position: f64,
    /// Subtracted from the sensed pressure difference (kPa)
    #[serde(default)]
    pub setpoint_bias: f64,
    #[serde(default)]
    pub malfunctions: Malfunctions,
}

impl ValveInput {
    pub fn at_position(position: f64) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Only the initial position is checked; bias and faults are accepted as given.
    pub fn validate(&self, valve: &str) -> ValveResult<()> {
        check_finite(valve, "position", self.position)?;
        require(
            (0.0..=1.0).contains(&self.position),
            valve,
            "position",
            self.position,
            "in [0, 1]",
        )
    }
}
