//! Fluid state snapshots seen by a link's ports.

use crate::error::{FluidError, FluidResult};
use vn_core::constants::UNIVERSAL_GAS_CONSTANT;
use vn_core::units::{Density, Pressure, Temperature, kg_per_m3, kpa, to_kpa};

/// Read-only fluid state at one node.
///
/// Holds the handful of properties the valve core and its flow bookkeeping
/// read: pressure, temperature, density and molecular weight. How these were
/// produced (equation of state, mixture rules) is the network's business.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidState {
    p: Pressure,
    t: Temperature,
    rho: Density,
    /// Molecular weight [kg/kmol]
    mw: f64,
}

impl FluidState {
    /// Create a state from explicit properties.
    ///
    /// Validates that every property is positive and finite.
    pub fn new(p: Pressure, t: Temperature, rho: Density, mw: f64) -> FluidResult<Self> {
        positive(p.value, "pressure")?;
        positive(t.value, "temperature")?;
        positive(rho.value, "density")?;
        positive(mw, "molecular weight")?;
        Ok(Self { p, t, rho, mw })
    }

    /// Create a state whose density follows the ideal gas law.
    pub fn ideal_gas(p: Pressure, t: Temperature, mw: f64) -> FluidResult<Self> {
        positive(p.value, "pressure")?;
        positive(t.value, "temperature")?;
        positive(mw, "molecular weight")?;
        let rho = to_kpa(p) * mw / (UNIVERSAL_GAS_CONSTANT * t.value);
        Self::new(p, t, kg_per_m3(rho), mw)
    }

    /// Same fluid at a different pressure, density rescaled at constant temperature.
    pub fn at_pressure_kpa(&self, p_kpa: f64) -> FluidResult<Self> {
        Self::ideal_gas(kpa(p_kpa), self.t, self.mw)
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    /// Pressure in kPa.
    pub fn pressure_kpa(&self) -> f64 {
        to_kpa(self.p)
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    pub fn density(&self) -> Density {
        self.rho
    }

    /// Density in kg/m³.
    pub fn density_kg_m3(&self) -> f64 {
        self.rho.value
    }

    /// Molecular weight in kg/kmol.
    pub fn molecular_weight(&self) -> f64 {
        self.mw
    }
}

fn positive(value: f64, what: &'static str) -> FluidResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FluidError::NonPhysical { what, value });
    }
    Ok(())
}
