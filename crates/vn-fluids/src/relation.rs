//! Conductivity ↔ admittance relations.
//!
//! A link describes its flow capacity as an area-equivalent *conductivity*
//! [m²]. The network solve needs a linearized *conductance* (admittance)
//! [kmol/(s·kPa)] at the current fluid states. Leak-through faults specify a
//! target mass flow instead, which must be mapped back to a conductivity.
//!
//! Both directions are pure numeric functions: they never fail and return 0
//! for degenerate inputs so callers can stamp the result straight into the
//! system matrix.

use crate::state::FluidState;

/// Conversion between conductivity and the quantities the network uses.
///
/// Implementations must be thread-safe so independent links can be stepped on
/// separate threads.
pub trait FlowRelation: Send + Sync {
    /// Relation name for logging.
    fn name(&self) -> &str;

    /// Linearized conductance [kmol/(s·kPa)] of `conductivity` [m²] between
    /// `inlet` and `outlet`.
    ///
    /// `min_dp_kpa` floors the pressure difference used for linearization.
    fn conductance(
        &self,
        conductivity: f64,
        min_dp_kpa: f64,
        inlet: &FluidState,
        outlet: &FluidState,
    ) -> f64;

    /// Conductivity [m²] that passes `mdot` [kg/s] between `inlet` and `outlet`.
    fn conductivity_for_flow(
        &self,
        mdot: f64,
        min_dp_kpa: f64,
        inlet: &FluidState,
        outlet: &FluidState,
    ) -> f64;
}

/// Square-root orifice law: `mdot = C·sqrt(1000·ρ·Δp)`.
///
/// ρ is the mean of the two port densities and Δp is in kPa (the factor 1000
/// converts to Pa). The conductance is `mdot / (MW·Δp)` with MW the mean
/// molecular weight, giving kmol/(s·kPa).
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareRootLaw;

impl SquareRootLaw {
    pub fn new() -> Self {
        Self
    }

    fn linearization_dp(min_dp_kpa: f64, inlet: &FluidState, outlet: &FluidState) -> f64 {
        (inlet.pressure_kpa() - outlet.pressure_kpa())
            .abs()
            .max(min_dp_kpa)
    }

    fn mean_density(inlet: &FluidState, outlet: &FluidState) -> f64 {
        0.5 * (inlet.density_kg_m3() + outlet.density_kg_m3())
    }
}

impl FlowRelation for SquareRootLaw {
    fn name(&self) -> &str {
        "square-root"
    }

    fn conductance(
        &self,
        conductivity: f64,
        min_dp_kpa: f64,
        inlet: &FluidState,
        outlet: &FluidState,
    ) -> f64 {
        if conductivity <= f64::EPSILON {
            return 0.0;
        }
        let dp = Self::linearization_dp(min_dp_kpa, inlet, outlet);
        let rho = Self::mean_density(inlet, outlet);
        let mw = 0.5 * (inlet.molecular_weight() + outlet.molecular_weight());
        if dp <= 0.0 || rho <= 0.0 || mw <= 0.0 {
            return 0.0;
        }
        let g = conductivity * (1000.0 * rho / dp).sqrt() / mw;
        if g.is_finite() { g } else { 0.0 }
    }

    fn conductivity_for_flow(
        &self,
        mdot: f64,
        min_dp_kpa: f64,
        inlet: &FluidState,
        outlet: &FluidState,
    ) -> f64 {
        if mdot <= f64::EPSILON {
            return 0.0;
        }
        let dp = Self::linearization_dp(min_dp_kpa, inlet, outlet);
        let rho = Self::mean_density(inlet, outlet);
        if dp <= 0.0 || rho <= 0.0 {
            return 0.0;
        }
        let c = mdot / (1000.0 * rho * dp).sqrt();
        if c.is_finite() { c } else { 0.0 }
    }
}
