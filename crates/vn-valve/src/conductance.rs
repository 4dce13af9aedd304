//! Position → conductivity → network admittance.

use crate::malfunction::Malfunctions;
use crate::traits::PortStates;
use nalgebra::{Matrix2, Vector2};
use tracing::debug;
use vn_core::numeric::limit_range;
use vn_fluids::FlowRelation;

/// Conductance state of one two-port link.
///
/// The 2×2 admittance block is `[[G, -G], [-G, G]]` with `G` the system
/// conductance. It is rewritten only when `G` changes, and
/// [`admittance_updated`](Self::admittance_updated) tells the solver when it
/// must re-factor.
#[derive(Debug, Clone)]
pub struct ConductanceModel {
    /// m²
    max_conductivity: f64,
    /// kPa
    min_linearization_potential: f64,
    conductance_limit: f64,
    leak_conductivity: f64,
    /// Leak target (kg/s) the cached leak conductivity was computed for
    previous_leak_rate: f64,
    effective_conductivity: f64,
    system_conductance: f64,
    admittance: Matrix2<f64>,
    source: Vector2<f64>,
    admittance_update: bool,
}

impl ConductanceModel {
    pub fn new(
        max_conductivity: f64,
        min_linearization_potential: f64,
        conductance_limit: f64,
    ) -> Self {
        Self {
            max_conductivity,
            min_linearization_potential,
            conductance_limit,
            leak_conductivity: 0.0,
            previous_leak_rate: 0.0,
            effective_conductivity: 0.0,
            system_conductance: 0.0,
            admittance: Matrix2::zeros(),
            source: Vector2::zeros(),
            admittance_update: false,
        }
    }

    /// Refresh conductivities and the admittance block for `position`.
    pub fn update(
        &mut self,
        name: &str,
        position: f64,
        malfunctions: &Malfunctions,
        relation: &dyn FlowRelation,
        ports: PortStates<'_>,
    ) {
        self.update_leak(name, malfunctions, relation, ports);

        self.effective_conductivity =
            (self.max_conductivity * position).max(self.leak_conductivity);
        if malfunctions.blockage.active {
            self.effective_conductivity *= malfunctions.blockage_factor();
        }

        let g = relation.conductance(
            self.effective_conductivity,
            self.min_linearization_potential,
            ports.inlet,
            ports.outlet,
        );
        self.system_conductance = limit_range(0.0, g, self.conductance_limit);
        self.build_admittance();
    }

    /// Recompute leak conductivity only when the leak target changes.
    fn update_leak(
        &mut self,
        name: &str,
        malfunctions: &Malfunctions,
        relation: &dyn FlowRelation,
        ports: PortStates<'_>,
    ) {
        match malfunctions.leak_through.active_value() {
            Some(rate) => {
                if rate != self.previous_leak_rate {
                    self.leak_conductivity = relation.conductivity_for_flow(
                        rate,
                        self.min_linearization_potential,
                        ports.inlet,
                        ports.outlet,
                    );
                    self.previous_leak_rate = rate;
                    debug!(
                        valve = name,
                        leak_rate = rate,
                        leak_conductivity = self.leak_conductivity,
                        "leak conductivity recomputed"
                    );
                }
            }
            None => {
                self.previous_leak_rate = 0.0;
                self.leak_conductivity = 0.0;
            }
        }
    }

    /// Rewrite the admittance block if the system conductance moved.
    pub fn build_admittance(&mut self) {
        let g = self.system_conductance;
        if self.admittance[(0, 0)] != g {
            self.admittance = Matrix2::new(g, -g, -g, g);
            self.admittance_update = true;
        }
    }

    pub fn admittance(&self) -> &Matrix2<f64> {
        &self.admittance
    }

    /// Source vector; a passive valve contributes none.
    pub fn source(&self) -> &Vector2<f64> {
        &self.source
    }

    /// True if the admittance block changed since the solver last acknowledged it.
    pub fn admittance_updated(&self) -> bool {
        self.admittance_update
    }

    /// Called by the solver once the new block has been consumed.
    pub fn acknowledge_admittance(&mut self) {
        self.admittance_update = false;
    }

    pub fn max_conductivity(&self) -> f64 {
        self.max_conductivity
    }

    pub fn min_linearization_potential(&self) -> f64 {
        self.min_linearization_potential
    }

    pub fn leak_conductivity(&self) -> f64 {
        self.leak_conductivity
    }

    pub fn effective_conductivity(&self) -> f64 {
        self.effective_conductivity
    }

    pub fn system_conductance(&self) -> f64 {
        self.system_conductance
    }
}
