//! Pressure-sensitive valve: one step of control pressure → state → position → admittance.

use crate::characteristic::PopCurve;
use crate::conductance::ConductanceModel;
use crate::config::{ValveConfig, ValveInput};
use crate::error::{ValveError, ValveResult};
use crate::malfunction::{Malfunctions, PositionOverride};
use crate::slew::{SlewLimiter, reconcile};
use crate::state::ValveState;
use crate::traits::{PortStates, SensedPotentials, ValveCharacteristic};
use nalgebra::{Matrix2, Vector2};
use tracing::{debug, info, trace};
use vn_fluids::FlowRelation;

/// Flows through the valve for the last solved potentials.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowSummary {
    /// Port 0 minus port 1 (kPa)
    pub delta_potential: f64,
    /// kmol/s, positive from port 0 to port 1
    pub flux: f64,
    /// kg/s
    pub mass_rate: f64,
    /// m³/s
    pub volumetric_rate: f64,
}

/// A valve whose position is driven by a sensed pressure differential.
///
/// Regulators open as the control pressure falls below crack; relief valves
/// open as it rises above crack. Position follows a pop-then-nominal
/// characteristic with hysteresis on reversal, is slew limited, and sets the
/// conductance the valve contributes to the network.
///
/// # Example
///
/// ```
/// use vn_core::units::{k, kpa};
/// use vn_fluids::{FluidState, SquareRootLaw};
/// use vn_valve::{
///     Polarity, PortStates, PressureSensitiveValve, SensedPotentials, ValveConfig, ValveInput,
///     ValveState,
/// };
///
/// let config = ValveConfig::new("reg", Polarity::Regulator, 1.0, 2.0, 3.0)
///     .with_max_conductivity(1.0e-4);
/// let mut valve = PressureSensitiveValve::new(config, ValveInput::default()).unwrap();
/// assert_eq!(valve.state(), ValveState::Closed);
///
/// let inlet = FluidState::ideal_gas(kpa(300.0), k(300.0), 28.0).unwrap();
/// let outlet = FluidState::ideal_gas(kpa(100.0), k(300.0), 28.0).unwrap();
/// let ports = PortStates { inlet: &inlet, outlet: &outlet };
///
/// // Sensed differential below crack: the valve starts to open.
/// valve.step(SensedPotentials::new(101.5, 100.0), ports, &SquareRootLaw, 0.1);
/// assert_eq!(valve.state(), ValveState::Opening);
/// assert!(valve.position() > 0.0);
/// assert!(valve.system_conductance() > 0.0);
/// ```
#[derive(Debug)]
pub struct PressureSensitiveValve {
    config: ValveConfig,
    characteristic: Box<dyn ValveCharacteristic>,
    slew: SlewLimiter,
    state: ValveState,
    position: f64,
    /// kPa
    setpoint_bias: f64,
    malfunctions: Malfunctions,
    /// kPa
    control_pressure: f64,
    /// None until the first step
    previous_control_pressure: Option<f64>,
    conductance: ConductanceModel,
    flows: FlowSummary,
}

impl PressureSensitiveValve {
    /// Validate `config` and `input`, derive the pop characteristic and set
    /// the initial state from the initial position.
    pub fn new(config: ValveConfig, input: ValveInput) -> ValveResult<Self> {
        config.validate()?;
        let curve = PopCurve::derive(&config.name, config.setpoints())?;
        Self::with_characteristic(config, input, Box::new(curve))
    }

    /// Build with a caller-supplied characteristic.
    ///
    /// The characteristic must have been built from `config`'s setpoints,
    /// since the state machine reads its thresholds from the characteristic.
    pub fn with_characteristic(
        config: ValveConfig,
        input: ValveInput,
        characteristic: Box<dyn ValveCharacteristic>,
    ) -> ValveResult<Self> {
        config.validate()?;
        if *characteristic.setpoints() != config.setpoints() {
            return Err(ValveError::InvalidArg {
                what: "characteristic setpoints differ from the configuration",
            });
        }
        input.validate(&config.name)?;
        let slew = SlewLimiter::new(config.rate_limit)?;
        let state = ValveState::from_position(input.position);
        let conductance = ConductanceModel::new(
            config.max_conductivity,
            config.min_linearization_potential,
            config.conductance_limit,
        );

        info!(
            valve = %config.name,
            polarity = ?config.polarity,
            state = %state,
            position = input.position,
            "valve initialized"
        );

        Ok(Self {
            config,
            characteristic,
            slew,
            state,
            position: input.position,
            setpoint_bias: input.setpoint_bias,
            malfunctions: input.malfunctions,
            control_pressure: 0.0,
            previous_control_pressure: None,
            conductance,
            flows: FlowSummary::default(),
        })
    }

    /// Replace this valve with a freshly initialized one.
    ///
    /// On error the current valve is left untouched.
    pub fn reinitialize(&mut self, config: ValveConfig, input: ValveInput) -> ValveResult<()> {
        let fresh = Self::new(config, input)?;
        *self = fresh;
        Ok(())
    }

    /// Advance one tick of `dt` seconds.
    ///
    /// Never fails: any malfunction input yields a defined, possibly
    /// zero-conductance, result.
    pub fn step(
        &mut self,
        sensed: SensedPotentials,
        ports: PortStates<'_>,
        relation: &dyn FlowRelation,
        dt: f64,
    ) {
        self.control_pressure =
            sensed.delta() + self.malfunctions.pressure_bias() - self.setpoint_bias;
        let previous = self
            .previous_control_pressure
            .unwrap_or(self.control_pressure);

        let curve = self.characteristic.as_ref();
        let next = self
            .state
            .transition(self.control_pressure, previous, self.position, curve);
        if next != self.state {
            debug!(
                valve = %self.config.name,
                from = %self.state,
                to = %next,
                control_pressure = self.control_pressure,
                position = self.position,
                "valve state transition"
            );
            self.state = next;
        }

        match self.malfunctions.position_override() {
            PositionOverride::Frozen => {}
            PositionOverride::Forced(position) => self.position = position,
            PositionOverride::Free => {
                if let ValveState::Invalid(code) = self.state {
                    trace!(valve = %self.config.name, code, "invalid state holds position");
                }
                let command = self
                    .state
                    .command(self.control_pressure, self.position, curve);
                self.position = self.slew.limit(self.position, command, dt);
                self.state = reconcile(self.state, self.position);
            }
        }

        self.previous_control_pressure = Some(self.control_pressure);
        self.conductance.update(
            &self.config.name,
            self.position,
            &self.malfunctions,
            relation,
            ports,
        );
    }

    /// Flows for the solved port potentials (kPa), upwinded on the flux sign.
    pub fn compute_flows(&mut self, potentials: [f64; 2], ports: PortStates<'_>) -> FlowSummary {
        let delta_potential = potentials[0] - potentials[1];
        let flux = delta_potential * self.conductance.system_conductance();
        let upstream = if flux >= 0.0 {
            ports.inlet
        } else {
            ports.outlet
        };
        let mass_rate = flux * upstream.molecular_weight();
        let density = upstream.density_kg_m3();
        let volumetric_rate = if density > 0.0 {
            mass_rate / density
        } else {
            0.0
        };
        self.flows = FlowSummary {
            delta_potential,
            flux,
            mass_rate,
            volumetric_rate,
        };
        self.flows
    }

    // Runtime inputs. None of these are validated.

    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    pub fn set_setpoint_bias(&mut self, bias: f64) {
        self.setpoint_bias = bias;
    }

    pub fn set_leak_through(&mut self, active: bool, rate: f64) {
        self.malfunctions.leak_through.active = active;
        self.malfunctions.leak_through.value = rate;
    }

    pub fn set_pressure_bias(&mut self, active: bool, bias: f64) {
        self.malfunctions.pressure_bias.active = active;
        self.malfunctions.pressure_bias.value = bias;
    }

    pub fn set_stuck(&mut self, active: bool) {
        self.malfunctions.stuck = active;
    }

    pub fn set_fail_to(&mut self, active: bool, position: f64) {
        self.malfunctions.fail_to.active = active;
        self.malfunctions.fail_to.value = position;
    }

    pub fn set_blockage(&mut self, active: bool, fraction: f64) {
        self.malfunctions.blockage.active = active;
        self.malfunctions.blockage.value = fraction;
    }

    pub fn malfunctions_mut(&mut self) -> &mut Malfunctions {
        &mut self.malfunctions
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ValveConfig {
        &self.config
    }

    pub fn characteristic(&self) -> &dyn ValveCharacteristic {
        self.characteristic.as_ref()
    }

    pub fn state(&self) -> ValveState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn setpoint_bias(&self) -> f64 {
        self.setpoint_bias
    }

    pub fn malfunctions(&self) -> &Malfunctions {
        &self.malfunctions
    }

    /// Bias-adjusted control pressure from the last step (kPa).
    pub fn control_pressure(&self) -> f64 {
        self.control_pressure
    }

    pub fn previous_control_pressure(&self) -> Option<f64> {
        self.previous_control_pressure
    }

    pub fn conductance(&self) -> &ConductanceModel {
        &self.conductance
    }

    pub fn system_conductance(&self) -> f64 {
        self.conductance.system_conductance()
    }

    pub fn admittance(&self) -> &Matrix2<f64> {
        self.conductance.admittance()
    }

    pub fn source(&self) -> &Vector2<f64> {
        self.conductance.source()
    }

    pub fn admittance_updated(&self) -> bool {
        self.conductance.admittance_updated()
    }

    pub fn acknowledge_admittance(&mut self) {
        self.conductance.acknowledge_admittance();
    }

    pub fn flows(&self) -> FlowSummary {
        self.flows
    }
}
