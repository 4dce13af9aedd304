//! Scenario runner and result recording.

use crate::bank::{BankEntry, ValveBank};
use crate::error::SimResult;
use crate::scenario::{ActionDef, EventDef, Scenario, validate_scenario};
use nalgebra::DMatrix;
use tracing::{debug, info, warn};
use vn_core::NameRegistry;
use vn_core::units::{k, kpa};
use vn_fluids::{FluidState, SquareRootLaw};
use vn_valve::{PressureSensitiveValve, ValveState};

/// One valve at one recorded time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValveSample {
    pub state: ValveState,
    pub position: f64,
    /// kPa
    pub control_pressure: f64,
    /// kmol/(s·kPa)
    pub conductance: f64,
    /// kg/s
    pub mass_rate: f64,
}

impl ValveSample {
    fn of(valve: &PressureSensitiveValve) -> Self {
        Self {
            state: valve.state(),
            position: valve.position(),
            control_pressure: valve.control_pressure(),
            conductance: valve.system_conductance(),
            mass_rate: valve.flows().mass_rate,
        }
    }
}

/// Record of a scenario run.
#[derive(Clone, Debug)]
pub struct SimRecord {
    /// Valve names, in sample order
    pub valves: Vec<String>,
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// `samples[i][j]` is valve `j` at `t[i]`
    pub samples: Vec<Vec<ValveSample>>,
    /// Steps on which the network matrix had to be re-factored
    pub refactor_steps: usize,
    /// Network admittance after the last step
    pub admittance: DMatrix<f64>,
}

impl SimRecord {
    /// Time series of one valve.
    pub fn series(&self, valve: &str) -> Option<Vec<(f64, ValveSample)>> {
        let j = self.valves.iter().position(|v| v == valve)?;
        Some(
            self.t
                .iter()
                .zip(&self.samples)
                .map(|(&t, row)| (t, row[j]))
                .collect(),
        )
    }

    /// Last recorded sample of one valve.
    pub fn last(&self, valve: &str) -> Option<ValveSample> {
        let j = self.valves.iter().position(|v| v == valve)?;
        self.samples.last().map(|row| row[j])
    }

    /// CSV with one row per recorded time and five columns per valve.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("time_s");
        for name in &self.valves {
            csv.push_str(&format!(
                ",{name}.state,{name}.position,{name}.control_pressure_kpa,{name}.conductance,{name}.mass_rate_kgps"
            ));
        }
        csv.push('\n');
        for (t, row) in self.t.iter().zip(&self.samples) {
            csv.push_str(&t.to_string());
            for s in row {
                csv.push_str(&format!(
                    ",{},{},{},{},{}",
                    s.state, s.position, s.control_pressure, s.conductance, s.mass_rate
                ));
            }
            csv.push('\n');
        }
        csv
    }
}

fn node_fluids(scenario: &Scenario, potentials: &[f64]) -> SimResult<Vec<FluidState>> {
    let t = k(scenario.fluid.temperature_k);
    let mw = scenario.fluid.molecular_weight;
    let fluids = potentials
        .iter()
        .map(|&p| FluidState::ideal_gas(kpa(p), t, mw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(fluids)
}

fn apply_event(bank: &mut ValveBank, event: &EventDef) {
    let name = event.action.valve();
    let Some(entry) = bank.get_mut(name) else {
        warn!(valve = name, time_s = event.time_s, "event references unknown valve");
        return;
    };
    let valve = &mut entry.valve;
    match event.action {
        ActionDef::SetLeakThrough {
            active, rate_kgps, ..
        } => valve.set_leak_through(active, rate_kgps),
        ActionDef::SetPressureBias {
            active, bias_kpa, ..
        } => valve.set_pressure_bias(active, bias_kpa),
        ActionDef::SetStuck { active, .. } => valve.set_stuck(active),
        ActionDef::SetFailTo {
            active, position, ..
        } => valve.set_fail_to(active, position),
        ActionDef::SetBlockage {
            active, fraction, ..
        } => valve.set_blockage(active, fraction),
        ActionDef::SetPosition { position, .. } => valve.set_position(position),
        ActionDef::SetSetpointBias { bias_kpa, .. } => valve.set_setpoint_bias(bias_kpa),
    }
    debug!(valve = name, time_s = event.time_s, action = ?event.action, "event applied");
}

/// Build the valve bank for a validated scenario.
pub fn build_bank(scenario: &Scenario) -> SimResult<ValveBank> {
    let mut nodes = NameRegistry::new();
    for node in &scenario.nodes {
        nodes.insert(&node.id)?;
    }
    let mut bank = ValveBank::new(nodes.len());
    for def in &scenario.valves {
        let valve = PressureSensitiveValve::new(def.config.clone(), def.input.clone())?;
        let ports = [
            nodes.resolve(&def.ports[0], "node")?,
            nodes.resolve(&def.ports[1], "node")?,
        ];
        let sense = [
            nodes.resolve(&def.sense[0], "node")?,
            nodes.resolve(&def.sense[1], "node")?,
        ];
        bank.push(BankEntry {
            valve,
            ports,
            sense,
        })?;
    }
    Ok(bank)
}

/// Run a scenario with fixed steps of `dt_s` until `t_end_s`.
///
/// Events fire at the start of the first step whose start time is at or past
/// the event time. Node potentials are taken at the end of each step.
pub fn run_scenario(scenario: &Scenario) -> SimResult<SimRecord> {
    validate_scenario(scenario)?;
    let mut bank = build_bank(scenario)?;
    let relation = SquareRootLaw;

    let mut events: Vec<&EventDef> = scenario.events.iter().collect();
    events.sort_by(|a, b| a.time_s.total_cmp(&b.time_s));
    let mut pending = events.into_iter().peekable();

    let dt = scenario.dt_s;
    // Tolerate rounding in t_end / dt so 1.1 / 0.1 is 11 steps, not 12
    let total_steps = (scenario.t_end_s / dt - 1.0e-9).ceil().max(0.0) as usize;
    info!(
        scenario = %scenario.name,
        valves = bank.len(),
        steps = total_steps,
        "scenario started"
    );

    let snapshot = |bank: &ValveBank| -> Vec<ValveSample> {
        bank.entries()
            .iter()
            .map(|e| ValveSample::of(&e.valve))
            .collect()
    };

    let mut t_record = vec![0.0];
    let mut samples = vec![snapshot(&bank)];
    let mut refactor_steps = 0;
    let mut admittance = DMatrix::zeros(bank.node_count(), bank.node_count());

    for step in 1..=total_steps {
        let t_start = (step - 1) as f64 * dt;
        let t = step as f64 * dt;
        while let Some(event) = pending.next_if(|e| e.time_s <= t_start) {
            apply_event(&mut bank, event);
        }

        let potentials: Vec<f64> = scenario
            .nodes
            .iter()
            .map(|n| n.pressure_kpa.value_at(t))
            .collect();
        let fluids = node_fluids(scenario, &potentials)?;

        bank.step(&potentials, &fluids, &relation, dt)?;
        if bank.needs_refactor() {
            admittance = bank.assemble().0;
            refactor_steps += 1;
            bank.acknowledge();
        }
        bank.compute_flows(&potentials, &fluids)?;

        if step % scenario.record_every == 0 {
            t_record.push(t);
            samples.push(snapshot(&bank));
        }
    }

    // Always record final state
    if total_steps % scenario.record_every != 0 {
        t_record.push(total_steps as f64 * dt);
        samples.push(snapshot(&bank));
    }

    info!(
        scenario = %scenario.name,
        records = t_record.len(),
        refactor_steps,
        "scenario finished"
    );

    Ok(SimRecord {
        valves: bank
            .entries()
            .iter()
            .map(|e| e.valve.name().to_string())
            .collect(),
        t: t_record,
        samples,
        refactor_steps,
        admittance,
    })
}
