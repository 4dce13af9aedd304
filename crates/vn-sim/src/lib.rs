//! Step-driven harness for banks of pressure-sensitive valves.
//!
//! Provides:
//! - `ValveBank`: independent valves stepped in parallel, with their admittance
//!   blocks stamped into one network matrix
//! - `Schedule`: piecewise-linear boundary potentials
//! - `Scenario`: YAML/JSON scenario files with timed fault events
//! - `run_scenario`: fixed-step runner producing a `SimRecord`
//!
//! There is no network solve here; node potentials come from schedules.

pub mod bank;
pub mod error;
pub mod scenario;
pub mod schedule;
pub mod sim;

// Re-exports for public API
pub use bank::{BankEntry, ValveBank};
pub use error::{SimError, SimResult};
pub use scenario::{
    ActionDef, EventDef, FluidDef, NodeDef, Scenario, ScenarioError, ScenarioResult, ValveDef,
    load, load_json, load_yaml, validate_scenario,
};
pub use schedule::Schedule;
pub use sim::{SimRecord, ValveSample, build_bank, run_scenario};
