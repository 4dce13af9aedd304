//! Error types for the simulation harness.

use crate::scenario::ScenarioError;
use thiserror::Error;
use vn_core::VnError;
use vn_fluids::FluidError;
use vn_valve::ValveError;

/// Errors encountered while building or running a valve bank.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Valve error: {0}")]
    Valve(#[from] ValveError),

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Core(#[from] VnError),
}

pub type SimResult<T> = Result<T, SimError>;
