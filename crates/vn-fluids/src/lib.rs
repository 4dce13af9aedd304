//! vn-fluids: fluid-side contract for valvenet links.
//!
//! Provides:
//! - `FluidState`: read-only node state (pressure, temperature, density,
//!   molecular weight)
//! - `FlowRelation`: conductivity ↔ conductance and target-flow → conductivity
//!   conversions consumed by links
//! - `SquareRootLaw`: reference orifice-style relation
//!
//! # Example
//!
//! ```
//! use vn_fluids::{FlowRelation, FluidState, SquareRootLaw};
//! use vn_core::units::{k, kpa};
//!
//! let inlet = FluidState::ideal_gas(kpa(200.0), k(300.0), 28.0134).unwrap();
//! let outlet = FluidState::ideal_gas(kpa(100.0), k(300.0), 28.0134).unwrap();
//!
//! let g = SquareRootLaw.conductance(1.0e-4, 1.0, &inlet, &outlet);
//! assert!(g > 0.0);
//! ```

pub mod error;
pub mod relation;
pub mod state;

// Re-exports for ergonomics
pub use error::{FluidError, FluidResult};
pub use relation::{FlowRelation, SquareRootLaw};
pub use state::FluidState;
