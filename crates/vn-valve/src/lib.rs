//! vn-valve: pressure-sensitive valve core.
//!
//! Provides:
//! - `PopCurve`: pop-then-nominal characteristic derived from the setpoints
//! - `ValveState`: five-state automaton with hysteresis
//! - `SlewLimiter`: rate-limited position updates
//! - `Malfunctions`: leak-through, pressure bias, stuck, fail-to and blockage
//! - `ConductanceModel`: position to conductivity to 2×2 admittance block
//! - `PressureSensitiveValve`: step orchestration tying these together
//!
//! Only initialization can fail. Stepping is infallible and deterministic, so
//! independent valves may be stepped on separate threads.
//!
//! # Example
//!
//! ```
//! use vn_valve::{Direction, PopCurve, Polarity, ValveCharacteristic, ValveConfig};
//!
//! let config = ValveConfig::new("reg", Polarity::Regulator, 1.0, 2.0, 3.0);
//! let curve = PopCurve::derive(&config.name, config.setpoints()).unwrap();
//!
//! assert_eq!(curve.position(Direction::Opening, 2.0), 0.0);
//! assert_eq!(curve.position(Direction::Opening, 1.0), 1.0);
//! assert_eq!(curve.pop_segment(Direction::Opening).slope(), -4.0);
//! ```

pub mod characteristic;
pub mod common;
pub mod conductance;
pub mod config;
pub mod error;
pub mod malfunction;
pub mod slew;
pub mod state;
pub mod traits;
pub mod valve;

// Re-exports
pub use characteristic::{PopCurve, Segment};
pub use conductance::ConductanceModel;
pub use config::{Direction, Polarity, PressureTrend, Setpoints, ValveConfig, ValveInput};
pub use error::{ValveError, ValveResult};
pub use malfunction::{Malfunctions, PositionOverride, Toggle};
pub use slew::{SlewLimiter, reconcile};
pub use state::ValveState;
pub use traits::{PortStates, SensedPotentials, ValveCharacteristic};
pub use valve::{FlowSummary, PressureSensitiveValve};
