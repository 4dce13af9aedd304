//! vn-core: stable foundation for valvenet.
//!
//! Contains:
//! - units (uom SI types + constructors, kPa helpers)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for network nodes and links)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{VnError, VnResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
