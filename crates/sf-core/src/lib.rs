//! sf-core: stable foundation for sofcflow.
//!
//! Contains:
//! - units (uom SI types + constructors + physical constants)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{SfError, SfResult};
pub use numeric::*;
pub use units::*;
