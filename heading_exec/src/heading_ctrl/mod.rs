//! # Heading control module
//!
//! This module provides the profiled feedback controller used to turn the
//! rover's heading onto a target. The setpoint given to the PID law is not
//! the target itself but a trapezoidal motion profile moving towards it, so
//! that the commanded angular velocity ramps rather than jumps.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controller;
mod profile;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use controller::*;
pub use profile::*;
