//! # Heading lock library.
//!
//! This library allows other crates in the workspace to access items defined inside the heading
//! lock crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Heading lock command - keeps the rover pointed at the target while the driver translates
pub mod head_lock;

/// Heading control module - profiled PID control of the bearing to the target
pub mod heading_ctrl;

/// Simulation - kinematic rover and camera for running the heading lock without hardware
pub mod sim;

/// Tuning - live-editable values shared with external tuning tools
pub mod tuning;
