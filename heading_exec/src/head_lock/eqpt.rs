//! Equipment interfaces used by the heading lock.
//!
//! The drivetrain, the vision sensor and the driver's translation demand are
//! all outside the heading lock, these traits are the contracts it expects
//! of them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A chassis velocity demand.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChassisVelocity {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Angular rate, positive anticlockwise seen from above.
    ///
    /// Units: radians/second
    pub omega_rads: f64
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A drivetrain accepting one velocity demand per cycle.
pub trait Drivetrain {
    /// Drive at the given velocity. If `field_relative` the x/y velocities
    /// are in the field frame, otherwise in the rover body frame.
    fn drive(&mut self, demand: ChassisVelocity, field_relative: bool);
}

/// A vision sensor giving the bearing to a detected target.
pub trait VisionSensor {
    /// The most recent horizontal angle from the sensor boresight to the
    /// target, positive to the right.
    ///
    /// Units: degrees
    fn bearing_deg(&mut self) -> f64;

    /// Switch the sensor's illumination on.
    fn illumination_on(&mut self);

    /// Switch the sensor's illumination off.
    fn illumination_off(&mut self);
}

/// The driver's translation demand, read once per cycle.
pub trait TranslationSource {
    /// Get the (x, y) velocity demand.
    ///
    /// Units: meters/second
    fn translation_ms(&mut self) -> (f64, f64);
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<F> TranslationSource for F
where
    F: FnMut() -> (f64, f64)
{
    fn translation_ms(&mut self) -> (f64, f64) {
        self()
    }
}
