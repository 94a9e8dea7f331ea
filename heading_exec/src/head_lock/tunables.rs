//! Live tuning of the heading lock

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use super::Params;
use crate::heading_ctrl::Constraints;
use crate::tuning::{GainSet, TunableValue, TuningError, TuningRegistry};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Registry name of the heading controller gains.
pub const TURNING_GAINS_NAME: &str = "Target.turningPIDF";

/// Registry name of the heading profile constraints.
pub const TURNING_CONSTRAINTS_NAME: &str = "Target.turningConstraints";

/// Registry name of the output multiplier.
pub const ANGULAR_VELOCITY_COEFFICIENT_NAME: &str = "Target.angularVelocityCoefficient";

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of live tuning updates, polled by the heading lock once per cycle.
pub trait TuningSource {
    /// New gains if they changed since the last poll.
    fn poll_gains(&self) -> Option<GainSet>;

    /// New profile constraints if they changed since the last poll.
    fn poll_constraints(&self) -> Option<Constraints>;

    /// The current output multiplier.
    fn angular_velocity_coefficient(&self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The heading lock's tunables, held in a [`TuningRegistry`].
///
/// Other targeting commands may register the same names, in which case they
/// share the values. Changes are edge-triggered, so with several commands
/// polling the same tunable only the first poll after an update sees it.
#[derive(Debug, Clone)]
pub struct RegistryTunables {
    gains: Arc<TunableValue<GainSet>>,
    constraints: Arc<TunableValue<Constraints>>,
    coefficient: Arc<TunableValue<f64>>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RegistryTunables {
    /// Register the tunables, seeded from the parameters, or attach to them
    /// if they already exist.
    pub fn register(registry: &TuningRegistry, params: &Params) -> Result<Self, TuningError> {
        Ok(Self {
            gains: registry.register(TURNING_GAINS_NAME, params.turning_gains)?,
            constraints: registry.register(TURNING_CONSTRAINTS_NAME, params.constraints())?,
            coefficient: registry.register(
                ANGULAR_VELOCITY_COEFFICIENT_NAME, 
                params.angular_velocity_coefficient
            )?
        })
    }
}

impl TuningSource for RegistryTunables {
    fn poll_gains(&self) -> Option<GainSet> {
        self.gains.take_changed()
    }

    fn poll_constraints(&self) -> Option<Constraints> {
        self.constraints.take_changed()
    }

    fn angular_velocity_coefficient(&self) -> f64 {
        self.coefficient.get()
    }
}
