//! Implementations for the HeadingLock state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{
    ChassisVelocity, Drivetrain, HeadingLockError, Params, TranslationSource, TuningSource,
    VisionSensor
};
use crate::heading_ctrl::ProfiledAngularController;
use util::{maths, module::Command};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Heading lock command.
///
/// Owns its heading controller. The drivetrain, vision sensor, translation
/// source and tuning source are supplied at construction.
pub struct HeadingLock<D, V, S, T>
where
    D: Drivetrain,
    V: VisionSensor,
    S: TranslationSource,
    T: TuningSource
{
    params: Params,

    state: LockState,

    controller: ProfiledAngularController,

    /// True until the profile has been placed at the first finite bearing
    /// after activation.
    seed_pending: bool,

    drivetrain: D,
    vision: V,
    translation: S,
    tuning: T,

    report: StatusReport
}

/// Status report for one cycle of HeadingLock processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// The normalised bearing fed to the controller.
    ///
    /// Units: radians
    pub bearing_rad: f64,

    /// The angular rate sent to the drivetrain.
    ///
    /// Units: radians/second
    pub omega_rads: f64,

    /// True if the bearing is within the tolerance.
    pub at_setpoint: bool,

    /// True if new gains were applied this cycle.
    pub gains_updated: bool,

    /// True if new profile constraints were applied this cycle.
    pub constraints_updated: bool,

    /// True if the angular rate sent exceeds the drivetrain's maximum. The
    /// rate is not clamped.
    pub omega_limit_exceeded: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Activation state of the heading lock.
///
/// The vision sensor's illumination is on if and only if the lock is
/// `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockState {
    /// Not scheduled. The controller state is stale.
    Inactive,

    /// Scheduled and tracking.
    Active,

    /// Cleaning up on the way out of `Active`.
    Terminating
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D, V, S, T> HeadingLock<D, V, S, T>
where
    D: Drivetrain,
    V: VisionSensor,
    S: TranslationSource,
    T: TuningSource
{
    /// Create a new, inactive, heading lock.
    pub fn new(
        params: Params,
        drivetrain: D,
        vision: V,
        translation: S,
        tuning: T
    ) -> Result<Self, HeadingLockError> {
        params.validate()?;

        let mut controller = ProfiledAngularController::new(
            params.turning_gains,
            params.constraints(),
            params.control_period_s
        );
        controller.set_tolerance(params.angular_tolerance_rad);
        if let Some(limit) = params.max_integral_rads {
            controller.set_integral_limit(limit);
        }

        Ok(Self {
            params,
            state: LockState::Inactive,
            controller,
            seed_pending: false,
            drivetrain,
            vision,
            translation,
            tuning,
            report: StatusReport::default()
        })
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// True if the lock is active and the bearing is within the tolerance.
    pub fn at_target(&self) -> bool {
        self.state == LockState::Active && self.controller.at_setpoint()
    }

    /// The status report of the last executed cycle.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    pub fn controller(&self) -> &ProfiledAngularController {
        &self.controller
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn drivetrain(&self) -> &D {
        &self.drivetrain
    }

    pub fn vision(&self) -> &V {
        &self.vision
    }

    /// Apply any pending tuning changes to the controller.
    fn apply_tuning(&mut self) {
        if let Some(gains) = self.tuning.poll_gains() {
            if gains.is_finite() {
                info!("HeadingLock gains updated to {:?}", gains);
                self.controller.set_gains(gains);
                self.report.gains_updated = true;
            }
            else {
                warn!("Ignoring non-finite HeadingLock gains {:?}", gains);
            }
        }

        if let Some(constraints) = self.tuning.poll_constraints() {
            if constraints.is_valid() {
                info!("HeadingLock constraints updated to {:?}", constraints);
                self.controller.set_constraints(constraints);
                self.report.constraints_updated = true;
            }
            else {
                warn!("Ignoring invalid HeadingLock constraints {:?}", constraints);
            }
        }
    }
}

impl<D, V, S, T> Command for HeadingLock<D, V, S, T>
where
    D: Drivetrain,
    V: VisionSensor,
    S: TranslationSource,
    T: TuningSource
{
    type StatusReport = StatusReport;
    type Error = HeadingLockError;

    /// Activate the lock: reset the controller and switch the lights on.
    ///
    /// The profile is placed at the first finite bearing read by `execute`,
    /// so the setpoint ramps from the measured heading towards the target.
    fn initialize(&mut self) -> Result<(), Self::Error> {
        if self.state != LockState::Inactive {
            warn!("HeadingLock initialize ignored while {:?}", self.state);
            return Err(HeadingLockError::InvalidTransition {
                state: self.state,
                event: "initialize"
            });
        }

        self.controller.reset(0.0);
        self.controller.set_tolerance(self.params.angular_tolerance_rad);
        self.seed_pending = true;
        self.report = StatusReport::default();

        self.vision.illumination_on();
        self.state = LockState::Active;

        info!("HeadingLock active");

        Ok(())
    }

    /// Perform one cycle of heading lock processing.
    fn execute(&mut self) -> Result<Self::StatusReport, Self::Error> {
        if self.state != LockState::Active {
            return Err(HeadingLockError::NotActive);
        }

        // Clear the status report
        self.report = StatusReport::default();

        self.apply_tuning();

        // Stale or missing bearings are passed straight through, there is no
        // fallback behaviour.
        let bearing_deg = self.vision.bearing_deg();
        if !bearing_deg.is_finite() {
            warn!("Non-finite bearing from vision sensor: {}", bearing_deg);
        }

        // The controller expects the shortest signed angle to the target
        let bearing_rad = maths::wrap_pi(bearing_deg.to_radians());

        if self.seed_pending && bearing_rad.is_finite() {
            debug!("HeadingLock profile starting from {:.4} rad", bearing_rad);
            self.controller.reset(bearing_rad);
            self.seed_pending = false;
        }

        let omega_rads = self.controller.calculate(bearing_rad)
            * self.tuning.angular_velocity_coefficient();

        let (vx_ms, vy_ms) = self.translation.translation_ms();

        if omega_rads.abs() > self.params.max_angular_speed_rads {
            debug!(
                "HeadingLock angular rate {:.3} rad/s exceeds drivetrain maximum of {:.3} rad/s",
                omega_rads,
                self.params.max_angular_speed_rads
            );
            self.report.omega_limit_exceeded = true;
        }

        let demand = ChassisVelocity {
            vx_ms,
            vy_ms,
            omega_rads
        };
        self.drivetrain.drive(demand, self.params.field_relative);

        self.report.bearing_rad = bearing_rad;
        self.report.omega_rads = omega_rads;
        self.report.at_setpoint = self.controller.at_setpoint();

        trace!("HeadingLock output: {:?}", demand);

        Ok(self.report)
    }

    /// Deactivate the lock, switching the lights off. Runs the same way for
    /// interruptions and normal ends.
    fn end(&mut self, interrupted: bool) {
        if self.state != LockState::Active {
            debug!("HeadingLock end ignored while {:?}", self.state);
            return;
        }

        self.state = LockState::Terminating;
        self.vision.illumination_off();
        self.state = LockState::Inactive;

        info!("HeadingLock {}", if interrupted { "interrupted" } else { "ended" });
    }
}

impl<D, V, S, T> Drop for HeadingLock<D, V, S, T>
where
    D: Drivetrain,
    V: VisionSensor,
    S: TranslationSource,
    T: TuningSource
{
    fn drop(&mut self) {
        if self.state == LockState::Active {
            self.end(true);
        }
    }
}
