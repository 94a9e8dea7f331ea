//! Profiled angular controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{Constraints, ProfileState, TrapezoidProfile};
use crate::tuning::GainSet;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller tracking a fixed target angle of zero through a
/// trapezoidal motion profile.
///
/// Each call to [`calculate`](Self::calculate) advances the profile by one
/// fixed control period, so the controller must be called exactly once per
/// cycle.
///
/// # Measured angle
///
/// The measured angle is consumed linearly and is expected to already be the
/// shortest signed angle to the target, in the range [-pi, pi). The
/// controller does not handle wrapping, callers must normalise.
#[derive(Debug, Clone, Serialize)]
pub struct ProfiledAngularController {
    /// Feedback gains and feed-forward term
    gains: GainSet,

    #[serde(skip)]
    profile: TrapezoidProfile,

    /// The final target of the profile, fixed at zero (facing the target)
    goal: ProfileState,

    /// Current profiled setpoint
    setpoint: ProfileState,

    /// The fixed control period
    ///
    /// Units: seconds
    period_s: f64,

    /// Radius of the band within which the controller is at its setpoint
    ///
    /// Units: radians
    tolerance_rad: f64,

    /// Limit on the magnitude of the integral accumulation
    integral_limit: f64,

    /// The integral accumulation
    integral: f64,

    /// Previous error, `None` after a reset
    prev_error: Option<f64>,

    /// Error on the last call to `calculate`, `None` after a reset
    position_error: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProfiledAngularController {

    /// Create a new controller with the given gains, profile constraints and
    /// control period.
    ///
    /// The controller starts reset to zero with a zero tolerance and no limit
    /// on the integral.
    pub fn new(gains: GainSet, constraints: Constraints, period_s: f64) -> Self {
        Self {
            gains,
            profile: TrapezoidProfile::new(constraints),
            goal: ProfileState::default(),
            setpoint: ProfileState::default(),
            period_s,
            tolerance_rad: 0.0,
            integral_limit: f64::INFINITY,
            integral: 0.0,
            prev_error: None,
            position_error: None
        }
    }

    /// Reset the controller.
    ///
    /// Clears the integral and derivative history and places the profile at
    /// `initial_angle_rad` with zero velocity. Must be called on each
    /// activation, otherwise integral and derivative terms from the previous
    /// activation carry over.
    pub fn reset(&mut self, initial_angle_rad: f64) {
        self.setpoint = ProfileState::new(initial_angle_rad, 0.0);
        self.integral = 0.0;
        self.prev_error = None;
        self.position_error = None;
    }

    /// Set the radius of the band within which [`at_setpoint`](Self::at_setpoint)
    /// reports true. Does not affect the output.
    pub fn set_tolerance(&mut self, tolerance_rad: f64) {
        self.tolerance_rad = tolerance_rad;
    }

    /// Swap the PID gains, keeping the current feed-forward term.
    ///
    /// The new gains apply from the next call to `calculate`. The profile and
    /// integral state are untouched.
    pub fn set_pid(&mut self, k_p: f64, k_i: f64, k_d: f64) {
        self.gains = GainSet::new(k_p, k_i, k_d, self.gains.k_f());
    }

    /// Swap the whole gain set including the feed-forward term.
    pub fn set_gains(&mut self, gains: GainSet) {
        self.gains = gains;
    }

    /// Swap the profile constraints. The current setpoint is kept, the new
    /// ceilings apply from the next call to `calculate`.
    pub fn set_constraints(&mut self, constraints: Constraints) {
        self.profile.set_constraints(constraints);
    }

    /// Limit the magnitude of the integral accumulation.
    ///
    /// Units: radian-seconds. A NaN limit removes the limit.
    pub fn set_integral_limit(&mut self, limit: f64) {
        self.integral_limit = match limit.abs() {
            l if l.is_nan() => f64::INFINITY,
            l => l
        };
        self.integral = self.integral.clamp(-self.integral_limit, self.integral_limit);
    }

    /// Calculate the angular velocity demand for the given measured angle.
    ///
    /// Units: input in radians, output in radians/second.
    ///
    /// The integral accumulates whatever the integral gain is, so changing
    /// the gains only changes the law applied to the state.
    pub fn calculate(&mut self, measured_angle_rad: f64) -> f64 {
        // Advance the profile by one period
        self.setpoint = self.profile.calculate(self.period_s, self.setpoint, self.goal);

        let error = self.setpoint.position - measured_angle_rad;

        self.integral = (self.integral + error * self.period_s)
            .clamp(-self.integral_limit, self.integral_limit);

        // No derivative on the first cycle after a reset, there's no history
        // to differentiate against.
        let deriv = match self.prev_error {
            Some(e) => (error - e) / self.period_s,
            None => 0.0
        };

        let out = 
            self.gains.k_p() * error
            + self.gains.k_i() * self.integral
            + self.gains.k_d() * deriv
            + self.gains.k_f();

        trace!(
            "Heading ctrl: setpoint {:.4} rad ({:.4} rad/s), error {:.4} rad, out {:.4} rad/s",
            self.setpoint.position,
            self.setpoint.velocity,
            error,
            out
        );

        self.prev_error = Some(error);
        self.position_error = Some(error);

        out
    }

    /// True if the last error was within the tolerance. False if `calculate`
    /// hasn't been called since the last reset.
    pub fn at_setpoint(&self) -> bool {
        match self.position_error {
            Some(e) => e.abs() <= self.tolerance_rad,
            None => false
        }
    }

    /// True if the profile has reached the goal and the controller is at its
    /// setpoint.
    pub fn at_goal(&self) -> bool {
        self.at_setpoint() && self.setpoint == self.goal
    }

    pub fn setpoint(&self) -> ProfileState {
        self.setpoint
    }

    pub fn gains(&self) -> GainSet {
        self.gains
    }

    pub fn constraints(&self) -> Constraints {
        self.profile.constraints()
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    pub fn tolerance_rad(&self) -> f64 {
        self.tolerance_rad
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 0.02;

    fn constraints() -> Constraints {
        Constraints::new(360f64.to_radians(), 180f64.to_radians())
    }

    #[test]
    fn test_reset_then_zero_is_feed_forward() {
        let mut ctrl = ProfiledAngularController::new(
            GainSet::new(2.0, 1.0, 0.5, 0.0), constraints(), DT
        );

        // Build up some integral and derivative history
        ctrl.reset(0.0);
        for a in &[0.3, 0.2, -0.4, 0.1] {
            ctrl.calculate(*a);
        }
        assert!(ctrl.integral() != 0.0);

        ctrl.reset(0.0);
        assert_eq!(ctrl.calculate(0.0), 0.0);
        assert_eq!(ctrl.integral(), 0.0);

        ctrl.set_gains(GainSet::new(2.0, 1.0, 0.5, 0.125));
        ctrl.reset(0.0);
        assert_eq!(ctrl.calculate(0.0), 0.125);
    }

    #[test]
    fn test_decreasing_error_sequence() {
        let mut ctrl = ProfiledAngularController::new(
            GainSet::pid(0.1, 0.0, 0.0), constraints(), DT
        );
        ctrl.reset(0.0);

        let outputs: Vec<f64> = [10.0f64, 5.0, 0.0, 0.0]
            .iter()
            .map(|deg| ctrl.calculate(deg.to_radians()))
            .collect();

        assert!(outputs[0].abs() > outputs[1].abs());
        assert!(outputs[1].abs() > outputs[2].abs());
        assert_eq!(outputs[3], 0.0);

        // Target to the positive side gives a negative demand
        assert!(outputs[0] < 0.0);
        assert!((outputs[0] + 0.1 * 10f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_gain_change_applies_next_call_without_state_jump() {
        let gains = GainSet::pid(1.0, 1.0, 0.0);
        let mut a = ProfiledAngularController::new(gains, constraints(), DT);
        let mut b = ProfiledAngularController::new(gains, constraints(), DT);
        a.reset(0.5);
        b.reset(0.5);

        for _ in 0..10 {
            assert_eq!(a.calculate(0.4), b.calculate(0.4));
        }

        b.set_pid(1.0, 2.0, 0.0);

        let out_a = a.calculate(0.4);
        let out_b = b.calculate(0.4);

        // Same state on both, only the law differs
        assert_eq!(a.setpoint(), b.setpoint());
        assert_eq!(a.integral(), b.integral());
        assert!((out_b - out_a - a.integral()).abs() < 1e-12);
        assert_eq!(b.gains(), GainSet::pid(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_set_pid_keeps_feed_forward() {
        let mut ctrl = ProfiledAngularController::new(
            GainSet::new(1.0, 0.0, 0.0, 0.2), constraints(), DT
        );
        ctrl.set_pid(3.0, 0.0, 0.0);
        assert_eq!(ctrl.gains(), GainSet::new(3.0, 0.0, 0.0, 0.2));
    }

    #[test]
    fn test_sustained_error_ramps() {
        let p = 1.0;
        let mut ctrl = ProfiledAngularController::new(
            GainSet::pid(p, 0.0, 0.0), constraints(), DT
        );
        let measured = 90f64.to_radians();
        ctrl.reset(measured);

        let outputs: Vec<f64> = (0..200).map(|_| ctrl.calculate(measured)).collect();
        let asymptote = -p * measured;

        // Starts well short of the asymptote
        assert!(outputs[0].abs() < 0.01 * asymptote.abs());

        // Grows without ever jumping past the asymptote
        for w in outputs.windows(2) {
            assert!(w[1].abs() >= w[0].abs());
            assert!(w[1].abs() <= asymptote.abs() + 1e-12);
        }

        assert!((outputs.last().unwrap() - asymptote).abs() < 1e-12);
    }

    #[test]
    fn test_setpoint_respects_ceilings() {
        let c = constraints();
        let mut ctrl = ProfiledAngularController::new(GainSet::pid(1.0, 0.0, 0.0), c, DT);
        ctrl.reset(150f64.to_radians());

        let mut prev = ctrl.setpoint();
        for _ in 0..300 {
            ctrl.calculate(0.3);
            let sp = ctrl.setpoint();

            assert!(sp.velocity.abs() <= c.max_velocity + 1e-9);
            assert!(((sp.velocity - prev.velocity) / DT).abs() <= c.max_acceleration + 1e-6);
            prev = sp;
        }
    }

    #[test]
    fn test_derivative_uses_period() {
        let mut ctrl = ProfiledAngularController::new(
            GainSet::pid(0.0, 0.0, 1.0), constraints(), DT
        );
        ctrl.reset(0.0);

        // First call has no history
        assert_eq!(ctrl.calculate(0.1), 0.0);

        // Error goes from -0.1 to -0.3
        let out = ctrl.calculate(0.3);
        assert!((out - (-0.2 / DT)).abs() < 1e-9);
    }

    #[test]
    fn test_integral_limit() {
        let mut ctrl = ProfiledAngularController::new(
            GainSet::pid(0.0, 1.0, 0.0), constraints(), DT
        );
        ctrl.set_integral_limit(0.05);
        ctrl.reset(0.0);

        for _ in 0..100 {
            ctrl.calculate(1.0);
        }

        assert!((ctrl.integral() + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_at_setpoint_and_goal() {
        let mut ctrl = ProfiledAngularController::new(
            GainSet::pid(1.0, 0.0, 0.0), constraints(), DT
        );
        ctrl.set_tolerance(2f64.to_radians());
        ctrl.reset(0.0);
        assert!(!ctrl.at_setpoint());

        ctrl.calculate(10f64.to_radians());
        assert!(!ctrl.at_setpoint());

        ctrl.calculate(1f64.to_radians());
        assert!(ctrl.at_setpoint());
        assert!(ctrl.at_goal());

        // Profile still travelling, not yet at goal
        ctrl.reset(1.0);
        let sp_start = ctrl.setpoint();
        ctrl.calculate(sp_start.position);
        assert!(ctrl.at_setpoint());
        assert!(!ctrl.at_goal());
    }
}
