//! Parameters structure for HeadingLock

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::heading_ctrl::Constraints;
use crate::tuning::GainSet;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the heading lock.
///
/// The gains, constraints and angular velocity coefficient are only the
/// initial values of their tunables, once running they are edited through the
/// tuning registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Params {

    // ---- CONTROLLER ----

    /// Heading controller gains
    pub turning_gains: GainSet,

    /// Maximum angular speed of the profile, also the drivetrain's maximum
    /// angular speed.
    ///
    /// Units: radians/second
    pub max_angular_speed_rads: f64,

    /// Maximum angular acceleration of the profile.
    ///
    /// Units: radians/second^2
    pub max_angular_accel_radss: f64,

    /// Bearing within which the heading is considered locked.
    ///
    /// Units: radians
    pub angular_tolerance_rad: f64,

    /// Limit on the heading controller's integral accumulation, none if not
    /// given.
    ///
    /// Units: radian-seconds
    #[serde(default)]
    pub max_integral_rads: Option<f64>,

    /// Multiplier applied to the controller output before it is sent to the
    /// drivetrain.
    pub angular_velocity_coefficient: f64,

    // ---- EXECUTION ----

    /// The fixed period at which the command is executed.
    ///
    /// Units: seconds
    pub control_period_s: f64,

    /// Whether the velocity demand is expressed in the field frame.
    #[serde(default = "default_field_relative")]
    pub field_relative: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Parameter validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The turning gains must be finite, found {0:?}")]
    NonFiniteGains(GainSet),

    #[error("The profile constraints must be finite and positive, found {0:?}")]
    InvalidConstraints(Constraints),

    #[error("{name} must be finite and positive, found {value}")]
    NotPositive {
        name: &'static str,
        value: f64
    },

    #[error("{name} must be finite and non-negative, found {value}")]
    Negative {
        name: &'static str,
        value: f64
    },

    #[error("The angular velocity coefficient must be finite, found {0}")]
    NonFiniteCoefficient(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Profile constraints described by these parameters.
    pub fn constraints(&self) -> Constraints {
        Constraints::new(self.max_angular_speed_rads, self.max_angular_accel_radss)
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.turning_gains.is_finite() {
            return Err(ParamsError::NonFiniteGains(self.turning_gains));
        }

        if !self.constraints().is_valid() {
            return Err(ParamsError::InvalidConstraints(self.constraints()));
        }

        if !(self.control_period_s.is_finite() && self.control_period_s > 0.0) {
            return Err(ParamsError::NotPositive {
                name: "control_period_s",
                value: self.control_period_s
            });
        }

        if !(self.angular_tolerance_rad.is_finite() && self.angular_tolerance_rad >= 0.0) {
            return Err(ParamsError::Negative {
                name: "angular_tolerance_rad",
                value: self.angular_tolerance_rad
            });
        }

        if let Some(limit) = self.max_integral_rads {
            if !(limit.is_finite() && limit >= 0.0) {
                return Err(ParamsError::Negative {
                    name: "max_integral_rads",
                    value: limit
                });
            }
        }

        if !self.angular_velocity_coefficient.is_finite() {
            return Err(ParamsError::NonFiniteCoefficient(self.angular_velocity_coefficient));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            turning_gains: GainSet::pid(3.0, 0.0, 0.0),
            max_angular_speed_rads: 2.0 * std::f64::consts::PI,
            max_angular_accel_radss: 4.0 * std::f64::consts::PI,
            angular_tolerance_rad: 2f64.to_radians(),
            max_integral_rads: None,
            angular_velocity_coefficient: 1.0,
            control_period_s: 0.02,
            field_relative: true
        }
    }
}

fn default_field_relative() -> bool {
    true
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../params/heading_lock.toml");
        let params: Params = util::params::load_path(path).unwrap();

        params.validate().unwrap();
        assert!(params.field_relative);
    }

    #[test]
    fn test_default_is_valid() {
        Params::default().validate().unwrap();
    }

    #[test]
    fn test_optional_fields() {
        let params: Params = toml::from_str(r#"
            turning_gains = { k_p = 1.0, k_i = 0.0, k_d = 0.0 }
            max_angular_speed_rads = 6.28
            max_angular_accel_radss = 12.56
            angular_tolerance_rad = 0.03
            angular_velocity_coefficient = 1.0
            control_period_s = 0.02
        "#).unwrap();

        assert_eq!(params.max_integral_rads, None);
        assert!(params.field_relative);
        assert_eq!(params.turning_gains.k_f(), 0.0);
    }

    #[test]
    fn test_invalid_params() {
        let mut p = Params::default();
        p.max_angular_accel_radss = 0.0;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidConstraints(_))));

        let mut p = Params::default();
        p.control_period_s = -0.02;
        assert!(matches!(p.validate(), Err(ParamsError::NotPositive { .. })));

        let mut p = Params::default();
        p.turning_gains = GainSet::pid(f64::NAN, 0.0, 0.0);
        assert!(matches!(p.validate(), Err(ParamsError::NonFiniteGains(_))));

        let mut p = Params::default();
        p.angular_tolerance_rad = -1.0;
        assert!(matches!(p.validate(), Err(ParamsError::Negative { .. })));

        let mut p = Params::default();
        p.max_integral_rads = Some(f64::NAN);
        assert!(matches!(p.validate(), Err(ParamsError::Negative { .. })));

        let mut p = Params::default();
        p.angular_velocity_coefficient = f64::INFINITY;
        assert!(matches!(p.validate(), Err(ParamsError::NonFiniteCoefficient(_))));
    }
}
