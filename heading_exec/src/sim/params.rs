//! Simulation scenario parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;

use crate::heading_ctrl::Constraints;
use crate::tuning::GainSet;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of a simulated heading lock scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {

    // ---- ROVER ----

    /// Starting position of the rover in the field frame.
    ///
    /// Units: meters
    pub start_pos_m: [f64; 2],

    /// Starting heading of the rover.
    ///
    /// Units: radians
    pub start_heading_rad: f64,

    /// Driver translation demand, held for the whole scenario.
    ///
    /// Units: meters/second,
    /// Frame: field
    pub translation_ms: [f64; 2],

    // ---- TARGET ----

    /// Position of the target in the field frame.
    ///
    /// Units: meters
    pub target_pos_m: [f64; 2],

    /// Camera horizontal field of view.
    ///
    /// Units: degrees
    pub camera_fov_deg: f64,

    // ---- EXECUTION ----

    /// Length of the scenario.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Edits made to the tunables while the scenario is running.
    #[serde(default)]
    pub retunes: Vec<Retune>
}

/// A scheduled edit of the heading lock's tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct Retune {
    /// Time after the start of the scenario at which to apply the edit.
    ///
    /// Units: seconds
    pub time_s: f64,

    #[serde(default)]
    pub gains: Option<GainSet>,

    #[serde(default)]
    pub constraints: Option<Constraints>,

    #[serde(default)]
    pub angular_velocity_coefficient: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Retune {
    /// Delay from the start of the scenario until the retune is due, or
    /// `None` if `time_s` isn't representable as a duration. Negative times
    /// are due immediately.
    pub fn delay(&self) -> Option<Duration> {
        if self.time_s.is_nan() {
            return None;
        }
        Duration::try_from_secs_f64(self.time_s.max(0.0)).ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../params/heading_sim.toml");
        let params: SimParams = util::params::load_path(path).unwrap();

        assert!(params.duration_s > 0.0);
        assert!(!params.retunes.is_empty());

        // Retunes are in chronological order
        for w in params.retunes.windows(2) {
            assert!(w[0].time_s <= w[1].time_s);
        }
        assert!(params.retunes.iter().all(|r| r.delay().is_some()));
    }

    fn retune_at(time_s: f64) -> Retune {
        Retune {
            time_s,
            gains: None,
            constraints: None,
            angular_velocity_coefficient: None
        }
    }

    #[test]
    fn test_retune_delay() {
        assert_eq!(retune_at(1.5).delay(), Some(Duration::from_millis(1500)));
        assert_eq!(retune_at(-2.0).delay(), Some(Duration::from_secs(0)));

        assert_eq!(retune_at(f64::NAN).delay(), None);
        assert_eq!(retune_at(f64::INFINITY).delay(), None);
        assert_eq!(retune_at(1e30).delay(), None);
    }
}
