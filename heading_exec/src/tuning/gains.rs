//! Feedback gain sets

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Tunable;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A set of PID gains plus a feed-forward term.
///
/// Gain sets are immutable, an edited set replaces the old one rather than
/// modifying it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GainSet {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// Feed-forward term, added directly to the controller output
    #[serde(default)]
    k_f: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tunable for GainSet {
    fn same_value(&self, other: &Self) -> bool {
        self.k_p.same_value(&other.k_p)
            && self.k_i.same_value(&other.k_i)
            && self.k_d.same_value(&other.k_d)
            && self.k_f.same_value(&other.k_f)
    }
}

impl GainSet {
    /// Create a new gain set.
    pub const fn new(k_p: f64, k_i: f64, k_d: f64, k_f: f64) -> Self {
        Self { k_p, k_i, k_d, k_f }
    }

    /// Create a gain set with no feed-forward term.
    pub const fn pid(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self::new(k_p, k_i, k_d, 0.0)
    }

    /// Return a copy of this set with the given feed-forward term.
    pub fn with_feed_forward(self, k_f: f64) -> Self {
        Self { k_f, ..self }
    }

    pub fn k_p(&self) -> f64 {
        self.k_p
    }

    pub fn k_i(&self) -> f64 {
        self.k_i
    }

    pub fn k_d(&self) -> f64 {
        self.k_d
    }

    pub fn k_f(&self) -> f64 {
        self.k_f
    }

    /// True if all terms are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.k_p.is_finite()
            && self.k_i.is_finite()
            && self.k_d.is_finite()
            && self.k_f.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        gains: GainSet
    }

    #[test]
    fn test_feed_forward_defaults_to_zero() {
        let w: Wrapper = toml::from_str("gains = { k_p = 0.5, k_i = 0.0, k_d = 0.01 }").unwrap();
        assert_eq!(w.gains, GainSet::pid(0.5, 0.0, 0.01));
        assert_eq!(w.gains.k_f(), 0.0);

        let w: Wrapper = toml::from_str(
            "[gains]\nk_p = 1.0\nk_i = 2.0\nk_d = 3.0\nk_f = 0.25\n"
        ).unwrap();
        assert_eq!(w.gains, GainSet::new(1.0, 2.0, 3.0, 0.25));
    }

    #[test]
    fn test_same_value_matches_nan_fields() {
        let nan = GainSet::pid(f64::NAN, 0.0, 0.0);
        assert!(nan.same_value(&GainSet::pid(f64::NAN, 0.0, 0.0)));
        assert!(!nan.same_value(&GainSet::pid(f64::NAN, 1.0, 0.0)));
        assert!(!nan.same_value(&GainSet::pid(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_with_feed_forward_replaces() {
        let base = GainSet::pid(1.0, 0.1, 0.01);
        let ff = base.with_feed_forward(0.3);

        assert_eq!(base.k_f(), 0.0);
        assert_eq!(ff.k_f(), 0.3);
        assert_eq!(ff.k_p(), base.k_p());
        assert_eq!(ff.k_i(), base.k_i());
        assert_eq!(ff.k_d(), base.k_d());
    }

    #[test]
    fn test_is_finite() {
        assert!(GainSet::pid(1.0, 0.0, 0.0).is_finite());
        assert!(!GainSet::pid(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!GainSet::new(1.0, 0.0, 0.0, f64::INFINITY).is_finite());
    }
}
