//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the signed angular distance between two angles.
///
/// This function will return the shortest signed distance from a to b accounting for wrapping
/// around a full turn.
pub fn get_ang_dist_2pi<T>(a: T, b: T) -> T
where
    T: Float + FloatConst
{
    let tau_t = T::PI() + T::PI();
    
    let c = rem_euclid(a - b, tau_t);
    let d = rem_euclid(b - a, tau_t);

    if c < d {
        -c
    }
    else {
        d
    }
}

/// Wrap an angle into the range [-pi, pi).
///
/// Non-finite values are returned as NaN.
pub fn wrap_pi<T>(value: T) -> T
where
    T: Float + FloatConst
{
    rem_euclid(value + T::PI(), T::PI() + T::PI()) - T::PI()
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// Due to floating point round-off the result can equal `rhs.abs()` when `lhs` is much smaller
/// than `rhs` in magnitude and negative.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}
