//! Trapezoidal motion profile

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::tuning::Tunable;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity and acceleration ceilings of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Maximum velocity
    ///
    /// Units: radians/second
    pub max_velocity: f64,

    /// Maximum acceleration
    ///
    /// Units: radians/second^2
    pub max_acceleration: f64
}

/// A point along a profile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProfileState {
    /// Units: radians
    pub position: f64,

    /// Units: radians/second
    pub velocity: f64
}

/// A trapezoidal motion profile.
///
/// Given the current state and a goal, the profile accelerates at the
/// maximum rate until it either reaches the maximum velocity or has to start
/// braking, cruises, then decelerates to arrive at the goal. Short moves
/// become triangles with no cruise phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    constraints: Constraints
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tunable for Constraints {
    fn same_value(&self, other: &Self) -> bool {
        self.max_velocity.same_value(&other.max_velocity)
            && self.max_acceleration.same_value(&other.max_acceleration)
    }
}

impl Constraints {
    pub const fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration
        }
    }

    /// Constraints are valid if both ceilings are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.max_velocity.is_finite()
            && self.max_acceleration.is_finite()
            && self.max_velocity > 0.0
            && self.max_acceleration > 0.0
    }
}

impl ProfileState {
    pub const fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }

    fn flipped(self, direction: f64) -> Self {
        Self {
            position: self.position * direction,
            velocity: self.velocity * direction
        }
    }
}

impl TrapezoidProfile {
    pub const fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> Constraints {
        self.constraints
    }

    pub fn set_constraints(&mut self, constraints: Constraints) {
        self.constraints = constraints;
    }

    /// Get the state `t` seconds after `current` on the profile towards
    /// `goal`.
    pub fn calculate(&self, t: f64, current: ProfileState, goal: ProfileState) -> ProfileState {
        let max_vel = self.constraints.max_velocity;
        let max_acc = self.constraints.max_acceleration;

        // Work in the frame where the goal lies in the positive direction,
        // the result is flipped back at the end.
        let direction = if current.position > goal.position { -1.0 } else { 1.0 };
        let mut current = current.flipped(direction);
        let goal = goal.flipped(direction);

        if current.velocity > max_vel {
            current.velocity = max_vel;
        }

        // Parts of the full trapezoid (from and to rest) which are cut off by
        // the non-zero start and end velocities.
        let cutoff_begin = current.velocity / max_acc;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_acc / 2.0;

        let cutoff_end = goal.velocity / max_acc;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_acc / 2.0;

        let full_trapezoid_dist = 
            cutoff_dist_begin + (goal.position - current.position) + cutoff_dist_end;
        let mut accel_time = max_vel / max_acc;

        let mut full_speed_dist = full_trapezoid_dist - accel_time * accel_time * max_acc;

        // Never reaches max velocity, the profile is a triangle
        if full_speed_dist < 0.0 {
            accel_time = (full_trapezoid_dist / max_acc).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = accel_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_vel;
        let end_decel = end_full_speed + accel_time - cutoff_end;

        let mut result = current;

        if t < end_accel {
            result.velocity += t * max_acc;
            result.position += (current.velocity + t * max_acc / 2.0) * t;
        }
        else if t < end_full_speed {
            result.velocity = max_vel;
            result.position += (current.velocity + end_accel * max_acc / 2.0) * end_accel
                + max_vel * (t - end_accel);
        }
        else if t <= end_decel {
            let time_left = end_decel - t;
            result.velocity = goal.velocity + time_left * max_acc;
            result.position = goal.position - (goal.velocity + time_left * max_acc / 2.0) * time_left;
        }
        else {
            result = goal;
        }

        result.flipped(direction)
    }
}
