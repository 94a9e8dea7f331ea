//! # Simulation module
//!
//! A simple kinematic simulation of a holonomic rover and a camera looking
//! for a single target. The simulated drivetrain and camera implement the
//! heading lock's equipment traits so the lock can be run closed-loop without
//! hardware.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Rotation2, Vector2};
use std::cell::RefCell;
use std::rc::Rc;

// Internal
pub use params::*;
use crate::head_lock::{ChassisVelocity, Drivetrain, VisionSensor};
use util::maths;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of the simulated rover and its surroundings.
#[derive(Debug, Clone)]
pub struct SimRover {
    /// Position of the rover in the field frame
    ///
    /// Units: meters
    position_m: Vector2<f64>,

    /// Heading of the rover, anticlockwise from the field x axis
    ///
    /// Units: radians
    heading_rad: f64,

    /// Velocity demand in the field frame
    demand_field: ChassisVelocity,

    /// Maximum angular rate the drivetrain can achieve
    ///
    /// Units: radians/second
    max_omega_rads: f64,

    /// Position of the target in the field frame
    ///
    /// Units: meters
    target_m: Vector2<f64>,

    /// Half of the camera's horizontal field of view
    ///
    /// Units: radians
    half_fov_rad: f64,

    lights_on: bool,

    /// Number of drive demands received
    num_demands: usize
}

/// A handle to a rover shared by its drivetrain and camera.
pub type SharedRover = Rc<RefCell<SimRover>>;

/// The simulated rover's drivetrain.
pub struct SimDrivetrain(SharedRover);

/// The simulated rover's camera.
pub struct SimCamera(SharedRover);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimRover {
    /// Create a new simulated rover from the scenario parameters, with a
    /// drivetrain limited to `max_omega_rads`.
    pub fn new(params: &SimParams, max_omega_rads: f64) -> Self {
        Self {
            position_m: Vector2::new(params.start_pos_m[0], params.start_pos_m[1]),
            heading_rad: params.start_heading_rad,
            demand_field: ChassisVelocity::default(),
            max_omega_rads,
            target_m: Vector2::new(params.target_pos_m[0], params.target_pos_m[1]),
            half_fov_rad: params.camera_fov_deg.to_radians() / 2.0,
            lights_on: false,
            num_demands: 0
        }
    }

    /// Wrap the rover into a shared handle and build its drivetrain and
    /// camera.
    pub fn split(self) -> (SharedRover, SimDrivetrain, SimCamera) {
        let rover = Rc::new(RefCell::new(self));
        (rover.clone(), SimDrivetrain(rover.clone()), SimCamera(rover))
    }

    /// Advance the simulation by `dt_s` seconds at the current demand.
    pub fn step(&mut self, dt_s: f64) {
        let v = Vector2::new(self.demand_field.vx_ms, self.demand_field.vy_ms);
        self.position_m += v * dt_s;
        self.heading_rad = maths::wrap_pi(self.heading_rad + self.demand_field.omega_rads * dt_s);
    }

    /// The true bearing from the rover's heading to the target, positive to
    /// the right.
    ///
    /// Units: radians
    pub fn true_bearing_rad(&self) -> f64 {
        let to_target = self.target_m - self.position_m;
        let line_of_sight = to_target[1].atan2(to_target[0]);

        maths::get_ang_dist_2pi(line_of_sight, self.heading_rad)
    }

    pub fn position_m(&self) -> Vector2<f64> {
        self.position_m
    }

    pub fn heading_rad(&self) -> f64 {
        self.heading_rad
    }

    pub fn lights_on(&self) -> bool {
        self.lights_on
    }

    pub fn num_demands(&self) -> usize {
        self.num_demands
    }
}

impl Drivetrain for SimDrivetrain {
    fn drive(&mut self, demand: ChassisVelocity, field_relative: bool) {
        let mut rover = self.0.borrow_mut();

        let mut v = Vector2::new(demand.vx_ms, demand.vy_ms);
        if !field_relative {
            v = Rotation2::new(rover.heading_rad) * v;
        }

        // The drivetrain saturates, unlike the demand
        let omega_rads = demand.omega_rads.clamp(-rover.max_omega_rads, rover.max_omega_rads);

        rover.demand_field = ChassisVelocity {
            vx_ms: v[0],
            vy_ms: v[1],
            omega_rads
        };
        rover.num_demands += 1;

        trace!("SimDrivetrain demand: {:?}", rover.demand_field);
    }
}

impl VisionSensor for SimCamera {
    /// Reports zero if the target can't be seen, either because it's outside
    /// the field of view or the lights are off.
    fn bearing_deg(&mut self) -> f64 {
        let rover = self.0.borrow();
        let bearing_rad = rover.true_bearing_rad();

        if rover.lights_on && bearing_rad.abs() <= rover.half_fov_rad {
            bearing_rad.to_degrees()
        }
        else {
            0.0
        }
    }

    fn illumination_on(&mut self) {
        self.0.borrow_mut().lights_on = true;
    }

    fn illumination_off(&mut self) {
        self.0.borrow_mut().lights_on = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::head_lock::{
        HeadingLock, Params, RegistryTunables, ANGULAR_VELOCITY_COEFFICIENT_NAME,
        TURNING_GAINS_NAME
    };
    use crate::tuning::{GainSet, TuningRegistry};
    use std::f64::consts::PI;
    use std::sync::Arc;
    use std::thread;
    use util::module::Command;

    fn scenario(translation_ms: [f64; 2]) -> SimParams {
        SimParams {
            start_pos_m: [0.0, 0.0],
            start_heading_rad: 0.0,
            target_pos_m: [5.0, 2.0],
            camera_fov_deg: 80.0,
            duration_s: 3.0,
            translation_ms,
            retunes: Vec::new()
        }
    }

    #[test]
    fn test_true_bearing_sign() {
        // Target to the left of a rover facing along x
        let rover = SimRover::new(&scenario([0.0, 0.0]), PI);
        assert!(rover.true_bearing_rad() < 0.0);
        assert!((rover.true_bearing_rad() + (2.0f64).atan2(5.0)).abs() < 1e-12);

        // Target to the right
        let mut s = scenario([0.0, 0.0]);
        s.target_pos_m = [5.0, -2.0];
        assert!(SimRover::new(&s, PI).true_bearing_rad() > 0.0);
    }

    #[test]
    fn test_camera_needs_lights_and_fov() {
        let mut s = scenario([0.0, 0.0]);
        let (_, _, mut camera) = SimRover::new(&s, PI).split();

        assert_eq!(camera.bearing_deg(), 0.0);
        camera.illumination_on();
        assert!(camera.bearing_deg() < -20.0);

        // Target behind the rover
        s.target_pos_m = [-5.0, 0.0];
        let (_, _, mut camera) = SimRover::new(&s, PI).split();
        camera.illumination_on();
        assert_eq!(camera.bearing_deg(), 0.0);
    }

    #[test]
    fn test_robot_relative_drive_rotated() {
        let mut s = scenario([0.0, 0.0]);
        s.start_heading_rad = PI / 2.0;
        let (rover, mut drive, _) = SimRover::new(&s, PI).split();

        drive.drive(ChassisVelocity { vx_ms: 1.0, vy_ms: 0.0, omega_rads: 10.0 }, false);
        rover.borrow_mut().step(1.0);

        let r = rover.borrow();
        assert!(r.position_m()[0].abs() < 1e-12);
        assert!((r.position_m()[1] - 1.0).abs() < 1e-12);

        // Angular rate saturated at pi
        assert!((r.heading_rad() - maths::wrap_pi(PI / 2.0 + PI)).abs() < 1e-12);
    }

    /// Run the heading lock against the simulation, returning the final true
    /// bearing.
    fn run_closed_loop(scenario: &SimParams, params: Params) -> (f64, SharedRover) {
        let registry = TuningRegistry::new();
        let tunables = RegistryTunables::register(&registry, &params).unwrap();
        let (rover, drive, camera) = SimRover::new(scenario, params.max_angular_speed_rads).split();

        let dt = params.control_period_s;
        let [vx, vy] = scenario.translation_ms;
        let mut lock = HeadingLock::new(params, drive, camera, move || (vx, vy), tunables).unwrap();

        lock.initialize().unwrap();
        let ticks = (scenario.duration_s / dt).round() as usize;
        for _ in 0..ticks {
            lock.execute().unwrap();
            rover.borrow_mut().step(dt);
        }
        lock.end(false);

        let bearing = rover.borrow().true_bearing_rad();
        (bearing, rover)
    }

    #[test]
    fn test_closed_loop_locks_on() {
        let (bearing, rover) = run_closed_loop(&scenario([0.0, 0.0]), Params::default());

        assert!(bearing.abs() < 0.1f64.to_radians(), "bearing {} rad", bearing);
        assert!(!rover.borrow().lights_on());
        assert_eq!(rover.borrow().num_demands(), 150);
    }

    #[test]
    fn test_closed_loop_tracks_while_translating() {
        let (bearing, rover) = run_closed_loop(&scenario([0.5, 0.0]), Params::default());

        assert!(bearing.abs() < 3f64.to_radians(), "bearing {} rad", bearing);
        assert!((rover.borrow().position_m()[0] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_retune_from_other_thread() {
        let registry = Arc::new(TuningRegistry::new());
        let params = Params::default();
        let tunables = RegistryTunables::register(&registry, &params).unwrap();
        let s = scenario([0.0, 0.0]);
        let (_rover, drive, camera) = SimRover::new(&s, params.max_angular_speed_rads).split();

        let mut lock = HeadingLock::new(params, drive, camera, || (0.0, 0.0), tunables).unwrap();
        lock.initialize().unwrap();
        assert!(!lock.execute().unwrap().gains_updated);

        let gains = GainSet::pid(1.0, 0.0, 0.0);
        let writer = {
            let registry = registry.clone();
            thread::spawn(move || {
                registry.set(TURNING_GAINS_NAME, gains).unwrap();
                registry.set(ANGULAR_VELOCITY_COEFFICIENT_NAME, 0.5f64).unwrap();
            })
        };
        writer.join().unwrap();

        let report = lock.execute().unwrap();
        assert!(report.gains_updated);
        assert_eq!(lock.controller().gains(), gains);
        let error = lock.controller().setpoint().position - report.bearing_rad;
        assert!((report.omega_rads - 0.5 * error).abs() < 1e-12);
    }
}
