//! Heading lock executable entry point.
//! 
//! # Architecture
//! 
//! The executable runs the heading lock closed-loop against the simulated
//! rover:
//! 
//!     - Initialise session, logging and parameters
//!     - Start the tuning thread, which edits the tunables on the scenario's
//!       schedule through the tuning registry
//!     - Main loop, once per control period:
//!         - Heading lock processing
//!         - Simulation step
//!     - End the heading lock and stop the tuning thread
//!
//! # Usage
//!
//! `heading_exec [SIM_PARAMS_FILE]`, the scenario file path being relative to
//! the params directory (default `heading_sim.toml`).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, warn};
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// Internal
use heading_lib::{
    head_lock::{
        HeadingLock, Params, RegistryTunables, ANGULAR_VELOCITY_COEFFICIENT_NAME, 
        TURNING_CONSTRAINTS_NAME, TURNING_GAINS_NAME
    },
    sim::{Retune, SimParams, SimRover},
    tuning::TuningRegistry
};
use util::{
    logger::{logger_init, LevelFilter, LoggerConfig},
    module::Command,
    params,
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default scenario parameter file.
const DEFAULT_SIM_PARAMS: &str = "heading_sim.toml";

/// Period at which the tuning thread checks whether it should stop.
const TUNER_POLL_PERIOD: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "heading_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger, the registry's per-lookup messages are only wanted
    // when debugging the tuning itself
    let log_config = LoggerConfig::new(LevelFilter::Debug)
        .module_level("heading_lib::tuning", LevelFilter::Info);
    logger_init(&log_config, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Heading Lock Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let sim_params_path = match args.len() {
        1 => DEFAULT_SIM_PARAMS,
        2 => args[1].as_str(),
        n => return Err(eyre!(
            "Expected either zero or one argument, found {}", n - 1
        ))
    };

    let lock_params: Params = params::load("heading_lock.toml")
        .wrap_err("Could not load heading lock params")?;
    let sim_params: SimParams = params::load(sim_params_path)
        .wrap_err("Could not load simulation params")?;

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    let registry = Arc::new(TuningRegistry::new());
    let tunables = RegistryTunables::register(&registry, &lock_params)
        .wrap_err("Failed to register the heading lock tunables")?;
    info!("Registered tunables: {:?}", registry.names());

    let (rover, drivetrain, camera) = SimRover::new(
        &sim_params, 
        lock_params.max_angular_speed_rads
    ).split();

    let period_s = lock_params.control_period_s;
    let [vx_ms, vy_ms] = sim_params.translation_ms;

    let mut lock = HeadingLock::new(
        lock_params, 
        drivetrain, 
        camera, 
        move || (vx_ms, vy_ms), 
        tunables
    ).wrap_err("Failed to initialise HeadingLock")?;

    info!("Module initialisation complete\n");

    // ---- START TUNING ----

    let start_instant = Instant::now();
    let tuner_stop = Arc::new(AtomicBool::new(false));
    let tuner = spawn_tuner(
        registry.clone(), 
        sim_params.retunes.clone(), 
        start_instant, 
        tuner_stop.clone()
    );

    // ---- MAIN LOOP ----

    let num_cycles = (sim_params.duration_s / period_s).round() as u64;
    let cycles_per_second = ((1.0 / period_s).round() as u64).max(1);

    info!("Begining main loop, running for {} cycles\n", num_cycles);

    lock.initialize().wrap_err("Failed to activate HeadingLock")?;

    for cycle in 0..num_cycles {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        let report = lock.execute()
            .wrap_err("An error occured during HeadingLock processing")?;

        rover.borrow_mut().step(period_s);

        // Status on the 1 Hz
        if cycle % cycles_per_second == 0 {
            let r = rover.borrow();
            info!(
                "t = {:5.2} s: bearing {:7.3} deg, omega {:7.3} rad/s, locked: {}",
                cycle as f64 * period_s,
                r.true_bearing_rad().to_degrees(),
                report.omega_rads,
                report.at_setpoint
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(period_s).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s", 
                cycle_dur.as_secs_f64() - period_s
            )
        }
    }

    // ---- SHUTDOWN ----

    lock.end(false);

    tuner_stop.store(true, Ordering::Relaxed);
    tuner.join().map_err(|_| eyre!("The tuning thread panicked"))?;

    {
        let r = rover.borrow();
        info!(
            "Final bearing {:.3} deg, position {:?} m",
            r.true_bearing_rad().to_degrees(),
            r.position_m()
        );
    }

    info!("End of execution");

    Ok(())
}

/// Spawn the thread which applies the scenario's retunes through the
/// registry at their scheduled times.
fn spawn_tuner(
    registry: Arc<TuningRegistry>,
    retunes: Vec<Retune>,
    start_instant: Instant,
    stop: Arc<AtomicBool>
) -> JoinHandle<()> {
    thread::spawn(move || {
        for retune in retunes {
            let due = match retune.delay().and_then(|d| start_instant.checked_add(d)) {
                Some(d) => d,
                None => {
                    warn!("Skipping retune with invalid time {}", retune.time_s);
                    continue;
                }
            };

            // Wait for the retune to be due
            while Instant::now() < due {
                if stop.load(Ordering::Relaxed) {
                    return;
                }
                thread::sleep(TUNER_POLL_PERIOD);
            }

            apply_retune(&registry, &retune);
        }
    })
}

/// Write a retune's values into the registry.
fn apply_retune(registry: &TuningRegistry, retune: &Retune) {
    info!("Applying retune scheduled at {:.2} s", retune.time_s);

    let results = [
        retune.gains.map(|g| registry.set(TURNING_GAINS_NAME, g)),
        retune.constraints.map(|c| registry.set(TURNING_CONSTRAINTS_NAME, c)),
        retune.angular_velocity_coefficient
            .map(|k| registry.set(ANGULAR_VELOCITY_COEFFICIENT_NAME, k))
    ];

    for result in results.iter().flatten() {
        if let Err(e) = result {
            warn!("Could not apply retune: {}", e);
        }
    }
}
