use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::info;
use nalgebra::Vector3;

use crate::physics::{AircraftState, ControlInputs, FlightDynamics};
use crate::telemetry::TelemetryFeed;
use crate::utils::constants::DEFAULT_TIMESTEP;
use crate::utils::{lock_recover, SimError};

/// Owns one [`FlightDynamics`] engine and runs it on a dedicated thread at
/// a fixed cadence.
///
/// All external access to the shared engine goes through this façade, which
/// serializes it against the tick thread behind a mutex. The pacing is soft
/// real time: each tick integrates the wall-clock elapsed time and then
/// sleeps the remainder of the period; an overrunning tick is not
/// compensated, so drift can accumulate.
pub struct Simulation {
    engine: Arc<Mutex<FlightDynamics>>,
    telemetry: Arc<Mutex<Option<TelemetryFeed>>>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    timestep: f64,
    handle: Option<JoinHandle<()>>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTEP)
    }
}

impl Simulation {
    /// Create a stopped simulation with the given tick period [s].
    /// A non-positive or non-finite period falls back to the default.
    pub fn new(timestep: f64) -> Self {
        let timestep = if timestep.is_finite() && timestep > 0.0 {
            timestep
        } else {
            DEFAULT_TIMESTEP
        };
        Self {
            engine: Arc::new(Mutex::new(FlightDynamics::default())),
            telemetry: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            timestep,
            handle: None,
        }
    }

    /// Spawn the tick thread.
    ///
    /// Fails with [`SimError::Lifecycle`] when the simulation is already
    /// running (paused counts as running: the thread is alive).
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.handle.is_some() {
            return Err(SimError::Lifecycle("simulation already running".into()));
        }

        self.running.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);

        let engine = Arc::clone(&self.engine);
        let telemetry = Arc::clone(&self.telemetry);
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let period = Duration::from_secs_f64(self.timestep);

        let handle = thread::Builder::new()
            .name("sim-tick".into())
            .spawn(move || tick_loop(engine, telemetry, running, paused, period))
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                SimError::Io(e)
            })?;

        self.handle = Some(handle);
        info!("simulation started ({} s timestep)", self.timestep);
        Ok(())
    }

    /// Stop the tick thread and wait for it to exit. Idempotent; calling
    /// it on a stopped simulation returns immediately.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            info!("simulation stopped");
        }
    }

    /// Suspend integration; the tick thread stays alive and keeps pacing
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Configured tick period [s]
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn state(&self) -> AircraftState {
        lock_recover(&self.engine).state()
    }

    pub fn set_state(&self, state: AircraftState) {
        lock_recover(&self.engine).set_state(state);
    }

    pub fn controls(&self) -> ControlInputs {
        lock_recover(&self.engine).controls()
    }

    /// Set the throttle, clamped to [0, 1]. The control surfaces keep
    /// their current deflections.
    pub fn set_thrust(&self, throttle: f64) {
        let mut engine = lock_recover(&self.engine);
        let mut controls = engine.controls();
        controls.throttle = throttle;
        engine.set_controls(controls);
    }

    /// Set aileron, elevator and rudder, each clamped to [-1, 1]. The
    /// throttle keeps its current setting.
    pub fn set_control_surfaces(&self, aileron: f64, elevator: f64, rudder: f64) {
        let mut engine = lock_recover(&self.engine);
        let mut controls = engine.controls();
        controls.aileron = aileron;
        controls.elevator = elevator;
        controls.rudder = rudder;
        engine.set_controls(controls);
    }

    /// Run an administrative operation against the engine under the lock,
    /// e.g. setting physical properties or aerodynamic coefficients
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut FlightDynamics) -> R) -> R {
        f(&mut lock_recover(&self.engine))
    }

    /// Convenience passthrough for the most common environment knob
    pub fn set_wind(&self, wind: Vector3<f64>) {
        lock_recover(&self.engine).set_wind(wind);
    }

    /// Attach (or replace) the telemetry producer handle. The tick thread
    /// publishes one snapshot per unpaused tick through it.
    pub fn set_telemetry(&self, feed: TelemetryFeed) {
        *lock_recover(&self.telemetry) = Some(feed);
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_loop(
    engine: Arc<Mutex<FlightDynamics>>,
    telemetry: Arc<Mutex<Option<TelemetryFeed>>>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    period: Duration,
) {
    let mut last_tick = Instant::now();

    while running.load(Ordering::Acquire) {
        let tick_start = Instant::now();
        // The reference advances every tick, paused or not, so resuming
        // never integrates the pause duration as one giant step
        let dt = tick_start.duration_since(last_tick).as_secs_f64();
        last_tick = tick_start;

        if !paused.load(Ordering::Acquire) {
            let (state, controls) = {
                let mut engine = lock_recover(&engine);
                engine.update(dt);
                (engine.state(), engine.controls())
            };

            // Publish outside the engine lock; the feed never blocks
            if let Some(feed) = lock_recover(&telemetry).as_ref() {
                feed.publish(&state, &controls);
            }
        }

        let elapsed = tick_start.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_start_is_rejected() {
        let mut sim = Simulation::default();
        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(SimError::Lifecycle(_))));
        sim.stop();
    }

    #[test]
    fn test_stop_is_idempotent_and_restart_works() {
        let mut sim = Simulation::default();
        sim.stop(); // stopping a stopped simulation is a no-op
        sim.start().unwrap();
        sim.stop();
        sim.stop();
        sim.start().unwrap();
        sim.stop();
    }

    #[test]
    fn test_invalid_timestep_falls_back_to_default() {
        assert_eq!(Simulation::new(-1.0).timestep(), DEFAULT_TIMESTEP);
        assert_eq!(Simulation::new(f64::NAN).timestep(), DEFAULT_TIMESTEP);
        assert_eq!(Simulation::new(0.02).timestep(), 0.02);
    }

    #[test]
    fn test_facade_clamps_controls() {
        let sim = Simulation::default();
        sim.set_thrust(3.0);
        sim.set_control_surfaces(-2.0, 0.5, 2.0);

        let controls = sim.controls();
        assert_eq!(controls.throttle, 1.0);
        assert_eq!(controls.aileron, -1.0);
        assert_eq!(controls.elevator, 0.5);
        assert_eq!(controls.rudder, 1.0);
    }

    #[test]
    fn test_thrust_preserves_surfaces() {
        let sim = Simulation::default();
        sim.set_control_surfaces(0.3, -0.2, 0.1);
        sim.set_thrust(0.7);

        let controls = sim.controls();
        assert_eq!(controls.throttle, 0.7);
        assert_eq!(controls.aileron, 0.3);
        assert_eq!(controls.elevator, -0.2);
        assert_eq!(controls.rudder, 0.1);
    }
}
