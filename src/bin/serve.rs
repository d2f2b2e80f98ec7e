use std::env;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use nalgebra::Vector3;

use kestrel::{AircraftState, SimConfig, Simulation, TelemetryPublisher, TelemetrySnapshot};

/// Headless telemetry server: runs the simulation, streams state over UDP
/// and flies a simple repeating control pattern so subscribers have
/// something to watch.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match env::var("KESTREL_CONFIG") {
        Ok(path) => SimConfig::from_file(&path)?,
        Err(_) => SimConfig::default(),
    };

    let mut sim = Simulation::new(config.timestep);
    // Start at 100 m altitude; -z is up in NED
    sim.set_state(AircraftState::at_position(Vector3::new(0.0, 0.0, -100.0)));

    let mut publisher = TelemetryPublisher::new(config.telemetry.clone());
    sim.set_telemetry(publisher.feed());

    publisher.start()?;
    sim.start()?;

    info!(
        "serving telemetry on UDP port {}; send REGISTER to subscribe",
        config.telemetry.port
    );
    println!("kestrel_serve running; press Enter to stop");

    // The operator ends the session from stdin; the pattern loop below
    // watches this flag
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut line = String::new();
            let _ = io::stdin().lock().read_line(&mut line);
            running.store(false, Ordering::Release);
        });
    }

    sim.set_thrust(0.8);

    let start_time = Instant::now();
    let mut last_status_log = 0;
    while running.load(Ordering::Acquire) {
        let elapsed = start_time.elapsed().as_secs();

        // Change the flight pattern every ten seconds
        match (elapsed / 10) % 4 {
            0 => sim.set_control_surfaces(0.0, 0.0, 0.0), // straight flight
            1 => sim.set_control_surfaces(0.2, 0.0, 0.0), // roll right
            2 => sim.set_control_surfaces(0.0, 0.2, 0.0), // climb
            _ => sim.set_control_surfaces(-0.2, 0.0, 0.0), // roll left
        }

        if elapsed % 5 == 0 && elapsed != last_status_log {
            last_status_log = elapsed;
            let state = sim.state();
            info!(
                "altitude {:.1} m, {} subscriber(s)",
                state.altitude(),
                publisher.subscriber_count()
            );
            let snapshot = TelemetrySnapshot::capture(&state, &sim.controls());
            debug!(
                "state: {}",
                serde_json::to_string(&snapshot).unwrap_or_default()
            );
        }

        thread::sleep(Duration::from_millis(200));
    }

    sim.stop();
    publisher.stop();
    println!("kestrel_serve stopped");
    Ok(())
}
