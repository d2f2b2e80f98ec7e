pub mod config;
pub mod physics;
pub mod simulation;
pub mod telemetry;
pub mod utils;

pub use config::{ConfigError, SimConfig};
pub use physics::{AircraftState, ControlInputs, Environment, FlightDynamics, UavProperties};
pub use simulation::Simulation;
pub use telemetry::{TelemetryConfig, TelemetryFeed, TelemetryPublisher, TelemetrySnapshot};
pub use utils::SimError;
