mod dynamics;
mod environment;
mod state;

pub use dynamics::FlightDynamics;
pub use environment::Environment;
pub use state::{AircraftState, ControlInputs, UavProperties};
