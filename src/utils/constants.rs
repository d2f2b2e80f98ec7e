pub const GRAVITY: f64 = 9.81; // m/s^2
pub const SEA_LEVEL_AIR_DENSITY: f64 = 1.225; // kg/m^3

// Floors applied by the clamped administrative setters
pub const MIN_MASS: f64 = 0.1; // kg
pub const MIN_WING_AREA: f64 = 0.01; // m^2
pub const MIN_AIR_DENSITY: f64 = 0.01; // kg/m^3

// Below this airspeed the aerodynamic force model is switched off to
// avoid dividing by a near-zero velocity norm
pub const MIN_AERO_AIRSPEED: f64 = 0.1; // m/s

pub const DEFAULT_TIMESTEP: f64 = 0.01; // s

// Telemetry drain rate bounds and defaults
pub const MIN_TELEMETRY_RATE: f64 = 1.0; // Hz
pub const MAX_TELEMETRY_RATE: f64 = 100.0; // Hz
pub const DEFAULT_TELEMETRY_RATE: f64 = 10.0; // Hz
pub const DEFAULT_TELEMETRY_PORT: u16 = 12345;

// Pending snapshots retained before new arrivals are dropped
pub const TELEMETRY_QUEUE_BOUND: usize = 100;
