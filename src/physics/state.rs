use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Kinematic state of the simulated aircraft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    /// Position in the NED frame [m]
    pub position: Vector3<f64>,

    /// Linear velocity in the body frame [m/s]
    pub velocity: Vector3<f64>,

    /// Euler angles (roll, pitch, yaw) [rad]
    pub orientation: Vector3<f64>,

    /// Angular velocity in the body frame [rad/s]
    pub angular_velocity: Vector3<f64>,

    /// Aircraft mass [kg], always > 0
    pub mass: f64,
}

impl Default for AircraftState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            orientation: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            mass: 1.0,
        }
    }
}

impl AircraftState {
    /// Create a state at a given NED position, otherwise at rest
    pub fn at_position(position: Vector3<f64>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Altitude above the NED origin [m]; down is positive z
    pub fn altitude(&self) -> f64 {
        -self.position.z
    }
}

/// Normalized pilot inputs. Every write path clamps, so stored values
/// are always within range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlInputs {
    /// Throttle setting [0, 1]
    pub throttle: f64,
    /// Aileron deflection [-1, 1], positive = roll right
    pub aileron: f64,
    /// Elevator deflection [-1, 1], positive = pitch up
    pub elevator: f64,
    /// Rudder deflection [-1, 1], positive = yaw right
    pub rudder: f64,
}

impl Default for ControlInputs {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            aileron: 0.0,
            elevator: 0.0,
            rudder: 0.0,
        }
    }
}

impl ControlInputs {
    /// Return a copy with every field clamped to its declared range
    pub fn clamped(&self) -> Self {
        Self {
            throttle: self.throttle.clamp(0.0, 1.0),
            aileron: self.aileron.clamp(-1.0, 1.0),
            elevator: self.elevator.clamp(-1.0, 1.0),
            rudder: self.rudder.clamp(-1.0, 1.0),
        }
    }
}

/// Physical properties of the airframe, constant during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UavProperties {
    /// Airframe mass [kg]
    pub mass: f64,
    /// Diagonal moments of inertia (Ixx, Iyy, Izz) [kg*m^2]
    pub inertia: Vector3<f64>,
    /// Length, wingspan, height [m]
    pub dimensions: Vector3<f64>,
    /// Maximum thrust [N]
    pub max_thrust: f64,
}

impl Default for UavProperties {
    fn default() -> Self {
        // Approximate values for a small fixed-wing UAV
        Self {
            mass: 1.0,
            inertia: Vector3::new(0.5, 0.8, 1.0),
            dimensions: Vector3::new(1.0, 1.5, 0.2),
            max_thrust: 20.0,
        }
    }
}

impl UavProperties {
    /// Wingspan [m], the y component of the airframe dimensions
    pub fn wingspan(&self) -> f64 {
        self.dimensions.y
    }
}
