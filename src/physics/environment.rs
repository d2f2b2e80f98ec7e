use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::utils::constants::{GRAVITY, MIN_AIR_DENSITY, SEA_LEVEL_AIR_DENSITY};

/// Atmospheric conditions around the aircraft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    air_density: f64,
    wind: Vector3<f64>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            air_density: SEA_LEVEL_AIR_DENSITY,
            wind: Vector3::zeros(),
        }
    }
}

impl Environment {
    /// Air density [kg/m^3]
    pub fn air_density(&self) -> f64 {
        self.air_density
    }

    /// Set the air density, floor-clamped to keep it positive
    pub fn set_air_density(&mut self, density: f64) {
        self.air_density = density.max(MIN_AIR_DENSITY);
    }

    /// Gravitational acceleration [m/s^2]
    pub fn gravity(&self) -> f64 {
        GRAVITY
    }

    /// Wind velocity in the NED frame [m/s]
    pub fn wind(&self) -> Vector3<f64> {
        self.wind
    }

    /// Store the ambient wind vector.
    ///
    /// The stored value does not yet affect the force model.
    /// TODO: subtract wind from body velocity when computing airspeed.
    pub fn set_wind(&mut self, wind: Vector3<f64>) {
        self.wind = wind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_density_floor() {
        let mut env = Environment::default();
        env.set_air_density(-5.0);
        assert_eq!(env.air_density(), MIN_AIR_DENSITY);

        env.set_air_density(0.9);
        assert_eq!(env.air_density(), 0.9);
    }
}
