use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::physics::{AircraftState, ControlInputs};

/// Number of comma-separated fields in one wire datagram
pub const WIRE_FIELD_COUNT: usize = 14;

/// One immutable telemetry record capturing the externally visible state
/// of a single simulation tick.
///
/// The wire form is a single CSV text line with fixed field order:
/// `timestamp,pos_north,pos_east,pos_down,vel_x,vel_y,vel_z,roll,pitch,yaw,
/// throttle,aileron,elevator,rudder`, each value fixed-point with six
/// decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Capture time [s], wall clock
    pub timestamp: f64,

    // Position, NED frame [m]
    pub position_north: f64,
    pub position_east: f64,
    pub position_down: f64,

    // Velocity, body frame [m/s]
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,

    // Orientation [rad]
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,

    // Control inputs, native ranges
    pub throttle: f64,
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
}

impl TelemetrySnapshot {
    /// Build a snapshot of the given state and controls, stamped with the
    /// current wall-clock time
    pub fn capture(state: &AircraftState, controls: &ControlInputs) -> Self {
        Self::at_time(now_seconds(), state, controls)
    }

    /// Build a snapshot with an explicit timestamp
    pub fn at_time(timestamp: f64, state: &AircraftState, controls: &ControlInputs) -> Self {
        Self {
            timestamp,
            position_north: state.position.x,
            position_east: state.position.y,
            position_down: state.position.z,
            velocity_x: state.velocity.x,
            velocity_y: state.velocity.y,
            velocity_z: state.velocity.z,
            roll: state.orientation.x,
            pitch: state.orientation.y,
            yaw: state.orientation.z,
            throttle: controls.throttle,
            aileron: controls.aileron,
            elevator: controls.elevator,
            rudder: controls.rudder,
        }
    }

    /// Render the CSV wire line
    pub fn to_wire(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            self.timestamp,
            self.position_north,
            self.position_east,
            self.position_down,
            self.velocity_x,
            self.velocity_y,
            self.velocity_z,
            self.roll,
            self.pitch,
            self.yaw,
            self.throttle,
            self.aileron,
            self.elevator,
            self.rudder,
        )
    }

    /// Parse a wire line back into a snapshot.
    ///
    /// Returns `None` for lines with fewer than fourteen comma-separated
    /// fields or with unparsable numbers; receivers must tolerate such
    /// datagrams. Fields beyond the fourteenth are ignored.
    pub fn from_wire(line: &str) -> Option<Self> {
        let mut fields = [0.0f64; WIRE_FIELD_COUNT];
        let mut count = 0;

        for part in line.trim_end().split(',') {
            if count == WIRE_FIELD_COUNT {
                break;
            }
            fields[count] = part.trim().parse().ok()?;
            count += 1;
        }
        if count < WIRE_FIELD_COUNT {
            return None;
        }

        Some(Self {
            timestamp: fields[0],
            position_north: fields[1],
            position_east: fields[2],
            position_down: fields[3],
            velocity_x: fields[4],
            velocity_y: fields[5],
            velocity_z: fields[6],
            roll: fields[7],
            pitch: fields[8],
            yaw: fields[9],
            throttle: fields[10],
            aileron: fields[11],
            elevator: fields[12],
            rudder: fields[13],
        })
    }
}

/// Current wall-clock time as fractional seconds since the Unix epoch
pub(crate) fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 * 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::AircraftState;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn sample_snapshot() -> TelemetrySnapshot {
        let mut state = AircraftState::default();
        state.position = Vector3::new(12.5, -3.25, -102.125);
        state.velocity = Vector3::new(18.0, 0.5, -0.75);
        state.orientation = Vector3::new(0.05, -0.02, 1.570796);
        let controls = ControlInputs {
            throttle: 0.8,
            aileron: 0.2,
            elevator: -0.1,
            rudder: 0.0,
        };
        TelemetrySnapshot::at_time(1234.567891, &state, &controls)
    }

    #[test]
    fn test_wire_round_trip_within_precision() {
        let snapshot = sample_snapshot();
        let parsed = TelemetrySnapshot::from_wire(&snapshot.to_wire()).unwrap();

        assert_relative_eq!(parsed.timestamp, snapshot.timestamp, epsilon = 1e-6);
        assert_relative_eq!(parsed.position_north, snapshot.position_north, epsilon = 1e-6);
        assert_relative_eq!(parsed.position_down, snapshot.position_down, epsilon = 1e-6);
        assert_relative_eq!(parsed.velocity_x, snapshot.velocity_x, epsilon = 1e-6);
        assert_relative_eq!(parsed.yaw, snapshot.yaw, epsilon = 1e-6);
        assert_relative_eq!(parsed.throttle, snapshot.throttle, epsilon = 1e-6);
        assert_relative_eq!(parsed.rudder, snapshot.rudder, epsilon = 1e-6);
    }

    #[test]
    fn test_wire_line_has_fixed_field_count() {
        let line = sample_snapshot().to_wire();
        assert_eq!(line.split(',').count(), WIRE_FIELD_COUNT);
    }

    #[test]
    fn test_short_datagram_is_rejected() {
        assert_eq!(TelemetrySnapshot::from_wire("1.0,2.0,3.0"), None);
        assert_eq!(TelemetrySnapshot::from_wire(""), None);
    }

    #[test]
    fn test_garbled_datagram_is_rejected() {
        let mut line = sample_snapshot().to_wire();
        line.replace_range(0..3, "xyz");
        assert_eq!(TelemetrySnapshot::from_wire(&line), None);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let line = format!("{},99.0,100.0", sample_snapshot().to_wire());
        assert!(TelemetrySnapshot::from_wire(&line).is_some());
    }
}
