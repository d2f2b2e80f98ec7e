use nalgebra::{Matrix3, Vector3};

use crate::physics::{AircraftState, ControlInputs, Environment, UavProperties};
use crate::utils::constants::{MIN_AERO_AIRSPEED, MIN_MASS, MIN_WING_AREA};

// Linear control-surface gains mapping deflection to body moments [N*m]
const AILERON_ROLL_GAIN: f64 = 2.0;
const ELEVATOR_PITCH_GAIN: f64 = 1.5;
const RUDDER_YAW_GAIN: f64 = 1.0;

/// Simplified 6-DOF rigid-body flight model for a small fixed-wing UAV.
///
/// The model integrates lift, drag, thrust and gravity in the body frame,
/// maps control-surface deflections to moments through linear gains, and
/// propagates orientation as Euler angles. It performs no I/O and never
/// fails: physically invalid configuration is prevented by the clamped
/// setters rather than checked at update time.
#[derive(Debug, Clone)]
pub struct FlightDynamics {
    state: AircraftState,
    controls: ControlInputs,
    properties: UavProperties,
    environment: Environment,

    // Aerodynamic parameters
    wing_area: f64,
    lift_coefficient: f64,
    drag_coefficient: f64,

    // Inertia tensor (diagonal) and its inverse, rebuilt when properties change
    inertia: Matrix3<f64>,
    inertia_inv: Matrix3<f64>,

    // Rotation matrices cached at the top of each tick; several force and
    // integration terms within one tick must share the same orientation
    body_to_ned: Matrix3<f64>,
    ned_to_body: Matrix3<f64>,
}

impl Default for FlightDynamics {
    fn default() -> Self {
        Self::new(UavProperties::default())
    }
}

impl FlightDynamics {
    pub fn new(properties: UavProperties) -> Self {
        let inertia = Matrix3::from_diagonal(&properties.inertia);
        let inertia_inv = inertia.try_inverse().unwrap_or_else(Matrix3::identity);
        Self {
            state: AircraftState::default(),
            controls: ControlInputs::default(),
            properties,
            environment: Environment::default(),
            wing_area: 0.5,
            lift_coefficient: 1.2,
            drag_coefficient: 0.1,
            inertia,
            inertia_inv,
            body_to_ned: Matrix3::identity(),
            ned_to_body: Matrix3::identity(),
        }
    }

    pub fn state(&self) -> AircraftState {
        self.state.clone()
    }

    /// Direct state override, used for initialization and reset.
    /// The mass floor is the only invariant enforced.
    pub fn set_state(&mut self, state: AircraftState) {
        self.state = state;
        self.state.mass = self.state.mass.max(MIN_MASS);
    }

    pub fn controls(&self) -> ControlInputs {
        self.controls
    }

    /// Store control inputs, clamping each field to its declared range
    pub fn set_controls(&mut self, controls: ControlInputs) {
        self.controls = controls.clamped();
    }

    pub fn properties(&self) -> &UavProperties {
        &self.properties
    }

    pub fn set_properties(&mut self, properties: UavProperties) {
        self.inertia = Matrix3::from_diagonal(&properties.inertia);
        self.inertia_inv = self.inertia.try_inverse().unwrap_or_else(Matrix3::identity);
        self.properties = properties;
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn set_air_density(&mut self, density: f64) {
        self.environment.set_air_density(density);
    }

    /// Declared extension point; the stored wind has no effect yet
    pub fn set_wind(&mut self, wind: Vector3<f64>) {
        self.environment.set_wind(wind);
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.state.mass = mass.max(MIN_MASS);
    }

    pub fn set_wingspan_area(&mut self, area: f64) {
        self.wing_area = area.max(MIN_WING_AREA);
    }

    pub fn set_lift_coefficient(&mut self, cl: f64) {
        self.lift_coefficient = cl;
    }

    pub fn set_drag_coefficient(&mut self, cd: f64) {
        self.drag_coefficient = cd.max(0.0);
    }

    /// Advance the state by one timestep.
    ///
    /// A non-positive `dt` is a no-op, so a misbehaving driver can neither
    /// freeze mid-step nor run time backwards. Orientation is propagated as
    /// Euler angles; the kinematic transform is singular at pitch ±90° and
    /// that gimbal lock is a known limitation of the model.
    pub fn update(&mut self, dt: f64) {
        if !(dt > 0.0) {
            return;
        }

        self.update_rotation_matrices();
        self.update_forces(dt);
        self.update_moments(dt);
        self.integrate_state(dt);
    }

    /// Rebuild the cached body->NED matrix (Z-Y-X convention) and its
    /// transpose from the current Euler angles
    fn update_rotation_matrices(&mut self) {
        let roll = self.state.orientation.x;
        let pitch = self.state.orientation.y;
        let yaw = self.state.orientation.z;

        let (sphi, cphi) = roll.sin_cos();
        let (stheta, ctheta) = pitch.sin_cos();
        let (spsi, cpsi) = yaw.sin_cos();

        self.body_to_ned = Matrix3::new(
            cpsi * ctheta,
            cpsi * stheta * sphi - spsi * cphi,
            cpsi * stheta * cphi + spsi * sphi,
            spsi * ctheta,
            spsi * stheta * sphi + cpsi * cphi,
            spsi * stheta * cphi - cpsi * sphi,
            -stheta,
            ctheta * sphi,
            ctheta * cphi,
        );
        self.ned_to_body = self.body_to_ned.transpose();
    }

    fn update_forces(&mut self, dt: f64) {
        let total_force = self.lift() + self.drag() + self.thrust() + self.gravity_body();
        let acceleration = total_force / self.state.mass;
        self.state.velocity += acceleration * dt;
    }

    fn update_moments(&mut self, dt: f64) {
        let total_moment =
            self.aileron_moment() + self.elevator_moment() + self.rudder_moment();
        let angular_accel = self.inertia_inv * total_moment;
        self.state.angular_velocity += angular_accel * dt;
    }

    fn integrate_state(&mut self, dt: f64) {
        // Position advances along the velocity rotated with the matrix
        // cached at the top of the tick, i.e. the pre-update orientation
        let velocity_ned = self.body_to_ned * self.state.velocity;
        self.state.position += velocity_ned * dt;

        // Body rates -> Euler-angle rates. The transform depends on the
        // current roll and pitch and is singular at pitch ±90°.
        let roll = self.state.orientation.x;
        let pitch = self.state.orientation.y;
        let (sphi, cphi) = roll.sin_cos();
        let ttheta = pitch.tan();
        let ctheta = pitch.cos();

        let rates = Matrix3::new(
            1.0,
            sphi * ttheta,
            cphi * ttheta,
            0.0,
            cphi,
            -sphi,
            0.0,
            sphi / ctheta,
            cphi / ctheta,
        );

        let euler_rates = rates * self.state.angular_velocity;
        self.state.orientation += euler_rates * dt;
    }

    /// Lift magnitude 0.5*rho*v^2*CL*S along body -Z. The direction is a
    /// perpendicular-to-velocity simplification, not a full aero model.
    fn lift(&self) -> Vector3<f64> {
        let airspeed = self.state.velocity.norm();
        if airspeed < MIN_AERO_AIRSPEED {
            return Vector3::zeros();
        }

        let magnitude = 0.5
            * self.environment.air_density()
            * airspeed
            * airspeed
            * self.lift_coefficient
            * self.wing_area;
        Vector3::new(0.0, 0.0, -magnitude)
    }

    /// Drag magnitude 0.5*rho*v^2*CD*S opposite the velocity vector
    fn drag(&self) -> Vector3<f64> {
        let airspeed = self.state.velocity.norm();
        if airspeed < MIN_AERO_AIRSPEED {
            return Vector3::zeros();
        }

        let magnitude = 0.5
            * self.environment.air_density()
            * airspeed
            * airspeed
            * self.drag_coefficient
            * self.wing_area;
        -self.state.velocity.normalize() * magnitude
    }

    /// Thrust acts along body +X only
    fn thrust(&self) -> Vector3<f64> {
        Vector3::new(self.controls.throttle * self.properties.max_thrust, 0.0, 0.0)
    }

    /// Weight (0, 0, m*g) in NED, rotated into the body frame
    fn gravity_body(&self) -> Vector3<f64> {
        let gravity_ned = Vector3::new(0.0, 0.0, self.state.mass * self.environment.gravity());
        self.ned_to_body * gravity_ned
    }

    fn aileron_moment(&self) -> Vector3<f64> {
        let roll = self.controls.aileron * AILERON_ROLL_GAIN * self.properties.wingspan();
        Vector3::new(roll, 0.0, 0.0)
    }

    fn elevator_moment(&self) -> Vector3<f64> {
        Vector3::new(0.0, self.controls.elevator * ELEVATOR_PITCH_GAIN, 0.0)
    }

    fn rudder_moment(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, self.controls.rudder * RUDDER_YAW_GAIN)
    }
}
