/// Typed configuration for bodies and the fixed-step loop.
///
/// Every option has a named field and a documented default. Values are
/// resolved and validated once, when a [`RigidBodyState`] or
/// [`Simulation`] is built.
///
/// [`RigidBodyState`]: crate::RigidBodyState
/// [`Simulation`]: crate::Simulation
use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Fixed simulation step (seconds).
pub const TIME_STEP: f64 = 0.01;

/// Largest wall-clock delta a single tick will consume (seconds).
pub const TIME_CLAMP: f64 = 0.25;

/// Initial conditions and constants of a cube-shaped rigid body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyConfig {
    /// Center of mass in world coordinates (m). Default `(2, 0, 0)`.
    pub position: Point3<f64>,
    /// Linear momentum (kg·m/s). Default `(0, 0, -10)`.
    pub momentum: Vector3<f64>,
    /// Body-to-world rotation. Default identity.
    pub orientation: UnitQuaternion<f64>,
    /// Angular momentum (kg·m²/s). Default zero.
    pub angular_momentum: Vector3<f64>,
    /// Mass (kg). Default `1`.
    pub mass: f64,
    /// Cube edge length (m). Default `1`.
    pub size: f64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(2.0, 0.0, 0.0),
            momentum: Vector3::new(0.0, 0.0, -10.0),
            orientation: UnitQuaternion::identity(),
            angular_momentum: Vector3::zeros(),
            mass: 1.0,
            size: 1.0,
        }
    }
}

impl BodyConfig {
    /// A body of the given mass and size at rest at the origin.
    #[must_use]
    pub fn at_rest(mass: f64, size: f64) -> Self {
        Self {
            position: Point3::origin(),
            momentum: Vector3::zeros(),
            mass,
            size,
            ..Default::default()
        }
    }

    /// Set the initial position.
    #[must_use]
    pub fn position(mut self, position: Point3<f64>) -> Self {
        self.position = position;
        self
    }

    /// Set the initial linear momentum.
    #[must_use]
    pub fn momentum(mut self, momentum: Vector3<f64>) -> Self {
        self.momentum = momentum;
        self
    }

    /// Set the initial orientation.
    #[must_use]
    pub fn orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the initial angular momentum.
    #[must_use]
    pub fn angular_momentum(mut self, angular_momentum: Vector3<f64>) -> Self {
        self.angular_momentum = angular_momentum;
        self
    }

    /// Reject non-positive or non-finite mass and size.
    pub fn validate(&self) -> Result<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(self.mass));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(PhysicsError::InvalidSize(self.size));
        }
        Ok(())
    }
}

/// Numerical method used for each fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntegrationMethod {
    /// Classic fourth-order Runge-Kutta.
    #[default]
    RungeKutta4,
    /// First-order explicit Euler, kept as an accuracy baseline.
    ExplicitEuler,
}

/// Settings for the fixed-step accumulator loop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Fixed step (seconds). Default [`TIME_STEP`].
    pub timestep: f64,
    /// Upper bound on the wall-clock delta consumed per tick (seconds).
    /// Default [`TIME_CLAMP`].
    pub time_clamp: f64,
    /// Integration method. Default RK4.
    pub method: IntegrationMethod,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: TIME_STEP,
            time_clamp: TIME_CLAMP,
            method: IntegrationMethod::RungeKutta4,
        }
    }
}

impl SimulationConfig {
    /// Default config with the given timestep.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            ..Default::default()
        }
    }

    /// Set the per-tick clamp.
    #[must_use]
    pub fn time_clamp(mut self, time_clamp: f64) -> Self {
        self.time_clamp = time_clamp;
        self
    }

    /// Set the integration method.
    #[must_use]
    pub fn method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(PhysicsError::InvalidTimestep(self.timestep));
        }
        if !self.time_clamp.is_finite() {
            return Err(PhysicsError::invalid_config("time clamp must be finite"));
        }
        if self.time_clamp < self.timestep {
            return Err(PhysicsError::invalid_config(format!(
                "time clamp {} is shorter than one timestep {}",
                self.time_clamp, self.timestep
            )));
        }
        Ok(())
    }

    /// Most fixed steps a single tick can take. Wall time beyond this budget
    /// is dropped by [`Simulation::tick`](crate::Simulation::tick).
    #[must_use]
    pub fn max_steps_per_tick(&self) -> usize {
        (self.time_clamp / self.timestep).floor() as usize
    }

    /// Simulation frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.timestep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo() {
        let config = SimulationConfig::default();
        assert_eq!(config.timestep, 0.01);
        assert_eq!(config.time_clamp, 0.25);
        assert_eq!(config.method, IntegrationMethod::RungeKutta4);
        assert_eq!(config.max_steps_per_tick(), 25);

        let body = BodyConfig::default();
        assert_eq!(body.position, Point3::new(2.0, 0.0, 0.0));
        assert_eq!(body.momentum, Vector3::new(0.0, 0.0, -10.0));
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_timestep() {
        assert_eq!(
            SimulationConfig::with_timestep(0.0).validate(),
            Err(PhysicsError::InvalidTimestep(0.0))
        );
        assert!(SimulationConfig::with_timestep(f64::NAN).validate().is_err());
        assert!(SimulationConfig::default()
            .time_clamp(0.001)
            .validate()
            .is_err());
        assert!(SimulationConfig::default()
            .time_clamp(f64::INFINITY)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_bad_body() {
        let err = BodyConfig::at_rest(0.0, 1.0).validate().unwrap_err();
        assert_eq!(err, PhysicsError::InvalidMass(0.0));

        let err = BodyConfig::at_rest(1.0, -2.0).validate().unwrap_err();
        assert_eq!(err, PhysicsError::InvalidSize(-2.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let body = BodyConfig::default()
            .orientation(UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3))
            .angular_momentum(Vector3::new(0.5, 0.0, -0.5));
        let json = serde_json::to_string(&body).unwrap();
        let restored: BodyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.position, body.position);
        assert_eq!(restored.mass, body.mass);
        assert!((restored.orientation.angle_to(&body.orientation)).abs() < 1e-12);

        let config = SimulationConfig::with_timestep(0.005).method(IntegrationMethod::ExplicitEuler);
        let json = serde_json::to_string(&config).unwrap();
        let restored: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
