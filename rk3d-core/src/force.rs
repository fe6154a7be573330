/// Force models.
///
/// RK4 gets its accuracy from sampling the force field at perturbed states
/// across a step, so forces are never applied as one-off impulses here. A
/// force model is a pure function of the body's state and time that is
/// evaluated four times per step.
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::RigidBodyState;

/// Net force and torque acting on a body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wrench {
    /// Net force (N), world frame.
    pub force: Vector3<f64>,
    /// Net torque (N·m), world frame.
    pub torque: Vector3<f64>,
}

impl Wrench {
    pub fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Computes the wrench on a body at time `t`.
///
/// Implementations must be deterministic and free of side effects: the
/// integrator calls them at slightly offset states within a single step and
/// relies on consistent answers. Only position, velocity, angular velocity
/// and `t` are meant to be read from the state.
pub trait ForceModel {
    fn wrench(&self, state: &RigidBodyState, t: f64) -> Wrench;
}

impl<F> ForceModel for F
where
    F: Fn(&RigidBodyState, f64) -> Wrench,
{
    fn wrench(&self, state: &RigidBodyState, t: f64) -> Wrench {
        self(state, t)
    }
}

/// No force, no torque.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroForce;

impl ForceModel for ZeroForce {
    fn wrench(&self, _state: &RigidBodyState, _t: f64) -> Wrench {
        Wrench::zero()
    }
}

/// Per-axis sine term `amplitude * sin(frequency * t + phase)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Oscillation {
    pub amplitude: Vector3<f64>,
    /// Angular frequency per axis (rad/s).
    pub frequency: Vector3<f64>,
    /// Phase offset per axis (rad).
    pub phase: Vector3<f64>,
}

impl Default for Oscillation {
    fn default() -> Self {
        Self::none()
    }
}

impl Oscillation {
    pub fn new(amplitude: Vector3<f64>, frequency: Vector3<f64>, phase: Vector3<f64>) -> Self {
        Self {
            amplitude,
            frequency,
            phase,
        }
    }

    /// A term that is zero at all times.
    pub fn none() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros(), Vector3::zeros())
    }

    pub fn sample(&self, t: f64) -> Vector3<f64> {
        Vector3::from_fn(|i, _| self.amplitude[i] * (self.frequency[i] * t + self.phase[i]).sin())
    }
}

/// Spring to the origin with time-varying perturbation and angular damping.
///
/// ```text
/// force  = -stiffness * position + force_oscillation(t)
/// torque = torque_oscillation(t) + damping * angular_velocity
/// ```
///
/// `damping` is expected to be negative (or zero) so that it removes
/// rotational energy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringForceModel {
    /// Spring constant pulling the body toward the origin (N/m).
    pub stiffness: f64,
    /// Additive perturbation of the force.
    pub force_oscillation: Oscillation,
    /// Base torque that keeps the body spinning.
    pub torque_oscillation: Oscillation,
    /// Linear angular damping coefficient (N·m·s).
    pub damping: f64,
}

impl Default for SpringForceModel {
    fn default() -> Self {
        Self::demo()
    }
}

impl SpringForceModel {
    /// Constants of the rotating cube demo.
    pub fn demo() -> Self {
        Self {
            stiffness: 10.0,
            force_oscillation: Oscillation::new(
                Vector3::new(10.0, 11.0, 12.0),
                Vector3::new(0.9, 0.5, 0.5),
                Vector3::new(0.5, 0.4, 0.4),
            ),
            torque_oscillation: Oscillation::new(
                Vector3::new(1.0, 1.1, 1.2),
                Vector3::new(0.9, 0.5, 0.7),
                Vector3::new(0.5, 0.4, 0.9),
            ),
            damping: -0.5,
        }
    }

    /// Pure restoring force, no perturbation, no torque.
    pub fn restoring(stiffness: f64) -> Self {
        Self {
            stiffness,
            force_oscillation: Oscillation::none(),
            torque_oscillation: Oscillation::none(),
            damping: 0.0,
        }
    }

    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Elastic energy stored in the spring, `0.5 * k * |x|²`.
    pub fn potential_energy(&self, state: &RigidBodyState) -> f64 {
        0.5 * self.stiffness * state.position().coords.norm_squared()
    }
}

impl ForceModel for SpringForceModel {
    fn wrench(&self, state: &RigidBodyState, t: f64) -> Wrench {
        let force = -self.stiffness * state.position().coords + self.force_oscillation.sample(t);
        let torque = self.torque_oscillation.sample(t) + self.damping * state.angular_velocity();
        Wrench { force, torque }
    }
}
