/// Rates of change of a body's primary state
use nalgebra::{Quaternion, Vector3};

use crate::force::ForceModel;
use crate::state::RigidBodyState;

/// Derivative of each primary quantity, sampled at one point in time.
///
/// Velocity is the derivative of position, force of momentum, spin of
/// orientation and torque of angular momentum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derivative {
    pub velocity: Vector3<f64>,
    pub force: Vector3<f64>,
    pub spin: Quaternion<f64>,
    pub torque: Vector3<f64>,
}

impl Default for Derivative {
    fn default() -> Self {
        Self {
            velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            spin: Quaternion::new(0.0, 0.0, 0.0, 0.0),
            torque: Vector3::zeros(),
        }
    }
}

impl Derivative {
    /// Sample the derivative of `state` at time `t`.
    pub fn evaluate<F: ForceModel + ?Sized>(state: &RigidBodyState, t: f64, forces: &F) -> Self {
        let wrench = forces.wrench(state, t);
        Self {
            velocity: state.velocity(),
            force: wrench.force,
            spin: state.spin(),
            torque: wrench.torque,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::{SpringForceModel, ZeroForce};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_copies_state_rates() {
        let mut state =
            RigidBodyState::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0), 2.0, 1.0)
                .unwrap();
        state.set_angular_momentum(Vector3::new(0.0, 0.0, 1.0));

        let derivative = Derivative::evaluate(&state, 0.0, &ZeroForce);
        assert_relative_eq!(derivative.velocity, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(derivative.spin, state.spin());
        assert_eq!(derivative.force, Vector3::zeros());
        assert_eq!(derivative.torque, Vector3::zeros());
    }

    #[test]
    fn test_uses_force_model() {
        let state =
            RigidBodyState::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros(), 1.0, 1.0).unwrap();
        let derivative = Derivative::evaluate(&state, 0.0, &SpringForceModel::restoring(4.0));
        assert_relative_eq!(derivative.force, Vector3::new(-4.0, 0.0, 0.0));
    }
}
