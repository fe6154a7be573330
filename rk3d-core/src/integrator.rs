/// Fixed-step integration of a rigid body.
///
/// # RK4
///
/// ```text
/// a = f(t,        y)
/// b = f(t + h/2,  y + h/2 * a)
/// c = f(t + h/2,  y + h/2 * b)
/// d = f(t + h,    y + h * c)
/// y(t + h) = y + h/6 * (a + 2b + 2c + d)
/// ```
///
/// Applied independently to position (velocity samples), momentum (force
/// samples), angular momentum (torque samples) and orientation (spin
/// samples). Orientation samples are summed as plain quaternion components
/// and the result is renormalized by [`RigidBodyState::recalculate`]; this is
/// not a manifold integrator, and stage states are never slerped.
use crate::config::IntegrationMethod;
use crate::derivative::Derivative;
use crate::force::ForceModel;
use crate::state::RigidBodyState;

/// Steps a body forward in time.
///
/// Owns the scratch state used to build RK4 stage states, so the state being
/// integrated is only written once all four samples are known.
#[derive(Debug, Clone)]
pub struct Integrator {
    scratch: RigidBodyState,
}

impl Integrator {
    /// Create an integrator whose scratch buffer is shaped like `template`.
    pub fn new(template: &RigidBodyState) -> Self {
        Self {
            scratch: template.clone(),
        }
    }

    /// Derivative of `state` at `t`, without advancing it.
    pub fn evaluate_at<F: ForceModel + ?Sized>(
        &self,
        state: &RigidBodyState,
        t: f64,
        forces: &F,
    ) -> Derivative {
        Derivative::evaluate(state, t, forces)
    }

    /// Derivative at `t + dt` of `state` advanced by `dt` along `derivative`.
    ///
    /// The advanced state lives in the scratch buffer; `state` is untouched.
    pub fn evaluate_at_offset<F: ForceModel + ?Sized>(
        &mut self,
        state: &RigidBodyState,
        t: f64,
        dt: f64,
        derivative: &Derivative,
        forces: &F,
    ) -> Derivative {
        self.scratch.copy_from(state);
        advance(&mut self.scratch, derivative, dt);
        self.scratch.recalculate();

        Derivative::evaluate(&self.scratch, t + dt, forces)
    }

    /// Advance `state` from `t` to `t + dt` with RK4.
    ///
    /// `state` must be the live simulation state; stepping an interpolated
    /// render state gives meaningless results.
    pub fn integrate_step<F: ForceModel + ?Sized>(
        &mut self,
        state: &mut RigidBodyState,
        t: f64,
        dt: f64,
        forces: &F,
    ) {
        let a = self.evaluate_at(state, t, forces);
        let b = self.evaluate_at_offset(state, t, dt * 0.5, &a, forces);
        let c = self.evaluate_at_offset(state, t, dt * 0.5, &b, forces);
        let d = self.evaluate_at_offset(state, t, dt, &c, forces);

        let sixth = dt / 6.0;
        state.position += (a.velocity + (b.velocity + c.velocity) * 2.0 + d.velocity) * sixth;
        state.momentum += (a.force + (b.force + c.force) * 2.0 + d.force) * sixth;
        state.orientation += (a.spin + (b.spin + c.spin) * 2.0 + d.spin) * sixth;
        state.angular_momentum += (a.torque + (b.torque + c.torque) * 2.0 + d.torque) * sixth;

        state.recalculate();
    }

    /// Advance `state` with a single explicit Euler sample.
    pub fn euler_step<F: ForceModel + ?Sized>(
        &mut self,
        state: &mut RigidBodyState,
        t: f64,
        dt: f64,
        forces: &F,
    ) {
        let derivative = self.evaluate_at(state, t, forces);
        advance(state, &derivative, dt);
        state.recalculate();
    }

    /// Advance `state` with the given method.
    pub fn step<F: ForceModel + ?Sized>(
        &mut self,
        method: IntegrationMethod,
        state: &mut RigidBodyState,
        t: f64,
        dt: f64,
        forces: &F,
    ) {
        match method {
            IntegrationMethod::RungeKutta4 => self.integrate_step(state, t, dt, forces),
            IntegrationMethod::ExplicitEuler => self.euler_step(state, t, dt, forces),
        }
    }
}

/// Move the primary quantities of `state` along `derivative` for `dt`.
/// Leaves derived quantities stale; callers recalculate.
fn advance(state: &mut RigidBodyState, derivative: &Derivative, dt: f64) {
    state.position += derivative.velocity * dt;
    state.momentum += derivative.force * dt;
    state.orientation += derivative.spin * dt;
    state.angular_momentum += derivative.torque * dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::{SpringForceModel, Wrench, ZeroForce};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn body() -> RigidBodyState {
        RigidBodyState::new(Point3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -10.0), 1.0, 1.0)
            .unwrap()
    }

    #[test]
    fn test_constant_force_is_exact() {
        let push = |_: &RigidBodyState, _: f64| Wrench::new(Vector3::new(0.0, -2.0, 0.0), Vector3::zeros());
        let mut state =
            RigidBodyState::new(Point3::origin(), Vector3::zeros(), 1.0, 1.0).unwrap();
        let mut integrator = Integrator::new(&state);

        integrator.integrate_step(&mut state, 0.0, 0.1, &push);

        // x = a t² / 2, v = a t
        assert_relative_eq!(state.position().y, -0.01, epsilon = 1e-12);
        assert_relative_eq!(state.velocity().y, -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_offset_evaluation_leaves_input_untouched() {
        let state = body();
        let before = state.clone();
        let mut integrator = Integrator::new(&state);
        let forces = SpringForceModel::demo();

        let a = integrator.evaluate_at(&state, 0.0, &forces);
        let b = integrator.evaluate_at_offset(&state, 0.0, 0.005, &a, &forces);

        assert_eq!(state, before);
        // velocity of the advanced state has picked up a.force * dt / m
        assert_relative_eq!(b.velocity, state.velocity() + a.force * 0.005, epsilon = 1e-12);
    }

    #[test]
    fn test_free_rotation_matches_closed_form() {
        let mut state =
            RigidBodyState::new(Point3::origin(), Vector3::zeros(), 1.0, 1.0).unwrap();
        // I = 1/6, so ω = 1 rad/s about z
        state.set_angular_momentum(Vector3::new(0.0, 0.0, 1.0 / 6.0));
        let mut integrator = Integrator::new(&state);

        for i in 0..100 {
            integrator.integrate_step(&mut state, i as f64 * 0.01, 0.01, &ZeroForce);
        }

        let orientation = state.orientation();
        assert_relative_eq!(orientation.angle(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(orientation.axis().unwrap().into_inner(), Vector3::z(), epsilon = 1e-9);
        assert_relative_eq!(orientation.quaternion().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_step() {
        let mut state = body();
        let mut integrator = Integrator::new(&state);
        integrator.euler_step(&mut state, 0.0, 0.01, &SpringForceModel::restoring(10.0));

        assert_relative_eq!(state.position(), Point3::new(2.0, 0.0, -0.1), epsilon = 1e-12);
        assert_relative_eq!(state.momentum(), Vector3::new(-0.2, 0.0, -10.0), epsilon = 1e-12);
    }

    #[test]
    fn test_step_dispatch() {
        let forces = SpringForceModel::restoring(10.0);
        let mut rk4 = body();
        let mut direct = body();
        let mut integrator = Integrator::new(&rk4);

        integrator.step(IntegrationMethod::RungeKutta4, &mut rk4, 0.0, 0.01, &forces);
        integrator.integrate_step(&mut direct, 0.0, 0.01, &forces);
        assert_eq!(rk4, direct);
    }
}
