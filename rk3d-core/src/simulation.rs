/// Fixed-timestep accumulator loop.
///
/// The host calls [`Simulation::tick`] once per frame with a monotonic wall
/// clock reading. Elapsed time is accumulated and consumed in whole fixed
/// steps; whatever is left over becomes the interpolation factor between the
/// last two settled states, so rendering stays smooth at any frame rate while
/// the physics always advances by the same `dt`.
use nalgebra::Vector3;

use crate::config::{BodyConfig, SimulationConfig};
use crate::error::{PhysicsError, Result};
use crate::force::{ForceModel, SpringForceModel};
use crate::integrator::Integrator;
use crate::state::RigidBodyState;

/// Output of one tick, handed to the render adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Blend of the previous and current settled states. Read-only output;
    /// never step it.
    pub state: RigidBodyState,
    /// Fraction of a fixed step not yet simulated, in `[0, 1)`.
    pub alpha: f64,
    /// Fixed steps taken during this tick.
    pub steps: usize,
    /// Simulation time of the current settled state.
    pub time: f64,
}

/// Consumer of interpolated frames, typically a renderer.
pub trait RenderAdapter {
    fn render(&mut self, frame: &Frame);
}

impl<F> RenderAdapter for F
where
    F: FnMut(&Frame),
{
    fn render(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// A single rigid body advanced at a fixed rate by a variable-rate host.
#[derive(Debug, Clone)]
pub struct Simulation<F: ForceModel> {
    config: SimulationConfig,
    forces: F,
    current: RigidBodyState,
    previous: RigidBodyState,
    integrator: Integrator,
    t: f64,
    accumulator: f64,
    last_wall_time: f64,
    diverged: bool,
}

impl Simulation<SpringForceModel> {
    /// The rotating cube demo: default body, demo forces, default timing.
    pub fn demo() -> Result<Self> {
        let body = RigidBodyState::from_config(&BodyConfig::default())?;
        Self::new(body, SpringForceModel::demo(), SimulationConfig::default())
    }
}

impl<F: ForceModel> Simulation<F> {
    /// Start a simulation at `t = 0` with the wall clock origin at `0`.
    pub fn new(body: RigidBodyState, forces: F, config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            timestep = config.timestep,
            time_clamp = config.time_clamp,
            method = ?config.method,
            "starting simulation"
        );

        Ok(Self {
            integrator: Integrator::new(&body),
            previous: body.clone(),
            current: body,
            forces,
            config,
            t: 0.0,
            accumulator: 0.0,
            last_wall_time: 0.0,
            diverged: false,
        })
    }

    /// Measure the first tick from `wall_now` instead of `0`.
    #[must_use]
    pub fn with_clock_origin(mut self, wall_now: f64) -> Self {
        self.last_wall_time = wall_now;
        self
    }

    /// Forget elapsed wall time up to `wall_now`, e.g. after a pause.
    pub fn reset_clock(&mut self, wall_now: f64) {
        self.last_wall_time = wall_now;
    }

    /// Consume wall time up to `wall_now` and produce an interpolated frame.
    pub fn tick(&mut self, wall_now: f64) -> Frame {
        let mut delta = wall_now - self.last_wall_time;
        if wall_now.is_finite() {
            self.last_wall_time = wall_now;
        }

        // also catches NaN
        if !(delta >= 0.0) {
            tracing::warn!(delta, "wall clock went backwards, ignoring elapsed time");
            delta = 0.0;
        }
        if delta > self.config.time_clamp {
            tracing::warn!(delta, clamp = self.config.time_clamp, "clamping frame delta");
            delta = self.config.time_clamp;
        }

        self.accumulator += delta;

        let dt = self.config.timestep;
        let max_steps = self.config.max_steps_per_tick();
        let mut steps = 0;
        while self.accumulator >= dt {
            if steps == max_steps {
                // a clamp that is not a whole number of steps leaves a backlog
                let dropped = self.accumulator - self.accumulator % dt;
                tracing::warn!(dropped, max_steps, "step budget exhausted, dropping backlog");
                self.accumulator %= dt;
                break;
            }
            self.step_once();
            self.accumulator -= dt;
            steps += 1;
        }

        if steps > 0 {
            self.watch_divergence();
        }

        let alpha = self.accumulator / dt;
        tracing::trace!(steps, alpha, t = self.t, "tick");

        Frame {
            state: RigidBodyState::interpolate(&self.previous, &self.current, alpha),
            alpha,
            steps,
            time: self.t,
        }
    }

    /// [`tick`](Self::tick), then hand the frame to `adapter`.
    pub fn tick_with<R: RenderAdapter + ?Sized>(&mut self, wall_now: f64, adapter: &mut R) -> Frame {
        let frame = self.tick(wall_now);
        adapter.render(&frame);
        frame
    }

    /// Take `steps` fixed steps without touching the clock or accumulator.
    pub fn advance(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step_once();
        }
        if steps > 0 {
            self.watch_divergence();
        }
    }

    /// Restart from `body` at `t = 0`. The wall clock is left alone.
    pub fn reset(&mut self, body: RigidBodyState) {
        tracing::debug!(t = self.t, "resetting simulation");
        self.integrator = Integrator::new(&body);
        self.previous = body.clone();
        self.current = body;
        self.t = 0.0;
        self.accumulator = 0.0;
        self.diverged = false;
    }

    /// Kick the current state. Takes effect from the next fixed step.
    pub fn apply_impulse(&mut self, linear: Vector3<f64>, angular: Vector3<f64>) {
        self.current.apply_impulse(linear, angular);
    }

    /// Ok while every quantity of the current state is finite.
    pub fn check_finite(&self) -> Result<()> {
        match self.current.first_non_finite() {
            Some(quantity) => Err(PhysicsError::diverged(format!(
                "{} is not finite at t = {:.3}",
                quantity, self.t
            ))),
            None => Ok(()),
        }
    }

    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    pub fn current(&self) -> &RigidBodyState {
        &self.current
    }

    pub fn previous(&self) -> &RigidBodyState {
        &self.previous
    }

    /// Simulation time (seconds).
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Unsimulated wall time carried to the next tick (seconds).
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn alpha(&self) -> f64 {
        self.accumulator / self.config.timestep
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn forces(&self) -> &F {
        &self.forces
    }

    /// Replace the force model; takes effect from the next fixed step.
    pub fn set_forces(&mut self, forces: F) {
        self.forces = forces;
    }

    pub fn max_steps_per_tick(&self) -> usize {
        self.config.max_steps_per_tick()
    }

    fn step_once(&mut self) {
        self.previous.copy_from(&self.current);
        self.integrator.step(
            self.config.method,
            &mut self.current,
            self.t,
            self.config.timestep,
            &self.forces,
        );
        self.t += self.config.timestep;
    }

    fn watch_divergence(&mut self) {
        if self.diverged {
            return;
        }
        if let Err(err) = self.check_finite() {
            tracing::warn!(error = %err, "rigid body state is no longer finite");
            self.diverged = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TIME_CLAMP;
    use crate::force::{Wrench, ZeroForce};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn drifting() -> Simulation<ZeroForce> {
        let body = RigidBodyState::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0), 1.0, 1.0)
            .unwrap();
        // 1/64 s is exact in binary, so accumulator arithmetic is exact too
        Simulation::new(body, ZeroForce, SimulationConfig::with_timestep(0.015625)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let body = RigidBodyState::new(Point3::origin(), Vector3::zeros(), 1.0, 1.0).unwrap();
        let result = Simulation::new(body, ZeroForce, SimulationConfig::with_timestep(-1.0));
        assert_eq!(result.unwrap_err(), PhysicsError::InvalidTimestep(-1.0));
    }

    #[test]
    fn test_tick_steps_and_leftover() {
        let mut sim = drifting();
        let frame = sim.tick(0.0390625); // 2.5 steps

        assert_eq!(frame.steps, 2);
        assert_relative_eq!(frame.alpha, 0.5);
        assert_relative_eq!(sim.time(), 0.03125);
        assert_relative_eq!(sim.current().position().x, 0.03125, epsilon = 1e-12);
        assert_relative_eq!(sim.previous().position().x, 0.015625, epsilon = 1e-12);
        // halfway between previous and current
        assert_relative_eq!(frame.state.position().x, 0.0234375, epsilon = 1e-12);
    }

    #[test]
    fn test_short_ticks_accumulate() {
        let mut sim = drifting();
        assert_eq!(sim.tick(0.0078125).steps, 0);
        assert_eq!(sim.tick(0.015625).steps, 1);
        assert_relative_eq!(sim.accumulator(), 0.0);
    }

    #[test]
    fn test_backwards_clock_does_not_step() {
        let mut sim = drifting().with_clock_origin(10.0);
        let frame = sim.tick(9.0);
        assert_eq!(frame.steps, 0);
        assert_eq!(sim.time(), 0.0);

        let frame = sim.tick(f64::NAN);
        assert_eq!(frame.steps, 0);
        assert_eq!(sim.accumulator(), 0.0);
    }

    #[test]
    fn test_large_delta_is_clamped() {
        let mut sim = drifting();
        let frame = sim.tick(1000.0);
        assert_eq!(frame.steps, 16); // 0.25 / (1/64)
        assert_eq!(frame.steps, sim.max_steps_per_tick());
        assert!(frame.steps as f64 <= TIME_CLAMP / sim.config().timestep);
    }

    #[test]
    fn test_tick_with_calls_adapter() {
        let mut sim = drifting();
        let mut rendered = Vec::new();
        let mut adapter = |frame: &Frame| rendered.push(frame.steps);

        sim.tick_with(0.015625, &mut adapter);
        sim.tick_with(0.015625, &mut adapter);
        assert_eq!(rendered, vec![1, 0]);
    }

    #[test]
    fn test_advance_ignores_clock() {
        let mut sim = drifting();
        sim.advance(4);
        assert_relative_eq!(sim.time(), 0.0625);
        assert_eq!(sim.accumulator(), 0.0);

        // clock origin is still 0, so this tick consumes a full step
        assert_eq!(sim.tick(0.015625).steps, 1);
    }

    #[test]
    fn test_reset() {
        let mut sim = drifting();
        sim.tick(0.2);
        let body = RigidBodyState::new(Point3::new(5.0, 0.0, 0.0), Vector3::zeros(), 1.0, 1.0)
            .unwrap();
        sim.reset(body.clone());

        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.accumulator(), 0.0);
        assert_eq!(sim.current(), &body);
        assert_eq!(sim.previous(), &body);
    }

    #[test]
    fn test_impulse_changes_trajectory() {
        let mut sim = drifting();
        sim.apply_impulse(Vector3::new(0.0, 2.0, 0.0), Vector3::zeros());
        sim.advance(1);
        assert_relative_eq!(sim.current().position().y, 2.0 * 0.015625, epsilon = 1e-12);
    }

    #[test]
    fn test_divergence_is_observable() {
        let blow_up = |_: &RigidBodyState, t: f64| {
            let force = if t > 0.02 { f64::NAN } else { 0.0 };
            Wrench::new(Vector3::new(force, 0.0, 0.0), Vector3::zeros())
        };
        let body = RigidBodyState::new(Point3::origin(), Vector3::zeros(), 1.0, 1.0).unwrap();
        let mut sim = Simulation::new(body, blow_up, SimulationConfig::default()).unwrap();

        sim.advance(1);
        assert!(sim.check_finite().is_ok());
        assert!(!sim.is_diverged());

        sim.advance(5);
        assert!(sim.is_diverged());
        let err = sim.check_finite().unwrap_err();
        assert!(err.is_diverged());
        assert!(err.to_string().contains("position") || err.to_string().contains("momentum"));
    }

    #[test]
    fn test_demo_runs() {
        let mut sim = Simulation::demo().unwrap();
        for frame in 1..=120 {
            sim.tick(frame as f64 / 60.0);
        }
        assert!(sim.check_finite().is_ok());
        assert!(sim.time() > 1.9);
    }
}
