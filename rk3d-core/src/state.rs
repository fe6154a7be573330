/// Rigid body state: primary, derived and constant quantities.
///
/// Primary quantities (position, momentum, orientation, angular momentum) are
/// the ones an integrator advances. Everything else is either fixed at
/// construction or recomputed from the primaries by
/// [`RigidBodyState::recalculate`]. Fields are private; every public mutator
/// recalculates before returning, so a state observed from outside the crate
/// is always self-consistent.
use nalgebra::{Isometry3, Matrix4, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

use crate::config::BodyConfig;
use crate::error::Result;

/// Physical state of a cube-shaped rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyState {
    // primary
    pub(crate) position: Point3<f64>,
    pub(crate) momentum: Vector3<f64>,
    pub(crate) orientation: Quaternion<f64>,
    pub(crate) angular_momentum: Vector3<f64>,

    // derived
    velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    spin: Quaternion<f64>,
    body_to_world: Matrix4<f64>,
    world_to_body: Matrix4<f64>,

    // constant
    size: f64,
    mass: f64,
    inverse_mass: f64,
    inertia_tensor: f64,
    inverse_inertia_tensor: f64,
}

impl RigidBodyState {
    /// Create a body with identity orientation and no angular momentum.
    ///
    /// Fails with [`PhysicsError::InvalidMass`] or
    /// [`PhysicsError::InvalidSize`] if either constant is not positive.
    ///
    /// [`PhysicsError::InvalidMass`]: crate::PhysicsError::InvalidMass
    /// [`PhysicsError::InvalidSize`]: crate::PhysicsError::InvalidSize
    pub fn new(position: Point3<f64>, momentum: Vector3<f64>, mass: f64, size: f64) -> Result<Self> {
        Self::from_config(&BodyConfig {
            position,
            momentum,
            mass,
            size,
            ..BodyConfig::default()
        })
    }

    /// Create a body from a full set of initial conditions.
    pub fn from_config(config: &BodyConfig) -> Result<Self> {
        config.validate()?;

        let inertia_tensor = config.mass * config.size * config.size / 6.0;
        let mut state = Self {
            position: config.position,
            momentum: config.momentum,
            orientation: config.orientation.into_inner(),
            angular_momentum: config.angular_momentum,
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            spin: Quaternion::new(0.0, 0.0, 0.0, 0.0),
            body_to_world: Matrix4::identity(),
            world_to_body: Matrix4::identity(),
            size: config.size,
            mass: config.mass,
            inverse_mass: 1.0 / config.mass,
            inertia_tensor,
            inverse_inertia_tensor: 1.0 / inertia_tensor,
        };
        state.recalculate();

        tracing::debug!(
            mass = state.mass,
            size = state.size,
            inertia = state.inertia_tensor,
            "created rigid body state"
        );
        Ok(state)
    }

    /// Recompute derived quantities from primary and constant ones.
    ///
    /// Renormalizes the orientation to correct numerical drift.
    pub fn recalculate(&mut self) {
        self.velocity = self.momentum * self.inverse_mass;
        self.angular_velocity = self.angular_momentum * self.inverse_inertia_tensor;

        self.orientation = self.orientation.normalize();
        self.spin = Quaternion::from_parts(0.0, self.angular_velocity) * self.orientation * 0.5;

        let isometry = self.isometry();
        self.body_to_world = isometry.to_homogeneous();
        self.world_to_body = isometry.inverse().to_homogeneous();
    }

    /// Overwrite every field with a copy of `other`.
    pub fn copy_from(&mut self, other: &RigidBodyState) {
        self.clone_from(other);
    }

    /// Blend two settled states for rendering.
    ///
    /// Position, momentum and angular momentum are interpolated linearly,
    /// orientation spherically. Constants are taken from `current`.
    #[must_use]
    pub fn interpolate(previous: &RigidBodyState, current: &RigidBodyState, alpha: f64) -> Self {
        let mut state = current.clone();

        state.position = previous.position.coords.lerp(&current.position.coords, alpha).into();
        state.momentum = previous.momentum.lerp(&current.momentum, alpha);
        state.angular_momentum = previous.angular_momentum.lerp(&current.angular_momentum, alpha);

        let from = previous.orientation();
        let to = current.orientation();
        // slerp is ill-conditioned for (nearly) coincident orientations
        let blended = from
            .try_slerp(&to, alpha, 1.0e-9)
            .unwrap_or(if alpha < 0.5 { from } else { to });
        state.orientation = blended.into_inner();

        state.recalculate();
        state
    }

    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    pub fn momentum(&self) -> Vector3<f64> {
        self.momentum
    }

    /// Body-to-world rotation.
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::new_unchecked(self.orientation)
    }

    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.angular_momentum
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    /// Rate of change of the orientation quaternion.
    pub fn spin(&self) -> Quaternion<f64> {
        self.spin
    }

    pub fn body_to_world(&self) -> &Matrix4<f64> {
        &self.body_to_world
    }

    pub fn world_to_body(&self) -> &Matrix4<f64> {
        &self.world_to_body
    }

    /// Rigid transform built from position and orientation.
    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.position.coords),
            UnitQuaternion::new_unchecked(self.orientation),
        )
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn inertia_tensor(&self) -> f64 {
        self.inertia_tensor
    }

    pub fn inverse_inertia_tensor(&self) -> f64 {
        self.inverse_inertia_tensor
    }

    pub fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
        self.recalculate();
    }

    pub fn set_momentum(&mut self, momentum: Vector3<f64>) {
        self.momentum = momentum;
        self.recalculate();
    }

    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = orientation.into_inner();
        self.recalculate();
    }

    pub fn set_angular_momentum(&mut self, angular_momentum: Vector3<f64>) {
        self.angular_momentum = angular_momentum;
        self.recalculate();
    }

    /// Add an instantaneous change of linear and angular momentum.
    pub fn apply_impulse(&mut self, linear: Vector3<f64>, angular: Vector3<f64>) {
        self.momentum += linear;
        self.angular_momentum += angular;
        self.recalculate();
    }

    /// Translational kinetic energy, `0.5 * m * |v|²`.
    pub fn linear_kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// Rotational kinetic energy, `0.5 * ω·L`.
    pub fn angular_kinetic_energy(&self) -> f64 {
        0.5 * self.angular_velocity.dot(&self.angular_momentum)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.linear_kinetic_energy() + self.angular_kinetic_energy()
    }

    /// True when no primary or derived quantity is `NaN` or infinite.
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// Name of the first quantity holding a `NaN` or infinity, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());

        if !finite(self.position.coords.as_slice()) {
            Some("position")
        } else if !finite(self.momentum.as_slice()) {
            Some("momentum")
        } else if !finite(self.orientation.coords.as_slice()) {
            Some("orientation")
        } else if !finite(self.angular_momentum.as_slice()) {
            Some("angular momentum")
        } else if !finite(self.velocity.as_slice()) {
            Some("velocity")
        } else if !finite(self.angular_velocity.as_slice()) {
            Some("angular velocity")
        } else if !finite(self.spin.coords.as_slice()) {
            Some("spin")
        } else if !finite(self.body_to_world.as_slice()) {
            Some("body to world transform")
        } else {
            None
        }
    }
}
