/// RK3D Core Library - Fixed-step rigid body simulation
///
/// This library provides the engine-independent physics core: rigid body
/// state, force models, an RK4 integrator and the fixed-timestep accumulator
/// loop that produces interpolated frames for a renderer.

pub mod config;
pub mod derivative;
pub mod error;
pub mod force;
pub mod integrator;
pub mod simulation;
pub mod state;

// Re-export commonly used types
pub use config::{BodyConfig, IntegrationMethod, SimulationConfig, TIME_CLAMP, TIME_STEP};
pub use derivative::Derivative;
pub use error::{PhysicsError, Result};
pub use force::{ForceModel, Oscillation, SpringForceModel, Wrench, ZeroForce};
pub use integrator::Integrator;
pub use simulation::{Frame, RenderAdapter, Simulation};
pub use state::RigidBodyState;
