/// RK3D Web - WASM host for the fixed-step simulation
///
/// JavaScript owns the canvas and the WebGL scene. Once per animation frame
/// it calls `tick`/`tick_now` and uploads `body_to_world()` as the cube's
/// model matrix.
use nalgebra::Matrix4;
use rk3d_core::{BodyConfig, Frame, RigidBodyState, Simulation, SimulationConfig, SpringForceModel};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn log(message: &str) {
    tracing::debug!("{message}");
}

fn to_js(err: rk3d_core::PhysicsError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Flatten a matrix in the column-major order WebGL expects.
pub fn column_major(matrix: &Matrix4<f64>) -> Vec<f32> {
    // nalgebra storage is already column-major
    matrix.iter().map(|&v| v as f32).collect()
}

/// A spring-driven cube stepped from the browser clock
#[wasm_bindgen]
pub struct WebSimulation {
    simulation: Simulation<SpringForceModel>,
    body: BodyConfig,
    frame: Option<Frame>,
    clock_started: bool,
}

#[wasm_bindgen]
impl WebSimulation {
    /// Demo body of the given mass and size.
    #[wasm_bindgen(constructor)]
    pub fn new(mass: f64, size: f64) -> Result<WebSimulation, JsValue> {
        let body = BodyConfig {
            mass,
            size,
            ..BodyConfig::default()
        };
        let state = RigidBodyState::from_config(&body).map_err(to_js)?;
        let simulation = Simulation::new(state, SpringForceModel::demo(), SimulationConfig::default())
            .map_err(to_js)?;

        log(&format!("rk3d: simulating a {mass} kg cube of size {size}"));

        Ok(WebSimulation {
            simulation,
            body,
            frame: None,
            clock_started: false,
        })
    }

    /// Advance to `now_ms` (milliseconds, e.g. a `requestAnimationFrame`
    /// timestamp). Returns the number of fixed steps taken.
    pub fn tick(&mut self, now_ms: f64) -> u32 {
        let now = now_ms / 1000.0;
        // page clocks do not start at zero
        if !self.clock_started {
            self.simulation.reset_clock(now);
            self.clock_started = true;
        }

        let frame = self.simulation.tick(now);
        let steps = frame.steps as u32;
        if self.simulation.is_diverged() && steps > 0 {
            log("rk3d: simulation diverged");
        }
        self.frame = Some(frame);
        steps
    }

    /// Advance to `performance.now()`.
    pub fn tick_now(&mut self) -> Result<u32, JsValue> {
        let now = web_sys::window()
            .and_then(|window| window.performance())
            .ok_or_else(|| JsValue::from_str("performance.now() is unavailable"))?
            .now();
        Ok(self.tick(now))
    }

    /// Restart the body; the next tick re-bases the clock.
    pub fn reset(&mut self) -> Result<(), JsValue> {
        let state = RigidBodyState::from_config(&self.body).map_err(to_js)?;
        self.simulation.reset(state);
        self.frame = None;
        self.clock_started = false;
        Ok(())
    }

    /// Interpolated center of mass `[x, y, z]`.
    pub fn position(&self) -> Vec<f64> {
        let p = self.rendered().position();
        vec![p.x, p.y, p.z]
    }

    /// Interpolated orientation `[w, x, y, z]`.
    pub fn orientation(&self) -> Vec<f64> {
        let q = self.rendered().orientation();
        vec![q.w, q.i, q.j, q.k]
    }

    /// Interpolated model matrix, 16 column-major floats.
    pub fn body_to_world(&self) -> Vec<f32> {
        column_major(self.rendered().body_to_world())
    }

    pub fn alpha(&self) -> f64 {
        self.frame.as_ref().map_or(0.0, |frame| frame.alpha)
    }

    /// Simulation time (seconds).
    pub fn time(&self) -> f64 {
        self.simulation.time()
    }

    pub fn diverged(&self) -> bool {
        self.simulation.is_diverged()
    }
}

impl WebSimulation {
    fn rendered(&self) -> &RigidBodyState {
        match &self.frame {
            Some(frame) => &frame.state,
            None => self.simulation.current(),
        }
    }
}

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Better error messages in the browser console
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    log(concat!("rk3d-web ", env!("CARGO_PKG_VERSION"), " initialized"));
    Ok(())
}
