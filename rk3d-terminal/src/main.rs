/// RK3D Terminal Demo - Spring-driven cube
///
/// Runs the fixed-step RK4 simulation and draws the interpolated cube.
/// Controls:
///   - P: Pause / resume
///   - R: Reset the body
///   - +/-: Zoom
///   - Q/ESC: Quit
///
/// Diagnostics go to stderr; set `RUST_LOG=rk3d_core=debug` for more.
use rk3d_core::{BodyConfig, SimulationConfig, SpringForceModel};
use rk3d_terminal::TerminalApp;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut app = TerminalApp::new(
        BodyConfig::default(),
        SpringForceModel::demo(),
        SimulationConfig::default(),
    )?;
    app.run()?;

    println!("Thank you for using RK3D Terminal!");
    Ok(())
}
