/// Example: Run the demo simulation without a terminal
///
/// Feeds a synthetic 60 Hz clock into the fixed-step loop and prints the
/// interpolated trajectory as CSV.
///
/// Usage: cargo run --example headless -- [seconds]
use rk3d_core::Simulation;
use rk3d_terminal::mechanical_energy;
use std::env;
use std::io;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let seconds: f64 = match env::args().nth(1) {
        Some(arg) => arg.parse().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid duration {arg:?}: {e}"))
        })?,
        None => 2.0,
    };

    let mut sim =
        Simulation::demo().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    println!("wall,t,alpha,steps,x,y,z,qw,qx,qy,qz,energy");
    let frames = (seconds * 60.0).ceil() as usize;
    for i in 1..=frames {
        let wall = i as f64 / 60.0;
        let frame = sim.tick(wall);
        let p = frame.state.position();
        let q = frame.state.orientation();
        println!(
            "{:.4},{:.4},{:.3},{},{:.5},{:.5},{:.5},{:.5},{:.5},{:.5},{:.5},{:.4}",
            wall,
            frame.time,
            frame.alpha,
            frame.steps,
            p.x,
            p.y,
            p.z,
            q.w,
            q.i,
            q.j,
            q.k,
            mechanical_energy(sim.current(), sim.forces()),
        );
    }

    if let Err(e) = sim.check_finite() {
        eprintln!("{e}");
    }
    Ok(())
}
