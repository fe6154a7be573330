/// Terminal host for the RK3D simulation
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use rk3d_core::{
    BodyConfig, Frame, PhysicsError, RigidBodyState, Simulation, SimulationConfig,
    SpringForceModel,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod camera;
pub mod renderer;

pub use camera::Camera;
pub use renderer::AsciiRenderer;

fn to_io(err: PhysicsError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

/// Total mechanical energy of `state` under `forces`.
pub fn mechanical_energy(state: &RigidBodyState, forces: &SpringForceModel) -> f64 {
    state.kinetic_energy() + forces.potential_energy(state)
}

/// Main application struct for the terminal simulation
pub struct TerminalApp {
    simulation: Simulation<SpringForceModel>,
    body: BodyConfig,
    renderer: AsciiRenderer,
    clock: Instant,
    running: bool,
    paused: bool,
    last_frame: Option<Frame>,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// App sized to the current terminal.
    pub fn new(
        body: BodyConfig,
        forces: SpringForceModel,
        config: SimulationConfig,
    ) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Self::with_size(width as usize, height as usize, body, forces, config)
    }

    pub fn with_size(
        width: usize,
        height: usize,
        body: BodyConfig,
        forces: SpringForceModel,
        config: SimulationConfig,
    ) -> io::Result<Self> {
        let state = RigidBodyState::from_config(&body).map_err(to_io)?;
        let simulation = Simulation::new(state, forces, config).map_err(to_io)?;
        let now = Instant::now();

        Ok(Self {
            simulation,
            body,
            renderer: AsciiRenderer::new(width, height),
            clock: now,
            running: true,
            paused: false,
            last_frame: None,
            last_fps_sample: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn simulation(&self) -> &Simulation<SpringForceModel> {
        &self.simulation
    }

    pub fn renderer(&self) -> &AsciiRenderer {
        &self.renderer
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                    self.handle_key(code)?;
                }
            }

            self.update();
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    /// Seconds since the app was created.
    fn seconds(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    pub fn handle_key(&mut self, code: KeyCode) -> io::Result<()> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('r') => {
                self.reset()?;
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.paused = !self.paused;
                if !self.paused {
                    // time spent paused is not simulated
                    let now = self.seconds();
                    self.simulation.reset_clock(now);
                }
                tracing::debug!(paused = self.paused, "toggled pause");
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.renderer.camera_mut().dolly(0.9);
            }
            KeyCode::Char('-') => {
                self.renderer.camera_mut().dolly(1.0 / 0.9);
            }
            _ => {}
        }
        Ok(())
    }

    /// Restart the body from its initial configuration.
    pub fn reset(&mut self) -> io::Result<()> {
        let state = RigidBodyState::from_config(&self.body).map_err(to_io)?;
        let now = self.seconds();
        self.simulation.reset(state);
        self.simulation.reset_clock(now);
        self.last_frame = None;
        Ok(())
    }

    /// Tick the simulation to the current wall time and rasterize the frame.
    pub fn update(&mut self) {
        if self.paused {
            return;
        }
        let now = self.seconds();
        let frame = self.simulation.tick_with(now, &mut self.renderer);
        self.last_frame = Some(frame);
    }

    /// One-line status for the top of the screen.
    pub fn hud(&self) -> String {
        let (alpha, steps) = self
            .last_frame
            .as_ref()
            .map_or((0.0, 0), |frame| (frame.alpha, frame.steps));
        let energy = mechanical_energy(self.simulation.current(), self.simulation.forces());

        let mut line = format!(
            "RK3D | t: {:7.2}s | alpha: {:.2} | steps: {:2} | energy: {:8.3} | FPS: {:.1}",
            self.simulation.time(),
            alpha,
            steps,
            energy,
            self.fps
        );
        if self.paused {
            line.push_str(" | PAUSED");
        }
        if self.simulation.is_diverged() {
            line.push_str(" | DIVERGED");
        }
        line
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        let (_, height) = terminal::size()?;
        let hud_color = if self.simulation.is_diverged() {
            Color::Red
        } else {
            Color::Yellow
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(hud_color),
            Print(self.hud()),
            cursor::MoveTo(0, height.saturating_sub(1)),
            SetForegroundColor(Color::DarkGrey),
            Print("Controls: P=Pause R=Reset +/-=Zoom Q=Quit"),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
