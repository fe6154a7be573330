/// ASCII wireframe renderer for the simulated cube
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Point3;
use rk3d_core::{Frame, RenderAdapter, RigidBodyState};
use std::io::Write;

use crate::camera::Camera;

/// Character ramp for depth shading (farthest to nearest)
const DEPTH_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Marker for the spring anchor at the world origin
const ANCHOR: char = 'o';

/// Spring drawn from the anchor to the body's center of mass
const SPRING: char = '~';

/// Cube edges as pairs of corner indices (corner bits: x, y, z)
#[rustfmt::skip]
const EDGES: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7),
    (0, 2), (1, 3), (4, 6), (5, 7),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// Depth range mapped onto the ramp, centered on the camera target
const DEPTH_SPAN: f64 = 8.0;

/// Renders rigid body frames into a character grid
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    camera: Camera,
    depth_buffer: Vec<f64>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            camera: Camera::new(width as u32, height as u32),
            depth_buffer: vec![f64::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f64::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, for inspection.
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Number of non-blank cells.
    pub fn coverage(&self) -> usize {
        self.char_buffer.iter().filter(|&&c| c != ' ').count()
    }

    /// Draw the anchor, the spring and the cube of `state`.
    pub fn render_body(&mut self, state: &RigidBodyState) {
        let anchor = self.project(&Point3::origin());
        let center = self.project(&state.position());
        if let (Some(a), Some(c)) = (anchor, center) {
            self.draw_line(a, c, Some(SPRING));
        }
        // the anchor always sits on top of its own spring
        if let Some(a) = anchor {
            self.plot(a.0, a.1, f64::NEG_INFINITY, ANCHOR);
        }

        let half = state.size() * 0.5;
        let corners: Vec<Option<(f64, f64, f64)>> = (0..8)
            .map(|bits| {
                let local = Point3::new(
                    if bits & 1 == 0 { -half } else { half },
                    if bits & 2 == 0 { -half } else { half },
                    if bits & 4 == 0 { -half } else { half },
                );
                let world = state.body_to_world().transform_point(&local);
                self.project(&world)
            })
            .collect();

        for (i, j) in EDGES {
            if let (Some(a), Some(b)) = (corners[i], corners[j]) {
                self.draw_line(a, b, None);
            }
        }
    }

    fn project(&self, point: &Point3<f64>) -> Option<(f64, f64, f64)> {
        self.camera
            .project_to_screen(point, self.width as u32, self.height as u32)
    }

    /// Step along a screen-space segment, interpolating depth.
    /// With no explicit character, cells are shaded by depth.
    fn draw_line(&mut self, a: (f64, f64, f64), b: (f64, f64, f64), character: Option<char>) {
        let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as usize;

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = a.0 + (b.0 - a.0) * t;
            let y = a.1 + (b.1 - a.1) * t;
            let depth = a.2 + (b.2 - a.2) * t;
            let c = character.unwrap_or_else(|| self.shade(depth));
            self.plot(x, y, depth, c);
        }
    }

    fn shade(&self, depth: f64) -> char {
        let near = self.camera.distance() - DEPTH_SPAN * 0.5;
        let closeness = (1.0 - (depth - near) / DEPTH_SPAN).clamp(0.0, 1.0);
        let index = (closeness * (DEPTH_RAMP.len() - 1) as f64).round() as usize;
        DEPTH_RAMP[index.min(DEPTH_RAMP.len() - 1)]
    }

    fn plot(&mut self, x: f64, y: f64, depth: f64, character: char) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = y * self.width + x;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                let color = match c {
                    SPRING | ANCHOR => Color::Yellow,
                    '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderAdapter for AsciiRenderer {
    fn render(&mut self, frame: &Frame) {
        self.clear();
        self.render_body(&frame.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn cube_at(x: f64, y: f64, z: f64) -> RigidBodyState {
        RigidBodyState::new(Point3::new(x, y, z), Vector3::zeros(), 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_render_draws_cube_and_anchor() {
        let mut renderer = AsciiRenderer::new(80, 24);
        renderer.render_body(&cube_at(2.0, 0.0, 0.0));
        assert!(renderer.coverage() > 20);
        assert!(renderer.char_buffer.contains(&ANCHOR));
        assert!(renderer.char_buffer.contains(&SPRING));
    }

    #[test]
    fn test_anchor_wins_over_spring_on_either_side() {
        // (2, 0, 0) is nearer the eye than the origin, (-3, 0, 0) is farther
        for x in [2.0, -3.0] {
            let mut renderer = AsciiRenderer::new(80, 24);
            renderer.render_body(&cube_at(x, 0.0, 0.0));
            let (ax, ay, _) = renderer.project(&Point3::origin()).unwrap();
            assert_eq!(renderer.cell(ax as usize, ay as usize), Some(ANCHOR));
        }
    }

    #[test]
    fn test_clear() {
        let mut renderer = AsciiRenderer::new(40, 12);
        renderer.render_body(&cube_at(0.0, 0.0, 0.0));
        assert!(renderer.coverage() > 0);
        renderer.clear();
        assert_eq!(renderer.coverage(), 0);
    }

    #[test]
    fn test_offscreen_body_is_clipped() {
        let mut renderer = AsciiRenderer::new(40, 12);
        // far behind the eye: nothing but the anchor survives
        renderer.render_body(&cube_at(500.0, 0.0, 0.0));
        assert_eq!(renderer.coverage(), 1);
        assert_eq!(renderer.cell(40, 0), None);
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let mut renderer = AsciiRenderer::new(10, 3);
        renderer.render_body(&cube_at(0.0, 0.0, 0.0));
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        assert!(!out.is_empty());
    }
}
