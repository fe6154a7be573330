/// Camera and projection for the terminal view
use nalgebra::{Matrix4, Point3, Vector3};

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

/// Perspective camera looking at a fixed target
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Camera framing the demo's oscillation range, sized for a `width` x
    /// `height` cell grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(5.0, 4.0, 9.0),
            target: Point3::origin(),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f64::consts::PI / 4.0, // 45 degrees
            aspect: width as f64 / (height.max(1) as f64 * CELL_ASPECT),
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Distance from the eye to the target.
    pub fn distance(&self) -> f64 {
        (self.position - self.target).norm()
    }

    /// Move the eye toward (`factor < 1`) or away from the target.
    pub fn dolly(&mut self, factor: f64) {
        let offset = (self.position - self.target) * factor;
        if offset.norm() > self.near * 10.0 && offset.norm() < self.far * 0.5 {
            self.position = self.target + offset;
        }
    }

    /// Project a world-space point to screen cells.
    ///
    /// Returns `(x, y, depth)` for points in front of the camera, including
    /// points outside the viewport so callers can clip per cell. `depth` is
    /// the distance along the view axis.
    pub fn project_to_screen(
        &self,
        point: &Point3<f64>,
        width: u32,
        height: u32,
    ) -> Option<(f64, f64, f64)> {
        let eye = self.view_matrix().transform_point(point);
        let depth = -eye.z;

        // Prevent division by near-zero depth values
        if depth < self.near {
            return None;
        }

        let ndc = self.projection_matrix().transform_point(&eye);

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f64;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f64;

        Some((screen_x, screen_y, depth))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(80, 24)
    }
}
