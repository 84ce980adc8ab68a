use crate::core::math::transform::TransformFactory;
use crate::ui::input::InputState;
use nalgebra::{Matrix4, Point3, Vector3};

const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Free movement along the view direction, no gravity.
    Fly,
    /// Movement restricted to the ground plane, with gravity and jumping.
    Walk,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::Fly => CameraMode::Walk,
            CameraMode::Walk => CameraMode::Fly,
        }
    }
}

/// First-person camera driven by yaw and pitch, both in degrees.
///
/// Yaw -90 looks down -Z.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub mode: CameraMode,
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of cursor movement.
    pub sensitivity: f32,
    /// Vertical speed in walk mode, positive is up.
    pub vertical_velocity: f32,
    pub grounded: bool,

    yaw: f32,
    pitch: f32,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,

    fov_y_deg: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(position: Point3<f32>, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            mode: CameraMode::Fly,
            speed: 5.0,
            sensitivity: 0.1,
            vertical_velocity: 0.0,
            grounded: false,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            front: -Vector3::z(),
            right: Vector3::x(),
            up: Vector3::y(),
            fov_y_deg: 45.0,
            aspect_ratio: 4.0 / 3.0,
            near: 0.1,
            far: 200.0,
        };
        camera.update_vectors();
        camera
    }

    pub fn with_projection(mut self, fov_y_deg: f32, near: f32, far: f32) -> Self {
        self.fov_y_deg = fov_y_deg;
        self.near = near;
        self.far = far;
        self
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
    }

    /// Displacement requested by the movement keys for this frame.
    ///
    /// In walk mode forward and right are flattened onto the ground plane and
    /// the up/down keys are ignored.
    pub fn process_input(&self, input: &InputState, dt: f32) -> Vector3<f32> {
        let (forward, right, up) = match self.mode {
            CameraMode::Fly => (self.front, self.right, self.up),
            CameraMode::Walk => (
                flatten(&self.front),
                flatten(&self.right),
                Vector3::zeros(),
            ),
        };

        let mut direction = Vector3::zeros();
        if input.forward {
            direction += forward;
        }
        if input.backward {
            direction -= forward;
        }
        if input.left {
            direction -= right;
        }
        if input.right {
            direction += right;
        }
        if input.up {
            direction += up;
        }
        if input.down {
            direction -= up;
        }

        if direction.norm_squared() > 1e-12 {
            direction.normalize() * self.speed * dt
        } else {
            Vector3::zeros()
        }
    }

    /// Applies a cursor delta. Moving the cursor down tilts the view down.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.update_vectors();
    }

    /// Starts a jump when standing on a floor. Returns whether it did.
    pub fn jump(&mut self, speed: f32) -> bool {
        if self.mode != CameraMode::Walk || !self.grounded {
            return false;
        }
        self.vertical_velocity = speed;
        self.grounded = false;
        true
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.vertical_velocity = 0.0;
        self.grounded = false;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view(&self.position, &(self.position + self.front), &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        TransformFactory::perspective(
            self.aspect_ratio,
            self.fov_y_deg.to_radians(),
            self.near,
            self.far,
        )
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(&Vector3::y()).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}

fn flatten(v: &Vector3<f32>) -> Vector3<f32> {
    let flat = Vector3::new(v.x, 0.0, v.z);
    if flat.norm_squared() > 1e-12 {
        flat.normalize()
    } else {
        Vector3::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn default_yaw_looks_down_negative_z() {
        let camera = Camera::new(Point3::origin(), -90.0, 0.0);
        assert!(approx(&camera.front(), &-Vector3::z()));
        assert!(approx(&camera.right(), &Vector3::x()));
        assert!(approx(&camera.up(), &Vector3::y()));
    }

    #[test]
    fn movement_is_normalized_and_scaled() {
        let mut camera = Camera::new(Point3::origin(), -90.0, 0.0);
        camera.speed = 2.0;
        let input = InputState {
            forward: true,
            right: true,
            ..InputState::default()
        };
        let step = camera.process_input(&input, 0.5);
        assert!((step.norm() - 1.0).abs() < 1e-5);
        assert!(step.x > 0.0 && step.z < 0.0);
        assert_eq!(camera.process_input(&InputState::default(), 0.5), Vector3::zeros());
    }

    #[test]
    fn walk_mode_stays_on_the_ground_plane() {
        let mut camera = Camera::new(Point3::origin(), -90.0, 45.0);
        camera.mode = CameraMode::Walk;
        let input = InputState {
            forward: true,
            up: true,
            ..InputState::default()
        };
        let step = camera.process_input(&input, 1.0);
        assert_eq!(step.y, 0.0);
        assert!((step.norm() - camera.speed).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_constrained() {
        let mut camera = Camera::new(Point3::origin(), -90.0, 0.0);
        camera.process_mouse_movement(0.0, -10_000.0, true);
        assert_eq!(camera.pitch(), 89.0);
        camera.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(camera.pitch(), -89.0);
        camera.process_mouse_movement(10.0, 0.0, true);
        assert!((camera.yaw() - (-89.0)).abs() < 1e-4);
    }

    #[test]
    fn jump_requires_walk_mode_and_ground() {
        let mut camera = Camera::new(Point3::origin(), -90.0, 0.0);
        assert!(!camera.jump(5.0));
        camera.mode = CameraMode::Walk;
        assert!(!camera.jump(5.0));
        camera.grounded = true;
        assert!(camera.jump(5.0));
        assert_eq!(camera.vertical_velocity, 5.0);
        assert!(!camera.grounded);
    }

    #[test]
    fn view_matrix_moves_position_to_origin() {
        let camera = Camera::new(Point3::new(1.0, 2.0, 3.0), -90.0, 0.0);
        let p = camera.view_matrix().transform_point(&Point3::new(1.0, 2.0, 3.0));
        assert!(p.coords.norm() < 1e-5);
    }
}
