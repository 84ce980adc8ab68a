use nalgebra::{Matrix4, Point2, Point3, Rotation3, Vector3, Vector4};

/// Matrix constructors for a right-handed world with the camera looking
/// down -Z and clip-space depth in [-1, 1].
pub struct TransformFactory;

impl TransformFactory {
    /// Rx * Ry * Rz from Euler angles in degrees, so points turn about Z first.
    pub fn rotation_euler_degrees(angles: &Vector3<f32>) -> Matrix4<f32> {
        let r = angles.map(f32::to_radians);
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), r.x);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), r.y);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), r.z);
        (rx * ry * rz).to_homogeneous()
    }

    pub fn translation(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    pub fn scaling(factor: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(factor)
    }

    /// World to eye space for a camera at `eye` facing `target`.
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let back = (eye - target).normalize();
        let side = up.cross(&back).normalize();
        let top = back.cross(&side);

        let mut m = Matrix4::identity();
        for (row, axis) in [side, top, back].iter().enumerate() {
            m.fixed_view_mut::<1, 3>(row, 0).copy_from(&axis.transpose());
            m[(row, 3)] = -axis.dot(&eye.coords);
        }
        m
    }

    /// OpenGL-style perspective projection.
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad * 0.5).tan();
        let depth = near - far;

        let mut m = Matrix4::zeros();
        m[(0, 0)] = f / aspect_ratio;
        m[(1, 1)] = f;
        m[(2, 2)] = (far + near) / depth;
        m[(2, 3)] = 2.0 * far * near / depth;
        m[(3, 2)] = -1.0;
        m
    }
}

/// Clip space to NDC. A degenerate `w` maps to the origin.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Point3<f32> {
    if clip.w.abs() > 1e-6 {
        Point3::from(clip.xyz() / clip.w)
    } else {
        Point3::origin()
    }
}

/// NDC to pixel coordinates, with +Y pointing down the screen.
#[inline]
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, width: f32, height: f32) -> Point2<f32> {
    Point2::new((ndc_x + 1.0) * 0.5 * width, (1.0 - ndc_y) * 0.5 * height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_rotation_applies_x_last_to_points() {
        let m = TransformFactory::rotation_euler_degrees(&Vector3::new(0.0, 0.0, 90.0));
        let p = m * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);

        // Z first, then X: (1,0,0) -> (0,1,0) -> (0,0,1)
        let m = TransformFactory::rotation_euler_degrees(&Vector3::new(90.0, 0.0, 90.0));
        let p = m * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        let view = TransformFactory::view(&eye, &Point3::new(1.0, 2.0, 0.0), &Vector3::y());
        let p = view * eye.to_homogeneous();
        assert!(p.xyz().norm() < 1e-6);

        // The target ends up straight ahead on -Z.
        let t = view * Vector4::new(1.0, 2.0, 0.0, 1.0);
        assert!((t.z + 3.0).abs() < 1e-5);
    }

    #[test]
    fn perspective_maps_near_plane_to_minus_one() {
        let proj = TransformFactory::perspective(1.0, 90.0_f32.to_radians(), 0.1, 100.0);
        let clip = proj * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let ndc = apply_perspective_division(&clip);
        assert!((ndc.z + 1.0).abs() < 1e-4);
    }

    #[test]
    fn screen_origin_is_top_left() {
        let p = ndc_to_screen(-1.0, 1.0, 640.0, 480.0);
        assert_eq!((p.x, p.y), (0.0, 0.0));
        let p = ndc_to_screen(1.0, -1.0, 640.0, 480.0);
        assert_eq!((p.x, p.y), (640.0, 480.0));
    }
}
