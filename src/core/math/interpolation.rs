use nalgebra::{Point2, Vector3};

const EPSILON: f32 = 1e-5;

/// Barycentric weights of `p` with respect to screen triangle `tri`.
///
/// `None` for degenerate (zero-area) triangles.
pub fn barycentric(p: Point2<f32>, tri: &[Point2<f32>; 3]) -> Option<Vector3<f32>> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let d = p - tri[0];

    // Twice the signed area.
    let area = e1.perp(&e2);
    if area.abs() < EPSILON {
        return None;
    }

    let beta = d.perp(&e2) / area;
    let gamma = e1.perp(&d) / area;
    Some(Vector3::new(1.0 - beta - gamma, beta, gamma))
}

#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.iter().all(|&w| w >= -EPSILON)
}

/// Re-weights screen-space barycentrics by 1/w so attributes interpolate
/// linearly in view space. `None` when the weights collapse.
pub fn perspective_correct_barycentric(bary: Vector3<f32>, w: &[f32; 3]) -> Option<Vector3<f32>> {
    let inv_w = Vector3::from_fn(|i, _| if w[i].abs() > EPSILON { 1.0 / w[i] } else { 1.0 });
    let weighted = bary.component_mul(&inv_w);

    let sum = weighted.sum();
    if sum.abs() < EPSILON {
        return None;
    }
    Some(weighted / sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> [Point2<f32>; 3] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        ]
    }

    #[test]
    fn vertices_get_unit_weights() {
        let b = barycentric(Point2::new(4.0, 0.0), &tri()).unwrap();
        assert!((b.y - 1.0).abs() < 1e-6);
        assert!(b.x.abs() < 1e-6 && b.z.abs() < 1e-6);
    }

    #[test]
    fn outside_point_is_rejected() {
        let b = barycentric(Point2::new(5.0, 5.0), &tri()).unwrap();
        assert!(!is_inside_triangle(b));
    }

    #[test]
    fn degenerate_triangle_has_no_weights() {
        let flat = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        assert!(barycentric(Point2::new(0.5, 0.5), &flat).is_none());
    }

    #[test]
    fn perspective_correction_favours_near_vertex() {
        let b = Vector3::new(0.5, 0.5, 0.0);
        let c = perspective_correct_barycentric(b, &[1.0, 3.0, 1.0]).unwrap();
        assert!((c.x - 0.75).abs() < 1e-6);
        assert!((c.sum() - 1.0).abs() < 1e-6);
    }
}
