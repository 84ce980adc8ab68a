//! Pure geometry generators. Nothing here touches the render context.

use crate::core::geometry::{GeometryBuffer, Vertex};
use crate::scene::heightfield::HeightField;
use nalgebra::{Point3, Vector2, Vector3};
use std::f32::consts::PI;

/// Horizontal quad centred on the origin, normals up, UVs covering [0, 1].
pub fn flat_quad(width: f32, depth: f32) -> GeometryBuffer {
    let (hw, hd) = (width / 2.0, depth / 2.0);
    let up = Vector3::y();
    let vertices = vec![
        Vertex::new(Point3::new(-hw, 0.0, -hd), up, Vector2::new(0.0, 0.0)),
        Vertex::new(Point3::new(hw, 0.0, -hd), up, Vector2::new(1.0, 0.0)),
        Vertex::new(Point3::new(hw, 0.0, hd), up, Vector2::new(1.0, 1.0)),
        Vertex::new(Point3::new(-hw, 0.0, hd), up, Vector2::new(0.0, 1.0)),
    ];
    GeometryBuffer::new(vertices, vec![0, 1, 2, 0, 2, 3])
}

/// Unit UV sphere with `(segments + 1)^2` vertices and `segments^2` quad cells.
/// `segments` below 1 is treated as 1.
pub fn uv_sphere(segments: u32) -> GeometryBuffer {
    let segments = segments.max(1);
    let n = segments as f32;
    let ring = segments + 1;

    let mut vertices = Vec::with_capacity((ring * ring) as usize);
    for i in 0..=segments {
        let theta = PI * i as f32 / n;
        for j in 0..=segments {
            let phi = 2.0 * PI * j as f32 / n;
            let p = Vector3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            vertices.push(Vertex::new(
                Point3::from(p),
                p,
                Vector2::new(j as f32 / n, i as f32 / n),
            ));
        }
    }

    let mut indices = Vec::with_capacity((6 * segments * segments) as usize);
    for i in 0..segments {
        for j in 0..segments {
            let first = i * ring + j;
            let second = first + ring;
            indices.extend_from_slice(&[first, second, first + 1, second, second + 1, first + 1]);
        }
    }

    GeometryBuffer::new(vertices, indices)
}

/// One vertex per height sample, spaced one unit apart and centred on the
/// origin so that it lines up with height queries on the same field.
///
/// Normals are the constant `(0, 1, 0)`; slope-aware normals are not baked in.
pub fn heightmap_grid(field: &HeightField, height_scale: f32) -> GeometryBuffer {
    let (columns, rows) = (field.columns(), field.rows());
    let half_x = (columns - 1) as f32 / 2.0;
    let half_z = (rows - 1) as f32 / 2.0;
    let uv = |i: usize, n: usize| if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };

    let mut vertices = Vec::with_capacity(columns * rows);
    for z in 0..rows {
        for x in 0..columns {
            vertices.push(Vertex::new(
                Point3::new(
                    x as f32 - half_x,
                    field.sample(x, z) * height_scale,
                    z as f32 - half_z,
                ),
                Vector3::y(),
                Vector2::new(uv(x, columns), uv(z, rows)),
            ));
        }
    }

    let mut indices = Vec::with_capacity(6 * columns.saturating_sub(1) * rows.saturating_sub(1));
    for z in 0..rows.saturating_sub(1) {
        for x in 0..columns.saturating_sub(1) {
            let top_left = (z * columns + x) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((z + 1) * columns + x) as u32;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    GeometryBuffer::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_quad_has_four_up_facing_vertices() {
        let quad = flat_quad(4.0, 2.0);
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(quad.vertices.iter().all(|v| v.normal == Vector3::y()));
        assert_eq!(quad.vertices[2].position, Point3::new(2.0, 0.0, 1.0));
        assert_eq!(quad.vertices[2].texcoord, Vector2::new(1.0, 1.0));
    }

    #[test]
    fn sphere_counts_and_unit_radius() {
        for segments in [1, 3, 16] {
            let sphere = uv_sphere(segments);
            let s = segments as usize;
            assert_eq!(sphere.vertices.len(), (s + 1) * (s + 1));
            assert_eq!(sphere.indices.len(), 6 * s * s);
            assert!(sphere.validate().is_ok());
            for v in &sphere.vertices {
                assert!((v.position.coords.norm() - 1.0).abs() < 1e-5);
                assert_eq!(v.normal, v.position.coords);
            }
        }
    }

    #[test]
    fn sphere_segments_are_clamped() {
        assert_eq!(uv_sphere(0).vertices.len(), 4);
    }

    #[test]
    fn heightmap_grid_layout() {
        let field = HeightField::new(3, 2, vec![0.0, 0.5, 1.0, 0.0, 0.0, 0.0]).unwrap();
        let grid = heightmap_grid(&field, 2.0);

        assert_eq!(grid.vertices.len(), 6);
        assert_eq!(grid.indices.len(), 12);
        assert_eq!(&grid.indices[0..6], &[0, 3, 1, 1, 3, 4]);
        assert_eq!(grid.vertices[0].position, Point3::new(-1.0, 0.0, -0.5));
        assert_eq!(grid.vertices[2].position.y, 2.0);
        assert_eq!(grid.vertices[5].texcoord, Vector2::new(1.0, 1.0));
        assert!(grid.vertices.iter().all(|v| v.normal == Vector3::y()));
    }

    #[test]
    fn single_row_grid_has_zero_v_and_no_cells() {
        let field = HeightField::new(4, 1, vec![0.25; 4]).unwrap();
        let grid = heightmap_grid(&field, 1.0);
        assert!(grid.vertices.iter().all(|v| v.texcoord.y == 0.0 && v.texcoord.x.is_finite()));
        assert!(grid.indices.is_empty());
    }
}
