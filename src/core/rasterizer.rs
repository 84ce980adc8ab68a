use crate::core::framebuffer::FrameBuffer;
use crate::core::math::interpolation::{
    barycentric, is_inside_triangle, perspective_correct_barycentric,
};
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen};
use crate::core::pipeline::Shader;
use nalgebra::{Point2, Vector4};
use rayon::prelude::*;

/// The Rasterizer is responsible for drawing geometric primitives onto the FrameBuffer.
pub struct Rasterizer {
    pub cull_mode: CullMode,
    pub wireframe: bool,
}

#[derive(PartialEq, Copy, Clone, Debug)]
pub enum CullMode {
    Back,
    Front,
    None,
}

/// Per-draw fixed-function state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            blend: false,
        }
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            cull_mode: CullMode::None,
            wireframe: false,
        }
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    /// Clips a triangle against the view volume in homogeneous space, then
    /// fills the resulting convex polygon as a triangle fan.
    pub fn rasterize_triangle<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        state: RasterState,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        let mut polygon: Vec<(Vector4<f32>, S::Varying)> =
            clip_coords.iter().copied().zip(varyings.iter().copied()).collect();
        let mut scratch = Vec::with_capacity(9);

        for &(axis, sign) in &CLIP_PLANES {
            clip_against_plane::<S>(&polygon, &mut scratch, axis, sign);
            std::mem::swap(&mut polygon, &mut scratch);
            if polygon.len() < 3 {
                return;
            }
        }

        let (p0, v0) = polygon[0];
        for pair in polygon[1..].windows(2) {
            let [(p1, v1), (p2, v2)] = [pair[0], pair[1]];
            self.fill_triangle(framebuffer, shader, state, &[p0, p1, p2], &[v0, v1, v2]);
        }
    }

    /// Draws one vertex as a single-sample-block point.
    pub fn rasterize_point<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        state: RasterState,
        clip: Vector4<f32>,
        varying: S::Varying,
    ) {
        if clip.w <= 1e-6 || (0..3).any(|axis| clip[axis].abs() > clip.w) {
            return;
        }
        let ndc = apply_perspective_division(&clip);
        let screen = ndc_to_screen(
            ndc.x,
            ndc.y,
            framebuffer.buffer_width as f32,
            framebuffer.buffer_height as f32,
        );
        let depth = ndc.z * 0.5 + 0.5;
        let base_x = (screen.x.floor() as usize / framebuffer.sample_count) * framebuffer.sample_count;
        let base_y = (screen.y.floor() as usize / framebuffer.sample_count) * framebuffer.sample_count;

        let color = shader.fragment(varying);
        for dy in 0..framebuffer.sample_count {
            for dx in 0..framebuffer.sample_count {
                let (x, y) = (base_x + dx, base_y + dy);
                if Self::depth_pass(framebuffer, state, x, y, depth) {
                    Self::write_color(framebuffer, state, x, y, color);
                }
            }
        }
    }

    /// Draws a segment by stepping one point per screen pixel along it.
    /// Segments with an endpoint behind the camera are dropped.
    pub fn rasterize_line<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        state: RasterState,
        clip: [Vector4<f32>; 2],
        varyings: [S::Varying; 2],
    ) {
        if clip[0].w <= 1e-6 || clip[1].w <= 1e-6 {
            return;
        }
        let (w, h) = (framebuffer.buffer_width as f32, framebuffer.buffer_height as f32);
        let a = apply_perspective_division(&clip[0]);
        let b = apply_perspective_division(&clip[1]);
        let sa = ndc_to_screen(a.x, a.y, w, h);
        let sb = ndc_to_screen(b.x, b.y, w, h);

        let steps = ((sb - sa).abs().max() / framebuffer.sample_count as f32)
            .ceil()
            .clamp(1.0, 4096.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let point = clip[0] * (1.0 - t) + clip[1] * t;
            let varying = varyings[0] * (1.0 - t) + varyings[1] * t;
            self.rasterize_point(framebuffer, shader, state, point, varying);
        }
    }

    /// Fills a triangle already inside the view volume.
    fn fill_triangle<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        state: RasterState,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        if clip_coords.iter().any(|c| c.w.abs() < 1e-6) {
            return;
        }
        let (width, height) = (framebuffer.buffer_width as f32, framebuffer.buffer_height as f32);
        let w_values = clip_coords.map(|c| c.w);
        let screen_coords = clip_coords.map(|c| {
            let ndc = apply_perspective_division(&c);
            ndc_to_screen(ndc.x, ndc.y, width, height)
        });

        let [s0, s1, s2] = screen_coords;
        let signed_area = (s1 - s0).perp(&(s2 - s1));
        match self.cull_mode {
            CullMode::Back if signed_area >= 0.0 => return,
            CullMode::Front if signed_area <= 0.0 => return,
            _ => {}
        }

        let Some((start_x, end_x, start_y, end_y)) = Self::screen_bounds(framebuffer, &screen_coords)
        else {
            return;
        };

        // Rows of one triangle never overlap, so they can be shaded in parallel
        // without changing the result of this draw call.
        (start_y..=end_y).into_par_iter().for_each(|y| {
            for x in start_x..=end_x {
                let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

                let Some(bary) = barycentric(pixel_center, &screen_coords) else {
                    continue;
                };
                if !is_inside_triangle(bary) {
                    continue;
                }

                if self.wireframe {
                    let threshold = 0.02;
                    if bary.x > threshold && bary.y > threshold && bary.z > threshold {
                        continue;
                    }
                }

                let Some(corrected_bary) =
                    perspective_correct_barycentric(bary, &w_values)
                else {
                    continue;
                };

                // NDC depth is affine in screen space, so it takes the uncorrected weights.
                let z_ndc = bary.x * clip_coords[0].z / w_values[0]
                    + bary.y * clip_coords[1].z / w_values[1]
                    + bary.z * clip_coords[2].z / w_values[2];
                let depth = z_ndc * 0.5 + 0.5;

                if Self::depth_pass(framebuffer, state, x, y, depth) {
                    let interpolated_varying = varyings[0] * corrected_bary.x
                        + varyings[1] * corrected_bary.y
                        + varyings[2] * corrected_bary.z;

                    let color = shader.fragment(interpolated_varying);
                    Self::write_color(framebuffer, state, x, y, color);
                }
            }
        });
    }

    #[inline]
    fn depth_pass(framebuffer: &FrameBuffer, state: RasterState, x: usize, y: usize, depth: f32) -> bool {
        match (state.depth_test, state.depth_write) {
            (true, true) => framebuffer.depth_test_and_update(x, y, depth),
            (true, false) => framebuffer.depth_test(x, y, depth),
            (false, true) => {
                framebuffer.store_depth(x, y, depth);
                framebuffer.in_bounds(x, y)
            }
            (false, false) => framebuffer.in_bounds(x, y),
        }
    }

    #[inline]
    fn write_color(framebuffer: &FrameBuffer, state: RasterState, x: usize, y: usize, color: Vector4<f32>) {
        if state.blend {
            framebuffer.blend_pixel_safe(x, y, color);
        } else {
            framebuffer.set_pixel_safe(x, y, color.xyz());
        }
    }

    /// Inclusive pixel range `(x0, x1, y0, y1)` covered by the triangle's
    /// bounding box, or `None` when it lies off screen.
    fn screen_bounds(
        framebuffer: &FrameBuffer,
        points: &[Point2<f32>; 3],
    ) -> Option<(usize, usize, usize, usize)> {
        let (lo_x, hi_x) = points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
        let (lo_y, hi_y) = points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        let (max_x, max_y) = (framebuffer.buffer_width as f32 - 1.0, framebuffer.buffer_height as f32 - 1.0);
        if hi_x < 0.0 || hi_y < 0.0 || lo_x.floor() > max_x || lo_y.floor() > max_y {
            return None;
        }
        Some((
            lo_x.floor().max(0.0) as usize,
            hi_x.ceil().min(max_x) as usize,
            lo_y.floor().max(0.0) as usize,
            hi_y.ceil().min(max_y) as usize,
        ))
    }
}

/// `(axis, sign)` pairs: a point is inside when `sign * p[axis] <= p.w`.
const CLIP_PLANES: [(usize, f32); 6] = [(0, 1.0), (0, -1.0), (1, 1.0), (1, -1.0), (2, 1.0), (2, -1.0)];

/// One Sutherland-Hodgman pass. `output` is overwritten.
fn clip_against_plane<S: Shader>(
    input: &[(Vector4<f32>, S::Varying)],
    output: &mut Vec<(Vector4<f32>, S::Varying)>,
    axis: usize,
    sign: f32,
) {
    output.clear();
    // Signed distance to the plane; non-negative is inside.
    let distance = |p: &Vector4<f32>| p.w - sign * p[axis];

    let Some(&last) = input.last() else {
        return;
    };
    let mut prev = last;
    for &curr in input {
        let (d_prev, d_curr) = (distance(&prev.0), distance(&curr.0));
        let (prev_in, curr_in) = (d_prev >= -1e-6, d_curr >= -1e-6);

        if prev_in != curr_in {
            let t = d_prev / (d_prev - d_curr);
            if t.is_finite() {
                output.push((prev.0 + (curr.0 - prev.0) * t, prev.1 * (1.0 - t) + curr.1 * t));
            }
        }
        if curr_in {
            output.push(curr);
        }
        prev = curr;
    }
}
