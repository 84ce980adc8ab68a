use crate::core::context::{RenderContext, Topology};
use crate::core::geometry::GeometryBuffer;
use crate::error::SceneError;
use crate::io::obj_loader::load_obj;
use crate::pipeline::program::ShaderProgram;
use crate::scene::heightfield::HeightField;
use crate::scene::material::Material;
use crate::scene::mesh::Mesh;
use crate::scene::procedural;
use log::info;
use nalgebra::{Point3, Vector3, Vector4};
use std::path::Path;
use std::sync::Arc;

/// Offset used for the central differences in [`Model::normal_at`].
const NORMAL_EPSILON: f32 = 0.1;

/// What a model is, as far as height queries and collision care.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    Object,
    FlatFloor,
    Heightmap(HeightField),
}

/// A named, positioned collection of meshes forming one scene object.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub origin: Vector3<f32>,
    /// Euler angles in degrees.
    pub orientation: Vector3<f32>,
    /// Degrees per second added to the base orientation by [`Model::update`].
    pub spin: Vector3<f32>,
    pub transparent: bool,
    pub is_sun: bool,
    kind: ModelKind,
    base_orientation: Vector3<f32>,
    width: f32,
    depth: f32,
    height_scale: f32,
}

impl Model {
    /// Wraps already generated geometry in a single mesh.
    pub fn from_geometry(
        ctx: &mut dyn RenderContext,
        name: impl Into<String>,
        shader: Arc<ShaderProgram>,
        geometry: GeometryBuffer,
        material: Material,
    ) -> Result<Self, SceneError> {
        let mesh = Mesh::create(ctx, Topology::Triangles, shader, geometry, material)?;
        Ok(Self::with_meshes(name.into(), vec![mesh], ModelKind::Object))
    }

    /// Loads an OBJ file. `scale` is applied uniformly to the mesh.
    pub fn from_obj(
        ctx: &mut dyn RenderContext,
        path: impl AsRef<Path>,
        shader: Arc<ShaderProgram>,
        material: Material,
        scale: f32,
    ) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let data = load_obj(path)?;
        info!("Loaded '{}' ({} vertices)", path.display(), data.positions.len());

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".to_string());
        let mut model = Self::from_geometry(ctx, name, shader, data.into_geometry(), material)?;
        for mesh in &mut model.meshes {
            mesh.scale = scale;
        }
        Ok(model)
    }

    /// Flat walkable quad of `width × depth` world units.
    pub fn flat_floor(
        ctx: &mut dyn RenderContext,
        shader: Arc<ShaderProgram>,
        width: f32,
        depth: f32,
        material: Material,
    ) -> Result<Self, SceneError> {
        let geometry = procedural::flat_quad(width, depth);
        let mesh = Mesh::create(ctx, Topology::Triangles, shader, geometry, material)?;
        let mut model = Self::with_meshes("floor".to_string(), vec![mesh], ModelKind::FlatFloor);
        model.width = width;
        model.depth = depth;
        Ok(model)
    }

    /// Terrain grid with one vertex per sample, spanning
    /// `(columns - 1) × (rows - 1)` world units.
    pub fn heightmap(
        ctx: &mut dyn RenderContext,
        shader: Arc<ShaderProgram>,
        field: HeightField,
        height_scale: f32,
        material: Material,
    ) -> Result<Self, SceneError> {
        let geometry = procedural::heightmap_grid(&field, height_scale);
        let mesh = Mesh::create(ctx, Topology::Triangles, shader, geometry, material)?;

        let width = (field.columns() - 1) as f32;
        let depth = (field.rows() - 1) as f32;
        let mut model =
            Self::with_meshes("terrain".to_string(), vec![mesh], ModelKind::Heightmap(field));
        model.width = width;
        model.depth = depth;
        model.height_scale = height_scale;
        Ok(model)
    }

    /// UV sphere of `radius` with a flat colour: ambient and diffuse take
    /// `color`, specular is white.
    pub fn sphere(
        ctx: &mut dyn RenderContext,
        shader: Arc<ShaderProgram>,
        segments: u32,
        radius: f32,
        color: Vector4<f32>,
    ) -> Result<Self, SceneError> {
        let mut model = Self::from_geometry(
            ctx,
            "sphere",
            shader,
            procedural::uv_sphere(segments),
            Material::solid(color),
        )?;
        for mesh in &mut model.meshes {
            mesh.scale = radius;
        }
        model.transparent = color.w < 1.0;
        Ok(model)
    }

    fn with_meshes(name: String, meshes: Vec<Mesh>, kind: ModelKind) -> Self {
        Self {
            name,
            meshes,
            origin: Vector3::zeros(),
            orientation: Vector3::zeros(),
            spin: Vector3::zeros(),
            transparent: false,
            is_sun: false,
            kind,
            base_orientation: Vector3::zeros(),
            width: 0.0,
            depth: 0.0,
            height_scale: 1.0,
        }
    }

    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    pub fn is_floor(&self) -> bool {
        matches!(self.kind, ModelKind::FlatFloor | ModelKind::Heightmap(_))
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }

    /// Sets the orientation that spin is accumulated on top of.
    pub fn set_orientation(&mut self, orientation: Vector3<f32>) {
        self.base_orientation = orientation;
        self.orientation = orientation;
    }

    /// Terrain height relative to `origin.y` below the world point `(x, z)`.
    ///
    /// Queries outside the terrain saturate to the edge. Zero for anything
    /// that is not a heightmap.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let ModelKind::Heightmap(field) = &self.kind else {
            return 0.0;
        };
        let (columns, rows) = (field.columns(), field.rows());

        let u = ((x - self.origin.x) / self.width + 0.5).clamp(0.0, 1.0);
        let v = ((z - self.origin.z) / self.depth + 0.5).clamp(0.0, 1.0);
        // A single column or row has zero extent and divides to NaN.
        let u = if u.is_nan() { 0.0 } else { u };
        let v = if v.is_nan() { 0.0 } else { v };

        let gx = u * self.width;
        let gz = v * self.depth;
        let (fx, fz) = (gx.floor(), gz.floor());
        let (tx, tz) = (gx - fx, gz - fz);

        let x0 = (fx as usize).min(columns - 1);
        let z0 = (fz as usize).min(rows - 1);
        let x1 = (x0 + 1).min(columns - 1);
        let z1 = (z0 + 1).min(rows - 1);

        let top = field.sample(x0, z0) * (1.0 - tx) + field.sample(x1, z0) * tx;
        let bottom = field.sample(x0, z1) * (1.0 - tx) + field.sample(x1, z1) * tx;
        (top * (1.0 - tz) + bottom * tz) * self.height_scale
    }

    /// Finite-difference normal at `(x, z)`, `tangent × bitangent`. That
    /// faces -Y on terrain, so flat ground gives `(0, -1, 0)`. Straight up
    /// for anything that is not a heightmap.
    pub fn normal_at(&self, x: f32, z: f32) -> Vector3<f32> {
        if !matches!(self.kind, ModelKind::Heightmap(_)) {
            return Vector3::y();
        }
        let h = self.height_at(x, z);
        let dx = self.height_at(x + NORMAL_EPSILON, z) - h;
        let dz = self.height_at(x, z + NORMAL_EPSILON) - h;

        let tangent = Vector3::new(1.0, dx / NORMAL_EPSILON, 0.0);
        let bitangent = Vector3::new(0.0, dz / NORMAL_EPSILON, 1.0);
        tangent.cross(&bitangent).normalize()
    }

    /// Surface height this model offers at `(x, z)`, if the point lies over
    /// its footprint. Only floors and heightmaps take part.
    pub fn floor_height_at(&self, x: f32, z: f32, floor_offset: f32) -> Option<f32> {
        if !self.is_floor() {
            return None;
        }
        let inside = (x - self.origin.x).abs() <= self.width / 4.0
            && (z - self.origin.z).abs() <= self.depth / 4.0;
        if !inside {
            return None;
        }
        Some(match self.kind {
            ModelKind::Heightmap(_) => self.origin.y + self.height_at(x, z),
            _ => self.origin.y + floor_offset,
        })
    }

    /// Applies time-driven spin. Models without spin keep their orientation.
    pub fn update(&mut self, total_time: f32) {
        if self.spin != Vector3::zeros() {
            self.orientation = self.base_orientation + self.spin * total_time;
        }
    }

    pub fn distance_to(&self, point: &Point3<f32>) -> f32 {
        (point.coords - self.origin).norm()
    }

    /// Draws every mesh at `origin + offset` with `orientation + rotation`.
    pub fn draw(&self, ctx: &mut dyn RenderContext, offset: &Vector3<f32>, rotation: &Vector3<f32>) {
        let position = self.origin + offset;
        let orientation = self.orientation + rotation;
        for mesh in &self.meshes {
            mesh.draw(ctx, &position, &orientation);
        }
    }

    /// Releases every mesh. The model can be dropped afterwards.
    pub fn clear(&mut self, ctx: &mut dyn RenderContext) {
        for mesh in &mut self.meshes {
            mesh.clear(ctx);
        }
        self.meshes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ProgramDesc;
    use crate::testing::{Call, RecordingContext};

    fn setup() -> (RecordingContext, Arc<ShaderProgram>) {
        let mut ctx = RecordingContext::default();
        let shader = ShaderProgram::build(&mut ctx, &ProgramDesc::phong(1)).unwrap();
        (ctx, shader)
    }

    fn terrain(field: HeightField, height_scale: f32) -> (RecordingContext, Model) {
        let (mut ctx, shader) = setup();
        let model = Model::heightmap(&mut ctx, shader, field, height_scale, Material::default())
            .unwrap();
        (ctx, model)
    }

    fn ramp() -> HeightField {
        // 5 × 3 samples with distinct values, all exact in binary.
        let samples = (0..15).map(|i| i as f32 / 16.0).collect();
        HeightField::new(5, 3, samples).unwrap()
    }

    #[test]
    fn uniform_field_at_origin() {
        let field = HeightField::new(4, 4, vec![0.5; 16]).unwrap();
        let (mut ctx, mut model) = terrain(field, 10.0);
        model.origin = Vector3::new(3.0, 0.0, -2.0);
        assert_eq!(model.height_at(3.0, -2.0), 5.0);
        model.clear(&mut ctx);
    }

    #[test]
    fn grid_points_return_stored_samples() {
        let field = ramp();
        let (mut ctx, model) = terrain(field.clone(), 4.0);
        // Vertex (x, z) sits at (x - 2, z - 1) in world space.
        for z in 0..field.rows() {
            for x in 0..field.columns() {
                let h = model.height_at(x as f32 - 2.0, z as f32 - 1.0);
                assert_eq!(h, field.sample(x, z) * 4.0, "sample ({x}, {z})");
            }
        }
        let mut model = model;
        model.clear(&mut ctx);
    }

    #[test]
    fn off_grid_points_stay_within_cell_bounds() {
        let field = ramp();
        let (mut ctx, mut model) = terrain(field.clone(), 2.0);
        for (x, z) in [(-1.3, -0.2), (0.5, 0.5), (1.75, 0.9), (-1.99, -0.99)] {
            let h = model.height_at(x, z);
            let cx = (x + 2.0_f32).floor() as usize;
            let cz = (z + 1.0_f32).floor() as usize;
            let corners = [
                field.sample(cx, cz),
                field.sample(cx + 1, cz),
                field.sample(cx, cz + 1),
                field.sample(cx + 1, cz + 1),
            ];
            let lo = corners.iter().cloned().fold(f32::INFINITY, f32::min) * 2.0;
            let hi = corners.iter().cloned().fold(f32::NEG_INFINITY, f32::max) * 2.0;
            assert!(h >= lo - 1e-6 && h <= hi + 1e-6, "{h} not in [{lo}, {hi}]");
        }
        model.clear(&mut ctx);
    }

    #[test]
    fn outside_queries_clamp_to_edge() {
        let (mut ctx, mut model) = terrain(ramp(), 3.0);
        assert_eq!(model.height_at(100.0, 0.3), model.height_at(2.0, 0.3));
        assert_eq!(model.height_at(-50.0, -50.0), model.height_at(-2.0, -1.0));
        assert_eq!(model.height_at(2.0, 9.0), model.height_at(2.0, 1.0));
        model.clear(&mut ctx);
    }

    #[test]
    fn normal_of_flat_and_sloped_terrain() {
        let (mut ctx, mut flat) = terrain(HeightField::new(3, 3, vec![0.25; 9]).unwrap(), 1.0);
        let n = flat.normal_at(0.0, 0.0);
        assert!((n + Vector3::y()).norm() < 1e-6);
        flat.clear(&mut ctx);

        // Height rises along +x by 1 per unit.
        let field = HeightField::from_fn(5, 5, |u, _| u).unwrap();
        let (mut ctx, mut slope) = terrain(field, 4.0);
        let n = slope.normal_at(0.0, 0.0);
        assert!(n.x > 0.0 && n.y < 0.0);
        assert!((n.norm() - 1.0).abs() < 1e-5);

        // Matches the cross product of the finite-difference tangents.
        let h = slope.height_at(0.0, 0.0);
        let dx = (slope.height_at(NORMAL_EPSILON, 0.0) - h) / NORMAL_EPSILON;
        let dz = (slope.height_at(0.0, NORMAL_EPSILON) - h) / NORMAL_EPSILON;
        let expected = Vector3::new(1.0, dx, 0.0)
            .cross(&Vector3::new(0.0, dz, 1.0))
            .normalize();
        assert!((n - expected).norm() < 1e-5);
        assert!((n - Vector3::new(0.70710677, -0.70710677, 0.0)).norm() < 1e-3);
        slope.clear(&mut ctx);
    }

    #[test]
    fn non_terrain_models_report_flat_ground() {
        let (mut ctx, shader) = setup();
        let mut floor = Model::flat_floor(&mut ctx, shader, 10.0, 10.0, Material::default()).unwrap();
        assert_eq!(floor.height_at(1.0, 1.0), 0.0);
        assert_eq!(floor.normal_at(1.0, 1.0), Vector3::y());
        assert_eq!(floor.floor_height_at(1.0, 1.0, 0.25), Some(0.25));
        assert_eq!(floor.floor_height_at(3.0, 0.0, 0.25), None);
        floor.clear(&mut ctx);
    }

    #[test]
    fn objects_are_not_floors() {
        let (mut ctx, shader) = setup();
        let mut ball = Model::sphere(&mut ctx, shader, 4, 1.0, Vector4::new(1.0, 0.0, 0.0, 0.5))
            .unwrap();
        assert!(ball.transparent);
        assert_eq!(ball.floor_height_at(0.0, 0.0, 0.0), None);
        assert_eq!(ball.meshes[0].material.ambient, Vector4::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(ball.meshes[0].material.specular, Vector4::repeat(1.0));
        ball.clear(&mut ctx);
    }

    #[test]
    fn spin_accumulates_on_base_orientation() {
        let (mut ctx, shader) = setup();
        let mut model = Model::from_geometry(
            &mut ctx,
            "cube",
            shader,
            procedural::flat_quad(1.0, 1.0),
            Material::default(),
        )
        .unwrap();
        model.set_orientation(Vector3::new(0.0, 10.0, 0.0));
        model.spin = Vector3::new(0.0, 30.0, 0.0);
        model.update(2.0);
        assert_eq!(model.orientation, Vector3::new(0.0, 70.0, 0.0));
        model.clear(&mut ctx);
    }

    #[test]
    fn draw_offsets_every_mesh_and_clear_releases_them() {
        let (mut ctx, shader) = setup();
        let mut model = Model::from_geometry(
            &mut ctx,
            "quad",
            shader,
            procedural::flat_quad(1.0, 1.0),
            Material::default(),
        )
        .unwrap();
        model.origin = Vector3::new(1.0, 2.0, 3.0);
        ctx.clear_calls();

        model.draw(&mut ctx, &Vector3::new(1.0, 0.0, 0.0), &Vector3::zeros());
        assert_eq!(ctx.draws().len(), 1);
        let Some(crate::core::context::UniformValue::Mat4(m)) =
            ctx.uniform_writes("uM_m").first().copied()
        else {
            panic!("model matrix not uploaded");
        };
        assert_eq!((m[(0, 3)], m[(1, 3)], m[(2, 3)]), (2.0, 2.0, 3.0));

        model.clear(&mut ctx);
        assert!(model.meshes.is_empty());
        assert_eq!(ctx.count(|c| matches!(c, Call::DeleteVertexArray(_))), 1);
    }
}
