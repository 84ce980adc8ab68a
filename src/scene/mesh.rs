use crate::core::context::{
    BufferData, BufferId, RenderContext, Topology, UniformValue, VertexArrayId,
};
use crate::core::geometry::{GeometryBuffer, Vertex};
use crate::core::math::transform::TransformFactory;
use crate::error::ResourceCreationError;
use crate::pipeline::program::{ShaderProgram, set_optional};
use crate::scene::material::Material;
use log::{debug, warn};
use nalgebra::{Matrix4, Vector3};
use std::sync::Arc;

/// Geometry uploaded to the render context, plus how to draw it.
///
/// Owns its vertex array and buffers exclusively, so it is move-only.
/// A default (or cleared) mesh holds zero handles and refuses to draw.
#[derive(Debug)]
pub struct Mesh {
    vertex_array: VertexArrayId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    topology: Topology,
    index_count: usize,
    shader: Option<Arc<ShaderProgram>>,

    pub material: Material,
    pub origin: Vector3<f32>,
    /// Euler angles in degrees.
    pub orientation: Vector3<f32>,
    pub scale: f32,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            vertex_array: VertexArrayId::NONE,
            vertex_buffer: BufferId::NONE,
            index_buffer: BufferId::NONE,
            topology: Topology::Triangles,
            index_count: 0,
            shader: None,
            material: Material::default(),
            origin: Vector3::zeros(),
            orientation: Vector3::zeros(),
            scale: 1.0,
        }
    }
}

impl Mesh {
    /// Uploads `geometry` and wires its vertex layout to `shader`'s inputs.
    ///
    /// On failure every object created so far is released again.
    pub fn create(
        ctx: &mut dyn RenderContext,
        topology: Topology,
        shader: Arc<ShaderProgram>,
        geometry: GeometryBuffer,
        material: Material,
    ) -> Result<Self, ResourceCreationError> {
        geometry.validate()?;
        if !shader.id().is_valid() {
            return Err(ResourceCreationError::InvalidShader);
        }

        let layout = Vertex::layout();
        let bindings = layout.bindings(shader.interface())?;

        let vertex_array = ctx.create_vertex_array();
        if !vertex_array.is_valid() {
            return Err(ResourceCreationError::AllocationFailed("vertex array"));
        }

        let index_count = geometry.indices.len();
        let vertex_count = geometry.vertices.len();

        let vertex_buffer = ctx.create_buffer(BufferData::Vertices(geometry.vertices));
        if !vertex_buffer.is_valid() {
            ctx.delete_vertex_array(vertex_array);
            return Err(ResourceCreationError::AllocationFailed("vertex buffer"));
        }

        let index_buffer = ctx.create_buffer(BufferData::Indices(geometry.indices));
        if !index_buffer.is_valid() {
            ctx.delete_buffer(vertex_buffer);
            ctx.delete_vertex_array(vertex_array);
            return Err(ResourceCreationError::AllocationFailed("index buffer"));
        }

        ctx.set_vertex_buffer(vertex_array, vertex_buffer, layout.stride);
        ctx.set_index_buffer(vertex_array, index_buffer);
        for (location, attribute) in bindings {
            ctx.enable_attribute(vertex_array, location, attribute);
        }

        debug!(
            "Created mesh: vao {}, {} vertices, {} indices, {:?}",
            vertex_array.0, vertex_count, index_count, topology
        );

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
            topology,
            index_count,
            shader: Some(shader),
            material,
            origin: Vector3::zeros(),
            orientation: Vector3::zeros(),
            scale: 1.0,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.vertex_array.is_valid() && self.shader.is_some()
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn shader(&self) -> Option<&Arc<ShaderProgram>> {
        self.shader.as_ref()
    }

    /// translate(origin + offset) * R(rotation) * R(orientation) * scale
    pub fn model_matrix(&self, offset: &Vector3<f32>, rotation: &Vector3<f32>) -> Matrix4<f32> {
        TransformFactory::translation(&(self.origin + offset))
            * TransformFactory::rotation_euler_degrees(rotation)
            * TransformFactory::rotation_euler_degrees(&self.orientation)
            * TransformFactory::scaling(self.scale)
    }

    /// Uploads the model matrix and material, then issues one indexed draw.
    pub fn draw(&self, ctx: &mut dyn RenderContext, offset: &Vector3<f32>, rotation: &Vector3<f32>) {
        let Some(shader) = self.shader.as_ref().filter(|_| self.vertex_array.is_valid()) else {
            warn!("Skipping draw of an uninitialized mesh");
            return;
        };
        let locations = shader.locations();
        let material = &self.material;

        ctx.use_program(shader.id());
        set_optional(
            ctx,
            locations.model,
            UniformValue::Mat4(self.model_matrix(offset, rotation)),
        );

        let m = &locations.material;
        set_optional(ctx, m.ambient, UniformValue::Vec4(material.ambient));
        set_optional(ctx, m.diffuse, UniformValue::Vec4(material.diffuse));
        set_optional(ctx, m.specular, UniformValue::Vec4(material.specular));
        set_optional(ctx, m.shininess, UniformValue::Float(material.shininess));
        set_optional(ctx, m.emissive, UniformValue::Int(material.emissive as i32));
        set_optional(ctx, m.has_texture, UniformValue::Int(material.texture.is_some() as i32));
        set_optional(ctx, locations.color, UniformValue::Vec4(material.diffuse));

        if let Some(texture) = material.texture {
            ctx.bind_texture(0, texture);
            set_optional(ctx, m.texture, UniformValue::Int(0));
        }

        ctx.bind_vertex_array(self.vertex_array);
        ctx.draw_elements(self.topology, self.index_count);
    }

    /// Draws at the mesh's own origin and orientation.
    pub fn draw_standalone(&self, ctx: &mut dyn RenderContext) {
        self.draw(ctx, &Vector3::zeros(), &Vector3::zeros());
    }

    /// Releases the context objects and resets to the default state. Idempotent.
    pub fn clear(&mut self, ctx: &mut dyn RenderContext) {
        if self.index_buffer.is_valid() {
            ctx.delete_buffer(self.index_buffer);
        }
        if self.vertex_buffer.is_valid() {
            ctx.delete_buffer(self.vertex_buffer);
        }
        if self.vertex_array.is_valid() {
            ctx.delete_vertex_array(self.vertex_array);
        }
        // The assignment below drops the old value; it must not look leaked.
        self.index_buffer = BufferId::NONE;
        self.vertex_buffer = BufferId::NONE;
        self.vertex_array = VertexArrayId::NONE;
        *self = Self::default();
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if self.vertex_array.is_valid() {
            debug!(
                "Mesh with vao {} dropped without clear; its context objects are leaked",
                self.vertex_array.0
            );
        }
    }
}
