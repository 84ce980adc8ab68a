use crate::core::context::{
    AttributeLocation, BufferData, BufferId, ProgramDesc, ProgramId, ProgramInterface,
    ProgramKind, RenderContext, TextureId, Topology, UniformLocation, UniformValue, VertexArrayId,
};
use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::{Semantic, Vertex, VertexAttribute};
use crate::core::pipeline::Shader;
use crate::core::rasterizer::{RasterState, Rasterizer};
use crate::pipeline::shaders::phong::{self, PhongShader};
use crate::pipeline::shaders::uniforms::UniformBlock;
use crate::pipeline::shaders::unlit::{self, UnlitShader};
use crate::scene::texture::TextureImage;
use log::{debug, warn};
use nalgebra::{Point3, Vector2, Vector3};
use rayon::prelude::*;
use std::collections::HashMap;

/// Counters for the current frame, reset by [`Renderer::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub primitives: usize,
}

#[derive(Debug, Default)]
struct VertexArray {
    vertex_buffer: BufferId,
    stride: usize,
    index_buffer: BufferId,
    attributes: Vec<(AttributeLocation, VertexAttribute)>,
}

struct Program {
    kind: ProgramKind,
    interface: ProgramInterface,
    values: Vec<Option<UniformValue>>,
}

/// Software implementation of [`RenderContext`] on top of the rasterizer.
///
/// Objects live in id-keyed tables; id 0 is never handed out. Each
/// `draw_elements` call runs to completion before returning.
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
    pub stats: FrameStats,

    next_id: u32,
    vertex_arrays: HashMap<u32, VertexArray>,
    buffers: HashMap<u32, BufferData>,
    programs: HashMap<u32, Program>,
    textures: HashMap<u32, TextureImage>,

    current_program: ProgramId,
    bound_vertex_array: VertexArrayId,
    texture_units: HashMap<u32, TextureId>,
    state: RasterState,
}

impl Renderer {
    /// Creates a new renderer.
    /// sample_count: 1 for no AA, 2 for 2x2 SSAA, etc.
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            framebuffer: FrameBuffer::new(width, height, sample_count),
            stats: FrameStats::default(),
            next_id: 1,
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            current_program: ProgramId::NONE,
            bound_vertex_array: VertexArrayId::NONE,
            texture_units: HashMap::new(),
            state: RasterState::default(),
        }
    }

    /// Clears color and depth, and resets the frame counters.
    pub fn clear(&mut self, color: Vector3<f32>) {
        self.framebuffer.clear(color, f32::INFINITY);
        self.stats = FrameStats::default();
    }

    pub fn raster_state(&self) -> RasterState {
        self.state
    }

    /// Number of live objects of every kind (vertex arrays, buffers, programs, textures).
    pub fn live_objects(&self) -> usize {
        self.vertex_arrays.len() + self.buffers.len() + self.programs.len() + self.textures.len()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Assembles the vertices a draw will read, zeroing disabled attributes.
    fn fetch_vertices(vertices: &[Vertex], attributes: &[(AttributeLocation, VertexAttribute)]) -> Vec<Vertex> {
        let enabled = |semantic: Semantic| attributes.iter().any(|(_, a)| a.semantic == semantic);
        let (position, normal, texcoord) = (
            enabled(Semantic::Position),
            enabled(Semantic::Normal),
            enabled(Semantic::TexCoord),
        );

        vertices
            .iter()
            .map(|v| Vertex {
                position: if position { v.position } else { Point3::origin() },
                normal: if normal { v.normal } else { Vector3::zeros() },
                texcoord: if texcoord { v.texcoord } else { Vector2::zeros() },
            })
            .collect()
    }

    /// Vertex stage for every vertex, then primitive assembly and rasterization.
    /// Returns the number of primitives submitted.
    fn submit<S: Shader>(
        rasterizer: &Rasterizer,
        framebuffer: &FrameBuffer,
        state: RasterState,
        shader: &S,
        topology: Topology,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> usize {
        let shaded: Vec<_> = vertices.par_iter().map(|v| shader.vertex(v)).collect();
        let per_primitive = topology.vertices_per_primitive();
        let mut primitives = 0;

        for chunk in indices.chunks_exact(per_primitive) {
            let Some(corners) = chunk
                .iter()
                .map(|&i| shaded.get(i as usize).copied())
                .collect::<Option<Vec<_>>>()
            else {
                warn!("Index out of range in draw call, primitive skipped");
                continue;
            };

            match topology {
                Topology::Triangles => rasterizer.rasterize_triangle(
                    framebuffer,
                    shader,
                    state,
                    &[corners[0].0, corners[1].0, corners[2].0],
                    &[corners[0].1, corners[1].1, corners[2].1],
                ),
                Topology::Lines => rasterizer.rasterize_line(
                    framebuffer,
                    shader,
                    state,
                    [corners[0].0, corners[1].0],
                    [corners[0].1, corners[1].1],
                ),
                Topology::Points => {
                    rasterizer.rasterize_point(framebuffer, shader, state, corners[0].0, corners[0].1)
                }
            }
            primitives += 1;
        }
        primitives
    }
}

impl RenderContext for Renderer {
    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = self.allocate_id();
        self.vertex_arrays.insert(id, VertexArray::default());
        VertexArrayId(id)
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        if self.vertex_arrays.remove(&vao.0).is_some() && self.bound_vertex_array == vao {
            self.bound_vertex_array = VertexArrayId::NONE;
        }
    }

    fn create_buffer(&mut self, data: BufferData) -> BufferId {
        let id = self.allocate_id();
        self.buffers.insert(id, data);
        BufferId(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer.0);
    }

    fn set_vertex_buffer(&mut self, vao: VertexArrayId, buffer: BufferId, stride: usize) {
        match self.vertex_arrays.get_mut(&vao.0) {
            Some(array) => {
                array.vertex_buffer = buffer;
                array.stride = stride;
            }
            None => warn!("set_vertex_buffer on unknown vertex array {}", vao.0),
        }
    }

    fn set_index_buffer(&mut self, vao: VertexArrayId, buffer: BufferId) {
        match self.vertex_arrays.get_mut(&vao.0) {
            Some(array) => array.index_buffer = buffer,
            None => warn!("set_index_buffer on unknown vertex array {}", vao.0),
        }
    }

    fn enable_attribute(
        &mut self,
        vao: VertexArrayId,
        location: AttributeLocation,
        attribute: VertexAttribute,
    ) {
        match self.vertex_arrays.get_mut(&vao.0) {
            Some(array) => {
                array.attributes.retain(|(l, _)| *l != location);
                array.attributes.push((location, attribute));
            }
            None => warn!("enable_attribute on unknown vertex array {}", vao.0),
        }
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> ProgramId {
        let interface = match desc.kind {
            ProgramKind::Phong => phong::interface(desc.point_light_capacity),
            ProgramKind::Unlit => unlit::interface(),
        };
        let id = self.allocate_id();
        self.programs.insert(
            id,
            Program {
                kind: desc.kind,
                values: vec![None; interface.uniforms.len()],
                interface,
            },
        );
        debug!("Linked {:?} program {}", desc.kind, id);
        ProgramId(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program.0).is_some() && self.current_program == program {
            self.current_program = ProgramId::NONE;
        }
    }

    fn program_interface(&self, program: ProgramId) -> Option<ProgramInterface> {
        self.programs.get(&program.0).map(|p| p.interface.clone())
    }

    fn create_texture(&mut self, image: TextureImage) -> TextureId {
        if image.width == 0 || image.height == 0 {
            warn!("Refusing to create an empty texture");
            return TextureId::NONE;
        }
        let id = self.allocate_id();
        self.textures.insert(id, image);
        TextureId(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture.0).is_some() {
            self.texture_units.retain(|_, bound| *bound != texture);
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        if program.is_valid() && !self.programs.contains_key(&program.0) {
            warn!("use_program with unknown program {}", program.0);
            return;
        }
        self.current_program = program;
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(program) = self.programs.get_mut(&self.current_program.0) else {
            warn!("set_uniform with no program in use");
            return;
        };
        let Some(decl) = program.interface.uniforms.get(location.0) else {
            warn!("Uniform location {} out of range", location.0);
            return;
        };
        if decl.kind != value.kind() {
            warn!(
                "Uniform '{}' is {:?}, ignoring {:?} value",
                decl.name,
                decl.kind,
                value.kind()
            );
            return;
        }
        program.values[location.0] = Some(value);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        if texture.is_valid() {
            self.texture_units.insert(unit, texture);
        } else {
            self.texture_units.remove(&unit);
        }
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayId) {
        self.bound_vertex_array = vao;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth_write = enabled;
    }

    fn set_blend(&mut self, enabled: bool) {
        self.state.blend = enabled;
    }

    fn draw_elements(&mut self, topology: Topology, count: usize) {
        let Some(program) = self.programs.get(&self.current_program.0) else {
            warn!("draw_elements with no program in use");
            return;
        };
        let Some(array) = self.vertex_arrays.get(&self.bound_vertex_array.0) else {
            warn!("draw_elements with no vertex array bound");
            return;
        };
        let (Some(BufferData::Vertices(vertices)), Some(BufferData::Indices(indices))) = (
            self.buffers.get(&array.vertex_buffer.0),
            self.buffers.get(&array.index_buffer.0),
        ) else {
            warn!(
                "Vertex array {} is missing its vertex or index buffer",
                self.bound_vertex_array.0
            );
            return;
        };

        let indices = &indices[..count.min(indices.len())];
        let vertices = Self::fetch_vertices(vertices, &array.attributes);
        let uniforms = UniformBlock::new(&program.interface, &program.values);

        let primitives = match program.kind {
            ProgramKind::Phong => {
                let unit = uniforms.int("material.texture").max(0) as u32;
                let texture = self
                    .texture_units
                    .get(&unit)
                    .and_then(|id| self.textures.get(&id.0));
                let shader = PhongShader::from_uniforms(&uniforms, texture);
                Self::submit(
                    &self.rasterizer,
                    &self.framebuffer,
                    self.state,
                    &shader,
                    topology,
                    &vertices,
                    indices,
                )
            }
            ProgramKind::Unlit => {
                let shader = UnlitShader::from_uniforms(&uniforms);
                Self::submit(
                    &self.rasterizer,
                    &self.framebuffer,
                    self.state,
                    &shader,
                    topology,
                    &vertices,
                    indices,
                )
            }
        };

        self.stats.draw_calls += 1;
        self.stats.primitives += primitives;
    }
}
