//! The contract between scene objects and the graphics backend.
//!
//! Every piece of bind state (current program, vertex array, texture units,
//! blend/depth switches) lives behind [`RenderContext`] and is mutated only
//! through it. Draw code receives the context explicitly instead of reaching
//! for ambient global state.

use crate::core::geometry::{AttributeFormat, Vertex, VertexAttribute};
use crate::scene::texture::TextureImage;
use nalgebra::{Matrix4, Vector3, Vector4};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The reserved "nothing allocated" handle.
            pub const NONE: Self = Self(0);

            pub fn is_valid(self) -> bool {
                self.0 != 0
            }
        }
    };
}

handle!(
    /// Vertex array object: attribute layout plus attached buffers.
    VertexArrayId
);
handle!(BufferId);
handle!(ProgramId);
handle!(TextureId);

/// Location of a vertex input inside a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

/// Location of a uniform inside a program. Only meaningful for the program
/// it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Points,
    Lines,
    Triangles,
}

impl Topology {
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            Topology::Points => 1,
            Topology::Lines => 2,
            Topology::Triangles => 3,
        }
    }
}

/// Contents uploaded into a buffer object.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferData {
    Vertices(Vec<Vertex>),
    Indices(Vec<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Ambient/diffuse/specular lighting with sun, point lights and spotlight.
    Phong,
    /// Flat `uniform_Color`, positions only.
    Unlit,
}

/// What to build when asking the backend for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramDesc {
    pub kind: ProgramKind,
    /// Length of the `pointLights[]` uniform array.
    pub point_light_capacity: usize,
}

impl ProgramDesc {
    pub fn phong(point_light_capacity: usize) -> Self {
        Self {
            kind: ProgramKind::Phong,
            point_light_capacity,
        }
    }

    pub fn unlit() -> Self {
        Self {
            kind: ProgramKind::Unlit,
            point_light_capacity: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Vec3,
    Vec4,
    Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: String,
    pub location: AttributeLocation,
    pub format: AttributeFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
}

/// Inputs and uniforms a linked program exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInterface {
    pub attributes: Vec<AttributeDecl>,
    /// A uniform's location is its index in this list.
    pub uniforms: Vec<UniformDecl>,
}

impl ProgramInterface {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(UniformLocation)
    }

    pub fn with_attribute(mut self, name: &str, format: AttributeFormat) -> Self {
        let location = AttributeLocation(self.attributes.len() as u32);
        self.attributes.push(AttributeDecl {
            name: name.to_string(),
            location,
            format,
        });
        self
    }

    pub fn with_uniform(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        self.uniforms.push(UniformDecl {
            name: name.into(),
            kind,
        });
        self
    }
}

/// Handle-based graphics backend.
///
/// Allocation calls return the zero handle on failure. Calls made with a
/// zero or stale handle are ignored by the backend (and may be logged).
/// State set through this trait persists across draw calls; callers must not
/// assume anything is restored for them.
pub trait RenderContext {
    fn create_vertex_array(&mut self) -> VertexArrayId;
    fn delete_vertex_array(&mut self, vao: VertexArrayId);
    fn create_buffer(&mut self, data: BufferData) -> BufferId;
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Attaches a vertex buffer to binding 0 of `vao`.
    fn set_vertex_buffer(&mut self, vao: VertexArrayId, buffer: BufferId, stride: usize);
    fn set_index_buffer(&mut self, vao: VertexArrayId, buffer: BufferId);
    fn enable_attribute(
        &mut self,
        vao: VertexArrayId,
        location: AttributeLocation,
        attribute: VertexAttribute,
    );

    /// Compiles and links a program. Returns the zero handle on failure.
    fn create_program(&mut self, desc: &ProgramDesc) -> ProgramId;
    fn delete_program(&mut self, program: ProgramId);
    fn program_interface(&self, program: ProgramId) -> Option<ProgramInterface>;

    fn create_texture(&mut self, image: TextureImage) -> TextureId;
    fn delete_texture(&mut self, texture: TextureId);

    fn use_program(&mut self, program: ProgramId);
    /// Writes a uniform of the program currently in use.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);
    fn bind_texture(&mut self, unit: u32, texture: TextureId);
    fn bind_vertex_array(&mut self, vao: VertexArrayId);

    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_blend(&mut self, enabled: bool);

    /// Indexed draw of `count` indices from the bound vertex array.
    fn draw_elements(&mut self, topology: Topology, count: usize);
}
