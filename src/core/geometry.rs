use crate::core::context::{AttributeLocation, ProgramInterface};
use crate::error::ResourceCreationError;
use nalgebra::{Point3, Vector2, Vector3};
use std::mem::{offset_of, size_of};

/// Represents a single vertex in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// Layout of `Vertex` as seen by a shader program.
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<Vertex>(),
            attributes: vec![
                VertexAttribute {
                    semantic: Semantic::Position,
                    format: AttributeFormat::Float32x3,
                    offset: offset_of!(Vertex, position),
                },
                VertexAttribute {
                    semantic: Semantic::Normal,
                    format: AttributeFormat::Float32x3,
                    offset: offset_of!(Vertex, normal),
                },
                VertexAttribute {
                    semantic: Semantic::TexCoord,
                    format: AttributeFormat::Float32x2,
                    offset: offset_of!(Vertex, texcoord),
                },
            ],
        }
    }
}

/// What a vertex attribute means to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Normal,
    TexCoord,
}

impl Semantic {
    /// Name of the shader input this semantic is bound to.
    pub fn attribute_name(self) -> &'static str {
        match self {
            Semantic::Position => "attribute_Position",
            Semantic::Normal => "attribute_Normal",
            Semantic::TexCoord => "attribute_TexCoords",
        }
    }

    /// Only positions are mandatory; unlit programs may ignore the rest.
    pub fn is_required(self) -> bool {
        matches!(self, Semantic::Position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub semantic: Semantic,
    pub format: AttributeFormat,
    /// Byte offset inside one vertex.
    pub offset: usize,
}

/// Ordered description of the attributes packed into one vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Pairs each attribute with the shader input of the same semantic.
    ///
    /// A required attribute the shader does not declare, or a declared input
    /// with a different format, is an error. Optional attributes the shader
    /// ignores are left unbound.
    pub fn bindings(
        &self,
        interface: &ProgramInterface,
    ) -> Result<Vec<(AttributeLocation, VertexAttribute)>, ResourceCreationError> {
        let mut bound = Vec::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            let name = attribute.semantic.attribute_name();
            match interface.attribute(name) {
                Some(decl) if decl.format != attribute.format => {
                    return Err(ResourceCreationError::AttributeFormatMismatch {
                        name,
                        expected: decl.format,
                        found: attribute.format,
                    });
                }
                Some(decl) => bound.push((decl.location, *attribute)),
                None if attribute.semantic.is_required() => {
                    return Err(ResourceCreationError::MissingAttribute(name));
                }
                None => {}
            }
        }
        Ok(bound)
    }
}

/// Raw geometry ready to be uploaded: vertices plus a triangle/point index list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffer {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl GeometryBuffer {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Wraps unrolled vertices with a sequential index list.
    pub fn sequential(vertices: Vec<Vertex>) -> Self {
        let indices = (0..vertices.len() as u32).collect();
        Self { vertices, indices }
    }

    /// Checks that every index refers to an existing vertex.
    pub fn validate(&self) -> Result<(), ResourceCreationError> {
        let vertex_count = self.vertices.len();
        match self
            .indices
            .iter()
            .find(|&&index| index as usize >= vertex_count)
        {
            Some(&index) => Err(ResourceCreationError::InvalidGeometry {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
