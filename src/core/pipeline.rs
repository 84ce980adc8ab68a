use crate::core::geometry::Vertex;
use nalgebra::Vector4;
use std::ops::{Add, Mul};

/// Anything the rasterizer can blend between vertices with barycentric weights.
pub trait Interpolatable:
    Copy + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
}

impl<T> Interpolatable for T where T: Copy + Add<Output = T> + Mul<f32, Output = T> + Send + Sync {}

/// The programmable half of a draw: a vertex stage producing clip-space
/// positions plus varyings, and a fragment stage turning interpolated
/// varyings into a color. Fragments of one draw are shaded on several threads.
pub trait Shader: Send + Sync {
    type Varying: Interpolatable;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying);

    /// Linear RGBA. Alpha only matters with blending enabled.
    fn fragment(&self, varying: Self::Varying) -> Vector4<f32>;
}
