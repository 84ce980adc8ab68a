use crate::core::context::{ProgramInterface, UniformKind};
use crate::core::geometry::{AttributeFormat, Semantic, Vertex};
use crate::core::pipeline::Shader;
use crate::pipeline::shaders::uniforms::UniformBlock;
use nalgebra::{Matrix4, Vector4};

/// Positions only, flat `uniform_Color`.
pub fn interface() -> ProgramInterface {
    ProgramInterface::default()
        .with_attribute(Semantic::Position.attribute_name(), AttributeFormat::Float32x3)
        .with_uniform("uM_m", UniformKind::Mat4)
        .with_uniform("uV_m", UniformKind::Mat4)
        .with_uniform("uP_m", UniformKind::Mat4)
        .with_uniform("uniform_Color", UniformKind::Vec4)
}

/// A shader that paints every fragment with one colour.
pub struct UnlitShader {
    /// Model-View-Projection matrix.
    pub mvp_matrix: Matrix4<f32>,
    pub color: Vector4<f32>,
}

impl UnlitShader {
    pub fn new(mvp_matrix: Matrix4<f32>, color: Vector4<f32>) -> Self {
        Self { mvp_matrix, color }
    }

    pub fn from_uniforms(u: &UniformBlock<'_>) -> Self {
        Self::new(
            u.mat4("uP_m") * u.mat4("uV_m") * u.mat4("uM_m"),
            u.vec4("uniform_Color"),
        )
    }
}

impl Shader for UnlitShader {
    /// The colour rides along as the varying so clipping can treat it like any other.
    type Varying = Vector4<f32>;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        (self.mvp_matrix * vertex.position.to_homogeneous(), self.color)
    }

    fn fragment(&self, varying: Self::Varying) -> Vector4<f32> {
        varying
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::UniformValue;
    use nalgebra::{Point3, Vector2, Vector3};

    #[test]
    fn outputs_uniform_colour() {
        let interface = interface();
        let mut values = vec![None; interface.uniforms.len()];
        let loc = interface.uniform_location("uniform_Color").unwrap();
        values[loc.0] = Some(UniformValue::Vec4(Vector4::new(0.0, 1.0, 0.0, 1.0)));

        let shader = UnlitShader::from_uniforms(&UniformBlock::new(&interface, &values));
        let v = Vertex::new(Point3::new(0.5, 0.0, 0.0), Vector3::y(), Vector2::zeros());
        let (clip, varying) = shader.vertex(&v);

        // identity matrices when unset
        assert_eq!(clip, Vector4::new(0.5, 0.0, 0.0, 1.0));
        assert_eq!(shader.fragment(varying), Vector4::new(0.0, 1.0, 0.0, 1.0));
    }
}
