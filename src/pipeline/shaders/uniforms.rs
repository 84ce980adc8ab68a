use crate::core::context::{ProgramInterface, UniformValue};
use nalgebra::{Matrix4, Vector3, Vector4};

/// Read-only view over the uniform values written into one program.
///
/// Unset or mistyped uniforms read back as the supplied default, the way an
/// unwritten GLSL uniform reads as zero.
#[derive(Clone, Copy)]
pub struct UniformBlock<'a> {
    interface: &'a ProgramInterface,
    values: &'a [Option<UniformValue>],
}

impl<'a> UniformBlock<'a> {
    pub fn new(interface: &'a ProgramInterface, values: &'a [Option<UniformValue>]) -> Self {
        Self { interface, values }
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        let location = self.interface.uniform_location(name)?;
        self.values.get(location.0).copied().flatten()
    }

    pub fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(UniformValue::Float(v)) => v,
            _ => 0.0,
        }
    }

    pub fn int(&self, name: &str) -> i32 {
        match self.get(name) {
            Some(UniformValue::Int(v)) => v,
            _ => 0,
        }
    }

    pub fn vec3(&self, name: &str) -> Vector3<f32> {
        match self.get(name) {
            Some(UniformValue::Vec3(v)) => v,
            _ => Vector3::zeros(),
        }
    }

    pub fn vec4(&self, name: &str) -> Vector4<f32> {
        match self.get(name) {
            Some(UniformValue::Vec4(v)) => v,
            _ => Vector4::zeros(),
        }
    }

    pub fn mat4(&self, name: &str) -> Matrix4<f32> {
        match self.get(name) {
            Some(UniformValue::Mat4(m)) => m,
            _ => Matrix4::identity(),
        }
    }
}
