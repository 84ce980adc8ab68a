use crate::core::context::TextureId;
use nalgebra::Vector4;

/// Surface response to light, uploaded as the `material.*` uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub shininess: f32,
    /// Diffuse map bound to texture unit 0.
    pub texture: Option<TextureId>,
    /// Draw the diffuse colour as-is, ignoring lights (used for the sun).
    pub emissive: bool,
}

impl Default for Material {
    fn default() -> Self {
        let white = Vector4::new(1.0, 1.0, 1.0, 1.0);
        Self {
            ambient: white,
            diffuse: white,
            specular: white,
            shininess: 1.0,
            texture: None,
            emissive: false,
        }
    }
}

impl Material {
    /// Flat colour: ambient = diffuse = `color`, white specular.
    pub fn solid(color: Vector4<f32>) -> Self {
        Self {
            ambient: color,
            diffuse: color,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = texture.is_valid().then_some(texture);
        self
    }

    /// True when blending would change the output.
    pub fn is_translucent(&self) -> bool {
        self.diffuse.w < 1.0
    }
}
