use crate::core::context::{ProgramInterface, UniformKind};
use crate::core::geometry::{AttributeFormat, Semantic, Vertex};
use crate::core::pipeline::Shader;
use crate::pipeline::shaders::uniforms::UniformBlock;
use crate::scene::texture::TextureImage;
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Inputs and uniforms of the lit program. `point_lights` sets the length of
/// the `pointLights[]` array.
pub fn interface(point_lights: usize) -> ProgramInterface {
    use UniformKind::*;

    let mut interface = ProgramInterface::default()
        .with_attribute(Semantic::Position.attribute_name(), AttributeFormat::Float32x3)
        .with_attribute(Semantic::Normal.attribute_name(), AttributeFormat::Float32x3)
        .with_attribute(Semantic::TexCoord.attribute_name(), AttributeFormat::Float32x2)
        .with_uniform("uM_m", Mat4)
        .with_uniform("uV_m", Mat4)
        .with_uniform("uP_m", Mat4)
        .with_uniform("viewPos", Vec3)
        .with_uniform("material.ambient", Vec4)
        .with_uniform("material.diffuse", Vec4)
        .with_uniform("material.specular", Vec4)
        .with_uniform("material.shininess", Float)
        .with_uniform("material.emissive", Int)
        .with_uniform("material.hasTexture", Int)
        .with_uniform("material.texture", Int)
        .with_uniform("dirLight.direction", Vec3)
        .with_uniform("dirLight.ambient", Vec3)
        .with_uniform("dirLight.diffuse", Vec3)
        .with_uniform("dirLight.specular", Vec3)
        .with_uniform("numPointLights", Int);

    for i in 0..point_lights {
        for (field, kind) in [
            ("position", Vec3),
            ("ambient", Vec3),
            ("diffuse", Vec3),
            ("specular", Vec3),
            ("constant", Float),
            ("linear", Float),
            ("quadratic", Float),
        ] {
            interface = interface.with_uniform(format!("pointLights[{i}].{field}"), kind);
        }
    }

    interface
        .with_uniform("spotLight.position", Vec3)
        .with_uniform("spotLight.direction", Vec3)
        .with_uniform("spotLight.cutOff", Float)
        .with_uniform("spotLight.outerCutOff", Float)
        .with_uniform("spotLight.ambient", Vec3)
        .with_uniform("spotLight.diffuse", Vec3)
        .with_uniform("spotLight.specular", Vec3)
}

/// World-space surface attributes carried from the vertex to the fragment stage.
#[derive(Clone, Copy, Debug)]
pub struct PhongVarying {
    pub normal: Vector3<f32>,
    pub world_pos: Point3<f32>,
    pub uv: Vector2<f32>,
}

// Points only combine through their coordinates.
impl Add for PhongVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            normal: self.normal + other.normal,
            world_pos: Point3::from(self.world_pos.coords + other.world_pos.coords),
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for PhongVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            normal: self.normal * scalar,
            world_pos: Point3::from(self.world_pos.coords * scalar),
            uv: self.uv * scalar,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PhongMaterial {
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub shininess: f32,
    pub emissive: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DirLight {
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PointLightParams {
    pub position: Point3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpotLightParams {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    /// Cosine of the inner cone angle.
    pub cut_off: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off: f32,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

/// Ambient + diffuse + specular under one sun, a list of point lights and a spotlight.
pub struct PhongShader<'a> {
    pub model_matrix: Matrix4<f32>,
    pub mvp_matrix: Matrix4<f32>,
    pub normal_matrix: Matrix3<f32>,
    pub camera_pos: Point3<f32>,
    pub material: PhongMaterial,
    pub texture: Option<&'a TextureImage>,
    pub dir_light: DirLight,
    pub point_lights: Vec<PointLightParams>,
    pub spot_light: SpotLightParams,
}

impl<'a> PhongShader<'a> {
    /// Snapshot of the program's current uniforms. `texture` is whatever the
    /// `material.texture` unit has bound, if sampling is enabled.
    pub fn from_uniforms(u: &UniformBlock<'_>, texture: Option<&'a TextureImage>) -> Self {
        let model = u.mat4("uM_m");
        let view = u.mat4("uV_m");
        let projection = u.mat4("uP_m");

        // Inverse-transpose keeps normals perpendicular under scaling.
        let upper = model.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = upper
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(upper);

        let count = u.int("numPointLights").max(0) as usize;
        let point_lights = (0..count)
            .map_while(|i| {
                let field = |f: &str| format!("pointLights[{i}].{f}");
                u.get(&field("position"))?;
                Some(PointLightParams {
                    position: Point3::from(u.vec3(&field("position"))),
                    ambient: u.vec3(&field("ambient")),
                    diffuse: u.vec3(&field("diffuse")),
                    specular: u.vec3(&field("specular")),
                    constant: u.float(&field("constant")),
                    linear: u.float(&field("linear")),
                    quadratic: u.float(&field("quadratic")),
                })
            })
            .collect();

        Self {
            model_matrix: model,
            mvp_matrix: projection * view * model,
            normal_matrix,
            camera_pos: Point3::from(u.vec3("viewPos")),
            material: PhongMaterial {
                ambient: u.vec4("material.ambient"),
                diffuse: u.vec4("material.diffuse"),
                specular: u.vec4("material.specular"),
                shininess: u.float("material.shininess"),
                emissive: u.int("material.emissive") != 0,
            },
            texture: texture.filter(|_| u.int("material.hasTexture") != 0),
            dir_light: DirLight {
                direction: u.vec3("dirLight.direction"),
                ambient: u.vec3("dirLight.ambient"),
                diffuse: u.vec3("dirLight.diffuse"),
                specular: u.vec3("dirLight.specular"),
            },
            point_lights,
            spot_light: SpotLightParams {
                position: Point3::from(u.vec3("spotLight.position")),
                direction: u.vec3("spotLight.direction"),
                cut_off: u.float("spotLight.cutOff"),
                outer_cut_off: u.float("spotLight.outerCutOff"),
                ambient: u.vec3("spotLight.ambient"),
                diffuse: u.vec3("spotLight.diffuse"),
                specular: u.vec3("spotLight.specular"),
            },
        }
    }

    /// Ambient, diffuse and specular contributions of one light along `light_dir`.
    #[inline]
    fn shade(
        &self,
        normal: &Vector3<f32>,
        view_dir: &Vector3<f32>,
        light_dir: &Vector3<f32>,
        base_ambient: &Vector3<f32>,
        base_diffuse: &Vector3<f32>,
        colors: (&Vector3<f32>, &Vector3<f32>, &Vector3<f32>),
    ) -> (Vector3<f32>, Vector3<f32>) {
        let (ambient, diffuse, specular) = colors;

        let diff = normal.dot(light_dir).max(0.0);
        let reflect_dir = normal * (2.0 * normal.dot(light_dir)) - light_dir;
        let spec = view_dir
            .dot(&reflect_dir)
            .max(0.0)
            .powf(self.material.shininess);

        let ambient = ambient.component_mul(base_ambient);
        let lit = diffuse.component_mul(base_diffuse) * diff
            + specular.component_mul(&self.material.specular.xyz()) * spec;
        (ambient, lit)
    }
}

impl Shader for PhongShader<'_> {
    type Varying = PhongVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let world_pos = Point3::from((self.model_matrix * vertex.position.to_homogeneous()).xyz());
        let world_normal = self.normal_matrix * vertex.normal;
        let clip_pos = self.mvp_matrix * vertex.position.to_homogeneous();

        let varying = PhongVarying {
            normal: world_normal,
            world_pos,
            uv: vertex.texcoord,
        };

        (clip_pos, varying)
    }

    fn fragment(&self, varying: Self::Varying) -> Vector4<f32> {
        let tex = self
            .texture
            .map(|t| t.sample(varying.uv.x, varying.uv.y))
            .unwrap_or_else(|| Vector4::new(1.0, 1.0, 1.0, 1.0));

        let base_diffuse = self.material.diffuse.xyz().component_mul(&tex.xyz());
        let alpha = self.material.diffuse.w * tex.w;

        if self.material.emissive {
            return Vector4::new(base_diffuse.x, base_diffuse.y, base_diffuse.z, alpha);
        }

        let base_ambient = self.material.ambient.xyz().component_mul(&tex.xyz());
        let normal = varying.normal.try_normalize(1e-8).unwrap_or_else(Vector3::y);
        let view_dir = (self.camera_pos - varying.world_pos)
            .try_normalize(1e-8)
            .unwrap_or_else(Vector3::z);

        let mut result = Vector3::zeros();

        // Directional (sun)
        if let Some(light_dir) = (-self.dir_light.direction).try_normalize(1e-8) {
            let (ambient, lit) = self.shade(
                &normal,
                &view_dir,
                &light_dir,
                &base_ambient,
                &base_diffuse,
                (
                    &self.dir_light.ambient,
                    &self.dir_light.diffuse,
                    &self.dir_light.specular,
                ),
            );
            result += ambient + lit;
        }

        // Point lights
        for light in &self.point_lights {
            let to_light = light.position - varying.world_pos;
            let distance = to_light.norm();
            let Some(light_dir) = to_light.try_normalize(1e-8) else {
                continue;
            };
            let denom = light.constant + light.linear * distance + light.quadratic * distance * distance;
            let attenuation = if denom > 1e-8 { 1.0 / denom } else { 1.0 };

            let (ambient, lit) = self.shade(
                &normal,
                &view_dir,
                &light_dir,
                &base_ambient,
                &base_diffuse,
                (&light.ambient, &light.diffuse, &light.specular),
            );
            result += (ambient + lit) * attenuation;
        }

        // Spotlight (soft edge between inner and outer cone)
        let spot = &self.spot_light;
        if let (Some(light_dir), Some(axis)) = (
            (spot.position - varying.world_pos).try_normalize(1e-8),
            (-spot.direction).try_normalize(1e-8),
        ) {
            let theta = light_dir.dot(&axis);
            let epsilon = spot.cut_off - spot.outer_cut_off;
            let intensity = if epsilon.abs() > 1e-8 {
                ((theta - spot.outer_cut_off) / epsilon).clamp(0.0, 1.0)
            } else if theta >= spot.cut_off {
                1.0
            } else {
                0.0
            };

            let (ambient, lit) = self.shade(
                &normal,
                &view_dir,
                &light_dir,
                &base_ambient,
                &base_diffuse,
                (&spot.ambient, &spot.diffuse, &spot.specular),
            );
            result += ambient + lit * intensity;
        }

        Vector4::new(
            result.x.min(1.0),
            result.y.min(1.0),
            result.z.min(1.0),
            alpha,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::UniformValue;

    fn block_values(interface: &ProgramInterface, set: &[(&str, UniformValue)]) -> Vec<Option<UniformValue>> {
        let mut values = vec![None; interface.uniforms.len()];
        for (name, value) in set {
            let loc = interface.uniform_location(name).unwrap();
            values[loc.0] = Some(*value);
        }
        values
    }

    fn white() -> UniformValue {
        UniformValue::Vec4(Vector4::new(1.0, 1.0, 1.0, 1.0))
    }

    #[test]
    fn interface_declares_requested_point_lights() {
        let interface = interface(2);
        assert!(interface.uniform_location("pointLights[1].quadratic").is_some());
        assert!(interface.uniform_location("pointLights[2].position").is_none());
        assert_eq!(interface.attributes.len(), 3);
    }

    #[test]
    fn sun_straight_above_lights_upward_normal() {
        let interface = interface(0);
        let values = block_values(
            &interface,
            &[
                ("material.diffuse", white()),
                ("material.shininess", UniformValue::Float(32.0)),
                ("dirLight.direction", UniformValue::Vec3(Vector3::new(0.0, -1.0, 0.0))),
                ("dirLight.diffuse", UniformValue::Vec3(Vector3::new(0.5, 0.5, 0.5))),
                ("viewPos", UniformValue::Vec3(Vector3::new(5.0, 0.0, 0.0))),
            ],
        );
        let shader = PhongShader::from_uniforms(&UniformBlock::new(&interface, &values), None);
        let color = shader.fragment(PhongVarying {
            normal: Vector3::y(),
            world_pos: Point3::origin(),
            uv: Vector2::zeros(),
        });
        assert!((color.x - 0.5).abs() < 1e-5);
        assert_eq!(color.w, 1.0);
    }

    #[test]
    fn emissive_ignores_lights_and_keeps_alpha() {
        let interface = interface(0);
        let values = block_values(
            &interface,
            &[
                ("material.diffuse", UniformValue::Vec4(Vector4::new(1.0, 0.8, 0.0, 0.5))),
                ("material.emissive", UniformValue::Int(1)),
            ],
        );
        let shader = PhongShader::from_uniforms(&UniformBlock::new(&interface, &values), None);
        let color = shader.fragment(PhongVarying {
            normal: -Vector3::y(),
            world_pos: Point3::origin(),
            uv: Vector2::zeros(),
        });
        assert_eq!(color, Vector4::new(1.0, 0.8, 0.0, 0.5));
    }

    #[test]
    fn point_lights_past_count_are_ignored() {
        let interface = interface(2);
        let values = block_values(
            &interface,
            &[
                ("numPointLights", UniformValue::Int(1)),
                ("pointLights[0].position", UniformValue::Vec3(Vector3::y())),
                ("pointLights[1].position", UniformValue::Vec3(Vector3::x())),
            ],
        );
        let shader = PhongShader::from_uniforms(&UniformBlock::new(&interface, &values), None);
        assert_eq!(shader.point_lights.len(), 1);
    }
}
