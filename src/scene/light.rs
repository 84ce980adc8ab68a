use crate::core::context::{RenderContext, UniformValue};
use crate::pipeline::program::{ShaderProgram, set_optional};
use crate::scene::camera::Camera;
use log::warn;
use nalgebra::{Point3, Rotation3, Vector3};

/// Parallel light travelling along `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vector3::new(-0.2, -1.0, -0.3).normalize(),
            ambient: Vector3::repeat(0.2),
            diffuse: Vector3::repeat(0.5),
            specular: Vector3::repeat(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    /// Attenuation coefficients: 1 / (constant + linear·d + quadratic·d²)
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    pub fn new(position: Point3<f32>, color: Vector3<f32>) -> Self {
        Self {
            position,
            ambient: color * 0.05,
            diffuse: color * 0.8,
            specular: color,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

/// Cone light. Angles are in degrees; the shader receives their cosines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub enabled: bool,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            direction: -Vector3::z(),
            cut_off: 12.5,
            outer_cut_off: 17.5,
            ambient: Vector3::zeros(),
            diffuse: Vector3::repeat(1.0),
            specular: Vector3::repeat(1.0),
            enabled: false,
        }
    }
}

/// Every light in the scene plus the sun animation.
#[derive(Debug, Clone, Default)]
pub struct Lighting {
    pub sun: DirectionalLight,
    pub points: Vec<PointLight>,
    pub spot: SpotLight,
    /// Radians per second the sun turns around the Z axis.
    pub sun_speed: f32,
    base_sun_direction: Option<Vector3<f32>>,
    overflow_reported: bool,
}

impl Lighting {
    pub fn new(sun: DirectionalLight, points: Vec<PointLight>, spot: SpotLight, sun_speed: f32) -> Self {
        Self {
            sun,
            points,
            spot,
            sun_speed,
            base_sun_direction: None,
            overflow_reported: false,
        }
    }

    /// Turns the sun and moves the spotlight onto the camera.
    pub fn update(&mut self, total_time: f32, camera: &Camera) {
        let base = *self.base_sun_direction.get_or_insert(self.sun.direction);
        if self.sun_speed != 0.0 {
            let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), self.sun_speed * total_time);
            self.sun.direction = rotation * base;
        }

        self.spot.position = camera.position;
        self.spot.direction = camera.front();
    }

    /// Writes the light uniforms of `program`, which must be in use.
    /// Programs without lighting inputs are left untouched.
    pub fn upload(&mut self, ctx: &mut dyn RenderContext, program: &ShaderProgram) {
        let locations = program.locations();
        if !locations.is_lit() {
            return;
        }

        let sun = &locations.dir_light;
        set_optional(ctx, sun.direction, UniformValue::Vec3(self.sun.direction));
        set_optional(ctx, sun.ambient, UniformValue::Vec3(self.sun.ambient));
        set_optional(ctx, sun.diffuse, UniformValue::Vec3(self.sun.diffuse));
        set_optional(ctx, sun.specular, UniformValue::Vec3(self.sun.specular));

        let capacity = program.point_light_capacity();
        if self.points.len() > capacity && !self.overflow_reported {
            warn!(
                "{} point lights configured but the program holds {}; the rest are ignored",
                self.points.len(),
                capacity
            );
            self.overflow_reported = true;
        }
        let count = self.points.len().min(capacity);
        for (light, slot) in self.points.iter().zip(&locations.point_lights) {
            set_optional(ctx, slot.position, UniformValue::Vec3(light.position.coords));
            set_optional(ctx, slot.ambient, UniformValue::Vec3(light.ambient));
            set_optional(ctx, slot.diffuse, UniformValue::Vec3(light.diffuse));
            set_optional(ctx, slot.specular, UniformValue::Vec3(light.specular));
            set_optional(ctx, slot.constant, UniformValue::Float(light.constant));
            set_optional(ctx, slot.linear, UniformValue::Float(light.linear));
            set_optional(ctx, slot.quadratic, UniformValue::Float(light.quadratic));
        }
        set_optional(ctx, locations.num_point_lights, UniformValue::Int(count as i32));

        // A disabled spotlight is uploaded black so it adds nothing.
        let spot = &self.spot;
        let (ambient, diffuse, specular) = if spot.enabled {
            (spot.ambient, spot.diffuse, spot.specular)
        } else {
            (Vector3::zeros(), Vector3::zeros(), Vector3::zeros())
        };
        let s = &locations.spot_light;
        set_optional(ctx, s.position, UniformValue::Vec3(spot.position.coords));
        set_optional(ctx, s.direction, UniformValue::Vec3(spot.direction));
        set_optional(ctx, s.cut_off, UniformValue::Float(spot.cut_off.to_radians().cos()));
        set_optional(
            ctx,
            s.outer_cut_off,
            UniformValue::Float(spot.outer_cut_off.to_radians().cos()),
        );
        set_optional(ctx, s.ambient, UniformValue::Vec3(ambient));
        set_optional(ctx, s.diffuse, UniformValue::Vec3(diffuse));
        set_optional(ctx, s.specular, UniformValue::Vec3(specular));
    }
}
