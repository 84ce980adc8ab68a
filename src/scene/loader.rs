use crate::core::context::{ProgramDesc, RenderContext, TextureId};
use crate::error::{ResourceCreationError, SceneError};
use crate::io::config::{Config, ObjectConfig};
use crate::io::heightmap::load_height_field;
use crate::pipeline::program::ShaderProgram;
use crate::scene::camera::Camera;
use crate::scene::heightfield::HeightField;
use crate::scene::light::{DirectionalLight, Lighting, PointLight, SpotLight};
use crate::scene::material::Material;
use crate::scene::model::Model;
use crate::scene::texture::load_texture;
use crate::scene::world::{Physics, Scene};
use log::{info, warn};
use nalgebra::{Point3, Vector3, Vector4};
use std::sync::Arc;

/// Programs shared by every model built from one config.
struct Programs {
    phong: Arc<ShaderProgram>,
    unlit: Option<Arc<ShaderProgram>>,
}

impl Programs {
    fn for_object(
        &mut self,
        ctx: &mut dyn RenderContext,
        object: &ObjectConfig,
    ) -> Result<Arc<ShaderProgram>, SceneError> {
        match object.shader.as_str() {
            "phong" => Ok(self.phong.clone()),
            "unlit" => {
                if let Some(unlit) = &self.unlit {
                    return Ok(unlit.clone());
                }
                let unlit = ShaderProgram::build(ctx, &ProgramDesc::unlit())?;
                self.unlit = Some(unlit.clone());
                Ok(unlit)
            }
            other => {
                warn!("Unknown shader '{}' for '{}', using phong", other, object.path);
                Ok(self.phong.clone())
            }
        }
    }
}

pub fn build_lighting(config: &Config) -> Lighting {
    let sun = DirectionalLight {
        direction: Vector3::from(config.sun.direction)
            .try_normalize(1e-8)
            .unwrap_or(-Vector3::y()),
        ambient: Vector3::from(config.sun.ambient),
        diffuse: Vector3::from(config.sun.diffuse),
        specular: Vector3::from(config.sun.specular),
    };

    let points = config
        .point_lights
        .iter()
        .map(|p| PointLight {
            position: Point3::from(p.position),
            ambient: Vector3::from(p.ambient),
            diffuse: Vector3::from(p.diffuse),
            specular: Vector3::from(p.specular),
            constant: p.constant,
            linear: p.linear,
            quadratic: p.quadratic,
        })
        .collect();

    let s = &config.spotlight;
    let spot = SpotLight {
        cut_off: s.cut_off,
        outer_cut_off: s.outer_cut_off,
        ambient: Vector3::from(s.ambient),
        diffuse: Vector3::from(s.diffuse),
        specular: Vector3::from(s.specular),
        enabled: s.enabled,
        ..SpotLight::default()
    };

    Lighting::new(sun, points, spot, config.sun.speed)
}

pub fn build_camera(config: &Config) -> Camera {
    let c = &config.camera;
    let mut camera = Camera::new(Point3::from(c.position), c.yaw, c.pitch)
        .with_projection(c.fov, c.near, c.far);
    camera.speed = c.speed;
    camera.sensitivity = c.sensitivity;
    camera.mode = c.mode();
    camera.set_aspect_ratio(config.window.width as f32 / config.window.height as f32);
    camera
}

/// Uploads an image as a texture owned by `scene`.
fn upload_texture(
    ctx: &mut dyn RenderContext,
    scene: &mut Scene,
    path: &str,
) -> Result<TextureId, SceneError> {
    let image = load_texture(path)?;
    let id = ctx.create_texture(image);
    if !id.is_valid() {
        return Err(ResourceCreationError::AllocationFailed("texture").into());
    }
    info!("Loaded texture '{}'", path);
    scene.textures.push(id);
    Ok(id)
}

fn textured(
    ctx: &mut dyn RenderContext,
    scene: &mut Scene,
    material: Material,
    texture: Option<&str>,
) -> Result<Material, SceneError> {
    match texture {
        Some(path) => Ok(material.with_texture(upload_texture(ctx, scene, path)?)),
        None => Ok(material),
    }
}

/// Gentle rolling hills used when no heightmap image is configured.
fn procedural_terrain(columns: usize, rows: usize) -> Result<HeightField, SceneError> {
    use std::f32::consts::TAU;
    let field = HeightField::from_fn(columns, rows, |u, v| {
        0.5 + 0.25 * (u * TAU * 2.0).sin() * (v * TAU * 1.5).cos()
    })?;
    Ok(field)
}

/// Builds every program, model, texture and light a config describes.
///
/// Any asset or allocation failure aborts construction; objects created
/// before the failure are released again.
pub fn build_scene(ctx: &mut dyn RenderContext, config: &Config) -> Result<Scene, SceneError> {
    let mut scene = Scene::new(build_camera(config), build_lighting(config));
    scene.physics = Physics {
        gravity: config.camera.gravity,
        jump_speed: config.camera.jump_speed,
        player_half_height: config.camera.player_half_height,
        floor_offset: config.collision.floor_offset,
    };
    scene.sun_distance = config.sun.model_distance;

    match populate(ctx, config, &mut scene) {
        Ok(()) => {
            info!(
                "Scene initialized with {} models, {} floors, {} programs, {} textures",
                scene.models.len(),
                scene.floors.len(),
                scene.programs.len(),
                scene.textures.len()
            );
            Ok(scene)
        }
        Err(e) => {
            scene.release(ctx);
            Err(e)
        }
    }
}

fn populate(ctx: &mut dyn RenderContext, config: &Config, scene: &mut Scene) -> Result<(), SceneError> {
    let phong = ShaderProgram::build(ctx, &ProgramDesc::phong(config.render.point_light_capacity))?;
    scene.add_program(&phong);
    let mut programs = Programs { phong, unlit: None };

    let floor = &config.floor;
    if floor.enabled {
        let material = textured(
            ctx,
            scene,
            Material::solid(Vector4::from(floor.color)),
            floor.texture.as_deref(),
        )?;
        let mut model =
            Model::flat_floor(ctx, programs.phong.clone(), floor.width, floor.depth, material)?;
        model.origin = Vector3::from(floor.origin);
        model.transparent = floor.color[3] < 1.0;
        scene.add_floor(model);
    }

    let terrain = &config.terrain;
    if terrain.enabled {
        let field = match &terrain.heightmap {
            Some(path) => load_height_field(path, terrain.columns, terrain.rows)?,
            None => procedural_terrain(terrain.columns, terrain.rows)?,
        };
        let material = textured(
            ctx,
            scene,
            Material::solid(Vector4::from(terrain.color)),
            terrain.texture.as_deref(),
        )?;
        let mut model =
            Model::heightmap(ctx, programs.phong.clone(), field, terrain.height_scale, material)?;
        model.origin = Vector3::from(terrain.origin);
        scene.add_floor(model);
    }

    for object in &config.objects {
        let shader = programs.for_object(ctx, object)?;
        scene.add_program(&shader);
        let material = Material {
            ambient: Vector4::from(object.ambient),
            diffuse: Vector4::from(object.diffuse),
            specular: Vector4::from(object.specular),
            shininess: object.shininess,
            ..Material::default()
        };
        let material = textured(ctx, scene, material, object.texture.as_deref())?;

        let mut model = Model::from_obj(ctx, &object.path, shader, material, config.render.mesh_scale)?;
        model.origin = Vector3::from(object.origin);
        model.set_orientation(Vector3::from(object.orientation));
        model.spin = Vector3::from(object.spin);
        model.transparent = object.transparent || material.is_translucent();
        scene.add_model(model);
    }

    for sphere in &config.spheres {
        let color = Vector4::from(sphere.color);
        let mut model =
            Model::sphere(ctx, programs.phong.clone(), sphere.segments, sphere.radius, color)?;
        model.origin = Vector3::from(sphere.origin);
        model.transparent |= sphere.transparent;
        scene.add_model(model);
    }

    if config.sun.show_model {
        let mut sun = Model::sphere(
            ctx,
            programs.phong.clone(),
            16,
            config.sun.model_radius,
            Vector4::new(1.0, 0.95, 0.7, 1.0),
        )?;
        sun.name = "sun".to_string();
        sun.is_sun = true;
        for mesh in &mut sun.meshes {
            mesh.material.emissive = true;
        }
        scene.sun_model = Some(scene.add_model(sun));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingContext};

    #[test]
    fn default_config_builds_floor_spheres_and_sun() {
        let mut ctx = RecordingContext::default();
        let config = Config::parse("").unwrap();
        let mut scene = build_scene(&mut ctx, &config).unwrap();

        // 2 spheres + sun, and the floor on its own
        assert_eq!(scene.models.len(), 3);
        assert_eq!(scene.floors.len(), 1);
        assert!(scene.floors[0].is_floor());
        assert_eq!(scene.programs.len(), 1);
        assert_eq!(scene.programs[0].point_light_capacity(), 4);
        assert_eq!(scene.models.iter().filter(|m| m.transparent).count(), 1);
        let sun = scene.sun_model.map(|i| &scene.models[i]).unwrap();
        assert!(sun.is_sun && sun.meshes[0].material.emissive);

        scene.release(&mut ctx);
    }

    #[test]
    fn procedural_terrain_is_a_floor() {
        let mut ctx = RecordingContext::default();
        let config = Config::parse(
            r#"
            [floor]
            enabled = false
            [sun]
            show_model = false
            [terrain]
            enabled = true
            columns = 9
            rows = 5
            origin = [0.0, 0.0, 0.0]
            "#,
        )
        .unwrap();
        let mut scene = build_scene(&mut ctx, &config).unwrap();
        assert!(scene.models.is_empty());
        let terrain = &scene.floors[0];
        assert!(terrain.is_floor());
        assert_eq!((terrain.width(), terrain.depth()), (8.0, 4.0));
        scene.release(&mut ctx);
    }

    #[test]
    fn missing_object_file_releases_partial_scene() {
        let mut ctx = RecordingContext::default();
        let config = Config::parse(
            r#"
            [[objects]]
            path = "/nonexistent/model.obj"
            "#,
        )
        .unwrap();

        let result = build_scene(&mut ctx, &config);
        assert!(matches!(result, Err(SceneError::Asset(_))));
        let created = ctx.count(|c| matches!(c, Call::CreateVertexArray(_)));
        let deleted = ctx.count(|c| matches!(c, Call::DeleteVertexArray(_)));
        assert_eq!(created, deleted);
        assert_eq!(ctx.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
    }

    #[test]
    fn program_failure_is_fatal() {
        let mut ctx = RecordingContext::default();
        ctx.fail_programs = true;
        let config = Config::parse("").unwrap();
        assert!(matches!(
            build_scene(&mut ctx, &config),
            Err(SceneError::Resource(ResourceCreationError::InvalidShader))
        ));
    }
}
