use crate::core::context::{RenderContext, TextureId, UniformValue};
use crate::pipeline::program::{ShaderProgram, set_optional};
use crate::scene::camera::{Camera, CameraMode};
use crate::scene::collision::{FloorContact, check_floor_collision};
use crate::scene::light::Lighting;
use crate::scene::model::Model;
use crate::ui::input::InputState;
use log::{debug, info};
use nalgebra::Vector3;
use std::sync::Arc;

/// Walk-mode movement constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    pub gravity: f32,
    pub jump_speed: f32,
    /// Distance from the camera down to the player's feet.
    pub player_half_height: f32,
    /// Height added to flat floors when resolving contacts.
    pub floor_offset: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            jump_speed: 5.0,
            player_half_height: 1.0,
            floor_offset: 0.0,
        }
    }
}

/// Indices into `distances`, farthest first. Equal distances keep their
/// original order.
pub fn transparent_draw_order(distances: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..distances.len()).collect();
    order.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]));
    order
}

/// Everything drawn in a frame, plus the camera and lights that see it.
pub struct Scene {
    pub camera: Camera,
    pub lighting: Lighting,
    pub physics: Physics,
    /// Dynamic objects: OBJ models, spheres and the sun.
    pub models: Vec<Model>,
    /// Flat floors and terrain. Only these take part in collision.
    pub floors: Vec<Model>,
    /// Programs that receive per-frame uniforms.
    pub programs: Vec<Arc<ShaderProgram>>,
    /// Textures owned by the scene, deleted on release.
    pub textures: Vec<TextureId>,
    /// Index of the model that follows the sun, if one is shown.
    pub sun_model: Option<usize>,
    pub sun_distance: f32,
}

impl Scene {
    pub fn new(camera: Camera, lighting: Lighting) -> Self {
        Self {
            camera,
            lighting,
            physics: Physics::default(),
            models: Vec::new(),
            floors: Vec::new(),
            programs: Vec::new(),
            textures: Vec::new(),
            sun_model: None,
            sun_distance: 60.0,
        }
    }

    pub fn add_model(&mut self, model: Model) -> usize {
        debug!("Adding model '{}' at {:?}", model.name, model.origin);
        self.models.push(model);
        self.models.len() - 1
    }

    pub fn add_floor(&mut self, floor: Model) -> usize {
        debug!("Adding floor '{}' at {:?}", floor.name, floor.origin);
        self.floors.push(floor);
        self.floors.len() - 1
    }

    /// Registers a program for per-frame uniforms. Registering the same
    /// program twice has no effect.
    pub fn add_program(&mut self, program: &Arc<ShaderProgram>) {
        if !self.programs.iter().any(|p| p.id() == program.id()) {
            self.programs.push(Arc::clone(program));
        }
    }

    /// Advances lights, the sun model and spinning models to `total_time`.
    pub fn update(&mut self, total_time: f32) {
        self.lighting.update(total_time, &self.camera);

        if let Some(sun) = self.sun_model.and_then(|i| self.models.get_mut(i)) {
            // The sun sits opposite to the direction its light travels.
            let towards_sun = -self.lighting.sun.direction.normalize();
            sun.origin = towards_sun * self.sun_distance;
        }

        for model in &mut self.models {
            model.update(total_time);
        }
    }

    /// Moves the camera for one frame of input and resolves floor contact in
    /// walk mode.
    pub fn step_camera(&mut self, input: &InputState, dt: f32) -> FloorContact {
        let camera = &mut self.camera;
        if input.toggle_mode {
            camera.toggle_mode();
            info!("Camera mode: {:?}", camera.mode);
        }
        if input.mouse_dx != 0.0 || input.mouse_dy != 0.0 {
            camera.process_mouse_movement(input.mouse_dx, input.mouse_dy, true);
        }

        let step = camera.process_input(input, dt);
        camera.position += step;

        if camera.mode == CameraMode::Fly {
            return FloorContact::default();
        }

        if input.jump {
            camera.jump(self.physics.jump_speed);
        }
        camera.vertical_velocity -= self.physics.gravity * dt;
        camera.position.y += camera.vertical_velocity * dt;

        let contact = check_floor_collision(
            &self.floors,
            &camera.position,
            self.physics.player_half_height,
            self.physics.floor_offset,
        );
        match contact.floor_height {
            Some(floor) if contact.grounded => {
                camera.position.y = floor + self.physics.player_half_height;
                camera.vertical_velocity = 0.0;
                camera.grounded = true;
            }
            _ => camera.grounded = false,
        }
        contact
    }

    /// Submits one frame: per-frame uniforms, floors and opaque models, then
    /// transparent models back to front with blending on and depth writes off.
    pub fn render(&mut self, ctx: &mut dyn RenderContext) {
        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        let eye = self.camera.position;

        for program in &self.programs {
            let locations = program.locations();
            ctx.use_program(program.id());
            set_optional(ctx, locations.view, UniformValue::Mat4(view));
            set_optional(ctx, locations.projection, UniformValue::Mat4(projection));
            set_optional(ctx, locations.view_pos, UniformValue::Vec3(eye.coords));
            self.lighting.upload(ctx, program);
        }

        let (transparent, opaque): (Vec<&Model>, Vec<&Model>) =
            self.floors.iter().chain(&self.models).partition(|m| m.transparent);

        let zero = Vector3::zeros();
        ctx.set_depth_test(true);
        ctx.set_depth_write(true);
        ctx.set_blend(false);
        for model in &opaque {
            model.draw(ctx, &zero, &zero);
        }

        if transparent.is_empty() {
            return;
        }

        let distances: Vec<f32> = transparent.iter().map(|m| m.distance_to(&eye)).collect();
        ctx.set_blend(true);
        ctx.set_depth_write(false);
        for index in transparent_draw_order(&distances) {
            transparent[index].draw(ctx, &zero, &zero);
        }
        ctx.set_depth_write(true);
        ctx.set_blend(false);
    }

    /// Releases every model, floor, program and texture. The scene is empty afterwards.
    pub fn release(&mut self, ctx: &mut dyn RenderContext) {
        for model in self.floors.iter_mut().chain(&mut self.models) {
            model.clear(ctx);
        }
        self.floors.clear();
        self.models.clear();
        self.sun_model = None;
        for program in self.programs.drain(..) {
            program.delete(ctx);
        }
        for texture in self.textures.drain(..) {
            ctx.delete_texture(texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{ProgramDesc, VertexArrayId};
    use crate::scene::material::Material;
    use crate::scene::procedural;
    use crate::testing::{Call, RecordingContext};
    use nalgebra::{Point3, Vector4};

    #[test]
    fn draw_order_is_farthest_first() {
        let order = transparent_draw_order(&[2.0, 5.0, 1.0]);
        assert_eq!(order, vec![1, 0, 2]);
        let drawn: Vec<f32> = order.iter().map(|&i| [2.0, 5.0, 1.0][i]).collect();
        assert_eq!(drawn, vec![5.0, 2.0, 1.0]);
    }

    #[test]
    fn draw_order_is_stable_for_ties() {
        assert_eq!(transparent_draw_order(&[3.0, 1.0, 3.0, 3.0]), vec![0, 2, 3, 1]);
        assert!(transparent_draw_order(&[]).is_empty());
    }

    fn scene_with(ctx: &mut RecordingContext, transparent_z: &[f32]) -> (Scene, Vec<VertexArrayId>) {
        let shader = ShaderProgram::build(ctx, &ProgramDesc::phong(2)).unwrap();
        let camera = Camera::new(Point3::origin(), -90.0, 0.0);
        let mut scene = Scene::new(camera, Lighting::default());
        scene.add_program(&shader);
        scene.add_program(&shader);

        let mut floor =
            Model::flat_floor(ctx, shader.clone(), 10.0, 10.0, Material::default()).unwrap();
        floor.origin = Vector3::new(0.0, -1.0, 0.0);
        scene.add_floor(floor);

        let mut vaos = Vec::new();
        for &z in transparent_z {
            let mut ball = Model::sphere(ctx, shader.clone(), 4, 0.5, Vector4::new(0.0, 0.0, 1.0, 0.5))
                .unwrap();
            ball.origin = Vector3::new(0.0, 0.0, z);
            vaos.push(ball.meshes[0].vertex_array());
            scene.add_model(ball);
        }
        (scene, vaos)
    }

    #[test]
    fn render_draws_opaque_then_transparent_back_to_front() {
        let mut ctx = RecordingContext::default();
        let (mut scene, balls) = scene_with(&mut ctx, &[-2.0, -5.0, -1.0]);
        let floor_vao = scene.floors[0].meshes[0].vertex_array();
        ctx.clear_calls();

        scene.render(&mut ctx);

        assert_eq!(ctx.draws(), vec![floor_vao, balls[1], balls[0], balls[2]]);
        // One program registered once: per-frame uniforms written once.
        assert_eq!(ctx.uniform_writes("uV_m").len(), 1);
        assert_eq!(ctx.uniform_writes("numPointLights").len(), 1);

        let state: Vec<&Call> = ctx
            .calls
            .iter()
            .filter(|c| matches!(c, Call::DepthWrite(_) | Call::Blend(_) | Call::DrawElements { .. }))
            .collect();
        assert_eq!(state[0], &Call::DepthWrite(true));
        assert_eq!(state[1], &Call::Blend(false));
        assert!(matches!(state[2], Call::DrawElements { .. }));
        assert_eq!(state[3], &Call::Blend(true));
        assert_eq!(state[4], &Call::DepthWrite(false));
        assert_eq!(state[state.len() - 2], &Call::DepthWrite(true));
        assert_eq!(state[state.len() - 1], &Call::Blend(false));

        scene.release(&mut ctx);
    }

    #[test]
    fn opaque_only_frame_never_enables_blending() {
        let mut ctx = RecordingContext::default();
        let (mut scene, _) = scene_with(&mut ctx, &[]);
        ctx.clear_calls();
        scene.render(&mut ctx);
        assert!(!ctx.calls.contains(&Call::Blend(true)));
        assert!(!ctx.calls.contains(&Call::DepthWrite(false)));
        scene.release(&mut ctx);
    }

    #[test]
    fn walking_lands_on_the_floor() {
        let mut ctx = RecordingContext::default();
        let (mut scene, _) = scene_with(&mut ctx, &[]);
        scene.camera.mode = CameraMode::Walk;
        scene.camera.position = Point3::new(0.0, 3.0, 0.0);

        let idle = InputState::default();
        let mut contact = FloorContact::default();
        for _ in 0..200 {
            contact = scene.step_camera(&idle, 1.0 / 60.0);
        }
        assert!(contact.grounded);
        assert!(scene.camera.grounded);
        assert!((scene.camera.position.y - 0.0).abs() < 1e-5);

        let jump = InputState {
            jump: true,
            ..InputState::default()
        };
        scene.step_camera(&jump, 1.0 / 60.0);
        assert!(scene.camera.position.y > 0.0);
        assert!(!scene.camera.grounded);

        scene.release(&mut ctx);
    }

    #[test]
    fn collision_only_consults_floors() {
        let mut ctx = RecordingContext::default();
        let (mut scene, _) = scene_with(&mut ctx, &[]);
        let mut ledge = scene.floors.remove(0);
        ledge.origin.y = 2.0;
        scene.add_model(ledge);
        scene.camera.mode = CameraMode::Walk;
        scene.camera.position = Point3::new(0.0, 3.5, 0.0);

        let contact = scene.step_camera(&InputState::default(), 1.0 / 60.0);
        assert_eq!(contact.floor_height, None);
        assert!(!scene.camera.grounded);

        // Drawn with the opaque models all the same.
        ctx.clear_calls();
        scene.render(&mut ctx);
        assert_eq!(ctx.draws().len(), 1);
        scene.release(&mut ctx);
    }

    #[test]
    fn fly_mode_ignores_gravity() {
        let mut ctx = RecordingContext::default();
        let (mut scene, _) = scene_with(&mut ctx, &[]);
        scene.camera.position = Point3::new(0.0, 3.0, 0.0);
        for _ in 0..10 {
            scene.step_camera(&InputState::default(), 0.1);
        }
        assert_eq!(scene.camera.position.y, 3.0);
        scene.release(&mut ctx);
    }

    #[test]
    fn update_places_the_sun_model() {
        let mut ctx = RecordingContext::default();
        let shader = ShaderProgram::build(&mut ctx, &ProgramDesc::phong(1)).unwrap();
        let mut scene = Scene::new(Camera::new(Point3::origin(), -90.0, 0.0), Lighting::default());
        let sun = Model::from_geometry(
            &mut ctx,
            "sun",
            shader,
            procedural::uv_sphere(4),
            Material::default(),
        )
        .unwrap();
        scene.sun_model = Some(scene.add_model(sun));
        scene.sun_distance = 10.0;

        scene.update(0.0);
        let expected = -scene.lighting.sun.direction.normalize() * 10.0;
        assert!((scene.models[0].origin - expected).norm() < 1e-5);
        assert!(scene.models[0].origin.y > 0.0);
        scene.release(&mut ctx);
    }

    #[test]
    fn release_clears_everything() {
        let mut ctx = RecordingContext::default();
        let (mut scene, _) = scene_with(&mut ctx, &[-1.0]);
        ctx.clear_calls();
        scene.release(&mut ctx);
        assert!(scene.models.is_empty() && scene.floors.is_empty());
        assert_eq!(ctx.count(|c| matches!(c, Call::DeleteVertexArray(_))), 2);
        assert_eq!(ctx.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
    }
}
