use crate::core::rasterizer::CullMode;
use crate::error::ConfigError;
use crate::scene::camera::CameraMode;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub sun: SunConfig,
    #[serde(default = "default_point_lights")]
    pub point_lights: Vec<PointLightConfig>,
    #[serde(default)]
    pub spotlight: SpotlightConfig,
    #[serde(default)]
    pub floor: FloorConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
    #[serde(default = "default_spheres")]
    pub spheres: Vec<SphereConfig>,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub input: Vec<InputStepConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            camera: CameraConfig::default(),
            sun: SunConfig::default(),
            point_lights: default_point_lights(),
            spotlight: SpotlightConfig::default(),
            floor: FloorConfig::default(),
            terrain: TerrainConfig::default(),
            objects: Vec::new(),
            spheres: default_spheres(),
            collision: CollisionConfig::default(),
            input: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

fn default_point_lights() -> Vec<PointLightConfig> {
    vec![PointLightConfig::default()]
}

fn default_spheres() -> Vec<SphereConfig> {
    vec![
        SphereConfig::default(),
        SphereConfig {
            origin: [-2.0, 1.0, -1.0],
            color: [0.2, 0.4, 0.9, 0.5],
            transparent: true,
            ..SphereConfig::default()
        },
    ]
}

#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_title() -> String {
    "scenery".to_string()
}
fn default_width() -> usize {
    800
}
fn default_height() -> usize {
    600
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    // image
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_exposure")]
    pub exposure: f32,
    #[serde(default = "default_false")]
    pub use_aces: bool,
    #[serde(default = "default_background")]
    pub background_color: [f32; 3],

    // rasterizer
    #[serde(default = "default_cull_mode")]
    /// `back`, `front` or `none`.
    pub cull_mode: String,
    #[serde(default = "default_false")]
    pub wireframe: bool,
    /// Scale applied to every mesh loaded from an OBJ file.
    #[serde(default = "default_one")]
    pub mesh_scale: f32,
    #[serde(default = "default_point_light_capacity")]
    pub point_light_capacity: usize,

    // simulation
    #[serde(default = "default_frames")]
    pub frames: usize,
    #[serde(default = "default_time_step")]
    pub time_step: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            output: default_output(),
            exposure: default_exposure(),
            use_aces: false,
            background_color: default_background(),
            cull_mode: default_cull_mode(),
            wireframe: false,
            mesh_scale: default_one(),
            point_light_capacity: default_point_light_capacity(),
            frames: default_frames(),
            time_step: default_time_step(),
        }
    }
}

impl RenderConfig {
    pub fn cull_mode(&self) -> CullMode {
        match self.cull_mode.as_str() {
            "back" => CullMode::Back,
            "front" => CullMode::Front,
            "none" => CullMode::None,
            other => {
                warn!("Unknown cull mode '{}', culling disabled", other);
                CullMode::None
            }
        }
    }
}

fn default_samples() -> usize {
    1
}
fn default_output() -> String {
    "output.png".to_string()
}
fn default_exposure() -> f32 {
    1.0
}
fn default_background() -> [f32; 3] {
    [0.1, 0.1, 0.15]
}
fn default_cull_mode() -> String {
    "none".to_string()
}
fn default_point_light_capacity() -> usize {
    4
}
fn default_frames() -> usize {
    60
}
fn default_time_step() -> f32 {
    1.0 / 60.0
}
fn default_false() -> bool {
    false
}
fn default_true() -> bool {
    true
}
fn default_one() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default = "default_yaw")]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_camera_mode")]
    pub mode: String, // "fly", "walk"
    #[serde(default = "default_half_height")]
    pub player_half_height: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_jump_speed")]
    pub jump_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            yaw: default_yaw(),
            pitch: 0.0,
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
            speed: default_speed(),
            sensitivity: default_sensitivity(),
            mode: default_camera_mode(),
            player_half_height: default_half_height(),
            gravity: default_gravity(),
            jump_speed: default_jump_speed(),
        }
    }
}

impl CameraConfig {
    pub fn mode(&self) -> CameraMode {
        match self.mode.as_str() {
            "walk" => CameraMode::Walk,
            "fly" => CameraMode::Fly,
            other => {
                warn!("Unknown camera mode '{}', using fly", other);
                CameraMode::Fly
            }
        }
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 2.0, 6.0]
}
fn default_yaw() -> f32 {
    -90.0
}
fn default_fov() -> f32 {
    45.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    200.0
}
fn default_speed() -> f32 {
    5.0
}
fn default_sensitivity() -> f32 {
    0.1
}
fn default_camera_mode() -> String {
    "fly".to_string()
}
fn default_half_height() -> f32 {
    1.0
}
fn default_gravity() -> f32 {
    9.81
}
fn default_jump_speed() -> f32 {
    5.0
}

#[derive(Debug, Deserialize)]
pub struct SunConfig {
    #[serde(default = "default_sun_direction")]
    pub direction: [f32; 3],
    #[serde(default = "default_sun_ambient")]
    pub ambient: [f32; 3],
    #[serde(default = "default_sun_diffuse")]
    pub diffuse: [f32; 3],
    #[serde(default = "default_white")]
    pub specular: [f32; 3],
    /// Angular speed of the sun around the Z axis, radians per second.
    #[serde(default = "default_sun_speed")]
    pub speed: f32,
    #[serde(default = "default_true")]
    pub show_model: bool,
    #[serde(default = "default_sun_distance")]
    pub model_distance: f32,
    #[serde(default = "default_sun_radius")]
    pub model_radius: f32,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            direction: default_sun_direction(),
            ambient: default_sun_ambient(),
            diffuse: default_sun_diffuse(),
            specular: default_white(),
            speed: default_sun_speed(),
            show_model: true,
            model_distance: default_sun_distance(),
            model_radius: default_sun_radius(),
        }
    }
}

fn default_sun_direction() -> [f32; 3] {
    [-0.2, -1.0, -0.3]
}
fn default_sun_ambient() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}
fn default_sun_diffuse() -> [f32; 3] {
    [0.8, 0.8, 0.7]
}
fn default_white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_sun_speed() -> f32 {
    0.1
}
fn default_sun_distance() -> f32 {
    60.0
}
fn default_sun_radius() -> f32 {
    3.0
}

#[derive(Debug, Deserialize)]
pub struct PointLightConfig {
    #[serde(default = "default_point_position")]
    pub position: [f32; 3],
    #[serde(default = "default_point_ambient")]
    pub ambient: [f32; 3],
    #[serde(default = "default_point_diffuse")]
    pub diffuse: [f32; 3],
    #[serde(default = "default_white")]
    pub specular: [f32; 3],
    #[serde(default = "default_one")]
    pub constant: f32,
    #[serde(default = "default_linear")]
    pub linear: f32,
    #[serde(default = "default_quadratic")]
    pub quadratic: f32,
}

impl Default for PointLightConfig {
    fn default() -> Self {
        Self {
            position: default_point_position(),
            ambient: default_point_ambient(),
            diffuse: default_point_diffuse(),
            specular: default_white(),
            constant: default_one(),
            linear: default_linear(),
            quadratic: default_quadratic(),
        }
    }
}

fn default_point_position() -> [f32; 3] {
    [2.0, 2.0, 2.0]
}
fn default_point_ambient() -> [f32; 3] {
    [0.05, 0.05, 0.05]
}
fn default_point_diffuse() -> [f32; 3] {
    [0.8, 0.6, 0.4]
}
fn default_linear() -> f32 {
    0.09
}
fn default_quadratic() -> f32 {
    0.032
}

#[derive(Debug, Deserialize)]
pub struct SpotlightConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inner cone half-angle in degrees.
    #[serde(default = "default_cut_off")]
    pub cut_off: f32,
    /// Outer cone half-angle in degrees.
    #[serde(default = "default_outer_cut_off")]
    pub outer_cut_off: f32,
    #[serde(default)]
    pub ambient: [f32; 3],
    #[serde(default = "default_white")]
    pub diffuse: [f32; 3],
    #[serde(default = "default_white")]
    pub specular: [f32; 3],
}

impl Default for SpotlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cut_off: default_cut_off(),
            outer_cut_off: default_outer_cut_off(),
            ambient: [0.0; 3],
            diffuse: default_white(),
            specular: default_white(),
        }
    }
}

fn default_cut_off() -> f32 {
    12.5
}
fn default_outer_cut_off() -> f32 {
    17.5
}

#[derive(Debug, Deserialize)]
pub struct FloorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_floor_size")]
    pub width: f32,
    #[serde(default = "default_floor_size")]
    pub depth: f32,
    #[serde(default)]
    pub origin: [f32; 3],
    #[serde(default = "default_floor_color")]
    pub color: [f32; 4],
    pub texture: Option<String>,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_floor_size(),
            depth: default_floor_size(),
            origin: [0.0; 3],
            color: default_floor_color(),
            texture: None,
        }
    }
}

fn default_floor_size() -> f32 {
    20.0
}
fn default_floor_color() -> [f32; 4] {
    [0.5, 0.5, 0.5, 1.0]
}

#[derive(Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
    /// Grayscale image; a procedural field is generated when absent.
    pub heightmap: Option<String>,
    #[serde(default = "default_grid")]
    pub columns: usize,
    #[serde(default = "default_grid")]
    pub rows: usize,
    #[serde(default = "default_height_scale")]
    pub height_scale: f32,
    #[serde(default = "default_terrain_origin")]
    pub origin: [f32; 3],
    #[serde(default = "default_terrain_color")]
    pub color: [f32; 4],
    pub texture: Option<String>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            heightmap: None,
            columns: default_grid(),
            rows: default_grid(),
            height_scale: default_height_scale(),
            origin: default_terrain_origin(),
            color: default_terrain_color(),
            texture: None,
        }
    }
}

fn default_grid() -> usize {
    64
}
fn default_height_scale() -> f32 {
    5.0
}
fn default_terrain_origin() -> [f32; 3] {
    [0.0, -0.5, -50.0]
}
fn default_terrain_color() -> [f32; 4] {
    [0.35, 0.55, 0.3, 1.0]
}

#[derive(Debug, Deserialize)]
pub struct ObjectConfig {
    pub path: String,
    #[serde(default = "default_shader")]
    pub shader: String, // "phong", "unlit"
    pub texture: Option<String>,

    // placement
    #[serde(default)]
    pub origin: [f32; 3],
    /// Euler angles in degrees.
    #[serde(default)]
    pub orientation: [f32; 3],
    /// Degrees per second around each axis.
    #[serde(default)]
    pub spin: [f32; 3],
    #[serde(default = "default_false")]
    pub transparent: bool,

    // surface
    #[serde(default = "default_white_rgba")]
    pub ambient: [f32; 4],
    #[serde(default = "default_white_rgba")]
    pub diffuse: [f32; 4],
    #[serde(default = "default_white_rgba")]
    pub specular: [f32; 4],
    #[serde(default = "default_shininess")]
    pub shininess: f32,
}

fn default_shader() -> String {
    "phong".to_string()
}
fn default_white_rgba() -> [f32; 4] {
    [1.0; 4]
}
fn default_shininess() -> f32 {
    32.0
}

#[derive(Debug, Deserialize)]
pub struct SphereConfig {
    #[serde(default = "default_sphere_origin")]
    pub origin: [f32; 3],
    #[serde(default = "default_one")]
    pub radius: f32,
    #[serde(default = "default_segments")]
    pub segments: u32,
    #[serde(default = "default_sphere_color")]
    pub color: [f32; 4],
    #[serde(default = "default_false")]
    pub transparent: bool,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            origin: default_sphere_origin(),
            radius: default_one(),
            segments: default_segments(),
            color: default_sphere_color(),
            transparent: false,
        }
    }
}

fn default_sphere_origin() -> [f32; 3] {
    [1.5, 1.0, 0.0]
}
fn default_segments() -> u32 {
    24
}
fn default_sphere_color() -> [f32; 4] {
    [0.8, 0.2, 0.2, 1.0]
}

#[derive(Debug, Default, Deserialize)]
pub struct CollisionConfig {
    /// Added to a flat floor's origin height when resolving contacts.
    #[serde(default)]
    pub floor_offset: f32,
}

/// One scripted input state held for `frames` frames.
#[derive(Debug, Default, Deserialize)]
pub struct InputStepConfig {
    #[serde(default = "default_step_frames")]
    pub frames: usize,
    #[serde(default)]
    pub forward: bool,
    #[serde(default)]
    pub backward: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub toggle_mode: bool,
    #[serde(default)]
    pub mouse_dx: f32,
    #[serde(default)]
    pub mouse_dy: f32,
}

fn default_step_frames() -> usize {
    1
}
