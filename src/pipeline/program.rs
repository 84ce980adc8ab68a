use crate::core::context::{
    ProgramDesc, ProgramId, ProgramInterface, ProgramKind, RenderContext, UniformLocation,
    UniformValue,
};
use crate::error::ResourceCreationError;
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialLocations {
    pub ambient: Option<UniformLocation>,
    pub diffuse: Option<UniformLocation>,
    pub specular: Option<UniformLocation>,
    pub shininess: Option<UniformLocation>,
    pub emissive: Option<UniformLocation>,
    pub has_texture: Option<UniformLocation>,
    pub texture: Option<UniformLocation>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirLightLocations {
    pub direction: Option<UniformLocation>,
    pub ambient: Option<UniformLocation>,
    pub diffuse: Option<UniformLocation>,
    pub specular: Option<UniformLocation>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointLightLocations {
    pub position: Option<UniformLocation>,
    pub ambient: Option<UniformLocation>,
    pub diffuse: Option<UniformLocation>,
    pub specular: Option<UniformLocation>,
    pub constant: Option<UniformLocation>,
    pub linear: Option<UniformLocation>,
    pub quadratic: Option<UniformLocation>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotLightLocations {
    pub position: Option<UniformLocation>,
    pub direction: Option<UniformLocation>,
    pub cut_off: Option<UniformLocation>,
    pub outer_cut_off: Option<UniformLocation>,
    pub ambient: Option<UniformLocation>,
    pub diffuse: Option<UniformLocation>,
    pub specular: Option<UniformLocation>,
}

/// Every uniform the scene code writes, resolved once per program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLocations {
    pub model: Option<UniformLocation>,
    pub view: Option<UniformLocation>,
    pub projection: Option<UniformLocation>,
    pub view_pos: Option<UniformLocation>,
    pub color: Option<UniformLocation>,
    pub material: MaterialLocations,
    pub dir_light: DirLightLocations,
    pub num_point_lights: Option<UniformLocation>,
    /// One entry per `pointLights[i]` slot the program declares.
    pub point_lights: Vec<PointLightLocations>,
    pub spot_light: SpotLightLocations,
}

/// Collects names that a program does not declare so they can be reported once.
struct Resolver<'a> {
    interface: &'a ProgramInterface,
    missing: Vec<String>,
}

impl Resolver<'_> {
    fn get(&mut self, name: &str) -> Option<UniformLocation> {
        let location = self.interface.uniform_location(name);
        if location.is_none() {
            self.missing.push(name.to_string());
        }
        location
    }

    /// Looks up a name without reporting it when absent.
    fn probe(&self, name: &str) -> Option<UniformLocation> {
        self.interface.uniform_location(name)
    }
}

impl UniformLocations {
    /// Resolves every known uniform. Returns the locations plus the names the
    /// program lacks (those uniforms are skipped when written).
    pub fn resolve(interface: &ProgramInterface) -> (Self, Vec<String>) {
        let mut r = Resolver {
            interface,
            missing: Vec::new(),
        };

        // Matrices and material are written for every program.
        let mut locations = Self {
            model: r.get("uM_m"),
            view: r.get("uV_m"),
            projection: r.get("uP_m"),
            ..Self::default()
        };

        locations.material = MaterialLocations {
            ambient: r.get("material.ambient"),
            diffuse: r.get("material.diffuse"),
            specular: r.get("material.specular"),
            shininess: r.get("material.shininess"),
            emissive: r.get("material.emissive"),
            has_texture: r.get("material.hasTexture"),
            texture: r.get("material.texture"),
        };

        // Lighting blocks and the flat colour are optional by program kind.
        locations.color = r.probe("uniform_Color");
        locations.view_pos = r.probe("viewPos");

        if r.probe("dirLight.direction").is_some() {
            locations.dir_light = DirLightLocations {
                direction: r.get("dirLight.direction"),
                ambient: r.get("dirLight.ambient"),
                diffuse: r.get("dirLight.diffuse"),
                specular: r.get("dirLight.specular"),
            };
        }

        locations.num_point_lights = r.probe("numPointLights");
        let mut i = 0;
        while r.probe(&format!("pointLights[{i}].position")).is_some() {
            let field = |f: &str| format!("pointLights[{i}].{f}");
            locations.point_lights.push(PointLightLocations {
                position: r.get(&field("position")),
                ambient: r.get(&field("ambient")),
                diffuse: r.get(&field("diffuse")),
                specular: r.get(&field("specular")),
                constant: r.get(&field("constant")),
                linear: r.get(&field("linear")),
                quadratic: r.get(&field("quadratic")),
            });
            i += 1;
        }

        if r.probe("spotLight.position").is_some() {
            locations.spot_light = SpotLightLocations {
                position: r.get("spotLight.position"),
                direction: r.get("spotLight.direction"),
                cut_off: r.get("spotLight.cutOff"),
                outer_cut_off: r.get("spotLight.outerCutOff"),
                ambient: r.get("spotLight.ambient"),
                diffuse: r.get("spotLight.diffuse"),
                specular: r.get("spotLight.specular"),
            };
        }

        (locations, r.missing)
    }

    pub fn is_lit(&self) -> bool {
        self.dir_light.direction.is_some()
            || !self.point_lights.is_empty()
            || self.spot_light.position.is_some()
    }
}

/// A linked program plus its cached uniform locations.
///
/// Shared between meshes through `Arc`; the program object is deleted by
/// whoever owns the scene once every mesh using it has been cleared.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    kind: ProgramKind,
    interface: ProgramInterface,
    locations: UniformLocations,
}

impl ShaderProgram {
    pub fn build(
        ctx: &mut dyn RenderContext,
        desc: &ProgramDesc,
    ) -> Result<Arc<Self>, ResourceCreationError> {
        let id = ctx.create_program(desc);
        if !id.is_valid() {
            return Err(ResourceCreationError::InvalidShader);
        }
        let Some(interface) = ctx.program_interface(id) else {
            ctx.delete_program(id);
            return Err(ResourceCreationError::InvalidShader);
        };

        let (locations, missing) = UniformLocations::resolve(&interface);
        if !missing.is_empty() {
            warn!(
                "UniformNotFound: {:?} program {} lacks [{}]; these uniforms will be skipped",
                desc.kind,
                id.0,
                missing.join(", ")
            );
        }
        debug!(
            "Built {:?} program {} ({} uniforms, {} point light slots)",
            desc.kind,
            id.0,
            interface.uniforms.len(),
            locations.point_lights.len()
        );

        Ok(Arc::new(Self {
            id,
            kind: desc.kind,
            interface,
            locations,
        }))
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn locations(&self) -> &UniformLocations {
        &self.locations
    }

    pub fn point_light_capacity(&self) -> usize {
        self.locations.point_lights.len()
    }

    /// Deletes the program object. Call only after every mesh using it is cleared.
    pub fn delete(&self, ctx: &mut dyn RenderContext) {
        ctx.delete_program(self.id);
    }
}

/// Writes `value` when the program declared the uniform.
#[inline]
pub fn set_optional(
    ctx: &mut dyn RenderContext,
    location: Option<UniformLocation>,
    value: UniformValue,
) {
    if let Some(location) = location {
        ctx.set_uniform(location, value);
    }
}
