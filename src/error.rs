use std::path::PathBuf;

/// File missing or unparseable. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OBJ '{path}': {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "mismatched attribute counts in '{path}': {positions} positions, {uvs} uvs, {normals} normals"
    )]
    AttributeCountMismatch {
        path: PathBuf,
        positions: usize,
        uvs: usize,
        normals: usize,
    },

    #[error("invalid height field: {0}")]
    InvalidHeightField(String),
}

/// Graphics allocation or shader interface failure. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ResourceCreationError {
    #[error("failed to allocate {0}")]
    AllocationFailed(&'static str),

    #[error("shader program handle is invalid")]
    InvalidShader,

    #[error("required vertex attribute '{0}' is not declared by the shader")]
    MissingAttribute(&'static str),

    #[error("vertex attribute '{name}' expects {expected:?} but the vertex layout provides {found:?}")]
    AttributeFormatMismatch {
        name: &'static str,
        expected: crate::core::geometry::AttributeFormat,
        found: crate::core::geometry::AttributeFormat,
    },

    #[error("index {index} out of range for {vertex_count} vertices")]
    InvalidGeometry { index: u32, vertex_count: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Anything that can abort a run.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Asset(#[from] AssetLoadError),

    #[error(transparent)]
    Resource(#[from] ResourceCreationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
