pub mod camera;
pub mod collision;
pub mod heightfield;
pub mod light;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod model;
pub mod procedural;
pub mod texture;
pub mod world;
