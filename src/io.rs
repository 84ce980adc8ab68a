pub mod config;
pub mod heightmap;
pub mod image;
pub mod obj_loader;
