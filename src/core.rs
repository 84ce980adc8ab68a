pub mod color;
pub mod context;
pub mod framebuffer;
pub mod geometry;
pub mod math;
pub mod pipeline;
pub mod rasterizer;
