pub mod phong;
pub mod uniforms;
pub mod unlit;
