use crate::core::color::{aces_tone_mapping, linear_to_srgb, pack_argb};
use crate::core::framebuffer::FrameBuffer;
use rayon::prelude::*;

/// Settings for the final resolve of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcess {
    pub exposure: f32,
    pub use_aces: bool,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            use_aces: false,
        }
    }
}

/// Post-processing: SSAA resolve -> exposure -> optional tone mapping -> gamma -> u32 buffer.
pub fn post_process_to_buffer(framebuffer: &FrameBuffer, buffer: &mut [u32], settings: PostProcess) {
    buffer
        .par_chunks_mut(framebuffer.width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = match framebuffer.get_pixel(x, y) {
                    Some(color) => {
                        let exposed = color * settings.exposure;
                        let mapped = if settings.use_aces {
                            aces_tone_mapping(exposed)
                        } else {
                            exposed
                        };
                        pack_argb(linear_to_srgb(mapped))
                    }
                    None => 0,
                };
            }
        });
}
