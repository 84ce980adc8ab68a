use crate::error::AssetLoadError;
use image::DynamicImage;
use log::{info, warn};
use nalgebra::Vector4;
use std::path::Path;

/// Pixel layout of an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgb8,
    Rgba8,
}

impl TextureFormat {
    pub fn channels(self) -> usize {
        match self {
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// Decoded texture pixels, bottom row first (already flipped for UV space).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Converts a decoded image, flipping it vertically so v = 0 is the bottom row.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let flipped = image.flipv();
        let (width, height) = (flipped.width(), flipped.height());

        match image.color().channel_count() {
            3 => Self {
                width,
                height,
                format: TextureFormat::Rgb8,
                pixels: flipped.into_rgb8().into_raw(),
            },
            4 => Self {
                width,
                height,
                format: TextureFormat::Rgba8,
                pixels: flipped.into_rgba8().into_raw(),
            },
            n => {
                warn!("Texture has {n} channels, converting to RGBA8");
                Self {
                    width,
                    height,
                    format: TextureFormat::Rgba8,
                    pixels: flipped.into_rgba8().into_raw(),
                }
            }
        }
    }

    /// Single-colour texture, mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((width * height) as usize);
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            pixels,
        }
    }

    /// Samples the texture using Bilinear Interpolation.
    /// UV coordinates wrap (repeat mode). Colour comes back in linear space.
    pub fn sample(&self, u: f32, v: f32) -> Vector4<f32> {
        if self.width == 0 || self.height == 0 {
            return Vector4::new(1.0, 1.0, 1.0, 1.0);
        }

        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        // -0.5 because pixel centers are at 0.5. Rows are stored bottom-up.
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;

        let x0 = x.floor() as i32;
        let y0 = y.floor() as i32;
        let wx = x - x.floor();
        let wy = y - y.floor();

        let c00 = self.texel_wrapped(x0, y0);
        let c10 = self.texel_wrapped(x0 + 1, y0);
        let c01 = self.texel_wrapped(x0, y0 + 1);
        let c11 = self.texel_wrapped(x0 + 1, y0 + 1);

        let top = c00 * (1.0 - wx) + c10 * wx;
        let bottom = c01 * (1.0 - wx) + c11 * wx;
        let c = top * (1.0 - wy) + bottom * wy;

        // sRGB to linear; alpha is already linear.
        Vector4::new(c.x.powf(2.2), c.y.powf(2.2), c.z.powf(2.2), c.w)
    }

    fn texel_wrapped(&self, x: i32, y: i32) -> Vector4<f32> {
        let x = x.rem_euclid(self.width as i32) as usize;
        let y = y.rem_euclid(self.height as i32) as usize;
        let channels = self.format.channels();
        let idx = (y * self.width as usize + x) * channels;
        let px = &self.pixels[idx..idx + channels];

        let alpha = if channels == 4 { px[3] as f32 / 255.0 } else { 1.0 };
        Vector4::new(
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            alpha,
        )
    }
}

/// Decodes an image file into a texture ready for upload.
pub fn load_texture(path: impl AsRef<Path>) -> Result<TextureImage, AssetLoadError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| AssetLoadError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let texture = TextureImage::from_dynamic(img);
    info!(
        "Loaded texture: {:?} ({}x{}, {:?})",
        path, texture.width, texture.height, texture.format
    );
    Ok(texture)
}
