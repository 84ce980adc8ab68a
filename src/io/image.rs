use image::{ImageBuffer, ImageError, Rgb};
use std::path::Path;

/// Saves a 0xAARRGGBB buffer to an image file (format picked from the extension).
pub fn save_buffer_to_image(
    buffer: &[u32],
    width: usize,
    height: usize,
    path: impl AsRef<Path>,
) -> Result<(), ImageError> {
    let img_buf = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let color = buffer[(y as usize) * width + (x as usize)];
        Rgb([
            ((color >> 16) & 0xFF) as u8,
            ((color >> 8) & 0xFF) as u8,
            (color & 0xFF) as u8,
        ])
    });
    img_buf.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_png_reads_back() {
        let path = std::env::temp_dir().join(format!("scenery-{}-save.png", std::process::id()));
        save_buffer_to_image(&[0xFF102030, 0xFFFFFFFF], 2, 1, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).ok();
        assert_eq!(img.get_pixel(0, 0).0, [0x10, 0x20, 0x30]);
    }
}
