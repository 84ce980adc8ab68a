use crate::error::AssetLoadError;
use crate::scene::heightfield::HeightField;
use image::{ColorType, DynamicImage, imageops};
use log::info;
use std::path::Path;

/// Reads a grayscale image as a `columns x rows` height field.
///
/// The image is resized to exactly the requested grid and normalized to [0, 1]
/// by its bit depth (255 for 8-bit sources, 65535 for 16-bit ones).
pub fn load_height_field(
    path: impl AsRef<Path>,
    columns: usize,
    rows: usize,
) -> Result<HeightField, AssetLoadError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| AssetLoadError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "Loaded heightmap: {:?} ({}x{}) -> {}x{} grid",
        path,
        img.width(),
        img.height(),
        columns,
        rows
    );
    height_field_from_image(&img, columns, rows)
}

pub fn height_field_from_image(
    img: &DynamicImage,
    columns: usize,
    rows: usize,
) -> Result<HeightField, AssetLoadError> {
    if columns == 0 || rows == 0 {
        return Err(AssetLoadError::InvalidHeightField(format!(
            "grid must be at least 1x1, got {columns}x{rows}"
        )));
    }
    let (w, h) = (columns as u32, rows as u32);
    let filter = imageops::FilterType::Triangle;

    let samples = if is_sixteen_bit(img.color()) {
        let gray = imageops::resize(&img.to_luma16(), w, h, filter);
        gray.pixels().map(|p| p.0[0] as f32 / 65535.0).collect()
    } else {
        let gray = imageops::resize(&img.to_luma8(), w, h, filter);
        gray.pixels().map(|p| p.0[0] as f32 / 255.0).collect()
    };

    HeightField::new(columns, rows, samples)
}

fn is_sixteen_bit(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
    )
}
