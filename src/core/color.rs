use nalgebra::Vector3;

/// ACES filmic tone mapping curve (Narkowicz fit).
/// Maps HDR values into [0, 1] with a film-like shoulder.
pub fn aces_tone_mapping(color: Vector3<f32>) -> Vector3<f32> {
    const A: f32 = 2.51;
    const B: f32 = 0.03;
    const C: f32 = 2.43;
    const D: f32 = 0.59;
    const E: f32 = 0.14;

    color.map(|x| ((x * (A * x + B)) / (x * (C * x + D) + E)).clamp(0.0, 1.0))
}

/// Linear RGB to display sRGB (plain 2.2 gamma, the inverse of texture decoding).
pub fn linear_to_srgb(color: Vector3<f32>) -> Vector3<f32> {
    color.map(|x| x.max(0.0).powf(1.0 / 2.2))
}

/// Packs a display colour as 0xAARRGGBB with opaque alpha.
pub fn pack_argb(color: Vector3<f32>) -> u32 {
    let r = (color.x.clamp(0.0, 1.0) * 255.0) as u32;
    let g = (color.y.clamp(0.0, 1.0) * 255.0) as u32;
    let b = (color.z.clamp(0.0, 1.0) * 255.0) as u32;
    (255 << 24) | (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aces_stays_in_unit_range() {
        let mapped = aces_tone_mapping(Vector3::new(0.0, 1.0, 100.0));
        assert_eq!(mapped.x, 0.0);
        assert!(mapped.y > 0.7 && mapped.y < 1.0);
        assert_eq!(mapped.z, 1.0);
    }

    #[test]
    fn packing_clamps_channels() {
        assert_eq!(pack_argb(Vector3::new(2.0, 0.0, -1.0)), 0xFFFF0000);
    }
}
