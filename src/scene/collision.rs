use crate::scene::model::Model;
use nalgebra::Point3;

/// Result of one floor query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloorContact {
    /// The player's feet are at or below the floor surface.
    pub grounded: bool,
    /// Highest floor surface under the player, if any floor is there.
    pub floor_height: Option<f32>,
}

/// Finds the highest floor surface under `position` among `floors`.
///
/// The check is a single discrete sample per frame, so a fast enough
/// downward step can pass through a thin floor.
pub fn check_floor_collision<'a>(
    floors: impl IntoIterator<Item = &'a Model>,
    position: &Point3<f32>,
    player_half_height: f32,
    floor_offset: f32,
) -> FloorContact {
    let floor_height = floors
        .into_iter()
        .filter_map(|model| model.floor_height_at(position.x, position.z, floor_offset))
        .reduce(f32::max);

    FloorContact {
        grounded: floor_height.is_some_and(|h| position.y - player_half_height <= h),
        floor_height,
    }
}
