//! Blob path convention engine.
//!
//! Generates deterministic logical paths for every stored artifact of a
//! character. All paths are relative and rooted at the character id, so
//! deleting `{id}` removes everything the character owns.

use crate::direction::Direction;
use crate::poses::ActionType;
use crate::types::CharacterId;

/// Directional sprite image.
///
/// Convention: `{id}/{direction}_{index}.png`
///
/// ```
/// use pixsynth_core::direction::Direction;
/// use pixsynth_core::naming::direction_image_path;
///
/// let id = uuid::Uuid::nil();
/// assert_eq!(
///     direction_image_path(id, Direction::NorthEast, 3),
///     "00000000-0000-0000-0000-000000000000/north-east_3.png"
/// );
/// ```
pub fn direction_image_path(id: CharacterId, direction: Direction, index: u32) -> String {
    format!("{id}/{direction}_{index}.png")
}

/// Root of every artifact belonging to a character.
pub fn character_root(id: CharacterId) -> String {
    id.to_string()
}

/// Everything stored for one action, across all directions.
pub fn animation_root(id: CharacterId, action: ActionType) -> String {
    format!("{id}/{action}")
}

/// Everything stored for one action/direction slot.
pub fn animation_slot_root(id: CharacterId, action: ActionType, direction: Direction) -> String {
    format!("{id}/{action}/{direction}")
}

/// Convention: `{id}/{action}/{direction}/frame_{index}.png`
pub fn animation_frame_path(
    id: CharacterId,
    action: ActionType,
    direction: Direction,
    index: u32,
) -> String {
    format!("{id}/{action}/{direction}/frame_{index}.png")
}

/// Convention: `{id}/{action}/{direction}/{action}_{direction}.gif`
pub fn animation_loop_path(id: CharacterId, action: ActionType, direction: Direction) -> String {
    format!("{id}/{action}/{direction}/{action}_{direction}.gif")
}

/// Character-level turntable loop.
pub fn turntable_path(id: CharacterId) -> String {
    format!("{id}/turntable.gif")
}
