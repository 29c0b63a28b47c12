//! Compass directions, requested direction sets, and clockwise ordering.
//!
//! Sprites are rendered from eight viewing angles. The canonical base
//! (reference) image always faces [`Direction::South`]; every other
//! direction is derived from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the eight compass-named viewing angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// All directions in clockwise order starting from north.
///
/// Turntable playback walks this order, so sorting by it keeps rotation
/// visually continuous.
pub const CLOCKWISE: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

/// The direction of the base/reference image.
pub const BASE_DIRECTION: Direction = Direction::South;

impl Direction {
    /// Wire name, e.g. `"north-east"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::NorthEast => "north-east",
            Self::East => "east",
            Self::SouthEast => "south-east",
            Self::South => "south",
            Self::SouthWest => "south-west",
            Self::West => "west",
            Self::NorthWest => "north-west",
        }
    }

    /// Position in [`CLOCKWISE`].
    pub fn clockwise_position(self) -> usize {
        CLOCKWISE
            .iter()
            .position(|d| *d == self)
            .unwrap_or(CLOCKWISE.len())
    }

    /// Screen-relative facing phrase used inside animation prompts.
    pub fn facing_phrase(self) -> &'static str {
        match self {
            Self::North => "up",
            Self::South => "down",
            Self::East => "right",
            Self::West => "left",
            Self::NorthEast => "front-right",
            Self::NorthWest => "front-left",
            Self::SouthEast => "back-right",
            Self::SouthWest => "back-left",
        }
    }

    /// `true` for west, north-west and south-west.
    pub fn is_west_leaning(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CLOCKWISE
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid direction '{s}'. Must be one of: {}",
                    CLOCKWISE.map(Direction::as_str).join(", ")
                ))
            })
    }
}

/// Sort directions (or items keyed by direction) into clockwise order.
pub fn sort_clockwise<T>(items: &mut [T], key: impl Fn(&T) -> Direction) {
    items.sort_by_key(|item| key(item).clockwise_position());
}

// ---------------------------------------------------------------------------
// Requested image count
// ---------------------------------------------------------------------------

/// How many directional images a generation request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCount {
    One,
    Four,
    Eight,
}

/// Image count used when the request carries none or an unsupported value.
pub const DEFAULT_IMAGE_COUNT: ImageCount = ImageCount::Four;

impl ImageCount {
    /// Map a raw requested count. Returns `None` for anything other than
    /// 1, 4 or 8 so the caller can log the fallback.
    pub fn from_requested(count: u32) -> Option<Self> {
        match count {
            1 => Some(Self::One),
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// The fixed direction set for this count, in clockwise order.
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Self::One => &[Direction::South],
            Self::Four => &[
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West,
            ],
            Self::Eight => &CLOCKWISE,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
