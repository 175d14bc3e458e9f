//! FRM sprite format handling
//!
//! An FRM holds up to six viewing directions of an animation. Each direction is a run of
//! frame records; directions sharing a data offset share their frames.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

pub mod model;
pub mod parser;
pub mod renderer;

pub use model::*;
pub use parser::*;
pub use renderer::*;

use super::palette::Palette;

/// Fixed header size on disk, no padding
pub const FRM_HEADER_SIZE: usize = 62;

/// width, height, size, offset x, offset y
pub const FRAME_HEADER_SIZE: usize = 12;

pub const DIRECTION_COUNT: usize = 6;

/// Viewing directions in on-disk order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short suffix used in exported file names
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::NorthEast => "ne",
            Direction::East => "e",
            Direction::SouthEast => "se",
            Direction::SouthWest => "sw",
            Direction::West => "w",
            Direction::NorthWest => "nw",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix().to_uppercase())
    }
}

/// How frame blocks are laid out after each other within a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameAlignment {
    /// Each frame block padded to a 4-byte boundary
    #[default]
    Word,
    /// Blocks follow each other directly
    Packed,
}

impl FrameAlignment {
    pub fn padding(self, pixel_bytes: usize) -> usize {
        match self {
            FrameAlignment::Word => crate::binary_utils::padding_for(pixel_bytes, 4),
            FrameAlignment::Packed => 0,
        }
    }
}

/// Decode with the default word-aligned frame layout
pub fn decode_frm(data: &[u8], palette: &Palette) -> Result<Sprite, FrmError> {
    parser::parse_frm(data, palette, FrameAlignment::Word)
}

pub fn decode_frm_with(
    data: &[u8],
    palette: &Palette,
    alignment: FrameAlignment,
) -> Result<Sprite, FrmError> {
    parser::parse_frm(data, palette, alignment)
}

/// Error type for FRM operations
#[derive(Debug)]
pub enum FrmError {
    /// Payload shorter than a required structure
    Truncated { needed: usize, available: usize },
    Io(io::Error),
}

impl From<io::Error> for FrmError {
    fn from(err: io::Error) -> Self {
        FrmError::Io(err)
    }
}

impl fmt::Display for FrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrmError::Truncated { needed, available } => write!(
                f,
                "FRM data truncated: need {} bytes, have {}",
                needed, available
            ),
            FrmError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for FrmError {}
