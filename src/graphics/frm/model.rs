//! Data structures for decoded FRM sprites

use serde::Serialize;

use super::{Direction, DIRECTION_COUNT};
use crate::graphics::palette::Palette;

/// Fixed FRM header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrmHeader {
    pub version: u32,
    pub fps: u16,
    pub action_frame: u16,
    pub frames_per_direction: u16,

    /// Per-direction shift applied to every frame of that direction
    pub shift_x: [i16; DIRECTION_COUNT],
    pub shift_y: [i16; DIRECTION_COUNT],

    /// Offsets of each direction's frame data, relative to the end of the header
    pub data_offsets: [u32; DIRECTION_COUNT],
    pub total_data_size: u32,
}

/// One decoded frame of palette indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteFrame {
    pub direction: Direction,
    pub frame_index: usize,
    pub width: u16,
    pub height: u16,

    /// Direction shift plus frame offset
    pub offset_x: i16,
    pub offset_y: i16,

    /// Frame offset as stored
    pub frame_offset_x: i16,
    pub frame_offset_y: i16,

    /// Row-major, always `width * height` long
    #[serde(skip)]
    pub pixels: Vec<u8>,
}

impl SpriteFrame {
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }
        self.pixels.get(y * self.width as usize + x).copied()
    }

    /// True when every pixel is the transparent index
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectionFrames {
    Decoded(Vec<SpriteFrame>),
    /// Shares the frames of an earlier, decoded direction
    Alias(Direction),
}

#[derive(Debug, Clone)]
pub struct Sprite {
    pub header: FrmHeader,
    pub directions: Vec<DirectionFrames>,
    pub palette: Palette,
}

impl Sprite {
    /// Decoded frames in direction order; aliased directions are not repeated
    pub fn frames(&self) -> impl Iterator<Item = &SpriteFrame> {
        self.directions.iter().flat_map(|direction| match direction {
            DirectionFrames::Decoded(frames) => frames.as_slice(),
            DirectionFrames::Alias(_) => &[],
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames().count()
    }

    pub fn alias_of(&self, direction: Direction) -> Option<Direction> {
        match self.directions.get(direction.index()) {
            Some(DirectionFrames::Alias(target)) => Some(*target),
            _ => None,
        }
    }

    /// Frames rendered for `direction`, following aliases
    pub fn frames_for(&self, direction: Direction) -> &[SpriteFrame] {
        let resolved = self.alias_of(direction).unwrap_or(direction);
        match self.directions.get(resolved.index()) {
            Some(DirectionFrames::Decoded(frames)) => frames,
            _ => &[],
        }
    }

    /// Directions with their own frame data
    pub fn decoded_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .take(self.directions.len())
            .filter(|&d| self.alias_of(d).is_none())
    }
}
