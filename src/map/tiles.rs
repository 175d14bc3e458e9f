use std::io::{self, Cursor};

use log::trace;
use serde::Serialize;

use super::header::MapHeader;
use super::{MAP_WIDTH, TILES_PER_ELEVATION};
use crate::binary_utils::read_u32_be;

/// Floor and roof art ids of one grid square. Squares with both ids zero are not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRecord {
    pub x: u8,
    pub y: u8,
    pub elevation: u8,
    pub floor_id: u16,
    pub roof_id: u16,
}

impl TileRecord {
    /// Roof id in the high half of the word, floor id in the low half
    pub fn from_word(word: u32, index: usize, elevation: usize) -> Option<Self> {
        let floor_id = (word & 0xFFFF) as u16;
        let roof_id = (word >> 16) as u16;
        if floor_id == 0 && roof_id == 0 {
            return None;
        }

        Some(TileRecord {
            x: (index % MAP_WIDTH) as u8,
            y: (index / MAP_WIDTH) as u8,
            elevation: elevation as u8,
            floor_id,
            roof_id,
        })
    }

    pub fn index(&self) -> usize {
        self.y as usize * MAP_WIDTH + self.x as usize
    }
}

/// Read the grid of every present elevation, appending non-empty squares to `tiles`
pub fn read_tiles(
    cursor: &mut Cursor<&[u8]>,
    header: &MapHeader,
    tiles: &mut Vec<TileRecord>,
) -> io::Result<()> {
    for elevation in header.present_elevations() {
        let before = tiles.len();
        for index in 0..TILES_PER_ELEVATION {
            let word = read_u32_be(cursor)?;
            if let Some(tile) = TileRecord::from_word(word, index, elevation) {
                tiles.push(tile);
            }
        }
        trace!("Elevation {}: {} tiles", elevation, tiles.len() - before);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_floor_and_roof() {
        let tile = TileRecord::from_word(0x0002_0001, 205, 1).unwrap();
        assert_eq!((tile.x, tile.y, tile.elevation), (5, 2, 1));
        assert_eq!((tile.floor_id, tile.roof_id), (1, 2));
        assert_eq!(tile.index(), 205);
        assert!(TileRecord::from_word(0, 0, 0).is_none());
    }
}
