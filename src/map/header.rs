//! Fixed map header

use std::io::Cursor;

use serde::Serialize;

use super::{MapError, ELEVATION_COUNT, MAP_WIDTH};
use crate::binary_utils::{read_fixed_string, read_i32_be, read_u32_be, skip};

pub const MAP_HEADER_SIZE: usize = 236;
const MAP_NAME_SIZE: usize = 16;
const RESERVED_SIZE: usize = 176;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapHeader {
    pub version: u32,
    pub name: String,
    pub entering_tile: u32,
    pub entering_elevation: u32,
    pub entering_rotation: u32,
    pub local_var_count: u32,
    /// Map script, -1 or 0 when none
    pub script_index: i32,
    pub flags: u32,
    pub darkness: u32,
    pub global_var_count: u32,
    pub map_id: u32,
    pub timestamp: u32,
}

impl MapHeader {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, MapError> {
        let available = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
        if available < MAP_HEADER_SIZE {
            return Err(MapError::Truncated {
                needed: MAP_HEADER_SIZE,
                available,
            });
        }

        let header = MapHeader {
            version: read_u32_be(cursor)?,
            name: read_fixed_string(cursor, MAP_NAME_SIZE)?,
            entering_tile: read_u32_be(cursor)?,
            entering_elevation: read_u32_be(cursor)?,
            entering_rotation: read_u32_be(cursor)?,
            local_var_count: read_u32_be(cursor)?,
            script_index: read_i32_be(cursor)?,
            flags: read_u32_be(cursor)?,
            darkness: read_u32_be(cursor)?,
            global_var_count: read_u32_be(cursor)?,
            map_id: read_u32_be(cursor)?,
            timestamp: read_u32_be(cursor)?,
        };
        skip(cursor, RESERVED_SIZE)?;

        Ok(header)
    }

    /// A set bit suppresses the elevation's tile block
    pub fn elevation_present(&self, elevation: usize) -> bool {
        elevation < ELEVATION_COUNT && (self.flags >> (1 + elevation)) & 1 == 0
    }

    pub fn present_elevations(&self) -> impl Iterator<Item = usize> + '_ {
        (0..ELEVATION_COUNT).filter(move |&e| self.elevation_present(e))
    }

    pub fn entering_position(&self) -> (u32, u32) {
        (
            self.entering_tile % MAP_WIDTH as u32,
            self.entering_tile / MAP_WIDTH as u32,
        )
    }
}
