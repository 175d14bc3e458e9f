//! Packed identifiers: prototype ids (PIDs) and art ids (FIDs).
//!
//! Both carry a category in the top byte and an instance number in the low bits.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Item = 0,
    Critter = 1,
    Scenery = 2,
    Wall = 3,
    Tile = 4,
    Misc = 5,
}

impl ObjectType {
    pub const ALL: [ObjectType; 6] = [
        ObjectType::Item,
        ObjectType::Critter,
        ObjectType::Scenery,
        ObjectType::Wall,
        ObjectType::Tile,
        ObjectType::Misc,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Category from the top byte of a PID
    pub fn from_pid(pid: u32) -> Option<Self> {
        Self::from_u8(type_byte(pid))
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectType::Item => "item",
            ObjectType::Critter => "critter",
            ObjectType::Scenery => "scenery",
            ObjectType::Wall => "wall",
            ObjectType::Tile => "tile",
            ObjectType::Misc => "misc",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn type_byte(id: u32) -> u8 {
    (id >> 24) as u8
}

/// Instance number within the PID's category
pub fn pid_index(pid: u32) -> u32 {
    pid & 0x00FF_FFFF
}

/// Art category nibble of a FID
pub fn fid_type(fid: u32) -> u8 {
    ((fid >> 24) & 0x0F) as u8
}

/// Index into the category's art list
pub fn fid_index(fid: u32) -> usize {
    (fid & 0x0FFF) as usize
}
