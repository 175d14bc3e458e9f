//! # Map Objects
//!
//! Every object is a 72-byte base block, a 12-byte inventory header, the inventory items
//! (each a quantity followed by a nested item object) and a trailer whose size depends on
//! the object type and, for items and scenery, on the prototype subtype.

use std::io::{self, Cursor};

use log::trace;
use serde::Serialize;

use super::{ELEVATION_COUNT, MAP_WIDTH, TILES_PER_ELEVATION};
use crate::binary_utils::{read_i32_be, read_u32_be, remaining};
use crate::data::pid::{pid_index, type_byte, ObjectType};
use crate::data::prototype::{ItemSubtype, PrototypeIndex, ScenerySubtype};

pub const OBJECT_BASE_SIZE: usize = 72;
pub const INVENTORY_HEADER_SIZE: usize = 12;

/// Larger per-elevation counts are treated as corruption
pub const MAX_OBJECTS_PER_ELEVATION: u32 = 10_000;

/// Deepest container-in-container nesting accepted
pub const MAX_INVENTORY_DEPTH: usize = 8;

const CRITTER_TRAILER_SIZE: usize = 44;
const FLAGS_SIZE: usize = 4;
const EXIT_GRID_SIZE: usize = 16;

/// Misc PIDs 0x10..=0x17 are exit grids
const EXIT_GRID_PIDS: std::ops::RangeInclusive<u32> = 0x10..=0x17;

pub fn is_exit_grid(pid: u32) -> bool {
    ObjectType::from_pid(pid) == Some(ObjectType::Misc) && EXIT_GRID_PIDS.contains(&pid_index(pid))
}

/// Trailer bytes following the inventory. An unknown subtype contributes no extra bytes.
pub fn type_extra_size(object_type: ObjectType, subtype: Option<u32>, pid: u32) -> usize {
    match object_type {
        ObjectType::Critter => CRITTER_TRAILER_SIZE,
        ObjectType::Item => {
            FLAGS_SIZE
                + match subtype.map(ItemSubtype::from) {
                    Some(ItemSubtype::Weapon) => 8,
                    Some(ItemSubtype::Ammo | ItemSubtype::Misc | ItemSubtype::Key) => 4,
                    _ => 0,
                }
        }
        ObjectType::Scenery => {
            FLAGS_SIZE
                + match subtype.map(ScenerySubtype::from) {
                    Some(ScenerySubtype::Door) => 4,
                    Some(
                        ScenerySubtype::Stairs
                        | ScenerySubtype::Elevator
                        | ScenerySubtype::LadderUp
                        | ScenerySubtype::LadderDown,
                    ) => 8,
                    _ => 0,
                }
        }
        ObjectType::Wall => FLAGS_SIZE,
        ObjectType::Misc => {
            FLAGS_SIZE
                + if is_exit_grid(pid) {
                    EXIT_GRID_SIZE
                } else {
                    0
                }
        }
        ObjectType::Tile => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CritterData {
    pub reaction_to_pc: i32,
    pub damage_last_turn: i32,
    pub combat_maneuver: i32,
    pub action_points: i32,
    pub combat_results: i32,
    pub ai_packet: i32,
    pub team: i32,
    pub who_hit_me: i32,
    pub hit_points: i32,
    pub radiation: i32,
    pub poison: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemData {
    Weapon { ammo_quantity: i32, ammo_type_pid: i32 },
    Ammo { quantity: i32 },
    Misc { charges: i32 },
    Key { key_code: i32 },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SceneryData {
    Door { open_flags: i32 },
    Stairs { destination_built_tile: i32, destination_map: i32 },
    Elevator { elevator_type: i32, level: i32 },
    Ladder { destination_built_tile: i32, destination_map: i32 },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitGrid {
    pub map: i32,
    pub tile: i32,
    pub elevation: i32,
    pub rotation: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectData {
    Item { flags: u32, item: ItemData },
    Critter(CritterData),
    Scenery { flags: u32, scenery: SceneryData },
    Wall { flags: u32 },
    Tile,
    Misc { flags: u32, exit_grid: Option<ExitGrid> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub quantity: u32,
    pub object: MapObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapObject {
    pub id: i32,
    /// Tile index, negative when the object is not on the grid
    pub tile: i32,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub sprite_offset_x: i32,
    pub sprite_offset_y: i32,
    pub screen_x: i32,
    pub screen_y: i32,
    pub frame: i32,
    pub orientation: u32,
    pub fid: u32,
    pub flags: u32,
    pub elevation: u32,
    /// Elevation field as stored in the record
    pub stored_elevation: u32,
    pub pid: u32,
    pub object_type: ObjectType,
    pub container_id: i32,
    pub light_radius: i32,
    pub light_intensity: i32,
    pub outline: i32,
    pub script_id: i32,
    pub script_index: i32,
    pub inventory_capacity: u32,
    pub inventory: Vec<InventoryItem>,
    pub data: ObjectData,
}

impl MapObject {
    /// Record size on disk, nested inventory included
    pub fn record_size(&self, prototypes: &PrototypeIndex) -> usize {
        OBJECT_BASE_SIZE
            + INVENTORY_HEADER_SIZE
            + self
                .inventory
                .iter()
                .map(|item| 4 + item.object.record_size(prototypes))
                .sum::<usize>()
            + type_extra_size(self.object_type, prototypes.subtype(self.pid), self.pid)
    }

    /// Inventory objects at every nesting level
    pub fn inventory_count(&self) -> usize {
        self.inventory
            .iter()
            .map(|item| 1 + item.object.inventory_count())
            .sum()
    }
}

fn invalid(reason: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, reason)
}

/// Read one object. `elevation` overrides the stored field; `depth` is the nesting level.
pub fn read_object(
    cursor: &mut Cursor<&[u8]>,
    prototypes: &PrototypeIndex,
    elevation: u32,
    depth: usize,
) -> io::Result<MapObject> {
    let start = cursor.position();

    let id = read_i32_be(cursor)?;
    let tile = read_i32_be(cursor)?;
    let sprite_offset_x = read_i32_be(cursor)?;
    let sprite_offset_y = read_i32_be(cursor)?;
    let screen_x = read_i32_be(cursor)?;
    let screen_y = read_i32_be(cursor)?;
    let frame = read_i32_be(cursor)?;
    let orientation = read_u32_be(cursor)?;
    let fid = read_u32_be(cursor)?;
    let flags = read_u32_be(cursor)?;
    let stored_elevation = read_u32_be(cursor)?;
    let pid = read_u32_be(cursor)?;
    let container_id = read_i32_be(cursor)?;
    let light_radius = read_i32_be(cursor)?;
    let light_intensity = read_i32_be(cursor)?;
    let outline = read_i32_be(cursor)?;
    let script_id = read_i32_be(cursor)?;
    let script_index = read_i32_be(cursor)?;

    let object_type = ObjectType::from_pid(pid).ok_or_else(|| {
        invalid(format!(
            "object at 0x{:x} has type byte {} (pid 0x{:08x})",
            start,
            type_byte(pid),
            pid
        ))
    })?;

    if tile >= TILES_PER_ELEVATION as i32 {
        return Err(invalid(format!(
            "object at 0x{:x} has tile {} outside the grid",
            start, tile
        )));
    }
    if depth > 0 && object_type != ObjectType::Item {
        return Err(invalid(format!(
            "inventory object at 0x{:x} is a {}, not an item",
            start, object_type
        )));
    }

    let inventory_length = read_u32_be(cursor)?;
    let inventory_capacity = read_u32_be(cursor)?;
    let _inventory_pointer = read_u32_be(cursor)?;

    if inventory_length > 0 && depth >= MAX_INVENTORY_DEPTH {
        return Err(invalid(format!(
            "inventory at 0x{:x} nested deeper than {}",
            start, MAX_INVENTORY_DEPTH
        )));
    }

    let mut inventory = Vec::new();
    for _ in 0..inventory_length {
        let quantity = read_u32_be(cursor)?;
        let object = read_object(cursor, prototypes, elevation, depth + 1)?;
        inventory.push(InventoryItem { quantity, object });
    }

    let data = read_trailer(cursor, object_type, prototypes.subtype(pid), pid)?;

    let (x, y) = if tile >= 0 {
        let tile = tile as u32;
        (Some(tile % MAP_WIDTH as u32), Some(tile / MAP_WIDTH as u32))
    } else {
        (None, None)
    };

    trace!(
        "{} pid 0x{:08x} at tile {} ({} bytes)",
        object_type,
        pid,
        tile,
        cursor.position() - start
    );

    Ok(MapObject {
        id,
        tile,
        x,
        y,
        sprite_offset_x,
        sprite_offset_y,
        screen_x,
        screen_y,
        frame,
        orientation,
        fid,
        flags,
        elevation,
        stored_elevation,
        pid,
        object_type,
        container_id,
        light_radius,
        light_intensity,
        outline,
        script_id,
        script_index,
        inventory_capacity,
        inventory,
        data,
    })
}

fn read_trailer(
    cursor: &mut Cursor<&[u8]>,
    object_type: ObjectType,
    subtype: Option<u32>,
    pid: u32,
) -> io::Result<ObjectData> {
    let data = match object_type {
        ObjectType::Critter => ObjectData::Critter(CritterData {
            reaction_to_pc: read_i32_be(cursor)?,
            damage_last_turn: read_i32_be(cursor)?,
            combat_maneuver: read_i32_be(cursor)?,
            action_points: read_i32_be(cursor)?,
            combat_results: read_i32_be(cursor)?,
            ai_packet: read_i32_be(cursor)?,
            team: read_i32_be(cursor)?,
            who_hit_me: read_i32_be(cursor)?,
            hit_points: read_i32_be(cursor)?,
            radiation: read_i32_be(cursor)?,
            poison: read_i32_be(cursor)?,
        }),
        ObjectType::Item => {
            let flags = read_u32_be(cursor)?;
            let item = match subtype.map(ItemSubtype::from) {
                Some(ItemSubtype::Weapon) => ItemData::Weapon {
                    ammo_quantity: read_i32_be(cursor)?,
                    ammo_type_pid: read_i32_be(cursor)?,
                },
                Some(ItemSubtype::Ammo) => ItemData::Ammo {
                    quantity: read_i32_be(cursor)?,
                },
                Some(ItemSubtype::Misc) => ItemData::Misc {
                    charges: read_i32_be(cursor)?,
                },
                Some(ItemSubtype::Key) => ItemData::Key {
                    key_code: read_i32_be(cursor)?,
                },
                _ => ItemData::None,
            };
            ObjectData::Item { flags, item }
        }
        ObjectType::Scenery => {
            let flags = read_u32_be(cursor)?;
            let scenery = match subtype.map(ScenerySubtype::from) {
                Some(ScenerySubtype::Door) => SceneryData::Door {
                    open_flags: read_i32_be(cursor)?,
                },
                Some(ScenerySubtype::Stairs) => SceneryData::Stairs {
                    destination_built_tile: read_i32_be(cursor)?,
                    destination_map: read_i32_be(cursor)?,
                },
                Some(ScenerySubtype::Elevator) => SceneryData::Elevator {
                    elevator_type: read_i32_be(cursor)?,
                    level: read_i32_be(cursor)?,
                },
                Some(ScenerySubtype::LadderUp | ScenerySubtype::LadderDown) => {
                    SceneryData::Ladder {
                        destination_built_tile: read_i32_be(cursor)?,
                        destination_map: read_i32_be(cursor)?,
                    }
                }
                _ => SceneryData::None,
            };
            ObjectData::Scenery { flags, scenery }
        }
        ObjectType::Wall => ObjectData::Wall {
            flags: read_u32_be(cursor)?,
        },
        ObjectType::Misc => {
            let flags = read_u32_be(cursor)?;
            let exit_grid = if is_exit_grid(pid) {
                Some(ExitGrid {
                    map: read_i32_be(cursor)?,
                    tile: read_i32_be(cursor)?,
                    elevation: read_i32_be(cursor)?,
                    rotation: read_i32_be(cursor)?,
                })
            } else {
                None
            };
            ObjectData::Misc { flags, exit_grid }
        }
        ObjectType::Tile => ObjectData::Tile,
    };
    Ok(data)
}

/// Read the object section: a total count, then a count and records per elevation.
/// Objects read before a failure stay in `objects`.
pub fn read_objects(
    cursor: &mut Cursor<&[u8]>,
    prototypes: &PrototypeIndex,
    objects: &mut Vec<MapObject>,
) -> io::Result<()> {
    if remaining(cursor) == 0 {
        trace!("No object section");
        return Ok(());
    }

    let total = read_u32_be(cursor)?;
    if total == 0 && remaining(cursor) == 0 {
        return Ok(());
    }

    for elevation in 0..ELEVATION_COUNT {
        let count = read_u32_be(cursor)?;
        if count > MAX_OBJECTS_PER_ELEVATION {
            return Err(invalid(format!(
                "elevation {} object count {} exceeds limit {}",
                elevation, count, MAX_OBJECTS_PER_ELEVATION
            )));
        }

        for _ in 0..count {
            objects.push(read_object(cursor, prototypes, elevation as u32, 0)?);
        }
    }

    if objects.len() as u32 != total {
        trace!("Object total {} but {} read", total, objects.len());
    }
    Ok(())
}
