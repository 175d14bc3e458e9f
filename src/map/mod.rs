//! MAP scene decoding
//!
//! A map is read in one forward pass: header, variable tables, tile grids, script table,
//! object table. A section that fails its sanity checks ends decoding; everything read
//! up to that point is returned along with a [`Truncation`] describing where it stopped.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Cursor};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub mod header;
pub mod objects;
pub mod scripts;
pub mod tiles;

pub use header::{MapHeader, MAP_HEADER_SIZE};
pub use objects::{
    type_extra_size, CritterData, ExitGrid, InventoryItem, ItemData, MapObject, ObjectData,
    SceneryData,
};
pub use scripts::{ScriptCommon, ScriptExtent, ScriptExtra, ScriptKind, ScriptList, ScriptRecord, ScriptTable};
pub use tiles::TileRecord;

use crate::binary_utils::{read_i32_be, read_u32_be, remaining};
use crate::data::prototype::PrototypeIndex;

pub const MAP_WIDTH: usize = 100;
pub const TILES_PER_ELEVATION: usize = MAP_WIDTH * MAP_WIDTH;
pub const ELEVATION_COUNT: usize = 3;

/// How the global and local variable tables are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableLayout {
    /// One i32 per variable; the id is the position in the table. Shipped maps store
    /// their variable tables this way.
    #[default]
    Values,
    /// (id u32, value i32) pairs
    Pairs,
}

impl VariableLayout {
    fn record_size(self) -> usize {
        match self {
            VariableLayout::Values => 4,
            VariableLayout::Pairs => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOptions {
    pub variable_layout: VariableLayout,
}

#[derive(Debug)]
pub enum MapError {
    /// Payload too short for the fixed header
    Truncated { needed: usize, available: usize },
    Io(io::Error),
}

impl From<io::Error> for MapError {
    fn from(err: io::Error) -> Self {
        MapError::Io(err)
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Truncated { needed, available } => write!(
                f,
                "Map header truncated: need {} bytes, have {}",
                needed, available
            ),
            MapError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for MapError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapSection {
    Variables,
    Tiles,
    Scripts,
    Objects,
}

impl fmt::Display for MapSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapSection::Variables => "variables",
            MapSection::Tiles => "tiles",
            MapSection::Scripts => "scripts",
            MapSection::Objects => "objects",
        };
        f.write_str(name)
    }
}

/// Where and why decoding stopped early
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub section: MapSection,
    pub offset: usize,
    pub remaining_bytes: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapVariable {
    pub id: u32,
    pub value: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapStats {
    pub tiles: usize,
    pub scripts: usize,
    pub objects: usize,
    pub inventory_items: usize,
    pub objects_by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapData {
    pub header: MapHeader,
    pub global_vars: Vec<MapVariable>,
    pub local_vars: Vec<MapVariable>,
    pub tiles: Vec<TileRecord>,
    pub scripts: ScriptTable,
    pub objects: Vec<MapObject>,
    pub truncation: Option<Truncation>,
    /// Bytes left after a complete decode
    pub trailing_bytes: usize,
}

impl MapData {
    pub fn is_complete(&self) -> bool {
        self.truncation.is_none()
    }

    pub fn tiles_at(&self, elevation: u8) -> impl Iterator<Item = &TileRecord> {
        self.tiles.iter().filter(move |t| t.elevation == elevation)
    }

    pub fn objects_at(&self, elevation: u32) -> impl Iterator<Item = &MapObject> {
        self.objects.iter().filter(move |o| o.elevation == elevation)
    }

    pub fn stats(&self) -> MapStats {
        let mut objects_by_type = BTreeMap::new();
        for object in &self.objects {
            *objects_by_type
                .entry(object.object_type.name().to_string())
                .or_insert(0) += 1;
        }

        MapStats {
            tiles: self.tiles.len(),
            scripts: self.scripts.len(),
            objects: self.objects.len(),
            inventory_items: self.objects.iter().map(MapObject::inventory_count).sum(),
            objects_by_type,
        }
    }
}

pub fn parse_map(data: &[u8], prototypes: &PrototypeIndex) -> Result<MapData, MapError> {
    parse_map_with(data, prototypes, &MapOptions::default())
}

pub fn parse_map_with(
    data: &[u8],
    prototypes: &PrototypeIndex,
    options: &MapOptions,
) -> Result<MapData, MapError> {
    let mut cursor = Cursor::new(data);
    let header = MapHeader::parse(&mut cursor)?;
    debug!(
        "Map {:?} v{}: flags 0x{:x}, {} global / {} local vars",
        header.name, header.version, header.flags, header.global_var_count, header.local_var_count
    );

    let mut map = MapData {
        header,
        global_vars: Vec::new(),
        local_vars: Vec::new(),
        tiles: Vec::new(),
        scripts: ScriptTable::default(),
        objects: Vec::new(),
        truncation: None,
        trailing_bytes: 0,
    };

    let result = read_sections(&mut cursor, &mut map, prototypes, options);
    match result {
        Ok(()) => {
            map.trailing_bytes = remaining(&cursor);
            if map.trailing_bytes > 0 {
                debug!("{} trailing bytes after object table", map.trailing_bytes);
            }
        }
        Err((section, e)) => {
            let truncation = Truncation {
                section,
                offset: cursor.position() as usize,
                remaining_bytes: remaining(&cursor),
                reason: e.to_string(),
            };
            warn!(
                "Map {:?} truncated in {} at 0x{:x}: {}",
                map.header.name, truncation.section, truncation.offset, truncation.reason
            );
            map.truncation = Some(truncation);
        }
    }

    Ok(map)
}

fn read_sections(
    cursor: &mut Cursor<&[u8]>,
    map: &mut MapData,
    prototypes: &PrototypeIndex,
    options: &MapOptions,
) -> Result<(), (MapSection, io::Error)> {
    let global_count = map.header.global_var_count;
    let local_count = map.header.local_var_count;
    read_variables(cursor, global_count, options.variable_layout, &mut map.global_vars)
        .and_then(|()| {
            read_variables(cursor, local_count, options.variable_layout, &mut map.local_vars)
        })
        .map_err(|e| (MapSection::Variables, e))?;

    tiles::read_tiles(cursor, &map.header, &mut map.tiles).map_err(|e| (MapSection::Tiles, e))?;

    scripts::read_scripts(cursor, &mut map.scripts).map_err(|e| (MapSection::Scripts, e))?;

    objects::read_objects(cursor, prototypes, &mut map.objects)
        .map_err(|e| (MapSection::Objects, e))?;

    Ok(())
}

fn read_variables(
    cursor: &mut Cursor<&[u8]>,
    count: u32,
    layout: VariableLayout,
    vars: &mut Vec<MapVariable>,
) -> io::Result<()> {
    let needed = count as usize * layout.record_size();
    if needed > remaining(cursor) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} variables need {} bytes, {} left",
                count,
                needed,
                remaining(cursor)
            ),
        ));
    }

    vars.reserve(count as usize);
    for position in 0..count {
        let variable = match layout {
            VariableLayout::Values => MapVariable {
                id: position,
                value: read_i32_be(cursor)?,
            },
            VariableLayout::Pairs => MapVariable {
                id: read_u32_be(cursor)?,
                value: read_i32_be(cursor)?,
            },
        };
        vars.push(variable);
    }
    Ok(())
}
