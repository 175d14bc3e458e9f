//! # Map Script Table
//!
//! Five lists, one per script kind. Each list is stored as a chain of 16-record extents,
//! every extent followed by a (length, next) footer. Only the first `length` records of an
//! extent are in use.

use std::io::{self, Cursor};

use log::{debug, trace};
use serde::Serialize;

use crate::binary_utils::{read_i32_be, read_u32_be};

pub const SCRIPT_LIST_COUNT: usize = 5;
pub const EXTENT_CAPACITY: usize = 16;
pub const SCRIPT_COMMON_SIZE: usize = 56;

/// Larger counts are treated as corruption
pub const MAX_SCRIPT_COUNT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScriptKind {
    System,
    Spatial,
    Timed,
    Item,
    Critter,
    Unknown(u8),
}

impl ScriptKind {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ScriptKind::System,
            1 => ScriptKind::Spatial,
            2 => ScriptKind::Timed,
            3 => ScriptKind::Item,
            4 => ScriptKind::Critter,
            other => ScriptKind::Unknown(other),
        }
    }

    /// Kind encoded in the top byte of a script id
    pub fn from_sid(sid: i32) -> Self {
        Self::from_u8((sid as u32 >> 24) as u8)
    }

    /// Bytes between the record head and the common block
    pub fn extra_size(self) -> usize {
        match self {
            ScriptKind::Spatial => 8,
            ScriptKind::Timed => 4,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScriptExtra {
    None,
    Spatial { built_tile: i32, radius: i32 },
    Timed { time: i32 },
}

/// The 56-byte block shared by every script kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScriptCommon {
    pub flags: i32,
    pub index: i32,
    /// Runtime program pointer, meaningless on disk
    pub program: i32,
    pub owner_id: i32,
    pub local_vars_offset: i32,
    pub local_vars_count: i32,
    pub return_value: i32,
    pub action: i32,
    pub fixed_param: i32,
    pub action_being_used: i32,
    pub script_overrides: i32,
    pub unknown_48: i32,
    pub how_much: i32,
    pub unknown_52: i32,
}

impl ScriptCommon {
    fn read(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(ScriptCommon {
            flags: read_i32_be(cursor)?,
            index: read_i32_be(cursor)?,
            program: read_i32_be(cursor)?,
            owner_id: read_i32_be(cursor)?,
            local_vars_offset: read_i32_be(cursor)?,
            local_vars_count: read_i32_be(cursor)?,
            return_value: read_i32_be(cursor)?,
            action: read_i32_be(cursor)?,
            fixed_param: read_i32_be(cursor)?,
            action_being_used: read_i32_be(cursor)?,
            script_overrides: read_i32_be(cursor)?,
            unknown_48: read_i32_be(cursor)?,
            how_much: read_i32_be(cursor)?,
            unknown_52: read_i32_be(cursor)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRecord {
    pub sid: i32,
    pub kind: ScriptKind,
    pub next_script: i32,
    pub extra: ScriptExtra,
    pub common: ScriptCommon,
}

impl ScriptRecord {
    pub fn read(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let sid = read_i32_be(cursor)?;
        let next_script = read_i32_be(cursor)?;
        let kind = ScriptKind::from_sid(sid);

        let extra = match kind {
            ScriptKind::Spatial => ScriptExtra::Spatial {
                built_tile: read_i32_be(cursor)?,
                radius: read_i32_be(cursor)?,
            },
            ScriptKind::Timed => ScriptExtra::Timed {
                time: read_i32_be(cursor)?,
            },
            _ => ScriptExtra::None,
        };

        Ok(ScriptRecord {
            sid,
            kind,
            next_script,
            extra,
            common: ScriptCommon::read(cursor)?,
        })
    }

    /// On-disk size of this record
    pub fn size(&self) -> usize {
        8 + self.kind.extra_size() + SCRIPT_COMMON_SIZE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptExtent {
    pub records: Vec<ScriptRecord>,
    pub length: u32,
    pub next: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptList {
    /// Kind of the list by its position in the table
    pub list_kind: ScriptKind,
    pub count: u32,
    pub extents: Vec<ScriptExtent>,
}

impl ScriptList {
    pub fn records(&self) -> impl Iterator<Item = &ScriptRecord> {
        self.extents.iter().flat_map(|extent| extent.records.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptTable {
    pub lists: Vec<ScriptList>,
}

impl ScriptTable {
    /// All records across lists and extents, in storage order
    pub fn iter(&self) -> impl Iterator<Item = &ScriptRecord> {
        self.lists.iter().flat_map(|list| list.records())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn list(&self, kind: ScriptKind) -> Option<&ScriptList> {
        self.lists.iter().find(|list| list.list_kind == kind)
    }
}

/// Read the five script lists. Lists and extents read before a failure stay in `table`.
pub fn read_scripts(cursor: &mut Cursor<&[u8]>, table: &mut ScriptTable) -> io::Result<()> {
    for list_index in 0..SCRIPT_LIST_COUNT {
        let list_kind = ScriptKind::from_u8(list_index as u8);
        let count = read_u32_be(cursor)?;

        if count > MAX_SCRIPT_COUNT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{:?} script count {} exceeds limit {}",
                    list_kind, count, MAX_SCRIPT_COUNT
                ),
            ));
        }

        let mut list = ScriptList {
            list_kind,
            count,
            extents: Vec::new(),
        };

        let extent_count = (count as usize).div_ceil(EXTENT_CAPACITY);
        let mut kept = 0usize;

        for _ in 0..extent_count {
            let mut records = Vec::with_capacity(EXTENT_CAPACITY);
            let footer = read_extent_records(cursor, &mut records)
                .and_then(|()| Ok((read_u32_be(cursor)?, read_u32_be(cursor)?)));

            let (length, next) = match footer {
                Ok(footer) => footer,
                Err(e) => {
                    // Keep what was read of the broken extent
                    records.truncate((count as usize).saturating_sub(kept));
                    list.extents.push(ScriptExtent {
                        length: records.len() as u32,
                        records,
                        next: 0,
                    });
                    table.lists.push(list);
                    return Err(e);
                }
            };

            let in_use = (length as usize)
                .min(EXTENT_CAPACITY)
                .min((count as usize).saturating_sub(kept));
            records.truncate(in_use);
            kept += in_use;
            trace!("{:?} extent: {} of {} records in use", list_kind, in_use, length);

            list.extents.push(ScriptExtent {
                records,
                length,
                next,
            });
        }

        if kept != count as usize {
            debug!(
                "{:?} scripts: count {} but extents hold {}",
                list_kind, count, kept
            );
        }
        table.lists.push(list);
    }
    Ok(())
}

fn read_extent_records(
    cursor: &mut Cursor<&[u8]>,
    records: &mut Vec<ScriptRecord>,
) -> io::Result<()> {
    for _ in 0..EXTENT_CAPACITY {
        records.push(ScriptRecord::read(cursor)?);
    }
    Ok(())
}
