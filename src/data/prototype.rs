//! # Prototype Index
//!
//! Maps a PID to the subtype stored in its prototype record. Object records in maps
//! carry a trailer whose size depends on that subtype, so the index is built before
//! any map is decoded.

use std::collections::HashMap;

use log::{debug, info, warn};
use serde::Serialize;

use crate::archive::{ArchiveError, AssetSource};

/// pid (BE u32 at 0) ... subtype (BE u32 at 32)
pub const PROTOTYPE_RECORD_MIN: usize = 36;
const SUBTYPE_OFFSET: usize = 32;

pub const DEFAULT_PROTOTYPE_PREFIXES: [&str; 2] = ["proto/items/", "proto/scenery/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemSubtype {
    Armor,
    Container,
    Drug,
    Weapon,
    Ammo,
    Misc,
    Key,
    Unknown(u32),
}

impl From<u32> for ItemSubtype {
    fn from(value: u32) -> Self {
        match value {
            0 => ItemSubtype::Armor,
            1 => ItemSubtype::Container,
            2 => ItemSubtype::Drug,
            3 => ItemSubtype::Weapon,
            4 => ItemSubtype::Ammo,
            5 => ItemSubtype::Misc,
            6 => ItemSubtype::Key,
            other => ItemSubtype::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenerySubtype {
    Door,
    Stairs,
    Elevator,
    LadderUp,
    LadderDown,
    Generic,
    Unknown(u32),
}

impl From<u32> for ScenerySubtype {
    fn from(value: u32) -> Self {
        match value {
            0 => ScenerySubtype::Door,
            1 => ScenerySubtype::Stairs,
            2 => ScenerySubtype::Elevator,
            3 => ScenerySubtype::LadderUp,
            4 => ScenerySubtype::LadderDown,
            5 => ScenerySubtype::Generic,
            other => ScenerySubtype::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrototypeIndex {
    subtypes: HashMap<u32, u32>,
}

impl PrototypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every `.pro` member under each prefix. Unreadable members are skipped;
    /// only I/O failures abort the scan.
    pub fn build<S, P>(source: &mut S, prefixes: &[P]) -> Result<Self, ArchiveError>
    where
        S: AssetSource + ?Sized,
        P: AsRef<str>,
    {
        let mut index = PrototypeIndex::new();

        for prefix in prefixes {
            let names = source.names_with_prefix(prefix.as_ref());
            for name in names.iter().filter(|name| name.ends_with(".pro")) {
                let data = match source.read(name) {
                    Ok(data) => data,
                    Err(ArchiveError::Io(e)) => return Err(ArchiveError::Io(e)),
                    Err(e) => {
                        warn!("Skipping prototype {}: {}", name, e);
                        continue;
                    }
                };

                match Self::parse_record(&data) {
                    Some((pid, subtype)) => index.insert(pid, subtype),
                    None => debug!("Skipping short prototype {} ({} bytes)", name, data.len()),
                }
            }
        }

        info!("Prototype index holds {} records", index.len());
        Ok(index)
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut index = PrototypeIndex::new();
        for (pid, subtype) in records.into_iter().filter_map(Self::parse_record) {
            index.insert(pid, subtype);
        }
        index
    }

    /// (pid, subtype) of a record, or None when it is too short
    pub fn parse_record(data: &[u8]) -> Option<(u32, u32)> {
        if data.len() < PROTOTYPE_RECORD_MIN {
            return None;
        }
        let pid = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let subtype = u32::from_be_bytes([
            data[SUBTYPE_OFFSET],
            data[SUBTYPE_OFFSET + 1],
            data[SUBTYPE_OFFSET + 2],
            data[SUBTYPE_OFFSET + 3],
        ]);
        Some((pid, subtype))
    }

    pub fn insert(&mut self, pid: u32, subtype: u32) {
        self.subtypes.insert(pid, subtype);
    }

    pub fn subtype(&self, pid: u32) -> Option<u32> {
        self.subtypes.get(&pid).copied()
    }

    pub fn item_subtype(&self, pid: u32) -> Option<ItemSubtype> {
        self.subtype(pid).map(ItemSubtype::from)
    }

    pub fn scenery_subtype(&self, pid: u32) -> Option<ScenerySubtype> {
        self.subtype(pid).map(ScenerySubtype::from)
    }

    pub fn len(&self) -> usize {
        self.subtypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtypes.is_empty()
    }
}
