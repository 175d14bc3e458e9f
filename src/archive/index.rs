//! # Archive Index
//!
//! The directory block stored at the tail of a DAT2 archive: an entry count followed by
//! one variable-length record per member. Lookups are case- and separator-insensitive.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::io::Cursor;

use log::debug;
use serde::Serialize;
use twox_hash::XxHash64;

use super::ArchiveError;
use crate::binary_utils::{latin1_until_nul, read_bytes, read_u32_le, read_u8, remaining};

/// Two little-endian u32 values closing every archive
pub const TRAILER_SIZE: u64 = 8;

/// name length + compressed flag + three u32 fields, excluding the name itself
const ENTRY_FIXED_SIZE: usize = 4 + 1 + 4 + 4 + 4;

type NameMap = HashMap<String, usize, BuildHasherDefault<XxHash64>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveIndexEntry {
    /// Lower-cased, `/`-separated lookup key
    pub name: String,
    /// Name exactly as stored in the index
    pub raw_name: String,
    pub is_compressed: bool,
    pub decompressed_size: u32,
    pub stored_size: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveTrailer {
    pub index_block_size: u32,
    pub total_data_size: u32,
}

impl ArchiveTrailer {
    /// Offset of the index block, relative to the start of the data region
    pub fn index_start(&self) -> Result<u64, ArchiveError> {
        (self.total_data_size as u64)
            .checked_sub(self.index_block_size as u64 + TRAILER_SIZE)
            .ok_or_else(|| {
                ArchiveError::Format(format!(
                    "Index block size {} does not fit in declared data size {}",
                    self.index_block_size, self.total_data_size
                ))
            })
    }
}

pub fn normalise_name(name: &str) -> String {
    name.trim_end_matches('\0')
        .replace('\\', "/")
        .to_ascii_lowercase()
}

#[derive(Debug, Default)]
pub struct ArchiveIndex {
    entries: Vec<ArchiveIndexEntry>,
    by_name: NameMap,
}

impl ArchiveIndex {
    /// Parse the raw index block (entry count included)
    pub fn parse(block: &[u8]) -> Result<Self, ArchiveError> {
        let mut cursor = Cursor::new(block);

        let count = read_u32_le(&mut cursor)
            .map_err(|e| ArchiveError::Format(format!("Index block has no entry count: {}", e)))?
            as usize;

        // Every entry needs at least its fixed fields, so a bogus count is caught up front
        let minimum = count.saturating_mul(ENTRY_FIXED_SIZE);
        if minimum > remaining(&cursor) {
            return Err(ArchiveError::Format(format!(
                "Entry count {} needs at least {} bytes but the index block holds {}",
                count,
                minimum,
                remaining(&cursor)
            )));
        }

        let mut index = ArchiveIndex {
            entries: Vec::with_capacity(count),
            by_name: NameMap::with_capacity_and_hasher(count, Default::default()),
        };

        for i in 0..count {
            let entry = read_entry(&mut cursor).map_err(|e| {
                ArchiveError::Format(format!("Index entry {} of {} is malformed: {}", i, count, e))
            })?;

            if let Some(&previous) = index.by_name.get(&entry.name) {
                debug!(
                    "Duplicate index entry {:?} (entry {} replaces entry {})",
                    entry.name, i, previous
                );
            }
            index.by_name.insert(entry.name.clone(), index.entries.len());
            index.entries.push(entry);
        }

        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&ArchiveIndexEntry> {
        self.by_name
            .get(&normalise_name(name))
            .map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[ArchiveIndexEntry] {
        &self.entries
    }

    pub fn with_prefix<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = &'a ArchiveIndexEntry> + 'a {
        let prefix = normalise_name(prefix);
        self.entries
            .iter()
            .filter(move |entry| entry.name.starts_with(&prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_entry(cursor: &mut Cursor<&[u8]>) -> std::io::Result<ArchiveIndexEntry> {
    let name_length = read_u32_le(cursor)? as usize;
    let name_bytes = read_bytes(cursor, name_length)?;
    let raw_name = latin1_until_nul(&name_bytes);

    let compressed_flag = read_u8(cursor)?;
    let decompressed_size = read_u32_le(cursor)?;
    let stored_size = read_u32_le(cursor)?;
    let offset = read_u32_le(cursor)?;

    Ok(ArchiveIndexEntry {
        name: normalise_name(&raw_name),
        raw_name,
        is_compressed: compressed_flag != 0,
        decompressed_size,
        stored_size,
        offset,
    })
}
