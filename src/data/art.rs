//! Art lists: resolve FIDs and tile ids to archive member paths.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use super::pid::{fid_index, fid_type};
use crate::archive::{ArchiveError, AssetSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArtCategory {
    Items = 0,
    Critters = 1,
    Scenery = 2,
    Walls = 3,
    Tiles = 4,
    Misc = 5,
    Interface = 6,
}

impl ArtCategory {
    pub const ALL: [ArtCategory; 7] = [
        ArtCategory::Items,
        ArtCategory::Critters,
        ArtCategory::Scenery,
        ArtCategory::Walls,
        ArtCategory::Tiles,
        ArtCategory::Misc,
        ArtCategory::Interface,
    ];

    pub fn from_fid(fid: u32) -> Option<Self> {
        Self::ALL.get(fid_type(fid) as usize).copied()
    }

    /// Directory under `art/`
    pub fn dir(self) -> &'static str {
        match self {
            ArtCategory::Items => "items",
            ArtCategory::Critters => "critters",
            ArtCategory::Scenery => "scenery",
            ArtCategory::Walls => "walls",
            ArtCategory::Tiles => "tiles",
            ArtCategory::Misc => "misc",
            ArtCategory::Interface => "intrface",
        }
    }

    pub fn list_path(self) -> String {
        format!("art/{0}/{0}.lst", self.dir())
    }
}

#[derive(Debug, Clone)]
pub struct ArtList {
    pub category: ArtCategory,
    names: Vec<String>,
}

impl ArtList {
    /// One entry per line. Comments after `;` and extra `,` fields are dropped; blank
    /// lines keep their slot so indices stay aligned.
    pub fn parse(category: ArtCategory, data: &[u8]) -> Self {
        let text: String = data.iter().map(|&b| b as char).collect();
        let names = text
            .lines()
            .map(|line| {
                let line = line.split(';').next().unwrap_or("");
                let line = line.split(',').next().unwrap_or("");
                line.trim().to_ascii_lowercase()
            })
            .collect();

        ArtList { category, names }
    }

    pub fn load<S: AssetSource + ?Sized>(
        source: &mut S,
        category: ArtCategory,
    ) -> Result<Self, ArchiveError> {
        let data = source.read(&category.list_path())?;
        let list = Self::parse(category, &data);
        debug!("{}: {} entries", category.list_path(), list.len());
        Ok(list)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn member_path(&self, index: usize) -> Option<String> {
        self.name(index)
            .map(|name| format!("art/{}/{}", self.category.dir(), name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArtResolver {
    lists: HashMap<ArtCategory, ArtList>,
}

impl ArtResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every category list present in `source`; missing lists are skipped
    pub fn load<S: AssetSource + ?Sized>(source: &mut S) -> Result<Self, ArchiveError> {
        let mut resolver = ArtResolver::new();
        for category in ArtCategory::ALL {
            match ArtList::load(source, category) {
                Ok(list) => resolver.insert(list),
                Err(ArchiveError::NotFound(path)) => warn!("Art list {} not found", path),
                Err(e) => return Err(e),
            }
        }
        Ok(resolver)
    }

    pub fn insert(&mut self, list: ArtList) {
        self.lists.insert(list.category, list);
    }

    pub fn list(&self, category: ArtCategory) -> Option<&ArtList> {
        self.lists.get(&category)
    }

    /// Member path for a FID. Critter art is named by animation code and is not resolved here.
    pub fn resolve_fid(&self, fid: u32) -> Option<String> {
        let category = ArtCategory::from_fid(fid)?;
        if category == ArtCategory::Critters {
            return None;
        }
        self.lists.get(&category)?.member_path(fid_index(fid))
    }

    pub fn resolve_tile(&self, tile_id: u16) -> Option<String> {
        self.lists
            .get(&ArtCategory::Tiles)?
            .member_path(tile_id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_lines() {
        let list = ArtList::parse(
            ArtCategory::Items,
            b"KNIFE.FRM ; a knife\r\n\nspear.frm,1,2\n",
        );
        assert_eq!(list.len(), 3);
        assert_eq!(list.name(0), Some("knife.frm"));
        assert_eq!(list.name(1), None);
        assert_eq!(list.member_path(2).as_deref(), Some("art/items/spear.frm"));
    }

    #[test]
    fn resolves_fids_by_category() {
        let mut resolver = ArtResolver::new();
        resolver.insert(ArtList::parse(ArtCategory::Scenery, b"tree.frm\nrock.frm\n"));
        resolver.insert(ArtList::parse(ArtCategory::Tiles, b"reserve.frm\nfloor1.frm\n"));
        resolver.insert(ArtList::parse(ArtCategory::Critters, b"hmjmps,11\n"));

        assert_eq!(resolver.resolve_fid(0x0200_0001).as_deref(), Some("art/scenery/rock.frm"));
        assert_eq!(resolver.resolve_fid(0x0100_0000), None);
        assert_eq!(resolver.resolve_fid(0x0300_0000), None);
        assert_eq!(resolver.resolve_tile(1).as_deref(), Some("art/tiles/floor1.frm"));
        assert_eq!(ArtCategory::Interface.list_path(), "art/intrface/intrface.lst");
    }
}
