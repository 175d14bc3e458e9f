use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, info};

use super::{normalise_name, ArchiveError, AssetSource, DatArchive};

/// Patch archives shadow critter.dat, which shadows master.dat; anything else ranks last.
pub fn archive_priority(path: &Path) -> i32 {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match stem.as_str() {
        s if s.starts_with("patch") => 2,
        "critter" => 1,
        "master" => 0,
        _ => -1,
    }
}

struct RankedArchive<R> {
    priority: i32,
    archive: DatArchive<R>,
}

/// Several archives searched highest priority first
pub struct ArchiveSet<R = BufReader<File>> {
    archives: Vec<RankedArchive<R>>,
}

impl<R> Default for ArchiveSet<R> {
    fn default() -> Self {
        ArchiveSet {
            archives: Vec::new(),
        }
    }
}

impl ArchiveSet<BufReader<File>> {
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ArchiveError> {
        let mut set = ArchiveSet::default();
        for path in paths {
            let path = path.as_ref();
            let archive = DatArchive::open(path)?;
            set.push(archive, archive_priority(path));
        }
        info!("Loaded {} archive(s)", set.len());
        Ok(set)
    }
}

impl<R: Read + Seek> ArchiveSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equal priorities keep insertion order
    pub fn push(&mut self, archive: DatArchive<R>, priority: i32) {
        let position = self
            .archives
            .iter()
            .position(|ranked| ranked.priority < priority)
            .unwrap_or(self.archives.len());
        self.archives
            .insert(position, RankedArchive { priority, archive });
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn archives(&self) -> impl Iterator<Item = &DatArchive<R>> {
        self.archives.iter().map(|ranked| &ranked.archive)
    }

    /// Union of member names, each listed once, in priority order
    pub fn list(&self) -> Vec<String> {
        first_seen(self.archives.iter().map(|ranked| ranked.archive.list()))
    }

    pub fn extract(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        for ranked in self.archives.iter_mut() {
            if ranked.archive.contains(name) {
                debug!(
                    "{} served from {:?} (priority {})",
                    normalise_name(name),
                    ranked.archive.path(),
                    ranked.priority
                );
                return ranked.archive.extract(name);
            }
        }
        Err(ArchiveError::NotFound(name.to_string()))
    }

    pub fn close(&mut self) {
        for ranked in self.archives.iter_mut() {
            ranked.archive.close();
        }
    }
}

impl<R: Read + Seek> AssetSource for ArchiveSet<R> {
    fn contains(&self, name: &str) -> bool {
        self.archives
            .iter()
            .any(|ranked| ranked.archive.contains(name))
    }

    fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        first_seen(
            self.archives
                .iter()
                .map(|ranked| ranked.archive.list_prefix(prefix)),
        )
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.extract(name)
    }
}

/// Flatten per-archive name lists, keeping the first occurrence of each name
fn first_seen<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<&'a str>>,
{
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|name| seen.insert(*name))
        .map(String::from)
        .collect()
}
