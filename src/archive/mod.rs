//! DAT2 archive reading: trailer, index, and member extraction.

pub mod compression;
pub mod index;
pub mod set;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info, warn};

use crate::progress::write_progress;
use compression::inflate_or_stored;
pub use index::{normalise_name, ArchiveIndex, ArchiveIndexEntry, ArchiveTrailer, TRAILER_SIZE};
pub use set::{archive_priority, ArchiveSet};

#[derive(Debug)]
pub enum ArchiveError {
    Io(io::Error),
    Format(String),
    NotFound(String),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Io(e) => write!(f, "Archive I/O error: {}", e),
            ArchiveError::Format(msg) => write!(f, "Malformed archive: {}", msg),
            ArchiveError::NotFound(name) => write!(f, "Archive member not found: {}", name),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchiveError {
    fn from(error: io::Error) -> Self {
        ArchiveError::Io(error)
    }
}

/// Anything member bytes can be pulled from by name: a single archive or a prioritised set
pub trait AssetSource {
    fn contains(&self, name: &str) -> bool;
    fn names_with_prefix(&self, prefix: &str) -> Vec<String>;
    fn read(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError>;
}

pub struct DatArchive<R = BufReader<File>> {
    path: Option<PathBuf>,
    reader: Option<R>,
    index: ArchiveIndex,
    trailer: ArchiveTrailer,
    data_base: u64,
    file_len: u64,
}

impl DatArchive<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = Self::from_reader(BufReader::new(file))?;
        archive.path = Some(path.to_path_buf());

        info!(
            "Opened {} ({} members, {} bytes)",
            path.display(),
            archive.len(),
            archive.file_len
        );
        Ok(archive)
    }
}

impl<R: Read + Seek> DatArchive<R> {
    pub fn from_reader(mut reader: R) -> Result<Self, ArchiveError> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        if file_len < TRAILER_SIZE {
            return Err(ArchiveError::Format(format!(
                "File is {} bytes, too short for a trailer",
                file_len
            )));
        }

        reader.seek(SeekFrom::End(-(TRAILER_SIZE as i64)))?;
        let trailer = ArchiveTrailer {
            index_block_size: reader.read_u32::<LittleEndian>()?,
            total_data_size: reader.read_u32::<LittleEndian>()?,
        };

        if trailer.total_data_size as u64 > file_len {
            return Err(ArchiveError::Format(format!(
                "Declared data size {} exceeds file length {}",
                trailer.total_data_size, file_len
            )));
        }

        // Member offsets count from here; zero for a stand-alone archive
        let data_base = file_len - trailer.total_data_size as u64;
        let index_start = data_base + trailer.index_start()?;

        debug!(
            "Trailer: index block {} bytes at 0x{:x}, data size {}",
            trailer.index_block_size, index_start, trailer.total_data_size
        );

        reader.seek(SeekFrom::Start(index_start))?;
        let mut block = vec![0u8; trailer.index_block_size as usize];
        reader.read_exact(&mut block).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                ArchiveError::Format(format!("Index block runs past end of file: {}", e))
            }
            _ => ArchiveError::Io(e),
        })?;

        let index = ArchiveIndex::parse(&block)?;

        Ok(DatArchive {
            path: None,
            reader: Some(reader),
            index,
            trailer,
            data_base,
            file_len,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn trailer(&self) -> ArchiveTrailer {
        self.trailer
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Normalised member names in index order
    pub fn list(&self) -> Vec<&str> {
        self.index
            .entries()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn entries(&self) -> &[ArchiveIndexEntry] {
        self.index.entries()
    }

    pub fn entry(&self, name: &str) -> Option<&ArchiveIndexEntry> {
        self.index.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.get(name).is_some()
    }

    pub fn list_prefix(&self, prefix: &str) -> Vec<&str> {
        self.index
            .with_prefix(prefix)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Member bytes as stored, without inflating
    pub fn extract_raw(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .index
            .get(name)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(name.to_string()))?;
        self.read_stored(&entry)
    }

    pub fn extract(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .index
            .get(name)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(name.to_string()))?;

        let stored = self.read_stored(&entry)?;
        if entry.is_compressed {
            Ok(inflate_or_stored(&entry.name, stored, entry.decompressed_size))
        } else {
            if entry.stored_size != entry.decompressed_size {
                debug!(
                    "{}: uncompressed member with differing sizes ({} stored, {} declared)",
                    entry.name, entry.stored_size, entry.decompressed_size
                );
            }
            Ok(stored)
        }
    }

    fn read_stored(&mut self, entry: &ArchiveIndexEntry) -> Result<Vec<u8>, ArchiveError> {
        let start = self.data_base + entry.offset as u64;
        let end = start + entry.stored_size as u64;
        if end > self.file_len {
            return Err(ArchiveError::Format(format!(
                "{} spans 0x{:x}..0x{:x}, past end of file (0x{:x})",
                entry.name, start, end, self.file_len
            )));
        }

        let reader = self.reader.as_mut().ok_or_else(|| {
            ArchiveError::Io(io::Error::new(io::ErrorKind::Other, "Archive is closed"))
        })?;

        reader.seek(SeekFrom::Start(start))?;
        let mut stored = vec![0u8; entry.stored_size as usize];
        reader.read_exact(&mut stored)?;
        Ok(stored)
    }

    /// Write every member under `output_dir`, mirroring the archive's directory layout.
    /// Members that fail to decode are logged and skipped; I/O failures abort.
    pub fn extract_all(
        &mut self,
        output_dir: &Path,
        progress_path: Option<&Path>,
    ) -> Result<usize, ArchiveError> {
        fs::create_dir_all(output_dir)?;

        let names: Vec<String> = self.list().into_iter().map(String::from).collect();
        let total = names.len();
        let mut written = 0;

        for (i, name) in names.iter().enumerate() {
            if let Some(path) = progress_path {
                write_progress(path, i, total, "extract", name);
            }

            let Some(relative) = safe_relative_path(name) else {
                warn!("Skipping member with unsafe path {:?}", name);
                continue;
            };

            let data = match self.extract(name) {
                Ok(data) => data,
                Err(ArchiveError::Io(e)) => return Err(ArchiveError::Io(e)),
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            let target = output_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &data)?;
            written += 1;
        }

        if let Some(path) = progress_path {
            write_progress(path, total, total, "extract", "done");
        }
        info!("Extracted {}/{} members to {}", written, total, output_dir.display());
        Ok(written)
    }

    /// Release the underlying reader. Later reads fail with an I/O error.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("Closed archive {:?}", self.path);
        }
    }
}

impl<R: Read + Seek> AssetSource for DatArchive<R> {
    fn contains(&self, name: &str) -> bool {
        DatArchive::contains(self, name)
    }

    fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.list_prefix(prefix).into_iter().map(String::from).collect()
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.extract(name)
    }
}

fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    let safe = !name.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    safe.then_some(path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    /// (raw name, contents, store compressed)
    pub(crate) fn build_archive(members: &[(&str, &[u8], bool)]) -> Vec<u8> {
        let mut data = Vec::new();
        let mut index = (members.len() as u32).to_le_bytes().to_vec();

        for (name, contents, compressed) in members {
            let stored = if *compressed {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(contents).unwrap();
                encoder.finish().unwrap()
            } else {
                contents.to_vec()
            };

            index.extend_from_slice(&(name.len() as u32).to_le_bytes());
            index.extend_from_slice(name.as_bytes());
            index.push(*compressed as u8);
            index.extend_from_slice(&(contents.len() as u32).to_le_bytes());
            index.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            index.extend_from_slice(&(data.len() as u32).to_le_bytes());
            data.extend_from_slice(&stored);
        }

        let index_size = index.len() as u32;
        data.extend_from_slice(&index);
        let total = data.len() as u32 + 8;
        data.extend_from_slice(&index_size.to_le_bytes());
        data.extend_from_slice(&total.to_le_bytes());
        data
    }

    fn open(bytes: Vec<u8>) -> DatArchive<Cursor<Vec<u8>>> {
        DatArchive::from_reader(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn lists_normalised_names() {
        let mut archive = open(build_archive(&[
            ("ART\\ITEMS\\KNIFE.FRM", b"frm", false),
            ("COLOR.PAL", b"pal", false),
        ]));

        assert_eq!(archive.list(), vec!["art/items/knife.frm", "color.pal"]);
        assert_eq!(archive.list_prefix("art/"), vec!["art/items/knife.frm"]);
        assert!(archive.contains("Art\\Items\\Knife.frm"));
        assert_eq!(archive.extract("color.pal").unwrap(), b"pal");
    }

    #[test]
    fn inflates_compressed_members() {
        let contents = vec![42u8; 2000];
        let mut archive = open(build_archive(&[("maps/a.map", contents.as_slice(), true)]));

        let entry = archive.entry("maps/a.map").unwrap().clone();
        assert!(entry.is_compressed);
        assert!(entry.stored_size < 2000);

        assert_eq!(archive.extract("maps/a.map").unwrap(), contents);
        assert_eq!(archive.extract_raw("maps/a.map").unwrap().len(), entry.stored_size as usize);
    }

    #[test]
    fn missing_member_is_not_found() {
        let mut archive = open(build_archive(&[("a", b"1", false)]));
        assert!(matches!(archive.extract("b"), Err(ArchiveError::NotFound(_))));
    }

    #[test]
    fn empty_archive_has_no_members() {
        let archive = open(build_archive(&[]));
        assert!(archive.is_empty());
        assert!(archive.list().is_empty());
    }

    #[test]
    fn data_size_beyond_file_is_a_format_error() {
        let mut bytes = build_archive(&[("a", b"1", false)]);
        let len = bytes.len();
        bytes[len - 4..].copy_from_slice(&(len as u32 * 2).to_le_bytes());
        assert!(matches!(
            DatArchive::from_reader(Cursor::new(bytes)),
            Err(ArchiveError::Format(_))
        ));
    }

    #[test]
    fn tiny_file_is_a_format_error() {
        assert!(matches!(
            DatArchive::from_reader(Cursor::new(vec![0u8; 5])),
            Err(ArchiveError::Format(_))
        ));
    }

    #[test]
    fn member_past_end_of_file_is_a_format_error() {
        let mut bytes = build_archive(&[("a", b"1234", false)]);
        // stored size field of the only entry: count(4) + len(4) + "a"(1) + flag(1) + decompressed(4)
        let index_start = 4;
        let field = index_start + 4 + 4 + 1 + 1 + 4;
        bytes[field..field + 4].copy_from_slice(&5000u32.to_le_bytes());

        let mut archive = open(bytes);
        assert!(matches!(archive.extract("a"), Err(ArchiveError::Format(_))));
    }

    #[test]
    fn closed_archive_fails_reads() {
        let mut archive = open(build_archive(&[("a", b"1", false)]));
        archive.close();
        assert!(!archive.is_open());
        assert!(matches!(archive.extract("a"), Err(ArchiveError::Io(_))));
    }

    #[test]
    fn unsafe_paths_are_rejected() {
        assert!(safe_relative_path("art/items/knife.frm").is_some());
        assert!(safe_relative_path("../escape").is_none());
        assert!(safe_relative_path("/abs").is_none());
        assert!(safe_relative_path("").is_none());
    }
}
