use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use log::{debug, warn};

/// Cap on the up-front allocation taken from an untrusted size field
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

pub trait CompressionContainer {
    fn decompress(&self) -> Result<Vec<u8>, String>;
}

/// A flagged archive member: a zlib stream, or a bare DEFLATE stream in some patch archives
pub struct ZlibContainer<'a> {
    stored: &'a [u8],
    decompressed_size: usize,
}

impl<'a> ZlibContainer<'a> {
    pub fn new(stored: &'a [u8], decompressed_size: u32) -> Self {
        ZlibContainer {
            stored,
            decompressed_size: decompressed_size as usize,
        }
    }

    /// CMF/FLG check from RFC 1950
    pub fn has_zlib_header(data: &[u8]) -> bool {
        data.len() >= 2
            && data[0] & 0x0F == 8
            && u16::from_be_bytes([data[0], data[1]]) % 31 == 0
    }
}

impl CompressionContainer for ZlibContainer<'_> {
    fn decompress(&self) -> Result<Vec<u8>, String> {
        let mut decompressed = Vec::with_capacity(self.decompressed_size.min(MAX_PREALLOCATION));

        // One byte past the declared size is enough to detect a mismatch
        let limit = self.decompressed_size as u64 + 1;
        let result = if Self::has_zlib_header(self.stored) {
            ZlibDecoder::new(self.stored)
                .take(limit)
                .read_to_end(&mut decompressed)
        } else {
            DeflateDecoder::new(self.stored)
                .take(limit)
                .read_to_end(&mut decompressed)
        };

        result.map_err(|e| format!("Inflate failed after {} bytes: {}", decompressed.len(), e))?;
        Ok(decompressed)
    }
}

/// Inflate a flagged member. An unreadable stream yields the stored bytes unchanged.
pub fn inflate_or_stored(name: &str, stored: Vec<u8>, decompressed_size: u32) -> Vec<u8> {
    match ZlibContainer::new(&stored, decompressed_size).decompress() {
        Ok(data) => {
            if data.len() != decompressed_size as usize {
                warn!(
                    "{}: inflated to {} bytes, index declares {}",
                    name,
                    data.len(),
                    decompressed_size
                );
            } else {
                debug!("{}: inflated {} -> {} bytes", name, stored.len(), data.len());
            }
            data
        }
        Err(e) => {
            warn!("{}: {}; returning {} stored bytes", name, e, stored.len());
            stored
        }
    }
}
