//! Readers for the DAT2 archives, FRM sprites and MAP scenes of the game's data files.

pub mod archive;
pub mod binary_utils;
pub mod config;
pub mod data;
pub mod graphics;
pub mod map;
pub mod progress;

pub use archive::{ArchiveError, ArchiveSet, AssetSource, DatArchive};
pub use config::ScraperConfig;
pub use data::PrototypeIndex;
pub use graphics::{decode_frm, decode_frm_with, Palette, Sprite};
pub use map::{parse_map, parse_map_with, MapData, MapError};
