//! # Colour Palette
//!
//! 256 RGB triples stored as 6-bit channels. Each channel is scaled by four on load;
//! index 0 is treated as transparent when rendering.

use log::warn;
use serde::Serialize;

use crate::archive::{ArchiveError, AssetSource};

pub const PALETTE_SIZE: usize = 256;
pub const PALETTE_BYTES: usize = PALETTE_SIZE * 3;
pub const DEFAULT_PALETTE_MEMBER: &str = "color.pal";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colours: [Rgb; PALETTE_SIZE],
}

fn scale_channel(value: u8) -> u8 {
    (value as u16 * 4).min(255) as u8
}

impl Palette {
    /// Entry `i` is `(i, i, i)`; used when no palette member is available
    pub fn grayscale() -> Self {
        let mut colours = [Rgb::default(); PALETTE_SIZE];
        for (i, colour) in colours.iter_mut().enumerate() {
            let v = i as u8;
            *colour = Rgb { r: v, g: v, b: v };
        }
        Palette { colours }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ArchiveError> {
        if data.len() < PALETTE_BYTES {
            return Err(ArchiveError::Format(format!(
                "Palette data too short: {} < {}",
                data.len(),
                PALETTE_BYTES
            )));
        }

        let mut colours = [Rgb::default(); PALETTE_SIZE];
        for (colour, rgb) in colours.iter_mut().zip(data.chunks_exact(3)) {
            *colour = Rgb {
                r: scale_channel(rgb[0]),
                g: scale_channel(rgb[1]),
                b: scale_channel(rgb[2]),
            };
        }

        Ok(Palette { colours })
    }

    /// Load `member` from `source`, falling back to grayscale when the member is absent
    pub fn load<S: AssetSource + ?Sized>(source: &mut S, member: &str) -> Result<Self, ArchiveError> {
        match source.read(member) {
            Ok(data) => Self::from_bytes(&data),
            Err(ArchiveError::NotFound(_)) => {
                warn!("Palette {} not found, using grayscale", member);
                Ok(Self::grayscale())
            }
            Err(e) => Err(e),
        }
    }

    pub fn colour(&self, index: u8) -> Rgb {
        self.colours[index as usize]
    }

    pub fn rgba(&self, index: u8) -> [u8; 4] {
        let Rgb { r, g, b } = self.colour(index);
        let alpha = if index == 0 { 0 } else { 255 };
        [r, g, b, alpha]
    }

    pub fn colours(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.colours
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}
