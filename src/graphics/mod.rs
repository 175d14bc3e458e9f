//! Graphics handling for the game's art formats
//!
//! Palette loading, FRM sprite decoding and frame rendering.

pub mod frm;
pub mod palette;

pub use frm::{decode_frm, decode_frm_with, Direction, FrameAlignment, FrmError, Sprite, SpriteFrame};
pub use palette::{Palette, Rgb};
