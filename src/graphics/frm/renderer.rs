//! Renderer for decoded FRM frames
//!
//! Maps palette indices to RGBA and writes PNG files, optionally optimised with oxipng.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use log::{debug, warn};

use super::model::SpriteFrame;
use crate::graphics::palette::Palette;

#[derive(Debug)]
pub enum RenderError {
    Image(image::ImageError),
    Io(io::Error),
    Optimise(String),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Io(err)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Image(err)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Image(e) => write!(f, "Image error: {}", e),
            RenderError::Io(e) => write!(f, "I/O error: {}", e),
            RenderError::Optimise(msg) => write!(f, "PNG optimisation failed: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

/// Render a single frame; index 0 becomes fully transparent
pub fn render_frame(frame: &SpriteFrame, palette: &Palette) -> RgbaImage {
    let width = frame.width as u32;
    let height = frame.height as u32;
    let mut image = RgbaImage::new(width, height);

    for (i, &index) in frame.pixels.iter().enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        if y >= height {
            break;
        }
        image.put_pixel(x, y, Rgba(palette.rgba(index)));
    }

    image
}

/// Frames side by side, each in a cell as wide as the widest frame
pub fn render_strip(frames: &[SpriteFrame], palette: &Palette) -> RgbaImage {
    let cell_width = frames.iter().map(|f| f.width as u32).max().unwrap_or(0);
    let cell_height = frames.iter().map(|f| f.height as u32).max().unwrap_or(0);

    let mut strip = RgbaImage::new(cell_width * frames.len() as u32, cell_height);
    for (i, frame) in frames.iter().enumerate() {
        let rendered = render_frame(frame, palette);
        imageops::overlay(&mut strip, &rendered, (i as u32 * cell_width) as i64, 0);
    }

    strip
}

/// Save as PNG. With `optimise`, the file is rewritten through oxipng; a failed
/// optimisation leaves the unoptimised file in place.
pub fn save_png(image: &RgbaImage, path: &Path, optimise: bool) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if !optimise {
        image.save(path)?;
        return Ok(());
    }

    let temp_path = path.with_extension("temp.png");
    image.save(&temp_path)?;

    let mut options = oxipng::Options::from_preset(2);
    options.bit_depth_reduction = true;
    options.interlace = None;

    match oxipng::optimize(
        &oxipng::InFile::Path(temp_path.clone()),
        &oxipng::OutFile::Path(Some(path.to_path_buf())),
        &options,
    ) {
        Ok(_) => {
            let _ = fs::remove_file(&temp_path);
            debug!("Optimised {}", path.display());
            Ok(())
        }
        Err(e) => {
            fs::rename(&temp_path, path)?;
            warn!(
                "oxipng optimisation failed for {}: {}. File saved unoptimised.",
                path.display(),
                e
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::frm::Direction;

    fn frame(width: u16, height: u16, pixels: Vec<u8>) -> SpriteFrame {
        SpriteFrame {
            direction: Direction::NorthEast,
            frame_index: 0,
            width,
            height,
            offset_x: 0,
            offset_y: 0,
            frame_offset_x: 0,
            frame_offset_y: 0,
            pixels,
        }
    }

    #[test]
    fn renders_palette_colours_with_transparent_zero() {
        let image = render_frame(&frame(2, 1, vec![0, 100]), &Palette::grayscale());
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [100, 100, 100, 255]);
    }

    #[test]
    fn strip_uses_widest_frame_as_cell() {
        let frames = vec![frame(1, 1, vec![7]), frame(3, 2, vec![9; 6])];
        let strip = render_strip(&frames, &Palette::grayscale());
        assert_eq!(strip.dimensions(), (6, 2));
        assert_eq!(strip.get_pixel(0, 0).0, [7, 7, 7, 255]);
        assert_eq!(strip.get_pixel(1, 0).0[3], 0);
        assert_eq!(strip.get_pixel(3, 1).0, [9, 9, 9, 255]);
    }

    #[test]
    fn saves_png_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/frame.png");
        let image = render_frame(&frame(2, 2, vec![1, 2, 3, 4]), &Palette::grayscale());

        save_png(&image, &path, false).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded, image);
    }
}
