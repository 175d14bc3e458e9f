//! Parser for FRM sprite payloads

use std::io::Cursor;

use log::{debug, trace};

use super::{
    model::{DirectionFrames, FrmHeader, Sprite, SpriteFrame},
    Direction, FrameAlignment, FrmError, DIRECTION_COUNT, FRAME_HEADER_SIZE, FRM_HEADER_SIZE,
};
use crate::binary_utils::{read_i16_be, read_u16_be, read_u32_be, remaining, seek_to};
use crate::graphics::palette::Palette;

pub fn parse_frm(
    data: &[u8],
    palette: &Palette,
    alignment: FrameAlignment,
) -> Result<Sprite, FrmError> {
    if data.len() < FRM_HEADER_SIZE {
        return Err(FrmError::Truncated {
            needed: FRM_HEADER_SIZE,
            available: data.len(),
        });
    }

    let header = read_header(&mut Cursor::new(data))?;
    debug!(
        "FRM v{}: {} fps, {} frames/direction, offsets {:?}",
        header.version, header.fps, header.frames_per_direction, header.data_offsets
    );

    let mut directions: Vec<DirectionFrames> = Vec::with_capacity(DIRECTION_COUNT);
    // Padding inserted by earlier directions shifts every later direction
    let mut accumulated_padding = 0usize;

    for (d, direction) in Direction::ALL.into_iter().enumerate() {
        if d > 0 && header.data_offsets[d] == header.data_offsets[d - 1] {
            let target = match &directions[d - 1] {
                DirectionFrames::Alias(root) => *root,
                DirectionFrames::Decoded(_) => Direction::ALL[d - 1],
            };
            trace!("{} aliases {}", direction, target);
            directions.push(DirectionFrames::Alias(target));
            continue;
        }

        let start = FRM_HEADER_SIZE + header.data_offsets[d] as usize + accumulated_padding;
        let (frames, padding) = read_direction(data, start, direction, &header, alignment);
        accumulated_padding += padding;
        directions.push(DirectionFrames::Decoded(frames));
    }

    Ok(Sprite {
        header,
        directions,
        palette: palette.clone(),
    })
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<FrmHeader, FrmError> {
    let version = read_u32_be(cursor)?;
    let fps = read_u16_be(cursor)?;
    let action_frame = read_u16_be(cursor)?;
    let frames_per_direction = read_u16_be(cursor)?;

    let mut shift_x = [0i16; DIRECTION_COUNT];
    for value in shift_x.iter_mut() {
        *value = read_i16_be(cursor)?;
    }
    let mut shift_y = [0i16; DIRECTION_COUNT];
    for value in shift_y.iter_mut() {
        *value = read_i16_be(cursor)?;
    }
    let mut data_offsets = [0u32; DIRECTION_COUNT];
    for value in data_offsets.iter_mut() {
        *value = read_u32_be(cursor)?;
    }
    let total_data_size = read_u32_be(cursor)?;

    Ok(FrmHeader {
        version,
        fps,
        action_frame,
        frames_per_direction,
        shift_x,
        shift_y,
        data_offsets,
        total_data_size,
    })
}

/// Read up to `frames_per_direction` frames starting at `start`.
/// Returns the frames read and the padding bytes skipped between them.
fn read_direction(
    data: &[u8],
    start: usize,
    direction: Direction,
    header: &FrmHeader,
    alignment: FrameAlignment,
) -> (Vec<SpriteFrame>, usize) {
    let mut frames = Vec::new();
    let mut padding_total = 0usize;

    let mut cursor = Cursor::new(data);
    if let Err(e) = seek_to(&mut cursor, start as u64) {
        debug!("{}: data offset past end of payload: {}", direction, e);
        return (frames, padding_total);
    }

    for frame_index in 0..header.frames_per_direction as usize {
        let Some((frame, stored_size)) = read_frame(&mut cursor, direction, frame_index, header)
        else {
            debug!(
                "{}: stopped after {} of {} frames",
                direction, frame_index, header.frames_per_direction
            );
            break;
        };
        frames.push(frame);

        let padding = alignment.padding(stored_size);
        if padding > remaining(&cursor) {
            break;
        }
        cursor.set_position(cursor.position() + padding as u64);
        padding_total += padding;
    }

    (frames, padding_total)
}

/// Stored pixel blocks may fall short of `width * height` by at most the alignment slack
const MAX_PIXEL_SHORTFALL: usize = 3;

/// Returns the frame and its stored pixel byte count
fn read_frame(
    cursor: &mut Cursor<&[u8]>,
    direction: Direction,
    frame_index: usize,
    header: &FrmHeader,
) -> Option<(SpriteFrame, usize)> {
    if remaining(cursor) < FRAME_HEADER_SIZE {
        return None;
    }

    let width = read_u16_be(cursor).ok()?;
    let height = read_u16_be(cursor).ok()?;
    let size = read_u32_be(cursor).ok()? as usize;
    let frame_offset_x = read_i16_be(cursor).ok()?;
    let frame_offset_y = read_i16_be(cursor).ok()?;

    if width == 0 || height == 0 {
        trace!("{} frame {}: empty dimensions {}x{}", direction, frame_index, width, height);
        return None;
    }

    let pixel_count = width as usize * height as usize;
    if pixel_count > size + MAX_PIXEL_SHORTFALL {
        trace!(
            "{} frame {}: {}x{} needs {} pixels, only {} stored",
            direction,
            frame_index,
            width,
            height,
            pixel_count,
            size
        );
        return None;
    }
    if size > remaining(cursor) {
        trace!(
            "{} frame {}: {} pixel bytes overrun payload ({} left)",
            direction,
            frame_index,
            size,
            remaining(cursor)
        );
        return None;
    }

    let start = cursor.position() as usize;
    let stored = &cursor.get_ref()[start..start + size];
    cursor.set_position((start + size) as u64);

    let mut pixels = vec![0u8; pixel_count];
    let copied = stored.len().min(pixel_count);
    pixels[..copied].copy_from_slice(&stored[..copied]);

    let d = direction.index();
    Some((
        SpriteFrame {
            direction,
            frame_index,
            width,
            height,
            offset_x: header.shift_x[d].wrapping_add(frame_offset_x),
            offset_y: header.shift_y[d].wrapping_add(frame_offset_y),
            frame_offset_x,
            frame_offset_y,
            pixels,
        },
        size,
    ))
}
