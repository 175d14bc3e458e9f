#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

pub const OBJECT_SECTION_EMPTY: [u8; 4] = [0; 4];

/// DAT2 image with the data blobs first, then the index, then the trailer
pub fn build_archive(members: &[(&str, &[u8], bool)]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut index = (members.len() as u32).to_le_bytes().to_vec();

    for (name, contents, compressed) in members {
        let stored = if *compressed {
            zlib(contents)
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

pub fn zlib(contents: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents).unwrap();
    encoder.finish().unwrap()
}

/// 768-byte palette with entry `i` = (i/4, i/4, i/4) in 6-bit units
pub fn ramp_palette() -> Vec<u8> {
    (0..256).flat_map(|i| [(i / 4) as u8; 3]).collect()
}

pub struct FrameSpec {
    pub width: u16,
    pub height: u16,
    pub offset_x: i16,
    pub offset_y: i16,
    pub pixels: Vec<u8>,
}

impl FrameSpec {
    pub fn filled(width: u16, height: u16, value: u8) -> Self {
        FrameSpec {
            width,
            height,
            offset_x: 0,
            offset_y: 0,
            pixels: vec![value; width as usize * height as usize],
        }
    }
}

/// Builds FRM payloads. A `None` direction repeats the previous direction's offset.
pub struct FrmBuilder {
    pub fps: u16,
    pub frames_per_direction: u16,
    pub shift_x: [i16; 6],
    pub shift_y: [i16; 6],
    pub directions: Vec<Option<Vec<FrameSpec>>>,
    pub word_aligned: bool,
}

impl FrmBuilder {
    pub fn new(frames_per_direction: u16) -> Self {
        FrmBuilder {
            fps: 10,
            frames_per_direction,
            shift_x: [0; 6],
            shift_y: [0; 6],
            directions: Vec::new(),
            word_aligned: true,
        }
    }

    pub fn direction(mut self, frames: Vec<FrameSpec>) -> Self {
        self.directions.push(Some(frames));
        self
    }

    pub fn alias(mut self) -> Self {
        self.directions.push(None);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut offsets = [0u32; 6];
        let mut body = Vec::new();
        // Header offsets exclude alignment padding
        let mut unpadded = 0u32;

        for d in 0..6 {
            match self.directions.get(d) {
                Some(Some(frames)) => {
                    offsets[d] = unpadded;
                    for frame in frames {
                        body.extend_from_slice(&frame.width.to_be_bytes());
                        body.extend_from_slice(&frame.height.to_be_bytes());
                        body.extend_from_slice(&(frame.pixels.len() as u32).to_be_bytes());
                        body.extend_from_slice(&frame.offset_x.to_be_bytes());
                        body.extend_from_slice(&frame.offset_y.to_be_bytes());
                        body.extend_from_slice(&frame.pixels);
                        unpadded += 12 + frame.pixels.len() as u32;
                        if self.word_aligned {
                            let pad = (4 - frame.pixels.len() % 4) % 4;
                            body.extend(std::iter::repeat(0u8).take(pad));
                        }
                    }
                }
                Some(None) if d > 0 => offsets[d] = offsets[d - 1],
                _ => offsets[d] = if d > 0 { offsets[d - 1] } else { 0 },
            }
        }

        let mut out = Vec::new();
        out.extend_from_slice(&4u32.to_be_bytes());
        out.extend_from_slice(&self.fps.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&self.frames_per_direction.to_be_bytes());
        for v in self.shift_x {
            out.extend_from_slice(&v.to_be_bytes());
        }
        for v in self.shift_y {
            out.extend_from_slice(&v.to_be_bytes());
        }
        for v in offsets {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        assert_eq!(out.len(), 62);
        out.extend(body);
        out
    }
}

/// 236-byte map header
pub fn map_header(flags: u32, local_vars: u32, global_vars: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&19u32.to_be_bytes());
    let mut name = b"TESTMAP.MAP".to_vec();
    name.resize(16, 0);
    out.extend_from_slice(&name);
    for value in [15_050u32, 0, 3, local_vars] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&(-1i32).to_be_bytes());
    for value in [flags, 1, global_vars, 42, 0] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.resize(236, 0);
    out
}

/// One elevation grid with the given (index, floor, roof) squares set
pub fn tile_grid(squares: &[(usize, u16, u16)]) -> Vec<u8> {
    let mut words = vec![0u32; 10_000];
    for &(index, floor, roof) in squares {
        words[index] = (roof as u32) << 16 | floor as u32;
    }
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

pub fn empty_scripts() -> Vec<u8> {
    vec![0u8; 5 * 4]
}

/// A single script record; the kind comes from the top byte of `sid`
pub fn script_record(sid: i32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&sid.to_be_bytes());
    out.extend_from_slice(&(-1i32).to_be_bytes());
    let extra = match (sid as u32) >> 24 {
        1 => 8,
        2 => 4,
        _ => 0,
    };
    out.extend(std::iter::repeat(0u8).take(extra));
    for i in 0..14i32 {
        out.extend_from_slice(&(i * 10).to_be_bytes());
    }
    out
}

/// One 16-slot extent holding `sids`, followed by its (length, next) footer
pub fn script_extent(sids: &[i32], slot_sid: i32) -> Vec<u8> {
    let mut out = Vec::new();
    for slot in 0..16 {
        let sid = sids.get(slot).copied().unwrap_or(slot_sid);
        out.extend(script_record(sid));
    }
    out.extend_from_slice(&(sids.len() as u32).to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out
}

pub struct ObjectSpec {
    pub pid: u32,
    pub tile: i32,
    pub fid: u32,
    pub inventory: Vec<(u32, ObjectSpec)>,
    pub trailer: Vec<i32>,
}

impl ObjectSpec {
    pub fn new(pid: u32, tile: i32, trailer: Vec<i32>) -> Self {
        ObjectSpec {
            pid,
            tile,
            fid: 0,
            inventory: Vec::new(),
            trailer,
        }
    }

    pub fn with_fid(mut self, fid: u32) -> Self {
        self.fid = fid;
        self
    }

    pub fn holding(mut self, quantity: u32, item: ObjectSpec) -> Self {
        self.inventory.push((quantity, item));
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let base: [i32; 18] = [
            7,
            self.tile,
            1,
            2,
            3,
            4,
            0,
            2,
            self.fid as i32,
            0,
            0,
            self.pid as i32,
            -1,
            8,
            65536,
            0,
            -1,
            -1,
        ];
        for value in base {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out.extend_from_slice(&(self.inventory.len() as u32).to_be_bytes());
        out.extend_from_slice(&(self.inventory.len() as u32).to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        for (quantity, item) in &self.inventory {
            out.extend_from_slice(&quantity.to_be_bytes());
            out.extend(item.to_bytes());
        }
        for value in &self.trailer {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out
    }
}

/// Object section with a total and three per-elevation counts
pub fn object_section(elevations: [&[ObjectSpec]; 3]) -> Vec<u8> {
    let total: usize = elevations.iter().map(|objects| objects.len()).sum();
    let mut out = (total as u32).to_be_bytes().to_vec();
    for objects in elevations {
        out.extend_from_slice(&(objects.len() as u32).to_be_bytes());
        for object in objects {
            out.extend(object.to_bytes());
        }
    }
    out
}

/// Prototype record carrying only what the index reads: pid and subtype
pub fn prototype(pid: u32, subtype: u32) -> Vec<u8> {
    let mut out = vec![0u8; 36];
    out[..4].copy_from_slice(&pid.to_be_bytes());
    out[32..36].copy_from_slice(&subtype.to_be_bytes());
    out
}
