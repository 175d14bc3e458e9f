mod common;

use std::io::Cursor;

use common::{build_archive, ramp_palette, FrameSpec, FrmBuilder};
use dat_scraper::archive::{ArchiveSet, DatArchive};
use dat_scraper::graphics::frm::{render_frame, render_strip, save_png, DirectionFrames};
use dat_scraper::graphics::{decode_frm, decode_frm_with, Direction, FrameAlignment, Palette, Rgb};

fn archive_set(members: &[(&str, &[u8], bool)]) -> ArchiveSet<Cursor<Vec<u8>>> {
    let mut set = ArchiveSet::new();
    let archive = DatArchive::from_reader(Cursor::new(build_archive(members))).unwrap();
    set.push(archive, 0);
    set
}

#[test]
fn blank_sprite_renders_transparent() {
    let frm = FrmBuilder::new(1)
        .direction(vec![FrameSpec::filled(4, 4, 0)])
        .build();
    let palette_bytes = ramp_palette();
    let mut set = archive_set(&[
        ("COLOR.PAL", palette_bytes.as_slice(), false),
        ("ART\\ITEMS\\BLANK.FRM", frm.as_slice(), true),
    ]);

    let palette = Palette::load(&mut set, "color.pal").unwrap();
    assert_eq!(palette.colour(255), Rgb { r: 252, g: 252, b: 252 });

    let data = set.extract("art/items/blank.frm").unwrap();
    let sprite = decode_frm(&data, &palette).unwrap();
    assert_eq!(sprite.frame_count(), 1);

    let frame = &sprite.frames_for(Direction::NorthEast)[0];
    assert_eq!((frame.width, frame.height), (4, 4));
    assert!(frame.is_blank());

    let image = render_frame(frame, &sprite.palette);
    assert_eq!(image.dimensions(), (4, 4));
    assert!(image.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn missing_palette_falls_back_to_grayscale() {
    let mut set = archive_set(&[("art/items/knife.frm", b"", false)]);
    assert_eq!(Palette::load(&mut set, "color.pal").unwrap(), Palette::grayscale());
}

#[test]
fn repeated_offsets_alias_earlier_directions() {
    let frm = FrmBuilder::new(2)
        .direction(vec![FrameSpec::filled(3, 1, 5), FrameSpec::filled(1, 2, 6)])
        .alias()
        .direction(vec![FrameSpec::filled(2, 2, 7), FrameSpec::filled(1, 1, 8)])
        .alias()
        .alias()
        .direction(vec![FrameSpec::filled(1, 3, 9), FrameSpec::filled(2, 1, 10)])
        .build();

    let sprite = decode_frm(&frm, &Palette::grayscale()).unwrap();
    assert_eq!(sprite.frame_count(), 6);
    assert_eq!(sprite.alias_of(Direction::East), Some(Direction::NorthEast));
    assert_eq!(sprite.alias_of(Direction::SouthWest), Some(Direction::SouthEast));
    assert_eq!(sprite.alias_of(Direction::West), Some(Direction::SouthEast));
    assert!(matches!(sprite.directions[5], DirectionFrames::Decoded(_)));

    assert_eq!(sprite.frames_for(Direction::East)[1].pixels, vec![6, 6]);
    assert_eq!(sprite.frames_for(Direction::West)[0].pixels, vec![7; 4]);

    // Padding after the 3-byte and 1-byte frames shifts the last direction
    let nw = sprite.frames_for(Direction::NorthWest);
    assert_eq!(nw.len(), 2);
    assert_eq!(nw[0].pixels, vec![9; 3]);
    assert_eq!(nw[1].pixels, vec![10; 2]);
    assert_eq!(nw[1].direction, Direction::NorthWest);

    assert_eq!(
        sprite.decoded_directions().collect::<Vec<_>>(),
        vec![Direction::NorthEast, Direction::SouthEast, Direction::NorthWest]
    );
}

#[test]
fn packed_layout_has_no_padding() {
    let mut builder = FrmBuilder::new(2)
        .direction(vec![FrameSpec::filled(3, 1, 1), FrameSpec::filled(1, 1, 2)])
        .direction(vec![FrameSpec::filled(1, 1, 3)]);
    builder.word_aligned = false;
    let frm = builder.build();

    let sprite = decode_frm_with(&frm, &Palette::grayscale(), FrameAlignment::Packed).unwrap();
    assert_eq!(sprite.frames_for(Direction::NorthEast)[1].pixels, vec![2]);
    assert_eq!(sprite.frames_for(Direction::East)[0].pixels, vec![3]);
}

#[test]
fn shifts_combine_with_frame_offsets() {
    let mut frame = FrameSpec::filled(2, 2, 1);
    frame.offset_x = -3;
    frame.offset_y = 4;
    let mut builder = FrmBuilder::new(1).direction(vec![frame]);
    builder.shift_x[0] = 10;
    builder.shift_y[0] = -20;

    let sprite = decode_frm(&builder.build(), &Palette::grayscale()).unwrap();
    let frame = &sprite.frames_for(Direction::NorthEast)[0];
    assert_eq!((frame.offset_x, frame.offset_y), (7, -16));
    assert_eq!((frame.frame_offset_x, frame.frame_offset_y), (-3, 4));
}

#[test]
fn strip_saves_as_png() {
    let frm = FrmBuilder::new(3)
        .direction(vec![
            FrameSpec::filled(2, 3, 1),
            FrameSpec::filled(4, 2, 2),
            FrameSpec::filled(1, 1, 0),
        ])
        .build();
    let sprite = decode_frm(&frm, &Palette::grayscale()).unwrap();
    let strip = render_strip(sprite.frames_for(Direction::NorthEast), &sprite.palette);
    assert_eq!(strip.dimensions(), (12, 3));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("walk").join("strip_ne.png");
    save_png(&strip, &path, false).unwrap();

    let reloaded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(reloaded.dimensions(), (12, 3));
    assert_eq!(reloaded.get_pixel(0, 0).0[3], 255);
    assert_eq!(reloaded.get_pixel(2, 0).0[3], 0);
    assert_eq!(reloaded.get_pixel(7, 1).0[3], 255);
    assert_eq!(reloaded.get_pixel(11, 2).0[3], 0);
}
