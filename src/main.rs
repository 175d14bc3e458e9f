use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use dat_scraper::archive::{ArchiveSet, AssetSource, DatArchive};
use dat_scraper::config::ScraperConfig;
use dat_scraper::data::{ArtResolver, PrototypeIndex};
use dat_scraper::graphics::frm::{decode_frm_with, render_frame, render_strip, save_png, Direction, FrameAlignment};
use dat_scraper::graphics::Palette;
use dat_scraper::map::parse_map_with;

#[derive(Debug, Parser)]
#[command(name = "dat_scraper", version, about = "Read DAT2 archives, FRM sprites and MAP scenes")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List archive members with their sizes.
    List {
        /// Archive file (repeatable; patch000 > critter > master).
        #[arg(short, long, required = true)]
        archive: Vec<PathBuf>,
        /// Only list members under this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Extract one member to a file.
    Extract {
        #[arg(short, long, required = true)]
        archive: Vec<PathBuf>,
        member: String,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract every member of one archive into a directory.
    ExtractAll {
        #[arg(short, long)]
        archive: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Write JSON progress records to this file.
        #[arg(long)]
        progress: Option<PathBuf>,
    },

    /// Decode an FRM and write its frames as PNG files.
    Sprite {
        #[arg(short, long, required = true)]
        archive: Vec<PathBuf>,
        member: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Run oxipng over written files.
        #[arg(long, default_value_t = false)]
        optimise: bool,
        /// One strip per direction instead of one file per frame.
        #[arg(long, default_value_t = false)]
        strip: bool,
        /// Frame blocks are stored without 4-byte padding.
        #[arg(long, default_value_t = false)]
        packed: bool,
    },

    /// Decode a MAP and print its statistics.
    Map {
        #[arg(short, long, required = true)]
        archive: Vec<PathBuf>,
        member: String,
        /// Print the whole decoded map as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Also print the art members referenced by objects and tiles.
        #[arg(long, default_value_t = false)]
        art: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match ScraperConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ScraperConfig::default(),
    };

    let result = match cli.cmd {
        Command::List { archive, prefix } => list(&archive, prefix.as_deref()),
        Command::Extract {
            archive,
            member,
            output,
        } => extract(&archive, &member, &output),
        Command::ExtractAll {
            archive,
            output,
            progress,
        } => extract_all(&archive, &output, progress.as_deref()),
        Command::Sprite {
            archive,
            member,
            output,
            optimise,
            strip,
            packed,
        } => {
            let mut config = config;
            config.optimise_png |= optimise;
            if packed {
                config.frame_alignment = FrameAlignment::Packed;
            }
            sprite(&archive, &member, &output, strip, &config)
        }
        Command::Map {
            archive,
            member,
            json,
            art,
        } => map(&archive, &member, json, art, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn list(archives: &[PathBuf], prefix: Option<&str>) -> Result<(), Box<dyn Error>> {
    let set = ArchiveSet::from_paths(archives)?;
    let names = match prefix {
        Some(prefix) => set.names_with_prefix(prefix),
        None => set.list(),
    };

    for name in &names {
        let entry = set.archives().find_map(|archive| archive.entry(name));
        match entry {
            Some(entry) => println!(
                "{}\t{}\t{}{}",
                entry.name,
                entry.decompressed_size,
                entry.stored_size,
                if entry.is_compressed { "\tcompressed" } else { "" }
            ),
            None => println!("{}", name),
        }
    }
    info!("{} members", names.len());
    Ok(())
}

fn extract(archives: &[PathBuf], member: &str, output: &Path) -> Result<(), Box<dyn Error>> {
    let mut set = ArchiveSet::from_paths(archives)?;
    let data = set.extract(member)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, &data)?;
    println!("{} -> {} ({} bytes)", member, output.display(), data.len());
    Ok(())
}

fn extract_all(archive: &Path, output: &Path, progress: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let mut archive = DatArchive::open(archive)?;
    let written = archive.extract_all(output, progress)?;
    archive.close();
    println!("Extracted {} of {} members to {}", written, archive.len(), output.display());
    Ok(())
}

fn sprite(
    archives: &[PathBuf],
    member: &str,
    output: &Path,
    strip: bool,
    config: &ScraperConfig,
) -> Result<(), Box<dyn Error>> {
    let mut set = ArchiveSet::from_paths(archives)?;
    let palette = Palette::load(&mut set, &config.palette_member)?;
    let data = set.extract(member)?;
    let sprite = decode_frm_with(&data, &palette, config.frame_alignment)?;

    let stem = Path::new(member)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sprite".to_string());

    let mut written = 0;
    for direction in Direction::ALL.into_iter().take(sprite.directions.len()) {
        let frames = sprite.frames_for(direction);
        if frames.is_empty() {
            continue;
        }

        if strip {
            let path = output.join(format!("{}_{}.png", stem, direction.suffix()));
            save_png(&render_strip(frames, &sprite.palette), &path, config.optimise_png)?;
            written += 1;
        } else {
            for frame in frames {
                let path = output.join(format!(
                    "{}_{}_{}.png",
                    stem,
                    direction.suffix(),
                    frame.frame_index
                ));
                save_png(&render_frame(frame, &sprite.palette), &path, config.optimise_png)?;
                written += 1;
            }
        }
    }

    println!(
        "{}: {} frames, {} files written to {}",
        member,
        sprite.frame_count(),
        written,
        output.display()
    );
    Ok(())
}

fn map(
    archives: &[PathBuf],
    member: &str,
    json: bool,
    art: bool,
    config: &ScraperConfig,
) -> Result<(), Box<dyn Error>> {
    let mut set = ArchiveSet::from_paths(archives)?;
    let prototypes = PrototypeIndex::build(&mut set, &config.prototype_prefixes)?;
    let data = set.extract(member)?;
    let map = parse_map_with(&data, &prototypes, &config.map_options())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&map.stats())?);
        if let Some(truncation) = &map.truncation {
            println!(
                "truncated in {} at 0x{:x} ({} bytes left): {}",
                truncation.section, truncation.offset, truncation.remaining_bytes, truncation.reason
            );
        }
    }

    if art {
        let resolver = ArtResolver::load(&mut set)?;
        let mut members = BTreeSet::new();
        for object in &map.objects {
            members.extend(resolver.resolve_fid(object.fid));
        }
        for tile in &map.tiles {
            members.extend(resolver.resolve_tile(tile.floor_id));
            members.extend(resolver.resolve_tile(tile.roof_id));
        }
        for member in members {
            println!("{}", member);
        }
    }
    Ok(())
}
