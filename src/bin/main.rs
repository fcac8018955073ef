//! Sprite Atlas CLI
//!
//! Pack a directory of sprite images into a single atlas texture.

use clap::{Parser, Subcommand};
use sprite_atlas::{software_manager, AtlasConfig, AtlasEntry, OverflowPolicy};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sprite-atlas")]
#[command(author, version, about = "Pack sprite images into a texture atlas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack every image in a directory into one atlas PNG
    Pack {
        /// Directory containing sprite images
        #[arg(short, long)]
        input: PathBuf,

        /// Output atlas image path
        #[arg(short, long)]
        output: PathBuf,

        /// Atlas side length in pixels
        #[arg(long, default_value = "512")]
        atlas_size: u32,

        /// Tile size used for grid rows and columns
        #[arg(long, default_value = "16")]
        tile_size: u32,

        /// Normalize every sprite to the tile size
        #[arg(long)]
        enforce_tile_size: bool,

        /// Clip sprites that overflow the atlas instead of failing
        #[arg(long)]
        clip: bool,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },

    /// List sprites in a directory with their normalized tile sizes
    Info {
        /// Directory containing sprite images
        #[arg(short, long)]
        input: PathBuf,

        /// Tile size used for grid rows and columns
        #[arg(long, default_value = "16")]
        tile_size: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            input,
            output,
            atlas_size,
            tile_size,
            enforce_tile_size,
            clip,
            json,
        } => {
            let overflow = if clip {
                OverflowPolicy::Clip
            } else {
                OverflowPolicy::Reject
            };
            let config = AtlasConfig::default()
                .with_atlas_size(atlas_size)
                .with_tile_size(tile_size)
                .with_enforced_tile_size(enforce_tile_size)
                .with_overflow(overflow);
            pack_directory(&input, &output, config, json)?;
        }
        Commands::Info { input, tile_size } => {
            show_info(&input, tile_size)?;
        }
    }

    Ok(())
}

fn pack_directory(
    input: &Path,
    output: &Path,
    config: AtlasConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut atlas = software_manager(input, config);
    for file in list_images(input)? {
        atlas.add(&file, None)?;
    }

    if atlas.is_empty() {
        return Err(format!("no images found in {:?}", input).into());
    }

    atlas.save_atlas(output)?;

    let built = atlas.atlas()?.ok_or("atlas was not built")?;
    let layout: Vec<(&str, &AtlasEntry)> = built.entries().collect();

    if json {
        let mut map = serde_json::Map::new();
        for (id, entry) in &layout {
            map.insert(id.to_string(), serde_json::to_value(entry)?);
        }
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        let size = built.size() as f32;
        println!("Packed {} sprites into {}x{} atlas", layout.len(), built.size(), built.size());
        for (id, entry) in &layout {
            println!(
                "  {:<24} x={:<5} y={:<5} {}x{}",
                id,
                entry.x * size,
                entry.y * size,
                entry.w * size,
                entry.h * size
            );
        }
        println!("Exported atlas to {:?}", output);
    }

    Ok(())
}

fn show_info(input: &Path, tile_size: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = AtlasConfig::default().with_tile_size(tile_size);
    let mut atlas = software_manager(input, config);
    for file in list_images(input)? {
        atlas.add(&file, None)?;
    }

    println!("Sprites in {:?}:", input);
    for id in atlas.sprite_ids() {
        if let Some(sprite) = atlas.sprite(&id) {
            let (width, height) = sprite.source_size;
            let note = if sprite.size == tile_size { "" } else { "  (off-grid)" };
            println!("  {:<24} {}x{} -> {}px{}", id, width, height, sprite.size, note);
        }
    }

    Ok(())
}

/// Image file names in a directory, sorted so packing order is stable.
fn list_images(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_png = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        if path.is_file() && is_png {
            files.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    files.sort();
    Ok(files)
}
