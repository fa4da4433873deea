//! Bakes a TrueType font into a FerrousEngine MSDF font asset.
//!
//! Usage:
//!   ferrous-font-packer fonts.toml
//!   ferrous-font-packer --font Inter.ttf --output inter.ffont --png atlas.png -v

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ferrous_font::{FontAsset, FontAtlas, TrueTypeFont};
use log::LevelFilter;

use config::PackConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bake a .ttf font into an MSDF font asset", long_about = None)]
struct Args {
    /// Pack description (TOML). Flags below override its values.
    config: Option<PathBuf>,

    /// TrueType font to read
    #[arg(long)]
    font: Option<PathBuf>,

    /// Where to write the font asset
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Also write the atlas as a PNG
    #[arg(long)]
    png: Option<PathBuf>,

    /// Log debug output (packing attempts, glyph details)
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn setup_logging(level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("failed to install logger")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PackConfig::load(path)?,
        None => PackConfig::default(),
    };
    if let Some(font) = args.font {
        config.font = Some(font);
    }
    if let Some(output) = args.output {
        config.output = Some(output);
    }
    if let Some(png) = args.png {
        config.preview_png = Some(png);
    }

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        config
            .log_level
            .parse()
            .with_context(|| format!("unknown log level '{}'", config.log_level))?
    };
    setup_logging(level)?;

    let font_path = config.font.clone().context("no font given (use --font or `font = ...`)")?;
    let output = config.output.clone().context("no output given (use --output or `output = ...`)")?;

    let data = std::fs::read(&font_path)
        .with_context(|| format!("failed to read font {}", font_path.display()))?;
    let mut font = TrueTypeFont::from_bytes(data)
        .with_context(|| format!("failed to open font {}", font_path.display()))?;

    let chars = config.charset.characters();
    log::info!("packing {} characters from {}", chars.len(), font_path.display());
    let atlas = FontAtlas::build(&mut font, chars, &config.settings)
        .with_context(|| format!("failed to build atlas for {}", font_path.display()))?;

    if let Some(png) = &config.preview_png {
        atlas
            .to_image()
            .save(png)
            .with_context(|| format!("failed to write preview {}", png.display()))?;
        log::info!("wrote atlas preview {}", png.display());
    }

    // serialise fully before touching the output file
    let asset = FontAsset::new(config.asset_name(&font_path), atlas);
    let mut bytes = Vec::new();
    asset.write_to(&mut bytes)?;
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    log::info!(
        "wrote '{}' ({} glyphs, {}x{} atlas, {} bytes) to {}",
        asset.name,
        asset.atlas.glyphs.len(),
        asset.atlas.edge,
        asset.atlas.edge,
        bytes.len(),
        output.display()
    );
    Ok(())
}
