use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ferrous_font::PackSettings;
use serde::Deserialize;

/// Contents of a pack description file.
///
/// ```toml
/// font = "assets/fonts/Inter-Regular.ttf"
/// output = "assets/fonts/inter.ffont"
/// preview_png = "target/inter_atlas.png"
///
/// [charset]
/// chars = "€ñÑ"
/// ranges = [[32, 126]]
///
/// [settings]
/// font_size = 48.0
/// pixel_range = 6
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub font: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Name stored in the asset; defaults to the font file stem.
    pub name: Option<String>,
    pub preview_png: Option<PathBuf>,
    pub charset: Charset,
    pub log_level: String,
    pub settings: PackSettings,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            font: None,
            output: None,
            name: None,
            preview_png: None,
            charset: Charset::default(),
            log_level: "info".to_string(),
            settings: PackSettings::default(),
        }
    }
}

impl PackConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pack file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid pack file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Asset name: the configured one, else the font file stem.
    pub fn asset_name(&self, font: &Path) -> String {
        self.name.clone().unwrap_or_else(|| {
            font.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "font".to_string())
        })
    }
}

/// Characters to bake. Explicit characters come first, then the ranges in
/// order; an empty charset means printable ASCII.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Charset {
    pub chars: String,
    /// Inclusive `[first, last]` code point ranges.
    pub ranges: Vec<[u32; 2]>,
}

impl Charset {
    pub fn characters(&self) -> Vec<char> {
        if self.chars.is_empty() && self.ranges.is_empty() {
            return (' '..='~').collect();
        }
        let mut out: Vec<char> = self.chars.chars().collect();
        for &[first, last] in &self.ranges {
            // surrogates have no char and are skipped
            out.extend((first..=last).filter_map(char::from_u32));
        }
        out
    }
}
