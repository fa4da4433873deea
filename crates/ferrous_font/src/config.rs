use serde::{Deserialize, Serialize};

use crate::error::{FontError, Result};

/// Largest atlas edge a font asset may carry.
pub const MAX_ATLAS_EDGE: u32 = 1 << 15;

/// Parameters of one atlas build.
///
/// Every field has a default, so a `[settings]` table in a pack file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackSettings {
    /// Target em size in pixels.
    pub font_size: f32,
    /// Width of the distance ramp, in pixels. Also the border kept around
    /// every glyph bitmap.
    pub pixel_range: i32,
    /// Empty pixels between neighbouring glyph bitmaps.
    pub margin: u32,
    /// Growth of the atlas edge between packing attempts.
    pub atlas_step: u32,
    pub max_atlas_size: u32,
    /// Corner detection threshold for edge colouring, in radians.
    pub angle_threshold: f64,
    pub coloring_seed: u64,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            font_size: 32.0,
            pixel_range: 4,
            margin: 2,
            atlas_step: 4,
            max_atlas_size: 8192,
            angle_threshold: 3.0,
            coloring_seed: 0,
        }
    }
}

impl PackSettings {
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_pixel_range(mut self, pixel_range: i32) -> Self {
        self.pixel_range = pixel_range;
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_atlas_step(mut self, step: u32) -> Self {
        self.atlas_step = step;
        self
    }

    pub fn with_max_atlas_size(mut self, max_atlas_size: u32) -> Self {
        self.max_atlas_size = max_atlas_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(FontError::Config(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        // the border on both sides has to fit the u16 bitmap size
        if self.pixel_range <= 0 || self.pixel_range as u32 > u16::MAX as u32 / 2 {
            return Err(FontError::Config(format!(
                "pixel_range must be in 1..={}, got {}",
                u16::MAX / 2,
                self.pixel_range
            )));
        }
        if self.atlas_step == 0 {
            return Err(FontError::Config("atlas_step must be positive".into()));
        }
        if self.max_atlas_size == 0 || self.max_atlas_size > MAX_ATLAS_EDGE {
            return Err(FontError::Config(format!(
                "max_atlas_size must be in 1..={MAX_ATLAS_EDGE}, got {}",
                self.max_atlas_size
            )));
        }
        if self.margin >= self.max_atlas_size {
            return Err(FontError::Config(format!(
                "margin {} leaves no room in a {}px atlas",
                self.margin, self.max_atlas_size
            )));
        }
        Ok(())
    }
}
