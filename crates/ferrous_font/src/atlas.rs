//! Atlas assembly: glyph selection, packing and distance field rendering.

use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::config::PackSettings;
use crate::contour::{try_build_contours, Contour};
use crate::error::{FontError, Result};
use crate::font::TrueTypeFont;
use crate::msdf::coloring::color_edges;
use crate::msdf::FieldTransform;
use crate::outline::Bounds;
use crate::packer::{pack_smallest, PackItem, PackedPosition};

/// Placement and metrics of one character in the atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasGlyph {
    pub character: char,
    /// Bitmap size in pixels, border included.
    pub width: u16,
    pub height: u16,
    /// `[x, y, w, h]` normalised by the atlas edge.
    pub uv_rect: [f32; 4],
    /// Horizontal advance in pixels.
    pub advance: f32,
    pub left_bearing: f32,
}

/// A square RGBA8 MTSDF atlas and the glyphs it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct FontAtlas {
    pub edge: u32,
    /// Row-major RGBA8, top row first.
    pub pixels: Vec<u8>,
    pub glyphs: Vec<AtlasGlyph>,
    /// Tallest scaled outline, in pixels.
    pub max_glyph_height: f32,
    pub pixel_range: i32,
}

/// A glyph selected for the atlas, before rendering.
struct PreparedGlyph {
    character: char,
    contours: Vec<Contour>,
    bounds: Bounds,
    item: PackItem,
    advance: f32,
    left_bearing: f32,
}

impl PreparedGlyph {
    fn transform(&self, scale: f64, pixel_range: f64) -> FieldTransform {
        FieldTransform {
            scale,
            x_min: self.bounds.x_min as f64,
            y_max: self.bounds.y_max as f64,
            pixel_range,
        }
    }
}

impl FontAtlas {
    /// Build an atlas for `chars` (duplicates ignored, unmapped characters
    /// skipped with a warning).
    ///
    /// Any outline error aborts the whole build.
    pub fn build<R, I>(font: &mut TrueTypeFont<R>, chars: I, settings: &PackSettings) -> Result<Self>
    where
        R: Read + Seek,
        I: IntoIterator<Item = char>,
    {
        settings.validate()?;
        let units_per_em = font.units_per_em() as f64;
        let font_size = settings.font_size as f64;
        let scale = font_size / units_per_em;
        let range = settings.pixel_range as u32;
        // keep integer products exact before dividing
        let to_px = |units: i32| units as f64 * font_size / units_per_em;

        let mut seen = HashSet::new();
        let mut prepared = Vec::new();
        let mut max_glyph_height = 0.0f64;
        for c in chars {
            if !seen.insert(c) {
                continue;
            }
            let index = font.glyph_index(c);
            if index == 0 {
                log::warn!("character {c:?} (U+{:04X}) is not mapped by the font, skipping", c as u32);
                continue;
            }
            let glyph = font.glyph(index)?;
            let contours = try_build_contours(glyph)?;
            let bounds = glyph.bounds;
            let metrics = font.metrics(index)?;

            let border = 2 * range as u64;
            let (width, height) = if contours.is_empty() {
                (border, border)
            } else {
                max_glyph_height = max_glyph_height.max(to_px(bounds.height()));
                (
                    to_px(bounds.width()).ceil() as u64 + border,
                    to_px(bounds.height()).ceil() as u64 + border,
                )
            };
            let (Ok(w16), Ok(h16)) = (u16::try_from(width), u16::try_from(height)) else {
                return Err(FontError::Config(format!(
                    "glyph {c:?} is {width}x{height} pixels, font_size is too large"
                )));
            };

            prepared.push(PreparedGlyph {
                character: c,
                contours,
                bounds,
                item: PackItem::new(w16 as u32, h16 as u32),
                advance: to_px(metrics.advance_width as i32) as f32,
                left_bearing: to_px(metrics.left_side_bearing as i32) as f32,
            });
        }

        let items: Vec<PackItem> = prepared.iter().map(|g| g.item).collect();
        let (edge, positions) = pack_smallest(
            &items,
            settings.margin,
            settings.atlas_step,
            settings.max_atlas_size,
        )?;

        let pixels = render(&prepared, &positions, edge, scale, settings);

        let glyphs = prepared
            .iter()
            .zip(&positions)
            .map(|(g, p)| AtlasGlyph {
                character: g.character,
                width: g.item.width as u16,
                height: g.item.height as u16,
                uv_rect: [
                    p.x as f32 / edge as f32,
                    p.y as f32 / edge as f32,
                    g.item.width as f32 / edge as f32,
                    g.item.height as f32 / edge as f32,
                ],
                advance: g.advance,
                left_bearing: g.left_bearing,
            })
            .collect::<Vec<_>>();

        log::info!(
            "built {edge}x{edge} font atlas with {} glyphs at {}px",
            glyphs.len(),
            settings.font_size
        );

        Ok(Self {
            edge,
            pixels,
            glyphs,
            max_glyph_height: max_glyph_height as f32,
            pixel_range: settings.pixel_range,
        })
    }

    pub fn glyph(&self, c: char) -> Option<&AtlasGlyph> {
        self.glyphs.iter().find(|g| g.character == c)
    }

    /// Copy of the atlas as an image, for previews.
    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.edge, self.edge, |x, y| {
            let i = (y as usize * self.edge as usize + x as usize) * 4;
            image::Rgba([
                self.pixels[i],
                self.pixels[i + 1],
                self.pixels[i + 2],
                self.pixels[i + 3],
            ])
        })
    }
}

/// Glyphs render independently into their own buffers, then get copied into
/// the atlas in order.
#[cfg(not(target_arch = "wasm32"))]
fn render(
    glyphs: &[PreparedGlyph],
    positions: &[PackedPosition],
    edge: u32,
    scale: f64,
    settings: &PackSettings,
) -> Vec<u8> {
    use rayon::prelude::*;

    let range = settings.pixel_range as f64;
    let bitmaps: Vec<Vec<u8>> = glyphs
        .par_iter()
        .map(|g| {
            let colored = color_edges(&g.contours, settings.angle_threshold, settings.coloring_seed);
            crate::msdf::generate_msdf(&colored, &g.transform(scale, range), g.item.width, g.item.height)
        })
        .collect();

    let mut pixels = vec![0u8; edge as usize * edge as usize * 4];
    for ((g, p), bitmap) in glyphs.iter().zip(positions).zip(&bitmaps) {
        let row_len = g.item.width as usize * 4;
        for (row, src) in bitmap.chunks_exact(row_len).enumerate() {
            let dst = ((p.y as usize + row) * edge as usize + p.x as usize) * 4;
            pixels[dst..dst + row_len].copy_from_slice(src);
        }
    }
    pixels
}

#[cfg(target_arch = "wasm32")]
fn render(
    glyphs: &[PreparedGlyph],
    positions: &[PackedPosition],
    edge: u32,
    scale: f64,
    settings: &PackSettings,
) -> Vec<u8> {
    let range = settings.pixel_range as f64;
    let mut pixels = vec![0u8; edge as usize * edge as usize * 4];
    for (g, p) in glyphs.iter().zip(positions) {
        let colored = color_edges(&g.contours, settings.angle_threshold, settings.coloring_seed);
        crate::msdf::write_msdf(
            &colored,
            &g.transform(scale, range),
            g.item.width,
            g.item.height,
            &mut pixels,
            edge,
            p.x,
            p.y,
        );
    }
    pixels
}
