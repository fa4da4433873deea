//! Binary font asset: a named atlas plus its glyph table.
//!
//! Layout (little-endian):
//!
//! ```text
//! name              7-bit length prefixed UTF-8
//! max_glyph_height  f32
//! pixel_range       i32
//! edge              u32
//! pixels            edge * edge * 4 bytes, RGBA8 row-major
//! glyph_count       i32
//! glyphs            char u32, width u16, height u16, uv x y w h f32, advance f32, left_bearing f32
//! ```

use std::io::{Read, Write};

use crate::atlas::{AtlasGlyph, FontAtlas};
use crate::config::MAX_ATLAS_EDGE;
use crate::error::{FontError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct FontAsset {
    pub name: String,
    pub atlas: FontAtlas,
}

impl FontAsset {
    pub fn new(name: impl Into<String>, atlas: FontAtlas) -> Self {
        Self {
            name: name.into(),
            atlas,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let atlas = &self.atlas;
        write_prefixed_str(w, &self.name)?;
        w.write_all(&atlas.max_glyph_height.to_le_bytes())?;
        w.write_all(&atlas.pixel_range.to_le_bytes())?;
        w.write_all(&atlas.edge.to_le_bytes())?;
        w.write_all(&atlas.pixels)?;

        let count = i32::try_from(atlas.glyphs.len())
            .map_err(|_| FontError::format("too many glyphs for the asset format"))?;
        w.write_all(&count.to_le_bytes())?;
        for g in &atlas.glyphs {
            w.write_all(&(g.character as u32).to_le_bytes())?;
            w.write_all(&g.width.to_le_bytes())?;
            w.write_all(&g.height.to_le_bytes())?;
            for v in g.uv_rect {
                w.write_all(&v.to_le_bytes())?;
            }
            w.write_all(&g.advance.to_le_bytes())?;
            w.write_all(&g.left_bearing.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let name = read_prefixed_str(r)?;
        let max_glyph_height = f32::from_le_bytes(read_array(r)?);
        let pixel_range = i32::from_le_bytes(read_array(r)?);
        let edge = u32::from_le_bytes(read_array(r)?);
        // rejected before allocating
        if edge > MAX_ATLAS_EDGE {
            return Err(FontError::format(format!("atlas edge {edge} is implausibly large")));
        }
        let mut pixels = vec![0u8; edge as usize * edge as usize * 4];
        r.read_exact(&mut pixels).map_err(FontError::eof("atlas pixels"))?;

        let count = i32::from_le_bytes(read_array(r)?);
        let count = usize::try_from(count)
            .map_err(|_| FontError::format(format!("negative glyph count {count}")))?;
        let mut glyphs = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let code = u32::from_le_bytes(read_array(r)?);
            let character = char::from_u32(code)
                .ok_or_else(|| FontError::format(format!("invalid character code {code:#x}")))?;
            let width = u16::from_le_bytes(read_array(r)?);
            let height = u16::from_le_bytes(read_array(r)?);
            let mut uv_rect = [0f32; 4];
            for v in &mut uv_rect {
                *v = f32::from_le_bytes(read_array(r)?);
            }
            glyphs.push(AtlasGlyph {
                character,
                width,
                height,
                uv_rect,
                advance: f32::from_le_bytes(read_array(r)?),
                left_bearing: f32::from_le_bytes(read_array(r)?),
            });
        }

        Ok(Self {
            name,
            atlas: FontAtlas {
                edge,
                pixels,
                glyphs,
                max_glyph_height,
                pixel_range,
            },
        })
    }
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(FontError::eof("font asset"))?;
    Ok(buf)
}

/// Unsigned LEB128, seven bits per byte, low bits first.
fn write_7bit_len<W: Write>(w: &mut W, mut value: u32) -> Result<()> {
    while value >= 0x80 {
        w.write_all(&[(value as u8 & 0x7F) | 0x80])?;
        value >>= 7;
    }
    w.write_all(&[value as u8])?;
    Ok(())
}

fn read_7bit_len<R: Read>(r: &mut R) -> Result<u32> {
    let mut value = 0u32;
    for shift in (0..35).step_by(7) {
        let [byte] = read_array::<R, 1>(r)?;
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(FontError::format("string length prefix is longer than 5 bytes"))
}

fn write_prefixed_str<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let len = u32::try_from(s.len()).map_err(|_| FontError::format("font name too long"))?;
    write_7bit_len(w, len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn read_prefixed_str<R: Read>(r: &mut R) -> Result<String> {
    let len = read_7bit_len(r)?;
    let mut bytes = Vec::new();
    r.take(len as u64)
        .read_to_end(&mut bytes)
        .map_err(FontError::eof("font name"))?;
    if bytes.len() != len as usize {
        return Err(FontError::UnexpectedEof("font name"));
    }
    String::from_utf8(bytes).map_err(|_| FontError::format("font name is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_asset() -> FontAsset {
        let edge = 4;
        FontAsset::new(
            "Sample Sans",
            FontAtlas {
                edge,
                pixels: (0..edge * edge * 4).map(|i| i as u8).collect(),
                glyphs: vec![
                    AtlasGlyph {
                        character: 'A',
                        width: 3,
                        height: 2,
                        uv_rect: [0.0, 0.25, 0.75, 0.5],
                        advance: 10.5,
                        left_bearing: -1.25,
                    },
                    AtlasGlyph {
                        character: '€',
                        width: 1,
                        height: 1,
                        uv_rect: [0.75, 0.75, 0.25, 0.25],
                        advance: 4.0,
                        left_bearing: 0.0,
                    },
                ],
                max_glyph_height: 2.0,
                pixel_range: 4,
            },
        )
    }

    #[test]
    fn byte_layout() {
        let mut out = Vec::new();
        sample_asset().write_to(&mut out).unwrap();

        assert_eq!(out[0], 11);
        assert_eq!(&out[1..12], b"Sample Sans");
        assert_eq!(&out[12..16], &2.0f32.to_le_bytes());
        assert_eq!(&out[16..20], &4i32.to_le_bytes());
        assert_eq!(&out[20..24], &4u32.to_le_bytes());
        let glyphs = 24 + 64;
        assert_eq!(&out[glyphs..glyphs + 4], &2i32.to_le_bytes());
        assert_eq!(&out[glyphs + 4..glyphs + 8], &('A' as u32).to_le_bytes());
        assert_eq!(&out[glyphs + 8..glyphs + 10], &3u16.to_le_bytes());
        // two glyph records of 4 + 2 + 2 + 16 + 8 bytes
        assert_eq!(out.len(), glyphs + 4 + 2 * 32);
    }

    #[test]
    fn reads_back_what_was_written() {
        let asset = sample_asset();
        let mut out = Vec::new();
        asset.write_to(&mut out).unwrap();
        let back = FontAsset::read_from(&mut Cursor::new(out)).unwrap();
        assert_eq!(back, asset);
    }

    #[test]
    fn long_names_use_multi_byte_prefix() {
        let mut out = Vec::new();
        write_prefixed_str(&mut out, &"x".repeat(300)).unwrap();
        // 300 = 0b10_0101100
        assert_eq!(&out[..2], &[0xAC, 0x02]);
        assert_eq!(read_prefixed_str(&mut Cursor::new(out)).unwrap().len(), 300);
    }

    #[test]
    fn truncated_or_invalid_data_is_rejected() {
        let mut out = Vec::new();
        sample_asset().write_to(&mut out).unwrap();
        out.truncate(out.len() - 3);
        assert!(matches!(
            FontAsset::read_from(&mut Cursor::new(&out)),
            Err(FontError::UnexpectedEof(_))
        ));

        let bad_prefix = [0xFFu8; 6];
        assert!(matches!(
            FontAsset::read_from(&mut Cursor::new(&bad_prefix[..])),
            Err(FontError::Format(_))
        ));
    }
}
