//! Definitions of the TrueType tables the atlas pipeline reads, and the
//! parsers that decode them.
//!
//! Only `glyf` is streamed through the seekable reader; every other table
//! is small and is loaded into memory once.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use crate::binary_reader::*;
use crate::error::{FontError, Result};

/// A directory entry in the font file's table directory.
#[derive(Debug, Clone)]
pub struct TableRecord {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

fn tag_name(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// The sfnt offset table plus its table records.
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    tables: HashMap<[u8; 4], TableRecord>,
}

impl TableDirectory {
    /// Read the offset table and directory starting at the current position.
    /// Every record must lie inside the stream.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let eof = FontError::eof("table directory");
        let scaler_type = read_u32_be(reader).map_err(FontError::eof("table directory"))?;
        // 0x00010000 and 'true' are TrueType outlines; 'OTTO' is CFF which has no glyf.
        if scaler_type == u32::from_be_bytes(*b"OTTO") {
            return Err(FontError::Unsupported(
                "CFF outlines (OpenType 'OTTO') are not supported".into(),
            ));
        }
        let num_tables = read_u16_be(reader).map_err(eof)?;
        // searchRange, entrySelector, rangeShift
        reader.seek(SeekFrom::Current(6))?;

        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let mut tag = [0u8; 4];
            reader
                .read_exact(&mut tag)
                .map_err(FontError::eof("table record"))?;
            let checksum = read_u32_be(reader).map_err(FontError::eof("table record"))?;
            let offset = read_u32_be(reader).map_err(FontError::eof("table record"))?;
            let length = read_u32_be(reader).map_err(FontError::eof("table record"))?;
            records.push(TableRecord {
                tag,
                checksum,
                offset,
                length,
            });
        }

        let stream_len = reader.seek(SeekFrom::End(0))?;
        let mut tables = HashMap::with_capacity(records.len());
        for rec in records {
            if rec.offset as u64 + rec.length as u64 > stream_len {
                return Err(FontError::format(format!(
                    "table '{}' ({} bytes at {}) extends past end of file ({stream_len} bytes)",
                    tag_name(&rec.tag),
                    rec.length,
                    rec.offset
                )));
            }
            tables.insert(rec.tag, rec);
        }
        Ok(Self { tables })
    }

    pub fn get(&self, tag: &[u8; 4]) -> Result<&TableRecord> {
        self.tables
            .get(tag)
            .ok_or_else(|| FontError::MissingTable(tag_name(tag)))
    }

    /// Load a whole table into memory.
    pub fn load<R: Read + Seek>(&self, reader: &mut R, tag: &[u8; 4]) -> Result<Vec<u8>> {
        let rec = self.get(tag)?;
        reader.seek(SeekFrom::Start(rec.offset as u64))?;
        let mut data = vec![0u8; rec.length as usize];
        reader
            .read_exact(&mut data)
            .map_err(|_| FontError::format(format!("table '{}' extends past end of file", tag_name(tag))))?;
        Ok(data)
    }
}

// ── head ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct HeadTable {
    pub units_per_em: u16,
    pub index_to_loc_format: i16,
}

impl HeadTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let units_per_em =
            u16_at(data, 18).ok_or(FontError::UnexpectedEof("head table"))?;
        let index_to_loc_format =
            i16_at(data, 50).ok_or(FontError::UnexpectedEof("head table"))?;
        if units_per_em == 0 {
            return Err(FontError::format("head.unitsPerEm is zero"));
        }
        if !(0..=1).contains(&index_to_loc_format) {
            return Err(FontError::format(format!(
                "unknown head.indexToLocFormat {index_to_loc_format}"
            )));
        }
        Ok(Self {
            units_per_em,
            index_to_loc_format,
        })
    }
}

// ── maxp ───────────────────────────────────────────────────────────────────

/// Number of glyphs declared in `maxp`.
pub fn parse_num_glyphs(maxp: &[u8]) -> Result<u16> {
    u16_at(maxp, 4).ok_or(FontError::UnexpectedEof("maxp table"))
}

// ── hhea ───────────────────────────────────────────────────────────────────

/// Vertical line metrics, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub number_of_h_metrics: u16,
}

impl HheaTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let eof = || FontError::UnexpectedEof("hhea table");
        Ok(Self {
            ascender: i16_at(data, 4).ok_or_else(eof)?,
            descender: i16_at(data, 6).ok_or_else(eof)?,
            line_gap: i16_at(data, 8).ok_or_else(eof)?,
            number_of_h_metrics: u16_at(data, 34).ok_or_else(eof)?,
        })
    }
}

// ── hmtx ───────────────────────────────────────────────────────────────────

/// Horizontal metrics of one glyph, in font units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizontalMetrics {
    pub advance_width: u16,
    pub left_side_bearing: i16,
}

#[derive(Debug, Clone, Default)]
pub struct HmtxTable {
    metrics: Vec<HorizontalMetrics>,
}

impl HmtxTable {
    /// Glyphs past `number_of_h_metrics` repeat the last advance and only
    /// store their left side bearing.
    pub fn parse(data: &[u8], number_of_h_metrics: u16, num_glyphs: u16) -> Result<Self> {
        let long = number_of_h_metrics as usize;
        if long == 0 && num_glyphs > 0 {
            return Err(FontError::format("hhea.numberOfHMetrics is zero"));
        }
        let mut metrics = Vec::with_capacity(num_glyphs as usize);
        for i in 0..long.min(num_glyphs as usize) {
            let advance_width =
                u16_at(data, i * 4).ok_or(FontError::UnexpectedEof("hmtx table"))?;
            let left_side_bearing =
                i16_at(data, i * 4 + 2).ok_or(FontError::UnexpectedEof("hmtx table"))?;
            metrics.push(HorizontalMetrics {
                advance_width,
                left_side_bearing,
            });
        }
        let last_advance = metrics.last().map(|m| m.advance_width).unwrap_or(0);
        let lsb_base = long * 4;
        for i in metrics.len()..num_glyphs as usize {
            let left_side_bearing = i16_at(data, lsb_base + (i - long) * 2)
                .ok_or(FontError::UnexpectedEof("hmtx table"))?;
            metrics.push(HorizontalMetrics {
                advance_width: last_advance,
                left_side_bearing,
            });
        }
        Ok(Self { metrics })
    }

    pub fn get(&self, glyph_index: u16) -> Option<HorizontalMetrics> {
        self.metrics.get(glyph_index as usize).copied()
    }
}

// ── loca ───────────────────────────────────────────────────────────────────

/// Decode `loca` into `num_glyphs + 1` offsets relative to the start of
/// `glyf`. Offsets must be non-decreasing and stay inside `glyf`.
pub fn parse_loca(data: &[u8], format: i16, num_glyphs: u16, glyf_len: u32) -> Result<Vec<u32>> {
    let count = num_glyphs as usize + 1;
    let mut offsets = Vec::with_capacity(count);
    for i in 0..count {
        let off = if format == 0 {
            u16_at(data, i * 2).map(|v| v as u32 * 2)
        } else {
            u32_at(data, i * 4)
        }
        .ok_or(FontError::UnexpectedEof("loca table"))?;
        if let Some(&prev) = offsets.last() {
            if off < prev {
                return Err(FontError::format(format!(
                    "loca offsets decrease at glyph {i}"
                )));
            }
        }
        if off > glyf_len {
            return Err(FontError::format(format!(
                "loca offset {off} for glyph {i} is past the end of glyf ({glyf_len})"
            )));
        }
        offsets.push(off);
    }
    Ok(offsets)
}

// ── cmap ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SequentialGroup {
    start_char: u32,
    end_char: u32,
    start_glyph: u32,
}

#[derive(Debug, Clone)]
enum CmapSubtable {
    /// Format 4: segment mapping to delta values. `data` is the subtable.
    SegmentDelta { data: Vec<u8>, seg_count: usize },
    /// Format 12: segmented coverage.
    SegmentedCoverage(Vec<SequentialGroup>),
}

/// Character to glyph mapping.
#[derive(Debug, Clone)]
pub struct CmapTable {
    subtable: CmapSubtable,
}

impl CmapTable {
    /// Pick the best Unicode subtable: format 12 when available, otherwise a
    /// format 4 BMP subtable.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let num_subtables =
            u16_at(data, 2).ok_or(FontError::UnexpectedEof("cmap header"))? as usize;

        let mut format4 = None;
        let mut format12 = None;
        for i in 0..num_subtables {
            let rec = 4 + i * 8;
            let platform = u16_at(data, rec).ok_or(FontError::UnexpectedEof("cmap record"))?;
            let encoding =
                u16_at(data, rec + 2).ok_or(FontError::UnexpectedEof("cmap record"))?;
            let offset =
                u32_at(data, rec + 4).ok_or(FontError::UnexpectedEof("cmap record"))? as usize;
            let unicode = platform == 0 || (platform == 3 && (encoding == 1 || encoding == 10));
            if !unicode {
                continue;
            }
            match u16_at(data, offset) {
                Some(4) if format4.is_none() => format4 = Some(offset),
                Some(12) if format12.is_none() => format12 = Some(offset),
                _ => {}
            }
        }

        if let Some(offset) = format12 {
            return Ok(Self {
                subtable: Self::parse_format12(data, offset)?,
            });
        }
        if let Some(offset) = format4 {
            return Ok(Self {
                subtable: Self::parse_format4(data, offset)?,
            });
        }
        Err(FontError::Unsupported(
            "cmap has no Unicode format 4 or format 12 subtable".into(),
        ))
    }

    fn parse_format4(data: &[u8], offset: usize) -> Result<CmapSubtable> {
        let length =
            u16_at(data, offset + 2).ok_or(FontError::UnexpectedEof("cmap format 4"))? as usize;
        let sub = data
            .get(offset..offset + length)
            .ok_or(FontError::UnexpectedEof("cmap format 4"))?;
        let seg_count =
            u16_at(sub, 6).ok_or(FontError::UnexpectedEof("cmap format 4"))? as usize / 2;
        // endCode, pad, startCode, idDelta, idRangeOffset
        if sub.len() < 16 + seg_count * 8 {
            return Err(FontError::UnexpectedEof("cmap format 4 segments"));
        }
        Ok(CmapSubtable::SegmentDelta {
            data: sub.to_vec(),
            seg_count,
        })
    }

    fn parse_format12(data: &[u8], offset: usize) -> Result<CmapSubtable> {
        let num_groups =
            u32_at(data, offset + 12).ok_or(FontError::UnexpectedEof("cmap format 12"))? as usize;
        let mut groups = Vec::with_capacity(num_groups.min(4096));
        for g in 0..num_groups {
            let base = offset + 16 + g * 12;
            let eof = || FontError::UnexpectedEof("cmap format 12 group");
            let group = SequentialGroup {
                start_char: u32_at(data, base).ok_or_else(eof)?,
                end_char: u32_at(data, base + 4).ok_or_else(eof)?,
                start_glyph: u32_at(data, base + 8).ok_or_else(eof)?,
            };
            let last_glyph = group
                .end_char
                .checked_sub(group.start_char)
                .and_then(|span| group.start_glyph.checked_add(span));
            if !matches!(last_glyph, Some(id) if id <= u16::MAX as u32) {
                return Err(FontError::format(format!(
                    "cmap format 12 group {g} (U+{:04X}..U+{:04X} from glyph {}) is inverted or runs past glyph 65535",
                    group.start_char, group.end_char, group.start_glyph
                )));
            }
            groups.push(group);
        }
        Ok(CmapSubtable::SegmentedCoverage(groups))
    }

    /// Glyph index for `c`, or 0 (`.notdef`) when unmapped.
    pub fn glyph_index(&self, c: char) -> u16 {
        let code = c as u32;
        match &self.subtable {
            CmapSubtable::SegmentedCoverage(groups) => groups
                .iter()
                .find(|g| code >= g.start_char && code <= g.end_char)
                .and_then(|g| g.start_glyph.checked_add(code - g.start_char))
                .and_then(|id| u16::try_from(id).ok())
                .unwrap_or(0),
            CmapSubtable::SegmentDelta { data, seg_count } => {
                if code > 0xFFFF {
                    return 0;
                }
                Self::lookup_format4(data, *seg_count, code).unwrap_or(0)
            }
        }
    }

    fn lookup_format4(sub: &[u8], seg_count: usize, code: u32) -> Option<u16> {
        let end_codes = 14;
        let start_codes = end_codes + seg_count * 2 + 2;
        let id_deltas = start_codes + seg_count * 2;
        let id_range_offsets = id_deltas + seg_count * 2;

        for i in 0..seg_count {
            let end = u16_at(sub, end_codes + i * 2)? as u32;
            if code > end {
                continue;
            }
            let start = u16_at(sub, start_codes + i * 2)? as u32;
            if code < start {
                return None;
            }
            let delta = i16_at(sub, id_deltas + i * 2)? as i32;
            let range_offset_pos = id_range_offsets + i * 2;
            let range_offset = u16_at(sub, range_offset_pos)? as usize;
            if range_offset == 0 {
                return Some(((code as i32 + delta) & 0xFFFF) as u16);
            }
            // idRangeOffset is relative to its own position in the subtable.
            let pos = range_offset_pos + range_offset + (code - start) as usize * 2;
            let glyph = u16_at(sub, pos)?;
            if glyph == 0 {
                return Some(0);
            }
            return Some(((glyph as i32 + delta) & 0xFFFF) as u16);
        }
        None
    }
}
