//! `TrueTypeFont`: the table set and glyph cache behind a single font file.

use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::error::{FontError, Result};
use crate::outline::{Glyph, GlyphParser};
use crate::tables::*;

/// Vertical metrics shared by every glyph, in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

/// A TrueType font opened for glyph extraction.
///
/// The metric tables are decoded up front; glyph outlines are read lazily
/// from `glyf` and cached by the embedded [`GlyphParser`].
pub struct TrueTypeFont<R> {
    units_per_em: u16,
    line: LineMetrics,
    hmtx: HmtxTable,
    cmap: CmapTable,
    glyphs: GlyphParser<R>,
}

impl TrueTypeFont<Cursor<Vec<u8>>> {
    /// Open a font held entirely in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::open(Cursor::new(data))
    }
}

impl<R: Read + Seek> TrueTypeFont<R> {
    pub fn open(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let directory = TableDirectory::read(&mut reader)?;

        let head = HeadTable::parse(&directory.load(&mut reader, b"head")?)?;
        let num_glyphs = parse_num_glyphs(&directory.load(&mut reader, b"maxp")?)?;
        let hhea = HheaTable::parse(&directory.load(&mut reader, b"hhea")?)?;
        let hmtx = HmtxTable::parse(
            &directory.load(&mut reader, b"hmtx")?,
            hhea.number_of_h_metrics,
            num_glyphs,
        )?;
        let cmap = CmapTable::parse(&directory.load(&mut reader, b"cmap")?)?;

        let glyf = directory.get(b"glyf")?.clone();
        let loca = parse_loca(
            &directory.load(&mut reader, b"loca")?,
            head.index_to_loc_format,
            num_glyphs,
            glyf.length,
        )?;

        log::debug!(
            "opened font: {num_glyphs} glyphs, {} units per em",
            head.units_per_em
        );

        Ok(Self {
            units_per_em: head.units_per_em,
            line: LineMetrics {
                ascender: hhea.ascender,
                descender: hhea.descender,
                line_gap: hhea.line_gap,
            },
            hmtx,
            cmap,
            glyphs: GlyphParser::new(reader, glyf.offset as u64, loca),
        })
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn line_metrics(&self) -> LineMetrics {
        self.line
    }

    pub fn num_glyphs(&self) -> u16 {
        self.glyphs.num_glyphs()
    }

    /// Glyph index mapped to `c`; 0 means unmapped.
    pub fn glyph_index(&self, c: char) -> u16 {
        self.cmap.glyph_index(c)
    }

    /// Parsed outline of glyph `index` (cached after the first call).
    pub fn glyph(&mut self, index: u16) -> Result<&Glyph> {
        self.glyphs.parse(index)
    }

    pub fn metrics(&self, index: u16) -> Result<HorizontalMetrics> {
        self.hmtx.get(index).ok_or(FontError::GlyphOutOfRange {
            index,
            count: self.num_glyphs(),
        })
    }
}
