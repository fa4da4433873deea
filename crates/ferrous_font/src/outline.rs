//! Glyph outline parsing from the `glyf` table.
//!
//! Simple glyphs are decoded straight into points; composite glyphs are
//! flattened by recursively parsing their components and applying each
//! component's affine transform, so a finished [`Glyph`] never refers to
//! another glyph.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use crate::binary_reader::*;
use crate::error::{FontError, Result};

// ── Data ───────────────────────────────────────────────────────────────────

/// A single outline point in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub on_curve: bool,
}

impl Point {
    pub const fn new(x: i32, y: i32, on_curve: bool) -> Self {
        Self { x, y, on_curve }
    }
}

/// Outline bounding box in font units, as stored in the glyph header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl Bounds {
    pub fn width(&self) -> i32 {
        self.x_max as i32 - self.x_min as i32
    }

    pub fn height(&self) -> i32 {
        self.y_max as i32 - self.y_min as i32
    }
}

/// A parsed glyph: flat point list plus the index of the last point of
/// every contour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    pub index: u16,
    pub contour_ends: Vec<u16>,
    pub points: Vec<Point>,
    pub bounds: Bounds,
}

impl Glyph {
    pub fn num_contours(&self) -> usize {
        self.contour_ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contour_ends.is_empty()
    }
}

// ── Flags ──────────────────────────────────────────────────────────────────

const ON_CURVE_POINT: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT_FLAG: u8 = 0x08;
const X_IS_SAME_OR_POSITIVE_SHORT: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE_SHORT: u8 = 0x20;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Composite nesting deeper than this is treated as a cycle.
const MAX_COMPONENT_DEPTH: usize = 32;

/// 2×2 matrix plus offset applied to a component's points.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ComponentTransform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    dx: f64,
    dy: f64,
}

impl ComponentTransform {
    fn apply(&self, p: Point) -> Point {
        let x = p.x as f64;
        let y = p.y as f64;
        Point {
            x: (self.a * x + self.c * y + self.dx).round() as i32,
            y: (self.b * x + self.d * y + self.dy).round() as i32,
            on_curve: p.on_curve,
        }
    }
}

// ── Parser ─────────────────────────────────────────────────────────────────

/// Reads glyphs out of a `glyf` table through a shared seekable reader.
///
/// Parsed glyphs are memoized by index: a composite that references the
/// same component several times (or two composites sharing an accent)
/// parses it exactly once.
pub struct GlyphParser<R> {
    reader: R,
    glyf_offset: u64,
    loca: Vec<u32>,
    cache: HashMap<u16, Glyph>,
}

impl<R: Read + Seek> GlyphParser<R> {
    /// `glyf_offset` is the absolute position of the `glyf` table in
    /// `reader`; `loca` holds `num_glyphs + 1` offsets relative to it.
    pub fn new(reader: R, glyf_offset: u64, loca: Vec<u32>) -> Self {
        Self {
            reader,
            glyf_offset,
            loca,
            cache: HashMap::new(),
        }
    }

    pub fn num_glyphs(&self) -> u16 {
        self.loca.len().saturating_sub(1) as u16
    }

    /// Number of glyphs parsed so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Parse glyph `index`, or return the cached result.
    pub fn parse(&mut self, index: u16) -> Result<&Glyph> {
        self.parse_nested(index, 0)?;
        self.cache
            .get(&index)
            .ok_or_else(|| FontError::format(format!("glyph {index} vanished from cache")))
    }

    fn parse_nested(&mut self, index: u16, depth: usize) -> Result<()> {
        if self.cache.contains_key(&index) {
            return Ok(());
        }
        if depth > MAX_COMPONENT_DEPTH {
            return Err(FontError::format(format!(
                "composite glyph nesting too deep at glyph {index} (cycle?)"
            )));
        }
        let count = self.num_glyphs();
        if index >= count {
            return Err(FontError::GlyphOutOfRange { index, count });
        }

        let start = self.loca[index as usize];
        let end = self.loca[index as usize + 1];
        let glyph = if start == end {
            Glyph {
                index,
                ..Glyph::default()
            }
        } else {
            self.reader
                .seek(SeekFrom::Start(self.glyf_offset + start as u64))?;
            self.read_glyph(index, depth)?
        };
        log::trace!(
            "parsed glyph {index}: {} contours, {} points",
            glyph.num_contours(),
            glyph.points.len()
        );
        self.cache.insert(index, glyph);
        Ok(())
    }

    fn read_glyph(&mut self, index: u16, depth: usize) -> Result<Glyph> {
        let eof = || FontError::eof("glyph header");
        let num_contours = read_i16_be(&mut self.reader).map_err(eof())?;
        let bounds = Bounds {
            x_min: read_i16_be(&mut self.reader).map_err(eof())?,
            y_min: read_i16_be(&mut self.reader).map_err(eof())?,
            x_max: read_i16_be(&mut self.reader).map_err(eof())?,
            y_max: read_i16_be(&mut self.reader).map_err(eof())?,
        };

        let (contour_ends, points) = if num_contours >= 0 {
            self.read_simple(index, num_contours as usize)?
        } else {
            self.read_composite(index, depth)?
        };

        Ok(Glyph {
            index,
            contour_ends,
            points,
            bounds,
        })
    }

    fn read_simple(&mut self, index: u16, num_contours: usize) -> Result<(Vec<u16>, Vec<Point>)> {
        let r = &mut self.reader;
        let mut contour_ends = Vec::with_capacity(num_contours);
        for _ in 0..num_contours {
            let end = read_u16_be(r).map_err(FontError::eof("contour end points"))?;
            if let Some(&prev) = contour_ends.last() {
                if end <= prev {
                    return Err(FontError::format(format!(
                        "glyph {index}: contour end points are not increasing ({prev} then {end})"
                    )));
                }
            }
            contour_ends.push(end);
        }
        let num_points = match contour_ends.last() {
            Some(&last) => last as usize + 1,
            None => return Ok((contour_ends, Vec::new())),
        };

        let instruction_len = read_u16_be(r).map_err(FontError::eof("instruction length"))?;
        r.seek(SeekFrom::Current(instruction_len as i64))?;

        let mut flags = Vec::with_capacity(num_points);
        while flags.len() < num_points {
            let flag = read_u8(r).map_err(FontError::eof("point flags"))?;
            flags.push(flag);
            if flag & REPEAT_FLAG != 0 {
                let repeat = read_u8(r).map_err(FontError::eof("point flags"))? as usize;
                if flags.len() + repeat > num_points {
                    return Err(FontError::format(format!(
                        "glyph {index}: flag repeat count {repeat} overruns {num_points} points"
                    )));
                }
                flags.extend(std::iter::repeat(flag).take(repeat));
            }
        }

        let xs = read_coordinates(r, &flags, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE_SHORT)?;
        let ys = read_coordinates(r, &flags, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE_SHORT)?;

        let points = flags
            .iter()
            .zip(xs.into_iter().zip(ys))
            .map(|(&flag, (x, y))| Point::new(x, y, flag & ON_CURVE_POINT != 0))
            .collect();
        Ok((contour_ends, points))
    }

    fn read_composite(&mut self, index: u16, depth: usize) -> Result<(Vec<u16>, Vec<Point>)> {
        let mut contour_ends: Vec<u16> = Vec::new();
        let mut points: Vec<Point> = Vec::new();

        loop {
            let r = &mut self.reader;
            let eof = || FontError::eof("composite component");
            let flags = read_u16_be(r).map_err(eof())?;
            let component = read_u16_be(r).map_err(eof())?;

            if flags & ARGS_ARE_XY_VALUES == 0 {
                return Err(FontError::Unsupported(format!(
                    "glyph {index}: composite components positioned by point matching"
                )));
            }
            let (dx, dy) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
                (
                    read_i16_be(r).map_err(eof())? as f64,
                    read_i16_be(r).map_err(eof())? as f64,
                )
            } else {
                (
                    read_i8(r).map_err(eof())? as f64,
                    read_i8(r).map_err(eof())? as f64,
                )
            };

            let scale_flags = flags & (WE_HAVE_A_SCALE | WE_HAVE_AN_X_AND_Y_SCALE | WE_HAVE_A_TWO_BY_TWO);
            if scale_flags.count_ones() > 1 {
                return Err(FontError::format(format!(
                    "glyph {index}: component has conflicting scale flags {flags:#06x}"
                )));
            }
            let mut t = ComponentTransform {
                a: 1.0,
                b: 0.0,
                c: 0.0,
                d: 1.0,
                dx,
                dy,
            };
            if flags & WE_HAVE_A_SCALE != 0 {
                t.a = read_f2dot14(r).map_err(eof())?;
                t.d = t.a;
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                t.a = read_f2dot14(r).map_err(eof())?;
                t.d = read_f2dot14(r).map_err(eof())?;
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                t.a = read_f2dot14(r).map_err(eof())?;
                t.b = read_f2dot14(r).map_err(eof())?;
                t.c = read_f2dot14(r).map_err(eof())?;
                t.d = read_f2dot14(r).map_err(eof())?;
            }

            // The component lives elsewhere in glyf; come back here afterwards.
            let resume = self.reader.stream_position()?;
            self.parse_nested(component, depth + 1)?;
            self.reader.seek(SeekFrom::Start(resume))?;

            let sub = &self.cache[&component];
            let base = points.len();
            for &end in &sub.contour_ends {
                let shifted = base + end as usize;
                let shifted = u16::try_from(shifted).map_err(|_| {
                    FontError::format(format!("glyph {index}: composite has too many points"))
                })?;
                contour_ends.push(shifted);
            }
            points.extend(sub.points.iter().map(|&p| t.apply(p)));

            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }
        Ok((contour_ends, points))
    }
}

/// Decode one axis of delta-encoded coordinates into absolute values.
fn read_coordinates<R: Read>(r: &mut R, flags: &[u8], short: u8, same_or_positive: u8) -> Result<Vec<i32>> {
    let mut value = 0i32;
    let mut out = Vec::with_capacity(flags.len());
    for &flag in flags {
        if flag & short != 0 {
            let delta = read_u8(r).map_err(FontError::eof("coordinates"))? as i32;
            if flag & same_or_positive != 0 {
                value += delta;
            } else {
                value -= delta;
            }
        } else if flag & same_or_positive == 0 {
            value += read_i16_be(r).map_err(FontError::eof("coordinates"))? as i32;
        }
        out.push(value);
    }
    Ok(out)
}
