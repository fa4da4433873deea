//! Guillotine bin packing of glyph bitmaps into a square atlas.
//!
//! Every attempt works on its own free list, so retrying at a larger size
//! always starts from a clean, empty atlas.

use crate::error::{FontError, Result};

/// Free area in the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Size of one glyph bitmap to place (without padding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackItem {
    pub width: u32,
    pub height: u32,
}

impl PackItem {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left corner of a placed glyph bitmap in atlas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedPosition {
    pub x: u32,
    pub y: u32,
}

/// One packing attempt at a fixed atlas size.
#[derive(Debug, Clone)]
pub struct GuillotinePacker {
    padding: u32,
    spaces: Vec<Rect>,
}

impl GuillotinePacker {
    pub fn new(edge: u32, padding: u32) -> Self {
        Self {
            padding,
            spaces: vec![Rect::new(0, 0, edge, edge)],
        }
    }

    /// Remaining free rectangles.
    pub fn free_spaces(&self) -> &[Rect] {
        &self.spaces
    }

    /// Place every item, returning positions in input order, or `None` if
    /// they do not all fit at this size. A failed attempt leaves the free
    /// list untouched.
    pub fn try_pack(&mut self, items: &[PackItem]) -> Option<Vec<PackedPosition>> {
        let padded = items
            .iter()
            .map(|i| Some((i.width.checked_add(self.padding)?, i.height.checked_add(self.padding)?)))
            .collect::<Option<Vec<_>>>()?;
        let mut spaces = self.spaces.clone();
        let mut positions = vec![PackedPosition::default(); items.len()];
        let mut remaining: Vec<usize> = (0..items.len()).collect();

        while !remaining.is_empty() {
            let (space_idx, slot) = best_fit(&spaces, &padded, &remaining)?;
            let item_idx = remaining.remove(slot);
            let (w, h) = padded[item_idx];
            let space = spaces[space_idx];

            positions[item_idx] = PackedPosition {
                x: space.x + self.padding / 2,
                y: space.y + self.padding / 2,
            };
            split(&mut spaces, space_idx, w, h);
        }
        self.spaces = spaces;
        Some(positions)
    }
}

/// Tightest (space, item) pair over padded sizes. An exact match ends the
/// search; ties keep the earliest pair in (space, item) order.
fn best_fit(spaces: &[Rect], padded: &[(u32, u32)], remaining: &[usize]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut best_score = u32::MAX;
    for (si, space) in spaces.iter().enumerate() {
        for (slot, &ii) in remaining.iter().enumerate() {
            let (w, h) = padded[ii];
            if w > space.width || h > space.height {
                continue;
            }
            if w == space.width && h == space.height {
                return Some((si, slot));
            }
            let score = (space.width - w).min(space.height - h);
            if score < best_score {
                best_score = score;
                best = Some((si, slot));
            }
        }
    }
    best
}

/// Replace the consumed space by its guillotine leftovers.
fn split(spaces: &mut Vec<Rect>, space_idx: usize, w: u32, h: u32) {
    let s = spaces.remove(space_idx);
    let (right, below) = if w as u64 * (s.height - h) as u64 <= h as u64 * (s.width - w) as u64 {
        (
            Rect::new(s.x + w, s.y, s.width - w, h),
            Rect::new(s.x, s.y + h, s.width, s.height - h),
        )
    } else {
        (
            Rect::new(s.x + w, s.y, s.width - w, s.height),
            Rect::new(s.x, s.y + h, w, s.height - h),
        )
    };
    let mut at = space_idx;
    for r in [right, below] {
        if !r.is_empty() {
            spaces.insert(at, r);
            at += 1;
        }
    }
}

/// Smallest square atlas edge (in steps of `step` from an area estimate)
/// that holds every item, together with the item positions.
pub fn pack_smallest(
    items: &[PackItem],
    padding: u32,
    step: u32,
    max_edge: u32,
) -> Result<(u32, Vec<PackedPosition>)> {
    if step == 0 {
        return Err(FontError::Config("atlas step must be positive".into()));
    }
    let area: u64 = items
        .iter()
        .map(|i| (i.width as u64 + padding as u64) * (i.height as u64 + padding as u64))
        .sum();
    let largest_side = items
        .iter()
        .map(|i| i.width.max(i.height) as u64 + padding as u64)
        .max()
        .unwrap_or(0);
    let start = ((area as f64).sqrt().ceil() as u64).max(largest_side).max(1);
    let mut edge = u32::try_from(start).map_err(|_| FontError::AtlasOverflow { max_edge })?;

    loop {
        if edge > max_edge {
            return Err(FontError::AtlasOverflow { max_edge });
        }
        if let Some(positions) = GuillotinePacker::new(edge, padding).try_pack(items) {
            log::debug!("packed {} glyphs into {edge}x{edge}", items.len());
            return Ok((edge, positions));
        }
        log::debug!("{} glyphs do not fit into {edge}x{edge}, retrying", items.len());
        edge = edge
            .checked_add(step)
            .ok_or(FontError::AtlasOverflow { max_edge })?;
    }
}
