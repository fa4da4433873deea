//! Edge segments and the conversion of raw TrueType points into closed
//! contours.

use glam::DVec2;

use crate::error::{FontError, Result};
use crate::outline::Glyph;

// ── Edge segments ──────────────────────────────────────────────────────────

/// One piece of a contour, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeSegment {
    Linear(DVec2, DVec2),
    /// start, control, end
    Quadratic(DVec2, DVec2, DVec2),
}

impl EdgeSegment {
    pub fn start(&self) -> DVec2 {
        match *self {
            EdgeSegment::Linear(p0, _) | EdgeSegment::Quadratic(p0, _, _) => p0,
        }
    }

    pub fn end(&self) -> DVec2 {
        match *self {
            EdgeSegment::Linear(_, p1) => p1,
            EdgeSegment::Quadratic(_, _, p2) => p2,
        }
    }

    /// Point at parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f64) -> DVec2 {
        match *self {
            EdgeSegment::Linear(p0, p1) => p0.lerp(p1, t),
            EdgeSegment::Quadratic(p0, p1, p2) => p0.lerp(p1, t).lerp(p1.lerp(p2, t), t),
        }
    }

    /// Tangent direction at `t` (not normalised).
    pub fn direction(&self, t: f64) -> DVec2 {
        match *self {
            EdgeSegment::Linear(p0, p1) => p1 - p0,
            EdgeSegment::Quadratic(p0, p1, p2) => {
                let tangent = (p1 - p0).lerp(p2 - p1, t);
                // a control point sitting on an endpoint has no tangent there
                if tangent == DVec2::ZERO {
                    p2 - p0
                } else {
                    tangent
                }
            }
        }
    }

    /// Split into three pieces covering `[0, 1/3]`, `[1/3, 2/3]`, `[2/3, 1]`.
    pub fn split_in_thirds(&self) -> [EdgeSegment; 3] {
        match *self {
            EdgeSegment::Linear(p0, p1) => {
                let a = self.point(1.0 / 3.0);
                let b = self.point(2.0 / 3.0);
                [
                    EdgeSegment::Linear(p0, a),
                    EdgeSegment::Linear(a, b),
                    EdgeSegment::Linear(b, p1),
                ]
            }
            EdgeSegment::Quadratic(p0, p1, p2) => {
                let a = self.point(1.0 / 3.0);
                let b = self.point(2.0 / 3.0);
                [
                    EdgeSegment::Quadratic(p0, p0.lerp(p1, 1.0 / 3.0), a),
                    EdgeSegment::Quadratic(
                        a,
                        p0.lerp(p1, 5.0 / 9.0).lerp(p1.lerp(p2, 4.0 / 9.0), 0.5),
                        b,
                    ),
                    EdgeSegment::Quadratic(b, p1.lerp(p2, 2.0 / 3.0), p2),
                ]
            }
        }
    }
}

/// A closed loop of edge segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub edges: Vec<EdgeSegment>,
}

impl Contour {
    pub fn is_closed(&self) -> bool {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) => first.start() == last.end(),
            _ => true,
        }
    }
}

// ── Builder ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct ContourPoint {
    pos: DVec2,
    on_curve: bool,
}

/// Expand the implied on-curve points of a glyph.
///
/// Returns the expanded points together with recomputed contour end
/// indices; the glyph's own `contour_ends` no longer apply once midpoints
/// have been inserted.
fn expand_points(glyph: &Glyph) -> Result<(Vec<ContourPoint>, Vec<usize>)> {
    let mut out = Vec::with_capacity(glyph.points.len() * 2);
    let mut ends = Vec::with_capacity(glyph.contour_ends.len());
    let mut start = 0usize;
    for &end in &glyph.contour_ends {
        let end = end as usize;
        if end >= glyph.points.len() || end + 1 < start {
            return Err(FontError::format(format!(
                "glyph {}: contour end {end} outside {} points",
                glyph.index,
                glyph.points.len()
            )));
        }
        let raw = &glyph.points[start..=end];
        let n = raw.len();
        for (k, p) in raw.iter().enumerate() {
            let next = &raw[(k + 1) % n];
            out.push(ContourPoint {
                pos: DVec2::new(p.x as f64, p.y as f64),
                on_curve: p.on_curve,
            });
            if n > 1 && !p.on_curve && !next.on_curve {
                out.push(ContourPoint {
                    pos: DVec2::new(
                        (p.x as f64 + next.x as f64) * 0.5,
                        (p.y as f64 + next.y as f64) * 0.5,
                    ),
                    on_curve: true,
                });
            }
        }
        ends.push(out.len());
        start = end + 1;
    }
    Ok((out, ends))
}

fn contour_segments(points: &[ContourPoint]) -> Vec<EdgeSegment> {
    // a single point (or nothing) cannot enclose anything
    if points.len() < 2 {
        return Vec::new();
    }
    let Some(first_on) = points.iter().position(|p| p.on_curve) else {
        return Vec::new();
    };
    let n = points.len();
    let at = |j: usize| points[(first_on + j) % n];

    let mut edges = Vec::with_capacity(n);
    for j in 1..=n {
        let cur = at(j);
        if !cur.on_curve {
            continue;
        }
        let prev = at(j - 1);
        if prev.on_curve {
            if prev.pos != cur.pos {
                edges.push(EdgeSegment::Linear(prev.pos, cur.pos));
            }
        } else {
            edges.push(EdgeSegment::Quadratic(at(j - 2).pos, prev.pos, cur.pos));
        }
    }
    edges
}

/// Convert a glyph's flat point arrays into closed contours.
///
/// Degenerate contours (fewer than two points, or collapsing to a single
/// point) are dropped.
pub fn try_build_contours(glyph: &Glyph) -> Result<Vec<Contour>> {
    let (points, ends) = expand_points(glyph)?;
    let mut contours = Vec::with_capacity(ends.len());
    let mut start = 0;
    for end in ends {
        let edges = contour_segments(&points[start..end]);
        if !edges.is_empty() {
            contours.push(Contour { edges });
        }
        start = end;
    }
    Ok(contours)
}
