//! Edge colouring for multi-channel distance fields.
//!
//! Every edge is assigned a subset of the R, G, B channels so that the two
//! edges meeting at a sharp corner never share two channels. The median of
//! the three channel distances then reproduces the corner exactly instead
//! of rounding it off.

use std::ops::BitAnd;

use crate::contour::{Contour, EdgeSegment};

/// Set of colour channels an edge contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeColor(u8);

impl EdgeColor {
    pub const BLACK: Self = Self(0);
    pub const RED: Self = Self(1);
    pub const GREEN: Self = Self(2);
    pub const YELLOW: Self = Self(3);
    pub const BLUE: Self = Self(4);
    pub const MAGENTA: Self = Self(5);
    pub const CYAN: Self = Self(6);
    pub const WHITE: Self = Self(7);

    pub fn has_red(self) -> bool {
        self.0 & Self::RED.0 != 0
    }

    pub fn has_green(self) -> bool {
        self.0 & Self::GREEN.0 != 0
    }

    pub fn has_blue(self) -> bool {
        self.0 & Self::BLUE.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitAnd for EdgeColor {
    type Output = EdgeColor;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// An edge together with its channel assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredEdge {
    pub segment: EdgeSegment,
    pub color: EdgeColor,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColoredContour {
    pub edges: Vec<ColoredEdge>,
}

/// Pick the next colour, consuming entropy from `seed`. The result never
/// equals `color` and, when `banned` is a single channel shared with
/// `color`, avoids it.
fn switch_color(color: &mut EdgeColor, seed: &mut u64, banned: EdgeColor) {
    let combined = *color & banned;
    if combined == EdgeColor::RED || combined == EdgeColor::GREEN || combined == EdgeColor::BLUE {
        *color = EdgeColor(combined.0 ^ EdgeColor::WHITE.0);
        return;
    }
    if *color == EdgeColor::BLACK || *color == EdgeColor::WHITE {
        const START: [EdgeColor; 3] = [EdgeColor::CYAN, EdgeColor::MAGENTA, EdgeColor::YELLOW];
        *color = START[(*seed % 3) as usize];
        *seed /= 3;
        return;
    }
    // rotate the two-channel colour by one or two channels
    let shifted = (color.0 as u32) << (1 + (*seed & 1));
    *color = EdgeColor(((shifted | (shifted >> 3)) & EdgeColor::WHITE.0 as u32) as u8);
    *seed >>= 1;
}

fn is_corner(a: glam::DVec2, b: glam::DVec2, cross_threshold: f64) -> bool {
    a.dot(b) <= 0.0 || a.perp_dot(b).abs() > cross_threshold
}

/// Maps `position` in `0..n` onto -1, 0, 1 with the middle third at 0.
fn symmetrical_trichotomy(position: usize, n: usize) -> i32 {
    let n = n.max(2) as f64;
    (3.0 + 2.875 * position as f64 / (n - 1.0) - 1.4375 + 0.5) as i32 - 3
}

/// Assign colours to every edge of `contours`.
///
/// `angle_threshold` (radians) is the largest direction change that is
/// still considered smooth; the conventional value is 3.0. Contours are
/// left untouched; new coloured copies are returned.
pub fn color_edges(contours: &[Contour], angle_threshold: f64, mut seed: u64) -> Vec<ColoredContour> {
    let cross_threshold = angle_threshold.sin();
    contours
        .iter()
        .map(|contour| color_contour(contour, cross_threshold, &mut seed))
        .collect()
}

fn color_contour(contour: &Contour, cross_threshold: f64, seed: &mut u64) -> ColoredContour {
    let edges = &contour.edges;
    if edges.is_empty() {
        return ColoredContour::default();
    }

    let mut corners = Vec::new();
    let mut prev_dir = edges[edges.len() - 1].direction(1.0).normalize_or_zero();
    for (i, edge) in edges.iter().enumerate() {
        let dir = edge.direction(0.0).normalize_or_zero();
        if is_corner(prev_dir, dir, cross_threshold) {
            corners.push(i);
        }
        prev_dir = edge.direction(1.0).normalize_or_zero();
    }

    let colored = |segment: EdgeSegment, color: EdgeColor| ColoredEdge { segment, color };

    match corners.len() {
        // smooth contour: every channel sees every edge
        0 => ColoredContour {
            edges: edges.iter().map(|&e| colored(e, EdgeColor::WHITE)).collect(),
        },
        // teardrop: spread three colours around the single corner
        1 => {
            let mut colors = [EdgeColor::WHITE; 3];
            switch_color(&mut colors[0], seed, EdgeColor::BLACK);
            colors[2] = colors[0];
            switch_color(&mut colors[2], seed, EdgeColor::BLACK);
            let corner = corners[0];
            let m = edges.len();
            if m >= 3 {
                let mut out = vec![colored(edges[0], EdgeColor::WHITE); m];
                for i in 0..m {
                    let idx = (corner + i) % m;
                    let slot = (1 + symmetrical_trichotomy(i, m)) as usize;
                    out[idx] = colored(edges[idx], colors[slot]);
                }
                ColoredContour { edges: out }
            } else {
                // too few edges to carry three colours: split them up
                let mut parts: Vec<EdgeSegment> = Vec::with_capacity(6);
                parts.extend(edges[0].split_in_thirds());
                if m >= 2 {
                    parts.extend(edges[1].split_in_thirds());
                    // keep the corner at the start of the colour sequence
                    if corner == 1 {
                        parts.rotate_left(3);
                    }
                    let palette = [colors[0], colors[0], colors[1], colors[1], colors[2], colors[2]];
                    ColoredContour {
                        edges: parts.into_iter().zip(palette).map(|(e, c)| colored(e, c)).collect(),
                    }
                } else {
                    ColoredContour {
                        edges: parts.into_iter().zip(colors).map(|(e, c)| colored(e, c)).collect(),
                    }
                }
            }
        }
        // switch colour at every corner; the last run must also differ
        // from the first one, which it meets at the starting corner
        corner_count => {
            let m = edges.len();
            let start = corners[0];
            let mut spline = 0;
            let mut color = EdgeColor::WHITE;
            switch_color(&mut color, seed, EdgeColor::BLACK);
            let initial = color;
            let mut out = vec![colored(edges[0], EdgeColor::WHITE); m];
            for i in 0..m {
                let idx = (start + i) % m;
                if spline + 1 < corner_count && corners[spline + 1] == idx {
                    spline += 1;
                    let banned = if spline == corner_count - 1 {
                        initial
                    } else {
                        EdgeColor::BLACK
                    };
                    switch_color(&mut color, seed, banned);
                }
                out[idx] = colored(edges[idx], color);
            }
            ColoredContour { edges: out }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn polygon(points: &[(f64, f64)]) -> Contour {
        let n = points.len();
        Contour {
            edges: (0..n)
                .map(|i| {
                    let (x0, y0) = points[i];
                    let (x1, y1) = points[(i + 1) % n];
                    EdgeSegment::Linear(DVec2::new(x0, y0), DVec2::new(x1, y1))
                })
                .collect(),
        }
    }

    fn shares_two_channels(a: EdgeColor, b: EdgeColor) -> bool {
        (a & b).bits().count_ones() >= 2
    }

    #[test]
    fn switch_color_never_repeats() {
        let mut seed = 12345;
        let mut color = EdgeColor::WHITE;
        for _ in 0..20 {
            let before = color;
            switch_color(&mut color, &mut seed, EdgeColor::BLACK);
            assert_ne!(before, color);
            assert_eq!(color.bits().count_ones(), 2);
        }
    }

    #[test]
    fn square_corners_get_distinct_colors() {
        let square = polygon(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let colored = color_edges(&[square], 3.0, 0);
        let edges = &colored[0].edges;
        assert_eq!(edges.len(), 4);
        for i in 0..4 {
            let a = edges[i].color;
            let b = edges[(i + 1) % 4].color;
            assert!(!shares_two_channels(a, b), "edges {i} and {} clash: {a:?} {b:?}", (i + 1) % 4);
        }
    }

    #[test]
    fn smooth_contour_is_white() {
        // a circle approximated by quadratics with continuous tangents
        let c = Contour {
            edges: vec![
                EdgeSegment::Quadratic(DVec2::new(0.0, 1.0), DVec2::new(1.0, 1.0), DVec2::new(1.0, 0.0)),
                EdgeSegment::Quadratic(DVec2::new(1.0, 0.0), DVec2::new(1.0, -1.0), DVec2::new(0.0, -1.0)),
                EdgeSegment::Quadratic(DVec2::new(0.0, -1.0), DVec2::new(-1.0, -1.0), DVec2::new(-1.0, 0.0)),
                EdgeSegment::Quadratic(DVec2::new(-1.0, 0.0), DVec2::new(-1.0, 1.0), DVec2::new(0.0, 1.0)),
            ],
        };
        let colored = color_edges(&[c], 3.0, 0);
        assert!(colored[0].edges.iter().all(|e| e.color == EdgeColor::WHITE));
    }

    #[test]
    fn teardrop_with_two_edges_is_split() {
        // two arcs, tangent at (10, 10), meeting at a sharp point at the origin
        let c = Contour {
            edges: vec![
                EdgeSegment::Quadratic(DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)),
                EdgeSegment::Quadratic(DVec2::new(10.0, 10.0), DVec2::new(10.0, 20.0), DVec2::new(0.0, 0.0)),
            ],
        };
        let colored = color_edges(&[c], 3.0, 0);
        let edges = &colored[0].edges;
        assert!(edges.len() == 6 || edges.len() == 2);
        // first and last edges meet at the corner and must not share a colour
        let first = edges[0].color;
        let last = edges[edges.len() - 1].color;
        assert_ne!(first, last);
    }

    #[test]
    fn coloring_is_deterministic() {
        let tri = polygon(&[(0.0, 0.0), (5.0, 10.0), (10.0, 0.0)]);
        let a = color_edges(&[tri.clone()], 3.0, 7);
        let b = color_edges(&[tri], 3.0, 7);
        assert_eq!(a, b);
    }
}
