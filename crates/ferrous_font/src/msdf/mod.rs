//! Multi-channel true signed distance field (MTSDF) generation.
//!
//! R, G and B hold per-channel pseudo-distances to the coloured edges (see
//! [`coloring`]); A holds the true signed distance. Values are encoded as
//! `distance_in_pixels / pixel_range + 0.5`, so 0.5 (≈128) is the outline,
//! larger is inside and smaller is outside.

pub mod coloring;
pub mod distance;
pub mod equation;

use glam::DVec2;

use coloring::{ColoredContour, ColoredEdge};
use distance::SignedDistance;

/// Maps glyph bitmap pixels to font units.
///
/// The bitmap has a `pixel_range` wide border around the scaled outline
/// box, so the field can fade out before reaching the bitmap edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldTransform {
    /// Pixels per font unit.
    pub scale: f64,
    pub x_min: f64,
    pub y_max: f64,
    pub pixel_range: f64,
}

impl FieldTransform {
    /// Centre of pixel `(px, py)` in font units. Bitmap rows go down, font
    /// y goes up.
    pub fn to_shape(&self, px: u32, py: u32) -> DVec2 {
        DVec2::new(
            (px as f64 + 0.5 - self.pixel_range) / self.scale + self.x_min,
            self.y_max - (py as f64 + 0.5 - self.pixel_range) / self.scale,
        )
    }

    /// Encode a distance in font units as an 8-bit channel value.
    pub fn encode(&self, distance: f64) -> u8 {
        let v = (distance * self.scale / self.pixel_range + 0.5).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    }
}

/// Closest edge found so far for one colour channel.
#[derive(Clone, Copy)]
struct ChannelHit<'a> {
    distance: SignedDistance,
    edge: Option<&'a ColoredEdge>,
    param: f64,
}

impl<'a> ChannelHit<'a> {
    fn none() -> Self {
        Self {
            distance: SignedDistance::INFINITE,
            edge: None,
            param: 0.0,
        }
    }

    fn offer(&mut self, distance: SignedDistance, edge: &'a ColoredEdge, param: f64) {
        if distance.is_closer_than(&self.distance) {
            *self = ChannelHit {
                distance,
                edge: Some(edge),
                param,
            };
        }
    }

    /// Pseudo-distance of the selected edge, or `fallback` when no edge of
    /// this channel exists.
    fn resolve(&self, origin: DVec2, fallback: f64) -> f64 {
        match self.edge {
            Some(edge) => {
                let mut d = self.distance;
                edge.segment.distance_to_pseudo_distance(&mut d, origin, self.param);
                d.distance
            }
            None => fallback,
        }
    }
}

fn median(a: f64, b: f64, c: f64) -> f64 {
    a.min(b).max(a.max(b).min(c))
}

/// Evaluate `[r, g, b, true]` signed distances (font units) at `origin`.
///
/// The sign of the true distance comes from the nonzero winding rule, so
/// overlapping components of composite glyphs are handled. When the
/// median of the colour channels disagrees with it (overlaps, reversed
/// contours), the colour channels fall back to the true distance.
pub fn evaluate(contours: &[ColoredContour], origin: DVec2) -> [f64; 4] {
    let mut r = ChannelHit::none();
    let mut g = ChannelHit::none();
    let mut b = ChannelHit::none();
    let mut closest = SignedDistance::INFINITE;
    let mut winding = 0;

    for contour in contours {
        for edge in &contour.edges {
            let (d, t) = edge.segment.signed_distance(origin);
            if d.is_closer_than(&closest) {
                closest = d;
            }
            if edge.color.has_red() {
                r.offer(d, edge, t);
            }
            if edge.color.has_green() {
                g.offer(d, edge, t);
            }
            if edge.color.has_blue() {
                b.offer(d, edge, t);
            }
            winding += edge.segment.winding(origin);
        }
    }

    let inside = winding != 0;
    let true_distance = if inside {
        closest.distance.abs()
    } else {
        -closest.distance.abs()
    };

    let mut rgb = [
        r.resolve(origin, true_distance),
        g.resolve(origin, true_distance),
        b.resolve(origin, true_distance),
    ];
    let med = median(rgb[0], rgb[1], rgb[2]);
    if med != 0.0 && (med > 0.0) != inside {
        rgb = [true_distance; 3];
    }
    [rgb[0], rgb[1], rgb[2], true_distance]
}

/// Render a `width × height` glyph field into `target`, a row-major RGBA8
/// buffer `stride` pixels wide, with the glyph's top-left corner at
/// `(x0, y0)`. Pixels outside the glyph rectangle are not touched.
///
/// A glyph without contours is written as fully outside (all zeros).
#[allow(clippy::too_many_arguments)]
pub fn write_msdf(
    contours: &[ColoredContour],
    transform: &FieldTransform,
    width: u32,
    height: u32,
    target: &mut [u8],
    stride: u32,
    x0: u32,
    y0: u32,
) {
    let empty = contours.iter().all(|c| c.edges.is_empty());
    for py in 0..height {
        let row = ((y0 + py) as usize * stride as usize + x0 as usize) * 4;
        let row = &mut target[row..row + width as usize * 4];
        for (px, pixel) in row.chunks_exact_mut(4).enumerate() {
            if empty {
                pixel.copy_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let origin = transform.to_shape(px as u32, py);
            let d = evaluate(contours, origin);
            for (out, value) in pixel.iter_mut().zip(d) {
                *out = transform.encode(value);
            }
        }
    }
}

/// Render a glyph field into its own tightly packed RGBA8 buffer.
pub fn generate_msdf(contours: &[ColoredContour], transform: &FieldTransform, width: u32, height: u32) -> Vec<u8> {
    let mut out = vec![0u8; width as usize * height as usize * 4];
    write_msdf(contours, transform, width, height, &mut out, width, 0, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::coloring::color_edges;
    use super::*;
    use crate::contour::{Contour, EdgeSegment};

    /// Clockwise (TrueType orientation) triangle.
    fn triangle() -> Vec<ColoredContour> {
        let p = [DVec2::new(0.0, 0.0), DVec2::new(50.0, 100.0), DVec2::new(100.0, 0.0)];
        let contour = Contour {
            edges: (0..3).map(|i| EdgeSegment::Linear(p[i], p[(i + 1) % 3])).collect(),
        };
        color_edges(&[contour], 3.0, 0)
    }

    #[test]
    fn inside_positive_outside_negative() {
        let shape = triangle();
        let inside = evaluate(&shape, DVec2::new(50.0, 30.0));
        assert!(inside.iter().all(|&d| d > 0.0), "{inside:?}");
        let outside = evaluate(&shape, DVec2::new(500.0, -300.0));
        assert!(outside.iter().all(|&d| d < 0.0), "{outside:?}");
    }

    #[test]
    fn point_on_edge_is_zero() {
        let shape = triangle();
        let d = evaluate(&shape, DVec2::new(50.0, 0.0));
        assert!(d[3].abs() < 1e-9);
    }

    #[test]
    fn median_recovers_true_distance_near_edges() {
        let shape = triangle();
        let p = DVec2::new(50.0, 10.0);
        let d = evaluate(&shape, p);
        assert!((median(d[0], d[1], d[2]) - d[3]).abs() < 1e-9);
        assert!((d[3] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn reversed_contour_keeps_correct_sign() {
        let p = [DVec2::new(0.0, 0.0), DVec2::new(100.0, 0.0), DVec2::new(50.0, 100.0)];
        let contour = Contour {
            edges: (0..3).map(|i| EdgeSegment::Linear(p[i], p[(i + 1) % 3])).collect(),
        };
        let shape = color_edges(&[contour], 3.0, 0);
        let d = evaluate(&shape, DVec2::new(50.0, 30.0));
        assert!(d.iter().all(|&v| v > 0.0), "{d:?}");
    }

    #[test]
    fn encode_maps_zero_to_middle() {
        let t = FieldTransform {
            scale: 0.5,
            x_min: 0.0,
            y_max: 0.0,
            pixel_range: 4.0,
        };
        assert_eq!(t.encode(0.0), 128);
        assert_eq!(t.encode(100.0), 255);
        assert_eq!(t.encode(-100.0), 0);
    }

    #[test]
    fn empty_glyph_is_fully_outside() {
        let t = FieldTransform {
            scale: 1.0,
            x_min: 0.0,
            y_max: 0.0,
            pixel_range: 2.0,
        };
        let mut target = vec![7u8; 6 * 6 * 4];
        write_msdf(&[], &t, 4, 4, &mut target, 6, 1, 1);
        // inner 4x4 cleared, border untouched
        assert_eq!(&target[(6 + 1) * 4..(6 + 5) * 4], &[0u8; 16][..]);
        assert_eq!(target[0], 7);
        assert_eq!(target[(5 * 6 + 5) * 4], 7);
    }

    #[test]
    fn pixel_mapping_includes_border() {
        let t = FieldTransform {
            scale: 0.1,
            x_min: 0.0,
            y_max: 100.0,
            pixel_range: 4.0,
        };
        // first pixel inside the border lands half a pixel into the outline box
        let p = t.to_shape(4, 4);
        assert!((p.x - 5.0).abs() < 1e-9);
        assert!((p.y - 95.0).abs() < 1e-9);
    }
}
