//! Signed distance queries against edge segments.
//!
//! Sign convention: a point to the right of an edge's direction has a
//! positive distance. TrueType outer contours run clockwise (y up), so
//! positive means inside the glyph.

use glam::DVec2;

use super::equation::{solve_cubic, solve_quadratic};
use crate::contour::EdgeSegment;

/// Distance to an edge plus a tie-breaker: when two edges are equally
/// close (they share the closest endpoint), the one whose direction is more
/// orthogonal to the query (smaller `dot`) wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedDistance {
    pub distance: f64,
    pub dot: f64,
}

impl SignedDistance {
    pub const INFINITE: SignedDistance = SignedDistance {
        distance: -f64::MAX,
        dot: 0.0,
    };

    pub fn new(distance: f64, dot: f64) -> Self {
        Self { distance, dot }
    }

    pub fn is_closer_than(&self, other: &SignedDistance) -> bool {
        let (a, b) = (self.distance.abs(), other.distance.abs());
        a < b || (a == b && self.dot < other.dot)
    }
}

impl Default for SignedDistance {
    fn default() -> Self {
        Self::INFINITE
    }
}

#[inline]
fn non_zero_sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// `a × b`
#[inline]
fn cross(a: DVec2, b: DVec2) -> f64 {
    a.perp_dot(b)
}

impl EdgeSegment {
    /// Signed distance from `origin` to this edge, plus the parameter of the
    /// closest point (may fall outside `[0, 1]` for linear edges).
    pub fn signed_distance(&self, origin: DVec2) -> (SignedDistance, f64) {
        match *self {
            EdgeSegment::Linear(p0, p1) => linear_distance(p0, p1, origin),
            EdgeSegment::Quadratic(p0, p1, p2) => quadratic_distance(p0, p1, p2, origin),
        }
    }

    /// Replace `distance` by the perpendicular distance to the edge's
    /// tangent line when the closest point lies beyond an endpoint.
    pub fn distance_to_pseudo_distance(&self, distance: &mut SignedDistance, origin: DVec2, param: f64) {
        if param < 0.0 {
            let dir = self.direction(0.0).normalize_or_zero();
            let aq = origin - self.start();
            if aq.dot(dir) < 0.0 {
                let pseudo = cross(aq, dir);
                if pseudo.abs() <= distance.distance.abs() {
                    *distance = SignedDistance::new(pseudo, 0.0);
                }
            }
        } else if param > 1.0 {
            let dir = self.direction(1.0).normalize_or_zero();
            let bq = origin - self.end();
            if bq.dot(dir) > 0.0 {
                let pseudo = cross(bq, dir);
                if pseudo.abs() <= distance.distance.abs() {
                    *distance = SignedDistance::new(pseudo, 0.0);
                }
            }
        }
    }

    /// Contribution of this edge to the nonzero winding number of `p`,
    /// counted along a ray towards +x.
    pub fn winding(&self, p: DVec2) -> i32 {
        match *self {
            EdgeSegment::Linear(p0, p1) => line_winding(p0, p1, p),
            EdgeSegment::Quadratic(p0, p1, p2) => {
                // split at the y extremum so every piece is monotonic in y
                let denom = p0.y - 2.0 * p1.y + p2.y;
                let split = if denom != 0.0 {
                    let t = (p0.y - p1.y) / denom;
                    (t > 0.0 && t < 1.0).then_some(t)
                } else {
                    None
                };
                match split {
                    Some(t) => {
                        self.monotonic_winding(p, 0.0, t) + self.monotonic_winding(p, t, 1.0)
                    }
                    None => self.monotonic_winding(p, 0.0, 1.0),
                }
            }
        }
    }

    fn monotonic_winding(&self, p: DVec2, t0: f64, t1: f64) -> i32 {
        let EdgeSegment::Quadratic(p0, p1, p2) = *self else {
            return 0;
        };
        let ya = self.point(t0).y;
        let yb = self.point(t1).y;
        let crosses = (ya <= p.y && yb > p.y) || (yb <= p.y && ya > p.y);
        if !crosses {
            return 0;
        }
        // y(t) = (y0 - 2y1 + y2)t² + 2(y1 - y0)t + y0
        let roots = solve_quadratic(p0.y - 2.0 * p1.y + p2.y, 2.0 * (p1.y - p0.y), p0.y - p.y);
        let mid = 0.5 * (t0 + t1);
        let t = roots
            .iter()
            .min_by(|a, b| {
                let da = distance_outside(*a, t0, t1);
                let db = distance_outside(*b, t0, t1);
                da.total_cmp(&db).then((a - mid).abs().total_cmp(&(b - mid).abs()))
            })
            .unwrap_or(mid)
            .clamp(t0, t1);
        if self.point(t).x > p.x {
            if yb > ya {
                1
            } else {
                -1
            }
        } else {
            0
        }
    }
}

fn distance_outside(t: f64, t0: f64, t1: f64) -> f64 {
    if t < t0 {
        t0 - t
    } else if t > t1 {
        t - t1
    } else {
        0.0
    }
}

fn line_winding(p0: DVec2, p1: DVec2, p: DVec2) -> i32 {
    if (p0.y <= p.y && p1.y > p.y) || (p1.y <= p.y && p0.y > p.y) {
        let t = (p.y - p0.y) / (p1.y - p0.y);
        let ix = p0.x + t * (p1.x - p0.x);
        if ix > p.x {
            return if p1.y > p0.y { 1 } else { -1 };
        }
    }
    0
}

fn linear_distance(p0: DVec2, p1: DVec2, origin: DVec2) -> (SignedDistance, f64) {
    let aq = origin - p0;
    let ab = p1 - p0;
    let len2 = ab.length_squared();
    let param = if len2 > 0.0 { aq.dot(ab) / len2 } else { 0.0 };
    let eq = if param > 0.5 { p1 - origin } else { p0 - origin };
    let endpoint_distance = eq.length();
    if param > 0.0 && param < 1.0 {
        let ortho = cross(aq, ab.normalize_or_zero());
        if ortho.abs() < endpoint_distance {
            return (SignedDistance::new(ortho, 0.0), param);
        }
    }
    let dot = ab.normalize_or_zero().dot(eq.normalize_or_zero()).abs();
    (
        SignedDistance::new(non_zero_sign(cross(aq, ab)) * endpoint_distance, dot),
        param,
    )
}

fn quadratic_distance(p0: DVec2, p1: DVec2, p2: DVec2, origin: DVec2) -> (SignedDistance, f64) {
    let seg = EdgeSegment::Quadratic(p0, p1, p2);
    let qa = p0 - origin;
    let ab = p1 - p0;
    let br = p2 - p1 - ab;
    // d/dt |B(t) - origin|² = 0 expands to a cubic in t
    let a = br.dot(br);
    let b = 3.0 * ab.dot(br);
    let c = 2.0 * ab.dot(ab) + qa.dot(br);
    let d = qa.dot(ab);

    let start_dir = seg.direction(0.0);
    let mut min_distance = non_zero_sign(cross(start_dir, qa)) * qa.length();
    let mut param = -qa.dot(start_dir) / start_dir.dot(start_dir).max(f64::MIN_POSITIVE);

    let end_dir = seg.direction(1.0);
    let eq = p2 - origin;
    let end_distance = eq.length();
    if end_distance < min_distance.abs() {
        min_distance = non_zero_sign(cross(end_dir, eq)) * end_distance;
        param = (origin - p1).dot(end_dir) / end_dir.dot(end_dir).max(f64::MIN_POSITIVE);
    }

    for t in solve_cubic(a, b, c, d).iter() {
        if t > 0.0 && t < 1.0 {
            let qe = qa + 2.0 * t * ab + t * t * br;
            let distance = qe.length();
            if distance <= min_distance.abs() {
                min_distance = non_zero_sign(cross(ab + t * br, qe)) * distance;
                param = t;
            }
        }
    }

    if (0.0..=1.0).contains(&param) {
        (SignedDistance::new(min_distance, 0.0), param)
    } else if param < 0.5 {
        let dot = start_dir.normalize_or_zero().dot(qa.normalize_or_zero()).abs();
        (SignedDistance::new(min_distance, dot), param)
    } else {
        let dot = end_dir.normalize_or_zero().dot(eq.normalize_or_zero()).abs();
        (SignedDistance::new(min_distance, dot), param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> EdgeSegment {
        EdgeSegment::Linear(DVec2::new(x0, y0), DVec2::new(x1, y1))
    }

    #[test]
    fn point_on_line_has_zero_distance() {
        let (d, t) = line(0.0, 0.0, 10.0, 0.0).signed_distance(DVec2::new(4.0, 0.0));
        assert!(d.distance.abs() < 1e-12);
        assert!((t - 0.4).abs() < 1e-12);
    }

    #[test]
    fn right_of_edge_is_positive() {
        // edge pointing +x; below it is to the right in a y-up frame
        let e = line(0.0, 0.0, 10.0, 0.0);
        let (below, _) = e.signed_distance(DVec2::new(5.0, -3.0));
        let (above, _) = e.signed_distance(DVec2::new(5.0, 3.0));
        assert!((below.distance - 3.0).abs() < 1e-12);
        assert!((above.distance + 3.0).abs() < 1e-12);
    }

    #[test]
    fn beyond_endpoint_uses_endpoint_distance() {
        let e = line(0.0, 0.0, 10.0, 0.0);
        let (d, t) = e.signed_distance(DVec2::new(13.0, 4.0));
        assert!((d.distance.abs() - 5.0).abs() < 1e-12);
        assert!(t > 1.0);
        let mut pseudo = d;
        e.distance_to_pseudo_distance(&mut pseudo, DVec2::new(13.0, 4.0), t);
        assert!((pseudo.distance + 4.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_distance_matches_sampling() {
        let q = EdgeSegment::Quadratic(DVec2::ZERO, DVec2::new(50.0, 100.0), DVec2::new(100.0, 0.0));
        for origin in [DVec2::new(50.0, 20.0), DVec2::new(10.0, 80.0), DVec2::new(120.0, -5.0)] {
            let (d, _) = q.signed_distance(origin);
            let sampled = (0..=10_000)
                .map(|i| (q.point(i as f64 / 10_000.0) - origin).length())
                .fold(f64::MAX, f64::min);
            assert!((d.distance.abs() - sampled).abs() < 1e-3, "{origin}: {} vs {sampled}", d.distance);
        }
    }

    #[test]
    fn quadratic_sign_matches_linear_convention() {
        // bulging upwards, running +x: a point under the curve is on the right
        let q = EdgeSegment::Quadratic(DVec2::ZERO, DVec2::new(50.0, 100.0), DVec2::new(100.0, 0.0));
        let (inside, _) = q.signed_distance(DVec2::new(50.0, 20.0));
        let (outside, _) = q.signed_distance(DVec2::new(50.0, 80.0));
        assert!(inside.distance > 0.0);
        assert!(outside.distance < 0.0);
    }

    #[test]
    fn winding_of_square() {
        // clockwise square in y-up coordinates
        let edges = [
            line(0.0, 0.0, 0.0, 10.0),
            line(0.0, 10.0, 10.0, 10.0),
            line(10.0, 10.0, 10.0, 0.0),
            line(10.0, 0.0, 0.0, 0.0),
        ];
        let w = |p: DVec2| edges.iter().map(|e| e.winding(p)).sum::<i32>();
        assert_ne!(w(DVec2::new(5.0, 5.0)), 0);
        assert_eq!(w(DVec2::new(15.0, 5.0)), 0);
        assert_eq!(w(DVec2::new(-5.0, 5.0)), 0);
        assert_eq!(w(DVec2::new(5.0, 50.0)), 0);
    }

    #[test]
    fn quadratic_winding_counts_both_crossings() {
        // arch from (0,0) up to y=50 and back down to (100,0), closed by a line
        let edges = [
            EdgeSegment::Quadratic(DVec2::ZERO, DVec2::new(50.0, 100.0), DVec2::new(100.0, 0.0)),
            line(100.0, 0.0, 0.0, 0.0),
        ];
        let w = |p: DVec2| edges.iter().map(|e| e.winding(p)).sum::<i32>();
        assert_ne!(w(DVec2::new(50.0, 25.0)), 0);
        // left of the arch the ray crosses it twice in opposite directions
        assert_eq!(w(DVec2::new(-10.0, 25.0)), 0);
        assert_eq!(w(DVec2::new(50.0, 60.0)), 0);
    }
}
