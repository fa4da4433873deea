//! Real roots of quadratic and cubic polynomials, used to find the closest
//! point on a quadratic edge and ray crossings.

/// Up to three real roots, without allocating.
#[derive(Debug, Clone, Copy, Default)]
pub struct Roots {
    values: [f64; 3],
    len: usize,
}

impl Roots {
    fn push(&mut self, v: f64) {
        self.values[self.len] = v;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values[..self.len].iter().copied()
    }
}

/// Solve `a·x² + b·x + c = 0`. A degenerate (all zero) equation yields no
/// roots.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::default();
    // nearly linear: the quadratic formula loses all precision
    if a == 0.0 || b.abs() > 1e12 * a.abs() {
        if b != 0.0 {
            roots.push(-c / b);
        }
        return roots;
    }
    let disc = b * b - 4.0 * a * c;
    if disc > 0.0 {
        let s = disc.sqrt();
        roots.push((-b + s) / (2.0 * a));
        roots.push((-b - s) / (2.0 * a));
    } else if disc == 0.0 {
        roots.push(-b / (2.0 * a));
    }
    roots
}

/// Solve the monic cubic `x³ + a·x² + b·x + c = 0`.
fn solve_cubic_normed(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::default();
    let a2 = a * a;
    let q = (a2 - 3.0 * b) / 9.0;
    let r = (a * (2.0 * a2 - 9.0 * b) + 27.0 * c) / 54.0;
    let r2 = r * r;
    let q3 = q * q * q;
    let a = a / 3.0;
    if r2 < q3 {
        // three real roots (trigonometric form)
        let t = (r / q3.sqrt()).clamp(-1.0, 1.0).acos();
        let m = -2.0 * q.sqrt();
        let tau = std::f64::consts::TAU;
        roots.push(m * (t / 3.0).cos() - a);
        roots.push(m * ((t + tau) / 3.0).cos() - a);
        roots.push(m * ((t - tau) / 3.0).cos() - a);
    } else {
        let sign = if r < 0.0 { 1.0 } else { -1.0 };
        let u = sign * (r.abs() + (r2 - q3).sqrt()).cbrt();
        let v = if u == 0.0 { 0.0 } else { q / u };
        roots.push((u + v) - a);
        if u == v || (u - v).abs() < 1e-12 * (u + v).abs() {
            roots.push(-0.5 * (u + v) - a);
        }
    }
    roots
}

/// Solve `a·x³ + b·x² + c·x + d = 0`, falling back to the quadratic when
/// the cubic term is negligible.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Roots {
    if a != 0.0 {
        let bn = b / a;
        if bn.abs() < 1e6 {
            return solve_cubic_normed(bn, c / a, d / a);
        }
    }
    solve_quadratic(b, c, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(r: Roots) -> Vec<f64> {
        let mut v: Vec<f64> = r.iter().collect();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    #[test]
    fn quadratic_two_roots() {
        let r = sorted(solve_quadratic(1.0, -3.0, 2.0));
        assert_eq!(r.len(), 2);
        assert!((r[0] - 1.0).abs() < 1e-12);
        assert!((r[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_degenerates_to_linear() {
        let r = sorted(solve_quadratic(0.0, 2.0, -4.0));
        assert_eq!(r, vec![2.0]);
        assert!(solve_quadratic(0.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn cubic_three_roots() {
        // (x - 1)(x - 2)(x - 3)
        let r = sorted(solve_cubic(1.0, -6.0, 11.0, -6.0));
        assert_eq!(r.len(), 3);
        for (got, want) in r.iter().zip([1.0, 2.0, 3.0]) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn cubic_single_root() {
        // x³ + x + 2 = (x + 1)(x² - x + 2)
        let r = sorted(solve_cubic(1.0, 0.0, 1.0, 2.0));
        assert_eq!(r.len(), 1);
        assert!((r[0] + 1.0).abs() < 1e-9);
    }
}
