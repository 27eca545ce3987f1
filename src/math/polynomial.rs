use std::f64::consts::PI;

/// Coefficients smaller than this fraction of the largest one are treated as zero.
const DEGENERATE_RATIO: f64 = 1e-12;

/// Real roots of `a·t² + b·t + c = 0`.
///
/// Falls back to the linear equation when `a` is negligible. Uses the
/// cancellation-free form of the quadratic formula.
#[must_use]
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    let scale = a.abs().max(b.abs()).max(c.abs());
    if scale < f64::MIN_POSITIVE {
        return Vec::new();
    }
    if a.abs() < DEGENERATE_RATIO * scale {
        if b.abs() < DEGENERATE_RATIO * scale {
            return Vec::new();
        }
        return vec![-c / b];
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }
    if discriminant < f64::MIN_POSITIVE {
        return vec![-b / (2.0 * a)];
    }

    let q = -0.5 * (b + discriminant.sqrt().copysign(b));
    let mut roots = vec![q / a];
    if q.abs() > f64::MIN_POSITIVE {
        roots.push(c / q);
    }
    roots
}

/// Real roots of `a·t³ + b·t² + c·t + d = 0`.
///
/// Uses Cardano's method (trigonometric form for three real roots) and
/// polishes each root with two Newton steps.
#[must_use]
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let scale = a.abs().max(b.abs()).max(c.abs()).max(d.abs());
    if scale < f64::MIN_POSITIVE {
        return Vec::new();
    }
    if a.abs() < DEGENERATE_RATIO * scale {
        return solve_quadratic(b, c, d);
    }

    let (b, c, d) = (b / a, c / a, d / a);
    let q = (3.0 * c - b * b) / 9.0;
    let r = (9.0 * b * c - 27.0 * d - 2.0 * b * b * b) / 54.0;
    let discriminant = q * q * q + r * r;
    let offset = -b / 3.0;

    let mut roots = if discriminant > 0.0 {
        let sq = discriminant.sqrt();
        vec![(r + sq).cbrt() + (r - sq).cbrt() + offset]
    } else {
        let denom = (-q * q * q).sqrt();
        if denom < f64::MIN_POSITIVE {
            vec![offset]
        } else {
            let theta = (r / denom).clamp(-1.0, 1.0).acos();
            let m = 2.0 * (-q).sqrt();
            vec![
                m * (theta / 3.0).cos() + offset,
                m * ((theta + 2.0 * PI) / 3.0).cos() + offset,
                m * ((theta + 4.0 * PI) / 3.0).cos() + offset,
            ]
        }
    };

    for root in &mut roots {
        for _ in 0..2 {
            let t = *root;
            let f = ((t + b) * t + c) * t + d;
            let df = (3.0 * t + 2.0 * b) * t + c;
            if df.abs() > f64::EPSILON {
                *root = t - f / df;
            }
        }
    }
    roots
}
