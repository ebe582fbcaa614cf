//! Centripetal Catmull-Rom smoothing of closed coastline outlines.
//!
//! A coarse outline of control points becomes a closed curve passing through
//! every control point. The centripetal parameterisation (alpha = 0.5) avoids
//! the cusps and self-loops uniform Catmull-Rom produces around unevenly
//! spaced points, which coarse hand-placed coastlines always have.

use log::warn;

use crate::projection::GeoPoint;

/// Knot spacing exponent: 0.5 is centripetal.
const ALPHA: f64 = 0.5;

/// Substituted for a zero chord so coincident control points never divide by
/// zero.
const MIN_KNOT_SPACING: f64 = 1e-6;

/// Tolerance for treating the last point as a repeat of the first.
const CLOSURE_TOLERANCE: f64 = 1e-9;

/// Smooth a closed outline.
///
/// The input is cyclic; a repeated closing point is dropped first. Each of
/// the `n` control points contributes `subdivisions` samples starting at the
/// point itself, and the first sample is appended again to close the curve,
/// giving `subdivisions * n + 1` points. A `subdivisions` of zero is treated
/// as one. Outlines with fewer than three distinct points are returned as
/// given.
pub fn smooth(points: &[GeoPoint], subdivisions: usize) -> Vec<GeoPoint> {
    let control = open_outline(points);

    if count_distinct(control) < 3 {
        warn!("outline with {} points has fewer than 3 distinct points, left unsmoothed", points.len());
        return points.to_vec();
    }

    let subdivisions = subdivisions.max(1);
    let n = control.len();
    let mut result = Vec::with_capacity(n * subdivisions + 1);

    for i in 0..n {
        let p0 = control[(i + n - 1) % n];
        let p1 = control[i];
        let p2 = control[(i + 1) % n];
        let p3 = control[(i + 2) % n];
        let segment = Segment::new(p0, p1, p2, p3);

        for s in 0..subdivisions {
            let u = s as f64 / subdivisions as f64;
            result.push(segment.evaluate(u));
        }
    }

    let first = result[0];
    result.push(first);
    result
}

/// The outline without its closing duplicate, if it has one.
fn open_outline(points: &[GeoPoint]) -> &[GeoPoint] {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 && first.approx_eq(last, CLOSURE_TOLERANCE) => {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}

fn count_distinct(points: &[GeoPoint]) -> usize {
    let mut distinct: Vec<GeoPoint> = Vec::new();
    for p in points {
        if !distinct.iter().any(|d| d.approx_eq(p, CLOSURE_TOLERANCE)) {
            distinct.push(*p);
            if distinct.len() >= 3 {
                break;
            }
        }
    }
    distinct.len()
}

/// One span of the spline between `p1` and `p2`, with its knot vector.
struct Segment {
    points: [GeoPoint; 4],
    knots: [f64; 4],
}

impl Segment {
    fn new(p0: GeoPoint, p1: GeoPoint, p2: GeoPoint, p3: GeoPoint) -> Self {
        let t0 = 0.0;
        let t1 = t0 + knot_spacing(&p0, &p1);
        let t2 = t1 + knot_spacing(&p1, &p2);
        let t3 = t2 + knot_spacing(&p2, &p3);
        Self {
            points: [p0, p1, p2, p3],
            knots: [t0, t1, t2, t3],
        }
    }

    /// Barry-Goldman pyramid evaluation at `u` in [0, 1) across (p1, p2).
    fn evaluate(&self, u: f64) -> GeoPoint {
        let [p0, p1, p2, p3] = self.points;
        let [t0, t1, t2, t3] = self.knots;
        let t = t1 + (t2 - t1) * u;

        let a1 = lerp_knots(p0, p1, t0, t1, t);
        let a2 = lerp_knots(p1, p2, t1, t2, t);
        let a3 = lerp_knots(p2, p3, t2, t3, t);

        let b1 = lerp_knots(a1, a2, t0, t2, t);
        let b2 = lerp_knots(a2, a3, t1, t3, t);

        lerp_knots(b1, b2, t1, t2, t)
    }
}

fn knot_spacing(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let spacing = a.distance(b).powf(ALPHA);
    if spacing > 0.0 { spacing } else { MIN_KNOT_SPACING }
}

fn lerp_knots(a: GeoPoint, b: GeoPoint, ta: f64, tb: f64, t: f64) -> GeoPoint {
    let span = tb - ta;
    let wa = (tb - t) / span;
    let wb = (t - ta) / span;
    GeoPoint::new(a.lat * wa + b.lat * wb, a.lng * wa + b.lng * wb)
}
