//! Vector math shared by the trace and fold scorers
//!
//! All functions are total: zero-length vectors produce neutral results
//! instead of NaN, so callers can treat a zero vector as "no direction".

use serde::{Deserialize, Serialize};

use crate::Point;
use crate::consts::{REFERENCE_HEIGHT, REFERENCE_WIDTH};

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Point, b: Point) -> f32 {
    a.distance(b)
}

/// Unit vector in the direction of `v`, or zero when `v` has no length
#[inline]
pub fn normalize(v: Point) -> Point {
    v.normalize_or_zero()
}

/// Angle between two vectors in degrees, in [0, 180]
///
/// A zero vector on either side yields 90 (dot product of zero).
pub fn angle_between_deg(u: Point, v: Point) -> f32 {
    let dot = normalize(u).dot(normalize(v)).clamp(-1.0, 1.0);
    dot.acos().to_degrees()
}

/// Shortest distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return distance(p, a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    distance(p, a + ab * t)
}

/// Shortest distance from `p` to an open polyline
///
/// A single-point polyline degrades to point distance; an empty one is
/// infinitely far away.
pub fn distance_to_polyline(p: Point, points: &[Point]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => distance(p, *only),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

/// Direction from `from` toward `to` in degrees (screen space, y down)
pub fn heading_deg(from: Point, to: Point) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

/// Dimensions of the rendering surface a session is played on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self::reference()
    }
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The 600x400 canvas the trace catalog is authored for
    pub fn reference() -> Self {
        Self::new(REFERENCE_WIDTH, REFERENCE_HEIGHT)
    }

    /// Uniform scale that fits the reference canvas inside this surface
    pub fn scale(&self) -> f32 {
        if self.width <= 0.0 || self.height <= 0.0 {
            1.0
        } else {
            (self.width / REFERENCE_WIDTH).min(self.height / REFERENCE_HEIGHT)
        }
    }

    /// Letterbox offset that centres the scaled reference canvas
    pub fn offset(&self) -> Point {
        let scale = self.scale();
        let fitted = Point::new(REFERENCE_WIDTH, REFERENCE_HEIGHT) * scale;
        (Point::new(self.width, self.height) - fitted).max(Point::ZERO) * 0.5
    }

    /// Map a reference-space point onto this surface
    #[inline]
    pub fn place(&self, p: Point) -> Point {
        p * self.scale() + self.offset()
    }

    /// Scale a reference-space distance to this surface
    #[inline]
    pub fn scale_distance(&self, reference_units: f32) -> f32 {
        reference_units * self.scale()
    }

    /// Map a normalized (0..1) point onto this surface
    #[inline]
    pub fn denormalize(&self, p: Point) -> Point {
        Point::new(p.x * self.width, p.y * self.height)
    }
}
