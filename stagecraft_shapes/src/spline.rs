// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Centripetal Catmull-Rom splines.
//!
//! A spline through `n` control points has `n - 3` drawable segments: the
//! first and last control points only steer the tangents at the ends, so the
//! visible curve runs from `control_points[1]` to `control_points[n - 2]`.

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{BezPath, Line, Point, Rect, Vec2};

/// Maximum length of one straight piece when a spline is flattened.
pub const MAX_FLATTEN_LENGTH: f64 = 5.0;

/// Samples used to estimate a segment's arc length before flattening.
const LENGTH_SAMPLES: usize = 16;

/// A Catmull-Rom spline with at least four control points.
#[derive(Clone, Debug, PartialEq)]
pub struct CatmullRomSpline {
    control_points: Vec<Point>,
    alpha: f64,
    tension: f64,
}

/// Polynomial coefficients of one segment: `a t³ + b t² + c t + d`.
#[derive(Clone, Copy, Debug)]
struct Cubic {
    a: Vec2,
    b: Vec2,
    c: Vec2,
    d: Vec2,
}

impl Cubic {
    fn eval(&self, t: f64) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;
        (self.a * t3 + self.b * t2 + self.c * t + self.d).to_point()
    }
}

/// Emits chords between `from` and `to`, bisecting until each is short enough.
fn subdivide(cubic: &Cubic, from: (f64, Point), to: (f64, Point), depth: u32, out: &mut Vec<Line>) {
    if depth >= 16 || (to.1 - from.1).hypot() <= MAX_FLATTEN_LENGTH {
        out.push(Line::new(from.1, to.1));
        return;
    }
    let mid_t = 0.5 * (from.0 + to.0);
    let mid = (mid_t, cubic.eval(mid_t));
    subdivide(cubic, from, mid, depth + 1, out);
    subdivide(cubic, mid, to, depth + 1, out);
}

impl CatmullRomSpline {
    /// Centripetal parameterization.
    pub const DEFAULT_ALPHA: f64 = 0.5;

    /// Creates a centripetal spline with zero tension.
    ///
    /// Returns `None` when fewer than four control points are given.
    pub fn new(control_points: Vec<Point>) -> Option<Self> {
        Self::with_params(control_points, Self::DEFAULT_ALPHA, 0.0)
    }

    /// Creates a spline with an explicit `alpha` and `tension`.
    pub fn with_params(control_points: Vec<Point>, alpha: f64, tension: f64) -> Option<Self> {
        if control_points.len() < 4 {
            return None;
        }
        Some(Self {
            control_points,
            alpha,
            tension,
        })
    }

    /// All control points, including the two tangent guides at the ends.
    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    /// Number of drawable segments.
    pub fn segment_count(&self) -> usize {
        self.control_points.len() - 3
    }

    /// First point on the visible curve.
    pub fn start(&self) -> Point {
        self.control_points[1]
    }

    /// Last point on the visible curve.
    pub fn end(&self) -> Point {
        self.control_points[self.control_points.len() - 2]
    }

    fn cubic(&self, segment: usize) -> Cubic {
        let p0 = self.control_points[segment].to_vec2();
        let p1 = self.control_points[segment + 1].to_vec2();
        let p2 = self.control_points[segment + 2].to_vec2();
        let p3 = self.control_points[segment + 3].to_vec2();

        let t01 = (p1 - p0).hypot().powf(self.alpha);
        let t12 = (p2 - p1).hypot().powf(self.alpha);
        let t23 = (p3 - p2).hypot().powf(self.alpha);

        // Coincident control points would divide by zero; fall back to the
        // chord, which keeps the segment straight there.
        let m1 = if t01 == 0.0 || t12 == 0.0 {
            p2 - p1
        } else {
            p2 - p1 + ((p1 - p0) / t01 - (p2 - p0) / (t01 + t12)) * t12
        };
        let m2 = if t23 == 0.0 || t12 == 0.0 {
            p2 - p1
        } else {
            p2 - p1 + ((p3 - p2) / t23 - (p3 - p1) / (t12 + t23)) * t12
        };
        let m1 = m1 * (1.0 - self.tension);
        let m2 = m2 * (1.0 - self.tension);

        Cubic {
            a: (p1 - p2) * 2.0 + m1 + m2,
            b: (p1 - p2) * -3.0 - m1 * 2.0 - m2,
            c: m1,
            d: p1,
        }
    }

    /// Point on `segment` at parameter `t` in `[0, 1]`.
    ///
    /// # Panics
    ///
    /// Panics if `segment >= self.segment_count()`.
    pub fn eval(&self, segment: usize, t: f64) -> Point {
        self.cubic(segment).eval(t)
    }

    /// Approximates the curve with straight pieces of at most
    /// [`MAX_FLATTEN_LENGTH`].
    pub fn flatten(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        for segment in 0..self.segment_count() {
            let cubic = self.cubic(segment);
            let mut estimate = 0.0_f64;
            let mut prev = cubic.eval(0.0);
            for i in 1..=LENGTH_SAMPLES {
                let p = cubic.eval(i as f64 / LENGTH_SAMPLES as f64);
                estimate += (p - prev).hypot();
                prev = p;
            }
            #[allow(
                clippy::cast_possible_truncation,
                reason = "piece counts are small and non-negative"
            )]
            let steps = ((estimate / MAX_FLATTEN_LENGTH).ceil() as usize).max(1);
            let mut t0 = 0.0;
            let mut prev = cubic.eval(0.0);
            for i in 1..=steps {
                let t1 = i as f64 / steps as f64;
                let p = cubic.eval(t1);
                subdivide(&cubic, (t0, prev), (t1, p), 0, &mut lines);
                t0 = t1;
                prev = p;
            }
        }
        lines
    }

    /// Bounding box of the flattened curve.
    pub fn bounding_box(&self) -> Rect {
        let start = self.start();
        self.flatten()
            .iter()
            .fold(Rect::from_points(start, start), |acc, line| {
                acc.union_pt(line.p1)
            })
    }

    /// Exact cubic Bézier representation of the visible curve.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start());
        for segment in 0..self.segment_count() {
            let Cubic { a, b, c, d } = self.cubic(segment);
            let c1 = d + c / 3.0;
            let c2 = d + c * (2.0 / 3.0) + b / 3.0;
            let end = a + b + c + d;
            path.curve_to(c1.to_point(), c2.to_point(), end.to_point());
        }
        path
    }

    /// Shifts every control point by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.control_points {
            *p += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn straight() -> CatmullRomSpline {
        CatmullRomSpline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn needs_four_points() {
        assert!(CatmullRomSpline::new(vec![Point::ZERO; 3]).is_none());
        assert!(CatmullRomSpline::new(vec![Point::ZERO; 4]).is_some());
    }

    #[test]
    fn segment_interpolates_inner_points() {
        let s = straight();
        assert_eq!(s.segment_count(), 1);
        assert_eq!(s.eval(0, 0.0), Point::new(10.0, 0.0));
        let end = s.eval(0, 1.0);
        assert!((end.x - 20.0).abs() < 1e-9 && end.y.abs() < 1e-9);
    }

    #[test]
    fn flatten_respects_max_length() {
        let s = CatmullRomSpline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(200.0, 100.0),
            Point::new(200.0, 300.0),
            Point::new(400.0, 300.0),
        ])
        .unwrap();
        let lines = s.flatten();
        assert!(!lines.is_empty());
        for line in &lines {
            assert!((line.p1 - line.p0).hypot() <= MAX_FLATTEN_LENGTH + 1e-6);
        }
        assert_eq!(lines[0].p0, s.start());
        let last = lines[lines.len() - 1].p1;
        assert!((last - s.end()).hypot() < 1e-9);
    }

    #[test]
    fn coincident_points_do_not_produce_nan() {
        let s = CatmullRomSpline::new(vec![Point::new(5.0, 5.0); 4]).unwrap();
        let p = s.eval(0, 0.5);
        assert!(p.is_finite());
        assert_eq!(s.bounding_box(), Rect::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn bez_path_ends_at_last_visible_point() {
        let s = straight();
        let path = s.to_bez_path();
        assert_eq!(path.elements().len(), 2);
        let bounds = s.bounding_box();
        assert!((bounds.x0 - 10.0).abs() < 1e-9);
        assert!((bounds.x1 - 20.0).abs() < 1e-9);
    }
}
