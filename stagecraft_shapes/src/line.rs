// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line segment helpers.
//!
//! [`kurbo::Line::crossing_point`] treats its inputs as infinite lines, while
//! collision checks in a diagram need finite segments. These helpers work on
//! the segment between `p0` and `p1` only.

use kurbo::{Line, Point};

/// Distance under which a point counts as "on" a line for picking.
pub const LINE_HIT_TOLERANCE: f64 = 5.0;

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

/// Whether two segments properly cross each other.
///
/// Collinear segments are reported as non-intersecting even when they
/// overlap, which matches how edges drawn along each other are treated.
pub fn segments_intersect(a: &Line, b: &Line) -> bool {
    let d1 = orientation(a.p0, a.p1, b.p0);
    let d2 = orientation(a.p0, a.p1, b.p1);
    let d3 = orientation(b.p0, b.p1, a.p0);
    let d4 = orientation(b.p0, b.p1, a.p1);
    if d1 == 0.0 && d2 == 0.0 {
        return false;
    }
    (d1 * d2 <= 0.0) && (d3 * d4 <= 0.0)
}

/// Intersection point of two segments, if they cross within both extents.
///
/// Parallel (and collinear) segments have no single intersection point and
/// yield `None`.
pub fn segment_intersection(a: &Line, b: &Line) -> Option<Point> {
    let r = a.p1 - a.p0;
    let s = b.p1 - b.p0;
    let denom = r.cross(s);
    if denom == 0.0 {
        return None;
    }
    let qp = b.p0 - a.p0;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a.p0 + r * t)
    } else {
        None
    }
}

/// Shortest distance from `pt` to the segment.
pub fn distance_to_segment(line: &Line, pt: Point) -> f64 {
    let v = line.p1 - line.p0;
    let w = pt - line.p0;
    let len2 = v.hypot2();
    let t = if len2 > 0.0 { w.dot(v) / len2 } else { 0.0 };
    let proj = line.p0 + v * t.clamp(0.0, 1.0);
    (pt - proj).hypot()
}

/// Whether `pt` lies within [`LINE_HIT_TOLERANCE`] of the segment.
pub fn is_point_near(line: &Line, pt: Point) -> bool {
    distance_to_segment(line, pt) <= LINE_HIT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect() {
        let a = Line::new((0.0, 0.0), (10.0, 10.0));
        let b = Line::new((0.0, 10.0), (10.0, 0.0));
        assert!(segments_intersect(&a, &b));
        assert_eq!(segment_intersection(&a, &b), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn collinear_segments_do_not_intersect() {
        let a = Line::new((0.0, 0.0), (10.0, 0.0));
        let b = Line::new((5.0, 0.0), (15.0, 0.0));
        assert!(!segments_intersect(&a, &b));
        assert_eq!(segment_intersection(&a, &b), None);
    }

    #[test]
    fn disjoint_segments_miss() {
        let a = Line::new((0.0, 0.0), (1.0, 1.0));
        let b = Line::new((5.0, 0.0), (6.0, -3.0));
        assert!(!segments_intersect(&a, &b));
        assert_eq!(segment_intersection(&a, &b), None);
    }

    #[test]
    fn point_near_line_uses_tolerance() {
        let line = Line::new((0.0, 0.0), (100.0, 0.0));
        assert!(is_point_near(&line, Point::new(50.0, 4.0)));
        assert!(is_point_near(&line, Point::new(50.0, 5.0)));
        assert!(!is_point_near(&line, Point::new(50.0, 6.0)));
        // Past the end the distance is measured to the endpoint.
        assert!(!is_point_near(&line, Point::new(106.0, 0.0)));
    }

    #[test]
    fn degenerate_segment_measures_to_its_point() {
        let line = Line::new((3.0, 4.0), (3.0, 4.0));
        assert_eq!(distance_to_segment(&line, Point::ZERO), 5.0);
    }
}
