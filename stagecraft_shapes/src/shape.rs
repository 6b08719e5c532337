// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of primitive shapes a collision box can hold.

use kurbo::{Circle, Line, Point, Rect, Shape as _, Vec2};

use crate::line::{distance_to_segment, is_point_near, segments_intersect};
use crate::rect::RectExt;
use crate::spline::CatmullRomSpline;

/// A primitive shape used for picking and overlap tests.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle; its border counts as inside.
    Rect(Rect),
    /// Straight segment; picked within [`crate::line::LINE_HIT_TOLERANCE`].
    Line(Line),
    /// Filled disk.
    Circle(Circle),
    /// Curve, tested through its flattened segments.
    Spline(CatmullRomSpline),
}

impl Shape {
    /// Whether `pt` hits the shape.
    pub fn contains_point(&self, pt: Point) -> bool {
        match self {
            Self::Rect(r) => r.contains_inclusive(pt),
            Self::Line(l) => is_point_near(l, pt),
            Self::Circle(c) => (pt - c.center).hypot() <= c.radius,
            Self::Spline(s) => s.flatten().iter().any(|l| is_point_near(l, pt)),
        }
    }

    /// Whether the shape touches `rect`.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        match self {
            Self::Rect(r) => r.collides_with(rect),
            Self::Line(l) => rect.collides_with_line(l),
            Self::Circle(c) => {
                let nearest = Point::new(
                    c.center.x.clamp(rect.x0, rect.x1),
                    c.center.y.clamp(rect.y0, rect.y1),
                );
                (c.center - nearest).hypot() <= c.radius
            }
            Self::Spline(s) => s.flatten().iter().any(|l| rect.collides_with_line(l)),
        }
    }

    /// Whether the shape's bounding box lies entirely inside `rect`.
    ///
    /// This is a bounding-box approximation: a diagonal segment or a curve
    /// counts as contained exactly when its bounds are, which is what
    /// rubber-band "contain" selection expects.
    pub fn is_inside_rect(&self, rect: &Rect) -> bool {
        self.bounding_box().is_inside(rect)
    }

    /// Whether the shape touches the segment `line`.
    pub fn intersects_line(&self, line: &Line) -> bool {
        match self {
            Self::Rect(r) => r.collides_with_line(line),
            Self::Line(l) => segments_intersect(l, line),
            Self::Circle(c) => distance_to_segment(line, c.center) <= c.radius,
            Self::Spline(s) => s.flatten().iter().any(|l| segments_intersect(l, line)),
        }
    }

    /// Axis-aligned bounds.
    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::Line(l) => Rect::from_points(l.p0, l.p1),
            Self::Circle(c) => c.bounding_box(),
            Self::Spline(s) => s.bounding_box(),
        }
    }

    /// Moves the shape by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Self::Rect(r) => *r = *r + delta,
            Self::Line(l) => *l = Line::new(l.p0 + delta, l.p1 + delta),
            Self::Circle(c) => c.center += delta,
            Self::Spline(s) => s.translate(delta),
        }
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Self::Rect(r)
    }
}

impl From<Line> for Shape {
    fn from(l: Line) -> Self {
        Self::Line(l)
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Self::Circle(c)
    }
}

impl From<CatmullRomSpline> for Shape {
    fn from(s: CatmullRomSpline) -> Self {
        Self::Spline(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_hits_and_overlaps() {
        let c = Shape::Circle(Circle::new((0.0, 0.0), 10.0));
        assert!(c.contains_point(Point::new(6.0, 8.0)));
        assert!(!c.contains_point(Point::new(8.0, 8.0)));
        assert!(c.intersects_rect(&Rect::new(9.0, -1.0, 20.0, 1.0)));
        assert!(!c.intersects_rect(&Rect::new(8.0, 8.0, 20.0, 20.0)));
        assert!(c.intersects_line(&Line::new((-20.0, 5.0), (20.0, 5.0))));
    }

    #[test]
    fn line_containment_needs_both_endpoints() {
        let l = Shape::Line(Line::new((1.0, 1.0), (9.0, 9.0)));
        assert!(l.is_inside_rect(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!l.is_inside_rect(&Rect::new(0.0, 0.0, 5.0, 10.0)));
    }

    #[test]
    fn translate_moves_every_variant() {
        let delta = Vec2::new(3.0, -2.0);
        let mut r = Shape::from(Rect::new(0.0, 0.0, 1.0, 1.0));
        r.translate(delta);
        assert_eq!(r.bounding_box(), Rect::new(3.0, -2.0, 4.0, -1.0));

        let mut c = Shape::from(Circle::new((0.0, 0.0), 1.0));
        c.translate(delta);
        assert_eq!(c.bounding_box().center(), Point::new(3.0, -2.0));
    }
}
