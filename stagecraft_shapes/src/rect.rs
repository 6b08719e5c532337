// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle helpers layered on top of [`kurbo::Rect`].
//!
//! Kurbo's own `Rect::contains` is half-open, which is the right call for
//! pixel grids but not for an editor where a node's top-left corner must count
//! as "on" the node. The helpers here use the inclusive and strict variants
//! the stage model relies on.

use kurbo::{Line, Point, Rect, Vec2};

use crate::line::segment_intersection;

/// Extra rectangle queries used by collision boxes and the stage model.
///
/// All rectangles are assumed to be normalized (`x0 <= x1`, `y0 <= y1`).
pub trait RectExt {
    /// Whether `pt` lies inside the rectangle or on its border.
    fn contains_inclusive(&self, pt: Point) -> bool;

    /// Whether the two rectangles overlap with a non-zero area.
    ///
    /// Rectangles that merely share an edge do not collide.
    fn collides_with(&self, other: &Rect) -> bool;

    /// Whether `self` lies entirely within `outer` (borders may touch).
    fn is_inside(&self, outer: &Rect) -> bool;

    /// Width and height of the overlapping region, or zero when there is none.
    fn overlap_size(&self, other: &Rect) -> Vec2;

    /// Point located at `rate` (each component in `[0, 1]`) across the rectangle.
    fn point_at_rate(&self, rate: Vec2) -> Point;

    /// Whether a segment touches the rectangle: either endpoint inside, or the
    /// segment crossing any edge.
    fn collides_with_line(&self, line: &Line) -> bool;

    /// First intersection of `line` with the top, bottom, left, then right edge.
    ///
    /// Falls back to the rectangle center when the segment never crosses the
    /// border (for example when it lies fully inside).
    fn line_intersection_point(&self, line: &Line) -> Point;

    /// The four edges in top, right, bottom, left order, wound clockwise.
    fn bounding_lines(&self) -> [Line; 4];

    /// Unit outward normal for a point assumed to lie on the border.
    fn normal_at(&self, pt: Point) -> Vec2;
}

impl RectExt for Rect {
    fn contains_inclusive(&self, pt: Point) -> bool {
        self.x0 <= pt.x && pt.x <= self.x1 && self.y0 <= pt.y && pt.y <= self.y1
    }

    fn collides_with(&self, other: &Rect) -> bool {
        let collision_x = self.x1 > other.x0 && self.x0 < other.x1;
        let collision_y = self.y1 > other.y0 && self.y0 < other.y1;
        collision_x && collision_y
    }

    fn is_inside(&self, outer: &Rect) -> bool {
        self.x0 >= outer.x0 && self.x1 <= outer.x1 && self.y0 >= outer.y0 && self.y1 <= outer.y1
    }

    fn overlap_size(&self, other: &Rect) -> Vec2 {
        if !self.collides_with(other) {
            return Vec2::ZERO;
        }
        let overlap = self.intersect(*other);
        Vec2::new(overlap.width(), overlap.height())
    }

    fn point_at_rate(&self, rate: Vec2) -> Point {
        Point::new(
            self.x0 + self.width() * rate.x,
            self.y0 + self.height() * rate.y,
        )
    }

    fn collides_with_line(&self, line: &Line) -> bool {
        if self.contains_inclusive(line.p0) || self.contains_inclusive(line.p1) {
            return true;
        }
        self.bounding_lines()
            .iter()
            .any(|edge| segment_intersection(edge, line).is_some())
    }

    fn line_intersection_point(&self, line: &Line) -> Point {
        let top = Line::new((self.x0, self.y0), (self.x1, self.y0));
        let bottom = Line::new((self.x0, self.y1), (self.x1, self.y1));
        let left = Line::new((self.x0, self.y0), (self.x0, self.y1));
        let right = Line::new((self.x1, self.y0), (self.x1, self.y1));
        [top, bottom, left, right]
            .iter()
            .find_map(|edge| segment_intersection(edge, line))
            .unwrap_or_else(|| self.center())
    }

    fn bounding_lines(&self) -> [Line; 4] {
        [
            Line::new((self.x0, self.y0), (self.x1, self.y0)),
            Line::new((self.x1, self.y0), (self.x1, self.y1)),
            Line::new((self.x1, self.y1), (self.x0, self.y1)),
            Line::new((self.x0, self.y1), (self.x0, self.y0)),
        ]
    }

    fn normal_at(&self, pt: Point) -> Vec2 {
        if pt.x == self.x0 {
            Vec2::new(-1.0, 0.0)
        } else if pt.x == self.x1 {
            Vec2::new(1.0, 0.0)
        } else if pt.y == self.y0 {
            Vec2::new(0.0, -1.0)
        } else {
            Vec2::new(0.0, 1.0)
        }
    }
}

/// Smallest rectangle enclosing every input rectangle, grown by `padding` on
/// all sides.
///
/// An empty input yields [`Rect::ZERO`] rather than failing, so callers that
/// render "the bounds of nothing" stay simple.
pub fn bounding_rect<I>(rects: I, padding: f64) -> Rect
where
    I: IntoIterator<Item = Rect>,
{
    let mut it = rects.into_iter();
    let Some(first) = it.next() else {
        return Rect::ZERO;
    };
    it.fold(first, |acc, r| acc.union(r))
        .inflate(padding, padding)
}
