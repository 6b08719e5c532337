// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite hit region made of primitive [`Shape`]s.

use kurbo::{Line, Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::rect::bounding_rect;
use crate::shape::Shape;

/// An ordered list of shapes that together form an object's hit region.
///
/// Most objects need a single rectangle; sections carry four border lines and
/// a title bar, so a small inline capacity covers the common cases without
/// allocating.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionBox {
    shapes: SmallVec<[Shape; 5]>,
}

impl CollisionBox {
    /// Creates a box from an ordered list of shapes.
    pub fn new<I>(shapes: I) -> Self
    where
        I: IntoIterator<Item = Shape>,
    {
        Self {
            shapes: shapes.into_iter().collect(),
        }
    }

    /// A box holding a single rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new([Shape::Rect(rect)])
    }

    /// The shapes in insertion order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Mutable access to the shapes.
    pub fn shapes_mut(&mut self) -> &mut [Shape] {
        &mut self.shapes
    }

    /// Whether the box holds no shapes.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Replaces every shape.
    pub fn set_shapes<I>(&mut self, shapes: I)
    where
        I: IntoIterator<Item = Shape>,
    {
        self.shapes.clear();
        self.shapes.extend(shapes);
    }

    /// Appends a shape.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// The first shape's rectangle, if it is a rectangle.
    ///
    /// Objects that keep their geometry as a rectangle store it first.
    pub fn first_rect(&self) -> Option<Rect> {
        match self.shapes.first() {
            Some(Shape::Rect(r)) => Some(*r),
            _ => None,
        }
    }

    /// Whether any shape contains `pt`.
    pub fn contains_point(&self, pt: Point) -> bool {
        self.shapes.iter().any(|s| s.contains_point(pt))
    }

    /// Whether any shape touches `rect`.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.shapes.iter().any(|s| s.intersects_rect(rect))
    }

    /// Whether every shape lies inside `rect`.
    ///
    /// An empty box is never contained.
    pub fn is_contained_by_rect(&self, rect: &Rect) -> bool {
        !self.shapes.is_empty() && self.shapes.iter().all(|s| s.is_inside_rect(rect))
    }

    /// Whether any shape touches the segment.
    pub fn intersects_line(&self, line: &Line) -> bool {
        self.shapes.iter().any(|s| s.intersects_line(line))
    }

    /// Union of the shapes' bounds, or [`Rect::ZERO`] for an empty box.
    pub fn bounding_rect(&self) -> Rect {
        bounding_rect(self.shapes.iter().map(Shape::bounding_box), 0.0)
    }

    /// Moves every shape by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        for shape in &mut self.shapes {
            shape.translate(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Circle;

    use super::*;

    #[test]
    fn empty_box_is_inert() {
        let b = CollisionBox::default();
        assert!(b.is_empty());
        assert!(!b.contains_point(Point::ZERO));
        assert!(!b.is_contained_by_rect(&Rect::new(-1.0, -1.0, 1.0, 1.0)));
        assert_eq!(b.bounding_rect(), Rect::ZERO);
    }

    #[test]
    fn composite_box_queries_any_and_all() {
        let b = CollisionBox::new([
            Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Shape::Circle(Circle::new((30.0, 5.0), 5.0)),
        ]);
        assert!(b.contains_point(Point::new(30.0, 5.0)));
        assert!(b.contains_point(Point::new(5.0, 5.0)));
        assert!(!b.contains_point(Point::new(18.0, 5.0)));
        assert_eq!(b.bounding_rect(), Rect::new(0.0, 0.0, 35.0, 10.0));
        assert!(b.is_contained_by_rect(&Rect::new(0.0, 0.0, 40.0, 20.0)));
        assert!(!b.is_contained_by_rect(&Rect::new(0.0, 0.0, 20.0, 20.0)));
        assert_eq!(b.first_rect(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn translate_shifts_bounds() {
        let mut b = CollisionBox::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        b.translate(Vec2::new(5.0, 5.0));
        assert_eq!(b.bounding_rect(), Rect::new(5.0, 5.0, 15.0, 15.0));
    }
}
