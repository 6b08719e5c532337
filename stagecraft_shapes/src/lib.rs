// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stagecraft Shapes: Kurbo-native collision geometry for diagram editors.
//!
//! Every object on a Stagecraft stage owns a [`CollisionBox`]: an ordered list of primitive
//! [`Shape`]s that together answer picking and overlap questions.
//!
//! - [`Shape`] is a closed enum over rectangles, segments, circles, and Catmull-Rom splines.
//! - [`CollisionBox`] answers "does this point hit me", "do I touch this rectangle or segment",
//!   and "am I fully inside this rectangle".
//! - [`RectExt`] adds the inclusive and strict rectangle predicates the stage model needs on top
//!   of [`kurbo::Rect`].
//! - [`line`] holds finite-segment intersection and distance helpers.
//! - [`CatmullRomSpline`] evaluates and flattens centripetal splines used by curved edges.
//!
//! ## Conventions
//!
//! - Rectangles are normalized: `x0 <= x1` and `y0 <= y1`.
//! - A point on a rectangle's border is inside it.
//! - Two rectangles that only share an edge do not collide.
//! - A point hits a segment when it lies within [`line::LINE_HIT_TOLERANCE`] of it.
//! - Float inputs are assumed to be finite (no NaNs).
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Line, Point, Rect};
//! use stagecraft_shapes::{CollisionBox, Shape};
//!
//! let node = CollisionBox::from_rect(Rect::new(0.0, 0.0, 100.0, 40.0));
//! assert!(node.contains_point(Point::new(0.0, 0.0)));
//! assert!(node.intersects_line(&Line::new((-10.0, 20.0), (10.0, 20.0))));
//!
//! let edge = CollisionBox::new([Shape::Line(Line::new((0.0, 0.0), (100.0, 0.0)))]);
//! assert!(edge.contains_point(Point::new(50.0, 4.0)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod collision_box;
pub mod line;
mod rect;
mod shape;
mod spline;

pub use collision_box::CollisionBox;
pub use rect::{RectExt, bounding_rect};
pub use shape::Shape;
pub use spline::{CatmullRomSpline, MAX_FLATTEN_LENGTH};
