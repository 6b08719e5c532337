// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Associations: objects that connect entities.
//!
//! Associations never own entities. They refer to them by [`ObjectId`], and
//! their geometry is derived from the endpoints on demand by the
//! [`Stage`](crate::Stage).

use kurbo::{Line, Point, Vec2};
use serde::{Deserialize, Serialize};
use stagecraft_shapes::CatmullRomSpline;

use crate::id::ObjectId;
use crate::types::Color;

/// Anchor ratio for the middle of a rectangle.
pub const CENTER_RATE: Vec2 = Vec2::new(0.5, 0.5);

/// A connecting object.
#[derive(Clone, Debug, PartialEq)]
pub struct Association {
    id: ObjectId,
    /// Stroke color.
    pub color: Color,
    /// Selected by the interaction layer.
    pub is_selected: bool,
    kind: AssociationKind,
}

/// The closed set of association variants.
#[derive(Clone, Debug, PartialEq)]
pub enum AssociationKind {
    /// Straight directed edge.
    LineEdge(Edge),
    /// Curved directed edge with editable interior control points.
    SplineEdge(SplineEdge),
    /// Undirected edge joining several entities through a center point.
    HyperEdge(HyperEdge),
}

impl Association {
    /// Wraps `kind` with a fresh identifier.
    pub fn new(kind: AssociationKind) -> Self {
        Self::with_id(ObjectId::new(), kind)
    }

    /// Wraps `kind` with a known identifier.
    pub fn with_id(id: ObjectId, kind: AssociationKind) -> Self {
        Self {
            id,
            color: Color::TRANSPARENT,
            is_selected: false,
            kind,
        }
    }

    /// The identifier.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Variant data.
    pub fn kind(&self) -> &AssociationKind {
        &self.kind
    }

    /// Mutable variant data.
    pub fn kind_mut(&mut self) -> &mut AssociationKind {
        &mut self.kind
    }

    /// The directed edge part, for line and spline edges.
    pub fn as_edge(&self) -> Option<&Edge> {
        match &self.kind {
            AssociationKind::LineEdge(e) => Some(e),
            AssociationKind::SplineEdge(s) => Some(&s.edge),
            AssociationKind::HyperEdge(_) => None,
        }
    }

    /// Mutable directed edge part.
    pub fn as_edge_mut(&mut self) -> Option<&mut Edge> {
        match &mut self.kind {
            AssociationKind::LineEdge(e) => Some(e),
            AssociationKind::SplineEdge(s) => Some(&mut s.edge),
            AssociationKind::HyperEdge(_) => None,
        }
    }

    /// The hyper-edge data, if this is one.
    pub fn as_hyper_edge(&self) -> Option<&HyperEdge> {
        match &self.kind {
            AssociationKind::HyperEdge(h) => Some(h),
            _ => None,
        }
    }

    /// Whether the association refers to `entity` in any role.
    pub fn touches(&self, entity: ObjectId) -> bool {
        match &self.kind {
            AssociationKind::LineEdge(e) => e.touches(entity),
            AssociationKind::SplineEdge(s) => s.edge.touches(entity),
            AssociationKind::HyperEdge(h) => h.targets.contains(&entity),
        }
    }
}

/// One end of a directed edge.
///
/// An endpoint is a placeholder when the entity it names has not been seen
/// by a reference repair yet, or has since been removed. Placeholder
/// endpoints make the edge inert for graph queries.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Endpoint {
    /// Bound to a live entity.
    Resolved(ObjectId),
    /// Only the identifier is known.
    Placeholder(ObjectId),
}

impl Endpoint {
    /// The referenced identifier, resolved or not.
    pub fn id(self) -> ObjectId {
        match self {
            Self::Resolved(id) | Self::Placeholder(id) => id,
        }
    }

    /// The identifier if resolved.
    pub fn resolved(self) -> Option<ObjectId> {
        match self {
            Self::Resolved(id) => Some(id),
            Self::Placeholder(_) => None,
        }
    }

    /// Whether the endpoint is bound to a live entity.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A directed binary edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Tail.
    pub source: Endpoint,
    /// Head.
    pub target: Endpoint,
    /// Attach point on the source rectangle, as a ratio in `[0, 1]²`.
    pub source_rate: Vec2,
    /// Attach point on the target rectangle, as a ratio in `[0, 1]²`.
    pub target_rate: Vec2,
    /// Label.
    pub text: String,
    is_shifting: bool,
}

impl Edge {
    /// A center-anchored edge between two live entities.
    pub fn new(source: ObjectId, target: ObjectId) -> Self {
        Self::from_endpoints(Endpoint::Resolved(source), Endpoint::Resolved(target))
    }

    /// A center-anchored edge whose endpoints still need resolving.
    pub fn placeholder(source: ObjectId, target: ObjectId) -> Self {
        Self::from_endpoints(Endpoint::Placeholder(source), Endpoint::Placeholder(target))
    }

    fn from_endpoints(source: Endpoint, target: Endpoint) -> Self {
        Self {
            source,
            target,
            source_rate: CENTER_RATE,
            target_rate: CENTER_RATE,
            text: String::new(),
            is_shifting: false,
        }
    }

    /// Both endpoints, if both are resolved.
    pub fn resolved_pair(&self) -> Option<(ObjectId, ObjectId)> {
        Some((self.source.resolved()?, self.target.resolved()?))
    }

    /// Whether source and target name the same entity.
    pub fn is_self_loop(&self) -> bool {
        self.source.id() == self.target.id()
    }

    /// Whether a reverse edge exists, as of the last reference repair.
    pub fn is_shifting(&self) -> bool {
        self.is_shifting
    }

    pub(crate) fn set_shifting(&mut self, shifting: bool) {
        self.is_shifting = shifting;
    }

    /// Whether either endpoint names `entity`.
    pub fn touches(&self, entity: ObjectId) -> bool {
        self.source.id() == entity || self.target.id() == entity
    }

    /// Swaps direction, anchors included.
    pub fn reverse(&mut self) {
        core::mem::swap(&mut self.source, &mut self.target);
        core::mem::swap(&mut self.source_rate, &mut self.target_rate);
    }
}

/// A directed edge drawn as a centripetal Catmull-Rom curve.
///
/// The first and last control points track the endpoint centers and the
/// second and second-to-last track the body line ends. Everything between is
/// user-placed and kept as is when the endpoints move.
#[derive(Clone, Debug, PartialEq)]
pub struct SplineEdge {
    /// Connectivity and anchors.
    pub edge: Edge,
    /// Curve parameterization (0.5 is centripetal).
    pub alpha: f64,
    /// Curve tension.
    pub tension: f64,
    control_points: Vec<Point>,
}

impl SplineEdge {
    /// A spline edge with no control points yet; they are generated on the
    /// next refresh against the endpoints.
    pub fn new(edge: Edge) -> Self {
        Self {
            edge,
            alpha: CatmullRomSpline::DEFAULT_ALPHA,
            tension: 0.0,
            control_points: Vec::new(),
        }
    }

    /// A spline edge with explicit control points.
    pub fn with_control_points(edge: Edge, control_points: Vec<Point>) -> Self {
        Self {
            control_points,
            ..Self::new(edge)
        }
    }

    /// All control points.
    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    /// The curve, once there are at least four control points.
    pub fn spline(&self) -> Option<CatmullRomSpline> {
        CatmullRomSpline::with_params(self.control_points.clone(), self.alpha, self.tension)
    }

    /// Inserts a control point halfway between the second- and third-to-last
    /// points. Returns `false` when there are fewer than four points.
    pub fn add_control_point(&mut self) -> bool {
        let n = self.control_points.len();
        if n < 4 {
            return false;
        }
        let mid = self.control_points[n - 3].midpoint(self.control_points[n - 2]);
        self.control_points.insert(n - 2, mid);
        true
    }

    /// Re-pins the end control points to the current endpoint geometry.
    ///
    /// `body` runs from the source border to the target border.
    pub(crate) fn refresh(&mut self, source_center: Point, body: Line, target_center: Point) {
        let n = self.control_points.len();
        let interior: &[Point] = if n >= 4 {
            &self.control_points[2..n - 2]
        } else {
            &[]
        };
        let mut points = Vec::with_capacity(interior.len() + 4);
        points.push(source_center);
        points.push(body.p0);
        points.extend_from_slice(interior);
        points.push(body.p1);
        points.push(target_center);
        self.control_points = points;
    }
}

/// How a hyper-edge decorates its spokes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HyperEdgeArrow {
    /// Plain spokes.
    #[default]
    None,
    /// Arrowheads pointing at the center.
    Inner,
    /// Arrowheads pointing at the targets.
    Outer,
}

/// How a hyper-edge is drawn.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HyperEdgeRenderType {
    /// Spokes from the center to each target.
    #[default]
    Line,
    /// A hull around every target.
    Convex,
}

/// An undirected edge joining several entities.
#[derive(Clone, Debug, PartialEq)]
pub struct HyperEdge {
    /// Joined entities, in order.
    pub targets: Vec<ObjectId>,
    /// Attach ratio on each target's rectangle.
    pub target_rates: Vec<Vec2>,
    /// Center ratio inside the targets' bounding rectangle (three or more targets).
    pub center_rate: Vec2,
    /// Label.
    pub text: String,
    /// Spoke decoration.
    pub arrow: HyperEdgeArrow,
    /// Drawing style.
    pub render_type: HyperEdgeRenderType,
    /// Hull padding; nested hulls around shared targets step outward.
    pub padding: f64,
}

impl HyperEdge {
    /// Hull padding of a hyper-edge that shares no targets.
    pub const BASE_PADDING: f64 = 10.0;

    /// Joins `targets` with centered anchors.
    pub fn new(targets: Vec<ObjectId>) -> Self {
        let target_rates = vec![CENTER_RATE; targets.len()];
        Self {
            targets,
            target_rates,
            center_rate: CENTER_RATE,
            text: String::new(),
            arrow: HyperEdgeArrow::None,
            render_type: HyperEdgeRenderType::Line,
            padding: Self::BASE_PADDING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_swaps_endpoints_and_rates() {
        let (a, b) = (ObjectId::new(), ObjectId::new());
        let mut e = Edge::new(a, b);
        e.source_rate = Vec2::new(0.0, 0.5);
        e.reverse();
        assert_eq!(e.source, Endpoint::Resolved(b));
        assert_eq!(e.target, Endpoint::Resolved(a));
        assert_eq!(e.target_rate, Vec2::new(0.0, 0.5));
    }

    #[test]
    fn placeholder_edges_have_no_resolved_pair() {
        let e = Edge::placeholder(ObjectId::new(), ObjectId::new());
        assert_eq!(e.resolved_pair(), None);
        assert!(!e.source.is_resolved());
    }

    #[test]
    fn refresh_keeps_interior_control_points() {
        let mut s = SplineEdge::new(Edge::new(ObjectId::new(), ObjectId::new()));
        let body = Line::new((10.0, 0.0), (90.0, 0.0));
        s.refresh(Point::ZERO, body, Point::new(100.0, 0.0));
        assert_eq!(s.control_points().len(), 4);
        assert!(s.add_control_point());
        assert_eq!(s.control_points()[2], Point::new(50.0, 0.0));

        let moved = Line::new((10.0, 100.0), (90.0, 100.0));
        s.refresh(Point::new(0.0, 100.0), moved, Point::new(100.0, 100.0));
        assert_eq!(s.control_points().len(), 5);
        assert_eq!(s.control_points()[2], Point::new(50.0, 0.0), "interior point untouched");
        assert_eq!(s.control_points()[1], Point::new(10.0, 100.0));
        assert!(s.spline().is_some());
    }

    #[test]
    fn add_control_point_needs_four_points() {
        let mut s = SplineEdge::new(Edge::new(ObjectId::new(), ObjectId::new()));
        assert!(!s.add_control_point());
    }
}
