// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge creation, editing, and derived edge geometry.

use kurbo::{Circle, Line, Point, Vec2};
use stagecraft_shapes::{CollisionBox, RectExt, Shape, bounding_rect};

use crate::association::{
    Association, AssociationKind, CENTER_RATE, Edge, Endpoint, HyperEdge, SplineEdge,
};
use crate::entity::{Entity, EntityKind};
use crate::id::ObjectId;
use crate::stage::Stage;
use crate::types::Direction;

/// How far a shifting edge bows away from the straight line between its
/// endpoints.
pub const SHIFTING_OFFSET: f64 = 50.0;

/// Anchor ratio hugging one side of a rectangle, or the center for `None`.
pub fn side_rate(direction: Option<Direction>) -> Vec2 {
    match direction {
        None => CENTER_RATE,
        Some(Direction::Left) => Vec2::new(0.01, 0.5),
        Some(Direction::Right) => Vec2::new(0.99, 0.5),
        Some(Direction::Up) => Vec2::new(0.5, 0.01),
        Some(Direction::Down) => Vec2::new(0.5, 0.99),
    }
}

impl Stage {
    // ---- derived geometry ----

    /// The visible part of `edge`: the segment between the two endpoint
    /// rectangles' borders along the line joining their anchor points.
    pub fn edge_body_line(&self, edge: &Edge) -> Option<Line> {
        let src = self.entity(edge.source.id())?.rectangle();
        let tgt = self.entity(edge.target.id())?.rectangle();
        let center_line = Line::new(
            src.point_at_rate(edge.source_rate),
            tgt.point_at_rate(edge.target_rate),
        );
        Some(Line::new(
            src.line_intersection_point(&center_line),
            tgt.line_intersection_point(&center_line),
        ))
    }

    /// Where a shifting edge bends: the midpoint of the endpoint centers,
    /// pushed sideways so an edge and its reverse twin do not overlap.
    pub fn edge_shifting_mid_point(&self, edge: &Edge) -> Option<Point> {
        let src = self.entity(edge.source.id())?.geometry_center();
        let tgt = self.entity(edge.target.id())?.geometry_center();
        let dir = tgt - src;
        let len = dir.hypot();
        let normal = if len > 0.0 {
            Vec2::new(-dir.y, dir.x) / len
        } else {
            Vec2::ZERO
        };
        Some(src.midpoint(tgt) + normal * SHIFTING_OFFSET)
    }

    /// Where the spokes of a hyper-edge meet.
    ///
    /// With two members this is the midpoint of their centers, like a binary
    /// edge; otherwise the `center_rate` point inside the members' bounds.
    pub fn hyper_edge_center(&self, hyper: &HyperEdge) -> Option<Point> {
        let members: Vec<&Entity> = self.entities_by_ids(&hyper.targets);
        match members.as_slice() {
            [] => None,
            [a, b] => Some(a.geometry_center().midpoint(b.geometry_center())),
            _ => Some(
                bounding_rect(members.iter().map(|e| e.rectangle()), 0.0)
                    .point_at_rate(hyper.center_rate),
            ),
        }
    }

    /// The hit-testable footprint of an association.
    ///
    /// Returns `None` when an endpoint is missing from the registry.
    pub fn association_collision_box(&self, id: ObjectId) -> Option<CollisionBox> {
        let association = self.association(id)?;
        match association.kind() {
            AssociationKind::LineEdge(edge) => self.line_edge_collision_box(edge),
            AssociationKind::SplineEdge(spline) => {
                if spline.edge.is_self_loop() {
                    return self.line_edge_collision_box(&spline.edge);
                }
                match spline.spline() {
                    Some(curve) => Some(CollisionBox::new([Shape::Spline(curve)])),
                    None => self.line_edge_collision_box(&spline.edge),
                }
            }
            AssociationKind::HyperEdge(hyper) => {
                let center = self.hyper_edge_center(hyper)?;
                Some(CollisionBox::new(
                    self.entities_by_ids(&hyper.targets)
                        .into_iter()
                        .map(|e| Shape::Line(Line::new(center, e.geometry_center()))),
                ))
            }
        }
    }

    fn line_edge_collision_box(&self, edge: &Edge) -> Option<CollisionBox> {
        let src = self.entity(edge.source.id())?.rectangle();
        if edge.is_self_loop() {
            let circle = Circle::new(src.origin(), src.height() / 2.0);
            return Some(CollisionBox::new([Shape::Circle(circle)]));
        }
        if edge.is_shifting() {
            let mid = self.edge_shifting_mid_point(edge)?;
            let tgt = self.entity(edge.target.id())?.rectangle();
            return Some(CollisionBox::new([
                Shape::Line(Line::new(src.center(), mid)),
                Shape::Line(Line::new(mid, tgt.center())),
            ]));
        }
        Some(CollisionBox::new([Shape::Line(self.edge_body_line(edge)?)]))
    }

    // ---- connecting ----

    fn can_connect(&self, from: ObjectId, to: ObjectId) -> bool {
        let Some(source) = self.connectable_entity(from) else {
            tracing::debug!(%from, "connect refused: source is not a connectable entity");
            return false;
        };
        if self.connectable_entity(to).is_none() {
            tracing::debug!(%to, "connect refused: target is not a connectable entity");
            return false;
        }
        if from == to {
            if matches!(source.kind(), EntityKind::ConnectPoint(_)) {
                tracing::debug!(%from, "connect refused: connect points never loop");
                return false;
            }
            if !self.settings.allow_cycle_edges {
                tracing::debug!(%from, "connect refused: self-loops are disabled");
                return false;
            }
        }
        if self.is_connected(from, to) {
            tracing::debug!(%from, %to, "connect refused: already connected");
            return false;
        }
        true
    }

    /// Adds a straight edge `from → to` anchored at both centers.
    ///
    /// Refuses (and returns `false`) for unknown or non-connectable
    /// endpoints, for duplicates, and for self-loops unless
    /// [`allow_cycle_edges`](crate::StageSettings::allow_cycle_edges) is set.
    pub fn connect_entity(&mut self, from: ObjectId, to: ObjectId) -> bool {
        self.connect_entity_with_rates(from, to, CENTER_RATE, CENTER_RATE)
    }

    /// Like [`connect_entity`](Self::connect_entity) with explicit anchors.
    pub fn connect_entity_with_rates(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        source_rate: Vec2,
        target_rate: Vec2,
    ) -> bool {
        if !self.can_connect(from, to) {
            return false;
        }
        let mut edge = Edge::new(from, to);
        edge.source_rate = source_rate;
        edge.target_rate = target_rate;
        let id = self.add_association(Association::new(AssociationKind::LineEdge(edge)));
        self.refresh_shifting();
        tracing::debug!(edge = %id, %from, %to, "entities connected");
        true
    }

    /// Adds a curved edge `from → to`, with the same refusal rules as
    /// [`connect_entity`](Self::connect_entity).
    ///
    /// The new curve starts with four control points: both centers and the
    /// two ends of the straight body line.
    pub fn connect_entity_with_spline(&mut self, from: ObjectId, to: ObjectId) -> bool {
        if !self.can_connect(from, to) {
            return false;
        }
        let spline = SplineEdge::new(Edge::new(from, to));
        let id = self.add_association(Association::new(AssociationKind::SplineEdge(spline)));
        self.refresh_shifting();
        self.refresh_spline_edges();
        tracing::debug!(edge = %id, %from, %to, "entities connected with a spline");
        true
    }

    /// Connects every entity in `froms` to `to`. Returns how many edges were
    /// created; refused pairs are skipped.
    pub fn connect_multiple_entities(
        &mut self,
        froms: &[ObjectId],
        to: ObjectId,
        source_rate: Vec2,
        target_rate: Vec2,
    ) -> usize {
        froms
            .iter()
            .filter(|from| self.connect_entity_with_rates(**from, to, source_rate, target_rate))
            .count()
    }

    /// Joins `targets` with one undirected hyper-edge.
    ///
    /// Needs at least two distinct connectable entities. Hull padding steps
    /// outward past any hyper-edge already around one of the targets.
    pub fn create_hyper_edge(&mut self, targets: &[ObjectId]) -> Option<ObjectId> {
        let mut members: Vec<ObjectId> = Vec::with_capacity(targets.len());
        for t in targets {
            if self.connectable_entity(*t).is_some() && !members.contains(t) {
                members.push(*t);
            }
        }
        if members.len() < 2 {
            tracing::debug!(count = members.len(), "hyper-edge refused: too few members");
            return None;
        }
        let padding = members
            .iter()
            .flat_map(|m| self.hyper_edges_by_node(*m))
            .filter_map(|id| self.association(id)?.as_hyper_edge().map(|h| h.padding))
            .fold(0.0_f64, f64::max);
        let mut hyper = HyperEdge::new(members);
        hyper.padding = (padding + HyperEdge::BASE_PADDING).max(HyperEdge::BASE_PADDING);
        let id = self.add_association(Association::new(AssociationKind::HyperEdge(hyper)));
        tracing::debug!(edge = %id, "hyper-edge created");
        Some(id)
    }

    // ---- editing ----

    /// Flips the direction of each listed edge. Returns how many flipped.
    ///
    /// An edge whose reverse already exists stays as it is, so no two edges
    /// ever run the same way between the same pair.
    pub fn reverse_edges(&mut self, edges: &[ObjectId]) -> usize {
        let mut flipped = 0;
        for id in edges {
            let Some((source, target)) = self
                .association(*id)
                .and_then(Association::as_edge)
                .map(|e| (e.source.id(), e.target.id()))
            else {
                continue;
            };
            if self.edges_between(target, source).iter().any(|e| e != id) {
                tracing::debug!(edge = %id, "reverse refused: the reversed edge already exists");
                continue;
            }
            if let Some(edge) = self.associations.get_mut(id).and_then(Association::as_edge_mut) {
                edge.reverse();
                flipped += 1;
            }
        }
        if flipped > 0 {
            self.refresh_shifting();
            self.refresh_spline_edges();
        }
        flipped
    }

    /// Re-points an edge at `new_target`.
    ///
    /// The new pair must pass the same rules as
    /// [`connect_entity`](Self::connect_entity). Returns `false` if the edge
    /// is unknown, nothing would change, or the rules refuse the pair.
    pub fn change_edge_target(&mut self, edge: ObjectId, new_target: ObjectId) -> bool {
        let Some((source, target)) = self
            .association(edge)
            .and_then(Association::as_edge)
            .map(|e| (e.source.id(), e.target.id()))
        else {
            return false;
        };
        if target == new_target || !self.can_connect(source, new_target) {
            return false;
        }
        let Some(e) = self.associations.get_mut(&edge).and_then(Association::as_edge_mut) else {
            return false;
        };
        e.target = Endpoint::Resolved(new_target);
        self.refresh_shifting();
        self.refresh_spline_edges();
        true
    }

    /// Moves the source (or target) anchor of each listed edge to one side of
    /// its rectangle, or back to the center for `None`.
    pub fn change_edges_connect_location(
        &mut self,
        edges: &[ObjectId],
        direction: Option<Direction>,
        is_source: bool,
    ) {
        let rate = side_rate(direction);
        for id in edges {
            if let Some(edge) = self.associations.get_mut(id).and_then(Association::as_edge_mut) {
                if is_source {
                    edge.source_rate = rate;
                } else {
                    edge.target_rate = rate;
                }
            }
        }
        self.refresh_spline_edges();
    }

    /// Deletes one association of any kind. Returns whether it existed.
    pub fn delete_association(&mut self, id: ObjectId) -> bool {
        let removed = self.remove_association(id).is_some();
        if removed {
            self.update_references();
        }
        removed
    }

    /// Deletes a directed edge whose endpoints are both live.
    ///
    /// Returns `false` for anything else, leaving it in place.
    pub fn delete_edge(&mut self, id: ObjectId) -> bool {
        let live = self
            .association(id)
            .and_then(Association::as_edge)
            .is_some_and(|e| self.contains_entity(e.source.id()) && self.contains_entity(e.target.id()));
        live && self.delete_association(id)
    }
}
