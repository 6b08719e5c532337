// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The structural description a persistence layer hands to a stage.
//!
//! These types mirror the current document schema: objects are tagged by a
//! `type` string, fields are camelCase, vectors are `[x, y]` arrays and colors
//! are `[r, g, b, a]` arrays. Schema migration belongs to the persistence
//! layer; only the current shape is understood here.

use hashbrown::HashSet;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::association::{
    Association, AssociationKind, CENTER_RATE, Edge, HyperEdge, HyperEdgeArrow,
    HyperEdgeRenderType, SplineEdge,
};
use crate::entity::{
    ConnectPoint, Entity, EntityKind, PenStroke, PortalNode, SizeAdjust, SvgNode, TextNode,
};
use crate::error::LoadError;
use crate::id::ObjectId;
use crate::section::Section;
use crate::stage::Stage;
use crate::types::Color;

/// An `[x, y]` pair.
pub type Vector = [f64; 2];

fn vec2([x, y]: Vector) -> Vec2 {
    Vec2::new(x, y)
}

fn point([x, y]: Vector) -> Point {
    Point::new(x, y)
}

/// A whole document, or a clipboard fragment of one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializedStage {
    /// Entities in registry order.
    pub entities: Vec<SerializedEntity>,
    /// Associations in registry order.
    pub associations: Vec<SerializedAssociation>,
    /// Bookmarked object identifiers.
    pub tags: Vec<ObjectId>,
}

/// A serialized entity, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializedEntity {
    /// `core:text_node`
    #[serde(rename = "core:text_node")]
    TextNode(SerializedTextNode),
    /// `core:section`
    #[serde(rename = "core:section")]
    Section(SerializedSection),
    /// `core:connect_point`
    #[serde(rename = "core:connect_point")]
    ConnectPoint(SerializedConnectPoint),
    /// `core:pen_stroke`
    #[serde(rename = "core:pen_stroke")]
    PenStroke(SerializedPenStroke),
    /// `core:portal_node`
    #[serde(rename = "core:portal_node")]
    PortalNode(SerializedPortalNode),
    /// `core:svg_node`
    #[serde(rename = "core:svg_node")]
    SvgNode(SerializedSvgNode),
}

#[allow(missing_docs, reason = "fields mirror the document schema one to one")]
mod entities {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedTextNode {
        pub uuid: ObjectId,
        pub location: Vector,
        pub size: Vector,
        pub text: String,
        #[serde(default)]
        pub color: Color,
        #[serde(default)]
        pub details: String,
        #[serde(default)]
        pub size_adjust: SizeAdjust,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedSection {
        pub uuid: ObjectId,
        pub location: Vector,
        pub size: Vector,
        pub text: String,
        #[serde(default)]
        pub color: Color,
        #[serde(default)]
        pub children: Vec<ObjectId>,
        #[serde(default)]
        pub is_hidden: bool,
        #[serde(default)]
        pub is_collapsed: bool,
        #[serde(default)]
        pub details: String,
    }

    /// `location` is the center.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedConnectPoint {
        pub uuid: ObjectId,
        pub location: Vector,
        #[serde(default)]
        pub details: String,
    }

    /// `content` is the `x,y,width~...` path; `location` repeats its first
    /// point and is ignored on load.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedPenStroke {
        pub uuid: ObjectId,
        pub content: String,
        #[serde(default)]
        pub location: Vector,
        #[serde(default)]
        pub color: Color,
        #[serde(default)]
        pub details: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedPortalNode {
        pub uuid: ObjectId,
        pub location: Vector,
        pub size: Vector,
        pub title: String,
        pub portal_file_path: String,
        #[serde(default)]
        pub target_location: Vector,
        #[serde(default = "one")]
        pub camera_scale: f64,
        #[serde(default)]
        pub color: Color,
        #[serde(default)]
        pub details: String,
    }

    /// `size` is the scaled size.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedSvgNode {
        pub uuid: ObjectId,
        pub location: Vector,
        pub size: Vector,
        pub content: String,
        #[serde(default = "one")]
        pub scale: f64,
        #[serde(default)]
        pub color: Color,
        #[serde(default)]
        pub details: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedLineEdge {
        pub uuid: ObjectId,
        pub source: ObjectId,
        pub target: ObjectId,
        #[serde(default)]
        pub text: String,
        #[serde(default)]
        pub color: Color,
        #[serde(default = "center")]
        pub source_rect_rate: Vector,
        #[serde(default = "center")]
        pub target_rect_rate: Vector,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedSplineEdge {
        pub uuid: ObjectId,
        pub source: ObjectId,
        pub target: ObjectId,
        #[serde(default)]
        pub text: String,
        #[serde(default)]
        pub color: Color,
        #[serde(default = "center")]
        pub source_rect_rate: Vector,
        #[serde(default = "center")]
        pub target_rect_rate: Vector,
        pub control_points: Vec<Vector>,
        #[serde(default = "half")]
        pub alpha: f64,
        #[serde(default)]
        pub tension: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SerializedHyperEdge {
        pub uuid: ObjectId,
        pub targets: Vec<ObjectId>,
        #[serde(default)]
        pub rect_rates: Vec<Vector>,
        #[serde(default = "center")]
        pub center_rate: Vector,
        #[serde(default)]
        pub text: String,
        #[serde(default)]
        pub color: Color,
        #[serde(default)]
        pub arrow: HyperEdgeArrow,
        #[serde(default)]
        pub render_type: HyperEdgeRenderType,
        #[serde(default = "base_padding")]
        pub padding: f64,
    }

    fn one() -> f64 {
        1.0
    }

    fn half() -> f64 {
        0.5
    }

    fn center() -> Vector {
        [CENTER_RATE.x, CENTER_RATE.y]
    }

    fn base_padding() -> f64 {
        HyperEdge::BASE_PADDING
    }
}

pub use entities::{
    SerializedConnectPoint, SerializedHyperEdge, SerializedLineEdge, SerializedPenStroke,
    SerializedPortalNode, SerializedSection, SerializedSplineEdge, SerializedSvgNode,
    SerializedTextNode,
};

/// A serialized association, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializedAssociation {
    /// `core:line_edge`
    #[serde(rename = "core:line_edge")]
    LineEdge(SerializedLineEdge),
    /// `core:cubic_catmull_rom_spline_edge`
    #[serde(rename = "core:cubic_catmull_rom_spline_edge")]
    SplineEdge(SerializedSplineEdge),
    /// `core:multi_target_undirected_edge`
    #[serde(rename = "core:multi_target_undirected_edge")]
    HyperEdge(SerializedHyperEdge),
}

impl SerializedEntity {
    /// Identifier of the described entity.
    pub fn uuid(&self) -> ObjectId {
        match self {
            Self::TextNode(n) => n.uuid,
            Self::Section(s) => s.uuid,
            Self::ConnectPoint(c) => c.uuid,
            Self::PenStroke(p) => p.uuid,
            Self::PortalNode(p) => p.uuid,
            Self::SvgNode(s) => s.uuid,
        }
    }

    fn to_entity(&self) -> Result<Entity, LoadError> {
        let (kind, details): (EntityKind, &str) = match self {
            Self::TextNode(n) => {
                let rect = Rect::from_origin_size(point(n.location), Size::new(n.size[0], n.size[1]));
                let mut node = TextNode::with_rect(n.text.clone(), rect, n.size_adjust);
                node.color = n.color;
                (node.into(), n.details.as_str())
            }
            Self::Section(s) => {
                let rect = Rect::from_origin_size(point(s.location), Size::new(s.size[0], s.size[1]));
                let mut section = Section::with_rect(s.text.clone(), rect);
                section.color = s.color;
                section.is_hidden = s.is_hidden;
                section.set_child_ids(s.children.clone());
                section.set_collapsed_flag(s.is_collapsed);
                (section.into(), s.details.as_str())
            }
            Self::ConnectPoint(c) => (ConnectPoint::new(point(c.location)).into(), c.details.as_str()),
            Self::PenStroke(p) => {
                let stroke = PenStroke::from_path(&p.content, p.color)
                    .map_err(|reason| LoadError::InvalidPenStroke { id: p.uuid, reason })?;
                (stroke.into(), p.details.as_str())
            }
            Self::PortalNode(p) => {
                let rect = Rect::from_origin_size(point(p.location), Size::new(p.size[0], p.size[1]));
                let mut portal = PortalNode::new(p.title.clone(), p.portal_file_path.clone(), rect);
                portal.target_location = point(p.target_location);
                portal.camera_scale = p.camera_scale;
                portal.color = p.color;
                (portal.into(), p.details.as_str())
            }
            Self::SvgNode(s) => {
                let scale = if s.scale > 0.0 { s.scale } else { 1.0 };
                let original = Size::new(s.size[0] / scale, s.size[1] / scale);
                let mut svg = SvgNode::new(s.content.clone(), point(s.location), original);
                svg.set_scale(scale);
                svg.color = s.color;
                (svg.into(), s.details.as_str())
            }
        };
        Ok(Entity::with_id(self.uuid(), kind).with_details(details))
    }
}

impl From<&Entity> for SerializedEntity {
    fn from(entity: &Entity) -> Self {
        let uuid = entity.id();
        let details = entity.details.clone();
        let origin = |r: Rect| [r.x0, r.y0];
        let size = |r: Rect| [r.width(), r.height()];
        match entity.kind() {
            EntityKind::TextNode(n) => Self::TextNode(SerializedTextNode {
                uuid,
                location: origin(n.rect()),
                size: size(n.rect()),
                text: n.text.clone(),
                color: n.color,
                details,
                size_adjust: n.size_adjust(),
            }),
            EntityKind::Section(s) => Self::Section(SerializedSection {
                uuid,
                location: origin(s.normal_rect()),
                size: size(s.normal_rect()),
                text: s.text.clone(),
                color: s.color,
                children: s.child_ids().to_vec(),
                is_hidden: s.is_hidden,
                is_collapsed: s.is_collapsed(),
                details,
            }),
            EntityKind::ConnectPoint(c) => {
                let center = c.rect().center();
                Self::ConnectPoint(SerializedConnectPoint {
                    uuid,
                    location: [center.x, center.y],
                    details,
                })
            }
            EntityKind::PenStroke(p) => {
                let first = p.path().first().copied().unwrap_or(Point::ZERO);
                Self::PenStroke(SerializedPenStroke {
                    uuid,
                    content: p.to_path(),
                    location: [first.x, first.y],
                    color: p.color,
                    details,
                })
            }
            EntityKind::Portal(p) => Self::PortalNode(SerializedPortalNode {
                uuid,
                location: origin(p.rect()),
                size: size(p.rect()),
                title: p.title.clone(),
                portal_file_path: p.portal_path.clone(),
                target_location: [p.target_location.x, p.target_location.y],
                camera_scale: p.camera_scale,
                color: p.color,
                details,
            }),
            EntityKind::Svg(s) => Self::SvgNode(SerializedSvgNode {
                uuid,
                location: origin(s.rect()),
                size: size(s.rect()),
                content: s.content.clone(),
                scale: s.scale(),
                color: s.color,
                details,
            }),
        }
    }
}

impl SerializedAssociation {
    /// Identifier of the described association.
    pub fn uuid(&self) -> ObjectId {
        match self {
            Self::LineEdge(e) => e.uuid,
            Self::SplineEdge(e) => e.uuid,
            Self::HyperEdge(h) => h.uuid,
        }
    }

    fn to_association(&self) -> Result<Association, LoadError> {
        let (kind, color) = match self {
            Self::LineEdge(e) => {
                let mut edge = Edge::placeholder(e.source, e.target);
                edge.source_rate = vec2(e.source_rect_rate);
                edge.target_rate = vec2(e.target_rect_rate);
                edge.text.clone_from(&e.text);
                (AssociationKind::LineEdge(edge), e.color)
            }
            Self::SplineEdge(e) => {
                if e.control_points.len() < 4 {
                    return Err(LoadError::TooFewControlPoints {
                        id: e.uuid,
                        count: e.control_points.len(),
                    });
                }
                let mut edge = Edge::placeholder(e.source, e.target);
                edge.source_rate = vec2(e.source_rect_rate);
                edge.target_rate = vec2(e.target_rect_rate);
                edge.text.clone_from(&e.text);
                let points = e.control_points.iter().copied().map(point).collect();
                let mut spline = SplineEdge::with_control_points(edge, points);
                spline.alpha = e.alpha;
                spline.tension = e.tension;
                (AssociationKind::SplineEdge(spline), e.color)
            }
            Self::HyperEdge(h) => {
                let mut hyper = HyperEdge::new(h.targets.clone());
                if h.rect_rates.len() == h.targets.len() {
                    hyper.target_rates = h.rect_rates.iter().copied().map(vec2).collect();
                } else if !h.rect_rates.is_empty() {
                    tracing::warn!(
                        edge = %h.uuid,
                        targets = h.targets.len(),
                        rates = h.rect_rates.len(),
                        "hyper-edge rates do not match its targets, centering"
                    );
                }
                hyper.center_rate = vec2(h.center_rate);
                hyper.text.clone_from(&h.text);
                hyper.arrow = h.arrow;
                hyper.render_type = h.render_type;
                hyper.padding = h.padding;
                (AssociationKind::HyperEdge(hyper), h.color)
            }
        };
        let mut association = Association::with_id(self.uuid(), kind);
        association.color = color;
        Ok(association)
    }
}

impl From<&Association> for SerializedAssociation {
    fn from(association: &Association) -> Self {
        let uuid = association.id();
        let color = association.color;
        let rate = |v: Vec2| [v.x, v.y];
        match association.kind() {
            AssociationKind::LineEdge(e) => Self::LineEdge(SerializedLineEdge {
                uuid,
                source: e.source.id(),
                target: e.target.id(),
                text: e.text.clone(),
                color,
                source_rect_rate: rate(e.source_rate),
                target_rect_rate: rate(e.target_rate),
            }),
            AssociationKind::SplineEdge(s) => Self::SplineEdge(SerializedSplineEdge {
                uuid,
                source: s.edge.source.id(),
                target: s.edge.target.id(),
                text: s.edge.text.clone(),
                color,
                source_rect_rate: rate(s.edge.source_rate),
                target_rect_rate: rate(s.edge.target_rate),
                control_points: s.control_points().iter().map(|p| [p.x, p.y]).collect(),
                alpha: s.alpha,
                tension: s.tension,
            }),
            AssociationKind::HyperEdge(h) => Self::HyperEdge(SerializedHyperEdge {
                uuid,
                targets: h.targets.clone(),
                rect_rates: h.target_rates.iter().copied().map(rate).collect(),
                center_rate: rate(h.center_rate),
                text: h.text.clone(),
                color,
                arrow: h.arrow,
                render_type: h.render_type,
                padding: h.padding,
            }),
        }
    }
}

impl Stage {
    /// Adds everything `data` describes, then repairs references.
    ///
    /// Every object is validated before anything is inserted, so on error the
    /// stage is left exactly as it was. Edge endpoints and section children
    /// may name objects that do not exist; those stay unresolved, as
    /// [`update_references`](Self::update_references) describes.
    pub fn load_serialized(&mut self, data: &SerializedStage) -> Result<(), LoadError> {
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let ids = data
            .entities
            .iter()
            .map(SerializedEntity::uuid)
            .chain(data.associations.iter().map(SerializedAssociation::uuid));
        for id in ids {
            if !seen.insert(id) || self.contains(id) {
                return Err(LoadError::DuplicateId(id));
            }
        }

        let entities = data
            .entities
            .iter()
            .map(SerializedEntity::to_entity)
            .collect::<Result<Vec<_>, _>>()?;
        let associations = data
            .associations
            .iter()
            .map(SerializedAssociation::to_association)
            .collect::<Result<Vec<_>, _>>()?;

        for entity in entities {
            self.add_entity(entity);
        }
        for association in associations {
            self.add_association(association);
        }
        for tag in &data.tags {
            if !self.tags.contains(tag) {
                self.tags.push(*tag);
            }
        }
        self.update_references();
        tracing::debug!(
            entities = data.entities.len(),
            associations = data.associations.len(),
            "serialized stage loaded"
        );
        Ok(())
    }

    /// Builds a stage with default settings from `data`.
    pub fn from_serialized(data: &SerializedStage) -> Result<Self, LoadError> {
        let mut stage = Self::new();
        stage.load_serialized(data)?;
        Ok(stage)
    }

    /// Describes the whole stage.
    pub fn to_serialized(&self) -> SerializedStage {
        SerializedStage {
            entities: self.entities.values().map(SerializedEntity::from).collect(),
            associations: self
                .associations
                .values()
                .map(SerializedAssociation::from)
                .collect(),
            tags: self.tags.clone(),
        }
    }

    /// Describes a fragment: `ids` together with everything inside the
    /// sections among them, plus the associations whose every endpoint is in
    /// that set. Tags are not included.
    pub fn to_serialized_selected(&self, ids: &[ObjectId]) -> SerializedStage {
        let included = self.all_entities_in_sections(ids);
        let members: HashSet<ObjectId> = included.iter().copied().collect();
        let entities = included
            .iter()
            .filter_map(|id| self.entity(*id))
            .map(SerializedEntity::from)
            .collect();
        let associations = self
            .associations
            .values()
            .filter(|a| match a.kind() {
                AssociationKind::LineEdge(e) => {
                    members.contains(&e.source.id()) && members.contains(&e.target.id())
                }
                AssociationKind::SplineEdge(s) => {
                    members.contains(&s.edge.source.id()) && members.contains(&s.edge.target.id())
                }
                AssociationKind::HyperEdge(h) => h.targets.iter().all(|t| members.contains(t)),
            })
            .map(SerializedAssociation::from)
            .collect();
        SerializedStage {
            entities,
            associations,
            tags: Vec::new(),
        }
    }
}
