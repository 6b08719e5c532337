// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entities: the movable objects placed on a stage.

use kurbo::{Line, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use stagecraft_shapes::{CollisionBox, Shape, bounding_rect};

use crate::id::ObjectId;
use crate::section::Section;
use crate::settings::{StageSettings, TextMeasure};
use crate::types::Color;

bitflags::bitflags! {
    /// Interaction and visibility state of an entity.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u8 {
        /// Selected by the interaction layer.
        const SELECTED           = 0b0000_0001;
        /// Some ancestor section is collapsed.
        const HIDDEN_BY_COLLAPSE = 0b0000_0010;
    }
}

/// A movable stage object.
///
/// The variant-specific data lives in [`EntityKind`]; everything every entity
/// has (identity, details text, selection and collapse state) lives here.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: ObjectId,
    /// Free-form secondary text.
    pub details: String,
    flags: EntityFlags,
    kind: EntityKind,
}

/// The closed set of entity variants.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    /// A labeled box.
    TextNode(TextNode),
    /// A container of other entities.
    Section(Section),
    /// A small junction used to route edges.
    ConnectPoint(ConnectPoint),
    /// A free-hand drawing. Not connectable.
    PenStroke(PenStroke),
    /// A window onto another document.
    Portal(PortalNode),
    /// An inline vector graphic.
    Svg(SvgNode),
}

impl Entity {
    /// Wraps `kind` with a fresh identifier.
    pub fn new(kind: impl Into<EntityKind>) -> Self {
        Self::with_id(ObjectId::new(), kind)
    }

    /// Wraps `kind` with a known identifier.
    pub fn with_id(id: ObjectId, kind: impl Into<EntityKind>) -> Self {
        Self {
            id,
            details: String::new(),
            flags: EntityFlags::empty(),
            kind: kind.into(),
        }
    }

    /// Builder-style details text.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// The identifier.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Variant data.
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Mutable variant data.
    ///
    /// Geometry changed through here bypasses section cascades; prefer the
    /// movement operations on [`Stage`](crate::Stage).
    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    /// State flags.
    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Whether the entity is selected.
    pub fn is_selected(&self) -> bool {
        self.flags.contains(EntityFlags::SELECTED)
    }

    /// Selects or deselects the entity.
    ///
    /// Connect points grow while selected so they are easier to grab.
    pub fn set_selected(&mut self, selected: bool) {
        self.flags.set(EntityFlags::SELECTED, selected);
        if let EntityKind::ConnectPoint(cp) = &mut self.kind {
            cp.set_radius(if selected {
                ConnectPoint::SELECTED_RADIUS
            } else {
                ConnectPoint::RADIUS
            });
        }
    }

    /// Whether an ancestor section is collapsed.
    pub fn is_hidden_by_section_collapse(&self) -> bool {
        self.flags.contains(EntityFlags::HIDDEN_BY_COLLAPSE)
    }

    pub(crate) fn set_hidden_by_section_collapse(&mut self, hidden: bool) {
        self.flags.set(EntityFlags::HIDDEN_BY_COLLAPSE, hidden);
    }

    /// Whether the entity can be an edge endpoint.
    pub fn is_connectable(&self) -> bool {
        !matches!(self.kind, EntityKind::PenStroke(_))
    }

    /// Whether snapping alignment must ignore this entity.
    pub fn is_align_excluded(&self) -> bool {
        matches!(self.kind, EntityKind::PenStroke(_))
    }

    /// The hit-testable footprint.
    pub fn collision_box(&self) -> CollisionBox {
        match &self.kind {
            EntityKind::TextNode(n) => CollisionBox::from_rect(n.rect),
            EntityKind::Section(s) => s.collision_box(),
            EntityKind::ConnectPoint(cp) => CollisionBox::from_rect(cp.rect),
            EntityKind::PenStroke(p) => p.collision_box(),
            EntityKind::Portal(p) => CollisionBox::from_rect(p.rect),
            EntityKind::Svg(s) => CollisionBox::from_rect(s.rect),
        }
    }

    /// Bounding rectangle of the footprint.
    pub fn rectangle(&self) -> Rect {
        match &self.kind {
            EntityKind::TextNode(n) => n.rect,
            EntityKind::Section(s) => s.rectangle(),
            EntityKind::ConnectPoint(cp) => cp.rect,
            EntityKind::PenStroke(p) => p.bounding_rect(),
            EntityKind::Portal(p) => p.rect,
            EntityKind::Svg(s) => s.rect,
        }
    }

    /// Center of [`Entity::rectangle`]; edges anchor here by default.
    pub fn geometry_center(&self) -> Point {
        self.rectangle().center()
    }

    /// Primary text, for the variants that have one.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::TextNode(n) => Some(&n.text),
            EntityKind::Section(s) => Some(&s.text),
            EntityKind::Portal(p) => Some(&p.title),
            EntityKind::ConnectPoint(_) | EntityKind::PenStroke(_) | EntityKind::Svg(_) => None,
        }
    }

    /// Translates this entity's own geometry.
    ///
    /// Section children and father sections are not touched; the stage's
    /// movement operations take care of those.
    pub fn move_by(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        match &mut self.kind {
            EntityKind::TextNode(n) => n.rect = n.rect + delta,
            EntityKind::Section(s) => s.translate(delta),
            EntityKind::ConnectPoint(cp) => cp.rect = cp.rect + delta,
            EntityKind::PenStroke(p) => p.translate(delta),
            EntityKind::Portal(p) => p.rect = p.rect + delta,
            EntityKind::Svg(s) => s.rect = s.rect + delta,
        }
    }

    /// Moves this entity's own geometry so its rectangle starts at `location`.
    pub fn move_to(&mut self, location: Point) {
        let delta = location - self.rectangle().origin();
        self.move_by(delta);
    }

    /// The section data, if this is a section.
    pub fn as_section(&self) -> Option<&Section> {
        match &self.kind {
            EntityKind::Section(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable section data, if this is a section.
    pub fn as_section_mut(&mut self) -> Option<&mut Section> {
        match &mut self.kind {
            EntityKind::Section(s) => Some(s),
            _ => None,
        }
    }

    /// The text node data, if this is a text node.
    pub fn as_text_node(&self) -> Option<&TextNode> {
        match &self.kind {
            EntityKind::TextNode(n) => Some(n),
            _ => None,
        }
    }

    /// Mutable text node data, if this is a text node.
    pub fn as_text_node_mut(&mut self) -> Option<&mut TextNode> {
        match &mut self.kind {
            EntityKind::TextNode(n) => Some(n),
            _ => None,
        }
    }

    /// Whether this is a section.
    pub fn is_section(&self) -> bool {
        matches!(self.kind, EntityKind::Section(_))
    }
}

macro_rules! impl_into_kind {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for EntityKind {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_into_kind! {
    TextNode => TextNode,
    Section => Section,
    ConnectPoint => ConnectPoint,
    PenStroke => PenStroke,
    PortalNode => Portal,
    SvgNode => Svg,
}

/// How a text node's size follows its text.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeAdjust {
    /// Width and height hug the text.
    #[default]
    Auto,
    /// The width was set by hand; only the height follows the text.
    Manual,
}

/// A labeled box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextNode {
    /// Label.
    pub text: String,
    /// Fill color.
    pub color: Color,
    rect: Rect,
    size_adjust: SizeAdjust,
}

impl TextNode {
    /// Narrowest width a hand-resized node may have.
    pub const MIN_WIDTH: f64 = 75.0;

    /// Creates an auto-sized node whose top-left corner is `location`.
    pub fn new(
        text: impl Into<String>,
        location: Point,
        measure: &dyn TextMeasure,
        settings: &StageSettings,
    ) -> Self {
        let mut node = Self {
            text: text.into(),
            color: Color::TRANSPARENT,
            rect: Rect::from_origin_size(location, Size::ZERO),
            size_adjust: SizeAdjust::Auto,
        };
        node.adjust_size(measure, settings);
        node
    }

    /// Creates a node with an explicit rectangle and sizing mode.
    pub fn with_rect(text: impl Into<String>, rect: Rect, size_adjust: SizeAdjust) -> Self {
        Self {
            text: text.into(),
            color: Color::TRANSPARENT,
            rect,
            size_adjust,
        }
    }

    /// The node's rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Current sizing mode.
    pub fn size_adjust(&self) -> SizeAdjust {
        self.size_adjust
    }

    /// Replaces the label and refits the node.
    pub fn set_text(
        &mut self,
        text: impl Into<String>,
        measure: &dyn TextMeasure,
        settings: &StageSettings,
    ) {
        self.text = text.into();
        self.adjust_size(measure, settings);
    }

    /// Refits the node to its text, keeping the top-left corner.
    ///
    /// Manually sized nodes keep their width.
    pub fn adjust_size(&mut self, measure: &dyn TextMeasure, settings: &StageSettings) {
        let text = measure.measure(&self.text, settings.font_size);
        let pad = 2.0 * settings.node_padding;
        let width = match self.size_adjust {
            SizeAdjust::Auto => text.width + pad,
            SizeAdjust::Manual => self.rect.width(),
        };
        self.rect = Rect::from_origin_size(self.rect.origin(), (width, text.height + pad));
    }

    /// Sets a manual width (at least [`TextNode::MIN_WIDTH`]).
    pub fn resize_width(&mut self, width: f64, measure: &dyn TextMeasure, settings: &StageSettings) {
        self.size_adjust = SizeAdjust::Manual;
        self.rect = Rect::from_origin_size(
            self.rect.origin(),
            (width.max(Self::MIN_WIDTH), self.rect.height()),
        );
        self.adjust_size(measure, settings);
    }

    /// Returns to automatic sizing.
    pub fn set_auto_size(&mut self, measure: &dyn TextMeasure, settings: &StageSettings) {
        self.size_adjust = SizeAdjust::Auto;
        self.adjust_size(measure, settings);
    }
}

/// A junction point that edges can route through.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectPoint {
    rect: Rect,
}

impl ConnectPoint {
    /// Radius while idle.
    pub const RADIUS: f64 = 1.0;
    /// Radius while selected.
    pub const SELECTED_RADIUS: f64 = 30.0;

    /// Creates an idle connect point centered on `center`.
    pub fn new(center: Point) -> Self {
        Self {
            rect: Rect::from_center_size(center, (2.0 * Self::RADIUS, 2.0 * Self::RADIUS)),
        }
    }

    /// Current radius.
    pub fn radius(&self) -> f64 {
        self.rect.width() / 2.0
    }

    /// Changes the radius, keeping the center.
    pub fn set_radius(&mut self, radius: f64) {
        self.rect = Rect::from_center_size(self.rect.center(), (2.0 * radius, 2.0 * radius));
    }

    /// The footprint rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }
}

/// One straight piece of a pen stroke.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PenStrokeSegment {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Brush width over this piece.
    pub width: f64,
}

/// A free-hand drawing made of straight segments.
#[derive(Clone, Debug, PartialEq)]
pub struct PenStroke {
    segments: Vec<PenStrokeSegment>,
    /// Ink color.
    pub color: Color,
}

impl PenStroke {
    /// Creates a stroke from its segments.
    pub fn new(segments: Vec<PenStrokeSegment>, color: Color) -> Self {
        Self { segments, color }
    }

    /// Parses the `x,y,width~x,y,width~...` path form.
    ///
    /// Each pair of consecutive points becomes a segment that takes the
    /// width of its first point.
    pub fn from_path(path: &str, color: Color) -> Result<Self, &'static str> {
        if !path.contains('~') {
            return Err("missing `~` separator");
        }
        let points = path
            .split('~')
            .map(parse_stroke_point)
            .collect::<Result<Vec<_>, _>>()?;
        let segments = points
            .windows(2)
            .map(|w| PenStrokeSegment {
                start: w[0].0,
                end: w[1].0,
                width: w[0].1,
            })
            .collect();
        Ok(Self::new(segments, color))
    }

    /// Dumps the `x,y,width~...` path form.
    pub fn to_path(&self) -> String {
        let mut parts: Vec<String> = self
            .segments
            .iter()
            .map(|s| format!("{},{},{}", s.start.x, s.start.y, s.width))
            .collect();
        if let Some(last) = self.segments.last() {
            parts.push(format!("{},{},{}", last.end.x, last.end.y, last.width));
        }
        parts.join("~")
    }

    /// The segments in drawing order.
    pub fn segments(&self) -> &[PenStrokeSegment] {
        &self.segments
    }

    /// The polyline through every segment.
    pub fn path(&self) -> Vec<Point> {
        let mut points: Vec<Point> = self.segments.iter().map(|s| s.start).collect();
        if let Some(last) = self.segments.last() {
            points.push(last.end);
        }
        points
    }

    fn collision_box(&self) -> CollisionBox {
        CollisionBox::new(
            self.segments
                .iter()
                .map(|s| Shape::Line(Line::new(s.start, s.end))),
        )
    }

    fn bounding_rect(&self) -> Rect {
        bounding_rect(
            self.segments.iter().map(|s| Rect::from_points(s.start, s.end)),
            0.0,
        )
    }

    fn translate(&mut self, delta: Vec2) {
        for s in &mut self.segments {
            s.start += delta;
            s.end += delta;
        }
    }
}

fn parse_stroke_point(part: &str) -> Result<(Point, f64), &'static str> {
    let mut fields = part.split(',');
    let mut next = || -> Result<f64, &'static str> {
        fields
            .next()
            .ok_or("point needs `x,y,width`")?
            .trim()
            .parse::<f64>()
            .map_err(|_| "coordinate is not a number")
    };
    let (x, y, width) = (next()?, next()?, next()?);
    if !x.is_finite() || !y.is_finite() {
        return Err("coordinate is not a number");
    }
    if !(width > 0.0 && width.is_finite()) {
        return Err("width must be positive");
    }
    Ok((Point::new(x, y), width))
}

/// A window onto another document.
#[derive(Clone, Debug, PartialEq)]
pub struct PortalNode {
    /// Editable title.
    pub title: String,
    rect: Rect,
    /// Path of the linked document.
    pub portal_path: String,
    /// Camera position inside the linked document.
    pub target_location: Point,
    /// Camera zoom inside the linked document.
    pub camera_scale: f64,
    /// Frame color.
    pub color: Color,
}

impl PortalNode {
    /// Creates a portal occupying `rect`.
    pub fn new(title: impl Into<String>, portal_path: impl Into<String>, rect: Rect) -> Self {
        Self {
            title: title.into(),
            rect,
            portal_path: portal_path.into(),
            target_location: Point::ZERO,
            camera_scale: 1.0,
            color: Color::TRANSPARENT,
        }
    }

    /// The portal frame.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Resizes the frame, keeping its top-left corner.
    pub fn set_size(&mut self, size: Size) {
        self.rect = Rect::from_origin_size(self.rect.origin(), size);
    }
}

/// An inline vector graphic.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgNode {
    /// SVG markup.
    pub content: String,
    rect: Rect,
    original_size: Size,
    scale: f64,
    /// Tint color.
    pub color: Color,
}

impl SvgNode {
    /// Smallest allowed scale.
    pub const MIN_SCALE: f64 = 0.1;
    /// Largest allowed scale.
    pub const MAX_SCALE: f64 = 10.0;

    /// Creates a graphic at `location` with its natural size.
    pub fn new(content: impl Into<String>, location: Point, original_size: Size) -> Self {
        Self {
            content: content.into(),
            rect: Rect::from_origin_size(location, original_size),
            original_size,
            scale: 1.0,
            color: Color::TRANSPARENT,
        }
    }

    /// The graphic's frame.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Current scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Natural size at scale 1.
    pub fn original_size(&self) -> Size {
        self.original_size
    }

    /// Adjusts the scale by `diff`, clamped to
    /// [`MIN_SCALE`](Self::MIN_SCALE)..=[`MAX_SCALE`](Self::MAX_SCALE).
    pub fn scale_by(&mut self, diff: f64) {
        self.set_scale(self.scale + diff);
    }

    /// Sets the scale, clamped, keeping the top-left corner.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE);
        self.rect = Rect::from_origin_size(self.rect.origin(), self.original_size * self.scale);
    }
}
