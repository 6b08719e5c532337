// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sections: entities that contain other entities.

use kurbo::{Point, Rect, Size, Vec2};
use stagecraft_shapes::{CollisionBox, RectExt, Shape, bounding_rect};

use crate::id::ObjectId;
use crate::settings::{StageSettings, TextMeasure};
use crate::types::Color;

/// A titled container.
///
/// Children are referenced by identifier only. `child_ids` is the
/// authoritative membership list; `children` is the subset that currently
/// resolves to live entities and is rebuilt by
/// [`Stage::update_references`](crate::Stage::update_references).
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Title.
    pub text: String,
    /// Fill color.
    pub color: Color,
    /// Hidden from rendering (kept for documents that set it).
    pub is_hidden: bool,
    child_ids: Vec<ObjectId>,
    children: Vec<ObjectId>,
    is_collapsed: bool,
    rect: Rect,
    collapsed_rect: Rect,
    title_height: f64,
}

impl Section {
    /// Creates an empty section whose top-left corner is `location`.
    pub fn new(
        text: impl Into<String>,
        location: Point,
        measure: &dyn TextMeasure,
        settings: &StageSettings,
    ) -> Self {
        let mut section = Self::with_rect(text, Rect::from_origin_size(location, Size::ZERO));
        section.adjust_location_and_size(core::iter::empty(), measure, settings);
        section
    }

    /// Creates a section with an explicit rectangle and no children.
    ///
    /// The rectangle is replaced by the next
    /// [`adjust_location_and_size`](Self::adjust_location_and_size).
    pub fn with_rect(text: impl Into<String>, rect: Rect) -> Self {
        Self {
            text: text.into(),
            color: Color::TRANSPARENT,
            is_hidden: false,
            child_ids: Vec::new(),
            children: Vec::new(),
            is_collapsed: false,
            rect,
            collapsed_rect: Rect::from_origin_size(rect.origin(), Size::ZERO),
            title_height: StageSettings::default().section_title_height,
        }
    }

    /// Authoritative member identifiers, in order.
    pub fn child_ids(&self) -> &[ObjectId] {
        &self.child_ids
    }

    /// Members that resolved to live entities at the last reference repair.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Whether `id` is a direct member.
    pub fn has_child(&self, id: ObjectId) -> bool {
        self.children.contains(&id)
    }

    /// Whether the section is collapsed to its title.
    pub fn is_collapsed(&self) -> bool {
        self.is_collapsed
    }

    pub(crate) fn set_collapsed_flag(&mut self, collapsed: bool) {
        self.is_collapsed = collapsed;
    }

    pub(crate) fn set_child_ids(&mut self, ids: Vec<ObjectId>) {
        self.child_ids = ids;
    }

    pub(crate) fn set_resolved_children(&mut self, ids: Vec<ObjectId>) {
        self.children = ids;
    }

    /// Appends a member to both lists unless it is already present.
    pub(crate) fn push_child(&mut self, id: ObjectId) {
        if !self.child_ids.contains(&id) {
            self.child_ids.push(id);
        }
        if !self.children.contains(&id) {
            self.children.push(id);
        }
    }

    /// Drops a member from both lists. Returns whether it was present.
    pub(crate) fn remove_child(&mut self, id: ObjectId) -> bool {
        let before = self.child_ids.len() + self.children.len();
        self.child_ids.retain(|c| *c != id);
        self.children.retain(|c| *c != id);
        before != self.child_ids.len() + self.children.len()
    }

    /// The expanded rectangle, title strip included.
    pub fn normal_rect(&self) -> Rect {
        self.rect
    }

    /// The title-only rectangle shown while collapsed.
    pub fn collapsed_rect(&self) -> Rect {
        self.collapsed_rect
    }

    /// The title strip across the top of the expanded rectangle.
    pub fn title_rect(&self) -> Rect {
        Rect::new(
            self.rect.x0,
            self.rect.y0,
            self.rect.x1,
            (self.rect.y0 + self.title_height).min(self.rect.y1),
        )
    }

    /// The rectangle currently occupied: collapsed or expanded.
    pub fn rectangle(&self) -> Rect {
        if self.is_collapsed {
            self.collapsed_rect
        } else {
            self.rect
        }
    }

    /// Border lines and title strip, or the title box while collapsed.
    ///
    /// The interior stays empty so clicks fall through to the children.
    pub fn collision_box(&self) -> CollisionBox {
        if self.is_collapsed {
            return CollisionBox::from_rect(self.collapsed_rect);
        }
        let mut shapes: Vec<Shape> = self.rect.bounding_lines().into_iter().map(Shape::Line).collect();
        shapes.push(Shape::Rect(self.title_rect()));
        CollisionBox::new(shapes)
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect + delta;
        self.collapsed_rect = self.collapsed_rect + delta;
    }

    /// Refits the section around `children_rects`.
    ///
    /// With no children the section keeps its top-left corner and becomes a
    /// minimum-size box wide enough for its title. Otherwise it is the
    /// children's bounds plus `section_padding` on every side, at least as wide
    /// as the title, with a `section_title_height` strip added on top.
    pub fn adjust_location_and_size<I>(
        &mut self,
        children_rects: I,
        measure: &dyn TextMeasure,
        settings: &StageSettings,
    ) where
        I: IntoIterator<Item = Rect>,
    {
        self.title_height = settings.section_title_height;
        let title = measure.measure(&self.text, settings.font_size);
        let title_width = title.width + 2.0 * settings.node_padding;

        let mut rects = children_rects.into_iter().peekable();
        self.rect = if rects.peek().is_none() {
            Rect::from_origin_size(
                self.rect.origin(),
                (
                    title_width.max(settings.section_min_size),
                    settings.section_min_size,
                ),
            )
        } else {
            let mut r = bounding_rect(rects, settings.section_padding);
            if r.width() < title_width {
                r.x1 = r.x0 + title_width;
            }
            r.y0 -= settings.section_title_height;
            r
        };
        self.collapsed_rect = Rect::from_center_size(
            self.rect.center(),
            (
                title.width + 2.0 * settings.node_padding,
                title.height + 2.0 * settings.node_padding,
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MonospaceMeasure;

    #[test]
    fn empty_section_is_minimum_size_at_its_origin() {
        let settings = StageSettings::default();
        let s = Section::new("S", Point::new(10.0, 10.0), &MonospaceMeasure, &settings);
        assert_eq!(s.normal_rect(), Rect::new(10.0, 10.0, 110.0, 110.0));
    }

    #[test]
    fn long_title_widens_empty_section() {
        let settings = StageSettings::default();
        let s = Section::new("a long section title", Point::ZERO, &MonospaceMeasure, &settings);
        assert!(s.normal_rect().width() > settings.section_min_size);
        assert_eq!(s.normal_rect().height(), settings.section_min_size);
    }

    #[test]
    fn fits_children_with_padding_and_title_strip() {
        let settings = StageSettings::default();
        let mut s = Section::with_rect("S", Rect::ZERO);
        s.adjust_location_and_size(
            [
                Rect::new(100.0, 100.0, 200.0, 150.0),
                Rect::new(300.0, 200.0, 400.0, 260.0),
            ],
            &MonospaceMeasure,
            &settings,
        );
        assert_eq!(s.normal_rect(), Rect::new(70.0, 20.0, 430.0, 290.0));
        assert_eq!(s.title_rect(), Rect::new(70.0, 20.0, 430.0, 70.0));
    }

    #[test]
    fn expanded_collision_box_is_hollow() {
        let settings = StageSettings::default();
        let s = Section::new("S", Point::ZERO, &MonospaceMeasure, &settings);
        let cb = s.collision_box();
        assert_eq!(cb.shapes().len(), 5);
        assert!(cb.contains_point(Point::new(50.0, 10.0)), "title strip is solid");
        assert!(!cb.contains_point(Point::new(50.0, 80.0)), "interior is hollow");
        assert!(cb.contains_point(Point::new(0.0, 80.0)), "left border");
    }

    #[test]
    fn collapsed_section_uses_title_box() {
        let settings = StageSettings::default();
        let mut s = Section::new("S", Point::ZERO, &MonospaceMeasure, &settings);
        s.set_collapsed_flag(true);
        assert_eq!(s.rectangle(), s.collapsed_rect());
        assert_eq!(s.rectangle().center(), s.normal_rect().center());
        assert!(s.collision_box().contains_point(s.normal_rect().center()));
    }

    #[test]
    fn membership_helpers_keep_lists_in_step() {
        let mut s = Section::with_rect("S", Rect::ZERO);
        let a = ObjectId::new();
        s.push_child(a);
        s.push_child(a);
        assert_eq!(s.child_ids(), &[a]);
        assert!(s.has_child(a));
        assert!(s.remove_child(a));
        assert!(!s.remove_child(a));
        assert!(s.children().is_empty());
    }
}
