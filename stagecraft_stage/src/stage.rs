// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage registry: storage, lookups, and reference repair.

use core::fmt;

use hashbrown::HashSet;
use indexmap::IndexMap;
use kurbo::{Point, Rect};
use stagecraft_shapes::bounding_rect;

use crate::association::{Association, AssociationKind, Endpoint};
use crate::entity::{ConnectPoint, Entity, EntityKind, TextNode};
use crate::id::ObjectId;
use crate::section::Section;
use crate::settings::{MonospaceMeasure, StageSettings, TextMeasure};

/// The single source of truth for one diagram.
///
/// A `Stage` owns every [`Entity`] and [`Association`], keyed by
/// [`ObjectId`] in insertion order. Sections, edges, and tags refer to
/// objects by identifier only, so nothing outside the registry ever holds a
/// reference that a mutation could invalidate.
///
/// Several stages can coexist (for example one per portal); there is no
/// global state.
///
/// ## Example
///
/// ```rust
/// use kurbo::Point;
/// use stagecraft_stage::Stage;
///
/// let mut stage = Stage::new();
/// let a = stage.create_text_node("A", Point::new(0.0, 0.0));
/// let b = stage.create_text_node("B", Point::new(300.0, 0.0));
/// assert!(stage.connect_entity(a, b));
/// assert!(!stage.connect_entity(a, b), "duplicate edges are refused");
///
/// assert_eq!(stage.node_children(a), vec![b]);
/// assert!(stage.is_tree(a));
/// ```
pub struct Stage {
    pub(crate) entities: IndexMap<ObjectId, Entity>,
    pub(crate) associations: IndexMap<ObjectId, Association>,
    pub(crate) tags: Vec<ObjectId>,
    pub(crate) settings: StageSettings,
    pub(crate) measure: Box<dyn TextMeasure>,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = self.sections().count();
        f.debug_struct("Stage")
            .field("entities", &self.entities.len())
            .field("sections", &sections)
            .field("associations", &self.associations.len())
            .field("tags", &self.tags.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// An empty stage with default settings and monospace text measurement.
    pub fn new() -> Self {
        Self::with_settings(StageSettings::default())
    }

    /// An empty stage with `settings`.
    pub fn with_settings(settings: StageSettings) -> Self {
        Self::with_measure(settings, MonospaceMeasure)
    }

    /// An empty stage that sizes text through `measure`.
    pub fn with_measure(settings: StageSettings, measure: impl TextMeasure + 'static) -> Self {
        Self {
            entities: IndexMap::new(),
            associations: IndexMap::new(),
            tags: Vec::new(),
            settings,
            measure: Box::new(measure),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    /// Mutable settings.
    pub fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    /// The text measurement in use.
    pub fn measure(&self) -> &dyn TextMeasure {
        &*self.measure
    }

    /// Whether the stage holds no entities and no associations.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.associations.is_empty()
    }

    // ---- lookups ----

    /// The entity with `id`.
    pub fn entity(&self, id: ObjectId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable entity with `id`.
    ///
    /// Geometry changed through here bypasses section cascades.
    pub fn entity_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// The association with `id`.
    pub fn association(&self, id: ObjectId) -> Option<&Association> {
        self.associations.get(&id)
    }

    /// Mutable association with `id`.
    pub fn association_mut(&mut self, id: ObjectId) -> Option<&mut Association> {
        self.associations.get_mut(&id)
    }

    /// Whether an entity with `id` is registered.
    pub fn contains_entity(&self, id: ObjectId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Whether `id` names a registered entity or association.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entities.contains_key(&id) || self.associations.contains_key(&id)
    }

    /// Every entity, in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Every association, in insertion order.
    pub fn associations(&self) -> impl Iterator<Item = &Association> + '_ {
        self.associations.values()
    }

    /// The registered entities among `ids`, in the order given.
    pub fn entities_by_ids(&self, ids: &[ObjectId]) -> Vec<&Entity> {
        ids.iter().filter_map(|id| self.entities.get(id)).collect()
    }

    /// Every section.
    pub fn sections(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(|e| e.is_section())
    }

    /// The section data of `id`, if it is a section.
    pub fn section(&self, id: ObjectId) -> Option<&Section> {
        self.entities.get(&id).and_then(Entity::as_section)
    }

    /// Whether `id` names a section.
    pub fn is_section(&self, id: ObjectId) -> bool {
        self.section(id).is_some()
    }

    /// Every text node.
    pub fn text_nodes(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(|e| matches!(e.kind(), EntityKind::TextNode(_)))
    }

    /// Every connect point.
    pub fn connect_points(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(|e| matches!(e.kind(), EntityKind::ConnectPoint(_)))
    }

    /// Every pen stroke.
    pub fn pen_strokes(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(|e| matches!(e.kind(), EntityKind::PenStroke(_)))
    }

    /// Every portal.
    pub fn portal_nodes(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(|e| matches!(e.kind(), EntityKind::Portal(_)))
    }

    /// Every SVG node.
    pub fn svg_nodes(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(|e| matches!(e.kind(), EntityKind::Svg(_)))
    }

    /// Every entity that can be an edge endpoint.
    pub fn connectable_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(|e| e.is_connectable())
    }

    /// The entity with `id` if it can be an edge endpoint.
    pub fn connectable_entity(&self, id: ObjectId) -> Option<&Entity> {
        self.entities.get(&id).filter(|e| e.is_connectable())
    }

    /// Every straight edge.
    pub fn line_edges(&self) -> impl Iterator<Item = &Association> + '_ {
        self.associations
            .values()
            .filter(|a| matches!(a.kind(), AssociationKind::LineEdge(_)))
    }

    /// Every spline edge.
    pub fn spline_edges(&self) -> impl Iterator<Item = &Association> + '_ {
        self.associations
            .values()
            .filter(|a| matches!(a.kind(), AssociationKind::SplineEdge(_)))
    }

    /// Every hyper-edge.
    pub fn hyper_edges(&self) -> impl Iterator<Item = &Association> + '_ {
        self.associations
            .values()
            .filter(|a| matches!(a.kind(), AssociationKind::HyperEdge(_)))
    }

    /// Every directed edge, straight or curved.
    pub fn edges(&self) -> impl Iterator<Item = &Association> + '_ {
        self.associations.values().filter(|a| a.as_edge().is_some())
    }

    /// `(edge, source, target)` for every directed edge with both ends resolved.
    pub(crate) fn resolved_edges(&self) -> impl Iterator<Item = (ObjectId, ObjectId, ObjectId)> + '_ {
        self.associations.values().filter_map(|a| {
            let (s, t) = a.as_edge()?.resolved_pair()?;
            Some((a.id(), s, t))
        })
    }

    // ---- selection ----

    /// Selected entities.
    pub fn selected_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(|e| e.is_selected())
    }

    /// Identifiers of selected entities.
    pub fn selected_entity_ids(&self) -> Vec<ObjectId> {
        self.selected_entities().map(Entity::id).collect()
    }

    /// Selected associations.
    pub fn selected_associations(&self) -> impl Iterator<Item = &Association> + '_ {
        self.associations.values().filter(|a| a.is_selected)
    }

    /// Selects or deselects one entity. Returns `false` for unknown ids.
    pub fn set_selected(&mut self, id: ObjectId, selected: bool) -> bool {
        match self.entities.get_mut(&id) {
            Some(e) => {
                e.set_selected(selected);
                true
            }
            None => false,
        }
    }

    /// Selects every entity and association.
    pub fn select_all(&mut self) {
        for e in self.entities.values_mut() {
            e.set_selected(true);
        }
        for a in self.associations.values_mut() {
            a.is_selected = true;
        }
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        for e in self.entities.values_mut() {
            e.set_selected(false);
        }
        for a in self.associations.values_mut() {
            a.is_selected = false;
        }
    }

    // ---- insertion and removal ----

    /// Registers an entity and returns its identifier.
    ///
    /// # Panics
    ///
    /// Identifiers must be unique; registering one twice is a caller error
    /// and panics in debug builds.
    pub fn add_entity(&mut self, entity: Entity) -> ObjectId {
        let id = entity.id();
        debug_assert!(!self.contains(id), "duplicate ObjectId {id}");
        self.entities.insert(id, entity);
        tracing::trace!(%id, "entity added");
        id
    }

    /// Registers an association and returns its identifier.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the identifier is already registered.
    pub fn add_association(&mut self, association: Association) -> ObjectId {
        let id = association.id();
        debug_assert!(!self.contains(id), "duplicate ObjectId {id}");
        self.associations.insert(id, association);
        tracing::trace!(%id, "association added");
        id
    }

    /// Adds an auto-sized text node with its top-left corner at `location`.
    pub fn create_text_node(&mut self, text: impl Into<String>, location: Point) -> ObjectId {
        let node = TextNode::new(text, location, &*self.measure, &self.settings);
        self.add_entity(Entity::new(node))
    }

    /// Adds an empty section with its top-left corner at `location`.
    pub fn create_section(&mut self, text: impl Into<String>, location: Point) -> ObjectId {
        let section = Section::new(text, location, &*self.measure, &self.settings);
        self.add_entity(Entity::new(section))
    }

    /// Adds a connect point centered on `center`.
    pub fn create_connect_point(&mut self, center: Point) -> ObjectId {
        self.add_entity(Entity::new(ConnectPoint::new(center)))
    }

    /// Unregisters an entity.
    ///
    /// Edge endpoints that named it fall back to placeholders, which makes
    /// those edges inert until the entity comes back. Section membership is
    /// left to [`update_references`](Self::update_references). Use
    /// [`delete_entities`](Self::delete_entities) for the editor-level delete.
    pub fn remove_entity(&mut self, id: ObjectId) -> Option<Entity> {
        let removed = self.entities.shift_remove(&id)?;
        for a in self.associations.values_mut() {
            if let Some(edge) = a.as_edge_mut() {
                if edge.source == Endpoint::Resolved(id) {
                    edge.source = Endpoint::Placeholder(id);
                }
                if edge.target == Endpoint::Resolved(id) {
                    edge.target = Endpoint::Placeholder(id);
                }
            }
        }
        tracing::trace!(%id, "entity removed");
        Some(removed)
    }

    /// Unregisters an association.
    pub fn remove_association(&mut self, id: ObjectId) -> Option<Association> {
        let removed = self.associations.shift_remove(&id);
        if removed.is_some() {
            tracing::trace!(%id, "association removed");
        }
        removed
    }

    // ---- tags ----

    /// Bookmarked object identifiers.
    pub fn tags(&self) -> &[ObjectId] {
        &self.tags
    }

    /// Bookmarks a registered object. Returns `false` if unknown or already tagged.
    pub fn add_tag(&mut self, id: ObjectId) -> bool {
        if !self.contains(id) || self.tags.contains(&id) {
            return false;
        }
        self.tags.push(id);
        true
    }

    /// Removes a bookmark. Returns whether one was present.
    pub fn remove_tag(&mut self, id: ObjectId) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| *t != id);
        before != self.tags.len()
    }

    /// Whether `id` is bookmarked.
    pub fn has_tag(&self, id: ObjectId) -> bool {
        self.tags.contains(&id)
    }

    // ---- reference repair ----

    /// Re-synchronizes every identifier-based reference with the registry.
    ///
    /// Call after bulk structural changes (loading, pasting, restoring). In
    /// order, this:
    ///
    /// 1. resolves placeholder edge endpoints whose entity now exists, and
    ///    demotes resolved endpoints whose entity is gone;
    /// 2. rebuilds each section's live children from its child ids and
    ///    refits it, inner sections first so outer sections see fitted inner
    ///    ones, then recomputes collapse-hidden flags;
    /// 3. marks directed edges that have a reverse twin as shifting;
    /// 4. prunes tags that name nothing;
    ///
    /// and finally re-pins spline edges to their endpoints.
    ///
    /// Running it twice in a row changes nothing the second time.
    pub fn update_references(&mut self) {
        let unresolved = self.resolve_endpoints();
        self.refit_all_sections();
        self.refresh_collapse_flags();
        self.refresh_shifting();
        let before = self.tags.len();
        let (entities, associations) = (&self.entities, &self.associations);
        self.tags
            .retain(|t| entities.contains_key(t) || associations.contains_key(t));
        self.refresh_spline_edges();
        tracing::debug!(
            entities = self.entities.len(),
            associations = self.associations.len(),
            unresolved,
            pruned_tags = before - self.tags.len(),
            "references updated"
        );
    }

    /// Returns how many endpoints stay unresolved.
    fn resolve_endpoints(&mut self) -> usize {
        let entities = &self.entities;
        let live = |id: ObjectId| entities.get(&id).is_some_and(Entity::is_connectable);
        let mut unresolved = 0;
        for a in self.associations.values_mut() {
            let assoc_id = a.id();
            let Some(edge) = a.as_edge_mut() else {
                continue;
            };
            for end in [&mut edge.source, &mut edge.target] {
                let id = end.id();
                *end = if live(id) {
                    Endpoint::Resolved(id)
                } else {
                    unresolved += 1;
                    tracing::debug!(edge = %assoc_id, endpoint = %id, "edge endpoint does not resolve");
                    Endpoint::Placeholder(id)
                };
            }
        }
        unresolved
    }

    fn refit_all_sections(&mut self) {
        let ids: Vec<ObjectId> = self.sections().map(Entity::id).collect();
        for id in &ids {
            let live: Vec<ObjectId> = self
                .section(*id)
                .map(|s| {
                    s.child_ids()
                        .iter()
                        .copied()
                        .filter(|c| self.entities.contains_key(c))
                        .collect()
                })
                .unwrap_or_default();
            if let Some(s) = self.entities.get_mut(id).and_then(Entity::as_section_mut) {
                s.set_resolved_children(live);
            }
        }
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut order = Vec::with_capacity(ids.len());
        for id in ids {
            self.sections_post_order(id, &mut visited, &mut order);
        }
        for id in order {
            self.adjust_section(id);
        }
    }

    /// Inner sections before the sections that contain them.
    fn sections_post_order(
        &self,
        id: ObjectId,
        visited: &mut HashSet<ObjectId>,
        order: &mut Vec<ObjectId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        if let Some(section) = self.section(id) {
            for child in section.children() {
                if self.is_section(*child) {
                    self.sections_post_order(*child, visited, order);
                }
            }
        }
        order.push(id);
    }

    /// Refits one section around its live children.
    pub(crate) fn adjust_section(&mut self, id: ObjectId) {
        let Some(section) = self.section(id) else {
            return;
        };
        let rects: Vec<Rect> = section
            .children()
            .iter()
            .filter(|c| **c != id)
            .filter_map(|c| self.entities.get(c))
            .map(Entity::rectangle)
            .collect();
        let (measure, settings) = (&*self.measure, &self.settings);
        if let Some(s) = self.entities.get_mut(&id).and_then(Entity::as_section_mut) {
            s.adjust_location_and_size(rects, measure, settings);
        }
    }

    /// Recomputes every entity's collapse-hidden flag from scratch.
    pub(crate) fn refresh_collapse_flags(&mut self) {
        let collapsed: Vec<ObjectId> = self
            .sections()
            .filter(|e| e.as_section().is_some_and(Section::is_collapsed))
            .map(Entity::id)
            .collect();
        let mut hidden: HashSet<ObjectId> = HashSet::new();
        for id in collapsed {
            self.collect_descendants(id, &mut hidden);
        }
        for e in self.entities.values_mut() {
            let flag = hidden.contains(&e.id());
            e.set_hidden_by_section_collapse(flag);
        }
    }

    pub(crate) fn refresh_shifting(&mut self) {
        let pairs: HashSet<(ObjectId, ObjectId)> =
            self.resolved_edges().map(|(_, s, t)| (s, t)).collect();
        for a in self.associations.values_mut() {
            if let Some(edge) = a.as_edge_mut() {
                let shifting = !edge.is_self_loop()
                    && edge
                        .resolved_pair()
                        .is_some_and(|(s, t)| pairs.contains(&(t, s)));
                edge.set_shifting(shifting);
            }
        }
    }

    pub(crate) fn refresh_spline_edges(&mut self) {
        let updates: Vec<_> = self
            .spline_edges()
            .filter_map(|a| {
                let AssociationKind::SplineEdge(s) = a.kind() else {
                    return None;
                };
                let body = self.edge_body_line(&s.edge)?;
                let src = self.entity(s.edge.source.id())?.geometry_center();
                let tgt = self.entity(s.edge.target.id())?.geometry_center();
                Some((a.id(), src, body, tgt))
            })
            .collect();
        for (id, src, body, tgt) in updates {
            if let Some(AssociationKind::SplineEdge(s)) =
                self.associations.get_mut(&id).map(Association::kind_mut)
            {
                s.refresh(src, body, tgt);
            }
        }
    }

    // ---- spatial lookups ----

    /// Bounds of every entity, or [`Rect::ZERO`] for an empty stage.
    pub fn bounding_rect(&self) -> Rect {
        bounding_rect(self.entities.values().map(Entity::rectangle), 0.0)
    }

    /// Center of [`bounding_rect`](Self::bounding_rect).
    pub fn center(&self) -> Point {
        self.bounding_rect().center()
    }

    /// The visible entity under `pt`; pen strokes win over everything else.
    pub fn find_entity_by_location(&self, pt: Point) -> Option<ObjectId> {
        let visible = || {
            self.entities
                .values()
                .filter(|e| !e.is_hidden_by_section_collapse())
        };
        visible()
            .filter(|e| matches!(e.kind(), EntityKind::PenStroke(_)))
            .chain(visible().filter(|e| !matches!(e.kind(), EntityKind::PenStroke(_))))
            .find(|e| e.collision_box().contains_point(pt))
            .map(Entity::id)
    }

    /// The visible connectable entity under `pt`.
    pub fn find_connectable_entity_by_location(&self, pt: Point) -> Option<ObjectId> {
        self.connectable_entities()
            .filter(|e| !e.is_hidden_by_section_collapse())
            .find(|e| e.collision_box().contains_point(pt))
            .map(Entity::id)
    }

    /// The visible section whose footprint is under `pt`.
    pub fn find_section_by_location(&self, pt: Point) -> Option<ObjectId> {
        self.sections()
            .filter(|e| !e.is_hidden_by_section_collapse())
            .find(|e| e.collision_box().contains_point(pt))
            .map(Entity::id)
    }

    /// The association under `pt`.
    pub fn find_association_by_location(&self, pt: Point) -> Option<ObjectId> {
        self.associations
            .values()
            .find(|a| {
                self.association_collision_box(a.id())
                    .is_some_and(|cb| cb.contains_point(pt))
            })
            .map(Association::id)
    }

    /// Visible entities touched by `rect`, or fully inside it when
    /// `contain` is set (rubber-band selection).
    pub fn entities_in_rect(&self, rect: Rect, contain: bool) -> Vec<ObjectId> {
        self.entities
            .values()
            .filter(|e| !e.is_hidden_by_section_collapse())
            .filter(|e| {
                let cb = e.collision_box();
                if contain {
                    cb.is_contained_by_rect(&rect)
                } else {
                    cb.intersects_rect(&rect)
                }
            })
            .map(Entity::id)
            .collect()
    }
}
