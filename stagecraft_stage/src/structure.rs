// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural edits: section membership, packing, collapsing, and deletion.

use hashbrown::HashSet;
use stagecraft_shapes::bounding_rect;

use crate::entity::{Entity, EntityKind, TextNode};
use crate::id::ObjectId;
use crate::section::Section;
use crate::stage::Stage;

impl Stage {
    /// Moves `entities` into `section`. See [`go_in_sections`](Self::go_in_sections).
    pub fn go_in_section(&mut self, entities: &[ObjectId], section: ObjectId) -> bool {
        self.go_in_sections(entities, &[section])
    }

    /// Makes `entities` members of every section in `sections`, taking them
    /// out of whatever sections held them before.
    ///
    /// The whole edit is refused (returning `false`) if any id is unknown,
    /// any target is not a section, or it would put a section inside itself
    /// or inside one of its own descendants.
    pub fn go_in_sections(&mut self, entities: &[ObjectId], sections: &[ObjectId]) -> bool {
        if sections.iter().any(|s| !self.is_section(*s))
            || entities.iter().any(|e| !self.contains_entity(*e))
        {
            tracing::debug!("go in section refused: unknown entity or section");
            return false;
        }
        for &s in sections {
            for &e in entities {
                if e == s || self.is_entity_in_section(s, e) {
                    tracing::debug!(entity = %e, section = %s, "go in section refused: would nest a section in itself");
                    return false;
                }
            }
        }

        let mut old_fathers: Vec<ObjectId> = Vec::new();
        for &e in entities {
            for father in self.father_sections(e) {
                if let Some(f) = self.entities.get_mut(&father).and_then(Entity::as_section_mut) {
                    f.remove_child(e);
                }
                if !old_fathers.contains(&father) {
                    old_fathers.push(father);
                }
            }
        }
        for &s in sections {
            if let Some(section) = self.entities.get_mut(&s).and_then(Entity::as_section_mut) {
                for &e in entities {
                    section.push_child(e);
                }
            }
        }
        for father in old_fathers.into_iter().filter(|f| !sections.contains(f)) {
            self.adjust_section(father);
            self.refit_father_sections(father);
        }
        for &s in sections {
            self.adjust_section(s);
            self.refit_father_sections(s);
        }
        self.refresh_collapse_flags();
        tracing::debug!(entities = entities.len(), sections = sections.len(), "entities moved into sections");
        true
    }

    /// Takes `entities` out of `section`. Returns whether any were members.
    pub fn go_out_section(&mut self, entities: &[ObjectId], section: ObjectId) -> bool {
        let Some(s) = self.entities.get_mut(&section).and_then(Entity::as_section_mut) else {
            return false;
        };
        let mut removed = false;
        for e in entities {
            removed |= s.remove_child(*e);
        }
        if removed {
            self.adjust_section(section);
            self.refit_father_sections(section);
            self.refresh_collapse_flags();
            tracing::debug!(%section, "entities moved out of section");
        }
        removed
    }

    /// Wraps `entities` in a new section titled `title`.
    ///
    /// Entities already inside another listed section ride along with it.
    /// All remaining entities must share the same father sections; the new
    /// section takes their place there. Returns the new section, or `None` if
    /// nothing was packed.
    pub fn pack_entities_to_section(
        &mut self,
        entities: &[ObjectId],
        title: impl Into<String>,
    ) -> Option<ObjectId> {
        let live: Vec<ObjectId> = entities
            .iter()
            .copied()
            .filter(|e| self.contains_entity(*e))
            .collect();
        let members = self.shallower_not_section_entities(&live);
        let first = *members.first()?;
        let mut fathers = self.father_sections(first).to_vec();
        fathers.sort();
        for m in &members[1..] {
            let mut other = self.father_sections(*m).to_vec();
            other.sort();
            if other != fathers {
                tracing::debug!("pack refused: entities sit in different sections");
                return None;
            }
        }
        for f in &fathers {
            self.go_out_section(&members, *f);
        }
        let rect = bounding_rect(
            members
                .iter()
                .filter_map(|m| self.entity(*m))
                .map(Entity::rectangle),
            0.0,
        );
        let id = self.add_entity(Entity::new(Section::with_rect(title, rect)));
        self.go_in_section(&members, id);
        if !fathers.is_empty() {
            self.go_in_sections(&[id], &fathers);
        }
        tracing::debug!(section = %id, members = members.len(), "entities packed into a new section");
        Some(id)
    }

    /// Collapses or expands a section.
    ///
    /// Every descendant's collapse-hidden flag is recomputed, however deep,
    /// and ancestor sections refit around the new footprint.
    pub fn set_section_collapsed(&mut self, section: ObjectId, collapsed: bool) -> bool {
        let Some(s) = self.entities.get_mut(&section).and_then(Entity::as_section_mut) else {
            return false;
        };
        s.set_collapsed_flag(collapsed);
        self.refresh_collapse_flags();
        self.refit_father_sections(section);
        tracing::debug!(%section, collapsed, "section collapse changed");
        true
    }

    /// Replaces the primary text of a text node, section, or portal, and
    /// refits whatever depends on its size.
    pub fn rename_entity(&mut self, id: ObjectId, text: impl Into<String>) -> bool {
        let text = text.into();
        let (measure, settings) = (&*self.measure, &self.settings);
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        match entity.kind_mut() {
            EntityKind::TextNode(n) => n.set_text(text, measure, settings),
            EntityKind::Section(s) => s.text = text,
            EntityKind::Portal(p) => p.title = text,
            EntityKind::ConnectPoint(_) | EntityKind::PenStroke(_) | EntityKind::Svg(_) => {
                return false;
            }
        }
        if self.is_section(id) {
            self.adjust_section(id);
        }
        self.refit_father_sections(id);
        self.refresh_spline_edges();
        true
    }

    /// Replaces a text node with a section of the same title, color, and
    /// details, in the same father sections and with the same edges.
    pub fn text_node_to_section(&mut self, node: ObjectId) -> Option<ObjectId> {
        let entity = self.entity(node)?;
        let text_node = entity.as_text_node()?;
        let mut section = Section::with_rect(text_node.text.clone(), entity.rectangle().inflate(50.0, 50.0));
        section.color = text_node.color;
        let details = entity.details.clone();
        let fathers = self.father_sections(node).to_vec();
        let parents = self.node_parents(node);
        let children: Vec<ObjectId> = self
            .node_children(node)
            .into_iter()
            .filter(|c| *c != node)
            .collect();

        self.delete_entities(&[node]);
        let id = self.add_entity(Entity::new(section).with_details(details));
        self.adjust_section(id);
        if !fathers.is_empty() {
            self.go_in_sections(&[id], &fathers);
        }
        for p in parents {
            self.connect_entity(p, id);
        }
        for c in children {
            self.connect_entity(id, c);
        }
        Some(id)
    }

    /// Dissolves a section into a text node carrying its title.
    ///
    /// The text node and the former children take the section's place in its
    /// father sections. Returns the new text node.
    pub fn unpack_section(&mut self, section: ObjectId) -> Option<ObjectId> {
        let entity = self.entity(section)?;
        let s = entity.as_section()?;
        let mut node = TextNode::new(
            s.text.clone(),
            entity.rectangle().origin(),
            &*self.measure,
            &self.settings,
        );
        node.color = s.color;
        let details = entity.details.clone();
        let children = s.children().to_vec();
        let fathers = self.father_sections(section).to_vec();

        // Expanded first, so deleting the section keeps its children.
        self.set_section_collapsed(section, false);
        let id = self.add_entity(Entity::new(node).with_details(details));
        if !fathers.is_empty() {
            self.go_in_sections(&[id], &fathers);
            if !children.is_empty() {
                self.go_in_sections(&children, &fathers);
            }
        }
        self.delete_entities(&[section]);
        Some(id)
    }

    /// Deletes entities together with every association touching them.
    ///
    /// Deleting a collapsed section deletes its descendants as well; deleting
    /// an expanded one hands its children to its own father sections.
    /// Returns how many entities were deleted.
    pub fn delete_entities(&mut self, ids: &[ObjectId]) -> usize {
        let mut order: Vec<ObjectId> = Vec::new();
        let mut queued: HashSet<ObjectId> = HashSet::new();
        for &id in ids {
            if self
                .section(id)
                .is_some_and(Section::is_collapsed)
            {
                let mut inner = self.section_descendants(id);
                inner.reverse();
                for d in inner {
                    if queued.insert(d) {
                        order.push(d);
                    }
                }
            }
            if queued.insert(id) {
                order.push(id);
            }
        }
        let deleted = order.into_iter().filter(|id| self.delete_one(*id)).count();
        if deleted > 0 {
            self.update_references();
        }
        deleted
    }

    fn delete_one(&mut self, id: ObjectId) -> bool {
        if !self.contains_entity(id) {
            tracing::debug!(%id, "delete skipped: no such entity");
            return false;
        }
        let fathers = self.father_sections(id).to_vec();
        let orphans = self.section_children_vec(id);

        let touching: Vec<ObjectId> = self
            .associations()
            .filter(|a| a.touches(id))
            .map(|a| a.id())
            .collect();
        for a in &touching {
            self.remove_association(*a);
        }
        self.remove_entity(id);

        for &f in &fathers {
            if let Some(section) = self.entities.get_mut(&f).and_then(Entity::as_section_mut) {
                section.remove_child(id);
                for &c in &orphans {
                    if c != f {
                        section.push_child(c);
                    }
                }
            }
        }
        for &f in &fathers {
            self.adjust_section(f);
            self.refit_father_sections(f);
        }
        tracing::debug!(%id, associations = touching.len(), "entity deleted");
        true
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect};

    use super::*;

    fn boxed(stage: &mut Stage, rect: Rect) -> ObjectId {
        stage.add_entity(Entity::new(TextNode::with_rect("n", rect, Default::default())))
    }

    #[test]
    fn sections_cannot_contain_themselves() {
        let mut stage = Stage::new();
        let a = stage.create_section("a", Point::ZERO);
        let b = stage.create_section("b", Point::ZERO);
        assert!(!stage.go_in_section(&[a], a));
        assert!(stage.go_in_section(&[a], b));
        assert!(!stage.go_in_section(&[b], a), "b would end up inside itself");
        assert!(stage.is_entity_in_section(a, b));
        assert!(!stage.is_entity_in_section(b, b));
    }

    #[test]
    fn going_in_leaves_the_old_section() {
        let mut stage = Stage::new();
        let n = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let a = stage.create_section("a", Point::ZERO);
        let b = stage.create_section("b", Point::new(500.0, 0.0));
        stage.go_in_section(&[n], a);
        stage.go_in_section(&[n], b);
        assert_eq!(stage.father_sections(n).as_slice(), &[b]);
        assert!(stage.section(a).unwrap().children().is_empty());
        assert!(stage.go_out_section(&[n], b));
        assert!(!stage.go_out_section(&[n], b));
    }

    #[test]
    fn collapse_hides_every_descendant() {
        let mut stage = Stage::new();
        let g = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let c = stage.create_section("c", Point::ZERO);
        let s = stage.create_section("s", Point::ZERO);
        stage.go_in_section(&[g], c);
        stage.go_in_section(&[c], s);
        assert!(stage.set_section_collapsed(s, true));
        assert!(stage.entity(c).unwrap().is_hidden_by_section_collapse());
        assert!(stage.entity(g).unwrap().is_hidden_by_section_collapse());
        assert!(!stage.entity(s).unwrap().is_hidden_by_section_collapse());
        stage.set_section_collapsed(s, false);
        assert!(!stage.entity(g).unwrap().is_hidden_by_section_collapse());
    }

    #[test]
    fn packing_wraps_and_keeps_the_father() {
        let mut stage = Stage::new();
        let a = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = boxed(&mut stage, Rect::new(100.0, 0.0, 150.0, 50.0));
        let outer = stage.create_section("outer", Point::ZERO);
        stage.go_in_section(&[a, b], outer);
        let packed = stage.pack_entities_to_section(&[a, b], "packed").unwrap();
        assert_eq!(stage.father_sections(a).as_slice(), &[packed]);
        assert_eq!(stage.father_sections(packed).as_slice(), &[outer]);
        assert_eq!(stage.section_max_depth(outer), 2);
    }

    #[test]
    fn packing_refuses_mixed_levels() {
        let mut stage = Stage::new();
        let a = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = boxed(&mut stage, Rect::new(500.0, 0.0, 550.0, 50.0));
        let s = stage.create_section("s", Point::ZERO);
        stage.go_in_section(&[a], s);
        assert_eq!(stage.pack_entities_to_section(&[a, b], "x"), None);
        assert_eq!(stage.pack_entities_to_section(&[], "x"), None);
    }

    #[test]
    fn deleting_a_section_hands_children_up() {
        let mut stage = Stage::new();
        let n = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let inner = stage.create_section("inner", Point::ZERO);
        let outer = stage.create_section("outer", Point::ZERO);
        stage.go_in_section(&[n], inner);
        stage.go_in_section(&[inner], outer);
        assert_eq!(stage.delete_entities(&[inner]), 1);
        assert_eq!(stage.father_sections(n).as_slice(), &[outer]);
        assert_eq!(stage.section(outer).unwrap().child_ids(), &[n]);
    }

    #[test]
    fn deleting_a_collapsed_section_deletes_its_contents() {
        let mut stage = Stage::new();
        let n = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let m = boxed(&mut stage, Rect::new(500.0, 0.0, 550.0, 50.0));
        let s = stage.create_section("s", Point::ZERO);
        stage.go_in_section(&[n], s);
        stage.connect_entity(n, m);
        stage.set_section_collapsed(s, true);
        assert_eq!(stage.delete_entities(&[s]), 2);
        assert!(!stage.contains_entity(n));
        assert_eq!(stage.associations().count(), 0, "edges go with their entities");
    }

    #[test]
    fn text_node_becomes_section_with_its_edges() {
        let mut stage = Stage::new();
        let p = stage.create_text_node("p", Point::ZERO);
        let n = stage.create_text_node("n", Point::new(300.0, 0.0));
        let c = stage.create_text_node("c", Point::new(600.0, 0.0));
        stage.connect_entity(p, n);
        stage.connect_entity(n, c);
        let s = stage.text_node_to_section(n).unwrap();
        assert!(!stage.contains_entity(n));
        assert_eq!(stage.node_children(p), vec![s]);
        assert_eq!(stage.node_children(s), vec![c]);
        assert_eq!(stage.entity(s).unwrap().text(), Some("n"));
    }

    #[test]
    fn unpack_replaces_section_with_text_node() {
        let mut stage = Stage::new();
        let n = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let inner = stage.create_section("inner", Point::ZERO);
        let outer = stage.create_section("outer", Point::ZERO);
        stage.go_in_section(&[n], inner);
        stage.go_in_section(&[inner], outer);
        stage.set_section_collapsed(inner, true);
        let t = stage.unpack_section(inner).unwrap();
        assert!(!stage.contains_entity(inner));
        assert!(stage.contains_entity(n), "children survive");
        let mut members = stage.section(outer).unwrap().children().to_vec();
        members.sort();
        let mut expected = vec![t, n];
        expected.sort();
        assert_eq!(members, expected);
    }

    #[test]
    fn renaming_refits_the_father() {
        let mut stage = Stage::new();
        let n = stage.create_text_node("n", Point::ZERO);
        let s = stage.create_section("s", Point::ZERO);
        stage.go_in_section(&[n], s);
        let before = stage.entity(s).unwrap().rectangle();
        assert!(stage.rename_entity(n, "a much longer label than before"));
        assert!(stage.entity(s).unwrap().rectangle().width() > before.width());
        let cp = stage.create_connect_point(Point::ZERO);
        assert!(!stage.rename_entity(cp, "x"));
    }
}
