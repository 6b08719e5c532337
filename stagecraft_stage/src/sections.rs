// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Containment queries over sections.
//!
//! Every recursive walk here carries either a visited set or the
//! `max_section_depth` budget, so malformed data (a section that contains
//! itself) yields a defined answer instead of looping.

use hashbrown::HashSet;
use kurbo::Point;
use smallvec::SmallVec;
use stagecraft_shapes::RectExt;

use crate::entity::Entity;
use crate::id::ObjectId;
use crate::section::Section;
use crate::stage::Stage;

/// Father sections of one entity; almost always zero or one.
pub type FatherSections = SmallVec<[ObjectId; 2]>;

impl Stage {
    /// Sections that list `entity` as a direct child.
    pub fn father_sections(&self, entity: ObjectId) -> FatherSections {
        self.sections()
            .filter(|e| e.as_section().is_some_and(|s| s.has_child(entity)))
            .map(Entity::id)
            .collect()
    }

    /// Sections whose rectangle overlaps `entity`, innermost first.
    ///
    /// This is a geometric approximation of ancestry: cheap, and good enough
    /// for layering decisions while dragging.
    pub fn father_sections_list(&self, entity: ObjectId) -> Vec<ObjectId> {
        let Some(rect) = self.entity(entity).map(Entity::rectangle) else {
            return Vec::new();
        };
        let mut found: Vec<(ObjectId, f64)> = self
            .sections()
            .filter(|s| s.id() != entity && s.rectangle().collides_with(&rect))
            .map(|s| (s.id(), s.rectangle().y0))
            .collect();
        found.sort_by(|a, b| b.1.total_cmp(&a.1));
        found.into_iter().map(|(id, _)| id).collect()
    }

    /// Open, visible sections containing `pt`, reduced to the deepest ones.
    ///
    /// If section A sits inside section B and both contain `pt`, only A is
    /// reported.
    pub fn sections_by_inner_location(&self, pt: Point) -> Vec<ObjectId> {
        self.sections_by_inner_location_excluding(pt, &HashSet::new())
    }

    /// [`sections_by_inner_location`](Self::sections_by_inner_location) with
    /// `excluded` removed from the candidates before the deepest are taken.
    pub(crate) fn sections_by_inner_location_excluding(
        &self,
        pt: Point,
        excluded: &HashSet<ObjectId>,
    ) -> Vec<ObjectId> {
        let candidates: Vec<ObjectId> = self
            .sections()
            .filter(|e| {
                !excluded.contains(&e.id())
                    && !e.is_hidden_by_section_collapse()
                    && e.as_section().is_some_and(|s| !s.is_collapsed())
                    && e.rectangle().contains_inclusive(pt)
            })
            .map(Entity::id)
            .collect();
        self.deeper_sections(&candidates)
    }

    /// Drops every section that strictly contains another one in the set.
    fn deeper_sections(&self, sections: &[ObjectId]) -> Vec<ObjectId> {
        let mut outer: HashSet<ObjectId> = HashSet::new();
        for &i in sections {
            for &j in sections {
                if i != j && self.is_entity_in_section(i, j) && !self.is_entity_in_section(j, i) {
                    outer.insert(j);
                }
            }
        }
        sections
            .iter()
            .copied()
            .filter(|s| !outer.contains(s))
            .collect()
    }

    /// Whether `entity` is a direct or transitive child of `section`.
    ///
    /// Each section is searched once, so cyclic containment terminates.
    /// Gives up and returns `false` past `max_section_depth` levels.
    pub fn is_entity_in_section(&self, entity: ObjectId, section: ObjectId) -> bool {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut stack: Vec<(ObjectId, usize)> = vec![(section, 0)];
        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if depth > self.settings.max_section_depth {
                tracing::warn!(%entity, %section, "section depth budget exhausted");
                return false;
            }
            let Some(s) = self.section(id) else {
                continue;
            };
            if s.has_child(entity) {
                return true;
            }
            stack.extend(
                s.children()
                    .iter()
                    .filter(|c| self.is_section(**c) && !visited.contains(*c))
                    .map(|c| (*c, depth + 1)),
            );
        }
        false
    }

    /// The sections in `sections` that are not a descendant of another
    /// section in the set.
    pub fn shallower_sections(&self, sections: &[ObjectId]) -> Vec<ObjectId> {
        sections
            .iter()
            .copied()
            .filter(|id| {
                self.is_section(*id)
                    && !sections
                        .iter()
                        .any(|other| other != id && self.is_entity_in_section(*id, *other))
            })
            .collect()
    }

    /// Non-section entities not inside any of the given sections, followed by
    /// the sections themselves.
    pub fn shallower_not_section_entities(&self, entities: &[ObjectId]) -> Vec<ObjectId> {
        let (sections, others): (Vec<ObjectId>, Vec<ObjectId>) =
            entities.iter().copied().partition(|id| self.is_section(*id));
        let mut result: Vec<ObjectId> = others
            .into_iter()
            .filter(|e| !sections.iter().any(|s| self.is_entity_in_section(*e, *s)))
            .collect();
        result.extend(sections);
        result
    }

    /// Whether the containment below `section` is a tree: no entity is
    /// reached twice.
    pub fn is_tree_pack(&self, section: ObjectId) -> bool {
        fn walk(stage: &Stage, id: ObjectId, visited: &mut HashSet<ObjectId>) -> bool {
            if !visited.insert(id) {
                return false;
            }
            match stage.section(id) {
                Some(s) => s.children().iter().all(|c| walk(stage, *c, visited)),
                None => true,
            }
        }
        walk(self, section, &mut HashSet::new())
    }

    /// Nesting depth of `section`: 1 for a section without child sections.
    pub fn section_max_depth(&self, section: ObjectId) -> usize {
        fn walk(stage: &Stage, id: ObjectId, depth: usize, visited: &mut HashSet<ObjectId>) -> usize {
            if !visited.insert(id) {
                return depth;
            }
            let Some(s) = stage.section(id) else {
                return depth;
            };
            let mut deepest = depth;
            for child in s.children() {
                if stage.is_section(*child) && !visited.contains(child) {
                    deepest = deepest.max(walk(stage, *child, depth + 1, visited));
                }
            }
            deepest
        }
        if !self.is_section(section) {
            return 0;
        }
        walk(self, section, 1, &mut HashSet::new())
    }

    /// `entities` plus everything nested inside any section among them,
    /// without duplicates.
    pub fn all_entities_in_sections(&self, entities: &[ObjectId]) -> Vec<ObjectId> {
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<ObjectId> = entities.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !self.contains_entity(id) || !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(s) = self.section(id) {
                stack.extend(s.children().iter().rev().copied());
            }
        }
        out
    }

    /// Sections ordered top to bottom.
    pub fn sorted_sections_by_z(&self, sections: &[ObjectId]) -> Vec<ObjectId> {
        let mut keyed: Vec<(ObjectId, f64)> = sections
            .iter()
            .filter_map(|id| self.entity(*id).map(|e| (*id, e.rectangle().y0)))
            .collect();
        keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
        keyed.into_iter().map(|(id, _)| id).collect()
    }

    /// Every descendant of `section` (children, grandchildren, ...).
    pub(crate) fn collect_descendants(&self, section: ObjectId, out: &mut HashSet<ObjectId>) {
        let mut stack: Vec<ObjectId> = self
            .section(section)
            .map(|s| s.children().to_vec())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if id == section || !out.insert(id) {
                continue;
            }
            if let Some(s) = self.section(id) {
                stack.extend_from_slice(s.children());
            }
        }
    }

    /// Descendants of `section` in depth-first order.
    pub fn section_descendants(&self, section: ObjectId) -> Vec<ObjectId> {
        let all = self.all_entities_in_sections(&[section]);
        all.into_iter().filter(|id| *id != section).collect()
    }

    pub(crate) fn section_children_vec(&self, section: ObjectId) -> Vec<ObjectId> {
        self.section(section)
            .map(Section::children)
            .map(<[ObjectId]>::to_vec)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    /// Three nested sections with a text node in the innermost one.
    fn nested() -> (Stage, [ObjectId; 4]) {
        let mut stage = Stage::new();
        let node = stage.create_text_node("n", Point::new(500.0, 500.0));
        let a = stage.create_section("A", Point::ZERO);
        let b = stage.create_section("B", Point::ZERO);
        let c = stage.create_section("C", Point::ZERO);
        assert!(stage.go_in_section(&[node], a));
        assert!(stage.go_in_section(&[a], b));
        assert!(stage.go_in_section(&[b], c));
        (stage, [a, b, c, node])
    }

    #[test]
    fn deepest_section_wins_location_query() {
        let (stage, [a, _, _, node]) = nested();
        let pt = stage.entity(node).unwrap().geometry_center();
        assert_eq!(stage.sections_by_inner_location(pt), vec![a]);
    }

    #[test]
    fn containment_is_transitive() {
        let (stage, [a, b, c, node]) = nested();
        assert!(stage.is_entity_in_section(node, c));
        assert!(stage.is_entity_in_section(a, c));
        assert!(!stage.is_entity_in_section(c, a));
        assert_eq!(stage.father_sections(node).as_slice(), &[a]);
        assert_eq!(stage.father_sections_list(node), vec![a, b, c]);
        assert_eq!(stage.shallower_sections(&[a, b, c]), vec![c]);
        assert_eq!(stage.section_max_depth(c), 3);
        assert!(stage.is_tree_pack(c));
    }

    #[test]
    fn shallower_sections_skip_levels() {
        let (stage, [a, b, c, _]) = nested();
        assert_eq!(stage.shallower_sections(&[a, c]), vec![c]);
        assert_eq!(stage.shallower_sections(&[a, b]), vec![b]);
        assert_eq!(stage.shallower_sections(&[a]), vec![a]);
    }

    #[test]
    fn branching_cycles_terminate() {
        let mut stage = Stage::new();
        let a = stage.create_section("a", Point::ZERO);
        let b = stage.create_section("b", Point::new(400.0, 0.0));
        for s in [a, b] {
            let section = stage.entities.get_mut(&s).and_then(Entity::as_section_mut).unwrap();
            section.push_child(a);
            section.push_child(b);
        }
        stage.update_references();

        assert!(!stage.is_entity_in_section(ObjectId::new(), a));
        assert!(stage.is_entity_in_section(b, a));
        assert!(stage.is_entity_in_section(a, a));
    }

    #[test]
    fn shallower_entities_drop_nested_members() {
        let (stage, [a, _, c, node]) = nested();
        let other = ObjectId::new();
        assert_eq!(stage.shallower_not_section_entities(&[node, a, other]), vec![other, a]);
        assert_eq!(stage.shallower_not_section_entities(&[node, c]), vec![c]);
        let loose = ObjectId::new();
        assert_eq!(stage.shallower_not_section_entities(&[loose, node, c]), vec![loose, c]);
    }

    #[test]
    fn all_entities_in_sections_flattens() {
        let (stage, [a, b, c, node]) = nested();
        assert_eq!(stage.all_entities_in_sections(&[c]), vec![c, b, a, node]);
        assert_eq!(stage.section_descendants(b), vec![a, node]);
    }

    #[test]
    fn sorted_by_z_is_top_to_bottom() {
        let (stage, [a, b, c, _]) = nested();
        assert_eq!(stage.sorted_sections_by_z(&[a, c, b]), vec![c, b, a]);
    }
}
