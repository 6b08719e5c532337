// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving entities: section cascades, subtree moves, and collision push-apart.

use hashbrown::HashSet;
use kurbo::{Point, Vec2};
use stagecraft_shapes::RectExt;

use crate::entity::Entity;
use crate::id::ObjectId;
use crate::stage::Stage;

/// Direction of a push along one axis; coincident centers push forward.
fn push_sign(d: f64) -> f64 {
    if d < 0.0 { -1.0 } else { 1.0 }
}

impl Stage {
    /// Translates one entity by `delta`.
    ///
    /// A section carries its whole subtree along. With `adjust_sections`, every
    /// ancestor section is refitted afterwards, innermost first. When
    /// [`enable_entity_collision`](crate::StageSettings::enable_entity_collision)
    /// is set, overlapped neighbors are pushed out of the way, and the pushes
    /// cascade up to [`collision_depth_limit`](crate::StageSettings::collision_depth_limit)
    /// levels deep.
    ///
    /// Returns `false` for unknown ids and zero deltas, which change nothing.
    pub fn move_entity(&mut self, id: ObjectId, delta: Vec2, adjust_sections: bool) -> bool {
        let mut budget = self
            .settings
            .collision_depth_limit
            .saturating_mul(self.entities.len().max(1));
        let moved = self.move_entity_at(id, delta, adjust_sections, 0, &mut budget);
        if moved {
            self.refresh_spline_edges();
        }
        moved
    }

    fn move_entity_at(
        &mut self,
        id: ObjectId,
        delta: Vec2,
        adjust_sections: bool,
        depth: usize,
        budget: &mut usize,
    ) -> bool {
        if delta == Vec2::ZERO || !self.contains_entity(id) {
            return false;
        }
        for member in self.all_entities_in_sections(&[id]) {
            if let Some(e) = self.entities.get_mut(&member) {
                e.move_by(delta);
            }
        }
        tracing::trace!(%id, dx = delta.x, dy = delta.y, depth, "entity moved");
        if adjust_sections {
            self.refit_father_sections(id);
        }
        if self.settings.enable_entity_collision {
            self.push_overlapping(id, depth, budget);
        }
        true
    }

    /// Refits every ancestor section of `id`, walking outward.
    pub(crate) fn refit_father_sections(&mut self, id: ObjectId) {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut frontier = vec![(id, 0_usize)];
        while let Some((current, depth)) = frontier.pop() {
            if depth > self.settings.max_section_depth {
                tracing::warn!(%id, "section depth budget exhausted while refitting");
                continue;
            }
            for father in self.father_sections(current) {
                if visited.insert(father) {
                    self.adjust_section(father);
                    frontier.push((father, depth + 1));
                }
            }
        }
    }

    /// Pushes every visible entity overlapping `mover` out along the axis of
    /// least overlap.
    fn push_overlapping(&mut self, mover: ObjectId, depth: usize, budget: &mut usize) {
        if depth >= self.settings.collision_depth_limit {
            tracing::warn!(%mover, depth, "collision depth budget exhausted");
            return;
        }
        let others: Vec<ObjectId> = self
            .entities
            .values()
            .filter(|e| e.id() != mover && !e.is_hidden_by_section_collapse())
            .map(Entity::id)
            .collect();
        for other in others {
            if self.is_entity_in_section(mover, other) || self.is_entity_in_section(other, mover) {
                continue;
            }
            let (Some(a), Some(b)) = (self.entity(mover), self.entity(other)) else {
                continue;
            };
            let (ra, rb) = (a.rectangle(), b.rectangle());
            if !ra.collides_with(&rb) {
                continue;
            }
            if *budget == 0 {
                tracing::warn!(%mover, "collision push budget exhausted");
                return;
            }
            *budget -= 1;
            let overlap = ra.overlap_size(&rb);
            let (ca, cb) = (ra.center(), rb.center());
            let push = if overlap.x.abs() < overlap.y.abs() {
                Vec2::new(overlap.x * push_sign(cb.x - ca.x), 0.0)
            } else {
                Vec2::new(0.0, overlap.y * push_sign(cb.y - ca.y))
            };
            tracing::trace!(%mover, %other, dx = push.x, dy = push.y, "collision push");
            self.move_entity_at(other, push, true, depth + 1, budget);
        }
    }

    /// Moves `id` so its rectangle's top-left corner lands on `location`.
    pub fn move_entity_to(&mut self, id: ObjectId, location: Point) -> bool {
        let Some(origin) = self.entity(id).map(|e| e.rectangle().origin()) else {
            return false;
        };
        self.move_entity(id, location - origin, true)
    }

    /// Drops every id that sits inside a section also present in `ids`, so a
    /// batch move translates each entity exactly once.
    pub(crate) fn outermost(&self, ids: &[ObjectId]) -> Vec<ObjectId> {
        let sections: Vec<ObjectId> = ids.iter().copied().filter(|id| self.is_section(*id)).collect();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        ids.iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| !sections.iter().any(|s| s != id && self.is_entity_in_section(*id, *s)))
            .collect()
    }

    /// Moves every selected entity by `delta`.
    ///
    /// An entity whose enclosing section is also selected rides along with
    /// that section instead of moving twice.
    pub fn move_selected_entities(&mut self, delta: Vec2, adjust_sections: bool) {
        let selected = self.outermost(&self.selected_entity_ids());
        for id in selected {
            self.move_entity(id, delta, adjust_sections);
        }
    }

    /// Moves `node` and every graph successor of it by `delta`.
    ///
    /// This follows edges, not section membership.
    pub fn move_with_children(&mut self, node: ObjectId, delta: Vec2) {
        let members = self.outermost(&self.successor_set(node));
        for id in members {
            self.move_entity(id, delta, true);
        }
    }

    /// [`move_with_children`](Self::move_with_children) for every selected
    /// connectable entity, moving shared successors once.
    pub fn move_selected_with_children(&mut self, delta: Vec2) {
        let roots: Vec<ObjectId> = self
            .connectable_entities()
            .filter(|e| e.is_selected())
            .map(Entity::id)
            .collect();
        let all: Vec<ObjectId> = roots
            .into_iter()
            .flat_map(|r| self.successor_set(r))
            .collect();
        for id in self.outermost(&all) {
            self.move_entity(id, delta, true);
        }
    }

    /// Moves an entity and re-homes it by where it lands.
    ///
    /// If the moved center falls inside open sections, the entity joins the
    /// deepest of them; otherwise it leaves its current father section. The
    /// entity and its own descendants are never candidates.
    pub fn jump_move_entity(&mut self, id: ObjectId, delta: Vec2) -> bool {
        let Some(center) = self.entity(id).map(Entity::geometry_center) else {
            return false;
        };
        let mut excluded: HashSet<ObjectId> = HashSet::new();
        self.collect_descendants(id, &mut excluded);
        excluded.insert(id);
        let targets = self.sections_by_inner_location_excluding(center + delta, &excluded);
        let fathers = self.father_sections(id);
        if targets.is_empty() {
            if let Some(father) = fathers.first().copied() {
                self.go_out_section(&[id], father);
            }
        } else if targets.len() != fathers.len() || targets.iter().any(|t| !fathers.contains(t)) {
            self.go_in_sections(&[id], &targets);
        }
        let moved = self.move_entity(id, delta, false);
        self.refit_father_sections(id);
        moved
    }

    /// [`jump_move_entity`](Self::jump_move_entity) for every selected
    /// connectable entity.
    pub fn jump_move_selected(&mut self, delta: Vec2) {
        let selected: Vec<ObjectId> = self
            .connectable_entities()
            .filter(|e| e.is_selected())
            .map(Entity::id)
            .collect();
        for id in self.outermost(&selected) {
            self.jump_move_entity(id, delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::StageSettings;
    use crate::entity::TextNode;

    fn boxed(stage: &mut Stage, rect: Rect) -> ObjectId {
        stage.add_entity(Entity::new(TextNode::with_rect("n", rect, Default::default())))
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut stage = Stage::new();
        let a = stage.create_text_node("a", Point::ZERO);
        let before = stage.entity(a).unwrap().rectangle();
        assert!(!stage.move_entity(a, Vec2::ZERO, true));
        assert_eq!(stage.entity(a).unwrap().rectangle(), before);
    }

    #[test]
    fn sections_carry_children_and_fathers_follow() {
        let mut stage = Stage::new();
        let node = boxed(&mut stage, Rect::new(100.0, 100.0, 200.0, 150.0));
        let inner = stage.create_section("inner", Point::ZERO);
        let outer = stage.create_section("outer", Point::ZERO);
        assert!(stage.go_in_section(&[node], inner));
        assert!(stage.go_in_section(&[inner], outer));

        stage.move_entity(inner, Vec2::new(10.0, 0.0), true);
        assert_eq!(stage.entity(node).unwrap().rectangle().x0, 110.0);

        let outer_before = stage.entity(outer).unwrap().rectangle();
        stage.move_entity(node, Vec2::new(500.0, 0.0), true);
        let inner_rect = stage.entity(inner).unwrap().rectangle();
        let outer_rect = stage.entity(outer).unwrap().rectangle();
        assert!(stage.entity(node).unwrap().rectangle().is_inside(&inner_rect));
        assert!(inner_rect.is_inside(&outer_rect));
        assert!(outer_rect.x1 > outer_before.x1, "outer section grew");
    }

    #[test]
    fn collision_pushes_along_the_smaller_overlap() {
        let mut stage = Stage::with_settings(StageSettings::new().with_entity_collision(true));
        let a = boxed(&mut stage, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = boxed(&mut stage, Rect::new(150.0, 20.0, 250.0, 120.0));
        stage.move_entity(a, Vec2::new(70.0, 0.0), true);
        let ra = stage.entity(a).unwrap().rectangle();
        let rb = stage.entity(b).unwrap().rectangle();
        assert_eq!(rb, Rect::new(170.0, 20.0, 270.0, 120.0));
        assert!(!ra.collides_with(&rb));
    }

    #[test]
    fn collision_chains_cascade() {
        let mut stage = Stage::with_settings(StageSettings::new().with_entity_collision(true));
        let a = boxed(&mut stage, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = boxed(&mut stage, Rect::new(110.0, 0.0, 210.0, 100.0));
        let c = boxed(&mut stage, Rect::new(220.0, 0.0, 320.0, 100.0));
        stage.move_entity(a, Vec2::new(20.0, 0.0), true);
        assert_eq!(stage.entity(b).unwrap().rectangle().x0, 120.0);
        assert_eq!(stage.entity(c).unwrap().rectangle().x0, 220.0, "b only grazes c");
        stage.move_entity(a, Vec2::new(20.0, 0.0), true);
        assert_eq!(stage.entity(c).unwrap().rectangle().x0, 240.0);
    }

    #[test]
    fn sections_do_not_push_their_own_children() {
        let mut stage = Stage::with_settings(StageSettings::new().with_entity_collision(true));
        let node = boxed(&mut stage, Rect::new(100.0, 100.0, 200.0, 150.0));
        let s = stage.create_section("s", Point::ZERO);
        assert!(stage.go_in_section(&[node], s));
        let before = stage.entity(node).unwrap().rectangle();
        stage.move_entity(node, Vec2::new(5.0, 0.0), true);
        assert_eq!(stage.entity(node).unwrap().rectangle(), before + Vec2::new(5.0, 0.0));
    }

    #[test]
    fn selected_moves_skip_members_of_selected_sections() {
        let mut stage = Stage::new();
        let node = boxed(&mut stage, Rect::new(100.0, 100.0, 200.0, 150.0));
        let s = stage.create_section("s", Point::ZERO);
        stage.go_in_section(&[node], s);
        stage.set_selected(node, true);
        stage.set_selected(s, true);
        stage.move_selected_entities(Vec2::new(0.0, 10.0), true);
        assert_eq!(stage.entity(node).unwrap().rectangle().y0, 110.0);
    }

    #[test]
    fn tree_move_follows_edges() {
        let mut stage = Stage::new();
        let a = boxed(&mut stage, Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = boxed(&mut stage, Rect::new(100.0, 0.0, 150.0, 50.0));
        let c = boxed(&mut stage, Rect::new(200.0, 0.0, 250.0, 50.0));
        stage.connect_entity(a, b);
        stage.move_with_children(a, Vec2::new(0.0, 100.0));
        assert_eq!(stage.entity(b).unwrap().rectangle().y0, 100.0);
        assert_eq!(stage.entity(c).unwrap().rectangle().y0, 0.0);
    }

    #[test]
    fn jump_move_enters_and_leaves_sections() {
        let mut stage = Stage::new();
        let member = boxed(&mut stage, Rect::new(100.0, 100.0, 200.0, 150.0));
        let s = stage.create_section("s", Point::ZERO);
        stage.go_in_section(&[member], s);
        let loose = boxed(&mut stage, Rect::new(600.0, 100.0, 650.0, 150.0));

        let target = stage.entity(member).unwrap().geometry_center();
        let here = stage.entity(loose).unwrap().geometry_center();
        assert!(stage.jump_move_entity(loose, target - here + Vec2::new(0.0, 40.0)));
        assert_eq!(stage.father_sections(loose).as_slice(), &[s]);

        assert!(stage.jump_move_entity(loose, Vec2::new(2000.0, 0.0)));
        assert!(stage.father_sections(loose).is_empty());
    }

    #[test]
    fn jump_move_inside_the_same_father_keeps_membership() {
        let mut stage = Stage::new();
        let node = boxed(&mut stage, Rect::new(100.0, 100.0, 200.0, 150.0));
        let inner = stage.create_section("inner", Point::ZERO);
        assert!(stage.go_in_section(&[node], inner));
        let other = boxed(&mut stage, Rect::new(500.0, 100.0, 600.0, 150.0));
        let outer = stage.create_section("outer", Point::ZERO);
        assert!(stage.go_in_section(&[inner, other], outer));

        assert!(stage.jump_move_entity(inner, Vec2::new(5.0, 5.0)));
        assert_eq!(stage.father_sections(inner).as_slice(), &[outer]);
        assert_eq!(stage.father_sections(node).as_slice(), &[inner]);

        assert!(stage.jump_move_entity(node, Vec2::new(5.0, 5.0)));
        assert_eq!(stage.father_sections(node).as_slice(), &[inner]);
    }
}
