// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directed-graph queries over connectable entities.
//!
//! Only line and spline edges with both endpoints resolved take part.
//! Nothing is cached: every query scans the association registry, which stays
//! cheap at editor scale and can never go stale.

use hashbrown::{HashMap, HashSet};

use crate::id::ObjectId;
use crate::stage::Stage;

impl Stage {
    /// Targets of edges leaving `node`, self-loops included.
    pub fn node_children(&self, node: ObjectId) -> Vec<ObjectId> {
        self.resolved_edges()
            .filter(|(_, s, _)| *s == node)
            .map(|(_, _, t)| t)
            .collect()
    }

    /// Sources of edges entering `node`, self-loops excluded.
    pub fn node_parents(&self, node: ObjectId) -> Vec<ObjectId> {
        self.resolved_edges()
            .filter(|(_, s, t)| *t == node && s != t)
            .map(|(_, s, _)| s)
            .collect()
    }

    /// Follows parents upward from `node` to the top of its chain.
    ///
    /// The walk only continues through a node with exactly one distinct
    /// parent, so it stops at a fork, at a node without parents, or on a
    /// cycle. Returns `None` only when `node` is not a connectable entity.
    pub fn root(&self, node: ObjectId) -> Option<ObjectId> {
        self.connectable_entity(node)?;
        let mut parents: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
        for (_, s, t) in self.resolved_edges() {
            let entry = parents.entry(t).or_default();
            if s != t && !entry.contains(&s) {
                entry.push(s);
            }
        }
        let mut current = node;
        let mut visited: HashSet<ObjectId> = HashSet::new();
        visited.insert(current);
        while let Some([parent]) = parents.get(&current).map(Vec::as_slice) {
            if !visited.insert(*parent) {
                break;
            }
            current = *parent;
        }
        Some(current)
    }

    /// Every node reachable from `node`, `node` first, in depth-first order.
    pub fn successor_set(&self, node: ObjectId) -> Vec<ObjectId> {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current);
            let mut children = self.node_children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Direct successors of `node`, self-loops excluded.
    pub fn one_step_successor_set(&self, node: ObjectId) -> Vec<ObjectId> {
        self.resolved_edges()
            .filter(|(_, s, t)| *s == node && s != t)
            .map(|(_, _, t)| t)
            .collect()
    }

    /// Whether everything reachable from `node` is reached along exactly one
    /// path.
    ///
    /// Cycles, self-loops, and re-converging branches all make this false.
    pub fn is_tree(&self, node: ObjectId) -> bool {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                return false;
            }
            stack.extend(self.node_children(current));
        }
        true
    }

    /// Whether a directed edge `from → to` exists.
    pub fn is_connected(&self, from: ObjectId, to: ObjectId) -> bool {
        self.resolved_edges().any(|(_, s, t)| s == from && t == to)
    }

    /// Every directed edge `from → to`.
    pub fn edges_between(&self, from: ObjectId, to: ObjectId) -> Vec<ObjectId> {
        self.resolved_edges()
            .filter(|(_, s, t)| *s == from && *t == to)
            .map(|(id, _, _)| id)
            .collect()
    }

    /// The first directed edge `from → to`.
    pub fn edge_from_two_entities(&self, from: ObjectId, to: ObjectId) -> Option<ObjectId> {
        self.resolved_edges()
            .find(|(_, s, t)| *s == from && *t == to)
            .map(|(id, _, _)| id)
    }

    /// Hyper-edges that include `node` among their targets.
    pub fn hyper_edges_by_node(&self, node: ObjectId) -> Vec<ObjectId> {
        self.hyper_edges()
            .filter(|a| a.as_hyper_edge().is_some_and(|h| h.targets.contains(&node)))
            .map(|a| a.id())
            .collect()
    }
}
