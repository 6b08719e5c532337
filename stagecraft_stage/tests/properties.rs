// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests over randomly built stages.
//!
//! 1. Every node is in its own successor set, and its one-step successors
//!    are a subset of the rest.
//! 2. A refitted section encloses each child plus the section padding, also
//!    after a child moves.
//! 3. Reference repair is idempotent.
//! 4. No sequence of edge edits creates a duplicate edge, or a self-loop
//!    while self-loops are disabled.

use kurbo::{Point, Rect, Vec2};
use proptest::prelude::*;
use stagecraft_stage::{Association, Entity, ObjectId, Stage, StageSettings};

fn nodes(stage: &mut Stage, positions: &[(f64, f64)]) -> Vec<ObjectId> {
    positions
        .iter()
        .enumerate()
        .map(|(i, (x, y))| stage.create_text_node(format!("n{i}"), Point::new(*x, *y)))
        .collect()
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2_usize..8).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..16)))
}

fn positions_strategy(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-1000.0..1000.0_f64, -1000.0..1000.0_f64), 1..max)
}

fn encloses(outer: Rect, inner: Rect) -> bool {
    const EPS: f64 = 1e-9;
    inner.x0 >= outer.x0 - EPS
        && inner.y0 >= outer.y0 - EPS
        && inner.x1 <= outer.x1 + EPS
        && inner.y1 <= outer.y1 + EPS
}

#[derive(Clone, Debug)]
enum EdgeEdit {
    Connect(usize, usize),
    Reverse(usize),
    Retarget(usize, usize),
}

fn edit_strategy(n: usize) -> impl Strategy<Value = EdgeEdit> {
    prop_oneof![
        (0..n, 0..n).prop_map(|(s, t)| EdgeEdit::Connect(s, t)),
        (0_usize..32).prop_map(EdgeEdit::Reverse),
        (0_usize..32, 0..n).prop_map(|(e, t)| EdgeEdit::Retarget(e, t)),
    ]
}

fn snapshot(stage: &Stage) -> (Vec<Entity>, Vec<Association>, Vec<ObjectId>) {
    (
        stage.entities().cloned().collect(),
        stage.associations().cloned().collect(),
        stage.tags().to_vec(),
    )
}

proptest! {
    #[test]
    fn successor_set_contains_self_and_direct_successors((n, edges) in graph_strategy()) {
        let mut stage = Stage::new();
        #[allow(clippy::cast_precision_loss, reason = "small test indices")]
        let positions: Vec<(f64, f64)> = (0..n).map(|i| (i as f64 * 300.0, 0.0)).collect();
        let ids = nodes(&mut stage, &positions);
        for (s, t) in edges {
            stage.connect_entity(ids[s], ids[t]);
        }
        for &node in &ids {
            let all = stage.successor_set(node);
            prop_assert_eq!(all.first().copied(), Some(node));
            for next in stage.one_step_successor_set(node) {
                prop_assert!(next != node, "self-loops are not one-step successors");
                prop_assert!(all.contains(&next), "{:?} missing from successors of {:?}", next, node);
            }
        }
    }

    #[test]
    fn sections_enclose_padded_children(
        positions in positions_strategy(6),
        delta in (-500.0..500.0_f64, -500.0..500.0_f64),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut stage = Stage::new();
        let ids = nodes(&mut stage, &positions);
        let section = stage.pack_entities_to_section(&ids, "group").unwrap();
        let pad = stage.settings().section_padding;

        let check = |stage: &Stage| -> bool {
            let bounds = stage.section(section).unwrap().normal_rect();
            ids.iter().all(|id| {
                let child = stage.entity(*id).unwrap().rectangle().inflate(pad, pad);
                encloses(bounds, child)
            })
        };
        prop_assert!(check(&stage));

        let moved = ids[pick.index(ids.len())];
        stage.move_entity(moved, Vec2::new(delta.0, delta.1), true);
        prop_assert!(check(&stage), "section no longer encloses its children after a move");
    }

    #[test]
    fn update_references_is_idempotent(
        positions in positions_strategy(8),
        (n_edges, packed) in (0_usize..10, 0_usize..4),
    ) {
        let mut stage = Stage::new();
        let ids = nodes(&mut stage, &positions);
        for i in 0..n_edges {
            let (s, t) = (ids[i % ids.len()], ids[(i * 7 + 1) % ids.len()]);
            stage.connect_entity(s, t);
        }
        let group: Vec<ObjectId> = ids.iter().copied().take(packed).collect();
        if let Some(section) = stage.pack_entities_to_section(&group, "group") {
            stage.set_section_collapsed(section, packed % 2 == 0);
            stage.add_tag(section);
        }
        stage.add_tag(ids[0]);
        stage.remove_entity(ids[ids.len() - 1]);

        stage.update_references();
        let first = snapshot(&stage);
        stage.update_references();
        prop_assert_eq!(first, snapshot(&stage));
    }

    #[test]
    fn edge_edits_keep_edges_simple(
        edits in prop::collection::vec(edit_strategy(5), 0..40),
        allow_loops in any::<bool>(),
    ) {
        let mut stage = Stage::with_settings(StageSettings::new().with_cycle_edges(allow_loops));
        #[allow(clippy::cast_precision_loss, reason = "small test indices")]
        let positions: Vec<(f64, f64)> = (0..5).map(|i| (i as f64 * 300.0, 0.0)).collect();
        let ids = nodes(&mut stage, &positions);
        for edit in edits {
            let edges: Vec<ObjectId> = stage.edges().map(Association::id).collect();
            match edit {
                EdgeEdit::Connect(s, t) => {
                    stage.connect_entity(ids[s], ids[t]);
                }
                EdgeEdit::Reverse(e) if !edges.is_empty() => {
                    stage.reverse_edges(&[edges[e % edges.len()]]);
                }
                EdgeEdit::Retarget(e, t) if !edges.is_empty() => {
                    stage.change_edge_target(edges[e % edges.len()], ids[t]);
                }
                _ => {}
            }
        }

        let mut pairs: Vec<(ObjectId, ObjectId)> = stage
            .edges()
            .filter_map(Association::as_edge)
            .map(|e| (e.source.id(), e.target.id()))
            .collect();
        if !allow_loops {
            prop_assert!(pairs.iter().all(|(s, t)| s != t), "self-loop while loops are disabled");
        }
        let total = pairs.len();
        pairs.sort();
        pairs.dedup();
        prop_assert_eq!(pairs.len(), total, "two edges share a direction and endpoints");
    }
}
