// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end editing scenarios against the public API.

use kurbo::{Point, Vec2};
use stagecraft_shapes::RectExt;
use stagecraft_stage::{
    ObjectId, SerializedEntity, SerializedSection, SerializedStage, Stage, StageSettings,
};

fn rect(stage: &Stage, id: ObjectId) -> kurbo::Rect {
    stage.entity(id).unwrap().rectangle()
}

#[test]
fn connect_query_and_diamond() {
    let mut stage = Stage::new();
    let n1 = stage.create_text_node("A", Point::new(0.0, 0.0));
    let n2 = stage.create_text_node("B", Point::new(300.0, 0.0));
    assert!(stage.connect_entity(n1, n2));

    assert_eq!(stage.node_children(n1), vec![n2]);
    assert_eq!(stage.node_parents(n2), vec![n1]);
    assert!(stage.is_connected(n1, n2));
    assert!(stage.is_tree(n1));

    let n3 = stage.create_text_node("C", Point::new(150.0, 300.0));
    assert!(stage.connect_entity(n1, n3));
    assert!(stage.connect_entity(n2, n3));
    assert!(!stage.is_tree(n1), "C is reached along two paths");
    assert_eq!(stage.root(n2), Some(n1));
    assert_eq!(stage.root(n3), Some(n3), "the walk stops where parents fork");
}

#[test]
fn collapsing_hides_every_descendant() {
    let mut stage = Stage::new();
    let g = stage.create_text_node("grandchild", Point::new(0.0, 0.0));
    let c = stage.pack_entities_to_section(&[g], "child").unwrap();
    let s = stage.pack_entities_to_section(&[c], "outer").unwrap();
    assert_eq!(stage.section_max_depth(s), 2);

    assert!(stage.set_section_collapsed(s, true));
    assert!(stage.entity(c).unwrap().is_hidden_by_section_collapse());
    assert!(stage.entity(g).unwrap().is_hidden_by_section_collapse());
    assert!(!stage.entity(s).unwrap().is_hidden_by_section_collapse());
    assert_eq!(
        stage.find_entity_by_location(rect(&stage, g).center()),
        None,
        "hidden entities are not hit, and the collapsed box sits elsewhere"
    );

    assert!(stage.set_section_collapsed(s, false));
    assert!(!stage.entity(c).unwrap().is_hidden_by_section_collapse());
    assert!(!stage.entity(g).unwrap().is_hidden_by_section_collapse());
}

#[test]
fn point_lookup_returns_the_deepest_section() {
    let mut stage = Stage::new();
    let node = stage.create_text_node("n", Point::new(0.0, 0.0));
    let a = stage.pack_entities_to_section(&[node], "A").unwrap();
    let b = stage.pack_entities_to_section(&[a], "B").unwrap();
    let c = stage.pack_entities_to_section(&[b], "C").unwrap();

    let inside_a = rect(&stage, node).center();
    assert_eq!(stage.sections_by_inner_location(inside_a), vec![a]);

    let only_in_c = Point::new(rect(&stage, c).x0 + 5.0, rect(&stage, c).y1 - 5.0);
    assert_eq!(stage.sections_by_inner_location(only_in_c), vec![c]);
    assert!(stage.is_entity_in_section(node, c));
    assert_eq!(stage.father_sections(a).to_vec(), vec![b]);
}

#[test]
fn sections_cannot_swallow_themselves() {
    let mut stage = Stage::new();
    let node = stage.create_text_node("n", Point::new(0.0, 0.0));
    let inner = stage.pack_entities_to_section(&[node], "inner").unwrap();
    let outer = stage.pack_entities_to_section(&[inner], "outer").unwrap();

    assert!(!stage.go_in_section(&[inner], inner));
    assert!(!stage.go_in_section(&[outer], inner), "inner is a descendant of outer");
    assert!(stage.is_tree_pack(outer));
    assert_eq!(stage.father_sections(outer).len(), 0);
}

fn looped(uuid: ObjectId, children: Vec<ObjectId>) -> SerializedEntity {
    SerializedEntity::Section(SerializedSection {
        uuid,
        location: [0.0, 0.0],
        size: [100.0, 100.0],
        text: "loop".into(),
        color: Default::default(),
        children,
        is_hidden: false,
        is_collapsed: false,
        details: String::new(),
    })
}

#[test]
fn cyclic_containment_from_a_document_terminates() {
    let x_id = ObjectId::new();
    let y_id = ObjectId::new();
    let data = SerializedStage {
        entities: vec![looped(x_id, vec![y_id]), looped(y_id, vec![x_id])],
        ..SerializedStage::default()
    };
    let stage = Stage::from_serialized(&data).unwrap();

    assert!(stage.is_entity_in_section(x_id, y_id));
    assert!(stage.is_entity_in_section(y_id, x_id));
    assert!(!stage.is_entity_in_section(ObjectId::new(), x_id));
    assert!(!stage.is_tree_pack(x_id), "x reaches itself");
    assert_eq!(stage.section_max_depth(x_id), 2);
    assert_eq!(stage.section_descendants(x_id), vec![y_id]);
}

#[test]
fn collision_pushes_overlapping_entities_apart() {
    let settings = StageSettings::new().with_entity_collision(true);
    let mut stage = Stage::with_settings(settings);
    let a = stage.create_text_node("first", Point::new(0.0, 0.0));
    let b = stage.create_text_node("second", Point::new(400.0, 0.0));

    let target = rect(&stage, a).origin() + Vec2::new(20.0, 10.0);
    assert!(stage.move_entity_to(b, target));
    assert!(
        !rect(&stage, a).collides_with(&rect(&stage, b)),
        "pushed apart along the axis of least overlap"
    );
    assert_eq!(rect(&stage, b).origin(), target, "the moved entity stays put");
}

#[test]
fn deleting_a_section_keeps_outer_membership() {
    let mut stage = Stage::new();
    let a = stage.create_text_node("a", Point::new(0.0, 0.0));
    let b = stage.create_text_node("b", Point::new(300.0, 0.0));
    let inner = stage.pack_entities_to_section(&[a, b], "inner").unwrap();
    let outer = stage.pack_entities_to_section(&[inner], "outer").unwrap();
    stage.connect_entity(a, b);

    assert_eq!(stage.delete_entities(&[inner]), 1);
    assert!(stage.section(outer).unwrap().has_child(a));
    assert!(stage.section(outer).unwrap().has_child(b));
    assert!(stage.is_connected(a, b));

    assert_eq!(stage.delete_entities(&[a]), 1);
    assert_eq!(stage.edges().count(), 0);
}

#[test]
fn branching_cyclic_containment_terminates() {
    let a = ObjectId::new();
    let b = ObjectId::new();
    let data = SerializedStage {
        entities: vec![looped(a, vec![a, b]), looped(b, vec![a, b])],
        ..SerializedStage::default()
    };
    let stage = Stage::from_serialized(&data).unwrap();

    assert!(!stage.is_entity_in_section(ObjectId::new(), a));
    assert!(stage.is_entity_in_section(b, a));
    assert!(!stage.is_tree_pack(a));
    assert!(stage.shallower_sections(&[a, b]).is_empty(), "each contains the other");
}

#[test]
fn shallower_queries_look_through_every_level() {
    let mut stage = Stage::new();
    let node = stage.create_text_node("n", Point::new(0.0, 0.0));
    let a = stage.pack_entities_to_section(&[node], "A").unwrap();
    let b = stage.pack_entities_to_section(&[a], "B").unwrap();
    let c = stage.pack_entities_to_section(&[b], "C").unwrap();
    let loose = stage.create_text_node("loose", Point::new(2000.0, 0.0));

    assert_eq!(stage.shallower_sections(&[a, c]), vec![c]);
    assert_eq!(stage.shallower_sections(&[b, a]), vec![b]);
    assert_eq!(stage.shallower_not_section_entities(&[node, loose, c]), vec![loose, c]);
}

#[test]
fn jump_move_within_a_section_stays_inside() {
    let mut stage = Stage::new();
    let node = stage.create_text_node("n", Point::new(0.0, 0.0));
    let other = stage.create_text_node("other", Point::new(400.0, 0.0));
    let inner = stage.pack_entities_to_section(&[node], "inner").unwrap();
    let outer = stage.pack_entities_to_section(&[inner, other], "outer").unwrap();

    assert!(stage.jump_move_entity(inner, Vec2::new(5.0, 5.0)));
    assert_eq!(stage.father_sections(inner).to_vec(), vec![outer]);
    assert!(rect(&stage, inner).is_inside(&rect(&stage, outer)));
}
