// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stagecraft Stage: the object model behind a node-graph diagram editor.
//!
//! A [`Stage`] owns every object on one diagram and keeps them consistent while
//! they are edited:
//!
//! - Entities ([`Entity`]): text nodes, sections, connect points, pen strokes,
//!   portals, and SVG graphics. Sections contain other entities and refit
//!   around them.
//! - Associations ([`Association`]): directed line and spline edges, and
//!   undirected hyper-edges that join several entities.
//! - Graph queries over directed edges (children, parents, successors, roots,
//!   tree checks) and containment queries over sections.
//! - Movement that carries section members along, refits enclosing sections,
//!   and optionally pushes overlapping entities apart.
//!
//! Every reference between objects is an [`ObjectId`]. After bulk changes,
//! [`Stage::update_references`] re-resolves edge endpoints, rebuilds section
//! membership, and recomputes derived flags.
//!
//! ## Where this fits
//!
//! The stage sits between an input layer that turns pointer and keyboard events
//! into calls like [`Stage::move_entity`] or [`Stage::connect_entity`], a
//! renderer that reads entity rectangles and collision boxes, and a
//! persistence layer that exchanges [`SerializedStage`] documents. None of
//! those are part of this crate. Text measurement is delegated to a
//! [`TextMeasure`] implementation; [`MonospaceMeasure`] is the default.
//!
//! ## Failure model
//!
//! Nothing reachable through normal editing panics or errors. Refused edits
//! return `false` or `None`; malformed structure (a section that contains
//! itself) yields a defined answer. Only [`Stage::load_serialized`] returns a
//! [`LoadError`], for input that cannot describe a stage at all.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Vec2};
//! use stagecraft_stage::Stage;
//!
//! let mut stage = Stage::new();
//! let a = stage.create_text_node("A", Point::new(0.0, 0.0));
//! let b = stage.create_text_node("B", Point::new(300.0, 0.0));
//! let c = stage.create_text_node("C", Point::new(300.0, 300.0));
//! stage.connect_entity(a, b);
//! stage.connect_entity(a, c);
//! assert!(stage.is_tree(a));
//!
//! stage.connect_entity(b, c);
//! assert!(!stage.is_tree(a), "C is now reached twice");
//!
//! let section = stage.pack_entities_to_section(&[b, c], "group").unwrap();
//! stage.move_entity(section, Vec2::new(100.0, 0.0), true);
//! assert_eq!(stage.entity(b).unwrap().rectangle().x0, 400.0);
//! ```
//!
//! Logging goes through [`tracing`]; no subscriber is installed here.

mod align;
mod association;
mod edges;
mod entity;
mod error;
mod graph;
mod id;
mod movement;
mod section;
mod sections;
mod serialized;
mod settings;
mod stage;
mod structure;
mod types;

pub use association::{
    Association, AssociationKind, CENTER_RATE, Edge, Endpoint, HyperEdge, HyperEdgeArrow,
    HyperEdgeRenderType, SplineEdge,
};
pub use edges::{SHIFTING_OFFSET, side_rate};
pub use entity::{
    ConnectPoint, Entity, EntityFlags, EntityKind, PenStroke, PenStrokeSegment, PortalNode,
    SizeAdjust, SvgNode, TextNode,
};
pub use error::LoadError;
pub use id::ObjectId;
pub use section::Section;
pub use sections::FatherSections;
pub use serialized::{
    SerializedAssociation, SerializedConnectPoint, SerializedEntity, SerializedHyperEdge,
    SerializedLineEdge, SerializedPenStroke, SerializedPortalNode, SerializedSection,
    SerializedSplineEdge, SerializedStage, SerializedSvgNode, SerializedTextNode, Vector,
};
pub use settings::{MonospaceMeasure, StageSettings, TextMeasure};
pub use stage::Stage;
pub use types::{Color, Direction};
