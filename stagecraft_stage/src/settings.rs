// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage configuration and the text measurement boundary.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Tunables for a [`Stage`](crate::Stage).
///
/// All lengths are in world units. Deserializing fills missing fields from
/// [`StageSettings::default`], so partial settings files are fine.
///
/// ```rust
/// use stagecraft_stage::StageSettings;
///
/// let settings = StageSettings::new()
///     .with_entity_collision(true)
///     .with_cycle_edges(true);
/// assert!(settings.enable_entity_collision);
/// assert_eq!(settings.section_padding, 30.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageSettings {
    /// Push overlapping entities apart after moves.
    pub enable_entity_collision: bool,
    /// Permit edges whose source and target are the same entity.
    pub allow_cycle_edges: bool,
    /// Font size used to size text nodes and section titles.
    pub font_size: f64,
    /// Space between a text node's text and its border.
    pub node_padding: f64,
    /// Margin between a section's border and its children.
    pub section_padding: f64,
    /// Height of the title strip above a section's children.
    pub section_title_height: f64,
    /// Minimum width and height of an empty section.
    pub section_min_size: f64,
    /// Recursion budget for containment walks over sections.
    pub max_section_depth: usize,
    /// Recursion budget for collision push-apart chains.
    pub collision_depth_limit: usize,
    /// Cell size for grid snapping.
    pub grid_size: f64,
    /// Distance under which an edge snaps to another entity's edge.
    pub align_threshold: f64,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            enable_entity_collision: false,
            allow_cycle_edges: false,
            font_size: 32.0,
            node_padding: 14.0,
            section_padding: 30.0,
            section_title_height: 50.0,
            section_min_size: 100.0,
            max_section_depth: 996,
            collision_depth_limit: 32,
            grid_size: 50.0,
            align_threshold: 25.0,
        }
    }
}

impl StageSettings {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle collision push-apart.
    pub fn with_entity_collision(mut self, enabled: bool) -> Self {
        self.enable_entity_collision = enabled;
        self
    }

    /// Toggle self-loop edges.
    pub fn with_cycle_edges(mut self, allowed: bool) -> Self {
        self.allow_cycle_edges = allowed;
        self
    }

    /// Set the font size.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Set the text node padding.
    pub fn with_node_padding(mut self, padding: f64) -> Self {
        self.node_padding = padding;
        self
    }

    /// Set the section margin and title strip height.
    pub fn with_section_layout(mut self, padding: f64, title_height: f64) -> Self {
        self.section_padding = padding;
        self.section_title_height = title_height;
        self
    }

    /// Set the snapping grid cell size.
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the entity snapping threshold.
    pub fn with_align_threshold(mut self, threshold: f64) -> Self {
        self.align_threshold = threshold;
        self
    }
}

/// Measures rendered text.
///
/// The stage sizes text nodes and section titles from their text but does not
/// render anything itself; hosts plug their font stack in here.
pub trait TextMeasure {
    /// Size of `text` laid out at `font_size`, one line per `\n`.
    fn measure(&self, text: &str, font_size: f64) -> Size;
}

/// A fixed-advance approximation of text layout.
///
/// Every character advances `0.6 * font_size`; lines are `1.5 * font_size`
/// tall. Good enough for tests and headless use.
#[derive(Copy, Clone, Debug, Default)]
pub struct MonospaceMeasure;

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font_size: f64) -> Size {
        let mut lines = 0_usize;
        let mut widest = 0_usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        Size::new(
            widest as f64 * font_size * 0.6,
            lines as f64 * font_size * 1.5,
        )
    }
}
