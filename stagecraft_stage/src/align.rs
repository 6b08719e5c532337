// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alignment, distribution, and snapping of the selection.
//!
//! Everything here acts on the selected entities (members of a selected
//! section ride along with it) and moves them through
//! [`Stage::move_entity`], so section refits and collision pushes apply.

use kurbo::{Point, Rect, Vec2};
use stagecraft_shapes::RectExt;

use crate::id::ObjectId;
use crate::stage::Stage;

/// Gap between cells in [`Stage::layout_to_square`].
const SQUARE_SPACING: f64 = 20.0;

/// Rows and columns for `n` cells, as close to square as possible.
fn optimal_rows_cols(n: usize) -> (usize, usize) {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "square root of a small positive count"
    )]
    let mut best_rows = ((n as f64).sqrt().floor() as usize).max(1);
    let mut best_cols = n.div_ceil(best_rows);
    let mut best_diff = best_rows.abs_diff(best_cols);
    for rows in (1..=best_rows).rev() {
        let cols = n.div_ceil(rows);
        let diff = rows.abs_diff(cols);
        if diff < best_diff {
            best_diff = diff;
            best_rows = rows;
            best_cols = cols;
        }
    }
    (best_rows, best_cols)
}

/// Snap distance for one axis: moves whichever of the two edges is nearer to
/// a grid line onto it.
fn grid_snap(low: f64, high: f64, grid: f64) -> f64 {
    let snap = |v: f64| {
        let m = v.rem_euclid(grid);
        if m < grid - m { -m } else { grid - m }
    };
    let (a, b) = (snap(low), snap(high));
    if a.abs() < b.abs() { a } else { b }
}

/// The value of smallest magnitude; the first one wins ties.
fn min_abs(values: [f64; 3]) -> f64 {
    values
        .into_iter()
        .fold(f64::INFINITY, |best, v| if v.abs() < best.abs() { v } else { best })
}

impl Stage {
    fn selected_rects(&self) -> Vec<(ObjectId, Rect)> {
        self.outermost(&self.selected_entity_ids())
            .into_iter()
            .filter_map(|id| self.entity(id).map(|e| (id, e.rectangle())))
            .collect()
    }

    /// Lines up the left edges of the selection with the leftmost one.
    pub fn align_left(&mut self) {
        let items = self.selected_rects();
        let min = items.iter().map(|(_, r)| r.x0).fold(f64::INFINITY, f64::min);
        for (id, r) in items {
            self.move_entity(id, Vec2::new(min - r.x0, 0.0), true);
        }
    }

    /// Lines up the right edges of the selection with the rightmost one.
    pub fn align_right(&mut self) {
        let items = self.selected_rects();
        let max = items.iter().map(|(_, r)| r.x1).fold(f64::NEG_INFINITY, f64::max);
        for (id, r) in items {
            self.move_entity(id, Vec2::new(max - r.x1, 0.0), true);
        }
    }

    /// Lines up the top edges of the selection with the topmost one.
    pub fn align_top(&mut self) {
        let items = self.selected_rects();
        let min = items.iter().map(|(_, r)| r.y0).fold(f64::INFINITY, f64::min);
        for (id, r) in items {
            self.move_entity(id, Vec2::new(0.0, min - r.y0), true);
        }
    }

    /// Lines up the bottom edges of the selection with the lowest one.
    pub fn align_bottom(&mut self) {
        let items = self.selected_rects();
        let max = items.iter().map(|(_, r)| r.y1).fold(f64::NEG_INFINITY, f64::max);
        for (id, r) in items {
            self.move_entity(id, Vec2::new(0.0, max - r.y1), true);
        }
    }

    /// Centers the selection vertically on a shared horizontal axis.
    pub fn align_center_horizontal(&mut self) {
        let items = self.selected_rects();
        if items.len() <= 1 {
            return;
        }
        let bounds = items.iter().fold(items[0].1, |acc, (_, r)| acc.union(*r));
        let center_y = bounds.center().y;
        for (id, r) in items {
            self.move_entity_to(id, Point::new(r.x0, center_y - r.height() / 2.0));
        }
    }

    /// Centers the selection horizontally on a shared vertical axis.
    pub fn align_center_vertical(&mut self) {
        let items = self.selected_rects();
        if items.len() <= 1 {
            return;
        }
        let bounds = items.iter().fold(items[0].1, |acc, (_, r)| acc.union(*r));
        let center_x = bounds.center().x;
        for (id, r) in items {
            self.move_entity_to(id, Point::new(center_x - r.width() / 2.0, r.y0));
        }
    }

    /// Spreads the selection left to right with equal gaps, keeping the
    /// outermost two in place.
    pub fn align_horizontal_space_between(&mut self) {
        let mut items = self.selected_rects();
        if items.len() <= 1 {
            return;
        }
        let bounds = items.iter().fold(items[0].1, |acc, (_, r)| acc.union(*r));
        let used: f64 = items.iter().map(|(_, r)| r.width()).sum();
        #[allow(clippy::cast_precision_loss, reason = "selection sizes are small")]
        let gap = (bounds.width() - used) / (items.len() - 1) as f64;
        items.sort_by(|a, b| a.1.x0.total_cmp(&b.1.x0));
        let mut x = bounds.x0;
        for (id, r) in items {
            self.move_entity_to(id, Point::new(x, r.y0));
            x += r.width() + gap;
        }
    }

    /// Spreads the selection top to bottom with equal gaps, keeping the
    /// outermost two in place.
    pub fn align_vertical_space_between(&mut self) {
        let mut items = self.selected_rects();
        if items.len() <= 1 {
            return;
        }
        let bounds = items.iter().fold(items[0].1, |acc, (_, r)| acc.union(*r));
        let used: f64 = items.iter().map(|(_, r)| r.height()).sum();
        #[allow(clippy::cast_precision_loss, reason = "selection sizes are small")]
        let gap = (bounds.height() - used) / (items.len() - 1) as f64;
        items.sort_by(|a, b| a.1.y0.total_cmp(&b.1.y0));
        let mut y = bounds.y0;
        for (id, r) in items {
            self.move_entity_to(id, Point::new(r.x0, y));
            y += r.height() + gap;
        }
    }

    /// Arranges the selection on a near-square grid of equal cells centered
    /// where the selection was.
    pub fn layout_to_square(&mut self) {
        let items = self.selected_rects();
        let n = items.len();
        if n <= 1 {
            return;
        }
        let cell = items
            .iter()
            .map(|(_, r)| r.width().max(r.height()))
            .fold(0.0_f64, f64::max)
            + SQUARE_SPACING;
        let (rows, cols) = optimal_rows_cols(n);
        let bounds = items.iter().fold(items[0].1, |acc, (_, r)| acc.union(*r));
        #[allow(clippy::cast_precision_loss, reason = "grid dimensions are small")]
        let start = bounds.center() - Vec2::new(cols as f64 * cell, rows as f64 * cell) / 2.0;
        for (index, (id, r)) in items.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss, reason = "grid indices are small")]
            let cell_center = start
                + Vec2::new(
                    (index % cols) as f64 * cell + cell / 2.0,
                    (index / cols) as f64 * cell + cell / 2.0,
                );
            self.move_entity_to(id, cell_center - r.size().to_vec2() / 2.0);
        }
    }

    /// Snaps each selected entity to the grid, per axis moving whichever edge
    /// is closer to a grid line onto it.
    pub fn align_selected_to_grid(&mut self) {
        let grid = self.settings.grid_size;
        if grid <= 0.0 {
            return;
        }
        let ids: Vec<ObjectId> = self
            .selected_rects()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| self.entity(*id).is_some_and(|e| !e.is_align_excluded()))
            .collect();
        for id in ids {
            let Some(r) = self.entity(id).map(|e| e.rectangle()) else {
                continue;
            };
            self.move_entity(id, Vec2::new(grid_snap(r.x0, r.x1, grid), 0.0), true);
            let Some(r) = self.entity(id).map(|e| e.rectangle()) else {
                continue;
            };
            self.move_entity(id, Vec2::new(0.0, grid_snap(r.y0, r.y1, grid)), true);
        }
    }

    /// Snaps each selected entity to nearby unselected ones.
    ///
    /// Per axis, the nearest non-overlapping neighbor whose left, center, or
    /// right (top, center, bottom) line is within
    /// [`align_threshold`](crate::StageSettings::align_threshold) wins.
    /// Entities that opt out of alignment are neither moved nor snapped to.
    pub fn align_selected_to_others(&mut self) {
        let threshold = self.settings.align_threshold;
        let others: Vec<ObjectId> = self
            .entities()
            .filter(|e| !e.is_selected() && !e.is_hidden_by_section_collapse() && !e.is_align_excluded())
            .map(|e| e.id())
            .collect();
        let selected: Vec<ObjectId> = self
            .selected_rects()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| self.entity(*id).is_some_and(|e| !e.is_align_excluded()))
            .collect();
        for id in selected {
            let Some(rect) = self.entity(id).map(|e| e.rectangle()) else {
                continue;
            };
            let mut near: Vec<(f64, Rect)> = others
                .iter()
                .filter_map(|o| self.entity(*o).map(|e| e.rectangle()))
                .filter(|r| !r.collides_with(&rect))
                .map(|r| ((r.center() - rect.center()).hypot(), r))
                .collect();
            near.sort_by(|a, b| a.0.total_cmp(&b.0));

            let dx = near
                .iter()
                .map(|(_, o)| min_abs([o.x0 - rect.x0, o.center().x - rect.center().x, o.x1 - rect.x1]))
                .find(|d| *d != 0.0 && d.abs() < threshold)
                .unwrap_or(0.0);
            let dy = near
                .iter()
                .map(|(_, o)| min_abs([o.y0 - rect.y0, o.center().y - rect.center().y, o.y1 - rect.y1]))
                .find(|d| *d != 0.0 && d.abs() < threshold)
                .unwrap_or(0.0);
            if dx != 0.0 || dy != 0.0 {
                tracing::trace!(%id, dx, dy, "snapped to neighbor");
                self.move_entity(id, Vec2::new(dx, dy), true);
            }
        }
    }
}
