// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage accumulated for an output surface.

use alloc::vec::Vec;
use kurbo::Rect;

/// Regions of an output surface that need repainting.
///
/// Repaint requests that reach a camera bound to a surface are accumulated
/// here in surface coordinates until drained with
/// [`Scene::take_damage`](crate::Scene::take_damage). Rectangles may overlap
/// and are not a minimal cover.
#[derive(Clone, Debug, Default)]
pub struct Damage {
    /// Surface-space rectangles that should be repainted.
    pub dirty_rects: Vec<Rect>,
}

impl Damage {
    /// Returns the union of all damage rects.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Whether no region is pending.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    /// Record a damaged region, folding it into an existing rect that already
    /// contains it.
    pub(crate) fn add(&mut self, rect: Rect) {
        if self
            .dirty_rects
            .iter()
            .any(|r| r.x0 <= rect.x0 && r.y0 <= rect.y0 && r.x1 >= rect.x1 && r.y1 >= rect.y1)
        {
            return;
        }
        self.dirty_rects.push(rect);
    }
}
