// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filters for [`Scene::find_nodes`](crate::Scene::find_nodes).

use kurbo::Rect;

use crate::scene::Scene;
use crate::types::NodeId;
use crate::util::intersects;

/// Decides which nodes a find query reports and which subtrees it enters.
pub trait FindFilter {
    /// Should `node` be reported?
    fn accept(&mut self, scene: &Scene, node: NodeId) -> bool;

    /// Should the search continue into the children of `node`?
    fn descend(&mut self, scene: &Scene, node: NodeId) -> bool {
        let _ = (scene, node);
        true
    }
}

/// Accepts nodes whose global bounds touch a rectangle, and prunes subtrees
/// whose bounds do not.
#[derive(Clone, Copy, Debug)]
pub struct BoundsFilter {
    /// Query rectangle in global (root) coordinates.
    pub rect: Rect,
}

impl BoundsFilter {
    /// Filter for nodes touching `rect`.
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }

    fn touches(&self, scene: &Scene, node: NodeId) -> bool {
        scene
            .global_bounds(node)
            .is_some_and(|b| intersects(b, self.rect))
    }
}

impl FindFilter for BoundsFilter {
    fn accept(&mut self, scene: &Scene, node: NodeId) -> bool {
        self.touches(scene, node)
    }

    fn descend(&mut self, scene: &Scene, node: NodeId) -> bool {
        self.touches(scene, node)
    }
}

/// Accepts nodes wrapped in a selection decorator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectedFilter;

impl FindFilter for SelectedFilter {
    fn accept(&mut self, scene: &Scene, node: NodeId) -> bool {
        scene.is_selected(node)
    }
}

/// Adapts a closure into an accept-only filter.
pub struct FnFilter<F>(pub F);

impl<F> core::fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnFilter")
    }
}

impl<F: FnMut(&Scene, NodeId) -> bool> FindFilter for FnFilter<F> {
    fn accept(&mut self, scene: &Scene, node: NodeId) -> bool {
        (self.0)(scene, node)
    }
}
