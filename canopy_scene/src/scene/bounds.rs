// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds cache, volatility, and damage propagation.

use kurbo::Rect;
use smallvec::SmallVec;

use super::Scene;
use crate::error::Result;
use crate::types::{CameraId, Decorator, NodeFlags, NodeId};
use crate::util::{overlap, transform_rect_bbox, union_bounds};
use crate::visual::Content;

/// Cameras currently forwarding a damage rectangle; re-entry is skipped.
type CameraStack = SmallVec<[CameraId; 4]>;

impl Scene {
    /// Bounds of `id` in its parent's coordinate space.
    ///
    /// Returns the cached value, recomputing it first when the node is
    /// volatile. `None` means the node and its subtree draw nothing (or the
    /// id is stale).
    pub fn bounds(&mut self, id: NodeId) -> Option<Rect> {
        self.fresh_bounds(id)
    }

    /// Union of content and children bounds in the node's own local space,
    /// before its transform is applied.
    pub fn local_bounds(&mut self, id: NodeId) -> Option<Rect> {
        if self.nodes.get(id)?.volatile {
            self.refresh_volatile_parts(id);
        }
        self.aggregate(id)
    }

    /// Effective volatility: the node's own [`NodeFlags::VOLATILE`], volatile
    /// content, or any volatile descendant.
    pub fn is_volatile(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.volatile)
    }

    /// Set or clear the node's own volatile flag.
    pub fn set_volatile(&mut self, id: NodeId, volatile: bool) -> Result<()> {
        let mut flags = self.node(id)?.flags;
        flags.set(NodeFlags::VOLATILE, volatile);
        self.set_flags(id, flags)?;
        if !volatile {
            // Freeze a current value into the cache chain.
            self.update_bounds_upward(id);
        }
        Ok(())
    }

    /// Damage the area the node currently covers. Nothing is recomputed.
    pub fn repaint(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.damage_node(id);
        Ok(())
    }

    /// Damage `rect`, given in the node's local space.
    pub fn repaint_rect(&mut self, id: NodeId, rect: Rect) -> Result<()> {
        let affine = self.node(id)?.affine();
        self.propagate_damage(id, transform_rect_bbox(affine, rect), &mut CameraStack::new());
        Ok(())
    }

    /// Repaint the old area, recompute bounds up to the root, and repaint
    /// the new area.
    pub fn reshape(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.damage_node(id);
        self.update_bounds_upward(id);
        self.damage_node(id);
        Ok(())
    }

    pub(crate) fn cached_bounds(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(id)?.bounds
    }

    pub(crate) fn fresh_bounds(&mut self, id: NodeId) -> Option<Rect> {
        if self.nodes.get(id)?.volatile {
            self.compute_bounds(id)
        } else {
            self.cached_bounds(id)
        }
    }

    pub(crate) fn content_bounds(&self, content: Content) -> Option<Rect> {
        match content {
            Content::Visual(v) => self.visuals.get(v)?.bounds,
            Content::Camera(c) => Some(self.cameras.get(c)?.viewport),
        }
    }

    /// Content and children in local space, from the caches.
    fn aggregate(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let mut local = None;
        for content in [node.back, node.front].into_iter().flatten() {
            local = union_bounds(local, self.content_bounds(content));
        }
        for &child in &node.children {
            local = union_bounds(local, self.cached_bounds(child));
        }
        local
    }

    /// Recompute and cache the bounds of `id` from its content and children.
    pub(crate) fn compute_bounds(&mut self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        if node.volatile {
            self.refresh_volatile_parts(id);
        }
        let bounds = self.aggregate(id).map(|local| {
            let Some(node) = self.nodes.get(id) else {
                return local;
            };
            // The selection outline is stroked centered on the child's bounds.
            let local = match node.decorator {
                Some(Decorator::Selection { width, .. }) => {
                    local.inflate(width / 2.0, width / 2.0)
                }
                _ => local,
            };
            match node.transform.as_ref() {
                Some(t) => transform_rect_bbox(t.affine(), local),
                None => local,
            }
        });
        if let Some(node) = self.nodes.get_mut(id) {
            node.bounds = bounds;
        }
        bounds
    }

    fn refresh_volatile_parts(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let contents = [node.back, node.front];
        let children: SmallVec<[NodeId; 8]> = node
            .children
            .iter()
            .copied()
            .filter(|c| self.nodes.get(*c).is_some_and(|n| n.volatile))
            .collect();
        for content in contents.into_iter().flatten() {
            if let Content::Visual(v) = content
                && let Some(slot) = self.visuals.get_mut(v)
            {
                slot.refresh();
            }
        }
        for child in children {
            self.compute_bounds(child);
        }
    }

    /// Recompute `id` and its ancestors, stopping once a level is unchanged.
    pub(crate) fn update_bounds_upward(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(n) = current {
            let old = self.cached_bounds(n);
            let new = self.compute_bounds(n);
            if old == new && n != id {
                break;
            }
            current = self.parent(n);
        }
    }

    fn compute_volatility(&self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        node.flags.contains(NodeFlags::VOLATILE)
            || [node.back, node.front].into_iter().flatten().any(|c| match c {
                Content::Visual(v) => self.visuals.get(v).is_some_and(|s| s.volatile),
                Content::Camera(_) => false,
            })
            || node.children.iter().any(|c| self.is_volatile(*c))
    }

    /// Recompute effective volatility of `id` and its ancestors, stopping once
    /// a level is unchanged.
    pub(crate) fn update_volatility_upward(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(n) = current {
            let volatile = self.compute_volatility(n);
            let Some(node) = self.nodes.get_mut(n) else {
                return;
            };
            if node.volatile == volatile {
                return;
            }
            node.volatile = volatile;
            current = node.parent;
        }
    }

    /// Damage the node's current bounds.
    pub(crate) fn damage_node(&mut self, id: NodeId) {
        if let Some(bounds) = self.fresh_bounds(id) {
            self.propagate_damage(id, bounds, &mut CameraStack::new());
        }
    }

    /// Damage a whole camera viewport.
    pub(crate) fn repaint_camera(&mut self, camera: CameraId) {
        if let Some(viewport) = self.cameras.get(camera).map(|c| c.viewport) {
            self.damage_viewport(camera, viewport, &mut CameraStack::new());
        }
    }

    /// Walk upward from `id` with `rect` in its parent's space, handing the
    /// rectangle to every camera observing a layer on the way.
    fn propagate_damage(&mut self, id: NodeId, mut rect: Rect, stack: &mut CameraStack) {
        let mut current = id;
        loop {
            let Some(node) = self.nodes.get(current) else {
                return;
            };
            if !node.flags.contains(NodeFlags::VISIBLE) {
                return;
            }
            let parent = node.parent;
            if !node.cameras.is_empty() {
                let cameras = node.cameras.clone();
                for camera in cameras {
                    let Some(view) = self.cameras.get(camera).map(|c| c.view.affine()) else {
                        continue;
                    };
                    self.damage_viewport(camera, transform_rect_bbox(view, rect), stack);
                }
            }
            let Some(parent) = parent else {
                return;
            };
            if let Some(t) = self.nodes.get(parent).and_then(|n| n.transform.as_ref()) {
                rect = transform_rect_bbox(t.affine(), rect);
            }
            current = parent;
        }
    }

    /// `rect` is in the camera's own coordinates (those of its viewport).
    fn damage_viewport(&mut self, camera: CameraId, rect: Rect, stack: &mut CameraStack) {
        if stack.contains(&camera) {
            log::debug!("damage re-entered {camera:?}; skipped");
            return;
        }
        let Some(c) = self.cameras.get(camera) else {
            return;
        };
        let Some(clipped) = overlap(rect, c.viewport) else {
            return;
        };
        let surface = c.surface;
        let owners = c.owners.clone();
        if let Some(surface) = surface
            && let Some(s) = self.surfaces.get_mut(surface)
        {
            s.damage.add(clipped);
        }
        if surface.is_none() && owners.is_empty() {
            log::debug!("damage for unbound {camera:?} dropped");
            return;
        }
        stack.push(camera);
        for owner in owners {
            let Some(node) = self.nodes.get(owner) else {
                continue;
            };
            let rect = transform_rect_bbox(node.affine(), clipped);
            self.propagate_damage(owner, rect, stack);
        }
        stack.pop();
    }
}
