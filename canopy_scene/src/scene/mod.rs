// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: node, visual, camera, and surface arenas plus the operations
//! that keep cached bounds, volatility, and damage consistent.

use alloc::vec::Vec;

use kurbo::{Affine, Rect, Size};
use smallvec::SmallVec;

use crate::arena::Arena;
use crate::damage::Damage;
use crate::error::{Result, SceneError};
use crate::events::{Listeners, SceneEvent};
use crate::transform::TransformState;
use crate::types::{
    CameraId, Decorator, Fade, ListenerId, NodeFlags, NodeId, NodeProps, Rgba, SurfaceId,
};
use crate::visual::{Content, VisualSlot};

mod bounds;
mod camera;
mod clone;
mod content;
mod pick;
mod render;
mod structure;
mod surface;
mod transform_ops;

pub use clone::CloneContext;

/// Camera-space placement kept for a node stuck to a camera.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Sticky {
    pub(crate) camera: CameraId,
    /// Transform from the node's local space to camera space at the time it
    /// was stuck.
    pub(crate) placement: Affine,
}

pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) flags: NodeFlags,
    pub(crate) transform: Option<TransformState>,
    pub(crate) fade: Option<Fade>,
    pub(crate) decorator: Option<Decorator>,
    pub(crate) back: Option<Content>,
    pub(crate) front: Option<Content>,
    /// Cameras observing this node as a layer.
    pub(crate) cameras: SmallVec<[CameraId; 1]>,
    pub(crate) sticky: Option<Sticky>,
    /// Cached bounds in the parent's space.
    pub(crate) bounds: Option<Rect>,
    /// Effective volatility: own flag, volatile content, or a volatile child.
    pub(crate) volatile: bool,
}

impl Node {
    fn new(props: NodeProps) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            volatile: props.flags.contains(NodeFlags::VOLATILE),
            flags: props.flags,
            transform: props.transform.map(TransformState::new),
            fade: props.fade,
            decorator: props.decorator,
            back: None,
            front: None,
            cameras: SmallVec::new(),
            sticky: None,
            bounds: None,
        }
    }

    pub(crate) fn affine(&self) -> Affine {
        self.transform
            .as_ref()
            .map_or(Affine::IDENTITY, TransformState::affine)
    }
}

pub(crate) struct Camera {
    pub(crate) viewport: Rect,
    pub(crate) view: TransformState,
    pub(crate) layers: Vec<NodeId>,
    pub(crate) fill: Option<Rgba>,
    pub(crate) surface: Option<SurfaceId>,
    /// Nodes embedding this camera as content.
    pub(crate) owners: SmallVec<[NodeId; 1]>,
    pub(crate) sticky: Vec<NodeId>,
}

pub(crate) struct Surface {
    pub(crate) camera: CameraId,
    pub(crate) size: Size,
    pub(crate) damage: Damage,
}

/// A retained 2D scene.
///
/// The scene owns every node, visual component, camera, and surface binding;
/// callers hold generational handles. All operations are synchronous and
/// single-threaded.
///
/// Bounds are cached per node in the parent's coordinate space and kept
/// current by every mutation, so culling and picking never walk a subtree
/// whose bounds miss the query. Repaint requests travel upward through the
/// tree into the cameras observing each layer and accumulate as [`Damage`]
/// on bound surfaces.
///
/// # Example
///
/// ```
/// use canopy_scene::{NodeProps, Scene};
/// use kurbo::{Affine, Point, Rect};
///
/// let mut scene = Scene::new();
/// let layer = scene.insert(None, NodeProps::default()).unwrap();
/// let group = scene
///     .insert(Some(layer), NodeProps::transformed(Affine::translate((10.0, 0.0))))
///     .unwrap();
/// let camera = scene.create_camera(Rect::new(0.0, 0.0, 200.0, 100.0));
/// scene.add_layer(camera, layer).unwrap();
///
/// let global = scene.local_to_global_point(group, Point::new(1.0, 1.0)).unwrap();
/// assert_eq!(global, Point::new(11.0, 1.0));
/// ```
#[derive(Default)]
pub struct Scene {
    pub(crate) nodes: Arena<NodeId, Node>,
    pub(crate) visuals: Arena<crate::types::VisualId, VisualSlot>,
    pub(crate) cameras: Arena<CameraId, Camera>,
    pub(crate) surfaces: Arena<SurfaceId, Surface>,
    pub(crate) listeners: Listeners,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes_alive", &self.nodes.len())
            .field("nodes_total", &self.nodes.capacity())
            .field("visuals", &self.visuals.len())
            .field("cameras", &self.cameras.len())
            .field("surfaces", &self.surfaces.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new node, optionally appending it to `parent`.
    pub fn insert(&mut self, parent: Option<NodeId>, props: NodeProps) -> Result<NodeId> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        let id = self.nodes.insert(Node::new(props));
        if let Some(parent) = parent
            && let Err(err) = self.add_child(parent, id)
        {
            self.nodes.remove(id);
            return Err(err);
        }
        log::trace!("inserted {id:?} under {parent:?}");
        Ok(id)
    }

    /// Detach `id` (repainting what it covered) and free its whole subtree.
    ///
    /// Layers in the subtree are unregistered from their cameras and content
    /// references are released. Visual components stay registered.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.remove_child(parent, id)?;
        }
        let doomed: Vec<NodeId> = self.descendants(id).collect();
        for node in doomed {
            self.free_node(node);
        }
        log::trace!("destroyed subtree at {id:?}");
        Ok(())
    }

    fn free_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        for camera in node.cameras {
            if let Some(c) = self.cameras.get_mut(camera) {
                c.layers.retain(|l| *l != id);
            }
            self.repaint_camera(camera);
        }
        for content in [node.back, node.front].into_iter().flatten() {
            self.release_content(id, content);
        }
        if let Some(sticky) = node.sticky
            && let Some(c) = self.cameras.get_mut(sticky.camera)
        {
            c.sticky.retain(|n| *n != id);
        }
        self.listeners.forget_node(id);
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(SceneError::StaleNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(SceneError::StaleNode(id))
    }

    /// Returns the parent of a node, or `None` for roots or stale ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Get the children of a node in paint order (bottom first), or an empty
    /// slice if the node is stale.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    /// Number of children.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// The child at `index`.
    pub fn child_at(&self, parent: NodeId, index: usize) -> Result<NodeId> {
        let children = &self.node(parent)?.children;
        children
            .get(index)
            .copied()
            .ok_or(SceneError::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    /// The topmost ancestor of `id` (itself when it has no parent).
    pub fn root(&self, id: NodeId) -> Option<NodeId> {
        let mut node = self.nodes.contains(id).then_some(id)?;
        while let Some(parent) = self.parent(node) {
            node = parent;
        }
        Some(node)
    }

    /// Whether `ancestor` lies on the parent chain of `node` (strictly above it).
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Returns the flags of a node if the identifier is live.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.nodes.get(id).map(|n| n.flags)
    }

    /// Replace a node's flags.
    ///
    /// Toggling [`NodeFlags::VISIBLE`] repaints the node; toggling
    /// [`NodeFlags::VOLATILE`] recomputes volatility up the ancestor chain.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> Result<()> {
        let changed = self.node(id)?.flags ^ flags;
        // Damage is only recorded for visible nodes, so repaint while shown.
        let toggled = changed.contains(NodeFlags::VISIBLE);
        if toggled && !flags.contains(NodeFlags::VISIBLE) {
            self.damage_node(id);
        }
        self.node_mut(id)?.flags = flags;
        if changed.contains(NodeFlags::VOLATILE) {
            self.update_volatility_upward(id);
        }
        if toggled && flags.contains(NodeFlags::VISIBLE) {
            self.damage_node(id);
        }
        Ok(())
    }

    /// Show or hide a node.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        let mut flags = self.node(id)?.flags;
        flags.set(NodeFlags::VISIBLE, visible);
        self.set_flags(id, flags)
    }

    /// The node's fade capability, if any.
    pub fn fade(&self, id: NodeId) -> Option<Fade> {
        self.nodes.get(id).and_then(|n| n.fade)
    }

    /// Add, replace, or remove the fade capability and repaint.
    pub fn set_fade(&mut self, id: NodeId, fade: Option<Fade>) -> Result<()> {
        self.node_mut(id)?.fade = fade;
        self.damage_node(id);
        Ok(())
    }

    /// The node's decorator kind, if it is a decorator.
    pub fn decorator(&self, id: NodeId) -> Option<Decorator> {
        self.nodes.get(id).and_then(|n| n.decorator)
    }

    /// Get the next node in depth-first traversal order.
    ///
    /// Returns `None` if no next node exists or if the current node is stale.
    /// This is a standard tree traversal that does not wrap around.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if let Some(&first) = self.nodes.get(current)?.children.first() {
            return Some(first);
        }
        let mut node = current;
        while let Some(parent) = self.parent(node) {
            if let Some(next) = self.sibling(node, 1) {
                return Some(next);
            }
            node = parent;
        }
        None
    }

    /// Get the previous node in reverse depth-first traversal order.
    ///
    /// Returns `None` if no previous node exists or if the current node is stale.
    pub fn prev_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if !self.is_alive(current) {
            return None;
        }
        let Some(mut node) = self.sibling(current, -1) else {
            return self.parent(current);
        };
        while let Some(&last) = self.children(node).last() {
            node = last;
        }
        Some(node)
    }

    fn sibling(&self, node: NodeId, offset: isize) -> Option<NodeId> {
        let siblings = self.children(self.parent(node)?);
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos.checked_add_signed(offset)?).copied()
    }

    /// Pre-order iterator over `id` and all its descendants.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.is_alive(id) {
            alloc::vec![id]
        } else {
            Vec::new()
        };
        Descendants { scene: self, stack }
    }

    /// Register a callback for events about `node`.
    pub fn add_node_listener(
        &mut self,
        node: NodeId,
        callback: impl FnMut(&SceneEvent) + 'static,
    ) -> Result<ListenerId> {
        self.node(node)?;
        Ok(self.listeners.add_node(node, alloc::boxed::Box::new(callback)))
    }

    /// Register a callback for events about `camera`.
    pub fn add_camera_listener(
        &mut self,
        camera: CameraId,
        callback: impl FnMut(&SceneEvent) + 'static,
    ) -> Result<ListenerId> {
        self.camera(camera)?;
        Ok(self
            .listeners
            .add_camera(camera, alloc::boxed::Box::new(callback)))
    }

    /// Unregister a listener. Returns whether it was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// Iterator returned by [`Scene::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    scene: &'a Scene,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.scene.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::block;

    #[test]
    fn insert_and_navigate() {
        let mut scene = Scene::new();
        let root = scene.insert(None, NodeProps::default()).unwrap();
        let a = scene.insert(Some(root), NodeProps::default()).unwrap();
        let a1 = scene.insert(Some(a), NodeProps::default()).unwrap();
        let b = scene.insert(Some(root), NodeProps::default()).unwrap();

        assert_eq!(scene.children(root), &[a, b]);
        assert_eq!(scene.root(a1), Some(root));
        assert!(scene.is_ancestor(root, a1));
        assert!(!scene.is_ancestor(a1, root));

        let order: Vec<_> = scene.descendants(root).collect();
        assert_eq!(order, alloc::vec![root, a, a1, b]);
        assert_eq!(scene.next_depth_first(a1), Some(b));
        assert_eq!(scene.prev_depth_first(b), Some(a1));
        assert_eq!(scene.prev_depth_first(a), Some(root));
        assert_eq!(scene.next_depth_first(b), None);
    }

    #[test]
    fn destroy_frees_subtree_and_unregisters_layers() {
        let mut scene = Scene::new();
        let root = scene.insert(None, NodeProps::default()).unwrap();
        let layer = scene.insert(Some(root), NodeProps::default()).unwrap();
        let leaf = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let visual = scene.insert_visual(block(0.0, 0.0, 10.0, 10.0));
        scene.set_content(leaf, Some(Content::Visual(visual))).unwrap();
        let camera = scene.create_camera(Rect::new(0.0, 0.0, 100.0, 100.0));
        scene.add_layer(camera, layer).unwrap();

        scene.destroy(layer).unwrap();
        assert!(!scene.is_alive(layer));
        assert!(!scene.is_alive(leaf));
        assert!(scene.children(root).is_empty());
        assert!(scene.layers(camera).is_empty());
        assert!(scene.visual(visual).is_some(), "visuals outlive their owners");
        assert_eq!(scene.bounds(root), None);

        let reused = scene.insert(None, NodeProps::default()).unwrap();
        assert!(scene.is_alive(reused));
        assert_eq!(scene.destroy(leaf), Err(SceneError::StaleNode(leaf)));
    }

    #[test]
    fn insert_under_full_decorator_leaves_no_orphan() {
        let mut scene = Scene::new();
        let deco = scene.insert(None, NodeProps::decorator()).unwrap();
        scene.insert(Some(deco), NodeProps::default()).unwrap();
        let err = scene.insert(Some(deco), NodeProps::default()).unwrap_err();
        assert_eq!(err, SceneError::TooManyChildren(deco));
        assert_eq!(scene.child_count(deco), 1);
        assert_eq!(scene.nodes.len(), 2);
    }

    #[test]
    fn listeners_receive_structure_events() {
        use alloc::rc::Rc;
        use core::cell::RefCell;

        let mut scene = Scene::new();
        let root = scene.insert(None, NodeProps::default()).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let listener = scene
            .add_node_listener(root, move |e| sink.borrow_mut().push(*e))
            .unwrap();
        let child = scene.insert(Some(root), NodeProps::default()).unwrap();
        scene.remove_child(root, child).unwrap();
        assert_eq!(
            *log.borrow(),
            alloc::vec![
                SceneEvent::ChildAdded {
                    parent: root,
                    child
                },
                SceneEvent::ChildRemoved {
                    parent: root,
                    child
                },
            ]
        );
        assert!(scene.remove_listener(listener));
        scene.add_child(root, child).unwrap();
        assert_eq!(log.borrow().len(), 2);
    }
}
