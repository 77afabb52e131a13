// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child management, z-order, decorators, and selection.

use alloc::vec::Vec;

use super::Scene;
use crate::error::{Result, SceneError};
use crate::events::SceneEvent;
use crate::find::SelectedFilter;
use crate::types::{Decorator, NodeId, NodeProps};

impl Scene {
    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let p = self.node(parent)?;
        self.node(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if p.decorator.is_some() && p.children.iter().any(|c| *c != child) {
            return Err(SceneError::TooManyChildren(parent));
        }
        Ok(())
    }

    /// Append `child` as the topmost child of `parent`.
    ///
    /// A child that already has a parent is removed from it first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let len = self.node(parent)?.children.len();
        let already = usize::from(self.parent(child) == Some(parent));
        self.insert_child(parent, len - already, child)
    }

    /// Insert `child` at `index` in the children of `parent` (0 is bottom).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.check_attach(parent, child)?;
        let old_parent = self.node(child)?.parent;
        let len = self.node(parent)?.children.len() - usize::from(old_parent == Some(parent));
        if index > len {
            return Err(SceneError::IndexOutOfRange { index, len });
        }
        if let Some(old) = old_parent {
            self.remove_child(old, child)?;
        }
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.update_volatility_upward(parent);
        self.update_bounds_upward(parent);
        self.damage_node(child);
        self.listeners
            .emit_node(parent, &SceneEvent::ChildAdded { parent, child });
        log::trace!("attached {child:?} to {parent:?} at {index}");
        Ok(())
    }

    /// Detach `child` from `parent`, repainting the area it covered.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let pos = self
            .node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(SceneError::NotAChild { parent, child })?;
        self.damage_node(child);
        self.node_mut(parent)?.children.remove(pos);
        self.node_mut(child)?.parent = None;
        self.update_volatility_upward(parent);
        self.update_bounds_upward(parent);
        self.listeners
            .emit_node(parent, &SceneEvent::ChildRemoved { parent, child });
        log::trace!("detached {child:?} from {parent:?}");
        Ok(())
    }

    /// Detach and return the child at `index`.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId> {
        let child = self.child_at(parent, index)?;
        self.remove_child(parent, child)?;
        Ok(child)
    }

    /// Detach `child` from whatever parent it has; a no-op for roots.
    pub fn remove_from_parent(&mut self, child: NodeId) -> Result<()> {
        match self.node(child)?.parent {
            Some(parent) => self.remove_child(parent, child),
            None => Ok(()),
        }
    }

    /// Move `id` to the top of its siblings.
    pub fn raise(&mut self, id: NodeId) -> Result<()> {
        self.splice(id, None, |siblings, _| siblings.len())
    }

    /// Move `id` to the bottom of its siblings.
    pub fn lower(&mut self, id: NodeId) -> Result<()> {
        self.splice(id, None, |_, _| 0)
    }

    /// Move `id` immediately above `reference`.
    pub fn raise_to(&mut self, id: NodeId, reference: NodeId) -> Result<()> {
        self.splice(id, Some(reference), |_, r| r + 1)
    }

    /// Move `id` immediately below `reference`.
    pub fn lower_to(&mut self, id: NodeId, reference: NodeId) -> Result<()> {
        self.splice(id, Some(reference), |_, r| r)
    }

    /// Remove `id` from its sibling list and reinsert it at the index chosen
    /// by `place`, given the remaining siblings and the position of
    /// `reference` among them.
    fn splice(
        &mut self,
        id: NodeId,
        reference: Option<NodeId>,
        place: impl FnOnce(&[NodeId], usize) -> usize,
    ) -> Result<()> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        if let Some(r) = reference {
            self.node(r)?;
            if self.parent(r) != Some(parent) {
                return Err(SceneError::NotASibling {
                    node: id,
                    reference: r,
                });
            }
            if r == id {
                return Ok(());
            }
        }
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|c| *c != id);
        let r = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(0);
        let index = place(siblings, r).min(siblings.len());
        siblings.insert(index, id);
        self.damage_node(id);
        Ok(())
    }

    /// Put `decorator` where `node` sits in its parent and make `node` its
    /// only child.
    pub fn insert_above(&mut self, decorator: NodeId, node: NodeId) -> Result<()> {
        let d = self.node(decorator)?;
        self.node(node)?;
        if decorator == node || self.is_ancestor(node, decorator) {
            return Err(SceneError::Cycle {
                parent: decorator,
                child: node,
            });
        }
        if d.decorator.is_some() && !d.children.is_empty() {
            return Err(SceneError::TooManyChildren(decorator));
        }
        self.remove_from_parent(decorator)?;
        if let Some(parent) = self.parent(node) {
            let index = self.children(parent).iter().position(|c| *c == node).unwrap_or(0);
            self.remove_child(parent, node)?;
            self.insert_child(parent, index, decorator)?;
        }
        self.add_child(decorator, node)
    }

    /// Splice the decorator's child into the decorator's position and destroy
    /// the decorator.
    pub fn remove_decorator(&mut self, decorator: NodeId) -> Result<()> {
        let d = self.node(decorator)?;
        let children = d.children.clone();
        let parent = d.parent;
        match parent {
            Some(parent) => {
                let index = self
                    .children(parent)
                    .iter()
                    .position(|c| *c == decorator)
                    .unwrap_or(0);
                self.remove_child(parent, decorator)?;
                for (offset, child) in children.into_iter().enumerate() {
                    self.insert_child(parent, index + offset, child)?;
                }
            }
            None => {
                for child in children {
                    self.remove_child(decorator, child)?;
                }
            }
        }
        self.destroy(decorator)
    }

    /// Wrap `node` in a selection decorator, returning the decorator.
    ///
    /// Selecting an already selected node returns its existing decorator.
    pub fn select(&mut self, node: NodeId) -> Result<NodeId> {
        self.node(node)?;
        if let Some(parent) = self.parent(node)
            && self.is_selected(node)
        {
            return Ok(parent);
        }
        let decorator = self.insert(
            None,
            NodeProps {
                decorator: Some(Decorator::selection()),
                ..NodeProps::default()
            },
        )?;
        self.insert_above(decorator, node)?;
        self.repaint(decorator)?;
        Ok(decorator)
    }

    /// Remove the selection decorator around `node`, if any.
    pub fn unselect(&mut self, node: NodeId) -> Result<()> {
        self.node(node)?;
        match self.parent(node) {
            Some(parent) if self.is_selected(node) => self.remove_decorator(parent),
            _ => Ok(()),
        }
    }

    /// Whether `node` is wrapped in a selection decorator.
    pub fn is_selected(&self, node: NodeId) -> bool {
        self.parent(node)
            .and_then(|p| self.decorator(p))
            .is_some_and(|d| matches!(d, Decorator::Selection { .. }))
    }

    /// Every selected node under `root`, in depth-first order.
    pub fn selected_nodes(&mut self, root: NodeId) -> Result<Vec<NodeId>> {
        self.find_nodes(root, &mut SelectedFilter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{block, surface_scene};
    use crate::visual::Content;
    use kurbo::{Affine, Rect};

    fn family(scene: &mut Scene, n: usize) -> (NodeId, Vec<NodeId>) {
        let root = scene.insert(None, NodeProps::default()).unwrap();
        let kids = (0..n)
            .map(|_| scene.insert(Some(root), NodeProps::default()).unwrap())
            .collect();
        (root, kids)
    }

    #[test]
    fn reorder_results() {
        let mut scene = Scene::new();
        let (root, k) = family(&mut scene, 4);
        let (a, b, c, d) = (k[0], k[1], k[2], k[3]);

        scene.raise(a).unwrap();
        assert_eq!(scene.children(root), &[b, c, d, a]);
        scene.lower(a).unwrap();
        assert_eq!(scene.children(root), &[a, b, c, d]);
        scene.raise_to(a, c).unwrap();
        assert_eq!(scene.children(root), &[b, c, a, d]);
        scene.lower_to(d, b).unwrap();
        assert_eq!(scene.children(root), &[d, b, c, a]);
        scene.raise_to(a, d).unwrap();
        assert_eq!(scene.children(root), &[d, a, b, c]);

        let stranger = scene.insert(None, NodeProps::default()).unwrap();
        assert_eq!(
            scene.raise_to(a, stranger),
            Err(SceneError::NotASibling {
                node: a,
                reference: stranger
            })
        );
    }

    #[test]
    fn add_child_reparents_implicitly() {
        let mut scene = Scene::new();
        let (left, kids) = family(&mut scene, 2);
        let right = scene.insert(None, NodeProps::default()).unwrap();
        scene.add_child(right, kids[0]).unwrap();
        assert_eq!(scene.children(left), &[kids[1]]);
        assert_eq!(scene.children(right), &[kids[0]]);
        assert_eq!(scene.parent(kids[0]), Some(right));

        // Re-adding an existing child moves it to the top.
        scene.add_child(left, kids[0]).unwrap();
        scene.add_child(left, kids[1]).unwrap();
        assert_eq!(scene.children(left), &[kids[0], kids[1]]);
    }

    #[test]
    fn structural_errors() {
        let mut scene = Scene::new();
        let (root, kids) = family(&mut scene, 1);
        assert_eq!(
            scene.add_child(kids[0], root),
            Err(SceneError::Cycle {
                parent: kids[0],
                child: root
            })
        );
        assert_eq!(
            scene.add_child(root, root),
            Err(SceneError::Cycle {
                parent: root,
                child: root
            })
        );
        let loose = scene.insert(None, NodeProps::default()).unwrap();
        assert_eq!(
            scene.insert_child(root, 3, loose),
            Err(SceneError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(
            scene.remove_child(root, loose),
            Err(SceneError::NotAChild {
                parent: root,
                child: loose
            })
        );
        assert_eq!(
            scene.remove_child_at(root, 5),
            Err(SceneError::IndexOutOfRange { index: 5, len: 1 })
        );
        scene.insert_child(root, 0, loose).unwrap();
        assert_eq!(scene.children(root), &[loose, kids[0]]);
    }

    #[test]
    fn decorator_holds_one_child() {
        let mut scene = Scene::new();
        let deco = scene.insert(None, NodeProps::decorator()).unwrap();
        let a = scene.insert(None, NodeProps::default()).unwrap();
        let b = scene.insert(None, NodeProps::default()).unwrap();
        scene.add_child(deco, a).unwrap();
        assert_eq!(scene.add_child(deco, b), Err(SceneError::TooManyChildren(deco)));
        assert_eq!(scene.children(deco), &[a]);
        // Re-adding the same child is allowed.
        scene.add_child(deco, a).unwrap();
        assert_eq!(scene.child_count(deco), 1);
    }

    #[test]
    fn remove_repaints_prior_bounds() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 200.0, 200.0));
        let group = scene
            .insert(Some(layer), NodeProps::transformed(Affine::translate((50.0, 20.0))))
            .unwrap();
        let leaf = scene.insert(Some(group), NodeProps::default()).unwrap();
        let v = scene.insert_visual(block(0.0, 0.0, 10.0, 10.0));
        scene.set_content(leaf, Some(Content::Visual(v))).unwrap();
        scene.take_damage(surface).unwrap();

        scene.remove_child(group, leaf).unwrap();
        let damage = scene.take_damage(surface).unwrap();
        assert_eq!(damage.dirty_rects, alloc::vec![Rect::new(50.0, 20.0, 60.0, 30.0)]);
        assert_eq!(scene.bounds(group), None);
    }

    #[test]
    fn insert_above_and_remove_decorator_keep_position() {
        let mut scene = Scene::new();
        let (root, k) = family(&mut scene, 3);
        let deco = scene.insert(None, NodeProps::decorator()).unwrap();
        scene.insert_above(deco, k[1]).unwrap();
        assert_eq!(scene.children(root), &[k[0], deco, k[2]]);
        assert_eq!(scene.children(deco), &[k[1]]);

        scene.remove_decorator(deco).unwrap();
        assert_eq!(scene.children(root), &[k[0], k[1], k[2]]);
        assert!(!scene.is_alive(deco));
    }

    #[test]
    fn selection_round_trip() {
        let mut scene = Scene::new();
        let (root, k) = family(&mut scene, 2);
        let deco = scene.select(k[0]).unwrap();
        assert_eq!(scene.select(k[0]).unwrap(), deco, "idempotent");
        assert!(scene.is_selected(k[0]));
        assert!(!scene.is_selected(k[1]));
        assert_eq!(scene.selected_nodes(root).unwrap(), alloc::vec![k[0]]);

        scene.unselect(k[0]).unwrap();
        assert!(!scene.is_selected(k[0]));
        assert_eq!(scene.children(root), &[k[0], k[1]]);
        assert!(scene.selected_nodes(root).unwrap().is_empty());
    }

    #[test]
    fn selection_outline_is_inside_bounds_and_damage() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let leaf = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let v = scene.insert_visual(block(2.0, 2.0, 8.0, 8.0));
        scene.set_content(leaf, Some(Content::Visual(v))).unwrap();
        scene.take_damage(surface).unwrap();
        let stroke = Rect::new(1.5, 1.5, 8.5, 8.5);

        let deco = scene.select(leaf).unwrap();
        assert_eq!(scene.bounds(deco), Some(stroke));
        assert_eq!(scene.local_bounds(deco), Some(Rect::new(2.0, 2.0, 8.0, 8.0)));
        assert_eq!(scene.bounds(layer), Some(stroke));
        let damage = scene.take_damage(surface).unwrap();
        assert!(damage.union_rect().is_some_and(|r| r.union(stroke) == r));

        scene.unselect(leaf).unwrap();
        let damage = scene.take_damage(surface).unwrap();
        assert!(damage.union_rect().is_some_and(|r| r.union(stroke) == r));
        assert_eq!(scene.bounds(layer), Some(Rect::new(2.0, 2.0, 8.0, 8.0)));
    }
}
