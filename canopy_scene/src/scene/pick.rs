// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Front-to-back picking and filtered search.

use alloc::vec::Vec;

use kurbo::Rect;

use super::Scene;
use crate::error::Result;
use crate::find::FindFilter;
use crate::path::{PickTarget, ScenePath};
use crate::types::{CameraId, NodeFlags, NodeId};
use crate::util::{intersects, transform_rect_bbox};
use crate::visual::Content;

impl Scene {
    /// Pick the topmost thing under `rect`, given in the camera's own
    /// coordinates (surface coordinates for a camera bound to a surface).
    pub fn pick(&mut self, camera: CameraId, rect: Rect) -> Option<ScenePath> {
        let mut path = ScenePath::new();
        self.pick_camera(camera, rect, &mut path).then_some(path)
    }

    /// Pick through `camera`, extending `path`.
    ///
    /// Returns false when `rect` misses the viewport. Otherwise layers are
    /// searched topmost first, and the camera itself is the hit when no layer
    /// content is.
    pub fn pick_camera(&mut self, camera: CameraId, rect: Rect, path: &mut ScenePath) -> bool {
        if path.contains_camera(camera) {
            log::debug!("{camera:?} is already on the pick path; skipped");
            return false;
        }
        let Some(c) = self.cameras.get_mut(camera) else {
            return false;
        };
        if !intersects(c.viewport, rect) {
            return false;
        }
        let Some(inverse) = c.view.inverse() else {
            return false;
        };
        let view = c.view.affine();
        let layers = c.layers.clone();
        path.push_camera(camera, view);
        let local = transform_rect_bbox(inverse, rect);
        for &layer in layers.iter().rev() {
            if self.pick_node(layer, local, path) {
                return true;
            }
        }
        path.set_target(PickTarget::Camera(camera));
        true
    }

    /// `rect` is in the parent space of `id`.
    fn pick_node(&mut self, id: NodeId, rect: Rect, path: &mut ScenePath) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.flags.contains(NodeFlags::VISIBLE) {
            return false;
        }
        if let Some(fade) = node.fade
            && (fade.alpha <= 0.0 || !fade.shows_at(path.magnification()))
        {
            return false;
        }
        let flags = node.flags;
        if !self.fresh_bounds(id).is_some_and(|b| intersects(b, rect)) {
            return false;
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let (back, front) = (node.back, node.front);
        let children = node.children.clone();

        path.push_node(id);
        let (local, pushed) = match node.transform.as_mut() {
            Some(state) => match state.inverse() {
                Some(inverse) => {
                    path.push_transform(state.affine());
                    (transform_rect_bbox(inverse, rect), true)
                }
                None => {
                    log::warn!("not picking {id:?}: non-invertible transform");
                    path.pop_node();
                    return false;
                }
            },
            None => (rect, false),
        };

        let pickable = flags.contains(NodeFlags::PICKABLE);
        if pickable
            && let Some(front) = front
            && self.pick_content(id, front, local, path)
        {
            return true;
        }
        if flags.contains(NodeFlags::CHILDREN_PICKABLE) {
            for &child in children.iter().rev() {
                if self.pick_node(child, local, path) {
                    return true;
                }
            }
        } else if !children.is_empty() {
            let mut probe = path.clone();
            if children
                .iter()
                .rev()
                .any(|&child| self.pick_node(child, local, &mut probe))
            {
                path.set_target(PickTarget::Node(id));
                return true;
            }
        }
        if pickable
            && let Some(back) = back
            && self.pick_content(id, back, local, path)
        {
            return true;
        }

        if pushed {
            path.pop_transform();
        }
        path.pop_node();
        false
    }

    fn pick_content(
        &mut self,
        owner: NodeId,
        content: Content,
        rect: Rect,
        path: &mut ScenePath,
    ) -> bool {
        match content {
            Content::Visual(visual) => {
                let hit = self
                    .visuals
                    .get(visual)
                    .is_some_and(|slot| slot.visual.pick(rect, path));
                if hit {
                    path.set_target(PickTarget::Visual {
                        node: owner,
                        visual,
                    });
                }
                hit
            }
            Content::Camera(camera) => self.pick_camera(camera, rect, path),
        }
    }

    /// Depth-first search of `root`'s subtree.
    ///
    /// Nodes are reported in pre-order. A node without
    /// [`NodeFlags::FINDABLE`] is never reported itself; when
    /// [`NodeFlags::CHILDREN_FINDABLE`] is clear, the node stands in for any
    /// descendant that would have been accepted.
    pub fn find_nodes(
        &mut self,
        root: NodeId,
        filter: &mut dyn FindFilter,
    ) -> Result<Vec<NodeId>> {
        self.node(root)?;
        self.refresh_volatile(root);
        let mut found = Vec::new();
        self.find_in(root, filter, &mut found);
        Ok(found)
    }

    /// [`find_nodes`](Self::find_nodes) over every layer of `camera`, without
    /// duplicates.
    pub fn find_in_camera(
        &mut self,
        camera: CameraId,
        filter: &mut dyn FindFilter,
    ) -> Result<Vec<NodeId>> {
        let layers = self.camera(camera)?.layers.clone();
        let mut found = Vec::new();
        for layer in layers {
            for node in self.find_nodes(layer, filter)? {
                if !found.contains(&node) {
                    found.push(node);
                }
            }
        }
        Ok(found)
    }

    fn refresh_volatile(&mut self, root: NodeId) {
        if self.is_volatile(root) {
            self.compute_bounds(root);
        }
    }

    fn find_in(&self, id: NodeId, filter: &mut dyn FindFilter, found: &mut Vec<NodeId>) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let mut any = false;
        if node.flags.contains(NodeFlags::FINDABLE) && filter.accept(self, id) {
            found.push(id);
            any = true;
        }
        if !filter.descend(self, id) {
            return any;
        }
        if node.flags.contains(NodeFlags::CHILDREN_FINDABLE) {
            for &child in &node.children {
                any |= self.find_in(child, filter, found);
            }
        } else {
            let mut scratch = Vec::new();
            let hidden = node
                .children
                .iter()
                .any(|&child| self.find_in(child, filter, &mut scratch));
            if hidden && !any {
                found.push(id);
                any = true;
            }
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::find::{BoundsFilter, FnFilter};
    use crate::test_support::{Ring, block, surface_scene};
    use crate::types::{Fade, NodeProps};
    use kurbo::{Affine, Point};

    fn leaf(scene: &mut Scene, parent: NodeId, rect: Rect) -> (NodeId, crate::VisualId) {
        let node = scene.insert(Some(parent), NodeProps::default()).unwrap();
        let v = scene.insert_visual(block(rect.x0, rect.y0, rect.x1, rect.y1));
        scene.set_content(node, Some(Content::Visual(v))).unwrap();
        (node, v)
    }

    #[test]
    fn topmost_child_wins() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let (a, _) = leaf(&mut scene, layer, Rect::new(0.0, 0.0, 20.0, 20.0));
        let (b, vb) = leaf(&mut scene, layer, Rect::new(10.0, 10.0, 30.0, 30.0));

        let path = scene.pick_surface(surface, Point::new(15.0, 15.0), 0.5).unwrap().unwrap();
        assert_eq!(path.target(), Some(PickTarget::Visual { node: b, visual: vb }));
        assert_eq!(path.nodes(), &[layer, b]);

        scene.raise(a).unwrap();
        let path = scene.pick_surface(surface, Point::new(15.0, 15.0), 0.5).unwrap().unwrap();
        assert_eq!(path.node(), Some(a));
    }

    #[test]
    fn miss_reports_camera_and_outside_reports_nothing() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        leaf(&mut scene, layer, Rect::new(0.0, 0.0, 10.0, 10.0));
        let camera = scene.surface_camera(surface).unwrap();

        let path = scene.pick_surface(surface, Point::new(50.0, 50.0), 0.0).unwrap().unwrap();
        assert_eq!(path.target(), Some(PickTarget::Camera(camera)));
        assert!(path.nodes().is_empty(), "failed branches are popped");
        assert!(scene.pick(camera, Rect::new(200.0, 200.0, 201.0, 201.0)).is_none());
    }

    #[test]
    fn path_maps_back_to_local() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let camera = scene.surface_camera(surface).unwrap();
        scene.set_view_transform(camera, Affine::scale(2.0)).unwrap();
        let group = scene
            .insert(Some(layer), NodeProps::transformed(Affine::translate((10.0, 10.0))))
            .unwrap();
        let (node, _) = leaf(&mut scene, group, Rect::new(0.0, 0.0, 10.0, 10.0));

        let path = scene.pick_surface(surface, Point::new(30.0, 30.0), 0.0).unwrap().unwrap();
        assert_eq!(path.node(), Some(node));
        assert_eq!(path.to_local(Point::new(30.0, 30.0)), Some(Point::new(5.0, 5.0)));
        assert_eq!(path.magnification(), 2.0);
    }

    #[test]
    fn children_unpickable_reports_group() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let group = scene
            .insert(
                Some(layer),
                NodeProps {
                    flags: NodeFlags::default() - NodeFlags::CHILDREN_PICKABLE,
                    ..NodeProps::default()
                },
            )
            .unwrap();
        leaf(&mut scene, group, Rect::new(0.0, 0.0, 10.0, 10.0));
        let path = scene.pick_surface(surface, Point::new(5.0, 5.0), 0.0).unwrap().unwrap();
        assert_eq!(path.target(), Some(PickTarget::Node(group)));
        assert_eq!(path.nodes(), &[layer, group]);
    }

    #[test]
    fn precise_visual_and_invisible_and_faded() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let camera = scene.surface_camera(surface).unwrap();
        let ring = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let rv = scene.insert_visual(Ring {
            center: Point::new(50.0, 50.0),
            radius: 20.0,
        });
        scene.set_content(ring, Some(Content::Visual(rv))).unwrap();

        // Bounds corner, outside the circle.
        let corner = scene.pick_surface(surface, Point::new(32.0, 32.0), 0.5).unwrap().unwrap();
        assert_eq!(corner.target(), Some(PickTarget::Camera(camera)));
        let center = scene.pick_surface(surface, Point::new(50.0, 50.0), 0.5).unwrap().unwrap();
        assert_eq!(center.node(), Some(ring));

        scene
            .set_fade(ring, Some(Fade { alpha: 1.0, min_magnification: 3.0, max_magnification: 10.0 }))
            .unwrap();
        let faded = scene.pick_surface(surface, Point::new(50.0, 50.0), 0.5).unwrap().unwrap();
        assert_eq!(faded.target(), Some(PickTarget::Camera(camera)));

        scene.set_fade(ring, None).unwrap();
        scene.set_visible(ring, false).unwrap();
        let hidden = scene.pick_surface(surface, Point::new(50.0, 50.0), 0.5).unwrap().unwrap();
        assert_eq!(hidden.target(), Some(PickTarget::Camera(camera)));
    }

    #[test]
    fn pick_through_portal_extends_path() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let top = scene.surface_camera(surface).unwrap();
        let world = scene.insert(None, NodeProps::default()).unwrap();
        let (inner, _) = leaf(&mut scene, world, Rect::new(0.0, 0.0, 5.0, 5.0));
        let portal = scene.create_camera(Rect::new(0.0, 0.0, 20.0, 20.0));
        scene.add_layer(portal, world).unwrap();
        scene.add_layer(portal, layer).unwrap();
        let frame = scene
            .insert(Some(layer), NodeProps::transformed(Affine::translate((40.0, 40.0))))
            .unwrap();
        scene.set_content(frame, Some(Content::Camera(portal))).unwrap();

        let path = scene.pick_surface(surface, Point::new(42.0, 42.0), 0.0).unwrap().unwrap();
        assert_eq!(path.node(), Some(inner));
        assert_eq!(path.nodes(), &[layer, frame, world, inner]);
        assert_eq!(path.cameras().collect::<Vec<_>>(), alloc::vec![top, portal]);
        assert_eq!(path.to_local(Point::new(42.0, 42.0)), Some(Point::new(2.0, 2.0)));

        // Inside the portal frame but on nothing: the portal camera is hit.
        let path = scene.pick_surface(surface, Point::new(55.0, 55.0), 0.0).unwrap().unwrap();
        assert_eq!(path.target(), Some(PickTarget::Camera(portal)));
    }

    #[test]
    fn find_respects_flags_and_filters() {
        let mut scene = Scene::new();
        let root = scene.insert(None, NodeProps::default()).unwrap();
        let (a, _) = leaf(&mut scene, root, Rect::new(0.0, 0.0, 10.0, 10.0));
        let closed = scene
            .insert(
                Some(root),
                NodeProps {
                    flags: NodeFlags::default() - NodeFlags::CHILDREN_FINDABLE,
                    ..NodeProps::default()
                },
            )
            .unwrap();
        let (hidden, _) = leaf(&mut scene, closed, Rect::new(50.0, 50.0, 60.0, 60.0));
        let (far, _) = leaf(&mut scene, root, Rect::new(200.0, 200.0, 210.0, 210.0));

        let everything = scene.find_nodes(root, &mut FnFilter(|_: &Scene, _: NodeId| true)).unwrap();
        assert_eq!(everything, alloc::vec![root, a, closed, far]);

        let mut only_hidden = FnFilter(move |_: &Scene, n: NodeId| n == hidden);
        assert_eq!(scene.find_nodes(root, &mut only_hidden).unwrap(), alloc::vec![closed]);

        let mut near = BoundsFilter::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(scene.find_nodes(root, &mut near).unwrap(), alloc::vec![root, a, closed]);
        let _ = far;
    }

    #[test]
    fn transparent_node_lets_picks_through() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let (below, _) = leaf(&mut scene, layer, Rect::new(0.0, 0.0, 10.0, 10.0));
        let (above, _) = leaf(&mut scene, layer, Rect::new(0.0, 0.0, 10.0, 10.0));
        scene.set_fade(above, Some(Fade::alpha(0.0))).unwrap();

        let path = scene.pick_surface(surface, Point::new(5.0, 5.0), 0.0).unwrap().unwrap();
        assert_eq!(path.node(), Some(below));
        assert_eq!(path.nodes(), &[layer, below]);
    }

    #[test]
    fn singular_sibling_is_skipped() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let (good, _) = leaf(&mut scene, layer, Rect::new(0.0, 0.0, 10.0, 10.0));
        let collapsed = scene
            .insert(
                Some(layer),
                NodeProps::transformed(Affine::new([1.0, 1.0, 1.0, 1.0, 0.0, 0.0])),
            )
            .unwrap();
        let v = scene.insert_visual(block(0.0, 0.0, 10.0, 10.0));
        scene.set_content(collapsed, Some(Content::Visual(v))).unwrap();
        assert_eq!(scene.bounds(collapsed), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));

        let path = scene.pick_surface(surface, Point::new(5.0, 5.0), 0.0).unwrap().unwrap();
        assert_eq!(path.node(), Some(good));
        assert_eq!(path.nodes(), &[layer, good]);
    }
}
