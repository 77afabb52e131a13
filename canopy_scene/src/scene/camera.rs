// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cameras: layers, view transforms, camera-space conversion, sticky nodes.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};
use smallvec::SmallVec;

use super::{Camera, Scene, Sticky};
use crate::error::{Result, SceneError};
use crate::events::SceneEvent;
use crate::transform::{TransformState, concatenate};
use crate::types::{CameraId, NodeId, Rgba};
use crate::util::{checked_inverse, magnification};
use crate::visual::Content;

impl Scene {
    /// Create a camera with an identity view and the given viewport.
    pub fn create_camera(&mut self, viewport: Rect) -> CameraId {
        let id = self.cameras.insert(Camera {
            viewport,
            view: TransformState::new(Affine::IDENTITY),
            layers: Vec::new(),
            fill: None,
            surface: None,
            owners: SmallVec::new(),
            sticky: Vec::new(),
        });
        log::trace!("created {id:?} with viewport {viewport:?}");
        id
    }

    /// Destroy a camera: its layers, portal owners, sticky nodes, and surface
    /// binding are released.
    pub fn destroy_camera(&mut self, id: CameraId) -> Result<()> {
        self.repaint_camera(id);
        for owner in self.camera(id)?.owners.clone() {
            self.damage_node(owner);
        }
        let camera = self.cameras.remove(id).ok_or(SceneError::StaleCamera(id))?;
        for layer in camera.layers {
            if let Some(node) = self.nodes.get_mut(layer) {
                node.cameras.retain(|c| *c != id);
            }
        }
        let portal = Some(Content::Camera(id));
        for owner in camera.owners {
            let Some(node) = self.nodes.get_mut(owner) else {
                continue;
            };
            if node.back == portal {
                node.back = None;
            }
            if node.front == portal {
                node.front = None;
            }
            self.update_bounds_upward(owner);
            self.damage_node(owner);
        }
        for node in camera.sticky {
            if let Some(n) = self.nodes.get_mut(node) {
                n.sticky = None;
            }
        }
        if let Some(surface) = camera.surface {
            self.surfaces.remove(surface);
        }
        self.listeners.forget_camera(id);
        Ok(())
    }

    pub(crate) fn camera(&self, id: CameraId) -> Result<&Camera> {
        self.cameras.get(id).ok_or(SceneError::StaleCamera(id))
    }

    pub(crate) fn camera_mut(&mut self, id: CameraId) -> Result<&mut Camera> {
        self.cameras.get_mut(id).ok_or(SceneError::StaleCamera(id))
    }

    /// Start observing `layer`. Adding a layer twice is a no-op.
    pub fn add_layer(&mut self, camera: CameraId, layer: NodeId) -> Result<()> {
        self.node(layer)?;
        let c = self.camera_mut(camera)?;
        if c.layers.contains(&layer) {
            return Ok(());
        }
        c.layers.push(layer);
        self.node_mut(layer)?.cameras.push(camera);
        self.repaint_camera(camera);
        self.listeners
            .emit_camera(camera, &SceneEvent::LayerAdded { camera, layer });
        Ok(())
    }

    /// Stop observing `layer`. Removing an absent layer is a no-op.
    pub fn remove_layer(&mut self, camera: CameraId, layer: NodeId) -> Result<()> {
        let c = self.camera_mut(camera)?;
        let Some(pos) = c.layers.iter().position(|l| *l == layer) else {
            return Ok(());
        };
        c.layers.remove(pos);
        if let Some(node) = self.nodes.get_mut(layer) {
            node.cameras.retain(|c| *c != camera);
        }
        self.repaint_camera(camera);
        self.listeners
            .emit_camera(camera, &SceneEvent::LayerRemoved { camera, layer });
        Ok(())
    }

    /// Layers observed by the camera, in paint order.
    pub fn layers(&self, camera: CameraId) -> &[NodeId] {
        self.cameras.get(camera).map(|c| c.layers.as_slice()).unwrap_or_default()
    }

    /// Cameras observing `layer`.
    pub fn cameras_of(&self, layer: NodeId) -> &[CameraId] {
        self.nodes.get(layer).map(|n| n.cameras.as_slice()).unwrap_or_default()
    }

    /// Whether the camera is bound to a surface and observes at least one layer.
    pub fn is_live(&self, camera: CameraId) -> bool {
        self.cameras
            .get(camera)
            .is_some_and(|c| c.surface.is_some() && !c.layers.is_empty())
    }

    /// The camera's view transform (layer space to camera space).
    pub fn view_transform(&self, camera: CameraId) -> Option<Affine> {
        self.cameras.get(camera).map(|c| c.view.affine())
    }

    /// Replace the view transform and repaint the whole viewport.
    ///
    /// Sticky nodes are re-placed so they keep their camera-space position.
    pub fn set_view_transform(&mut self, camera: CameraId, view: Affine) -> Result<()> {
        let old = self.camera_mut(camera)?.view.set(view);
        let sticky = self.camera(camera)?.sticky.clone();
        for node in sticky {
            self.place_sticky(node);
        }
        self.repaint_camera(camera);
        self.listeners.emit_camera(
            camera,
            &SceneEvent::ViewTransformChanged {
                camera,
                old,
                new: view,
            },
        );
        Ok(())
    }

    /// Inverse of the view transform.
    pub fn inverse_view_transform(&mut self, camera: CameraId) -> Result<Affine> {
        self.camera_mut(camera)?
            .view
            .inverse()
            .ok_or(SceneError::NonInvertible)
    }

    /// `V = V · at`: `at` applies in layer space.
    pub fn concatenate_view(&mut self, camera: CameraId, at: Affine) -> Result<()> {
        let view = self.camera(camera)?.view.affine();
        self.set_view_transform(camera, concatenate(view, at))
    }

    /// Fit `rect` (layer coordinates) into the viewport, centered, preserving
    /// aspect ratio. Returns the new view transform.
    pub fn center_on(&mut self, camera: CameraId, rect: Rect) -> Result<Affine> {
        let viewport = self.camera(camera)?.viewport;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Err(SceneError::NonInvertible);
        }
        let s = (viewport.width() / rect.width()).min(viewport.height() / rect.height());
        let view = Affine::translate(viewport.center().to_vec2())
            * Affine::scale(s)
            * Affine::translate(-rect.center().to_vec2());
        self.set_view_transform(camera, view)?;
        Ok(view)
    }

    /// Uniform magnification of the view transform.
    pub fn magnification(&self, camera: CameraId) -> Option<f64> {
        self.view_transform(camera).map(magnification)
    }

    /// The viewport, in the coordinates of whatever displays the camera.
    pub fn viewport(&self, camera: CameraId) -> Option<Rect> {
        self.cameras.get(camera).map(|c| c.viewport)
    }

    /// Move or resize the viewport, repainting both the old and new area.
    pub fn set_viewport(&mut self, camera: CameraId, viewport: Rect) -> Result<()> {
        self.repaint_camera(camera);
        self.camera_mut(camera)?.viewport = viewport;
        let owners = self.camera(camera)?.owners.clone();
        for owner in owners {
            self.update_bounds_upward(owner);
        }
        self.repaint_camera(camera);
        Ok(())
    }

    /// Background fill painted before the layers.
    pub fn set_fill(&mut self, camera: CameraId, fill: Option<Rgba>) -> Result<()> {
        self.camera_mut(camera)?.fill = fill;
        self.repaint_camera(camera);
        Ok(())
    }

    /// Transform from `node`'s local space to camera space.
    pub fn local_to_camera(&self, camera: CameraId, node: NodeId) -> Result<Affine> {
        let c = self.camera(camera)?;
        let mut current = node;
        let mut acc = self.node(node)?.affine();
        loop {
            if c.layers.contains(&current) {
                return Ok(c.view.affine() * acc);
            }
            let Some(parent) = self.parent(current) else {
                return Err(SceneError::NotReachable { camera, node });
            };
            acc = self.node(parent)?.affine() * acc;
            current = parent;
        }
    }

    /// Transform from camera space to `node`'s local space.
    pub fn camera_to_local(&self, camera: CameraId, node: NodeId) -> Result<Affine> {
        let forward = self.local_to_camera(camera, node)?;
        checked_inverse(forward).ok_or_else(|| {
            log::warn!("camera_to_local: singular chain from {camera:?} to {node:?}");
            SceneError::NonInvertible
        })
    }

    /// Map a local point into camera space.
    pub fn local_to_camera_point(&self, camera: CameraId, node: NodeId, point: Point) -> Result<Point> {
        Ok(self.local_to_camera(camera, node)? * point)
    }

    /// Map a camera-space point into `node`'s local space.
    pub fn camera_to_local_point(&self, camera: CameraId, node: NodeId, point: Point) -> Result<Point> {
        Ok(self.camera_to_local(camera, node)? * point)
    }

    /// Keep `node` at its current camera-space placement whenever the view
    /// transform changes.
    pub fn stick_to_camera(&mut self, node: NodeId, camera: CameraId) -> Result<()> {
        let placement = self.local_to_camera(camera, node)?;
        self.unstick(node)?;
        self.node_mut(node)?.sticky = Some(Sticky { camera, placement });
        self.camera_mut(camera)?.sticky.push(node);
        Ok(())
    }

    /// Release a node stuck with [`stick_to_camera`](Self::stick_to_camera).
    pub fn unstick(&mut self, node: NodeId) -> Result<()> {
        if let Some(sticky) = self.node_mut(node)?.sticky.take()
            && let Some(c) = self.cameras.get_mut(sticky.camera)
        {
            c.sticky.retain(|n| *n != node);
        }
        Ok(())
    }

    /// Whether the node is stuck to a camera.
    pub fn is_sticky(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.sticky.is_some())
    }

    fn place_sticky(&mut self, node: NodeId) {
        let Some(sticky) = self.nodes.get(node).and_then(|n| n.sticky) else {
            return;
        };
        // Camera transform of the space the node's own transform maps into.
        let above = match self.parent(node) {
            Some(parent) if !self.layers(sticky.camera).contains(&node) => {
                self.local_to_camera(sticky.camera, parent)
            }
            _ => self.view_transform(sticky.camera).ok_or(SceneError::StaleCamera(sticky.camera)),
        };
        let Ok(above) = above else {
            log::debug!("sticky {node:?} is no longer under {:?}", sticky.camera);
            return;
        };
        let Some(inverse) = checked_inverse(above) else {
            log::warn!("cannot keep {node:?} sticky: singular camera transform");
            return;
        };
        if let Err(err) = self.set_transform(node, inverse * sticky.placement) {
            log::debug!("sticky {node:?}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeProps;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    #[test]
    fn layers_are_bidirectional_and_deduplicated() {
        let mut scene = Scene::new();
        let layer = scene.insert(None, NodeProps::default()).unwrap();
        let camera = scene.create_camera(Rect::new(0.0, 0.0, 10.0, 10.0));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        scene
            .add_camera_listener(camera, move |e| sink.borrow_mut().push(*e))
            .unwrap();

        scene.add_layer(camera, layer).unwrap();
        scene.add_layer(camera, layer).unwrap();
        assert_eq!(scene.layers(camera), &[layer]);
        assert_eq!(scene.cameras_of(layer), &[camera]);
        assert!(!scene.is_live(camera), "no surface yet");

        scene.remove_layer(camera, layer).unwrap();
        assert!(scene.layers(camera).is_empty());
        assert!(scene.cameras_of(layer).is_empty());
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn unreachable_node_is_an_error() {
        let mut scene = Scene::new();
        let layer = scene.insert(None, NodeProps::default()).unwrap();
        let inside = scene
            .insert(Some(layer), NodeProps::transformed(Affine::translate((5.0, 0.0))))
            .unwrap();
        let outside = scene.insert(None, NodeProps::default()).unwrap();
        let camera = scene.create_camera(Rect::new(0.0, 0.0, 100.0, 100.0));
        scene.add_layer(camera, layer).unwrap();
        scene.set_view_transform(camera, Affine::scale(2.0)).unwrap();

        let p = scene.local_to_camera_point(camera, inside, Point::new(1.0, 1.0)).unwrap();
        assert_eq!(p, Point::new(12.0, 2.0));
        let back = scene.camera_to_local_point(camera, inside, p).unwrap();
        assert!((back - Point::new(1.0, 1.0)).hypot() < 1e-12);
        assert_eq!(
            scene.local_to_camera(camera, outside),
            Err(SceneError::NotReachable {
                camera,
                node: outside
            })
        );
    }

    #[test]
    fn sticky_node_keeps_camera_position() {
        let mut scene = Scene::new();
        let layer = scene.insert(None, NodeProps::default()).unwrap();
        let badge = scene
            .insert(Some(layer), NodeProps::transformed(Affine::translate((10.0, 10.0))))
            .unwrap();
        let camera = scene.create_camera(Rect::new(0.0, 0.0, 100.0, 100.0));
        scene.add_layer(camera, layer).unwrap();
        scene.stick_to_camera(badge, camera).unwrap();

        scene
            .set_view_transform(camera, Affine::translate((-40.0, 5.0)) * Affine::scale(3.0))
            .unwrap();
        let on_screen = scene.local_to_camera_point(camera, badge, Point::ORIGIN).unwrap();
        assert!((on_screen - Point::new(10.0, 10.0)).hypot() < 1e-9);

        scene.unstick(badge).unwrap();
        scene.set_view_transform(camera, Affine::IDENTITY).unwrap();
        assert!(!scene.is_sticky(badge));
    }

    #[test]
    fn center_on_fits_rect() {
        let mut scene = Scene::new();
        let camera = scene.create_camera(Rect::new(0.0, 0.0, 200.0, 100.0));
        let view = scene.center_on(camera, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(view * Point::new(5.0, 5.0), Point::new(100.0, 50.0));
        assert_eq!(scene.magnification(camera), Some(10.0));
    }

    #[test]
    fn destroy_camera_clears_portals_and_layers() {
        let mut scene = Scene::new();
        let layer = scene.insert(None, NodeProps::default()).unwrap();
        let portal = scene.insert(None, NodeProps::default()).unwrap();
        let camera = scene.create_camera(Rect::new(0.0, 0.0, 30.0, 30.0));
        scene.add_layer(camera, layer).unwrap();
        scene.set_content(portal, Some(Content::Camera(camera))).unwrap();
        assert_eq!(scene.bounds(portal), Some(Rect::new(0.0, 0.0, 30.0, 30.0)));

        scene.destroy_camera(camera).unwrap();
        assert!(scene.cameras_of(layer).is_empty());
        assert_eq!(scene.content(portal), None);
        assert_eq!(scene.bounds(portal), None);
        assert_eq!(scene.destroy_camera(camera), Err(SceneError::StaleCamera(camera)));
    }
}
