// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node transforms and local/global conversion.

use kurbo::{Affine, Point, Rect, Vec2};

use super::Scene;
use crate::error::{Result, SceneError};
use crate::events::SceneEvent;
use crate::transform::{TransformState, concatenate, pre_concatenate};
use crate::types::NodeId;
use crate::util::{checked_inverse, magnification, transform_rect_bbox};

impl Scene {
    /// The node's local transform; identity for nodes without the capability,
    /// `None` for stale ids.
    pub fn transform(&self, id: NodeId) -> Option<Affine> {
        self.nodes.get(id).map(super::Node::affine)
    }

    /// Whether the node carries its own transform.
    pub fn has_transform(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.transform.is_some())
    }

    /// Install a new local transform.
    ///
    /// Listeners receive the old and new matrix; the node is reshaped.
    /// A node without a transform gains one.
    pub fn set_transform(&mut self, id: NodeId, affine: Affine) -> Result<()> {
        self.node(id)?;
        self.damage_node(id);
        let node = self.node_mut(id)?;
        let old = if let Some(state) = node.transform.as_mut() {
            state.set(affine)
        } else {
            node.transform = Some(TransformState::new(affine));
            Affine::IDENTITY
        };
        self.update_bounds_upward(id);
        self.damage_node(id);
        self.listeners.emit_node(
            id,
            &SceneEvent::TransformChanged {
                node: id,
                old,
                new: affine,
            },
        );
        Ok(())
    }

    /// Inverse of the local transform.
    pub fn inverse_transform(&mut self, id: NodeId) -> Result<Affine> {
        match &mut self.node_mut(id)?.transform {
            Some(state) => state.inverse().ok_or(SceneError::NonInvertible),
            None => Ok(Affine::IDENTITY),
        }
    }

    /// `M = M · at`: `at` applies in the node's local space.
    pub fn concatenate(&mut self, id: NodeId, at: Affine) -> Result<()> {
        let m = self.current(id)?;
        self.set_transform(id, concatenate(m, at))
    }

    /// `M = at · M`: `at` applies in the parent's space.
    pub fn pre_concatenate(&mut self, id: NodeId, at: Affine) -> Result<()> {
        let m = self.current(id)?;
        self.set_transform(id, pre_concatenate(m, at))
    }

    /// Translate in local units.
    pub fn translate(&mut self, id: NodeId, dx: f64, dy: f64) -> Result<()> {
        self.concatenate(id, Affine::translate((dx, dy)))
    }

    /// Scale uniformly about the local origin.
    pub fn scale(&mut self, id: NodeId, s: f64) -> Result<()> {
        self.concatenate(id, Affine::scale(s))
    }

    /// Scale uniformly about a local point.
    pub fn scale_about(&mut self, id: NodeId, s: f64, pivot: Point) -> Result<()> {
        self.concatenate(id, Affine::scale_about(s, pivot))
    }

    /// Rotate by `theta` radians about the local origin.
    pub fn rotate(&mut self, id: NodeId, theta: f64) -> Result<()> {
        self.concatenate(id, Affine::rotate(theta))
    }

    /// Rotate by `theta` radians about a local point.
    pub fn rotate_about(&mut self, id: NodeId, theta: f64, pivot: Point) -> Result<()> {
        self.concatenate(id, Affine::rotate_about(theta, pivot))
    }

    /// The translation part of the local transform.
    pub fn translation(&self, id: NodeId) -> Option<Vec2> {
        self.transform(id).map(Affine::translation)
    }

    /// Replace the translation part of the local transform.
    pub fn set_translation(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        let m = self.current(id)?;
        self.set_transform(id, m.with_translation(Vec2::new(x, y)))
    }

    /// Uniform scale factor of the local transform.
    pub fn scale_factor(&self, id: NodeId) -> Option<f64> {
        self.transform(id).map(magnification)
    }

    /// Rescale so that [`scale_factor`](Self::scale_factor) becomes `s`.
    pub fn set_scale(&mut self, id: NodeId, s: f64) -> Result<()> {
        let current = magnification(self.current(id)?);
        if current == 0.0 {
            log::warn!("cannot rescale degenerate transform of {id:?}");
            return Err(SceneError::NonInvertible);
        }
        self.scale(id, s / current)
    }

    fn current(&self, id: NodeId) -> Result<Affine> {
        self.transform(id).ok_or(SceneError::StaleNode(id))
    }

    /// Transform from the node's local space to the root's parent space,
    /// including the node's own transform.
    pub fn local_to_global(&self, id: NodeId) -> Result<Affine> {
        let mut node = self.node(id)?;
        let mut acc = node.affine();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            acc = node.affine() * acc;
        }
        Ok(acc)
    }

    /// Inverse of [`local_to_global`](Self::local_to_global).
    pub fn global_to_local(&self, id: NodeId) -> Result<Affine> {
        let forward = self.local_to_global(id)?;
        checked_inverse(forward).ok_or_else(|| {
            log::warn!("global_to_local: singular transform chain above {id:?}");
            SceneError::NonInvertible
        })
    }

    /// Map a local point to global coordinates.
    pub fn local_to_global_point(&self, id: NodeId, point: Point) -> Result<Point> {
        Ok(self.local_to_global(id)? * point)
    }

    /// Map a global point to local coordinates.
    pub fn global_to_local_point(&self, id: NodeId, point: Point) -> Result<Point> {
        Ok(self.global_to_local(id)? * point)
    }

    /// Bounding box of a local rectangle in global coordinates.
    pub fn local_to_global_rect(&self, id: NodeId, rect: Rect) -> Result<Rect> {
        Ok(transform_rect_bbox(self.local_to_global(id)?, rect))
    }

    /// Bounding box of a global rectangle in local coordinates.
    pub fn global_to_local_rect(&self, id: NodeId, rect: Rect) -> Result<Rect> {
        Ok(transform_rect_bbox(self.global_to_local(id)?, rect))
    }

    /// Cached bounds of `id` in global coordinates.
    pub fn global_bounds(&self, id: NodeId) -> Option<Rect> {
        let bounds = self.cached_bounds(id)?;
        match self.parent(id) {
            Some(parent) => self.local_to_global_rect(parent, bounds).ok(),
            None => Some(bounds),
        }
    }
}
