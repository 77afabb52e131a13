// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pick results.

use alloc::vec::Vec;

use kurbo::{Affine, Point};

use crate::types::{CameraId, NodeId, VisualId};
use crate::util::{checked_inverse, magnification};

/// What a pick reported as hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickTarget {
    /// A visual content slot of `node`.
    Visual {
        /// Node holding the visual.
        node: NodeId,
        /// The visual that was hit.
        visual: VisualId,
    },
    /// A node whose children are not individually pickable; one of its
    /// descendants was hit.
    Node(NodeId),
    /// A camera whose viewport was hit but none of whose layers were.
    Camera(CameraId),
}

#[derive(Clone, Copy, Debug)]
struct CameraEntry {
    camera: CameraId,
    magnification: f64,
}

/// The chain of nodes, transforms, and cameras from the picked camera down
/// to the hit.
///
/// `transform()` maps the innermost local space of the path back to the
/// coordinates the pick rectangle was given in (surface coordinates when
/// picking through a surface).
#[derive(Clone, Debug, Default)]
pub struct ScenePath {
    nodes: Vec<NodeId>,
    transforms: Vec<Affine>,
    cameras: Vec<CameraEntry>,
    target: Option<PickTarget>,
}

impl ScenePath {
    /// An empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes from the outermost layer to the hit node.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The innermost node on the path.
    pub fn node(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// What was hit.
    pub fn target(&self) -> Option<PickTarget> {
        self.target
    }

    /// Cameras entered, outermost first.
    pub fn cameras(&self) -> impl Iterator<Item = CameraId> + '_ {
        self.cameras.iter().map(|e| e.camera)
    }

    /// Innermost camera on the path.
    pub fn camera(&self) -> Option<CameraId> {
        self.cameras.last().map(|e| e.camera)
    }

    /// Outermost camera on the path.
    pub fn top_camera(&self) -> Option<CameraId> {
        self.cameras.first().map(|e| e.camera)
    }

    /// Camera magnification accumulated along the path.
    pub fn magnification(&self) -> f64 {
        self.cameras.last().map_or(1.0, |e| e.magnification)
    }

    /// Accumulated transform from the innermost local space to pick space.
    pub fn transform(&self) -> Affine {
        self.transforms.last().copied().unwrap_or(Affine::IDENTITY)
    }

    /// Map a pick-space point into the innermost local space.
    pub fn to_local(&self, point: Point) -> Option<Point> {
        checked_inverse(self.transform()).map(|inv| inv * point)
    }

    /// Map an innermost-local point into pick space.
    pub fn to_pick_space(&self, point: Point) -> Point {
        self.transform() * point
    }

    pub(crate) fn push_node(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    pub(crate) fn pop_node(&mut self) {
        self.nodes.pop();
    }

    pub(crate) fn push_transform(&mut self, transform: Affine) {
        let acc = self.transform() * transform;
        self.transforms.push(acc);
    }

    pub(crate) fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    pub(crate) fn push_camera(&mut self, camera: CameraId, view: Affine) {
        let magnification = self.magnification() * magnification(view);
        self.cameras.push(CameraEntry {
            camera,
            magnification,
        });
        self.push_transform(view);
    }

    pub(crate) fn contains_camera(&self, camera: CameraId) -> bool {
        self.cameras.iter().any(|e| e.camera == camera)
    }

    pub(crate) fn set_target(&mut self, target: PickTarget) {
        self.target = Some(target);
    }
}
