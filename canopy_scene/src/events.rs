// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification for nodes and cameras.

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Affine;

use crate::types::{CameraId, ListenerId, NodeId};

/// A structural or transform change reported to listeners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneEvent {
    /// A node's local transform changed.
    TransformChanged {
        /// The node whose transform changed.
        node: NodeId,
        /// The previous matrix.
        old: Affine,
        /// The new matrix.
        new: Affine,
    },
    /// A child was attached.
    ChildAdded {
        /// The new parent.
        parent: NodeId,
        /// The attached child.
        child: NodeId,
    },
    /// A child was detached.
    ChildRemoved {
        /// The former parent.
        parent: NodeId,
        /// The detached child.
        child: NodeId,
    },
    /// A camera's view transform changed.
    ViewTransformChanged {
        /// The camera.
        camera: CameraId,
        /// The previous view matrix.
        old: Affine,
        /// The new view matrix.
        new: Affine,
    },
    /// A camera started observing a layer.
    LayerAdded {
        /// The camera.
        camera: CameraId,
        /// The layer node.
        layer: NodeId,
    },
    /// A camera stopped observing a layer.
    LayerRemoved {
        /// The camera.
        camera: CameraId,
        /// The layer node.
        layer: NodeId,
    },
}

type Callback = Box<dyn FnMut(&SceneEvent)>;

/// Listener registries keyed by the observed node or camera.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    nodes: HashMap<NodeId, Vec<(ListenerId, Callback)>>,
    cameras: HashMap<CameraId, Vec<(ListenerId, Callback)>>,
}

impl Listeners {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub(crate) fn add_node(&mut self, node: NodeId, callback: Callback) -> ListenerId {
        let id = self.allocate();
        self.nodes.entry(node).or_default().push((id, callback));
        id
    }

    pub(crate) fn add_camera(&mut self, camera: CameraId, callback: Callback) -> ListenerId {
        let id = self.allocate();
        self.cameras.entry(camera).or_default().push((id, callback));
        id
    }

    /// Returns whether a listener was removed.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        for list in self.nodes.values_mut().chain(self.cameras.values_mut()) {
            if let Some(pos) = list.iter().position(|(l, _)| *l == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub(crate) fn forget_node(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }

    pub(crate) fn forget_camera(&mut self, camera: CameraId) {
        self.cameras.remove(&camera);
    }

    pub(crate) fn emit_node(&mut self, node: NodeId, event: &SceneEvent) {
        if let Some(list) = self.nodes.get_mut(&node) {
            for (_, callback) in list.iter_mut() {
                callback(event);
            }
        }
    }

    pub(crate) fn emit_camera(&mut self, camera: CameraId, event: &SceneEvent) {
        if let Some(list) = self.cameras.get_mut(&camera) {
            for (_, callback) in list.iter_mut() {
                callback(event);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.values().chain(self.cameras.values()).map(Vec::len).sum()
    }
}
