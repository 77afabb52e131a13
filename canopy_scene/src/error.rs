// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for structural and usage failures.
//!
//! Only programming mistakes (bad topology, bad indices, stale handles) are
//! reported as errors. Geometric degeneracies met during a traversal, such as
//! an empty intersection or a singular matrix, are logged and degrade to an
//! empty result instead; [`SceneError::NonInvertible`] is only returned by the
//! explicit coordinate-conversion calls.

use crate::types::{CameraId, NodeId, SurfaceId, VisualId};

/// Convenience alias for results returned by scene operations.
pub type Result<T, E = SceneError> = core::result::Result<T, E>;

/// Errors raised synchronously by [`Scene`](crate::Scene) operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The node handle is stale or was never issued by this scene.
    #[error("stale node handle {0:?}")]
    StaleNode(NodeId),
    /// The visual component handle is stale.
    #[error("stale visual handle {0:?}")]
    StaleVisual(VisualId),
    /// The camera handle is stale.
    #[error("stale camera handle {0:?}")]
    StaleCamera(CameraId),
    /// The surface handle is stale.
    #[error("stale surface handle {0:?}")]
    StaleSurface(SurfaceId),
    /// A single-child decorator already has a child.
    #[error("decorator {0:?} already has a child")]
    TooManyChildren(NodeId),
    /// A child index was outside `0..len` (or `0..=len` for insertion).
    #[error("child index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The number of children at the time of the call.
        len: usize,
    },
    /// The node is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The parent that was named.
        parent: NodeId,
        /// The node that was expected under it.
        child: NodeId,
    },
    /// The reference node does not share a parent with the node being moved.
    #[error("{reference:?} is not a sibling of {node:?}")]
    NotASibling {
        /// The node being reordered.
        node: NodeId,
        /// The reference it was to be placed against.
        reference: NodeId,
    },
    /// The operation would make a node its own ancestor.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// The prospective parent.
        parent: NodeId,
        /// The prospective child.
        child: NodeId,
    },
    /// The node does not descend from any layer the camera observes.
    #[error("{node:?} is not reachable from {camera:?}")]
    NotReachable {
        /// The camera that was queried.
        camera: CameraId,
        /// The node that was looked up.
        node: NodeId,
    },
    /// A transform needed for a coordinate conversion is singular.
    #[error("transform is not invertible")]
    NonInvertible,
    /// The camera is already bound to an output surface.
    #[error("{0:?} is already bound to a surface")]
    SurfaceAlreadyBound(CameraId),
}
