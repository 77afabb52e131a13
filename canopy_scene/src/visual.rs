// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawable-component contract and node content.

use alloc::boxed::Box;
use core::any::Any;
use core::fmt::Debug;

use kurbo::Rect;
use smallvec::SmallVec;

use crate::paint::RenderContext;
use crate::path::ScenePath;
use crate::types::{CameraId, NodeId, VisualId};
use crate::util::intersects;

/// Something a node can draw: a shape, an image, text.
///
/// The scene never interprets what is drawn. It only asks a visual for its
/// bounds, asks it to paint itself with the surface already transformed into
/// the owning node's local space, and asks it whether a query rectangle hits
/// it.
///
/// A visual may be the content of several nodes. After mutating it through
/// [`Scene::update_visual`](crate::Scene::update_visual) every owner is
/// reshaped.
pub trait Visual: Any + Debug {
    /// Bounds of what [`render`](Self::render) paints, in local coordinates.
    /// `None` means nothing is drawn.
    fn compute_bounds(&self) -> Option<Rect>;

    /// Paint into `ctx.surface()`.
    ///
    /// The surface transform maps local coordinates to device space. The
    /// callee must leave transform, clip, and alpha as it found them.
    fn render(&self, ctx: &mut RenderContext<'_>);

    /// Does `rect` (local coordinates) hit this visual?
    ///
    /// The default tests against [`compute_bounds`](Self::compute_bounds);
    /// shapes override it with a tighter geometric test, for example
    /// [`shape_intersects_rect`](crate::shape_intersects_rect).
    fn pick(&self, rect: Rect, path: &ScenePath) -> bool {
        let _ = path;
        self.compute_bounds().is_some_and(|b| intersects(b, rect))
    }

    /// Whether the bounds can change without notification and must be
    /// recomputed on every read.
    fn is_volatile(&self) -> bool {
        false
    }

    /// Duplicate this visual for [`Scene::clone_subtree`](crate::Scene::clone_subtree).
    fn clone_visual(&self) -> Box<dyn Visual>;
}

/// Downcast a visual to its concrete type.
pub fn downcast_ref<T: Visual>(visual: &dyn Visual) -> Option<&T> {
    (visual as &dyn Any).downcast_ref::<T>()
}

/// Downcast a visual to its concrete type, mutably.
pub fn downcast_mut<T: Visual>(visual: &mut dyn Visual) -> Option<&mut T> {
    (visual as &mut dyn Any).downcast_mut::<T>()
}

/// Content attached to a node, painted beneath (back) or above (front) its
/// children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Content {
    /// A registered visual component.
    Visual(VisualId),
    /// A camera embedded as content, showing its layers inside the node
    /// (a portal). Its viewport is the content bounds.
    Camera(CameraId),
}

/// Storage for a registered visual plus its owner back-references.
pub(crate) struct VisualSlot {
    pub(crate) visual: Box<dyn Visual>,
    /// Nodes holding this visual as content; a node appears once per slot
    /// (back or front) it occupies.
    pub(crate) owners: SmallVec<[NodeId; 2]>,
    pub(crate) bounds: Option<Rect>,
    pub(crate) volatile: bool,
}

impl VisualSlot {
    pub(crate) fn new(visual: Box<dyn Visual>) -> Self {
        let bounds = visual.compute_bounds();
        let volatile = visual.is_volatile();
        Self {
            visual,
            owners: SmallVec::new(),
            bounds,
            volatile,
        }
    }

    /// Cached bounds, refreshed first when the visual is volatile.
    pub(crate) fn refresh(&mut self) -> Option<Rect> {
        if self.volatile {
            self.bounds = self.visual.compute_bounds();
        }
        self.bounds
    }

    /// Re-read bounds and volatility after a mutation.
    pub(crate) fn revalidate(&mut self) {
        self.bounds = self.visual.compute_bounds();
        self.volatile = self.visual.is_volatile();
    }

    pub(crate) fn release(&mut self, owner: NodeId) {
        if let Some(pos) = self.owners.iter().position(|o| *o == owner) {
            self.owners.remove(pos);
        }
    }
}
