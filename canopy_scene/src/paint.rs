// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint surface abstraction and per-frame render state.

use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::types::{CameraId, Rgba};

/// A drawing target the scene renders into.
///
/// Hosts implement this over their 2D backend. The scene only manipulates
/// the current transform, clip, and alpha and forwards the primitive calls;
/// anything richer (paths, images, text) is drawn by [`Visual`](crate::Visual)
/// implementations that know the concrete surface type.
pub trait PaintSurface {
    /// Current transform from the caller's local space to device space.
    fn transform(&self) -> Affine;
    /// Replace the current transform.
    fn set_transform(&mut self, transform: Affine);
    /// Current clip in device space; `None` is unclipped.
    fn clip(&self) -> Option<Rect>;
    /// Replace the current clip.
    fn set_clip(&mut self, clip: Option<Rect>);
    /// Current compositing alpha.
    fn alpha(&self) -> f32;
    /// Replace the current compositing alpha.
    fn set_alpha(&mut self, alpha: f32);
    /// Fill `rect` (current local space) with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    /// Outline `rect` (current local space).
    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f64);
}

/// Rendering quality hint passed to visuals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderQuality {
    /// Cheap rendering, used while the view is being manipulated.
    Low,
    /// Full-quality rendering.
    #[default]
    High,
}

#[derive(Clone, Copy, Debug)]
struct CameraFrame {
    camera: CameraId,
    magnification: f64,
}

/// Per-render state handed to every visual.
///
/// Carries the paint surface, a stack of visible rectangles (the region
/// being repainted expressed in the current local space), the stack of
/// cameras entered so far, and the render quality.
pub struct RenderContext<'a> {
    surface: &'a mut dyn PaintSurface,
    visible: Vec<Rect>,
    cameras: Vec<CameraFrame>,
    quality: RenderQuality,
}

impl core::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderContext")
            .field("visible", &self.visible)
            .field("cameras", &self.cameras)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

impl<'a> RenderContext<'a> {
    /// Start a render of `region` (surface coordinates) into `surface`.
    pub fn new(surface: &'a mut dyn PaintSurface, region: Rect, quality: RenderQuality) -> Self {
        Self {
            surface,
            visible: alloc::vec![region],
            cameras: Vec::new(),
            quality,
        }
    }

    /// The paint surface.
    pub fn surface(&mut self) -> &mut dyn PaintSurface {
        &mut *self.surface
    }

    /// The region being repainted, in the current local space.
    pub fn visible_bounds(&self) -> Rect {
        self.visible.last().copied().unwrap_or(Rect::ZERO)
    }

    /// Innermost camera being rendered.
    pub fn camera(&self) -> Option<CameraId> {
        self.cameras.last().map(|f| f.camera)
    }

    /// Outermost camera, the one bound to the surface.
    pub fn top_camera(&self) -> Option<CameraId> {
        self.cameras.first().map(|f| f.camera)
    }

    /// Magnification accumulated over every camera entered so far.
    pub fn magnification(&self) -> f64 {
        self.cameras.last().map_or(1.0, |f| f.magnification)
    }

    /// The quality hint for this render.
    pub fn quality(&self) -> RenderQuality {
        self.quality
    }

    pub(crate) fn is_rendering(&self, camera: CameraId) -> bool {
        self.cameras.iter().any(|f| f.camera == camera)
    }

    pub(crate) fn push_visible(&mut self, rect: Rect) {
        self.visible.push(rect);
    }

    pub(crate) fn pop_visible(&mut self) {
        self.visible.pop();
    }

    pub(crate) fn push_camera(&mut self, camera: CameraId, magnification: f64) {
        let magnification = self.magnification() * magnification;
        self.cameras.push(CameraFrame {
            camera,
            magnification,
        });
    }

    pub(crate) fn pop_camera(&mut self) {
        self.cameras.pop();
    }
}
