// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by the in-crate tests.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Affine, Circle, Point, Rect};

use crate::hit::shape_intersects_rect;
use crate::paint::{PaintSurface, RenderContext};
use crate::path::ScenePath;
use crate::scene::Scene;
use crate::types::{NodeId, NodeProps, Rgba, SurfaceId};
use crate::visual::Visual;

/// A filled rectangle.
#[derive(Clone, Debug)]
pub(crate) struct Block {
    pub(crate) rect: Rect,
    pub(crate) color: Rgba,
    pub(crate) volatile: bool,
}

impl Visual for Block {
    fn compute_bounds(&self) -> Option<Rect> {
        Some(self.rect)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        ctx.surface().fill_rect(self.rect, self.color);
    }

    fn is_volatile(&self) -> bool {
        self.volatile
    }

    fn clone_visual(&self) -> Box<dyn Visual> {
        Box::new(self.clone())
    }
}

pub(crate) fn block(x0: f64, y0: f64, x1: f64, y1: f64) -> Block {
    colored(x0, y0, x1, y1, Rgba::BLACK)
}

pub(crate) fn colored(x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba) -> Block {
    Block {
        rect: Rect::new(x0, y0, x1, y1),
        color,
        volatile: false,
    }
}

/// A filled circle with exact picking.
#[derive(Clone, Debug)]
pub(crate) struct Ring {
    pub(crate) center: Point,
    pub(crate) radius: f64,
}

impl Visual for Ring {
    fn compute_bounds(&self) -> Option<Rect> {
        Some(Rect::from_center_size(
            self.center,
            (2.0 * self.radius, 2.0 * self.radius),
        ))
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        if let Some(bounds) = self.compute_bounds() {
            ctx.surface().fill_rect(bounds, Rgba::BLACK);
        }
    }

    fn pick(&self, rect: Rect, _path: &ScenePath) -> bool {
        shape_intersects_rect(&Circle::new(self.center, self.radius), rect)
    }

    fn clone_visual(&self) -> Box<dyn Visual> {
        Box::new(self.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Fill {
        rect: Rect,
        color: Rgba,
        transform: Affine,
        clip: Option<Rect>,
        alpha: f32,
    },
    Stroke {
        rect: Rect,
        color: Rgba,
        width: f64,
        transform: Affine,
    },
}

/// Snapshot of surface state at a fill.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Painted {
    pub(crate) color: Rgba,
    pub(crate) transform: Affine,
    pub(crate) clip: Option<Rect>,
    pub(crate) alpha: f32,
}

/// Records every primitive together with the state it was drawn under.
#[derive(Debug)]
pub(crate) struct RecordingSurface {
    pub(crate) ops: Vec<Op>,
    pub(crate) transform: Affine,
    pub(crate) clip: Option<Rect>,
    pub(crate) alpha: f32,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            transform: Affine::IDENTITY,
            clip: None,
            alpha: 1.0,
        }
    }
}

impl RecordingSurface {
    pub(crate) fn fills(&self) -> impl Iterator<Item = Painted> + '_ {
        self.ops.iter().filter_map(|op| match *op {
            Op::Fill {
                color,
                transform,
                clip,
                alpha,
                ..
            } => Some(Painted {
                color,
                transform,
                clip,
                alpha,
            }),
            Op::Stroke { .. } => None,
        })
    }
}

impl PaintSurface for RecordingSurface {
    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn clip(&self) -> Option<Rect> {
        self.clip
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(Op::Fill {
            rect,
            color,
            transform: self.transform,
            clip: self.clip,
            alpha: self.alpha,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f64) {
        self.ops.push(Op::Stroke {
            rect,
            color,
            width,
            transform: self.transform,
        });
    }
}

/// A scene with one layer seen by a camera bound to a surface covering
/// `viewport`; pending damage is drained.
pub(crate) fn surface_scene(viewport: Rect) -> (Scene, SurfaceId, NodeId) {
    let mut scene = Scene::new();
    let layer = scene.insert(None, NodeProps::default()).unwrap();
    let camera = scene.create_camera(viewport);
    scene.add_layer(camera, layer).unwrap();
    let surface = scene.bind_surface(camera, viewport.size()).unwrap();
    scene.take_damage(surface).unwrap();
    (scene, surface, layer)
}
