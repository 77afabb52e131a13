// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building a scene, painting it, and querying it.
//!
//! This example shows how to:
//! - insert transformed groups and attach visuals as content,
//! - bind a camera to a surface and paint only what was damaged,
//! - pick at a surface point and inspect the returned path,
//! - find nodes by bounds and by selection.
//!
//! Run:
//! - `cargo run -p canopy_demos --example scene_basics`

use canopy_scene::{
    BoundsFilter, Content, NodeProps, PaintSurface, PickTarget, RenderContext, RenderQuality,
    Rgba, Scene, SelectedFilter, Visual,
};
use kurbo::{Affine, Point, Rect, Size};

/// A flat-colored rectangle.
#[derive(Clone, Debug)]
struct Swatch {
    rect: Rect,
    color: Rgba,
}

impl Visual for Swatch {
    fn compute_bounds(&self) -> Option<Rect> {
        Some(self.rect)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        ctx.surface().fill_rect(self.rect, self.color);
    }

    fn clone_visual(&self) -> Box<dyn Visual> {
        Box::new(self.clone())
    }
}

/// Prints every primitive in device coordinates.
#[derive(Debug)]
struct Printer {
    transform: Affine,
    clip: Option<Rect>,
    alpha: f32,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            clip: None,
            alpha: 1.0,
        }
    }
}

impl PaintSurface for Printer {
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
        let device = self.transform.transform_rect_bbox(rect);
        println!("  fill   {device:?} {:?} alpha={}", color.0, self.alpha);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f64) {
        let device = self.transform.transform_rect_bbox(rect);
        println!("  stroke {device:?} {:?} width={width}", color.0);
    }
}

fn main() -> canopy_scene::Result<()> {
    let mut scene = Scene::new();
    let layer = scene.insert(None, NodeProps::default())?;

    // Two swatches in a group shifted right; a third rotated on its own.
    let group = scene.insert(Some(layer), NodeProps::transformed(Affine::translate((40.0, 20.0))))?;
    let red = scene.insert(Some(group), NodeProps::default())?;
    let green = scene.insert(Some(group), NodeProps::transformed(Affine::translate((60.0, 0.0))))?;
    let blue = scene.insert(Some(layer), NodeProps::default())?;

    let red_v = scene.insert_visual(Swatch {
        rect: Rect::new(0.0, 0.0, 50.0, 50.0),
        color: Rgba([1.0, 0.0, 0.0, 1.0]),
    });
    let green_v = scene.insert_visual(Swatch {
        rect: Rect::new(0.0, 0.0, 50.0, 50.0),
        color: Rgba([0.0, 1.0, 0.0, 1.0]),
    });
    let blue_v = scene.insert_visual(Swatch {
        rect: Rect::new(-20.0, -20.0, 20.0, 20.0),
        color: Rgba([0.0, 0.0, 1.0, 1.0]),
    });
    scene.set_content(red, Some(Content::Visual(red_v)))?;
    scene.set_content(green, Some(Content::Visual(green_v)))?;
    scene.set_content(blue, Some(Content::Visual(blue_v)))?;
    scene.set_transform(blue, Affine::translate((200.0, 150.0)) * Affine::rotate(0.5))?;

    let camera = scene.create_camera(Rect::ZERO);
    scene.add_layer(camera, layer)?;
    let surface = scene.bind_surface(camera, Size::new(320.0, 240.0))?;
    println!("group bounds: {:?}", scene.bounds(group));
    println!("layer bounds: {:?}", scene.bounds(layer));

    let mut printer = Printer::default();
    println!("first paint:");
    scene.paint_surface(surface, &mut printer, RenderQuality::High)?;

    // Moving the green swatch damages its old and new footprint only.
    scene.translate(green, 0.0, 80.0)?;
    let damage = scene.take_damage(surface)?;
    println!("damage after move: {:?}", damage.dirty_rects);
    // Queue it again, since printing drained it.
    scene.repaint(green)?;
    println!("incremental paint:");
    scene.paint_surface(surface, &mut printer, RenderQuality::Low)?;

    for point in [Point::new(60.0, 40.0), Point::new(200.0, 150.0), Point::new(5.0, 230.0)] {
        let hit = scene.pick_surface(surface, point, 1.0)?;
        match hit.as_ref().and_then(|path| path.target()) {
            Some(PickTarget::Visual { node, .. }) => {
                let path = hit.as_ref().map(|p| p.nodes().to_vec()).unwrap_or_default();
                println!("pick {point:?}: {node:?} via {path:?}");
            }
            Some(other) => println!("pick {point:?}: {other:?}"),
            None => println!("pick {point:?}: outside"),
        }
    }

    let touching = scene.find_nodes(layer, &mut BoundsFilter::new(Rect::new(0.0, 0.0, 100.0, 100.0)))?;
    println!("nodes touching (0,0)-(100,100): {touching:?}");

    scene.select(red)?;
    let selected = scene.find_nodes(layer, &mut SelectedFilter)?;
    println!("selection decorators: {selected:?}");
    println!("paint with selection:");
    scene.paint_surface(surface, &mut printer, RenderQuality::High)?;
    Ok(())
}
