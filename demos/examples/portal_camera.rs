// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cameras as content: a minimap portal, a sticky overlay, and an animated pan.
//!
//! The main camera looks at a world layer and an overlay layer. A node in the
//! overlay embeds a second camera (the minimap) that sees the world at a
//! quarter scale. The minimap frame is stuck to the main camera, so it stays
//! put while the view pans. The world node is animated with a fixed-step
//! clock so the output is deterministic.
//!
//! Run:
//! - `cargo run -p canopy_demos --example portal_camera`

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use canopy_scene::{
    AnimationStatus, Content, FrameClock, NodeProps, RenderContext, Rgba, Scene, SceneEvent,
    Timing, TransformAnimation, Visual,
};
use kurbo::{Affine, Point, Rect, Size};

#[derive(Clone, Debug)]
struct Swatch(Rect, Rgba);

impl Visual for Swatch {
    fn compute_bounds(&self) -> Option<Rect> {
        Some(self.0)
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        ctx.surface().fill_rect(self.0, self.1);
    }

    fn clone_visual(&self) -> Box<dyn Visual> {
        Box::new(self.clone())
    }
}

/// Advances by a fixed step on every read.
#[derive(Debug, Default)]
struct StepClock {
    now: Duration,
}

impl FrameClock for StepClock {
    fn now(&mut self) -> Duration {
        let now = self.now;
        self.now += Duration::from_millis(100);
        now
    }
}

fn main() -> canopy_scene::Result<()> {
    let mut scene = Scene::new();

    let world = scene.insert(None, NodeProps::default())?;
    let ship = scene.insert(Some(world), NodeProps::transformed(Affine::IDENTITY))?;
    let hull = scene.insert_visual(Swatch(
        Rect::new(0.0, 0.0, 40.0, 20.0),
        Rgba([0.2, 0.4, 0.8, 1.0]),
    ));
    scene.set_content(ship, Some(Content::Visual(hull)))?;

    let overlay = scene.insert(None, NodeProps::default())?;
    let main = scene.create_camera(Rect::ZERO);
    scene.add_layer(main, world)?;
    scene.add_layer(main, overlay)?;
    let surface = scene.bind_surface(main, Size::new(400.0, 300.0))?;

    // Minimap: a 100x75 portal showing the world at quarter scale.
    let minimap = scene.create_camera(Rect::new(0.0, 0.0, 100.0, 75.0));
    scene.add_layer(minimap, world)?;
    scene.set_view_transform(minimap, Affine::scale(0.25))?;
    scene.set_fill(minimap, Some(Rgba::WHITE))?;
    let frame = scene.insert(Some(overlay), NodeProps::transformed(Affine::translate((290.0, 10.0))))?;
    scene.set_content(frame, Some(Content::Camera(minimap)))?;
    scene.stick_to_camera(frame, main)?;
    println!("minimap frame bounds: {:?}", scene.bounds(frame));

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    scene.add_camera_listener(main, move |event: &SceneEvent| sink.borrow_mut().push(*event))?;

    // Pan the main camera; the frame keeps its place on screen.
    scene.set_view_transform(main, Affine::translate((-100.0, -50.0)))?;
    let screen = scene.local_to_camera_point(main, frame, Point::ORIGIN)?;
    println!("frame origin after pan: {screen:?}");
    println!("camera events: {:?}", events.borrow());

    // Moving the ship damages the main view and, through the portal, the
    // minimap frame too.
    scene.take_damage(surface)?;
    let mut clock = StepClock::default();
    scene.animate_transform(
        ship,
        Affine::translate((200.0, 120.0)),
        Duration::from_millis(500),
        &mut clock,
        |scene| {
            let damage = scene.take_damage(surface).unwrap_or_default();
            println!("frame damage: {:?}", damage.dirty_rects);
        },
    )?;
    println!("ship at {:?}", scene.translation(ship));

    // The same motion, stepped by hand with an easing curve.
    let back = TransformAnimation::new(&scene, ship, Affine::IDENTITY, Duration::from_secs(1))?
        .with_timing(Timing::SlowInSlowOut);
    let mut elapsed = Duration::ZERO;
    while back.step(&mut scene, elapsed)? == AnimationStatus::Running {
        println!("  eased: {:?}", scene.translation(ship));
        elapsed += Duration::from_millis(250);
    }
    println!("ship back at {:?}", scene.translation(ship));
    Ok(())
}
