// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Back-to-front rendering.

use super::Scene;
use crate::paint::RenderContext;
use crate::types::{CameraId, Decorator, NodeFlags, NodeId};
use crate::util::{magnification, overlap, transform_rect_bbox};
use crate::visual::Content;

impl Scene {
    /// Render `camera` into `ctx` as embedded content: its viewport clips.
    pub fn render_camera(&mut self, camera: CameraId, ctx: &mut RenderContext<'_>) {
        self.render_camera_inner(camera, ctx, false);
    }

    pub(crate) fn render_top_camera(&mut self, camera: CameraId, ctx: &mut RenderContext<'_>) {
        self.render_camera_inner(camera, ctx, true);
    }

    fn render_camera_inner(&mut self, camera: CameraId, ctx: &mut RenderContext<'_>, top: bool) {
        if ctx.is_rendering(camera) {
            log::debug!("{camera:?} is already being rendered; skipped");
            return;
        }
        let Some(c) = self.cameras.get_mut(camera) else {
            return;
        };
        let Some(visible) = overlap(ctx.visible_bounds(), c.viewport) else {
            return;
        };
        let Some(inverse) = c.view.inverse() else {
            return;
        };
        let view = c.view.affine();
        let viewport = c.viewport;
        let fill = c.fill;
        let layers = c.layers.clone();

        let surface = ctx.surface();
        let saved_transform = surface.transform();
        let saved_clip = surface.clip();
        if !top {
            let device = transform_rect_bbox(saved_transform, viewport);
            let clip = match saved_clip {
                Some(clip) => overlap(clip, device).unwrap_or(kurbo::Rect::ZERO),
                None => device,
            };
            surface.set_clip(Some(clip));
        }
        if let Some(fill) = fill {
            surface.fill_rect(viewport, fill);
        }
        surface.set_transform(saved_transform * view);
        ctx.push_visible(transform_rect_bbox(inverse, visible));
        ctx.push_camera(camera, magnification(view));

        for layer in layers {
            self.render_node(layer, ctx);
        }

        ctx.pop_camera();
        ctx.pop_visible();
        let surface = ctx.surface();
        surface.set_transform(saved_transform);
        surface.set_clip(saved_clip);
    }

    fn render_node(&mut self, id: NodeId, ctx: &mut RenderContext<'_>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.flags.contains(NodeFlags::VISIBLE) {
            return;
        }
        let fade = node.fade;
        if let Some(fade) = fade
            && (fade.alpha <= 0.0 || !fade.shows_at(ctx.magnification()))
        {
            return;
        }
        let Some(bounds) = self.fresh_bounds(id) else {
            return;
        };
        if overlap(ctx.visible_bounds(), bounds).is_none() {
            return;
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let transform = match node.transform.as_mut() {
            Some(state) => match state.inverse() {
                Some(inverse) => Some((state.affine(), inverse)),
                None => {
                    log::warn!("skipping {id:?}: non-invertible transform");
                    return;
                }
            },
            None => None,
        };
        let (back, front, decorator) = (node.back, node.front, node.decorator);
        let children = node.children.clone();

        let surface = ctx.surface();
        let saved_transform = surface.transform();
        let saved_clip = surface.clip();
        let saved_alpha = surface.alpha();
        if let Some(fade) = fade {
            surface.set_alpha(saved_alpha * fade.alpha);
        }
        if let Some((affine, inverse)) = transform {
            surface.set_transform(saved_transform * affine);
            let visible = transform_rect_bbox(inverse, ctx.visible_bounds());
            ctx.push_visible(visible);
        }

        if let Some(back) = back {
            self.render_content(back, ctx);
        }
        for child in children {
            self.render_node(child, ctx);
        }
        if let Some(front) = front {
            self.render_content(front, ctx);
        }
        if let Some(Decorator::Selection { color, width }) = decorator
            && let Some(local) = self.local_bounds(id)
        {
            ctx.surface().stroke_rect(local, color, width);
        }

        if transform.is_some() {
            ctx.pop_visible();
        }
        let surface = ctx.surface();
        surface.set_transform(saved_transform);
        surface.set_clip(saved_clip);
        surface.set_alpha(saved_alpha);
    }

    fn render_content(&mut self, content: Content, ctx: &mut RenderContext<'_>) {
        match content {
            Content::Visual(v) => {
                if let Some(slot) = self.visuals.get(v) {
                    slot.visual.render(ctx);
                }
            }
            Content::Camera(c) => self.render_camera_inner(c, ctx, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::RenderQuality;
    use crate::test_support::{Op, RecordingSurface, block, colored, surface_scene};
    use crate::types::{Fade, NodeProps, Rgba};
    use alloc::vec::Vec;
    use kurbo::{Affine, Rect};

    #[test]
    fn paints_back_children_front_in_order() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let group = scene
            .insert(Some(layer), NodeProps::transformed(Affine::translate((10.0, 0.0))))
            .unwrap();
        let child = scene.insert(Some(group), NodeProps::default()).unwrap();
        let back = scene.insert_visual(colored(0.0, 0.0, 50.0, 50.0, Rgba([1.0, 0.0, 0.0, 1.0])));
        let mid = scene.insert_visual(colored(0.0, 0.0, 10.0, 10.0, Rgba([0.0, 1.0, 0.0, 1.0])));
        let front = scene.insert_visual(colored(5.0, 5.0, 8.0, 8.0, Rgba([0.0, 0.0, 1.0, 1.0])));
        scene.set_content(group, Some(Content::Visual(back))).unwrap();
        scene.set_content(child, Some(Content::Visual(mid))).unwrap();
        scene.set_front_content(group, Some(Content::Visual(front))).unwrap();

        let mut paint = RecordingSurface::default();
        scene.paint_surface(surface, &mut paint, RenderQuality::High).unwrap();
        let fills: Vec<_> = paint.fills().map(|op| (op.color, op.transform)).collect();
        let t = Affine::translate((10.0, 0.0));
        assert_eq!(
            fills,
            alloc::vec![
                (Rgba([1.0, 0.0, 0.0, 1.0]), t),
                (Rgba([0.0, 1.0, 0.0, 1.0]), t),
                (Rgba([0.0, 0.0, 1.0, 1.0]), t),
            ]
        );
        assert_eq!(paint.transform, Affine::IDENTITY, "state restored");
        assert_eq!(paint.alpha, 1.0);
    }

    #[test]
    fn culls_outside_region_and_invisible() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let near = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let far = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let hidden = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let v_near = scene.insert_visual(block(0.0, 0.0, 10.0, 10.0));
        let v_far = scene.insert_visual(block(500.0, 500.0, 510.0, 510.0));
        scene.set_content(near, Some(Content::Visual(v_near))).unwrap();
        scene.set_content(far, Some(Content::Visual(v_far))).unwrap();
        scene.set_content(hidden, Some(Content::Visual(v_near))).unwrap();
        scene.set_visible(hidden, false).unwrap();

        let mut paint = RecordingSurface::default();
        scene.paint_surface(surface, &mut paint, RenderQuality::High).unwrap();
        assert_eq!(paint.fills().count(), 1);
    }

    #[test]
    fn fade_multiplies_alpha_and_respects_magnification() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let faded = scene
            .insert(
                Some(layer),
                NodeProps {
                    fade: Some(Fade {
                        alpha: 0.5,
                        min_magnification: 0.0,
                        max_magnification: 1.5,
                    }),
                    ..NodeProps::default()
                },
            )
            .unwrap();
        let leaf = scene.insert(Some(faded), NodeProps::default()).unwrap();
        let v = scene.insert_visual(block(0.0, 0.0, 10.0, 10.0));
        scene.set_content(leaf, Some(Content::Visual(v))).unwrap();

        let mut paint = RecordingSurface::default();
        scene.paint_surface(surface, &mut paint, RenderQuality::High).unwrap();
        assert_eq!(paint.fills().map(|op| op.alpha).collect::<Vec<_>>(), alloc::vec![0.5]);
        assert_eq!(paint.alpha, 1.0);

        let camera = scene.surface_camera(surface).unwrap();
        scene.set_view_transform(camera, Affine::scale(2.0)).unwrap();
        let mut paint = RecordingSurface::default();
        scene.paint_surface(surface, &mut paint, RenderQuality::High).unwrap();
        assert_eq!(paint.fills().count(), 0, "out of magnification range");
    }

    #[test]
    fn camera_fill_and_selection_outline() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let camera = scene.surface_camera(surface).unwrap();
        scene.set_fill(camera, Some(Rgba::WHITE)).unwrap();
        let leaf = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let v = scene.insert_visual(block(2.0, 2.0, 8.0, 8.0));
        scene.set_content(leaf, Some(Content::Visual(v))).unwrap();
        scene.select(leaf).unwrap();
        scene.take_damage(surface).unwrap();

        let mut paint = RecordingSurface::default();
        scene.paint_surface(surface, &mut paint, RenderQuality::Low).unwrap();
        assert!(matches!(paint.ops[0], Op::Fill { color, .. } if color == Rgba::WHITE));
        assert!(matches!(paint.ops.last(), Some(Op::Stroke { rect, .. }) if *rect == Rect::new(2.0, 2.0, 8.0, 8.0)));
    }

    #[test]
    fn portal_renders_other_camera_clipped_and_does_not_recurse() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));

        // A second world seen through a portal camera.
        let world = scene.insert(None, NodeProps::default()).unwrap();
        let v = scene.insert_visual(block(0.0, 0.0, 5.0, 5.0));
        scene.set_content(world, Some(Content::Visual(v))).unwrap();
        let portal_camera = scene.create_camera(Rect::new(0.0, 0.0, 20.0, 20.0));
        scene.add_layer(portal_camera, world).unwrap();
        scene.set_view_transform(portal_camera, Affine::scale(2.0)).unwrap();

        let frame = scene.insert(Some(layer), NodeProps::default()).unwrap();
        scene.set_content(frame, Some(Content::Camera(portal_camera))).unwrap();
        // The portal also shows the layer holding the portal itself.
        scene.add_layer(portal_camera, layer).unwrap();
        scene.take_damage(surface).unwrap();

        let mut paint = RecordingSurface::default();
        scene.paint_surface(surface, &mut paint, RenderQuality::High).unwrap();
        let fills: Vec<_> = paint.fills().collect();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].transform, Affine::scale(2.0));
        assert_eq!(fills[0].clip, Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
        assert_eq!(paint.clip, None);
    }

    #[test]
    fn singular_subtree_is_skipped_and_siblings_paint() {
        let (mut scene, surface, layer) = surface_scene(Rect::new(0.0, 0.0, 100.0, 100.0));
        let good = scene.insert(Some(layer), NodeProps::default()).unwrap();
        let red = Rgba([1.0, 0.0, 0.0, 1.0]);
        let v_good = scene.insert_visual(colored(0.0, 0.0, 10.0, 10.0, red));
        scene.set_content(good, Some(Content::Visual(v_good))).unwrap();
        let collapsed = scene
            .insert(
                Some(layer),
                NodeProps::transformed(Affine::new([1.0, 1.0, 1.0, 1.0, 0.0, 0.0])),
            )
            .unwrap();
        let inner = scene.insert(Some(collapsed), NodeProps::default()).unwrap();
        let v_inner = scene.insert_visual(block(0.0, 0.0, 10.0, 10.0));
        scene.set_content(inner, Some(Content::Visual(v_inner))).unwrap();

        let mut paint = RecordingSurface::default();
        scene.paint_surface(surface, &mut paint, RenderQuality::High).unwrap();
        let fills: Vec<_> = paint.fills().collect();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].color, red);
        assert_eq!(paint.transform, Affine::IDENTITY);
        assert_eq!(paint.alpha, 1.0);
    }
}
