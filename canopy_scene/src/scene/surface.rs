// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output surfaces: binding a camera to something the host paints.

use kurbo::{Point, Rect, Size};

use super::{Scene, Surface};
use crate::damage::Damage;
use crate::error::{Result, SceneError};
use crate::paint::{PaintSurface, RenderContext, RenderQuality};
use crate::path::ScenePath;
use crate::types::{CameraId, SurfaceId};

impl Scene {
    /// Bind `camera` to a new output surface of `size`.
    ///
    /// The viewport is resized to `size` (keeping its origin) and the whole
    /// viewport is recorded as damage so the first paint is complete.
    pub fn bind_surface(&mut self, camera: CameraId, size: Size) -> Result<SurfaceId> {
        let c = self.camera(camera)?;
        if c.surface.is_some() {
            return Err(SceneError::SurfaceAlreadyBound(camera));
        }
        let viewport = Rect::from_origin_size(c.viewport.origin(), size);
        let id = self.surfaces.insert(Surface {
            camera,
            size,
            damage: Damage::default(),
        });
        self.camera_mut(camera)?.surface = Some(id);
        self.set_viewport(camera, viewport)?;
        log::debug!("bound {camera:?} to {id:?} ({size:?})");
        Ok(id)
    }

    /// Drop a surface binding.
    pub fn unbind_surface(&mut self, surface: SurfaceId) -> Result<()> {
        let s = self
            .surfaces
            .remove(surface)
            .ok_or(SceneError::StaleSurface(surface))?;
        if let Some(c) = self.cameras.get_mut(s.camera) {
            c.surface = None;
        }
        Ok(())
    }

    /// The camera shown on `surface`.
    pub fn surface_camera(&self, surface: SurfaceId) -> Option<CameraId> {
        self.surfaces.get(surface).map(|s| s.camera)
    }

    /// The surface `camera` is bound to.
    pub fn camera_surface(&self, camera: CameraId) -> Option<SurfaceId> {
        self.cameras.get(camera).and_then(|c| c.surface)
    }

    /// Current size of the surface.
    pub fn surface_size(&self, surface: SurfaceId) -> Option<Size> {
        self.surfaces.get(surface).map(|s| s.size)
    }

    /// Resize the surface and its camera's viewport.
    pub fn resize_surface(&mut self, surface: SurfaceId, size: Size) -> Result<()> {
        let s = self
            .surfaces
            .get_mut(surface)
            .ok_or(SceneError::StaleSurface(surface))?;
        s.size = size;
        let camera = s.camera;
        let origin = self.camera(camera)?.viewport.origin();
        self.set_viewport(camera, Rect::from_origin_size(origin, size))
    }

    /// Drain the damage accumulated for `surface`.
    pub fn take_damage(&mut self, surface: SurfaceId) -> Result<Damage> {
        let s = self
            .surfaces
            .get_mut(surface)
            .ok_or(SceneError::StaleSurface(surface))?;
        Ok(core::mem::take(&mut s.damage))
    }

    /// Render the surface's camera into `paint`.
    ///
    /// Pending damage is drained; when there is some, only its union is
    /// rendered, otherwise the whole viewport is. The camera renders as the
    /// top-level camera, so its viewport is not clipped.
    pub fn paint_surface(
        &mut self,
        surface: SurfaceId,
        paint: &mut dyn PaintSurface,
        quality: RenderQuality,
    ) -> Result<()> {
        let camera = self
            .surface_camera(surface)
            .ok_or(SceneError::StaleSurface(surface))?;
        let damage = self.take_damage(surface)?;
        let region = match damage.union_rect() {
            Some(region) => region,
            None => self.camera(camera)?.viewport,
        };
        let mut ctx = RenderContext::new(paint, region, quality);
        self.render_top_camera(camera, &mut ctx);
        Ok(())
    }

    /// Pick at a surface point with a square halo of `halo` units on each side.
    pub fn pick_surface(
        &mut self,
        surface: SurfaceId,
        point: Point,
        halo: f64,
    ) -> Result<Option<ScenePath>> {
        let camera = self
            .surface_camera(surface)
            .ok_or(SceneError::StaleSurface(surface))?;
        let rect = Rect::from_center_size(point, Size::new(2.0 * halo, 2.0 * halo));
        Ok(self.pick(camera, rect))
    }
}
