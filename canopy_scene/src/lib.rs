// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Scene: a Kurbo-native, retained-mode 2D scene graph.
//!
//! A [`Scene`] owns a hierarchy of nodes. Every node may carry an affine
//! transform, a fade, a decorator, and up to two pieces of content (drawn
//! behind and in front of its children). Content is either a [`Visual`] (an
//! application-defined leaf that knows its own bounds, how to paint itself,
//! and how to answer precise pick queries) or a camera, which turns the node
//! into a portal onto another part of the scene.
//!
//! - Bounds are cached per node in parent space and revalidated upward when
//!   content, children, or transforms change. Volatile nodes opt out of the
//!   cache and are recomputed on every query.
//! - Cameras look at an ordered list of layer nodes through a view transform
//!   and a viewport. A camera bound to an output surface accumulates
//!   [`Damage`] in surface coordinates whenever something it sees changes.
//! - Three traversals walk the graph: [`Scene::paint_surface`] /
//!   [`Scene::render_camera`] paint back to front through a [`PaintSurface`],
//!   [`Scene::pick`] finds the front-most hit and returns a [`ScenePath`], and
//!   [`Scene::find_nodes`] collects nodes through a [`FindFilter`].
//!
//! ## Not a renderer
//!
//! This crate does not rasterize. [`PaintSurface`] is the seam to whatever
//! 2D backend the host uses; visuals issue drawing calls through it and the
//! scene only manages transform, clip, and alpha state around them.
//!
//! ## API overview
//!
//! - [`Scene`]: the arena of nodes, visuals, cameras, and surfaces.
//! - [`NodeProps`]: initial state for [`Scene::insert`].
//! - [`NodeFlags`]: visibility, pickability, findability, volatility.
//! - [`Content`]: what a node draws behind or in front of its children.
//! - [`SceneEvent`]: change notifications delivered to registered listeners.
//! - [`TransformAnimation`]: interpolates a node's transform over time.
//!
//! ## Example
//!
//! ```rust
//! use canopy_scene::{Content, NodeProps, RenderContext, Scene, Visual};
//! use kurbo::{Affine, Point, Rect, Size};
//!
//! #[derive(Clone, Debug)]
//! struct Dot(Rect);
//!
//! impl Visual for Dot {
//!     fn compute_bounds(&self) -> Option<Rect> {
//!         Some(self.0)
//!     }
//!     fn render(&self, _ctx: &mut RenderContext<'_>) {}
//!     fn clone_visual(&self) -> Box<dyn Visual> {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! let mut scene = Scene::new();
//! let layer = scene.insert(None, NodeProps::default()).unwrap();
//! let node = scene
//!     .insert(Some(layer), NodeProps::transformed(Affine::translate((50.0, 0.0))))
//!     .unwrap();
//! let dot = scene.insert_visual(Dot(Rect::new(0.0, 0.0, 10.0, 10.0)));
//! scene.set_content(node, Some(Content::Visual(dot))).unwrap();
//!
//! let camera = scene.create_camera(Rect::new(0.0, 0.0, 200.0, 100.0));
//! scene.add_layer(camera, layer).unwrap();
//! let surface = scene.bind_surface(camera, Size::new(200.0, 100.0)).unwrap();
//!
//! assert_eq!(scene.bounds(layer), Some(Rect::new(50.0, 0.0, 60.0, 10.0)));
//! let hit = scene.pick_surface(surface, Point::new(55.0, 5.0), 1.0).unwrap();
//! assert_eq!(hit.and_then(|path| path.node()), Some(node));
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod animation;
mod arena;
mod damage;
mod error;
mod events;
mod find;
mod hit;
mod paint;
mod path;
mod scene;
mod transform;
mod types;
mod util;
mod visual;

#[cfg(test)]
mod test_support;

#[cfg(feature = "std")]
pub use animation::StdClock;
pub use animation::{AnimationStatus, FrameClock, Timing, TransformAnimation};
pub use damage::Damage;
pub use error::{Result, SceneError};
pub use events::SceneEvent;
pub use find::{BoundsFilter, FindFilter, FnFilter, SelectedFilter};
pub use hit::shape_intersects_rect;
pub use paint::{PaintSurface, RenderContext, RenderQuality};
pub use path::{PickTarget, ScenePath};
pub use scene::{CloneContext, Descendants, Scene};
pub use types::{
    CameraId, Decorator, Fade, ListenerId, NodeFlags, NodeId, NodeProps, Rgba, SurfaceId, VisualId,
};
pub use visual::{Content, Visual, downcast_ref, downcast_mut};
