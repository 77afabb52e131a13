// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: handles, flags, and per-node capabilities.

use core::fmt;

use kurbo::Affine;

macro_rules! generational_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        pub struct $name(pub(crate) u32, pub(crate) u32);

        impl $name {
            pub(crate) const fn new(idx: u32, generation: u32) -> Self {
                Self(idx, generation)
            }

            pub(crate) const fn idx(self) -> usize {
                self.0 as usize
            }

            /// Returns the raw slot index (for diagnostics only).
            #[inline]
            #[must_use]
            pub const fn index(self) -> u32 {
                self.0
            }

            /// Returns the generation counter of the handle.
            #[inline]
            #[must_use]
            pub const fn generation(self) -> u32 {
                self.1
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}@gen{})", stringify!($name), self.0, self.1)
            }
        }
    };
}

generational_id!(
    /// Identifier for a node in a [`Scene`](crate::Scene) (generational).
    NodeId
);

generational_id!(
    /// Identifier for a visual component registered with a [`Scene`](crate::Scene).
    ///
    /// A visual component may be the content of several nodes at once.
    VisualId
);

generational_id!(
    /// Identifier for a camera owned by a [`Scene`](crate::Scene).
    CameraId
);

generational_id!(
    /// Identifier for an output surface bound to a camera.
    SurfaceId
);

/// Identifier returned when registering a change listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(pub(crate) u64);

bitflags::bitflags! {
    /// Node flags controlling visibility, picking, searching, and bounds caching.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (participates in rendering and picking).
        const VISIBLE           = 0b0000_0001;
        /// The node's own content participates in picking.
        const PICKABLE          = 0b0000_0010;
        /// Descendants participate in picking.
        ///
        /// When clear, the node itself is reported whenever a descendant would
        /// have been hit.
        const CHILDREN_PICKABLE = 0b0000_0100;
        /// The node can be accepted by a find query.
        const FINDABLE          = 0b0000_1000;
        /// Descendants are searched by find queries.
        ///
        /// When clear, the node itself is reported whenever a descendant would
        /// have been accepted.
        const CHILDREN_FINDABLE = 0b0001_0000;
        /// Bounds are recomputed on every read instead of being cached.
        const VOLATILE          = 0b0010_0000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
            | Self::PICKABLE
            | Self::CHILDREN_PICKABLE
            | Self::FINDABLE
            | Self::CHILDREN_FINDABLE
    }
}

/// Straight-alpha RGBA color handed opaquely to the paint surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
    /// Opaque white.
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
}

/// Alpha and magnification-range capability ("fade group").
///
/// A node with a fade is composited with `alpha` and is only rendered and
/// picked while the accumulated camera magnification lies within
/// `min_magnification..=max_magnification`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    /// Opacity in `0.0..=1.0`, multiplied with the inherited alpha.
    pub alpha: f32,
    /// Smallest magnification at which the subtree is shown.
    pub min_magnification: f64,
    /// Largest magnification at which the subtree is shown.
    pub max_magnification: f64,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            min_magnification: 0.0,
            max_magnification: f64::INFINITY,
        }
    }
}

impl Fade {
    /// A fade that only changes opacity.
    pub fn alpha(alpha: f32) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }

    /// Whether the subtree is shown at `magnification`.
    pub fn shows_at(&self, magnification: f64) -> bool {
        magnification >= self.min_magnification && magnification <= self.max_magnification
    }
}

/// Kind of single-child decorator a node acts as.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decorator {
    /// A plain wrapper with no visual effect of its own.
    Plain,
    /// Marks its child as selected and strokes the child's bounds on top.
    Selection {
        /// Outline color.
        color: Rgba,
        /// Outline width in the decorator's local units.
        width: f64,
    },
}

impl Decorator {
    /// A selection decorator with the default outline.
    pub fn selection() -> Self {
        Self::Selection {
            color: Rgba([0.2, 0.4, 1.0, 1.0]),
            width: 1.0,
        }
    }
}

/// Insertion-time description of a node's capabilities.
///
/// A node's "kind" is the set of capabilities present here rather than a
/// position in a type hierarchy: a node with a `transform` acts as a
/// transform group, one with a `fade` composites with alpha, one with a
/// `decorator` accepts at most one child.
#[derive(Clone, Debug, Default)]
pub struct NodeProps {
    /// Local transform relative to the parent. `None` means the node has no
    /// transform capability (identity, and no inverse cache is kept).
    pub transform: Option<Affine>,
    /// Optional alpha/magnification capability.
    pub fade: Option<Fade>,
    /// Optional single-child decorator capability.
    pub decorator: Option<Decorator>,
    /// Visibility, picking, find, and volatility flags.
    pub flags: NodeFlags,
}

impl NodeProps {
    /// Properties for a transform group with the given transform.
    pub fn transformed(transform: Affine) -> Self {
        Self {
            transform: Some(transform),
            ..Self::default()
        }
    }

    /// Properties for a plain single-child decorator.
    pub fn decorator() -> Self {
        Self {
            decorator: Some(Decorator::Plain),
            ..Self::default()
        }
    }
}
