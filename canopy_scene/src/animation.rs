// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform animation.
//!
//! [`TransformAnimation`] is steppable: the host calls
//! [`step`](TransformAnimation::step) once per frame with the elapsed time and
//! drops the value to cancel. [`Scene::animate_transform`] wraps the same
//! stepping in a loop that blocks the caller until the target is reached.

use core::time::Duration;

use kurbo::Affine;

use crate::error::Result;
use crate::scene::Scene;
use crate::transform::lerp_coeffs;
use crate::types::NodeId;

/// Remapping of normalized time `t ∈ [0, 1]` before interpolation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Timing {
    /// `t` unchanged.
    Linear,
    /// Accelerate through the first half, decelerate through the second.
    #[default]
    SlowInSlowOut,
    /// Any monotone mapping of `[0, 1]` onto itself.
    Custom(fn(f64) -> f64),
}

impl Timing {
    /// Remap `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SlowInSlowOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = 1.0 - t;
                    1.0 - 2.0 * u * u
                }
            }
            Self::Custom(f) => f(t),
        }
    }
}

/// Whether an animation has more frames to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationStatus {
    /// Call `step` again.
    Running,
    /// The node holds the target matrix exactly.
    Finished,
}

/// Interpolates a node's transform from its current matrix to a target.
#[derive(Clone, Copy, Debug)]
pub struct TransformAnimation {
    node: NodeId,
    from: Affine,
    to: Affine,
    duration: Duration,
    timing: Timing,
}

impl TransformAnimation {
    /// Capture the node's current transform as the start matrix.
    pub fn new(scene: &Scene, node: NodeId, to: Affine, duration: Duration) -> Result<Self> {
        let from = scene
            .transform(node)
            .ok_or(crate::SceneError::StaleNode(node))?;
        Ok(Self {
            node,
            from,
            to,
            duration,
            timing: Timing::default(),
        })
    }

    /// Replace the timing function.
    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// The animated node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Apply the frame for `elapsed` time since the animation started.
    pub fn step(&self, scene: &mut Scene, elapsed: Duration) -> Result<AnimationStatus> {
        if elapsed >= self.duration {
            scene.set_transform(self.node, self.to)?;
            return Ok(AnimationStatus::Finished);
        }
        let t = self.timing.apply(elapsed.as_secs_f64() / self.duration.as_secs_f64());
        scene.set_transform(self.node, lerp_coeffs(self.from, self.to, t))?;
        Ok(AnimationStatus::Running)
    }
}

/// A monotonic time source for [`Scene::animate_transform`].
pub trait FrameClock {
    /// Time since an arbitrary fixed origin.
    fn now(&mut self) -> Duration;
}

/// [`FrameClock`] backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl FrameClock for StdClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

impl Scene {
    /// Animate `node` to `target`, blocking until done.
    ///
    /// Each frame sets an interpolated transform and then calls `on_frame`
    /// so the host can paint. A zero duration sets the target immediately.
    pub fn animate_transform(
        &mut self,
        node: NodeId,
        target: Affine,
        duration: Duration,
        clock: &mut dyn FrameClock,
        mut on_frame: impl FnMut(&mut Self),
    ) -> Result<()> {
        let animation = TransformAnimation::new(self, node, target, duration)?;
        let start = clock.now();
        loop {
            let elapsed = clock.now().saturating_sub(start);
            let status = animation.step(self, elapsed)?;
            on_frame(self);
            if status == AnimationStatus::Finished {
                return Ok(());
            }
        }
    }
}
