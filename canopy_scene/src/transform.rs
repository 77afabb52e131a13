// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform capability: an affine matrix with a lazily computed inverse.

use kurbo::Affine;

use crate::util::checked_inverse;

/// An owned local transform plus its dirty-flagged inverse.
///
/// The inverse is recomputed on first use after every change. A singular
/// matrix is kept as set; the failure is logged once per change and the
/// inverse reads as `None` until a new matrix is installed.
#[derive(Clone, Debug)]
pub(crate) struct TransformState {
    affine: Affine,
    inverse: Option<Affine>,
    inverse_dirty: bool,
}

impl TransformState {
    pub(crate) fn new(affine: Affine) -> Self {
        Self {
            affine,
            inverse: None,
            inverse_dirty: true,
        }
    }

    #[inline]
    pub(crate) fn affine(&self) -> Affine {
        self.affine
    }

    /// Install a new matrix, returning the previous one.
    pub(crate) fn set(&mut self, affine: Affine) -> Affine {
        let old = self.affine;
        self.affine = affine;
        self.inverse_dirty = true;
        old
    }

    pub(crate) fn inverse(&mut self) -> Option<Affine> {
        if self.inverse_dirty {
            self.inverse = checked_inverse(self.affine);
            self.inverse_dirty = false;
            if self.inverse.is_none() {
                log::warn!("non-invertible transform {:?}", self.affine.as_coeffs());
            }
        }
        self.inverse
    }
}

/// Post-multiply: `at` acts inside the current local space, before `m`.
#[inline]
pub(crate) fn concatenate(m: Affine, at: Affine) -> Affine {
    m * at
}

/// Pre-multiply: `at` acts above the current transform, after `m`.
#[inline]
pub(crate) fn pre_concatenate(m: Affine, at: Affine) -> Affine {
    at * m
}

/// Per-coefficient linear interpolation between two matrices.
///
/// This is intentionally not a decomposition into rotation, scale, and
/// translation: each of the six coefficients moves independently.
pub(crate) fn lerp_coeffs(from: Affine, to: Affine, t: f64) -> Affine {
    let a = from.as_coeffs();
    let b = to.as_coeffs();
    let mut out = [0.0; 6];
    for (i, o) in out.iter_mut().enumerate() {
        *o = a[i] + (b[i] - a[i]) * t;
    }
    Affine::new(out)
}
