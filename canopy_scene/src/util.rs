// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Rect};

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box in the target space.
pub(crate) fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let min_x = (a * rect.x0).min(a * rect.x1) + (c * rect.y0).min(c * rect.y1);
    let max_x = (a * rect.x0).max(a * rect.x1) + (c * rect.y0).max(c * rect.y1);
    let min_y = (b * rect.x0).min(b * rect.x1) + (d * rect.y0).min(d * rect.y1);
    let max_y = (b * rect.x0).max(b * rect.x1) + (d * rect.y0).max(d * rect.y1);
    Rect::new(min_x + e, min_y + f, max_x + e, max_y + f)
}

/// Union of two possibly-empty bounds.
pub(crate) fn union_bounds(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Intersection of two rectangles, `None` when they do not overlap.
///
/// Touching edges count as overlap so that zero-width content (a vertical
/// line, say) is not culled.
pub(crate) fn overlap(a: Rect, b: Rect) -> Option<Rect> {
    let r = Rect::new(a.x0.max(b.x0), a.y0.max(b.y0), a.x1.min(b.x1), a.y1.min(b.y1));
    (r.x0 <= r.x1 && r.y0 <= r.y1).then_some(r)
}

/// Whether two rectangles overlap (edges inclusive).
pub(crate) fn intersects(a: Rect, b: Rect) -> bool {
    overlap(a, b).is_some()
}

/// Inverse of `affine`, or `None` when it is singular or produces non-finite
/// coefficients.
pub(crate) fn checked_inverse(affine: Affine) -> Option<Affine> {
    let det = affine.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv = affine.inverse();
    inv.is_finite().then_some(inv)
}

/// Uniform magnification of a transform (square root of the absolute
/// determinant), so that rotation does not change it.
pub(crate) fn magnification(affine: Affine) -> f64 {
    affine.determinant().abs().sqrt()
}
