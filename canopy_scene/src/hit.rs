// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle-against-shape intersection for precise [`Visual::pick`](crate::Visual::pick).

use kurbo::{Line, Point, Rect, Shape};

use crate::util::intersects;

/// Flattening tolerance used when walking shape segments.
const TOLERANCE: f64 = 0.1;

/// Whether the filled interior or the outline of `shape` touches `rect`.
///
/// Works for any [`kurbo::Shape`]: reject on bounding boxes, then accept when
/// the shape covers a probe point of the rectangle, when the rectangle covers
/// the shape, or when a shape segment crosses a rectangle edge.
pub fn shape_intersects_rect<S: Shape>(shape: &S, rect: Rect) -> bool {
    let bounds = shape.bounding_box();
    if !intersects(bounds, rect) {
        return false;
    }
    if rect.x0 <= bounds.x0 && rect.y0 <= bounds.y0 && rect.x1 >= bounds.x1 && rect.y1 >= bounds.y1
    {
        return true;
    }

    let probes = [
        rect.center(),
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    if probes.iter().any(|p| shape.contains(*p)) {
        return true;
    }

    let edges = [
        Line::new(probes[1], probes[2]),
        Line::new(probes[2], probes[3]),
        Line::new(probes[3], probes[4]),
        Line::new(probes[4], probes[1]),
    ];
    shape
        .path_segments(TOLERANCE)
        .any(|seg| edges.iter().any(|edge| !seg.intersect_line(*edge).is_empty()))
}
