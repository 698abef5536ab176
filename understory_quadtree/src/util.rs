// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Rect;

/// Inclusive overlap test: rectangles that only touch along an edge or a corner intersect.
#[inline]
pub(crate) fn intersects(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Whether `inner` lies entirely inside `outer` (edges inclusive).
#[inline]
pub(crate) fn contains_rect(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Split `r` at its center into top-left, top-right, bottom-left, bottom-right.
pub(crate) fn quadrants(r: &Rect) -> [Rect; 4] {
    let cx = 0.5 * (r.x0 + r.x1);
    let cy = 0.5 * (r.y0 + r.y1);
    [
        Rect::new(r.x0, r.y0, cx, cy),
        Rect::new(cx, r.y0, r.x1, cy),
        Rect::new(r.x0, cy, cx, r.y1),
        Rect::new(cx, cy, r.x1, r.y1),
    ]
}
