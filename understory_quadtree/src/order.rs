// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-order strategies.
//!
//! A [`DrawOrder`] answers "is `a` drawn before `b`?" for two items, looking at their
//! logical bounds and z-index. Different layouts want different painter's orderings:
//! top-down maps sort by rows, side-scrollers by columns, isometric scenes by
//! bottom edge or by distance from the origin. [`Axes`] flips individual
//! comparisons without needing a new order.
//!
//! The tree keeps its draw-ordered list sorted incrementally with the active order.
//! After changing the order or the axes call
//! [`QuadTree::reorder_items`](crate::QuadTree::reorder_items).

use kurbo::Rect;

use crate::types::Item;

/// Caller-supplied ordering: returns true if the first item is drawn before the second.
///
/// Arguments are the logical bounds of both items followed by the items themselves.
/// The function must be a consistent strict order across calls.
pub type OrderFn = fn(a: &Rect, b: &Rect, p: &Item, q: &Item) -> bool;

/// Axis polarity. An inverted axis reverses the comparison along it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Axes {
    /// Reverse x comparisons.
    pub invert_x: bool,
    /// Reverse y comparisons.
    pub invert_y: bool,
    /// Reverse z-index comparisons.
    pub invert_z: bool,
}

/// Built-in draw orders plus an escape hatch.
#[derive(Copy, Clone, Debug, Default)]
pub enum DrawOrder {
    /// By z-index, then top edge, then left edge.
    #[default]
    RowMajor,
    /// By z-index, then left edge, then top edge.
    ColumnMajor,
    /// By z-index, then `center.x + center.y`.
    Manhattan,
    /// By z-index, then bottom edge, ties broken by left edge.
    BottomEdge,
    /// By `top edge + z-index`, a single folded key.
    TopEdgeLayered,
    /// By `left edge + z-index`, a single folded key.
    LeftEdgeLayered,
    /// By `right edge + z-index`, a single folded key.
    RightEdgeLayered,
    /// Caller-supplied ordering. [`Axes`] are not applied.
    Custom(OrderFn),
}

impl DrawOrder {
    /// True if the item `p` with logical bounds `a` is drawn before `q` with logical bounds `b`.
    pub fn before(&self, a: &Rect, b: &Rect, p: &Item, q: &Item, axes: Axes) -> bool {
        let z = f64::from(p.z_index);
        let w = f64::from(q.z_index);
        match self {
            Self::RowMajor => tiered(p, q, axes, || {
                lt(a.y0, b.y0, axes.invert_y)
                    || (a.y0 == b.y0 && lt(a.x0, b.x0, axes.invert_x))
            }),
            Self::ColumnMajor => tiered(p, q, axes, || {
                lt(a.x0, b.x0, axes.invert_x)
                    || (a.x0 == b.x0 && lt(a.y0, b.y0, axes.invert_y))
            }),
            Self::Manhattan => tiered(p, q, axes, || {
                let ca = a.center();
                let cb = b.center();
                ca.x + ca.y < cb.x + cb.y
            }),
            Self::BottomEdge => tiered(p, q, axes, || {
                lt(a.y1, b.y1, axes.invert_y) || (a.y1 == b.y1 && ((a.x0 <= b.x0) ^ axes.invert_x))
            }),
            Self::TopEdgeLayered => lt(a.y0 + z, b.y0 + w, axes.invert_y),
            Self::LeftEdgeLayered => lt(a.x0 + z, b.x0 + w, axes.invert_x),
            Self::RightEdgeLayered => lt(a.x1 + z, b.x1 + w, axes.invert_x),
            Self::Custom(f) => f(a, b, p, q),
        }
    }

    /// Whether switching from `self` to `other` leaves the ordering unchanged.
    ///
    /// Custom orders are never considered the same, since function pointers
    /// cannot be compared reliably.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(_), _) | (_, Self::Custom(_)) => false,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

#[inline]
fn lt(a: f64, b: f64, invert: bool) -> bool {
    (a < b) ^ invert
}

/// Z-index first; `spatial` only breaks ties between equal layers.
#[inline]
fn tiered(p: &Item, q: &Item, axes: Axes, spatial: impl FnOnce() -> bool) -> bool {
    if p.z_index != q.z_index {
        return (p.z_index < q.z_index) ^ axes.invert_z;
    }
    spatial()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(x: f64, y: f64, z: i32) -> Item {
        Item {
            bounds: Rect::new(x, y, x + 10.0, y + 10.0),
            z_index: z,
            ..Default::default()
        }
    }

    fn before(order: DrawOrder, p: &Item, q: &Item, axes: Axes) -> bool {
        order.before(&p.logical(), &q.logical(), p, q, axes)
    }

    #[test]
    fn row_major_sorts_rows_then_columns() {
        let a = item(50.0, 0.0, 0);
        let b = item(0.0, 10.0, 0);
        let c = item(10.0, 10.0, 0);
        let axes = Axes::default();
        assert!(before(DrawOrder::RowMajor, &a, &b, axes));
        assert!(before(DrawOrder::RowMajor, &b, &c, axes));
        assert!(!before(DrawOrder::RowMajor, &c, &b, axes));
        assert!(before(DrawOrder::ColumnMajor, &b, &a, axes));
    }

    #[test]
    fn z_index_is_primary_tier() {
        let low = item(100.0, 100.0, 0);
        let high = item(0.0, 0.0, 1);
        let axes = Axes::default();
        for order in [
            DrawOrder::RowMajor,
            DrawOrder::ColumnMajor,
            DrawOrder::Manhattan,
            DrawOrder::BottomEdge,
        ] {
            assert!(before(order, &low, &high, axes), "{order:?}");
            assert!(!before(order, &high, &low, axes), "{order:?}");
        }
        let inverted = Axes {
            invert_z: true,
            ..Default::default()
        };
        assert!(before(DrawOrder::RowMajor, &high, &low, inverted));
    }

    #[test]
    fn inverted_z_keeps_spatial_tiebreak() {
        let a = item(0.0, 0.0, 3);
        let b = item(0.0, 20.0, 3);
        let axes = Axes {
            invert_z: true,
            ..Default::default()
        };
        assert!(before(DrawOrder::RowMajor, &a, &b, axes));
        assert!(!before(DrawOrder::RowMajor, &b, &a, axes));
    }

    #[test]
    fn layered_orders_fold_z_into_coordinate() {
        let a = item(0.0, 0.0, 15);
        let b = item(0.0, 10.0, 0);
        let axes = Axes::default();
        // 0 + 15 > 10 + 0
        assert!(before(DrawOrder::TopEdgeLayered, &b, &a, axes));
        let c = item(0.0, 0.0, 0);
        let d = item(5.0, 0.0, -10);
        assert!(before(DrawOrder::LeftEdgeLayered, &d, &c, axes));
        assert!(before(DrawOrder::RightEdgeLayered, &d, &c, axes));
    }

    #[test]
    fn manhattan_uses_centers() {
        let near = item(0.0, 0.0, 0);
        let far = item(20.0, 20.0, 0);
        assert!(before(DrawOrder::Manhattan, &near, &far, Axes::default()));
    }

    #[test]
    fn bottom_edge_compares_y1() {
        let tall = Item {
            bounds: Rect::new(0.0, 0.0, 10.0, 50.0),
            ..Default::default()
        };
        let short = item(20.0, 20.0, 0);
        assert!(before(DrawOrder::BottomEdge, &short, &tall, Axes::default()));
        let flipped = Axes {
            invert_y: true,
            ..Default::default()
        };
        assert!(before(DrawOrder::BottomEdge, &tall, &short, flipped));
    }

    #[test]
    fn custom_order_is_called_and_never_same() {
        fn by_kind(_: &Rect, _: &Rect, p: &Item, q: &Item) -> bool {
            p.kind < q.kind
        }
        let mut a = item(0.0, 0.0, 0);
        let mut b = item(0.0, 0.0, 0);
        a.kind = 2;
        b.kind = 1;
        let order = DrawOrder::Custom(by_kind);
        assert!(before(order, &b, &a, Axes::default()));
        assert!(!order.same_as(&order));
        assert!(DrawOrder::RowMajor.same_as(&DrawOrder::RowMajor));
        assert!(!DrawOrder::RowMajor.same_as(&DrawOrder::Manhattan));
    }
}
