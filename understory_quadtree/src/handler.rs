// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision handler seam used by [`QuadTree::detect_collisions`](crate::QuadTree::detect_collisions).
//!
//! The tree only reports which pairs overlap. What a collision means, and how it is
//! resolved, is up to the handler. Handlers receive the tree mutably and may add,
//! remove, move, or dispose items (including the two being reported); the sweep
//! re-validates its position after every callback.

use crate::tree::QuadTree;
use crate::types::ItemId;

/// Receives overlapping pairs during a collision sweep.
///
/// `C` is a caller-chosen context threaded through every call unchanged.
pub trait CollisionHandler<P, C = ()> {
    /// Return false to exclude `item` from the current sweep. Called for both members of a
    /// candidate pair, possibly many times per sweep.
    fn filter(&mut self, tree: &QuadTree<P>, item: ItemId, context: &mut C) -> bool {
        let _ = (tree, item, context);
        true
    }

    /// Called once per overlapping pair found in a leaf.
    ///
    /// The same unordered pair may be reported again in a later pass if the handler keeps
    /// changing the tree, or once per shared leaf when both items straddle several leaves.
    fn on_collision(&mut self, tree: &mut QuadTree<P>, a: ItemId, b: ItemId, context: &mut C);
}

/// Adapter turning a closure into a [`CollisionHandler`] that accepts every item.
///
/// ```
/// use kurbo::Rect;
/// use understory_quadtree::{Item, ItemId, QuadTree, TreeConfig, handler_fn};
///
/// let mut tree = QuadTree::<u32>::new(TreeConfig::new(Rect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
/// tree.insert(Item::new(Rect::new(0.0, 0.0, 10.0, 10.0)), 1).unwrap();
/// tree.insert(Item::new(Rect::new(5.0, 5.0, 15.0, 15.0)), 2).unwrap();
///
/// let mut hits = 0;
/// let mut handler = handler_fn(|_: &mut QuadTree<u32>, _: ItemId, _: ItemId, hits: &mut u32| {
///     *hits += 1;
/// });
/// tree.detect_collisions(&mut handler, &mut hits);
/// assert_eq!(hits, 1);
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler(f)
}

/// See [`handler_fn`].
#[derive(Clone, Copy, Debug)]
pub struct FnHandler<F>(F);

impl<P, C, F> CollisionHandler<P, C> for FnHandler<F>
where
    F: FnMut(&mut QuadTree<P>, ItemId, ItemId, &mut C),
{
    fn on_collision(&mut self, tree: &mut QuadTree<P>, a: ItemId, b: ItemId, context: &mut C) {
        (self.0)(tree, a, b, context);
    }
}
