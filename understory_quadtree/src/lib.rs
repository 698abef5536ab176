// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_quadtree --heading-base-level=0

//! Understory Quadtree: a Kurbo-native region quadtree for movable 2D items.
//!
//! Understory Quadtree is a building block for scenes with many moving rectangles: sprites in
//! a 2D game, shapes on a canvas, markers on a map.
//!
//! - Files each item into every leaf its bounds touch. Leaves split into quadrants when full.
//! - Keeps attached items in a draw-ordered list driven by a pluggable [`DrawOrder`].
//! - Marks items touching a region and hands them back in draw order ([`QuadTree::select_items`]).
//! - Finds overlapping pairs incrementally: only leaves changed since the last sweep are
//!   re-examined, and the [`CollisionHandler`] may move, remove, or dispose items mid-sweep.
//! - Queues moved items so the caller can acknowledge positions in one batch ([`QuadTree::update`]).
//!
//! Items are owned by the tree and addressed by generational [`ItemId`]s. Each carries a caller
//! payload `P`. An item may be created detached, attached and detached repeatedly, and is freed
//! with [`QuadTree::dispose`], after which its id no longer resolves.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_quadtree::{CollisionHandler, Item, ItemId, QuadTree, TreeConfig};
//!
//! let mut tree = QuadTree::new(TreeConfig::new(Rect::new(0.0, 0.0, 256.0, 256.0))).unwrap();
//! let player = tree.insert(Item::new(Rect::new(10.0, 10.0, 20.0, 20.0)), "player").unwrap();
//! let coin = tree.insert(Item::new(Rect::new(40.0, 10.0, 45.0, 15.0)), "coin").unwrap();
//!
//! // Collect coins by disposing them on contact.
//! struct Pickup(u32);
//! impl CollisionHandler<&'static str> for Pickup {
//!     fn on_collision(&mut self, tree: &mut QuadTree<&'static str>, a: ItemId, b: ItemId, _: &mut ()) {
//!         for id in [a, b] {
//!             if tree.payload(id) == Some(&"coin") {
//!                 tree.dispose(id);
//!                 self.0 += 1;
//!             }
//!         }
//!     }
//! }
//!
//! // Move the player onto the coin and sweep.
//! tree.move_item(player, Rect::new(35.0, 8.0, 45.0, 18.0));
//! let mut pickup = Pickup(0);
//! let report = tree.detect_collisions(&mut pickup, &mut ());
//! assert!(report.converged);
//! assert_eq!(pickup.0, 1);
//! assert!(!tree.is_alive(coin));
//!
//! // Acknowledge the move.
//! assert_eq!(tree.update(), 1);
//! assert_eq!(tree.last_bounds(player), Some(Rect::new(35.0, 8.0, 45.0, 18.0)));
//!
//! // Everything in the top-left corner, in draw order.
//! tree.select_items(Rect::new(0.0, 0.0, 64.0, 64.0));
//! assert_eq!(tree.selected().collect::<Vec<_>>(), vec![player]);
//! ```
//!
//! ## Geometry
//!
//! Rectangles are [`kurbo::Rect`]. All overlap tests are inclusive: rectangles that only share an
//! edge or a corner count as touching. Items carry optional logical bounds, a sub-rectangle used
//! for collisions and draw ordering while the full bounds decide placement.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]. Warnings cover leaves too small to split, logical bounds
//! outside physical bounds, and collision sweeps that did not settle within
//! [`TreeConfig::max_sweep_passes`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod handler;
mod layers;
mod list;
mod node;
mod order;
mod tree;
mod types;
mod util;

pub use config::{
    ConfigError, DEFAULT_MAX_SWEEP_PASSES, DEFAULT_MIN_SPLIT_SIZE, DEFAULT_NODE_CAPACITY,
    TreeConfig,
};
pub use handler::{CollisionHandler, FnHandler, handler_fn};
pub use layers::Layers;
pub use list::{Link, List};
pub use node::Leaf;
pub use order::{Axes, DrawOrder, OrderFn};
pub use tree::{QuadTree, Selected, SweepReport};
pub use types::{Item, ItemFlags, ItemId};
