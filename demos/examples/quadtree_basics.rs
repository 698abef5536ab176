// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree basics.
//!
//! Fill a tree until it splits, move an item across a quadrant boundary, acknowledge the move,
//! and list what is visible in a region in draw order.
//!
//! Run:
//! - `cargo run -p understory_demos --example quadtree_basics`

use kurbo::Rect;
use understory_quadtree::{DrawOrder, Item, QuadTree, TreeConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut tree = QuadTree::new(TreeConfig {
        node_capacity: 4,
        ..TreeConfig::new(Rect::new(0.0, 0.0, 400.0, 300.0))
    })
    .unwrap();

    let names = ["tree", "rock", "house", "well", "cart", "fence"];
    let mut ids = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let x = 30.0 + i as f64 * 60.0;
        let y = 40.0 + (i % 3) as f64 * 70.0;
        ids.push(tree.insert(Item::new(Rect::new(x, y, x + 40.0, y + 40.0)), *name).unwrap());
    }
    println!("{tree:?}");
    for leaf in tree.leaves() {
        let items: Vec<_> = leaf.items.iter().map(|id| *tree.payload(*id).unwrap()).collect();
        println!("leaf {:?}: {:?}", leaf.extents, items);
    }

    // The cart rolls into the bottom-left quadrant.
    let cart = ids[4];
    tree.move_item(cart, Rect::new(60.0, 220.0, 100.0, 260.0));
    println!(
        "cart: last acknowledged {:?}, filed at {:?}, in {} leaves",
        tree.last_bounds(cart).unwrap(),
        tree.insertion_bounds(cart).unwrap(),
        tree.membership(cart)
    );
    println!("acknowledged {} moves", tree.update());

    for order in [DrawOrder::RowMajor, DrawOrder::BottomEdge, DrawOrder::Manhattan] {
        tree.set_draw_order(order);
        tree.reorder_items();
        tree.select_items(Rect::new(0.0, 0.0, 200.0, 300.0));
        let selected: Vec<_> = tree.selected().collect();
        let visible: Vec<_> = selected.iter().map(|id| *tree.payload(*id).unwrap()).collect();
        println!("{order:?}: {visible:?}");
    }
}
