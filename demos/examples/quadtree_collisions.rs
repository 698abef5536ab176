// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree collisions.
//!
//! Bouncing boxes: each frame moves every box, then an incremental sweep pushes overlapping
//! pairs apart and removes boxes that were hit too often.
//!
//! Run:
//! - `cargo run -p understory_demos --example quadtree_collisions`

use kurbo::{Rect, Vec2};
use understory_quadtree::{CollisionHandler, Item, ItemId, QuadTree, TreeConfig};

struct Ball {
    velocity: Vec2,
    hits: u32,
}

#[derive(Default)]
struct Stats {
    collisions: u32,
    removed: u32,
}

struct Bounce;

impl CollisionHandler<Ball, Stats> for Bounce {
    fn on_collision(&mut self, tree: &mut QuadTree<Ball>, a: ItemId, b: ItemId, stats: &mut Stats) {
        stats.collisions += 1;
        for id in [a, b] {
            let Some(ball) = tree.payload_mut(id) else {
                continue;
            };
            ball.velocity = -ball.velocity;
            ball.hits += 1;
            let step = ball.velocity;
            if ball.hits > 3 {
                tree.dispose(id);
                stats.removed += 1;
                continue;
            }
            let bounds = tree.item(id).unwrap().bounds;
            tree.move_item(id, bounds + step);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();

    let extents = Rect::new(0.0, 0.0, 512.0, 512.0);
    let mut tree = QuadTree::new(TreeConfig::new(extents)).unwrap();
    let mut seed = 0x9E37_79B9_u32;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        f64::from(seed % 1000) / 1000.0
    };
    for _ in 0..200 {
        let x = next() * 480.0;
        let y = next() * 480.0;
        let ball = Ball {
            velocity: Vec2::new(next() * 8.0 - 4.0, next() * 8.0 - 4.0),
            hits: 0,
        };
        tree.insert(Item::new(Rect::new(x, y, x + 12.0, y + 12.0)), ball);
    }

    for frame in 0..20 {
        let ids: Vec<ItemId> = tree.ordered_items().collect();
        for id in ids {
            let step = tree.payload(id).unwrap().velocity;
            let bounds = tree.item(id).unwrap().bounds;
            // Boxes leaving the extents are disposed by the tree.
            tree.move_item(id, bounds + step);
        }
        let mut stats = Stats::default();
        let report = tree.detect_collisions(&mut Bounce, &mut stats);
        let moved = tree.update();
        println!(
            "frame {frame:2}: {} boxes, {moved} moved, {} collisions, {} removed, {} passes{}",
            tree.len(),
            stats.collisions,
            stats.removed,
            report.passes,
            if report.converged { "" } else { " (unresolved)" },
        );
    }
}
