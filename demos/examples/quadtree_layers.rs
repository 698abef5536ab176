// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree layers.
//!
//! Terrain, props, and an overlay in separate trees over one map. Hiding a layer removes it
//! from the visible list without touching its items.
//!
//! Run:
//! - `cargo run -p understory_demos --example quadtree_layers`

use kurbo::Rect;
use understory_quadtree::{Item, ItemFlags, Layers, TreeConfig};

const TERRAIN: usize = 0;
const PROPS: usize = 1;
const OVERLAY: usize = 2;

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();

    let mut layers = Layers::new(3, &TreeConfig::new(Rect::new(0.0, 0.0, 256.0, 256.0))).unwrap();

    let terrain = layers.layer_mut(TERRAIN).unwrap();
    for ty in 0..8 {
        for tx in 0..8 {
            let (x, y) = (f64::from(tx) * 32.0, f64::from(ty) * 32.0);
            terrain.insert(Item::new(Rect::new(x, y, x + 32.0, y + 32.0)), format!("tile {tx},{ty}"));
        }
    }

    let props = layers.layer_mut(PROPS).unwrap();
    props.insert(Item::new(Rect::new(40.0, 40.0, 56.0, 72.0)), "lamp".to_string());
    props.insert(Item::new(Rect::new(100.0, 20.0, 140.0, 60.0)), "crate".to_string());

    // The HUD is drawn whatever region is on screen.
    let overlay = layers.layer_mut(OVERLAY).unwrap();
    overlay.insert(
        Item {
            flags: ItemFlags::ALWAYS_SELECT,
            ..Item::new(Rect::new(0.0, 0.0, 256.0, 16.0))
        },
        "hud".to_string(),
    );

    let view = Rect::new(30.0, 30.0, 70.0, 70.0);
    print_visible(&mut layers, view);

    layers.layer_mut(TERRAIN).unwrap().set_visible(false);
    println!("-- terrain hidden --");
    print_visible(&mut layers, view);
}

fn print_visible(layers: &mut Layers<String>, view: Rect) {
    for (layer, id) in layers.visible_items(view) {
        let name = layers.layer(layer).unwrap().payload(id).unwrap();
        println!("layer {layer}: {name}");
    }
}
