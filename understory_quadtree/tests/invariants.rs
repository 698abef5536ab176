// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized checks of the structural invariants: leaf membership, add/remove round-trips,
//! and draw order.

use kurbo::Rect;
use proptest::prelude::*;
use understory_quadtree::{Axes, DrawOrder, Item, ItemFlags, ItemId, QuadTree, TreeConfig};

const EXTENTS: Rect = Rect::new(0.0, 0.0, 256.0, 256.0);

#[derive(Clone, Debug)]
enum Op {
    Insert(Rect, i32),
    Move(usize, Rect),
    Remove(usize),
    Add(usize),
    Dispose(usize),
    Update,
}

fn rect() -> impl Strategy<Value = Rect> {
    // Reaches past the extents so some moves leave the tree.
    (0.0..300.0_f64, 0.0..300.0_f64, 1.0..40.0_f64, 1.0..40.0_f64)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (rect(), -2..3_i32).prop_map(|(r, z)| Op::Insert(r, z)),
        3 => (any::<usize>(), rect()).prop_map(|(i, r)| Op::Move(i, r)),
        1 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::Add),
        1 => any::<usize>().prop_map(Op::Dispose),
        1 => Just(Op::Update),
    ]
}

fn new_tree(capacity: usize) -> QuadTree<u32> {
    QuadTree::new(TreeConfig {
        node_capacity: capacity,
        // Keeps heavily overlapping runs from subdividing down to sub-pixel leaves.
        min_split_size: 32.0,
        ..TreeConfig::new(EXTENTS)
    })
    .unwrap()
}

fn touches(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn apply(tree: &mut QuadTree<u32>, ids: &mut Vec<ItemId>, op: &Op) {
    let pick = |i: usize, ids: &[ItemId]| (!ids.is_empty()).then(|| ids[i % ids.len()]);
    match *op {
        Op::Insert(r, z) => {
            let item = Item {
                z_index: z,
                ..Item::new(r)
            };
            if let Some(id) = tree.insert(item, u32::try_from(ids.len()).unwrap()) {
                ids.push(id);
            }
        }
        Op::Move(i, r) => {
            if let Some(id) = pick(i, ids) {
                tree.move_item(id, r);
            }
        }
        Op::Remove(i) => {
            if let Some(id) = pick(i, ids) {
                tree.remove_item(id);
            }
        }
        Op::Add(i) => {
            if let Some(id) = pick(i, ids) {
                tree.add_item(id);
            }
        }
        Op::Dispose(i) => {
            if let Some(id) = pick(i, ids) {
                tree.dispose(id);
            }
        }
        Op::Update => {
            tree.update();
        }
    }
}

fn before(tree: &QuadTree<u32>, p: ItemId, q: ItemId) -> bool {
    let a = tree.item(p).unwrap();
    let b = tree.item(q).unwrap();
    tree.draw_order()
        .before(&a.logical(), &b.logical(), a, b, tree.axes())
}

fn check(tree: &QuadTree<u32>, ids: &[ItemId]) -> Result<(), TestCaseError> {
    let leaves = tree.leaves();
    let mut total = 0;
    let mut attached = 0;
    for &id in ids {
        if !tree.is_alive(id) {
            prop_assert_eq!(tree.membership(id), 0);
            continue;
        }
        let holding = leaves.iter().filter(|l| l.items.contains(&id)).count();
        prop_assert_eq!(holding, tree.membership(id));
        if tree.flags(id).unwrap().contains(ItemFlags::ATTACHED) {
            attached += 1;
            let filed = tree.insertion_bounds(id).unwrap();
            let touching = leaves.iter().filter(|l| touches(&l.extents, &filed)).count();
            prop_assert_eq!(touching, holding, "item {:?} filed at {:?}", id, filed);
        } else {
            prop_assert_eq!(holding, 0);
        }
        total += holding;
    }
    prop_assert_eq!(total, leaves.iter().map(|l| l.items.len()).sum::<usize>());
    prop_assert_eq!(attached, tree.len());

    let ordered: Vec<_> = tree.ordered_items().collect();
    prop_assert_eq!(ordered.len(), tree.len());
    for pair in ordered.windows(2) {
        prop_assert!(!before(tree, pair[1], pair[0]), "out of order: {:?}", pair);
    }
    Ok(())
}

proptest! {
    #[test]
    fn membership_matches_leaves(ops in prop::collection::vec(op(), 1..60), capacity in 1..6_usize) {
        let mut tree = new_tree(capacity);
        let mut ids = Vec::new();
        for op in &ops {
            apply(&mut tree, &mut ids, op);
            check(&tree, &ids)?;
        }
    }

    #[test]
    fn add_then_remove_round_trips(
        setup in prop::collection::vec(rect(), 0..40),
        probe in rect(),
    ) {
        let mut tree = new_tree(4);
        for (i, r) in setup.iter().enumerate() {
            tree.insert(Item::new(*r), u32::try_from(i).unwrap());
        }
        let leaves = tree.leaves();
        let ordered: Vec<_> = tree.ordered_items().collect();

        let id = tree.create(Item::new(probe), 999);
        let added = tree.add_item(id);
        let split = tree.leaves().len() != leaves.len();
        prop_assert!(tree.remove_item(id));
        prop_assert_eq!(tree.membership(id), 0);
        prop_assert_eq!(tree.ordered_items().collect::<Vec<_>>(), ordered);
        // Splits are not undone; without one the structure must match exactly.
        if !added || !split {
            prop_assert_eq!(tree.leaves(), leaves);
        }
    }

    #[test]
    fn reorder_sorts_under_active_order(
        ops in prop::collection::vec(op(), 1..80),
        order in prop_oneof![
            Just(DrawOrder::RowMajor),
            Just(DrawOrder::ColumnMajor),
            Just(DrawOrder::Manhattan),
            Just(DrawOrder::TopEdgeLayered),
            Just(DrawOrder::LeftEdgeLayered),
            Just(DrawOrder::RightEdgeLayered),
        ],
    ) {
        let mut tree = new_tree(4);
        let mut ids = Vec::new();
        for op in &ops {
            apply(&mut tree, &mut ids, op);
        }
        tree.set_draw_order(order);
        tree.set_axes(Axes::default());
        tree.reorder_items();
        check(&tree, &ids)?;
    }

    #[test]
    fn acknowledging_an_empty_queue_is_a_no_op(ops in prop::collection::vec(op(), 0..60)) {
        let mut tree = new_tree(4);
        let mut ids = Vec::new();
        for op in &ops {
            apply(&mut tree, &mut ids, op);
        }
        tree.update();
        let before: Vec<_> = ids.iter().map(|id| (tree.last_bounds(*id), tree.flags(*id))).collect();
        prop_assert_eq!(tree.update(), 0);
        let after: Vec<_> = ids.iter().map(|id| (tree.last_bounds(*id), tree.flags(*id))).collect();
        prop_assert_eq!(before, after);
    }
}
