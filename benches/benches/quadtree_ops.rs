// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use understory_quadtree::{DrawOrder, Item, ItemId, QuadTree, TreeConfig, handler_fn};

const WORLD: f64 = 2048.0;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn config(capacity: usize) -> TreeConfig {
    TreeConfig {
        node_capacity: capacity,
        ..TreeConfig::new(Rect::new(0.0, 0.0, WORLD, WORLD))
    }
}

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Rect::new(x0, y0, x0 + cell * 0.8, y0 + cell * 0.8));
        }
    }
    out
}

fn gen_random_rects(count: usize, size: f64, seed: u64) -> Vec<Rect> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * (WORLD - size);
            let y0 = rng.next_f64() * (WORLD - size);
            Rect::new(x0, y0, x0 + size, y0 + size)
        })
        .collect()
}

fn build(rects: &[Rect], capacity: usize) -> (QuadTree<u32>, Vec<ItemId>) {
    let mut tree = QuadTree::new(config(capacity)).unwrap();
    let ids = rects
        .iter()
        .enumerate()
        .filter_map(|(i, r)| tree.insert(Item::new(*r), i as u32))
        .collect();
    (tree, ids)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, WORLD / n as f64);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter_batched(
                || QuadTree::<u32>::new(config(16)).unwrap(),
                |mut tree| {
                    for (i, r) in rects.iter().enumerate() {
                        let _ = tree.insert(Item::new(*r), i as u32);
                    }
                    black_box(tree.len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let rects = gen_random_rects(4096, 24.0, 0xCAFE_F00D_DEAD_BEEF);
    for &capacity in &[4usize, 16, 64] {
        group.bench_function(format!("random_4096_cap{}", capacity), |b| {
            b.iter_batched(
                || QuadTree::<u32>::new(config(capacity)).unwrap(),
                |mut tree| {
                    for (i, r) in rects.iter().enumerate() {
                        let _ = tree.insert(Item::new(*r), i as u32);
                    }
                    black_box(tree.len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_move_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_update");
    let rects = gen_random_rects(4096, 16.0, 0xBADC_F00D_1234_5678);
    group.throughput(Throughput::Elements(rects.len() as u64));
    group.bench_function("jitter_all_then_update", |b| {
        b.iter_batched(
            || build(&rects, 16),
            |(mut tree, ids)| {
                for (j, id) in ids.iter().enumerate() {
                    let dx = (j % 5) as f64 - 2.0;
                    let dy = ((j * 7) % 5) as f64 - 2.0;
                    let r = rects[j];
                    tree.move_item(*id, Rect::new(r.x0 + dx, r.y0 + dy, r.x1 + dx, r.y1 + dy));
                }
                black_box(tree.update());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");
    let rects = gen_random_rects(4096, 24.0, 0xC1A5_7E55_9999_ABCD);
    group.bench_function("full_sweep_count_pairs", |b| {
        b.iter_batched(
            || build(&rects, 16).0,
            |mut tree| {
                let mut pairs = 0_u64;
                let mut count =
                    handler_fn(|_: &mut QuadTree<u32>, _: ItemId, _: ItemId, pairs: &mut u64| {
                        *pairs += 1;
                    });
                tree.detect_collisions(&mut count, &mut pairs);
                black_box(pairs);
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("incremental_sweep_after_64_moves", |b| {
        b.iter_batched(
            || {
                let (mut tree, ids) = build(&rects, 16);
                let mut sink = 0_u64;
                let mut count =
                    handler_fn(|_: &mut QuadTree<u32>, _: ItemId, _: ItemId, n: &mut u64| *n += 1);
                tree.detect_collisions(&mut count, &mut sink);
                (tree, ids)
            },
            |(mut tree, ids)| {
                for id in ids.iter().step_by(64) {
                    let r = tree.item(*id).unwrap().bounds;
                    tree.move_item(*id, Rect::new(r.x0 + 1.0, r.y0, r.x1 + 1.0, r.y1));
                }
                let mut pairs = 0_u64;
                let mut count =
                    handler_fn(|_: &mut QuadTree<u32>, _: ItemId, _: ItemId, n: &mut u64| *n += 1);
                tree.detect_collisions(&mut count, &mut pairs);
                black_box(pairs);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let rects = gen_grid_rects(128, WORLD / 128.0);
    group.bench_function("select_and_drain_256_regions", |b| {
        b.iter_batched(
            || build(&rects, 16).0,
            |mut tree| {
                let mut total = 0usize;
                for q in 0..256 {
                    let x = (q % 16) as f64 * 128.0;
                    let y = (q / 16) as f64 * 128.0;
                    tree.select_items(Rect::new(x, y, x + 256.0, y + 256.0));
                    total += tree.selected().count();
                }
                black_box(total);
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("reorder_bottom_edge_4096", |b| {
        let rects = gen_random_rects(4096, 16.0, 0x5EED_5EED_5EED_5EED);
        b.iter_batched(
            || build(&rects, 16).0,
            |mut tree| {
                tree.set_draw_order(DrawOrder::BottomEdge);
                tree.reorder_items();
                black_box(tree.ordered_items().next());
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_move_update,
    bench_sweep,
    bench_select,
);
criterion_main!(benches);
