// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage and the recursive algorithms: insertion with splitting, removal,
//! selection, and the per-leaf collision sweep.
//!
//! A leaf does not own a container of its own. Its items are a contiguous run of the
//! tree-wide membership list starting at the leaf's insertion point, `item_count`
//! entries long. New entries are spliced in right after the insertion point, so runs
//! never interleave.

use alloc::vec::Vec;
use kurbo::Rect;
use tracing::{debug, error, warn};

use crate::handler::CollisionHandler;
use crate::list::Link;
use crate::tree::QuadTree;
use crate::types::{ItemFlags, ItemId};
use crate::util::{intersects, quadrants};

pub(crate) const ROOT: usize = 0;

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) extents: Rect,
    /// Leaf: entries in the run. Branch: items filed somewhere below, each counted once.
    pub(crate) item_count: usize,
    pub(crate) insertion_point: Option<Link>,
    pub(crate) children: Option<[usize; 4]>,
    pub(crate) dirty: bool,
}

impl Node {
    pub(crate) fn leaf(extents: Rect) -> Self {
        Self {
            extents,
            item_count: 0,
            insertion_point: None,
            children: None,
            dirty: false,
        }
    }
}

/// Snapshot of a leaf returned by [`QuadTree::leaves`].
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    /// Region covered by the leaf.
    pub extents: Rect,
    /// Items filed in the leaf, in run order.
    pub items: Vec<ItemId>,
}

impl<P> QuadTree<P> {
    /// File `id` under `node` using `rect`. Returns false if `rect` misses the node.
    pub(crate) fn add_to_node(&mut self, node: usize, id: ItemId, rect: Rect) -> bool {
        let extents = self.nodes[node].extents;
        if !intersects(&rect, &extents) {
            return false;
        }
        if let Some(children) = self.nodes[node].children {
            let mut accepted = false;
            for child in children {
                accepted |= self.add_to_node(child, id, rect);
            }
            if accepted {
                let n = &mut self.nodes[node];
                n.dirty = true;
                n.item_count += 1;
            }
            return accepted;
        }
        let count = self.nodes[node].item_count;
        if count >= self.config.node_capacity {
            let min = self.config.min_split_size;
            if extents.width() < min && extents.height() < min {
                warn!(?extents, count, "leaf too small to split, accepting item over capacity");
            } else {
                self.split(node);
                return self.add_to_node(node, id, rect);
            }
        }
        self.file_in_leaf(node, id);
        true
    }

    fn file_in_leaf(&mut self, node: usize, id: ItemId) {
        let link = match self.nodes[node].insertion_point {
            Some(ip) => self
                .members
                .insert_after(ip, id)
                .expect("leaf insertion point must be live"),
            None => {
                let link = self.members.push_back(id);
                self.nodes[node].insertion_point = Some(link);
                link
            }
        };
        let n = &mut self.nodes[node];
        n.dirty = true;
        n.item_count += 1;
        let slot = self.live_mut(id);
        let first = !slot.item.flags.contains(ItemFlags::ATTACHED);
        slot.entries.push(link);
        if first {
            slot.notify_inserted();
        }
    }

    /// Turn a full leaf into a branch and re-file its items by their insertion bounds.
    fn split(&mut self, node: usize) {
        let extents = self.nodes[node].extents;
        let base = self.nodes.len();
        for q in quadrants(&extents) {
            self.nodes.push(Node::leaf(q));
        }
        let n = &mut self.nodes[node];
        let mut cursor = n.insertion_point.take();
        let count = core::mem::replace(&mut n.item_count, 0);
        n.children = Some([base, base + 1, base + 2, base + 3]);
        n.dirty = true;
        debug!(node, ?extents, items = count, "splitting leaf");

        for _ in 0..count {
            let Some(link) = cursor else {
                error!(node, "leaf run ended before its item count");
                break;
            };
            cursor = self.members.next(link);
            let Some(id) = self.members.remove(link) else {
                break;
            };
            let slot = self.live_mut(id);
            slot.entries.retain(|l| *l != link);
            let rect = slot.insertion_bounds;
            let placed = self.add_to_node(node, id, rect);
            debug_assert!(placed, "item lost while splitting a leaf");
            if !placed {
                error!(?id, ?rect, "unable to re-file item in a split leaf");
            }
        }
    }

    /// Remove `id` from every leaf under `node` touched by `rect`.
    pub(crate) fn remove_from_node(&mut self, node: usize, id: ItemId, rect: Rect) -> bool {
        if !intersects(&rect, &self.nodes[node].extents) {
            return false;
        }
        if let Some(children) = self.nodes[node].children {
            let mut removed = false;
            for child in children {
                removed |= self.remove_from_node(child, id, rect);
            }
            if removed {
                let n = &mut self.nodes[node];
                n.dirty = true;
                n.item_count -= 1;
            }
            return removed;
        }
        let Some(link) = self.find_in_run(node, id) else {
            return false;
        };
        let next = self.members.next(link);
        let n = &mut self.nodes[node];
        n.dirty = true;
        n.item_count -= 1;
        if n.insertion_point == Some(link) {
            n.insertion_point = if n.item_count > 0 { next } else { None };
        }
        self.members.remove(link);
        let slot = self.live_mut(id);
        slot.entries.retain(|l| *l != link);
        if slot.entries.is_empty() {
            slot.notify_removed();
        }
        true
    }

    fn find_in_run(&self, node: usize, id: ItemId) -> Option<Link> {
        let n = &self.nodes[node];
        let mut cursor = n.insertion_point;
        for _ in 0..n.item_count {
            let link = cursor?;
            if self.members.get(link) == Some(&id) {
                return Some(link);
            }
            cursor = self.members.next(link);
        }
        None
    }

    /// Offset of `link` within the run of `node`, if `node` is still a leaf holding it.
    fn run_position(&self, node: usize, link: Link) -> Option<usize> {
        let n = &self.nodes[node];
        if n.children.is_some() {
            return None;
        }
        let mut cursor = n.insertion_point;
        for pos in 0..n.item_count {
            let l = cursor?;
            if l == link {
                return Some(pos);
            }
            cursor = self.members.next(l);
        }
        None
    }

    pub(crate) fn select_in_node(&mut self, node: usize, region: Rect) {
        if !intersects(&region, &self.nodes[node].extents) {
            return;
        }
        if let Some(children) = self.nodes[node].children {
            for child in children {
                self.select_in_node(child, region);
            }
            return;
        }
        let mut cursor = self.nodes[node].insertion_point;
        for _ in 0..self.nodes[node].item_count {
            let Some(link) = cursor else { break };
            cursor = self.members.next(link);
            let Some(&id) = self.members.get(link) else {
                break;
            };
            let slot = self.live_mut(id);
            let hit = slot.item.visible && intersects(&slot.insertion_bounds, &region);
            if hit || slot.item.flags.contains(ItemFlags::ALWAYS_SELECT) {
                slot.item.flags.insert(ItemFlags::SELECTED);
            }
        }
    }

    /// One collision pass over the dirty part of the subtree rooted at `node`.
    pub(crate) fn sweep_node<C, H>(&mut self, node: usize, handler: &mut H, context: &mut C)
    where
        H: CollisionHandler<P, C> + ?Sized,
    {
        if !self.nodes[node].dirty {
            return;
        }
        self.nodes[node].dirty = false;
        let epoch = self.epoch;
        if let Some(children) = self.nodes[node].children {
            for child in children {
                self.sweep_node(child, handler, context);
                if self.epoch != epoch {
                    return;
                }
            }
            if children.iter().any(|c| self.nodes[*c].dirty) {
                self.nodes[node].dirty = true;
            }
            return;
        }
        self.sweep_leaf(node, handler, context);
    }

    /// Triangular pair scan over a leaf run. After every callback the positions of both
    /// cursors are re-derived from their links, since the handler may have reshaped the run.
    fn sweep_leaf<C, H>(&mut self, node: usize, handler: &mut H, context: &mut C)
    where
        H: CollisionHandler<P, C> + ?Sized,
    {
        let epoch = self.epoch;
        let mut restarts = 0_u32;
        let mut n = self.nodes[node].item_count;
        let mut i_cursor = self.nodes[node].insertion_point;
        while let Some(i) = i_cursor {
            if n <= 1 {
                break;
            }
            n -= 1;
            let mut m = n;
            let mut i_next = self.members.next(i);
            let Some(&a) = self.members.get(i) else {
                break;
            };
            if !self.sweepable(a, handler, context) {
                i_cursor = i_next;
                continue;
            }
            let rect = self.live(a).item.logical();
            let mut j_cursor = i_next;
            while let Some(j) = j_cursor {
                if m == 0 {
                    break;
                }
                m -= 1;
                let Some(&b) = self.members.get(j) else {
                    break;
                };
                if !self.sweepable(b, handler, context)
                    || !intersects(&rect, &self.live(b).item.logical())
                {
                    j_cursor = self.members.next(j);
                    continue;
                }

                handler.on_collision(self, a, b, context);
                if self.epoch != epoch {
                    // The handler cleared the tree; this node no longer exists.
                    return;
                }

                let Some(pos_i) = self.run_position(node, i) else {
                    if self.defer_leaf(node, &mut restarts) {
                        return;
                    }
                    i_next = self.nodes[node].insertion_point;
                    n = self.nodes[node].item_count;
                    break;
                };
                let count = self.nodes[node].item_count;
                n = count - pos_i - 1;
                i_next = self.members.next(i);
                j_cursor = match self.run_position(node, j) {
                    Some(pos_j) => {
                        m = count - pos_j - 1;
                        self.members.next(j)
                    }
                    None => {
                        if self.defer_leaf(node, &mut restarts) {
                            return;
                        }
                        m = n;
                        i_next
                    }
                };
            }
            i_cursor = i_next;
        }
    }

    /// Count one rescan of `node` forced by its handler. Past the pass budget the leaf
    /// stays dirty for a later pass and the caller must stop scanning it.
    fn defer_leaf(&mut self, node: usize, restarts: &mut u32) -> bool {
        *restarts += 1;
        if *restarts <= self.config.max_sweep_passes {
            return false;
        }
        warn!(node, "leaf keeps changing under its sweep, deferring");
        self.nodes[node].dirty = true;
        true
    }

    fn sweepable<C, H>(&self, id: ItemId, handler: &mut H, context: &mut C) -> bool
    where
        H: CollisionHandler<P, C> + ?Sized,
    {
        self.live(id).item.visible && handler.filter(self, id, context)
    }

    pub(crate) fn collect_leaves(&self, node: usize, out: &mut Vec<Leaf>) {
        let n = &self.nodes[node];
        if let Some(children) = n.children {
            for child in children {
                self.collect_leaves(child, out);
            }
            return;
        }
        let mut items = Vec::with_capacity(n.item_count);
        let mut cursor = n.insertion_point;
        for _ in 0..n.item_count {
            let Some(link) = cursor else { break };
            if let Some(&id) = self.members.get(link) {
                items.push(id);
            }
            cursor = self.members.next(link);
        }
        out.push(Leaf {
            extents: n.extents,
            items,
        });
    }
}
