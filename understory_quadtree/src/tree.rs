// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use kurbo::Rect;
use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use crate::config::{ConfigError, TreeConfig};
use crate::handler::CollisionHandler;
use crate::list::{Link, List};
use crate::node::{Leaf, Node, ROOT};
use crate::order::{Axes, DrawOrder};
use crate::types::{Item, ItemFlags, ItemId};
use crate::util::contains_rect;

/// Tree-owned state of a live item.
pub(crate) struct ItemSlot<P> {
    pub(crate) item: Item,
    pub(crate) payload: P,
    pub(crate) insertion_bounds: Rect,
    pub(crate) last_bounds: Rect,
    /// One entry per leaf holding the item; its length is the membership count.
    pub(crate) entries: SmallVec<[Link; 4]>,
    ordered: Option<Link>,
    queued: Option<Link>,
}

impl<P> ItemSlot<P> {
    pub(crate) fn notify_inserted(&mut self) {
        self.item.flags.insert(ItemFlags::ATTACHED);
        self.insertion_bounds = self.item.bounds;
        if self.item.flags.contains(ItemFlags::INITIAL) {
            self.item.flags.remove(ItemFlags::INITIAL);
            self.last_bounds = self.item.bounds;
        }
    }

    pub(crate) fn notify_removed(&mut self) {
        self.item
            .flags
            .remove(ItemFlags::ATTACHED | ItemFlags::SELECTED);
    }

    fn notify_position(&mut self) {
        self.last_bounds = self.item.bounds;
    }
}

struct Slot<P> {
    generation: u32,
    item: Option<ItemSlot<P>>,
}

/// Outcome of [`QuadTree::detect_collisions`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SweepReport {
    /// Root passes performed.
    pub passes: u32,
    /// False if the tree was still dirty after the configured number of passes.
    /// The remaining work carries over to the next call.
    pub converged: bool,
}

/// Region quadtree over movable rectangular items.
///
/// Items live in generational slots owned by the tree and carry a caller payload `P`.
/// The tree files every attached item into each leaf its bounds touch, keeps a separate
/// draw-ordered list of attached items, and runs incremental collision sweeps over the
/// leaves that changed since the previous sweep.
pub struct QuadTree<P> {
    pub(crate) nodes: Vec<Node>,
    slots: Vec<Slot<P>>,
    free_list: Vec<usize>,
    /// Every leaf's entries, each leaf's run kept contiguous.
    pub(crate) members: List<ItemId>,
    ordered: List<ItemId>,
    update_queue: List<ItemId>,
    pub(crate) config: TreeConfig,
    visible: bool,
    reverse: bool,
    cursor: Option<Link>,
    cursor_reverse: bool,
    /// Bumped by [`clear`](Self::clear); node indices from an older epoch are meaningless.
    pub(crate) epoch: u32,
}

impl<P> core::fmt::Debug for QuadTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.slots.iter().filter(|s| s.item.is_some()).count();
        let leaves = self.nodes.iter().filter(|n| n.children.is_none()).count();
        f.debug_struct("QuadTree")
            .field("extents", &self.extents())
            .field("nodes", &self.nodes.len())
            .field("leaves", &leaves)
            .field("items_alive", &alive)
            .field("items_attached", &self.ordered.len())
            .field("entries", &self.members.len())
            .field("queued", &self.update_queue.len())
            .field("draw_order", &self.config.draw_order)
            .finish_non_exhaustive()
    }
}

impl<P> QuadTree<P> {
    /// Create an empty tree.
    pub fn new(config: TreeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut nodes = Vec::new();
        nodes.push(Node::leaf(config.extents));
        Ok(Self {
            nodes,
            slots: Vec::new(),
            free_list: Vec::new(),
            members: List::new(),
            ordered: List::new(),
            update_queue: List::new(),
            config,
            visible: true,
            reverse: false,
            cursor: None,
            cursor_reverse: false,
            epoch: 0,
        })
    }

    /// Configuration the tree was built with, including the current draw order and axes.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Region covered by the root.
    pub fn extents(&self) -> Rect {
        self.nodes[ROOT].extents
    }

    /// Number of attached items.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True if no item is attached.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Whether the whole tree is drawn. Used by [`Layers`](crate::Layers).
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the whole tree.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // --- item lifecycle ---

    /// Allocate a detached item. Call [`add_item`](Self::add_item) to file it.
    ///
    /// Only [`ItemFlags::CALLER`] bits of `item.flags` are kept.
    pub fn create(&mut self, mut item: Item, payload: P) -> ItemId {
        item.flags = (item.flags & ItemFlags::CALLER) | ItemFlags::INITIAL;
        check_logical(&item);
        let slot = ItemSlot {
            item,
            payload,
            insertion_bounds: Rect::ZERO,
            last_bounds: Rect::ZERO,
            entries: SmallVec::new(),
            ordered: None,
            queued: None,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let s = &mut self.slots[idx];
            s.generation = s.generation.wrapping_add(1);
            s.item = Some(slot);
            (idx, s.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                item: Some(slot),
            });
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ItemId uses 32-bit indices by design."
        )]
        ItemId::new(idx as u32, generation)
    }

    /// Create and attach an item. Returns `None` (and drops the payload) if the item lies
    /// entirely outside the tree.
    pub fn insert(&mut self, item: Item, payload: P) -> Option<ItemId> {
        let id = self.create(item, payload);
        if self.add_item(id) {
            Some(id)
        } else {
            self.dispose(id);
            None
        }
    }

    /// File an item into every leaf its bounds touch and into the draw order.
    ///
    /// Returns false if the item is stale or entirely outside the tree. Adding an already
    /// attached item is a no-op that returns true.
    pub fn add_item(&mut self, id: ItemId) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        if slot.item.flags.contains(ItemFlags::ATTACHED) {
            return true;
        }
        let bounds = slot.item.bounds;
        if !self.add_to_node(ROOT, id, bounds) {
            return false;
        }
        self.insert_ordered(id);
        true
    }

    /// Detach an item from every leaf and from the draw order. The item stays alive.
    ///
    /// Detaching a detached item succeeds trivially. Returns false only for stale ids or if
    /// the item could not be found where it was filed.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        if !slot.item.flags.contains(ItemFlags::ATTACHED) {
            return true;
        }
        let filed_at = slot.insertion_bounds;
        let removed = self.remove_from_node(ROOT, id, filed_at);
        debug_assert!(removed, "attached item not found at its insertion bounds");
        if !removed {
            error!(?id, ?filed_at, "attached item not found at its insertion bounds");
            return false;
        }
        if let Some(link) = self.live_mut(id).ordered.take() {
            self.ordered.remove(link);
        }
        true
    }

    /// Re-file an item after its bounds changed and queue it for acknowledgement.
    ///
    /// An item that no longer touches the tree has no valid place in it and is disposed;
    /// in that case this returns false and `id` becomes stale.
    pub fn update_item(&mut self, id: ItemId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.remove_item(id);
        if !self.add_item(id) {
            debug!(?id, "item left the tree extents, disposing");
            self.dispose(id);
            return false;
        }
        if !self.live(id).item.flags.contains(ItemFlags::QUEUED) {
            let link = self.update_queue.push_back(id);
            let slot = self.live_mut(id);
            slot.queued = Some(link);
            slot.item.flags.insert(ItemFlags::QUEUED);
        }
        true
    }

    /// Set new bounds, shift the logical bounds by the same offset, and [`update_item`](Self::update_item).
    pub fn move_item(&mut self, id: ItemId, bounds: Rect) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        let delta = bounds.origin() - slot.item.bounds.origin();
        slot.item.logical_bounds = slot.item.logical_bounds.map(|r| r + delta);
        slot.item.bounds = bounds;
        self.update_item(id)
    }

    /// Detach and free an item, returning its payload.
    pub fn dispose(&mut self, id: ItemId) -> Option<P> {
        if !self.is_alive(id) {
            return None;
        }
        self.remove_item(id);
        let slot = self.slots[id.idx()].item.take()?;
        if let Some(link) = slot.queued {
            self.update_queue.remove(link);
        }
        debug_assert!(
            slot.entries.is_empty(),
            "disposed item still has leaf entries"
        );
        self.free_list.push(id.idx());
        debug!(?id, "disposed item");
        Some(slot.payload)
    }

    /// Acknowledge the positions of all queued items in FIFO order. Returns how many were
    /// processed; an empty queue makes this a no-op.
    pub fn update(&mut self) -> usize {
        let mut processed = 0;
        while let Some(id) = self.update_queue.pop_front() {
            if let Some(slot) = self.slot_mut(id) {
                slot.queued = None;
                slot.item.flags.remove(ItemFlags::QUEUED);
                slot.notify_position();
                processed += 1;
            }
        }
        processed
    }

    /// Dispose every item and collapse the tree back to a single leaf.
    pub fn clear(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.item.take().is_some() {
                self.free_list.push(idx);
            }
        }
        self.members.clear();
        self.ordered.clear();
        self.update_queue.clear();
        self.cursor = None;
        let extents = self.extents();
        self.nodes.clear();
        self.nodes.push(Node::leaf(extents));
        self.epoch = self.epoch.wrapping_add(1);
    }

    // --- item accessors ---

    /// Whether `id` refers to a live (created, not disposed) item.
    pub fn is_alive(&self, id: ItemId) -> bool {
        self.slot(id).is_some()
    }

    /// Item data.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.slot(id).map(|s| &s.item)
    }

    /// Caller payload.
    pub fn payload(&self, id: ItemId) -> Option<&P> {
        self.slot(id).map(|s| &s.payload)
    }

    /// Mutable caller payload.
    pub fn payload_mut(&mut self, id: ItemId) -> Option<&mut P> {
        self.slot_mut(id).map(|s| &mut s.payload)
    }

    /// Current flags.
    pub fn flags(&self, id: ItemId) -> Option<ItemFlags> {
        self.slot(id).map(|s| s.item.flags)
    }

    /// Set caller flags. Bits outside [`ItemFlags::CALLER`] are ignored.
    pub fn insert_flags(&mut self, id: ItemId, flags: ItemFlags) {
        if let Some(slot) = self.slot_mut(id) {
            slot.item.flags.insert(flags & ItemFlags::CALLER);
        }
    }

    /// Clear caller flags. Bits outside [`ItemFlags::CALLER`] are ignored.
    pub fn remove_flags(&mut self, id: ItemId, flags: ItemFlags) {
        if let Some(slot) = self.slot_mut(id) {
            slot.item.flags.remove(flags & ItemFlags::CALLER);
        }
    }

    /// Replace the physical bounds. Takes effect in the tree on the next
    /// [`update_item`](Self::update_item).
    pub fn set_bounds(&mut self, id: ItemId, bounds: Rect) {
        if let Some(slot) = self.slot_mut(id) {
            slot.item.bounds = bounds;
            check_logical(&slot.item);
        }
    }

    /// Replace the logical bounds (`None` uses the physical bounds).
    pub fn set_logical_bounds(&mut self, id: ItemId, logical: Option<Rect>) {
        if let Some(slot) = self.slot_mut(id) {
            slot.item.logical_bounds = logical;
            check_logical(&slot.item);
        }
    }

    /// Change the draw layer. Attached items move in the draw order on their next
    /// [`update_item`](Self::update_item) or on [`reorder_items`](Self::reorder_items).
    pub fn set_z_index(&mut self, id: ItemId, z_index: i32) {
        if let Some(slot) = self.slot_mut(id) {
            slot.item.z_index = z_index;
        }
    }

    /// Show or hide a single item.
    pub fn set_item_visible(&mut self, id: ItemId, visible: bool) {
        if let Some(slot) = self.slot_mut(id) {
            slot.item.visible = visible;
        }
    }

    /// Change the caller-defined type tag.
    pub fn set_kind(&mut self, id: ItemId, kind: u32) {
        if let Some(slot) = self.slot_mut(id) {
            slot.item.kind = kind;
        }
    }

    /// Bounds the item was filed with on its last insertion.
    pub fn insertion_bounds(&self, id: ItemId) -> Option<Rect> {
        self.slot(id).map(|s| s.insertion_bounds)
    }

    /// Bounds acknowledged by the last [`update`](Self::update) (or the first insertion).
    pub fn last_bounds(&self, id: ItemId) -> Option<Rect> {
        self.slot(id).map(|s| s.last_bounds)
    }

    /// Number of leaves currently holding the item; zero when detached or stale.
    pub fn membership(&self, id: ItemId) -> usize {
        self.slot(id).map_or(0, |s| s.entries.len())
    }

    // --- draw order ---

    /// Attached items in draw order.
    pub fn ordered_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ordered.iter().map(|(_, id)| *id)
    }

    /// Active draw order.
    pub fn draw_order(&self) -> DrawOrder {
        self.config.draw_order
    }

    /// Switch the draw order. Returns false if nothing changed.
    /// Follow with [`reorder_items`](Self::reorder_items).
    pub fn set_draw_order(&mut self, order: DrawOrder) -> bool {
        if self.config.draw_order.same_as(&order) {
            return false;
        }
        self.config.draw_order = order;
        true
    }

    /// Active axis polarity.
    pub fn axes(&self) -> Axes {
        self.config.axes
    }

    /// Switch axis polarity. Returns false if nothing changed.
    /// Follow with [`reorder_items`](Self::reorder_items).
    pub fn set_axes(&mut self, axes: Axes) -> bool {
        if self.config.axes == axes {
            return false;
        }
        self.config.axes = axes;
        true
    }

    /// Rebuild the draw order from scratch with the active order and axes.
    ///
    /// This is a quadratic insertion sort and is meant for policy changes, not per frame.
    pub fn reorder_items(&mut self) {
        let ids: Vec<ItemId> = self.ordered_items().collect();
        debug!(items = ids.len(), order = ?self.config.draw_order, "reordering items");
        self.ordered.clear();
        self.cursor = None;
        for id in ids {
            self.insert_ordered(id);
        }
    }

    fn insert_ordered(&mut self, id: ItemId) {
        let anchor = self
            .ordered
            .iter()
            .find(|(_, other)| self.is_before(id, **other))
            .map(|(link, _)| link);
        let link = match anchor {
            Some(anchor) => self.ordered.insert_before(anchor, id),
            None => Some(self.ordered.push_back(id)),
        };
        self.live_mut(id).ordered = link;
    }

    fn is_before(&self, p: ItemId, q: ItemId) -> bool {
        let a = &self.live(p).item;
        let b = &self.live(q).item;
        self.config
            .draw_order
            .before(&a.logical(), &b.logical(), a, b, self.config.axes)
    }

    // --- selection ---

    /// Whether selections walk front-to-back by default.
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Default walking direction for [`select_items`](Self::select_items):
    /// back-to-front (false) or front-to-back (true).
    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    /// Mark visible items whose insertion bounds touch `region`, plus every
    /// [`ItemFlags::ALWAYS_SELECT`] item in a touched leaf, and rewind the selection cursor.
    ///
    /// Consume the marks in draw order with [`next_selected`](Self::next_selected) or
    /// [`selected`](Self::selected). Marks left over from an earlier selection that was not
    /// drained are dropped first.
    pub fn select_items(&mut self, region: Rect) {
        self.select_items_with(region, self.reverse);
    }

    /// [`select_items`](Self::select_items) with an explicit walking direction.
    pub fn select_items_with(&mut self, region: Rect, reverse: bool) {
        for (_, id) in self.ordered.iter() {
            if let Some(slot) = self.slots[id.idx()].item.as_mut() {
                slot.item.flags.remove(ItemFlags::SELECTED);
            }
        }
        self.select_in_node(ROOT, region);
        self.cursor_reverse = reverse;
        self.cursor = if reverse {
            self.ordered.back()
        } else {
            self.ordered.front()
        };
    }

    /// Next marked item in draw order; clears its mark.
    ///
    /// Returns `None` at the end, or if the item under the cursor was detached since the
    /// selection was made.
    pub fn next_selected(&mut self) -> Option<ItemId> {
        while let Some(link) = self.cursor {
            let Some(&id) = self.ordered.get(link) else {
                debug!("selection cursor went stale");
                self.cursor = None;
                return None;
            };
            self.cursor = if self.cursor_reverse {
                self.ordered.prev(link)
            } else {
                self.ordered.next(link)
            };
            let slot = self.live_mut(id);
            if slot.item.flags.contains(ItemFlags::SELECTED) {
                slot.item.flags.remove(ItemFlags::SELECTED);
                return Some(id);
            }
        }
        None
    }

    /// Draining iterator over [`next_selected`](Self::next_selected).
    pub fn selected(&mut self) -> Selected<'_, P> {
        Selected { tree: self }
    }

    // --- collisions ---

    /// Report overlapping pairs among items in leaves changed since the previous sweep.
    ///
    /// Runs root passes while the tree stays dirty, up to
    /// [`TreeConfig::max_sweep_passes`]. Hitting the bound logs a warning and leaves the
    /// remaining work for the next call.
    pub fn detect_collisions<C, H>(&mut self, handler: &mut H, context: &mut C) -> SweepReport
    where
        H: CollisionHandler<P, C> + ?Sized,
    {
        let max = self.config.max_sweep_passes;
        let mut passes = 0;
        while self.nodes[ROOT].dirty {
            if passes == max {
                warn!(passes, "collision detection generated an unresolved state");
                return SweepReport {
                    passes,
                    converged: false,
                };
            }
            passes += 1;
            trace!(pass = passes, "collision pass");
            self.sweep_node(ROOT, handler, context);
        }
        SweepReport {
            passes,
            converged: true,
        }
    }

    /// Snapshot of every leaf: its extents and the items filed in it, in run order.
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut out = Vec::new();
        self.collect_leaves(ROOT, &mut out);
        out
    }

    // --- internals ---

    fn slot(&self, id: ItemId) -> Option<&ItemSlot<P>> {
        let s = self.slots.get(id.idx())?;
        if s.generation != id.1 {
            return None;
        }
        s.item.as_ref()
    }

    fn slot_mut(&mut self, id: ItemId) -> Option<&mut ItemSlot<P>> {
        let s = self.slots.get_mut(id.idx())?;
        if s.generation != id.1 {
            return None;
        }
        s.item.as_mut()
    }

    pub(crate) fn live(&self, id: ItemId) -> &ItemSlot<P> {
        self.slots[id.idx()].item.as_ref().expect("dangling ItemId")
    }

    pub(crate) fn live_mut(&mut self, id: ItemId) -> &mut ItemSlot<P> {
        self.slots[id.idx()].item.as_mut().expect("dangling ItemId")
    }
}

fn check_logical(item: &Item) {
    if let Some(logical) = item.logical_bounds
        && !contains_rect(&item.bounds, &logical)
    {
        warn!(
            bounds = ?item.bounds,
            ?logical,
            "logical bounds extend outside physical bounds; collisions may be missed"
        );
    }
}

/// Iterator returned by [`QuadTree::selected`].
#[derive(Debug)]
pub struct Selected<'a, P> {
    tree: &'a mut QuadTree<P>,
}

impl<P> Iterator for Selected<'_, P> {
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        self.tree.next_selected()
    }
}
