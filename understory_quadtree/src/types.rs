// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the quadtree: item identifiers, flags, and item geometry.

use kurbo::Rect;

/// Identifier for an item stored in a [`QuadTree`](crate::QuadTree).
///
/// This is a small, copyable handle that stays stable while the item lives but becomes
/// invalid once the item is disposed.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On create, a fresh slot is allocated with generation `1`.
/// - On dispose, the slot is freed; any existing `ItemId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `ItemId`.
///
/// Detaching an item from the tree ([`QuadTree::remove_item`](crate::QuadTree::remove_item))
/// does not invalidate its id; only disposal does.
///
/// Use [`QuadTree::is_alive`](crate::QuadTree::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ItemId(pub(crate) u32, pub(crate) u32);

impl ItemId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Item state bits.
    ///
    /// `QUEUED`, `ATTACHED`, `SELECTED` and `INITIAL` are maintained by the tree.
    /// Callers may only set or clear the bits in [`ItemFlags::CALLER`], see
    /// [`QuadTree::insert_flags`](crate::QuadTree::insert_flags).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u32 {
        /// Waiting in the update queue for position acknowledgement.
        const QUEUED        = 1 << 0;
        /// Filed in at least one leaf.
        const ATTACHED      = 1 << 1;
        /// Marked by the last selection pass and not yet consumed.
        const SELECTED      = 1 << 2;
        /// Never inserted yet; the first insertion also snapshots the last-known bounds.
        const INITIAL       = 1 << 3;
        /// Selected by every selection pass regardless of region or visibility.
        const ALWAYS_SELECT = 1 << 4;
        /// Bits reserved for caller-defined meaning. See [`ItemFlags::user`].
        const USER          = 0xFFFF_FF00;
        /// Bits a caller is allowed to change.
        const CALLER        = Self::ALWAYS_SELECT.bits() | Self::USER.bits();
    }
}

impl ItemFlags {
    /// Number of caller-defined bits available through [`ItemFlags::user`].
    pub const USER_BITS: u8 = 24;

    /// The `n`th caller-defined bit. `n` must be below [`ItemFlags::USER_BITS`].
    pub const fn user(n: u8) -> Self {
        assert!(n < Self::USER_BITS, "user flag index out of range");
        Self::from_bits_retain(1 << (8 + n as u32))
    }
}

impl Default for ItemFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Geometry and draw data for an item.
///
/// Passed to [`QuadTree::create`](crate::QuadTree::create); afterwards the tree owns it
/// and exposes it read-only through [`QuadTree::item`](crate::QuadTree::item).
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// Physical extent used for placement in the tree.
    pub bounds: Rect,
    /// Sub-rectangle of `bounds` used for collision tests and draw ordering.
    /// `None` means the full `bounds`.
    ///
    /// Must lie inside `bounds`; otherwise two items may overlap without sharing a leaf
    /// and the collision goes unreported.
    pub logical_bounds: Option<Rect>,
    /// Draw layer. Compared before position by most [`DrawOrder`](crate::DrawOrder)s.
    pub z_index: i32,
    /// Invisible items are skipped by selection and collision sweeps.
    pub visible: bool,
    /// Caller-defined type tag, e.g. for collision filtering.
    pub kind: u32,
    /// State bits. Only [`ItemFlags::CALLER`] bits are honored on creation.
    pub flags: ItemFlags,
}

impl Item {
    /// A visible item with the given bounds and defaults for everything else.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    /// Rectangle used for collision tests and ordering.
    pub fn logical(&self) -> Rect {
        self.logical_bounds.unwrap_or(self.bounds)
    }
}

impl Default for Item {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            logical_bounds: None,
            z_index: 0,
            visible: true,
            kind: 0,
            flags: ItemFlags::empty(),
        }
    }
}
