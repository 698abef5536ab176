// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena-backed doubly-linked list addressed by generational [`Link`]s.
//!
//! The quadtree keeps three of these: the shared per-leaf membership list, the
//! draw-ordered list, and the update queue. Every stored entry is reachable in
//! O(1) through the `Link` returned when it was inserted, so callers that keep
//! the link around never have to search.
//!
//! ## Liveness
//!
//! Removing an entry frees its slot. When the slot is reused its generation is
//! incremented, so a `Link` captured before the removal stops resolving instead
//! of aliasing the new entry. [`List::contains`] is the liveness check.

use alloc::vec::Vec;
use core::fmt::Debug;

/// Generational handle to an entry of a [`List`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Link(u32, u32);

impl Link {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<V> {
    value: V,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Clone, Debug)]
struct Slot<V> {
    generation: u32,
    entry: Option<Entry<V>>,
}

/// Doubly-linked list with O(1) splicing given a [`Link`].
#[derive(Clone)]
pub struct List<V> {
    slots: Vec<Slot<V>>,
    free_list: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<V> Default for List<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Debug for List<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("List")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<V> List<V> {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `link` still refers to a live entry of this list.
    pub fn contains(&self, link: Link) -> bool {
        self.entry(link).is_some()
    }

    /// Value stored at `link`, if live.
    pub fn get(&self, link: Link) -> Option<&V> {
        self.entry(link).map(|e| &e.value)
    }

    /// Mutable value stored at `link`, if live.
    pub fn get_mut(&mut self, link: Link) -> Option<&mut V> {
        let slot = self.slots.get_mut(link.idx())?;
        if slot.generation != link.1 {
            return None;
        }
        slot.entry.as_mut().map(|e| &mut e.value)
    }

    /// First entry.
    pub fn front(&self) -> Option<Link> {
        self.head.map(|i| self.link_at(i))
    }

    /// Last entry.
    pub fn back(&self) -> Option<Link> {
        self.tail.map(|i| self.link_at(i))
    }

    /// Successor of `link`. Returns `None` at the end or if `link` is stale.
    pub fn next(&self, link: Link) -> Option<Link> {
        self.entry(link)?.next.map(|i| self.link_at(i))
    }

    /// Predecessor of `link`. Returns `None` at the start or if `link` is stale.
    pub fn prev(&self, link: Link) -> Option<Link> {
        self.entry(link)?.prev.map(|i| self.link_at(i))
    }

    /// Append a value.
    pub fn push_back(&mut self, value: V) -> Link {
        let tail = self.tail;
        let idx = self.alloc(value, tail, None);
        match tail {
            Some(t) => self.entry_at_mut(t).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.link_at(idx)
    }

    /// Prepend a value.
    pub fn push_front(&mut self, value: V) -> Link {
        let head = self.head;
        let idx = self.alloc(value, None, head);
        match head {
            Some(h) => self.entry_at_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.link_at(idx)
    }

    /// Insert `value` right after `anchor`. Returns `None` (and drops nothing) if `anchor` is stale.
    pub fn insert_after(&mut self, anchor: Link, value: V) -> Option<Link> {
        let next = self.entry(anchor)?.next;
        let at = anchor.0;
        let idx = self.alloc(value, Some(at), next);
        self.entry_at_mut(at).next = Some(idx);
        match next {
            Some(n) => self.entry_at_mut(n).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        Some(self.link_at(idx))
    }

    /// Insert `value` right before `anchor`. Returns `None` if `anchor` is stale.
    pub fn insert_before(&mut self, anchor: Link, value: V) -> Option<Link> {
        let prev = self.entry(anchor)?.prev;
        let at = anchor.0;
        let idx = self.alloc(value, prev, Some(at));
        self.entry_at_mut(at).prev = Some(idx);
        match prev {
            Some(p) => self.entry_at_mut(p).next = Some(idx),
            None => self.head = Some(idx),
        }
        Some(self.link_at(idx))
    }

    /// Splice the entry at `link` out of the list and return its value.
    pub fn remove(&mut self, link: Link) -> Option<V> {
        self.entry(link)?;
        let entry = self.slots[link.idx()].entry.take()?;
        match entry.prev {
            Some(p) => self.entry_at_mut(p).next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next {
            Some(n) => self.entry_at_mut(n).prev = entry.prev,
            None => self.tail = entry.prev,
        }
        self.free_list.push(link.0);
        self.len -= 1;
        Some(entry.value)
    }

    /// Remove and return the first value.
    pub fn pop_front(&mut self) -> Option<V> {
        let link = self.front()?;
        self.remove(link)
    }

    /// Remove and return the last value.
    pub fn pop_back(&mut self) -> Option<V> {
        let link = self.back()?;
        self.remove(link)
    }

    /// Remove every entry. Slot generations are kept so outstanding links stay stale.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Link uses 32-bit indices by design."
                )]
                self.free_list.push(i as u32);
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate front to back.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn entry(&self, link: Link) -> Option<&Entry<V>> {
        let slot = self.slots.get(link.idx())?;
        if slot.generation != link.1 {
            return None;
        }
        slot.entry.as_ref()
    }

    fn link_at(&self, idx: u32) -> Link {
        Link::new(idx, self.slots[idx as usize].generation)
    }

    fn entry_at_mut(&mut self, idx: u32) -> &mut Entry<V> {
        self.slots[idx as usize]
            .entry
            .as_mut()
            .expect("linked neighbor must be live")
    }

    fn alloc(&mut self, value: V, prev: Option<u32>, next: Option<u32>) -> u32 {
        let entry = Entry { value, prev, next };
        self.len += 1;
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry = Some(entry);
            idx
        } else {
            self.slots.push(Slot {
                generation: 1,
                entry: Some(entry),
            });
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Link uses 32-bit indices by design."
            )]
            let idx = (self.slots.len() - 1) as u32;
            idx
        }
    }
}

impl<V: PartialEq> List<V> {
    /// Find the first entry holding `value`. This is a linear scan; prefer keeping the
    /// [`Link`] returned on insertion.
    pub fn find(&self, value: &V) -> Option<Link> {
        self.iter().find(|(_, v)| *v == value).map(|(l, _)| l)
    }
}

/// Front-to-back iterator over a [`List`].
#[derive(Debug)]
pub struct Iter<'a, V> {
    list: &'a List<V>,
    cursor: Option<u32>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Link, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let slot = &self.list.slots[idx as usize];
        let entry = slot.entry.as_ref()?;
        self.cursor = entry.next;
        Some((Link::new(idx, slot.generation), &entry.value))
    }
}
