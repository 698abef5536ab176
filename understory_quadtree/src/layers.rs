// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A stack of quadtrees over the same region, one per draw layer.

use alloc::vec::Vec;
use kurbo::Rect;

use crate::config::{ConfigError, TreeConfig};
use crate::tree::QuadTree;
use crate::types::ItemId;

/// Fixed number of [`QuadTree`]s built from one [`TreeConfig`], drawn in index order.
///
/// ```
/// use kurbo::Rect;
/// use understory_quadtree::{Item, Layers, TreeConfig};
///
/// let mut layers = Layers::<&str>::new(2, &TreeConfig::new(Rect::new(0.0, 0.0, 64.0, 64.0))).unwrap();
/// let ground = layers.layer_mut(0).unwrap().insert(Item::new(Rect::new(0.0, 0.0, 8.0, 8.0)), "grass").unwrap();
/// let hero = layers.layer_mut(1).unwrap().insert(Item::new(Rect::new(2.0, 2.0, 6.0, 6.0)), "hero").unwrap();
///
/// assert_eq!(layers.visible_items(Rect::new(0.0, 0.0, 4.0, 4.0)), vec![(0, ground), (1, hero)]);
/// ```
#[derive(Debug)]
pub struct Layers<P> {
    trees: Vec<QuadTree<P>>,
}

impl<P> Layers<P> {
    /// Build `count` empty layers.
    pub fn new(count: usize, config: &TreeConfig) -> Result<Self, ConfigError> {
        let trees = (0..count)
            .map(|_| QuadTree::new(*config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees })
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// True if there are no layers.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Layer `index`, bottom first.
    pub fn layer(&self, index: usize) -> Option<&QuadTree<P>> {
        self.trees.get(index)
    }

    /// Mutable layer `index`.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut QuadTree<P>> {
        self.trees.get_mut(index)
    }

    /// Layers bottom to top.
    pub fn iter(&self) -> core::slice::Iter<'_, QuadTree<P>> {
        self.trees.iter()
    }

    /// Mutable layers bottom to top.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, QuadTree<P>> {
        self.trees.iter_mut()
    }

    /// Acknowledge queued positions in every layer. Returns the total processed.
    pub fn update(&mut self) -> usize {
        self.trees.iter_mut().map(QuadTree::update).sum()
    }

    /// Items touching `region` in every visible layer, layer by layer, each in draw order.
    pub fn visible_items(&mut self, region: Rect) -> Vec<(usize, ItemId)> {
        let mut out = Vec::new();
        for (index, tree) in self.trees.iter_mut().enumerate() {
            if !tree.is_visible() {
                continue;
            }
            tree.select_items(region);
            out.extend(tree.selected().map(|id| (index, id)));
        }
        out
    }
}
