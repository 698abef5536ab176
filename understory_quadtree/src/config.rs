// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree construction parameters.

use kurbo::Rect;

use crate::order::{Axes, DrawOrder};

/// Default maximum number of items per leaf before it splits.
pub const DEFAULT_NODE_CAPACITY: usize = 16;

/// Default edge length below which a full leaf stops splitting.
pub const DEFAULT_MIN_SPLIT_SIZE: f64 = 1.0;

/// Default bound on collision passes per [`QuadTree::detect_collisions`](crate::QuadTree::detect_collisions) call.
pub const DEFAULT_MAX_SWEEP_PASSES: u32 = 16;

/// Parameters for [`QuadTree::new`](crate::QuadTree::new).
///
/// ```
/// use kurbo::Rect;
/// use understory_quadtree::{DrawOrder, TreeConfig};
///
/// let config = TreeConfig {
///     node_capacity: 4,
///     draw_order: DrawOrder::BottomEdge,
///     ..TreeConfig::new(Rect::new(0.0, 0.0, 1024.0, 768.0))
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TreeConfig {
    /// Region covered by the root. Items entirely outside cannot be placed.
    pub extents: Rect,
    /// Maximum items per leaf before a split is attempted.
    pub node_capacity: usize,
    /// A full leaf whose width and height are both below this size accepts items
    /// over capacity instead of splitting.
    pub min_split_size: f64,
    /// Upper bound on root passes per collision sweep.
    pub max_sweep_passes: u32,
    /// Initial draw order.
    pub draw_order: DrawOrder,
    /// Initial axis polarity.
    pub axes: Axes,
}

impl TreeConfig {
    /// Defaults for everything but the extents.
    pub fn new(extents: Rect) -> Self {
        Self {
            extents,
            node_capacity: DEFAULT_NODE_CAPACITY,
            min_split_size: DEFAULT_MIN_SPLIT_SIZE,
            max_sweep_passes: DEFAULT_MAX_SWEEP_PASSES,
            draw_order: DrawOrder::default(),
            axes: Axes::default(),
        }
    }

    /// Check the parameters for values the tree cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = self.extents;
        let finite = e.x0.is_finite() && e.y0.is_finite() && e.x1.is_finite() && e.y1.is_finite();
        if !finite || e.x1 <= e.x0 || e.y1 <= e.y0 {
            return Err(ConfigError::InvalidExtents(e));
        }
        if self.node_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.min_split_size.is_finite() && self.min_split_size > 0.0) {
            return Err(ConfigError::InvalidSplitSize(self.min_split_size));
        }
        if self.max_sweep_passes == 0 {
            return Err(ConfigError::ZeroSweepPasses);
        }
        Ok(())
    }
}

/// Rejected [`TreeConfig`].
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Extents are empty, inverted, or not finite.
    #[error("tree extents must be finite with positive area, got {0:?}")]
    InvalidExtents(Rect),
    /// A leaf must be able to hold at least one item.
    #[error("node capacity must be at least 1")]
    ZeroCapacity,
    /// Minimum split size must be finite and positive.
    #[error("minimum split size must be finite and positive, got {0}")]
    InvalidSplitSize(f64),
    /// At least one collision pass is required.
    #[error("collision sweeps need at least one pass")]
    ZeroSweepPasses,
}
