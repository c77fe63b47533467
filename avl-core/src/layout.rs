//! Target positions for every node.
//!
//! The tree is laid out as if it were a perfect binary tree of the current
//! height: the bottom level has `2^H` slots, and every level above splits
//! the total width into half as many slots. A node is centered in the slot
//! its level-order index names.

use glam::Vec2;

use crate::config::{Config, LayoutConfig};
use crate::motion::Motion;
use crate::traversal::LevelOrder;
use crate::tree::Tree;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    max_tree_width: f32,
    x_start: f32,
    y_start: f32,
    y_spacing: f32,
}

impl Layout {
    /// Layout for a tree whose root has height `height`.
    ///
    /// Negative heights (an empty tree) are treated as a single node.
    pub fn for_height(height: i32, cfg: &LayoutConfig) -> Self {
        let bottom_width = 2f32.powi(height.max(0));
        // No margin after the rightmost node.
        let max_tree_width = bottom_width * (cfg.node_width + cfg.node_margin) - cfg.node_margin;
        Self {
            max_tree_width,
            x_start: -max_tree_width / 2.0,
            y_start: cfg.y_start,
            y_spacing: cfg.y_spacing,
        }
    }

    #[inline]
    pub fn max_tree_width(&self) -> f32 {
        self.max_tree_width
    }

    /// Center of the slot at `index` on `level`.
    pub fn center(&self, level: u32, index: u64) -> Vec2 {
        let split = 2f32.powi(level as i32 + 1);
        let x_width = self.max_tree_width / split;
        // Odd multiples of the half-slot width land on slot centers.
        let split_index = (index * 2 + 1) as f32;
        Vec2::new(
            self.x_start + split_index * x_width,
            self.y_start - level as f32 * self.y_spacing,
        )
    }
}

/// Full re-layout: gives every node a new destination for the tree's
/// current shape and a synchronized velocity toward it.
///
/// ### Parameters
/// - `tree` - Tree whose nodes are retargeted.
/// - `cfg` - Supplies spacing and the frame rate.
/// - `units_per_second` - Current animation speed.
///
/// ### Returns
/// The layout that was applied, so callers can place nodes that are not in
/// the tree yet.
pub fn relayout(tree: &mut Tree, cfg: &Config, units_per_second: f32) -> Layout {
    let height = tree.tree_height();
    relayout_to_height(tree, cfg, units_per_second, height)
}

/// Like [`relayout`], but for an explicit tree height.
///
/// Used mid-insertion, when the root's cached height has not caught up
/// with the new node yet.
pub fn relayout_to_height(
    tree: &mut Tree,
    cfg: &Config,
    units_per_second: f32,
    height: i32,
) -> Layout {
    let layout = Layout::for_height(height, &cfg.layout);
    let fps = cfg.motion.frames_per_second;

    let mut lo = LevelOrder::with_capacity(tree.capacity());
    lo.reset(tree);
    while let Some(v) = lo.next(tree) {
        let dest = layout.center(v.level, v.index);
        tree.node_mut(v.id).motion.retarget(dest, units_per_second, fps);
    }
    layout
}

/// Places every node on its layout position immediately, with no motion.
pub fn snap_to_layout(tree: &mut Tree, cfg: &Config) -> Layout {
    let layout = Layout::for_height(tree.tree_height(), &cfg.layout);
    let mut lo = LevelOrder::with_capacity(tree.capacity());
    lo.reset(tree);
    while let Some(v) = lo.next(tree) {
        let pos = layout.center(v.level, v.index);
        tree.node_mut(v.id).motion = Motion::at(pos);
    }
    layout
}
