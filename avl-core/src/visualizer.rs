//! Host-facing entry point: one [`Visualizer`] per animated tree.

use glam::{Vec2, Vec3};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::error::Result;
use crate::input::Signals;
use crate::layout::snap_to_layout;
use crate::phases::{Animator, Phase};
use crate::traversal::LevelOrder;
use crate::tree::Tree;
use crate::types::{KEY_LIMIT, Key, NodeId};

/// What the renderer needs to draw one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    /// `None` for the pending node, which is not part of the tree yet.
    pub id: Option<NodeId>,
    pub key: Key,
    /// Center of the node.
    pub pos: Vec2,
    pub color: Vec3,
    /// Center of the parent, for drawing the connecting edge.
    pub parent_pos: Option<Vec2>,
}

/// Tree, insertion animator and speed setting, advanced one frame at a
/// time by the host.
#[derive(Debug)]
pub struct Visualizer {
    tree: Tree,
    animator: Animator,
    cfg: Config,
    units_per_second: f32,
    rng: StdRng,
    geometry_walk: LevelOrder,
}

impl Visualizer {
    /// Builds a tree from `cfg.seed_count` random keys.
    ///
    /// Repeated draws are skipped, so the tree may end up with fewer nodes.
    pub fn new(cfg: Config) -> Result<Self> {
        Self::with_rng(cfg, StdRng::from_rng(&mut rand::rng()))
    }

    /// Like [`Visualizer::new`] with a caller-supplied generator.
    pub fn with_rng(cfg: Config, mut rng: StdRng) -> Result<Self> {
        let keys: Vec<Key> = (0..cfg.seed_count)
            .map(|_| rng.random_range(0..KEY_LIMIT))
            .collect();
        let mut vis = Self::with_keys(cfg, &keys)?;
        vis.rng = rng;
        Ok(vis)
    }

    /// Builds a tree from the given keys, in order, without animation.
    ///
    /// ### Errors
    /// `InvalidConfig` if `cfg` fails [`Config::validate`], plus the range
    /// and capacity errors of [`Tree::insert_plain`].
    pub fn with_keys(cfg: Config, keys: &[Key]) -> Result<Self> {
        cfg.validate()?;
        let mut tree = Tree::with_capacity(cfg.capacity);
        for &k in keys {
            tree.insert_plain(k)?;
        }
        tree.set_all_colors(cfg.palette.normal);
        snap_to_layout(&mut tree, &cfg);
        info!(
            "seeded tree with {} nodes, height {}",
            tree.len(),
            tree.tree_height()
        );

        let units_per_second = cfg.speed_preset(cfg.motion.initial_speed);
        Ok(Self {
            geometry_walk: LevelOrder::with_capacity(cfg.capacity),
            tree,
            animator: Animator::new(),
            cfg,
            units_per_second,
            rng: StdRng::seed_from_u64(0),
        })
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    #[inline]
    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.animator.phase()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn units_per_second(&self) -> f32 {
        self.units_per_second
    }

    /// Switches to speed preset `index` and rescales every motion in
    /// flight so it still ends on its destination.
    pub fn set_speed(&mut self, index: usize) {
        let ups = self.cfg.speed_preset(index);
        if ups == self.units_per_second {
            return;
        }
        self.units_per_second = ups;
        let fps = self.cfg.motion.frames_per_second;
        for n in &mut self.tree.nodes {
            n.motion.rescale(ups, fps);
        }
        if let Some(p) = self.animator.pending_mut() {
            p.motion.rescale(ups, fps);
        }
        info!("speed set to {ups} units/s");
    }

    /// Starts animating the insertion of `key`.
    ///
    /// ### Errors
    /// `Busy` unless idle, plus the range and capacity errors of
    /// [`Animator::begin`].
    pub fn request_insert(&mut self, key: Key) -> Result<()> {
        self.animator
            .begin(&self.tree, key, &self.cfg, self.units_per_second)
    }

    /// Advances one frame: applies the signals, steps the animation and
    /// moves every node by its velocity.
    pub fn step(&mut self, signals: &Signals) {
        if let Some(i) = signals.speed_select {
            self.set_speed(i as usize);
        }
        if signals.pause_toggle {
            self.animator.toggle_pause();
        }
        if signals.trigger_insert {
            let key = self.rng.random_range(0..KEY_LIMIT);
            if let Err(e) = self.request_insert(key) {
                warn!("insert of {key} ignored: {e}");
            }
        }

        self.animator
            .step(&mut self.tree, &self.cfg, self.units_per_second);

        if !self.animator.is_paused() {
            self.advance_positions();
        }
    }

    fn advance_positions(&mut self) {
        self.geometry_walk.reset(&self.tree);
        while let Some(v) = self.geometry_walk.next(&self.tree) {
            self.tree.node_mut(v.id).motion.advance();
        }
        if let Some(p) = self.animator.pending_mut() {
            p.motion.advance();
        }
    }

    /// Nodes in level order, followed by the pending node if there is one.
    pub fn draw_items(&self) -> impl Iterator<Item = DrawItem> + '_ {
        let tree = &self.tree;
        let nodes = tree.level_order().map(move |v| {
            let n = tree.node(v.id);
            DrawItem {
                id: Some(v.id),
                key: n.key,
                pos: n.pos(),
                color: n.color,
                parent_pos: n.parent.map(|p| tree.node(p).pos()),
            }
        });
        let pending = self.animator.pending().map(|p| DrawItem {
            id: None,
            key: p.key,
            pos: p.pos(),
            color: p.color,
            parent_pos: None,
        });
        nodes.chain(pending)
    }
}
