//! Animated insertion, one phase transition at a time.
//!
//! A single insertion moves through these phases:
//! 1. [`Phase::MovingToNextCompare`] — the pending node flies to hover over
//!    the node it is compared against next.
//! 2. [`Phase::CompareDescend`] — after a short highlighted pause, the keys
//!    are compared and the cursor descends left or right.
//! 3. [`Phase::Attach`] — once the pending node reaches the empty slot it is
//!    linked into the tree and the tree is laid out again.
//! 4. [`Phase::UpdateHeights`] / [`Phase::Rotating`] — the ancestors are
//!    revisited bottom-up, one per frame; every rotation triggers a full
//!    re-layout and waits for the nodes to arrive.
//!
//! An equal key diverts to [`Phase::DuplicateReject`], which flags the whole
//! tree, waits, and discards the pending node. Every path ends in
//! [`Phase::Static`] with all nodes at rest and the tree balanced.

use std::cmp::Ordering;

use glam::Vec2;
use log::{debug, error, info};

use crate::config::Config;
use crate::error::{AvlError, Result};
use crate::layout::{Layout, relayout, relayout_to_height};
use crate::tree::{Tree, TreeNode};
use crate::types::{KEY_LIMIT, Key, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Idle; accepts a new insertion.
    Static,
    CompareDescend,
    MovingToNextCompare,
    Attach,
    UpdateHeights,
    Rotating,
    DuplicateReject,
    Paused,
}

/// State of the insertion in flight.
///
/// `pending` holds the node being inserted while it is not yet part of the
/// tree. `cursor` is the node it is compared against on the way down and
/// the ancestor being rebalanced on the way up.
#[derive(Debug)]
pub struct Animator {
    current: Phase,
    previous: Phase,
    pending: Option<TreeNode>,
    cursor: Option<NodeId>,
    cursor_level: u32,
    cursor_index: u64,
    inserted: Option<NodeId>,
    timer: u32,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames a comparison stays on screen at the given speed.
fn compare_frames(cfg: &Config, units_per_second: f32) -> u32 {
    cfg.timing.compare_delay_frames / (units_per_second as u32).max(1)
}

impl Animator {
    pub fn new() -> Self {
        Self {
            current: Phase::Static,
            previous: Phase::Paused,
            pending: None,
            cursor: None,
            cursor_level: 0,
            cursor_index: 0,
            inserted: None,
            timer: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.current
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.current == Phase::Static
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.current == Phase::Paused
    }

    /// The node being inserted, while it is detached from the tree.
    #[inline]
    pub fn pending(&self) -> Option<&TreeNode> {
        self.pending.as_ref()
    }

    #[inline]
    pub fn pending_mut(&mut self) -> Option<&mut TreeNode> {
        self.pending.as_mut()
    }

    #[inline]
    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    /// Node most recently linked into the tree by this animation.
    #[inline]
    pub fn inserted(&self) -> Option<NodeId> {
        self.inserted
    }

    #[inline]
    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Swaps the current phase with the remembered one.
    ///
    /// Ignored while idle, so a pause can only freeze an animation in
    /// flight.
    ///
    /// ### Returns
    /// `true` if the phase changed.
    pub fn toggle_pause(&mut self) -> bool {
        if self.current == Phase::Static {
            return false;
        }
        std::mem::swap(&mut self.current, &mut self.previous);
        debug!("pause toggled: {:?} -> {:?}", self.previous, self.current);
        true
    }

    fn enter(&mut self, next: Phase) {
        debug!("{:?} -> {:?}", self.current, next);
        self.current = next;
    }

    /// Starts animating the insertion of `key`.
    ///
    /// The pending node appears above the root and is sent to hover over
    /// it. For an empty tree it flies straight into the root slot.
    ///
    /// ### Errors
    /// - `Busy` if another insertion is animating or paused.
    /// - `KeyOutOfRange` if `key` is not below [`KEY_LIMIT`].
    /// - `CapacityExceeded` if the tree is full and `key` is new.
    pub fn begin(
        &mut self,
        tree: &Tree,
        key: Key,
        cfg: &Config,
        units_per_second: f32,
    ) -> Result<()> {
        if self.current != Phase::Static {
            return Err(AvlError::Busy);
        }
        if key >= KEY_LIMIT {
            return Err(AvlError::KeyOutOfRange(key));
        }
        if tree.len() >= tree.capacity() && !tree.contains(key) {
            return Err(AvlError::CapacityExceeded {
                capacity: tree.capacity(),
            });
        }

        let fps = cfg.motion.frames_per_second;
        let layout = Layout::for_height(tree.tree_height(), &cfg.layout);
        let spawn = layout.center(0, 0) + Vec2::new(0.0, cfg.layout.y_spacing);
        let mut pending = TreeNode::detached(key, spawn, cfg.palette.pending);

        self.cursor = tree.root();
        self.cursor_level = 0;
        self.cursor_index = 0;
        self.inserted = None;
        self.timer = 0;

        match self.cursor {
            Some(root) => {
                let hover = tree.node(root).motion.dest + Vec2::new(0.0, cfg.layout.hover_lift);
                pending.motion.retarget(hover, units_per_second, fps);
                self.pending = Some(pending);
                self.enter(Phase::MovingToNextCompare);
            }
            None => {
                pending.motion.retarget(layout.center(0, 0), units_per_second, fps);
                self.pending = Some(pending);
                self.enter(Phase::Attach);
            }
        }
        info!("inserting key {key}");
        Ok(())
    }

    /// Advances the animation by one frame.
    ///
    /// Only checks arrival and mutates topology; positions are moved by the
    /// caller afterwards, and not at all while paused.
    pub fn step(&mut self, tree: &mut Tree, cfg: &Config, units_per_second: f32) {
        let threshold = cfg.motion.threshold;
        match self.current {
            Phase::Static | Phase::Paused => {}

            Phase::MovingToNextCompare => {
                if self.pending_settled(threshold) {
                    if let Some(c) = self.cursor {
                        tree.node_mut(c).color = cfg.palette.highlight;
                    }
                    self.timer = compare_frames(cfg, units_per_second);
                    self.enter(Phase::CompareDescend);
                }
            }

            Phase::CompareDescend => {
                if self.timer > 0 {
                    self.timer -= 1;
                } else {
                    self.compare(tree, cfg, units_per_second);
                }
            }

            Phase::Attach => {
                if self.pending_settled(threshold) {
                    self.attach(tree, cfg, units_per_second);
                }
            }

            Phase::UpdateHeights => match self.cursor {
                Some(n) => self.rebalance_step(tree, n, cfg, units_per_second),
                None => {
                    if tree.all_settled(threshold) {
                        tree.set_all_colors(cfg.palette.normal);
                        self.inserted = None;
                        self.enter(Phase::Static);
                    }
                }
            },

            Phase::Rotating => {
                if tree.all_settled(threshold) {
                    self.enter(Phase::UpdateHeights);
                }
            }

            Phase::DuplicateReject => {
                if self.timer > 0 {
                    self.timer -= 1;
                } else {
                    if let Some(p) = self.pending.take() {
                        info!("dropped duplicate key {}", p.key);
                    }
                    tree.set_all_colors(cfg.palette.normal);
                    self.cursor = None;
                    self.enter(Phase::Static);
                }
            }
        }
    }

    fn pending_settled(&mut self, threshold: f32) -> bool {
        self.pending
            .as_mut()
            .is_some_and(|p| p.motion.settle(threshold))
    }

    fn compare(&mut self, tree: &mut Tree, cfg: &Config, units_per_second: f32) {
        let (Some(cur), Some(pending)) = (self.cursor, self.pending.as_mut()) else {
            error!("compare without a cursor or pending node");
            self.pending = None;
            self.enter(Phase::Static);
            return;
        };
        let fps = cfg.motion.frames_per_second;
        let node = tree.node(cur);

        let (child, index) = match pending.key.cmp(&node.key) {
            Ordering::Equal => {
                // The whole tree is flagged, not just the matching node.
                tree.set_all_colors(cfg.palette.highlight);
                pending.color = cfg.palette.highlight;
                self.timer = cfg.timing.duplicate_hold_frames;
                self.enter(Phase::DuplicateReject);
                return;
            }
            Ordering::Less => (node.left, self.cursor_index * 2),
            Ordering::Greater => (node.right, self.cursor_index * 2 + 1),
        };
        tree.node_mut(cur).color = cfg.palette.normal;

        match child {
            Some(c) => {
                let hover = tree.node(c).motion.dest + Vec2::new(0.0, cfg.layout.hover_lift);
                pending.motion.retarget(hover, units_per_second, fps);
                self.cursor = Some(c);
                self.cursor_level += 1;
                self.cursor_index = index;
                self.enter(Phase::MovingToNextCompare);
            }
            None => {
                // The new leaf may add a level the cached root height does
                // not know about yet.
                let level = self.cursor_level + 1;
                let height = tree.tree_height().max(level as i32);
                let slot = Layout::for_height(height, &cfg.layout).center(level, index);
                pending.motion.retarget(slot, units_per_second, fps);
                self.enter(Phase::Attach);
            }
        }
    }

    fn attach(&mut self, tree: &mut Tree, cfg: &Config, units_per_second: f32) {
        let Some(mut node) = self.pending.take() else {
            self.enter(Phase::Static);
            return;
        };
        node.color = cfg.palette.normal;
        let key = node.key;
        let depth = match self.cursor {
            Some(_) => self.cursor_level as i32 + 1,
            None => 0,
        };

        match tree.attach(node, self.cursor) {
            Ok(id) => {
                debug!("attached key {key} as node {id}");
                self.inserted = Some(id);
                self.cursor = tree.node(id).parent;
                let height = tree.tree_height().max(depth);
                relayout_to_height(tree, cfg, units_per_second, height);
                self.enter(Phase::UpdateHeights);
            }
            Err(e) => {
                // begin() already checked range and capacity.
                error!("could not attach key {key}: {e}");
                self.cursor = None;
                self.enter(Phase::Static);
            }
        }
    }

    fn rebalance_step(&mut self, tree: &mut Tree, n: NodeId, cfg: &Config, units_per_second: f32) {
        let Some(inserted) = self.inserted else {
            self.cursor = None;
            return;
        };
        let key = tree.node(inserted).key;
        tree.node_mut(n).color = cfg.palette.highlight;

        let rotated = tree.rebalance_at(n, key);
        self.cursor = tree.node(rotated.unwrap_or(n)).parent;

        // Heights above the cursor are stale until the walk reaches the
        // root, so the final layout is only known once it gets there.
        if rotated.is_some() || self.cursor.is_none() {
            relayout(tree, cfg, units_per_second);
        }
        if rotated.is_some() {
            self.enter(Phase::Rotating);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::snap_to_layout;
    use crate::tree::tests::assert_avl;

    const FAST: f32 = 100.0;

    fn seeded(keys: &[Key]) -> (Tree, Config) {
        let cfg = Config::default();
        let mut tree = Tree::with_capacity(cfg.capacity);
        for &k in keys {
            tree.insert_plain(k).unwrap();
        }
        snap_to_layout(&mut tree, &cfg);
        (tree, cfg)
    }

    /// Runs the animation the way the host does: step, then move.
    fn frame(anim: &mut Animator, tree: &mut Tree, cfg: &Config, speed: f32) {
        anim.step(tree, cfg, speed);
        if !anim.is_paused() {
            for n in &mut tree.nodes {
                n.motion.advance();
            }
            if let Some(p) = anim.pending_mut() {
                p.motion.advance();
            }
        }
    }

    fn run_until_static(anim: &mut Animator, tree: &mut Tree, cfg: &Config) -> Vec<Phase> {
        let mut seen = vec![anim.phase()];
        for _ in 0..20_000 {
            frame(anim, tree, cfg, FAST);
            if seen.last() != Some(&anim.phase()) {
                seen.push(anim.phase());
            }
            if anim.is_idle() {
                return seen;
            }
        }
        panic!("animation did not finish; phases seen: {seen:?}");
    }

    #[test]
    fn insert_into_empty_tree_becomes_root() {
        let (mut tree, cfg) = seeded(&[]);
        let mut anim = Animator::new();
        anim.begin(&tree, 42, &cfg, FAST).unwrap();
        assert_eq!(anim.phase(), Phase::Attach);

        run_until_static(&mut anim, &mut tree, &cfg);

        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).key, 42);
        assert_eq!(tree.node(root).pos(), Vec2::ZERO);
        assert!(anim.pending().is_none());
    }

    #[test]
    fn animated_insert_matches_plain_insert() {
        let seed = [50, 30, 70, 20, 40];
        let (mut tree, cfg) = seeded(&seed);
        let mut anim = Animator::new();
        anim.begin(&tree, 10, &cfg, FAST).unwrap();

        let phases = run_until_static(&mut anim, &mut tree, &cfg);
        assert!(phases.contains(&Phase::Rotating), "no rotation: {phases:?}");

        let mut plain = Tree::with_capacity(cfg.capacity);
        for &k in seed.iter().chain([10].iter()) {
            plain.insert_plain(k).unwrap();
        }

        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).key, 30);
        assert!(tree.balance(root).abs() <= 1);
        let fifty = tree.find(50).unwrap();
        assert_eq!(tree.node(fifty).parent, Some(root));
        assert_eq!(tree.node(tree.node(fifty).left.unwrap()).key, 40);
        assert_eq!(tree.keys_in_order(), plain.keys_in_order());
        assert_eq!(tree.tree_height(), plain.tree_height());
        assert_avl(&tree);
    }

    #[test]
    fn nodes_rest_on_layout_after_insert() {
        let (mut tree, cfg) = seeded(&[50, 30, 70]);
        let mut anim = Animator::new();
        anim.begin(&tree, 80, &cfg, FAST).unwrap();
        run_until_static(&mut anim, &mut tree, &cfg);

        let layout = Layout::for_height(tree.tree_height(), &cfg.layout);
        for v in tree.level_order() {
            let n = tree.node(v.id);
            assert!((n.pos() - layout.center(v.level, v.index)).length() < 1e-3);
            assert_eq!(n.motion.vel, Vec2::ZERO);
            assert_eq!(n.color, cfg.palette.normal);
        }
    }

    #[test]
    fn attach_lays_out_for_the_grown_height() {
        let (mut tree, cfg) = seeded(&[50, 30, 70]);
        let mut anim = Animator::new();
        anim.begin(&tree, 80, &cfg, FAST).unwrap();

        // Inserting 80 under 70 grows the tree to height 2 with no rotation.
        let grown = Layout::for_height(2, &cfg.layout);
        let mut checked_slot = false;
        for _ in 0..20_000 {
            if anim.phase() == Phase::Attach && tree.len() == 3 {
                let dest = anim.pending().unwrap().motion.dest;
                assert!((dest - grown.center(2, 3)).length() < 1e-5, "slot {dest:?}");
                checked_slot = true;
            }
            frame(&mut anim, &mut tree, &cfg, FAST);
            if anim.phase() == Phase::UpdateHeights {
                break;
            }
        }
        assert!(checked_slot);
        assert_eq!(anim.phase(), Phase::UpdateHeights);

        for v in tree.level_order() {
            let dest = tree.node(v.id).motion.dest;
            let want = grown.center(v.level, v.index);
            assert!(
                (dest - want).length() < 1e-5,
                "key {}: {dest:?} != {want:?}",
                tree.node(v.id).key
            );
        }
    }

    /// Keys on the search path for `key`, deepest first.
    fn ancestors_bottom_up(tree: &Tree, key: Key) -> Vec<Key> {
        let mut path = Vec::new();
        let mut cur = tree.root();
        while let Some(id) = cur {
            let n = tree.node(id);
            path.push(n.key);
            cur = if key < n.key { n.left } else { n.right };
        }
        path.reverse();
        path
    }

    /// Keys of the ancestors the upward walk rebalances, in visit order.
    fn height_walk(seed: &[Key], key: Key) -> (Vec<Key>, Vec<Key>, Vec<Phase>) {
        let (mut tree, cfg) = seeded(seed);
        let expected = ancestors_bottom_up(&tree, key);
        let mut anim = Animator::new();
        anim.begin(&tree, key, &cfg, FAST).unwrap();

        let mut visits = Vec::new();
        let mut phases = vec![anim.phase()];
        for _ in 0..20_000 {
            if anim.phase() == Phase::UpdateHeights
                && let Some(c) = anim.cursor()
            {
                visits.push(tree.node(c).key);
            }
            frame(&mut anim, &mut tree, &cfg, FAST);
            if phases.last() != Some(&anim.phase()) {
                phases.push(anim.phase());
            }
            if anim.is_idle() {
                break;
            }
        }
        assert!(anim.is_idle());
        assert_avl(&tree);
        (visits, expected, phases)
    }

    #[test]
    fn each_ancestor_is_rebalanced_once_bottom_up() {
        let (visits, expected, phases) = height_walk(&[50, 30, 70], 80);
        assert_eq!(expected, vec![70, 50]);
        assert_eq!(visits, expected);
        assert!(!phases.contains(&Phase::Rotating));
    }

    #[test]
    fn rotation_does_not_revisit_ancestors() {
        let (visits, expected, phases) = height_walk(&[50, 30, 70, 20, 40], 10);
        assert_eq!(expected, vec![20, 30, 50]);
        assert_eq!(visits, expected);
        assert!(phases.contains(&Phase::Rotating), "no rotation: {phases:?}");
    }

    #[test]
    fn duplicate_is_rejected_without_changing_the_tree() {
        let (mut tree, cfg) = seeded(&[50, 30, 70, 20, 40]);
        let mut anim = Animator::new();
        anim.begin(&tree, 40, &cfg, FAST).unwrap();

        let mut saw_reject = false;
        for _ in 0..20_000 {
            frame(&mut anim, &mut tree, &cfg, FAST);
            if anim.phase() == Phase::DuplicateReject {
                saw_reject = true;
                assert!(
                    tree.nodes.iter().all(|n| n.color == cfg.palette.highlight),
                    "whole tree should be flagged"
                );
            }
            if anim.is_idle() {
                break;
            }
        }

        assert!(saw_reject);
        assert!(anim.is_idle());
        assert!(anim.pending().is_none());
        assert_eq!(tree.len(), 5);
        assert!(tree.nodes.iter().all(|n| n.color == cfg.palette.normal));
        assert_avl(&tree);
    }

    #[test]
    fn begin_is_rejected_while_busy() {
        let (tree, cfg) = seeded(&[1, 2, 3]);
        let mut anim = Animator::new();
        anim.begin(&tree, 4, &cfg, FAST).unwrap();
        assert!(matches!(anim.begin(&tree, 5, &cfg, FAST), Err(AvlError::Busy)));
        assert_eq!(anim.pending().map(|p| p.key), Some(4));
    }

    #[test]
    fn begin_checks_key_range_and_capacity() {
        let mut cfg = Config::default();
        cfg.capacity = 2;
        let mut tree = Tree::with_capacity(cfg.capacity);
        tree.insert_plain(1).unwrap();
        tree.insert_plain(2).unwrap();

        let mut anim = Animator::new();
        assert!(matches!(
            anim.begin(&tree, 100, &cfg, FAST),
            Err(AvlError::KeyOutOfRange(100))
        ));
        assert!(matches!(
            anim.begin(&tree, 3, &cfg, FAST),
            Err(AvlError::CapacityExceeded { capacity: 2 })
        ));
        // A duplicate still plays its rejection on a full tree.
        assert!(anim.begin(&tree, 2, &cfg, FAST).is_ok());
        assert!(!anim.is_idle());
    }

    #[test]
    fn compare_waits_for_timer() {
        let (mut tree, cfg) = seeded(&[50]);
        let mut anim = Animator::new();
        let speed = 1.0;
        anim.begin(&tree, 60, &cfg, speed).unwrap();

        let mut frames = 0;
        while anim.phase() == Phase::MovingToNextCompare {
            frame(&mut anim, &mut tree, &cfg, speed);
            frames += 1;
            assert!(frames < 10_000);
        }
        assert_eq!(anim.phase(), Phase::CompareDescend);
        assert_eq!(anim.timer(), cfg.timing.compare_delay_frames);
        assert_eq!(tree.node(tree.root().unwrap()).color, cfg.palette.highlight);

        for _ in 0..cfg.timing.compare_delay_frames {
            frame(&mut anim, &mut tree, &cfg, speed);
            assert_eq!(anim.phase(), Phase::CompareDescend);
        }
        frame(&mut anim, &mut tree, &cfg, speed);
        assert_eq!(anim.phase(), Phase::Attach);
    }

    #[test]
    fn pause_freezes_timers_and_positions() {
        let (mut tree, cfg) = seeded(&[50, 30, 70]);
        let mut anim = Animator::new();
        let speed = 1.0;
        anim.begin(&tree, 10, &cfg, speed).unwrap();

        for _ in 0..5 {
            frame(&mut anim, &mut tree, &cfg, speed);
        }
        let before = anim.pending().unwrap().motion;
        let phase = anim.phase();

        assert!(anim.toggle_pause());
        assert!(anim.is_paused());
        for _ in 0..50 {
            frame(&mut anim, &mut tree, &cfg, speed);
        }
        assert_eq!(anim.pending().unwrap().motion, before);

        assert!(anim.toggle_pause());
        assert_eq!(anim.phase(), phase);
        frame(&mut anim, &mut tree, &cfg, speed);
        assert_ne!(anim.pending().unwrap().pos(), before.pos);
    }

    #[test]
    fn pause_is_ignored_while_idle() {
        let mut anim = Animator::new();
        assert!(!anim.toggle_pause());
        assert_eq!(anim.phase(), Phase::Static);
    }

    #[test]
    fn sequence_of_animated_inserts_stays_balanced() {
        let (mut tree, cfg) = seeded(&[]);
        let mut anim = Animator::new();
        for key in [10, 20, 30, 40, 50, 25, 5, 1, 99, 60, 55] {
            anim.begin(&tree, key, &cfg, FAST).unwrap();
            run_until_static(&mut anim, &mut tree, &cfg);
            assert_avl(&tree);
        }
        assert_eq!(tree.len(), 11);
    }
}
