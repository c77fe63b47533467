use std::cmp::Ordering;

use glam::{Vec2, Vec3};
use log::debug;

use crate::error::{AvlError, Result};
use crate::motion::Motion;
use crate::types::{KEY_LIMIT, Key, NodeId};

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub key: Key,
    pub height: i32,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub motion: Motion,
    pub color: Vec3,
}

/// Arena-backed AVL tree.
///
/// Nodes are never removed from the arena, so a `NodeId` stays valid for
/// the life of the tree. Parent links are plain back-references used for
/// upward walks and rotations.
#[derive(Debug)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
    root: Option<NodeId>,
    capacity: usize,
}

impl TreeNode {
    /// A node that is not linked into any tree.
    pub fn detached(key: Key, pos: Vec2, color: Vec3) -> Self {
        Self {
            key,
            height: 0,
            parent: None,
            left: None,
            right: None,
            motion: Motion::at(pos),
            color,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.motion.pos
    }
}

impl Tree {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: None,
            capacity,
        }
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id]
    }

    /// Cached height of `node`, or `-1` for an absent node.
    #[inline]
    pub fn height(&self, node: Option<NodeId>) -> i32 {
        node.map_or(-1, |id| self.nodes[id].height)
    }

    /// Height of the whole tree (`-1` when empty).
    #[inline]
    pub fn tree_height(&self) -> i32 {
        self.height(self.root)
    }

    pub fn update_height(&mut self, id: NodeId) {
        let n = &self.nodes[id];
        let h = self.height(n.left).max(self.height(n.right)) + 1;
        self.nodes[id].height = h;
    }

    /// Balance factor: `height(left) - height(right)`.
    pub fn balance(&self, id: NodeId) -> i32 {
        let n = &self.nodes[id];
        self.height(n.left) - self.height(n.right)
    }

    /// Finds the node holding `key`.
    pub fn find(&self, key: Key) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let n = &self.nodes[id];
            cur = match key.cmp(&n.key) {
                Ordering::Less => n.left,
                Ordering::Greater => n.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    #[inline]
    pub fn contains(&self, key: Key) -> bool {
        self.find(key).is_some()
    }

    /// Points whatever referenced `old` (its parent's child slot, or the
    /// root) at `new`, and gives `new` the parent `old` had.
    fn replace_in_parent(&mut self, old: NodeId, new: NodeId, parent: Option<NodeId>) {
        self.nodes[new].parent = parent;
        match parent {
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = Some(new);
                } else {
                    self.nodes[p].right = Some(new);
                }
            }
            None => self.root = Some(new),
        }
    }

    /// Rotates the subtree rooted at `id` to the right.
    ///
    /// The left child takes `id`'s place; its right subtree becomes `id`'s
    /// left subtree.
    ///
    /// ### Returns
    /// The new subtree root (the former left child).
    ///
    /// ### Panics
    /// Panics if `id` has no left child.
    pub fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let parent = self.nodes[id].parent;
        let Some(pivot) = self.nodes[id].left else {
            panic!("rotate_right on node {id} without a left child");
        };
        let moved = self.nodes[pivot].right;

        self.nodes[id].parent = Some(pivot);
        self.nodes[pivot].right = Some(id);

        self.nodes[id].left = moved;
        if let Some(m) = moved {
            self.nodes[m].parent = Some(id);
        }

        self.replace_in_parent(id, pivot, parent);

        // The pivot's height depends on the rotated-down node's new height.
        self.update_height(id);
        self.update_height(pivot);
        pivot
    }

    /// Rotates the subtree rooted at `id` to the left. Mirror of
    /// [`Tree::rotate_right`].
    ///
    /// ### Panics
    /// Panics if `id` has no right child.
    pub fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let parent = self.nodes[id].parent;
        let Some(pivot) = self.nodes[id].right else {
            panic!("rotate_left on node {id} without a right child");
        };
        let moved = self.nodes[pivot].left;

        self.nodes[id].parent = Some(pivot);
        self.nodes[pivot].left = Some(id);

        self.nodes[id].right = moved;
        if let Some(m) = moved {
            self.nodes[m].parent = Some(id);
        }

        self.replace_in_parent(id, pivot, parent);

        self.update_height(id);
        self.update_height(pivot);
        pivot
    }

    /// One step of the upward walk after inserting `inserted`.
    ///
    /// Refreshes the height of `id` and, if it is out of balance, applies
    /// the matching single or double rotation. Which case applies is
    /// decided by comparing `inserted` with the key of the heavy child.
    ///
    /// ### Returns
    /// The new subtree root if a rotation happened, `None` otherwise.
    pub fn rebalance_at(&mut self, id: NodeId, inserted: Key) -> Option<NodeId> {
        self.update_height(id);
        let balance = self.balance(id);

        if balance > 1 {
            let left = self.nodes[id].left?;
            if inserted > self.nodes[left].key {
                debug!("left-right rotation at key {}", self.nodes[id].key);
                self.rotate_left(left);
            } else {
                debug!("right rotation at key {}", self.nodes[id].key);
            }
            Some(self.rotate_right(id))
        } else if balance < -1 {
            let right = self.nodes[id].right?;
            if inserted < self.nodes[right].key {
                debug!("right-left rotation at key {}", self.nodes[id].key);
                self.rotate_right(right);
            } else {
                debug!("left rotation at key {}", self.nodes[id].key);
            }
            Some(self.rotate_left(id))
        } else {
            None
        }
    }

    fn check_insertable(&self, key: Key) -> Result<()> {
        if key >= KEY_LIMIT {
            return Err(AvlError::KeyOutOfRange(key));
        }
        if self.nodes.len() >= self.capacity {
            return Err(AvlError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Moves a detached node into the tree as a child of `parent`, or as the
    /// root when `parent` is `None`.
    ///
    /// The side is chosen by comparing keys. Heights above the new node are
    /// not touched; the caller walks upward with [`Tree::rebalance_at`].
    ///
    /// ### Errors
    /// `KeyOutOfRange` or `CapacityExceeded`.
    pub fn attach(&mut self, mut node: TreeNode, parent: Option<NodeId>) -> Result<NodeId> {
        self.check_insertable(node.key)?;

        let id = self.nodes.len();
        node.parent = parent;
        node.left = None;
        node.right = None;
        node.height = 0;
        let key = node.key;
        self.nodes.push(node);

        match parent {
            Some(p) if key < self.nodes[p].key => self.nodes[p].left = Some(id),
            Some(p) => self.nodes[p].right = Some(id),
            None => self.root = Some(id),
        }
        Ok(id)
    }

    /// Plain AVL insert without animation, used for seeding.
    ///
    /// ### Returns
    /// `Ok(true)` if the key was inserted, `Ok(false)` if it was already
    /// present.
    pub fn insert_plain(&mut self, key: Key) -> Result<bool> {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            parent = Some(id);
            let n = &self.nodes[id];
            cur = match key.cmp(&n.key) {
                Ordering::Less => n.left,
                Ordering::Greater => n.right,
                Ordering::Equal => return Ok(false),
            };
        }

        let id = self.attach(TreeNode::detached(key, Vec2::ZERO, Vec3::ZERO), parent)?;

        let mut cur = self.nodes[id].parent;
        while let Some(n) = cur {
            let top = self.rebalance_at(n, key).unwrap_or(n);
            cur = self.nodes[top].parent;
        }
        Ok(true)
    }

    /// Keys in ascending order.
    pub fn keys_in_order(&self) -> Vec<Key> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(id) = cur {
                stack.push(id);
                cur = self.nodes[id].left;
            }
            if let Some(id) = stack.pop() {
                out.push(self.nodes[id].key);
                cur = self.nodes[id].right;
            }
        }
        out
    }

    pub fn set_all_colors(&mut self, color: Vec3) {
        for n in &mut self.nodes {
            n.color = color;
        }
    }

    /// Settles every node's motion and reports whether all have arrived.
    pub fn all_settled(&mut self, threshold: f32) -> bool {
        let mut done = true;
        for n in &mut self.nodes {
            done &= n.motion.settle(threshold);
        }
        done
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::MAX_NODES;

    /// Checks parent links, cached heights, key order and balance.
    pub(crate) fn assert_avl(tree: &Tree) {
        fn walk(tree: &Tree, id: NodeId, lo: Option<Key>, hi: Option<Key>) -> i32 {
            let n = tree.node(id);
            if let Some(lo) = lo {
                assert!(n.key > lo, "key {} not above {lo}", n.key);
            }
            if let Some(hi) = hi {
                assert!(n.key < hi, "key {} not below {hi}", n.key);
            }
            let hl = n.left.map_or(-1, |c| {
                assert_eq!(tree.node(c).parent, Some(id), "bad parent link");
                walk(tree, c, lo, Some(n.key))
            });
            let hr = n.right.map_or(-1, |c| {
                assert_eq!(tree.node(c).parent, Some(id), "bad parent link");
                walk(tree, c, Some(n.key), hi)
            });
            assert_eq!(n.height, hl.max(hr) + 1, "stale height at key {}", n.key);
            assert!((hl - hr).abs() <= 1, "key {} out of balance", n.key);
            n.height
        }

        if let Some(root) = tree.root() {
            assert_eq!(tree.node(root).parent, None, "root has a parent");
            walk(tree, root, None, None);
        }
    }

    fn tree_from(keys: &[Key]) -> Tree {
        let mut tree = Tree::with_capacity(MAX_NODES);
        for &k in keys {
            tree.insert_plain(k).unwrap();
        }
        tree
    }

    fn root_key(tree: &Tree) -> Key {
        tree.node(tree.root().unwrap()).key
    }

    #[test]
    fn empty_tree_has_height_minus_one() {
        let tree = Tree::with_capacity(4);
        assert_eq!(tree.tree_height(), -1);
        assert!(tree.is_empty());
        assert!(tree.keys_in_order().is_empty());
    }

    #[test]
    fn insert_plain_rejects_duplicates() {
        let mut tree = tree_from(&[5, 3, 8]);
        assert!(!tree.insert_plain(3).unwrap());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn insert_plain_handles_all_four_cases() {
        // Right-right: single left rotation.
        let t = tree_from(&[10, 20, 30]);
        assert_eq!(root_key(&t), 20);
        assert_avl(&t);

        // Left-left: single right rotation.
        let t = tree_from(&[30, 20, 10]);
        assert_eq!(root_key(&t), 20);
        assert_avl(&t);

        // Left-right: double rotation.
        let t = tree_from(&[30, 10, 20]);
        assert_eq!(root_key(&t), 20);
        assert_avl(&t);

        // Right-left: double rotation.
        let t = tree_from(&[10, 30, 20]);
        assert_eq!(root_key(&t), 20);
        assert_avl(&t);
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let keys: Vec<Key> = (0..KEY_LIMIT).collect();
        let tree = tree_from(&keys);
        assert_eq!(tree.len(), 100);
        assert_eq!(tree.keys_in_order(), keys);
        assert!(tree.tree_height() <= 7);
        assert_avl(&tree);
    }

    #[test]
    fn insert_plain_reports_range_and_capacity_errors() {
        let mut tree = Tree::with_capacity(2);
        assert!(matches!(
            tree.insert_plain(100),
            Err(AvlError::KeyOutOfRange(100))
        ));
        tree.insert_plain(1).unwrap();
        tree.insert_plain(2).unwrap();
        assert!(matches!(
            tree.insert_plain(3),
            Err(AvlError::CapacityExceeded { capacity: 2 })
        ));
        // A duplicate on a full tree is still just a duplicate.
        assert!(!tree.insert_plain(2).unwrap());
    }

    #[test]
    fn rotate_left_then_right_restores_topology() {
        let mut tree = tree_from(&[50, 30, 70, 60, 80]);
        let before: Vec<_> = tree
            .nodes
            .iter()
            .map(|n| (n.key, n.parent, n.left, n.right))
            .collect();

        let root = tree.root().unwrap();
        let new_root = tree.rotate_left(root);
        assert_eq!(tree.root(), Some(new_root));
        assert_eq!(tree.node(new_root).key, 70);
        assert_eq!(tree.node(root).parent, Some(new_root));

        let back = tree.rotate_right(new_root);
        assert_eq!(back, root);
        assert_eq!(tree.root(), Some(root));

        let after: Vec<_> = tree
            .nodes
            .iter()
            .map(|n| (n.key, n.parent, n.left, n.right))
            .collect();
        assert_eq!(before, after);
        assert_avl(&tree);
    }

    #[test]
    fn rotation_relinks_grandparent() {
        let mut tree = tree_from(&[50, 30, 70, 20, 40]);
        let thirty = tree.find(30).unwrap();
        let fifty = tree.find(50).unwrap();

        let new_sub = tree.rotate_right(thirty);
        assert_eq!(tree.node(new_sub).key, 20);
        assert_eq!(tree.node(fifty).left, Some(new_sub));
        assert_eq!(tree.node(new_sub).parent, Some(fifty));
        assert_eq!(tree.node(thirty).height, 1);
        assert_eq!(tree.node(new_sub).height, 2);
    }

    #[test]
    fn balance_and_height_follow_children() {
        let tree = tree_from(&[50, 30, 70, 20, 40, 10]);
        // 10 triggers a right rotation at 50; 30 becomes the root.
        assert_eq!(root_key(&tree), 30);
        let root = tree.root().unwrap();
        assert_eq!(tree.balance(root), 0);
        assert_eq!(tree.tree_height(), 2);
        assert_eq!(tree.height(None), -1);
        assert_avl(&tree);
    }

    #[test]
    fn attach_links_by_key() {
        let mut tree = tree_from(&[50]);
        let root = tree.root().unwrap();
        let id = tree
            .attach(TreeNode::detached(60, Vec2::ZERO, Vec3::ONE), Some(root))
            .unwrap();
        assert_eq!(tree.node(root).right, Some(id));
        assert_eq!(tree.node(id).parent, Some(root));
        assert_eq!(tree.find(60), Some(id));
    }
}
