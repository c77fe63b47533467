//! Level-order (breadth-first) traversal with complete-binary-tree indices.
//!
//! Each visited node is reported with its depth and its index within that
//! depth, where the root has index 0 and the children of index `i` have
//! indices `2i` and `2i + 1`. Missing children leave gaps in the indexing,
//! which is what [`crate::layout`] relies on for horizontal spacing.

use crate::tree::Tree;
use crate::types::NodeId;

/// One step of a level-order traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visit {
    pub id: NodeId,
    pub level: u32,
    pub index: u64,
}

/// Restartable traversal state.
///
/// The pending-node queue is a ring buffer allocated once with the tree's
/// capacity. Running out of room means the tree holds more nodes than it
/// was sized for, which is treated as a fatal invariant violation.
#[derive(Debug)]
pub struct LevelOrder {
    queue: Vec<Visit>,
    head: usize,
    len: usize,
}

impl LevelOrder {
    pub fn with_capacity(capacity: usize) -> Self {
        let placeholder = Visit {
            id: 0,
            level: 0,
            index: 0,
        };
        Self {
            queue: vec![placeholder; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    /// Starts a fresh traversal of `tree`, discarding any unfinished one.
    pub fn reset(&mut self, tree: &Tree) {
        self.head = 0;
        self.len = 0;
        if let Some(root) = tree.root() {
            self.push(Visit {
                id: root,
                level: 0,
                index: 0,
            });
        }
    }

    /// Returns the next node in breadth-first order, or `None` when the
    /// traversal is complete.
    ///
    /// `tree` must be the tree passed to the last [`LevelOrder::reset`] and
    /// must not have changed shape since.
    pub fn next(&mut self, tree: &Tree) -> Option<Visit> {
        let visit = self.pop()?;
        let node = tree.node(visit.id);
        if let Some(left) = node.left {
            self.push(Visit {
                id: left,
                level: visit.level + 1,
                index: visit.index * 2,
            });
        }
        if let Some(right) = node.right {
            self.push(Visit {
                id: right,
                level: visit.level + 1,
                index: visit.index * 2 + 1,
            });
        }
        Some(visit)
    }

    fn push(&mut self, visit: Visit) {
        let cap = self.queue.len();
        assert!(
            self.len < cap,
            "level-order queue overflow: more than {cap} nodes pending"
        );
        self.queue[(self.head + self.len) % cap] = visit;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<Visit> {
        if self.len == 0 {
            return None;
        }
        let visit = self.queue[self.head];
        self.head = (self.head + 1) % self.queue.len();
        self.len -= 1;
        Some(visit)
    }
}

/// Borrowing iterator over a tree in level order.
#[derive(Debug)]
pub struct LevelOrderIter<'a> {
    tree: &'a Tree,
    state: LevelOrder,
}

impl Iterator for LevelOrderIter<'_> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        self.state.next(self.tree)
    }
}

impl Tree {
    /// Level-order traversal with its own queue sized to the tree capacity.
    pub fn level_order(&self) -> LevelOrderIter<'_> {
        let mut state = LevelOrder::with_capacity(self.capacity());
        state.reset(self);
        LevelOrderIter { tree: self, state }
    }
}
