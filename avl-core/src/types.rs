/// Identifier for a node in a [`crate::tree::Tree`].
///
/// This is an index into the tree's node arena, and is only meaningful
/// within the lifetime of a given `Tree` instance.
pub type NodeId = usize;

/// Key stored in a tree node.
pub type Key = u32;

/// Keys are small non-negative integers in `0..KEY_LIMIT`.
pub const KEY_LIMIT: Key = 100;

/// Default upper bound on the number of nodes a tree may hold.
///
/// Every key in `0..KEY_LIMIT` fits, so a tree seeded from that domain can
/// never outgrow it.
pub const MAX_NODES: usize = 100;

