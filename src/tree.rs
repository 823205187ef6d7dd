// tree.rs: path-compressed binary trie over the 128 bit keyspace
use crate::node::TreeNode;

/// Number of leading bits in which two keys agree; 128 when they are equal.
pub fn matching_prefix(l: u128, r: u128) -> u32 {
    (l ^ r).leading_zeros()
}

// Bit of `key` at `index`, counted from the most significant bit down.
fn bit_at(key: u128, index: u32) -> u8 {
    ((key >> (127 - index)) & 1) as u8
}

/// Insert-only patricia trie keyed by 128 bit addresses.
///
/// An insertion or a lookup walks at most 128 nodes however many prefixes are
/// stored. Inserting never leaves the structure half-mutated: each call either
/// completes one of the rewrites below or returns without touching a node.
#[derive(Debug, Clone, Default)]
pub struct PatriciaTree {
    root: Option<Box<TreeNode>>,
}

impl PatriciaTree {
    pub fn new() -> Self {
        PatriciaTree { root: None }
    }

    /// Insert a prefix of `prefix` leading bits anchored at `key`. Bits of
    /// `key` past `prefix` are ignored.
    pub fn insert(&mut self, key: u128, prefix: u32) {
        // bits consumed by the ancestors of the current node
        let mut offset = 0;
        let mut slot = &mut self.root;

        while let Some(node) = slot {
            let matching = matching_prefix(key, node.key);
            let node_end = offset + node.prefix;

            // the incoming prefix is coarser and fully agreed on: it covers
            // everything below this node
            if matching >= prefix && prefix < node_end {
                node.prefix = prefix - offset;
                node.left = None;
                node.right = None;
                return;
            }

            // the incoming key diverges strictly inside this node's span:
            // three way split
            if matching < prefix && matching < node_end {
                let incoming = Box::new(TreeNode::new(key, prefix - matching));
                let lower = Box::new(TreeNode {
                    key: node.key,
                    prefix: node_end - matching,
                    left: node.left.take(),
                    right: node.right.take(),
                });
                // the stored key's first bit past the common run decides
                // which side keeps the old subtree
                if bit_at(node.key, matching) == 0 {
                    node.left = Some(lower);
                    node.right = Some(incoming);
                } else {
                    node.left = Some(incoming);
                    node.right = Some(lower);
                }
                node.prefix = matching - offset;
                return;
            }

            // a leaf that neither splits nor shrinks already covers the
            // incoming range
            if node.is_leaf() {
                return;
            }

            offset = node_end;
            slot = if bit_at(key, offset) == 0 {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        // only an empty trie runs the loop to completion
        *slot = Some(Box::new(TreeNode::new(key, prefix)));
    }

    /// Whether `key` falls inside any inserted prefix.
    pub fn contains(&self, key: u128) -> bool {
        let mut offset = 0;
        let mut slot = &self.root;

        while let Some(node) = slot {
            let matching = matching_prefix(key, node.key);
            offset += node.prefix;
            if matching < offset {
                return false;
            }
            if node.is_leaf() || matching == 128 {
                return true;
            }
            slot = if bit_at(key, offset) == 0 {
                &node.left
            } else {
                &node.right
            };
        }

        false
    }
}
