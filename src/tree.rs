use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::frequency::FrequencyTable;

/// Index of a node inside a [`HuffmanTree`] arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: NodeId,
        right: NodeId,
    },
}

impl Node {
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }
}

/// Huffman tree stored in an arena. Children always precede their parent,
/// and the tree never changes after [`HuffmanTree::build`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

// Heap entry ordered so BinaryHeap pops the lowest (weight, order) first.
// Leaves use their symbol as order, merged nodes use 256 + merge index,
// which keeps ties deterministic.
#[derive(Debug, PartialEq, Eq)]
struct Pending {
    weight: u64,
    order: u32,
    id: NodeId,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HuffmanTree {
    /// Build an optimal prefix tree for `freqs`.
    ///
    /// The two lightest nodes are merged until one remains; the first one
    /// removed becomes the left (0) child. Returns `None` for an empty table.
    pub fn build(freqs: &FrequencyTable) -> Option<Self> {
        let mut nodes = Vec::with_capacity(freqs.distinct() * 2);
        let mut heap = BinaryHeap::with_capacity(freqs.distinct());

        for (symbol, weight) in freqs.iter() {
            heap.push(Pending {
                weight,
                order: symbol as u32,
                id: nodes.len(),
            });
            nodes.push(Node::Leaf { symbol, weight });
        }

        let mut merges = 0u32;
        while heap.len() > 1 {
            let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
                break;
            };
            let weight = left.weight + right.weight;
            tracing::trace!(left = left.id, right = right.id, weight, "merging nodes");
            heap.push(Pending {
                weight,
                order: 256 + merges,
                id: nodes.len(),
            });
            nodes.push(Node::Internal {
                weight,
                left: left.id,
                right: right.id,
            });
            merges += 1;
        }

        let root = heap.pop()?.id;
        Some(HuffmanTree { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Total weight, equal to the length of the input the tree was built from.
    pub fn weight(&self) -> u64 {
        self.nodes[self.root].weight()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// The symbol of a single-leaf tree, which has no branches to walk.
    pub fn lone_symbol(&self) -> Option<u8> {
        match self.nodes[self.root] {
            Node::Leaf { symbol, .. } => Some(symbol),
            Node::Internal { .. } => None,
        }
    }

    /// Depth of every leaf as `(symbol, depth)` pairs in traversal order.
    pub fn leaf_depths(&self) -> Vec<(u8, usize)> {
        let mut depths = Vec::with_capacity(self.leaf_count());
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes[id] {
                Node::Leaf { symbol, .. } => depths.push((symbol, depth)),
                Node::Internal { left, right, .. } => {
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
            }
        }
        depths
    }

    /// Σ(weight × depth) over all leaves. Zero for a single-leaf tree.
    pub fn weighted_path_length(&self) -> u64 {
        let mut total = 0u64;
        let mut stack = vec![(self.root, 0u64)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes[id] {
                Node::Leaf { weight, .. } => total += weight * depth,
                Node::Internal { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        total
    }
}
