//! A* tree search over an arena of search nodes.
//!
//! The search space of the A* placer is a tree: every path uniquely
//! identifies a sequence of job-option choices, so no closed set and no
//! open-set membership test is needed. Nodes live in a chunked arena that
//! never moves them, so parent links stay valid until the whole search is
//! dropped at once; path reconstruction just walks them back.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{CompileError, CompileResult};

/// Index of a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(u32);

/// Nodes per arena chunk. Chunks are allocated whole, so growth never
/// relocates existing nodes.
const CHUNK: usize = 1 << 12;

/// Growable arena owning every node of one search.
pub(crate) struct NodeArena<T> {
    chunks: Vec<Vec<T>>,
    len: usize,
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn push(&mut self, node: T) -> NodeId {
        if self.len == self.chunks.len() * CHUNK {
            self.chunks.push(Vec::with_capacity(CHUNK));
        }
        self.chunks.last_mut().expect("chunk exists").push(node);
        let id = NodeId(u32::try_from(self.len).expect("arena exceeds u32 indices"));
        self.len += 1;
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> &T {
        &self.chunks[id.0 as usize / CHUNK][id.0 as usize % CHUNK]
    }
}

/// A node that knows its parent, for path reconstruction.
pub(crate) trait TreeNode {
    fn parent(&self) -> Option<NodeId>;
}

struct OpenEntry {
    priority: f64,
    id: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the heap pops the entry with the lowest priority;
        // ties go to the older node.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.id.0.cmp(&self.id.0))
    }
}

/// Run A* from `root` until a goal node is found, and return the node path
/// from the root to the goal (inclusive).
///
/// `expand` creates the children of a node in the arena and returns their
/// ids; it is called at most once per node. The search aborts with
/// [`CompileError::NodeLimitExceeded`] once the arena holds `max_nodes`
/// nodes, and with [`CompileError::PlacementInfeasible`] when the open set
/// runs dry without reaching a goal.
pub(crate) fn a_star_tree_search<T: TreeNode>(
    arena: &mut NodeArena<T>,
    root: NodeId,
    mut expand: impl FnMut(&mut NodeArena<T>, NodeId) -> Vec<NodeId>,
    is_goal: impl Fn(&T) -> bool,
    cost: impl Fn(&T) -> f64,
    heuristic: impl Fn(&T) -> f64,
    max_nodes: u64,
) -> CompileResult<Vec<NodeId>> {
    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    open.push(OpenEntry {
        priority: heuristic(arena.get(root)),
        id: root,
    });
    while (arena.len() as u64) < max_nodes && !open.is_empty() {
        let entry = open.pop().expect("open set is non-empty");
        if is_goal(arena.get(entry.id)) {
            // With an admissible heuristic this is the cheapest path to
            // any goal; reconstruct it back-to-front.
            let mut path = Vec::new();
            let mut current = Some(entry.id);
            while let Some(id) = current {
                path.push(id);
                current = arena.get(id).parent();
            }
            path.reverse();
            return Ok(path);
        }
        for child in expand(arena, entry.id) {
            let node = arena.get(child);
            let priority = cost(node) + heuristic(node);
            debug_assert!(!priority.is_nan());
            open.push(OpenEntry {
                priority,
                id: child,
            });
        }
    }
    if arena.len() as u64 >= max_nodes {
        Err(CompileError::NodeLimitExceeded { max_nodes })
    } else {
        Err(CompileError::PlacementInfeasible(
            "no path from the start node to any goal".to_string(),
        ))
    }
}
