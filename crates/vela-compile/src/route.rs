//! Routing: grouping movements into parallel AOD sweeps.

use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use vela_arch::Architecture;
use vela_ir::QubitId;

use crate::types::{Placement, Routing};

/// Configuration of the independent-set router. There are no tunables.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RouterConfig {}

/// A movement in exact coordinates: `(x_start, y_start, x_end, y_end)`.
type MovementVector = (u64, u64, u64, u64);

/// Forms movement groups by repeatedly extracting a maximal independent
/// set from the conflict graph of the pending movements.
///
/// Movements are considered in order of decreasing distance, so the atoms
/// with the longest way to go are routed first and the groups tend toward
/// homogenous movement distances; the duration of a sweep is that of its
/// longest movement.
#[derive(Debug, Clone, Copy)]
pub struct IndependentSetRouter<'a> {
    architecture: &'a Architecture,
}

impl<'a> IndependentSetRouter<'a> {
    /// Create a router for the given architecture.
    #[must_use]
    pub fn new(architecture: &'a Architecture, _config: RouterConfig) -> Self {
        Self { architecture }
    }

    /// Compute the routing for every transition of the placement sequence;
    /// the result has one entry per adjacent placement pair.
    #[must_use]
    pub fn route(&self, placements: &[Placement]) -> Vec<Routing> {
        placements
            .windows(2)
            .map(|pair| self.route_transition(&pair[0], &pair[1]))
            .collect()
    }

    fn route_transition(&self, start: &Placement, target: &Placement) -> Routing {
        debug_assert_eq!(start.len(), target.len());
        // Atoms whose site changes, by distance descending (ties broken
        // toward the larger qubit index).
        let mut moving: Vec<(f64, QubitId)> = (0..start.len())
            .filter(|&q| start[q] != target[q])
            .map(|q| (self.architecture.distance(start[q], target[q]), QubitId::from(q)))
            .collect();
        moving.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        let mut atoms_to_move: Vec<QubitId> = moving.into_iter().map(|(_, q)| q).collect();

        // Conflict graph: an edge joins two movements that cannot share
        // one AOD sweep.
        let mut graph: UnGraph<QubitId, ()> = UnGraph::default();
        let nodes: Vec<NodeIndex> = atoms_to_move.iter().map(|&q| graph.add_node(q)).collect();
        let vectors: Vec<MovementVector> = atoms_to_move
            .iter()
            .map(|&q| self.movement_vector(start, target, q))
            .collect();
        for i in 0..atoms_to_move.len() {
            for j in i + 1..atoms_to_move.len() {
                if !is_compatible_movement(vectors[i], vectors[j]) {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }
        let node_of: rustc_hash::FxHashMap<QubitId, NodeIndex> = atoms_to_move
            .iter()
            .zip(&nodes)
            .map(|(&q, &n)| (q, n))
            .collect();

        let mut routing = Routing::new();
        while !atoms_to_move.is_empty() {
            let mut group: Vec<QubitId> = Vec::new();
            let mut remaining: Vec<QubitId> = Vec::new();
            let mut conflicting: FxHashSet<QubitId> = FxHashSet::default();
            for &atom in &atoms_to_move {
                if conflicting.contains(&atom) {
                    remaining.push(atom);
                } else {
                    group.push(atom);
                    for neighbor in graph.neighbors(node_of[&atom]) {
                        conflicting.insert(graph[neighbor]);
                    }
                }
            }
            routing.push(group);
            atoms_to_move = remaining;
        }
        routing
    }

    fn movement_vector(&self, start: &Placement, target: &Placement, q: QubitId) -> MovementVector {
        let (x1, y1) = self.architecture.exact_location(start[q.index()]);
        let (x2, y2) = self.architecture.exact_location(target[q.index()]);
        (x1, y1, x2, y2)
    }
}

/// Two movements can share one AOD sweep iff the relative order of the
/// atoms is preserved per axis: equal starts must stay equal (same AOD
/// row/column), and strictly ordered starts must stay strictly ordered.
#[must_use]
pub fn is_compatible_movement(v: MovementVector, w: MovementVector) -> bool {
    let (vx1, vy1, vx2, vy2) = v;
    let (wx1, wy1, wx2, wy2) = w;
    if (vx1 == wx1) != (vx2 == wx2) {
        return false;
    }
    if (vx1 < wx1) != (vx2 < wx2) {
        return false;
    }
    if (vy1 == wy1) != (vy2 == wy2) {
        return false;
    }
    if (vy1 < wy1) != (vy2 < wy2) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_arch::Site;

    fn arch() -> Architecture {
        Architecture::from_json_str(include_str!(
            "../../vela-arch/tests/fixtures/compute_store.json"
        ))
        .unwrap()
    }

    fn router(arch: &Architecture) -> IndependentSetRouter<'_> {
        IndependentSetRouter::new(arch, RouterConfig::default())
    }

    #[test]
    fn test_identity_transition_is_empty() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let placement = vec![Site::new(storage, 0, 0), Site::new(storage, 0, 1)];
        let routing = router(&arch).route(&[placement.clone(), placement]);
        assert_eq!(routing.len(), 1);
        assert!(routing[0].is_empty());
    }

    #[test]
    fn test_order_preserving_movements_share_a_group() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let start = vec![Site::new(storage, 19, 0), Site::new(storage, 19, 1)];
        let target = vec![Site::new(storage, 10, 0), Site::new(storage, 10, 1)];
        let routing = router(&arch).route(&[start, target]);
        assert_eq!(routing[0].len(), 1);
        assert_eq!(routing[0][0].len(), 2);
    }

    #[test]
    fn test_crossing_movements_are_split() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        // The two atoms swap their column order.
        let start = vec![Site::new(storage, 19, 0), Site::new(storage, 19, 1)];
        let target = vec![Site::new(storage, 10, 5), Site::new(storage, 10, 2)];
        let routing = router(&arch).route(&[start, target]);
        assert_eq!(routing[0].len(), 2);
        assert_eq!(routing[0][0].len(), 1);
        assert_eq!(routing[0][1].len(), 1);
    }

    #[test]
    fn test_longest_movement_goes_first() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let start = vec![Site::new(storage, 19, 0), Site::new(storage, 19, 3)];
        let target = vec![Site::new(storage, 10, 0), Site::new(storage, 10, 3)];
        let routing = router(&arch).route(&[start, target]);
        // Equal distances: the tie goes to the larger qubit index.
        assert_eq!(routing[0], vec![vec![QubitId(1), QubitId(0)]]);
    }

    #[test]
    fn test_compatibility_predicate() {
        // Same relative order on both axes.
        assert!(is_compatible_movement((0, 0, 10, 10), (5, 0, 15, 10)));
        // Horizontal order flips.
        assert!(!is_compatible_movement((0, 0, 10, 10), (5, 0, 5, 10)));
        // Atoms merge onto one column.
        assert!(!is_compatible_movement((0, 0, 10, 10), (5, 0, 10, 20)));
        // Vertical order flips.
        assert!(!is_compatible_movement((0, 0, 10, 10), (0, 5, 10, 2)));
        // Identical columns stay identical.
        assert!(is_compatible_movement((3, 0, 3, 10), (3, 5, 3, 15)));
    }
}
