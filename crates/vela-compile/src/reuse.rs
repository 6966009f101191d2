//! Reuse analysis over adjacent two-qubit gate layers.
//!
//! An atom that participates in consecutive layers can stay in the
//! entanglement zone instead of making a storage round-trip, saving two
//! trap transfers. Which atoms get that chance is decided here, by a
//! maximum bipartite matching between the gates of adjacent layers; the
//! placer still makes the final call per boundary.

use std::collections::BTreeSet;

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use vela_ir::QubitId;

use crate::types::{ReuseSet, TwoQubitLayer};

/// How reuse candidates are collected at each layer boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReuseStrategy {
    /// Match gates sharing at least one qubit; every shared qubit of a
    /// matched gate pair becomes a reuse candidate.
    #[default]
    PerQubit,
    /// A gate's qubits only become candidates together, when both come
    /// from one and the same gate of the previous layer; the remaining
    /// gates still go through the per-qubit matching.
    PairedGates,
    /// No reuse: every atom returns to storage after its gate.
    Disabled,
}

/// Configuration of the reuse analyzer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReuseConfig {
    /// The collection strategy.
    pub strategy: ReuseStrategy,
}

/// Chooses reuse sets maximizing the number of atoms that avoid storage
/// round-trips, via maximum bipartite matching between the gates of
/// adjacent layers.
#[derive(Debug, Clone, Copy)]
pub struct VertexMatchingReuseAnalyzer {
    config: ReuseConfig,
}

impl VertexMatchingReuseAnalyzer {
    /// Create an analyzer with the given configuration.
    #[must_use]
    pub fn new(config: ReuseConfig) -> Self {
        Self { config }
    }

    /// Compute one reuse set per layer boundary; the result has
    /// `layers.len().saturating_sub(1)` entries, entry `i` describing the
    /// boundary `i -> i + 1`.
    #[must_use]
    pub fn analyze(&self, layers: &[TwoQubitLayer]) -> Vec<ReuseSet> {
        if layers.len() < 2 {
            return Vec::new();
        }
        (0..layers.len() - 1)
            .map(|i| match self.config.strategy {
                ReuseStrategy::PerQubit => analyze_boundary(&layers[i], &layers[i + 1], false),
                ReuseStrategy::PairedGates => analyze_boundary(&layers[i], &layers[i + 1], true),
                ReuseStrategy::Disabled => ReuseSet::new(),
            })
            .collect()
    }
}

/// The qubits of `gate` that also appear in `other`.
fn shared_qubits(gate: [QubitId; 2], other: [QubitId; 2]) -> impl Iterator<Item = QubitId> {
    gate.into_iter().filter(move |q| other.contains(q))
}

fn analyze_boundary(previous: &TwoQubitLayer, next: &TwoQubitLayer, paired: bool) -> ReuseSet {
    let mut reuse = ReuseSet::new();

    // In paired mode, gates whose operands both come from one previous
    // gate keep both atoms in place and are excluded from the matching.
    let mut matched_next: BTreeSet<usize> = BTreeSet::new();
    if paired {
        for (j, &gate) in next.iter().enumerate() {
            if previous.contains(&gate) {
                reuse.extend(gate);
                matched_next.insert(j);
            }
        }
    }

    // Bipartite conflict-free assignment: previous-layer gates on the
    // left, next-layer gates on the right, an edge wherever a qubit is
    // shared. A maximum matching maximizes the number of gate pairs that
    // can hand an atom over directly.
    let mut graph: UnGraph<(), ()> = UnGraph::default();
    let left: Vec<NodeIndex> = previous.iter().map(|_| graph.add_node(())).collect();
    let right: Vec<NodeIndex> = next.iter().map(|_| graph.add_node(())).collect();
    for (i, &prev_gate) in previous.iter().enumerate() {
        for (j, &next_gate) in next.iter().enumerate() {
            if matched_next.contains(&j) {
                continue;
            }
            if shared_qubits(next_gate, prev_gate).next().is_some() {
                graph.add_edge(left[i], right[j], ());
            }
        }
    }
    let matching = petgraph::algo::matching::maximum_matching(&graph);
    for (i, &prev_gate) in previous.iter().enumerate() {
        if let Some(mate) = matching.mate(left[i]) {
            let j = mate.index() - previous.len();
            reuse.extend(shared_qubits(next[j], prev_gate));
        }
    }
    reuse
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(gates: &[[u32; 2]]) -> TwoQubitLayer {
        gates.iter().map(|&[a, b]| [QubitId(a), QubitId(b)]).collect()
    }

    fn analyze(strategy: ReuseStrategy, layers: &[TwoQubitLayer]) -> Vec<ReuseSet> {
        VertexMatchingReuseAnalyzer::new(ReuseConfig { strategy }).analyze(layers)
    }

    #[test]
    fn test_single_layer_has_no_boundaries() {
        let layers = vec![layer(&[[0, 1]])];
        assert!(analyze(ReuseStrategy::PerQubit, &layers).is_empty());
    }

    #[test]
    fn test_chain_reuses_the_shared_qubit() {
        let layers = vec![layer(&[[0, 1]]), layer(&[[1, 2]])];
        let reuse = analyze(ReuseStrategy::PerQubit, &layers);
        assert_eq!(reuse.len(), 1);
        assert_eq!(reuse[0], ReuseSet::from([QubitId(1)]));
    }

    #[test]
    fn test_matching_is_conflict_free() {
        // Both next-layer gates touch qubit 1's previous gate, but a gate
        // can hand over atoms to only one successor.
        let layers = vec![layer(&[[0, 1]]), layer(&[[1, 2], [0, 3]])];
        let reuse = analyze(ReuseStrategy::PerQubit, &layers);
        assert_eq!(reuse[0].len(), 1);
        let q = *reuse[0].iter().next().unwrap();
        assert!(q == QubitId(0) || q == QubitId(1));
    }

    #[test]
    fn test_repeated_gate_reuses_both_qubits() {
        let layers = vec![layer(&[[0, 1]]), layer(&[[0, 1]])];
        for strategy in [ReuseStrategy::PerQubit, ReuseStrategy::PairedGates] {
            let reuse = analyze(strategy, &layers);
            assert_eq!(reuse[0], ReuseSet::from([QubitId(0), QubitId(1)]));
        }
    }

    #[test]
    fn test_paired_mode_still_matches_leftover_gates() {
        let layers = vec![layer(&[[0, 1], [2, 3]]), layer(&[[0, 1], [3, 4]])];
        let reuse = analyze(ReuseStrategy::PairedGates, &layers);
        assert!(reuse[0].contains(&QubitId(0)));
        assert!(reuse[0].contains(&QubitId(1)));
        assert!(reuse[0].contains(&QubitId(3)));
    }

    #[test]
    fn test_disabled_strategy_is_empty() {
        let layers = vec![layer(&[[0, 1]]), layer(&[[1, 2]])];
        let reuse = analyze(ReuseStrategy::Disabled, &layers);
        assert_eq!(reuse, vec![ReuseSet::new()]);
    }

    #[test]
    fn test_reused_qubits_appear_in_both_layers() {
        let layers = vec![
            layer(&[[0, 1], [2, 3], [4, 5]]),
            layer(&[[1, 2], [3, 6], [5, 0]]),
        ];
        for strategy in [ReuseStrategy::PerQubit, ReuseStrategy::PairedGates] {
            for reuse in analyze(strategy, &layers) {
                for q in reuse {
                    assert!(layers[0].iter().any(|g| g.contains(&q)));
                    assert!(layers[1].iter().any(|g| g.contains(&q)));
                }
            }
        }
    }
}
