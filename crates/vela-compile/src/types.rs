//! Shared pipeline types.

use std::collections::BTreeSet;

use vela_arch::Site;
use vela_ir::{QubitId, SingleQubitOp};

/// A set of CZ gates with pairwise disjoint operands, executable under one
/// Rydberg pulse. Operands are normalized so that the smaller qubit index
/// comes first.
pub type TwoQubitLayer = Vec<[QubitId; 2]>;

/// The single-qubit gates that must execute before the two-qubit layer of
/// the same index, in program order.
pub type SingleQubitLayer = Vec<SingleQubitOp>;

/// A total map from qubit index to trap site.
pub type Placement = Vec<Site>;

/// Qubits that stay in the entanglement zone across one layer boundary.
/// Ordered so that every iteration over a reuse set is deterministic.
pub type ReuseSet = BTreeSet<QubitId>;

/// For one placement transition: the movement groups, in execution order,
/// each a list of qubits whose atoms ride the same AOD sweep.
pub type Routing = Vec<Vec<QubitId>>;

/// The reuse set for layer boundary `layer -> layer + 1`, empty past the
/// analyzed range.
#[must_use]
pub fn reuse_at(reuse_sets: &[ReuseSet], layer: usize) -> ReuseSet {
    reuse_sets.get(layer).cloned().unwrap_or_default()
}
