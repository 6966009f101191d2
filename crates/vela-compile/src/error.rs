//! Error types for the compilation pipeline.
//!
//! Nothing here is recoverable: every error aborts the compile and is
//! surfaced to the caller; the compiler never retries and never emits
//! partial output.

use thiserror::Error;
use vela_arch::ArchitectureError;

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The architecture specification is malformed.
    #[error(transparent)]
    InvalidArchitecture(#[from] ArchitectureError),

    /// The compiler configuration document is malformed.
    #[error("invalid compiler configuration: {0}")]
    InvalidConfiguration(String),

    /// The circuit contains a gate outside {CZ, single-qubit}.
    #[error("gate '{gate}' on {num_qubits} qubits is not supported; only single-qubit gates and CZ are")]
    UnsupportedGate {
        /// Name of the offending gate.
        gate: String,
        /// Number of operands.
        num_qubits: usize,
    },

    /// A two-qubit gate layer exceeds the total entanglement capacity even
    /// after splitting.
    #[error("two-qubit gate layer with {gates} gates exceeds entanglement capacity of {capacity}")]
    CapacityOverflow {
        /// Gates in the offending layer.
        gates: usize,
        /// Total interaction pairs of the architecture.
        capacity: usize,
    },

    /// The placer could not construct a feasible assignment.
    #[error("placement infeasible: {0}")]
    PlacementInfeasible(String),

    /// The A* search exhausted its node budget.
    #[error(
        "placement search exceeded {max_nodes} nodes; increase max_nodes or \
         raise deepening_factor/deepening_value to prune the search tree"
    )]
    NodeLimitExceeded {
        /// The configured node budget.
        max_nodes: u64,
    },

    /// A produced placement violates an internal invariant (non-injective
    /// map or broken interaction pair).
    #[error("internal invariant broken: {0}")]
    InternalInvariantBroken(String),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
