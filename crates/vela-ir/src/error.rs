//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur when constructing a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index is outside the circuit's register.
    #[error("Qubit {qubit} is out of range for a circuit with {num_qubits} qubits")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Size of the circuit's register.
        num_qubits: u32,
    },

    /// The operands of a gate must be distinct.
    #[error("Operation requires distinct qubits, got {0} twice")]
    DuplicateQubit(QubitId),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
