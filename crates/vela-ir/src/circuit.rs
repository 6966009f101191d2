//! Flat circuit representation.
//!
//! A [`Circuit`] is an ordered list of gate applications over a fixed-size
//! qubit register. The builder only checks operand validity (bounds,
//! distinctness); classification into single-qubit layers and CZ layers,
//! and the rejection of gates the hardware cannot execute, happens in the
//! compiler's scheduler.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::qubit::QubitId;

/// One gate application in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Lower-case gate name, e.g. `"rz"`, `"h"`, `"cz"`.
    pub gate: String,
    /// Rotation angles or other real parameters, possibly empty.
    pub params: Vec<f64>,
    /// Operands in application order.
    pub qubits: Vec<QubitId>,
}

impl Operation {
    /// True if this is a single-qubit gate.
    #[must_use]
    pub fn is_single_qubit(&self) -> bool {
        self.qubits.len() == 1
    }

    /// True if this is a CZ gate.
    #[must_use]
    pub fn is_cz(&self) -> bool {
        self.qubits.len() == 2 && self.gate == "cz"
    }
}

/// A parameterized single-qubit gate on a concrete target.
///
/// This is the element type of the scheduler's single-qubit layers; it is
/// the same data as a single-qubit [`Operation`] with the operand pulled
/// out of the vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleQubitOp {
    /// Lower-case gate name.
    pub gate: String,
    /// Rotation angles or other real parameters.
    pub params: Vec<f64>,
    /// The qubit the gate acts on.
    pub target: QubitId,
}

/// An ordered sequence of operations over `num_qubits` qubits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    num_qubits: u32,
    ops: Vec<Operation>,
}

impl Circuit {
    /// Create an empty circuit over `num_qubits` qubits.
    #[must_use]
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            ops: Vec::new(),
        }
    }

    /// Number of qubits in the register.
    #[must_use]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of operations.
    #[must_use]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Number of operations acting on two qubits.
    #[must_use]
    pub fn num_two_qubit_ops(&self) -> usize {
        self.ops.iter().filter(|op| op.qubits.len() == 2).count()
    }

    /// Number of operations acting on a single qubit.
    #[must_use]
    pub fn num_single_qubit_ops(&self) -> usize {
        self.ops.iter().filter(|op| op.qubits.len() == 1).count()
    }

    /// Iterate over the operations in program order.
    pub fn ops(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }

    /// Append a generic operation, checking operand validity.
    pub fn append(&mut self, op: Operation) -> IrResult<&mut Self> {
        for (i, &q) in op.qubits.iter().enumerate() {
            if q.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit: q,
                    num_qubits: self.num_qubits,
                });
            }
            if op.qubits[..i].contains(&q) {
                return Err(IrError::DuplicateQubit(q));
            }
        }
        self.ops.push(op);
        Ok(self)
    }

    /// Append a CZ gate.
    pub fn cz(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.append(Operation {
            gate: "cz".to_string(),
            params: vec![],
            qubits: vec![a, b],
        })
    }

    /// Append a parameterless single-qubit gate by name.
    pub fn single(&mut self, gate: impl Into<String>, target: QubitId) -> IrResult<&mut Self> {
        self.append(Operation {
            gate: gate.into(),
            params: vec![],
            qubits: vec![target],
        })
    }

    /// Append a Hadamard gate.
    pub fn h(&mut self, target: QubitId) -> IrResult<&mut Self> {
        self.single("h", target)
    }

    /// Append an X gate.
    pub fn x(&mut self, target: QubitId) -> IrResult<&mut Self> {
        self.single("x", target)
    }

    /// Append an Rz rotation.
    pub fn rz(&mut self, theta: f64, target: QubitId) -> IrResult<&mut Self> {
        self.append(Operation {
            gate: "rz".to_string(),
            params: vec![theta],
            qubits: vec![target],
        })
    }

    /// Append an Ry rotation.
    pub fn ry(&mut self, theta: f64, target: QubitId) -> IrResult<&mut Self> {
        self.append(Operation {
            gate: "ry".to_string(),
            params: vec![theta],
            qubits: vec![target],
        })
    }
}
