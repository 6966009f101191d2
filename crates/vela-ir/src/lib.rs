//! Vela Circuit Intermediate Representation
//!
//! This crate provides the data structures at both ends of the Vela
//! compilation pipeline for zoned neutral-atom hardware.
//!
//! # Overview
//!
//! The *input* side is a flat circuit IR: an ordered list of operations over
//! a register of qubits, where every operation is either a parameterized
//! single-qubit gate or a CZ gate. Zoned neutral-atom hardware executes CZ
//! gates natively via the Rydberg interaction and everything else as
//! single-qubit pulses, so the IR does not admit any other operation kind.
//!
//! The *output* side is the low-level instruction stream emitted by the
//! compiler: parallel shuttling operations ([`NaInstruction::Load`],
//! [`NaInstruction::Move`], [`NaInstruction::Store`]), single-qubit pulses
//! addressed by exact trap coordinates, and the global Rydberg activation.
//!
//! # Example: Building a circuit
//!
//! ```rust
//! use vela_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new(3);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cz(QubitId(0), QubitId(1)).unwrap();
//! circuit.cz(QubitId(1), QubitId(2)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 3);
//! assert_eq!(circuit.num_two_qubit_ops(), 2);
//! ```

pub mod circuit;
pub mod error;
pub mod program;
pub mod qubit;

pub use circuit::{Circuit, Operation, SingleQubitOp};
pub use error::{IrError, IrResult};
pub use program::{NaInstruction, NaProgram, Position};
pub use qubit::QubitId;
