//! ASAP gate scheduling.

use serde::{Deserialize, Serialize};
use tracing::debug;
use vela_arch::Architecture;
use vela_ir::{Circuit, SingleQubitOp};

use crate::error::{CompileError, CompileResult};
use crate::types::{SingleQubitLayer, TwoQubitLayer};

/// Configuration of the ASAP scheduler. There are no tunables.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {}

/// Partitions a circuit into alternating single-qubit and two-qubit gate
/// layers, as soon as possible: every CZ is placed in the earliest layer
/// in which both of its operands are available.
#[derive(Debug, Clone, Copy)]
pub struct AsapScheduler<'a> {
    architecture: &'a Architecture,
}

impl<'a> AsapScheduler<'a> {
    /// Create a scheduler for the given architecture.
    #[must_use]
    pub fn new(architecture: &'a Architecture, _config: SchedulerConfig) -> Self {
        Self { architecture }
    }

    /// Schedule the circuit.
    ///
    /// Returns `(single_qubit_layers, two_qubit_layers)` with
    /// `single_qubit_layers.len() == two_qubit_layers.len() + 1`: layer `i`
    /// of the former logically precedes layer `i` of the latter, and the
    /// final entry holds the trailing single-qubit gates.
    ///
    /// Two-qubit gate layers never exceed the architecture's entanglement
    /// capacity: oversized layers are split into consecutive sub-layers,
    /// with the accompanying single-qubit gates staying with the first.
    pub fn schedule(
        &self,
        circuit: &Circuit,
    ) -> CompileResult<(Vec<SingleQubitLayer>, Vec<TwoQubitLayer>)> {
        let mut sq_layers: Vec<SingleQubitLayer> = Vec::new();
        let mut tq_layers: Vec<TwoQubitLayer> = Vec::new();
        let mut time = vec![0usize; circuit.num_qubits() as usize];

        for op in circuit.ops() {
            match op.qubits.as_slice() {
                [target] => {
                    let t = time[target.index()];
                    if t >= sq_layers.len() {
                        sq_layers.resize_with(t + 1, Vec::new);
                    }
                    sq_layers[t].push(SingleQubitOp {
                        gate: op.gate.clone(),
                        params: op.params.clone(),
                        target: *target,
                    });
                }
                [a, b] if op.gate == "cz" => {
                    let t = time[a.index()].max(time[b.index()]);
                    if t >= tq_layers.len() {
                        tq_layers.resize_with(t + 1, Vec::new);
                    }
                    let gate = if a < b { [*a, *b] } else { [*b, *a] };
                    tq_layers[t].push(gate);
                    time[a.index()] = t + 1;
                    time[b.index()] = t + 1;
                }
                qubits => {
                    return Err(CompileError::UnsupportedGate {
                        gate: op.gate.clone(),
                        num_qubits: qubits.len(),
                    });
                }
            }
        }
        debug_assert!(tq_layers.iter().all(|layer| !layer.is_empty()));

        let (sq_layers, tq_layers) = self.split_by_capacity(sq_layers, tq_layers)?;
        debug!(
            single_qubit_layers = sq_layers.len(),
            two_qubit_layers = tq_layers.len(),
            "scheduling finished"
        );
        Ok((sq_layers, tq_layers))
    }

    /// Split layers that exceed the number of interaction pairs into
    /// consecutive sub-layers at or below capacity.
    fn split_by_capacity(
        &self,
        mut sq_layers: Vec<SingleQubitLayer>,
        tq_layers: Vec<TwoQubitLayer>,
    ) -> CompileResult<(Vec<SingleQubitLayer>, Vec<TwoQubitLayer>)> {
        let capacity = self.architecture.entanglement_capacity();
        if tq_layers.iter().any(|layer| !layer.is_empty()) && capacity == 0 {
            let gates = tq_layers.iter().map(|layer| layer.len()).max().unwrap_or(0);
            return Err(CompileError::CapacityOverflow { gates, capacity });
        }
        sq_layers.resize_with(tq_layers.len() + 1, Vec::new);

        let mut split_sq: Vec<SingleQubitLayer> = Vec::new();
        let mut split_tq: Vec<TwoQubitLayer> = Vec::new();
        for (i, layer) in tq_layers.into_iter().enumerate() {
            split_sq.push(std::mem::take(&mut sq_layers[i]));
            if layer.len() <= capacity {
                split_tq.push(layer);
            } else {
                for (j, chunk) in layer.chunks(capacity).enumerate() {
                    if j > 0 {
                        split_sq.push(Vec::new());
                    }
                    split_tq.push(chunk.to_vec());
                }
            }
        }
        split_sq.push(std::mem::take(sq_layers.last_mut().expect("trailing layer")));
        Ok((split_sq, split_tq))
    }
}
