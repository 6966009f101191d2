//! Instruction emission.
//!
//! Consumes the placement sequence and the routing and emits one linear
//! [`NaProgram`]. Per two-qubit layer: the preceding single-qubit gates at
//! their current storage sites, the shuttling into the entanglement zone,
//! the Rydberg pulse, and the shuttling back. Each movement group becomes
//! a `load`/`move`/`store` triple; with a non-zero parking offset the
//! transit happens at a vertical offset from the trap rows so in-flight
//! atoms never pass directly over an occupied trap.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;
use vela_arch::Architecture;
use vela_ir::{NaInstruction, NaProgram, Position, QubitId};

use crate::error::{CompileError, CompileResult};
use crate::types::{Placement, Routing, SingleQubitLayer};

/// Gates the hardware executes natively as parameterized single-qubit
/// pulses; anything else is emitted verbatim but flagged.
const NATIVE_SINGLE_QUBIT_GATES: [&str; 4] = ["rz", "ry", "rx", "u"];

/// Configuration of the code generator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeGeneratorConfig {
    /// Vertical clearance, in µm, kept between in-flight atoms and the
    /// trap rows during a sweep. Zero emits direct site-to-site moves.
    pub parking_offset: u64,
    /// Whether gates outside the native set produce a warning.
    pub warn_unsupported_gates: bool,
}

impl Default for CodeGeneratorConfig {
    fn default() -> Self {
        Self {
            parking_offset: 1,
            warn_unsupported_gates: true,
        }
    }
}

/// The code generator.
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator<'a> {
    architecture: &'a Architecture,
    config: CodeGeneratorConfig,
}

impl<'a> CodeGenerator<'a> {
    /// Create a code generator for the given architecture and
    /// configuration.
    #[must_use]
    pub fn new(architecture: &'a Architecture, config: CodeGeneratorConfig) -> Self {
        Self {
            architecture,
            config,
        }
    }

    /// Emit the instruction stream for the compiled circuit.
    ///
    /// Expects `placements.len() == 2 * L + 1` for `L` two-qubit layers,
    /// `routings.len() == placements.len() - 1`, and one single-qubit
    /// layer per placement gap (`L + 1` in total).
    pub fn generate(
        &self,
        single_qubit_layers: &[SingleQubitLayer],
        placements: &[Placement],
        routings: &[Routing],
    ) -> CompileResult<NaProgram> {
        if placements.is_empty() || routings.len() != placements.len() - 1 {
            return Err(CompileError::InternalInvariantBroken(format!(
                "routing length {} does not match placement sequence length {}",
                routings.len(),
                placements.len()
            )));
        }
        let num_layers = placements.len() / 2;
        let mut program = NaProgram {
            initial_positions: placements[0]
                .iter()
                .map(|&site| self.position(site))
                .collect(),
            instructions: Vec::new(),
        };
        let mut warned: BTreeSet<String> = BTreeSet::new();

        self.emit_single_qubit_layer(
            &mut program,
            single_qubit_layers.first(),
            &placements[0],
            &mut warned,
        );
        for layer in 0..num_layers {
            // Into the entanglement zone, pulse, and back to storage.
            self.emit_routing(
                &mut program,
                &placements[2 * layer],
                &placements[2 * layer + 1],
                &routings[2 * layer],
            );
            program.instructions.push(NaInstruction::Rydberg);
            self.emit_routing(
                &mut program,
                &placements[2 * layer + 1],
                &placements[2 * layer + 2],
                &routings[2 * layer + 1],
            );
            self.emit_single_qubit_layer(
                &mut program,
                single_qubit_layers.get(layer + 1),
                &placements[2 * layer + 2],
                &mut warned,
            );
        }
        Ok(program)
    }

    fn position(&self, site: vela_arch::Site) -> Position {
        let (x, y) = self.architecture.exact_location(site);
        Position::new(x, y)
    }

    fn emit_single_qubit_layer(
        &self,
        program: &mut NaProgram,
        layer: Option<&SingleQubitLayer>,
        placement: &Placement,
        warned: &mut BTreeSet<String>,
    ) {
        let Some(layer) = layer else { return };
        for op in layer {
            if self.config.warn_unsupported_gates
                && !NATIVE_SINGLE_QUBIT_GATES.contains(&op.gate.as_str())
                && warned.insert(op.gate.clone())
            {
                warn!(gate = %op.gate, "gate is not native to the hardware");
            }
        }
        // A layer pulsing every atom identically compresses to one global
        // pulse; parked atoms are out of its reach by construction.
        if placement.len() > 1
            && layer.len() == placement.len()
            && layer
                .iter()
                .enumerate()
                .all(|(i, op)| op.target == QubitId::from(i))
            && layer
                .windows(2)
                .all(|w| w[0].gate == w[1].gate && w[0].params == w[1].params)
        {
            program.instructions.push(NaInstruction::GlobalSq {
                gate: layer[0].gate.clone(),
                params: layer[0].params.clone(),
            });
            return;
        }
        for op in layer {
            program.instructions.push(NaInstruction::LocalSq {
                gate: op.gate.clone(),
                params: op.params.clone(),
                positions: vec![self.position(placement[op.target.index()])],
            });
        }
    }

    fn emit_routing(
        &self,
        program: &mut NaProgram,
        start: &Placement,
        target: &Placement,
        routing: &Routing,
    ) {
        for group in routing {
            let starts: Vec<Position> = group
                .iter()
                .map(|&q| self.position(start[q.index()]))
                .collect();
            let ends: Vec<Position> = group
                .iter()
                .map(|&q| self.position(target[q.index()]))
                .collect();
            program.instructions.push(NaInstruction::Load {
                positions: starts.clone(),
            });
            let offset = self.config.parking_offset;
            if offset == 0 {
                program.instructions.push(NaInstruction::Move {
                    starts: starts.clone(),
                    ends: ends.clone(),
                });
            } else {
                let lift = |positions: &[Position]| -> Vec<Position> {
                    positions
                        .iter()
                        .map(|p| Position::new(p.x, p.y + offset))
                        .collect()
                };
                let lifted_starts = lift(&starts);
                let lifted_ends = lift(&ends);
                program.instructions.push(NaInstruction::Move {
                    starts: starts.clone(),
                    ends: lifted_starts.clone(),
                });
                program.instructions.push(NaInstruction::Move {
                    starts: lifted_starts,
                    ends: lifted_ends.clone(),
                });
                program.instructions.push(NaInstruction::Move {
                    starts: lifted_ends,
                    ends: ends.clone(),
                });
            }
            program.instructions.push(NaInstruction::Store { positions: ends });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_arch::Site;
    use vela_ir::SingleQubitOp;

    fn arch() -> Architecture {
        Architecture::from_json_str(include_str!(
            "../../vela-arch/tests/fixtures/compute_store.json"
        ))
        .unwrap()
    }

    fn config(parking_offset: u64) -> CodeGeneratorConfig {
        CodeGeneratorConfig {
            parking_offset,
            warn_unsupported_gates: true,
        }
    }

    #[test]
    fn test_empty_program() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let placements = vec![vec![Site::new(storage, 19, 0)]];
        let program = CodeGenerator::new(&arch, config(1))
            .generate(&[vec![]], &placements, &[])
            .unwrap();
        assert_eq!(program.initial_positions, vec![Position::new(0, 57)]);
        assert!(program.is_empty());
    }

    #[test]
    fn test_one_layer_emits_shuttle_pulse_shuttle() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let zone = arch.entanglement_zones()[0];
        let p0 = vec![Site::new(storage, 19, 0), Site::new(storage, 19, 1)];
        let g1 = vec![Site::new(zone[0], 0, 0), Site::new(zone[1], 0, 0)];
        let s1 = p0.clone();
        let routings = vec![
            vec![vec![QubitId(0)], vec![QubitId(1)]],
            vec![vec![QubitId(1)], vec![QubitId(0)]],
        ];
        let program = CodeGenerator::new(&arch, config(0))
            .generate(&[vec![], vec![]], &[p0, g1, s1], &routings)
            .unwrap();
        let rendered: Vec<String> = program.instructions.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "load (0, 57);",
                "move (0, 57) to (5, 70);",
                "store (5, 70);",
                "load (3, 57);",
                "move (3, 57) to (7, 70);",
                "store (7, 70);",
                "rydberg;",
                "load (7, 70);",
                "move (7, 70) to (3, 57);",
                "store (3, 57);",
                "load (5, 70);",
                "move (5, 70) to (0, 57);",
                "store (0, 57);",
            ]
        );
    }

    #[test]
    fn test_parking_offset_lifts_the_transit() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let zone = arch.entanglement_zones()[0];
        let p0 = vec![Site::new(storage, 19, 0)];
        let g1 = vec![Site::new(zone[0], 0, 0)];
        let s1 = p0.clone();
        let routings = vec![vec![vec![QubitId(0)]], vec![vec![QubitId(0)]]];
        let program = CodeGenerator::new(&arch, config(2))
            .generate(&[vec![], vec![]], &[p0, g1, s1], &routings)
            .unwrap();
        let rendered: Vec<String> = program.instructions.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered[..6],
            [
                "load (0, 57);",
                "move (0, 57) to (0, 59);",
                "move (0, 59) to (5, 72);",
                "move (5, 72) to (5, 70);",
                "store (5, 70);",
                "rydberg;",
            ]
        );
    }

    #[test]
    fn test_local_single_qubit_gates_use_current_sites() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let placements = vec![vec![Site::new(storage, 19, 0), Site::new(storage, 19, 1)]];
        let layer = vec![SingleQubitOp {
            gate: "rz".to_string(),
            params: vec![0.5],
            target: QubitId(1),
        }];
        let program = CodeGenerator::new(&arch, config(1))
            .generate(&[layer], &placements, &[])
            .unwrap();
        assert_eq!(
            program.instructions,
            vec![NaInstruction::LocalSq {
                gate: "rz".to_string(),
                params: vec![0.5],
                positions: vec![Position::new(3, 57)],
            }]
        );
    }

    #[test]
    fn test_uniform_layer_becomes_global_pulse() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let placements = vec![vec![Site::new(storage, 19, 0), Site::new(storage, 19, 1)]];
        let layer = vec![
            SingleQubitOp {
                gate: "ry".to_string(),
                params: vec![1.5],
                target: QubitId(0),
            },
            SingleQubitOp {
                gate: "ry".to_string(),
                params: vec![1.5],
                target: QubitId(1),
            },
        ];
        let program = CodeGenerator::new(&arch, config(1))
            .generate(&[layer], &placements, &[])
            .unwrap();
        assert_eq!(
            program.instructions,
            vec![NaInstruction::GlobalSq {
                gate: "ry".to_string(),
                params: vec![1.5],
            }]
        );
    }

    #[test]
    fn test_routing_length_mismatch() {
        let arch = arch();
        let storage = arch.storage_slms()[0];
        let placements = vec![vec![Site::new(storage, 0, 0)], vec![Site::new(storage, 0, 1)]];
        let err = CodeGenerator::new(&arch, config(1))
            .generate(&[vec![]], &placements, &[])
            .unwrap_err();
        assert!(matches!(err, CompileError::InternalInvariantBroken(_)));
    }
}
