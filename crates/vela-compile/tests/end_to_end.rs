//! End-to-end pipeline tests on the two-zone compute/store architecture:
//! a 20×20 storage SLM at the origin with 3 µm pitch and a 4×4
//! entanglement pair with 12×10 µm separation at (5, 70) / (7, 70).

use std::collections::BTreeSet;

use vela_arch::Architecture;
use vela_compile::{AStarConfig, CompileError, Compiler, CompilerConfig, PlacerConfig};
use vela_ir::{Circuit, NaInstruction, QubitId};

fn arch() -> Architecture {
    Architecture::from_json_str(include_str!("../../vela-arch/tests/fixtures/compute_store.json"))
        .unwrap()
}

fn compilers(arch: &Architecture) -> Vec<Compiler<'_>> {
    vec![Compiler::routing_agnostic(arch), Compiler::routing_aware(arch)]
}

#[test]
fn empty_circuit_compiles_to_nothing() {
    let arch = arch();
    for mut compiler in compilers(&arch) {
        let program = compiler.compile(&Circuit::new(1)).unwrap();
        // One atom parked on the fill side of the storage zone, nothing
        // to execute.
        assert_eq!(program.initial_positions.len(), 1);
        assert_eq!(program.initial_positions[0].y, 57);
        assert!(program.is_empty());
    }
}

#[test]
fn single_cz_uses_one_interaction_pair() {
    let arch = arch();
    for mut compiler in compilers(&arch) {
        let mut circuit = Circuit::new(2);
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        let program = compiler.compile(&circuit).unwrap();
        let rydberg_count = program
            .instructions
            .iter()
            .filter(|inst| matches!(inst, NaInstruction::Rydberg))
            .count();
        assert_eq!(rydberg_count, 1);
        // Shuttling in and out surrounds the pulse.
        assert!(matches!(program.instructions[0], NaInstruction::Load { .. }));
        assert!(matches!(
            program.instructions.last().unwrap(),
            NaInstruction::Store { .. }
        ));
    }
}

#[test]
fn crossed_cz_lands_on_one_interaction_pair() {
    // CZ(1, 0): the reversed operand order changes nothing; the gate ends
    // on one interaction pair (two sites 2 µm apart in x, same y). The
    // qubit-to-side orientation is covered by the placer unit tests.
    let arch = arch();
    for mut compiler in compilers(&arch) {
        let mut circuit = Circuit::new(2);
        circuit.cz(QubitId(1), QubitId(0)).unwrap();
        let program = compiler.compile(&circuit).unwrap();
        let mut in_zone: Vec<_> = program
            .instructions
            .iter()
            .filter_map(|inst| match inst {
                NaInstruction::Store { positions } => Some(positions.clone()),
                _ => None,
            })
            .flatten()
            .filter(|p| p.y >= 70)
            .collect();
        in_zone.sort();
        assert_eq!(in_zone.len(), 2);
        assert_eq!(in_zone[0].y, in_zone[1].y);
        assert_eq!(in_zone[0].x + 2, in_zone[1].x);
    }
}

#[test]
fn parallel_gates_fill_distinct_pairs() {
    let arch = arch();
    for mut compiler in compilers(&arch) {
        let mut circuit = Circuit::new(4);
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        circuit.cz(QubitId(2), QubitId(3)).unwrap();
        let program = compiler.compile(&circuit).unwrap();
        // Exactly one Rydberg pulse executes both gates.
        let rydberg_count = program
            .instructions
            .iter()
            .filter(|inst| matches!(inst, NaInstruction::Rydberg))
            .count();
        assert_eq!(rydberg_count, 1);
        // All four initial positions share the fill-side storage row.
        let ys: BTreeSet<u64> = program.initial_positions.iter().map(|p| p.y).collect();
        assert_eq!(ys, BTreeSet::from([57]));
    }
}

#[test]
fn full_entanglement_zone_is_used_exactly_once() {
    let arch = arch();
    for mut compiler in compilers(&arch) {
        let mut circuit = Circuit::new(32);
        for i in 0..16u32 {
            circuit.cz(QubitId(2 * i), QubitId(2 * i + 1)).unwrap();
        }
        let program = compiler.compile(&circuit).unwrap();
        assert_eq!(program.initial_positions.len(), 32);
        // 32 distinct positions are stored inside the entanglement zone
        // (y >= 70) before the pulse.
        let mut in_zone: BTreeSet<(u64, u64)> = BTreeSet::new();
        for inst in &program.instructions {
            if matches!(inst, NaInstruction::Rydberg) {
                break;
            }
            if let NaInstruction::Store { positions } = inst {
                in_zone.extend(positions.iter().map(|p| (p.x, p.y)));
            }
        }
        assert_eq!(in_zone.len(), 32);
        assert!(in_zone.iter().all(|&(_, y)| y >= 70));
    }
}

#[test]
fn reuse_chain_skips_the_storage_roundtrip() {
    let arch = arch();
    for mut compiler in compilers(&arch) {
        let mut circuit = Circuit::new(3);
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        circuit.cz(QubitId(1), QubitId(2)).unwrap();
        let program = compiler.compile(&circuit).unwrap();
        let rydberg_count = program
            .instructions
            .iter()
            .filter(|inst| matches!(inst, NaInstruction::Rydberg))
            .count();
        assert_eq!(rydberg_count, 2);
        // Qubit 1 stays put between the pulses: it is loaded exactly once
        // on the way in and once on the way out, so across the whole
        // program only 6 loads happen for the four one-way trips of
        // qubits 0 and 2 plus qubit 1's single round-trip.
        let loaded: usize = program
            .instructions
            .iter()
            .filter_map(|inst| match inst {
                NaInstruction::Load { positions } => Some(positions.len()),
                _ => None,
            })
            .sum();
        assert_eq!(loaded, 6);
    }
}

#[test]
fn toffoli_is_rejected() {
    let arch = arch();
    for mut compiler in compilers(&arch) {
        let mut circuit = Circuit::new(3);
        circuit
            .append(vela_ir::Operation {
                gate: "ccx".to_string(),
                params: vec![],
                qubits: vec![QubitId(0), QubitId(1), QubitId(2)],
            })
            .unwrap();
        let err = compiler.compile(&circuit).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedGate { num_qubits: 3, .. }));
    }
}

#[test]
fn missing_rydberg_range_is_invalid() {
    let mut json: serde_json::Value = serde_json::from_str(include_str!(
        "../../vela-arch/tests/fixtures/compute_store.json"
    ))
    .unwrap();
    json.as_object_mut().unwrap().remove("rydberg_range");
    let err = Architecture::from_json_value(json).unwrap_err();
    assert!(err.to_string().contains("rydberg_range"));
}

#[test]
fn tiny_node_budget_is_reported() {
    let arch = arch();
    let mut compiler = Compiler::new(
        &arch,
        CompilerConfig {
            placer: PlacerConfig::AStar(AStarConfig {
                max_nodes: 2,
                ..AStarConfig::default()
            }),
            ..CompilerConfig::default()
        },
    );
    let mut circuit = Circuit::new(4);
    circuit.cz(QubitId(0), QubitId(1)).unwrap();
    circuit.cz(QubitId(2), QubitId(3)).unwrap();
    let err = compiler.compile(&circuit).unwrap_err();
    assert!(matches!(err, CompileError::NodeLimitExceeded { max_nodes: 2 }));
}

#[test]
fn compilation_is_deterministic() {
    let arch = arch();
    for make in [Compiler::routing_agnostic, Compiler::routing_aware] {
        let mut circuit = Circuit::new(6);
        circuit.h(QubitId(0)).unwrap();
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        circuit.cz(QubitId(2), QubitId(3)).unwrap();
        circuit.cz(QubitId(1), QubitId(2)).unwrap();
        circuit.rz(0.5, QubitId(1)).unwrap();
        circuit.cz(QubitId(4), QubitId(5)).unwrap();
        let first = make(&arch).compile(&circuit).unwrap().to_string();
        let second = make(&arch).compile(&circuit).unwrap().to_string();
        assert_eq!(first, second);
    }
}

#[test]
fn statistics_cover_every_phase() {
    let arch = arch();
    let mut compiler = Compiler::routing_aware(&arch);
    let mut circuit = Circuit::new(2);
    circuit.cz(QubitId(0), QubitId(1)).unwrap();
    compiler.compile(&circuit).unwrap();
    let stats = compiler.statistics();
    assert!(stats.total_time_us >= stats.placement_time_us);
    let rendered = serde_json::to_value(stats).unwrap();
    for key in [
        "scheduling_time_us",
        "reuse_analysis_time_us",
        "placement_time_us",
        "routing_time_us",
        "code_generation_time_us",
        "total_time_us",
    ] {
        assert!(rendered.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn emitted_movements_within_a_group_are_compatible() {
    use vela_compile::route::is_compatible_movement;

    let arch = arch();
    for mut compiler in compilers(&arch) {
        let mut circuit = Circuit::new(8);
        for i in 0..4u32 {
            circuit.cz(QubitId(2 * i), QubitId(2 * i + 1)).unwrap();
        }
        circuit.cz(QubitId(1), QubitId(2)).unwrap();
        circuit.cz(QubitId(5), QubitId(6)).unwrap();
        let program = compiler.compile(&circuit).unwrap();
        // Every direct move instruction carries one group; each pair of
        // its movements must satisfy the compatibility predicate.
        for inst in &program.instructions {
            if let NaInstruction::Move { starts, ends } = inst {
                assert_eq!(starts.len(), ends.len());
                for i in 0..starts.len() {
                    for j in i + 1..starts.len() {
                        assert!(is_compatible_movement(
                            (starts[i].x, starts[i].y, ends[i].x, ends[i].y),
                            (starts[j].x, starts[j].y, ends[j].x, ends[j].y),
                        ));
                    }
                }
            }
        }
    }
}
