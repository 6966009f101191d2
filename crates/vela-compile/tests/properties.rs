//! Property tests over randomly generated circuits.

use std::collections::BTreeSet;

use proptest::prelude::*;
use vela_arch::Architecture;
use vela_compile::{
    AsapScheduler, AStarConfig, AStarPlacer, IndependentSetRouter, ReuseConfig, RouterConfig,
    SchedulerConfig, VertexMatchingConfig, VertexMatchingPlacer, VertexMatchingReuseAnalyzer,
};
use vela_ir::{Circuit, QubitId};

const NUM_QUBITS: u32 = 10;

fn arch() -> Architecture {
    Architecture::from_json_str(include_str!("../../vela-arch/tests/fixtures/compute_store.json"))
        .unwrap()
}

/// A random CZ circuit over [`NUM_QUBITS`] qubits.
fn circuits() -> impl Strategy<Value = Circuit> {
    prop::collection::vec((0..NUM_QUBITS, 1..NUM_QUBITS), 0..12).prop_map(|pairs| {
        let mut circuit = Circuit::new(NUM_QUBITS);
        for (a, offset) in pairs {
            let b = (a + offset) % NUM_QUBITS;
            circuit.cz(QubitId(a), QubitId(b)).unwrap();
        }
        circuit
    })
}

fn check_placements(arch: &Architecture, circuit: &Circuit, placements: &[Vec<vela_arch::Site>]) {
    let scheduler = AsapScheduler::new(arch, SchedulerConfig::default());
    let (_, tq_layers) = scheduler.schedule(circuit).unwrap();
    assert_eq!(placements.len(), 2 * tq_layers.len() + 1);
    for placement in placements {
        let unique: BTreeSet<_> = placement.iter().collect();
        assert_eq!(unique.len(), placement.len(), "placement is not injective");
    }
    for (layer, gates) in tq_layers.iter().enumerate() {
        let placement = &placements[2 * layer + 1];
        for &[a, b] in gates {
            assert!(
                arch.is_interaction_pair(placement[a.index()], placement[b.index()]),
                "gate ({a}, {b}) is not on an interaction pair"
            );
        }
    }
    // The routing of an identity transition is empty, and every routed
    // group realizes its transition completely.
    let router = IndependentSetRouter::new(arch, RouterConfig::default());
    for placement in placements {
        let identity = router.route(&[placement.clone(), placement.clone()]);
        assert!(identity[0].is_empty());
    }
    for (routing, pair) in router.route(placements).iter().zip(placements.windows(2)) {
        let moved: BTreeSet<QubitId> = routing.iter().flatten().copied().collect();
        let expected: BTreeSet<QubitId> = (0..pair[0].len())
            .filter(|&q| pair[0][q] != pair[1][q])
            .map(QubitId::from)
            .collect();
        assert_eq!(moved, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn vertex_matching_placements_are_valid(circuit in circuits()) {
        let arch = arch();
        let (_, tq_layers) = AsapScheduler::new(&arch, SchedulerConfig::default())
            .schedule(&circuit)
            .unwrap();
        let reuse = VertexMatchingReuseAnalyzer::new(ReuseConfig::default()).analyze(&tq_layers);
        let placements = VertexMatchingPlacer::new(&arch, VertexMatchingConfig::default())
            .place(NUM_QUBITS as usize, &tq_layers, &reuse)
            .unwrap();
        check_placements(&arch, &circuit, &placements);
    }

    #[test]
    fn a_star_placements_are_valid(circuit in circuits()) {
        let arch = arch();
        let (_, tq_layers) = AsapScheduler::new(&arch, SchedulerConfig::default())
            .schedule(&circuit)
            .unwrap();
        let reuse = VertexMatchingReuseAnalyzer::new(ReuseConfig::default()).analyze(&tq_layers);
        let placements = AStarPlacer::new(&arch, AStarConfig::default())
            .place(NUM_QUBITS as usize, &tq_layers, &reuse)
            .unwrap();
        check_placements(&arch, &circuit, &placements);
    }
}
