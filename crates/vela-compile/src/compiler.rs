//! The compiler facade: configuration, pipeline, statistics.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;
use vela_arch::Architecture;
use vela_ir::{Circuit, NaProgram};

use crate::codegen::{CodeGenerator, CodeGeneratorConfig};
use crate::error::{CompileError, CompileResult};
use crate::placer::{
    AStarConfig, AStarPlacer, VertexMatchingConfig, VertexMatchingPlacer,
};
use crate::reuse::{ReuseConfig, VertexMatchingReuseAnalyzer};
use crate::route::{IndependentSetRouter, RouterConfig};
use crate::schedule::{AsapScheduler, SchedulerConfig};
use crate::types::{Placement, TwoQubitLayer};

/// Which placer runs, with its tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PlacerConfig {
    /// Minimum-weight bipartite matching placement.
    VertexMatching(VertexMatchingConfig),
    /// A* search placement.
    AStar(AStarConfig),
}

impl Default for PlacerConfig {
    fn default() -> Self {
        PlacerConfig::AStar(AStarConfig::default())
    }
}

/// Top-level compiler configuration, one section per pipeline stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub scheduler: SchedulerConfig,
    pub reuse_analyzer: ReuseConfig,
    pub placer: PlacerConfig,
    pub router: RouterConfig,
    pub code_generator: CodeGeneratorConfig,
}

/// Wall time spent in each pipeline phase, in µs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub scheduling_time_us: u64,
    pub reuse_analysis_time_us: u64,
    pub placement_time_us: u64,
    pub routing_time_us: u64,
    pub code_generation_time_us: u64,
    pub total_time_us: u64,
}

/// The zoned neutral-atom compiler.
///
/// Holds a shared reference to the architecture for the duration of one or
/// more `compile` calls; every call is a pure function of the circuit, the
/// configuration, and the architecture.
#[derive(Debug)]
pub struct Compiler<'a> {
    architecture: &'a Architecture,
    config: CompilerConfig,
    statistics: Statistics,
}

impl<'a> Compiler<'a> {
    /// Create a compiler with an explicit configuration.
    #[must_use]
    pub fn new(architecture: &'a Architecture, config: CompilerConfig) -> Self {
        Self {
            architecture,
            config,
            statistics: Statistics::default(),
        }
    }

    /// A compiler placing with minimum-weight matching, agnostic of the
    /// routing constraints.
    #[must_use]
    pub fn routing_agnostic(architecture: &'a Architecture) -> Self {
        Self::new(
            architecture,
            CompilerConfig {
                placer: PlacerConfig::VertexMatching(VertexMatchingConfig::default()),
                ..CompilerConfig::default()
            },
        )
    }

    /// A compiler placing with A* search over AOD-compatible movement
    /// groups.
    #[must_use]
    pub fn routing_aware(architecture: &'a Architecture) -> Self {
        Self::new(
            architecture,
            CompilerConfig {
                placer: PlacerConfig::AStar(AStarConfig::default()),
                ..CompilerConfig::default()
            },
        )
    }

    /// Create a compiler from a JSON configuration document.
    pub fn from_json_str(architecture: &'a Architecture, json: &str) -> CompileResult<Self> {
        let config: CompilerConfig = serde_json::from_str(json)
            .map_err(|err| CompileError::InvalidConfiguration(err.to_string()))?;
        Ok(Self::new(architecture, config))
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Per-phase wall times of the most recent `compile` call.
    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Compile a circuit to a neutral-atom instruction stream.
    pub fn compile(&mut self, circuit: &Circuit) -> CompileResult<NaProgram> {
        info!(
            architecture = %self.architecture.name,
            qubits = circuit.num_qubits(),
            two_qubit_gates = circuit.num_two_qubit_ops(),
            single_qubit_gates = circuit.num_single_qubit_ops(),
            "compiling circuit"
        );
        let total_start = Instant::now();

        let scheduling_start = Instant::now();
        let (sq_layers, tq_layers) =
            AsapScheduler::new(self.architecture, self.config.scheduler).schedule(circuit)?;
        self.statistics.scheduling_time_us = elapsed_us(scheduling_start);
        if !tq_layers.is_empty() {
            let (min, max, sum) = tq_layers.iter().fold(
                (usize::MAX, 0usize, 0usize),
                |(min, max, sum), layer| {
                    (min.min(layer.len()), max.max(layer.len()), sum + layer.len())
                },
            );
            info!(
                layers = tq_layers.len(),
                min_gates = min,
                avg_gates = sum as f64 / tq_layers.len() as f64,
                max_gates = max,
                time_us = self.statistics.scheduling_time_us,
                "scheduling done"
            );
        }

        let reuse_start = Instant::now();
        let reuse_sets =
            VertexMatchingReuseAnalyzer::new(self.config.reuse_analyzer).analyze(&tq_layers);
        self.statistics.reuse_analysis_time_us = elapsed_us(reuse_start);
        info!(
            reused_atoms = reuse_sets.iter().map(|set| set.len()).sum::<usize>(),
            time_us = self.statistics.reuse_analysis_time_us,
            "reuse analysis done"
        );

        let placement_start = Instant::now();
        let num_qubits = circuit.num_qubits() as usize;
        let placements = match self.config.placer {
            PlacerConfig::VertexMatching(config) => {
                VertexMatchingPlacer::new(self.architecture, config)
                    .place(num_qubits, &tq_layers, &reuse_sets)?
            }
            PlacerConfig::AStar(config) => AStarPlacer::new(self.architecture, config)
                .place(num_qubits, &tq_layers, &reuse_sets)?,
        };
        self.statistics.placement_time_us = elapsed_us(placement_start);
        info!(
            placements = placements.len(),
            time_us = self.statistics.placement_time_us,
            "placement done"
        );
        self.validate_placements(num_qubits, &tq_layers, &placements)?;

        let routing_start = Instant::now();
        let routings =
            IndependentSetRouter::new(self.architecture, self.config.router).route(&placements);
        self.statistics.routing_time_us = elapsed_us(routing_start);
        info!(
            time_us = self.statistics.routing_time_us,
            "routing done"
        );

        let codegen_start = Instant::now();
        let program = CodeGenerator::new(self.architecture, self.config.code_generator)
            .generate(&sq_layers, &placements, &routings)?;
        self.statistics.code_generation_time_us = elapsed_us(codegen_start);
        self.statistics.total_time_us = elapsed_us(total_start);
        info!(
            instructions = program.len(),
            code_generation_time_us = self.statistics.code_generation_time_us,
            total_time_us = self.statistics.total_time_us,
            "compilation done"
        );
        Ok(program)
    }

    /// Every placement must be an injective qubit→site map and every gate
    /// must sit on one interaction pair during its layer.
    fn validate_placements(
        &self,
        num_qubits: usize,
        tq_layers: &[TwoQubitLayer],
        placements: &[Placement],
    ) -> CompileResult<()> {
        if placements.len() != 2 * tq_layers.len() + 1 {
            return Err(CompileError::InternalInvariantBroken(format!(
                "expected {} placements, got {}",
                2 * tq_layers.len() + 1,
                placements.len()
            )));
        }
        for (index, placement) in placements.iter().enumerate() {
            if placement.len() != num_qubits {
                return Err(CompileError::InternalInvariantBroken(format!(
                    "placement {index} maps {} of {num_qubits} qubits",
                    placement.len()
                )));
            }
            let unique: std::collections::BTreeSet<_> = placement.iter().collect();
            if unique.len() != placement.len() {
                return Err(CompileError::InternalInvariantBroken(format!(
                    "placement {index} assigns one site to several qubits"
                )));
            }
        }
        for (layer, gates) in tq_layers.iter().enumerate() {
            let placement = &placements[2 * layer + 1];
            for &[a, b] in gates {
                if !self
                    .architecture
                    .is_interaction_pair(placement[a.index()], placement[b.index()])
                {
                    return Err(CompileError::InternalInvariantBroken(format!(
                        "gate ({a}, {b}) of layer {layer} is not on an interaction pair"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
