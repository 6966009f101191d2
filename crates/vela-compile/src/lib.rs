//! Vela compilation pipeline for zoned neutral-atom hardware.
//!
//! Maps a logical circuit of single-qubit gates and CZ gates onto a
//! [`vela_arch::Architecture`] of storage and entanglement zones, emitting
//! parallel shuttling moves, Rydberg pulses, and single-qubit pulses.
//!
//! The pipeline runs five stages, each consuming the previous stage's
//! output plus the shared architecture:
//!
//! 1. **Scheduling** ([`schedule`]): partition the circuit into layers of
//!    commuting CZ gates, interleaved with single-qubit gate layers.
//! 2. **Reuse analysis** ([`reuse`]): decide which atoms may stay in the
//!    entanglement zone across adjacent layers.
//! 3. **Placement** ([`placer`]): assign every qubit a concrete trap site
//!    per layer, by bipartite matching or A* search.
//! 4. **Routing** ([`route`]): group the movements of each transition
//!    into parallel AOD sweeps.
//! 5. **Code generation** ([`codegen`]): emit the instruction stream.
//!
//! # Example
//!
//! ```rust
//! use vela_arch::Architecture;
//! use vela_compile::Compiler;
//! use vela_ir::{Circuit, QubitId};
//!
//! let arch = Architecture::from_json_str(include_str!(
//!     "../../vela-arch/tests/fixtures/compute_store.json"
//! ))
//! .unwrap();
//! let mut circuit = Circuit::new(2);
//! circuit.cz(QubitId(0), QubitId(1)).unwrap();
//!
//! let mut compiler = Compiler::routing_aware(&arch);
//! let program = compiler.compile(&circuit).unwrap();
//! assert!(program.instructions.contains(&vela_ir::NaInstruction::Rydberg));
//! ```

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod placer;
pub mod reuse;
pub mod route;
pub mod schedule;
pub mod types;

pub use codegen::{CodeGenerator, CodeGeneratorConfig};
pub use compiler::{Compiler, CompilerConfig, PlacerConfig, Statistics};
pub use error::{CompileError, CompileResult};
pub use placer::{AStarConfig, AStarPlacer, VertexMatchingConfig, VertexMatchingPlacer};
pub use reuse::{ReuseConfig, ReuseStrategy, VertexMatchingReuseAnalyzer};
pub use route::{IndependentSetRouter, RouterConfig};
pub use schedule::{AsapScheduler, SchedulerConfig};
pub use types::{Placement, ReuseSet, Routing, SingleQubitLayer, TwoQubitLayer};
