//! Zoned neutral-atom hardware model.
//!
//! A zoned architecture consists of *storage zones*, where idle atoms sit
//! in SLM traps, and *entanglement zones*, where pairs of atoms co-located
//! on an interaction pair undergo CZ gates when the Rydberg laser fires.
//! Atoms travel between zones on AOD tweezers.
//!
//! [`Architecture`] is the immutable description of one such machine,
//! loaded from a JSON specification. Construction runs a single
//! preprocessing pass that caches, for every entanglement site, the nearest
//! storage site, and for every pair of storage sites, the entanglement site
//! minimizing the summed travel distance; after that, all geometric
//! queries are amortized O(1) lookups.
//!
//! ```rust
//! use vela_arch::Architecture;
//!
//! let arch = Architecture::from_json_str(include_str!(
//!     "../tests/fixtures/compute_store.json"
//! ))
//! .unwrap();
//! assert_eq!(arch.entanglement_capacity(), 16);
//! ```

pub mod architecture;
pub mod error;
pub mod slm;
mod spec;

pub use architecture::{Architecture, OperationDurations, OperationFidelities, RydbergRange};
pub use error::{ArchitectureError, ArchitectureResult};
pub use slm::{Aod, Site, Slm, SlmId, ZoneId};
