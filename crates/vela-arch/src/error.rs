//! Error types for architecture loading.

use thiserror::Error;

/// Errors raised while parsing or validating an architecture specification.
///
/// All of these are fatal: a compiler cannot be constructed over an invalid
/// architecture.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchitectureError {
    /// The JSON document could not be parsed against the schema. The
    /// message identifies the offending field.
    #[error("invalid architecture spec: {0}")]
    Parse(String),

    /// A required list is empty.
    #[error("architecture spec must contain at least one {0}")]
    EmptyList(&'static str),

    /// An entanglement zone does not consist of exactly two SLMs.
    #[error("entanglement zone {zone_id} must contain exactly two SLMs, got {got}")]
    EntanglementZoneShape {
        /// The zone's external id.
        zone_id: u64,
        /// Number of SLMs found.
        got: usize,
    },

    /// The two SLMs of an entanglement zone differ in their grid size.
    #[error("entanglement zone {zone_id}: paired SLMs must have identical dimensions")]
    EntanglementZoneMismatch {
        /// The zone's external id.
        zone_id: u64,
    },

    /// An SLM has zero rows or columns.
    #[error("SLM {slm_id} must have a positive number of rows and columns")]
    DegenerateSlm {
        /// The SLM's external id.
        slm_id: u64,
    },
}

impl From<serde_json::Error> for ArchitectureError {
    fn from(err: serde_json::Error) -> Self {
        ArchitectureError::Parse(err.to_string())
    }
}

/// Result type for architecture operations.
pub type ArchitectureResult<T> = Result<T, ArchitectureError>;
