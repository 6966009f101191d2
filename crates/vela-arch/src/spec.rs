//! Serde schema for the JSON architecture specification.
//!
//! Unknown keys (`offset`, `dimension`, …) are accepted and ignored; the
//! keys below are the ones the compiler consumes. Validation beyond shape
//! (non-empty zone lists, paired SLM dimensions) happens in
//! [`crate::Architecture::from_spec`].

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ArchitectureSpec {
    pub name: String,
    pub operation_duration: Option<DurationSpec>,
    pub operation_fidelity: Option<FidelitySpec>,
    pub qubit_spec: Option<QubitSpec>,
    pub rydberg_range: Vec<[[u64; 2]; 2]>,
    pub storage_zones: Vec<StorageZoneSpec>,
    pub entanglement_zones: Vec<EntanglementZoneSpec>,
    pub aods: Vec<AodSpec>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DurationSpec {
    pub rydberg_gate: f64,
    pub single_qubit_gate: f64,
    pub atom_transfer: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FidelitySpec {
    pub rydberg_gate: f64,
    pub single_qubit_gate: f64,
    pub atom_transfer: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QubitSpec {
    #[serde(rename = "T")]
    pub t: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StorageZoneSpec {
    pub slms: Vec<SlmSpec>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntanglementZoneSpec {
    pub zone_id: u64,
    pub slms: Vec<SlmSpec>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SlmSpec {
    pub id: u64,
    pub site_separation: [u64; 2],
    pub r: usize,
    pub c: usize,
    pub location: [u64; 2],
}

#[derive(Debug, Deserialize)]
pub(crate) struct AodSpec {
    pub id: u64,
    pub site_separation: u64,
    pub r: usize,
    pub c: usize,
}
