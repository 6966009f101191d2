//! Placement of atoms onto trap sites, layer by layer.
//!
//! A placer turns the scheduled two-qubit gate layers and the reuse sets
//! into a *placement sequence*: the initial storage placement, then for
//! every layer an entanglement-zone placement (the gates sit on
//! interaction pairs) followed by a return-to-storage placement. Two
//! implementations share this interface: the minimum-weight-matching
//! placer ([`VertexMatchingPlacer`]) and the A*-search placer
//! ([`AStarPlacer`]).

mod astar;
mod matching;
mod search;
mod vertex_matching;

pub use astar::{AStarConfig, AStarPlacer};
pub use vertex_matching::{VertexMatchingConfig, VertexMatchingPlacer};

use vela_arch::{Architecture, Site};

use crate::types::Placement;

/// Whether the initial placement should fill the first storage SLM from
/// its last row instead of its first.
///
/// The fill side is the side of the storage zone facing the (first)
/// entanglement zone, so that atoms start out close to the Rydberg beam.
pub(crate) fn reverse_initial_placement(architecture: &Architecture) -> bool {
    let first_storage = architecture.slm(architecture.storage_slms()[0]);
    let first_entanglement = architecture.slm(architecture.entanglement_zones()[0][0]);
    first_storage.location.1 < first_entanglement.location.1
}

/// Fill the storage zone row by row in qubit-index order, starting at the
/// fill side of the first SLM and spilling over into further storage SLMs
/// when one runs out of rows.
pub(crate) fn make_initial_placement(architecture: &Architecture, num_qubits: usize) -> Placement {
    let reverse = reverse_initial_placement(architecture);
    let storage = architecture.storage_slms();
    let mut slm_index = 0;
    let mut slm = architecture.slm(storage[slm_index]);
    let mut col = 0usize;
    let mut row: i64 = if reverse { slm.rows as i64 - 1 } else { 0 };
    let step: i64 = if reverse { -1 } else { 1 };

    let mut placement = Vec::with_capacity(num_qubits);
    for _ in 0..num_qubits {
        placement.push(Site::new(storage[slm_index], row as usize, col));
        col += 1;
        if col == slm.cols {
            row += step;
            col = 0;
            if (step == 1 && row == slm.rows as i64) || (step == -1 && row == -1) {
                slm_index += 1;
                slm = architecture.slm(storage[slm_index]);
                row = if step == 1 { slm.rows as i64 - 1 } else { 0 };
            }
        }
    }
    placement
}
