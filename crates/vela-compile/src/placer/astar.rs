//! Routing-aware placement via A* search.
//!
//! Atoms (or gates) are placed one at a time, one search-tree level per
//! job. The cost of a partial assignment is driven by *compatibility
//! groups*: the hardware can execute a set of movements in one parallel
//! AOD sweep only if the source-row→target-row and source-column→
//! target-column maps are each monotone. Every placement either extends an
//! existing group or opens a new one, and a group costs the square root of
//! its longest movement, so the search gravitates toward few, homogenous
//! sweeps rather than short individual moves.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use vela_arch::{Architecture, Site, SlmId};
use vela_ir::QubitId;

use crate::error::CompileResult;
use crate::placer::make_initial_placement;
use crate::placer::search::{NodeArena, NodeId, TreeNode, a_star_tree_search};
use crate::types::{Placement, ReuseSet, TwoQubitLayer, reuse_at};

/// Configuration of the A* placer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    /// Whether to restrict candidate target sites to a window around the
    /// nearest site.
    pub use_window: bool,
    /// Minimum window width, in columns.
    pub window_min_width: usize,
    /// Height-to-width ratio of the window; above 1 the window is
    /// portrait, below 1 landscape.
    pub window_ratio: f64,
    /// The window grows shell by shell until it offers at least this share
    /// of free sites per job, relative to the number of jobs. At 1.0 a
    /// solution within the windows is guaranteed; smaller values bet on
    /// jobs not all competing for the same window.
    pub window_share: f64,
    /// Weight of the group-spread term in the heuristic. Non-zero values
    /// make the heuristic inadmissible but prune the tree drastically.
    pub deepening_factor: f32,
    /// Added to the group-spread sum before it is scaled by the number of
    /// unplaced jobs, to amplify depth-first behavior.
    pub deepening_value: f32,
    /// Weight of the distance to the next interaction partner.
    pub lookahead_factor: f32,
    /// Fidelity bonus for reusing an atom, expressed in the same √-distance
    /// units as the cost; subtracted from the stay-option's lookahead.
    pub reuse_level: f32,
    /// Abort the search after this many tree nodes.
    pub max_nodes: u64,
}

impl Default for AStarConfig {
    fn default() -> Self {
        Self {
            use_window: true,
            window_min_width: 8,
            window_ratio: 1.0,
            window_share: 0.6,
            deepening_factor: 0.8,
            deepening_value: 0.2,
            lookahead_factor: 0.2,
            reuse_level: 5.0,
            max_nodes: 50_000_000,
        }
    }
}

/// A site in discretized coordinates: `[row index, column index]`.
type DiscreteSite = [u8; 2];

/// Monotone partial maps from source to target indices, one per axis.
type CompatibilityGroup = [BTreeMap<u8, u8>; 2];

/// Dense index for the rows (or columns) of the involved SLMs, keyed by
/// `(slm, row)` (or `(slm, column)`).
type RowColMap = FxHashMap<(SlmId, usize), u8>;

/// One candidate target for an atom returning to storage.
#[derive(Debug, Clone)]
struct AtomOption {
    site: DiscreteSite,
    /// The atom stays at its entanglement site; `site` is ignored.
    reuse: bool,
    distance: f32,
    lookahead: f32,
}

/// An atom that must be moved back to the storage zone, with its candidate
/// targets ordered by distance ascending.
#[derive(Debug, Clone)]
struct AtomJob {
    atom: QubitId,
    current: DiscreteSite,
    mean_lookahead: f32,
    options: Vec<AtomOption>,
}

/// One candidate interaction pair for a gate, already oriented: `sites[0]`
/// receives the gate's first qubit.
#[derive(Debug, Clone)]
struct GateOption {
    sites: [DiscreteSite; 2],
    distance: [f32; 2],
    lookahead: f32,
}

/// A gate whose two atoms must be moved onto an interaction pair.
#[derive(Debug, Clone)]
struct GateJob {
    qubits: [QubitId; 2],
    currents: [DiscreteSite; 2],
    mean_lookahead: f32,
    options: Vec<GateOption>,
}

/// One level of the search tree: the state after placing the first
/// `level` jobs.
#[derive(Debug, Clone, Default)]
struct SearchNode {
    level: u16,
    /// Index of the option chosen for job `level - 1`.
    option: u16,
    lookahead: f32,
    /// Target sites consumed by the placements so far.
    consumed: FxHashSet<DiscreteSite>,
    groups: Vec<CompatibilityGroup>,
    /// Longest movement per group.
    group_max_distances: Vec<f32>,
    parent: Option<NodeId>,
}

impl TreeNode for SearchNode {
    fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// The A* placer.
#[derive(Debug, Clone, Copy)]
pub struct AStarPlacer<'a> {
    architecture: &'a Architecture,
    config: AStarConfig,
    window_min_height: usize,
}

impl<'a> AStarPlacer<'a> {
    /// Create an A* placer for the given architecture and configuration.
    #[must_use]
    pub fn new(architecture: &'a Architecture, config: AStarConfig) -> Self {
        let window_min_height =
            (config.window_ratio * config.window_min_width as f64).round() as usize;
        Self {
            architecture,
            config,
            window_min_height,
        }
    }

    /// Produce the placement sequence `P₀, G₁, S₁, …, G_L, S_L`.
    pub fn place(
        &self,
        num_qubits: usize,
        layers: &[TwoQubitLayer],
        reuse_sets: &[ReuseSet],
    ) -> CompileResult<Vec<Placement>> {
        let mut placements = Vec::with_capacity(2 * layers.len() + 1);
        placements.push(make_initial_placement(self.architecture, num_qubits));
        let empty_layer = TwoQubitLayer::new();
        for (layer, gates) in layers.iter().enumerate() {
            let previous_reuse = if layer == 0 {
                ReuseSet::new()
            } else {
                reuse_at(reuse_sets, layer - 1)
            };
            let next_reuse = reuse_at(reuse_sets, layer);
            let next_gates = layers.get(layer + 1).unwrap_or(&empty_layer);
            let gate_placement = self.place_gates_in_entanglement_zone(
                placements.last().expect("initial placement exists"),
                &previous_reuse,
                gates,
                &next_reuse,
                next_gates,
            )?;
            let storage_placement =
                self.place_atoms_in_storage_zone(&gate_placement, &next_reuse, gates, next_gates)?;
            placements.push(gate_placement);
            placements.push(storage_placement);
        }
        Ok(placements)
    }

    // -----------------------------------------------------------------
    // Discretization
    // -----------------------------------------------------------------

    /// Compress the rows and columns occupied by `atoms` under `placement`
    /// to dense indices preserving coordinate order. Rows (columns) of
    /// different SLMs at the same coordinate share an index.
    fn discretize_placement_of_atoms(
        &self,
        placement: &Placement,
        atoms: &[QubitId],
    ) -> (RowColMap, RowColMap) {
        let mut rows: BTreeMap<u64, BTreeSet<(SlmId, usize)>> = BTreeMap::new();
        let mut columns: BTreeMap<u64, BTreeSet<(SlmId, usize)>> = BTreeMap::new();
        for &atom in atoms {
            let site = placement[atom.index()];
            let (x, y) = self.architecture.exact_location(site);
            rows.entry(y).or_default().insert((site.slm, site.row));
            columns.entry(x).or_default().insert((site.slm, site.col));
        }
        (index_grouped(&rows), index_grouped(&columns))
    }

    /// Dense indices for the storage rows and columns that still offer a
    /// free site.
    fn discretize_non_occupied_storage_sites(
        &self,
        occupied: &FxHashSet<Site>,
    ) -> (RowColMap, RowColMap) {
        let mut rows: BTreeMap<u64, (SlmId, usize)> = BTreeMap::new();
        let mut columns: BTreeMap<u64, (SlmId, usize)> = BTreeMap::new();
        for &slm_id in self.architecture.storage_slms() {
            let slm = self.architecture.slm(slm_id);
            for r in 0..slm.rows {
                if (0..slm.cols).any(|c| !occupied.contains(&Site::new(slm_id, r, c))) {
                    rows.entry(slm.location.1 + slm.site_separation.1 * r as u64)
                        .or_insert((slm_id, r));
                }
            }
            for c in 0..slm.cols {
                if (0..slm.rows).any(|r| !occupied.contains(&Site::new(slm_id, r, c))) {
                    columns
                        .entry(slm.location.0 + slm.site_separation.0 * c as u64)
                        .or_insert((slm_id, c));
                }
            }
        }
        (index_single(&rows), index_single(&columns))
    }

    /// Dense indices for the entanglement rows and columns that still offer
    /// a free site.
    fn discretize_non_occupied_entanglement_sites(
        &self,
        occupied: &FxHashSet<Site>,
    ) -> (RowColMap, RowColMap) {
        let mut rows: BTreeMap<u64, BTreeSet<(SlmId, usize)>> = BTreeMap::new();
        let mut columns: BTreeMap<u64, BTreeSet<(SlmId, usize)>> = BTreeMap::new();
        for zone in self.architecture.entanglement_zones() {
            for &slm_id in zone {
                let slm = self.architecture.slm(slm_id);
                for r in 0..slm.rows {
                    if (0..slm.cols).any(|c| !occupied.contains(&Site::new(slm_id, r, c))) {
                        rows.entry(slm.location.1 + slm.site_separation.1 * r as u64)
                            .or_default()
                            .insert((slm_id, r));
                    }
                }
                for c in 0..slm.cols {
                    if (0..slm.rows).any(|r| !occupied.contains(&Site::new(slm_id, r, c))) {
                        columns
                            .entry(slm.location.0 + slm.site_separation.0 * c as u64)
                            .or_default()
                            .insert((slm_id, c));
                    }
                }
            }
        }
        (index_grouped(&rows), index_grouped(&columns))
    }

    // -----------------------------------------------------------------
    // Gate placement
    // -----------------------------------------------------------------

    /// Place the gates of one layer onto interaction pairs, honoring atoms
    /// already parked there by reuse.
    fn place_gates_in_entanglement_zone(
        &self,
        previous: &Placement,
        reuse: &ReuseSet,
        gates: &TwoQubitLayer,
        next_reuse: &ReuseSet,
        next_gates: &TwoQubitLayer,
    ) -> CompileResult<Placement> {
        let arch = self.architecture;
        let mut current = previous.clone();

        // Separate gates that must be placed from gates pinned by a
        // reused atom; the latter only need the partner moved onto the
        // other half of the pair.
        let mut gates_to_place: Vec<(f64, [QubitId; 2])> = Vec::new();
        let mut atoms_to_place: Vec<QubitId> = Vec::new();
        for &gate in gates {
            let [first, second] = gate;
            let first_reuse = reuse.contains(&first)
                && arch.slm(previous[first.index()].slm).is_entanglement();
            let second_reuse = reuse.contains(&second)
                && arch.slm(previous[second.index()].slm).is_entanglement();
            if !first_reuse && !second_reuse {
                let site1 = previous[first.index()];
                let site2 = previous[second.index()];
                let nearest = arch.nearest_entanglement_site(site1, site2);
                let other = arch.other_entanglement_site(nearest);
                let d1 = arch.distance(site1, nearest);
                let d2 = arch.distance(site2, nearest);
                let d3 = arch.distance(site1, other);
                let d4 = arch.distance(site2, other);
                if d1 + d4 <= d2 + d3 {
                    gates_to_place.push((d1.max(d4), gate));
                } else {
                    gates_to_place.push((d2.max(d3), gate));
                }
                atoms_to_place.push(first);
                atoms_to_place.push(second);
            } else if first_reuse {
                current[second.index()] =
                    arch.other_entanglement_site(previous[first.index()]);
            } else {
                current[first.index()] =
                    arch.other_entanglement_site(previous[second.index()]);
            }
        }
        if gates_to_place.is_empty() {
            return Ok(current);
        }
        // Longest-moving gates first.
        gates_to_place.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        let (discrete_rows, discrete_columns) =
            self.discretize_placement_of_atoms(previous, &atoms_to_place);

        // Interaction pairs pinned by reused atoms are blocked for both
        // halves.
        let mut occupied: FxHashSet<Site> = FxHashSet::default();
        for &qubit in reuse {
            let site = previous[qubit.index()];
            if arch.slm(site.slm).is_entanglement() {
                occupied.insert(site);
                occupied.insert(arch.other_entanglement_site(site));
            }
        }
        let (target_rows, target_columns) =
            self.discretize_non_occupied_entanglement_sites(&occupied);
        let target_sites = concretize_targets(&target_rows, &target_columns);

        let n_jobs = gates_to_place.len();
        let mut gate_jobs: Vec<GateJob> = Vec::with_capacity(n_jobs);
        for &(_, gate) in &gates_to_place {
            let [left, right] = gate;
            let left_site = previous[left.index()];
            let right_site = previous[right.index()];
            let nearest = arch.nearest_entanglement_site(left_site, right_site);
            let mut job = GateJob {
                qubits: gate,
                currents: [
                    [
                        discrete_rows[&(left_site.slm, left_site.row)],
                        discrete_columns[&(left_site.slm, left_site.col)],
                    ],
                    [
                        discrete_rows[&(right_site.slm, right_site.row)],
                        discrete_columns[&(right_site.slm, right_site.col)],
                    ],
                ],
                mean_lookahead: 0.0,
                options: Vec::new(),
            };
            let slm = arch.slm(nearest.slm);
            let mut window = if self.config.use_window {
                Window::around(
                    nearest,
                    self.config.window_min_width,
                    self.window_min_height,
                    slm.rows,
                    slm.cols,
                )
            } else {
                Window::full(slm.rows, slm.cols)
            };
            for r in window.r_low..window.r_high {
                for c in window.c_low..window.c_high {
                    let candidate = Site::new(nearest.slm, r, c);
                    if !occupied.contains(&candidate) {
                        self.add_gate_option(
                            &target_rows,
                            &target_columns,
                            left_site,
                            right_site,
                            candidate,
                            &mut job,
                        );
                    }
                }
            }
            let mut expansion = 0usize;
            while self.config.use_window
                && (job.options.len() as f64) < self.config.window_share * n_jobs as f64
            {
                expansion += 1;
                let (width, height) = if self.config.window_ratio < 1.0 {
                    let width = self.config.window_min_width + expansion;
                    (width, (self.config.window_ratio * width as f64).round() as usize)
                } else {
                    let height = self.window_min_height + expansion;
                    (
                        (height as f64 / self.config.window_ratio).round() as usize,
                        height,
                    )
                };
                let grown = Window::around(nearest, width, height, slm.rows, slm.cols);
                if grown == window && grown == Window::full(slm.rows, slm.cols) {
                    // The window saturated the SLM; let the search decide
                    // whether the options suffice.
                    break;
                }
                for (r, c) in window.fresh_sites(&grown) {
                    let candidate = Site::new(nearest.slm, r, c);
                    if !occupied.contains(&candidate) {
                        self.add_gate_option(
                            &target_rows,
                            &target_columns,
                            left_site,
                            right_site,
                            candidate,
                            &mut job,
                        );
                    }
                }
                window = grown;
            }
            job.options.sort_by(|a, b| {
                a.distance[0]
                    .total_cmp(&b.distance[0])
                    .then_with(|| a.distance[1].total_cmp(&b.distance[1]))
            });

            // A gate holding a reuse qubit also fixes the position of the
            // next layer's gate, so its options carry a lookahead toward
            // the next interaction partner.
            let left_reuse = next_reuse.contains(&left);
            let right_reuse = next_reuse.contains(&right);
            if left_reuse || right_reuse {
                let reused = if left_reuse { left } else { right };
                if let Some(partner) = interaction_partner(next_gates, reused) {
                    let partner_site = previous[partner.index()];
                    let mut sum = 0.0f32;
                    for option in &mut job.options {
                        let site = target_sites[&option.sites[usize::from(!left_reuse)]];
                        let distance = arch.distance(partner_site, site) as f32;
                        option.lookahead = self.config.lookahead_factor * distance.sqrt();
                        sum += option.lookahead;
                    }
                    job.mean_lookahead = sum / job.options.len() as f32;
                }
            }
            gate_jobs.push(job);
        }

        let scale_factors = [
            1.0f32.min(
                (1 + usize::from(max_index(&target_rows))) as f32
                    / (1 + usize::from(max_index(&discrete_rows))) as f32,
            ),
            1.0f32.min(
                (1 + usize::from(max_index(&target_columns))) as f32
                    / (1 + usize::from(max_index(&discrete_columns))) as f32,
            ),
        ];

        let path = self.search(&gate_jobs, scale_factors, expand_gate_node)?;
        for (i, job) in gate_jobs.iter().enumerate() {
            let option = &job.options[path[i + 1] as usize];
            for (j, &qubit) in job.qubits.iter().enumerate() {
                current[qubit.index()] = target_sites[&option.sites[j]];
            }
        }
        Ok(current)
    }

    /// Add one oriented candidate pair for a gate. The orientation with
    /// the smaller summed travel distance wins, keeping trajectories from
    /// crossing.
    fn add_gate_option(
        &self,
        target_rows: &RowColMap,
        target_columns: &RowColMap,
        left_site: Site,
        right_site: Site,
        candidate: Site,
        job: &mut GateJob,
    ) {
        let arch = self.architecture;
        let other = arch.other_entanglement_site(candidate);
        let d1 = arch.distance(left_site, candidate) as f32;
        let d2 = arch.distance(right_site, candidate) as f32;
        let d3 = arch.distance(left_site, other) as f32;
        let d4 = arch.distance(right_site, other) as f32;
        let discrete_candidate = [
            target_rows[&(candidate.slm, candidate.row)],
            target_columns[&(candidate.slm, candidate.col)],
        ];
        let discrete_other = [
            target_rows[&(other.slm, other.row)],
            target_columns[&(other.slm, other.col)],
        ];
        if d1 + d4 <= d2 + d3 {
            job.options.push(GateOption {
                sites: [discrete_candidate, discrete_other],
                distance: [d1, d4],
                lookahead: 0.0,
            });
        } else {
            job.options.push(GateOption {
                sites: [discrete_other, discrete_candidate],
                distance: [d2, d3],
                lookahead: 0.0,
            });
        }
    }

    // -----------------------------------------------------------------
    // Storage placement
    // -----------------------------------------------------------------

    /// Move the atoms of the executed layer back to storage, except those
    /// kept in the entanglement zone by reuse.
    fn place_atoms_in_storage_zone(
        &self,
        previous: &Placement,
        reuse: &ReuseSet,
        gates: &TwoQubitLayer,
        next_gates: &TwoQubitLayer,
    ) -> CompileResult<Placement> {
        let arch = self.architecture;
        let mut current = previous.clone();
        if gates.is_empty() {
            return Ok(current);
        }

        // The farthest atom is placed first; the rest follow by their
        // distance to it, so nearby atoms are decided while the groups
        // they would join still exist.
        let mut atoms_to_place: Vec<QubitId> = Vec::new();
        let mut max_distance = 0.0f64;
        let mut farthest = 0usize;
        for &gate in gates {
            for qubit in gate {
                let site = previous[qubit.index()];
                let nearest = arch.nearest_storage_site(site);
                let distance = arch.distance(site, nearest);
                if distance > max_distance {
                    max_distance = distance;
                    farthest = atoms_to_place.len();
                }
                atoms_to_place.push(qubit);
            }
        }
        atoms_to_place.swap(0, farthest);
        let front_site = previous[atoms_to_place[0].index()];
        let mut rest: Vec<(f64, QubitId)> = atoms_to_place[1..]
            .iter()
            .map(|&q| (arch.distance(previous[q.index()], front_site), q))
            .collect();
        rest.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        for (i, (_, q)) in rest.into_iter().enumerate() {
            atoms_to_place[i + 1] = q;
        }

        let (discrete_rows, discrete_columns) =
            self.discretize_placement_of_atoms(previous, &atoms_to_place);

        let mut occupied: FxHashSet<Site> = FxHashSet::default();
        for &site in previous.iter() {
            if arch.slm(site.slm).is_storage() {
                occupied.insert(site);
            }
        }
        let (target_rows, target_columns) = self.discretize_non_occupied_storage_sites(&occupied);
        let target_sites = concretize_targets(&target_rows, &target_columns);

        let n_jobs = atoms_to_place.len();
        let mut atom_jobs: Vec<AtomJob> = Vec::with_capacity(n_jobs);
        let mut min_nearest_column = u8::MAX;
        let mut max_nearest_column = 0u8;
        for &atom in &atoms_to_place {
            let site = previous[atom.index()];
            let nearest = arch.nearest_storage_site(site);
            if let Some(&column) = target_columns.get(&(nearest.slm, nearest.col)) {
                min_nearest_column = min_nearest_column.min(column);
                max_nearest_column = max_nearest_column.max(column);
            }
            let mut job = AtomJob {
                atom,
                current: [
                    discrete_rows[&(site.slm, site.row)],
                    discrete_columns[&(site.slm, site.col)],
                ],
                mean_lookahead: 0.0,
                options: Vec::new(),
            };
            if reuse.contains(&atom) {
                job.options.push(AtomOption {
                    site: [0, 0],
                    reuse: true,
                    distance: 0.0,
                    lookahead: 0.0,
                });
            }
            let slm = arch.slm(nearest.slm);
            let mut window = if self.config.use_window {
                Window::around(
                    nearest,
                    self.config.window_min_width,
                    self.window_min_height,
                    slm.rows,
                    slm.cols,
                )
            } else {
                Window::full(slm.rows, slm.cols)
            };
            let mut push_option = |job: &mut AtomJob, r: usize, c: usize| {
                let candidate = Site::new(nearest.slm, r, c);
                if !occupied.contains(&candidate) {
                    job.options.push(AtomOption {
                        site: [
                            target_rows[&(nearest.slm, r)],
                            target_columns[&(nearest.slm, c)],
                        ],
                        reuse: false,
                        distance: arch.distance(site, candidate) as f32,
                        lookahead: 0.0,
                    });
                }
            };
            for r in window.r_low..window.r_high {
                for c in window.c_low..window.c_high {
                    push_option(&mut job, r, c);
                }
            }
            let mut expansion = 0usize;
            while self.config.use_window
                && (job.options.len() as f64) < self.config.window_share * n_jobs as f64
            {
                expansion += 1;
                let (width, height) = if self.config.window_ratio < 1.0 {
                    let width = self.config.window_min_width + 2 * expansion;
                    (width, (self.config.window_ratio * width as f64).round() as usize)
                } else {
                    let height = self.window_min_height + 2 * expansion;
                    (
                        (height as f64 / self.config.window_ratio).round() as usize,
                        height,
                    )
                };
                let grown = Window::around(nearest, width, height, slm.rows, slm.cols);
                if grown == window && grown == Window::full(slm.rows, slm.cols) {
                    break;
                }
                for (r, c) in window.fresh_sites(&grown) {
                    push_option(&mut job, r, c);
                }
                window = grown;
            }
            job.options
                .sort_by(|a, b| a.distance.total_cmp(&b.distance));

            // Lookahead toward the atom's interaction partner in the next
            // layer, if any. For the stay-option, the partner's distance
            // itself (minus the reuse bonus) is the price of reuse.
            if let Some(partner) = interaction_partner(next_gates, atom) {
                let partner_site = previous[partner.index()];
                let mut sum = 0.0f32;
                for option in &mut job.options {
                    if option.reuse {
                        let distance = arch.distance(partner_site, site) as f32;
                        option.lookahead =
                            (distance.sqrt() - self.config.reuse_level).max(0.0);
                    } else {
                        let target = target_sites[&option.site];
                        let distance = arch.distance(partner_site, target) as f32;
                        option.lookahead = self.config.lookahead_factor * distance.sqrt();
                    }
                    sum += option.lookahead;
                }
                job.mean_lookahead = sum / job.options.len() as f32;
            }
            atom_jobs.push(job);
        }

        let source_columns = usize::from(max_index(&discrete_columns));
        let scale_factors = [
            1.0f32.min(
                (1 + usize::from(max_index(&target_rows))) as f32
                    / (1 + usize::from(max_index(&discrete_rows))) as f32,
            ),
            (1.0f32.max(
                f32::from(max_nearest_column.saturating_sub(min_nearest_column))
                    / source_columns as f32,
            ))
            .min(
                (1 + usize::from(max_index(&target_columns))) as f32
                    / (1 + source_columns) as f32,
            ),
        ];

        let path = self.search(&atom_jobs, scale_factors, expand_atom_node)?;
        for (i, job) in atom_jobs.iter().enumerate() {
            let option = &job.options[path[i + 1] as usize];
            if !option.reuse {
                current[job.atom.index()] = target_sites[&option.site];
            }
        }
        Ok(current)
    }

    // -----------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------

    /// Run the A* tree search over the given jobs and return, per job, the
    /// index of the chosen option (the root prepended, so entry `i + 1`
    /// answers job `i`).
    fn search<J: PlacementJob>(
        &self,
        jobs: &[J],
        scale_factors: [f32; 2],
        expand: fn(&mut NodeArena<SearchNode>, NodeId, &[J]) -> Vec<NodeId>,
    ) -> CompileResult<Vec<u16>> {
        let mut arena: NodeArena<SearchNode> = NodeArena::new();
        let root = arena.push(SearchNode::default());
        let n_jobs = jobs.len();
        let deepening_factor = self.config.deepening_factor;
        let deepening_value = self.config.deepening_value;
        let path = a_star_tree_search(
            &mut arena,
            root,
            |arena, id| expand(arena, id, jobs),
            |node| node.level as usize == n_jobs,
            |node| f64::from(node_cost(node)),
            |node| {
                f64::from(heuristic(
                    jobs,
                    deepening_factor,
                    deepening_value,
                    scale_factors,
                    node,
                ))
            },
            self.config.max_nodes,
        )?;
        debug_assert_eq!(path.len(), n_jobs + 1);
        Ok(path.iter().map(|&id| arena.get(id).option).collect())
    }
}

/// A rectangular candidate window on one SLM grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    r_low: usize,
    r_high: usize,
    c_low: usize,
    c_high: usize,
}

impl Window {
    /// A `width × height` window centered on `center`, clamped to the grid.
    fn around(center: Site, width: usize, height: usize, rows: usize, cols: usize) -> Self {
        Self {
            r_low: center.row.saturating_sub(height / 2),
            r_high: (center.row + height / 2 + 1).min(rows),
            c_low: center.col.saturating_sub(width / 2),
            c_high: (center.col + width / 2 + 1).min(cols),
        }
    }

    fn full(rows: usize, cols: usize) -> Self {
        Self {
            r_low: 0,
            r_high: rows,
            c_low: 0,
            c_high: cols,
        }
    }

    /// The sites of `grown` that this window does not cover.
    fn fresh_sites(&self, grown: &Window) -> Vec<(usize, usize)> {
        let mut fresh = Vec::new();
        for r in grown.r_low..grown.r_high {
            for c in grown.c_low..grown.c_high {
                if r < self.r_low || r >= self.r_high || c < self.c_low || c >= self.c_high {
                    fresh.push((r, c));
                }
            }
        }
        fresh
    }
}

/// The partner of `qubit` in the first gate of `gates` containing it.
fn interaction_partner(gates: &TwoQubitLayer, qubit: QubitId) -> Option<QubitId> {
    gates.iter().find_map(|&[a, b]| {
        if a == qubit {
            Some(b)
        } else if b == qubit {
            Some(a)
        } else {
            None
        }
    })
}

/// Resolve discrete target coordinates back to concrete sites.
fn concretize_targets(
    target_rows: &RowColMap,
    target_columns: &RowColMap,
) -> FxHashMap<DiscreteSite, Site> {
    let mut sites: FxHashMap<DiscreteSite, Site> = FxHashMap::default();
    for (&(slm, row), &r) in target_rows {
        for (&(column_slm, col), &c) in target_columns {
            if slm == column_slm {
                sites.entry([r, c]).or_insert(Site::new(slm, row, col));
            }
        }
    }
    sites
}

/// Largest dense index in a row/column map.
fn max_index(map: &RowColMap) -> u8 {
    map.values().copied().max().unwrap_or(0)
}

fn index_grouped(by_coordinate: &BTreeMap<u64, BTreeSet<(SlmId, usize)>>) -> RowColMap {
    let mut indices = RowColMap::default();
    for (index, entries) in by_coordinate.values().enumerate() {
        let index = u8::try_from(index).expect("more than 256 distinct coordinates");
        for &entry in entries {
            indices.insert(entry, index);
        }
    }
    indices
}

fn index_single(by_coordinate: &BTreeMap<u64, (SlmId, usize)>) -> RowColMap {
    let mut indices = RowColMap::default();
    for (index, &entry) in by_coordinate.values().enumerate() {
        let index = u8::try_from(index).expect("more than 256 distinct coordinates");
        indices.insert(entry, index);
    }
    indices
}

// ---------------------------------------------------------------------
// Cost model
// ---------------------------------------------------------------------

/// Total cost to reach a node: one √(longest distance) per compatibility
/// group, plus the accumulated lookahead.
fn node_cost(node: &SearchNode) -> f32 {
    let mut cost = node.lookahead;
    for &d in &node.group_max_distances {
        cost += d.sqrt();
    }
    cost
}

/// Sum, over all groups and both axes, of the standard deviation of
/// `value − scale·key`. Zero means every group moves its atoms without
/// changing their relative spacing.
fn sum_std_deviation(scale_factors: [f32; 2], groups: &[CompatibilityGroup]) -> f32 {
    let mut sum = 0.0f32;
    for group in groups {
        for (axis, map) in group.iter().enumerate() {
            let n = map.len() as f32;
            let diffs: Vec<f32> = map
                .iter()
                .map(|(&key, &value)| f32::from(value) - scale_factors[axis] * f32::from(key))
                .collect();
            let mean = diffs.iter().sum::<f32>() / n;
            let variance = diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f32>() / n;
            sum += variance.sqrt();
        }
    }
    sum
}

/// Common interface of atom and gate jobs for the heuristic.
trait PlacementJob {
    fn mean_lookahead(&self) -> f32;
    /// Distance of the nearest option whose target sites are still free
    /// under `consumed`; `None` for a reuse stay-option.
    fn nearest_free_distance(&self, consumed: &FxHashSet<DiscreteSite>) -> Option<f32>;
}

impl PlacementJob for AtomJob {
    fn mean_lookahead(&self) -> f32 {
        self.mean_lookahead
    }

    fn nearest_free_distance(&self, consumed: &FxHashSet<DiscreteSite>) -> Option<f32> {
        // Options are sorted by distance, so the first free one is the
        // nearest. A reuse option sorts first (distance zero) and costs
        // nothing.
        for option in &self.options {
            if option.reuse {
                return None;
            }
            if !consumed.contains(&option.site) {
                return Some(option.distance);
            }
        }
        None
    }
}

impl PlacementJob for GateJob {
    fn mean_lookahead(&self) -> f32 {
        self.mean_lookahead
    }

    fn nearest_free_distance(&self, consumed: &FxHashSet<DiscreteSite>) -> Option<f32> {
        for option in &self.options {
            if option.sites.iter().all(|site| !consumed.contains(site)) {
                return Some(option.distance[0].max(option.distance[1]));
            }
        }
        None
    }
}

/// Estimated remaining cost: the marginal √-distance of the worst pending
/// job over the worst placed one, the pending jobs' mean lookahead, and
/// the inadmissible deepening term scaled by the number of unplaced jobs.
fn heuristic<J: PlacementJob>(
    jobs: &[J],
    deepening_factor: f32,
    deepening_value: f32,
    scale_factors: [f32; 2],
    node: &SearchNode,
) -> f32 {
    let unplaced = jobs.len() - node.level as usize;
    let mut max_unplaced_distance = 0.0f32;
    let mut lookahead = 0.0f32;
    for job in &jobs[node.level as usize..] {
        lookahead += job.mean_lookahead();
        if let Some(distance) = job.nearest_free_distance(&node.consumed) {
            max_unplaced_distance = max_unplaced_distance.max(distance);
        }
    }
    let max_placed_distance = node
        .group_max_distances
        .iter()
        .copied()
        .fold(0.0f32, f32::max);
    let mut estimate = if max_unplaced_distance <= max_placed_distance {
        0.0
    } else {
        max_unplaced_distance.sqrt() - max_placed_distance.sqrt()
    };
    estimate += lookahead;
    estimate += deepening_factor
        * (sum_std_deviation(scale_factors, &node.groups) + deepening_value)
        * unplaced as f32;
    estimate
}

// ---------------------------------------------------------------------
// Node expansion
// ---------------------------------------------------------------------

/// Check whether assigning `value` to `key` keeps `group` monotone.
/// Returns whether the key is already present (with the same value), or
/// `None` if the assignment is incompatible.
fn check_compatibility_with_group(
    key: u8,
    value: u8,
    group: &BTreeMap<u8, u8>,
) -> Option<bool> {
    match group.range(key..).next() {
        Some((&upper_key, &upper_value)) if upper_key == key => {
            (upper_value == value).then_some(true)
        }
        Some((_, &upper_value)) => match group.range(..key).next_back() {
            Some((_, &lower_value)) => {
                (lower_value < value && value < upper_value).then_some(false)
            }
            None => (value < upper_value).then_some(false),
        },
        None => {
            // The group holds at least one entry, all with smaller keys.
            let (_, &lower_value) = group.range(..key).next_back().expect("group is non-empty");
            (lower_value < value).then_some(false)
        }
    }
}

/// Add the movement `(h_key→h_value, v_key→v_value)` to the first group it
/// is compatible with, or open a new group. Returns whether an existing
/// group accepted it.
fn check_compatibility_and_add_placement(
    h_key: u8,
    h_value: u8,
    v_key: u8,
    v_value: u8,
    distance: f32,
    groups: &mut Vec<CompatibilityGroup>,
    max_distances: &mut Vec<f32>,
) -> bool {
    for (i, group) in groups.iter_mut().enumerate() {
        if let Some(h_exists) = check_compatibility_with_group(h_key, h_value, &group[0]) {
            if let Some(v_exists) = check_compatibility_with_group(v_key, v_value, &group[1]) {
                if !h_exists {
                    group[0].insert(h_key, h_value);
                }
                if !v_exists {
                    group[1].insert(v_key, v_value);
                }
                max_distances[i] = max_distances[i].max(distance);
                return true;
            }
        }
    }
    let mut group = CompatibilityGroup::default();
    group[0].insert(h_key, h_value);
    group[1].insert(v_key, v_value);
    groups.push(group);
    max_distances.push(distance);
    false
}

fn expand_atom_node(
    arena: &mut NodeArena<SearchNode>,
    id: NodeId,
    jobs: &[AtomJob],
) -> Vec<NodeId> {
    let node = arena.get(id).clone();
    let job = &jobs[node.level as usize];
    let mut children = Vec::new();
    for (i, option) in job.options.iter().enumerate() {
        if !option.reuse && node.consumed.contains(&option.site) {
            continue;
        }
        let mut child = node.clone();
        if !option.reuse {
            child.consumed.insert(option.site);
            check_compatibility_and_add_placement(
                job.current[0],
                option.site[0],
                job.current[1],
                option.site[1],
                option.distance,
                &mut child.groups,
                &mut child.group_max_distances,
            );
        }
        child.option = u16::try_from(i).expect("more than 65536 options");
        child.level += 1;
        child.lookahead += option.lookahead;
        child.parent = Some(id);
        children.push(arena.push(child));
    }
    children
}

fn expand_gate_node(
    arena: &mut NodeArena<SearchNode>,
    id: NodeId,
    jobs: &[GateJob],
) -> Vec<NodeId> {
    let node = arena.get(id).clone();
    let job = &jobs[node.level as usize];
    let mut children = Vec::new();
    for (i, option) in job.options.iter().enumerate() {
        if option.sites.iter().any(|site| node.consumed.contains(site)) {
            continue;
        }
        let mut child = node.clone();
        child.level += 1;
        child.option = u16::try_from(i).expect("more than 65536 options");
        for j in 0..2 {
            child.consumed.insert(option.sites[j]);
            check_compatibility_and_add_placement(
                job.currents[j][0],
                option.sites[j][0],
                job.currents[j][1],
                option.sites[j][1],
                option.distance[j],
                &mut child.groups,
                &mut child.group_max_distances,
            );
        }
        child.lookahead += option.lookahead;
        child.parent = Some(id);
        children.push(arena.push(child));
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> Architecture {
        Architecture::from_json_str(include_str!(
            "../../../vela-arch/tests/fixtures/compute_store.json"
        ))
        .unwrap()
    }

    fn placer(arch: &Architecture) -> AStarPlacer<'_> {
        AStarPlacer::new(arch, AStarConfig::default())
    }

    fn layer(gates: &[[u32; 2]]) -> TwoQubitLayer {
        gates.iter().map(|&[a, b]| [QubitId(a), QubitId(b)]).collect()
    }

    fn assert_injective(placement: &Placement) {
        let unique: BTreeSet<_> = placement.iter().collect();
        assert_eq!(unique.len(), placement.len());
    }

    #[test]
    fn test_empty_circuit() {
        let arch = arch();
        let placements = placer(&arch).place(1, &[], &[]).unwrap();
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].len(), 1);
    }

    #[test]
    fn test_one_gate() {
        let arch = arch();
        let placements = placer(&arch).place(2, &[layer(&[[0, 1]])], &[]).unwrap();
        assert_eq!(placements.len(), 3);
        for placement in &placements {
            assert_eq!(placement.len(), 2);
            assert_injective(placement);
        }
        let gate = &placements[1];
        assert!(arch.is_interaction_pair(gate[0], gate[1]));
        // Qubit 0 starts in the left column, so it lands in the left SLM.
        let (x0, _) = arch.exact_location(gate[0]);
        let (x1, _) = arch.exact_location(gate[1]);
        assert!(x0 < x1);
        // Afterwards both atoms are back in storage.
        for &site in &placements[2] {
            assert!(arch.slm(site.slm).is_storage());
        }
    }

    #[test]
    fn test_two_parallel_gates_share_rows() {
        let arch = arch();
        let placements = placer(&arch)
            .place(4, &[layer(&[[0, 1], [2, 3]])], &[])
            .unwrap();
        let gate = &placements[1];
        assert_injective(gate);
        assert!(arch.is_interaction_pair(gate[0], gate[1]));
        assert!(arch.is_interaction_pair(gate[2], gate[3]));
        // All four atoms sit in one entanglement row, ordered as in
        // storage.
        let locations: Vec<_> = gate.iter().map(|&s| arch.exact_location(s)).collect();
        assert!(locations.windows(2).all(|w| w[0].1 == w[1].1));
        assert!(locations.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_full_entanglement_zone() {
        let arch = arch();
        let gates: Vec<[u32; 2]> = (0..16).map(|i| [2 * i, 2 * i + 1]).collect();
        let placements = placer(&arch).place(32, &[layer(&gates)], &[]).unwrap();
        let gate = &placements[1];
        assert_injective(gate);
        for g in &layer(&gates) {
            assert!(arch.is_interaction_pair(gate[g[0].index()], gate[g[1].index()]));
        }
        // Every interaction pair of the zone is occupied exactly once.
        assert_eq!(gate.len(), 32);
    }

    #[test]
    fn test_reuse_keeps_the_shared_atom_in_place() {
        let arch = arch();
        let layers = vec![layer(&[[0, 1]]), layer(&[[1, 2]])];
        let reuse = vec![ReuseSet::from([QubitId(1)])];
        let placements = placer(&arch).place(3, &layers, &reuse).unwrap();
        assert_eq!(placements.len(), 5);
        for placement in &placements {
            assert_injective(placement);
        }
        // G1[1] == S1[1] == G2[1]: the shared atom never moves between
        // the two layers.
        assert_eq!(placements[1][1], placements[2][1]);
        assert_eq!(placements[2][1], placements[3][1]);
        // Its next partner occupies the other half of the pair.
        assert_eq!(
            placements[3][2],
            arch.other_entanglement_site(placements[3][1])
        );
    }

    #[test]
    fn test_node_limit_exceeded() {
        let arch = arch();
        let config = AStarConfig {
            max_nodes: 2,
            ..AStarConfig::default()
        };
        let err = AStarPlacer::new(&arch, config)
            .place(4, &[layer(&[[0, 1], [2, 3]])], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::NodeLimitExceeded { max_nodes: 2 }
        ));
    }

    #[test]
    fn test_compatibility_group_monotonicity() {
        let mut groups: Vec<CompatibilityGroup> = Vec::new();
        let mut max_distances: Vec<f32> = Vec::new();
        // (0→0, 0→0) opens a group.
        assert!(!check_compatibility_and_add_placement(
            0, 0, 0, 0, 1.0, &mut groups, &mut max_distances
        ));
        // (1→1, 1→1) extends it monotonically.
        assert!(check_compatibility_and_add_placement(
            1, 1, 1, 1, 2.0, &mut groups, &mut max_distances
        ));
        assert_eq!(groups.len(), 1);
        assert_eq!(max_distances, vec![2.0]);
        // (2→0, 2→2) reverses the horizontal order and must open a new
        // group.
        assert!(!check_compatibility_and_add_placement(
            2, 0, 2, 2, 3.0, &mut groups, &mut max_distances
        ));
        assert_eq!(groups.len(), 2);
        assert_eq!(max_distances, vec![2.0, 3.0]);
    }

    #[test]
    fn test_sum_std_deviation_zero_for_rigid_translation() {
        let mut group = CompatibilityGroup::default();
        group[0].extend([(0, 1), (1, 2), (2, 3)]);
        group[1].extend([(0, 0), (1, 1)]);
        // With scale factor 1, value - key is constant per axis.
        assert_eq!(sum_std_deviation([1.0, 1.0], &[group]), 0.0);
    }
}
