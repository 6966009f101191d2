//! The architecture model and its geometric queries.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::{ArchitectureError, ArchitectureResult};
use crate::slm::{Aod, Site, Slm, SlmId, ZoneId};
use crate::spec::ArchitectureSpec;

/// Durations of the primitive hardware operations, in µs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationDurations {
    pub atom_transfer: f64,
    pub rydberg_gate: f64,
    pub single_qubit_gate: f64,
}

impl Default for OperationDurations {
    fn default() -> Self {
        Self {
            atom_transfer: 15.0,
            rydberg_gate: 0.36,
            single_qubit_gate: 0.625,
        }
    }
}

/// Fidelities of the primitive hardware operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationFidelities {
    pub rydberg_gate: f64,
    pub single_qubit_gate: f64,
    pub atom_transfer: f64,
}

impl Default for OperationFidelities {
    fn default() -> Self {
        Self {
            rydberg_gate: 0.995,
            single_qubit_gate: 0.9997,
            atom_transfer: 0.999,
        }
    }
}

/// Bounding box of one Rydberg beam, i.e. the region in which the
/// interaction laser affects atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RydbergRange {
    pub min_x: u64,
    pub min_y: u64,
    pub max_x: u64,
    pub max_y: u64,
}

/// Immutable description of a zoned neutral-atom machine.
///
/// Owns the SLMs (storage arrays first, then the entanglement pairs in
/// zone order, so [`SlmId`] ordering is creation order) and the
/// preprocessed nearest-site caches. All queries after construction are
/// read-only.
#[derive(Debug)]
pub struct Architecture {
    /// Name of the architecture.
    pub name: String,
    slms: Vec<Slm>,
    storage: Vec<SlmId>,
    entanglement_zones: Vec<[SlmId; 2]>,
    /// The AODs available for shuttling.
    pub aods: Vec<Aod>,
    /// Operation durations, in µs.
    pub operation_durations: OperationDurations,
    /// Operation fidelities.
    pub operation_fidelities: OperationFidelities,
    /// Coherence time of a qubit, in µs.
    pub qubit_t1: f64,
    rydberg_ranges: Vec<RydbergRange>,
    /// For every entanglement site, the nearest storage site.
    nearest_storage: FxHashMap<SlmId, Vec<Vec<Site>>>,
    /// For every ordered pair of storage sites (triangularized: the map is
    /// only populated for `(a, b)` with `a <= b` lexicographically), the
    /// entanglement site minimizing the summed travel distance.
    nearest_entanglement: FxHashMap<SlmId, Vec<Vec<FxHashMap<SlmId, Vec<Vec<Site>>>>>>,
}

impl Architecture {
    /// Parse an architecture from a JSON string and run preprocessing.
    pub fn from_json_str(json: &str) -> ArchitectureResult<Self> {
        let spec: ArchitectureSpec = serde_json::from_str(json)?;
        Self::from_spec(spec)
    }

    /// Parse an architecture from an already-parsed JSON value.
    pub fn from_json_value(json: serde_json::Value) -> ArchitectureResult<Self> {
        let spec: ArchitectureSpec = serde_json::from_value(json)?;
        Self::from_spec(spec)
    }

    pub(crate) fn from_spec(spec: ArchitectureSpec) -> ArchitectureResult<Self> {
        if spec.rydberg_range.is_empty() {
            return Err(ArchitectureError::EmptyList("rydberg range"));
        }
        if spec.storage_zones.is_empty() {
            return Err(ArchitectureError::EmptyList("storage zone"));
        }
        if spec.entanglement_zones.is_empty() {
            return Err(ArchitectureError::EmptyList("entanglement zone"));
        }
        let operation_durations = match spec.operation_duration {
            Some(d) => OperationDurations {
                atom_transfer: d.atom_transfer,
                rydberg_gate: d.rydberg_gate,
                single_qubit_gate: d.single_qubit_gate,
            },
            None => {
                warn!("operation durations missing in architecture spec, using defaults");
                OperationDurations::default()
            }
        };
        let operation_fidelities = match spec.operation_fidelity {
            Some(f) => OperationFidelities {
                rydberg_gate: f.rydberg_gate,
                single_qubit_gate: f.single_qubit_gate,
                atom_transfer: f.atom_transfer,
            },
            None => {
                warn!("operation fidelities missing in architecture spec, using defaults");
                OperationFidelities::default()
            }
        };
        let qubit_t1 = match spec.qubit_spec {
            Some(q) => q.t,
            None => {
                warn!("qubit spec missing in architecture spec, using default T1");
                1.5e6
            }
        };

        let mut slms = Vec::new();
        let mut storage = Vec::new();
        for zone in &spec.storage_zones {
            for slm_spec in &zone.slms {
                if slm_spec.r == 0 || slm_spec.c == 0 {
                    return Err(ArchitectureError::DegenerateSlm {
                        slm_id: slm_spec.id,
                    });
                }
                let id = SlmId(slms.len());
                slms.push(Slm {
                    id: slm_spec.id,
                    site_separation: (slm_spec.site_separation[0], slm_spec.site_separation[1]),
                    rows: slm_spec.r,
                    cols: slm_spec.c,
                    location: (slm_spec.location[0], slm_spec.location[1]),
                    entanglement_zone: None,
                });
                storage.push(id);
            }
        }
        let mut entanglement_zones = Vec::new();
        for zone in &spec.entanglement_zones {
            if zone.slms.len() != 2 {
                return Err(ArchitectureError::EntanglementZoneShape {
                    zone_id: zone.zone_id,
                    got: zone.slms.len(),
                });
            }
            if zone.slms[0].r != zone.slms[1].r || zone.slms[0].c != zone.slms[1].c {
                return Err(ArchitectureError::EntanglementZoneMismatch {
                    zone_id: zone.zone_id,
                });
            }
            let zone_id = ZoneId(entanglement_zones.len());
            let mut pair = [SlmId(0); 2];
            for (i, slm_spec) in zone.slms.iter().enumerate() {
                if slm_spec.r == 0 || slm_spec.c == 0 {
                    return Err(ArchitectureError::DegenerateSlm {
                        slm_id: slm_spec.id,
                    });
                }
                pair[i] = SlmId(slms.len());
                slms.push(Slm {
                    id: slm_spec.id,
                    site_separation: (slm_spec.site_separation[0], slm_spec.site_separation[1]),
                    rows: slm_spec.r,
                    cols: slm_spec.c,
                    location: (slm_spec.location[0], slm_spec.location[1]),
                    entanglement_zone: Some(zone_id),
                });
            }
            entanglement_zones.push(pair);
        }
        let aods = spec
            .aods
            .iter()
            .map(|a| Aod {
                id: a.id,
                site_separation: a.site_separation,
                rows: a.r,
                cols: a.c,
            })
            .collect();
        let rydberg_ranges = spec
            .rydberg_range
            .iter()
            .map(|r| RydbergRange {
                min_x: r[0][0],
                min_y: r[0][1],
                max_x: r[1][0],
                max_y: r[1][1],
            })
            .collect();

        let mut arch = Self {
            name: spec.name,
            slms,
            storage,
            entanglement_zones,
            aods,
            operation_durations,
            operation_fidelities,
            qubit_t1,
            rydberg_ranges,
            nearest_storage: FxHashMap::default(),
            nearest_entanglement: FxHashMap::default(),
        };
        arch.preprocess();
        Ok(arch)
    }

    /// The SLM behind an id.
    #[must_use]
    pub fn slm(&self, id: SlmId) -> &Slm {
        &self.slms[id.0]
    }

    /// All SLMs, storage arrays first.
    #[must_use]
    pub fn slms(&self) -> &[Slm] {
        &self.slms
    }

    /// The storage SLMs, in spec order.
    #[must_use]
    pub fn storage_slms(&self) -> &[SlmId] {
        &self.storage
    }

    /// The entanglement zones, each a pair of SLM ids.
    #[must_use]
    pub fn entanglement_zones(&self) -> &[[SlmId; 2]] {
        &self.entanglement_zones
    }

    /// The Rydberg beam bounding boxes.
    #[must_use]
    pub fn rydberg_ranges(&self) -> &[RydbergRange] {
        &self.rydberg_ranges
    }

    /// Total number of interaction pairs across all entanglement zones.
    #[must_use]
    pub fn entanglement_capacity(&self) -> usize {
        self.entanglement_zones
            .iter()
            .map(|pair| {
                let front = self.slm(pair[0]);
                front.rows * front.cols
            })
            .sum()
    }

    /// Whether `site` addresses an existing trap.
    #[must_use]
    pub fn is_valid_position(&self, site: Site) -> bool {
        let slm = self.slm(site.slm);
        site.row < slm.rows && site.col < slm.cols
    }

    /// Exact location of a site in the global coordinate system.
    #[must_use]
    pub fn exact_location(&self, site: Site) -> (u64, u64) {
        debug_assert!(self.is_valid_position(site));
        let slm = self.slm(site.slm);
        (
            slm.location.0 + slm.site_separation.0 * site.col as u64,
            slm.location.1 + slm.site_separation.1 * site.row as u64,
        )
    }

    /// Euclidean distance between the exact locations of two sites.
    #[must_use]
    pub fn distance(&self, a: Site, b: Site) -> f64 {
        let (x1, y1) = self.exact_location(a);
        let (x2, y2) = self.exact_location(b);
        (x1 as f64 - x2 as f64).hypot(y1 as f64 - y2 as f64)
    }

    /// The storage site nearest to the given entanglement site.
    #[must_use]
    pub fn nearest_storage_site(&self, site: Site) -> Site {
        self.nearest_storage[&site.slm][site.row][site.col]
    }

    /// The entanglement site minimizing the summed travel distance from two
    /// storage sites.
    ///
    /// The cache is triangularized over the lexicographic site order, so
    /// arguments are normalized before the lookup; the result is identical
    /// for `(a, b)` and `(b, a)`.
    #[must_use]
    pub fn nearest_entanglement_site(&self, a: Site, b: Site) -> Site {
        debug_assert!(self.slm(a.slm).is_storage() && self.slm(b.slm).is_storage());
        if a > b {
            return self.nearest_entanglement_site(b, a);
        }
        let row = if a.slm == b.slm { b.row - a.row } else { b.row };
        let col = if a.slm == b.slm && a.row == b.row {
            b.col - a.col
        } else {
            b.col
        };
        self.nearest_entanglement[&a.slm][a.row][a.col][&b.slm][row][col]
    }

    /// The cost of bringing two storage atoms together on their nearest
    /// entanglement site: the maximum of the two travel distances if the
    /// atoms share a storage row (they can ride one AOD sweep), their sum
    /// otherwise.
    #[must_use]
    pub fn nearest_entanglement_site_distance(&self, a: Site, b: Site) -> f64 {
        let e = self.nearest_entanglement_site(a, b);
        let d1 = self.distance(a, e);
        let d2 = self.distance(b, e);
        if a.slm == b.slm && a.row == b.row {
            d1.max(d2)
        } else {
            d1 + d2
        }
    }

    /// The partner of an entanglement site, i.e. the site with the same
    /// grid index in the other SLM of the pair.
    #[must_use]
    pub fn other_entanglement_site(&self, site: Site) -> Site {
        let zone = self
            .slm(site.slm)
            .entanglement_zone
            .expect("site must be in an entanglement zone");
        let pair = self.entanglement_zones[zone.0];
        let other = if pair[0] == site.slm { pair[1] } else { pair[0] };
        Site::new(other, site.row, site.col)
    }

    /// Whether two entanglement sites form one interaction pair.
    #[must_use]
    pub fn is_interaction_pair(&self, a: Site, b: Site) -> bool {
        self.slm(a.slm).is_entanglement() && self.other_entanglement_site(a) == b
    }

    // -----------------------------------------------------------------
    // Preprocessing
    // -----------------------------------------------------------------

    /// Populate the nearest-site caches. Runs once during construction in
    /// `O(|storage sites| * |entanglement sites|)`.
    fn preprocess(&mut self) {
        // Nearest storage site for each entanglement site. The search first
        // picks the storage SLM by a bounding-box lower bound, then clamps
        // the projected coordinates into that SLM's grid.
        let mut nearest_storage = FxHashMap::default();
        for zone in &self.entanglement_zones {
            for &slm_id in zone {
                let slm = self.slm(slm_id);
                let mut grid = Vec::with_capacity(slm.rows);
                for row in 0..slm.rows {
                    let mut grid_row = Vec::with_capacity(slm.cols);
                    for col in 0..slm.cols {
                        let (x, y) = self.exact_location(Site::new(slm_id, row, col));
                        let nearest_slm = self.find_nearest_storage_slm(x, y);
                        grid_row.push(self.clamp_to_grid(nearest_slm, x, y));
                    }
                    grid.push(grid_row);
                }
                nearest_storage.insert(slm_id, grid);
            }
        }
        self.nearest_storage = nearest_storage;

        // Nearest entanglement site for each unordered pair of storage
        // sites, triangularized: for the pair ((slm1, r1, c1), (slm2, r2,
        // c2)) only the canonical order slm1 <= slm2 (and within one SLM
        // r1 <= r2, then c1 <= c2) is stored, with the second index
        // relative to the first where they share an SLM (or a row).
        let mut nearest_entanglement = FxHashMap::default();
        for &slm1_id in &self.storage {
            let slm1 = self.slm(slm1_id);
            let mut grid1 = Vec::with_capacity(slm1.rows);
            for r1 in 0..slm1.rows {
                let mut grid1_row = Vec::with_capacity(slm1.cols);
                for c1 in 0..slm1.cols {
                    let (x, y) = self.exact_location(Site::new(slm1_id, r1, c1));
                    let mut per_other: FxHashMap<SlmId, Vec<Vec<Site>>> = FxHashMap::default();
                    for &slm2_id in &self.storage {
                        if slm2_id < slm1_id {
                            continue;
                        }
                        let slm2 = self.slm(slm2_id);
                        let r2_start = if slm1_id == slm2_id { r1 } else { 0 };
                        let mut grid2 = Vec::with_capacity(slm2.rows - r2_start);
                        for r2 in r2_start..slm2.rows {
                            let c2_start = if slm1_id == slm2_id && r1 == r2 { c1 } else { 0 };
                            let mut grid2_row = Vec::with_capacity(slm2.cols - c2_start);
                            for c2 in c2_start..slm2.cols {
                                let (other_x, other_y) =
                                    self.exact_location(Site::new(slm2_id, r2, c2));
                                let nearest_slm =
                                    self.find_nearest_entanglement_slm(x, y, other_x, other_y);
                                grid2_row.push(self.clamp_to_grid(nearest_slm, x, y));
                            }
                            grid2.push(grid2_row);
                        }
                        per_other.insert(slm2_id, grid2);
                    }
                    grid1_row.push(per_other);
                }
                grid1.push(grid1_row);
            }
            nearest_entanglement.insert(slm1_id, grid1);
        }
        self.nearest_entanglement = nearest_entanglement;
    }

    /// The storage SLM with the smallest bounding-box lower-bound distance
    /// to `(x, y)`.
    fn find_nearest_storage_slm(&self, x: u64, y: u64) -> SlmId {
        let mut minimum = f64::MAX;
        let mut nearest = self.storage[0];
        for &slm_id in &self.storage {
            let slm = self.slm(slm_id);
            let dx = if x < slm.location.0 {
                slm.location.0 - x
            } else {
                x.saturating_sub(slm.max_x())
            };
            let dy = if y < slm.location.1 {
                slm.location.1 - y
            } else {
                y.saturating_sub(slm.max_y())
            };
            let bound = (dx as f64).hypot(dy as f64);
            if bound < minimum {
                minimum = bound;
                nearest = slm_id;
            }
        }
        nearest
    }

    /// The entanglement SLM with the smallest lower-bound combined distance
    /// from `(x, y)` and `(other_x, other_y)`. The bound is a manhattan
    /// proxy: the fixed separation of the two sites plus twice the gap to
    /// the SLM's bounding box per axis.
    fn find_nearest_entanglement_slm(&self, x: u64, y: u64, other_x: u64, other_y: u64) -> SlmId {
        let mut minimum = f64::MAX;
        let mut nearest = self.entanglement_zones[0][0];
        for zone in &self.entanglement_zones {
            for &slm_id in zone {
                let slm = self.slm(slm_id);
                let mut dx = x.abs_diff(other_x);
                if x < slm.location.0 && other_x < slm.location.0 {
                    dx += 2 * (slm.location.0 - x.max(other_x));
                } else if x > slm.max_x() && other_x > slm.max_x() {
                    dx += 2 * (x.min(other_x) - slm.max_x());
                }
                let mut dy = y.abs_diff(other_y);
                if y < slm.location.1 {
                    dy += 2 * slm.location.1.saturating_sub(y.max(other_y));
                } else if y > slm.max_y() {
                    dy += 2 * y.min(other_y).saturating_sub(slm.max_y());
                }
                let bound = (dx as f64).hypot(dy as f64);
                if bound < minimum {
                    minimum = bound;
                    nearest = slm_id;
                }
            }
        }
        nearest
    }

    /// Project `(x, y)` onto the nearest site of `slm_id`, clamping to the
    /// grid bounds.
    fn clamp_to_grid(&self, slm_id: SlmId, x: u64, y: u64) -> Site {
        let slm = self.slm(slm_id);
        let col = if x > slm.max_x() {
            slm.cols - 1
        } else if x >= slm.location.0 {
            ((x - slm.location.0 + slm.site_separation.0 / 2) / slm.site_separation.0) as usize
        } else {
            0
        };
        let row = if y > slm.max_y() {
            slm.rows - 1
        } else if y >= slm.location.1 {
            ((y - slm.location.1 + slm.site_separation.1 / 2) / slm.site_separation.1) as usize
        } else {
            0
        };
        Site::new(slm_id, row, col)
    }
}
