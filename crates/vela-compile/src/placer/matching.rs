//! Minimum-weight full bipartite matching.
//!
//! Successive-shortest-augmenting-path algorithm with reduced costs and
//! dual potentials, following the Pape–Conforti formulation. The input is
//! a rectangular cost matrix from jobs (rows) to targets (columns) where
//! `None` marks a disallowed assignment; every job ends up assigned, so
//! there must be at least as many targets as jobs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{CompileError, CompileResult};

/// An entry of the shortest-path queue: either a *special* item that lazily
/// scans a job's sorted neighbor list, or a regular relaxation item.
struct QueueItem {
    cost: f64,
    x: usize,
    y: usize,
    /// Position in `list[x]` for special items, `None` for regular ones.
    list_pos: Option<usize>,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that the `BinaryHeap` pops the smallest cost first;
        // ties broken on (x, y, kind) for determinism.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.x.cmp(&self.x))
            .then_with(|| other.y.cmp(&self.y))
            .then_with(|| match (&self.list_pos, &other.list_pos) {
                (None, None) | (Some(_), Some(_)) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
            })
    }
}

/// Compute a minimum-weight full matching of all rows to distinct columns.
///
/// Returns, for every row, the column it is matched to. Rejects matrices
/// that are non-rectangular, have more rows than columns, or contain a row
/// without any allowed assignment.
pub(crate) fn minimum_weight_full_bipartite_matching(
    cost_matrix: &[Vec<Option<f64>>],
) -> CompileResult<Vec<usize>> {
    let size_x = cost_matrix.len();
    if size_x == 0 {
        return Ok(Vec::new());
    }
    let size_y = cost_matrix[0].len();
    if size_x > size_y {
        return Err(CompileError::PlacementInfeasible(
            "cost matrix must have at least as many columns as rows".to_string(),
        ));
    }
    for row in cost_matrix {
        if row.len() != size_y {
            return Err(CompileError::PlacementInfeasible(
                "cost matrix must be rectangular".to_string(),
            ));
        }
        if row.iter().all(Option::is_none) {
            return Err(CompileError::PlacementInfeasible(
                "cost matrix must not contain empty rows".to_string(),
            ));
        }
    }

    // For every job, its allowed targets in increasing order of cost.
    let mut list: Vec<Vec<usize>> = vec![Vec::new(); size_x];
    for (x, row) in cost_matrix.iter().enumerate() {
        for (y, entry) in row.iter().enumerate() {
            if entry.is_some() {
                list[x].push(y);
            }
        }
        list[x].sort_by(|&a, &b| {
            cost_matrix[x][a]
                .expect("edge exists")
                .total_cmp(&cost_matrix[x][b].expect("edge exists"))
        });
    }

    let cost = |x: usize, y: usize| cost_matrix[x][y].expect("edge exists");

    let mut free_sources = vec![true; size_x];
    let mut free_targets = vec![true; size_y];
    let mut inv_matching: Vec<Option<usize>> = vec![None; size_y];
    let mut matched = 0usize;
    let mut quantities_x = vec![0.0f64; size_x];
    let mut quantities_y = vec![0.0f64; size_y];
    let mut potentials_x = vec![0.0f64; size_x];
    let mut potentials_y = vec![0.0f64; size_y];
    let mut max_potential = 0.0f64;

    while matched < size_x {
        let mut path_x = vec![0usize; size_x];
        let mut path_y = vec![0usize; size_y];
        let mut queue: BinaryHeap<QueueItem> = BinaryHeap::new();
        let mut residue_x = free_sources.clone();
        let mut residue_y = vec![false; size_y];
        for x in 0..size_x {
            if residue_x[x] {
                quantities_x[x] = 0.0;
                let y = list[x][0];
                queue.push(QueueItem {
                    cost: quantities_x[x] + cost(x, y) + potentials_x[x] - max_potential,
                    x,
                    y,
                    list_pos: Some(0),
                });
            }
        }
        let mut reached_free = vec![false; size_y];
        let mut x = 0usize;
        let mut y = 0usize;
        while reached_free.iter().all(|&b| !b) {
            // Pop until a regular item on a non-matching edge surfaces;
            // special items spawn their successor and their regular twin.
            loop {
                let Some(item) = queue.pop() else {
                    return Err(CompileError::PlacementInfeasible(
                        "no augmenting path in cost matrix".to_string(),
                    ));
                };
                x = item.x;
                y = item.y;
                if let Some(pos) = item.list_pos {
                    if *list[x].last().expect("row has allowed targets") != y {
                        let w = list[x][pos + 1];
                        queue.push(QueueItem {
                            cost: quantities_x[x] + cost(x, w) + potentials_x[x] - max_potential,
                            x,
                            y: w,
                            list_pos: Some(pos + 1),
                        });
                    }
                    queue.push(QueueItem {
                        cost: quantities_x[x] + cost(x, y) + potentials_x[x] - potentials_y[y],
                        x,
                        y,
                        list_pos: None,
                    });
                    continue;
                }
                if inv_matching[y] != Some(x) {
                    break;
                }
            }
            if !residue_y[y] {
                path_y[y] = x;
                residue_y[y] = true;
                reached_free[y] = free_targets[y];
                quantities_y[y] = quantities_x[x] + cost(x, y) + potentials_x[x] - potentials_y[y];
                if !free_targets[y] {
                    let v = inv_matching[y].expect("matched target has a source");
                    path_x[v] = y;
                    residue_x[v] = true;
                    quantities_x[v] = quantities_y[y];
                    let w = list[v][0];
                    queue.push(QueueItem {
                        cost: quantities_x[v] + cost(v, w) + potentials_x[v] - max_potential,
                        x: v,
                        y: w,
                        list_pos: Some(0),
                    });
                }
            }
        }
        // Update dual potentials along the alternating tree and restore
        // the potential offset for the next phase.
        max_potential = f64::MIN_POSITIVE;
        for v in 0..size_y {
            if !residue_y[v] {
                quantities_y[v] = quantities_y[y];
            }
            potentials_y[v] += quantities_y[v];
            max_potential = max_potential.max(potentials_y[v]);
        }
        for v in 0..size_x {
            if !residue_x[v] {
                quantities_x[v] = quantities_y[y];
            }
            potentials_x[v] += quantities_x[v];
            max_potential = max_potential.max(potentials_x[v]);
        }
        free_targets[y] = false;
        matched += 1;
        // Flip the augmenting path.
        loop {
            x = path_y[y];
            inv_matching[y] = Some(x);
            if free_sources[x] {
                free_sources[x] = false;
                break;
            }
            y = path_x[x];
        }
    }

    let mut matching = vec![0usize; size_x];
    for (y, source) in inv_matching.iter().enumerate() {
        if let Some(x) = source {
            matching[*x] = y;
        }
    }
    Ok(matching)
}
