use nalgebra::DMatrix;

use crate::adjacency_matrix::AdjacencyMatrix;
use crate::order_set::OrderSet;

/// Adjacency of each order on its own, ignoring every other order in the set.
pub fn per_order_adjacency(order_set: &OrderSet) -> Vec<AdjacencyMatrix> {
    let nvid = order_set.nvid();
    order_set
        .orders()
        .map(|order| AdjacencyMatrix::within_run(nvid, &[order]))
        .collect()
}

/// Elementwise sum of the per-order adjacency matrices.
pub fn aggregate_adjacency(order_set: &OrderSet) -> AdjacencyMatrix {
    per_order_adjacency(order_set)
        .into_iter()
        .fold(AdjacencyMatrix::zeros(order_set.nvid()), |acc, adjacency| acc + adjacency)
}

/// Pearson correlation of two equal-length samples. `None` when either sample has zero
/// variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a * var_b).sqrt())
}

/// Correlation between the flattened per-order adjacency matrices of an order set.
///
/// The diagonal is exactly 1.0. Off-diagonal entries whose correlation is undefined
/// (a constant adjacency vector) are stored as NaN and skipped by
/// [`CorrelationMatrix::mean_upper_triangle`].
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub correlation: DMatrix<f64>,
}

impl CorrelationMatrix {
    pub fn from_order_set(order_set: &OrderSet) -> Self {
        let vectors: Vec<Vec<f64>> = per_order_adjacency(order_set).iter().map(|a| a.flattened()).collect();
        let n = vectors.len();
        let correlation = DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                1.0
            } else {
                pearson(&vectors[i], &vectors[j]).unwrap_or(f64::NAN)
            }
        });
        Self { correlation }
    }

    /// Entries strictly above the diagonal, row by row, including undefined ones.
    pub fn upper_triangle(&self) -> Vec<f64> {
        let n = self.correlation.nrows();
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| self.correlation[(i, j)])
            .collect()
    }

    /// Mean of the defined strictly-upper-triangular entries, `None` if there are none.
    pub fn mean_upper_triangle(&self) -> Option<f64> {
        let defined: Vec<f64> = self.upper_triangle().into_iter().filter(|c| !c.is_nan()).collect();
        if defined.is_empty() {
            return None;
        }
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Target count for the per-column maxima and nonzero minima of the balanced-pairs cost.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PairTarget {
    /// Midpoint of the floor and ceiling of the mean count per off-diagonal cell.
    #[default]
    Derived,
    Fixed(f64),
}

impl PairTarget {
    pub fn value(&self, aggregate: &AdjacencyMatrix) -> f64 {
        match self {
            PairTarget::Fixed(target) => *target,
            PairTarget::Derived => {
                let nvid = aggregate.nvid();
                let cells = (nvid * nvid.saturating_sub(1)).max(1);
                let mean = aggregate.total() as f64 / cells as f64;
                (mean.floor() + mean.ceil()) / 2.0
            }
        }
    }
}

/// Sum of squared deviations of every column maximum and every column nonzero minimum
/// from `target`.
///
/// Zero counts never act as a minimum; a column with no counts at all contributes only
/// its maximum term.
pub fn balanced_pairs_cost(aggregate: &AdjacencyMatrix, target: f64) -> f64 {
    let max_cost: f64 = aggregate
        .column_max()
        .into_iter()
        .map(|max| (max as f64 - target).powi(2))
        .sum();
    let min_cost: f64 = aggregate
        .column_nonzero_min()
        .into_iter()
        .flatten()
        .map(|min| (min as f64 - target).powi(2))
        .sum();
    max_cost + min_cost
}

/// How a candidate order set is ranked by the optimiser. Lower is better for both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringPolicy {
    /// Mean cross-order correlation of per-order adjacency.
    CrossOrderCorrelation,
    /// Evenness of the summed per-order adjacency.
    BalancedPairs(PairTarget),
}

impl ScoringPolicy {
    pub fn score(&self, order_set: &OrderSet) -> f64 {
        match self {
            ScoringPolicy::CrossOrderCorrelation => CorrelationMatrix::from_order_set(order_set)
                .mean_upper_triangle()
                .unwrap_or(f64::INFINITY),
            ScoringPolicy::BalancedPairs(target) => {
                let aggregate = aggregate_adjacency(order_set);
                balanced_pairs_cost(&aggregate, target.value(&aggregate))
            }
        }
    }
}
