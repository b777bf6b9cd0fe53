use std::fmt;

use crate::adjacency_matrix::AdjacencyMatrix;
use crate::order_set::OrderSet;
use crate::simulation::Strategy;

/// Summary statistics of one simulated study.
///
/// # Fields
///
/// * `nsubblock_orders` - Size of the order set the study drew from
/// * `aba_range` - Most common minus least common across-block adjacency, summed over subjects
/// * `aba_std` - Population standard deviation of the summed across-block adjacency
/// * `mean_c_iu1` - Mean cross-order correlation of the order set, NaN when undefined
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudySummary {
    pub nsubblock_orders: usize,
    pub aba_range: f64,
    pub aba_std: f64,
    pub mean_c_iu1: f64,
}

/// Everything a single study produced, before it is reduced to a row.
#[derive(Debug, Clone)]
pub struct StudyOutcome {
    pub summary: StudySummary,
    pub order_set: OrderSet,
    pub within_run: AdjacencyMatrix,
    pub across_block: AdjacencyMatrix,
}

/// Per-sweep-value averages over the studies in a [`SimulationResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSummary {
    pub nsubblock_orders: usize,
    pub n_studies: usize,
    pub mean_aba_range: f64,
    pub mean_aba_std: f64,
    pub mean_c_iu1: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub strategy: Strategy,
    pub nsubj: usize,
    pub rows: Vec<StudySummary>,
    /// The last study simulated, kept for its adjacency matrices.
    pub example: StudyOutcome,
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

impl SimulationResult {
    /// Groups rows by `nsubblock_orders`, in sweep order, and averages each metric.
    pub fn by_sweep_value(&self) -> Vec<SweepSummary> {
        let mut values: Vec<usize> = vec![];
        for row in &self.rows {
            if !values.contains(&row.nsubblock_orders) {
                values.push(row.nsubblock_orders);
            }
        }
        values
            .into_iter()
            .map(|value| {
                let rows: Vec<&StudySummary> = self.rows.iter().filter(|r| r.nsubblock_orders == value).collect();
                SweepSummary {
                    nsubblock_orders: value,
                    n_studies: rows.len(),
                    mean_aba_range: mean_of(rows.iter().map(|r| r.aba_range)),
                    mean_aba_std: mean_of(rows.iter().map(|r| r.aba_std)),
                    mean_c_iu1: mean_of(rows.iter().map(|r| r.mean_c_iu1)),
                }
            })
            .collect()
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nsubblock_orders\taba_range\taba_std\tmean_c_iu1")?;
        for row in &self.rows {
            writeln!(
                f,
                "{}\t{:.1}\t{:.4}\t{:.4}",
                row.nsubblock_orders, row.aba_range, row.aba_std, row.mean_c_iu1
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(nsubblock_orders: usize, aba_range: f64, mean_c_iu1: f64) -> StudySummary {
        StudySummary { nsubblock_orders, aba_range, aba_std: 1.0, mean_c_iu1 }
    }

    fn result(rows: Vec<StudySummary>) -> SimulationResult {
        SimulationResult {
            strategy: Strategy::Random,
            nsubj: 40,
            rows,
            example: StudyOutcome {
                summary: row(3, 0.0, 0.0),
                order_set: OrderSet::from_orders(&[vec![0, 1, 2]]).unwrap(),
                within_run: AdjacencyMatrix::zeros(3),
                across_block: AdjacencyMatrix::zeros(3),
            },
        }
    }

    #[test]
    fn test_by_sweep_value_groups_in_order() {
        let result = result(vec![row(10, 2.0, 0.1), row(10, 4.0, f64::NAN), row(15, 1.0, 0.3), row(10, 3.0, 0.3)]);
        let sweep = result.by_sweep_value();
        assert_eq!(sweep.len(), 2);
        assert_eq!(sweep[0].nsubblock_orders, 10);
        assert_eq!(sweep[0].n_studies, 3);
        assert_eq!(sweep[0].mean_aba_range, 3.0);
        assert!((sweep[0].mean_c_iu1 - 0.2).abs() < 1e-12);
        assert_eq!(sweep[1].nsubblock_orders, 15);
        assert_eq!(sweep[1].n_studies, 1);
    }

    #[test]
    fn test_display_has_header_and_one_line_per_row() {
        let result = result(vec![row(10, 2.0, 0.1), row(15, 1.0, 0.3)]);
        let text = result.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "nsubblock_orders\taba_range\taba_std\tmean_c_iu1");
        assert!(lines[1].starts_with("10\t2.0\t"));
    }
}
