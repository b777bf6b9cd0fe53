use std::fmt;

use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use derive_builder::Builder;
use rand::Rng;
use tracing::{debug, trace};

use crate::adjacency_matrix::AdjacencyMatrix;
use crate::optimizer::optimize_order_set;
use crate::order_set::OrderSet;
use crate::scoring::{CorrelationMatrix, PairTarget, ScoringPolicy};
use crate::study_result::{StudyOutcome, StudySummary};
use crate::subject_order::SubjectOrder;

/// How the pool of sub-block orders for a study is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// `nsubblock_orders` independent random permutations
    Random,
    /// One random Latin square of side `nvid`
    LatinSquare,
    /// Best of `noptperm` Latin squares by mean cross-order correlation
    Optimised,
    /// Best of `noptperm` Latin squares by evenness of pairwise adjacency
    OptimisedBalancePairs,
}

impl Strategy {
    /// Strategies other than `Random` always use `nvid` orders.
    pub fn fixes_order_set_size(&self) -> bool {
        !matches!(self, Strategy::Random)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Random => "random",
            Strategy::LatinSquare => "latinsquare",
            Strategy::Optimised => "optimised",
            Strategy::OptimisedBalancePairs => "optimised_balance_pairs",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of a simulation run.
///
/// # Fields
///
/// * `strategy` - How each study's order set is produced
/// * `nvid` - Number of videos per sub-block
/// * `nsubj` - Number of subjects per study
/// * `nsubblock` - Number of sub-blocks each subject sees
/// * `nperm` - Number of studies per sweep value
/// * `noptperm` - Number of optimiser trials per study (optimised strategies only)
/// * `nsubblock_orders_start`, `nsubblock_orders_end`, `nsubblock_orders_step` - Half-open sweep
///   of order-set sizes; only the random strategy uses the value itself
/// * `pair_target` - Target count for the balanced-pairs cost
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(error = "anyhow::Error"))]
pub struct SimulationConfig {
    #[builder(default = "Strategy::OptimisedBalancePairs")]
    pub strategy: Strategy,

    #[builder(default = "6")]
    pub nvid: usize,

    #[builder(default = "40")]
    pub nsubj: usize,

    #[builder(default = "3")]
    pub nsubblock: usize,

    #[builder(default = "100")]
    pub nperm: usize,

    #[builder(default = "5000")]
    pub noptperm: usize,

    #[builder(default = "10")]
    pub nsubblock_orders_start: usize,

    #[builder(default = "50")]
    pub nsubblock_orders_end: usize,

    #[builder(default = "5")]
    pub nsubblock_orders_step: usize,

    #[builder(default)]
    pub pair_target: PairTarget,
}

impl SimulationConfig {
    /// The configured sweep of order-set sizes. Every strategy runs `nperm` studies per
    /// value; strategies that fix the size to `nvid` ignore the value itself.
    pub fn sweep_values(&self) -> Vec<usize> {
        (self.nsubblock_orders_start..self.nsubblock_orders_end)
            .step_by(self.nsubblock_orders_step.max(1))
            .collect()
    }

    pub fn scoring_policy(&self) -> Option<ScoringPolicy> {
        match self.strategy {
            Strategy::Optimised => Some(ScoringPolicy::CrossOrderCorrelation),
            Strategy::OptimisedBalancePairs => Some(ScoringPolicy::BalancedPairs(self.pair_target)),
            Strategy::Random | Strategy::LatinSquare => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nvid < 2 {
            bail!("nvid must be at least 2, got {}", self.nvid);
        }
        if self.nsubj == 0 || self.nperm == 0 || self.nsubblock == 0 {
            bail!(
                "nsubj, nperm and nsubblock must be positive (got {}, {}, {})",
                self.nsubj,
                self.nperm,
                self.nsubblock
            );
        }
        if self.scoring_policy().is_some() && self.noptperm == 0 {
            bail!("the {} strategy needs noptperm > 0", self.strategy);
        }
        if self.nsubblock_orders_step == 0 {
            bail!("nsubblock_orders_step must be positive");
        }
        let sweep = self.sweep_values();
        let Some(&smallest_sweep) = sweep.iter().min() else {
            bail!(
                "empty nsubblock_orders sweep {}..{}",
                self.nsubblock_orders_start,
                self.nsubblock_orders_end
            );
        };
        let smallest = if self.strategy.fixes_order_set_size() { self.nvid } else { smallest_sweep };
        if smallest < self.nsubblock {
            bail!(
                "{} sub-blocks per subject cannot be drawn without replacement from {} orders",
                self.nsubblock,
                smallest
            );
        }
        Ok(())
    }

    /// Produces the order set for one study under the configured strategy.
    pub fn generate_order_set<R: Rng + ?Sized>(&self, nsubblock_orders: usize, rng: &mut R) -> Result<OrderSet> {
        match self.scoring_policy() {
            Some(policy) => {
                let best = optimize_order_set(self.nvid, self.noptperm, policy, rng, |_, _| {})?;
                debug!(score = best.score, trial = best.best_trial, "optimised order set");
                Ok(best.order_set)
            }
            None if self.strategy == Strategy::Random => OrderSet::random(nsubblock_orders, self.nvid, rng),
            None => OrderSet::latin(self.nvid, rng),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::OptimisedBalancePairs,
            nvid: 6,
            nsubj: 40,
            nsubblock: 3,
            nperm: 100,
            noptperm: 5000,
            nsubblock_orders_start: 10,
            nsubblock_orders_end: 50,
            nsubblock_orders_step: 5,
            pair_target: PairTarget::Derived,
        }
    }
}

/// Sums within-run and across-block adjacency over every subject of a study.
pub fn accumulate_subjects<R: Rng + ?Sized>(
    order_set: &OrderSet,
    nsubj: usize,
    nsubblock: usize,
    rng: &mut R,
) -> Result<(AdjacencyMatrix, AdjacencyMatrix)> {
    let nvid = order_set.nvid();
    (0..nsubj).try_fold(
        (AdjacencyMatrix::zeros(nvid), AdjacencyMatrix::zeros(nvid)),
        |(within_run, across_block), _| {
            let subject = SubjectOrder::draw(order_set, nsubblock, rng)?;
            Ok::<_, anyhow::Error>((
                within_run + subject.within_run_adjacency(nvid),
                across_block + subject.across_block_adjacency(nvid),
            ))
        },
    )
}

/// Simulates one study: builds an order set, assigns every subject an order and reduces the
/// summed adjacency to a [`StudySummary`].
pub fn run_study<R: Rng + ?Sized>(config: &SimulationConfig, nsubblock_orders: usize, rng: &mut R) -> Result<StudyOutcome> {
    let order_set = config.generate_order_set(nsubblock_orders, rng)?;
    let mean_c_iu1 = CorrelationMatrix::from_order_set(&order_set)
        .mean_upper_triangle()
        .unwrap_or(f64::NAN);

    let (within_run, across_block) = accumulate_subjects(&order_set, config.nsubj, config.nsubblock, rng)
        .map_err(|e| anyhow!("Failed to assign subject orders: {}", e))?;

    let summary = StudySummary {
        nsubblock_orders: order_set.n_orders(),
        aba_range: across_block.range() as f64,
        aba_std: across_block.std(),
        mean_c_iu1,
    };
    trace!(?summary, "study done");

    Ok(StudyOutcome { summary, order_set, within_run, across_block })
}
