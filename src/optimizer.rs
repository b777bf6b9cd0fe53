use anyhow::{anyhow, bail, Result};
use pretty_print_nalgebra::*;
use rand::Rng;
use tracing::debug;

use crate::order_set::OrderSet;
use crate::scoring::{aggregate_adjacency, ScoringPolicy};

/// The best candidate found by [`optimize_order_set`].
///
/// # Fields
///
/// * `order_set` - The lowest-scoring balanced order set
/// * `score` - Its score under the policy used
/// * `best_trial` - The (1-based) trial that produced it
#[derive(Debug, Clone)]
pub struct OptimizedOrderSet {
    pub order_set: OrderSet,
    pub score: f64,
    pub best_trial: usize,
}

/// Searches `noptperm` random Latin squares for the one with the lowest score under `policy`.
///
/// # Arguments
///
/// * `nvid` - Number of videos
/// * `noptperm` - Number of candidate order sets to generate
/// * `policy` - How candidates are ranked
/// * `rng` - Source of randomness for the candidates
/// * `on_update` - Called after each trial with the trial number and the best score so far
///
/// # Errors
///
/// Returns an error if `noptperm` is zero or a candidate cannot be generated.
pub fn optimize_order_set<R, F>(
    nvid: usize,
    noptperm: usize,
    policy: ScoringPolicy,
    rng: &mut R,
    mut on_update: F,
) -> Result<OptimizedOrderSet>
where
    R: Rng + ?Sized,
    F: FnMut(usize, f64),
{
    if noptperm == 0 {
        bail!("the optimiser needs at least one trial");
    }

    let mut candidates = (1..=noptperm).map(|trial| -> Result<OptimizedOrderSet> {
        let order_set = OrderSet::latin(nvid, rng)?;
        let score = policy.score(&order_set);
        Ok(OptimizedOrderSet { order_set, score, best_trial: trial })
    });

    let best = candidates.try_fold(None, |best: Option<OptimizedOrderSet>, candidate| {
        let candidate = candidate?;
        let trial = candidate.best_trial;
        let best = match best {
            Some(best) if best.score <= candidate.score => best,
            _ => {
                debug!(
                    trial,
                    score = candidate.score,
                    "new best order set, aggregate adjacency: {}",
                    pretty_print!(&aggregate_adjacency(&candidate.order_set).adjacency)
                );
                candidate
            }
        };
        on_update(trial, best.score);
        Ok::<_, anyhow::Error>(Some(best))
    })?;

    best.ok_or_else(|| anyhow!("no candidate order set was generated"))
}
