pub mod adjacency_matrix;
pub mod optimizer;
pub mod order_set;
pub mod random_source;
pub mod scoring;
pub mod simulation;
pub mod study_result;
pub mod subject_order;

use anyhow::{anyhow, Error};
use rand::Rng;
use tracing::info;

pub use simulation::{run_study, SimulationConfig, SimulationConfigBuilder, Strategy};
pub use study_result::{SimulationResult, StudySummary};

/// Simulates `nperm` studies for every order-set size in the configured sweep.
///
/// # Arguments
///
/// * `config` - Strategy, sizes and iteration counts of the run
/// * `rng` - Source of randomness for every study
/// * `on_study` - Callback invoked after each study with its sweep value, study number and summary
///
/// # Returns
///
/// Returns a `SimulationResult` holding one row per (sweep value, study) and the adjacency
/// matrices of the last study.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a study fails
pub fn run_simulation<R, F>(config: &SimulationConfig, rng: &mut R, mut on_study: F) -> Result<SimulationResult, Error>
where
    R: Rng + ?Sized,
    F: FnMut(usize, usize, &StudySummary),
{
    config.validate()?;
    let sweep = config.sweep_values();
    info!(
        strategy = %config.strategy,
        nvid = config.nvid,
        nsubj = config.nsubj,
        nperm = config.nperm,
        sweep_values = sweep.len(),
        "starting simulation"
    );

    let mut rows = Vec::with_capacity(sweep.len() * config.nperm);
    let mut example = None;
    for &nsubblock_orders in &sweep {
        info!(nsubblock_orders, "simulating studies");
        for perm in 0..config.nperm {
            let outcome = run_study(config, nsubblock_orders, rng)
                .map_err(|e| anyhow!("Study {} with {} sub-block orders failed: {}", perm, nsubblock_orders, e))?;
            on_study(nsubblock_orders, perm, &outcome.summary);
            rows.push(outcome.summary);
            example = Some(outcome);
        }
    }

    let example = example.ok_or_else(|| anyhow!("No studies were simulated"))?;
    Ok(SimulationResult { strategy: config.strategy, nsubj: config.nsubj, rows, example })
}
