use anyhow::Result;
use clap::Parser;
use pretty_print_nalgebra::*;
use tracing_subscriber::EnvFilter;

use counterbalance::random_source::RandomSource;
use counterbalance::scoring::PairTarget;
use counterbalance::{run_simulation, SimulationConfigBuilder, Strategy};

/// Evaluate counterbalancing strategies for video presentation orders
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// How each study's pool of sub-block orders is produced
    #[arg(short, long, value_enum, default_value = "optimised-balance-pairs")]
    strategy: Strategy,

    /// Number of videos per sub-block
    #[arg(long, default_value_t = 6)]
    nvid: usize,

    /// Number of subjects in a study
    #[arg(long, default_value_t = 40)]
    nsubj: usize,

    /// Number of sub-blocks each subject sees
    #[arg(long, default_value_t = 3)]
    nsubblock: usize,

    /// Number of studies to generate per sweep value
    #[arg(long, default_value_t = 100)]
    nperm: usize,

    /// Optimiser iterations per study
    #[arg(long, default_value_t = 5000)]
    noptperm: usize,

    /// First order-set size of the sweep (random strategy)
    #[arg(long, default_value_t = 10)]
    orders_start: usize,

    /// End of the sweep, exclusive
    #[arg(long, default_value_t = 50)]
    orders_end: usize,

    /// Step of the sweep
    #[arg(long, default_value_t = 5)]
    orders_step: usize,

    /// Fixed target for the balanced-pairs cost, derived from the transition count when unset
    #[arg(long)]
    pair_target: Option<f64>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = SimulationConfigBuilder::default()
        .strategy(args.strategy)
        .nvid(args.nvid)
        .nsubj(args.nsubj)
        .nsubblock(args.nsubblock)
        .nperm(args.nperm)
        .noptperm(args.noptperm)
        .nsubblock_orders_start(args.orders_start)
        .nsubblock_orders_end(args.orders_end)
        .nsubblock_orders_step(args.orders_step)
        .pair_target(args.pair_target.map_or(PairTarget::Derived, PairTarget::Fixed))
        .build()?;

    let mut rng = RandomSource::from_seed(args.seed).rng();
    let result = run_simulation(&config, &mut rng, |sweep_value, perm, summary| {
        tracing::debug!(sweep_value, perm, aba_range = summary.aba_range, "study finished");
    })?;

    print!("{}", result);

    println!();
    println!("{} N={}", result.strategy, result.nsubj);
    println!("nsubblock_orders\tstudies\tmean_aba_range\tmean_aba_std\tmean_c_iu1");
    for sweep in result.by_sweep_value() {
        println!(
            "{}\t{}\t{:.2}\t{:.4}\t{:.4}",
            sweep.nsubblock_orders, sweep.n_studies, sweep.mean_aba_range, sweep.mean_aba_std, sweep.mean_c_iu1
        );
    }

    println!();
    println!("example order set: {}", pretty_print!(&result.example.order_set.orders));
    println!("e.g., within- and between-block adjacency: {}", pretty_print!(&result.example.within_run.adjacency));
    println!("e.g., between-block adjacency: {}", pretty_print!(&result.example.across_block.adjacency));

    Ok(())
}
