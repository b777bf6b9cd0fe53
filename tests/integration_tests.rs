use counterbalance::adjacency_matrix::AdjacencyMatrix;
use counterbalance::order_set::OrderSet;
use counterbalance::random_source::RandomSource;
use counterbalance::scoring::{CorrelationMatrix, PairTarget};
use counterbalance::subject_order::SubjectOrder;
use counterbalance::{run_simulation, SimulationConfigBuilder, Strategy};

#[test]
fn test_run_simulation_random_sweep() {
    let config = SimulationConfigBuilder::default()
        .strategy(Strategy::Random)
        .nsubj(10)
        .nperm(4)
        .nsubblock_orders_start(10)
        .nsubblock_orders_end(25)
        .nsubblock_orders_step(5)
        .build()
        .unwrap();

    let mut rng = RandomSource::Seeded(1).rng();
    let mut studies = 0;
    let result = run_simulation(&config, &mut rng, |_, _, _| studies += 1).unwrap();

    assert_eq!(studies, 12);
    assert_eq!(result.rows.len(), 12);
    let sizes: Vec<usize> = result.rows.iter().map(|r| r.nsubblock_orders).collect();
    assert_eq!(sizes, vec![10, 10, 10, 10, 15, 15, 15, 15, 20, 20, 20, 20]);
    for row in &result.rows {
        assert!(row.aba_range >= 0.0);
        assert!(row.aba_std >= 0.0);
        assert!((-1.0..=1.0).contains(&row.mean_c_iu1));
    }
    assert_eq!(result.example.across_block.total(), 10 * 2);
    assert_eq!(result.example.within_run.total(), 10 * (3 * 6 - 1));

    let sweep = result.by_sweep_value();
    assert_eq!(sweep.len(), 3);
    assert!(sweep.iter().all(|s| s.n_studies == 4));
}

#[test]
fn test_run_simulation_optimised_balance_pairs() {
    let config = SimulationConfigBuilder::default()
        .strategy(Strategy::OptimisedBalancePairs)
        .nsubj(40)
        .nperm(2)
        .noptperm(50)
        .pair_target(PairTarget::Fixed(2.5))
        .build()
        .unwrap();

    let mut rng = RandomSource::Seeded(2).rng();
    let result = run_simulation(&config, &mut rng, |_, _, _| {}).unwrap();

    assert_eq!(result.rows.len(), 8 * 2);
    assert!(result.rows.iter().all(|r| r.nsubblock_orders == 6));
    assert!(result.example.order_set.is_latin());
}

#[test]
fn test_run_simulation_latin_square_runs_every_sweep_value() {
    let config = SimulationConfigBuilder::default()
        .strategy(Strategy::LatinSquare)
        .nsubj(10)
        .nperm(4)
        .build()
        .unwrap();

    let mut rng = RandomSource::Seeded(3).rng();
    let mut seen = vec![];
    let result = run_simulation(&config, &mut rng, |sweep_value, perm, _| seen.push((sweep_value, perm))).unwrap();

    let sweep = config.sweep_values();
    assert_eq!(sweep.len(), 8);
    assert_eq!(result.rows.len(), sweep.len() * 4);
    assert!(result.rows.iter().all(|r| r.nsubblock_orders == 6));
    assert_eq!(seen.first(), Some(&(10, 0)));
    assert_eq!(seen.last(), Some(&(45, 3)));

    let by_sweep = result.by_sweep_value();
    assert_eq!(by_sweep.len(), 1);
    assert_eq!(by_sweep[0].n_studies, 32);
}

#[test]
fn test_run_simulation_is_reproducible_with_seed() {
    let config = SimulationConfigBuilder::default()
        .strategy(Strategy::Optimised)
        .nsubj(8)
        .nperm(3)
        .noptperm(25)
        .build()
        .unwrap();

    let first = run_simulation(&config, &mut RandomSource::Seeded(99).rng(), |_, _, _| {}).unwrap();
    let second = run_simulation(&config, &mut RandomSource::Seeded(99).rng(), |_, _, _| {}).unwrap();
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.example.order_set, second.example.order_set);
}

#[test]
fn test_run_simulation_rejects_oversized_subjects() {
    let config = SimulationConfigBuilder::default()
        .strategy(Strategy::LatinSquare)
        .nvid(4)
        .nsubblock(5)
        .build()
        .unwrap();

    let mut rng = RandomSource::Seeded(0).rng();
    assert!(run_simulation(&config, &mut rng, |_, _, _| {}).is_err());
}

#[test]
fn test_across_block_adjacency_of_three_subblocks() {
    let order_set = OrderSet::from_orders(&[
        vec![0, 1, 2, 3, 4, 5],
        vec![5, 4, 3, 2, 1, 0],
        vec![2, 0, 4, 1, 5, 3],
    ])
    .unwrap();
    let blocks: Vec<Vec<usize>> = order_set.orders().collect();

    let across_block = AdjacencyMatrix::across_block(6, &blocks);
    let nonzero: Vec<(usize, usize)> = (0..6)
        .flat_map(|i| (0..6).map(move |j| (i, j)))
        .filter(|&(i, j)| across_block.adjacency[(i, j)] > 0)
        .collect();
    assert_eq!(nonzero, vec![(0, 2), (5, 5)]);

    // whatever order a subject draws, exactly two boundaries are counted
    let mut rng = RandomSource::Seeded(5).rng();
    for _ in 0..50 {
        let subject = SubjectOrder::draw(&order_set, 3, &mut rng).unwrap();
        let across_block = subject.across_block_adjacency(6);
        assert_eq!(across_block.total(), 2);
        let first_boundary = (subject.blocks[0][5], subject.blocks[1][0]);
        assert!(across_block.adjacency[first_boundary] >= 1);
    }
}

#[test]
fn test_random_order_set_correlation_diagonal() {
    let mut rng = RandomSource::Seeded(50).rng();
    let order_set = OrderSet::random(50, 6, &mut rng).unwrap();
    let correlation = CorrelationMatrix::from_order_set(&order_set);
    assert!(correlation.correlation.diagonal().iter().all(|&c| c == 1.0));
}
