use anyhow::{bail, Result};
use rand::seq::index;
use rand::Rng;

use crate::adjacency_matrix::AdjacencyMatrix;
use crate::order_set::OrderSet;

/// The full presentation sequence for one simulated participant.
///
/// # Fields
///
/// * `order_indices` - Rows of the order set used, in presentation order
/// * `blocks` - The corresponding sub-block orders
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectOrder {
    pub order_indices: Vec<usize>,
    pub blocks: Vec<Vec<usize>>,
}

impl SubjectOrder {
    /// Draws `nsubblock` distinct orders from `order_set`, uniformly and without
    /// replacement, keeping the sampled order.
    ///
    /// # Errors
    ///
    /// Returns an error if `nsubblock` exceeds the number of orders in the set.
    pub fn draw<R: Rng + ?Sized>(order_set: &OrderSet, nsubblock: usize, rng: &mut R) -> Result<Self> {
        let available = order_set.n_orders();
        if nsubblock > available {
            bail!(
                "cannot draw {} distinct sub-block orders from a set of {}",
                nsubblock,
                available
            );
        }
        let order_indices = index::sample(rng, available, nsubblock).into_vec();
        let blocks = order_indices.iter().map(|&i| order_set.order(i)).collect();
        Ok(Self { order_indices, blocks })
    }

    pub fn within_run_adjacency(&self, nvid: usize) -> AdjacencyMatrix {
        AdjacencyMatrix::within_run(nvid, &self.blocks)
    }

    pub fn across_block_adjacency(&self, nvid: usize) -> AdjacencyMatrix {
        AdjacencyMatrix::across_block(nvid, &self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn three_orders() -> OrderSet {
        OrderSet::from_orders(&[vec![0, 1, 2, 3, 4, 5], vec![5, 4, 3, 2, 1, 0], vec![2, 0, 4, 1, 5, 3]]).unwrap()
    }

    #[test]
    fn test_draw_all_three_uses_each_once() {
        let order_set = three_orders();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let subject = SubjectOrder::draw(&order_set, 3, &mut rng).unwrap();
            let mut indices = subject.order_indices.clone();
            indices.sort_unstable();
            assert_eq!(indices, vec![0, 1, 2]);
            for (i, block) in subject.order_indices.iter().zip(subject.blocks.iter()) {
                assert_eq!(&order_set.order(*i), block);
            }
        }
    }

    #[test]
    fn test_draw_visits_every_permutation() {
        let order_set = three_orders();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(SubjectOrder::draw(&order_set, 3, &mut rng).unwrap().order_indices);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_draw_too_many_fails() {
        let order_set = three_orders();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(SubjectOrder::draw(&order_set, 4, &mut rng).is_err());
    }

    #[test]
    fn test_adjacency_totals() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let order_set = OrderSet::random(20, 6, &mut rng).unwrap();
        let subject = SubjectOrder::draw(&order_set, 3, &mut rng).unwrap();
        assert_eq!(subject.within_run_adjacency(6).total(), 3 * 6 - 1);
        assert_eq!(subject.across_block_adjacency(6).total(), 2);
    }
}
