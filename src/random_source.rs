use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Where the simulation draws its randomness from.
///
/// `Entropy` gives a fresh search on every run, `Seeded` makes a run reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RandomSource {
    #[default]
    Entropy,
    Seeded(u64),
}

impl RandomSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => RandomSource::Seeded(seed),
            None => RandomSource::Entropy,
        }
    }

    pub fn rng(&self) -> ChaCha8Rng {
        match self {
            RandomSource::Entropy => ChaCha8Rng::from_entropy(),
            RandomSource::Seeded(seed) => ChaCha8Rng::seed_from_u64(*seed),
        }
    }
}
