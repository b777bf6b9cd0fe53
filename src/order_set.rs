use anyhow::{anyhow, bail, Result};
use nalgebra::DMatrix;
use rand::seq::SliceRandom;
use rand::Rng;

/// A pool of sub-block orders, stored as a matrix where each row is one order and
/// each column is a presentation position.
///
/// # Fields
///
/// * `orders` - `n_orders x nvid` matrix of video indices
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSet {
    pub orders: DMatrix<usize>,
}

fn check_nvid(nvid: usize) -> Result<()> {
    if nvid < 2 {
        bail!("nvid must be at least 2 for adjacency to be defined, got {}", nvid);
    }
    Ok(())
}

impl OrderSet {
    pub fn from_orders(orders: &[Vec<usize>]) -> Result<Self> {
        let Some(first) = orders.first() else {
            bail!("an order set needs at least one order");
        };
        let nvid = first.len();
        check_nvid(nvid)?;
        if let Some(bad) = orders.iter().position(|o| o.len() != nvid) {
            bail!("order {} has {} videos, expected {}", bad, orders[bad].len(), nvid);
        }
        let flat: Vec<usize> = orders.iter().flatten().copied().collect();
        let order_set = Self { orders: DMatrix::from_row_slice(orders.len(), nvid, &flat) };
        if !order_set.is_permutation_set() {
            bail!("every order must be a permutation of 0..{}", nvid);
        }
        Ok(order_set)
    }

    /// Generates a random Latin square of side `nvid`.
    ///
    /// The square is completed row by row: each new row is a random perfect matching of
    /// positions to the videos not yet used in that position's column. A Latin rectangle
    /// always extends by one row, so every Latin square of side `nvid` can come out, though
    /// not with equal probability.
    pub fn latin<R: Rng + ?Sized>(nvid: usize, rng: &mut R) -> Result<Self> {
        check_nvid(nvid)?;
        let mut column_used = vec![vec![false; nvid]; nvid];
        let mut flat = Vec::with_capacity(nvid * nvid);
        for row_index in 0..nvid {
            let row = random_row(&column_used, rng)
                .ok_or_else(|| anyhow!("Failed to extend Latin rectangle at row {}", row_index))?;
            for (position, &video) in row.iter().enumerate() {
                column_used[position][video] = true;
            }
            flat.extend(row);
        }
        Ok(Self { orders: DMatrix::from_row_slice(nvid, nvid, &flat) })
    }

    /// Generates `n_orders` independent, uniformly random permutations of `0..nvid`.
    pub fn random<R: Rng + ?Sized>(n_orders: usize, nvid: usize, rng: &mut R) -> Result<Self> {
        check_nvid(nvid)?;
        if n_orders == 0 {
            bail!("a random order set needs at least one order");
        }
        let mut flat = Vec::with_capacity(n_orders * nvid);
        for _ in 0..n_orders {
            let mut order: Vec<usize> = (0..nvid).collect();
            order.shuffle(rng);
            flat.extend(order);
        }
        Ok(Self { orders: DMatrix::from_row_slice(n_orders, nvid, &flat) })
    }

    pub fn n_orders(&self) -> usize {
        self.orders.nrows()
    }

    pub fn nvid(&self) -> usize {
        self.orders.ncols()
    }

    pub fn order(&self, index: usize) -> Vec<usize> {
        self.orders.row(index).iter().copied().collect()
    }

    pub fn orders(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        (0..self.n_orders()).map(move |i| self.order(i))
    }

    pub fn is_permutation_set(&self) -> bool {
        let nvid = self.nvid();
        self.orders().all(|order| {
            let mut seen = vec![false; nvid];
            order.iter().all(|&v| v < nvid && !std::mem::replace(&mut seen[v], true))
        })
    }

    /// True when the set is square, every row is a permutation and every column holds
    /// each video exactly once.
    pub fn is_latin(&self) -> bool {
        let nvid = self.nvid();
        if self.n_orders() != nvid || !self.is_permutation_set() {
            return false;
        }
        self.orders.column_iter().all(|column| {
            let mut seen = vec![false; nvid];
            column.iter().all(|&v| !std::mem::replace(&mut seen[v], true))
        })
    }
}

/// Tries to give `position` a video, re-seating earlier positions along an augmenting path.
fn augment(position: usize, candidates: &[Vec<usize>], seated: &mut [Option<usize>], visited: &mut [bool]) -> bool {
    for &video in &candidates[position] {
        if visited[video] {
            continue;
        }
        visited[video] = true;
        let free = match seated[video] {
            None => true,
            Some(other) => augment(other, candidates, seated, visited),
        };
        if free {
            seated[video] = Some(position);
            return true;
        }
    }
    false
}

/// A random row compatible with the videos already used in each column. Candidates and
/// positions are shuffled before matching so any compatible row can be returned.
fn random_row<R: Rng + ?Sized>(column_used: &[Vec<bool>], rng: &mut R) -> Option<Vec<usize>> {
    let nvid = column_used.len();
    let candidates: Vec<Vec<usize>> = column_used
        .iter()
        .map(|used| {
            let mut videos: Vec<usize> = (0..nvid).filter(|&v| !used[v]).collect();
            videos.shuffle(rng);
            videos
        })
        .collect();
    let mut positions: Vec<usize> = (0..nvid).collect();
    positions.shuffle(rng);

    // seated[video] = position
    let mut seated: Vec<Option<usize>> = vec![None; nvid];
    for position in positions {
        let mut visited = vec![false; nvid];
        if !augment(position, &candidates, &mut seated, &mut visited) {
            return None;
        }
    }

    let mut row = vec![0; nvid];
    for (video, position) in seated.into_iter().enumerate() {
        row[position?] = video;
    }
    Some(row)
}
