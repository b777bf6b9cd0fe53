use std::ops::{Add, AddAssign};

use nalgebra::DMatrix;

/// Counts of immediate video-to-video succession.
///
/// Entry `(i, j)` is the number of times video `i` was immediately followed by video `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    pub adjacency: DMatrix<usize>,
}

impl AdjacencyMatrix {
    pub fn zeros(nvid: usize) -> Self {
        Self { adjacency: DMatrix::zeros(nvid, nvid) }
    }

    /// Adjacency of the concatenated run: every consecutive pair counts, including the
    /// pairs that straddle a sub-block boundary.
    ///
    /// Every video index in `blocks` must be below `nvid`.
    pub fn within_run<B: AsRef<[usize]>>(nvid: usize, blocks: &[B]) -> Self {
        let mut adjacency: DMatrix<usize> = DMatrix::zeros(nvid, nvid);
        let all_videos: Vec<usize> = blocks.iter().flat_map(|b| b.as_ref().iter().copied()).collect();
        debug_assert!(
            all_videos.iter().all(|&v| v < nvid),
            "video index out of range for nvid = {}",
            nvid
        );
        for pair in all_videos.windows(2) {
            adjacency[(pair[0], pair[1])] += 1;
        }
        Self { adjacency }
    }

    /// Adjacency at sub-block boundaries only: last video of block `i` to first video of
    /// block `i + 1`.
    ///
    /// Every video index in `blocks` must be below `nvid`.
    pub fn across_block<B: AsRef<[usize]>>(nvid: usize, blocks: &[B]) -> Self {
        let mut adjacency: DMatrix<usize> = DMatrix::zeros(nvid, nvid);
        for pair in blocks.windows(2) {
            if let (Some(&last), Some(&first)) = (pair[0].as_ref().last(), pair[1].as_ref().first()) {
                debug_assert!(last < nvid && first < nvid, "video index out of range for nvid = {}", nvid);
                adjacency[(last, first)] += 1;
            }
        }
        Self { adjacency }
    }

    pub fn nvid(&self) -> usize {
        self.adjacency.nrows()
    }

    pub fn total(&self) -> usize {
        self.adjacency.iter().sum()
    }

    /// Most common adjacency minus least common adjacency.
    pub fn range(&self) -> usize {
        let max = self.adjacency.iter().max().copied().unwrap_or(0);
        let min = self.adjacency.iter().min().copied().unwrap_or(0);
        max - min
    }

    /// Population standard deviation over all entries.
    pub fn std(&self) -> f64 {
        if self.adjacency.is_empty() {
            return 0.0;
        }
        self.adjacency.clone().cast::<f64>().variance().sqrt()
    }

    /// Per destination video, the largest count over source videos.
    pub fn column_max(&self) -> Vec<usize> {
        self.adjacency
            .column_iter()
            .map(|column| column.iter().max().copied().unwrap_or(0))
            .collect()
    }

    /// Per destination video, the smallest nonzero count over source videos. `None` for a
    /// video that is never preceded by anything.
    pub fn column_nonzero_min(&self) -> Vec<Option<usize>> {
        self.adjacency
            .column_iter()
            .map(|column| column.iter().copied().filter(|&c| c > 0).min())
            .collect()
    }

    /// Row-major flattening into an `nvid * nvid` vector.
    pub fn flattened(&self) -> Vec<f64> {
        let n = self.nvid();
        (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| self.adjacency[(i, j)] as f64)
            .collect()
    }
}

impl AddAssign<&AdjacencyMatrix> for AdjacencyMatrix {
    fn add_assign(&mut self, rhs: &AdjacencyMatrix) {
        self.adjacency += &rhs.adjacency;
    }
}

impl Add for AdjacencyMatrix {
    type Output = AdjacencyMatrix;

    fn add(mut self, rhs: AdjacencyMatrix) -> AdjacencyMatrix {
        self += &rhs;
        self
    }
}
