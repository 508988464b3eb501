//! Grid generation and the per-player marking matrix.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An N×N board holding a random permutation of `1..=N²`.
///
/// Every player in a room gets their own grid; the shared called-numbers
/// list decides which of these values may be marked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<u16>>,
}

impl Grid {
    /// Generates a fresh grid: shuffle `1..=N²`, lay it out row-major.
    pub fn generate(size: usize, rng: &mut impl Rng) -> Self {
        let mut numbers: Vec<u16> = (1..=(size * size) as u16).collect();
        numbers.shuffle(rng);
        let rows = numbers.chunks(size).map(|chunk| chunk.to_vec()).collect();
        Self { rows }
    }

    /// Board dimension N.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// The number at (row, col). Callers must bounds-check first.
    pub fn value(&self, row: usize, col: usize) -> u16 {
        self.rows[row][col]
    }

    /// Row-major view for serialization.
    pub fn rows(&self) -> &[Vec<u16>] {
        &self.rows
    }
}

/// An N×N boolean matrix tracking which cells a player has marked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marks {
    rows: Vec<Vec<bool>>,
}

impl Marks {
    /// An all-false matrix of the given dimension.
    pub fn empty(size: usize) -> Self {
        Self {
            rows: vec![vec![false; size]; size],
        }
    }

    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn is_marked(&self, row: usize, col: usize) -> bool {
        self.rows[row][col]
    }

    pub fn mark(&mut self, row: usize, col: usize) {
        self.rows[row][col] = true;
    }

    /// Row-major view for serialization.
    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }
}
