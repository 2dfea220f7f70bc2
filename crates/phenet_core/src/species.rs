use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The species/phenotype partition derived from the flat count vector
/// `m = [m_1, ..., m_S]`.
///
/// Each species `s` owns a contiguous block of phenotype indices, in the
/// order given by `m`. The phenotype-index -> species-id map is computed
/// once here so the matrix builders and the integrator never re-derive
/// partition boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesStructure {
    counts: Vec<usize>,
    species_of: Vec<usize>,
}

impl SpeciesStructure {
    /// Builds the partition from per-species phenotype counts.
    /// Fails with `InvalidParameter` if `counts` is empty or any count is zero.
    pub fn new(counts: &[usize]) -> Result<Self> {
        if counts.is_empty() {
            return Err(Error::InvalidParameter(
                "species vector m must be non-empty".to_string(),
            ));
        }
        if let Some(s) = counts.iter().position(|&c| c == 0) {
            return Err(Error::InvalidParameter(format!(
                "species {s} has zero phenotypes; every m_s must be at least 1"
            )));
        }

        let total: usize = counts.iter().sum();
        let mut species_of = Vec::with_capacity(total);
        for (s, &c) in counts.iter().enumerate() {
            species_of.extend(std::iter::repeat(s).take(c));
        }

        Ok(Self {
            counts: counts.to_vec(),
            species_of,
        })
    }

    /// Total phenotype count N = sum of m_s; the dimension of all matrices
    /// and state vectors.
    pub fn phenotype_count(&self) -> usize {
        self.species_of.len()
    }

    /// Number of species S.
    pub fn species_count(&self) -> usize {
        self.counts.len()
    }

    /// Per-species phenotype counts, as given at construction.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Species id owning phenotype `i`.
    pub fn species_of(&self, i: usize) -> usize {
        self.species_of[i]
    }

    /// Whether phenotypes `i` and `j` belong to the same species.
    pub fn same_species(&self, i: usize, j: usize) -> bool {
        self.species_of[i] == self.species_of[j]
    }

    /// The contiguous phenotype-index block owned by species `s`.
    pub fn block(&self, s: usize) -> Range<usize> {
        let start: usize = self.counts[..s].iter().sum();
        start..start + self.counts[s]
    }

    /// Iterates over all species blocks in order.
    pub fn blocks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.counts.len()).map(|s| self.block(s))
    }
}
