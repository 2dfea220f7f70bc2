use crate::error::{Error, Result};
use crate::species::SpeciesStructure;
use nalgebra::DMatrix;
use rand::Rng;

/// Builds the competitive-dominance matrix H.
///
/// H[(i, j)] is the probability that phenotype i defeats phenotype j in
/// pairwise competition. For each unordered pair the entry is a uniform
/// draw; same-species pairs blend that draw with a shared per-species draw,
/// weighted by `tau`, so within-species entries grow more correlated as
/// `tau` rises. `tau = 1` collapses every within-species block to a single
/// shared value; `tau = 0` leaves all pairs independent.
///
/// The mirror entry is set to `1 - H[(i, j)]` and the diagonal to the
/// neutral 0.5, so the result is a tournament matrix:
/// `H[(i, j)] + H[(j, i)] = 1` for all i != j, entries in [0, 1].
///
/// All randomness comes from the injected generator; the same seeded
/// generator reproduces the same matrix.
pub fn build_dominance_matrix(
    structure: &SpeciesStructure,
    tau: f64,
    rng: &mut impl Rng,
) -> Result<DMatrix<f64>> {
    if !(0.0..=1.0).contains(&tau) {
        return Err(Error::InvalidParameter(format!(
            "tau must lie in [0, 1], got {tau}"
        )));
    }

    let n = structure.phenotype_count();

    // One shared draw per species, consumed in species order so the draw
    // sequence is independent of tau.
    let shared: Vec<f64> = (0..structure.species_count())
        .map(|_| rng.gen::<f64>())
        .collect();

    let mut h = DMatrix::from_element(n, n, 0.5);
    for i in 0..n {
        for j in (i + 1)..n {
            let base = rng.gen::<f64>();
            let value = if structure.same_species(i, j) {
                tau * shared[structure.species_of(i)] + (1.0 - tau) * base
            } else {
                base
            };
            h[(i, j)] = value;
            h[(j, i)] = 1.0 - value;
        }
    }

    Ok(h)
}

/// Fraction of the redistributed `1 - p` mass that leaks uniformly to
/// phenotypes of other species. The remaining 98% stays inside the species
/// block, so imperfect memory couples phenotypes primarily within a species
/// while keeping every phenotype reachable from every other: a species whose
/// whole block is competitively dominated settles at a small positive
/// mutation-selection share instead of being absorbed at zero.
pub const CROSS_SPECIES_LEAKAGE: f64 = 0.02;

/// Builds the phenotype-inheritance (memory) matrix Q.
///
/// Q[(i, j)] is the probability that a reproduction event of phenotype i
/// produces offspring of phenotype j. `p = 1` is perfect memory: the exact
/// identity matrix. For `p < 1`, row i keeps mass `p` on the diagonal; of
/// the redistributed `1 - p`, the [`CROSS_SPECIES_LEAKAGE`] fraction is
/// spread uniformly over phenotypes of other species and the rest uniformly
/// over same-species siblings (a singleton species keeps the within-species
/// share on its own diagonal). Every row sums to 1 exactly and cross-species
/// entries stay negligible relative to within-species ones.
///
/// The builder is deterministic; no random source is involved.
pub fn build_memory_matrix(structure: &SpeciesStructure, p: f64) -> Result<DMatrix<f64>> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidParameter(format!(
            "memory p must lie in [0, 1], got {p}"
        )));
    }

    let n = structure.phenotype_count();
    if p == 1.0 {
        return Ok(DMatrix::identity(n, n));
    }

    let mut q = DMatrix::zeros(n, n);
    for block in structure.blocks() {
        let siblings = block.len() - 1;
        let outside = n - block.len();
        let leak = if outside > 0 {
            CROSS_SPECIES_LEAKAGE * (1.0 - p)
        } else {
            0.0
        };
        let within_mass = (1.0 - p) - leak;
        let cross_each = if outside > 0 { leak / outside as f64 } else { 0.0 };
        for i in block.clone() {
            for j in 0..n {
                q[(i, j)] = if j == i {
                    if siblings == 0 {
                        p + within_mass
                    } else {
                        p
                    }
                } else if structure.same_species(i, j) {
                    within_mass / siblings as f64
                } else {
                    cross_each
                };
            }
        }
    }

    Ok(q)
}
