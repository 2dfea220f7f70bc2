use crate::error::{Error, Result};
use crate::traits::DynamicalSystem;
use nalgebra::{DMatrix, DVector};
use std::cell::RefCell;

/// The replicator-mutator vector field driving relative-abundance dynamics.
///
/// Per-phenotype birth flux is `b_j = f_j * x_j * (Hx)_j`: competitive payoff
/// against the current population, scaled by fecundity. Reproduction routes
/// each birth flux through the memory matrix, so phenotype i grows by
/// `sum_j Q[(j, i)] * b_j`, and loses share to a death term normalized so
/// that `sum_i dx_i = 0` holds identically:
///
///   dx_i = sum_j Q[(j, i)] b_j  -  d_i x_i * (sum_j b_j) / (sum_k d_k x_k)
///
/// The simplex is therefore conserved by the field itself, not only by the
/// integrator's drift correction. With Q = I and f = d = 1 this reduces
/// exactly to the classical zero-sum replicator
/// `dx_i = x_i ((Hx)_i - x^T H x)`.
pub struct ReplicatorSystem {
    dominance: DMatrix<f64>,
    memory: DMatrix<f64>,
    fecundity: DVector<f64>,
    death: DVector<f64>,
    births: RefCell<Vec<f64>>,
}

impl ReplicatorSystem {
    /// Builds the vector field from H, Q, and optional demographic vectors.
    /// `fecundity`/`death` default to all-ones (no demographic variation).
    pub fn new(
        dominance: DMatrix<f64>,
        memory: DMatrix<f64>,
        fecundity: Option<DVector<f64>>,
        death: Option<DVector<f64>>,
    ) -> Result<Self> {
        if !dominance.is_square() {
            return Err(Error::DimensionMismatch(format!(
                "H must be square, got {}x{}",
                dominance.nrows(),
                dominance.ncols()
            )));
        }
        if !memory.is_square() || memory.nrows() != dominance.nrows() {
            return Err(Error::DimensionMismatch(format!(
                "Q must be square and match H ({}), got {}x{}",
                dominance.nrows(),
                memory.nrows(),
                memory.ncols()
            )));
        }

        let n = dominance.nrows();
        let fecundity = fecundity.unwrap_or_else(|| DVector::from_element(n, 1.0));
        let death = death.unwrap_or_else(|| DVector::from_element(n, 1.0));
        for (name, rates) in [("fecundity f", &fecundity), ("death d", &death)] {
            if rates.len() != n {
                return Err(Error::DimensionMismatch(format!(
                    "{name} has length {}, expected {n}",
                    rates.len()
                )));
            }
            if rates.iter().any(|&r| !r.is_finite() || r <= 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "{name} must contain strictly positive finite rates"
                )));
            }
        }

        Ok(Self {
            dominance,
            memory,
            fecundity,
            death,
            births: RefCell::new(vec![0.0; n]),
        })
    }

    /// Uncoupled dynamics: Q = I, f = d = 1. Phenotypes behave as
    /// independent species under the classical zero-sum replicator.
    pub fn uncoupled(dominance: DMatrix<f64>) -> Result<Self> {
        let n = dominance.nrows();
        Self::new(dominance, DMatrix::identity(n, n), None, None)
    }

    pub fn dominance(&self) -> &DMatrix<f64> {
        &self.dominance
    }

    pub fn memory(&self) -> &DMatrix<f64> {
        &self.memory
    }
}

impl DynamicalSystem<f64> for ReplicatorSystem {
    fn dimension(&self) -> usize {
        self.dominance.nrows()
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let n = self.dominance.nrows();
        let mut births = self.births.borrow_mut();

        let mut total_birth = 0.0;
        let mut weighted_death = 0.0;
        for j in 0..n {
            let mut payoff = 0.0;
            for k in 0..n {
                payoff += self.dominance[(j, k)] * x[k];
            }
            let b = self.fecundity[j] * x[j] * payoff;
            births[j] = b;
            total_birth += b;
            weighted_death += self.death[j] * x[j];
        }

        // Degenerate only off the simplex; the integrator never gets here
        // with zero total mass.
        let pressure = if weighted_death > 0.0 {
            total_birth / weighted_death
        } else {
            0.0
        };

        for i in 0..n {
            let mut inflow = 0.0;
            for j in 0..n {
                inflow += self.memory[(j, i)] * births[j];
            }
            out[i] = inflow - self.death[i] * x[i] * pressure;
        }
    }
}
