use crate::error::{Error, Result};
use crate::replicator::ReplicatorSystem;
use crate::solvers::RK4;
use crate::traits::{DynamicalSystem, Steppable};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Abundances at or below this floor are treated as extinct: clamped to
/// zero and never allowed to re-enter positive abundance.
pub const EXTINCTION_FLOOR: f64 = 1e-10;

/// Maximum deviation of `sum(x0)` from 1 accepted at entry.
pub const SIMPLEX_TOLERANCE: f64 = 1e-6;

/// An ordered sequence of (time, state) samples, immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
    extinct: Vec<bool>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// State-space dimension N.
    pub fn dimension(&self) -> usize {
        self.states.first().map_or(0, Vec::len)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    pub fn state(&self, sample: usize) -> &[f64] {
        &self.states[sample]
    }

    pub fn final_state(&self) -> &[f64] {
        self.states.last().expect("trajectory is never empty")
    }

    /// Which phenotypes crossed the extinction floor during the run.
    pub fn extinct_mask(&self) -> &[bool] {
        &self.extinct
    }

    pub fn extinct_count(&self) -> usize {
        self.extinct.iter().filter(|&&e| e).count()
    }
}

/// Integrates a dynamical system from `x0` over `[0, horizon]` with a
/// fixed-step RK4 scheme, sampling `steps` points after the initial one.
///
/// `x0` must lie on the simplex within tolerance. After every step the
/// state is checked for finiteness (`IntegrationFailure` on divergence),
/// phenotypes at or below the extinction floor are clamped to zero and
/// recorded as extinct (monotonic extinction, no resurrection), and the
/// surviving mass is renormalized to correct floating-point drift. The
/// output is deterministic given deterministic inputs.
pub fn integrate(
    system: &impl DynamicalSystem<f64>,
    x0: &[f64],
    horizon: f64,
    steps: usize,
) -> Result<Trajectory> {
    if !horizon.is_finite() || horizon <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "horizon must be positive and finite, got {horizon}"
        )));
    }
    if steps == 0 {
        return Err(Error::InvalidParameter(
            "steps must be at least 1".to_string(),
        ));
    }
    let n = system.dimension();
    if x0.len() != n {
        return Err(Error::DimensionMismatch(format!(
            "x0 has length {}, system dimension is {n}",
            x0.len()
        )));
    }
    if x0.iter().any(|&v| !v.is_finite() || v < -1e-12) {
        return Err(Error::InvalidInitialCondition(
            "x0 must be non-negative and finite".to_string(),
        ));
    }
    let total: f64 = x0.iter().sum();
    if (total - 1.0).abs() > SIMPLEX_TOLERANCE {
        return Err(Error::InvalidInitialCondition(format!(
            "x0 must sum to 1 within {SIMPLEX_TOLERANCE}, sums to {total}"
        )));
    }

    // Accepted drift is corrected once on entry so it does not propagate.
    let mut state: Vec<f64> = x0.iter().map(|&v| v.max(0.0) / total).collect();
    let mut extinct: Vec<bool> = state.iter().map(|&v| v <= EXTINCTION_FLOOR).collect();
    apply_floor(&mut state, &mut extinct, 0.0)?;

    let dt = horizon / steps as f64;
    let mut stepper = RK4::new(n);
    let mut t = 0.0;

    let mut times = Vec::with_capacity(steps + 1);
    let mut states = Vec::with_capacity(steps + 1);
    times.push(0.0);
    states.push(state.clone());

    for _ in 0..steps {
        stepper.step(system, &mut t, &mut state, dt);

        if state.iter().any(|v| !v.is_finite()) {
            return Err(Error::IntegrationFailure(format!(
                "state left the finite domain at t = {t}"
            )));
        }
        apply_floor(&mut state, &mut extinct, t)?;

        times.push(t);
        states.push(state.clone());
    }

    Ok(Trajectory {
        times,
        states,
        extinct,
    })
}

/// Convenience wrapper matching the manuscript's experiment shape: builds
/// the replicator system from H, Q, and optional demographic vectors, then
/// integrates.
pub fn integrate_replicator(
    x0: &[f64],
    dominance: DMatrix<f64>,
    memory: DMatrix<f64>,
    fecundity: Option<DVector<f64>>,
    death: Option<DVector<f64>>,
    horizon: f64,
    steps: usize,
) -> Result<Trajectory> {
    let system = ReplicatorSystem::new(dominance, memory, fecundity, death)?;
    integrate(&system, x0, horizon, steps)
}

/// Clamps extinct phenotypes to zero and renormalizes the survivors.
/// Renormalization corrects drift only; the extinction clamp is the designed
/// floor behavior and a clamped phenotype never becomes positive again.
fn apply_floor(state: &mut [f64], extinct: &mut [bool], t: f64) -> Result<()> {
    for (value, gone) in state.iter_mut().zip(extinct.iter_mut()) {
        if *gone || *value <= EXTINCTION_FLOOR {
            *gone = true;
            *value = 0.0;
        }
    }
    let mass: f64 = state.iter().sum();
    if mass <= 0.0 {
        return Err(Error::IntegrationFailure(format!(
            "all phenotypes crossed the extinction floor at t = {t}"
        )));
    }
    for value in state.iter_mut() {
        *value /= mass;
    }
    Ok(())
}
