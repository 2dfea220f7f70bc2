use crate::error::{Error, Result};
use nalgebra::DVector;
use rand::Rng;

/// Draws a uniform point on the n-simplex (Dirichlet(1, ..., 1)) by
/// normalizing i.i.d. unit exponentials. All randomness comes from the
/// injected generator.
pub fn random_simplex(n: usize, rng: &mut impl Rng) -> Result<DVector<f64>> {
    if n == 0 {
        return Err(Error::InvalidParameter(
            "simplex dimension must be at least 1".to_string(),
        ));
    }
    let mut draws = DVector::from_fn(n, |_, _| {
        // rng.gen::<f64>() is in [0, 1); 1 - u avoids ln(0).
        -(1.0 - rng.gen::<f64>()).ln()
    });
    let total = draws.sum();
    draws /= total;
    Ok(draws)
}

/// Draws i.i.d. uniform demographic multipliers from U(lo, hi), e.g. the
/// manuscript's U(0.9, 1.1) fecundity and death variation.
pub fn demographic_rates(n: usize, lo: f64, hi: f64, rng: &mut impl Rng) -> Result<DVector<f64>> {
    if n == 0 {
        return Err(Error::InvalidParameter(
            "rate vector length must be at least 1".to_string(),
        ));
    }
    if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 || hi < lo {
        return Err(Error::InvalidParameter(format!(
            "rate bounds must satisfy 0 < lo <= hi, got [{lo}, {hi}]"
        )));
    }
    Ok(DVector::from_fn(n, |_, _| rng.gen_range(lo..=hi)))
}
