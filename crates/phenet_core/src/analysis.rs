use crate::error::{Error, Result};
use crate::integrate::Trajectory;
use crate::traits::DynamicalSystem;
use nalgebra::DMatrix;

/// Shannon diversity `-sum x_i ln x_i` of a relative-abundance vector.
/// Zero-abundance phenotypes contribute nothing.
pub fn shannon_diversity(state: &[f64]) -> f64 {
    state
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| -x * x.ln())
        .sum()
}

/// Effective number of phenotypes: exp of the Shannon diversity.
/// Equals N for the uniform state and 1 for a fixated one.
pub fn effective_phenotypes(state: &[f64]) -> f64 {
    shannon_diversity(state).exp()
}

/// Number of phenotypes strictly above `floor`.
pub fn surviving_phenotypes(state: &[f64], floor: f64) -> usize {
    state.iter().filter(|&&x| x > floor).count()
}

/// Largest per-phenotype amplitude (max - min) over the final `fraction`
/// of a trajectory. Small values indicate convergence; persistent
/// oscillation keeps this bounded away from zero.
pub fn tail_variation(trajectory: &Trajectory, fraction: f64) -> Result<f64> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(Error::InvalidParameter(format!(
            "tail fraction must lie in (0, 1], got {fraction}"
        )));
    }
    let len = trajectory.len();
    if len < 2 {
        return Err(Error::InvalidParameter(
            "trajectory needs at least two samples".to_string(),
        ));
    }
    let window = ((len as f64) * fraction).ceil() as usize;
    let window = window.clamp(2, len);
    let tail = &trajectory.states()[len - window..];

    let n = trajectory.dimension();
    let mut worst = 0.0f64;
    for i in 0..n {
        let mut lo = f64::MAX;
        let mut hi = f64::MIN;
        for state in tail {
            lo = lo.min(state[i]);
            hi = hi.max(state[i]);
        }
        worst = worst.max(hi - lo);
    }
    Ok(worst)
}

/// Real parts of the eigenvalues of the vector-field Jacobian at `state`,
/// sorted descending, from a central-difference Jacobian.
///
/// The replicator field is degree-2 homogeneous, so at any equilibrium the
/// radial (off-simplex) direction contributes a zero mode; it is reported,
/// not hidden. Negative remaining real parts indicate a linearly stable
/// endpoint, a conjugate pair with positive real part an oscillatory one.
pub fn linear_stability(system: &impl DynamicalSystem<f64>, state: &[f64]) -> Result<Vec<f64>> {
    let n = system.dimension();
    if state.len() != n {
        return Err(Error::DimensionMismatch(format!(
            "state has length {}, system dimension is {n}",
            state.len()
        )));
    }

    let mut jacobian = DMatrix::zeros(n, n);
    let mut probe = state.to_vec();
    let mut plus = vec![0.0; n];
    let mut minus = vec![0.0; n];
    for j in 0..n {
        let h = 1e-6 * state[j].abs().max(1.0);
        probe[j] = state[j] + h;
        system.apply(0.0, &probe, &mut plus);
        probe[j] = state[j] - h;
        system.apply(0.0, &probe, &mut minus);
        probe[j] = state[j];
        for i in 0..n {
            jacobian[(i, j)] = (plus[i] - minus[i]) / (2.0 * h);
        }
    }

    let mut real_parts: Vec<f64> = jacobian
        .complex_eigenvalues()
        .iter()
        .map(|lambda| lambda.re)
        .collect();
    real_parts.sort_by(|a, b| b.partial_cmp(a).expect("eigenvalue real parts are finite"));
    Ok(real_parts)
}

#[cfg(test)]
mod tests {
    use super::{
        effective_phenotypes, linear_stability, shannon_diversity, surviving_phenotypes,
        tail_variation,
    };
    use crate::error::Error;
    use crate::integrate::{integrate, integrate_replicator, EXTINCTION_FLOOR};
    use crate::matrices::build_memory_matrix;
    use crate::replicator::ReplicatorSystem;
    use crate::species::SpeciesStructure;
    use crate::traits::DynamicalSystem;
    use nalgebra::DMatrix;

    fn rps() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            3,
            3,
            &[0.5, 1.0, 0.0, 0.0, 0.5, 1.0, 1.0, 0.0, 0.5],
        )
    }

    #[test]
    fn diversity_of_uniform_and_fixated_states() {
        let uniform = [0.25; 4];
        assert!((shannon_diversity(&uniform) - 4.0f64.ln()).abs() < 1e-12);
        assert!((effective_phenotypes(&uniform) - 4.0).abs() < 1e-12);

        let fixated = [1.0, 0.0, 0.0, 0.0];
        assert_eq!(shannon_diversity(&fixated), 0.0);
        assert!((effective_phenotypes(&fixated) - 1.0).abs() < 1e-12);

        assert_eq!(surviving_phenotypes(&fixated, EXTINCTION_FLOOR), 1);
        assert_eq!(surviving_phenotypes(&uniform, EXTINCTION_FLOOR), 4);
    }

    #[test]
    fn perfect_memory_cycle_keeps_oscillating() {
        // Rock-paper-scissors with Q = I: closed orbits around the
        // barycenter, no extinction, no convergence.
        let system = ReplicatorSystem::uncoupled(rps()).expect("valid system");
        let trajectory =
            integrate(&system, &[0.5, 0.3, 0.2], 100.0, 10_000).expect("integration");

        assert_eq!(trajectory.extinct_count(), 0);
        assert!(trajectory
            .final_state()
            .iter()
            .all(|&x| x > EXTINCTION_FLOOR));
        let variation = tail_variation(&trajectory, 0.2).expect("valid window");
        assert!(
            variation > 1e-2,
            "cycle should keep oscillating, tail variation was {variation}"
        );
    }

    #[test]
    fn imperfect_memory_stabilizes_the_cycle() {
        // The same game inside a single three-phenotype species with
        // p = 0.85: the within-species inflow damps the oscillation and the
        // trajectory settles at the barycenter with everyone alive.
        let structure = SpeciesStructure::new(&[3]).expect("valid structure");
        let q = build_memory_matrix(&structure, 0.85).expect("valid Q");
        let trajectory =
            integrate_replicator(&[0.5, 0.3, 0.2], rps(), q, None, None, 600.0, 30_000)
                .expect("integration");

        assert_eq!(trajectory.extinct_count(), 0);
        let end = trajectory.final_state();
        for &x in end {
            assert!(x > EXTINCTION_FLOOR);
            assert!((x - 1.0 / 3.0).abs() < 1e-6, "expected barycenter, got {x}");
        }
        let variation = tail_variation(&trajectory, 0.1).expect("valid window");
        assert!(
            variation < 1e-9,
            "trajectory should have converged, tail variation was {variation}"
        );
        assert!((effective_phenotypes(end) - 3.0).abs() < 1e-3);
    }

    #[test]
    fn linear_stability_classifies_the_damped_endpoint() {
        let structure = SpeciesStructure::new(&[3]).expect("valid structure");
        let q = build_memory_matrix(&structure, 0.85).expect("valid Q");
        let system = ReplicatorSystem::new(rps(), q, None, None).expect("valid system");
        let trajectory = integrate(&system, &[0.5, 0.3, 0.2], 600.0, 30_000).expect("integration");

        let real_parts =
            linear_stability(&system, trajectory.final_state()).expect("stability computes");
        assert_eq!(real_parts.len(), 3);
        // Radial zero mode from degree-2 homogeneity, then the contracting
        // conjugate pair.
        assert!(real_parts[0].abs() < 1e-3);
        assert!(real_parts[1] < -0.05);
        assert!(real_parts[2] < -0.05);
    }

    #[test]
    fn linear_stability_recovers_a_known_jacobian() {
        struct Linear;

        impl DynamicalSystem<f64> for Linear {
            fn dimension(&self) -> usize {
                2
            }

            fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
                out[0] = -2.0 * x[0];
                out[1] = 0.5 * x[1];
            }
        }

        let real_parts = linear_stability(&Linear, &[0.3, 0.7]).expect("stability computes");
        assert!((real_parts[0] - 0.5).abs() < 1e-6);
        assert!((real_parts[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn tail_variation_rejects_bad_windows() {
        let system = ReplicatorSystem::uncoupled(rps()).expect("valid system");
        let trajectory = integrate(&system, &[0.5, 0.3, 0.2], 1.0, 10).expect("integration");
        assert!(matches!(
            tail_variation(&trajectory, 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            tail_variation(&trajectory, 1.5),
            Err(Error::InvalidParameter(_))
        ));
    }
}
