use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types usable as scalars in the dynamical core.
/// Must support floating-point arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A continuous-time dynamical system dx/dt = F(t, x).
///
/// The replicator vector field implements this trait, keeping the
/// right-hand side pluggable: alternative formulations can be swapped in
/// and checked against the same integrator.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer receiving dx/dt
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t and state are updated in place.
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
