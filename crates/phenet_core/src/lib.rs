//! The `phenet_core` crate is the numerical core behind the phenotype
//! competition-network manuscript: it builds the competitive-dominance
//! matrix H and the phenotype-inheritance matrix Q from a species/phenotype
//! partition, integrates the replicator-mutator dynamics they drive, and
//! derives the summary statistics (diversity, stability) the plotting layer
//! consumes.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem`
//!   (pluggable right-hand side), `Steppable` (solvers).
//! - **Species**: the explicit phenotype-index -> species-id partition.
//! - **Matrices**: builders for the tournament matrix H and the
//!   row-stochastic memory matrix Q, driven by an injected random source.
//! - **Replicator**: the sum-conserving replicator-mutator vector field.
//! - **Integrate**: fixed-step RK4 driver with extinction-floor handling,
//!   producing immutable trajectories.
//! - **Analysis**: diversity, tail variation, and Jacobian-eigenvalue
//!   stability summaries.

pub mod analysis;
pub mod error;
pub mod integrate;
pub mod matrices;
pub mod replicator;
pub mod sampling;
pub mod solvers;
pub mod species;
pub mod traits;

pub use error::{Error, Result};
pub use integrate::{integrate, integrate_replicator, Trajectory, EXTINCTION_FLOOR};
pub use matrices::{build_dominance_matrix, build_memory_matrix};
pub use replicator::ReplicatorSystem;
pub use species::SpeciesStructure;
