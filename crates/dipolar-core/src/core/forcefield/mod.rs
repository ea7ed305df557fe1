//! # Force Field Module
//!
//! Closed-form dipole-dipole interaction kernels and the observable
//! accumulators the engines write their results into.
//!
//! ## Key Components
//!
//! - [`potentials`] - Pairwise dipole energy, force and torque for one displacement
//! - [`term`] - Per-term energy breakdown and the pressure/virial accumulator
//!
//! ## Usage
//!
//! ```ignore
//! use dipolar::core::forcefield::potentials::{dipole_dipole, KernelMode};
//!
//! let pair = dipole_dipole(&m1, &m2, &r, KernelMode::ForceAndTorque);
//! assert_eq!(pair.energy, dipole_dipole_energy(&m1, &m2, &r));
//! ```

pub mod potentials;
pub mod term;
