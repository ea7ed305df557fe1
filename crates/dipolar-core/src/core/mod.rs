//! # Core Module
//!
//! The computational foundation of the library: particle and box models, the
//! pairwise dipole kernel and the observable accumulators that engines write into.
//!
//! ## Architecture
//!
//! - **Particle Representation** ([`models`]) - Particles, particle systems and box geometry
//! - **Interaction Kernels** ([`forcefield`]) - Closed-form dipole-dipole energy, force and torque
//! - **File I/O** ([`io`]) - Reading particle configurations and writing force tables
//!
//! ## Scientific Foundation
//!
//! A point dipole `m1` at separation `r` from a point dipole `m2` has the energy
//!
//! ```text
//! u = m1·m2 / |r|³ - 3 (m1·r)(m2·r) / |r|⁵
//! ```
//!
//! scaled by a global coupling prefactor. Forces and torques follow from the
//! gradient of `u` and from the dipole-field cross product.

pub mod forcefield;
pub mod io;
pub mod models;
