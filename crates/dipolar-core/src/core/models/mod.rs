//! # Core Models Module
//!
//! Data structures describing the particles the dipolar engines read and write.
//!
//! ## Key Components
//!
//! - [`particle`] - A single particle: position, dipole moment, force and torque accumulators
//! - [`system`] - The particle store with deterministic iteration order
//! - [`geometry`] - Box edge lengths, per-axis periodicity, folding and minimum image
//! - [`ids`] - Stable particle identifiers
//!
//! ## Usage
//!
//! ```ignore
//! use dipolar::core::models::{particle::Particle, system::ParticleSystem};
//!
//! let mut system = ParticleSystem::new();
//! let id = system.add_particle(Particle::new(Point3::new(0.0, 0.0, 0.0), 1.0, Vector3::z()));
//! ```

pub mod geometry;
pub mod ids;
pub mod particle;
pub mod system;
