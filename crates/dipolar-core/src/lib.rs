//! # Dipolar Core Library
//!
//! Long-range magnetic dipole-dipole interactions for particle simulations in a
//! periodic box, packaged as one pluggable force/energy/virial contributor of a
//! larger simulation engine.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ParticleSystem`,
//!   `BoxGeometry`), the closed-form pairwise dipole kernel (`potentials`), the
//!   energy and pressure observables, and particle file I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer. It owns the dipolar
//!   configuration, selects one of several interchangeable long-range methods,
//!   runs the all-pairs and periodic-replica direct-summation engines, routes
//!   mesh and external solvers through narrow capability traits, and couples
//!   the results into the host's pressure and barostat state.
//!
//! - **[`workflows`]: The Public API.** One-call procedures that tie `engine` and
//!   `core` together, such as evaluating forces, energies and pressure for a
//!   particle configuration.

pub mod core;
pub mod engine;
pub mod workflows;
