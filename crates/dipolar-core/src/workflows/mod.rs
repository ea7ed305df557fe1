//! # Workflows Module
//!
//! One-call procedures built on [`crate::engine`] and [`crate::core`].
//!
//! - **Evaluation Workflow** ([`evaluate`]) - Configures a dispatcher, checks the
//!   method against the box and integrator, and evaluates dipolar forces,
//!   torques, per-term energies and the pressure contribution for one particle
//!   configuration.

pub mod evaluate;
