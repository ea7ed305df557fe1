//! # Engine Module
//!
//! The stateful layer that selects, configures and runs one long-range dipolar
//! method at a time and couples its results into the host simulation.
//!
//! ## Overview
//!
//! A host simulation owns one [`dispatcher::DipolarDispatcher`]. Configuration
//! calls (`set_prefactor`, `set_method`) take `&mut self` and are therefore never
//! concurrent with an evaluation; evaluations route to exactly one solver object
//! built for the active method.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Method enumeration, method parameters, prefactor validation
//! - **Error Handling** ([`error`]) - Configuration versus fatal runtime errors
//! - **Process Topology** ([`comm`]) - Process count queries and the collective parameter broadcast
//! - **Collaborators** ([`collaborators`]) - Capability traits for mesh, external and correction solvers
//! - **Solvers** ([`solvers`]) - One capability object per method, plus the boundary-correction decorator
//! - **Engines** (`tasks`) - All-pairs and periodic-replica direct summation
//! - **Barostat Coupling** ([`virial`]) - The isotropic NPT virial accumulator
//! - **Dispatch** ([`dispatcher`]) - Lifecycle hooks and evaluation routing

pub mod collaborators;
pub mod comm;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod solvers;
pub mod tasks;
pub mod virial;
