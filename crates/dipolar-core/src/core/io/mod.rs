//! Input/output for particle configurations.
//!
//! Particles are exchanged as CSV tables: one row per particle with its
//! position, dipole magnitude and orientation, and (on output) the force and
//! torque accumulated by the dipolar engines.

pub mod csv_file;
pub mod traits;
