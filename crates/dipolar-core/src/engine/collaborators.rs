//! Capability interfaces of the solvers this crate drives but does not implement.
//!
//! A mesh-Ewald solver, a third-party long-range library and a boundary
//! correction for partially periodic geometries are registered by the host as
//! shared trait objects. The dispatcher only ever talks to them through the
//! narrow operations below.

use super::error::EngineError;
use crate::core::models::geometry::BoxGeometry;
use crate::core::models::system::ParticleSystem;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct SolverError(pub String);

impl SolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait LongRangeSolver: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self, geometry: &BoxGeometry, prefactor: f64) -> Result<(), SolverError>;

    /// Copies positions and dipoles into the solver's own representation.
    fn assign_particle_state(&mut self, system: &ParticleSystem, geometry: &BoxGeometry);

    /// Adds forces (and torques if rotation is on) into `system` and returns the
    /// energy, already scaled by the prefactor. The energy is only meaningful
    /// when `want_energy` is set.
    fn compute_long_range(
        &mut self,
        system: &mut ParticleSystem,
        want_force: bool,
        want_energy: bool,
    ) -> f64;

    fn rescale_on_box_change(&mut self, geometry: &BoxGeometry);

    fn sanity_check(&self) -> bool;

    /// Real-space cutoff the host's short-range loop must cover.
    fn real_space_cutoff(&self) -> Option<f64> {
        None
    }

    fn on_observable_calc(&mut self, _system: &ParticleSystem) {}

    fn parameter_payload(&self) -> Vec<u8> {
        Vec::new()
    }

    fn apply_parameter_payload(&mut self, _payload: &[u8]) -> Result<(), SolverError> {
        Ok(())
    }
}

pub trait BoundaryCorrection: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self, _geometry: &BoxGeometry, _prefactor: f64) -> Result<(), SolverError> {
        Ok(())
    }

    /// Adds correction forces into `system`, scaled by the prefactor the
    /// correction was set up with.
    fn add_force_corrections(&mut self, system: &mut ParticleSystem, geometry: &BoxGeometry);

    fn energy_correction(&mut self, system: &ParticleSystem, geometry: &BoxGeometry) -> f64;

    fn sanity_check(&self, geometry: &BoxGeometry) -> bool;

    fn parameter_payload(&self) -> Vec<u8> {
        Vec::new()
    }

    fn apply_parameter_payload(&mut self, _payload: &[u8]) -> Result<(), SolverError> {
        Ok(())
    }
}

pub type SharedSolver = Arc<Mutex<dyn LongRangeSolver>>;
pub type SharedCorrection = Arc<Mutex<dyn BoundaryCorrection>>;

/// The external solvers a host has made available.
///
/// Each is optional; selecting a method whose collaborator is missing fails
/// with [`super::config::ConfigError::MethodUnavailable`].
#[derive(Clone, Default)]
pub struct Collaborators {
    pub mesh: Option<SharedSolver>,
    pub external: Option<SharedSolver>,
    pub boundary_correction: Option<SharedCorrection>,
    pub gpu_actors: bool,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, solver: SharedSolver) -> Self {
        self.mesh = Some(solver);
        self
    }

    pub fn with_external(mut self, solver: SharedSolver) -> Self {
        self.external = Some(solver);
        self
    }

    pub fn with_boundary_correction(mut self, correction: SharedCorrection) -> Self {
        self.boundary_correction = Some(correction);
        self
    }

    pub fn with_gpu_actors(mut self) -> Self {
        self.gpu_actors = true;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("mesh", &self.mesh.is_some())
            .field("external", &self.external.is_some())
            .field("boundary_correction", &self.boundary_correction.is_some())
            .field("gpu_actors", &self.gpu_actors)
            .finish()
    }
}

/// Locks a shared collaborator, turning a poisoned lock into an internal error.
pub(crate) fn lock<'a, T: ?Sized>(
    shared: &'a Arc<Mutex<T>>,
    what: &str,
) -> Result<MutexGuard<'a, T>, EngineError> {
    shared
        .lock()
        .map_err(|_| EngineError::Internal(format!("{what} lock poisoned")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    impl LongRangeSolver for Dummy {
        fn name(&self) -> &str {
            "dummy"
        }
        fn initialize(&mut self, _: &BoxGeometry, _: f64) -> Result<(), SolverError> {
            Ok(())
        }
        fn assign_particle_state(&mut self, _: &ParticleSystem, _: &BoxGeometry) {}
        fn compute_long_range(&mut self, _: &mut ParticleSystem, _: bool, _: bool) -> f64 {
            0.0
        }
        fn rescale_on_box_change(&mut self, _: &BoxGeometry) {}
        fn sanity_check(&self) -> bool {
            true
        }
    }

    #[test]
    fn default_capabilities_are_empty() {
        let solver = Dummy;
        assert_eq!(solver.real_space_cutoff(), None);
        assert!(solver.parameter_payload().is_empty());
    }

    #[test]
    fn builder_registers_collaborators() {
        let mesh: SharedSolver = Arc::new(Mutex::new(Dummy));
        let collaborators = Collaborators::new().with_mesh(mesh).with_gpu_actors();
        assert!(collaborators.mesh.is_some());
        assert!(collaborators.external.is_none());
        assert!(collaborators.gpu_actors);
        assert!(lock(collaborators.mesh.as_ref().unwrap(), "mesh").is_ok());
    }
}
