use super::{DipolarSolver, Evaluation, solver_error};
use crate::core::models::geometry::BoxGeometry;
use crate::engine::collaborators::{SharedSolver, lock};
use crate::engine::comm::Payloads;
use crate::engine::config::MethodKind;
use crate::engine::error::EngineError;

/// A third-party long-range library. It contributes no short-range part.
pub struct ExternalLibrary {
    solver: SharedSolver,
}

impl ExternalLibrary {
    pub fn new(solver: SharedSolver) -> Self {
        Self { solver }
    }
}

impl DipolarSolver for ExternalLibrary {
    fn kind(&self) -> MethodKind {
        MethodKind::ExternalSolver
    }

    fn initialize(&mut self, geometry: &BoxGeometry, prefactor: f64) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "external solver")?;
        solver
            .initialize(geometry, prefactor)
            .map_err(|e| solver_error(solver.name(), e))
    }

    fn add_forces(&mut self, eval: &mut Evaluation<'_>) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "external solver")?;
        solver.assign_particle_state(eval.system, eval.geometry);
        solver.compute_long_range(eval.system, true, false);
        Ok(())
    }

    fn add_energies(
        &mut self,
        eval: &mut Evaluation<'_>,
        terms: &mut [f64],
    ) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "external solver")?;
        solver.assign_particle_state(eval.system, eval.geometry);
        terms[0] += solver.compute_long_range(eval.system, false, true);
        Ok(())
    }

    fn on_box_change(&mut self, geometry: &BoxGeometry) -> Result<(), EngineError> {
        lock(&self.solver, "external solver")?.rescale_on_box_change(geometry);
        Ok(())
    }

    fn sanity_check(&self, _geometry: &BoxGeometry) -> Result<bool, EngineError> {
        Ok(lock(&self.solver, "external solver")?.sanity_check())
    }

    fn parameter_payloads(&self) -> Result<Payloads, EngineError> {
        Ok(Payloads {
            solver: lock(&self.solver, "external solver")?.parameter_payload(),
            correction: Vec::new(),
        })
    }

    fn apply_parameter_payloads(&mut self, payloads: &Payloads) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "external solver")?;
        solver
            .apply_parameter_payload(&payloads.solver)
            .map_err(|e| solver_error(solver.name(), e))
    }
}
