use super::{DipolarSolver, Evaluation, solver_error};
use crate::core::forcefield::term::{PressureContribution, PressureStatus};
use crate::core::models::geometry::BoxGeometry;
use crate::core::models::system::ParticleSystem;
use crate::engine::collaborators::{SharedSolver, lock};
use crate::engine::comm::Payloads;
use crate::engine::config::MethodKind;
use crate::engine::error::EngineError;
use tracing::warn;

/// Mesh-based Ewald summation, delegated to a registered mesh solver.
pub struct MeshEwald {
    solver: SharedSolver,
}

impl MeshEwald {
    pub fn new(solver: SharedSolver) -> Self {
        Self { solver }
    }
}

impl DipolarSolver for MeshEwald {
    fn kind(&self) -> MethodKind {
        MethodKind::MeshEwald
    }

    fn initialize(&mut self, geometry: &BoxGeometry, prefactor: f64) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "mesh solver")?;
        solver
            .initialize(geometry, prefactor)
            .map_err(|e| solver_error(solver.name(), e))
    }

    fn add_forces(&mut self, eval: &mut Evaluation<'_>) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "mesh solver")?;
        solver.assign_particle_state(eval.system, eval.geometry);
        if eval.npt.is_active() {
            let energy = solver.compute_long_range(eval.system, true, true);
            eval.npt.add_long_range_energy(energy);
            warn!(energy, "Mesh-Ewald dipolar energy is added to the barostat virial p_vir[0].");
        } else {
            solver.compute_long_range(eval.system, true, false);
        }
        Ok(())
    }

    fn add_energies(
        &mut self,
        eval: &mut Evaluation<'_>,
        terms: &mut [f64],
    ) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "mesh solver")?;
        solver.assign_particle_state(eval.system, eval.geometry);
        terms[0] += solver.compute_long_range(eval.system, false, true);
        Ok(())
    }

    /// Adds the mesh energy as the dipolar virial and spreads it over the
    /// diagonal of the pressure tensor. No stress formula exists, so the
    /// result is only an isotropic estimate.
    fn add_pressure(
        &mut self,
        eval: &mut Evaluation<'_>,
        pressure: &mut PressureContribution,
    ) -> Result<PressureStatus, EngineError> {
        let mut solver = lock(&self.solver, "mesh solver")?;
        solver.assign_particle_state(eval.system, eval.geometry);
        let energy = solver.compute_long_range(eval.system, false, true);

        let slot = pressure.virial.first_mut().ok_or_else(|| {
            EngineError::Internal("mesh Ewald pressure needs one virial slot".to_string())
        })?;
        *slot += energy;
        pressure.add_isotropic(energy);

        warn!("Stress tensor calculated, but the dipolar mesh-Ewald stress tensor is not implemented.");
        warn!("The mesh-Ewald energy has been added to the virial and pressure tensor diagonal.");
        Ok(PressureStatus::Incomplete)
    }

    fn on_box_change(&mut self, geometry: &BoxGeometry) -> Result<(), EngineError> {
        lock(&self.solver, "mesh solver")?.rescale_on_box_change(geometry);
        Ok(())
    }

    fn reinitialize_on_coupling_change(&self) -> bool {
        true
    }

    fn on_observable_calc(&mut self, system: &ParticleSystem) -> Result<(), EngineError> {
        lock(&self.solver, "mesh solver")?.on_observable_calc(system);
        Ok(())
    }

    fn sanity_check(&self, _geometry: &BoxGeometry) -> Result<bool, EngineError> {
        Ok(lock(&self.solver, "mesh solver")?.sanity_check())
    }

    fn short_range_cutoff(&self) -> Result<Option<f64>, EngineError> {
        Ok(lock(&self.solver, "mesh solver")?.real_space_cutoff())
    }

    fn parameter_payloads(&self) -> Result<Payloads, EngineError> {
        Ok(Payloads {
            solver: lock(&self.solver, "mesh solver")?.parameter_payload(),
            correction: Vec::new(),
        })
    }

    fn apply_parameter_payloads(&mut self, payloads: &Payloads) -> Result<(), EngineError> {
        let mut solver = lock(&self.solver, "mesh solver")?;
        solver
            .apply_parameter_payload(&payloads.solver)
            .map_err(|e| solver_error(solver.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use crate::engine::solvers::testing::MockMesh;
    use crate::engine::virial::{Integrator, NptVirial};
    use nalgebra::{Point3, Vector3};

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn one_particle() -> ParticleSystem {
        let mut system = ParticleSystem::new();
        system.add_particle(Particle::with_dipole(Point3::origin(), Vector3::z()));
        system
    }

    #[test]
    fn forces_request_no_energy_outside_npt() {
        let mock = MockMesh::shared(3.0);
        let mut mesh = MeshEwald::new(mock.clone());
        let mut system = one_particle();
        let geometry = BoxGeometry::cubic(5.0);
        let mut npt = NptVirial::new(Integrator::VelocityVerlet);

        mesh.add_forces(&mut Evaluation::new(&mut system, &geometry, 1.0, 1, &mut npt))
            .unwrap();

        let log = mock.lock().unwrap().log.clone();
        assert_eq!(log.assigned, 1);
        assert_eq!(log.computes, vec![(true, false)]);
        assert_eq!(*npt.p_vir(), Vector3::zeros());
        assert!(f64_approx_equal(system.net_force().x, 0.5));
    }

    #[test]
    fn npt_forces_fold_energy_into_barostat_virial() {
        let mock = MockMesh::shared(3.0);
        let mut mesh = MeshEwald::new(mock.clone());
        let mut system = one_particle();
        let geometry = BoxGeometry::cubic(5.0);
        let mut npt = NptVirial::new(Integrator::NptIsotropic);

        mesh.add_forces(&mut Evaluation::new(&mut system, &geometry, 1.0, 1, &mut npt))
            .unwrap();

        assert_eq!(mock.lock().unwrap().log.computes, vec![(true, true)]);
        assert!(f64_approx_equal(npt.p_vir().x, 3.0));
        assert_eq!(npt.p_vir().y, 0.0);
    }

    #[test]
    fn pressure_spreads_energy_over_the_diagonal() {
        let mock = MockMesh::shared(3.0);
        let mut mesh = MeshEwald::new(mock);
        let mut system = one_particle();
        let geometry = BoxGeometry::cubic(5.0);
        let mut npt = NptVirial::default();
        let mut pressure = PressureContribution::new(1);

        let status = mesh
            .add_pressure(
                &mut Evaluation::new(&mut system, &geometry, 1.0, 1, &mut npt),
                &mut pressure,
            )
            .unwrap();

        assert_eq!(status, PressureStatus::Incomplete);
        assert!(f64_approx_equal(pressure.virial[0], 3.0));
        for k in 0..3 {
            assert!(f64_approx_equal(pressure.tensor[(k, k)], 1.0));
        }
        assert_eq!(pressure.tensor[(0, 1)], 0.0);
    }

    #[test]
    fn pressure_without_virial_slot_is_an_internal_error() {
        let mut mesh = MeshEwald::new(MockMesh::shared(3.0));
        let mut system = one_particle();
        let geometry = BoxGeometry::cubic(5.0);
        let mut npt = NptVirial::default();
        let mut pressure = PressureContribution::new(0);

        let result = mesh.add_pressure(
            &mut Evaluation::new(&mut system, &geometry, 1.0, 1, &mut npt),
            &mut pressure,
        );
        assert!(matches!(result, Err(EngineError::Internal(_))));
    }

    #[test]
    fn lifecycle_hooks_reach_the_mesh_solver() {
        let mock = MockMesh::shared(0.0);
        let mut mesh = MeshEwald::new(mock.clone());
        let geometry = BoxGeometry::cubic(5.0);

        mesh.initialize(&geometry, 2.0).unwrap();
        mesh.on_box_change(&geometry).unwrap();
        mesh.on_observable_calc(&one_particle()).unwrap();

        let log = mock.lock().unwrap().log.clone();
        assert_eq!(log.initialized, 1);
        assert_eq!(log.prefactor, 2.0);
        assert_eq!(log.rescaled, 1);
        assert_eq!(log.observable_calcs, 1);
        assert!(mesh.reinitialize_on_coupling_change());
        assert_eq!(mesh.short_range_cutoff().unwrap(), Some(2.5));
    }
}
