use super::{DipolarSolver, Evaluation, solver_error};
use crate::core::forcefield::term::{PressureContribution, PressureStatus};
use crate::core::models::geometry::BoxGeometry;
use crate::core::models::system::ParticleSystem;
use crate::engine::collaborators::{SharedCorrection, lock};
use crate::engine::comm::Payloads;
use crate::engine::config::MethodKind;
use crate::engine::error::EngineError;
use tracing::warn;

/// A base method combined with a boundary correction for partially periodic
/// geometries.
///
/// Forces: correction first, then the base method. Energies: the base method
/// fills slot 0, the correction slot 1.
pub struct BoundaryCorrected<S> {
    base: S,
    correction: SharedCorrection,
    kind: MethodKind,
}

impl<S: DipolarSolver> BoundaryCorrected<S> {
    pub fn new(base: S, correction: SharedCorrection) -> Self {
        let base_kind = base.kind();
        let kind = base_kind.boundary_corrected().unwrap_or(base_kind);
        Self {
            base,
            correction,
            kind,
        }
    }

    pub fn base(&self) -> &S {
        &self.base
    }
}

impl<S: DipolarSolver> DipolarSolver for BoundaryCorrected<S> {
    fn kind(&self) -> MethodKind {
        self.kind
    }

    fn energy_term_count(&self) -> usize {
        self.base.energy_term_count() + 1
    }

    fn initialize(&mut self, geometry: &BoxGeometry, prefactor: f64) -> Result<(), EngineError> {
        self.base.initialize(geometry, prefactor)?;
        let mut correction = lock(&self.correction, "boundary correction")?;
        correction
            .initialize(geometry, prefactor)
            .map_err(|e| solver_error(correction.name(), e))
    }

    fn add_forces(&mut self, eval: &mut Evaluation<'_>) -> Result<(), EngineError> {
        lock(&self.correction, "boundary correction")?
            .add_force_corrections(eval.system, eval.geometry);
        self.base.add_forces(eval)
    }

    fn add_energies(
        &mut self,
        eval: &mut Evaluation<'_>,
        terms: &mut [f64],
    ) -> Result<(), EngineError> {
        let split = self.base.energy_term_count();
        if terms.len() <= split {
            return Err(EngineError::Internal(format!(
                "boundary-corrected energy needs {} slots, got {}",
                split + 1,
                terms.len()
            )));
        }
        let (base_terms, correction_terms) = terms.split_at_mut(split);
        self.base.add_energies(eval, base_terms)?;
        correction_terms[0] += lock(&self.correction, "boundary correction")?
            .energy_correction(eval.system, eval.geometry);
        Ok(())
    }

    fn add_pressure(
        &mut self,
        _eval: &mut Evaluation<'_>,
        _pressure: &mut PressureContribution,
    ) -> Result<PressureStatus, EngineError> {
        warn!(
            method = %self.kind,
            "Pressure calculated, but the boundary-correction pressure is not implemented."
        );
        Ok(PressureStatus::Incomplete)
    }

    fn on_box_change(&mut self, geometry: &BoxGeometry) -> Result<(), EngineError> {
        self.base.on_box_change(geometry)
    }

    fn reinitialize_on_coupling_change(&self) -> bool {
        self.base.reinitialize_on_coupling_change()
    }

    fn on_observable_calc(&mut self, system: &ParticleSystem) -> Result<(), EngineError> {
        self.base.on_observable_calc(system)
    }

    /// Both checks always run, so every failing component gets to report.
    fn sanity_check(&self, geometry: &BoxGeometry) -> Result<bool, EngineError> {
        let correction_ok = lock(&self.correction, "boundary correction")?.sanity_check(geometry);
        let base_ok = self.base.sanity_check(geometry)?;
        Ok(correction_ok && base_ok)
    }

    fn short_range_cutoff(&self) -> Result<Option<f64>, EngineError> {
        self.base.short_range_cutoff()
    }

    fn parameter_payloads(&self) -> Result<Payloads, EngineError> {
        let mut payloads = self.base.parameter_payloads()?;
        payloads.correction = lock(&self.correction, "boundary correction")?.parameter_payload();
        Ok(payloads)
    }

    fn apply_parameter_payloads(&mut self, payloads: &Payloads) -> Result<(), EngineError> {
        self.base.apply_parameter_payloads(payloads)?;
        let mut correction = lock(&self.correction, "boundary correction")?;
        correction
            .apply_parameter_payload(&payloads.correction)
            .map_err(|e| solver_error(correction.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use crate::engine::config::ReplicaCutoff;
    use crate::engine::solvers::direct::DirectSum;
    use crate::engine::solvers::mesh::MeshEwald;
    use crate::engine::solvers::testing::{MockCorrection, MockMesh};
    use crate::engine::virial::NptVirial;
    use nalgebra::{Point3, Vector3};

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn pair_system() -> ParticleSystem {
        let mut system = ParticleSystem::new();
        system.add_particle(Particle::with_dipole(Point3::new(1.0, 1.0, 1.0), Vector3::x()));
        system.add_particle(Particle::with_dipole(Point3::new(1.0, 1.0, 2.0), Vector3::x()));
        system
    }

    #[test]
    fn corrected_kinds_follow_their_base() {
        let corrected = BoundaryCorrected::new(
            DirectSum::new(ReplicaCutoff::ZERO),
            MockCorrection::shared(0.0),
        );
        assert_eq!(corrected.kind(), MethodKind::DirectSumWithBoundaryCorrection);
        assert_eq!(corrected.energy_term_count(), 2);

        let corrected = BoundaryCorrected::new(
            MeshEwald::new(MockMesh::shared(0.0)),
            MockCorrection::shared(0.0),
        );
        assert_eq!(corrected.kind(), MethodKind::MeshEwaldWithBoundaryCorrection);
    }

    #[test]
    fn energies_are_base_then_correction() {
        let mut corrected = BoundaryCorrected::new(
            DirectSum::new(ReplicaCutoff::ZERO),
            MockCorrection::shared(-0.75),
        );
        let mut system = pair_system();
        let geometry = BoxGeometry::cubic(10.0);
        let mut npt = NptVirial::default();

        let mut terms = [0.0, 0.0];
        corrected
            .add_energies(
                &mut Evaluation::new(&mut system, &geometry, 1.0, 1, &mut npt),
                &mut terms,
            )
            .unwrap();

        assert!(f64_approx_equal(terms[0], 1.0));
        assert!(f64_approx_equal(terms[1], -0.75));
    }

    #[test]
    fn too_few_energy_slots_is_an_internal_error() {
        let mut corrected = BoundaryCorrected::new(
            DirectSum::new(ReplicaCutoff::ZERO),
            MockCorrection::shared(0.0),
        );
        let mut system = pair_system();
        let geometry = BoxGeometry::cubic(10.0);
        let mut npt = NptVirial::default();

        let mut terms = [0.0];
        let result = corrected.add_energies(
            &mut Evaluation::new(&mut system, &geometry, 1.0, 1, &mut npt),
            &mut terms,
        );
        assert!(matches!(result, Err(EngineError::Internal(_))));
    }

    #[test]
    fn forces_add_correction_and_base() {
        let correction = MockCorrection::shared(0.0);
        let mut corrected =
            BoundaryCorrected::new(MeshEwald::new(MockMesh::shared(0.0)), correction.clone());
        let mut system = pair_system();
        let geometry = BoxGeometry::cubic(10.0);
        let mut npt = NptVirial::default();

        corrected
            .add_forces(&mut Evaluation::new(&mut system, &geometry, 1.0, 1, &mut npt))
            .unwrap();

        // Two particles, each receiving mesh (0.5, 0, 0) and correction (0, 0.25, 0).
        let net = system.net_force();
        assert!(f64_approx_equal(net.x, 1.0));
        assert!(f64_approx_equal(net.y, 0.5));
        assert_eq!(correction.lock().unwrap().applied, 1);
    }

    #[test]
    fn sanity_check_fails_when_either_part_fails() {
        let correction = MockCorrection::shared(0.0);
        let mesh = MockMesh::shared(0.0);
        let corrected = BoundaryCorrected::new(MeshEwald::new(mesh.clone()), correction.clone());
        let geometry = BoxGeometry::cubic(10.0);

        assert!(corrected.sanity_check(&geometry).unwrap());
        correction.lock().unwrap().healthy = false;
        assert!(!corrected.sanity_check(&geometry).unwrap());
        correction.lock().unwrap().healthy = true;
        mesh.lock().unwrap().healthy = false;
        assert!(!corrected.sanity_check(&geometry).unwrap());
    }

    #[test]
    fn payloads_carry_both_parts() {
        let correction = MockCorrection::shared(0.0);
        let mesh = MockMesh::shared(0.0);
        let mut corrected =
            BoundaryCorrected::new(MeshEwald::new(mesh.clone()), correction.clone());

        let payloads = corrected.parameter_payloads().unwrap();
        assert_eq!(payloads.solver, vec![42, 7]);
        assert_eq!(payloads.correction, vec![9]);

        corrected
            .apply_parameter_payloads(&Payloads {
                solver: vec![1],
                correction: vec![2, 3],
            })
            .unwrap();
        assert_eq!(mesh.lock().unwrap().log.payload, vec![1]);
        assert_eq!(correction.lock().unwrap().payload, vec![2, 3]);
    }
}
