use crate::core::forcefield::term::{PressureContribution, PressureStatus};
use crate::core::models::system::ParticleSystem;
use crate::engine::collaborators::Collaborators;
use crate::engine::config::{EvaluationConfig, MethodKind};
use crate::engine::dispatcher::DipolarDispatcher;
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub method: MethodKind,
    /// Per-term dipolar energies, in the order the method reports them.
    pub energies: Vec<f64>,
    pub total_energy: f64,
    pub pressure: Option<(PressureContribution, PressureStatus)>,
    pub net_force: Vector3<f64>,
    pub net_torque: Vector3<f64>,
    pub total_dipole_moment: Vector3<f64>,
    /// Barostat virial after the force evaluation; zero outside isotropic NPT.
    pub barostat_virial: Vector3<f64>,
}

/// Evaluates the dipolar interaction of `system` from scratch.
///
/// Force and torque accumulators are cleared first and hold only the dipolar
/// contribution afterwards.
#[instrument(skip_all, name = "evaluation_workflow")]
pub fn run(
    system: &mut ParticleSystem,
    config: &EvaluationConfig,
    collaborators: Collaborators,
) -> Result<EvaluationReport, EngineError> {
    let geometry = &config.geometry;
    let interaction = &config.interaction;

    // === Phase 0: Configure ===
    let mut dispatcher = DipolarDispatcher::with_collaborators(collaborators);
    dispatcher.set_prefactor(interaction.prefactor())?;
    dispatcher.set_method(interaction.method().clone())?;
    dispatcher.run_sanity_checks(geometry)?;
    dispatcher.on_integrator_start(config.integrator)?;
    info!(
        method = %dispatcher.kind(),
        prefactor = interaction.prefactor(),
        particles = system.len(),
        "Dipolar evaluation configured."
    );

    // === Phase 1: Forces ===
    dispatcher.on_observable_calc(system)?;
    dispatcher.on_integrator_pre_step();
    system.clear_accumulators();
    dispatcher.compute_forces(system, geometry)?;

    // === Phase 2: Energies ===
    let energies = dispatcher.long_range_energy(system, geometry)?;

    // === Phase 3: Pressure (optional) ===
    let pressure = if config.compute_pressure {
        let mut contribution = PressureContribution::new(dispatcher.virial_term_count());
        let status = dispatcher.contribute_to_pressure(system, geometry, &mut contribution)?;
        Some((contribution, status))
    } else {
        None
    };

    let dipolar_ids = system.dipolar_particle_ids();
    let report = EvaluationReport {
        method: dispatcher.kind(),
        total_energy: energies.total(),
        energies: energies.into(),
        pressure,
        net_force: system.net_force(),
        net_torque: system.net_torque(),
        total_dipole_moment: system.total_dipole_moment(&dipolar_ids),
        barostat_virial: *dispatcher.npt_virial().p_vir(),
    };

    info!(
        total_energy = report.total_energy,
        terms = report.energies.len(),
        "Dipolar evaluation complete."
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::geometry::BoxGeometry;
    use crate::core::models::particle::Particle;
    use crate::engine::config::{
        DipolarMethod, DipoleConfiguration, EvaluationConfigBuilder, ReplicaCutoff,
    };
    use crate::engine::solvers::testing::MockMesh;
    use crate::engine::virial::Integrator;
    use nalgebra::Point3;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn chain_system() -> ParticleSystem {
        let mut system = ParticleSystem::new();
        for k in 0..4 {
            system.add_particle(Particle::with_dipole(
                Point3::new(1.0 + 1.1 * k as f64, 2.0, 2.0 + 0.3 * k as f64),
                Vector3::new(0.0, 0.2 * k as f64, 1.0),
            ));
        }
        system
    }

    fn config(method: DipolarMethod, integrator: Integrator) -> EvaluationConfig {
        EvaluationConfigBuilder::new()
            .interaction(DipoleConfiguration::new(1.0, method).unwrap())
            .geometry(BoxGeometry::cubic(8.0))
            .integrator(integrator)
            .build()
            .unwrap()
    }

    #[test]
    fn direct_sum_report_has_zero_net_force() {
        let mut system = chain_system();
        let method = DipolarMethod::DirectSum {
            replica_cutoff: ReplicaCutoff::new(1).unwrap(),
        };
        let report = run(
            &mut system,
            &config(method, Integrator::VelocityVerlet),
            Collaborators::new(),
        )
        .unwrap();

        assert_eq!(report.method, MethodKind::DirectSum);
        assert_eq!(report.energies.len(), 1);
        assert!(f64_approx_equal(report.total_energy, report.energies[0]));
        assert!(report.net_force.norm() < TOLERANCE);
        let (_, status) = report.pressure.unwrap();
        assert_eq!(status, PressureStatus::Incomplete);
    }

    #[test]
    fn accumulators_are_cleared_before_evaluation() {
        let mut system = chain_system();
        for (_, particle) in system.particles_iter_mut() {
            particle.force = Vector3::new(100.0, 0.0, 0.0);
        }
        let report = run(
            &mut system,
            &config(DipolarMethod::None, Integrator::VelocityVerlet),
            Collaborators::new(),
        )
        .unwrap();
        assert_eq!(report.net_force, Vector3::zeros());
        assert_eq!(report.energies, vec![0.0]);
    }

    #[test]
    fn report_includes_total_dipole_moment() {
        let mut system = chain_system();
        let report = run(
            &mut system,
            &config(DipolarMethod::AllWithAllNoReplica, Integrator::VelocityVerlet),
            Collaborators::new(),
        )
        .unwrap();
        assert!(f64_approx_equal(report.total_dipole_moment.z, 4.0));
    }

    #[test]
    fn incompatible_integrator_aborts_the_workflow() {
        let mut system = chain_system();
        let result = run(
            &mut system,
            &config(DipolarMethod::AllWithAllNoReplica, Integrator::NptIsotropic),
            Collaborators::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::IncompatibleIntegrator { .. })
        ));
    }

    #[test]
    fn mesh_under_npt_reports_barostat_virial() {
        let mut system = chain_system();
        let collaborators = Collaborators::new().with_mesh(MockMesh::shared(2.0));
        let report = run(
            &mut system,
            &config(DipolarMethod::MeshEwald, Integrator::NptIsotropic),
            collaborators,
        )
        .unwrap();

        assert!(f64_approx_equal(report.barostat_virial.x, 2.0));
        assert_eq!(report.energies, vec![2.0]);
        let (pressure, status) = report.pressure.unwrap();
        assert_eq!(status, PressureStatus::Incomplete);
        assert!(f64_approx_equal(pressure.virial[0], 2.0));
    }
}
