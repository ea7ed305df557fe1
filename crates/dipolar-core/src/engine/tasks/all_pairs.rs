use super::Request;
use crate::core::forcefield::potentials::{KernelMode, dipole_dipole};
use crate::core::models::geometry::BoxGeometry;
use crate::core::models::system::ParticleSystem;
use crate::engine::config::MethodKind;
use crate::engine::error::EngineError;
use nalgebra::{Point3, Vector3};
use tracing::{debug, instrument, warn};

/// Sums the dipole interaction over every unordered pair of dipolar particles,
/// using the minimum-image displacement and no further periodic replicas.
///
/// Forces (and torques, if the system rotates) are added to both partners of
/// each pair. Returns the energy, scaled by `prefactor`.
#[instrument(skip_all, name = "all_pairs_task")]
pub fn run(
    system: &mut ParticleSystem,
    geometry: &BoxGeometry,
    prefactor: f64,
    processes: usize,
    request: Request,
) -> Result<f64, EngineError> {
    if processes != 1 {
        return Err(EngineError::SingleProcessOnly {
            method: MethodKind::AllWithAllNoReplica,
            processes,
        });
    }
    if request.is_empty() {
        warn!("All-pairs evaluation requested with neither force nor energy; nothing to do.");
        return Ok(0.0);
    }

    let ids = system.dipolar_particle_ids();
    let snapshot: Vec<(Point3<f64>, Vector3<f64>)> = ids
        .iter()
        .filter_map(|&id| system.particle(id))
        .map(|p| (p.position, p.dipole()))
        .collect();

    let mode = KernelMode::new(request.force, system.rotation());
    let n = snapshot.len();
    let mut forces = vec![Vector3::zeros(); n];
    let mut torques = vec![Vector3::zeros(); n];
    let mut energy = 0.0;

    for i in 0..n {
        let (x1, m1) = &snapshot[i];
        for j in (i + 1)..n {
            let (x2, m2) = &snapshot[j];
            let r = geometry.minimum_image(x1, x2);
            let pair = dipole_dipole(m1, m2, &r, mode);

            energy += prefactor * pair.energy;

            if request.force {
                let f = pair.force * prefactor;
                forces[i] += f;
                forces[j] -= f;
                torques[i] += pair.torque1 * prefactor;
                torques[j] += pair.torque2 * prefactor;
            }
        }
    }

    if request.force {
        for (k, &id) in ids.iter().enumerate() {
            if let Some(particle) = system.particle_mut(id) {
                particle.force += forces[k];
                if mode == KernelMode::ForceAndTorque {
                    particle.torque += torques[k];
                }
            }
        }
    }

    debug!(pairs = n * n.saturating_sub(1) / 2, energy, "All-pairs summation finished.");
    Ok(energy)
}
