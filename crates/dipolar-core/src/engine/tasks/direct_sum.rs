use super::Request;
use crate::core::forcefield::potentials::KernelMode;
use crate::core::models::geometry::BoxGeometry;
use crate::core::models::system::ParticleSystem;
use crate::engine::config::{MethodKind, ReplicaCutoff};
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use tracing::{debug, instrument, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Replica offsets `(n_x, n_y, n_z)` inside the sphere `|n|² <= Ncut²`.
///
/// Non-periodic axes only ever get `0`. The sphere radius stays `Ncut` even
/// when some axes are clamped. Offsets are ordered by `n_x`, then `n_y`, then
/// `n_z`, each ascending; this is the summation order of the engine.
pub fn replica_offsets(cutoff: ReplicaCutoff, periodic: [bool; 3]) -> Vec<Vector3<i32>> {
    let n = cutoff.get() as i32;
    let bound = |axis: usize| if periodic[axis] { n } else { 0 };
    let (bx, by, bz) = (bound(0), bound(1), bound(2));
    let n2 = n * n;

    let mut offsets = Vec::new();
    for nx in -bx..=bx {
        for ny in -by..=by {
            for nz in -bz..=bz {
                if nx * nx + ny * ny + nz * nz <= n2 {
                    offsets.push(Vector3::new(nx, ny, nz));
                }
            }
        }
    }
    offsets
}

/// Prefactor-free sums for one particle of the working set.
#[derive(Debug, Clone, Copy)]
struct RowSum {
    energy: f64,
    force: Vector3<f64>,
    torque: Vector3<f64>,
}

struct WorkingSet {
    positions: Vec<Vector3<f64>>,
    moments: Vec<Vector3<f64>>,
}

/// One image shift `n · L`; `origin` marks `n = 0`.
struct Image {
    shift: Vector3<f64>,
    origin: bool,
}

/// Accumulates every `(i, j, n)` term of row `i`, in `j`-then-image order.
///
/// The pair terms are evaluated inline for particle `i` only; the partner's
/// reaction is picked up when its own row is summed.
fn accumulate_row(i: usize, set: &WorkingSet, images: &[Image], mode: KernelMode) -> RowSum {
    let mut row = RowSum {
        energy: 0.0,
        force: Vector3::zeros(),
        torque: Vector3::zeros(),
    };
    let xi = &set.positions[i];
    let mi = &set.moments[i];

    for (j, (xj, mj)) in set.positions.iter().zip(&set.moments).enumerate() {
        let pe1 = mi.dot(mj);
        let mi_x_mj = mi.cross(mj);
        let r = xi - xj;

        for image in images {
            if i == j && image.origin {
                continue;
            }
            let rn = r + image.shift;
            let r2 = rn.norm_squared();
            let dist = r2.sqrt();
            let r3 = r2 * dist;
            let r5 = r3 * r2;
            let r7 = r5 * r2;

            let pe2 = mi.dot(&rn);
            let pe3 = mj.dot(&rn);

            row.energy += pe1 / r3 - 3.0 * pe2 * pe3 / r5;

            if !mode.force() {
                continue;
            }
            let a = 3.0 * pe1 / r5;
            let b = -15.0 * pe2 * pe3 / r7;
            let c = 3.0 * pe3 / r5;
            let d = 3.0 * pe2 / r5;
            row.force += rn * (a + b) + mi * c + mj * d;

            if mode.torque() {
                row.torque += -mi_x_mj / r3 + mi.cross(&rn) * (3.0 / r5 * pe3);
            }
        }
    }
    row
}

/// Direct summation of the dipole interaction over periodic replicas.
///
/// Positions are folded into the primary box. Every ordered pair `(i, j)`,
/// including `i == j`, is summed over the replica offsets of
/// [`replica_offsets`], skipping only the particle's own origin image. Each
/// particle accumulates force and torque for itself only; the sums are scaled
/// by `prefactor` once when scattered back. Returns `0.5 · prefactor · Σu`.
///
/// Rows are independent and, with the `parallel` feature, evaluated on the
/// rayon pool. They are merged in particle order either way, so the result
/// does not depend on the thread count.
#[instrument(skip_all, name = "direct_sum_task")]
pub fn run(
    system: &mut ParticleSystem,
    geometry: &BoxGeometry,
    prefactor: f64,
    processes: usize,
    cutoff: ReplicaCutoff,
    request: Request,
) -> Result<f64, EngineError> {
    if processes != 1 {
        return Err(EngineError::SingleProcessOnly {
            method: MethodKind::DirectSum,
            processes,
        });
    }
    if request.is_empty() {
        warn!("Direct-sum evaluation requested with neither force nor energy; nothing to do.");
        return Ok(0.0);
    }

    let ids = system.dipolar_particle_ids();
    let mut set = WorkingSet {
        positions: Vec::with_capacity(ids.len()),
        moments: Vec::with_capacity(ids.len()),
    };
    for particle in ids.iter().filter_map(|&id| system.particle(id)) {
        set.positions
            .push(geometry.fold_position(&particle.position).coords);
        set.moments.push(particle.dipole());
    }

    let length = geometry.length();
    let images: Vec<Image> = replica_offsets(cutoff, geometry.periodicity())
        .into_iter()
        .map(|n| Image {
            shift: Vector3::new(
                f64::from(n.x) * length.x,
                f64::from(n.y) * length.y,
                f64::from(n.z) * length.z,
            ),
            origin: n == Vector3::zeros(),
        })
        .collect();
    trace!(
        particles = ids.len(),
        images = images.len(),
        "Direct-sum working set collected."
    );

    let mode = KernelMode::new(request.force, system.rotation());

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<RowSum> = (0..ids.len())
        .map(|i| accumulate_row(i, &set, &images, mode))
        .collect();

    #[cfg(feature = "parallel")]
    let rows: Vec<RowSum> = (0..ids.len())
        .into_par_iter()
        .map(|i| accumulate_row(i, &set, &images, mode))
        .collect();

    let energy_sum: f64 = rows.iter().map(|row| row.energy).sum();

    if request.force {
        for (row, &id) in rows.iter().zip(&ids) {
            if let Some(particle) = system.particle_mut(id) {
                particle.force += row.force * prefactor;
                if mode == KernelMode::ForceAndTorque {
                    particle.torque += row.torque * prefactor;
                }
            }
        }
    }

    let energy = 0.5 * prefactor * energy_sum;
    debug!(
        particles = ids.len(),
        images = images.len(),
        energy,
        "Direct summation finished."
    );
    Ok(energy)
}
