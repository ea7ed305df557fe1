use super::ids::ParticleId;
use super::particle::Particle;
use nalgebra::Vector3;
use slotmap::SlotMap;

/// The particle store the dipolar engines operate on.
///
/// Iteration follows slot order, which is insertion order as long as no
/// particle has been removed. Every engine walks particles in this order, so
/// pair enumeration and floating-point summation order are reproducible.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    /// Primary storage using a slot map for stable IDs.
    particles: SlotMap<ParticleId, Particle>,
    /// Whether rotational degrees of freedom are integrated, i.e. whether
    /// engines must accumulate torques.
    rotation: bool,
}

impl ParticleSystem {
    /// Creates an empty system with rotation enabled.
    pub fn new() -> Self {
        Self {
            particles: SlotMap::with_key(),
            rotation: true,
        }
    }

    pub fn rotation(&self) -> bool {
        self.rotation
    }

    pub fn set_rotation(&mut self, enabled: bool) {
        self.rotation = enabled;
    }

    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.insert(particle)
    }

    pub fn remove_particle(&mut self, id: ParticleId) -> Option<Particle> {
        self.particles.remove(id)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Returns an iterator over all particles in slot order.
    pub fn particles_iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.particles.iter()
    }

    pub fn particles_iter_mut(&mut self) -> impl Iterator<Item = (ParticleId, &mut Particle)> {
        self.particles.iter_mut()
    }

    /// IDs of every particle with a non-zero dipole magnitude, in slot order.
    pub fn dipolar_particle_ids(&self) -> Vec<ParticleId> {
        self.particles
            .iter()
            .filter(|(_, p)| p.has_dipole())
            .map(|(id, _)| id)
            .collect()
    }

    /// Zeroes the force and torque accumulators of every particle.
    pub fn clear_accumulators(&mut self) {
        for (_, particle) in self.particles.iter_mut() {
            particle.clear_accumulators();
        }
    }

    /// Sum of all force accumulators.
    pub fn net_force(&self) -> Vector3<f64> {
        self.particles
            .values()
            .fold(Vector3::zeros(), |acc, p| acc + p.force)
    }

    /// Sum of all torque accumulators.
    pub fn net_torque(&self) -> Vector3<f64> {
        self.particles
            .values()
            .fold(Vector3::zeros(), |acc, p| acc + p.torque)
    }

    /// Total dipole moment of the given particles. Unknown IDs are skipped.
    pub fn total_dipole_moment(&self, ids: &[ParticleId]) -> Vector3<f64> {
        ids.iter()
            .filter_map(|&id| self.particles.get(id))
            .fold(Vector3::zeros(), |acc, p| acc + p.dipole())
    }
}
