use nalgebra::{Point3, Vector3};

/// A point particle carrying a magnetic dipole moment.
///
/// The dipole vector is stored as a magnitude (`dipm`) and a unit orientation,
/// the way rigid-body integrators keep it. Engines read `position` and
/// [`Particle::dipole`] and add into `force` and `torque`; they never overwrite them.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Unfolded position in simulation length units.
    pub position: Point3<f64>,
    /// Magnitude of the dipole moment. Zero means the particle is not magnetic.
    pub dipm: f64,
    /// Unit vector along the dipole moment.
    pub orientation: Vector3<f64>,
    /// Force accumulator.
    pub force: Vector3<f64>,
    /// Torque accumulator, only written when rotation is enabled on the system.
    pub torque: Vector3<f64>,
}

impl Particle {
    /// Creates a particle at rest with zeroed accumulators.
    ///
    /// The orientation is normalized; a zero orientation vector yields a
    /// zero dipole regardless of `dipm`.
    pub fn new(position: Point3<f64>, dipm: f64, orientation: Vector3<f64>) -> Self {
        let orientation = orientation.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
        Self {
            position,
            dipm,
            orientation,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    /// Creates a particle from a full dipole vector.
    pub fn with_dipole(position: Point3<f64>, dipole: Vector3<f64>) -> Self {
        Self::new(position, dipole.norm(), dipole)
    }

    /// The dipole moment vector `dipm * orientation`.
    #[inline]
    pub fn dipole(&self) -> Vector3<f64> {
        self.orientation * self.dipm
    }

    #[inline]
    pub fn has_dipole(&self) -> bool {
        self.dipm != 0.0
    }

    pub fn clear_accumulators(&mut self) {
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }
}
