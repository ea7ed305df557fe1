use nalgebra::Vector3;

/// Which parts of the pair interaction the caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelMode {
    EnergyOnly,
    Force,
    ForceAndTorque,
}

impl KernelMode {
    pub fn new(with_force: bool, with_torque: bool) -> Self {
        match (with_force, with_torque) {
            (false, _) => Self::EnergyOnly,
            (true, false) => Self::Force,
            (true, true) => Self::ForceAndTorque,
        }
    }

    #[inline]
    pub fn force(self) -> bool {
        !matches!(self, Self::EnergyOnly)
    }

    #[inline]
    pub fn torque(self) -> bool {
        matches!(self, Self::ForceAndTorque)
    }
}

/// Result of one dipole pair evaluation, without the coupling prefactor.
///
/// `force` acts on the first dipole; the second receives exactly `-force`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairInteraction {
    pub energy: f64,
    pub force: Vector3<f64>,
    pub torque1: Vector3<f64>,
    pub torque2: Vector3<f64>,
}

#[inline]
pub fn dipole_dipole_energy(m1: &Vector3<f64>, m2: &Vector3<f64>, r: &Vector3<f64>) -> f64 {
    dipole_dipole(m1, m2, r, KernelMode::EnergyOnly).energy
}

/// Dipole-dipole interaction of `m1` and `m2` separated by `r = x1 - x2`.
///
/// `r` must be non-zero; callers exclude the self-image before calling.
#[inline]
pub fn dipole_dipole(
    m1: &Vector3<f64>,
    m2: &Vector3<f64>,
    r: &Vector3<f64>,
    mode: KernelMode,
) -> PairInteraction {
    let r2 = r.norm_squared();
    let dist = r2.sqrt();
    let r3 = r2 * dist;
    let r5 = r3 * r2;
    let r7 = r5 * r2;

    let pe1 = m1.dot(m2);
    let pe2 = m1.dot(r);
    let pe3 = m2.dot(r);
    let pe4 = 3.0 / r5;

    let mut result = PairInteraction {
        energy: pe1 / r3 - pe4 * pe2 * pe3,
        ..Default::default()
    };

    if !mode.force() {
        return result;
    }

    let ab = pe4 * pe1 - 15.0 * pe2 * pe3 / r7;
    let c = pe4 * pe3;
    let d = pe4 * pe2;
    result.force = r * ab + m1 * c + m2 * d;

    if mode.torque() {
        let a = m1.cross(m2);
        result.torque1 = -a / r3 + m1.cross(r) * c;
        result.torque2 = a / r3 + m2.cross(r) * d;
    }

    result
}
