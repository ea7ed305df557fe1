use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// The host's integration scheme, as far as dipolar coupling cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Integrator {
    #[default]
    VelocityVerlet,
    /// Isotropic constant-pressure integration driven by a piston.
    NptIsotropic,
}

/// Running virial that drives the barostat piston during isotropic NPT.
///
/// Pair force evaluations add `force[axis] * displacement[axis]`; the host
/// resets it once per step before forces are computed. Outside NPT every
/// contribution is ignored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NptVirial {
    integrator: Integrator,
    p_vir: Vector3<f64>,
}

impl NptVirial {
    pub fn new(integrator: Integrator) -> Self {
        Self {
            integrator,
            p_vir: Vector3::zeros(),
        }
    }

    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    pub fn set_integrator(&mut self, integrator: Integrator) {
        self.integrator = integrator;
    }

    pub fn is_active(&self) -> bool {
        self.integrator == Integrator::NptIsotropic
    }

    pub fn reset(&mut self) {
        self.p_vir = Vector3::zeros();
    }

    pub fn add_contribution(&mut self, force: &Vector3<f64>, displacement: &Vector3<f64>) {
        if self.is_active() {
            self.p_vir += force.component_mul(displacement);
        }
    }

    /// Adds a long-range energy onto the first virial component.
    pub fn add_long_range_energy(&mut self, energy: f64) {
        if self.is_active() {
            self.p_vir.x += energy;
        }
    }

    pub fn p_vir(&self) -> &Vector3<f64> {
        &self.p_vir
    }
}
