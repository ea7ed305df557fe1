//! One capability object per dipolar method.
//!
//! The dispatcher owns exactly one boxed [`DipolarSolver`], built by [`build`]
//! from the tagged [`DipolarMethod`]. Hooks a method has no use for fall back to
//! the trait's defaults. Boundary-corrected methods are a base solver wrapped
//! in [`corrected::BoundaryCorrected`].

pub mod actor;
pub mod corrected;
pub mod direct;
pub mod external;
pub mod mesh;
pub mod none;

use super::collaborators::{Collaborators, SharedCorrection, SharedSolver, SolverError};
use super::comm::Payloads;
use super::config::{ConfigError, DipolarMethod, MethodKind};
use super::error::EngineError;
use super::virial::NptVirial;
use crate::core::forcefield::term::{PressureContribution, PressureStatus};
use crate::core::models::geometry::BoxGeometry;
use crate::core::models::system::ParticleSystem;
use tracing::warn;

/// Everything one force, energy or pressure evaluation reads and writes.
pub struct Evaluation<'a> {
    pub system: &'a mut ParticleSystem,
    pub geometry: &'a BoxGeometry,
    pub prefactor: f64,
    pub processes: usize,
    pub npt: &'a mut NptVirial,
}

impl<'a> Evaluation<'a> {
    pub fn new(
        system: &'a mut ParticleSystem,
        geometry: &'a BoxGeometry,
        prefactor: f64,
        processes: usize,
        npt: &'a mut NptVirial,
    ) -> Self {
        Self {
            system,
            geometry,
            prefactor,
            processes,
            npt,
        }
    }
}

pub trait DipolarSolver: Send {
    fn kind(&self) -> MethodKind;

    fn energy_term_count(&self) -> usize {
        self.kind().energy_term_count()
    }

    /// Prepares the solver for the current box and prefactor.
    fn initialize(&mut self, _geometry: &BoxGeometry, _prefactor: f64) -> Result<(), EngineError> {
        Ok(())
    }

    /// Adds long-range forces and torques to the particles.
    fn add_forces(&mut self, eval: &mut Evaluation<'_>) -> Result<(), EngineError>;

    /// Adds this method's energy contributions; `terms` has
    /// [`Self::energy_term_count`] slots.
    fn add_energies(
        &mut self,
        eval: &mut Evaluation<'_>,
        terms: &mut [f64],
    ) -> Result<(), EngineError>;

    fn add_pressure(
        &mut self,
        _eval: &mut Evaluation<'_>,
        _pressure: &mut PressureContribution,
    ) -> Result<PressureStatus, EngineError> {
        warn!(
            method = %self.kind(),
            "Pressure calculated, but the dipolar pressure of this method is not implemented."
        );
        Ok(PressureStatus::Incomplete)
    }

    fn on_box_change(&mut self, _geometry: &BoxGeometry) -> Result<(), EngineError> {
        Ok(())
    }

    /// Whether a change of coupling parameters requires a fresh `initialize`.
    fn reinitialize_on_coupling_change(&self) -> bool {
        false
    }

    fn on_observable_calc(&mut self, _system: &ParticleSystem) -> Result<(), EngineError> {
        Ok(())
    }

    fn sanity_check(&self, _geometry: &BoxGeometry) -> Result<bool, EngineError> {
        Ok(true)
    }

    /// Real-space cutoff the host's short-range loop must honour, if any.
    fn short_range_cutoff(&self) -> Result<Option<f64>, EngineError> {
        Ok(None)
    }

    fn parameter_payloads(&self) -> Result<Payloads, EngineError> {
        Ok(Payloads::default())
    }

    fn apply_parameter_payloads(&mut self, _payloads: &Payloads) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Builds the solver object for `method` from the available collaborators.
pub fn build(
    method: &DipolarMethod,
    collaborators: &Collaborators,
) -> Result<Box<dyn DipolarSolver>, ConfigError> {
    let kind = method.kind();
    let solver: Box<dyn DipolarSolver> = match method {
        DipolarMethod::None => Box::new(none::NoInteraction),
        DipolarMethod::AllWithAllNoReplica => Box::new(direct::AllPairs),
        DipolarMethod::DirectSum { replica_cutoff } => {
            Box::new(direct::DirectSum::new(*replica_cutoff))
        }
        DipolarMethod::MeshEwald => Box::new(mesh::MeshEwald::new(require_mesh(
            collaborators,
            kind,
        )?)),
        DipolarMethod::MeshEwaldWithBoundaryCorrection => {
            Box::new(corrected::BoundaryCorrected::new(
                mesh::MeshEwald::new(require_mesh(collaborators, kind)?),
                require_correction(collaborators, kind)?,
            ))
        }
        DipolarMethod::DirectSumWithBoundaryCorrection { replica_cutoff } => {
            Box::new(corrected::BoundaryCorrected::new(
                direct::DirectSum::new(*replica_cutoff),
                require_correction(collaborators, kind)?,
            ))
        }
        DipolarMethod::GpuDirectSum | DipolarMethod::GpuBarnesHut => {
            if !collaborators.gpu_actors {
                return Err(ConfigError::MethodUnavailable {
                    method: kind,
                    reason: "no GPU actor support registered",
                });
            }
            Box::new(actor::GpuActor::new(kind))
        }
        DipolarMethod::ExternalSolver => {
            let solver = collaborators
                .external
                .clone()
                .ok_or(ConfigError::MethodUnavailable {
                    method: kind,
                    reason: "no external long-range solver registered",
                })?;
            Box::new(external::ExternalLibrary::new(solver))
        }
    };
    Ok(solver)
}

pub(crate) fn solver_error(name: &str, source: SolverError) -> EngineError {
    EngineError::Solver {
        solver: name.to_string(),
        source,
    }
}

fn require_mesh(collaborators: &Collaborators, kind: MethodKind) -> Result<SharedSolver, ConfigError> {
    collaborators
        .mesh
        .clone()
        .ok_or(ConfigError::MethodUnavailable {
            method: kind,
            reason: "no mesh Ewald solver registered",
        })
}

fn require_correction(
    collaborators: &Collaborators,
    kind: MethodKind,
) -> Result<SharedCorrection, ConfigError> {
    collaborators
        .boundary_correction
        .clone()
        .ok_or(ConfigError::MethodUnavailable {
            method: kind,
            reason: "no boundary correction registered",
        })
}
