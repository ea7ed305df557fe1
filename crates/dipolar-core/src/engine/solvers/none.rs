use super::{DipolarSolver, Evaluation};
use crate::core::forcefield::term::{PressureContribution, PressureStatus};
use crate::engine::config::MethodKind;
use crate::engine::error::EngineError;

/// No dipolar interaction. Its single energy slot is left for an external field term.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInteraction;

impl DipolarSolver for NoInteraction {
    fn kind(&self) -> MethodKind {
        MethodKind::None
    }

    fn add_forces(&mut self, _eval: &mut Evaluation<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn add_energies(
        &mut self,
        _eval: &mut Evaluation<'_>,
        _terms: &mut [f64],
    ) -> Result<(), EngineError> {
        Ok(())
    }

    fn add_pressure(
        &mut self,
        _eval: &mut Evaluation<'_>,
        _pressure: &mut PressureContribution,
    ) -> Result<PressureStatus, EngineError> {
        Ok(PressureStatus::Complete)
    }
}
