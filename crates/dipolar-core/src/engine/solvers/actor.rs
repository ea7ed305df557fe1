use super::{DipolarSolver, Evaluation};
use crate::engine::config::MethodKind;
use crate::engine::error::EngineError;
use tracing::trace;

/// A GPU-resident method that applies its own forces outside this layer.
///
/// Force and energy evaluation are deliberate no-ops here; doing anything
/// would count the actor's contribution twice.
#[derive(Debug, Clone, Copy)]
pub struct GpuActor {
    kind: MethodKind,
}

impl GpuActor {
    pub fn new(kind: MethodKind) -> Self {
        Self { kind }
    }
}

impl DipolarSolver for GpuActor {
    fn kind(&self) -> MethodKind {
        self.kind
    }

    fn add_forces(&mut self, _eval: &mut Evaluation<'_>) -> Result<(), EngineError> {
        trace!(method = %self.kind, "Forces are applied by the GPU actor.");
        Ok(())
    }

    fn add_energies(
        &mut self,
        _eval: &mut Evaluation<'_>,
        _terms: &mut [f64],
    ) -> Result<(), EngineError> {
        trace!(method = %self.kind, "Energy is reported by the GPU actor.");
        Ok(())
    }
}
