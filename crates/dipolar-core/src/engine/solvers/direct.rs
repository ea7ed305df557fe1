use super::{DipolarSolver, Evaluation};
use crate::engine::config::{MethodKind, ReplicaCutoff};
use crate::engine::error::EngineError;
use crate::engine::tasks::{Request, all_pairs, direct_sum};

/// All pairs once, minimum image, no replicas.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPairs;

impl DipolarSolver for AllPairs {
    fn kind(&self) -> MethodKind {
        MethodKind::AllWithAllNoReplica
    }

    fn add_forces(&mut self, eval: &mut Evaluation<'_>) -> Result<(), EngineError> {
        all_pairs::run(
            eval.system,
            eval.geometry,
            eval.prefactor,
            eval.processes,
            Request::FORCE,
        )?;
        Ok(())
    }

    fn add_energies(
        &mut self,
        eval: &mut Evaluation<'_>,
        terms: &mut [f64],
    ) -> Result<(), EngineError> {
        terms[0] += all_pairs::run(
            eval.system,
            eval.geometry,
            eval.prefactor,
            eval.processes,
            Request::ENERGY,
        )?;
        Ok(())
    }
}

/// Periodic direct summation over a sphere of box replicas.
///
/// Geometry is re-read on every call, so box changes need no notification.
#[derive(Debug, Clone, Copy)]
pub struct DirectSum {
    replica_cutoff: ReplicaCutoff,
}

impl DirectSum {
    pub fn new(replica_cutoff: ReplicaCutoff) -> Self {
        Self { replica_cutoff }
    }

    pub fn replica_cutoff(&self) -> ReplicaCutoff {
        self.replica_cutoff
    }
}

impl DipolarSolver for DirectSum {
    fn kind(&self) -> MethodKind {
        MethodKind::DirectSum
    }

    fn add_forces(&mut self, eval: &mut Evaluation<'_>) -> Result<(), EngineError> {
        direct_sum::run(
            eval.system,
            eval.geometry,
            eval.prefactor,
            eval.processes,
            self.replica_cutoff,
            Request::FORCE,
        )?;
        Ok(())
    }

    fn add_energies(
        &mut self,
        eval: &mut Evaluation<'_>,
        terms: &mut [f64],
    ) -> Result<(), EngineError> {
        terms[0] += direct_sum::run(
            eval.system,
            eval.geometry,
            eval.prefactor,
            eval.processes,
            self.replica_cutoff,
            Request::ENERGY,
        )?;
        Ok(())
    }
}
