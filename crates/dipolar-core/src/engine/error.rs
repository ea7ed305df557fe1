use thiserror::Error;

use super::collaborators::SolverError;
use super::comm::CommError;
use super::config::{ConfigError, MethodKind};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Dipolar method '{method}' runs on a single process only, but {processes} processes are running")]
    SingleProcessOnly { method: MethodKind, processes: usize },

    #[error("Unknown dipolar method code {0}")]
    UnknownMethod(i32),

    #[error("Isotropic NPT integration does not work with dipolar method '{method}', please use mesh Ewald")]
    IncompatibleIntegrator { method: MethodKind },

    #[error("Parameter broadcast failed: {0}")]
    Communication(#[from] CommError),

    #[error("Long-range solver '{solver}' failed: {source}")]
    Solver {
        solver: String,
        #[source]
        source: SolverError,
    },

    #[error("Sanity checks failed for dipolar method '{method}'")]
    SanityCheck { method: MethodKind },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether the error must terminate the simulation run.
    ///
    /// Configuration errors and failed sanity checks leave the previous state
    /// intact and may be reported back to the user; everything else means the
    /// trajectory can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::SanityCheck { .. })
    }
}
