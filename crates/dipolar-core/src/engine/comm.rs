use super::config::DipolarMethod;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rank of the process that coordinates configuration and initiates broadcasts.
pub const ROOT: usize = 0;

#[derive(Debug, Error)]
pub enum CommError {
    #[error("Broadcast from rank {root} failed: {message}")]
    Broadcast { root: usize, message: String },

    #[error("Failed to decode parameter block: {0}")]
    Decode(String),

    #[error("Failed to encode parameter block: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Process topology and the blocking collective broadcast.
///
/// `broadcast` is collective: every process calls it with the same `root`; on
/// return every process holds the root's buffer. It is the only point where
/// processes synchronize.
pub trait Communicator: Send {
    fn size(&self) -> usize;

    fn rank(&self) -> usize;

    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    fn broadcast(&self, buffer: &mut Vec<u8>, root: usize) -> Result<(), CommError>;
}

/// The trivial topology of a simulation run by one process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn size(&self) -> usize {
        1
    }

    fn rank(&self) -> usize {
        ROOT
    }

    fn broadcast(&self, _buffer: &mut Vec<u8>, root: usize) -> Result<(), CommError> {
        if root != ROOT {
            return Err(CommError::Broadcast {
                root,
                message: "single-process run has no such rank".to_string(),
            });
        }
        Ok(())
    }
}

/// Opaque solver state that travels with the parameter block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Payloads {
    #[serde(default)]
    pub solver: Vec<u8>,
    #[serde(default)]
    pub correction: Vec<u8>,
}

impl Payloads {
    pub fn is_empty(&self) -> bool {
        self.solver.is_empty() && self.correction.is_empty()
    }
}

/// Everything a non-root process needs to mirror the root's dipolar state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBlock {
    pub prefactor: f64,
    // Tables after plain values, as TOML requires.
    pub payloads: Payloads,
    pub method: DipolarMethod,
}

impl ParameterBlock {
    pub fn encode(&self) -> Result<Vec<u8>, CommError> {
        Ok(toml::to_string(self)?.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CommError> {
        let text = std::str::from_utf8(bytes).map_err(|e| CommError::Decode(e.to_string()))?;
        toml::from_str(text).map_err(|e| CommError::Decode(e.to_string()))
    }
}
