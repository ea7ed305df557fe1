//! The two dipolar summation engines that run inside this crate.
//!
//! Both need every dipolar particle in one local array, so they only run when
//! the simulation is driven by a single process. Each `run` function checks the
//! process count on every call.

pub mod all_pairs;
pub mod direct_sum;

/// Which results an evaluation must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub force: bool,
    pub energy: bool,
}

impl Request {
    pub const FORCE: Self = Self {
        force: true,
        energy: false,
    };
    pub const ENERGY: Self = Self {
        force: false,
        energy: true,
    };
    pub const FORCE_AND_ENERGY: Self = Self {
        force: true,
        energy: true,
    };
    pub const NOTHING: Self = Self {
        force: false,
        energy: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.force && !self.energy
    }
}
