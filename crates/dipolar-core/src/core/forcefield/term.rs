use nalgebra::Matrix3;
use std::ops::{Index, IndexMut};

/// Per-term dipolar energy breakdown.
///
/// The host sizes it with the active method's energy term count, zeroes it
/// before each evaluation and lets the method add into its slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergyTerms {
    terms: Vec<f64>,
}

impl EnergyTerms {
    pub fn new(len: usize) -> Self {
        Self {
            terms: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.terms
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.terms
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.terms.iter().sum()
    }

    pub fn reset(&mut self) {
        self.terms.iter_mut().for_each(|t| *t = 0.0);
    }
}

impl Index<usize> for EnergyTerms {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.terms[index]
    }
}

impl IndexMut<usize> for EnergyTerms {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.terms[index]
    }
}

impl From<EnergyTerms> for Vec<f64> {
    fn from(terms: EnergyTerms) -> Self {
        terms.terms
    }
}

/// Long-range contribution to the instantaneous pressure.
///
/// `virial` holds one scalar per dipolar virial term; `tensor` is the
/// symmetric pressure tensor block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PressureContribution {
    pub virial: Vec<f64>,
    pub tensor: Matrix3<f64>,
}

impl PressureContribution {
    pub fn new(virial_terms: usize) -> Self {
        Self {
            virial: vec![0.0; virial_terms],
            tensor: Matrix3::zeros(),
        }
    }

    /// Adds a scalar equally onto the three diagonal entries.
    pub fn add_isotropic(&mut self, scalar: f64) {
        for k in 0..3 {
            self.tensor[(k, k)] += scalar / 3.0;
        }
    }

    pub fn reset(&mut self) {
        self.virial.iter_mut().for_each(|v| *v = 0.0);
        self.tensor = Matrix3::zeros();
    }
}

/// Whether a pressure contribution is backed by a full stress formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureStatus {
    Complete,
    /// The method has no stress tensor formula; whatever it added is an
    /// approximation at best.
    Incomplete,
}
