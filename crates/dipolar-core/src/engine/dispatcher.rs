use super::collaborators::Collaborators;
use super::comm::{Communicator, ParameterBlock, ROOT, SingleProcess};
use super::config::{
    DipolarMethod, DipoleConfiguration, MethodKind, ReplicaCutoff, validate_prefactor,
};
use super::error::EngineError;
use super::solvers::{self, DipolarSolver, Evaluation};
use super::virial::{Integrator, NptVirial};
use crate::core::forcefield::term::{EnergyTerms, PressureContribution, PressureStatus};
use crate::core::models::geometry::BoxGeometry;
use crate::core::models::system::ParticleSystem;
use tracing::{debug, info, instrument, warn};

/// Owns the dipolar configuration and routes every host request to the one
/// solver built for the active method.
///
/// Configuration calls take `&mut self`, so they can never overlap an
/// evaluation. Solver initialization is deferred to the first evaluation after
/// a configuration change, when the box geometry is known.
pub struct DipolarDispatcher<C: Communicator = SingleProcess> {
    config: DipoleConfiguration,
    solver: Box<dyn DipolarSolver>,
    collaborators: Collaborators,
    comm: C,
    npt: NptVirial,
    initialized: bool,
}

impl DipolarDispatcher<SingleProcess> {
    /// A single-process dispatcher with no external collaborators and method `None`.
    pub fn new() -> Self {
        Self::with_communicator(SingleProcess, Collaborators::default())
    }

    pub fn with_collaborators(collaborators: Collaborators) -> Self {
        Self::with_communicator(SingleProcess, collaborators)
    }
}

impl Default for DipolarDispatcher<SingleProcess> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Communicator> DipolarDispatcher<C> {
    pub fn with_communicator(comm: C, collaborators: Collaborators) -> Self {
        Self {
            config: DipoleConfiguration::default(),
            solver: Box::new(solvers::none::NoInteraction),
            collaborators,
            comm,
            npt: NptVirial::default(),
            initialized: false,
        }
    }

    pub fn config(&self) -> &DipoleConfiguration {
        &self.config
    }

    pub fn kind(&self) -> MethodKind {
        self.solver.kind()
    }

    pub fn processes(&self) -> usize {
        self.comm.size()
    }

    pub fn npt_virial(&self) -> &NptVirial {
        &self.npt
    }

    pub fn npt_virial_mut(&mut self) -> &mut NptVirial {
        &mut self.npt
    }

    // --- Configuration ---

    /// Sets the coupling prefactor. A negative or NaN value is rejected and the
    /// previous value kept.
    pub fn set_prefactor(&mut self, prefactor: f64) -> Result<(), EngineError> {
        self.config.set_prefactor(prefactor)?;
        self.initialized = false;
        info!(prefactor, "Dipolar prefactor set.");
        self.broadcast_parameters()
    }

    /// Selects a method, building its solver from the registered collaborators.
    ///
    /// On error the previous method stays active.
    pub fn set_method(&mut self, method: DipolarMethod) -> Result<(), EngineError> {
        let solver = solvers::build(&method, &self.collaborators)?;
        if method.replica_cutoff() == Some(ReplicaCutoff::ZERO) {
            warn!(
                "Careful: the number of extra replicas to take into account during the direct sum calculation is zero."
            );
        }
        info!(method = %method.kind(), "Dipolar method set.");
        self.install(method, solver);
        self.broadcast_parameters()
    }

    /// Selects a method by its integer code, as hosts without the typed API do.
    pub fn set_method_code(&mut self, code: i32, replica_cutoff: i64) -> Result<(), EngineError> {
        let kind = MethodKind::from_code(code).ok_or(EngineError::UnknownMethod(code))?;
        let cutoff = ReplicaCutoff::try_from(replica_cutoff)?;
        self.set_method(DipolarMethod::from_kind(kind, cutoff))
    }

    /// Switches the active method to its boundary-corrected variant.
    pub fn enable_boundary_correction(&mut self) -> Result<(), EngineError> {
        let method = self.config.method().with_boundary_correction()?;
        self.set_method(method)
    }

    fn install(&mut self, method: DipolarMethod, solver: Box<dyn DipolarSolver>) {
        self.config.set_method(method);
        self.solver = solver;
        self.initialized = false;
    }

    // --- Evaluation ---

    fn ensure_initialized(&mut self, geometry: &BoxGeometry) -> Result<(), EngineError> {
        if !self.initialized {
            self.solver.initialize(geometry, self.config.prefactor())?;
            self.initialized = true;
            debug!(method = %self.kind(), "Dipolar solver initialized.");
        }
        Ok(())
    }

    /// Adds the long-range dipolar forces (and torques) to the particles.
    #[instrument(skip_all, fields(method = %self.kind()))]
    pub fn compute_forces(
        &mut self,
        system: &mut ParticleSystem,
        geometry: &BoxGeometry,
    ) -> Result<(), EngineError> {
        self.ensure_initialized(geometry)?;
        let mut eval = Evaluation::new(
            system,
            geometry,
            self.config.prefactor(),
            self.comm.size(),
            &mut self.npt,
        );
        self.solver.add_forces(&mut eval)
    }

    /// Adds the dipolar energy contributions into `terms`, which the caller
    /// sized with [`Self::energy_term_count`] and zeroed.
    #[instrument(skip_all, fields(method = %self.kind()))]
    pub fn compute_energy(
        &mut self,
        system: &mut ParticleSystem,
        geometry: &BoxGeometry,
        terms: &mut EnergyTerms,
    ) -> Result<(), EngineError> {
        let expected = self.energy_term_count();
        if terms.len() != expected {
            return Err(EngineError::Internal(format!(
                "energy array has {} slots, method '{}' reports {}",
                terms.len(),
                self.kind(),
                expected
            )));
        }
        self.ensure_initialized(geometry)?;
        let mut eval = Evaluation::new(
            system,
            geometry,
            self.config.prefactor(),
            self.comm.size(),
            &mut self.npt,
        );
        self.solver.add_energies(&mut eval, terms.as_mut_slice())
    }

    /// Evaluates the per-term dipolar energy into a fresh array.
    pub fn long_range_energy(
        &mut self,
        system: &mut ParticleSystem,
        geometry: &BoxGeometry,
    ) -> Result<EnergyTerms, EngineError> {
        let mut terms = EnergyTerms::new(self.energy_term_count());
        self.compute_energy(system, geometry, &mut terms)?;
        Ok(terms)
    }

    /// Adds the dipolar contribution to the host's virial and pressure tensor.
    ///
    /// `Incomplete` means the method has no full stress formula; a warning has
    /// been logged and callers must not treat the tensor as exact.
    #[instrument(skip_all, fields(method = %self.kind()))]
    pub fn contribute_to_pressure(
        &mut self,
        system: &mut ParticleSystem,
        geometry: &BoxGeometry,
        pressure: &mut PressureContribution,
    ) -> Result<PressureStatus, EngineError> {
        let expected = self.virial_term_count();
        if pressure.virial.len() != expected {
            return Err(EngineError::Internal(format!(
                "virial array has {} slots, method '{}' reports {}",
                pressure.virial.len(),
                self.kind(),
                expected
            )));
        }
        self.ensure_initialized(geometry)?;
        let mut eval = Evaluation::new(
            system,
            geometry,
            self.config.prefactor(),
            self.comm.size(),
            &mut self.npt,
        );
        self.solver.add_pressure(&mut eval, pressure)
    }

    pub fn energy_term_count(&self) -> usize {
        self.solver.energy_term_count()
    }

    pub fn virial_term_count(&self) -> usize {
        self.kind().virial_term_count()
    }

    /// Real-space cutoff the host must cover for the active method.
    pub fn short_range_cutoff(&self) -> Result<Option<f64>, EngineError> {
        self.solver.short_range_cutoff()
    }

    // --- Lifecycle hooks ---

    pub fn on_box_length_changed(&mut self, geometry: &BoxGeometry) -> Result<(), EngineError> {
        if self.initialized {
            self.solver.on_box_change(geometry)?;
        }
        Ok(())
    }

    pub fn on_coupling_changed(&mut self, geometry: &BoxGeometry) -> Result<(), EngineError> {
        if self.solver.reinitialize_on_coupling_change() {
            self.solver.initialize(geometry, self.config.prefactor())?;
            self.initialized = true;
        }
        Ok(())
    }

    /// Checks the method against the host's integrator and zeroes the barostat virial.
    pub fn on_integrator_start(&mut self, integrator: Integrator) -> Result<(), EngineError> {
        let method = self.kind();
        if integrator == Integrator::NptIsotropic && !method.supports_isotropic_npt() {
            return Err(EngineError::IncompatibleIntegrator { method });
        }
        self.npt.set_integrator(integrator);
        self.npt.reset();
        Ok(())
    }

    /// Zeroes the barostat virial before the step's force evaluation.
    pub fn on_integrator_pre_step(&mut self) {
        self.npt.reset();
    }

    pub fn on_observable_calc(&mut self, system: &ParticleSystem) -> Result<(), EngineError> {
        self.solver.on_observable_calc(system)
    }

    pub fn run_sanity_checks(&self, geometry: &BoxGeometry) -> Result<(), EngineError> {
        if self.solver.sanity_check(geometry)? {
            Ok(())
        } else {
            Err(EngineError::SanityCheck { method: self.kind() })
        }
    }

    // --- Parameter broadcast ---

    /// Synchronizes the dipolar state of every process with the root's.
    ///
    /// Collective: every process must call it. The root sends its parameter
    /// block even for methods with nothing to share; the others replace their
    /// state with the received block.
    pub fn broadcast_parameters(&mut self) -> Result<(), EngineError> {
        let mut buffer = if self.comm.is_root() {
            ParameterBlock {
                prefactor: self.config.prefactor(),
                payloads: self.solver.parameter_payloads()?,
                method: self.config.method().clone(),
            }
            .encode()?
        } else {
            Vec::new()
        };

        self.comm.broadcast(&mut buffer, ROOT)?;

        if !self.comm.is_root() {
            let block = ParameterBlock::decode(&buffer)?;
            self.apply_parameter_block(block)?;
        }
        debug!(
            rank = self.comm.rank(),
            bytes = buffer.len(),
            "Dipolar parameters broadcast."
        );
        Ok(())
    }

    fn apply_parameter_block(&mut self, block: ParameterBlock) -> Result<(), EngineError> {
        let prefactor = validate_prefactor(block.prefactor)?;
        let mut solver = solvers::build(&block.method, &self.collaborators)?;
        solver.apply_parameter_payloads(&block.payloads)?;
        self.config.set_prefactor(prefactor)?;
        self.install(block.method, solver);
        Ok(())
    }
}
