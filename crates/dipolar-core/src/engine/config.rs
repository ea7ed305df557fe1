use super::virial::Integrator;
use crate::core::models::geometry::BoxGeometry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest replica cutoff accepted; keeps `n_x² + n_y² + n_z²` inside `i32`.
pub const MAX_REPLICA_CUTOFF: u32 = 26_000;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Dipolar prefactor has to be >= 0 (got {0})")]
    InvalidPrefactor(f64),

    #[error("Replica cutoff has to be >= 0 (got {0})")]
    NegativeReplicaCutoff(i64),

    #[error("Replica cutoff {0} exceeds the supported maximum of {MAX_REPLICA_CUTOFF}")]
    ReplicaCutoffOutOfRange(i64),

    #[error("Unknown dipolar method name: '{0}'")]
    UnknownMethodName(String),

    #[error("Dipolar method '{method}' is not available: {reason}")]
    MethodUnavailable {
        method: MethodKind,
        reason: &'static str,
    },

    #[error("Dipolar method '{0}' has no boundary-corrected variant")]
    NoBoundaryCorrectedVariant(MethodKind),
}

/// The closed set of long-range dipolar methods.
///
/// Integer codes are stable and used when a host hands the method over as a
/// raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MethodKind {
    None,
    AllWithAllNoReplica,
    DirectSum,
    MeshEwald,
    MeshEwaldWithBoundaryCorrection,
    DirectSumWithBoundaryCorrection,
    GpuDirectSum,
    GpuBarnesHut,
    ExternalSolver,
}

impl MethodKind {
    pub const ALL: [MethodKind; 9] = [
        Self::None,
        Self::AllWithAllNoReplica,
        Self::DirectSum,
        Self::MeshEwald,
        Self::MeshEwaldWithBoundaryCorrection,
        Self::DirectSumWithBoundaryCorrection,
        Self::GpuDirectSum,
        Self::GpuBarnesHut,
        Self::ExternalSolver,
    ];

    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::AllWithAllNoReplica => 1,
            Self::DirectSum => 2,
            Self::MeshEwald => 3,
            Self::MeshEwaldWithBoundaryCorrection => 4,
            Self::DirectSumWithBoundaryCorrection => 5,
            Self::GpuDirectSum => 6,
            Self::GpuBarnesHut => 7,
            Self::ExternalSolver => 8,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AllWithAllNoReplica => "all-with-all-no-replica",
            Self::DirectSum => "direct-sum",
            Self::MeshEwald => "mesh-ewald",
            Self::MeshEwaldWithBoundaryCorrection => "mesh-ewald-with-boundary-correction",
            Self::DirectSumWithBoundaryCorrection => "direct-sum-with-boundary-correction",
            Self::GpuDirectSum => "gpu-direct-sum",
            Self::GpuBarnesHut => "gpu-barnes-hut",
            Self::ExternalSolver => "external-solver",
        }
    }

    /// Number of named energy contributions the method reports.
    ///
    /// `None` still reserves one slot, for an external field term.
    pub fn energy_term_count(self) -> usize {
        match self {
            Self::MeshEwaldWithBoundaryCorrection | Self::DirectSumWithBoundaryCorrection => 2,
            _ => 1,
        }
    }

    /// Number of dipolar virial terms the method writes during a pressure evaluation.
    pub fn virial_term_count(self) -> usize {
        match self {
            Self::MeshEwald => 1,
            _ => 0,
        }
    }

    /// Methods that need every dipolar particle in one local array.
    pub fn is_single_process_only(self) -> bool {
        matches!(
            self,
            Self::AllWithAllNoReplica | Self::DirectSum | Self::DirectSumWithBoundaryCorrection
        )
    }

    pub fn supports_isotropic_npt(self) -> bool {
        matches!(self, Self::None | Self::MeshEwald)
    }

    /// GPU-resident methods that apply their own forces outside this layer.
    pub fn is_actor(self) -> bool {
        matches!(self, Self::GpuDirectSum | Self::GpuBarnesHut)
    }

    pub fn boundary_corrected(self) -> Option<Self> {
        match self {
            Self::MeshEwald | Self::MeshEwaldWithBoundaryCorrection => {
                Some(Self::MeshEwaldWithBoundaryCorrection)
            }
            Self::DirectSum | Self::DirectSumWithBoundaryCorrection => {
                Some(Self::DirectSumWithBoundaryCorrection)
            }
            _ => None,
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MethodKind {
    type Err = ConfigError;

    /// Parses kebab-case or snake_case method names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| ConfigError::UnknownMethodName(s.to_string()))
    }
}

/// Number of periodic box replicas summed per axis by direct summation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ReplicaCutoff(u32);

impl ReplicaCutoff {
    pub const ZERO: Self = Self(0);

    pub fn new(n: u32) -> Result<Self, ConfigError> {
        Self::try_from(i64::from(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for ReplicaCutoff {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(ConfigError::NegativeReplicaCutoff(value));
        }
        if value > i64::from(MAX_REPLICA_CUTOFF) {
            return Err(ConfigError::ReplicaCutoffOutOfRange(value));
        }
        Ok(Self(value as u32))
    }
}

impl From<ReplicaCutoff> for i64 {
    fn from(cutoff: ReplicaCutoff) -> Self {
        i64::from(cutoff.0)
    }
}

/// A dipolar method together with its method-specific parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DipolarMethod {
    #[default]
    None,
    AllWithAllNoReplica,
    DirectSum {
        #[serde(default, rename = "replica-cutoff")]
        replica_cutoff: ReplicaCutoff,
    },
    MeshEwald,
    MeshEwaldWithBoundaryCorrection,
    DirectSumWithBoundaryCorrection {
        #[serde(default, rename = "replica-cutoff")]
        replica_cutoff: ReplicaCutoff,
    },
    GpuDirectSum,
    GpuBarnesHut,
    ExternalSolver,
}

impl DipolarMethod {
    pub fn kind(&self) -> MethodKind {
        match self {
            Self::None => MethodKind::None,
            Self::AllWithAllNoReplica => MethodKind::AllWithAllNoReplica,
            Self::DirectSum { .. } => MethodKind::DirectSum,
            Self::MeshEwald => MethodKind::MeshEwald,
            Self::MeshEwaldWithBoundaryCorrection => MethodKind::MeshEwaldWithBoundaryCorrection,
            Self::DirectSumWithBoundaryCorrection { .. } => {
                MethodKind::DirectSumWithBoundaryCorrection
            }
            Self::GpuDirectSum => MethodKind::GpuDirectSum,
            Self::GpuBarnesHut => MethodKind::GpuBarnesHut,
            Self::ExternalSolver => MethodKind::ExternalSolver,
        }
    }

    /// Builds a method from its kind; the cutoff is ignored by methods without replicas.
    pub fn from_kind(kind: MethodKind, replica_cutoff: ReplicaCutoff) -> Self {
        match kind {
            MethodKind::None => Self::None,
            MethodKind::AllWithAllNoReplica => Self::AllWithAllNoReplica,
            MethodKind::DirectSum => Self::DirectSum { replica_cutoff },
            MethodKind::MeshEwald => Self::MeshEwald,
            MethodKind::MeshEwaldWithBoundaryCorrection => Self::MeshEwaldWithBoundaryCorrection,
            MethodKind::DirectSumWithBoundaryCorrection => {
                Self::DirectSumWithBoundaryCorrection { replica_cutoff }
            }
            MethodKind::GpuDirectSum => Self::GpuDirectSum,
            MethodKind::GpuBarnesHut => Self::GpuBarnesHut,
            MethodKind::ExternalSolver => Self::ExternalSolver,
        }
    }

    pub fn replica_cutoff(&self) -> Option<ReplicaCutoff> {
        match self {
            Self::DirectSum { replica_cutoff }
            | Self::DirectSumWithBoundaryCorrection { replica_cutoff } => Some(*replica_cutoff),
            _ => None,
        }
    }

    /// The boundary-corrected counterpart of this method, keeping its parameters.
    pub fn with_boundary_correction(&self) -> Result<Self, ConfigError> {
        let kind = self.kind();
        let corrected = kind
            .boundary_corrected()
            .ok_or(ConfigError::NoBoundaryCorrectedVariant(kind))?;
        Ok(Self::from_kind(
            corrected,
            self.replica_cutoff().unwrap_or_default(),
        ))
    }
}

/// Validates a dipolar coupling prefactor.
pub fn validate_prefactor(prefactor: f64) -> Result<f64, ConfigError> {
    // Written so that NaN is rejected too.
    if !(prefactor >= 0.0) || prefactor.is_infinite() {
        return Err(ConfigError::InvalidPrefactor(prefactor));
    }
    Ok(prefactor)
}

/// The dipolar interaction state: coupling prefactor and active method.
///
/// Serializable so hosts can store it in checkpoints; the same serialized form
/// is the payload of the parameter broadcast.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDipoleConfiguration")]
pub struct DipoleConfiguration {
    prefactor: f64,
    method: DipolarMethod,
}

/// Unvalidated serialized form; a restored configuration goes through
/// [`DipoleConfiguration::new`].
#[derive(Deserialize)]
struct RawDipoleConfiguration {
    prefactor: f64,
    method: DipolarMethod,
}

impl TryFrom<RawDipoleConfiguration> for DipoleConfiguration {
    type Error = ConfigError;

    fn try_from(raw: RawDipoleConfiguration) -> Result<Self, Self::Error> {
        Self::new(raw.prefactor, raw.method)
    }
}

impl DipoleConfiguration {
    pub fn new(prefactor: f64, method: DipolarMethod) -> Result<Self, ConfigError> {
        Ok(Self {
            prefactor: validate_prefactor(prefactor)?,
            method,
        })
    }

    pub fn prefactor(&self) -> f64 {
        self.prefactor
    }

    pub fn method(&self) -> &DipolarMethod {
        &self.method
    }

    pub fn kind(&self) -> MethodKind {
        self.method.kind()
    }

    /// Replaces the prefactor; on error the previous value is kept.
    pub fn set_prefactor(&mut self, prefactor: f64) -> Result<(), ConfigError> {
        self.prefactor = validate_prefactor(prefactor)?;
        Ok(())
    }

    pub(crate) fn set_method(&mut self, method: DipolarMethod) {
        self.method = method;
    }
}

#[derive(Default)]
pub struct DipoleConfigurationBuilder {
    prefactor: Option<f64>,
    method: Option<DipolarMethod>,
}

impl DipoleConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefactor(mut self, prefactor: f64) -> Self {
        self.prefactor = Some(prefactor);
        self
    }
    pub fn method(mut self, method: DipolarMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn build(self) -> Result<DipoleConfiguration, ConfigError> {
        DipoleConfiguration::new(
            self.prefactor
                .ok_or(ConfigError::MissingParameter("prefactor"))?,
            self.method.ok_or(ConfigError::MissingParameter("method"))?,
        )
    }
}

/// Everything a one-shot evaluation of a particle configuration needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub interaction: DipoleConfiguration,
    pub geometry: BoxGeometry,
    pub integrator: Integrator,
    pub compute_pressure: bool,
}

#[derive(Default)]
pub struct EvaluationConfigBuilder {
    interaction: Option<DipoleConfiguration>,
    geometry: Option<BoxGeometry>,
    integrator: Option<Integrator>,
    compute_pressure: Option<bool>,
}

impl EvaluationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interaction(mut self, interaction: DipoleConfiguration) -> Self {
        self.interaction = Some(interaction);
        self
    }
    pub fn geometry(mut self, geometry: BoxGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
    pub fn integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = Some(integrator);
        self
    }
    pub fn compute_pressure(mut self, enabled: bool) -> Self {
        self.compute_pressure = Some(enabled);
        self
    }

    pub fn build(self) -> Result<EvaluationConfig, ConfigError> {
        Ok(EvaluationConfig {
            interaction: self
                .interaction
                .ok_or(ConfigError::MissingParameter("interaction"))?,
            geometry: self.geometry.ok_or(ConfigError::MissingParameter("geometry"))?,
            integrator: self.integrator.unwrap_or_default(),
            compute_pressure: self.compute_pressure.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_codes_round_trip_and_reject_unknown_values() {
        for kind in MethodKind::ALL {
            assert_eq!(MethodKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(MethodKind::from_code(9), None);
        assert_eq!(MethodKind::from_code(-1), None);
    }

    #[test]
    fn method_names_parse_case_and_separator_insensitively() {
        assert_eq!("direct-sum".parse::<MethodKind>(), Ok(MethodKind::DirectSum));
        assert_eq!(
            "MESH_EWALD_WITH_BOUNDARY_CORRECTION".parse::<MethodKind>(),
            Ok(MethodKind::MeshEwaldWithBoundaryCorrection)
        );
        assert_eq!(
            "p3m".parse::<MethodKind>(),
            Err(ConfigError::UnknownMethodName("p3m".to_string()))
        );
    }

    #[test]
    fn energy_term_counts_follow_the_method_table() {
        let expected = [
            (MethodKind::None, 1),
            (MethodKind::AllWithAllNoReplica, 1),
            (MethodKind::DirectSum, 1),
            (MethodKind::MeshEwald, 1),
            (MethodKind::MeshEwaldWithBoundaryCorrection, 2),
            (MethodKind::DirectSumWithBoundaryCorrection, 2),
            (MethodKind::GpuDirectSum, 1),
            (MethodKind::GpuBarnesHut, 1),
            (MethodKind::ExternalSolver, 1),
        ];
        for (kind, count) in expected {
            assert_eq!(kind.energy_term_count(), count, "{kind}");
        }
    }

    #[test]
    fn only_mesh_ewald_reports_a_virial_term() {
        for kind in MethodKind::ALL {
            let expected = usize::from(kind == MethodKind::MeshEwald);
            assert_eq!(kind.virial_term_count(), expected, "{kind}");
        }
    }

    #[test]
    fn replica_cutoff_rejects_negative_and_huge_values() {
        assert_eq!(
            ReplicaCutoff::try_from(-1),
            Err(ConfigError::NegativeReplicaCutoff(-1))
        );
        assert_eq!(
            ReplicaCutoff::try_from(1_000_000),
            Err(ConfigError::ReplicaCutoffOutOfRange(1_000_000))
        );
        assert_eq!(ReplicaCutoff::try_from(3).map(ReplicaCutoff::get), Ok(3));
    }

    #[test]
    fn prefactor_validation_rejects_negative_and_nan() {
        assert!(validate_prefactor(0.0).is_ok());
        assert!(validate_prefactor(2.5).is_ok());
        assert_eq!(
            validate_prefactor(-1.0),
            Err(ConfigError::InvalidPrefactor(-1.0))
        );
        assert!(validate_prefactor(f64::NAN).is_err());
        assert!(validate_prefactor(f64::INFINITY).is_err());
    }

    #[test]
    fn set_prefactor_keeps_previous_value_on_error() {
        let mut config = DipoleConfiguration::new(1.5, DipolarMethod::None).unwrap();
        assert!(config.set_prefactor(-1.0).is_err());
        assert_eq!(config.prefactor(), 1.5);
    }

    #[test]
    fn boundary_correction_maps_base_methods_and_keeps_cutoff() {
        let cutoff = ReplicaCutoff::new(2).unwrap();
        let ds = DipolarMethod::DirectSum {
            replica_cutoff: cutoff,
        };
        assert_eq!(
            ds.with_boundary_correction(),
            Ok(DipolarMethod::DirectSumWithBoundaryCorrection {
                replica_cutoff: cutoff
            })
        );
        assert_eq!(
            DipolarMethod::MeshEwald.with_boundary_correction(),
            Ok(DipolarMethod::MeshEwaldWithBoundaryCorrection)
        );
        assert_eq!(
            DipolarMethod::MeshEwaldWithBoundaryCorrection.with_boundary_correction(),
            Ok(DipolarMethod::MeshEwaldWithBoundaryCorrection)
        );
        assert_eq!(
            DipolarMethod::AllWithAllNoReplica.with_boundary_correction(),
            Err(ConfigError::NoBoundaryCorrectedVariant(
                MethodKind::AllWithAllNoReplica
            ))
        );
    }

    #[test]
    fn method_deserializes_from_tagged_toml_table() {
        #[derive(Deserialize)]
        struct Wrapper {
            method: DipolarMethod,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [method]
            type = "direct-sum"
            replica-cutoff = 3
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.method,
            DipolarMethod::DirectSum {
                replica_cutoff: ReplicaCutoff::new(3).unwrap()
            }
        );

        let negative = toml::from_str::<Wrapper>(
            r#"
            [method]
            type = "direct-sum"
            replica-cutoff = -2
            "#,
        );
        assert!(negative.is_err());
    }

    #[test]
    fn direct_sum_cutoff_defaults_to_zero() {
        #[derive(Deserialize)]
        struct Wrapper {
            method: DipolarMethod,
        }
        let parsed: Wrapper = toml::from_str("[method]\ntype = \"direct-sum\"\n").unwrap();
        assert_eq!(parsed.method.replica_cutoff(), Some(ReplicaCutoff::ZERO));
    }

    #[test]
    fn builder_requires_every_parameter() {
        let result = DipoleConfigurationBuilder::new().prefactor(1.0).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("method")));

        let config = DipoleConfigurationBuilder::new()
            .prefactor(2.0)
            .method(DipolarMethod::AllWithAllNoReplica)
            .build()
            .unwrap();
        assert_eq!(config.kind(), MethodKind::AllWithAllNoReplica);
        assert_eq!(config.prefactor(), 2.0);
    }

    #[test]
    fn evaluation_builder_requires_interaction_and_geometry() {
        let result = EvaluationConfigBuilder::new()
            .geometry(BoxGeometry::cubic(10.0))
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("interaction")));

        let config = EvaluationConfigBuilder::new()
            .interaction(DipoleConfiguration::default())
            .geometry(BoxGeometry::cubic(10.0))
            .build()
            .unwrap();
        assert_eq!(config.integrator, Integrator::VelocityVerlet);
        assert!(config.compute_pressure);
    }

    #[test]
    fn builder_rejects_negative_prefactor() {
        let result = DipoleConfigurationBuilder::new()
            .prefactor(-0.5)
            .method(DipolarMethod::None)
            .build();
        assert_eq!(result, Err(ConfigError::InvalidPrefactor(-0.5)));
    }

    #[test]
    fn restored_configuration_is_validated() {
        let restored: DipoleConfiguration = toml::from_str(
            "prefactor = 2.5\n[method]\ntype = \"direct-sum\"\nreplica-cutoff = 1\n",
        )
        .unwrap();
        assert_eq!(restored.prefactor(), 2.5);
        assert_eq!(restored.method().replica_cutoff(), Some(ReplicaCutoff::new(1).unwrap()));

        let negative =
            toml::from_str::<DipoleConfiguration>("prefactor = -1.0\n[method]\ntype = \"none\"\n");
        let message = negative.unwrap_err().to_string();
        assert!(message.contains("prefactor"), "unexpected error: {message}");
    }

    #[test]
    fn configuration_survives_a_checkpoint_round_trip() {
        let config = DipoleConfiguration::new(
            0.75,
            DipolarMethod::DirectSum {
                replica_cutoff: ReplicaCutoff::new(3).unwrap(),
            },
        )
        .unwrap();
        let text = toml::to_string(&config).unwrap();
        let restored: DipoleConfiguration = toml::from_str(&text).unwrap();
        assert_eq!(restored, config);
    }
}
