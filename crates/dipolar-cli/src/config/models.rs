use dipolar::engine::config as core_config;
use std::path::PathBuf;

pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    /// Whether particles carry rotational degrees of freedom (torques are accumulated).
    pub rotation: bool,
    pub core_config: core_config::EvaluationConfig,
}
