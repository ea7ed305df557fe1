use super::defaults::DefaultsConfig;
use super::file::{FileBoxConfig, FileConfig, FileMethodConfig};
use super::models::AppConfig;
use crate::cli::EvaluateArgs;
use crate::error::{CliError, Result};
use dipolar::core::models::geometry::BoxGeometry;
use dipolar::engine::config as core_config;
use dipolar::engine::virial::Integrator;
use nalgebra::Vector3;
use std::str::FromStr;

pub fn build_config(args: &EvaluateArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let interaction_file = file_config.interaction.take().unwrap_or_default();
    let prefactor = args
        .prefactor
        .or(interaction_file.prefactor)
        .unwrap_or(defaults.prefactor);
    let method = merge_method(args, interaction_file.method, &defaults)?;

    let interaction = core_config::DipoleConfigurationBuilder::new()
        .prefactor(prefactor)
        .method(method)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let geometry = merge_geometry(args.box_length, file_config.box_config.take(), &defaults)?;

    let integrator = parse_integrator(
        file_config
            .integrator
            .as_deref()
            .unwrap_or(&defaults.integrator),
    )?;
    let compute_pressure = if args.no_pressure {
        false
    } else {
        file_config.pressure.unwrap_or(defaults.compute_pressure)
    };

    let core_config = core_config::EvaluationConfigBuilder::new()
        .interaction(interaction)
        .geometry(geometry)
        .integrator(integrator)
        .compute_pressure(compute_pressure)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        rotation: file_config.rotation.unwrap_or(defaults.rotation),
        core_config,
    })
}

fn merge_method(
    args: &EvaluateArgs,
    file_val: Option<FileMethodConfig>,
    defaults: &DefaultsConfig,
) -> Result<core_config::DipolarMethod> {
    let file_val = file_val.unwrap_or_default();

    let name = args
        .method
        .as_deref()
        .or(file_val.method_type.as_deref())
        .unwrap_or(&defaults.method);
    let kind = core_config::MethodKind::from_str(name)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let cutoff = args
        .replica_cutoff
        .or(file_val.replica_cutoff)
        .unwrap_or(defaults.replica_cutoff);
    let replica_cutoff = core_config::ReplicaCutoff::try_from(cutoff)
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(core_config::DipolarMethod::from_kind(kind, replica_cutoff))
}

fn merge_geometry(
    cli_edge: Option<f64>,
    file_val: Option<FileBoxConfig>,
    defaults: &DefaultsConfig,
) -> Result<BoxGeometry> {
    let file_val = file_val.unwrap_or_default();
    let periodic = file_val.periodic.unwrap_or(defaults.periodic);

    let length = match (cli_edge, file_val.length) {
        (Some(edge), _) => Vector3::repeat(edge),
        (None, Some(length)) => Vector3::from(length),
        (None, None) => {
            return Err(CliError::Config(
                "A box size is required, via `--box-length` or the `[box] length` key.".to_string(),
            ));
        }
    };
    if length.iter().any(|l| !(*l > 0.0) || l.is_infinite()) {
        return Err(CliError::Config(format!(
            "Box edge lengths must be positive and finite, got [{}, {}, {}]",
            length.x, length.y, length.z
        )));
    }

    Ok(BoxGeometry::new(length, periodic))
}

fn parse_integrator(name: &str) -> Result<Integrator> {
    match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "velocity-verlet" => Ok(Integrator::VelocityVerlet),
        "npt-isotropic" => Ok(Integrator::NptIsotropic),
        _ => Err(CliError::Config(format!("Unknown integrator: '{}'", name))),
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        }
        let key = parts[0];
        let value_str = parts[1];

        match key {
            "interaction.prefactor" => {
                config
                    .interaction
                    .get_or_insert_with(Default::default)
                    .prefactor = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })?);
            }
            "interaction.method.type" => {
                config
                    .interaction
                    .get_or_insert_with(Default::default)
                    .method
                    .get_or_insert_with(Default::default)
                    .method_type = Some(value_str.to_string());
            }
            "interaction.method.replica-cutoff" => {
                config
                    .interaction
                    .get_or_insert_with(Default::default)
                    .method
                    .get_or_insert_with(Default::default)
                    .replica_cutoff = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid integer value for {}: {}", key, value_str))
                })?);
            }
            "box.edge" => {
                let edge: f64 = value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })?;
                config
                    .box_config
                    .get_or_insert_with(Default::default)
                    .length = Some([edge; 3]);
            }
            "rotation" | "pressure" => {
                let flag: bool = value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid boolean value for {}: {}", key, value_str))
                })?;
                if key == "rotation" {
                    config.rotation = Some(flag);
                } else {
                    config.pressure = Some(flag);
                }
            }
            "integrator" => {
                config.integrator = Some(value_str.to_string());
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
