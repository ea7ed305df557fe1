use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileMethodConfig {
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    #[serde(rename = "replica-cutoff")]
    pub replica_cutoff: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileInteractionConfig {
    pub prefactor: Option<f64>,
    pub method: Option<FileMethodConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileBoxConfig {
    pub length: Option<[f64; 3]>,
    pub periodic: Option<[bool; 3]>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rotation: Option<bool>,
    pub integrator: Option<String>,
    pub pressure: Option<bool>,
    pub interaction: Option<FileInteractionConfig>,
    #[serde(rename = "box")]
    pub box_config: Option<FileBoxConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_a_complete_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            r#"
            rotation = false
            integrator = "npt-isotropic"
            pressure = true

            [interaction]
            prefactor = 2.5

            [interaction.method]
            type = "direct-sum"
            replica-cutoff = 3

            [box]
            length = [10.0, 12.0, 14.0]
            periodic = [true, true, false]
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.rotation, Some(false));
        assert_eq!(config.integrator.as_deref(), Some("npt-isotropic"));
        let interaction = config.interaction.unwrap();
        assert_eq!(interaction.prefactor, Some(2.5));
        let method = interaction.method.unwrap();
        assert_eq!(method.method_type.as_deref(), Some("direct-sum"));
        assert_eq!(method.replica_cutoff, Some(3));
        let box_config = config.box_config.unwrap();
        assert_eq!(box_config.length, Some([10.0, 12.0, 14.0]));
        assert_eq!(box_config.periodic, Some([true, true, false]));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[interaction]\nbjerrum-length = 1.0\n").unwrap();

        let result = FileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
