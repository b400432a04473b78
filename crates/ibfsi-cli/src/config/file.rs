use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileTimeConfig {
    pub end_time: Option<f64>,
    pub time_step: Option<f64>,
    pub output_interval: Option<usize>,
    pub refinement_interval: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FilePointLocation {
    Linear,
    KdTree,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileCouplingConfig {
    pub global_refinement: Option<u32>,
    pub volume_quadrature_points: Option<usize>,
    pub face_quadrature_points: Option<usize>,
    pub point_location: Option<FilePointLocation>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileFlowConfig {
    pub uniform: Option<[f64; 2]>,
    pub shear_rate: Option<f64>,
    pub pressure: Option<f64>,
    pub pressure_gradient: Option<[f64; 2]>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileInflowProfile {
    Constant,
    GaussianPulse,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileInflowConfig {
    pub boundary_id: Option<u32>,
    pub profile: Option<FileInflowProfile>,
    pub amplitude: Option<f64>,
    /// Peak time of a Gaussian pulse.
    pub center: Option<f64>,
    /// Standard deviation of a Gaussian pulse.
    pub width: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileFluidConfig {
    pub viscosity: Option<f64>,
    pub domain_min: Option<[f64; 2]>,
    pub domain_max: Option<[f64; 2]>,
    pub subdivisions: Option<[usize; 2]>,
    pub flow: Option<FileFlowConfig>,
    pub inflow: Option<FileInflowConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileMotionConfig {
    pub amplitude: Option<[f64; 2]>,
    pub frequency: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSolidConfig {
    pub center: Option<[f64; 2]>,
    pub radius: Option<f64>,
    pub sectors: Option<usize>,
    pub rings: Option<usize>,
    pub dirichlet_bcs: Option<Vec<u32>>,
    pub motion: Option<FileMotionConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub time: Option<FileTimeConfig>,
    pub coupling: Option<FileCouplingConfig>,
    pub fluid: Option<FileFluidConfig>,
    pub solid: Option<FileSolidConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading parameters from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_every_section() {
        let config = FileConfig::from_toml(
            r#"
            [time]
            end-time = 0.5
            time-step = 0.01

            [coupling]
            point-location = "linear"

            [fluid]
            viscosity = 0.1
            subdivisions = [8, 4]

            [fluid.inflow]
            profile = "gaussian-pulse"
            amplitude = 6.0

            [solid]
            dirichlet-bcs = [0]

            [solid.motion]
            amplitude = [0.0, 0.05]
            "#,
        )
        .unwrap();

        assert_eq!(config.time.unwrap().end_time, Some(0.5));
        assert_eq!(
            config.coupling.unwrap().point_location,
            Some(FilePointLocation::Linear)
        );
        let fluid = config.fluid.unwrap();
        assert_eq!(fluid.subdivisions, Some([8, 4]));
        assert_eq!(
            fluid.inflow.unwrap().profile,
            Some(FileInflowProfile::GaussianPulse)
        );
        let solid = config.solid.unwrap();
        assert_eq!(solid.dirichlet_bcs, Some(vec![0]));
        assert_eq!(solid.motion.unwrap().amplitude, Some([0.0, 0.05]));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("[time]\nend_time = 1.0\n").is_err());
        assert!(FileConfig::from_toml("[mesh]\nlevel = 1\n").is_err());
    }

    #[test]
    fn from_file_reports_the_offending_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[time]\nend-time = \"soon\"").unwrap();
        let result = FileConfig::from_file(file.path());
        match result {
            Err(CliError::FileParsing { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("parameters.prm"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
