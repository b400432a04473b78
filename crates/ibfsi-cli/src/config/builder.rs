use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileInflowConfig, FileInflowProfile, FilePointLocation};
use super::models::{
    AppConfig, FluidScenario, InflowConfig, InflowProfile, ScenarioConfig, SolidScenario,
};
use crate::error::{CliError, Result};
use ibfsi::core::geometry::locator::LocatorStrategy;
use ibfsi::engine::config::CouplingConfigBuilder;
use ibfsi::solvers::reference::{FlowProfile, HarmonicMotion};
use nalgebra::{Point2, Vector2};
use std::path::Path;
use std::str::FromStr;

/// Reads the parameter file, applies `--set` overrides and fills everything
/// left unset from [`DefaultsConfig`].
pub fn build_config(parameters: &Path, set_values: &[String]) -> Result<AppConfig> {
    let file_config = FileConfig::from_file(parameters)?;
    merge(file_config, set_values)
}

pub fn merge(file_config: FileConfig, set_values: &[String]) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = apply_set_values(file_config, set_values)?;

    let time = file_config.time.unwrap_or_default();
    let coupling = file_config.coupling.unwrap_or_default();
    let fluid = file_config.fluid.unwrap_or_default();
    let solid = file_config.solid.unwrap_or_default();

    let point_location = match coupling.point_location {
        Some(FilePointLocation::Linear) => LocatorStrategy::Linear,
        Some(FilePointLocation::KdTree) | None => LocatorStrategy::KdTree,
    };

    let coupling_config = CouplingConfigBuilder::new()
        .end_time(time.end_time.unwrap_or(defaults.end_time))
        .time_step(time.time_step.unwrap_or(defaults.time_step))
        .output_interval(time.output_interval.unwrap_or(defaults.output_interval))
        .refinement_interval(
            time.refinement_interval
                .unwrap_or(defaults.refinement_interval),
        )
        .global_refinement(
            coupling
                .global_refinement
                .unwrap_or(defaults.global_refinement),
        )
        .volume_quadrature_points(
            coupling
                .volume_quadrature_points
                .unwrap_or(defaults.volume_quadrature_points),
        )
        .face_quadrature_points(
            coupling
                .face_quadrature_points
                .unwrap_or(defaults.face_quadrature_points),
        )
        .viscosity(fluid.viscosity.unwrap_or(defaults.viscosity))
        .solid_dirichlet_bcs(solid.dirichlet_bcs.clone().unwrap_or_default())
        .point_location(point_location)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let flow = fluid.flow.unwrap_or_default();
    let fluid_scenario = FluidScenario {
        domain_min: Point2::from(fluid.domain_min.unwrap_or(defaults.domain_min)),
        domain_max: Point2::from(fluid.domain_max.unwrap_or(defaults.domain_max)),
        subdivisions: fluid.subdivisions.unwrap_or(defaults.subdivisions),
        flow: FlowProfile {
            uniform: Vector2::from(flow.uniform.unwrap_or([0.0, 0.0])),
            shear_rate: flow.shear_rate.unwrap_or(0.0),
            pressure: flow.pressure.unwrap_or(0.0),
            pressure_gradient: Vector2::from(flow.pressure_gradient.unwrap_or([0.0, 0.0])),
        },
        inflow: fluid.inflow.map(|inflow| merge_inflow(inflow, &defaults)),
    };

    let motion = solid.motion.unwrap_or_default();
    let solid_scenario = SolidScenario {
        center: Point2::from(solid.center.unwrap_or(defaults.solid_center)),
        radius: solid.radius.unwrap_or(defaults.solid_radius),
        sectors: solid.sectors.unwrap_or(defaults.solid_sectors),
        rings: solid.rings.unwrap_or(defaults.solid_rings),
        motion: HarmonicMotion {
            amplitude: Vector2::from(motion.amplitude.unwrap_or([0.0, 0.0])),
            frequency: motion.frequency.unwrap_or(defaults.motion_frequency),
        },
    };

    Ok(AppConfig {
        coupling: coupling_config,
        scenario: ScenarioConfig {
            fluid: fluid_scenario,
            solid: solid_scenario,
        },
    })
}

fn merge_inflow(inflow: FileInflowConfig, defaults: &DefaultsConfig) -> InflowConfig {
    let amplitude = inflow.amplitude.unwrap_or(defaults.inflow_amplitude);
    let profile = match inflow.profile.unwrap_or(FileInflowProfile::Constant) {
        FileInflowProfile::Constant => InflowProfile::Constant { amplitude },
        FileInflowProfile::GaussianPulse => InflowProfile::GaussianPulse {
            amplitude,
            center: inflow.center.unwrap_or(defaults.pulse_center),
            width: inflow.width.unwrap_or(defaults.pulse_width),
        },
    };
    InflowConfig {
        boundary_id: inflow.boundary_id.unwrap_or(defaults.inflow_boundary_id),
        profile,
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "time.end-time" => {
                config.time.get_or_insert_with(Default::default).end_time =
                    Some(parse_value(key, value)?);
            }
            "time.time-step" => {
                config.time.get_or_insert_with(Default::default).time_step =
                    Some(parse_value(key, value)?);
            }
            "time.output-interval" => {
                config
                    .time
                    .get_or_insert_with(Default::default)
                    .output_interval = Some(parse_value(key, value)?);
            }
            "time.refinement-interval" => {
                config
                    .time
                    .get_or_insert_with(Default::default)
                    .refinement_interval = Some(parse_value(key, value)?);
            }
            "coupling.global-refinement" => {
                config
                    .coupling
                    .get_or_insert_with(Default::default)
                    .global_refinement = Some(parse_value(key, value)?);
            }
            "coupling.volume-quadrature-points" => {
                config
                    .coupling
                    .get_or_insert_with(Default::default)
                    .volume_quadrature_points = Some(parse_value(key, value)?);
            }
            "coupling.face-quadrature-points" => {
                config
                    .coupling
                    .get_or_insert_with(Default::default)
                    .face_quadrature_points = Some(parse_value(key, value)?);
            }
            "coupling.point-location" => {
                let strategy = match value.trim() {
                    "linear" => FilePointLocation::Linear,
                    "kd-tree" => FilePointLocation::KdTree,
                    other => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: '{}'. Expected 'linear' or 'kd-tree'.",
                            key, other
                        )));
                    }
                };
                config
                    .coupling
                    .get_or_insert_with(Default::default)
                    .point_location = Some(strategy);
            }
            "fluid.viscosity" => {
                config.fluid.get_or_insert_with(Default::default).viscosity =
                    Some(parse_value(key, value)?);
            }
            "fluid.flow.shear-rate" => {
                config
                    .fluid
                    .get_or_insert_with(Default::default)
                    .flow
                    .get_or_insert_with(Default::default)
                    .shear_rate = Some(parse_value(key, value)?);
            }
            "fluid.flow.pressure" => {
                config
                    .fluid
                    .get_or_insert_with(Default::default)
                    .flow
                    .get_or_insert_with(Default::default)
                    .pressure = Some(parse_value(key, value)?);
            }
            "fluid.inflow.amplitude" => {
                config
                    .fluid
                    .get_or_insert_with(Default::default)
                    .inflow
                    .get_or_insert_with(Default::default)
                    .amplitude = Some(parse_value(key, value)?);
            }
            "solid.radius" => {
                config.solid.get_or_insert_with(Default::default).radius =
                    Some(parse_value(key, value)?);
            }
            "solid.motion.frequency" => {
                config
                    .solid
                    .get_or_insert_with(Default::default)
                    .motion
                    .get_or_insert_with(Default::default)
                    .frequency = Some(parse_value(key, value)?);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::tempdir;

    const PARAMETERS: &str = r#"
        [time]
        end-time = 0.2
        time-step = 0.05
        output-interval = 2

        [coupling]
        volume-quadrature-points = 3
        point-location = "linear"

        [fluid]
        viscosity = 0.01
        subdivisions = [16, 8]

        [fluid.flow]
        pressure-gradient = [-2.0, 0.0]

        [fluid.inflow]
        boundary-id = 0
        profile = "gaussian-pulse"

        [solid]
        center = [0.3, 0.2]
        dirichlet-bcs = [0]

        [solid.motion]
        amplitude = [0.0, 0.01]
        frequency = 2.0
    "#;

    #[test]
    fn build_config_reads_file_and_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parameters.prm");
        fs::write(&path, PARAMETERS).unwrap();

        let app = build_config(&path, &[]).unwrap();
        let coupling = &app.coupling;
        assert_eq!(coupling.time.end_time, 0.2);
        assert_eq!(coupling.time.output_interval, 2);
        assert_eq!(coupling.time.refinement_interval, 10);
        assert_eq!(coupling.discretization.volume_quadrature_points, 3);
        assert_eq!(coupling.discretization.face_quadrature_points, 2);
        assert_eq!(coupling.point_location, LocatorStrategy::Linear);
        assert_eq!(coupling.viscosity, 0.01);
        assert_eq!(coupling.solid_dirichlet_bcs, BTreeSet::from([0]));

        let fluid = &app.scenario.fluid;
        assert_eq!(fluid.subdivisions, [16, 8]);
        assert_eq!(fluid.domain_max, Point2::new(1.0, 1.0));
        assert_eq!(fluid.flow.pressure_gradient, Vector2::new(-2.0, 0.0));
        assert_eq!(fluid.flow.pressure, 0.0);
        assert_eq!(
            fluid.inflow.unwrap().profile,
            InflowProfile::GaussianPulse {
                amplitude: 6.0,
                center: 0.5e-6,
                width: 0.15e-6
            }
        );
        let solid = &app.scenario.solid;
        assert_eq!(solid.center, Point2::new(0.3, 0.2));
        assert_eq!(solid.radius, 0.15);
        assert_eq!(solid.motion.frequency, 2.0);
    }

    #[test]
    fn empty_file_gives_the_default_run() {
        let app = merge(FileConfig::default(), &[]).unwrap();
        assert_eq!(app.coupling.time.time_step, 0.01);
        assert_eq!(app.coupling.point_location, LocatorStrategy::KdTree);
        assert!(app.coupling.solid_dirichlet_bcs.is_empty());
        assert!(app.scenario.fluid.inflow.is_none());
        assert_eq!(app.scenario.solid.motion.amplitude, Vector2::zeros());
    }

    #[test]
    fn set_values_override_file_values() {
        let file = FileConfig::from_toml(PARAMETERS).unwrap();
        let app = merge(
            file,
            &[
                "time.end-time=0.4".to_string(),
                "coupling.point-location=kd-tree".to_string(),
                "fluid.inflow.amplitude = 2.5".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(app.coupling.time.end_time, 0.4);
        assert_eq!(app.coupling.point_location, LocatorStrategy::KdTree);
        match app.scenario.fluid.inflow.unwrap().profile {
            InflowProfile::GaussianPulse { amplitude, .. } => assert_eq!(amplitude, 2.5),
            other => panic!("unexpected profile: {other:?}"),
        }
    }

    #[test]
    fn malformed_or_unknown_set_values_are_rejected() {
        for bad in ["time.end-time", "time.end-time=soon", "mesh.level=2"] {
            let result = merge(FileConfig::default(), &[bad.to_string()]);
            assert!(matches!(result, Err(CliError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn invalid_parameters_fail_core_validation() {
        let result = merge(FileConfig::default(), &["time.time-step=-1".to_string()]);
        match result {
            Err(CliError::Config(message)) => assert!(message.contains("time_step")),
            _ => panic!("negative time step must be rejected"),
        }
    }
}
