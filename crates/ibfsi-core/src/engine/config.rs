use crate::core::geometry::locator::LocatorStrategy;
use crate::core::models::ids::BoundaryId;
use std::collections::BTreeSet;
use thiserror::Error;

const MAX_QUADRATURE_POINTS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeConfig {
    pub end_time: f64,
    pub time_step: f64,
    /// Steps between output events.
    pub output_interval: usize,
    /// Steps between refinement events.
    pub refinement_interval: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscretizationConfig {
    pub global_refinement: u32,
    /// Gauss points per direction of the fluid volume quadrature.
    pub volume_quadrature_points: usize,
    /// Gauss points of the solid face quadrature.
    pub face_quadrature_points: usize,
}

/// Parameters of one coupled run, loaded once before the driver is built.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingConfig {
    pub time: TimeConfig,
    pub discretization: DiscretizationConfig,
    /// Fluid viscosity used for the traction sent to the solid.
    pub viscosity: f64,
    /// Solid boundary ids that carry Dirichlet conditions and receive no traction.
    pub solid_dirichlet_bcs: BTreeSet<BoundaryId>,
    pub point_location: LocatorStrategy,
}

#[derive(Default)]
pub struct CouplingConfigBuilder {
    end_time: Option<f64>,
    time_step: Option<f64>,
    output_interval: Option<usize>,
    refinement_interval: Option<usize>,
    global_refinement: Option<u32>,
    volume_quadrature_points: Option<usize>,
    face_quadrature_points: Option<usize>,
    viscosity: Option<f64>,
    solid_dirichlet_bcs: Option<BTreeSet<BoundaryId>>,
    point_location: Option<LocatorStrategy>,
}

impl CouplingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn end_time(mut self, time: f64) -> Self {
        self.end_time = Some(time);
        self
    }
    pub fn time_step(mut self, dt: f64) -> Self {
        self.time_step = Some(dt);
        self
    }
    pub fn output_interval(mut self, steps: usize) -> Self {
        self.output_interval = Some(steps);
        self
    }
    pub fn refinement_interval(mut self, steps: usize) -> Self {
        self.refinement_interval = Some(steps);
        self
    }
    pub fn global_refinement(mut self, level: u32) -> Self {
        self.global_refinement = Some(level);
        self
    }
    pub fn volume_quadrature_points(mut self, n: usize) -> Self {
        self.volume_quadrature_points = Some(n);
        self
    }
    pub fn face_quadrature_points(mut self, n: usize) -> Self {
        self.face_quadrature_points = Some(n);
        self
    }
    pub fn viscosity(mut self, viscosity: f64) -> Self {
        self.viscosity = Some(viscosity);
        self
    }
    pub fn solid_dirichlet_bcs<I: IntoIterator<Item = BoundaryId>>(mut self, ids: I) -> Self {
        self.solid_dirichlet_bcs = Some(ids.into_iter().collect());
        self
    }
    pub fn point_location(mut self, strategy: LocatorStrategy) -> Self {
        self.point_location = Some(strategy);
        self
    }

    pub fn build(self) -> Result<CouplingConfig, ConfigError> {
        let time = TimeConfig {
            end_time: self
                .end_time
                .ok_or(ConfigError::MissingParameter("end_time"))?,
            time_step: self
                .time_step
                .ok_or(ConfigError::MissingParameter("time_step"))?,
            output_interval: self
                .output_interval
                .ok_or(ConfigError::MissingParameter("output_interval"))?,
            refinement_interval: self
                .refinement_interval
                .ok_or(ConfigError::MissingParameter("refinement_interval"))?,
        };
        let discretization = DiscretizationConfig {
            global_refinement: self
                .global_refinement
                .ok_or(ConfigError::MissingParameter("global_refinement"))?,
            volume_quadrature_points: self
                .volume_quadrature_points
                .ok_or(ConfigError::MissingParameter("volume_quadrature_points"))?,
            face_quadrature_points: self
                .face_quadrature_points
                .ok_or(ConfigError::MissingParameter("face_quadrature_points"))?,
        };
        let config = CouplingConfig {
            time,
            discretization,
            viscosity: self
                .viscosity
                .ok_or(ConfigError::MissingParameter("viscosity"))?,
            solid_dirichlet_bcs: self.solid_dirichlet_bcs.unwrap_or_default(),
            point_location: self.point_location.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl CouplingConfig {
    /// Checks every parameter range. Called by the builder; exposed for
    /// configurations assembled by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |parameter, reason: String| Err(ConfigError::Invalid { parameter, reason });

        if !(self.time.end_time.is_finite() && self.time.end_time > 0.0) {
            return invalid("end_time", format!("must be positive, got {}", self.time.end_time));
        }
        if !(self.time.time_step.is_finite() && self.time.time_step > 0.0) {
            return invalid("time_step", format!("must be positive, got {}", self.time.time_step));
        }
        if self.time.output_interval == 0 {
            return invalid("output_interval", "must be at least 1".to_string());
        }
        if self.time.refinement_interval == 0 {
            return invalid("refinement_interval", "must be at least 1".to_string());
        }
        if !(self.viscosity.is_finite() && self.viscosity >= 0.0) {
            return invalid("viscosity", format!("must be non-negative, got {}", self.viscosity));
        }
        for (parameter, n) in [
            ("volume_quadrature_points", self.discretization.volume_quadrature_points),
            ("face_quadrature_points", self.discretization.face_quadrature_points),
        ] {
            if !(1..=MAX_QUADRATURE_POINTS).contains(&n) {
                return invalid(
                    parameter,
                    format!("must be between 1 and {MAX_QUADRATURE_POINTS}, got {n}"),
                );
            }
        }
        Ok(())
    }
}
