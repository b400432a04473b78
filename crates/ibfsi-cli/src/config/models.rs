use ibfsi::core::models::ids::BoundaryId;
use ibfsi::engine::config::CouplingConfig;
use ibfsi::solvers::reference::{FlowProfile, HarmonicMotion};
use nalgebra::Point2;

pub struct AppConfig {
    pub coupling: CouplingConfig,
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub fluid: FluidScenario,
    pub solid: SolidScenario,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluidScenario {
    pub domain_min: Point2<f64>,
    pub domain_max: Point2<f64>,
    pub subdivisions: [usize; 2],
    pub flow: FlowProfile,
    pub inflow: Option<InflowConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InflowProfile {
    Constant { amplitude: f64 },
    /// `amplitude · exp(-½ ((t - center) / width)²)`
    GaussianPulse { amplitude: f64, center: f64, width: f64 },
}

impl InflowProfile {
    pub fn value(&self, time: f64) -> f64 {
        match *self {
            InflowProfile::Constant { amplitude } => amplitude,
            InflowProfile::GaussianPulse {
                amplitude,
                center,
                width,
            } => amplitude * (-0.5 * ((time - center) / width).powi(2)).exp(),
        }
    }
}

/// Normal velocity imposed on one fluid boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflowConfig {
    pub boundary_id: BoundaryId,
    pub profile: InflowProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidScenario {
    pub center: Point2<f64>,
    pub radius: f64,
    pub sectors: usize,
    pub rings: usize,
    pub motion: HarmonicMotion,
}
