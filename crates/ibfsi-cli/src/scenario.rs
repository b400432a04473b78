//! Builds the two reference solvers described by the parameter file.

use crate::config::models::{FluidScenario, InflowProfile, SolidScenario};
use crate::error::{CliError, Result};
use ibfsi::core::models::builder::MeshBuilder;
use ibfsi::core::quadrature::{FaceQuadrature, QuadratureFormula};
use ibfsi::engine::config::CouplingConfig;
use ibfsi::solvers::reference::{PrescribedFlowFluid, PrescribedMotionSolid};
use ibfsi::solvers::{BoundaryValueFn, FluidSolver};
use tracing::{debug, info};

/// x-velocity follows the profile, y-velocity is held at zero.
pub fn inflow_function(profile: InflowProfile) -> BoundaryValueFn {
    Box::new(move |_, component, time| {
        if component == 0 {
            profile.value(time)
        } else {
            0.0
        }
    })
}

/// The fluid mesh is the configured rectangle refined `global_refinement` times.
pub fn build_fluid(
    scenario: &FluidScenario,
    coupling: &CouplingConfig,
) -> Result<PrescribedFlowFluid> {
    let mesh = MeshBuilder::refined_rectangle(
        scenario.domain_min,
        scenario.domain_max,
        scenario.subdivisions,
        coupling.discretization.global_refinement,
    )?;
    let quadrature = QuadratureFormula::gauss(coupling.discretization.volume_quadrature_points)
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!(
        cells = mesh.n_elements(),
        boundary_facets = mesh.n_boundary_facets(),
        "Built fluid mesh."
    );

    let mut fluid = PrescribedFlowFluid::new(
        mesh,
        quadrature,
        scenario.flow,
        coupling.viscosity,
        coupling.time.time_step,
    );
    if let Some(inflow) = scenario.inflow {
        info!(
            boundary_id = inflow.boundary_id,
            "Registering time-dependent inflow: {:?}", inflow.profile
        );
        fluid.add_boundary_condition(inflow.boundary_id, inflow_function(inflow.profile));
    }
    Ok(fluid)
}

pub fn build_solid(
    scenario: &SolidScenario,
    coupling: &CouplingConfig,
) -> Result<PrescribedMotionSolid> {
    let mesh = MeshBuilder::disk(
        scenario.center,
        scenario.radius,
        scenario.sectors,
        scenario.rings,
    )?;
    let quadrature = FaceQuadrature::gauss(coupling.discretization.face_quadrature_points)
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!(cells = mesh.n_elements(), "Built solid mesh.");

    Ok(PrescribedMotionSolid::new(
        mesh,
        quadrature,
        scenario.motion,
        coupling.time.time_step,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builder::merge;
    use crate::config::file::FileConfig;
    use ibfsi::solvers::SolidSolver;
    use nalgebra::Point2;

    #[test]
    fn inflow_sets_only_the_first_component() {
        let f = inflow_function(InflowProfile::Constant { amplitude: 3.0 });
        let p = Point2::new(0.0, 0.5);
        assert_eq!(f(&p, 0, 1.0), 3.0);
        assert_eq!(f(&p, 1, 1.0), 0.0);
    }

    #[test]
    fn fluid_mesh_honours_global_refinement() {
        let app = merge(
            FileConfig::default(),
            &["coupling.global-refinement=1".to_string()],
        )
        .unwrap();
        let fluid = build_fluid(&app.scenario.fluid, &app.coupling).unwrap();
        assert_eq!(fluid.mesh().n_elements(), 16 * 16);
        assert_eq!(fluid.volume_quadrature().n_points_1d(), 2);
    }

    #[test]
    fn solid_uses_configured_face_quadrature() {
        let app = merge(
            FileConfig::default(),
            &["coupling.face-quadrature-points=3".to_string()],
        )
        .unwrap();
        let solid = build_solid(&app.scenario.solid, &app.coupling).unwrap();
        assert_eq!(solid.face_quadrature().size(), 3);
    }

    #[test]
    fn degenerate_solid_is_reported_as_mesh_error() {
        let app = merge(FileConfig::default(), &["solid.radius=0".to_string()]).unwrap();
        assert!(matches!(
            build_solid(&app.scenario.solid, &app.coupling),
            Err(CliError::Mesh(_))
        ));
    }
}
