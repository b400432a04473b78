use super::FluidView;
use crate::core::fe_values::face_values;
use crate::core::fields::{FieldError, FieldSample};
use crate::core::geometry::locator::{LocatorStrategy, PointLocator};
use crate::core::models::ids::{BoundaryId, FacetKey};
use crate::core::models::mesh::{Mesh, MeshError};
use crate::core::quadrature::FaceQuadrature;
use crate::engine::error::EngineError;
use crate::engine::transfer::{PointKey, TransferMap};
use crate::solvers::{FluidSolver, SolidSolver};
use nalgebra::{Matrix2, Point2, Vector2};
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace, warn};

const PHASE: &str = "traction";

/// Fluid traction at every face quadrature point of every non-Dirichlet
/// boundary facet of the solid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TractionTransfer {
    pub traction: TransferMap<FacetKey, Vector2<f64>>,
    /// Points the fluid mesh could not resolve; they carry zero traction.
    pub unresolved: usize,
}

impl TractionTransfer {
    pub fn len(&self) -> usize {
        self.traction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traction.is_empty()
    }

    pub fn flatten(&self, order: &[PointKey<FacetKey>]) -> Result<Vec<Vector2<f64>>, EngineError> {
        self.traction.flatten(order.iter().copied(), PHASE)
    }
}

/// Fluid traction `σ·n` at `point`, or `None` if the fluid mesh does not
/// cover it.
fn fluid_traction(
    fluid: &FluidView<'_>,
    locator: &PointLocator<'_>,
    point: &Point2<f64>,
    normal: &Vector2<f64>,
    viscosity: f64,
) -> Result<Option<Vector2<f64>>, MeshError> {
    let sample = match FieldSample::locate(locator, point) {
        Ok(sample) => sample,
        Err(FieldError::Unresolved(failure)) => {
            trace!(x = failure.point.x, y = failure.point.y, "Point outside the fluid.");
            return Ok(None);
        }
        Err(FieldError::Mesh(error)) => return Err(error),
    };
    let grad_v = sample.gradient(fluid.velocity)?;
    let p = sample.value(fluid.pressure)?;
    let sigma = Matrix2::identity() * -p + (grad_v + grad_v.transpose()) * (0.5 * viscosity);
    Ok(Some(sigma * normal))
}

/// Computes the traction on the undeformed solid boundary.
///
/// Quadrature points and normals come from the solid mesh as given (reference
/// configuration); each point is located in the fluid mesh to sample the fluid
/// stress with the configured viscosity.
pub fn compute(
    solid_mesh: &Mesh,
    dirichlet: &BTreeSet<BoundaryId>,
    quadrature: &FaceQuadrature,
    fluid: &FluidView<'_>,
    viscosity: f64,
    strategy: LocatorStrategy,
) -> Result<TractionTransfer, MeshError> {
    let locator = PointLocator::new(fluid.mesh, strategy)?;
    let mut transfer = TractionTransfer::default();

    for (facet, boundary_id) in solid_mesh.boundary_facets() {
        if dirichlet.contains(&boundary_id) {
            continue;
        }
        for (q, fv) in face_values(solid_mesh, facet, quadrature)?.iter().enumerate() {
            let sampled = fluid_traction(fluid, &locator, &fv.point, &fv.normal, viscosity)?;
            let traction = match sampled {
                Some(traction) => traction,
                None => {
                    transfer.unresolved += 1;
                    Vector2::zeros()
                }
            };
            transfer.traction.insert(PointKey::new(facet, q), traction);
        }
    }
    Ok(transfer)
}

#[instrument(skip_all, name = "traction_transfer_task")]
pub fn run<F, S>(
    fluid: &F,
    solid: &S,
    dirichlet: &BTreeSet<BoundaryId>,
    viscosity: f64,
    strategy: LocatorStrategy,
) -> Result<TractionTransfer, EngineError>
where
    F: FluidSolver + ?Sized,
    S: SolidSolver + ?Sized,
{
    let transfer = compute(
        solid.mesh(),
        dirichlet,
        solid.face_quadrature(),
        &FluidView::of(fluid),
        viscosity,
        strategy,
    )?;
    if transfer.unresolved > 0 {
        warn!(
            unresolved = transfer.unresolved,
            points = transfer.len(),
            "Fluid could not resolve some solid boundary points; zero traction used."
        );
    }
    debug!(points = transfer.len(), "Computed fluid traction.");
    Ok(transfer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::{CellProperties, ScalarField, VectorField};
    use crate::core::models::builder::MeshBuilder;
    use crate::core::quadrature::QuadratureFormula;
    use crate::engine::transfer::traction_point_order;

    const TOLERANCE: f64 = 1e-12;

    fn fluid_mesh() -> Mesh {
        MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [4, 4]).unwrap()
    }

    fn compute_with(
        solid: &Mesh,
        dirichlet: &BTreeSet<BoundaryId>,
        velocity: &VectorField,
        pressure: &ScalarField,
        viscosity: f64,
    ) -> TractionTransfer {
        let mesh = fluid_mesh();
        let quadrature = QuadratureFormula::gauss(2).unwrap();
        let increment = VectorField::zeros(&mesh);
        let cells = CellProperties::uniform(&mesh, viscosity);
        let fluid = FluidView {
            mesh: &mesh,
            quadrature: &quadrature,
            velocity,
            pressure,
            velocity_increment: &increment,
            cells: &cells,
        };
        compute(
            solid,
            dirichlet,
            &FaceQuadrature::gauss(2).unwrap(),
            &fluid,
            viscosity,
            LocatorStrategy::KdTree,
        )
        .unwrap()
    }

    #[test]
    fn uniform_pressure_gives_minus_p_times_normal() {
        let mesh = fluid_mesh();
        let solid =
            MeshBuilder::rectangle(Point2::new(0.3, 0.3), Point2::new(0.6, 0.5), [1, 1]).unwrap();
        let velocity = VectorField::zeros(&mesh);
        let pressure = ScalarField::from_fn(&mesh, |_| 4.0);
        let transfer = compute_with(&solid, &BTreeSet::new(), &velocity, &pressure, 1.0);

        assert_eq!(transfer.len(), 4 * 2);
        assert_eq!(transfer.unresolved, 0);
        let order =
            traction_point_order(&solid, &BTreeSet::new(), &FaceQuadrature::gauss(2).unwrap());
        let tractions = transfer.flatten(&order).unwrap();
        // First facet is the bottom one, with normal (0, -1).
        assert!((tractions[0] - Vector2::new(0.0, 4.0)).norm() < TOLERANCE);
        let net = tractions.iter().fold(Vector2::zeros(), |acc, t| acc + t);
        assert!(net.norm() < TOLERANCE);
    }

    #[test]
    fn shear_flow_uses_configured_viscosity() {
        let mesh = fluid_mesh();
        let solid =
            MeshBuilder::rectangle(Point2::new(0.3, 0.3), Point2::new(0.6, 0.5), [1, 1]).unwrap();
        // v = (2y, 0): sym(∇v) has off-diagonal entries 1.
        let velocity = VectorField::from_fn(&mesh, |p| Vector2::new(2.0 * p.y, 0.0));
        let pressure = ScalarField::zeros(&mesh);
        let transfer = compute_with(&solid, &BTreeSet::from([0, 1, 3]), &velocity, &pressure, 0.25);

        // Only the bottom facet (id 2, normal (0, -1)) remains.
        assert_eq!(transfer.len(), 2);
        for t in transfer.traction.values() {
            assert!((t - Vector2::new(-0.25, 0.0)).norm() < 1e-10);
        }
    }

    #[test]
    fn all_dirichlet_boundary_contributes_nothing() {
        let mesh = fluid_mesh();
        let solid = MeshBuilder::disk(Point2::new(0.5, 0.5), 0.2, 8, 1).unwrap();
        let velocity = VectorField::zeros(&mesh);
        let pressure = ScalarField::zeros(&mesh);
        let transfer = compute_with(&solid, &BTreeSet::from([0]), &velocity, &pressure, 1.0);
        assert!(transfer.is_empty());
    }

    #[test]
    fn points_outside_the_fluid_get_zero_traction() {
        let mesh = fluid_mesh();
        let solid =
            MeshBuilder::rectangle(Point2::new(0.8, 0.4), Point2::new(1.4, 0.6), [1, 1]).unwrap();
        let velocity = VectorField::zeros(&mesh);
        let pressure = ScalarField::from_fn(&mesh, |_| 1.0);
        let transfer = compute_with(&solid, &BTreeSet::new(), &velocity, &pressure, 1.0);
        assert_eq!(transfer.len(), 8);
        // Right facet entirely outside, top and bottom facets half outside.
        assert_eq!(transfer.unresolved, 4);
    }
}
