use super::FluidView;
use crate::core::fe_values::ElementValues;
use crate::core::fields::{FieldError, FieldSample, StressField, VectorField};
use crate::core::geometry::locator::{LocatorStrategy, PointLocator};
use crate::core::models::ids::ElementId;
use crate::core::models::mesh::{Mesh, MeshError};
use crate::engine::error::EngineError;
use crate::engine::motion::DisplacedMesh;
use crate::engine::transfer::{PointKey, TransferMap};
use crate::solvers::{FluidSolver, SolidSolver};
use nalgebra::{Matrix2, Point2, Vector2};
use tracing::{debug, instrument, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const PHASE: &str = "force";

/// Stress and acceleration discrepancies (fluid minus solid) at every
/// quadrature point of every immersed fluid element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceTransfer {
    pub stress: TransferMap<ElementId, Matrix2<f64>>,
    pub acceleration: TransferMap<ElementId, Vector2<f64>>,
    /// Points the solid could not resolve; they carry zero discrepancies.
    pub unresolved: usize,
}

impl ForceTransfer {
    pub fn len(&self) -> usize {
        self.stress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stress.is_empty()
    }

    /// The two sequences in the fluid's traversal order.
    pub fn flatten(
        &self,
        order: &[PointKey<ElementId>],
    ) -> Result<(Vec<Matrix2<f64>>, Vec<Vector2<f64>>), EngineError> {
        let stress = self.stress.flatten(order.iter().copied(), PHASE)?;
        let acceleration = self.acceleration.flatten(order.iter().copied(), PHASE)?;
        Ok((stress, acceleration))
    }
}

/// Solid state sampled by the force transfer, with the mesh in its current shape.
#[derive(Clone, Copy)]
pub struct SolidView<'a> {
    pub mesh: &'a Mesh,
    pub acceleration: &'a VectorField,
    pub stress: &'a StressField,
}

struct PointDiscrepancy {
    key: PointKey<ElementId>,
    stress: Matrix2<f64>,
    acceleration: Vector2<f64>,
    resolved: bool,
}

/// Fluid stress `−p·I + μ·sym(∇v)` and material acceleration `dv/dt + (∇v)·v`.
pub fn fluid_state(
    pressure: f64,
    velocity: &Vector2<f64>,
    grad_v: &Matrix2<f64>,
    increment: &Vector2<f64>,
    viscosity: f64,
    time_step: f64,
) -> (Matrix2<f64>, Vector2<f64>) {
    let sym = (grad_v + grad_v.transpose()) * 0.5;
    let stress = Matrix2::identity() * -pressure + sym * viscosity;
    let acceleration = increment / time_step + grad_v * velocity;
    (stress, acceleration)
}

/// Solid stress and acceleration at `point`, or `None` if the solid does not
/// cover it.
fn sample_solid(
    solid: &SolidView<'_>,
    locator: &PointLocator<'_>,
    point: &Point2<f64>,
) -> Result<Option<(Matrix2<f64>, Vector2<f64>)>, MeshError> {
    let sample = match FieldSample::locate(locator, point) {
        Ok(sample) => sample,
        Err(FieldError::Unresolved(failure)) => {
            trace!(x = failure.point.x, y = failure.point.y, "Point outside the solid.");
            return Ok(None);
        }
        Err(FieldError::Mesh(error)) => return Err(error),
    };
    Ok(Some((
        sample.stress(solid.stress)?,
        sample.value(solid.acceleration)?,
    )))
}

fn element_discrepancies(
    id: ElementId,
    fluid: &FluidView<'_>,
    solid: &SolidView<'_>,
    locator: &PointLocator<'_>,
    time_step: f64,
) -> Result<Vec<PointDiscrepancy>, MeshError> {
    let element = fluid.mesh.element(id).ok_or(MeshError::UnknownElement(id))?;
    let viscosity = fluid
        .cells
        .get(id)
        .ok_or(MeshError::UnknownElement(id))?
        .viscosity;
    let values = ElementValues::reinit(fluid.mesh, id, fluid.quadrature)?;

    values
        .points()
        .iter()
        .enumerate()
        .map(|(q, pv)| {
            let v = fluid.velocity.value_in(element, &pv.shape)?;
            let grad_v = fluid.velocity.gradient_in(element, &pv.gradients)?;
            let p = fluid.pressure.value_in(element, &pv.shape)?;
            let dv = fluid.velocity_increment.value_in(element, &pv.shape)?;
            let (fluid_stress, fluid_accel) =
                fluid_state(p, &v, &grad_v, &dv, viscosity, time_step);

            let key = PointKey::new(id, q);
            Ok(match sample_solid(solid, locator, &pv.point)? {
                Some((solid_stress, solid_accel)) => PointDiscrepancy {
                    key,
                    stress: fluid_stress - solid_stress,
                    acceleration: fluid_accel - solid_accel,
                    resolved: true,
                },
                None => PointDiscrepancy {
                    key,
                    stress: Matrix2::zeros(),
                    acceleration: Vector2::zeros(),
                    resolved: false,
                },
            })
        })
        .collect()
}

/// Computes the discrepancies against a solid already in its current shape.
pub fn compute(
    fluid: &FluidView<'_>,
    solid: &SolidView<'_>,
    strategy: LocatorStrategy,
    time_step: f64,
) -> Result<ForceTransfer, MeshError> {
    let locator = PointLocator::new(solid.mesh, strategy)?;
    let immersed: Vec<ElementId> = fluid
        .mesh
        .element_ids()
        .filter(|&id| fluid.cells.is_immersed(id))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = immersed.iter();

    #[cfg(feature = "parallel")]
    let iterator = immersed.par_iter();

    let per_element = iterator
        .map(|&id| element_discrepancies(id, fluid, solid, &locator, time_step))
        .collect::<Result<Vec<_>, MeshError>>()?;

    let n_points: usize = per_element.iter().map(Vec::len).sum();
    let mut transfer = ForceTransfer {
        stress: TransferMap::with_capacity(n_points),
        acceleration: TransferMap::with_capacity(n_points),
        unresolved: 0,
    };
    for point in per_element.into_iter().flatten() {
        if !point.resolved {
            transfer.unresolved += 1;
        }
        transfer.stress.insert(point.key, point.stress);
        transfer.acceleration.insert(point.key, point.acceleration);
    }
    Ok(transfer)
}

/// Computes the force transfer with the solid displaced into its current
/// configuration for the duration of the sampling.
#[instrument(skip_all, name = "force_transfer_task")]
pub fn run<F, S>(
    fluid: &F,
    solid: &mut S,
    strategy: LocatorStrategy,
    time_step: f64,
) -> Result<ForceTransfer, EngineError>
where
    F: FluidSolver + ?Sized,
    S: SolidSolver + ?Sized,
{
    let fluid_view = FluidView::of(fluid);
    let state = solid.state_mut();
    let displaced = DisplacedMesh::new(state.mesh, state.displacement)?;
    let solid_view = SolidView {
        mesh: displaced.mesh(),
        acceleration: state.acceleration,
        stress: state.stress,
    };
    let transfer = compute(&fluid_view, &solid_view, strategy, time_step)?;

    if transfer.unresolved > 0 {
        warn!(
            unresolved = transfer.unresolved,
            points = transfer.len(),
            "Solid could not resolve some immersed quadrature points; zero discrepancy used."
        );
    }
    debug!(points = transfer.len(), "Computed FSI force transfer.");
    Ok(transfer)
}
