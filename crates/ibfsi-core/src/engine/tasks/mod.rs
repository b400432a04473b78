//! The three interface computations of a coupling step.
//!
//! Each task reads both solvers, computes its result against one fixed mesh
//! configuration and returns plain data; the driver decides when to hand that
//! data to a solver. Element-wise work runs in parallel when the `parallel`
//! feature is enabled, with results collected in traversal order.

use crate::core::fields::{CellProperties, ScalarField, VectorField};
use crate::core::models::mesh::Mesh;
use crate::core::quadrature::QuadratureFormula;
use crate::solvers::FluidSolver;

pub mod force_transfer;
pub mod indicator;
pub mod traction_transfer;

/// Read-only view of the fluid state the tasks sample.
#[derive(Clone, Copy)]
pub struct FluidView<'a> {
    pub mesh: &'a Mesh,
    pub quadrature: &'a QuadratureFormula,
    pub velocity: &'a VectorField,
    pub pressure: &'a ScalarField,
    pub velocity_increment: &'a VectorField,
    pub cells: &'a CellProperties,
}

impl<'a> FluidView<'a> {
    pub fn of<F: FluidSolver + ?Sized>(fluid: &'a F) -> Self {
        Self {
            mesh: fluid.mesh(),
            quadrature: fluid.volume_quadrature(),
            velocity: fluid.present_velocity(),
            pressure: fluid.present_pressure(),
            velocity_increment: fluid.velocity_increment(),
            cells: fluid.cell_properties(),
        }
    }
}
