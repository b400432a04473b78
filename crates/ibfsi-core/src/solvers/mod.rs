//! # Solver Contracts
//!
//! The coupling engine never assembles or solves equations itself. It drives a
//! fluid solver and a solid solver through the two traits below, reading their
//! fields and meshes, handing them the forcing computed at the interface and
//! asking them to advance by one step.
//!
//! [`reference`] provides prescribed-motion implementations of both traits
//! that are used to exercise the engine end to end.

use crate::core::fields::{CellProperties, ScalarField, StressField, VectorField};
use crate::core::models::ids::BoundaryId;
use crate::core::models::mesh::{Mesh, MeshError};
use crate::core::quadrature::{FaceQuadrature, QuadratureFormula};
use nalgebra::{Matrix2, Point2, Vector2};
use std::collections::BTreeSet;
use thiserror::Error;

pub mod reference;

/// Time-dependent boundary value: `(point, component, time) → value`.
pub type BoundaryValueFn = Box<dyn Fn(&Point2<f64>, usize, f64) -> f64 + Send + Sync>;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Step did not converge: {0}")]
    Diverged(String),

    #[error("Coupling data does not match the solver's traversal: {0}")]
    Contract(String),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}

/// The fluid solution a caller can inspect between steps.
#[derive(Debug, Clone, Copy)]
pub struct FluidSolution<'a> {
    pub velocity: &'a VectorField,
    pub pressure: &'a ScalarField,
}

pub trait FluidSolver {
    fn mesh(&self) -> &Mesh;

    /// Volume quadrature used when the fluid integrates the FSI forcing.
    fn volume_quadrature(&self) -> &QuadratureFormula;

    fn present_velocity(&self) -> &VectorField;
    fn present_pressure(&self) -> &ScalarField;

    /// Velocity change over the last completed step.
    fn velocity_increment(&self) -> &VectorField;

    fn cell_properties(&self) -> &CellProperties;
    fn cell_properties_mut(&mut self) -> &mut CellProperties;

    fn add_boundary_condition(&mut self, boundary_id: BoundaryId, value: BoundaryValueFn);

    /// Stress and acceleration discrepancies, one entry per quadrature point
    /// of every immersed element in the fluid's own traversal order.
    fn set_fsi_forcing(&mut self, stress: Vec<Matrix2<f64>>, acceleration: Vec<Vector2<f64>>);

    fn initialize(&mut self) -> Result<(), SolverError> {
        Ok(())
    }

    fn step(&mut self, first_step: bool) -> Result<(), SolverError>;

    fn current_solution(&self) -> FluidSolution<'_> {
        FluidSolution {
            velocity: self.present_velocity(),
            pressure: self.present_pressure(),
        }
    }
}

/// Split borrow of the solid: its mesh mutably and its fields read-only, so
/// the mesh can be displaced by the solid's own displacement.
pub struct SolidStateMut<'a> {
    pub mesh: &'a mut Mesh,
    pub displacement: &'a VectorField,
    pub acceleration: &'a VectorField,
    pub stress: &'a StressField,
}

pub trait SolidSolver {
    /// The solid mesh in its reference (undeformed) configuration.
    fn mesh(&self) -> &Mesh;

    fn face_quadrature(&self) -> &FaceQuadrature;

    fn displacement(&self) -> &VectorField;
    fn acceleration(&self) -> &VectorField;
    fn stress(&self) -> &StressField;

    fn state_mut(&mut self) -> SolidStateMut<'_>;

    /// Boundary ids carrying Dirichlet conditions. The driver calls this once
    /// at construction with its configured set; those facets receive no
    /// traction.
    fn set_dirichlet_boundaries(&mut self, ids: &BTreeSet<BoundaryId>);

    /// Fluid traction, one entry per face quadrature point of every
    /// non-Dirichlet boundary facet in the solid's traversal order.
    fn set_fluid_traction(&mut self, traction: Vec<Vector2<f64>>);

    fn initialize(&mut self) -> Result<(), SolverError> {
        Ok(())
    }

    fn step(&mut self, first_step: bool) -> Result<(), SolverError>;
}
