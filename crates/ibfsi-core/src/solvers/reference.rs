//! Prescribed-motion collaborators.
//!
//! Neither solver solves an equation: the fluid follows an analytic flow and
//! the solid a rigid harmonic motion. Both still honour the full contract.
//! They advance their own clock, check the interface data against their own
//! traversal and keep a record of what they received, which makes them
//! suitable for running the coupling engine end to end.

use super::{BoundaryValueFn, FluidSolver, SolidSolver, SolidStateMut, SolverError};
use crate::core::fe_values::face_values;
use crate::core::fields::{CellProperties, ScalarField, StressField, VectorField};
use crate::core::models::ids::{BoundaryId, VertexId};
use crate::core::models::mesh::Mesh;
use crate::core::quadrature::{FaceQuadrature, QuadratureFormula};
use crate::engine::transfer::{immersed_point_order, traction_point_order};
use nalgebra::{Matrix2, Vector2};
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;
use tracing::{debug, trace};

/// `v(x, y) = uniform + (shear_rate · y, 0)` with the linear pressure
/// `p(x) = pressure + pressure_gradient · x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowProfile {
    pub uniform: Vector2<f64>,
    pub shear_rate: f64,
    pub pressure: f64,
    pub pressure_gradient: Vector2<f64>,
}

impl Default for FlowProfile {
    fn default() -> Self {
        Self {
            uniform: Vector2::zeros(),
            shear_rate: 0.0,
            pressure: 0.0,
            pressure_gradient: Vector2::zeros(),
        }
    }
}

pub struct PrescribedFlowFluid {
    mesh: Mesh,
    quadrature: QuadratureFormula,
    profile: FlowProfile,
    time_step: f64,
    time: f64,
    velocity: VectorField,
    pressure: ScalarField,
    increment: VectorField,
    cells: CellProperties,
    boundary_values: BTreeMap<BoundaryId, BoundaryValueFn>,
    forcing: Option<(Vec<Matrix2<f64>>, Vec<Vector2<f64>>)>,
    forcing_magnitude: f64,
    forcing_points: usize,
}

impl PrescribedFlowFluid {
    pub fn new(
        mesh: Mesh,
        quadrature: QuadratureFormula,
        profile: FlowProfile,
        viscosity: f64,
        time_step: f64,
    ) -> Self {
        let cells = CellProperties::uniform(&mesh, viscosity);
        Self {
            velocity: VectorField::zeros(&mesh),
            pressure: ScalarField::from_fn(&mesh, |p| {
                profile.pressure + profile.pressure_gradient.dot(&p.coords)
            }),
            increment: VectorField::zeros(&mesh),
            cells,
            mesh,
            quadrature,
            profile,
            time_step,
            time: 0.0,
            boundary_values: BTreeMap::new(),
            forcing: None,
            forcing_magnitude: 0.0,
            forcing_points: 0,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Largest Frobenius norm of the stress discrepancy received in the last step.
    pub fn forcing_magnitude(&self) -> f64 {
        self.forcing_magnitude
    }

    pub fn forcing_points(&self) -> usize {
        self.forcing_points
    }

    /// Every vertex on a facet tagged with `id`.
    fn boundary_vertices(&self, id: BoundaryId) -> BTreeSet<VertexId> {
        self.mesh
            .boundary_facets()
            .filter(|&(_, facet_id)| facet_id == id)
            .filter_map(|(facet, _)| {
                self.mesh
                    .element(facet.element)
                    .and_then(|element| element.face_vertices(facet.face))
            })
            .flat_map(|(a, b)| [a, b])
            .collect()
    }

    fn velocity_at(&self, time: f64) -> VectorField {
        let profile = self.profile;
        let mut velocity = VectorField::from_fn(&self.mesh, |p| {
            profile.uniform + Vector2::new(profile.shear_rate * p.y, 0.0)
        });
        for (&id, value) in &self.boundary_values {
            for vertex in self.boundary_vertices(id) {
                if let Some(p) = self.mesh.vertex(vertex) {
                    velocity.set(vertex, Vector2::new(value(p, 0, time), value(p, 1, time)));
                }
            }
        }
        velocity
    }

    fn check_forcing(&mut self) -> Result<(), SolverError> {
        let expected = immersed_point_order(&self.mesh, &self.cells, &self.quadrature).len();
        let (stress, acceleration) = self
            .forcing
            .take()
            .ok_or_else(|| SolverError::Contract("no FSI forcing was set before the step".into()))?;
        if stress.len() != expected || acceleration.len() != expected {
            return Err(SolverError::Contract(format!(
                "expected {expected} forcing entries, got {} stress and {} acceleration",
                stress.len(),
                acceleration.len()
            )));
        }
        self.forcing_points = expected;
        self.forcing_magnitude = stress.iter().map(|s| s.norm()).fold(0.0, f64::max);
        Ok(())
    }
}

impl FluidSolver for PrescribedFlowFluid {
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn volume_quadrature(&self) -> &QuadratureFormula {
        &self.quadrature
    }

    fn present_velocity(&self) -> &VectorField {
        &self.velocity
    }

    fn present_pressure(&self) -> &ScalarField {
        &self.pressure
    }

    fn velocity_increment(&self) -> &VectorField {
        &self.increment
    }

    fn cell_properties(&self) -> &CellProperties {
        &self.cells
    }

    fn cell_properties_mut(&mut self) -> &mut CellProperties {
        &mut self.cells
    }

    fn add_boundary_condition(&mut self, boundary_id: BoundaryId, value: BoundaryValueFn) {
        self.boundary_values.insert(boundary_id, value);
    }

    fn set_fsi_forcing(&mut self, stress: Vec<Matrix2<f64>>, acceleration: Vec<Vector2<f64>>) {
        self.forcing = Some((stress, acceleration));
    }

    fn initialize(&mut self) -> Result<(), SolverError> {
        self.time = 0.0;
        self.velocity = self.velocity_at(0.0);
        self.increment = VectorField::zeros(&self.mesh);
        debug!(
            vertices = self.mesh.n_vertices(),
            boundary_conditions = self.boundary_values.len(),
            "Prescribed flow initialized."
        );
        Ok(())
    }

    fn step(&mut self, first_step: bool) -> Result<(), SolverError> {
        self.check_forcing()?;

        let time = self.time + self.time_step;
        let velocity = self.velocity_at(time);
        let mut increment = VectorField::zeros(&self.mesh);
        for (vertex, new) in velocity.iter() {
            let old = self.velocity.get(vertex).unwrap_or_else(Vector2::zeros);
            let delta = new - old;
            if !(delta.x.is_finite() && delta.y.is_finite()) {
                return Err(SolverError::Diverged(format!(
                    "non-finite velocity at t = {time}"
                )));
            }
            increment.set(vertex, delta);
        }

        self.velocity = velocity;
        self.increment = increment;
        self.time = time;
        trace!(first_step, time, forcing_points = self.forcing_points, "Fluid step.");
        Ok(())
    }
}

/// Rigid harmonic translation `u(t) = A · sin(2π f t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicMotion {
    pub amplitude: Vector2<f64>,
    pub frequency: f64,
}

impl HarmonicMotion {
    pub fn displacement(&self, time: f64) -> Vector2<f64> {
        self.amplitude * (TAU * self.frequency * time).sin()
    }

    pub fn acceleration(&self, time: f64) -> Vector2<f64> {
        let omega = TAU * self.frequency;
        -self.amplitude * (omega * omega * (omega * time).sin())
    }
}

pub struct PrescribedMotionSolid {
    mesh: Mesh,
    quadrature: FaceQuadrature,
    motion: HarmonicMotion,
    dirichlet: BTreeSet<BoundaryId>,
    time_step: f64,
    time: f64,
    displacement: VectorField,
    acceleration: VectorField,
    stress: StressField,
    traction: Option<Vec<Vector2<f64>>>,
    net_force: Vector2<f64>,
}

impl PrescribedMotionSolid {
    /// Every boundary facet receives traction until the driver hands over its
    /// Dirichlet set.
    pub fn new(
        mesh: Mesh,
        quadrature: FaceQuadrature,
        motion: HarmonicMotion,
        time_step: f64,
    ) -> Self {
        Self {
            displacement: VectorField::zeros(&mesh),
            acceleration: VectorField::zeros(&mesh),
            stress: StressField::zeros(&mesh),
            mesh,
            quadrature,
            motion,
            dirichlet: BTreeSet::new(),
            time_step,
            time: 0.0,
            traction: None,
            net_force: Vector2::zeros(),
        }
    }

    /// Carries a constant Cauchy stress instead of the stress-free rigid state.
    pub fn with_uniform_stress(mut self, stress: Matrix2<f64>) -> Self {
        self.stress = StressField::from_fn(&self.mesh, |_| stress);
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Net fluid force on the non-Dirichlet boundary from the last traction received.
    pub fn net_force(&self) -> Vector2<f64> {
        self.net_force
    }

    fn update_fields(&mut self) {
        let u = self.motion.displacement(self.time);
        let a = self.motion.acceleration(self.time);
        self.displacement = VectorField::from_fn(&self.mesh, |_| u);
        self.acceleration = VectorField::from_fn(&self.mesh, |_| a);
    }

    fn integrate_traction(&mut self) -> Result<(), SolverError> {
        let traction = self
            .traction
            .take()
            .ok_or_else(|| {
                SolverError::Contract("no fluid traction was set before the step".into())
            })?;
        let expected = traction_point_order(&self.mesh, &self.dirichlet, &self.quadrature).len();
        if traction.len() != expected {
            return Err(SolverError::Contract(format!(
                "expected {expected} traction entries, got {}",
                traction.len()
            )));
        }

        let mut net_force = Vector2::zeros();
        let mut values = traction.iter();
        for (facet, id) in self.mesh.boundary_facets() {
            if self.dirichlet.contains(&id) {
                continue;
            }
            for fv in face_values(&self.mesh, facet, &self.quadrature)? {
                if let Some(t) = values.next() {
                    net_force += t * fv.jxw;
                }
            }
        }
        self.net_force = net_force;
        Ok(())
    }
}

impl SolidSolver for PrescribedMotionSolid {
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn face_quadrature(&self) -> &FaceQuadrature {
        &self.quadrature
    }

    fn displacement(&self) -> &VectorField {
        &self.displacement
    }

    fn acceleration(&self) -> &VectorField {
        &self.acceleration
    }

    fn stress(&self) -> &StressField {
        &self.stress
    }

    fn state_mut(&mut self) -> SolidStateMut<'_> {
        SolidStateMut {
            mesh: &mut self.mesh,
            displacement: &self.displacement,
            acceleration: &self.acceleration,
            stress: &self.stress,
        }
    }

    fn set_dirichlet_boundaries(&mut self, ids: &BTreeSet<BoundaryId>) {
        self.dirichlet = ids.clone();
    }

    fn set_fluid_traction(&mut self, traction: Vec<Vector2<f64>>) {
        self.traction = Some(traction);
    }

    fn initialize(&mut self) -> Result<(), SolverError> {
        self.time = 0.0;
        self.update_fields();
        debug!(
            cells = self.mesh.n_elements(),
            dirichlet = self.dirichlet.len(),
            "Prescribed solid motion initialized."
        );
        Ok(())
    }

    fn step(&mut self, first_step: bool) -> Result<(), SolverError> {
        self.integrate_traction()?;
        self.time += self.time_step;
        self.update_fields();
        trace!(
            first_step,
            time = self.time,
            fx = self.net_force.x,
            fy = self.net_force.y,
            "Solid step."
        );
        Ok(())
    }
}
