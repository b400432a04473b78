//! Nodal finite element fields and per-cell properties.
//!
//! Fields are isoparametric: one value per mesh vertex, interpolated with the
//! element shape functions. A field can be evaluated at a quadrature point of a
//! known element (from [`PointValues`]) or at an arbitrary physical point
//! through a [`FieldSample`], which locates the point once and then serves any
//! number of fields defined on the same mesh.

use super::fe_values::PointValues;
use super::geometry::locator::{GeometricQueryFailure, PointLocator};
use super::models::element::Element;
use super::models::ids::{ElementId, VertexId};
use super::models::mesh::{Mesh, MeshError};
use nalgebra::{Matrix2, Point2, Vector2};
use slotmap::SecondaryMap;
use std::fmt::Debug;
use std::ops::{Add, Mul};
use thiserror::Error;

/// Failure to evaluate a field at a physical point.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error(transparent)]
    Unresolved(#[from] GeometricQueryFailure),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Values a nodal field can carry.
pub trait FieldValue:
    Copy + Debug + PartialEq + Send + Sync + Add<Output = Self> + Mul<f64, Output = Self>
{
    fn zero() -> Self;
}

impl FieldValue for f64 {
    fn zero() -> Self {
        0.0
    }
}

impl FieldValue for Vector2<f64> {
    fn zero() -> Self {
        Vector2::zeros()
    }
}

/// A field with one value per mesh vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct NodalField<T: FieldValue> {
    values: SecondaryMap<VertexId, T>,
}

pub type ScalarField = NodalField<f64>;
pub type VectorField = NodalField<Vector2<f64>>;

impl<T: FieldValue> NodalField<T> {
    /// A field that is zero at every vertex of `mesh`.
    pub fn zeros(mesh: &Mesh) -> Self {
        Self::from_fn(mesh, |_| T::zero())
    }

    /// Samples `f` at every vertex of `mesh`.
    pub fn from_fn<F: Fn(&Point2<f64>) -> T>(mesh: &Mesh, f: F) -> Self {
        let mut values = SecondaryMap::with_capacity(mesh.n_vertices());
        for (id, position) in mesh.vertices_iter() {
            values.insert(id, f(position));
        }
        Self { values }
    }

    pub fn get(&self, vertex: VertexId) -> Option<T> {
        self.values.get(vertex).copied()
    }

    pub fn set(&mut self, vertex: VertexId, value: T) {
        self.values.insert(vertex, value);
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.values.contains_key(vertex)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, T)> + '_ {
        self.values.iter().map(|(id, value)| (id, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Interpolates the field inside `element` with the given shape values.
    pub fn value_in(&self, element: &Element, shape: &[f64]) -> Result<T, MeshError> {
        element
            .vertices()
            .iter()
            .zip(shape)
            .try_fold(T::zero(), |acc, (&v, &n)| {
                let value = self.get(v).ok_or(MeshError::MissingNodalValue(v))?;
                Ok(acc + value * n)
            })
    }
}

impl VectorField {
    /// Gradient inside `element`, `(∇v)_ij = ∂v_i / ∂x_j`.
    pub fn gradient_in(
        &self,
        element: &Element,
        gradients: &[Vector2<f64>],
    ) -> Result<Matrix2<f64>, MeshError> {
        element
            .vertices()
            .iter()
            .zip(gradients)
            .try_fold(Matrix2::zeros(), |acc, (&v, g)| {
                let value = self.get(v).ok_or(MeshError::MissingNodalValue(v))?;
                Ok(acc + value * g.transpose())
            })
    }
}

/// A physical point located in a mesh, ready to interpolate fields on it.
pub struct FieldSample<'m> {
    element: &'m Element,
    values: PointValues,
}

impl<'m> FieldSample<'m> {
    /// Locates `point` in the locator's mesh. A point outside every element
    /// is reported as [`FieldError::Unresolved`].
    pub fn locate(locator: &PointLocator<'m>, point: &Point2<f64>) -> Result<Self, FieldError> {
        let location = locator.try_locate(point)?;
        let mesh = locator.mesh();
        let element = mesh
            .element(location.element)
            .ok_or(MeshError::UnknownElement(location.element))?;
        let geometry = mesh.geometry_of(element)?;
        let values = PointValues::at_reference(&geometry, &location.reference)?;
        Ok(Self { element, values })
    }

    pub fn value<T: FieldValue>(&self, field: &NodalField<T>) -> Result<T, MeshError> {
        field.value_in(self.element, &self.values.shape)
    }

    pub fn gradient(&self, field: &VectorField) -> Result<Matrix2<f64>, MeshError> {
        field.gradient_in(self.element, &self.values.gradients)
    }

    pub fn stress(&self, field: &StressField) -> Result<Matrix2<f64>, MeshError> {
        field.value_in(self.element, &self.values.shape)
    }
}

/// A symmetric-or-not 2×2 tensor field stored component-wise, one scalar field
/// per component.
#[derive(Debug, Clone, PartialEq)]
pub struct StressField {
    components: [[ScalarField; 2]; 2],
}

impl StressField {
    pub fn zeros(mesh: &Mesh) -> Self {
        Self {
            components: std::array::from_fn(|_| std::array::from_fn(|_| ScalarField::zeros(mesh))),
        }
    }

    pub fn from_fn<F: Fn(&Point2<f64>) -> Matrix2<f64>>(mesh: &Mesh, f: F) -> Self {
        Self {
            components: std::array::from_fn(|i| {
                std::array::from_fn(|j| ScalarField::from_fn(mesh, |p| f(p)[(i, j)]))
            }),
        }
    }

    pub fn value_in(&self, element: &Element, shape: &[f64]) -> Result<Matrix2<f64>, MeshError> {
        let mut value = Matrix2::zeros();
        for i in 0..2 {
            for j in 0..2 {
                value[(i, j)] = self.components[i][j].value_in(element, shape)?;
            }
        }
        Ok(value)
    }
}

/// Per-element material data of the fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellProperty {
    /// `true` if the element lies entirely inside the solid.
    pub indicator: bool,
    pub viscosity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellProperties {
    cells: SecondaryMap<ElementId, CellProperty>,
}

impl CellProperties {
    /// Pure-fluid properties with a uniform viscosity on every element.
    pub fn uniform(mesh: &Mesh, viscosity: f64) -> Self {
        let mut cells = SecondaryMap::with_capacity(mesh.n_elements());
        for id in mesh.element_ids() {
            cells.insert(
                id,
                CellProperty {
                    indicator: false,
                    viscosity,
                },
            );
        }
        Self { cells }
    }

    pub fn get(&self, element: ElementId) -> Option<&CellProperty> {
        self.cells.get(element)
    }

    pub fn is_immersed(&self, element: ElementId) -> bool {
        self.cells.get(element).is_some_and(|cell| cell.indicator)
    }

    pub fn set_indicator(&mut self, element: ElementId, immersed: bool) -> Result<(), MeshError> {
        let cell = self
            .cells
            .get_mut(element)
            .ok_or(MeshError::UnknownElement(element))?;
        cell.indicator = immersed;
        Ok(())
    }

    pub fn n_immersed(&self) -> usize {
        self.cells.values().filter(|cell| cell.indicator).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::locator::LocatorStrategy;
    use crate::core::models::builder::MeshBuilder;

    const TOLERANCE: f64 = 1e-10;

    fn mesh() -> Mesh {
        MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [3, 3]).unwrap()
    }

    #[test]
    fn linear_fields_are_reproduced_exactly_at_arbitrary_points() {
        let mesh = mesh();
        let locator = PointLocator::new(&mesh, LocatorStrategy::KdTree).unwrap();
        let field = ScalarField::from_fn(&mesh, |p| 2.0 * p.x - p.y + 0.5);
        let sample = FieldSample::locate(&locator, &Point2::new(0.41, 0.77)).unwrap();
        let value = sample.value(&field).unwrap();
        assert!((value - (2.0 * 0.41 - 0.77 + 0.5)).abs() < TOLERANCE);
    }

    #[test]
    fn vector_gradient_uses_row_per_component_convention() {
        let mesh = mesh();
        let locator = PointLocator::linear(&mesh);
        // v = (3y, -x) has ∂v_0/∂x_1 = 3 and ∂v_1/∂x_0 = -1.
        let field = VectorField::from_fn(&mesh, |p| Vector2::new(3.0 * p.y, -p.x));
        let sample = FieldSample::locate(&locator, &Point2::new(0.5, 0.2)).unwrap();
        let grad = sample.gradient(&field).unwrap();
        assert!((grad - Matrix2::new(0.0, 3.0, -1.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn sample_outside_the_mesh_is_unresolved() {
        let mesh = mesh();
        let locator = PointLocator::linear(&mesh);
        assert!(matches!(
            FieldSample::locate(&locator, &Point2::new(1.5, 0.5)),
            Err(FieldError::Unresolved(failure)) if failure.point == Point2::new(1.5, 0.5)
        ));
    }

    #[test]
    fn value_in_reports_missing_vertex_values() {
        let mesh = mesh();
        let other = MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [1, 1])
            .unwrap();
        let field = ScalarField::zeros(&other);
        let element = mesh.elements_iter().last().unwrap().1;
        assert!(matches!(
            field.value_in(element, &[0.25; 4]),
            Err(MeshError::MissingNodalValue(_))
        ));
    }

    #[test]
    fn stress_field_interpolates_component_wise() {
        let mesh = mesh();
        let locator = PointLocator::linear(&mesh);
        let stress = StressField::from_fn(&mesh, |p| Matrix2::new(p.x, 1.0, -1.0, p.y));
        let sample = FieldSample::locate(&locator, &Point2::new(0.3, 0.6)).unwrap();
        let value = sample.stress(&stress).unwrap();
        assert!((value - Matrix2::new(0.3, 1.0, -1.0, 0.6)).norm() < TOLERANCE);
    }

    #[test]
    fn cell_properties_track_indicator() {
        let mesh = mesh();
        let mut cells = CellProperties::uniform(&mesh, 0.01);
        assert_eq!(cells.n_immersed(), 0);
        let id = mesh.element_ids().nth(4).unwrap();
        cells.set_indicator(id, true).unwrap();
        assert!(cells.is_immersed(id));
        assert_eq!(cells.n_immersed(), 1);
        assert_eq!(cells.get(id).unwrap().viscosity, 0.01);
    }
}
