use super::spatial_index::SpatialIndex;
use crate::core::models::element::ElementGeometry;
use crate::core::models::ids::ElementId;
use crate::core::models::mesh::{Mesh, MeshError};
use nalgebra::Point2;
use thiserror::Error;

/// Tolerances for point-in-element tests, in reference coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocateTolerance {
    /// Slack allowed on each reference-cell constraint.
    pub inside_tol: f64,
    /// Newton iteration cap when inverting the bilinear quad map.
    pub max_newton_iterations: usize,
}

impl Default for LocateTolerance {
    fn default() -> Self {
        Self {
            inside_tol: 1e-10,
            max_newton_iterations: 32,
        }
    }
}

/// How a [`PointLocator`] selects the elements it tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocatorStrategy {
    /// Test every element in arena order.
    Linear,
    /// Test only the candidates returned by a centroid k-d tree.
    #[default]
    KdTree,
}

/// A successfully located point: its element and reference coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub element: ElementId,
    pub reference: Point2<f64>,
}

/// A point that no element of the mesh contains.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("point ({}, {}) could not be located in the mesh", point.x, point.y)]
pub struct GeometricQueryFailure {
    pub point: Point2<f64>,
}

/// Reference coordinates of `point` if the element contains it.
pub fn point_in_element(
    geometry: &ElementGeometry,
    point: &Point2<f64>,
    tolerance: &LocateTolerance,
) -> Option<Point2<f64>> {
    geometry.map_to_reference(point, tolerance.inside_tol, tolerance.max_newton_iterations)
}

/// Returns `true` iff some element of the mesh contains `point` (closed
/// region, default tolerance). Scans every element.
pub fn contains(mesh: &Mesh, point: &Point2<f64>) -> bool {
    PointLocator::linear(mesh).contains(point)
}

/// Point location against one fixed mesh configuration.
///
/// The locator borrows the mesh, so the mesh cannot move while the locator
/// (and any index it built) is alive. Both strategies return the first
/// containing element in arena order and therefore agree exactly.
pub struct PointLocator<'a> {
    mesh: &'a Mesh,
    index: Option<SpatialIndex>,
    tolerance: LocateTolerance,
}

impl<'a> PointLocator<'a> {
    pub fn new(mesh: &'a Mesh, strategy: LocatorStrategy) -> Result<Self, MeshError> {
        let index = match strategy {
            LocatorStrategy::Linear => None,
            LocatorStrategy::KdTree => Some(SpatialIndex::build(mesh)?),
        };
        Ok(Self {
            mesh,
            index,
            tolerance: LocateTolerance::default(),
        })
    }

    pub fn linear(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            index: None,
            tolerance: LocateTolerance::default(),
        }
    }

    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    pub fn contains(&self, point: &Point2<f64>) -> bool {
        self.locate(point).is_some()
    }

    pub fn locate(&self, point: &Point2<f64>) -> Option<Location> {
        let test = |element: ElementId| {
            let geometry = self.mesh.geometry(element).ok()?;
            point_in_element(&geometry, point, &self.tolerance)
                .map(|reference| Location { element, reference })
        };
        match &self.index {
            Some(index) => index.candidates(point).into_iter().find_map(test),
            None => self.mesh.element_ids().find_map(test),
        }
    }

    pub fn try_locate(&self, point: &Point2<f64>) -> Result<Location, GeometricQueryFailure> {
        self.locate(point)
            .ok_or(GeometricQueryFailure { point: *point })
    }
}
