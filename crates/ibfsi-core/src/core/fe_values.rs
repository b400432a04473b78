use super::models::element::ElementGeometry;
use super::models::ids::{ElementId, FacetKey};
use super::models::mesh::{Mesh, MeshError};
use super::quadrature::{FaceQuadrature, QuadratureFormula};
use nalgebra::{Point2, Vector2};

/// Shape data at one point of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct PointValues {
    /// Physical location of the point.
    pub point: Point2<f64>,
    /// Shape function values, one per element vertex.
    pub shape: Vec<f64>,
    /// Shape function gradients in physical coordinates.
    pub gradients: Vec<Vector2<f64>>,
    /// Quadrature weight times Jacobian determinant; zero for points that are
    /// not quadrature points.
    pub jxw: f64,
}

impl PointValues {
    /// Shape data at an arbitrary reference point of an element.
    pub fn at_reference(geometry: &ElementGeometry, xi: &Point2<f64>) -> Result<Self, MeshError> {
        let (gradients, _) = geometry.physical_gradients(xi)?;
        Ok(Self {
            point: geometry.map_to_physical(xi),
            shape: geometry.kind().shape_values(xi),
            gradients,
            jxw: 0.0,
        })
    }
}

/// Quadrature data for every volume quadrature point of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementValues {
    element: ElementId,
    points: Vec<PointValues>,
}

impl ElementValues {
    pub fn reinit(
        mesh: &Mesh,
        element: ElementId,
        quadrature: &QuadratureFormula,
    ) -> Result<Self, MeshError> {
        let geometry = mesh.geometry(element)?;
        let points = quadrature
            .points(geometry.kind())
            .iter()
            .map(|qp| {
                let (gradients, det) = geometry.physical_gradients(&qp.reference)?;
                Ok(PointValues {
                    point: geometry.map_to_physical(&qp.reference),
                    shape: geometry.kind().shape_values(&qp.reference),
                    gradients,
                    jxw: qp.weight * det,
                })
            })
            .collect::<Result<Vec<_>, MeshError>>()?;
        Ok(Self { element, points })
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn points(&self) -> &[PointValues] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Physical quadrature points of one element, without shape data.
pub fn quadrature_points(
    mesh: &Mesh,
    element: ElementId,
    quadrature: &QuadratureFormula,
) -> Result<Vec<Point2<f64>>, MeshError> {
    let geometry = mesh.geometry(element)?;
    Ok(quadrature
        .points(geometry.kind())
        .iter()
        .map(|qp| geometry.map_to_physical(&qp.reference))
        .collect())
}

/// Quadrature data at one point of a boundary facet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePointValues {
    pub point: Point2<f64>,
    /// Outward unit normal of the facet.
    pub normal: Vector2<f64>,
    pub jxw: f64,
}

/// Face quadrature data on the current geometry of a facet.
pub fn face_values(
    mesh: &Mesh,
    facet: FacetKey,
    quadrature: &FaceQuadrature,
) -> Result<Vec<FacePointValues>, MeshError> {
    let geometry = mesh.geometry(facet.element)?;
    let not_a_face = || MeshError::NotABoundaryFacet {
        element: facet.element,
        face: facet.face,
    };
    let (a, b) = geometry.face(facet.face).ok_or_else(not_a_face)?;
    let normal = geometry.outward_normal(facet.face).ok_or_else(not_a_face)?;
    let half_length = 0.5 * (b - a).norm();
    let midpoint = (a.coords + b.coords) * 0.5;
    let half_edge = (b - a) * 0.5;

    Ok(quadrature
        .points()
        .iter()
        .map(|&(s, w)| FacePointValues {
            point: Point2::from(midpoint + half_edge * s),
            normal,
            jxw: w * half_length,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::MeshBuilder;
    use crate::core::models::element::ElementKind;

    const TOLERANCE: f64 = 1e-12;

    fn square() -> Mesh {
        MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0), [1, 1]).unwrap()
    }

    #[test]
    fn element_values_jxw_sums_to_area() {
        let mesh = square();
        let quadrature = QuadratureFormula::gauss(2).unwrap();
        let element = mesh.element_ids().next().unwrap();
        let values = ElementValues::reinit(&mesh, element, &quadrature).unwrap();
        assert_eq!(values.len(), 4);
        let area: f64 = values.points().iter().map(|p| p.jxw).sum();
        assert!((area - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn element_values_gradients_reproduce_linear_field() {
        let mesh = MeshBuilder::disk(Point2::new(0.1, -0.2), 1.0, 6, 2).unwrap();
        let quadrature = QuadratureFormula::gauss(3).unwrap();
        for element in mesh.element_ids() {
            let values = ElementValues::reinit(&mesh, element, &quadrature).unwrap();
            let vertices = mesh.element(element).unwrap().vertices();
            for p in values.points() {
                // f(x, y) = 3x - 2y has gradient (3, -2) everywhere.
                let grad = vertices
                    .iter()
                    .zip(&p.gradients)
                    .fold(Vector2::zeros(), |acc, (&v, g)| {
                        let x = mesh.vertex(v).unwrap();
                        acc + g * (3.0 * x.x - 2.0 * x.y)
                    });
                assert!((grad - Vector2::new(3.0, -2.0)).norm() < 1e-10);
            }
        }
    }

    #[test]
    fn quadrature_points_lie_inside_their_element() {
        let mesh = square();
        let quadrature = QuadratureFormula::gauss(3).unwrap();
        let element = mesh.element_ids().next().unwrap();
        let points = quadrature_points(&mesh, element, &quadrature).unwrap();
        assert_eq!(points.len(), quadrature.size(ElementKind::Quad4));
        assert!(points.iter().all(|p| p.x > 0.0 && p.x < 2.0 && p.y > 0.0 && p.y < 2.0));
    }

    #[test]
    fn face_values_integrate_facet_length_with_outward_normal() {
        let mesh = square();
        let quadrature = FaceQuadrature::gauss(2).unwrap();
        let (facet, id) = mesh.boundary_facets().next().unwrap();
        assert_eq!(id, 2);
        let values = face_values(&mesh, facet, &quadrature).unwrap();
        let length: f64 = values.iter().map(|v| v.jxw).sum();
        assert!((length - 2.0).abs() < TOLERANCE);
        assert!(values.iter().all(|v| (v.normal - Vector2::new(0.0, -1.0)).norm() < TOLERANCE));
        assert!(values.iter().all(|v| v.point.y.abs() < TOLERANCE));
    }
}
