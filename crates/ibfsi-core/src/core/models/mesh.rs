use super::element::{Element, ElementGeometry, ElementKind};
use super::ids::{BoundaryId, ElementId, FacetKey, VertexId};
use nalgebra::{Point2, Vector2};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("Element of kind {kind:?} requires {expected} vertices, got {actual}")]
    VertexCount {
        kind: ElementKind,
        expected: usize,
        actual: usize,
    },
    #[error("Vertex {0:?} does not exist in the mesh")]
    UnknownVertex(VertexId),
    #[error("Element {0:?} does not exist in the mesh")]
    UnknownElement(ElementId),
    #[error("Element has signed area {area:e}; vertices must be counter-clockwise and non-degenerate")]
    Orientation { area: f64 },
    #[error("Degenerate element geometry (Jacobian determinant {0:e})")]
    DegenerateGeometry(f64),
    #[error("Nodal value is not defined at vertex {0:?}")]
    MissingNodalValue(VertexId),
    #[error("Facet {face} of element {element:?} is not a boundary facet")]
    NotABoundaryFacet { element: ElementId, face: usize },
    #[error("Invalid mesh parameters: {0}")]
    InvalidParameters(String),
}

/// An unstructured 2D mesh stored as two arenas.
///
/// Vertices hold the only copy of the coordinates; elements refer to them by
/// `VertexId`. Moving a vertex therefore moves every element that shares it.
/// Traversal of elements (and of boundary facets, element by element then face
/// by face) follows arena order and is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: SlotMap<VertexId, Point2<f64>>,
    elements: SlotMap<ElementId, Element>,
    boundary: HashMap<FacetKey, BoundaryId>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, position: Point2<f64>) -> VertexId {
        self.vertices.insert(position)
    }

    /// Adds an element over existing vertices.
    ///
    /// The vertex list must match the element kind and be counter-clockwise.
    /// Adding elements invalidates boundary detection; call
    /// [`detect_boundary`](Self::detect_boundary) once the mesh is complete.
    pub fn add_element(
        &mut self,
        kind: ElementKind,
        vertices: &[VertexId],
    ) -> Result<ElementId, MeshError> {
        if vertices.len() != kind.n_vertices() {
            return Err(MeshError::VertexCount {
                kind,
                expected: kind.n_vertices(),
                actual: vertices.len(),
            });
        }
        let coords = vertices
            .iter()
            .map(|&v| self.vertices.get(v).copied().ok_or(MeshError::UnknownVertex(v)))
            .collect::<Result<Vec<_>, _>>()?;

        let geometry = ElementGeometry::new(kind, coords);
        let area = geometry.signed_area();
        if area <= 0.0 {
            return Err(MeshError::Orientation { area });
        }
        // Non-convex quads can have positive area but fold over at a corner.
        if kind == ElementKind::Quad4 {
            let folded = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]
                .iter()
                .any(|&[x, y]| geometry.jacobian(&Point2::new(x, y)).determinant() <= 0.0);
            if folded {
                return Err(MeshError::Orientation { area });
            }
        }

        self.boundary.clear();
        Ok(self.elements.insert(Element::new(kind, vertices.to_vec())))
    }

    /// Finds the faces used by exactly one element and tags each with the id
    /// returned by `classify`, which receives the face midpoint and its outward
    /// unit normal.
    pub fn detect_boundary<F>(&mut self, classify: F)
    where
        F: Fn(&Point2<f64>, &Vector2<f64>) -> BoundaryId,
    {
        let mut usage: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for element in self.elements.values() {
            for face in 0..element.kind().n_faces() {
                if let Some((a, b)) = element.face_vertices(face) {
                    *usage.entry(undirected(a, b)).or_default() += 1;
                }
            }
        }

        let mut boundary = HashMap::new();
        for (id, element) in &self.elements {
            for face in 0..element.kind().n_faces() {
                let Some((a, b)) = element.face_vertices(face) else {
                    continue;
                };
                if usage.get(&undirected(a, b)) != Some(&1) {
                    continue;
                }
                let (Some(pa), Some(pb)) = (self.vertices.get(a), self.vertices.get(b)) else {
                    continue;
                };
                let t = pb - pa;
                let normal = Vector2::new(t.y, -t.x).normalize();
                let midpoint = Point2::from((pa.coords + pb.coords) * 0.5);
                boundary.insert(FacetKey::new(id, face), classify(&midpoint, &normal));
            }
        }
        self.boundary = boundary;
    }

    /// Overrides the boundary id of an existing boundary facet.
    pub fn set_boundary_id(&mut self, facet: FacetKey, id: BoundaryId) -> Result<(), MeshError> {
        match self.boundary.get_mut(&facet) {
            Some(slot) => {
                *slot = id;
                Ok(())
            }
            None => Err(MeshError::NotABoundaryFacet {
                element: facet.element,
                face: facet.face,
            }),
        }
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Point2<f64>> {
        self.vertices.get(id)
    }

    pub fn vertices_iter(&self) -> impl Iterator<Item = (VertexId, &Point2<f64>)> {
        self.vertices.iter()
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn elements_iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter()
    }

    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys()
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Snapshot of an element's current physical shape.
    pub fn geometry(&self, id: ElementId) -> Result<ElementGeometry, MeshError> {
        let element = self
            .elements
            .get(id)
            .ok_or(MeshError::UnknownElement(id))?;
        self.geometry_of(element)
    }

    pub fn geometry_of(&self, element: &Element) -> Result<ElementGeometry, MeshError> {
        let coords = element
            .vertices()
            .iter()
            .map(|&v| self.vertices.get(v).copied().ok_or(MeshError::UnknownVertex(v)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ElementGeometry::new(element.kind(), coords))
    }

    pub fn boundary_id(&self, facet: FacetKey) -> Option<BoundaryId> {
        self.boundary.get(&facet).copied()
    }

    /// Boundary facets in traversal order: elements in arena order, then local
    /// face order.
    pub fn boundary_facets(&self) -> impl Iterator<Item = (FacetKey, BoundaryId)> + '_ {
        self.elements.iter().flat_map(move |(id, element)| {
            (0..element.kind().n_faces()).filter_map(move |face| {
                let key = FacetKey::new(id, face);
                self.boundary.get(&key).map(|&b| (key, b))
            })
        })
    }

    pub fn n_boundary_facets(&self) -> usize {
        self.boundary.len()
    }

    /// Adds `offset(v)` to every vertex referenced by at least one element,
    /// visiting each shared vertex exactly once. Returns the number of vertices
    /// moved.
    pub(crate) fn displace_vertices<F>(&mut self, offset: F) -> usize
    where
        F: Fn(VertexId) -> Vector2<f64>,
    {
        let mut visited: SecondaryMap<VertexId, ()> = SecondaryMap::new();
        for element in self.elements.values() {
            for &v in element.vertices() {
                if visited.insert(v, ()).is_some() {
                    continue;
                }
                if let Some(p) = self.vertices.get_mut(v) {
                    *p += offset(v);
                }
            }
        }
        visited.len()
    }
}

fn undirected(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> (Mesh, [VertexId; 4]) {
        let mut mesh = Mesh::new();
        let v = [
            mesh.add_vertex(Point2::new(0.0, 0.0)),
            mesh.add_vertex(Point2::new(1.0, 0.0)),
            mesh.add_vertex(Point2::new(1.0, 1.0)),
            mesh.add_vertex(Point2::new(0.0, 1.0)),
        ];
        mesh.add_element(ElementKind::Tri3, &[v[0], v[1], v[2]]).unwrap();
        mesh.add_element(ElementKind::Tri3, &[v[0], v[2], v[3]]).unwrap();
        (mesh, v)
    }

    #[test]
    fn add_element_rejects_clockwise_vertices() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Point2::new(0.0, 0.0));
        let b = mesh.add_vertex(Point2::new(0.0, 1.0));
        let c = mesh.add_vertex(Point2::new(1.0, 0.0));
        assert!(matches!(
            mesh.add_element(ElementKind::Tri3, &[a, b, c]),
            Err(MeshError::Orientation { .. })
        ));
    }

    #[test]
    fn add_element_rejects_wrong_vertex_count() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Point2::new(0.0, 0.0));
        let b = mesh.add_vertex(Point2::new(1.0, 0.0));
        let c = mesh.add_vertex(Point2::new(0.0, 1.0));
        assert_eq!(
            mesh.add_element(ElementKind::Quad4, &[a, b, c]),
            Err(MeshError::VertexCount {
                kind: ElementKind::Quad4,
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn add_element_rejects_self_intersecting_quad() {
        let mut mesh = Mesh::new();
        let v = [
            mesh.add_vertex(Point2::new(0.0, 0.0)),
            mesh.add_vertex(Point2::new(3.0, 0.0)),
            mesh.add_vertex(Point2::new(0.0, 1.0)),
            mesh.add_vertex(Point2::new(3.0, 2.0)),
        ];
        assert!(mesh.add_element(ElementKind::Quad4, &v).is_err());
    }

    #[test]
    fn detect_boundary_skips_shared_faces() {
        let (mut mesh, _) = two_triangles();
        mesh.detect_boundary(|_, _| 7);
        assert_eq!(mesh.n_boundary_facets(), 4);
        assert!(mesh.boundary_facets().all(|(_, id)| id == 7));
    }

    #[test]
    fn boundary_facets_follow_element_then_face_order() {
        let (mut mesh, _) = two_triangles();
        mesh.detect_boundary(|_, _| 0);
        let ids: Vec<_> = mesh.element_ids().collect();
        let facets: Vec<_> = mesh.boundary_facets().map(|(f, _)| f).collect();
        assert_eq!(
            facets,
            vec![
                FacetKey::new(ids[0], 0),
                FacetKey::new(ids[0], 1),
                FacetKey::new(ids[1], 1),
                FacetKey::new(ids[1], 2),
            ]
        );
    }

    #[test]
    fn detect_boundary_passes_outward_normals_to_classifier() {
        let (mut mesh, _) = two_triangles();
        mesh.detect_boundary(|midpoint, normal| {
            let outward = Vector2::new(midpoint.x - 0.5, midpoint.y - 0.5);
            assert!(normal.dot(&outward) > 0.0);
            u32::from(normal.y.abs() > 0.5)
        });
        let horizontal = mesh.boundary_facets().filter(|&(_, id)| id == 1).count();
        assert_eq!(horizontal, 2);
    }

    #[test]
    fn set_boundary_id_rejects_interior_facet() {
        let (mut mesh, _) = two_triangles();
        mesh.detect_boundary(|_, _| 0);
        let first = mesh.element_ids().next().unwrap();
        assert!(mesh.set_boundary_id(FacetKey::new(first, 2), 3).is_err());
        assert!(mesh.set_boundary_id(FacetKey::new(first, 0), 3).is_ok());
        assert_eq!(mesh.boundary_id(FacetKey::new(first, 0)), Some(3));
    }

    #[test]
    fn displace_vertices_moves_shared_vertices_once() {
        let (mut mesh, v) = two_triangles();
        let moved = mesh.displace_vertices(|_| Vector2::new(0.5, -0.25));
        assert_eq!(moved, 4);
        assert_eq!(mesh.vertex(v[2]), Some(&Point2::new(1.5, 0.75)));
        assert_eq!(mesh.vertex(v[0]), Some(&Point2::new(0.5, -0.25)));
    }
}
