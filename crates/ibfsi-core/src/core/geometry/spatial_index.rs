use crate::core::models::ids::ElementId;
use crate::core::models::mesh::{Mesh, MeshError};
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point2;

// Relative slack on the search radius so points on an element's boundary are
// never dropped by round-off in the centroid distance.
const RADIUS_SLACK: f64 = 1e-8;

/// Candidate filter for point location: a k-d tree over element centroids.
///
/// Every element lies inside the disk around its centroid whose radius is the
/// largest centroid-to-vertex distance. Querying the tree with the largest such
/// radius in the mesh therefore returns a superset of the elements that can
/// contain the point. The index is a snapshot; it must be rebuilt after the
/// mesh moves.
pub struct SpatialIndex {
    tree: KdTree<f64, 2>,
    elements: Vec<ElementId>,
    search_radius_sq: f64,
}

impl SpatialIndex {
    pub fn build(mesh: &Mesh) -> Result<Self, MeshError> {
        let mut centroids = Vec::with_capacity(mesh.n_elements());
        let mut elements = Vec::with_capacity(mesh.n_elements());
        let mut max_radius: f64 = 0.0;

        for (id, element) in mesh.elements_iter() {
            let geometry = mesh.geometry_of(element)?;
            let centroid = geometry.centroid();
            max_radius = max_radius.max(geometry.radius_about(&centroid));
            centroids.push([centroid.x, centroid.y]);
            elements.push(id);
        }

        let tree: KdTree<f64, 2> = (&centroids).into();
        let radius = max_radius * (1.0 + RADIUS_SLACK) + f64::EPSILON;
        Ok(Self {
            tree,
            elements,
            search_radius_sq: radius * radius,
        })
    }

    /// Elements that may contain `point`, in arena order.
    pub fn candidates(&self, point: &Point2<f64>) -> Vec<ElementId> {
        if self.elements.is_empty() {
            return Vec::new();
        }
        let mut indices: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&[point.x, point.y], self.search_radius_sq)
            .into_iter()
            .map(|neighbour| neighbour.item as usize)
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| self.elements[i]).collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::MeshBuilder;

    #[test]
    fn candidates_include_the_containing_element() {
        let mesh = MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [8, 8])
            .unwrap();
        let index = SpatialIndex::build(&mesh).unwrap();
        assert_eq!(index.len(), 64);

        let ids: Vec<_> = mesh.element_ids().collect();
        // (0.3, 0.6) lies in column 2, row 4.
        let candidates = index.candidates(&Point2::new(0.3, 0.6));
        assert!(candidates.contains(&ids[4 * 8 + 2]));
        assert!(candidates.len() < 64);
    }

    #[test]
    fn candidates_are_returned_in_arena_order() {
        let mesh = MeshBuilder::disk(Point2::origin(), 1.0, 12, 3).unwrap();
        let index = SpatialIndex::build(&mesh).unwrap();
        let candidates = index.candidates(&Point2::new(0.2, 0.1));
        let order: Vec<_> = mesh
            .element_ids()
            .filter(|id| candidates.contains(id))
            .collect();
        assert_eq!(candidates, order);
    }

    #[test]
    fn empty_mesh_has_no_candidates() {
        let index = SpatialIndex::build(&Mesh::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.candidates(&Point2::origin()).is_empty());
    }
}
