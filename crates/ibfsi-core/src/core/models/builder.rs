use super::element::ElementKind;
use super::ids::{BoundaryId, ElementId, VertexId};
use super::mesh::{Mesh, MeshError};
use itertools::iproduct;
use nalgebra::{Point2, Vector2};
use std::f64::consts::TAU;

const MAX_REFINEMENT_LEVEL: u32 = 12;

/// Incremental mesh construction plus the structured meshes used by the
/// coupling scenarios.
pub struct MeshBuilder {
    mesh: Mesh,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self { mesh: Mesh::new() }
    }

    pub fn vertex(&mut self, position: Point2<f64>) -> VertexId {
        self.mesh.add_vertex(position)
    }

    pub fn element(
        &mut self,
        kind: ElementKind,
        vertices: &[VertexId],
    ) -> Result<ElementId, MeshError> {
        self.mesh.add_element(kind, vertices)
    }

    /// Finishes the mesh, tagging every boundary facet through `classify`
    /// (face midpoint, outward normal).
    pub fn build<F>(mut self, classify: F) -> Mesh
    where
        F: Fn(&Point2<f64>, &Vector2<f64>) -> BoundaryId,
    {
        self.mesh.detect_boundary(classify);
        self.mesh
    }

    /// An axis-aligned rectangle split into `nx × ny` quadrilaterals, in
    /// row-major element order starting at `min`.
    ///
    /// Boundary ids are colorized: `x = min.x → 0`, `x = max.x → 1`,
    /// `y = min.y → 2`, `y = max.y → 3`.
    pub fn rectangle(
        min: Point2<f64>,
        max: Point2<f64>,
        subdivisions: [usize; 2],
    ) -> Result<Mesh, MeshError> {
        let [nx, ny] = subdivisions;
        if nx == 0 || ny == 0 {
            return Err(MeshError::InvalidParameters(format!(
                "rectangle subdivisions must be positive, got {nx} x {ny}"
            )));
        }
        if !(max.x > min.x && max.y > min.y) {
            return Err(MeshError::InvalidParameters(format!(
                "rectangle corners are not ordered: min = {min}, max = {max}"
            )));
        }

        let mut builder = Self::new();
        let h = Vector2::new((max.x - min.x) / nx as f64, (max.y - min.y) / ny as f64);
        let grid: Vec<VertexId> = iproduct!(0..=ny, 0..=nx)
            .map(|(j, i)| {
                builder.vertex(Point2::new(
                    min.x + i as f64 * h.x,
                    min.y + j as f64 * h.y,
                ))
            })
            .collect();
        let at = |i: usize, j: usize| grid[j * (nx + 1) + i];

        for (j, i) in iproduct!(0..ny, 0..nx) {
            builder.element(
                ElementKind::Quad4,
                &[at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)],
            )?;
        }

        let tol = 1e-10 * (max - min).norm();
        Ok(builder.build(|midpoint, _| {
            if (midpoint.x - min.x).abs() < tol {
                0
            } else if (midpoint.x - max.x).abs() < tol {
                1
            } else if (midpoint.y - min.y).abs() < tol {
                2
            } else {
                3
            }
        }))
    }

    /// A rectangle globally refined `level` times; each level doubles the
    /// subdivisions in both directions.
    pub fn refined_rectangle(
        min: Point2<f64>,
        max: Point2<f64>,
        subdivisions: [usize; 2],
        level: u32,
    ) -> Result<Mesh, MeshError> {
        if level > MAX_REFINEMENT_LEVEL {
            return Err(MeshError::InvalidParameters(format!(
                "global refinement level {level} exceeds the maximum of {MAX_REFINEMENT_LEVEL}"
            )));
        }
        let factor = 1usize << level;
        Self::rectangle(min, max, subdivisions.map(|n| n * factor))
    }

    /// A polar disk: a fan of triangles around the center and `rings - 1`
    /// rings of quadrilaterals outside it. Every boundary facet gets id 0.
    pub fn disk(
        center: Point2<f64>,
        radius: f64,
        sectors: usize,
        rings: usize,
    ) -> Result<Mesh, MeshError> {
        if sectors < 3 || rings == 0 || radius <= 0.0 {
            return Err(MeshError::InvalidParameters(format!(
                "disk needs radius > 0, at least 3 sectors and 1 ring \
                 (got radius {radius}, {sectors} sectors, {rings} rings)"
            )));
        }

        let mut builder = Self::new();
        let hub = builder.vertex(center);
        let ring_vertices: Vec<Vec<VertexId>> = (1..=rings)
            .map(|k| {
                let r = radius * k as f64 / rings as f64;
                (0..sectors)
                    .map(|i| {
                        let theta = TAU * i as f64 / sectors as f64;
                        builder.vertex(center + Vector2::new(r * theta.cos(), r * theta.sin()))
                    })
                    .collect()
            })
            .collect();

        for i in 0..sectors {
            let next = (i + 1) % sectors;
            builder.element(
                ElementKind::Tri3,
                &[hub, ring_vertices[0][i], ring_vertices[0][next]],
            )?;
        }
        for (inner, outer) in ring_vertices.iter().zip(ring_vertices.iter().skip(1)) {
            for i in 0..sectors {
                let next = (i + 1) % sectors;
                builder.element(
                    ElementKind::Quad4,
                    &[inner[i], outer[i], outer[next], inner[next]],
                )?;
            }
        }

        Ok(builder.build(|_, _| 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_has_expected_counts_and_colorized_boundary() {
        let mesh = MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0), [4, 2])
            .unwrap();
        assert_eq!(mesh.n_elements(), 8);
        assert_eq!(mesh.n_vertices(), 15);
        assert_eq!(mesh.n_boundary_facets(), 12);

        let count = |id| mesh.boundary_facets().filter(|&(_, b)| b == id).count();
        assert_eq!(count(0), 2);
        assert_eq!(count(1), 2);
        assert_eq!(count(2), 4);
        assert_eq!(count(3), 4);
    }

    #[test]
    fn rectangle_elements_are_in_row_major_order() {
        let mesh = MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [2, 2])
            .unwrap();
        let centroids: Vec<_> = mesh
            .element_ids()
            .map(|id| mesh.geometry(id).unwrap().centroid())
            .collect();
        assert_eq!(centroids[0], Point2::new(0.25, 0.25));
        assert_eq!(centroids[1], Point2::new(0.75, 0.25));
        assert_eq!(centroids[2], Point2::new(0.25, 0.75));
    }

    #[test]
    fn refined_rectangle_doubles_subdivisions_per_level() {
        let mesh = MeshBuilder::refined_rectangle(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            [1, 1],
            2,
        )
        .unwrap();
        assert_eq!(mesh.n_elements(), 16);
    }

    #[test]
    fn rectangle_rejects_zero_subdivisions() {
        assert!(matches!(
            MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [0, 3]),
            Err(MeshError::InvalidParameters(_))
        ));
    }

    #[test]
    fn disk_area_approaches_inscribed_polygon_area() {
        let sectors = 16;
        let mesh = MeshBuilder::disk(Point2::new(0.5, 0.5), 0.2, sectors, 3).unwrap();
        assert_eq!(mesh.n_elements(), sectors * 3);
        assert_eq!(mesh.n_boundary_facets(), sectors);

        let area: f64 = mesh
            .element_ids()
            .map(|id| mesh.geometry(id).unwrap().signed_area())
            .sum();
        let polygon = 0.5 * sectors as f64 * 0.2f64.powi(2) * (TAU / sectors as f64).sin();
        assert!((area - polygon).abs() < 1e-12);
    }

    #[test]
    fn disk_rejects_too_few_sectors() {
        assert!(MeshBuilder::disk(Point2::origin(), 1.0, 2, 1).is_err());
    }
}
