use super::ids::VertexId;
use super::mesh::MeshError;
use nalgebra::{Matrix2, Point2, Vector2};

const NEWTON_STEP_TOLERANCE: f64 = 1e-13;

/// The supported 2D element shapes.
///
/// Vertices are always stored counter-clockwise. Face `f` runs from local
/// vertex `f` to local vertex `f + 1` (cyclically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Linear triangle on the reference triangle `(0,0) (1,0) (0,1)`.
    Tri3,
    /// Bilinear quadrilateral on the reference square `[-1, 1]²`.
    Quad4,
}

impl ElementKind {
    pub fn n_vertices(self) -> usize {
        match self {
            ElementKind::Tri3 => 3,
            ElementKind::Quad4 => 4,
        }
    }

    pub fn n_faces(self) -> usize {
        self.n_vertices()
    }

    /// Evaluates the shape functions at a reference point.
    pub fn shape_values(self, xi: &Point2<f64>) -> Vec<f64> {
        match self {
            ElementKind::Tri3 => vec![1.0 - xi.x - xi.y, xi.x, xi.y],
            ElementKind::Quad4 => QUAD4_CORNERS
                .iter()
                .map(|[a, b]| 0.25 * (1.0 + a * xi.x) * (1.0 + b * xi.y))
                .collect(),
        }
    }

    /// Evaluates the shape function gradients with respect to the reference
    /// coordinates.
    pub fn shape_gradients(self, xi: &Point2<f64>) -> Vec<Vector2<f64>> {
        match self {
            ElementKind::Tri3 => vec![
                Vector2::new(-1.0, -1.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(0.0, 1.0),
            ],
            ElementKind::Quad4 => QUAD4_CORNERS
                .iter()
                .map(|[a, b]| {
                    Vector2::new(
                        0.25 * a * (1.0 + b * xi.y),
                        0.25 * b * (1.0 + a * xi.x),
                    )
                })
                .collect(),
        }
    }

    /// Returns `true` if the reference point lies in the closed reference cell,
    /// allowing a slack of `tol` on every bounding constraint.
    pub fn reference_contains(self, xi: &Point2<f64>, tol: f64) -> bool {
        match self {
            ElementKind::Tri3 => xi.x >= -tol && xi.y >= -tol && 1.0 - xi.x - xi.y >= -tol,
            ElementKind::Quad4 => xi.x.abs() <= 1.0 + tol && xi.y.abs() <= 1.0 + tol,
        }
    }

    pub fn reference_centroid(self) -> Point2<f64> {
        match self {
            ElementKind::Tri3 => Point2::new(1.0 / 3.0, 1.0 / 3.0),
            ElementKind::Quad4 => Point2::origin(),
        }
    }
}

const QUAD4_CORNERS: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

/// An element of a mesh: its shape and its vertex connectivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    vertices: Vec<VertexId>,
}

impl Element {
    pub(crate) fn new(kind: ElementKind, vertices: Vec<VertexId>) -> Self {
        Self { kind, vertices }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Returns the two vertices bounding the given face, in counter-clockwise order.
    pub fn face_vertices(&self, face: usize) -> Option<(VertexId, VertexId)> {
        let n = self.vertices.len();
        if face >= n {
            return None;
        }
        Some((self.vertices[face], self.vertices[(face + 1) % n]))
    }
}

/// The physical shape of an element, snapshotted from the current vertex
/// coordinates of its mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementGeometry {
    kind: ElementKind,
    coords: Vec<Point2<f64>>,
}

impl ElementGeometry {
    pub fn new(kind: ElementKind, coords: Vec<Point2<f64>>) -> Self {
        Self { kind, coords }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn coords(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Maps a reference point to physical space.
    pub fn map_to_physical(&self, xi: &Point2<f64>) -> Point2<f64> {
        let shape = self.kind.shape_values(xi);
        let mut x = Vector2::zeros();
        for (n, p) in shape.iter().zip(&self.coords) {
            x += p.coords * *n;
        }
        Point2::from(x)
    }

    /// Jacobian of the reference-to-physical map, `J_ij = ∂x_i / ∂ξ_j`.
    pub fn jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64> {
        let gradients = self.kind.shape_gradients(xi);
        let mut jac = Matrix2::zeros();
        for (g, p) in gradients.iter().zip(&self.coords) {
            jac += p.coords * g.transpose();
        }
        jac
    }

    /// Shape function gradients with respect to physical coordinates, together
    /// with the Jacobian determinant at `xi`.
    pub fn physical_gradients(
        &self,
        xi: &Point2<f64>,
    ) -> Result<(Vec<Vector2<f64>>, f64), MeshError> {
        let jac = self.jacobian(xi);
        let det = jac.determinant();
        let inv = jac
            .try_inverse()
            .filter(|_| det > 0.0)
            .ok_or(MeshError::DegenerateGeometry(det))?;
        let inv_t = inv.transpose();
        let gradients = self
            .kind
            .shape_gradients(xi)
            .into_iter()
            .map(|g| inv_t * g)
            .collect();
        Ok((gradients, det))
    }

    /// Signed area by the shoelace formula; positive for counter-clockwise vertices.
    pub fn signed_area(&self) -> f64 {
        let n = self.coords.len();
        0.5 * (0..n)
            .map(|i| {
                let a = self.coords[i];
                let b = self.coords[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
    }

    /// Arithmetic mean of the vertices.
    pub fn centroid(&self) -> Point2<f64> {
        let sum = self
            .coords
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / self.coords.len() as f64)
    }

    /// Largest distance from `center` to any vertex. Since elements are convex,
    /// the disk of this radius covers the whole element.
    pub fn radius_about(&self, center: &Point2<f64>) -> f64 {
        self.coords
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f64::max)
    }

    pub fn bounding_box(&self) -> (Point2<f64>, Point2<f64>) {
        let mut lo = Point2::new(f64::MAX, f64::MAX);
        let mut hi = Point2::new(f64::MIN, f64::MIN);
        for p in &self.coords {
            lo.x = lo.x.min(p.x);
            lo.y = lo.y.min(p.y);
            hi.x = hi.x.max(p.x);
            hi.y = hi.y.max(p.y);
        }
        (lo, hi)
    }

    /// End points of a face, in counter-clockwise order.
    pub fn face(&self, face: usize) -> Option<(Point2<f64>, Point2<f64>)> {
        let n = self.coords.len();
        (face < n).then(|| (self.coords[face], self.coords[(face + 1) % n]))
    }

    /// Outward unit normal of a face.
    pub fn outward_normal(&self, face: usize) -> Option<Vector2<f64>> {
        let (a, b) = self.face(face)?;
        let t = b - a;
        let len = t.norm();
        (len > 0.0).then(|| Vector2::new(t.y, -t.x) / len)
    }

    /// Inverts the reference map for a physical point. Returns the reference
    /// coordinates if the point lies in the closed element (within `tol` in
    /// reference units), `None` otherwise.
    pub fn map_to_reference(
        &self,
        x: &Point2<f64>,
        tol: f64,
        max_iterations: usize,
    ) -> Option<Point2<f64>> {
        let (lo, hi) = self.bounding_box();
        let slack = tol * (hi - lo).norm();
        if x.x < lo.x - slack || x.x > hi.x + slack || x.y < lo.y - slack || x.y > hi.y + slack {
            return None;
        }

        let xi = match self.kind {
            ElementKind::Tri3 => {
                let origin = self.coords[0];
                let jac = Matrix2::from_columns(&[
                    self.coords[1] - origin,
                    self.coords[2] - origin,
                ]);
                Point2::from(jac.try_inverse()? * (x - origin))
            }
            ElementKind::Quad4 => self.newton_inverse(x, max_iterations)?,
        };

        self.kind.reference_contains(&xi, tol).then_some(xi)
    }

    fn newton_inverse(&self, x: &Point2<f64>, max_iterations: usize) -> Option<Point2<f64>> {
        let mut xi = self.kind.reference_centroid();
        for _ in 0..max_iterations {
            let residual = self.map_to_physical(&xi) - x;
            let delta = self.jacobian(&xi).try_inverse()? * residual;
            xi -= delta;
            if delta.norm() < NEWTON_STEP_TOLERANCE {
                return Some(xi);
            }
        }
        None
    }
}
