use crate::core::fields::VectorField;
use crate::core::models::mesh::{Mesh, MeshError};
use nalgebra::Vector2;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionDirection {
    /// Move vertices from the reference to the current configuration.
    Forward,
    /// Move vertices back to the reference configuration.
    Backward,
}

/// Adds (`Forward`) or subtracts (`Backward`) `displacement` at every vertex
/// referenced by an element, once per vertex. Returns the number of vertices
/// moved.
///
/// The displacement must be defined at every such vertex; this is checked
/// before any vertex moves.
pub fn apply(
    mesh: &mut Mesh,
    displacement: &VectorField,
    direction: MotionDirection,
) -> Result<usize, MeshError> {
    check_defined(mesh, displacement)?;
    Ok(shift(mesh, displacement, direction))
}

fn check_defined(mesh: &Mesh, displacement: &VectorField) -> Result<(), MeshError> {
    for (_, element) in mesh.elements_iter() {
        if let Some(&v) = element.vertices().iter().find(|&&v| !displacement.contains(v)) {
            return Err(MeshError::MissingNodalValue(v));
        }
    }
    Ok(())
}

fn shift(mesh: &mut Mesh, displacement: &VectorField, direction: MotionDirection) -> usize {
    let sign = match direction {
        MotionDirection::Forward => 1.0,
        MotionDirection::Backward => -1.0,
    };
    let moved = mesh.displace_vertices(|v| {
        displacement.get(v).unwrap_or_else(Vector2::zeros) * sign
    });
    trace!(?direction, vertices = moved, "Shifted mesh vertices.");
    moved
}

/// A mesh moved into its current configuration for the lifetime of the guard.
///
/// Construction applies the displacement forward; dropping the guard applies
/// it backward, on every exit path including early returns and unwinding. The
/// guard holds the only mutable borrow of the mesh, so nothing else can query
/// or move it in between.
pub struct DisplacedMesh<'a> {
    mesh: &'a mut Mesh,
    displacement: &'a VectorField,
}

impl<'a> DisplacedMesh<'a> {
    pub fn new(mesh: &'a mut Mesh, displacement: &'a VectorField) -> Result<Self, MeshError> {
        apply(mesh, displacement, MotionDirection::Forward)?;
        Ok(Self { mesh, displacement })
    }

    pub fn mesh(&self) -> &Mesh {
        &*self.mesh
    }
}

impl Drop for DisplacedMesh<'_> {
    fn drop(&mut self) {
        shift(self.mesh, self.displacement, MotionDirection::Backward);
    }
}
