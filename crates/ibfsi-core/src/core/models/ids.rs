use slotmap::new_key_type;

new_key_type! {
    pub struct VertexId;
    pub struct ElementId;
}

/// Tag attached to a boundary facet, used to select boundary conditions.
pub type BoundaryId = u32;

/// Identifies one face of one element: the `face`-th edge, running from local
/// vertex `face` to local vertex `face + 1` (cyclically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FacetKey {
    pub element: ElementId,
    pub face: usize,
}

impl FacetKey {
    pub fn new(element: ElementId, face: usize) -> Self {
        Self { element, face }
    }
}
