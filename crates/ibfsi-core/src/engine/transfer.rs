//! Keyed transfer data between the two solvers.
//!
//! Tasks produce values keyed by `(entity, quadrature index)`. Solvers consume
//! plain sequences in their own traversal order. [`TransferMap::flatten`] is the
//! only place the two meet, and it checks that both sides describe exactly the
//! same set of points.

use super::error::EngineError;
use crate::core::fields::CellProperties;
use crate::core::models::ids::{BoundaryId, ElementId, FacetKey};
use crate::core::models::mesh::Mesh;
use crate::core::quadrature::{FaceQuadrature, QuadratureFormula};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// One quadrature point of one entity (element or boundary facet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey<K> {
    pub entity: K,
    pub q: usize,
}

impl<K> PointKey<K> {
    pub fn new(entity: K, q: usize) -> Self {
        Self { entity, q }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferMap<K: Copy + Eq + Hash, T> {
    values: HashMap<PointKey<K>, T>,
}

impl<K: Copy + Eq + Hash, T> Default for TransferMap<K, T> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug, T: Clone> TransferMap<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Stores a value, returning the one previously stored under `key`.
    pub fn insert(&mut self, key: PointKey<K>, value: T) -> Option<T> {
        self.values.insert(key, value)
    }

    pub fn get(&self, key: &PointKey<K>) -> Option<&T> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.values()
    }

    /// Lays the values out in the consumer's traversal order.
    ///
    /// Every key of `order` must be present, and the map must hold no key that
    /// `order` does not visit.
    pub fn flatten<I>(&self, order: I, phase: &'static str) -> Result<Vec<T>, EngineError>
    where
        I: IntoIterator<Item = PointKey<K>>,
    {
        let mut sequence = Vec::with_capacity(self.values.len());
        let mut visited = HashSet::with_capacity(self.values.len());
        for key in order {
            if !visited.insert(key) {
                return Err(EngineError::Assertion {
                    phase,
                    reason: format!("consumer visits {key:?} twice"),
                });
            }
            let value = self.values.get(&key).ok_or_else(|| EngineError::Assertion {
                phase,
                reason: format!("no transfer value for {key:?}"),
            })?;
            sequence.push(value.clone());
        }
        if sequence.len() != self.values.len() {
            return Err(EngineError::Assertion {
                phase,
                reason: format!(
                    "consumer visits {} points but {} values were produced",
                    sequence.len(),
                    self.values.len()
                ),
            });
        }
        Ok(sequence)
    }
}

/// Fluid-side traversal: immersed elements in arena order, then quadrature
/// point order.
pub fn immersed_point_order(
    mesh: &Mesh,
    cells: &CellProperties,
    quadrature: &QuadratureFormula,
) -> Vec<PointKey<ElementId>> {
    mesh.elements_iter()
        .filter(|(id, _)| cells.is_immersed(*id))
        .flat_map(|(id, element)| {
            (0..quadrature.size(element.kind())).map(move |q| PointKey::new(id, q))
        })
        .collect()
}

/// Solid-side traversal: non-Dirichlet boundary facets in element then face
/// order, then face quadrature point order.
pub fn traction_point_order(
    mesh: &Mesh,
    dirichlet: &BTreeSet<BoundaryId>,
    quadrature: &FaceQuadrature,
) -> Vec<PointKey<FacetKey>> {
    mesh.boundary_facets()
        .filter(|(_, id)| !dirichlet.contains(id))
        .flat_map(|(facet, _)| (0..quadrature.size()).map(move |q| PointKey::new(facet, q)))
        .collect()
}
