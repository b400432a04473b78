//! # Core Module
//!
//! Stateless building blocks shared by the coupling engine and by solver
//! implementations.
//!
//! - **Meshes** ([`models`]) - Vertex and element arenas, boundary facets, builders
//! - **Integration** ([`quadrature`], [`fe_values`]) - Gauss rules and per-element
//!   quadrature data (points, shape values, physical gradients, JxW)
//! - **Fields** ([`fields`]) - Nodal scalar, vector and stress fields plus
//!   per-cell properties
//! - **Geometry** ([`geometry`]) - Point-in-mesh predicates, point location and the
//!   k-d tree candidate index behind it

pub mod fe_values;
pub mod fields;
pub mod geometry;
pub mod models;
pub mod quadrature;
