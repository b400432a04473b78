//! # Mesh Models
//!
//! Arena-based representation of the unstructured 2D meshes on which both the
//! fluid and the solid are discretized.
//!
//! - [`ids`] - Stable keys for vertices and elements, boundary ids and facet keys
//! - [`element`] - Element kinds, connectivity and per-element geometry
//! - [`mesh`] - The [`mesh::Mesh`] container with boundary facet detection
//! - [`builder`] - Incremental construction and structured rectangle/disk meshes
//!
//! Vertices are the only place coordinates live. Moving a vertex moves every
//! element that references it, which is what the immersed solid relies on when
//! it is displaced into its current configuration.

pub mod builder;
pub mod element;
pub mod ids;
pub mod mesh;
