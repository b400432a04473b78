//! Geometric queries against a mesh in its current configuration.
//!
//! [`locator`] holds the exact point-in-element predicates and the
//! [`locator::PointLocator`]; [`spatial_index`] narrows the candidate elements
//! with a k-d tree so that location stays cheap on large meshes.

pub mod locator;
pub mod spatial_index;
