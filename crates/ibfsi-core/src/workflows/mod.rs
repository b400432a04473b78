//! # Workflows Module
//!
//! High-level entry points that run a complete coupled simulation.
//!
//! - **Coupling Workflow** ([`couple`]) - Validates the run, initializes both
//!   solvers and advances them to the end time, reporting progress by phase.

pub mod couple;
