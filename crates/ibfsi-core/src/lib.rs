//! # IBFSI Core Library
//!
//! Partitioned coupling of an incompressible fluid and an elastic solid with
//! the immersed-boundary approach: the solid overlaps a fixed fluid mesh, and
//! the two solvers exchange interface forcing once per time step.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Meshes, reference elements, quadrature,
//!   nodal fields and point location. Stateless apart from the mesh arenas.
//!
//! - **[`engine`]: The Logic Core.** The time controller, mesh motion, the
//!   indicator/force/traction tasks and the [`CouplingDriver`](engine::driver::CouplingDriver)
//!   that sequences them.
//!
//! - **[`workflows`]: The Public API.** Complete coupled runs with progress
//!   reporting, built on top of the engine.
//!
//! [`solvers`] defines the contracts the two field solvers implement, along
//! with prescribed-motion reference implementations.

pub mod core;
pub mod engine;
pub mod solvers;
pub mod workflows;
