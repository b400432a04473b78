//! # Engine Module
//!
//! The stateful coupling layer. It owns the time loop and moves data between
//! a fluid solver and a solid solver once per step.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run parameters and their validation
//! - **Time** ([`time`]) - The discrete clock and its output/refinement cadence
//! - **Motion** ([`motion`]) - Displacing the solid mesh into its current shape and back
//! - **Transfer** ([`transfer`]) - Keyed interface data and the solvers' traversal orders
//! - **Tasks** ([`tasks`]) - Indicator, force and traction computations
//! - **Driver** ([`driver`]) - The per-step stage machine
//! - **Progress Monitoring** ([`progress`]) and **State** ([`state`]) - Observers and step reports
//! - **Error Handling** ([`error`]) - Engine-level failures

pub mod config;
pub mod driver;
pub mod error;
pub mod motion;
pub mod progress;
pub mod state;
pub mod tasks;
pub mod time;
pub mod transfer;
