//! Agent-based pandemic simulation on a toroidal grid.
//!
//! Agents wander the grid, infect their neighbors, get quarantined,
//! compete for a fixed number of hospital beds, recover or die, and
//! are vaccinated once the program starts. A run is fully determined
//! by its config and seed.

pub mod agent;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod metrics;
pub mod population;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod types;
