//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// A simulation tick. Every agent acts once per tick.
pub type Tick = u64;

/// Stable index of an agent in the population's agent store.
pub type AgentId = usize;

/// The canonical run identifier.
pub type RunId = String;

/// A cell coordinate on the toroidal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}
