//! Toroidal occupancy grid.
//!
//! The grid stores agent indices, never agents. Each cell holds at
//! most one agent; neighborhoods are the 8 surrounding cells with
//! wraparound on both axes. On grids narrower than 3 cells the
//! wrapped offsets can land on the same cell twice, or on the center
//! itself; neighborhoods collapse those duplicates and never include
//! the center.

use crate::{
    error::{SimError, SimResult},
    rng::SimRng,
    types::{AgentId, Position},
};

/// Number of movement directions in a Moore neighborhood.
pub const DIRECTION_COUNT: usize = 8;

/// (dx, dy) per direction index.
const OFFSETS: [(isize, isize); DIRECTION_COUNT] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

#[derive(Debug, Clone)]
pub struct Grid {
    width:  usize,
    height: usize,
    cells:  Vec<Option<AgentId>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize  { self.width  }
    pub fn height(&self) -> usize { self.height }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn index(&self, pos: Position) -> usize {
        debug_assert!(pos.x < self.width && pos.y < self.height, "{pos:?} off grid");
        pos.y * self.width + pos.x
    }

    pub fn agent_at(&self, pos: Position) -> Option<AgentId> {
        self.cells[self.index(pos)]
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.agent_at(pos).is_none()
    }

    /// The cell one step from `pos` in direction `direction`, wrapped.
    pub fn neighbor_in_direction(&self, pos: Position, direction: usize) -> Position {
        let (dx, dy) = OFFSETS[direction % DIRECTION_COUNT];
        Position::new(
            wrap(pos.x, dx, self.width),
            wrap(pos.y, dy, self.height),
        )
    }

    /// Distinct neighbor cells of `pos`, in direction order.
    pub fn neighborhood(&self, pos: Position) -> Vec<Position> {
        let mut cells = Vec::with_capacity(DIRECTION_COUNT);
        for direction in 0..DIRECTION_COUNT {
            let cell = self.neighbor_in_direction(pos, direction);
            if cell != pos && !cells.contains(&cell) {
                cells.push(cell);
            }
        }
        cells
    }

    pub fn empty_neighbors(&self, pos: Position) -> Vec<Position> {
        self.neighborhood(pos)
            .into_iter()
            .filter(|&cell| self.is_empty(cell))
            .collect()
    }

    pub fn occupied_neighbors(&self, pos: Position) -> Vec<AgentId> {
        self.neighborhood(pos)
            .into_iter()
            .filter_map(|cell| self.agent_at(cell))
            .collect()
    }

    /// Every unoccupied cell, in row-major order.
    pub fn empty_cells(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, occupant)| occupant.is_none())
            .map(|(i, _)| Position::new(i % self.width, i / self.width))
            .collect()
    }

    /// Put `agent_id` on a uniformly chosen empty cell.
    pub fn place_randomly(&mut self, agent_id: AgentId, rng: &mut SimRng) -> SimResult<Position> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return Err(SimError::NoCapacity {
                agent_id,
                cells: self.cell_count(),
            });
        }
        let pos = empty[rng.next_index(empty.len())];
        let index = self.index(pos);
        self.cells[index] = Some(agent_id);
        Ok(pos)
    }

    /// Relocate `agent_id` from `from` to `to`. The target must be empty.
    pub fn move_agent(&mut self, agent_id: AgentId, from: Position, to: Position) -> SimResult<()> {
        if !self.is_empty(to) {
            return Err(SimError::CellOccupied { x: to.x, y: to.y });
        }
        let from_index = self.index(from);
        debug_assert_eq!(self.cells[from_index], Some(agent_id), "agent {agent_id} not at {from:?}");
        self.cells[from_index] = None;
        let to_index = self.index(to);
        self.cells[to_index] = Some(agent_id);
        Ok(())
    }
}

fn wrap(coord: usize, delta: isize, len: usize) -> usize {
    (coord as isize + delta).rem_euclid(len as isize) as usize
}
