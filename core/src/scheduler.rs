//! Random activation scheduler.
//!
//! Every tick each agent acts exactly once, in an order re-shuffled
//! from the shared RNG. Without the shuffle low ids would always win
//! movement conflicts and infect first.

use crate::{rng::SimRng, types::AgentId};

#[derive(Debug, Clone)]
pub struct RandomActivation {
    order: Vec<AgentId>,
}

impl RandomActivation {
    pub fn new(agent_count: usize) -> Self {
        Self {
            order: (0..agent_count).collect(),
        }
    }

    /// Shuffle and return this tick's activation order.
    pub fn next_order(&mut self, rng: &mut SimRng) -> Vec<AgentId> {
        rng.shuffle(&mut self.order);
        self.order.clone()
    }
}
