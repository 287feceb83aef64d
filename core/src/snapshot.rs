//! Snapshot serialization: simulation state to JSON.
//!
//! A snapshot is taken every SNAPSHOT_INTERVAL ticks. It captures the
//! clock, the vaccination program and every agent so a run can be
//! inspected at that tick without replaying it.

use crate::{
    agent::Agent,
    clock::SimClock,
    population::{Population, VaccinationProgram},
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SNAPSHOT_INTERVAL: Tick = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub run_id:       RunId,
    pub tick:         Tick,
    pub clock:        SimClock,
    /// Agents per state, keyed by state name.
    pub state_counts: BTreeMap<String, usize>,
    pub vaccination:  VaccinationProgram,
    pub agents:       Vec<Agent>,
}

impl SimSnapshot {
    pub fn capture(run_id: RunId, clock: &SimClock, population: &Population) -> Self {
        Self {
            run_id,
            tick: clock.current_tick,
            clock: clock.clone(),
            state_counts: population
                .state_counts()
                .into_iter()
                .map(|(state, count)| (state.name().to_string(), count))
                .collect(),
            vaccination: population.vaccination().clone(),
            agents: population.agents().to_vec(),
        }
    }
}
