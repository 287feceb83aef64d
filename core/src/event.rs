//! Simulation events.
//!
//! RULE: Every state transition the population makes is reported as
//! an event. The engine persists them, in emission order, to the
//! event log.

use crate::{
    agent::HealthState,
    types::{AgentId, RunId, Tick},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },

    // ── Disease events ─────────────────────────────
    AgentInfected {
        tick: Tick,
        agent_id: AgentId,
        source_id: AgentId,
        state: HealthState,
    },
    AgentQuarantined {
        tick: Tick,
        agent_id: AgentId,
    },
    AgentDied {
        tick: Tick,
        agent_id: AgentId,
        cause: DeathCause,
    },
    AgentRecovered {
        tick: Tick,
        agent_id: AgentId,
    },

    // ── Vaccination events ─────────────────────────
    VaccinationStarted {
        tick: Tick,
    },
    AgentVaccinated {
        tick: Tick,
        agent_id: AgentId,
    },
}

impl SimEvent {
    /// Stable string name of the variant.
    /// Used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }        => "tick_started",
            Self::TickCompleted { .. }      => "tick_completed",
            Self::RunInitialized { .. }     => "run_initialized",
            Self::AgentInfected { .. }      => "agent_infected",
            Self::AgentQuarantined { .. }   => "agent_quarantined",
            Self::AgentDied { .. }          => "agent_died",
            Self::AgentRecovered { .. }     => "agent_recovered",
            Self::VaccinationStarted { .. } => "vaccination_started",
            Self::AgentVaccinated { .. }    => "agent_vaccinated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Lost the death draw while sick.
    Illness,
    /// Needed a hospital bed when none was free.
    NoHospitalBed,
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
