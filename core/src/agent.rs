//! Per-agent epidemiological state machine.
//!
//! Pure logic: an agent knows its own state and timers and how they
//! change, but never touches the grid, the RNG or other agents. The
//! population feeds it random rolls and capacity answers and moves it
//! around.
//!
//! Lattice of states:
//!   Healthy → NoSymptoms ─────────────────────┐
//!   Healthy → Symptoms → Quarantined ──────────┼→ Recovered | Dead
//!   Healthy → Hospitalization ─────────────────┘
//!   Healthy → Vaccinated
//!   Healthy → Dead            (no free hospital bed)

use crate::{
    config::DiseaseConfig,
    types::{AgentId, Position},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    NoSymptoms,
    Symptoms,
    Quarantined,
    Hospitalization,
    Recovered,
    Vaccinated,
    Dead,
}

impl HealthState {
    pub const ALL: [HealthState; 8] = [
        Self::Healthy,
        Self::NoSymptoms,
        Self::Symptoms,
        Self::Quarantined,
        Self::Hospitalization,
        Self::Recovered,
        Self::Vaccinated,
        Self::Dead,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Healthy         => "healthy",
            Self::NoSymptoms      => "no_symptoms",
            Self::Symptoms        => "symptoms",
            Self::Quarantined     => "quarantined",
            Self::Hospitalization => "hospitalization",
            Self::Recovered       => "recovered",
            Self::Vaccinated      => "vaccinated",
            Self::Dead            => "dead",
        }
    }

    /// Active sickness: the sickness timer is running.
    pub fn is_sick(self) -> bool {
        matches!(
            self,
            Self::NoSymptoms | Self::Symptoms | Self::Quarantined | Self::Hospitalization
        )
    }

    pub fn was_sick(self) -> bool {
        matches!(self, Self::Recovered | Self::Dead)
    }

    /// Healthy is the only state that can still be infected or vaccinated.
    pub fn is_susceptible(self) -> bool {
        self == Self::Healthy
    }

    pub fn can_move(self) -> bool {
        matches!(
            self,
            Self::Healthy | Self::NoSymptoms | Self::Symptoms | Self::Vaccinated
        )
    }

    /// Quarantined agents are still sick but isolated.
    pub fn can_infect_others(self) -> bool {
        matches!(self, Self::NoSymptoms | Self::Symptoms)
    }

    /// States that take the death draw. Asymptomatic carriers never die.
    pub fn at_risk_of_death(self) -> bool {
        matches!(self, Self::Symptoms | Self::Quarantined | Self::Hospitalization)
    }
}

/// Outcome class of one non-forced infection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// Contact without infection.
    Unaffected,
    Asymptomatic,
    Symptomatic,
    /// Needs a hospital bed; dies without one.
    Severe,
}

impl Exposure {
    /// Partition a uniform roll in [0, 1) by cumulative thresholds.
    /// Probabilities need not sum to one; the remainder is `Unaffected`.
    pub fn from_roll(params: &DiseaseConfig, roll: f64) -> Self {
        let no_symptoms = params.prob_no_symptoms;
        let symptoms = no_symptoms + params.prob_symptoms;
        let hospital = symptoms + params.prob_hospitalization;

        if roll < no_symptoms {
            Self::Asymptomatic
        } else if roll < symptoms {
            Self::Symptomatic
        } else if roll < hospital {
            Self::Severe
        } else {
            Self::Unaffected
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id:        AgentId,
    pub position:  Position,
    /// Preferred movement direction, 0..8.
    pub direction: usize,
    state:                   HealthState,
    remaining_sick_time:     u32,
    countdown_to_quarantine: u32,
    params:                  DiseaseConfig,
}

impl Agent {
    pub fn new(id: AgentId, params: DiseaseConfig, direction: usize) -> Self {
        Self {
            id,
            position: Position::new(0, 0),
            direction,
            state: HealthState::Healthy,
            remaining_sick_time: 0,
            countdown_to_quarantine: 0,
            params,
        }
    }

    pub fn state(&self) -> HealthState                { self.state }
    pub fn remaining_sick_time(&self) -> u32          { self.remaining_sick_time }
    pub fn countdown_to_quarantine(&self) -> u32      { self.countdown_to_quarantine }
    pub fn params(&self) -> &DiseaseConfig            { &self.params }

    pub fn is_sick(&self) -> bool {
        self.state.is_sick()
    }

    /// Seed an index case. Overrides any state, Vaccinated included.
    /// Never reached by normal ticking.
    pub fn force_infect(&mut self) {
        self.state = HealthState::NoSymptoms;
        self.remaining_sick_time = self.params.sick_time;
        self.countdown_to_quarantine = 0;
    }

    /// Apply the outcome of one contact. `bed_available` is only
    /// consulted for `Exposure::Severe`. Returns the new state when the
    /// agent changed.
    pub fn apply_exposure(&mut self, exposure: Exposure, bed_available: bool) -> Option<HealthState> {
        if !self.state.is_susceptible() {
            return None;
        }
        match exposure {
            Exposure::Unaffected => return None,
            Exposure::Asymptomatic => {
                self.state = HealthState::NoSymptoms;
                self.remaining_sick_time = self.params.sick_time;
            }
            Exposure::Symptomatic => {
                self.state = HealthState::Symptoms;
                self.remaining_sick_time = self.params.sick_time;
                self.countdown_to_quarantine = self.params.time_to_quarantine;
            }
            Exposure::Severe if bed_available => {
                self.state = HealthState::Hospitalization;
                self.remaining_sick_time = self.params.sick_time;
            }
            Exposure::Severe => self.die(),
        }
        Some(self.state)
    }

    /// The death draw is taken on the single tick where the sickness
    /// timer equals `time_before_death`. An offset at or above
    /// `sick_time` therefore never matches for a normal infection.
    pub fn due_for_death_check(&self) -> bool {
        self.state.at_risk_of_death() && self.remaining_sick_time == self.params.time_before_death
    }

    pub fn die(&mut self) {
        self.state = HealthState::Dead;
        self.remaining_sick_time = 0;
        self.countdown_to_quarantine = 0;
    }

    /// Count down to isolation. Returns true when the agent was
    /// quarantined by this call.
    pub fn tick_quarantine_countdown(&mut self) -> bool {
        if self.state != HealthState::Symptoms {
            return false;
        }
        self.countdown_to_quarantine = self.countdown_to_quarantine.saturating_sub(1);
        if self.countdown_to_quarantine == 0 {
            self.state = HealthState::Quarantined;
            return true;
        }
        false
    }

    /// Count down the sickness. Returns true when the agent recovered
    /// by this call.
    pub fn tick_sickness(&mut self) -> bool {
        if !self.state.is_sick() {
            return false;
        }
        self.remaining_sick_time = self.remaining_sick_time.saturating_sub(1);
        if self.remaining_sick_time == 0 {
            self.state = HealthState::Recovered;
            self.countdown_to_quarantine = 0;
            return true;
        }
        false
    }

    /// Returns true when the agent was vaccinated.
    pub fn vaccinate(&mut self) -> bool {
        if !self.state.is_susceptible() {
            return false;
        }
        self.state = HealthState::Vaccinated;
        true
    }
}
