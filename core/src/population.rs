//! The population model: agents, grid and the per-tick protocol.
//!
//! TICK ORDER (fixed):
//!   1. Push end-of-previous-tick aggregates to the metrics sink.
//!   2. Advance every agent once, in a freshly shuffled order:
//!        move → death draw → quarantine countdown → contagion → recovery
//!   3. Vaccination program: trigger once the delay has passed, then
//!      vaccinate up to `rate` eligible agents.
//!
//! RULES:
//!   - The population owns the only RNG; every random draw goes through it.
//!   - Hospital capacity is counted fresh at every admission attempt.
//!   - Agents are never removed. The dead stay on the grid as obstacles.

use crate::{
    agent::{Agent, Exposure, HealthState},
    config::SimConfig,
    error::SimResult,
    event::{DeathCause, SimEvent},
    grid::{Grid, DIRECTION_COUNT},
    metrics::{MetricRow, MetricsSink, HOSPITALIZED, SICK, STATE_PREFIX, VACCINATED},
    rng::SimRng,
    scheduler::RandomActivation,
    types::{AgentId, Tick},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationProgram {
    pub enabled:    bool,
    pub delay:      Tick,
    pub rate:       usize,
    /// Tick on which the program was triggered. Set once, never reset.
    pub started_at: Option<Tick>,
}

impl VaccinationProgram {
    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }
}

pub struct Population {
    agents:                Vec<Agent>,
    grid:                  Grid,
    scheduler:             RandomActivation,
    rng:                   SimRng,
    hospitalization_limit: usize,
    vaccination:           VaccinationProgram,
    elapsed_ticks:         Tick,
}

impl Population {
    /// Create, seed and place the whole population.
    ///
    /// The first `num_sick` agents are force-infected. Fails with a
    /// configuration error on invalid input and with `NoCapacity` when
    /// the grid has fewer cells than agents.
    pub fn initialize(config: &SimConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;

        let mut rng = SimRng::new(seed);
        let mut grid = Grid::new(config.width, config.height);
        let mut agents = Vec::with_capacity(config.num_agents);

        for id in 0..config.num_agents {
            let direction = rng.next_index(DIRECTION_COUNT);
            let mut agent = Agent::new(id, config.disease, direction);
            if id < config.num_sick {
                agent.force_infect();
            }
            agent.position = grid.place_randomly(id, &mut rng)?;
            agents.push(agent);
        }

        log::info!(
            "population initialized: {} agents ({} sick) on {}x{} grid, seed={seed}",
            config.num_agents,
            config.num_sick,
            config.width,
            config.height,
        );

        Ok(Self {
            scheduler: RandomActivation::new(agents.len()),
            agents,
            grid,
            rng,
            hospitalization_limit: config.hospitalization_limit,
            vaccination: VaccinationProgram {
                enabled:    config.vaccination.enabled,
                delay:      config.vaccination.delay,
                rate:       config.vaccination.rate,
                started_at: None,
            },
            elapsed_ticks: 0,
        })
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn agents(&self) -> &[Agent]                   { &self.agents }
    pub fn agent(&self, id: AgentId) -> Option<&Agent> { self.agents.get(id) }
    pub fn grid(&self) -> &Grid                        { &self.grid }
    pub fn elapsed_ticks(&self) -> Tick                { self.elapsed_ticks }
    pub fn vaccination(&self) -> &VaccinationProgram   { &self.vaccination }
    pub fn hospitalization_limit(&self) -> usize       { self.hospitalization_limit }

    /// Population size, fixed at initialization. The dead are included.
    pub fn size(&self) -> usize {
        self.agents.len()
    }

    // ── Tick ───────────────────────────────────────────────────

    /// Advance the whole population by one tick. Returns the events
    /// emitted, in order.
    pub fn tick(&mut self, sink: &mut dyn MetricsSink) -> SimResult<Vec<SimEvent>> {
        sink.record(self.elapsed_ticks, &self.metrics());

        self.elapsed_ticks += 1;
        let tick = self.elapsed_ticks;
        let mut events = Vec::new();

        for id in self.scheduler.next_order(&mut self.rng) {
            self.advance(id, tick, &mut events)?;
        }
        self.run_vaccination(tick, &mut events);

        log::debug!(
            "tick={tick} sick={:.3} hospitalized={} dead={} vaccinated={}",
            self.fraction_sick(),
            self.count(HealthState::Hospitalization),
            self.count(HealthState::Dead),
            self.count(HealthState::Vaccinated),
        );
        Ok(events)
    }

    /// One agent's turn.
    fn advance(&mut self, id: AgentId, tick: Tick, events: &mut Vec<SimEvent>) -> SimResult<()> {
        if self.agents[id].state().can_move() {
            self.move_agent(id)?;
        }

        if self.agents[id].due_for_death_check() {
            let prob_death = self.agents[id].params().prob_death;
            if self.rng.chance(prob_death) {
                self.agents[id].die();
                events.push(SimEvent::AgentDied {
                    tick,
                    agent_id: id,
                    cause: DeathCause::Illness,
                });
                return Ok(());
            }
        }

        if self.agents[id].tick_quarantine_countdown() {
            events.push(SimEvent::AgentQuarantined { tick, agent_id: id });
        }

        if self.agents[id].state().can_infect_others() {
            let position = self.agents[id].position;
            for neighbor in self.grid.occupied_neighbors(position) {
                self.infect(neighbor, id, tick, events);
            }
        }

        if self.agents[id].tick_sickness() {
            events.push(SimEvent::AgentRecovered { tick, agent_id: id });
        }
        Ok(())
    }

    /// Step in the stored direction; when that cell is taken, try the
    /// directions in random order and keep the first free one.
    fn move_agent(&mut self, id: AgentId) -> SimResult<()> {
        let from = self.agents[id].position;
        let preferred = self.grid.neighbor_in_direction(from, self.agents[id].direction);

        if self.grid.is_empty(preferred) {
            self.grid.move_agent(id, from, preferred)?;
            self.agents[id].position = preferred;
            return Ok(());
        }
        if self.grid.empty_neighbors(from).is_empty() {
            return Ok(());
        }

        let mut directions: [usize; DIRECTION_COUNT] = std::array::from_fn(|d| d);
        self.rng.shuffle(&mut directions);
        for direction in directions {
            let target = self.grid.neighbor_in_direction(from, direction);
            if self.grid.is_empty(target) {
                self.grid.move_agent(id, from, target)?;
                let agent = &mut self.agents[id];
                agent.position = target;
                agent.direction = direction;
                break;
            }
        }
        Ok(())
    }

    /// Contact from `source` to `target`. Draws only when the target is
    /// still susceptible.
    fn infect(&mut self, target: AgentId, source: AgentId, tick: Tick, events: &mut Vec<SimEvent>) {
        if !self.agents[target].state().is_susceptible() {
            return;
        }
        let roll = self.rng.next_f64();
        let exposure = Exposure::from_roll(self.agents[target].params(), roll);
        let bed_available = exposure == Exposure::Severe && self.has_hospital_capacity();

        match self.agents[target].apply_exposure(exposure, bed_available) {
            Some(HealthState::Dead) => events.push(SimEvent::AgentDied {
                tick,
                agent_id: target,
                cause: DeathCause::NoHospitalBed,
            }),
            Some(state) => events.push(SimEvent::AgentInfected {
                tick,
                agent_id: target,
                source_id: source,
                state,
            }),
            None => {}
        }
    }

    /// Seed an index case outside normal ticking. Overrides any state.
    /// Returns false for an unknown id.
    pub fn force_infect(&mut self, id: AgentId) -> bool {
        match self.agents.get_mut(id) {
            Some(agent) => {
                agent.force_infect();
                true
            }
            None => false,
        }
    }

    fn run_vaccination(&mut self, tick: Tick, events: &mut Vec<SimEvent>) {
        if !self.vaccination.enabled {
            return;
        }
        if !self.vaccination.is_active() && tick > self.vaccination.delay {
            self.vaccination.started_at = Some(tick);
            events.push(SimEvent::VaccinationStarted { tick });
            log::debug!("tick={tick} vaccination program started");
        }
        if !self.vaccination.is_active() {
            return;
        }

        let eligible: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| a.state().is_susceptible())
            .map(|a| a.id)
            .collect();
        for id in self.rng.sample(&eligible, self.vaccination.rate) {
            if self.agents[id].vaccinate() {
                events.push(SimEvent::AgentVaccinated { tick, agent_id: id });
            }
        }
    }

    // ── Aggregates ─────────────────────────────────────────────

    /// True while fewer agents are hospitalized than there are beds.
    pub fn has_hospital_capacity(&self) -> bool {
        self.count(HealthState::Hospitalization) < self.hospitalization_limit
    }

    pub fn count(&self, state: HealthState) -> usize {
        self.agents.iter().filter(|a| a.state() == state).count()
    }

    pub fn count_sick(&self) -> usize {
        self.agents.iter().filter(|a| a.is_sick()).count()
    }

    pub fn state_counts(&self) -> BTreeMap<HealthState, usize> {
        let mut counts: BTreeMap<HealthState, usize> =
            HealthState::ALL.iter().map(|s| (*s, 0)).collect();
        for agent in &self.agents {
            *counts.entry(agent.state()).or_default() += 1;
        }
        counts
    }

    /// `count / size`. An empty population has every fraction at 0.0.
    fn fraction_of(&self, count: usize) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        count as f64 / self.agents.len() as f64
    }

    pub fn fraction(&self, state: HealthState) -> f64 {
        self.fraction_of(self.count(state))
    }

    pub fn fraction_sick(&self) -> f64 {
        self.fraction_of(self.count_sick())
    }

    pub fn fraction_hospitalized(&self) -> f64 {
        self.fraction(HealthState::Hospitalization)
    }

    pub fn fraction_vaccinated(&self) -> f64 {
        self.fraction(HealthState::Vaccinated)
    }

    /// The row pushed to the metrics sink.
    pub fn metrics(&self) -> MetricRow {
        let mut row = MetricRow::new();
        row.insert(SICK.to_string(), self.fraction_sick());
        row.insert(HOSPITALIZED.to_string(), self.fraction_hospitalized());
        row.insert(VACCINATED.to_string(), self.fraction_vaccinated());
        for (state, count) in self.state_counts() {
            row.insert(format!("{STATE_PREFIX}{}", state.name()), self.fraction_of(count));
        }
        row
    }
}
