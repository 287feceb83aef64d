//! The simulation engine: clock, population and persistence.
//!
//! EXECUTION ORDER (per tick, fixed):
//!   1. Clock advances.
//!   2. Population tick (metrics row → agents in shuffled order →
//!      vaccination), with the store as metrics sink.
//!   3. Every emitted event is appended to the event log.
//!   4. Snapshot every SNAPSHOT_INTERVAL ticks.
//!
//! RULES:
//!   - All randomness flows through the population's SimRng.
//!   - All state changes are recorded in the event log.
//!   - Clock and population tick counts never diverge.

use crate::{
    clock::SimClock,
    config::SimConfig,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    metrics::SqliteMetricsSink,
    population::Population,
    snapshot::{SimSnapshot, SNAPSHOT_INTERVAL},
    store::SimStore,
    types::{AgentId, RunId, Tick},
};

pub struct SimEngine {
    pub run_id: RunId,
    pub clock:  SimClock,
    pub store:  SimStore,
    seed:       u64,
    population: Population,
}

impl SimEngine {
    /// Initialize the population and register the run in the store.
    /// The store must already be migrated.
    pub fn new(run_id: RunId, seed: u64, config: &SimConfig, store: SimStore) -> SimResult<Self> {
        let population = Population::initialize(config, seed)?;
        store.insert_run(
            &run_id,
            seed,
            env!("CARGO_PKG_VERSION"),
            &serde_json::to_string(config)?,
        )?;
        Ok(Self {
            clock: SimClock::new(run_id.clone()),
            store,
            seed,
            population,
            run_id,
        })
    }

    /// Engine on a fresh in-memory store with the given config.
    pub fn build_test_with(run_id: RunId, seed: u64, config: &SimConfig) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        Self::new(run_id, seed, config, store)
    }

    /// Engine on a fresh in-memory store with `SimConfig::default_test()`.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build_test_with(run_id, seed, &SimConfig::default_test())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Seed an extra index case. Returns false for an unknown id.
    pub fn force_infect(&mut self, agent_id: AgentId) -> bool {
        self.population.force_infect(agent_id)
    }

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        assert!(!self.clock.paused, "tick() called on paused engine");

        let current_tick = self.clock.advance();
        let mut tick_events: Vec<SimEvent> = vec![SimEvent::TickStarted { tick: current_tick }];

        let mut sink = SqliteMetricsSink::new(&self.store, self.run_id.clone());
        let new_events = self.population.tick(&mut sink)?;

        if self.population.elapsed_ticks() != current_tick {
            return Err(SimError::TickMismatch {
                expected: current_tick,
                actual:   self.population.elapsed_ticks(),
            });
        }

        for event in &new_events {
            self.append_event(current_tick, event)?;
        }
        tick_events.extend(new_events);
        tick_events.push(SimEvent::TickCompleted { tick: current_tick });

        if current_tick % SNAPSHOT_INTERVAL == 0 {
            self.take_snapshot()?;
        }

        Ok(tick_events)
    }

    /// Run n ticks in a loop.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        self.log_run_initialized()?;
        self.clock.resume();
        for _ in 0..n {
            self.tick()?;
        }
        self.clock.pause();
        Ok(())
    }

    /// Run until nobody is sick, or `max_ticks` ticks have passed.
    /// Returns the number of ticks run by this call.
    pub fn run_until_extinct(&mut self, max_ticks: u64) -> SimResult<Tick> {
        self.log_run_initialized()?;
        self.clock.resume();
        let mut ran = 0;
        while ran < max_ticks && self.population.count_sick() > 0 {
            self.tick()?;
            ran += 1;
        }
        self.clock.pause();
        log::info!(
            "run {} stopped after {ran} ticks, {} still sick",
            self.run_id,
            self.population.count_sick()
        );
        Ok(ran)
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(&self, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(&self.run_id, tick)
    }

    /// Emit RunInitialized at tick 0 so seed differences are observable.
    fn log_run_initialized(&self) -> SimResult<()> {
        if self.clock.current_tick != 0 {
            return Ok(());
        }
        if !self.store_events_for_tick(0)?.is_empty() {
            return Ok(());
        }
        let init_event = SimEvent::RunInitialized {
            run_id: self.run_id.clone(),
            seed:   self.seed,
        };
        self.append_event(0, &init_event)?;
        log::info!("run {} initialized with seed {}", self.run_id, self.seed);
        Ok(())
    }

    fn append_event(&self, tick: Tick, event: &SimEvent) -> SimResult<()> {
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            tick,
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        self.store.append_event(&entry)
    }

    fn take_snapshot(&self) -> SimResult<()> {
        let snapshot = SimSnapshot::capture(self.run_id.clone(), &self.clock, &self.population);
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, snapshot.tick, &json)?;
        log::debug!("Snapshot saved at tick {}", snapshot.tick);
        Ok(())
    }
}
