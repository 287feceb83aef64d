//! Hand-built scenarios with fully predictable outcomes.
//!
//! Most of them fill the grid completely so nobody can move and every
//! agent is a neighbor of a known set of others.

use pandemic_core::{
    agent::HealthState,
    config::{DiseaseConfig, SimConfig, VaccinationConfig},
    event::{DeathCause, SimEvent},
    metrics::{MetricsHistory, SICK},
    population::Population,
    types::Position,
};

fn disease(no_symptoms: f64, symptoms: f64, hospital: f64) -> DiseaseConfig {
    DiseaseConfig {
        prob_no_symptoms:     no_symptoms,
        prob_symptoms:        symptoms,
        prob_hospitalization: hospital,
        prob_death:           0.0,
        sick_time:            3,
        time_to_quarantine:   10,
        time_before_death:    0,
    }
}

fn full_grid(width: usize, height: usize, disease: DiseaseConfig) -> SimConfig {
    SimConfig {
        num_agents: width * height,
        num_sick: 1,
        width,
        height,
        hospitalization_limit: 0,
        disease,
        vaccination: VaccinationConfig {
            enabled: false,
            delay:   0,
            rate:    0,
        },
    }
}

fn states(population: &Population) -> Vec<HealthState> {
    population.agents().iter().map(|a| a.state()).collect()
}

/// 2×2 torus: every agent neighbors every other one.
#[test]
fn index_case_infects_all_neighbors_and_recovers_at_tick_three() {
    let config = full_grid(2, 2, disease(1.0, 0.0, 0.0));
    let mut population = Population::initialize(&config, 2024).unwrap();
    let mut history = MetricsHistory::new();

    assert_eq!(population.agent(0).unwrap().state(), HealthState::NoSymptoms);
    assert_eq!(population.agent(0).unwrap().remaining_sick_time(), 3);

    population.tick(&mut history).unwrap();
    assert!(
        states(&population).iter().all(|s| *s == HealthState::NoSymptoms),
        "all neighbors infected after one tick of contact: {:?}",
        states(&population)
    );

    population.tick(&mut history).unwrap();
    assert_eq!(population.agent(0).unwrap().state(), HealthState::NoSymptoms);

    population.tick(&mut history).unwrap();
    assert_eq!(population.agent(0).unwrap().state(), HealthState::Recovered);
    assert_eq!(population.agent(0).unwrap().remaining_sick_time(), 0);

    population.tick(&mut history).unwrap();
    assert!(states(&population).iter().all(|s| *s == HealthState::Recovered));

    // Rows are end-of-previous-tick snapshots.
    let sick = history.series(SICK);
    assert_eq!(sick[0], (0, 0.25));
    assert_eq!(sick[1], (1, 1.0));
}

/// 3×3 torus with zero beds: every severe case dies at once.
#[test]
fn zero_capacity_turns_hospitalization_into_death() {
    let config = full_grid(3, 3, disease(0.0, 0.0, 1.0));
    let mut population = Population::initialize(&config, 5).unwrap();
    let mut history = MetricsHistory::new();

    let events = population.tick(&mut history).unwrap();

    let bed_deaths = events
        .iter()
        .filter(|e| matches!(e, SimEvent::AgentDied { cause: DeathCause::NoHospitalBed, .. }))
        .count();
    assert_eq!(bed_deaths, 8);
    assert_eq!(population.count(HealthState::Dead), 8);
    assert_eq!(population.count(HealthState::Hospitalization), 0);
    assert!(!population.has_hospital_capacity());
}

/// One bed: the first severe case takes it, the rest die.
#[test]
fn single_bed_is_taken_once_within_a_tick() {
    let mut config = full_grid(3, 3, disease(0.0, 0.0, 1.0));
    config.hospitalization_limit = 1;
    let mut population = Population::initialize(&config, 6).unwrap();
    let mut history = MetricsHistory::new();

    assert!(population.has_hospital_capacity());
    population.tick(&mut history).unwrap();

    assert_eq!(population.count(HealthState::Hospitalization), 1);
    assert_eq!(population.count(HealthState::Dead), 7);
    assert!(!population.has_hospital_capacity());
    assert_eq!(
        population.has_hospital_capacity(),
        population.has_hospital_capacity(),
        "capacity check must be idempotent"
    );
}

/// A freed bed is reused by a later admission.
#[test]
fn recovered_patient_frees_the_bed() {
    let mut config = full_grid(2, 2, disease(0.0, 0.0, 1.0));
    config.hospitalization_limit = 1;
    config.disease.sick_time = 2;
    let mut population = Population::initialize(&config, 8).unwrap();
    let mut history = MetricsHistory::new();

    population.tick(&mut history).unwrap();
    assert_eq!(population.count(HealthState::Hospitalization), 1);

    for _ in 0..3 {
        population.tick(&mut history).unwrap();
    }
    assert_eq!(population.count(HealthState::Hospitalization), 0);
    assert!(population.has_hospital_capacity());
    assert_eq!(population.count(HealthState::Recovered), 2);
    assert_eq!(population.count(HealthState::Dead), 2);
}

#[test]
fn vaccination_starts_after_delay_and_never_resets() {
    let config = SimConfig {
        num_agents: 20,
        num_sick: 0,
        width: 10,
        height: 10,
        hospitalization_limit: 5,
        disease: disease(0.5, 0.5, 0.0),
        vaccination: VaccinationConfig {
            enabled: true,
            delay:   5,
            rate:    2,
        },
    };
    let mut population = Population::initialize(&config, 31).unwrap();
    let mut history = MetricsHistory::new();

    for _ in 0..5 {
        population.tick(&mut history).unwrap();
    }
    assert_eq!(population.count(HealthState::Vaccinated), 0);
    assert!(!population.vaccination().is_active());

    let events = population.tick(&mut history).unwrap();
    assert_eq!(population.elapsed_ticks(), 6);
    assert_eq!(population.count(HealthState::Vaccinated), 2);
    assert_eq!(population.vaccination().started_at, Some(6));
    assert!(events.contains(&SimEvent::VaccinationStarted { tick: 6 }));

    let events = population.tick(&mut history).unwrap();
    assert_eq!(population.count(HealthState::Vaccinated), 4);
    assert_eq!(population.vaccination().started_at, Some(6));
    assert!(!events.iter().any(|e| matches!(e, SimEvent::VaccinationStarted { .. })));
}

#[test]
fn vaccination_is_capped_by_eligible_agents() {
    let config = SimConfig {
        num_agents: 3,
        num_sick: 1,
        width: 5,
        height: 5,
        hospitalization_limit: 0,
        disease: disease(0.0, 0.0, 0.0),
        vaccination: VaccinationConfig {
            enabled: true,
            delay:   0,
            rate:    10,
        },
    };
    let mut population = Population::initialize(&config, 4).unwrap();
    let mut history = MetricsHistory::new();

    population.tick(&mut history).unwrap();
    assert_eq!(population.count(HealthState::Vaccinated), 2, "sick agent is not eligible");

    let events = population.tick(&mut history).unwrap();
    assert!(!events.iter().any(|e| matches!(e, SimEvent::AgentVaccinated { .. })));
}

#[test]
fn disabled_vaccination_never_starts() {
    let mut config = full_grid(4, 4, disease(0.0, 0.0, 0.0));
    config.num_agents = 5;
    config.vaccination = VaccinationConfig { enabled: false, delay: 0, rate: 5 };
    let mut population = Population::initialize(&config, 12).unwrap();
    let mut history = MetricsHistory::new();

    for _ in 0..10 {
        population.tick(&mut history).unwrap();
    }
    assert_eq!(population.count(HealthState::Vaccinated), 0);
    assert!(!population.vaccination().is_active());
}

/// 5×1 ring: each agent touches only its two ring neighbors.
/// Symptomatic cases are isolated before they can pass it on.
#[test]
fn quarantined_agents_do_not_infect() {
    let mut config = full_grid(5, 1, disease(0.0, 1.0, 0.0));
    config.disease.sick_time = 10;
    config.disease.time_to_quarantine = 0;
    let mut population = Population::initialize(&config, 17).unwrap();
    let mut history = MetricsHistory::new();

    for _ in 0..15 {
        population.tick(&mut history).unwrap();
    }

    let counts = population.state_counts();
    assert_eq!(counts[&HealthState::Healthy], 2, "{counts:?}");
    assert_eq!(counts[&HealthState::Recovered], 3, "{counts:?}");
}

#[test]
fn symptomatic_cases_die_at_the_death_offset() {
    let mut config = full_grid(2, 2, disease(0.0, 1.0, 0.0));
    config.disease.sick_time = 4;
    config.disease.time_before_death = 2;
    config.disease.prob_death = 1.0;
    let mut population = Population::initialize(&config, 3).unwrap();
    let mut history = MetricsHistory::new();

    let mut illness_deaths = 0;
    for _ in 0..10 {
        illness_deaths += population
            .tick(&mut history)
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SimEvent::AgentDied { cause: DeathCause::Illness, .. }))
            .count();
    }

    assert_eq!(illness_deaths, 3);
    assert_eq!(population.count(HealthState::Dead), 3);
    // The index case is an asymptomatic carrier and never takes the draw.
    assert_eq!(population.agent(0).unwrap().state(), HealthState::Recovered);
}

/// A death offset beyond the sickness duration never matches the timer.
#[test]
fn death_offset_beyond_sick_time_never_fires() {
    let mut config = full_grid(2, 2, disease(0.0, 1.0, 0.0));
    config.disease.sick_time = 4;
    config.disease.time_before_death = 5;
    config.disease.prob_death = 1.0;
    let mut population = Population::initialize(&config, 3).unwrap();
    let mut history = MetricsHistory::new();

    for _ in 0..10 {
        population.tick(&mut history).unwrap();
    }
    assert_eq!(population.count(HealthState::Dead), 0);
    assert_eq!(population.count(HealthState::Recovered), 4);
}

#[test]
fn residual_probability_leaves_neighbors_healthy() {
    let config = full_grid(2, 2, disease(0.0, 0.0, 0.0));
    let mut population = Population::initialize(&config, 9).unwrap();
    let mut history = MetricsHistory::new();

    for _ in 0..5 {
        population.tick(&mut history).unwrap();
    }
    assert_eq!(population.count(HealthState::Healthy), 3);
    assert_eq!(population.count(HealthState::Recovered), 1);
}

fn healthy_crowd(num_agents: usize, width: usize, height: usize) -> SimConfig {
    SimConfig {
        num_agents,
        num_sick: 0,
        ..full_grid(width, height, disease(0.0, 0.0, 0.0))
    }
}

fn positions_and_directions(population: &Population) -> Vec<(Position, usize)> {
    population.agents().iter().map(|a| (a.position, a.direction)).collect()
}

/// On an open 7×7 torus a lone walker never turns and wraps back home.
#[test]
fn lone_agent_keeps_its_heading_and_wraps_around() {
    let config = healthy_crowd(1, 7, 7);
    let mut population = Population::initialize(&config, 41).unwrap();
    let mut history = MetricsHistory::new();

    let start = population.agent(0).unwrap().position;
    let heading = population.agent(0).unwrap().direction;

    for tick in 1..=7 {
        let before = population.agent(0).unwrap().position;
        population.tick(&mut history).unwrap();
        let agent = population.agent(0).unwrap();
        assert_eq!(agent.direction, heading, "heading changed at tick {tick}");
        assert_eq!(
            agent.position,
            population.grid().neighbor_in_direction(before, heading),
            "one step along the heading at tick {tick}"
        );
        if tick < 7 {
            assert_ne!(agent.position, start, "back home early at tick {tick}");
        }
    }
    assert_eq!(population.agent(0).unwrap().position, start);
}

/// 3×3 torus with a single hole: the hole neighbors everyone, so every
/// agent moves each turn. Blocked agents pick a new heading that points
/// at the cell they moved into.
#[test]
fn blocked_agent_turns_toward_the_cell_it_enters() {
    let config = healthy_crowd(8, 3, 3);
    let mut population = Population::initialize(&config, 77).unwrap();
    let mut history = MetricsHistory::new();

    let mut turns = 0;
    for tick in 1..=5 {
        let before = positions_and_directions(&population);
        population.tick(&mut history).unwrap();

        for (agent, (from, old_heading)) in population.agents().iter().zip(before) {
            assert_ne!(agent.position, from, "agent {} stayed put at tick {tick}", agent.id);
            assert_eq!(
                agent.position,
                population.grid().neighbor_in_direction(from, agent.direction),
                "agent {} heading does not point at its new cell at tick {tick}",
                agent.id
            );
            if agent.direction != old_heading {
                turns += 1;
            }
        }
    }
    assert!(turns > 0, "some agents must have been blocked and turned");
}

/// A completely full grid leaves nowhere to go.
#[test]
fn full_grid_freezes_positions_and_headings() {
    let config = healthy_crowd(9, 3, 3);
    let mut population = Population::initialize(&config, 5).unwrap();
    let mut history = MetricsHistory::new();

    let before = positions_and_directions(&population);
    for _ in 0..3 {
        population.tick(&mut history).unwrap();
    }
    assert_eq!(positions_and_directions(&population), before);
}
