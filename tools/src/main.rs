//! sim-runner: headless runner for the pandemic simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --ticks 365 --db run.db
//!   sim-runner --config data/config.json --until-extinct
//!   sim-runner --seed 7 --json

use anyhow::Result;
use pandemic_core::{
    agent::HealthState,
    config::SimConfig,
    engine::SimEngine,
    event::DeathCause,
    metrics::{HOSPITALIZED, SICK},
    store::SimStore,
    types::Tick,
};
use std::env;

#[derive(serde::Serialize)]
struct RunSummary {
    run_id:                 String,
    seed:                   u64,
    final_tick:             Tick,
    population:             usize,
    state_counts:           Vec<(&'static str, usize)>,
    peak_sick:              f64,
    peak_sick_tick:         Tick,
    peak_hospitalized:      f64,
    illness_deaths:         i64,
    no_bed_deaths:          i64,
    vaccination_started_at: Option<Tick>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 365u64);
    let until_extinct = args.iter().any(|a| a == "--until-extinct");
    let json = args.iter().any(|a| a == "--json");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");

    let config = match string_arg(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if !json {
        println!("Pandemic simulation: sim-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}{}", if until_extinct { " (max)" } else { "" });
        println!("  db:        {db}");
        println!(
            "  agents:    {} ({} sick) on {}x{}",
            config.num_agents, config.num_sick, config.width, config.height
        );
        println!();
    }

    let store = SimStore::open(db)?;
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", uuid::Uuid::new_v4().simple());
    let mut engine = SimEngine::new(run_id.clone(), seed, &config, store)?;
    log::info!("starting {run_id} (db={db}, ticks={ticks}, until_extinct={until_extinct})");

    if until_extinct {
        engine.run_until_extinct(ticks)?;
    } else {
        engine.run_ticks(ticks)?;
    }
    log::info!(
        "finished {run_id} at tick {}, {} sick, {} dead",
        engine.clock.current_tick,
        engine.population().count_sick(),
        engine.population().count(HealthState::Dead),
    );

    let summary = build_summary(&engine)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn build_summary(engine: &SimEngine) -> Result<RunSummary> {
    let run_id = &engine.run_id;
    let population = engine.population();

    let sick = engine.store.metric_series(run_id, SICK)?;
    let (peak_sick_tick, peak_sick) = sick
        .iter()
        .copied()
        .fold((0, 0.0), |best, (tick, v)| if v > best.1 { (tick, v) } else { best });
    let peak_hospitalized = engine
        .store
        .metric_series(run_id, HOSPITALIZED)?
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0, f64::max);

    Ok(RunSummary {
        run_id:       run_id.clone(),
        seed:         engine.seed(),
        final_tick:   engine.clock.current_tick,
        population:   population.size(),
        state_counts: population
            .state_counts()
            .into_iter()
            .map(|(state, count)| (state.name(), count))
            .collect(),
        peak_sick,
        peak_sick_tick,
        peak_hospitalized,
        illness_deaths: engine.store.death_count(run_id, DeathCause::Illness)?,
        no_bed_deaths:  engine.store.death_count(run_id, DeathCause::NoHospitalBed)?,
        vaccination_started_at: population.vaccination().started_at,
    })
}

fn print_summary(s: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:            {}", s.run_id);
    println!("  final tick:        {}", s.final_tick);
    println!("  population:        {}", s.population);
    for (name, count) in &s.state_counts {
        println!("  {name:<18} {count}");
    }
    println!();
    println!("=== OUTBREAK ===");
    println!("  peak sick:         {:.1}% at tick {}", s.peak_sick * 100.0, s.peak_sick_tick);
    println!("  peak hospitalized: {:.1}%", s.peak_hospitalized * 100.0);
    println!("  illness deaths:    {}", s.illness_deaths);
    println!("  no-bed deaths:     {}", s.no_bed_deaths);
    match s.vaccination_started_at {
        Some(tick) => println!("  vaccination from:  tick {tick}"),
        None => println!("  vaccination:       not started"),
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
