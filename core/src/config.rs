//! Run configuration.
//!
//! Values are consumed once, at population initialization, and never
//! mutated afterwards. `SimConfig::load` reads a JSON file; missing
//! fields fall back to the interactive defaults.

use crate::{
    error::{SimError, SimResult},
    types::Tick,
};
use serde::{Deserialize, Serialize};

/// Per-agent epidemiological parameters. Every agent in a run gets a
/// copy of the same values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiseaseConfig {
    /// Infection without symptoms (asymptomatic carrier).
    pub prob_no_symptoms:     f64,
    /// Infection with symptoms; quarantined after `time_to_quarantine`.
    pub prob_symptoms:        f64,
    /// Infection severe enough to need a hospital bed.
    pub prob_hospitalization: f64,
    /// Death draw, taken once when `remaining_sick_time` hits `time_before_death`.
    pub prob_death:           f64,
    pub sick_time:            u32,
    pub time_to_quarantine:   u32,
    pub time_before_death:    u32,
}

impl Default for DiseaseConfig {
    fn default() -> Self {
        Self {
            prob_no_symptoms:     0.1,
            prob_symptoms:        0.1,
            prob_hospitalization: 0.1,
            prob_death:           0.1,
            sick_time:            20,
            time_to_quarantine:   10,
            time_before_death:    10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VaccinationConfig {
    pub enabled: bool,
    /// The program starts on the first tick strictly after this many ticks.
    pub delay:   Tick,
    /// Agents vaccinated per tick once the program is running.
    pub rate:    usize,
}

impl Default for VaccinationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay:   200,
            rate:    10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub num_agents:            usize,
    pub num_sick:              usize,
    pub width:                 usize,
    pub height:                usize,
    pub hospitalization_limit: usize,
    pub disease:               DiseaseConfig,
    pub vaccination:           VaccinationConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_agents:            50,
            num_sick:              1,
            width:                 25,
            height:                25,
            hospitalization_limit: 5,
            disease:               DiseaseConfig::default(),
            vaccination:           VaccinationConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &str) -> SimResult<Self> {
        log::debug!("loading config from {path}");
        let content = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    /// Small grid, no vaccination, fast disease course.
    pub fn default_test() -> Self {
        Self {
            num_agents:            40,
            num_sick:              4,
            width:                 10,
            height:                10,
            hospitalization_limit: 3,
            disease: DiseaseConfig {
                prob_no_symptoms:     0.3,
                prob_symptoms:        0.3,
                prob_hospitalization: 0.2,
                prob_death:           0.2,
                sick_time:            8,
                time_to_quarantine:   3,
                time_before_death:    4,
            },
            vaccination: VaccinationConfig {
                enabled: false,
                delay:   0,
                rate:    0,
            },
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Reject configurations the model cannot run.
    /// A population larger than the grid is not checked here; placement
    /// reports it as `NoCapacity`.
    pub fn validate(&self) -> SimResult<()> {
        if self.width == 0 {
            return Err(SimError::config("width", "must be positive"));
        }
        if self.height == 0 {
            return Err(SimError::config("height", "must be positive"));
        }
        if self.num_sick > self.num_agents {
            return Err(SimError::config(
                "num_sick",
                format!("{} exceeds population size {}", self.num_sick, self.num_agents),
            ));
        }
        if self.disease.sick_time == 0 {
            return Err(SimError::config("disease.sick_time", "must be at least one tick"));
        }

        let d = &self.disease;
        check_probability("disease.prob_no_symptoms", d.prob_no_symptoms)?;
        check_probability("disease.prob_symptoms", d.prob_symptoms)?;
        check_probability("disease.prob_hospitalization", d.prob_hospitalization)?;
        check_probability("disease.prob_death", d.prob_death)?;
        Ok(())
    }
}

fn check_probability(field: &'static str, p: f64) -> SimResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SimError::config(field, format!("{p} is outside [0, 1]")));
    }
    Ok(())
}
