//! Metrics sink.
//!
//! The population pushes one row of scalar aggregates per tick. Sinks
//! are fire-and-forget: a sink that cannot store a row logs and drops
//! it; the simulation never waits on or fails because of a sink.

use crate::{
    store::SimStore,
    types::{RunId, Tick},
};
use std::collections::BTreeMap;

/// One tick's aggregates, keyed by metric name.
pub type MetricRow = BTreeMap<String, f64>;

pub const SICK: &str = "sick";
pub const HOSPITALIZED: &str = "hospitalized";
pub const VACCINATED: &str = "vaccinated";
/// Prefix of the per-state fractions, e.g. `state.quarantined`.
pub const STATE_PREFIX: &str = "state.";

pub trait MetricsSink {
    fn record(&mut self, tick: Tick, metrics: &MetricRow);
}

/// Keeps every row in memory.
#[derive(Debug, Clone, Default)]
pub struct MetricsHistory {
    pub rows: Vec<(Tick, MetricRow)>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded values of one metric, in tick order.
    pub fn series(&self, name: &str) -> Vec<(Tick, f64)> {
        self.rows
            .iter()
            .filter_map(|(tick, row)| row.get(name).map(|v| (*tick, *v)))
            .collect()
    }
}

impl MetricsSink for MetricsHistory {
    fn record(&mut self, tick: Tick, metrics: &MetricRow) {
        self.rows.push((tick, metrics.clone()));
    }
}

/// Writes rows to the `metric` table of a run.
pub struct SqliteMetricsSink<'a> {
    store:  &'a SimStore,
    run_id: RunId,
}

impl<'a> SqliteMetricsSink<'a> {
    pub fn new(store: &'a SimStore, run_id: RunId) -> Self {
        Self { store, run_id }
    }
}

impl MetricsSink for SqliteMetricsSink<'_> {
    fn record(&mut self, tick: Tick, metrics: &MetricRow) {
        if let Err(e) = self.store.record_metrics(&self.run_id, tick, metrics) {
            log::warn!("tick={tick} dropped metrics row: {e}");
        }
    }
}
