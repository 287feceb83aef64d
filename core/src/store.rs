//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine and the metrics sink call store methods and never
//! execute SQL directly.

use crate::{
    error::SimResult,
    event::{DeathCause, EventLogEntry},
    metrics::MetricRow,
    types::Tick,
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: reports "memory".
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str, config_json: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, config_json, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, seed as i64, version, config_json, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn run_seed(&self, run_id: &str) -> SimResult<Option<u64>> {
        let seed = self
            .conn
            .query_row(
                "SELECT seed FROM run WHERE run_id = ?1",
                params![run_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(seed.map(|s| s as u64))
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, tick, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.run_id, entry.tick as i64, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, tick as i64], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    tick:       row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Deaths of one cause, read from the event payloads.
    pub fn death_count(&self, run_id: &str, cause: DeathCause) -> SimResult<i64> {
        let cause = serde_json::to_value(cause)?;
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log
             WHERE run_id = ?1 AND event_type = 'agent_died'
               AND json_extract(payload, '$.cause') = ?2",
            params![run_id, cause.as_str().unwrap_or_default()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Metrics ────────────────────────────────────────────────

    pub fn record_metrics(&self, run_id: &str, tick: Tick, metrics: &MetricRow) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR REPLACE INTO metric (run_id, tick, name, value) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (name, value) in metrics {
            stmt.execute(params![run_id, tick as i64, name, value])?;
        }
        Ok(())
    }

    pub fn metrics_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<MetricRow> {
        let mut stmt = self.conn.prepare(
            "SELECT name, value FROM metric WHERE run_id = ?1 AND tick = ?2",
        )?;
        let row = stmt
            .query_map(params![run_id, tick as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<MetricRow, _>>()?;
        Ok(row)
    }

    /// One metric across the whole run, in tick order.
    pub fn metric_series(&self, run_id: &str, name: &str) -> SimResult<Vec<(Tick, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tick, value FROM metric WHERE run_id = ?1 AND name = ?2 ORDER BY tick ASC",
        )?;
        let series = stmt
            .query_map(params![run_id, name], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(series)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, run_id: &str, tick: Tick, state_json: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO snapshot (run_id, tick, state_json) VALUES (?1, ?2, ?3)",
            params![run_id, tick as i64, state_json],
        )?;
        Ok(())
    }

    pub fn latest_snapshot_before(
        &self,
        run_id: &str,
        tick: Tick,
    ) -> SimResult<Option<(Tick, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT tick, state_json FROM snapshot
                 WHERE run_id = ?1 AND tick <= ?2
                 ORDER BY tick DESC LIMIT 1",
                params![run_id, tick as i64],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }
}
