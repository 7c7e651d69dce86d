//! SQLite relational sink (feature `sqlite`).
//!
//! One table per sensor type (`temp_data`, `hum_data`, `wind_data`,
//! `esd_data`, `lpm_data`), all in a single database file.  Every Driver opens
//! its own connection; WAL mode plus a busy timeout lets five writers share
//! the file.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, params_from_iter, types::Value};
use sg_core::{Measurement, SensorType};
use tracing::info;

use crate::row::{sql_timestamp, value_columns};
use crate::writer::{MeasurementSink, WriteReport};
use crate::{OutputError, OutputResult};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn open(path: &Path) -> OutputResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous  = NORMAL;",
    )?;
    Ok(conn)
}

fn create_table_sql(sensor_type: SensorType) -> String {
    let values: String = value_columns(sensor_type)
        .iter()
        .map(|c| format!(",\n    {c} REAL"))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   TEXT NOT NULL,
    sensor_type TEXT NOT NULL,
    sensor_id   TEXT NOT NULL,
    zone_id     TEXT NOT NULL,
    unit        TEXT NOT NULL{values}
)",
        table = sensor_type.table(),
    )
}

fn insert_sql(sensor_type: SensorType) -> String {
    let cols = value_columns(sensor_type);
    let placeholders: Vec<String> = (1..=5 + cols.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} (timestamp, sensor_type, sensor_id, zone_id, unit, {}) VALUES ({})",
        sensor_type.table(),
        cols.join(", "),
        placeholders.join(", "),
    )
}

fn table_exists(conn: &Connection, table: &str) -> OutputResult<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

/// Outcome of [`provision_tables`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

/// Create the table for each of `sensor_types` unless it already exists.
///
/// Idempotent: a second call reports every table as skipped.
pub fn provision_tables(path: &Path, sensor_types: &[SensorType]) -> OutputResult<ProvisionReport> {
    let conn = open(path)?;
    let mut report = ProvisionReport::default();
    for &t in sensor_types {
        let table = t.table();
        if table_exists(&conn, table)? {
            info!(table, "table already exists, skipping");
            report.skipped.push(table);
        } else {
            conn.execute_batch(&create_table_sql(t))?;
            info!(table, "created table");
            report.created.push(table);
        }
    }
    Ok(report)
}

/// Writes one sensor type's measurements into its table.
pub struct SqliteSink {
    conn:        Connection,
    sensor_type: SensorType,
    insert:      String,
    finished:    bool,
}

impl SqliteSink {
    /// Open (or create) the database at `path`.  The table itself is created
    /// by [`provision_tables`].
    pub fn open(path: &Path, sensor_type: SensorType) -> OutputResult<Self> {
        Ok(Self {
            conn: open(path)?,
            sensor_type,
            insert: insert_sql(sensor_type),
            finished: false,
        })
    }
}

impl MeasurementSink for SqliteSink {
    fn label(&self) -> &'static str {
        "relational"
    }

    /// Insert the whole batch in one transaction.  Any failing row rolls the
    /// transaction back, so a batch lands completely or not at all.
    fn write_batch(&mut self, batch: &[Measurement]) -> OutputResult<WriteReport> {
        if batch.is_empty() {
            return Ok(WriteReport::default());
        }
        if let Some(m) = batch.iter().find(|m| m.sensor_type != self.sensor_type) {
            return Err(OutputError::WrongSensorType {
                sink:     "relational",
                expected: self.sensor_type,
                got:      m.sensor_type,
            });
        }

        // Dropping an uncommitted transaction rolls it back.
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&self.insert)?;
            for m in batch {
                let mut row: Vec<Value> = vec![
                    Value::Text(sql_timestamp(m)),
                    Value::Text(m.sensor_type.label().to_owned()),
                    Value::Text(m.sensor_id.to_string()),
                    Value::Text(m.zone_id.to_string()),
                    Value::Text(m.unit().to_owned()),
                ];
                row.extend(m.reading.channels().iter().map(|v| Value::Real(*v)));
                stmt.execute(params_from_iter(row))?;
            }
        }
        tx.commit()?;
        Ok(WriteReport::all(batch.len()))
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        // Another Driver may still hold the WAL open; a passive checkpoint
        // never blocks on it.
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}
