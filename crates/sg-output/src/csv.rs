//! CSV sink used by backfill runs.
//!
//! Creates one file per sensor at `<dir>/<slug>/<sensor_id>.csv`, opened the
//! first time that sensor appears in a batch.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::Writer;
use sg_core::{Measurement, SensorType, format_utc};
use tracing::debug;

use crate::row::value_columns;
use crate::writer::{MeasurementSink, WriteReport};
use crate::{OutputError, OutputResult};

/// Writes one sensor type's measurements to per-sensor CSV files.
pub struct CsvSink {
    dir:         PathBuf,
    sensor_type: SensorType,
    writers:     HashMap<Arc<str>, Writer<File>>,
    finished:    bool,
}

impl CsvSink {
    /// Create `<root>/<slug>/` if needed.
    pub fn new(root: &Path, sensor_type: SensorType) -> OutputResult<Self> {
        let dir = root.join(sensor_type.slug());
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            sensor_type,
            writers: HashMap::new(),
            finished: false,
        })
    }

    pub fn file_path(&self, sensor_id: &str) -> PathBuf {
        self.dir.join(format!("{sensor_id}.csv"))
    }

    fn writer_for(&mut self, sensor_id: &Arc<str>) -> OutputResult<&mut Writer<File>> {
        if !self.writers.contains_key(sensor_id) {
            let path = self.file_path(sensor_id);
            let mut w = Writer::from_path(&path)?;
            let mut header = vec!["timestamp", "sensor_type", "sensor_id", "zone_id", "unit"];
            header.extend_from_slice(value_columns(self.sensor_type));
            w.write_record(&header)?;
            debug!(path = %path.display(), "opened CSV file");
            self.writers.insert(sensor_id.clone(), w);
        }
        self.writers
            .get_mut(sensor_id)
            .ok_or_else(|| OutputError::Config(format!("no CSV writer for {sensor_id}")))
    }
}

impl MeasurementSink for CsvSink {
    fn label(&self) -> &'static str {
        "csv"
    }

    fn write_batch(&mut self, batch: &[Measurement]) -> OutputResult<WriteReport> {
        for m in batch {
            if m.sensor_type != self.sensor_type {
                return Err(OutputError::WrongSensorType {
                    sink:     "csv",
                    expected: self.sensor_type,
                    got:      m.sensor_type,
                });
            }
            let mut record = vec![
                format_utc(m.timestamp),
                m.sensor_type.label().to_owned(),
                m.sensor_id.to_string(),
                m.zone_id.to_string(),
                m.unit().to_owned(),
            ];
            record.extend(m.reading.channels().iter().map(|v| v.to_string()));
            self.writer_for(&m.sensor_id)?.write_record(&record)?;
        }
        Ok(WriteReport::all(batch.len()))
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        for w in self.writers.values_mut() {
            w.flush()?;
        }
        Ok(())
    }
}
