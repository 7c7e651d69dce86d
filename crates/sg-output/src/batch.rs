//! `BatchBuffer` — dual staging queues drained into two independent sinks.
//!
//! # Flush protocol
//!
//! Every appended measurement is staged once per sink.  A flush:
//!
//! 1. drains the relational queue into the relational sink;
//! 2. drains the search queue into the search sink, whatever happened in 1.
//!
//! Each queue is taken out of the buffer before its write starts, so both
//! are empty after `flush` returns no matter how the writes went.  Failed
//! rows are logged and dropped; nothing is retried.

use sg_core::{Measurement, SensorType};
use tracing::{error, info, warn};

use crate::writer::MeasurementSink;
use crate::{OutputError, OutputResult};

/// Default number of ticks buffered before a flush.
pub const DEFAULT_FLUSH_FACTOR: usize = 5;

/// Result of one sink's share of a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    /// The queue was empty; the sink was not called.
    Empty,
    Written(usize),
    /// The sink accepted the batch but rejected some documents.
    Partial { written: usize, failed: usize },
    /// The write failed as a whole; `dropped` rows were discarded.
    Failed { dropped: usize, error: String },
}

impl SinkOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SinkOutcome::Failed { .. } | SinkOutcome::Partial { .. })
    }

    pub fn written(&self) -> usize {
        match self {
            SinkOutcome::Written(n) | SinkOutcome::Partial { written: n, .. } => *n,
            SinkOutcome::Empty | SinkOutcome::Failed { .. } => 0,
        }
    }
}

/// What one call to [`BatchBuffer::flush`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub relational: SinkOutcome,
    pub search:     SinkOutcome,
}

impl FlushReport {
    /// Both sinks took everything they were given.
    pub fn is_clean(&self) -> bool {
        !self.relational.is_failure() && !self.search.is_failure()
    }
}

/// Per-Driver measurement buffer.  Not shared between threads.
#[derive(Debug)]
pub struct BatchBuffer {
    sensor_type: SensorType,
    relational:  Vec<Measurement>,
    search:      Vec<Measurement>,
    threshold:   usize,
}

impl BatchBuffer {
    /// Buffer that becomes flushable at `sensor_count × flush_factor`
    /// staged measurements.
    ///
    /// # Errors
    ///
    /// `Config` if either factor is zero.
    pub fn new(sensor_type: SensorType, sensor_count: usize, flush_factor: usize) -> OutputResult<Self> {
        if sensor_count == 0 {
            return Err(OutputError::Config(format!("{sensor_type}: sensor count must be positive")));
        }
        if flush_factor == 0 {
            return Err(OutputError::Config(format!("{sensor_type}: flush factor must be positive")));
        }
        let threshold = sensor_count.saturating_mul(flush_factor);
        Ok(Self {
            sensor_type,
            relational: Vec::with_capacity(threshold),
            search: Vec::with_capacity(threshold),
            threshold,
        })
    }

    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Measurements staged and not yet flushed.
    #[inline]
    pub fn len(&self) -> usize {
        self.relational.len().max(self.search.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.relational.is_empty() && self.search.is_empty()
    }

    /// Stage one measurement for both sinks.
    #[inline]
    pub fn append(&mut self, m: Measurement) {
        self.search.push(m.clone());
        self.relational.push(m);
    }

    pub fn extend(&mut self, ms: impl IntoIterator<Item = Measurement>) {
        for m in ms {
            self.append(m);
        }
    }

    #[inline]
    pub fn should_flush(&self) -> bool {
        self.len() >= self.threshold
    }

    /// Drain both queues into their sinks.  Never fails; outcomes are
    /// logged and returned.
    pub fn flush(
        &mut self,
        relational: &mut dyn MeasurementSink,
        search: &mut dyn MeasurementSink,
    ) -> FlushReport {
        let rows = std::mem::take(&mut self.relational);
        let relational = drain(self.sensor_type, relational, &rows);
        let docs = std::mem::take(&mut self.search);
        let search = drain(self.sensor_type, search, &docs);
        FlushReport { relational, search }
    }
}

fn drain(sensor_type: SensorType, sink: &mut dyn MeasurementSink, batch: &[Measurement]) -> SinkOutcome {
    if batch.is_empty() {
        return SinkOutcome::Empty;
    }
    let label = sink.label();
    match sink.write_batch(batch) {
        Ok(report) if report.failed == 0 => {
            info!(%sensor_type, sink = label, rows = report.written, "flushed batch");
            SinkOutcome::Written(report.written)
        }
        Ok(report) => {
            warn!(
                %sensor_type,
                sink = label,
                rows = report.written,
                failed = report.failed,
                "partial flush, dropping rejected rows"
            );
            SinkOutcome::Partial {
                written: report.written,
                failed:  report.failed,
            }
        }
        Err(e) => {
            error!(%sensor_type, sink = label, rows = batch.len(), error = %e, "flush failed, dropping batch");
            SinkOutcome::Failed {
                dropped: batch.len(),
                error:   e.to_string(),
            }
        }
    }
}
