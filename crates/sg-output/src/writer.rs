//! The `MeasurementSink` trait implemented by all backends.

use sg_core::Measurement;

use crate::OutputResult;

/// How much of one batch a sink accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: usize,
    /// Documents the sink rejected individually while accepting the rest.
    pub failed:  usize,
}

impl WriteReport {
    pub fn all(written: usize) -> Self {
        Self { written, failed: 0 }
    }
}

/// Trait implemented by the SQLite, search and CSV sinks.
///
/// A sink is owned by exactly one Driver and only ever called from that
/// Driver's thread, so it needs `Send` but not `Sync`.
pub trait MeasurementSink: Send {
    /// Short name used in log fields (`relational`, `search`, `csv`).
    fn label(&self) -> &'static str;

    /// Write one batch.  An `Err` means nothing from the batch is known to
    /// have landed; partial acceptance is reported through [`WriteReport`].
    fn write_batch(&mut self, batch: &[Measurement]) -> OutputResult<WriteReport>;

    /// Flush and release underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

impl<S: MeasurementSink + ?Sized> MeasurementSink for Box<S> {
    fn label(&self) -> &'static str {
        (**self).label()
    }

    fn write_batch(&mut self, batch: &[Measurement]) -> OutputResult<WriteReport> {
        (**self).write_batch(batch)
    }

    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }
}

/// A sink that accepts and discards everything.  Stands in for a disabled
/// search service (`--no-search`).
#[derive(Debug, Clone, Copy)]
pub struct NullSink {
    label: &'static str,
}

impl NullSink {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl MeasurementSink for NullSink {
    fn label(&self) -> &'static str {
        self.label
    }

    fn write_batch(&mut self, batch: &[Measurement]) -> OutputResult<WriteReport> {
        Ok(WriteReport::all(batch.len()))
    }
}
