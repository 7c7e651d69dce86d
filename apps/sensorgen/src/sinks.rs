//! Sink factories for live runs and backfills, plus provisioning.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sg_core::SensorType;
use sg_driver::SinkFactory;
use sg_output::{
    CsvSink, MeasurementSink, NullSink, OutputResult, SearchConfig, SearchSink, SqliteSink,
    provision_tables,
};
use tracing::{info, warn};

/// SQLite plus (optionally) the search service.
pub struct LiveSinks {
    pub db:     PathBuf,
    pub search: Option<SearchConfig>,
}

impl SinkFactory for LiveSinks {
    fn relational(&self, sensor_type: SensorType) -> OutputResult<Box<dyn MeasurementSink>> {
        Ok(Box::new(SqliteSink::open(&self.db, sensor_type)?))
    }

    fn search(&self, sensor_type: SensorType) -> OutputResult<Box<dyn MeasurementSink>> {
        match &self.search {
            Some(cfg) => Ok(Box::new(SearchSink::new(cfg, sensor_type)?)),
            None => Ok(Box::new(NullSink::new("search"))),
        }
    }
}

/// Per-sensor CSV files; the search side is discarded.
pub struct BackfillSinks {
    pub out: PathBuf,
}

impl SinkFactory for BackfillSinks {
    fn relational(&self, sensor_type: SensorType) -> OutputResult<Box<dyn MeasurementSink>> {
        Ok(Box::new(CsvSink::new(&self.out, sensor_type)?))
    }

    fn search(&self, _sensor_type: SensorType) -> OutputResult<Box<dyn MeasurementSink>> {
        Ok(Box::new(NullSink::new("search")))
    }
}

/// Create missing tables (fatal on failure) and search indices (best effort).
pub fn provision(sinks: &LiveSinks, types: &[SensorType]) -> Result<()> {
    let report = provision_tables(&sinks.db, types)
        .with_context(|| format!("provisioning tables in {}", sinks.db.display()))?;
    info!(
        created = report.created.len(),
        skipped = report.skipped.len(),
        db = %sinks.db.display(),
        "tables provisioned"
    );

    let Some(cfg) = &sinks.search else {
        return Ok(());
    };
    for &t in types {
        match SearchSink::new(cfg, t).and_then(|s| s.ensure_index()) {
            Ok(_) => {}
            Err(e) => warn!(index = %cfg.index_name(t), error = %e, "could not ensure search index"),
        }
    }
    Ok(())
}
