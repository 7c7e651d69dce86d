//! `sg-output` — measurement sinks and the dual-sink batch buffer.
//!
//! Three backends, two of them behind Cargo features (both on by default):
//!
//! | Feature   | Backend         | Target                                           |
//! |-----------|-----------------|--------------------------------------------------|
//! | *(none)*  | CSV             | `<dir>/<type>/<sensor_id>.csv` (backfill)        |
//! | `sqlite`  | SQLite          | one table per sensor type in a shared database   |
//! | `search`  | HTTP bulk index | one index per sensor type                        |
//!
//! All backends implement [`MeasurementSink`].  A Driver stages measurements
//! in a [`BatchBuffer`] and drains it into a relational and a search sink,
//! which fail independently of each other.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sg_output::{BatchBuffer, NullSink, SqliteSink};
//!
//! let mut sql = SqliteSink::open(Path::new("sensors.db"), SensorType::Temperature)?;
//! let mut search = NullSink::new("search");
//! let mut buf = BatchBuffer::new(SensorType::Temperature, 12, 5)?;
//! buf.extend(measurements);
//! if buf.should_flush() {
//!     let report = buf.flush(&mut sql, &mut search);
//! }
//! ```

pub mod batch;
pub mod csv;
pub mod error;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "search")]
pub mod search;


pub use batch::{BatchBuffer, DEFAULT_FLUSH_FACTOR, FlushReport, SinkOutcome};
pub use csv::CsvSink;
pub use error::{OutputError, OutputResult};
pub use row::{SearchDocument, value_columns};
pub use writer::{MeasurementSink, NullSink, WriteReport};

#[cfg(feature = "sqlite")]
pub use sqlite::{ProvisionReport, SqliteSink, provision_tables};

#[cfg(feature = "search")]
pub use search::{SearchConfig, SearchSink, parse_bulk_response};
