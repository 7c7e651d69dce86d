use sg_core::{CoreError, SensorType};
use sg_output::OutputError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("sink error: {0}")]
    Output(#[from] OutputError),

    #[error("failed to spawn {sensor_type} driver thread: {source}")]
    Spawn {
        sensor_type: SensorType,
        #[source]
        source:      std::io::Error,
    },

    #[error("{0} driver thread panicked")]
    Panicked(SensorType),
}

pub type DriverResult<T> = Result<T, DriverError>;
