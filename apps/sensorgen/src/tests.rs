use std::time::Duration;

use sg_core::{SensorType, SimClock};
use sg_driver::{Runner, RunnerConfig};

use crate::config::AppConfig;
use crate::logging::LogFormat;
use crate::sinks::{BackfillSinks, LiveSinks};

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.database.path.to_str(), Some("sensors.db"));
        assert!(config.search.enabled);
        assert_eq!(config.search.url, "http://localhost:9200");
        assert_eq!(config.simulation.tick_ms, 1_000);
        assert_eq!(config.simulation.flush_factor, 5);
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [simulation]
            seed = 7
            sensor_types = ["esd", "particle"]

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.tick_ms, 1_000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.search.index_prefix, "sensor");

        let registry = config.registry().unwrap();
        assert_eq!(
            config.selected_types(&registry),
            vec![SensorType::Esd, SensorType::Particle]
        );
    }

    #[test]
    fn empty_selection_means_whole_fleet() {
        let config = AppConfig::default();
        let registry = config.registry().unwrap();
        assert_eq!(config.selected_types(&registry).len(), SensorType::ALL.len());
    }

    #[test]
    fn fleet_override_replaces_one_type() {
        let config = AppConfig::from_toml(
            r#"
            [[fleet.temperature]]
            sensor_id = "temp-101"
            zone_id = "a01"

            [[fleet.temperature]]
            sensor_id = "temp-102"
            zone_id = "b02"
            "#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        let temps = registry.sensors(SensorType::Temperature);
        assert_eq!(temps.len(), 2);
        assert_eq!(&*temps[0].sensor_id, "temp-101");
        assert_eq!(&*temps[1].zone_id, "b02");
        // Other types keep the built-in fleet.
        assert_eq!(registry.sensors(SensorType::Humidity).len(), 12);
    }

    #[test]
    fn duplicate_sensor_id_across_types_is_rejected() {
        let config = AppConfig::from_toml(
            r#"
            [[fleet.temperature]]
            sensor_id = "hum-001"
            zone_id = "a01"
            "#,
        )
        .unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn empty_fleet_table_is_rejected() {
        let config = AppConfig::from_toml(
            r#"
            [fleet]
            temperature = []
            "#,
        )
        .unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn repeated_types_are_selected_once() {
        let mut config = AppConfig::default();
        config.simulation.sensor_types =
            vec![SensorType::Temperature, SensorType::Temperature, SensorType::Esd];
        let registry = config.registry().unwrap();
        assert_eq!(
            config.selected_types(&registry),
            vec![SensorType::Temperature, SensorType::Esd]
        );
    }

    #[test]
    fn unknown_sensor_type_fails_to_parse() {
        let parsed = AppConfig::from_toml(
            r#"
            [simulation]
            sensor_types = ["pressure"]
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn disabled_search_has_no_sink_config() {
        let mut config = AppConfig::default();
        assert!(config.search.sink_config().is_some());
        config.search.enabled = false;
        assert!(config.search.sink_config().is_none());
    }
}

#[cfg(test)]
mod sink_tests {
    use super::*;
    use sg_driver::SinkFactory;
    use sg_output::MeasurementSink;

    #[test]
    fn live_sinks_without_search_use_a_null_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = LiveSinks { db: dir.path().join("s.db"), search: None };
        assert_eq!(sinks.search(SensorType::Esd).unwrap().label(), "search");
        assert!(sinks.relational(SensorType::Esd).is_ok());
    }

    #[test]
    fn provisioning_creates_tables_without_search() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("s.db");
        let sinks = LiveSinks { db: db.clone(), search: None };
        crate::sinks::provision(&sinks, &[SensorType::Temperature, SensorType::Particle]).unwrap();
        // Second run is a no-op.
        crate::sinks::provision(&sinks, &[SensorType::Temperature, SensorType::Particle]).unwrap();
        assert!(db.exists());
    }

    #[test]
    fn backfill_writes_one_csv_per_sensor() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_toml(
            r#"
            [simulation]
            seed = 3
            "#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        let runner_config = RunnerConfig {
            seed:           config.simulation.seed,
            flush_factor:   config.simulation.flush_factor,
            tick_interval:  Duration::ZERO,
            start:          Some(SimClock::backfill_default().start),
            max_ticks:      Some(12),
            progress_every: 0,
        };
        let handle = Runner::new(&registry, runner_config)
            .sensor_types(&[SensorType::Esd])
            .start(&BackfillSinks { out: dir.path().to_path_buf() })
            .unwrap();
        for result in handle.join() {
            let summary = result.unwrap();
            assert_eq!(summary.ticks, 12);
        }

        let esd = registry.sensors(SensorType::Esd);
        for sensor in esd {
            let path = dir.path().join("esd").join(format!("{}.csv", sensor.sensor_id));
            let text = std::fs::read_to_string(&path).unwrap();
            let mut lines = text.lines();
            assert!(lines.next().unwrap().starts_with("timestamp,sensor_type,sensor_id"));
            assert_eq!(lines.count(), 12, "{}", path.display());
        }
    }
}

#[cfg(test)]
mod logging_tests {
    use crate::config::LoggingConfig;
    use crate::logging::init_tracing;

    #[test]
    fn second_initialisation_is_an_error() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
