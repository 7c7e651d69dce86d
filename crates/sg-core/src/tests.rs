//! Unit tests for sg-core primitives.

#[cfg(test)]
mod ids {
    use crate::{ScopeIdx, SensorIdx};

    #[test]
    fn index_roundtrip() {
        let id = SensorIdx(42);
        assert_eq!(id.index(), 42);
        assert_eq!(SensorIdx::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(SensorIdx::INVALID.0, u32::MAX);
        assert_eq!(ScopeIdx::default(), ScopeIdx::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(ScopeIdx(7).to_string(), "ScopeIdx(7)");
    }
}

#[cfg(test)]
mod sensor_type {
    use crate::SensorType;

    #[test]
    fn labels_units_tables() {
        assert_eq!(SensorType::Temperature.label(), "temperature");
        assert_eq!(SensorType::WindDirection.label(), "windDir");
        assert_eq!(SensorType::Humidity.unit(), "%RH");
        assert_eq!(SensorType::Particle.unit(), "PPM");
        assert_eq!(SensorType::Particle.table(), "lpm_data");
        assert_eq!(SensorType::Esd.table(), "esd_data");
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("temp".parse::<SensorType>().unwrap(), SensorType::Temperature);
        assert_eq!("HUM".parse::<SensorType>().unwrap(), SensorType::Humidity);
        assert_eq!("windDir".parse::<SensorType>().unwrap(), SensorType::WindDirection);
        assert_eq!("wind".parse::<SensorType>().unwrap(), SensorType::WindDirection);
        assert_eq!("lpm".parse::<SensorType>().unwrap(), SensorType::Particle);
        assert_eq!("esd_data".parse::<SensorType>().unwrap(), SensorType::Esd);
        assert!("pressure".parse::<SensorType>().is_err());
    }

    #[test]
    fn ordinals_are_distinct() {
        let mut ords: Vec<_> = SensorType::ALL.iter().map(|t| t.ordinal()).collect();
        ords.dedup();
        assert_eq!(ords, vec![0, 1, 2, 3, 4]);
    }
}

#[cfg(test)]
mod registry {
    use crate::{CoreError, ScopeIdx, SensorIdx, SensorRegistry, SensorType, StateScope};

    #[test]
    fn builtin_fleet_sizes() {
        let reg = SensorRegistry::builtin();
        assert_eq!(reg.sensors(SensorType::Temperature).len(), 12);
        assert_eq!(reg.sensors(SensorType::Humidity).len(), 12);
        assert_eq!(reg.sensors(SensorType::WindDirection).len(), 10);
        assert_eq!(reg.sensors(SensorType::Esd).len(), 12);
        assert_eq!(reg.sensors(SensorType::Particle).len(), 9);
        assert_eq!(reg.len(), 55);
        assert_eq!(&*reg.sensors(SensorType::Particle)[0].sensor_id, "lpm-001");
    }

    #[test]
    fn zone_scope_shares_state() {
        let reg = SensorRegistry::builtin();
        let g = reg.group(SensorType::Temperature, StateScope::Zone).unwrap();
        // a01 a02 b01 b02 b03 b04 c01 c02
        assert_eq!(g.scope_count(), 8);
        assert_eq!(g.scope_of(SensorIdx(0)), ScopeIdx(0));
        assert_eq!(g.scope_of(SensorIdx(1)), ScopeIdx(0));
        assert_eq!(g.scope_of(SensorIdx(2)), ScopeIdx(1));
        assert_eq!(&*g.scope_keys[0], "a01");
    }

    #[test]
    fn sensor_scope_is_one_to_one() {
        let reg = SensorRegistry::builtin();
        let g = reg.group(SensorType::Esd, StateScope::Sensor).unwrap();
        assert_eq!(g.scope_count(), g.sensor_count());
        assert_eq!(&*g.scope_keys[3], "esd-004");
    }

    #[test]
    fn empty_type_is_config_error() {
        let reg = SensorRegistry::from_entries([(SensorType::Temperature, "t-1", "z")]).unwrap();
        let err = reg.group(SensorType::Esd, StateScope::Sensor).unwrap_err();
        assert!(matches!(err, CoreError::EmptyFleet(SensorType::Esd)));
    }

    #[test]
    fn duplicate_sensor_rejected() {
        let err = SensorRegistry::from_entries([
            (SensorType::Temperature, "t-1", "z1"),
            (SensorType::Humidity, "t-1", "z2"),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSensor(id) if id == "t-1"));
    }

    #[test]
    fn blank_ids_rejected() {
        assert!(SensorRegistry::from_entries([(SensorType::Temperature, " ", "z")]).is_err());
        assert!(SensorRegistry::from_entries([(SensorType::Temperature, "t", "")]).is_err());
    }
}

#[cfg(test)]
mod params {
    use crate::{Band, CoreError, SensorParams, SensorType};

    #[test]
    fn all_presets_validate() {
        for t in SensorType::ALL {
            let p = SensorParams::for_type(t);
            assert_eq!(p.sensor_type, t);
            p.validate().unwrap_or_else(|e| panic!("{t}: {e}"));
        }
    }

    #[test]
    fn particle_has_three_channels() {
        assert_eq!(SensorParams::particle().channel_count(), 3);
        assert_eq!(SensorParams::temperature().channel_count(), 1);
    }

    #[test]
    fn esd_is_unipolar() {
        let p = SensorParams::esd();
        let c = &p.channels[0];
        assert_eq!(c.walk_band, Band::new(0.0, 80.0));
        assert_eq!(c.recover_band, Band::new(0.0, 100.0));
        assert!(!p.has_hold_phase);
    }

    #[test]
    fn zero_spike_duration_rejected() {
        let mut p = SensorParams::temperature();
        p.spike_duration = 0;
        assert!(matches!(p.validate(), Err(CoreError::InvalidParams { .. })));
    }

    #[test]
    fn zero_hold_duration_rejected_only_with_hold_phase() {
        let mut p = SensorParams::humidity();
        p.hold_duration = 0;
        assert!(p.validate().is_err());
        p.has_hold_phase = false;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn probability_out_of_range_rejected() {
        let mut p = SensorParams::wind_direction();
        p.excursion_prob = 1.5;
        assert!(p.validate().is_err());
    }

    #[test]
    fn inverted_band_rejected() {
        let mut p = SensorParams::temperature();
        p.channels[0].walk_band = Band::new(22.0, 20.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn channel_count_must_match_sensor_type() {
        let mut particle = SensorParams::particle();
        particle.channels.truncate(1);
        assert!(particle.validate().is_err());

        let mut temp = SensorParams::temperature();
        let extra = temp.channels[0].clone();
        temp.channels.push(extra);
        assert!(temp.validate().is_err());
    }

    #[test]
    fn band_helpers() {
        let b = Band::around(21.0, 1.0);
        assert!(b.contains(20.0) && b.contains(22.0));
        assert!(!b.contains(22.01));
        assert_eq!(b.clamp(30.0), 22.0);
        assert_eq!(b.clamp(-5.0), 20.0);
    }
}

#[cfg(test)]
mod measurement {
    use crate::Reading;

    #[test]
    fn reading_from_channels() {
        assert_eq!(Reading::from_channels(&[1.0]), Reading::Scalar(1.0));
        assert_eq!(Reading::from_channels(&[1.0, 2.0, 3.0]), Reading::Particle([1.0, 2.0, 3.0]));
        assert_eq!(Reading::Particle([7.0, 2.0, 3.0]).primary(), 7.0);
        assert_eq!(Reading::Scalar(4.5).channels(), &[4.5]);
    }
}

#[cfg(test)]
mod time {
    use chrono::{TimeZone, Utc};

    use crate::{SimClock, Tick, format_utc};

    #[test]
    fn tick_arithmetic() {
        assert_eq!(Tick(10) + 5, Tick(15));
        assert_eq!(Tick(10) + 3, Tick(13));
        assert_eq!(Tick(3).to_string(), "T3");
    }

    #[test]
    fn clock_advances_by_tick_duration() {
        let start = Utc.with_ymd_and_hms(2025, 7, 15, 9, 32, 0).unwrap();
        let mut clock = SimClock::new(start, 1);
        assert_eq!(clock.now(), start);
        clock.advance();
        clock.advance();
        assert_eq!(format_utc(clock.now()), "2025-07-15T09:32:02Z");
    }

    #[test]
    fn backfill_default_origin() {
        let clock = SimClock::backfill_default();
        assert_eq!(format_utc(clock.now()), "2025-07-15T09:32:00Z");
    }
}

#[cfg(test)]
mod rng {
    use crate::{SensorType, SimRng};

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::for_sensor_type(7, SensorType::Humidity);
        let mut b = SimRng::for_sensor_type(7, SensorType::Humidity);
        for _ in 0..32 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn sensor_types_get_distinct_streams() {
        let mut a = SimRng::for_sensor_type(7, SensorType::Humidity);
        let mut b = SimRng::for_sensor_type(7, SensorType::Esd);
        let same = (0..32).filter(|_| a.unit().to_bits() == b.unit().to_bits()).count();
        assert!(same < 32);
    }

    #[test]
    fn int_inclusive_hits_both_ends() {
        let mut r = SimRng::new(1);
        let draws: Vec<f64> = (0..2_000).map(|_| r.int_inclusive(-3.0, 3.0)).collect();
        assert!(draws.iter().all(|v| (-3.0..=3.0).contains(v) && v.fract() == 0.0));
        assert!(draws.contains(&-3.0));
        assert!(draws.contains(&3.0));
    }

    #[test]
    fn uniform_and_symmetric_bounds() {
        let mut r = SimRng::new(2);
        for _ in 0..1_000 {
            let u = r.uniform(0.05, 0.10);
            assert!((0.05..0.10).contains(&u));
            let s = r.symmetric(0.25);
            assert!((-0.25..0.25).contains(&s));
        }
        assert_eq!(r.uniform(1.0, 1.0), 1.0);
    }
}
