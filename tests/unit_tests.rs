//! Comprehensive unit tests for climfix modules
//!
//! These tests cover the pure parts of the pipeline: error formatting,
//! configuration defaults, CF time parsing and calendar conversion, and the
//! normalization operations over hand-built datasets.

use chrono::{NaiveDate, NaiveDateTime};
use climfix::{
    calendar::{decode_time, decode_times, encode_times, CfCalendar, TimeUnit, TimeUnits},
    config::{NormalizeConfig, DEFAULT_VARIABLES},
    dataset::{ArrayValues, AuxVariable, DataVariable, Dataset, DeferredSource, Dtype, TimeCoord},
    errors::ClimFixError,
    normalize::{
        align_time_to_midday, drop_auxiliary, ensure_standard_time, normalize, round_to_digits,
        standardize_latlon,
    },
    process::output_path_for,
};
use ndarray::ArrayD;
use std::path::{Path, PathBuf};

fn dt(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(hour, min, sec)
        .expect("valid time")
}

fn grid_dims() -> Vec<String> {
    ["time", "lat", "lon"].iter().map(|s| s.to_string()).collect()
}

fn sample_dataset() -> Dataset {
    Dataset {
        time: TimeCoord::Standard(vec![dt(2000, 1, 1, 3, 0, 0), dt(2000, 2, 1, 15, 30, 0)]),
        lat: vec![50.000001, 51.0],
        lon: vec![9.999999, 11.000001],
        data_vars: vec![DataVariable {
            name: "pr".to_string(),
            dims: grid_dims(),
            attrs: Vec::new(),
            dtype: Dtype::F64,
            values: ArrayValues::Loaded(
                ArrayD::from_shape_vec(vec![2, 2, 2], (0..8).map(f64::from).collect())
                    .expect("valid shape"),
            ),
        }],
        aux_vars: vec![AuxVariable {
            name: "lat_bnds".to_string(),
            dims: vec![("lat".to_string(), 2), ("bnds".to_string(), 2)],
            values: vec![49.5, 50.5, 50.5, 51.5],
            attrs: Vec::new(),
        }],
    }
}

#[test]
fn test_error_types() {
    let netcdf_err = ClimFixError::NetCDFError(netcdf::Error::NotFound("test".to_string()));
    assert!(format!("{}", netcdf_err).contains("NetCDF error"));

    let generic_err = ClimFixError::Generic("Test error".to_string());
    assert_eq!(format!("{}", generic_err), "Test error");

    let var_err = ClimFixError::VariableNotFound {
        var: "pr".to_string(),
    };
    assert!(format!("{}", var_err).contains("Variable 'pr' not found"));

    let coord_err = ClimFixError::CoordinateNotFound {
        coord: "lat".to_string(),
    };
    assert!(format!("{}", coord_err).contains("Coordinate 'lat' not found"));

    let input_err = ClimFixError::NoInputFiles {
        pattern: "/data/tasmax*.nc".to_string(),
    };
    assert!(format!("{}", input_err).contains("/data/tasmax*.nc"));

    let calendar_err = ClimFixError::CalendarError("bad units".to_string());
    assert!(format!("{}", calendar_err).contains("Calendar error"));

    let lazy_err = ClimFixError::NotMaterialized {
        var: "pr".to_string(),
    };
    assert!(format!("{}", lazy_err).contains("not materialized"));

    let mismatch_err = ClimFixError::CoordinateMismatch {
        coord: "lon".to_string(),
    };
    assert!(format!("{}", mismatch_err).contains("differs between input chunks"));

    // From conversions used by the ? operator
    let from_str: ClimFixError = "boom".into();
    assert!(matches!(from_str, ClimFixError::Generic(_)));
}

#[test]
fn test_config_defaults_and_builders() {
    let config = NormalizeConfig::default();
    assert_eq!(config.input_folder, PathBuf::from("."));
    assert_eq!(config.variables, DEFAULT_VARIABLES.to_vec());
    assert_eq!(config.digits, 2);
    assert_eq!(config.output_suffix, "_fixed");

    let custom = NormalizeConfig::new("/data/monthly")
        .with_variables(["tas"])
        .with_digits(3)
        .with_output_suffix("_norm");
    assert_eq!(custom.input_folder, PathBuf::from("/data/monthly"));
    assert_eq!(custom.variables, vec!["tas".to_string()]);
    assert_eq!(custom.digits, 3);
    assert_eq!(custom.output_suffix, "_norm");
}

#[test]
fn test_time_units_parsing() {
    let units = TimeUnits::parse("days since 2000-01-01").expect("valid units");
    assert_eq!(units.unit, TimeUnit::Days);
    assert_eq!(units.base, dt(2000, 1, 1, 0, 0, 0));

    // Unpadded dates and a time of day are both accepted
    let units = TimeUnits::parse("hours since 1850-1-1 06:30:00").expect("valid units");
    assert_eq!(units.unit, TimeUnit::Hours);
    assert_eq!(units.base, dt(1850, 1, 1, 6, 30, 0));

    let units = TimeUnits::parse("seconds since 1970-01-01 00:00:00").expect("valid units");
    assert_eq!(units.unit, TimeUnit::Seconds);
    assert_eq!(units.base, dt(1970, 1, 1, 0, 0, 0));

    let units = TimeUnits::parse("minutes since 2000-01-01 12:00").expect("valid units");
    assert_eq!(units.unit, TimeUnit::Minutes);
    assert_eq!(units.base, dt(2000, 1, 1, 12, 0, 0));

    // ISO-style references put the time of day behind a 'T', with or
    // without a UTC marker
    let units = TimeUnits::parse("days since 1850-01-01T00:00:00Z").expect("valid units");
    assert_eq!(units.unit, TimeUnit::Days);
    assert_eq!(units.base, dt(1850, 1, 1, 0, 0, 0));

    let units = TimeUnits::parse("hours since 2000-01-01T06:30:00").expect("valid units");
    assert_eq!(units.base, dt(2000, 1, 1, 6, 30, 0));

    assert!(TimeUnits::parse("days after 2000-01-01").is_err());
    assert!(TimeUnits::parse("fortnights since 2000-01-01").is_err());
    assert!(TimeUnits::parse("days since tomorrow").is_err());
    match TimeUnits::parse("") {
        Err(ClimFixError::CalendarError(_)) => {}
        other => panic!("Expected CalendarError, got {:?}", other),
    }
}

#[test]
fn test_calendar_parse() {
    assert_eq!(CfCalendar::parse("standard").unwrap(), CfCalendar::Standard);
    assert_eq!(CfCalendar::parse("gregorian").unwrap(), CfCalendar::Standard);
    assert_eq!(
        CfCalendar::parse("proleptic_gregorian").unwrap(),
        CfCalendar::Standard
    );
    assert_eq!(CfCalendar::parse("noleap").unwrap(), CfCalendar::NoLeap);
    assert_eq!(CfCalendar::parse("365_day").unwrap(), CfCalendar::NoLeap);
    assert_eq!(CfCalendar::parse("all_leap").unwrap(), CfCalendar::AllLeap);
    assert_eq!(CfCalendar::parse("366_day").unwrap(), CfCalendar::AllLeap);
    assert_eq!(CfCalendar::parse("360_day").unwrap(), CfCalendar::Day360);

    // Attribute values in the wild carry stray case and whitespace
    assert_eq!(CfCalendar::parse(" Noleap ").unwrap(), CfCalendar::NoLeap);

    match CfCalendar::parse("julian") {
        Err(ClimFixError::CalendarError(msg)) => assert!(msg.contains("julian")),
        other => panic!("Expected CalendarError, got {:?}", other),
    }
}

#[test]
fn test_decode_standard_times() {
    let units = TimeUnits::parse("days since 2000-01-01").unwrap();

    let t = decode_time(0.125, &units, CfCalendar::Standard).unwrap();
    assert_eq!(t, dt(2000, 1, 1, 3, 0, 0));

    let t = decode_time(31.0, &units, CfCalendar::Standard).unwrap();
    assert_eq!(t, dt(2000, 2, 1, 0, 0, 0));

    let t = decode_time(-1.0, &units, CfCalendar::Standard).unwrap();
    assert_eq!(t, dt(1999, 12, 31, 0, 0, 0));

    let hours = TimeUnits::parse("hours since 2000-01-01 00:00:00").unwrap();
    let t = decode_time(27.0, &hours, CfCalendar::Standard).unwrap();
    assert_eq!(t, dt(2000, 1, 2, 3, 0, 0));

    let batch = decode_times(&[0.0, 31.0], &units, CfCalendar::Standard).unwrap();
    assert_eq!(batch, vec![dt(2000, 1, 1, 0, 0, 0), dt(2000, 2, 1, 0, 0, 0)]);

    assert!(decode_time(f64::NAN, &units, CfCalendar::Standard).is_err());
}

#[test]
fn test_decode_noleap_calendar() {
    let units = TimeUnits::parse("days since 2000-01-01").unwrap();

    // Day 59 in a noleap year is March 1st even though the real year 2000
    // had a February 29th
    let t = decode_time(59.0, &units, CfCalendar::NoLeap).unwrap();
    assert_eq!(t, dt(2000, 3, 1, 0, 0, 0));

    let t = decode_time(364.0, &units, CfCalendar::NoLeap).unwrap();
    assert_eq!(t, dt(2000, 12, 31, 0, 0, 0));

    // Year wrap in both directions
    let t = decode_time(365.0, &units, CfCalendar::NoLeap).unwrap();
    assert_eq!(t, dt(2001, 1, 1, 0, 0, 0));
    let t = decode_time(-1.0, &units, CfCalendar::NoLeap).unwrap();
    assert_eq!(t, dt(1999, 12, 31, 0, 0, 0));

    // Fractional days become a time of day
    let t = decode_time(0.5, &units, CfCalendar::NoLeap).unwrap();
    assert_eq!(t, dt(2000, 1, 1, 12, 0, 0));

    // Within January no calendar disagrees with the standard one
    for value in [0.0, 0.25, 15.0, 30.5] {
        let standard = decode_time(value, &units, CfCalendar::Standard).unwrap();
        let noleap = decode_time(value, &units, CfCalendar::NoLeap).unwrap();
        assert_eq!(standard, noleap);
    }
}

#[test]
fn test_decode_all_leap_and_360_day_calendars() {
    let units = TimeUnits::parse("days since 2000-01-01").unwrap();

    // all_leap day 59 is February 29th, which exists in Gregorian 2000
    let t = decode_time(59.0, &units, CfCalendar::AllLeap).unwrap();
    assert_eq!(t, dt(2000, 2, 29, 0, 0, 0));

    // ... but not in Gregorian 2001
    let units_2001 = TimeUnits::parse("days since 2001-01-01").unwrap();
    match decode_time(59.0, &units_2001, CfCalendar::AllLeap) {
        Err(ClimFixError::CalendarError(msg)) => assert!(msg.contains("does not exist")),
        other => panic!("Expected CalendarError, got {:?}", other),
    }

    // 360_day day 30 is February 1st
    let t = decode_time(30.0, &units, CfCalendar::Day360).unwrap();
    assert_eq!(t, dt(2000, 2, 1, 0, 0, 0));

    // 360_day day 59 is the nominal February 30th, which no Gregorian year has
    match decode_time(59.0, &units, CfCalendar::Day360) {
        Err(ClimFixError::CalendarError(msg)) => {
            assert!(msg.contains("02-30"));
            assert!(msg.contains("does not exist"));
        }
        other => panic!("Expected CalendarError, got {:?}", other),
    }
}

#[test]
fn test_encode_times() {
    let encoded = encode_times(&[dt(1970, 1, 1, 0, 0, 0), dt(2000, 1, 1, 12, 0, 0)]);
    assert_eq!(encoded, vec![0, 946_728_000]);

    // Pre-epoch stamps encode as negative seconds
    let encoded = encode_times(&[dt(1969, 12, 31, 12, 0, 0)]);
    assert_eq!(encoded, vec![-43_200]);
}

#[test]
fn test_round_to_digits() {
    assert_eq!(round_to_digits(50.000001, 2), 50.0);
    assert_eq!(round_to_digits(-12.3456, 2), -12.35);
    assert_eq!(round_to_digits(10.0, 2), 10.0);

    // Ties go to the even neighbor, in both directions
    assert_eq!(round_to_digits(7.25, 1), 7.2);
    assert_eq!(round_to_digits(7.35, 1), 7.4);
    assert_eq!(round_to_digits(2.5, 0), 2.0);

    // Eighth- and quarter-degree grid centers are exactly representable
    // ties; half-to-even keeps them equal to grids rounded elsewhere
    assert_eq!(round_to_digits(50.125, 2), 50.12);
    assert_eq!(round_to_digits(50.625, 2), 50.62);
    assert_eq!(round_to_digits(-50.125, 2), -50.12);
}

#[test]
fn test_standardize_latlon_rounds_and_is_idempotent() {
    let dataset = standardize_latlon(sample_dataset(), 2);
    assert_eq!(dataset.lat, vec![50.0, 51.0]);
    assert_eq!(dataset.lon, vec![10.0, 11.0]);

    let again = standardize_latlon(dataset, 2);
    assert_eq!(again.lat, vec![50.0, 51.0]);
    assert_eq!(again.lon, vec![10.0, 11.0]);
}

#[test]
fn test_drop_auxiliary_removes_and_is_noop_when_absent() {
    let dataset = drop_auxiliary(sample_dataset());
    assert!(dataset.aux_vars.is_empty());
    assert_eq!(dataset.variable_names(), vec!["pr"]);

    // Applying again to a clean dataset changes nothing
    let again = drop_auxiliary(dataset);
    assert!(again.aux_vars.is_empty());
    assert_eq!(again.variable_names(), vec!["pr"]);
}

#[test]
fn test_align_time_to_midday() {
    let dataset = align_time_to_midday(sample_dataset()).expect("standard axis");
    let times = dataset.time.timestamps().expect("standard axis");
    assert_eq!(times, &[dt(2000, 1, 1, 12, 0, 0), dt(2000, 2, 1, 12, 0, 0)]);

    // Idempotent: a midday axis stays where it is
    let again = align_time_to_midday(dataset).expect("standard axis");
    let times = again.time.timestamps().expect("standard axis");
    assert_eq!(times, &[dt(2000, 1, 1, 12, 0, 0), dt(2000, 2, 1, 12, 0, 0)]);
}

#[test]
fn test_align_time_rejects_non_standard_axis() {
    let mut dataset = sample_dataset();
    dataset.time = TimeCoord::NonStandard {
        values: vec![0.0, 59.0],
        units: TimeUnits::parse("days since 2000-01-01").unwrap(),
        calendar: CfCalendar::NoLeap,
    };

    match align_time_to_midday(dataset) {
        Err(ClimFixError::CalendarError(msg)) => assert!(msg.contains("noleap")),
        other => panic!("Expected CalendarError, got {:?}", other),
    }
}

#[test]
fn test_ensure_standard_time_converts_and_passes_through() {
    let mut dataset = sample_dataset();
    dataset.time = TimeCoord::NonStandard {
        values: vec![0.0, 59.0],
        units: TimeUnits::parse("days since 2000-01-01").unwrap(),
        calendar: CfCalendar::NoLeap,
    };

    let converted = ensure_standard_time(dataset).expect("convertible axis");
    let times = converted.time.timestamps().expect("standard axis");
    assert_eq!(times, &[dt(2000, 1, 1, 0, 0, 0), dt(2000, 3, 1, 0, 0, 0)]);

    // A standard axis passes through unchanged
    let unchanged = ensure_standard_time(converted).expect("standard axis");
    let times = unchanged.time.timestamps().expect("standard axis");
    assert_eq!(times, &[dt(2000, 1, 1, 0, 0, 0), dt(2000, 3, 1, 0, 0, 0)]);
}

#[test]
fn test_normalize_is_idempotent() {
    let mut dataset = sample_dataset();
    dataset.time = TimeCoord::NonStandard {
        values: vec![0.25, 59.5],
        units: TimeUnits::parse("days since 2000-01-01").unwrap(),
        calendar: CfCalendar::NoLeap,
    };

    let once = normalize(dataset, 2).expect("normalizable dataset");
    assert_eq!(
        once.time.timestamps().unwrap(),
        &[dt(2000, 1, 1, 12, 0, 0), dt(2000, 3, 1, 12, 0, 0)]
    );
    assert_eq!(once.lat, vec![50.0, 51.0]);
    assert_eq!(once.lon, vec![10.0, 11.0]);
    assert!(once.aux_vars.is_empty());

    let twice = normalize(once.clone(), 2).expect("normalizable dataset");
    assert_eq!(
        twice.time.timestamps().unwrap(),
        once.time.timestamps().unwrap()
    );
    assert_eq!(twice.lat, once.lat);
    assert_eq!(twice.lon, once.lon);
    assert!(twice.aux_vars.is_empty());
    assert_eq!(
        twice.variable("pr").unwrap().array().unwrap(),
        once.variable("pr").unwrap().array().unwrap()
    );
}

#[test]
fn test_deferred_values_error_until_realized() {
    let var = DataVariable {
        name: "pr".to_string(),
        dims: grid_dims(),
        attrs: Vec::new(),
        dtype: Dtype::F32,
        values: ArrayValues::Deferred(vec![DeferredSource {
            path: PathBuf::from("/nonexistent/pr_2000.nc"),
            variable: "pr".to_string(),
        }]),
    };

    assert!(!var.is_materialized());
    match var.array() {
        Err(ClimFixError::NotMaterialized { var }) => assert_eq!(var, "pr"),
        other => panic!("Expected NotMaterialized, got {:?}", other),
    }
}

#[test]
fn test_select_missing_variable() {
    match sample_dataset().select("tasmax") {
        Err(ClimFixError::VariableNotFound { var }) => assert_eq!(var, "tasmax"),
        other => panic!("Expected VariableNotFound, got {:?}", other),
    }
}

#[test]
fn test_concat_orders_chunks_and_checks_coordinates() {
    let chunk = |day: u32, value: f64| Dataset {
        time: TimeCoord::Standard(vec![dt(2000, 1, day, 12, 0, 0)]),
        lat: vec![50.0, 51.0],
        lon: vec![10.0, 11.0],
        data_vars: vec![DataVariable {
            name: "pr".to_string(),
            dims: grid_dims(),
            attrs: Vec::new(),
            dtype: Dtype::F64,
            values: ArrayValues::Loaded(
                ArrayD::from_shape_vec(vec![1, 2, 2], vec![value; 4]).expect("valid shape"),
            ),
        }],
        aux_vars: Vec::new(),
    };

    // Later chunk listed first: concat orders by first timestamp
    let merged = Dataset::concat(vec![chunk(2, 2.0), chunk(1, 1.0)]).expect("matching chunks");
    let times = merged.time.timestamps().unwrap();
    assert_eq!(
        times,
        &[dt(2000, 1, 1, 12, 0, 0), dt(2000, 1, 2, 12, 0, 0)]
    );
    let array = merged.variable("pr").unwrap().array().unwrap();
    assert_eq!(array.shape(), &[2, 2, 2]);
    assert_eq!(array[[0, 0, 0]], 1.0);
    assert_eq!(array[[1, 0, 0]], 2.0);

    // A single chunk passes through untouched
    let single = Dataset::concat(vec![chunk(5, 7.0)]).expect("single chunk");
    assert_eq!(single.time.len(), 1);

    // Mismatched latitudes are rejected
    let mut shifted = chunk(3, 3.0);
    shifted.lat = vec![50.01, 51.0];
    match Dataset::concat(vec![chunk(1, 1.0), shifted]) {
        Err(ClimFixError::CoordinateMismatch { coord }) => assert_eq!(coord, "lat"),
        other => panic!("Expected CoordinateMismatch, got {:?}", other),
    }
}

#[test]
fn test_concat_merges_deferred_sources_without_reading() {
    let chunk = |day: u32, file: &str| Dataset {
        time: TimeCoord::Standard(vec![dt(2000, 1, day, 12, 0, 0)]),
        lat: vec![50.0],
        lon: vec![10.0],
        data_vars: vec![DataVariable {
            name: "pr".to_string(),
            dims: grid_dims(),
            attrs: Vec::new(),
            dtype: Dtype::F32,
            values: ArrayValues::Deferred(vec![DeferredSource {
                path: PathBuf::from(file),
                variable: "pr".to_string(),
            }]),
        }],
        aux_vars: Vec::new(),
    };

    // The paths need not exist: merging deferred chunks reads nothing
    let merged = Dataset::concat(vec![
        chunk(2, "/nonexistent/pr_b.nc"),
        chunk(1, "/nonexistent/pr_a.nc"),
    ])
    .expect("matching chunks");

    let var = merged.variable("pr").expect("pr variable");
    assert!(!var.is_materialized());
    match &var.values {
        ArrayValues::Deferred(sources) => {
            // Source lists merge in time order, one segment per chunk
            let paths: Vec<_> = sources.iter().map(|s| s.path.as_path()).collect();
            assert_eq!(
                paths,
                vec![
                    Path::new("/nonexistent/pr_a.nc"),
                    Path::new("/nonexistent/pr_b.nc")
                ]
            );
        }
        ArrayValues::Loaded(_) => panic!("chunk merge materialized the variable"),
    }
}

#[test]
fn test_concat_rejects_mixed_chunks() {
    let loaded = Dataset {
        time: TimeCoord::Standard(vec![dt(2000, 1, 1, 12, 0, 0)]),
        lat: vec![50.0],
        lon: vec![10.0],
        data_vars: vec![DataVariable {
            name: "pr".to_string(),
            dims: grid_dims(),
            attrs: Vec::new(),
            dtype: Dtype::F64,
            values: ArrayValues::Loaded(
                ArrayD::from_shape_vec(vec![1, 1, 1], vec![1.0]).expect("valid shape"),
            ),
        }],
        aux_vars: Vec::new(),
    };
    let mut deferred = loaded.clone();
    deferred.time = TimeCoord::Standard(vec![dt(2000, 2, 1, 12, 0, 0)]);
    deferred.data_vars[0].values = ArrayValues::Deferred(vec![DeferredSource {
        path: PathBuf::from("/data/pr_2000.nc"),
        variable: "pr".to_string(),
    }]);

    match Dataset::concat(vec![loaded, deferred]) {
        Err(ClimFixError::Generic(msg)) => {
            assert!(msg.contains("mixes materialized and deferred"));
        }
        other => panic!("Expected Generic, got {:?}", other),
    }
}

#[test]
fn test_output_path_for() {
    assert_eq!(
        output_path_for(Path::new("/data/pr_2000.nc"), "_fixed"),
        PathBuf::from("/data/pr_2000_fixed.nc")
    );
    // Only the final extension is stripped
    assert_eq!(
        output_path_for(Path::new("/data/pr.mon.nc"), "_fixed"),
        PathBuf::from("/data/pr.mon_fixed.nc")
    );
    assert_eq!(
        output_path_for(Path::new("tasmin_1990.nc"), "_norm"),
        PathBuf::from("tasmin_1990_norm.nc")
    );
}
