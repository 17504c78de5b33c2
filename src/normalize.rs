//! The normalization operations applied to every dataset
//!
//! Each operation is a pure function over an owned [`Dataset`] and each is
//! idempotent, so the full pipeline runs once per chunk before concatenation
//! and once more on the assembled dataset without changing the result.

use crate::dataset::{Dataset, TimeCoord};
use crate::errors::Result;
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

/// Variables and dimensions removed from every dataset
pub const AUXILIARY_VARIABLES: [&str; 4] = ["height", "lat_bnds", "lon_bnds", "time_bnds"];

/// Round a value to `digits` decimal places, ties to even.
///
/// Eighth- and quarter-degree grid centers sit exactly on rounding ties, so
/// the tie direction must match the half-to-even convention of the numeric
/// stacks this data passes through or identical grids stop comparing equal.
#[must_use]
pub fn round_to_digits(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

/// Round the horizontal coordinates so near-identical grids compare equal.
///
/// Both axes are replaced with their values rounded to `digits` decimals,
/// held as f64.
#[must_use]
pub fn standardize_latlon(mut dataset: Dataset, digits: i32) -> Dataset {
    for value in &mut dataset.lat {
        *value = round_to_digits(*value, digits);
    }
    for value in &mut dataset.lon {
        *value = round_to_digits(*value, digits);
    }
    dataset
}

/// Remove the known auxiliary variables; absent ones are silently skipped.
#[must_use]
pub fn drop_auxiliary(mut dataset: Dataset) -> Dataset {
    dataset
        .aux_vars
        .retain(|aux| !AUXILIARY_VARIABLES.contains(&aux.name.as_str()));
    dataset
        .data_vars
        .retain(|var| !AUXILIARY_VARIABLES.contains(&var.name.as_str()));
    dataset
}

/// Convert a non-standard-calendar time axis onto the standard calendar.
///
/// A standard axis passes through unchanged, which is what makes the full
/// pipeline idempotent.
pub fn ensure_standard_time(mut dataset: Dataset) -> Result<Dataset> {
    dataset.time = dataset.time.into_standard()?;
    Ok(dataset)
}

/// Floor every timestamp to midnight of its calendar day, then advance it
/// 12 hours, landing each step exactly at midday.
///
/// Only defined on a standard-calendar axis; convert with
/// [`ensure_standard_time`] first.
pub fn align_time_to_midday(mut dataset: Dataset) -> Result<Dataset> {
    let aligned: Vec<NaiveDateTime> = dataset
        .time
        .timestamps()?
        .iter()
        .map(|t| midday_of(*t))
        .collect();
    dataset.time = TimeCoord::Standard(aligned);
    Ok(dataset)
}

fn midday_of(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_time(NaiveTime::MIN) + TimeDelta::hours(12)
}

/// The full normalization: calendar conversion, coordinate rounding,
/// auxiliary-variable removal, midday alignment.
pub fn normalize(dataset: Dataset, digits: i32) -> Result<Dataset> {
    let dataset = ensure_standard_time(dataset)?;
    let dataset = standardize_latlon(dataset, digits);
    let dataset = drop_auxiliary(dataset);
    align_time_to_midday(dataset)
}
