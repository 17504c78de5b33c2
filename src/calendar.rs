//! CF time handling: units parsing, calendar decoding, and output encoding
//!
//! NetCDF time axes store numeric ticks interpreted through a units string
//! (e.g. `days since 2000-01-01 00:00:00`) and a named calendar. Ticks on a
//! standard calendar decode directly onto chrono datetimes. The fixed-year
//! climate calendars (`noleap`, `all_leap`, `360_day`) are decoded with their
//! own month lengths, and the resulting nominal year-month-day is then
//! re-interpreted on the proleptic Gregorian calendar; a nominal date with no
//! Gregorian counterpart (such as February 30th) is a fatal error.

use crate::errors::{ClimFixError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

const NOLEAP_MONTH_DAYS: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const ALL_LEAP_MONTH_DAYS: [i64; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

const SECONDS_PER_DAY: i64 = 86_400;

/// Offsets beyond this many seconds from the reference date are rejected
/// rather than decoded (roughly 285 million years).
const MAX_OFFSET_SECONDS: f64 = 9.0e15;

/// Time units every output file is written with
pub const OUTPUT_TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";

/// Calendar every output file is written with
pub const OUTPUT_CALENDAR: &str = "proleptic_gregorian";

/// CF calendar families understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfCalendar {
    /// `standard`, `gregorian` or `proleptic_gregorian`
    Standard,
    /// `noleap` / `365_day`: every year has 365 days
    NoLeap,
    /// `all_leap` / `366_day`: every year has 366 days
    AllLeap,
    /// `360_day`: twelve 30-day months
    Day360,
}

impl CfCalendar {
    /// Map a CF `calendar` attribute value onto a calendar family.
    ///
    /// Unknown names are an error: decoding ticks on a misunderstood
    /// calendar would silently shift every timestamp.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Self::Standard),
            "noleap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            other => Err(ClimFixError::CalendarError(format!(
                "Unsupported calendar '{}'",
                other
            ))),
        }
    }

    /// Whether dates on this calendar are plain proleptic Gregorian dates
    #[must_use]
    pub const fn is_standard(self) -> bool {
        matches!(self, Self::Standard)
    }

    /// CF name of the calendar family
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
        }
    }

    const fn year_days(self) -> i64 {
        match self {
            Self::Standard | Self::NoLeap => 365,
            Self::AllLeap => 366,
            Self::Day360 => 360,
        }
    }

    // Only meaningful for the fixed-year calendars; month is 1-based.
    const fn month_days(self, month: u32) -> i64 {
        match self {
            Self::Day360 => 30,
            Self::AllLeap => ALL_LEAP_MONTH_DAYS[(month - 1) as usize],
            _ => NOLEAP_MONTH_DAYS[(month - 1) as usize],
        }
    }
}

/// Tick width of a CF time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    /// Parse the unit word of a CF units string, accepting the usual
    /// udunits spellings.
    pub fn parse(word: &str) -> Result<Self> {
        match word.to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => Ok(Self::Days),
            "hours" | "hour" | "hrs" | "hr" | "h" => Ok(Self::Hours),
            "minutes" | "minute" | "mins" | "min" => Ok(Self::Minutes),
            "seconds" | "second" | "secs" | "sec" | "s" => Ok(Self::Seconds),
            other => Err(ClimFixError::CalendarError(format!(
                "Unsupported time unit '{}'",
                other
            ))),
        }
    }

    /// Seconds per tick
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Days => SECONDS_PER_DAY,
            Self::Hours => 3600,
            Self::Minutes => 60,
            Self::Seconds => 1,
        }
    }
}

/// Parsed form of a CF time units string
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    /// Tick width
    pub unit: TimeUnit,
    /// Reference datetime the ticks count from
    pub base: NaiveDateTime,
}

impl TimeUnits {
    /// Parse a units string of the form `<unit> since <date> [<time>]`.
    ///
    /// The date accepts unpadded fields (`days since 1850-1-1`) and the ISO
    /// `T` separator (`days since 1850-01-01T00:00:00Z`); the time of day is
    /// optional, as is anything after it (time-zone suffixes are ignored).
    pub fn parse(units: &str) -> Result<Self> {
        let mut words = units.split_whitespace();

        let unit_word = words.next().ok_or_else(|| {
            ClimFixError::CalendarError(format!("Empty time units string '{}'", units))
        })?;
        let unit = TimeUnit::parse(unit_word)?;

        if words.next() != Some("since") {
            return Err(ClimFixError::CalendarError(format!(
                "Time units '{}' are not of the form '<unit> since <date>'",
                units
            )));
        }

        let date_word = words.next().ok_or_else(|| {
            ClimFixError::CalendarError(format!("Time units '{}' are missing a reference date", units))
        })?;
        // ISO-style references carry the time of day in the same word,
        // behind a 'T'
        let (date_word, inline_time) = match date_word.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (date_word, None),
        };
        let date = NaiveDate::parse_from_str(date_word, "%Y-%m-%d").map_err(|_| {
            ClimFixError::CalendarError(format!(
                "Unparseable reference date '{}' in time units '{}'",
                date_word, units
            ))
        })?;

        let time = match inline_time.or_else(|| words.next()) {
            Some(time_word) => {
                let time_word = time_word.trim_end_matches('Z');
                NaiveTime::parse_from_str(time_word, "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(time_word, "%H:%M"))
                    .map_err(|_| {
                        ClimFixError::CalendarError(format!(
                            "Unparseable reference time '{}' in time units '{}'",
                            time_word, units
                        ))
                    })?
            }
            None => NaiveTime::MIN,
        };

        Ok(Self {
            unit,
            base: date.and_time(time),
        })
    }
}

/// Decode raw time ticks into standard-calendar datetimes.
pub fn decode_times(
    values: &[f64],
    units: &TimeUnits,
    calendar: CfCalendar,
) -> Result<Vec<NaiveDateTime>> {
    values
        .iter()
        .map(|&value| decode_time(value, units, calendar))
        .collect()
}

/// Decode a single time tick.
pub fn decode_time(value: f64, units: &TimeUnits, calendar: CfCalendar) -> Result<NaiveDateTime> {
    if !value.is_finite() {
        return Err(ClimFixError::CalendarError(format!(
            "Non-finite time value {}",
            value
        )));
    }

    let total_seconds = value * units.unit.seconds() as f64;
    if total_seconds.abs() > MAX_OFFSET_SECONDS {
        return Err(ClimFixError::CalendarError(format!(
            "Time value {} is outside the decodable range",
            value
        )));
    }
    let offset = total_seconds.round() as i64;

    if calendar.is_standard() {
        return units
            .base
            .checked_add_signed(TimeDelta::seconds(offset))
            .ok_or_else(|| {
                ClimFixError::CalendarError(format!(
                    "Time value {} overflows the datetime range",
                    value
                ))
            });
    }

    // Fixed-year calendars: whole days advance the nominal date in the
    // source calendar, the remainder becomes the time of day.
    let base_time = units.base.time().num_seconds_from_midnight() as i64;
    let total = offset + base_time;
    let days = total.div_euclid(SECONDS_PER_DAY);
    let time_of_day = total.rem_euclid(SECONDS_PER_DAY);

    let nominal = advance_nominal(units.base.date(), days, calendar)?;
    let date = NaiveDate::from_ymd_opt(nominal.year, nominal.month, nominal.day).ok_or_else(
        || {
            ClimFixError::CalendarError(format!(
                "Nominal date {:04}-{:02}-{:02} from the {} calendar does not exist in the proleptic Gregorian calendar",
                nominal.year, nominal.month, nominal.day, calendar.name()
            ))
        },
    )?;

    date.and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::seconds(time_of_day))
        .ok_or_else(|| {
            ClimFixError::CalendarError(format!(
                "Time value {} overflows the datetime range",
                value
            ))
        })
}

/// Encode datetimes as the fixed output representation: integral seconds
/// since the Unix epoch on the proleptic Gregorian calendar.
#[must_use]
pub fn encode_times(times: &[NaiveDateTime]) -> Vec<i64> {
    times.iter().map(|t| t.and_utc().timestamp()).collect()
}

/// Year-month-day as counted by a fixed-year calendar, before the date is
/// re-interpreted on the proleptic Gregorian calendar.
#[derive(Debug, Clone, Copy)]
struct NominalDate {
    year: i32,
    month: u32,
    day: u32,
}

fn advance_nominal(base: NaiveDate, days: i64, calendar: CfCalendar) -> Result<NominalDate> {
    let base_doy = nominal_day_of_year(base.month(), base.day(), calendar)?;
    let year_days = calendar.year_days();

    // 0-based day offset from January 1st of the base year
    let offset = base_doy + days;
    let year = base.year() + offset.div_euclid(year_days) as i32;
    let mut day_index = offset.rem_euclid(year_days);

    let mut month = 1u32;
    while month < 12 && day_index >= calendar.month_days(month) {
        day_index -= calendar.month_days(month);
        month += 1;
    }

    Ok(NominalDate {
        year,
        month,
        day: day_index as u32 + 1,
    })
}

// 0-based day-of-year of a month/day pair in the given fixed-year calendar.
fn nominal_day_of_year(month: u32, day: u32, calendar: CfCalendar) -> Result<i64> {
    if !(1..=12).contains(&month) || day == 0 || day as i64 > calendar.month_days(month) {
        return Err(ClimFixError::CalendarError(format!(
            "Reference date {:02}-{:02} is not valid in the {} calendar",
            month,
            day,
            calendar.name()
        )));
    }
    let mut doy = 0i64;
    for m in 1..month {
        doy += calendar.month_days(m);
    }
    Ok(doy + day as i64 - 1)
}
