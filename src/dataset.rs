//! In-memory dataset model with an explicit lazy/eager boundary
//!
//! A [`Dataset`] holds the shared coordinate axes eagerly (they are small)
//! and each data variable's values as either a deferred on-disk reference or
//! a loaded array. [`DataVariable::realize`] is the only place deferred
//! values are read; every other operation works on labels and coordinates
//! without touching the data.

use crate::calendar::{decode_times, CfCalendar, TimeUnits};
use crate::errors::{ClimFixError, Result};
use crate::netcdf_io;
use chrono::NaiveDateTime;
use ndarray::{ArrayD, Axis};
use netcdf::AttributeValue;
use std::path::PathBuf;

/// Shared time axis, either decoded onto the standard calendar or still in
/// its source encoding
#[derive(Debug, Clone)]
pub enum TimeCoord {
    /// Proleptic Gregorian datetimes, ready for day arithmetic
    Standard(Vec<NaiveDateTime>),

    /// Raw ticks under a non-standard calendar; day arithmetic is not
    /// defined on these until the axis is converted
    NonStandard {
        values: Vec<f64>,
        units: TimeUnits,
        calendar: CfCalendar,
    },
}

impl TimeCoord {
    /// Number of time steps
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            TimeCoord::Standard(times) => times.len(),
            TimeCoord::NonStandard { values, .. } => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the axis is already on the standard calendar
    #[must_use]
    pub fn is_standard(&self) -> bool {
        matches!(self, TimeCoord::Standard(_))
    }

    /// Decode the axis onto the standard calendar; a no-op when it already
    /// is standard.
    pub fn into_standard(self) -> Result<TimeCoord> {
        match self {
            TimeCoord::Standard(times) => Ok(TimeCoord::Standard(times)),
            TimeCoord::NonStandard {
                values,
                units,
                calendar,
            } => Ok(TimeCoord::Standard(decode_times(&values, &units, calendar)?)),
        }
    }

    /// Datetimes of a standard axis; an error while the axis is still on a
    /// non-standard calendar.
    pub fn timestamps(&self) -> Result<&[NaiveDateTime]> {
        match self {
            TimeCoord::Standard(times) => Ok(times),
            TimeCoord::NonStandard { calendar, .. } => Err(ClimFixError::CalendarError(format!(
                "Time axis still uses the {} calendar and must be converted before date arithmetic",
                calendar.name()
            ))),
        }
    }
}

/// One on-disk segment of a deferred variable
#[derive(Debug, Clone)]
pub struct DeferredSource {
    pub path: PathBuf,
    pub variable: String,
}

/// Two-phase value storage for a data variable
#[derive(Debug, Clone)]
pub enum ArrayValues {
    /// On-disk segments, nothing read yet; multiple segments stack along the
    /// leading axis when realized
    Deferred(Vec<DeferredSource>),

    /// Fully materialized values
    Loaded(ArrayD<f64>),
}

/// On-disk float width a data variable is written back with.
///
/// Values are computed in f64 either way; this only controls the storage
/// type of the output variable, so float32 inputs do not double in size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    /// 32-bit storage, preserved from float32 sources
    F32,
    /// 64-bit storage, for double and non-float sources
    F64,
}

/// A named data variable with its dimension names and copied attributes
#[derive(Debug, Clone)]
pub struct DataVariable {
    pub name: String,
    pub dims: Vec<String>,
    pub attrs: Vec<(String, AttributeValue)>,
    pub dtype: Dtype,
    pub values: ArrayValues,
}

impl DataVariable {
    /// Whether the values are resident in memory
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        matches!(self.values, ArrayValues::Loaded(_))
    }

    /// The materialized array; an error while the values are still deferred.
    pub fn array(&self) -> Result<&ArrayD<f64>> {
        match &self.values {
            ArrayValues::Loaded(array) => Ok(array),
            ArrayValues::Deferred(_) => Err(ClimFixError::NotMaterialized {
                var: self.name.clone(),
            }),
        }
    }

    /// Force the values into memory, reading every deferred segment and
    /// stacking them along the leading axis.
    pub fn realize(&mut self) -> Result<()> {
        let sources = match &self.values {
            ArrayValues::Loaded(_) => return Ok(()),
            ArrayValues::Deferred(sources) => sources,
        };

        let mut segments = Vec::with_capacity(sources.len());
        for source in sources {
            segments.push(netcdf_io::read_values(&source.path, &source.variable)?);
        }

        let array = match segments.len() {
            0 => {
                return Err(ClimFixError::Generic(format!(
                    "Variable '{}' has no data sources",
                    self.name
                )))
            }
            1 => segments.remove(0),
            _ => {
                let views: Vec<_> = segments.iter().map(|s| s.view()).collect();
                ndarray::concatenate(Axis(0), &views)?
            }
        };

        self.values = ArrayValues::Loaded(array);
        Ok(())
    }
}

/// Auxiliary variable (bounds arrays, scalar height) carried eagerly so
/// that dropping it is an observable change
#[derive(Debug, Clone)]
pub struct AuxVariable {
    pub name: String,
    /// Dimension names with their lengths; empty for a scalar
    pub dims: Vec<(String, usize)>,
    /// Row-major values
    pub values: Vec<f64>,
    pub attrs: Vec<(String, AttributeValue)>,
}

/// A labeled collection of variables sharing the `time`/`lat`/`lon` axes
#[derive(Debug, Clone)]
pub struct Dataset {
    pub time: TimeCoord,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub data_vars: Vec<DataVariable>,
    pub aux_vars: Vec<AuxVariable>,
}

impl Dataset {
    /// Look up a data variable by name
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&DataVariable> {
        self.data_vars.iter().find(|v| v.name == name)
    }

    /// Names of all data variables, in file order
    #[must_use]
    pub fn variable_names(&self) -> Vec<&str> {
        self.data_vars.iter().map(|v| v.name.as_str()).collect()
    }

    /// Narrow the dataset to a single data variable. Coordinates and any
    /// remaining auxiliary variables are kept.
    pub fn select(mut self, name: &str) -> Result<Dataset> {
        if self.variable(name).is_none() {
            return Err(ClimFixError::VariableNotFound {
                var: name.to_string(),
            });
        }
        self.data_vars.retain(|v| v.name == name);
        Ok(self)
    }

    /// Materialize every data variable.
    pub fn realize(&mut self) -> Result<()> {
        for var in &mut self.data_vars {
            var.realize()?;
        }
        Ok(())
    }

    /// Concatenate dataset chunks along the time axis.
    ///
    /// Chunks are ordered by their first timestamp, so the merged axis does
    /// not depend on the order files were opened in. Coordinates must match
    /// exactly across chunks; the per-chunk normalization pass is what makes
    /// near-identical grids exactly identical first. Deferred variables stay
    /// deferred: their source lists are merged without reading any data.
    pub fn concat(mut chunks: Vec<Dataset>) -> Result<Dataset> {
        if chunks.is_empty() {
            return Err(ClimFixError::Generic(
                "Cannot concatenate zero dataset chunks".to_string(),
            ));
        }
        if chunks.len() == 1 {
            return Ok(chunks.remove(0));
        }

        for chunk in &chunks {
            chunk.time.timestamps()?;
        }
        chunks.sort_by_key(|chunk| {
            chunk
                .time
                .timestamps()
                .ok()
                .and_then(|times| times.first().copied())
        });

        let mut merged = chunks.remove(0);
        // Bounds spanning the time axis cannot be carried across chunks;
        // their merged length would be stale.
        merged
            .aux_vars
            .retain(|aux| aux.dims.iter().all(|(dim, _)| dim != "time"));

        for chunk in chunks {
            merged.append_chunk(chunk)?;
        }
        Ok(merged)
    }

    fn append_chunk(&mut self, other: Dataset) -> Result<()> {
        if self.lat != other.lat {
            return Err(ClimFixError::CoordinateMismatch {
                coord: "lat".to_string(),
            });
        }
        if self.lon != other.lon {
            return Err(ClimFixError::CoordinateMismatch {
                coord: "lon".to_string(),
            });
        }

        let mut times = self.time.timestamps()?.to_vec();
        times.extend_from_slice(other.time.timestamps()?);
        self.time = TimeCoord::Standard(times);

        for var in &mut self.data_vars {
            let other_var = other.variable(&var.name).ok_or_else(|| {
                ClimFixError::VariableNotFound {
                    var: var.name.clone(),
                }
            })?;
            if var.dims != other_var.dims {
                return Err(ClimFixError::Generic(format!(
                    "Variable '{}' has different dimensions across chunks",
                    var.name
                )));
            }
            if var.dims.first().map(String::as_str) != Some("time") {
                return Err(ClimFixError::Generic(format!(
                    "Variable '{}' has no leading time dimension to concatenate along",
                    var.name
                )));
            }

            var.values = match (&var.values, &other_var.values) {
                (ArrayValues::Deferred(ours), ArrayValues::Deferred(theirs)) => {
                    let mut sources = ours.clone();
                    sources.extend(theirs.iter().cloned());
                    ArrayValues::Deferred(sources)
                }
                (ArrayValues::Loaded(ours), ArrayValues::Loaded(theirs)) => {
                    ArrayValues::Loaded(ndarray::concatenate(
                        Axis(0),
                        &[ours.view(), theirs.view()],
                    )?)
                }
                _ => {
                    return Err(ClimFixError::Generic(format!(
                        "Variable '{}' mixes materialized and deferred chunks",
                        var.name
                    )))
                }
            };
        }

        Ok(())
    }
}
