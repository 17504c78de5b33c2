//! NetCDF I/O: opening files as datasets and writing normalized results
//!
//! Opening registers every data variable as a deferred reference, so nothing
//! beyond the coordinates is read until an explicit realize call.
//! [`read_values`] applies the usual CF unpacking (`scale_factor`,
//! `add_offset`, fill/missing sentinels become NaN). The writer recreates the
//! output file from scratch with the coordinates re-encoded and the source
//! variable's attributes preserved.

use crate::calendar::{decode_times, encode_times, CfCalendar, TimeUnits, OUTPUT_CALENDAR, OUTPUT_TIME_UNITS};
use crate::dataset::{ArrayValues, AuxVariable, DataVariable, Dataset, DeferredSource, Dtype, TimeCoord};
use crate::errors::{ClimFixError, Result};
use crate::normalize::AUXILIARY_VARIABLES;
use chrono::Utc;
use ndarray::ArrayD;
use netcdf::types::{FloatType, NcVariableType};
use netcdf::{create, open, AttributeValue};
use std::{fs, path::Path};

/// Names always treated as coordinate variables, not data variables
const COORDINATE_VARIABLES: [&str; 3] = ["time", "lat", "lon"];

/// Attributes describing the on-disk packing of the source values; the
/// output stores unpacked floats with a NaN fill, so these are not copied.
const PACKING_ATTRIBUTES: [&str; 4] = ["_FillValue", "missing_value", "scale_factor", "add_offset"];

/// Open a NetCDF file as a [`Dataset`].
///
/// Coordinates are read eagerly; a `time` axis on a standard calendar is
/// decoded immediately, while a non-standard calendar is kept in its raw
/// encoding for the normalization pass to convert. Every other variable is
/// registered as a deferred data variable, except the known auxiliary
/// variables, which are captured with their values.
pub fn open_dataset(path: &Path) -> Result<Dataset> {
    let file = open(path)?;

    let time = read_time_coordinate(&file)?;
    let lat = read_coordinate(&file, "lat")?;
    let lon = read_coordinate(&file, "lon")?;

    let mut data_vars = Vec::new();
    let mut aux_vars = Vec::new();
    for var in file.variables() {
        let name = var.name();
        if COORDINATE_VARIABLES.contains(&name.as_str()) {
            continue;
        }
        let attrs = collect_attributes(&var)?;
        if AUXILIARY_VARIABLES.contains(&name.as_str()) {
            aux_vars.push(AuxVariable {
                name,
                dims: var
                    .dimensions()
                    .iter()
                    .map(|d| (d.name().to_string(), d.len()))
                    .collect(),
                values: var.get_values::<f64, _>(..)?,
                attrs,
            });
        } else {
            // float32 sources keep their width on write; everything else
            // (doubles, packed integers) is stored as f64
            let dtype = if var.vartype() == NcVariableType::Float(FloatType::F32) {
                Dtype::F32
            } else {
                Dtype::F64
            };
            data_vars.push(DataVariable {
                name: name.clone(),
                dims: var
                    .dimensions()
                    .iter()
                    .map(|d| d.name().to_string())
                    .collect(),
                attrs,
                dtype,
                values: ArrayValues::Deferred(vec![DeferredSource {
                    path: path.to_path_buf(),
                    variable: name,
                }]),
            });
        }
    }

    Ok(Dataset {
        time,
        lat,
        lon,
        data_vars,
        aux_vars,
    })
}

/// Read a variable's values as an f64 array, applying CF unpacking.
///
/// Fill/missing sentinels become NaN before `scale_factor`/`add_offset` are
/// applied, matching the CF order (sentinels are compared on packed values).
pub fn read_values(path: &Path, var_name: &str) -> Result<ArrayD<f64>> {
    let file = open(path)?;
    let var = file
        .variable(var_name)
        .ok_or_else(|| ClimFixError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values = var.get_values::<f64, _>(..)?;
    let mut array = ArrayD::from_shape_vec(shape, values)?;

    let sentinels: Vec<f64> = [
        numeric_attribute(&var, "_FillValue")?,
        numeric_attribute(&var, "missing_value")?,
    ]
    .into_iter()
    .flatten()
    .collect();
    if !sentinels.is_empty() {
        for value in array.iter_mut() {
            if sentinels.iter().any(|s| *value == *s) {
                *value = f64::NAN;
            }
        }
    }

    let scale = numeric_attribute(&var, "scale_factor")?;
    let offset = numeric_attribute(&var, "add_offset")?;
    if scale.is_some() || offset.is_some() {
        let scale = scale.unwrap_or(1.0);
        let offset = offset.unwrap_or(0.0);
        array.mapv_inplace(|v| v * scale + offset);
    }

    Ok(array)
}

fn read_coordinate(file: &netcdf::File, name: &str) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| ClimFixError::CoordinateNotFound {
            coord: name.to_string(),
        })?;
    Ok(var.get_values::<f64, _>(..)?)
}

fn read_time_coordinate(file: &netcdf::File) -> Result<TimeCoord> {
    let var = file
        .variable("time")
        .ok_or_else(|| ClimFixError::CoordinateNotFound {
            coord: "time".to_string(),
        })?;

    let values = var.get_values::<f64, _>(..)?;
    let units = string_attribute(&var, "units")?.ok_or_else(|| {
        ClimFixError::CalendarError("Time variable has no string units attribute".to_string())
    })?;
    let units = TimeUnits::parse(&units)?;

    // CF default when the attribute is absent
    let calendar = match string_attribute(&var, "calendar")? {
        Some(name) => CfCalendar::parse(&name)?,
        None => CfCalendar::Standard,
    };

    if calendar.is_standard() {
        Ok(TimeCoord::Standard(decode_times(&values, &units, calendar)?))
    } else {
        Ok(TimeCoord::NonStandard {
            values,
            units,
            calendar,
        })
    }
}

fn collect_attributes(var: &netcdf::Variable) -> Result<Vec<(String, AttributeValue)>> {
    let mut attrs = Vec::new();
    for attr in var.attributes() {
        attrs.push((attr.name().to_string(), attr.value()?));
    }
    Ok(attrs)
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Result<Option<String>> {
    let attr = match var.attribute(name) {
        Some(attr) => attr,
        None => return Ok(None),
    };
    match attr.value()? {
        AttributeValue::Str(s) => Ok(Some(s)),
        AttributeValue::Strs(mut vals) if vals.len() == 1 => Ok(vals.pop()),
        _ => Ok(None),
    }
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Result<Option<f64>> {
    let attr = match var.attribute(name) {
        Some(attr) => attr,
        None => return Ok(None),
    };
    let value = match attr.value()? {
        AttributeValue::Float(v) => f64::from(v),
        AttributeValue::Double(v) => v,
        AttributeValue::Int(v) => f64::from(v),
        AttributeValue::Short(v) => f64::from(v),
        AttributeValue::Floats(vs) if vs.len() == 1 => f64::from(vs[0]),
        AttributeValue::Doubles(vs) if vs.len() == 1 => vs[0],
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Writes a [`Dataset`] to a new NetCDF file
pub struct DatasetWriter<'a> {
    dataset: &'a Dataset,
    output_path: &'a Path,
}

impl<'a> DatasetWriter<'a> {
    /// Create a new dataset writer
    pub fn new(dataset: &'a Dataset, output_path: &'a Path) -> Self {
        Self {
            dataset,
            output_path,
        }
    }

    /// Write the dataset, overwriting any existing file at the output path.
    ///
    /// The time axis is re-encoded as integral seconds since the Unix epoch
    /// on the proleptic Gregorian calendar; lat/lon are written as f64 with
    /// their CF attributes; data variables keep their source float width.
    /// Every data variable must already be materialized.
    pub fn write(&self) -> Result<()> {
        // Validate before touching the output file, so an unmaterialized
        // variable does not destroy a previous result.
        for var in &self.dataset.data_vars {
            var.array()?;
        }
        let times = self.dataset.time.timestamps()?;

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let mut file = create(self.output_path)?;

        // Define dimensions: the shared axes first, then anything else the
        // variables reference (e.g. a bounds dimension).
        file.add_dimension("time", times.len())?;
        file.add_dimension("lat", self.dataset.lat.len())?;
        file.add_dimension("lon", self.dataset.lon.len())?;
        let mut defined: Vec<String> = COORDINATE_VARIABLES.iter().map(|s| s.to_string()).collect();

        for var in &self.dataset.data_vars {
            let array = var.array()?;
            for (dim, &len) in var.dims.iter().zip(array.shape()) {
                if !defined.contains(dim) {
                    file.add_dimension(dim, len)?;
                    defined.push(dim.clone());
                }
            }
        }
        for aux in &self.dataset.aux_vars {
            for (dim, len) in &aux.dims {
                if !defined.contains(dim) {
                    file.add_dimension(dim, *len)?;
                    defined.push(dim.clone());
                }
            }
        }

        // Coordinate variables
        {
            let mut time_var = file.add_variable::<i64>("time", &["time"])?;
            time_var.put_attribute("units", OUTPUT_TIME_UNITS)?;
            time_var.put_attribute("calendar", OUTPUT_CALENDAR)?;
            time_var.put_attribute("standard_name", "time")?;
            time_var.put_attribute("long_name", "time")?;
            time_var.put_values(&encode_times(times), ..)?;
        }
        {
            let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
            lat_var.put_attribute("units", "degrees_north")?;
            lat_var.put_attribute("standard_name", "latitude")?;
            lat_var.put_attribute("long_name", "latitude")?;
            lat_var.put_values(&self.dataset.lat, ..)?;
        }
        {
            let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
            lon_var.put_attribute("units", "degrees_east")?;
            lon_var.put_attribute("standard_name", "longitude")?;
            lon_var.put_attribute("long_name", "longitude")?;
            lon_var.put_values(&self.dataset.lon, ..)?;
        }

        // Data variables with their source attributes, in their source
        // float width
        for var in &self.dataset.data_vars {
            let array = var.array()?;
            let dim_refs: Vec<&str> = var.dims.iter().map(|s| s.as_str()).collect();
            match var.dtype {
                Dtype::F32 => {
                    let mut new_var = file.add_variable::<f32>(&var.name, &dim_refs)?;
                    new_var.put_attribute("_FillValue", f32::NAN)?;
                    new_var.put(array.mapv(|v| v as f32).view(), ..)?;
                    copy_attributes(&mut new_var, &var.attrs)?;
                }
                Dtype::F64 => {
                    let mut new_var = file.add_variable::<f64>(&var.name, &dim_refs)?;
                    new_var.put_attribute("_FillValue", f64::NAN)?;
                    new_var.put(array.view(), ..)?;
                    copy_attributes(&mut new_var, &var.attrs)?;
                }
            }
        }

        // Auxiliary variables survive only when the dataset was written
        // without normalization.
        for aux in &self.dataset.aux_vars {
            let dim_refs: Vec<&str> = aux.dims.iter().map(|(name, _)| name.as_str()).collect();
            let mut new_var = file.add_variable::<f64>(&aux.name, &dim_refs)?;
            new_var.put_values(&aux.values, ..)?;
            copy_attributes(&mut new_var, &aux.attrs)?;
        }

        // Add history attribute
        file.add_attribute(
            "history",
            format!("Created by climfix on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }
}

/// Writes a dataset to a new NetCDF file, overwriting any existing file.
pub fn write_dataset(dataset: &Dataset, output_path: &Path) -> Result<()> {
    let writer = DatasetWriter::new(dataset, output_path);
    writer.write()
}

fn copy_attributes(
    var: &mut netcdf::VariableMut,
    attrs: &[(String, AttributeValue)],
) -> Result<()> {
    for (name, value) in attrs {
        if PACKING_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }
        match value {
            AttributeValue::Str(val) => {
                var.put_attribute(name, val.as_str())?;
            }
            AttributeValue::Strs(vals) => {
                var.put_attribute(name, vals.clone())?;
            }
            AttributeValue::Float(val) => {
                var.put_attribute(name, *val)?;
            }
            AttributeValue::Floats(vals) => {
                var.put_attribute(name, vals.clone())?;
            }
            AttributeValue::Double(val) => {
                var.put_attribute(name, *val)?;
            }
            AttributeValue::Doubles(vals) => {
                var.put_attribute(name, vals.clone())?;
            }
            AttributeValue::Int(val) => {
                var.put_attribute(name, *val)?;
            }
            AttributeValue::Ints(vals) => {
                var.put_attribute(name, vals.clone())?;
            }
            AttributeValue::Short(val) => {
                var.put_attribute(name, *val)?;
            }
            AttributeValue::Shorts(vals) => {
                var.put_attribute(name, vals.clone())?;
            }
            _ => {
                println!("⚠ Skipped unsupported attribute type for '{}'", name);
            }
        }
    }
    Ok(())
}
