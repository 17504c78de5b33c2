//! climfix: monthly climate NetCDF normalization
//!
//! A Rust library and CLI for normalizing monthly climate-model output
//! (precipitation, max/min temperature) stored as NetCDF, so that datasets
//! with slightly inconsistent coordinate encodings can later be merged or
//! compared. Each variable's input file is opened lazily, normalized, fully
//! materialized, and written to a new `<stem>_fixed.nc` file.
//!
//! ## Key Features
//!
//! - **Coordinate Standardization**: lat/lon rounded to a fixed precision and
//!   stored as 64-bit floats, so near-identical grids compare equal
//! - **Calendar Conversion**: `noleap`, `all_leap` and `360_day` time axes
//!   converted onto the standard proleptic Gregorian calendar
//! - **Midday Alignment**: every timestamp floored to its calendar day and
//!   shifted to 12:00, removing sub-day jitter
//! - **Auxiliary Cleanup**: `height` and bounds variables dropped from outputs
//! - **Explicit Materialization**: variable data stays deferred until an
//!   explicit realize call forces it into memory
//!
//! ## Module Organization
//!
//! The library is organized into logical modules:
//!
//! - [`calendar`]: CF time-units parsing and calendar decoding/encoding
//! - [`config`]: run configuration (folder, variables, digits, suffix)
//! - [`dataset`]: in-memory dataset model with deferred variable values
//! - [`normalize`]: the idempotent normalization operations
//! - [`netcdf_io`]: NetCDF file reading and writing
//! - [`process`]: per-variable driver and run loop
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use climfix::prelude::*;
//!
//! let config = NormalizeConfig::new("data/monthly");
//! let written = climfix::process::run(&config).unwrap();
//! for path in written {
//!     println!("wrote {}", path.display());
//! }
//! ```
//!
//! The normalization itself is a pure, idempotent function over an owned
//! dataset, applied once per input chunk and once more after assembly.

// Core modules
pub mod calendar;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod netcdf_io;
pub mod normalize;
pub mod process;

// Direct re-exports for the public API
pub use config::*;
pub use dataset::*;
pub use errors::*;
pub use netcdf_io::*;
pub use normalize::*;
pub use process::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::calendar::{CfCalendar, TimeUnit, TimeUnits};
    pub use crate::config::NormalizeConfig;
    pub use crate::dataset::{ArrayValues, DataVariable, Dataset, Dtype, TimeCoord};
    pub use crate::errors::{ClimFixError, Result};
    pub use crate::netcdf_io::{open_dataset, write_dataset, DatasetWriter};
    pub use crate::normalize::{normalize, AUXILIARY_VARIABLES};
    pub use crate::process::run;
}
